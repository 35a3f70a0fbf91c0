mod config;
mod controller;
mod engine;
mod hsm;
mod sink;
mod status;
mod timers;
mod types;

pub use config::{ConfigError, TimingConfig};
pub use controller::ButtonController;
pub use engine::{DecoderOutput, GestureDecoder};
pub use sink::{CommandHandlers, CommandSink, StatusObserver};
pub use status::{DecoderStatus, GlowHint};
pub use timers::{
    HoldCheckpoint, PendingTimer, ReleasePurpose, TimerHandle, TimerPurpose, TimerSlot,
};
pub use types::{
    Command, CommandBatch, DispatchBuffer, EdgeKind, InputSource, StateId,
};
