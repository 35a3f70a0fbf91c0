#![cfg_attr(not(test), no_std)]

//! Single-button gesture decoder.
//!
//! One physical button drives seven commands: taps, long presses and holds are
//! classified from edge timestamps and dispatched through a [`CommandSink`].

pub mod decoder;
#[cfg(feature = "runtime")]
pub mod runtime;

pub use decoder::{
    ButtonController, Command, CommandHandlers, CommandSink, ConfigError, DecoderOutput,
    DecoderStatus, EdgeKind, GestureDecoder, GlowHint, InputSource, StateId, StatusObserver,
    TimingConfig,
};
