use embassy_time::{Duration, Instant};
use heapless::Vec;
use statig::prelude::*;

use super::{
    config::TimingConfig,
    timers::{HoldCheckpoint, ReleasePurpose, TimerPurpose, TimerSlot},
    types::{Command, DispatchBuffer, StateId},
};

mod helpers;

#[derive(Clone, Copy, Debug)]
pub(super) enum DecoderEvent {
    Press { now: Instant },
    Release { now: Instant },
    Timer { purpose: TimerPurpose, now: Instant },
}

/// Timer changes requested by a handler, applied by the engine in order once
/// the handler returns.
#[derive(Clone, Copy, Debug)]
pub(super) enum TimerOp {
    Arm {
        purpose: TimerPurpose,
        now: Instant,
        after: Duration,
    },
    Cancel(TimerSlot),
}

#[derive(Default)]
pub(super) struct DispatchContext {
    pub(super) commands: DispatchBuffer,
    pub(super) timer_ops: Vec<TimerOp, 8>,
    pub(super) press_started: bool,
}

impl DispatchContext {
    pub(super) fn arm(&mut self, purpose: TimerPurpose, now: Instant, after: Duration) {
        self.push_timer_op(TimerOp::Arm {
            purpose,
            now,
            after,
        });
    }

    pub(super) fn cancel(&mut self, slot: TimerSlot) {
        self.push_timer_op(TimerOp::Cancel(slot));
    }

    fn push_timer_op(&mut self, op: TimerOp) {
        if self.timer_ops.push(op).is_err() {
            log::warn!("decoder: timer op queue full, dropped {:?}", op);
        }
    }
}

/// Timing of one completed press, captured before any state handling.
#[derive(Clone, Copy, Debug)]
pub(super) struct Release {
    pub(super) now: Instant,
    pub(super) held: Duration,
    pub(super) gap: Duration,
}

pub(super) struct DecoderHsm {
    pub(super) config: TimingConfig,
    pub(super) state_id: StateId,
    pub(super) last_command: Option<Command>,
    pub(super) tap_seq: u8,
    pub(super) pressed: bool,
    pub(super) last_down: Instant,
    pub(super) last_up: Instant,
    pub(super) last_gap: Duration,
    pub(super) last_press: Duration,
    pub(super) hold_step: u8,
}

#[state_machine(initial = "State::idle()")]
impl DecoderHsm {
    #[state(superstate = "input")]
    fn idle(&mut self, context: &mut DispatchContext, event: &DecoderEvent) -> Outcome<State> {
        match event {
            DecoderEvent::Release { now } => {
                let release = self.begin_release(context, *now);
                self.idle_release(context, release)
            }
            DecoderEvent::Timer {
                purpose: TimerPurpose::Release(ReleasePurpose::FinalizeTaps),
                now,
            } => self.finalize_taps(context, *now),
            DecoderEvent::Timer {
                purpose: TimerPurpose::Hold(HoldCheckpoint::ExtraLong),
                now,
            } => {
                match self.tap_seq {
                    0 => self.dispatch(context, Command::Next, 1),
                    1 => self.dispatch(context, Command::Prev, 1),
                    _ => {}
                }
                self.arm_super_long(context, *now);
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "input")]
    fn combo(&mut self, context: &mut DispatchContext, event: &DecoderEvent) -> Outcome<State> {
        match event {
            DecoderEvent::Release { now } => {
                let release = self.begin_release(context, *now);
                self.combo_release(context, release)
            }
            DecoderEvent::Timer {
                purpose: TimerPurpose::Release(ReleasePurpose::ComboExpiry),
                ..
            } => self.enter(StateId::Idle),
            DecoderEvent::Timer {
                purpose: TimerPurpose::Hold(HoldCheckpoint::ExtraLong),
                now,
            } => {
                if self.repeatable_command().is_some() {
                    self.start_hold(context, *now)
                } else {
                    log::debug!(
                        "decoder: extra-long in combo without repeatable command last={:?}",
                        self.last_command
                    );
                    self.arm_super_long(context, *now);
                    Handled
                }
            }
            _ => Super,
        }
    }

    #[state(superstate = "input")]
    fn holding(&mut self, context: &mut DispatchContext, event: &DecoderEvent) -> Outcome<State> {
        match event {
            DecoderEvent::Release { now } => {
                let release = self.begin_release(context, *now);
                self.holding_release(context, release)
            }
            DecoderEvent::Timer {
                purpose: TimerPurpose::Repeat,
                now,
            } => {
                self.repeat_tick(context, *now);
                Handled
            }
            DecoderEvent::Timer {
                purpose:
                    TimerPurpose::Hold(HoldCheckpoint::ExtraLong | HoldCheckpoint::Accelerate),
                now,
            } => {
                if self.held_for(*now) >= self.config.super_long {
                    return self.menu(context);
                }
                if self.repeatable_command().is_some() {
                    self.accelerate_hold(context, *now);
                } else {
                    log::warn!(
                        "decoder: holding without repeatable command last={:?}",
                        self.last_command
                    );
                    self.arm_super_long(context, *now);
                }
                Handled
            }
            _ => Super,
        }
    }

    #[superstate]
    fn input(&mut self, context: &mut DispatchContext, event: &DecoderEvent) -> Outcome<State> {
        match event {
            DecoderEvent::Press { now } => {
                self.press(context, *now);
                Handled
            }
            DecoderEvent::Timer {
                purpose: TimerPurpose::Hold(HoldCheckpoint::LongPress),
                now,
            } => {
                let remaining = self
                    .config
                    .extra_long
                    .checked_sub(self.config.long_press)
                    .unwrap_or(self.config.extra_long);
                context.arm(
                    TimerPurpose::Hold(HoldCheckpoint::ExtraLong),
                    *now,
                    remaining,
                );
                Handled
            }
            DecoderEvent::Timer {
                purpose: TimerPurpose::Hold(HoldCheckpoint::SuperLong),
                ..
            } => self.menu(context),
            DecoderEvent::Timer {
                purpose: TimerPurpose::Hold(checkpoint),
                now,
            } => {
                if self.held_for(*now) >= self.config.super_long {
                    return self.menu(context);
                }
                log::warn!(
                    "decoder: unhandled hold checkpoint={:?} state={}",
                    checkpoint,
                    self.state_id
                );
                Handled
            }
            DecoderEvent::Timer { purpose, .. } => {
                log::debug!(
                    "decoder: timer no longer relevant purpose={:?} state={}",
                    purpose,
                    self.state_id
                );
                Handled
            }
            DecoderEvent::Release { .. } => Handled,
        }
    }
}

#[cfg(test)]
mod tests;
