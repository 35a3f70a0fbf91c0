use embassy_time::{Duration, Instant};
use statig::blocking::IntoStateMachineExt as _;

use super::{
    config::{ConfigError, TimingConfig},
    hsm::{DecoderEvent, DecoderHsm, DispatchContext, TimerOp},
    status::DecoderStatus,
    timers::{PendingTimer, TimerBank, TimerHandle, TimerPurpose, TimerSlot},
    types::{Command, DispatchBuffer, StateId},
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecoderOutput {
    pub commands: DispatchBuffer,
    pub press_started: bool,
    /// False when the input was dropped: a repeated edge or a stale timer.
    pub accepted: bool,
    pub status: DecoderStatus,
}

/// Single-button gesture decoder.
///
/// The decoder owns no clock. Every call passes the current time, and timer
/// deadlines are surfaced through [`GestureDecoder::next_deadline`] so the host
/// decides how to sleep until the next one.
pub struct GestureDecoder {
    machine: statig::blocking::StateMachine<DecoderHsm>,
    timers: TimerBank,
}

impl Default for GestureDecoder {
    fn default() -> Self {
        Self::new(TimingConfig::DEFAULT)
    }
}

impl GestureDecoder {
    pub fn new(config: TimingConfig) -> Self {
        Self {
            machine: DecoderHsm::new(config).state_machine(),
            timers: TimerBank::new(),
        }
    }

    pub fn try_new(config: TimingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &TimingConfig {
        &self.machine.inner().config
    }

    pub fn state(&self) -> StateId {
        self.machine.inner().state_id
    }

    pub fn last_command(&self) -> Option<Command> {
        self.machine.inner().last_command
    }

    pub fn tap_seq(&self) -> u8 {
        self.machine.inner().tap_seq
    }

    pub fn hold_step(&self) -> u8 {
        self.machine.inner().hold_step
    }

    pub fn is_down(&self) -> bool {
        self.machine.inner().pressed
    }

    pub fn button_down(&mut self, now: Instant) -> DecoderOutput {
        if self.is_down() {
            log::debug!("decoder: ignored repeated down at_ms={}", now.as_millis());
            return self.rejected(now);
        }
        self.handle(DecoderEvent::Press { now }, now)
    }

    pub fn button_up(&mut self, now: Instant) -> DecoderOutput {
        if !self.is_down() {
            log::debug!("decoder: ignored up without down at_ms={}", now.as_millis());
            return self.rejected(now);
        }
        self.handle(DecoderEvent::Release { now }, now)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_due().map(|pending| pending.deadline)
    }

    pub fn pending_timers(&self) -> impl Iterator<Item = PendingTimer> {
        self.timers.pending()
    }

    pub fn armed(&self, slot: TimerSlot) -> Option<TimerPurpose> {
        self.timers.purpose(slot)
    }

    /// Delivers a timer fire from an external scheduler. Handles that were
    /// re-armed or cancelled since they were issued are ignored.
    pub fn fire(&mut self, handle: TimerHandle, now: Instant) -> DecoderOutput {
        match self.timers.take(handle) {
            Some(pending) => self.handle(
                DecoderEvent::Timer {
                    purpose: pending.purpose,
                    now,
                },
                now,
            ),
            None => {
                log::debug!("decoder: stale timer {:?} ignored", handle);
                self.rejected(now)
            }
        }
    }

    /// Fires the earliest timer due at or before `now`, evaluated at its own
    /// deadline. Call repeatedly until it returns `None`.
    pub fn fire_next_due(&mut self, now: Instant) -> Option<DecoderOutput> {
        let pending = self.timers.next_due().filter(|pending| pending.deadline <= now)?;
        Some(self.fire(pending.handle, pending.deadline))
    }

    pub fn status(&self, now: Instant) -> DecoderStatus {
        let hsm = self.machine.inner();
        DecoderStatus {
            state: hsm.state_id,
            last_command: hsm.last_command,
            tap_seq: hsm.tap_seq,
            hold_step: hsm.hold_step,
            is_down: hsm.pressed,
            down_duration: if hsm.pressed {
                now.saturating_duration_since(hsm.last_down)
            } else {
                Duration::from_ticks(0)
            },
            last_press: hsm.last_press,
            last_gap: hsm.last_gap,
            long_press: hsm.config.long_press,
            extra_long: hsm.config.extra_long,
        }
    }

    fn handle(&mut self, event: DecoderEvent, now: Instant) -> DecoderOutput {
        let mut context = DispatchContext::default();
        self.machine.handle_with_context(&event, &mut context);
        for op in &context.timer_ops {
            match *op {
                TimerOp::Arm {
                    purpose,
                    now,
                    after,
                } => {
                    self.timers.arm(purpose, now, after);
                }
                TimerOp::Cancel(slot) => {
                    self.timers.cancel(slot);
                }
            }
        }
        DecoderOutput {
            commands: context.commands,
            press_started: context.press_started,
            accepted: true,
            status: self.status(now),
        }
    }

    fn rejected(&self, now: Instant) -> DecoderOutput {
        DecoderOutput {
            commands: DispatchBuffer::new(),
            press_started: false,
            accepted: false,
            status: self.status(now),
        }
    }
}
