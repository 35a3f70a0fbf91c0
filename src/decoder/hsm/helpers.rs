use embassy_time::{Duration, Instant};
use statig::prelude::*;

use super::{DecoderHsm, DispatchContext, Release, State};
use crate::decoder::{
    config::TimingConfig,
    timers::{HoldCheckpoint, ReleasePurpose, TimerPurpose, TimerSlot},
    types::{Command, StateId},
};

impl DecoderHsm {
    pub(in crate::decoder) fn new(config: TimingConfig) -> Self {
        Self {
            config,
            state_id: StateId::Idle,
            last_command: None,
            tap_seq: 0,
            pressed: false,
            last_down: Instant::from_ticks(0),
            last_up: Instant::from_ticks(0),
            last_gap: Duration::from_ticks(0),
            last_press: Duration::from_ticks(0),
            hold_step: 1,
        }
    }

    pub(super) fn held_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_down)
    }

    pub(super) fn repeatable_command(&self) -> Option<Command> {
        self.last_command.filter(|command| command.is_repeatable())
    }

    pub(super) fn dispatch(&mut self, context: &mut DispatchContext, command: Command, repeat: u8) {
        log::trace!(
            "decoder: dispatch command={} repeat={} state={}",
            command,
            repeat,
            self.state_id
        );
        context.commands.push(command, repeat);
        self.last_command = Some(command);
        self.tap_seq = 0;
    }

    pub(super) fn enter(&mut self, state_id: StateId) -> Outcome<State> {
        log::trace!("decoder: enter {} -> {}", self.state_id, state_id);
        self.state_id = state_id;
        self.tap_seq = 0;
        match state_id {
            StateId::Idle => Transition(State::idle()),
            StateId::Combo => Transition(State::combo()),
            StateId::Holding => Transition(State::holding()),
        }
    }

    fn enter_combo(&mut self, context: &mut DispatchContext, now: Instant) -> Outcome<State> {
        self.arm_combo_expiry(context, now);
        self.enter(StateId::Combo)
    }

    fn arm_combo_expiry(&self, context: &mut DispatchContext, now: Instant) {
        context.arm(
            TimerPurpose::Release(ReleasePurpose::ComboExpiry),
            now,
            self.config.command_gap,
        );
    }

    /// Schedules the menu checkpoint at `super_long` after the current press began.
    pub(super) fn arm_super_long(&self, context: &mut DispatchContext, now: Instant) {
        let deadline = self.last_down + self.config.super_long;
        context.arm(
            TimerPurpose::Hold(HoldCheckpoint::SuperLong),
            now,
            deadline.saturating_duration_since(now),
        );
    }

    pub(super) fn press(&mut self, context: &mut DispatchContext, now: Instant) {
        context.cancel(TimerSlot::Hold);
        context.cancel(TimerSlot::Release);
        context.arm(
            TimerPurpose::Hold(HoldCheckpoint::LongPress),
            now,
            self.config.long_press,
        );
        self.last_down = now;
        self.pressed = true;
        context.press_started = true;
    }

    pub(super) fn begin_release(&mut self, context: &mut DispatchContext, now: Instant) -> Release {
        let release = Release {
            now,
            held: now.saturating_duration_since(self.last_down),
            gap: self.last_down.saturating_duration_since(self.last_up),
        };
        self.pressed = false;
        context.cancel(TimerSlot::Hold);
        context.cancel(TimerSlot::Release);
        release
    }

    fn record_release(&mut self, release: Release) {
        self.last_up = release.now;
        self.last_gap = release.gap;
        self.last_press = release.held;
    }

    pub(super) fn idle_release(
        &mut self,
        context: &mut DispatchContext,
        release: Release,
    ) -> Outcome<State> {
        let config = self.config;
        if release.held < config.tap_time_max {
            self.tap_seq = self.tap_seq.saturating_add(1);
            if self.tap_seq < 3 {
                context.arm(
                    TimerPurpose::Release(ReleasePurpose::FinalizeTaps),
                    release.now,
                    config.double_tap_gap,
                );
                self.record_release(release);
                return Handled;
            }
            // Triple tap repeats Increase, not Decrease.
            for _ in 0..3 {
                self.dispatch(context, Command::Increase, 1);
            }
        } else if (config.long_press..config.extra_long).contains(&release.held) {
            match self.tap_seq {
                0 => self.dispatch(context, Command::Ok, 1),
                1 => self.dispatch(context, Command::Back, 1),
                _ => {}
            }
        }
        // Extra-long and longer presses already emitted from the hold cascade.
        self.record_release(release);
        self.enter_combo(context, release.now)
    }

    pub(super) fn finalize_taps(
        &mut self,
        context: &mut DispatchContext,
        now: Instant,
    ) -> Outcome<State> {
        let outcome = match self.tap_seq {
            1 => {
                self.dispatch(context, Command::Increase, 1);
                self.enter_combo(context, now)
            }
            2 => {
                self.dispatch(context, Command::Decrease, 1);
                self.enter_combo(context, now)
            }
            _ => Handled,
        };
        self.tap_seq = 0;
        outcome
    }

    pub(super) fn combo_release(
        &mut self,
        context: &mut DispatchContext,
        release: Release,
    ) -> Outcome<State> {
        let config = self.config;
        if release.gap > config.command_gap {
            // last_up and last_gap keep their pre-press values here.
            return self.enter(StateId::Idle);
        }

        if release.held < config.fast_double_tap {
            if self.tap_seq == 0 && release.gap > release.held * 2 {
                self.tap_seq = 1;
            } else if self.tap_seq == 1 && release.gap < config.flip_gap {
                let flipped = match self.last_command {
                    Some(Command::Decrease) => Command::Increase,
                    _ => Command::Decrease,
                };
                self.dispatch(context, flipped, 1);
                // Combo expiry is not re-armed after a flip.
                self.record_release(release);
                return Handled;
            } else {
                self.tap_seq = 0;
            }
        } else {
            self.tap_seq = 0;
        }

        if release.held < config.tap_time_max {
            if let Some(command) = self.last_command {
                self.dispatch(context, command, 1);
                self.arm_combo_expiry(context, release.now);
            }
        } else if (config.long_press..config.extra_long).contains(&release.held) {
            let repeatable = self.last_command;
            self.dispatch(context, Command::Ok, 1);
            self.last_command = repeatable;
            self.arm_combo_expiry(context, release.now);
        }

        self.record_release(release);
        Handled
    }

    pub(super) fn holding_release(
        &mut self,
        context: &mut DispatchContext,
        release: Release,
    ) -> Outcome<State> {
        let config = self.config;
        let outcome = if (config.long_press..config.extra_long).contains(&release.held) {
            self.decelerate_hold(context)
        } else if release.held < config.tap_time_max {
            self.exit_hold(context)
        } else {
            Handled
        };
        self.record_release(release);
        outcome
    }

    pub(super) fn start_hold(&mut self, context: &mut DispatchContext, now: Instant) -> Outcome<State> {
        self.hold_step = 1;
        let outcome = self.enter(StateId::Holding);
        self.repeat_tick(context, now);
        self.arm_accelerate(context, now);
        outcome
    }

    pub(super) fn accelerate_hold(&mut self, context: &mut DispatchContext, now: Instant) {
        self.hold_step = self
            .hold_step
            .saturating_mul(2)
            .min(self.config.max_hold_step);
        log::trace!("decoder: accelerate hold_step={}", self.hold_step);
        self.arm_accelerate(context, now);
    }

    /// Next acceleration checkpoint, never later than the menu threshold of
    /// the current press.
    fn arm_accelerate(&self, context: &mut DispatchContext, now: Instant) {
        let menu_at = self.last_down + self.config.super_long;
        let after = self
            .config
            .extra_long
            .min(menu_at.saturating_duration_since(now));
        context.arm(TimerPurpose::Hold(HoldCheckpoint::Accelerate), now, after);
    }

    fn decelerate_hold(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        if self.hold_step <= 1 {
            self.hold_step = 1;
            return self.exit_hold(context);
        }
        self.hold_step = (self.hold_step / 2).max(1);
        log::trace!("decoder: decelerate hold_step={}", self.hold_step);
        Handled
    }

    fn exit_hold(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        context.cancel(TimerSlot::Repeat);
        self.enter(StateId::Idle)
    }

    pub(super) fn repeat_tick(&mut self, context: &mut DispatchContext, now: Instant) {
        if let Some(command) = self.last_command {
            self.dispatch(context, command, self.hold_step);
        }
        context.arm(TimerPurpose::Repeat, now, self.config.hold_interval);
    }

    /// Menu ends any hold-repeat so the loop cannot re-fire it.
    pub(super) fn menu(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        self.dispatch(context, Command::Menu, 1);
        if self.state_id == StateId::Holding {
            return self.exit_hold(context);
        }
        Handled
    }
}
