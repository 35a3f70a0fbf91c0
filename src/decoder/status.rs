use embassy_time::Duration;

use super::types::{Command, StateId};

/// Feedback colour class a display may show around the button.
///
/// `Primary` marks the gesture that commits the "forward" command (Ok, Next,
/// Increase), `Alternate` its counterpart, `Repeat` an active hold-repeat.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum GlowHint {
    #[default]
    Off,
    Primary,
    Alternate,
    Repeat,
}

/// Read-only view of the decoder after a transition completed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DecoderStatus {
    pub state: StateId,
    pub last_command: Option<Command>,
    pub tap_seq: u8,
    pub hold_step: u8,
    pub is_down: bool,
    /// Time held so far, zero while the button is up.
    pub down_duration: Duration,
    /// Duration of the most recently recorded release.
    pub last_press: Duration,
    pub last_gap: Duration,
    pub long_press: Duration,
    pub extra_long: Duration,
}

impl DecoderStatus {
    pub fn glow(&self) -> GlowHint {
        match self.state {
            StateId::Idle if self.is_down => self.pending_press_glow(),
            StateId::Idle => GlowHint::Off,
            StateId::Combo => match self.last_command {
                Some(Command::Increase | Command::Ok | Command::Prev) => GlowHint::Primary,
                _ => GlowHint::Alternate,
            },
            StateId::Holding => GlowHint::Repeat,
        }
    }

    /// While idle and held, previews which command releasing now would give.
    fn pending_press_glow(&self) -> GlowHint {
        let held = self.down_duration;
        match (self.tap_seq, held >= self.extra_long, held > self.long_press) {
            (0, true, _) => GlowHint::Alternate,
            (1, true, _) => GlowHint::Primary,
            (0, false, true) => GlowHint::Primary,
            (1, false, true) => GlowHint::Alternate,
            _ => GlowHint::Off,
        }
    }
}

impl core::fmt::Display for DecoderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let last = self.last_command.map_or("none", Command::label);
        let down_ms = if self.is_down {
            self.down_duration.as_millis()
        } else {
            self.last_press.as_millis()
        };
        write!(
            f,
            "state={} last={} step={} down_ms={} gap_ms={}",
            self.state,
            last,
            self.hold_step,
            down_ms,
            self.last_gap.as_millis()
        )
    }
}
