use embassy_time::Duration;

/// Press and gap thresholds driving the decoder.
///
/// All thresholds are compared against millisecond durations measured between
/// edges, so sub-millisecond precision is never relevant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimingConfig {
    /// Longest press still counted as half of a combo "flip".
    pub fast_double_tap: Duration,
    /// Longest press counted as a tap.
    pub tap_time_max: Duration,
    /// Wait after a tap before the tap count is finalized.
    pub double_tap_gap: Duration,
    pub long_press: Duration,
    pub extra_long: Duration,
    /// Panic/menu threshold.
    pub super_long: Duration,
    /// Combo window: idle gap after which a committed command stops repeating.
    pub command_gap: Duration,
    /// Gap under which the second half of a flip toggles direction.
    pub flip_gap: Duration,
    pub hold_interval: Duration,
    pub max_hold_step: u8,
}

impl TimingConfig {
    pub const DEFAULT: Self = Self {
        fast_double_tap: Duration::from_millis(150),
        tap_time_max: Duration::from_millis(250),
        double_tap_gap: Duration::from_millis(200),
        long_press: Duration::from_millis(350),
        extra_long: Duration::from_millis(1_300),
        super_long: Self::super_long_for(Duration::from_millis(1_300)),
        command_gap: Duration::from_millis(700),
        flip_gap: Duration::from_millis(100),
        hold_interval: Duration::from_millis(150),
        max_hold_step: 16,
    };

    /// Menu fires after four extra-long periods plus one second.
    pub const fn super_long_for(extra_long: Duration) -> Duration {
        Duration::from_ticks(
            extra_long
                .as_ticks()
                .saturating_mul(4)
                .saturating_add(Duration::from_millis(1_000).as_ticks()),
        )
    }

    pub const fn with_extra_long(mut self, extra_long: Duration) -> Self {
        self.extra_long = extra_long;
        self.super_long = Self::super_long_for(extra_long);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("fast_double_tap", self.fast_double_tap),
            ("tap_time_max", self.tap_time_max),
            ("double_tap_gap", self.double_tap_gap),
            ("long_press", self.long_press),
            ("extra_long", self.extra_long),
            ("super_long", self.super_long),
            ("command_gap", self.command_gap),
            ("flip_gap", self.flip_gap),
            ("hold_interval", self.hold_interval),
        ];
        if let Some(&(name, _)) = durations
            .iter()
            .find(|(_, value)| value.as_ticks() == 0)
        {
            return Err(ConfigError::ZeroDuration(name));
        }

        if self.fast_double_tap > self.tap_time_max {
            return Err(ConfigError::ThresholdOrder {
                lower: "fast_double_tap",
                upper: "tap_time_max",
            });
        }

        let ladder = [
            ("tap_time_max", self.tap_time_max),
            ("long_press", self.long_press),
            ("extra_long", self.extra_long),
            ("super_long", self.super_long),
        ];
        for pair in ladder.windows(2) {
            let (lower, lower_value) = pair[0];
            let (upper, upper_value) = pair[1];
            if lower_value >= upper_value {
                return Err(ConfigError::ThresholdOrder { lower, upper });
            }
        }

        if self.max_hold_step == 0 || !self.max_hold_step.is_power_of_two() {
            return Err(ConfigError::HoldStep(self.max_hold_step));
        }

        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigError {
    ZeroDuration(&'static str),
    ThresholdOrder {
        lower: &'static str,
        upper: &'static str,
    },
    HoldStep(u8),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroDuration(name) => write!(f, "{name} must be non-zero"),
            ConfigError::ThresholdOrder { lower, upper } => {
                write!(f, "{lower} must be below {upper}")
            }
            ConfigError::HoldStep(step) => {
                write!(f, "max_hold_step must be a non-zero power of two, got {step}")
            }
        }
    }
}

impl core::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_timings() {
        let config = TimingConfig::DEFAULT;
        assert_eq!(config.fast_double_tap.as_millis(), 150);
        assert_eq!(config.tap_time_max.as_millis(), 250);
        assert_eq!(config.double_tap_gap.as_millis(), 200);
        assert_eq!(config.long_press.as_millis(), 350);
        assert_eq!(config.extra_long.as_millis(), 1_300);
        assert_eq!(config.super_long.as_millis(), 6_200);
        assert_eq!(config.command_gap.as_millis(), 700);
        assert_eq!(config.hold_interval.as_millis(), 150);
        assert_eq!(config.max_hold_step, 16);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn extra_long_override_recomputes_super_long() {
        let config = TimingConfig::DEFAULT.with_extra_long(Duration::from_millis(1_000));
        assert_eq!(config.super_long.as_millis(), 5_000);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn super_long_saturates_for_huge_extra_long() {
        let huge = Duration::from_ticks(u64::MAX / 2);
        assert_eq!(TimingConfig::super_long_for(huge).as_ticks(), u64::MAX);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let config = TimingConfig {
            hold_interval: Duration::from_millis(0),
            ..TimingConfig::DEFAULT
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDuration("hold_interval"))
        );
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let config = TimingConfig {
            long_press: Duration::from_millis(200),
            ..TimingConfig::DEFAULT
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ThresholdOrder {
                lower: "tap_time_max",
                upper: "long_press",
            })
        );
    }

    #[test]
    fn hold_step_must_stay_on_doubling_ladder() {
        let config = TimingConfig {
            max_hold_step: 12,
            ..TimingConfig::DEFAULT
        };
        assert_eq!(config.validate(), Err(ConfigError::HoldStep(12)));
    }
}
