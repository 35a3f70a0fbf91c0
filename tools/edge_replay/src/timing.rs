use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use embassy_time::Duration;
use serde::Deserialize;
use unibutton::TimingConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TimingFile {
    #[serde(default)]
    timing: TimingOverrides,
}

/// Millisecond overrides; missing keys keep the default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TimingOverrides {
    fast_double_tap_ms: Option<u64>,
    tap_time_max_ms: Option<u64>,
    double_tap_gap_ms: Option<u64>,
    long_press_ms: Option<u64>,
    extra_long_ms: Option<u64>,
    super_long_ms: Option<u64>,
    command_gap_ms: Option<u64>,
    flip_gap_ms: Option<u64>,
    hold_interval_ms: Option<u64>,
    max_hold_step: Option<u8>,
}

/// Ten minutes; anything longer is a typo rather than a gesture.
const MAX_OVERRIDE_MS: u64 = 600_000;

pub fn load_timing(path: &Path) -> Result<TimingConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read timing config {}", path.display()))?;
    parse_timing(&text).with_context(|| format!("invalid timing config {}", path.display()))
}

pub fn parse_timing(text: &str) -> Result<TimingConfig> {
    let file: TimingFile = toml::from_str(text)?;
    let overrides = file.timing;

    let mut config = TimingConfig::DEFAULT;
    if let Some(ms) = overrides.extra_long_ms {
        // super_long follows extra_long unless given explicitly.
        config = config.with_extra_long(millis("extra_long_ms", ms)?);
    }
    let fields = [
        ("fast_double_tap_ms", overrides.fast_double_tap_ms, &mut config.fast_double_tap),
        ("tap_time_max_ms", overrides.tap_time_max_ms, &mut config.tap_time_max),
        ("double_tap_gap_ms", overrides.double_tap_gap_ms, &mut config.double_tap_gap),
        ("long_press_ms", overrides.long_press_ms, &mut config.long_press),
        ("super_long_ms", overrides.super_long_ms, &mut config.super_long),
        ("command_gap_ms", overrides.command_gap_ms, &mut config.command_gap),
        ("flip_gap_ms", overrides.flip_gap_ms, &mut config.flip_gap),
        ("hold_interval_ms", overrides.hold_interval_ms, &mut config.hold_interval),
    ];
    for (name, value, slot) in fields {
        if let Some(ms) = value {
            *slot = millis(name, ms)?;
        }
    }
    if let Some(step) = overrides.max_hold_step {
        config.max_hold_step = step;
    }

    config.validate()?;
    Ok(config)
}

fn millis(name: &str, ms: u64) -> Result<Duration> {
    if ms > MAX_OVERRIDE_MS {
        bail!("{name} = {ms} exceeds {MAX_OVERRIDE_MS} ms");
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_keeps_defaults() {
        assert_eq!(parse_timing("").expect("empty is valid"), TimingConfig::DEFAULT);
    }

    #[test]
    fn extra_long_override_moves_super_long() {
        let config = parse_timing("[timing]\nextra_long_ms = 1000\nhold_interval_ms = 80\n")
            .expect("valid overrides");
        assert_eq!(config.extra_long.as_millis(), 1_000);
        assert_eq!(config.super_long.as_millis(), 5_000);
        assert_eq!(config.hold_interval.as_millis(), 80);
        assert_eq!(config.long_press, TimingConfig::DEFAULT.long_press);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_ladders() {
        assert!(parse_timing("[timing]\nlong_pres_ms = 10\n").is_err());

        let err = parse_timing("[timing]\nlong_press_ms = 2000\n").expect_err("ladder broken");
        assert!(format!("{err:#}").contains("long_press must be below extra_long"));
    }

    #[test]
    fn rejects_out_of_range_milliseconds() {
        for key in ["extra_long_ms", "hold_interval_ms"] {
            let text = format!("[timing]\n{key} = 9223372036854775807\n");
            let err = parse_timing(&text).expect_err("value out of range");
            assert!(
                format!("{err:#}").contains(&format!("{key} = 9223372036854775807 exceeds")),
                "{key}: {err:#}"
            );
        }
        assert!(parse_timing("[timing]\ncommand_gap_ms = 600001\n").is_err());
    }
}
