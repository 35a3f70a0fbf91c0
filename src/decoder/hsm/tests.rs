use super::*;
use crate::decoder::engine::{DecoderOutput, GestureDecoder};

struct Bench {
    decoder: GestureDecoder,
    log: std::vec::Vec<(u64, Command)>,
}

impl Bench {
    fn new() -> Self {
        Self::with_config(TimingConfig::DEFAULT)
    }

    fn with_config(config: TimingConfig) -> Self {
        Self {
            decoder: GestureDecoder::new(config),
            log: std::vec::Vec::new(),
        }
    }

    fn advance(&mut self, ms: u64) {
        let now = Instant::from_millis(ms);
        while let Some(deadline) = self.decoder.next_deadline().filter(|d| *d <= now) {
            let output = self
                .decoder
                .fire_next_due(now)
                .expect("deadline reported as due");
            for command in output.commands.commands() {
                self.log.push((deadline.as_millis(), command));
            }
        }
    }

    fn down(&mut self, ms: u64) -> DecoderOutput {
        self.advance(ms);
        let output = self.decoder.button_down(Instant::from_millis(ms));
        self.stamp(ms, &output);
        output
    }

    fn up(&mut self, ms: u64) -> DecoderOutput {
        self.advance(ms);
        let output = self.decoder.button_up(Instant::from_millis(ms));
        self.stamp(ms, &output);
        output
    }

    fn tap(&mut self, down_ms: u64, up_ms: u64) {
        self.down(down_ms);
        self.up(up_ms);
    }

    fn stamp(&mut self, ms: u64, output: &DecoderOutput) {
        for command in output.commands.commands() {
            self.log.push((ms, command));
        }
    }

    fn commands(&self) -> std::vec::Vec<Command> {
        self.log.iter().map(|(_, command)| *command).collect()
    }

    fn count_since(&self, ms: u64, command: Command) -> usize {
        self.log
            .iter()
            .filter(|(at, seen)| *at >= ms && *seen == command)
            .count()
    }
}

#[test]
fn single_tap_dispatches_increase_after_double_tap_gap() {
    let mut bench = Bench::new();
    bench.tap(0, 100);
    bench.advance(299);
    assert!(bench.log.is_empty());

    bench.advance(300);
    assert_eq!(bench.log, std::vec![(300, Command::Increase)]);
    assert_eq!(bench.decoder.state(), StateId::Combo);

    bench.advance(1_000);
    assert_eq!(bench.decoder.state(), StateId::Idle);
}

#[test]
fn double_tap_dispatches_decrease() {
    let mut bench = Bench::new();
    bench.tap(0, 100);
    bench.tap(150, 250);
    assert_eq!(bench.decoder.tap_seq(), 2);

    bench.advance(450);
    assert_eq!(bench.log, std::vec![(450, Command::Decrease)]);
    assert_eq!(bench.decoder.state(), StateId::Combo);
}

#[test]
fn triple_tap_dispatches_increase_three_times_at_once() {
    let mut bench = Bench::new();
    bench.tap(0, 100);
    bench.tap(150, 250);
    bench.tap(300, 400);

    assert_eq!(
        bench.log,
        std::vec![
            (400, Command::Increase),
            (400, Command::Increase),
            (400, Command::Increase)
        ]
    );
    assert_eq!(bench.decoder.state(), StateId::Combo);
    assert_eq!(bench.decoder.tap_seq(), 0);
}

#[test]
fn long_press_dispatches_ok_on_release() {
    let mut bench = Bench::new();
    bench.tap(0, 500);
    assert_eq!(bench.log, std::vec![(500, Command::Ok)]);
    assert_eq!(bench.decoder.state(), StateId::Combo);
}

#[test]
fn tap_then_long_press_dispatches_back() {
    let mut bench = Bench::new();
    bench.tap(0, 100);
    bench.tap(200, 700);
    assert_eq!(bench.commands(), std::vec![Command::Back]);
}

#[test]
fn press_between_tap_max_and_long_press_is_silent() {
    let mut bench = Bench::new();
    bench.tap(0, 300);
    bench.advance(2_000);
    assert!(bench.log.is_empty());
    assert_eq!(bench.decoder.state(), StateId::Idle);
}

#[test]
fn extra_long_hold_dispatches_next_while_still_down() {
    let mut bench = Bench::new();
    bench.down(0);
    bench.advance(1_300);
    assert_eq!(bench.log, std::vec![(1_300, Command::Next)]);
    assert!(bench.decoder.is_down());

    bench.up(1_500);
    assert_eq!(bench.commands(), std::vec![Command::Next]);
    assert_eq!(bench.decoder.state(), StateId::Combo);
}

#[test]
fn tap_then_extra_long_hold_dispatches_prev() {
    let mut bench = Bench::new();
    bench.tap(0, 100);
    bench.down(200);
    bench.advance(1_500);
    assert_eq!(bench.log, std::vec![(1_500, Command::Prev)]);
}

#[test]
fn super_long_hold_dispatches_menu() {
    let mut bench = Bench::new();
    bench.down(0);
    bench.advance(6_199);
    assert_eq!(bench.commands(), std::vec![Command::Next]);

    bench.advance(6_200);
    assert_eq!(
        bench.log,
        std::vec![(1_300, Command::Next), (6_200, Command::Menu)]
    );

    bench.up(6_300);
    assert_eq!(bench.log.len(), 2);
}

#[test]
fn combo_tap_repeats_last_command() {
    let mut bench = Bench::new();
    bench.tap(0, 100);
    bench.advance(300);
    bench.tap(500, 600);
    bench.tap(800, 900);

    assert_eq!(
        bench.log,
        std::vec![
            (300, Command::Increase),
            (600, Command::Increase),
            (900, Command::Increase)
        ]
    );
    assert_eq!(bench.decoder.state(), StateId::Combo);
}

#[test]
fn combo_repeat_extends_the_window() {
    let mut bench = Bench::new();
    bench.tap(0, 100);
    bench.advance(300);
    bench.tap(500, 600);

    bench.advance(1_299);
    assert_eq!(bench.decoder.state(), StateId::Combo);
    bench.advance(1_300);
    assert_eq!(bench.decoder.state(), StateId::Idle);
}

#[test]
fn combo_gap_over_command_gap_falls_back_to_idle_silently() {
    let mut bench = Bench::new();
    bench.tap(0, 100);
    bench.advance(300);
    bench.tap(900, 1_000);

    assert_eq!(bench.commands(), std::vec![Command::Increase]);
    assert_eq!(bench.decoder.state(), StateId::Idle);
    let status = bench.decoder.status(Instant::from_millis(1_000));
    assert_eq!(status.last_gap, Duration::from_millis(0));

    bench.tap(1_100, 1_200);
    bench.advance(1_400);
    assert_eq!(
        bench.commands(),
        std::vec![Command::Increase, Command::Increase]
    );
}

#[test]
fn combo_long_press_issues_ok_and_keeps_repeat_target() {
    let mut bench = Bench::new();
    bench.tap(0, 100);
    bench.advance(300);
    bench.tap(500, 900);
    assert_eq!(
        bench.commands(),
        std::vec![Command::Increase, Command::Ok]
    );
    assert_eq!(bench.decoder.last_command(), Some(Command::Increase));

    bench.tap(1_000, 1_100);
    assert_eq!(
        bench.commands(),
        std::vec![Command::Increase, Command::Ok, Command::Increase]
    );
}

#[test]
fn combo_flip_dispatches_decrease_without_prior_command() {
    let mut bench = Bench::new();
    bench.tap(0, 100);
    bench.tap(150, 250);
    // Long press after a double tap commits nothing.
    bench.tap(300, 700);
    assert!(bench.log.is_empty());
    assert_eq!(bench.decoder.state(), StateId::Combo);

    bench.tap(900, 950);
    assert_eq!(bench.decoder.tap_seq(), 1);
    bench.tap(1_000, 1_050);
    assert_eq!(bench.log, std::vec![(1_050, Command::Decrease)]);
    assert_eq!(bench.decoder.last_command(), Some(Command::Decrease));

    // The flip leaves no expiry behind, so combo outlives the command gap.
    assert_eq!(bench.decoder.armed(TimerSlot::Release), None);
    bench.advance(3_000);
    assert_eq!(bench.decoder.state(), StateId::Combo);
    assert_eq!(bench.log.len(), 1);
}

#[test]
fn combo_hold_enters_repeat_and_accelerates() {
    let mut bench = Bench::new();
    bench.tap(0, 100);
    bench.advance(300);
    bench.down(500);

    bench.advance(1_799);
    assert_eq!(bench.decoder.state(), StateId::Combo);
    bench.advance(1_800);
    assert_eq!(bench.decoder.state(), StateId::Holding);
    assert_eq!(bench.decoder.hold_step(), 1);

    bench.advance(3_100);
    assert_eq!(bench.count_since(1_800, Command::Increase), 9);
    assert_eq!(bench.decoder.hold_step(), 2);

    bench.advance(3_150);
    assert_eq!(bench.count_since(3_150, Command::Increase), 2);

    bench.advance(4_400);
    assert_eq!(bench.decoder.hold_step(), 4);
    bench.advance(5_700);
    assert_eq!(bench.decoder.hold_step(), 8);
}

#[test]
fn hold_repeat_continues_after_release_until_tap() {
    let mut bench = Bench::new();
    bench.tap(0, 100);
    bench.advance(300);
    bench.down(500);
    bench.up(3_200);
    assert_eq!(bench.decoder.state(), StateId::Holding);

    assert_eq!(bench.decoder.hold_step(), 2);

    let before = bench.log.len();
    bench.advance(3_350);
    assert!(bench.log.len() > before);

    // Between tap and long press: neither stops nor slows the repeat.
    bench.tap(3_400, 3_700);
    assert_eq!(bench.decoder.state(), StateId::Holding);
    assert_eq!(bench.decoder.hold_step(), 2);
    let before = bench.log.len();
    bench.advance(3_760);
    assert_eq!(bench.log.len(), before + 2);

    bench.tap(3_800, 3_900);
    assert_eq!(bench.decoder.state(), StateId::Idle);
    let settled = bench.log.len();
    bench.advance(5_000);
    assert_eq!(bench.log.len(), settled);
}

#[test]
fn long_press_while_holding_halves_step_then_exits() {
    let mut bench = Bench::new();
    bench.tap(0, 100);
    bench.advance(300);
    bench.down(500);
    bench.up(4_500);
    assert_eq!(bench.decoder.hold_step(), 4);

    bench.tap(4_600, 5_000);
    assert_eq!(bench.decoder.hold_step(), 2);
    bench.tap(5_100, 5_500);
    assert_eq!(bench.decoder.hold_step(), 1);
    assert_eq!(bench.decoder.state(), StateId::Holding);

    bench.tap(5_600, 6_000);
    assert_eq!(bench.decoder.state(), StateId::Idle);
    let settled = bench.log.len();
    bench.advance(8_000);
    assert_eq!(bench.log.len(), settled);
}

#[test]
fn hold_step_is_clamped() {
    let config = TimingConfig {
        max_hold_step: 2,
        ..TimingConfig::DEFAULT
    };
    let mut bench = Bench::with_config(config);
    bench.tap(0, 100);
    bench.advance(300);
    bench.down(500);
    bench.advance(5_700);
    assert_eq!(bench.decoder.hold_step(), 2);
}

#[test]
fn menu_ends_a_running_hold() {
    let mut bench = Bench::new();
    bench.tap(0, 100);
    bench.advance(300);
    bench.down(500);

    bench.advance(6_699);
    assert_eq!(bench.decoder.state(), StateId::Holding);
    bench.advance(6_700);
    assert_eq!(bench.log.last(), Some(&(6_700, Command::Menu)));
    assert_eq!(bench.decoder.state(), StateId::Idle);

    let settled = bench.log.len();
    bench.advance(9_000);
    assert_eq!(bench.log.len(), settled);
}

#[test]
fn repeated_edges_are_ignored() {
    let mut bench = Bench::new();
    assert!(!bench.up(10).accepted);

    assert!(bench.down(20).accepted);
    let repeated = bench.down(40);
    assert!(!repeated.accepted);
    assert!(repeated.commands.is_empty());

    assert!(bench.up(100).accepted);
    assert!(!bench.up(110).accepted);
    bench.advance(400);
    assert_eq!(bench.commands(), std::vec![Command::Increase]);
}

#[test]
fn stale_timer_handle_is_ignored() {
    let mut bench = Bench::new();
    bench.down(0);
    let long_press = bench
        .decoder
        .pending_timers()
        .find(|pending| pending.purpose == TimerPurpose::Hold(HoldCheckpoint::LongPress))
        .expect("long press armed");
    bench.up(100);
    bench.down(150);

    let output = bench.decoder.fire(long_press.handle, Instant::from_millis(350));
    assert!(!output.accepted);
    assert_eq!(
        bench.decoder.armed(TimerSlot::Hold),
        Some(TimerPurpose::Hold(HoldCheckpoint::LongPress))
    );
}

#[test]
fn press_start_is_reported_only_on_down() {
    let mut bench = Bench::new();
    assert!(bench.down(0).press_started);
    assert!(!bench.up(100).press_started);
}
