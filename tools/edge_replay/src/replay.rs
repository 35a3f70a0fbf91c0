use embassy_time::{Duration, Instant};
use unibutton::{ButtonController, Command, CommandSink, StateId, TimingConfig};

use crate::trace::TraceEdge;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReplayRow {
    pub ms: u64,
    pub command: Command,
    pub state: StateId,
}

/// Stamps each delivered command with the replay clock.
#[derive(Default)]
struct RowSink {
    now_ms: u64,
    pending: Vec<(u64, Command)>,
}

impl CommandSink for RowSink {
    fn command(&mut self, command: Command) {
        self.pending.push((self.now_ms, command));
    }
}

struct Replay {
    controller: ButtonController<RowSink>,
    rows: Vec<ReplayRow>,
}

impl Replay {
    fn new(config: TimingConfig) -> Self {
        Self {
            controller: ButtonController::new(config, RowSink::default()),
            rows: Vec::new(),
        }
    }

    /// Fires timers one deadline at a time so each command carries its own
    /// timestamp.
    fn advance_to(&mut self, now: Instant) {
        while let Some(deadline) = self.controller.next_deadline().filter(|d| *d <= now) {
            self.controller.sink_mut().now_ms = deadline.as_millis();
            self.controller.advance(deadline);
            self.collect();
        }
    }

    fn apply(&mut self, edge: TraceEdge) {
        let now = Instant::from_millis(edge.ms);
        self.advance_to(now);
        self.controller.sink_mut().now_ms = edge.ms;
        if !self.controller.edge(edge.kind, edge.source, now) {
            eprintln!("ignored {:?} {:?} edge at {} ms", edge.source, edge.kind, edge.ms);
        }
        self.collect();
    }

    fn collect(&mut self) {
        let state = self.controller.decoder().state();
        let sink = self.controller.sink_mut();
        self.rows.extend(sink.pending.drain(..).map(|(ms, command)| ReplayRow {
            ms,
            command,
            state,
        }));
    }
}

/// Runs the edges through a controller, then lets `tail` elapse after the
/// last edge so pending timers fire.
pub fn replay(config: TimingConfig, edges: &[TraceEdge], tail: Duration) -> Vec<ReplayRow> {
    let mut replay = Replay::new(config);
    for edge in edges {
        replay.apply(*edge);
    }
    let end = edges.last().map_or(0, |edge| edge.ms);
    replay.advance_to(Instant::from_millis(end) + tail);
    replay.rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::parse_trace;

    fn run(trace: &str) -> Vec<ReplayRow> {
        let edges = parse_trace(trace).expect("trace should parse");
        replay(TimingConfig::DEFAULT, &edges, Duration::from_millis(1_000))
    }

    #[test]
    fn single_tap_is_flushed_by_tail() {
        let rows = run("0,down\n100,up\n");
        assert_eq!(
            rows,
            vec![ReplayRow {
                ms: 300,
                command: Command::Increase,
                state: StateId::Combo
            }]
        );
    }

    #[test]
    fn hold_rows_carry_their_own_timestamps() {
        let rows = run("0,down\n100,up\n500,down\n2100,up\n2200,down\n2300,up\n");
        let stamps: Vec<u64> = rows.iter().map(|row| row.ms).collect();
        assert_eq!(stamps, vec![300, 1_800, 1_950, 2_100, 2_250]);
        assert!(rows[1..].iter().all(|row| row.state == StateId::Holding));
    }

    #[test]
    fn key_repeats_are_dropped() {
        let rows = run("0,down,key\n40,down,key\n80,down,key\n500,up,key\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].command, Command::Ok);
        assert_eq!(rows[0].ms, 500);
    }
}
