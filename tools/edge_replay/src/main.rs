mod replay;
mod timing;
mod trace;

use std::{path::PathBuf, process};

use anyhow::{bail, Result};
use clap::Parser;
use embassy_time::Duration;
use unibutton::{Command, TimingConfig};

#[derive(Debug, Parser)]
#[command(name = "edge_replay")]
#[command(about = "Replay button edge traces through the gesture decoder")]
struct Cli {
    /// Trace file with `<ms>,<down|up>[,<pointer|key>]` lines.
    trace: PathBuf,
    /// TOML file with a `[timing]` table of millisecond overrides.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Expected command names, one per line.
    #[arg(long)]
    expect: Option<PathBuf>,
    /// Time to let elapse after the last edge.
    #[arg(long = "tail-ms", default_value_t = 1_000)]
    tail_ms: u64,
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => timing::load_timing(path)?,
        None => TimingConfig::DEFAULT,
    };
    let edges = trace::read_trace(&cli.trace)?;
    let rows = replay::replay(config, &edges, Duration::from_millis(cli.tail_ms));

    println!("command,ms,name,state");
    for row in &rows {
        println!("command,{},{},{}", row.ms, row.command, row.state);
    }

    if let Some(path) = &cli.expect {
        let expected = trace::read_expected(path)?;
        let actual: Vec<Command> = rows.iter().map(|row| row.command).collect();
        if actual != expected {
            eprintln!("expected: {}", join_labels(&expected));
            eprintln!("actual:   {}", join_labels(&actual));
            bail!("command sequence mismatch");
        }
    }
    Ok(())
}

fn join_labels(commands: &[Command]) -> String {
    commands
        .iter()
        .map(|command| command.label())
        .collect::<Vec<_>>()
        .join(",")
}
