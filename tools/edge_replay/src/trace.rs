use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use unibutton::{Command, EdgeKind, InputSource};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TraceEdge {
    pub ms: u64,
    pub kind: EdgeKind,
    pub source: InputSource,
}

pub fn read_trace(path: &Path) -> Result<Vec<TraceEdge>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read trace {}", path.display()))?;
    parse_trace(&text).with_context(|| format!("invalid trace {}", path.display()))
}

/// Lines are `<ms>,<down|up>[,<pointer|key>]`; blank lines and `#` comments
/// are skipped. Timestamps must not go backwards.
pub fn parse_trace(text: &str) -> Result<Vec<TraceEdge>> {
    let mut edges: Vec<TraceEdge> = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if !(2..=3).contains(&parts.len()) {
            bail!("line {line_no}: expected `<ms>,<down|up>[,<pointer|key>]`");
        }

        let ms = parts[0]
            .parse::<u64>()
            .with_context(|| format!("line {line_no}: invalid ms '{}'", parts[0]))?;
        let kind = match parts[1].to_ascii_lowercase().as_str() {
            "down" => EdgeKind::Down,
            "up" => EdgeKind::Up,
            other => bail!("line {line_no}: unknown edge '{other}'"),
        };
        let source = match parts.get(2).map(|s| s.to_ascii_lowercase()) {
            None => InputSource::Pointer,
            Some(source) if source == "pointer" => InputSource::Pointer,
            Some(source) if source == "key" => InputSource::Key,
            Some(other) => bail!("line {line_no}: unknown source '{other}'"),
        };

        if let Some(previous) = edges.last() {
            if ms < previous.ms {
                bail!(
                    "line {line_no}: timestamp {ms} goes back from {}",
                    previous.ms
                );
            }
        }
        edges.push(TraceEdge { ms, kind, source });
    }
    Ok(edges)
}

pub fn read_expected(path: &Path) -> Result<Vec<Command>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read expectations {}", path.display()))?;
    parse_expected(&text).with_context(|| format!("invalid expectations {}", path.display()))
}

pub fn parse_expected(text: &str) -> Result<Vec<Command>> {
    text.lines()
        .enumerate()
        .map(|(line_no, line)| (line_no + 1, line.trim()))
        .filter(|(_, token)| !token.is_empty() && !token.starts_with('#'))
        .map(|(line_no, token)| {
            Command::from_label(token)
                .ok_or_else(|| anyhow!("line {line_no}: unknown command '{token}'"))
        })
        .collect()
}
