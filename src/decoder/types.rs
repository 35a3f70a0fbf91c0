use heapless::Vec;

const DISPATCH_CAPACITY: usize = 4;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Command {
    Increase = 0,
    Decrease = 1,
    Ok = 2,
    Back = 3,
    Next = 4,
    Prev = 5,
    Menu = 6,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::Increase,
        Command::Decrease,
        Command::Ok,
        Command::Back,
        Command::Next,
        Command::Prev,
        Command::Menu,
    ];

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Command::Increase => "increase",
            Command::Decrease => "decrease",
            Command::Ok => "ok",
            Command::Back => "back",
            Command::Next => "next",
            Command::Prev => "prev",
            Command::Menu => "menu",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|command| command.label().eq_ignore_ascii_case(label.trim()))
    }

    /// Increase and Decrease are the only commands hold-repeat will re-fire.
    pub const fn is_repeatable(self) -> bool {
        matches!(self, Command::Increase | Command::Decrease)
    }
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum StateId {
    #[default]
    Idle = 0,
    Combo = 1,
    Holding = 2,
}

impl StateId {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            StateId::Idle => "idle",
            StateId::Combo => "combo",
            StateId::Holding => "holding",
        }
    }
}

impl core::fmt::Display for StateId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EdgeKind {
    Down,
    Up,
}

/// Where an edge came from. Keyboards auto-repeat their down edge while held.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum InputSource {
    #[default]
    Pointer,
    Key,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CommandBatch {
    pub command: Command,
    pub repeat: u8,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DispatchBuffer {
    batches: Vec<CommandBatch, DISPATCH_CAPACITY>,
}

impl DispatchBuffer {
    pub const MAX: usize = DISPATCH_CAPACITY;

    pub const fn new() -> Self {
        Self {
            batches: Vec::new(),
        }
    }

    pub fn push(&mut self, command: Command, repeat: u8) {
        if repeat == 0 {
            return;
        }
        if self.batches.push(CommandBatch { command, repeat }).is_err() {
            log::warn!(
                "decoder: dispatch buffer full, dropped command={} repeat={}",
                command,
                repeat
            );
        }
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandBatch> {
        self.batches.iter()
    }

    /// Flattened view: one item per sink invocation.
    pub fn commands(&self) -> impl Iterator<Item = Command> + '_ {
        self.batches
            .iter()
            .flat_map(|batch| core::iter::repeat(batch.command).take(usize::from(batch.repeat)))
    }

    pub fn total(&self) -> usize {
        self.batches
            .iter()
            .map(|batch| usize::from(batch.repeat))
            .sum()
    }

    pub fn contains(&self, command: Command) -> bool {
        self.batches.iter().any(|batch| batch.command == command)
    }
}
