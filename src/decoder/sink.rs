use super::{status::DecoderStatus, types::Command};

/// Receives every dispatched command, once per repetition.
pub trait CommandSink {
    fn command(&mut self, command: Command);
}

impl<F> CommandSink for F
where
    F: FnMut(Command),
{
    fn command(&mut self, command: Command) {
        self(command)
    }
}

/// Display-side collaborator. Called after each processed event; it can only
/// observe, never steer the decoder.
pub trait StatusObserver {
    /// A new press started; any glow should be cleared.
    fn press_started(&mut self) {}

    fn status_changed(&mut self, status: &DecoderStatus);
}

impl StatusObserver for () {
    fn status_changed(&mut self, _status: &DecoderStatus) {}
}

/// One optional handler per command. Commands without a handler are dropped.
#[derive(Default)]
pub struct CommandHandlers<'a> {
    handlers: [Option<&'a mut dyn FnMut()>; 7],
}

impl<'a> CommandHandlers<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, command: Command, handler: &'a mut dyn FnMut()) -> Self {
        self.handlers[usize::from(command.as_u8())] = Some(handler);
        self
    }

    pub fn on_increase(self, handler: &'a mut dyn FnMut()) -> Self {
        self.on(Command::Increase, handler)
    }

    pub fn on_decrease(self, handler: &'a mut dyn FnMut()) -> Self {
        self.on(Command::Decrease, handler)
    }

    pub fn on_ok(self, handler: &'a mut dyn FnMut()) -> Self {
        self.on(Command::Ok, handler)
    }

    pub fn on_back(self, handler: &'a mut dyn FnMut()) -> Self {
        self.on(Command::Back, handler)
    }

    pub fn on_next(self, handler: &'a mut dyn FnMut()) -> Self {
        self.on(Command::Next, handler)
    }

    pub fn on_prev(self, handler: &'a mut dyn FnMut()) -> Self {
        self.on(Command::Prev, handler)
    }

    pub fn on_menu(self, handler: &'a mut dyn FnMut()) -> Self {
        self.on(Command::Menu, handler)
    }

    pub fn is_registered(&self, command: Command) -> bool {
        self.handlers[usize::from(command.as_u8())].is_some()
    }
}

impl CommandSink for CommandHandlers<'_> {
    fn command(&mut self, command: Command) {
        match self.handlers[usize::from(command.as_u8())].as_deref_mut() {
            Some(handler) => handler(),
            None => log::trace!("decoder: no handler for command={}", command),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_handlers_fire_independently() {
        let mut increases = 0u32;
        let mut menus = 0u32;
        let mut on_increase = || increases += 1;
        let mut on_menu = || menus += 1;

        {
            let mut handlers = CommandHandlers::new()
                .on_increase(&mut on_increase)
                .on_menu(&mut on_menu);
            assert!(handlers.is_registered(Command::Increase));
            assert!(!handlers.is_registered(Command::Decrease));

            handlers.command(Command::Increase);
            handlers.command(Command::Increase);
            handlers.command(Command::Decrease);
            handlers.command(Command::Menu);
        }

        assert_eq!(increases, 2);
        assert_eq!(menus, 1);
    }

    #[test]
    fn closures_act_as_sinks() {
        let mut seen = [0u8; 7];
        let mut sink = |command: Command| seen[usize::from(command.as_u8())] += 1;
        sink.command(Command::Back);
        sink.command(Command::Back);
        assert_eq!(seen[usize::from(Command::Back.as_u8())], 2);
    }
}
