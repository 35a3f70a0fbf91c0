use embassy_time::Instant;

use super::{
    config::{ConfigError, TimingConfig},
    engine::{DecoderOutput, GestureDecoder},
    sink::{CommandSink, StatusObserver},
    types::{EdgeKind, InputSource},
};

/// Decoder wired to its collaborators.
///
/// Routes pointer and key edges into the decoder, fires due timers on
/// [`ButtonController::advance`], and forwards every resulting command to the
/// sink and every status change to the observer.
pub struct ButtonController<S, O = ()> {
    decoder: GestureDecoder,
    sink: S,
    observer: O,
    key_held: bool,
}

impl<S: CommandSink> ButtonController<S, ()> {
    pub fn new(config: TimingConfig, sink: S) -> Self {
        Self::with_observer(config, sink, ())
    }
}

impl<S: CommandSink, O: StatusObserver> ButtonController<S, O> {
    pub fn with_observer(config: TimingConfig, sink: S, observer: O) -> Self {
        Self {
            decoder: GestureDecoder::new(config),
            sink,
            observer,
            key_held: false,
        }
    }

    pub fn try_with_observer(
        config: TimingConfig,
        sink: S,
        observer: O,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_observer(config, sink, observer))
    }

    pub fn decoder(&self) -> &GestureDecoder {
        &self.decoder
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.decoder.next_deadline()
    }

    /// Fires every timer due by `now` first, then applies the edge.
    pub fn edge(&mut self, kind: EdgeKind, source: InputSource, now: Instant) -> bool {
        self.advance(now);
        let output = match (kind, source) {
            (EdgeKind::Down, InputSource::Key) if self.key_held => {
                log::trace!("decoder: key auto-repeat suppressed at_ms={}", now.as_millis());
                return false;
            }
            (EdgeKind::Down, InputSource::Key) => {
                self.key_held = true;
                self.decoder.button_down(now)
            }
            (EdgeKind::Up, InputSource::Key) => {
                self.key_held = false;
                self.decoder.button_up(now)
            }
            (EdgeKind::Down, InputSource::Pointer) => self.decoder.button_down(now),
            (EdgeKind::Up, InputSource::Pointer) => self.decoder.button_up(now),
        };
        self.deliver(&output)
    }

    pub fn pointer_down(&mut self, now: Instant) -> bool {
        self.edge(EdgeKind::Down, InputSource::Pointer, now)
    }

    pub fn pointer_up(&mut self, now: Instant) -> bool {
        self.edge(EdgeKind::Up, InputSource::Pointer, now)
    }

    pub fn key_down(&mut self, now: Instant) -> bool {
        self.edge(EdgeKind::Down, InputSource::Key, now)
    }

    pub fn key_up(&mut self, now: Instant) -> bool {
        self.edge(EdgeKind::Up, InputSource::Key, now)
    }

    /// Fires all timers due at or before `now` in deadline order. Returns the
    /// number of timers fired.
    pub fn advance(&mut self, now: Instant) -> usize {
        let mut fired = 0;
        while let Some(output) = self.decoder.fire_next_due(now) {
            self.deliver(&output);
            fired += 1;
        }
        fired
    }

    fn deliver(&mut self, output: &DecoderOutput) -> bool {
        if !output.accepted {
            return false;
        }
        if output.press_started {
            self.observer.press_started();
        }
        for command in output.commands.commands() {
            self.sink.command(command);
        }
        self.observer.status_changed(&output.status);
        true
    }
}
