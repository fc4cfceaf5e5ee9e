//! Demo application state machine.
//!
//! [`DemoApp`] owns the view controller and turns parsed [`Command`]s into
//! controller calls. Button presses go to the newest overlay, or to the
//! current location when no overlay is open, the way input reaches the
//! topmost panel of a real UI.

use std::{
    io::{BufRead, Write},
    time::Duration,
};

use viewstage_core::{ControllerConfig, Payload, ViewController, ViewError, ViewState};

use crate::{
    commands::{self, Command},
    error::DemoError,
    views::{Button, DemoHost, DemoLoader, SharedScreen, ViewKind, default_levels},
};

/// Controller type driven by the demo.
pub type DemoController = ViewController<DemoLoader, DemoHost>;

/// Longest time step handed to a single controller tick.
pub const FRAME: Duration = Duration::from_millis(16);

/// Startup options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSettings {
    /// View shown by setup.
    pub start: String,
    /// Length of the quit dialog's show and hide transitions.
    pub quit_duration: Duration,
    /// Log lifecycle activity at `info`.
    pub debug: bool,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            start: ViewKind::ALL[0].1.to_string(),
            quit_duration: Duration::from_millis(200),
            debug: false,
        }
    }
}

/// What the input loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next command.
    Continue,
    /// Stop.
    Exit,
}

/// The sample application.
#[derive(Debug)]
pub struct DemoApp {
    controller: DemoController,
    screen: SharedScreen,
}

impl DemoApp {
    /// Build the controller with the four sample views registered.
    pub fn new(settings: &DemoSettings) -> Self {
        let config = ViewKind::ALL
            .iter()
            .fold(ControllerConfig::new(), |config, (kind, id)| {
                config.with_view(*id, kind.resource_path())
            })
            .with_starting_location(settings.start.as_str())
            .with_debug(settings.debug);

        let screen = SharedScreen::default();
        let host = DemoHost::new(
            SharedScreen::clone(&screen),
            default_levels(),
            settings.quit_duration,
        );
        let controller =
            ViewController::new(config, DemoLoader::default(), host).with_view_parent(());

        Self { controller, screen }
    }

    /// Show the starting location.
    pub fn setup(&mut self) -> Result<(), ViewError> {
        self.controller.setup(None)
    }

    /// The underlying controller.
    pub fn controller(&self) -> &DemoController {
        &self.controller
    }

    /// True once the quit dialog was confirmed.
    pub fn quit_requested(&self) -> bool {
        self.screen.borrow().quit_requested()
    }

    /// Remove and return output written since the last call.
    ///
    /// Buffered lifecycle events are drained to the log at the same time.
    pub fn take_output(&mut self) -> Vec<String> {
        for event in self.controller.drain_events() {
            tracing::debug!(instance = ?event.instance, "{event}");
        }
        self.screen.borrow_mut().take_lines()
    }

    /// Execute one command.
    pub fn handle(&mut self, command: Command) -> Result<Flow, ViewError> {
        match command {
            Command::Press { button } => self.press(button)?,
            Command::Tick { elapsed } => self.advance(elapsed)?,
            Command::Status => {
                let status = self.status();
                self.screen.borrow_mut().print(status);
            },
            Command::Exit => return Ok(Flow::Exit),
            Command::Empty => {},
            Command::Unknown { input } => {
                self.screen.borrow_mut().print(format!("unknown command: {input}"));
            },
            Command::InvalidArgs { command, error } => {
                self.screen.borrow_mut().print(format!("/{command}: {error}"));
            },
        }

        if self.quit_requested() { Ok(Flow::Exit) } else { Ok(Flow::Continue) }
    }

    /// Press a button on the topmost view.
    pub fn press(&mut self, button: Button) -> Result<(), ViewError> {
        let target = self
            .controller
            .showing_overlays()
            .last()
            .map(|info| info.id)
            .or_else(|| self.controller.current_location().map(|info| info.id));

        let Some(instance) = target else {
            self.screen.borrow_mut().print("nothing on screen");
            return Ok(());
        };
        tracing::debug!(%instance, ?button, "button pressed");
        self.controller.send(instance, &Payload::new(button))
    }

    /// Advance time in steps of at most [`FRAME`].
    pub fn advance(&mut self, elapsed: Duration) -> Result<(), ViewError> {
        let mut remaining = elapsed;
        while !remaining.is_zero() {
            let step = remaining.min(FRAME);
            self.controller.tick(step)?;
            remaining -= step;
        }
        Ok(())
    }

    /// One-line summary of what is on screen.
    pub fn status(&self) -> String {
        let describe = |view: &str, state: ViewState| format!("{view} ({})", state_name(state));

        let location = self
            .controller
            .current_location()
            .map_or_else(|| "none".to_string(), |info| describe(info.view.as_str(), info.state));
        let overlays: Vec<String> = self
            .controller
            .showing_overlays()
            .into_iter()
            .map(|info| describe(info.view.as_str(), info.state))
            .collect();

        if overlays.is_empty() {
            format!("location: {location}")
        } else {
            format!("location: {location}; overlays: {}", overlays.join(", "))
        }
    }

    /// Read commands from `input` until it ends, `/exit` is read, or the
    /// quit dialog is confirmed, writing view output to `output`.
    ///
    /// Controller errors are reported on `output` and do not stop the loop.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<(), DemoError> {
        self.flush(&mut output)?;

        for line in input.lines() {
            let line = line?;
            let flow = match self.handle(commands::parse(&line)) {
                Ok(flow) => flow,
                Err(err) => {
                    tracing::warn!(%err, "command failed");
                    writeln!(output, "error: {err}")?;
                    Flow::Continue
                },
            };
            self.flush(&mut output)?;

            if flow == Flow::Exit {
                break;
            }
        }
        Ok(())
    }

    fn flush<W: Write>(&mut self, output: &mut W) -> Result<(), DemoError> {
        for line in self.take_output() {
            writeln!(output, "{line}")?;
        }
        output.flush()?;
        Ok(())
    }
}

fn state_name(state: ViewState) -> &'static str {
    match state {
        ViewState::Creating => "creating",
        ViewState::Showing => "showing",
        ViewState::Active => "active",
        ViewState::Hiding => "hiding",
        ViewState::Destroyed => "destroyed",
    }
}
