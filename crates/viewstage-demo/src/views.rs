//! The sample application's views and the text-mode host they live in.
//!
//! Four views make up the application: a title screen, a level picker, the
//! level itself, and a quit confirmation overlay. Views "render" by writing
//! lines to a shared [`Screen`]; buttons arrive as [`Button`] messages.

use std::{cell::RefCell, fmt, rc::Rc, time::Duration};

use viewstage_core::{
    Instantiated, Payload, ResourceLoader, SceneHost, Transition, View, ViewContext, ViewState,
};

/// Text output and the quit flag, shared by every view.
#[derive(Debug, Default)]
pub struct Screen {
    lines: Vec<String>,
    quit_requested: bool,
}

impl Screen {
    /// Append a line of output.
    pub fn print(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Remove and return pending output.
    pub fn take_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }

    /// True once the quit dialog was confirmed.
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}

/// Handle to the shared [`Screen`].
pub type SharedScreen = Rc<RefCell<Screen>>;

/// Buttons the views react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Title: go to level select.
    Start,
    /// Title: open the quit dialog.
    Quit,
    /// Level select and level: go back one screen.
    Back,
    /// Quit dialog: leave the application.
    Confirm,
    /// Quit dialog: close it.
    Cancel,
    /// Level select: play the level with this 1-based number.
    Level(usize),
}

/// RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Payload handed from level select to the level view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelData {
    /// Display name.
    pub name: String,
    /// Background color.
    pub background: Rgb,
}

impl LevelData {
    /// Level with a name and background color.
    pub fn new(name: impl Into<String>, background: Rgb) -> Self {
        Self { name: name.into(), background }
    }
}

/// Levels offered by the level picker.
pub fn default_levels() -> Vec<LevelData> {
    vec![
        LevelData::new("Meadow", Rgb(0x7c, 0xfc, 0x00)),
        LevelData::new("Forest", Rgb(0x22, 0x8b, 0x22)),
        LevelData::new("Cavern", Rgb(0x4b, 0x00, 0x82)),
    ]
}

/// Registered view identifiers.
pub mod ids {
    /// Title screen.
    pub const TITLE: &str = "Title";
    /// Level picker.
    pub const LEVEL_SELECT: &str = "LevelSelect";
    /// A single level.
    pub const LEVEL: &str = "Level";
    /// Quit confirmation overlay.
    pub const QUIT: &str = "Quit";
}

/// Pressed button carried by a message payload, if any.
fn pressed(cx: &ViewContext, message: &Payload) -> Option<Button> {
    if cx.state() != ViewState::Active {
        return None;
    }
    message.get::<Button>().copied()
}

/// Title screen.
#[derive(Debug)]
pub struct TitleView {
    screen: SharedScreen,
}

impl View for TitleView {
    fn on_show_start(&mut self, cx: &mut ViewContext, _payload: Payload, done: Transition) {
        self.screen.borrow_mut().print("== Title ==  [start] [quit]");
        cx.complete(done);
    }

    fn on_message(&mut self, cx: &mut ViewContext, message: &Payload) {
        match pressed(cx, message) {
            Some(Button::Start) => cx.change_location(ids::LEVEL_SELECT, Payload::none()),
            Some(Button::Quit) => cx.open_overlay(ids::QUIT, Payload::none()),
            _ => {},
        }
    }
}

/// Level picker.
#[derive(Debug)]
pub struct LevelSelectView {
    screen: SharedScreen,
    levels: Vec<LevelData>,
}

impl View for LevelSelectView {
    fn on_show_start(&mut self, cx: &mut ViewContext, _payload: Payload, done: Transition) {
        let buttons: Vec<String> =
            (1..=self.levels.len()).map(|number| format!("[level {number}]")).collect();
        self.screen
            .borrow_mut()
            .print(format!("== Level Select ==  {}  [back]", buttons.join(" ")));
        cx.complete(done);
    }

    fn on_message(&mut self, cx: &mut ViewContext, message: &Payload) {
        match pressed(cx, message) {
            Some(Button::Back) => cx.change_location(ids::TITLE, Payload::none()),
            Some(Button::Level(number)) => {
                let Some(level) = number.checked_sub(1).and_then(|index| self.levels.get(index))
                else {
                    self.screen.borrow_mut().print(format!("no level {number}"));
                    return;
                };
                cx.change_location(ids::LEVEL, Payload::new(level.clone()));
            },
            _ => {},
        }
    }
}

/// A single level, configured by the [`LevelData`] it is shown with.
#[derive(Debug)]
pub struct LevelView {
    screen: SharedScreen,
    level: Option<LevelData>,
}

impl View for LevelView {
    fn on_show_start(&mut self, cx: &mut ViewContext, payload: Payload, done: Transition) {
        self.level = payload.take::<LevelData>().ok();
        let line = match &self.level {
            Some(level) => format!("== {} ==  background {}  [back]", level.name, level.background),
            None => "== Level ==  [back]".to_string(),
        };
        self.screen.borrow_mut().print(line);
        cx.complete(done);
    }

    fn on_message(&mut self, cx: &mut ViewContext, message: &Payload) {
        if pressed(cx, message) == Some(Button::Back) {
            cx.change_location(ids::LEVEL_SELECT, Payload::none());
        }
    }
}

/// Quit confirmation overlay with timed show and hide transitions.
#[derive(Debug)]
pub struct QuitView {
    screen: SharedScreen,
    duration: Duration,
    pending: Option<(Transition, Duration)>,
}

impl QuitView {
    fn begin(&mut self, cx: &mut ViewContext, done: Transition) {
        if self.duration.is_zero() {
            cx.complete(done);
        } else {
            self.pending = Some((done, self.duration));
        }
    }
}

impl View for QuitView {
    fn on_show_start(&mut self, cx: &mut ViewContext, _payload: Payload, done: Transition) {
        self.screen.borrow_mut().print("Quit? (showing)");
        self.begin(cx, done);
    }

    fn on_show_complete(&mut self, _cx: &mut ViewContext) {
        self.screen.borrow_mut().print("Quit?  [confirm] [cancel]");
    }

    fn on_hide_start(&mut self, cx: &mut ViewContext, done: Transition) {
        self.screen.borrow_mut().print("Quit? (hiding)");
        self.begin(cx, done);
    }

    fn on_update(&mut self, cx: &mut ViewContext, delta: Duration) {
        let Some((done, remaining)) = self.pending.take() else {
            return;
        };
        let remaining = remaining.saturating_sub(delta);
        if remaining.is_zero() {
            cx.complete(done);
        } else {
            self.pending = Some((done, remaining));
        }
    }

    fn on_message(&mut self, cx: &mut ViewContext, message: &Payload) {
        match pressed(cx, message) {
            Some(Button::Confirm) => {
                let mut screen = self.screen.borrow_mut();
                screen.quit_requested = true;
                screen.print("Goodbye.");
            },
            Some(Button::Cancel) => cx.close_self(),
            _ => {},
        }
    }
}

/// Which of the four views a resource builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// [`TitleView`]
    Title,
    /// [`LevelSelectView`]
    LevelSelect,
    /// [`LevelView`]
    Level,
    /// [`QuitView`]
    Quit,
}

impl ViewKind {
    /// Every kind with its view identifier.
    pub const ALL: [(Self, &'static str); 4] = [
        (Self::Title, ids::TITLE),
        (Self::LevelSelect, ids::LEVEL_SELECT),
        (Self::Level, ids::LEVEL),
        (Self::Quit, ids::QUIT),
    ];

    /// Resource path the kind is registered under.
    pub fn resource_path(self) -> &'static str {
        match self {
            Self::Title => "views/title",
            Self::LevelSelect => "views/level_select",
            Self::Level => "views/level",
            Self::Quit => "views/quit",
        }
    }

    fn from_path(path: &str) -> Option<Self> {
        Self::ALL.iter().map(|(kind, _)| *kind).find(|kind| kind.resource_path() == path)
    }
}

/// Resolves resource paths to view kinds.
#[derive(Debug, Default)]
pub struct DemoLoader {
    loaded: usize,
}

impl DemoLoader {
    /// Resources currently held.
    pub fn loaded(&self) -> usize {
        self.loaded
    }
}

impl ResourceLoader for DemoLoader {
    type Handle = ViewKind;

    fn load(&mut self, path: &str) -> Option<ViewKind> {
        let kind = ViewKind::from_path(path)?;
        self.loaded += 1;
        tracing::trace!(path, ?kind, "resource loaded");
        Some(kind)
    }

    fn release(&mut self, handle: ViewKind) {
        self.loaded = self.loaded.saturating_sub(1);
        tracing::trace!(kind = ?handle, "resource released");
    }
}

/// Visual object of the text host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoVisual(pub u32);

/// Text host: builds views and keeps their draw order.
#[derive(Debug)]
pub struct DemoHost {
    screen: SharedScreen,
    levels: Vec<LevelData>,
    quit_duration: Duration,
    next_visual: u32,
    layers: Vec<(DemoVisual, ViewKind)>,
}

impl DemoHost {
    /// Host writing to `screen`, with timed quit dialog transitions.
    pub fn new(screen: SharedScreen, levels: Vec<LevelData>, quit_duration: Duration) -> Self {
        Self { screen, levels, quit_duration, next_visual: 0, layers: Vec::new() }
    }

    /// Live views, back to front.
    pub fn layers(&self) -> impl Iterator<Item = ViewKind> + '_ {
        self.layers.iter().map(|(_, kind)| *kind)
    }

    fn build(&self, kind: ViewKind) -> Box<dyn View> {
        let screen = SharedScreen::clone(&self.screen);
        match kind {
            ViewKind::Title => Box::new(TitleView { screen }),
            ViewKind::LevelSelect => {
                Box::new(LevelSelectView { screen, levels: self.levels.clone() })
            },
            ViewKind::Level => Box::new(LevelView { screen, level: None }),
            ViewKind::Quit => {
                Box::new(QuitView { screen, duration: self.quit_duration, pending: None })
            },
        }
    }
}

impl SceneHost<ViewKind> for DemoHost {
    type Visual = DemoVisual;
    type Parent = ();

    fn instantiate(
        &mut self,
        resource: &ViewKind,
        parent: Option<&()>,
    ) -> Instantiated<DemoVisual> {
        self.next_visual += 1;
        let visual = DemoVisual(self.next_visual);
        if parent.is_some() {
            self.layers.push((visual, *resource));
        }
        Instantiated { visual, view: Some(self.build(*resource)) }
    }

    fn child_count(&self, _parent: &()) -> usize {
        self.layers.len()
    }

    fn set_order(&mut self, visual: &DemoVisual, index: usize) {
        let Some(position) = self.layers.iter().position(|(layer, _)| layer == visual) else {
            return;
        };
        let layer = self.layers.remove(position);
        self.layers.insert(index.min(self.layers.len()), layer);
    }

    fn set_enabled(&mut self, _visual: &DemoVisual, _enabled: bool) {}

    fn destroy(&mut self, visual: DemoVisual) {
        self.layers.retain(|(layer, _)| *layer != visual);
    }
}
