//! Scripted sessions of the sample application.
//!
//! Feeds command scripts through [`DemoApp::run`] and snapshots what the
//! views printed.

use std::time::Duration;

use viewstage_demo::{DemoApp, DemoSettings};

fn transcript(settings: &DemoSettings, script: &str) -> String {
    let mut app = DemoApp::new(settings);
    app.setup().unwrap();

    let mut output = Vec::new();
    app.run(script.as_bytes(), &mut output).unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn full_session() {
    let script = "\
/status
/press start
/press level 1
/press back
/press back
/press quit
/status
/tick 200
/press cancel
/tick 200
/status
/press quit
/tick 200
/press confirm
/status
";

    insta::assert_snapshot!(transcript(&DemoSettings::default(), script), @r"
    == Title ==  [start] [quit]
    location: Title (active)
    == Level Select ==  [level 1] [level 2] [level 3]  [back]
    == Meadow ==  background #7cfc00  [back]
    == Level Select ==  [level 1] [level 2] [level 3]  [back]
    == Title ==  [start] [quit]
    Quit? (showing)
    location: Title (active); overlays: Quit (showing)
    Quit?  [confirm] [cancel]
    Quit? (hiding)
    location: Title (active)
    Quit? (showing)
    Quit?  [confirm] [cancel]
    Goodbye.
    ");
}

#[test]
fn bad_commands_are_reported() {
    let script = "\
# comments and blank lines are skipped

/press jump
/tick soon
/fly
/exit
/press start
";

    insta::assert_snapshot!(transcript(&DemoSettings::default(), script), @r"
    == Title ==  [start] [quit]
    /press: Unknown button: jump
    /tick: Invalid milliseconds
    unknown command: /fly
    ");
}

#[test]
fn custom_start_and_instant_dialog() {
    let settings = DemoSettings {
        start: "LevelSelect".into(),
        quit_duration: Duration::ZERO,
        ..DemoSettings::default()
    };
    let script = "\
/press level 3
/status
/press back
/press back
/press quit
/press cancel
/status
";

    insta::assert_snapshot!(transcript(&settings, script), @r"
    == Level Select ==  [level 1] [level 2] [level 3]  [back]
    == Cavern ==  background #4b0082  [back]
    location: Level (active)
    == Level Select ==  [level 1] [level 2] [level 3]  [back]
    == Title ==  [start] [quit]
    Quit? (showing)
    Quit?  [confirm] [cancel]
    Quit? (hiding)
    location: Title (active)
    ");
}
