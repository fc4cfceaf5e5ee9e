//! Line-driven sample application.
//!
//! Reads commands such as `/press start`, `/tick 200` and `/status` from a
//! script file or standard input and prints what the views show.

use std::{
    fs::File,
    io::{self, BufReader},
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};

use clap::Parser;
use tracing_subscriber::EnvFilter;
use viewstage_demo::{DemoApp, DemoError, DemoSettings};

#[derive(Parser, Debug)]
#[command(name = "viewstage-demo", about = "Title, level select, level and quit dialog")]
struct Args {
    /// View shown at startup
    #[arg(long, default_value = "Title")]
    start: String,

    /// Read commands from this file instead of standard input
    #[arg(long)]
    script: Option<PathBuf>,

    /// Length of the quit dialog's show and hide transitions
    #[arg(long, default_value_t = 200)]
    quit_duration_ms: u64,

    /// Log view lifecycle activity at info level
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "demo failed");
            ExitCode::FAILURE
        },
    }
}

fn run(args: Args) -> Result<(), DemoError> {
    let settings = DemoSettings {
        start: args.start,
        quit_duration: Duration::from_millis(args.quit_duration_ms),
        debug: args.debug,
    };

    let mut app = DemoApp::new(&settings);
    app.setup()?;

    let stdout = io::stdout();
    match args.script {
        Some(path) => {
            tracing::info!(path = %path.display(), "running script");
            let file = File::open(&path)?;
            app.run(BufReader::new(file), stdout.lock())
        },
        None => app.run(io::stdin().lock(), stdout.lock()),
    }
}
