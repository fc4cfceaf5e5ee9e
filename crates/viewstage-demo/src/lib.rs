//! Sample application for viewstage
//!
//! A title screen, a level picker, a level, and a quit dialog, driven by line
//! commands instead of a UI toolkit. All navigation logic lives in
//! [`viewstage_core::ViewController`]; this crate only supplies the views,
//! a text host, and the command loop.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod app;
pub mod commands;
pub mod error;
pub mod views;

pub use app::{DemoApp, DemoSettings, Flow};
pub use commands::Command;
pub use error::DemoError;
pub use views::{Button, LevelData};
