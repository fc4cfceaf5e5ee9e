//! View lifecycle core for viewstage
//!
//! Pure state machine logic for managing application views, completely
//! decoupled from rendering, resource loading, and timing.
//!
//! # Architecture
//!
//! An application shows exactly one *location* (a full-screen navigational
//! view) and any number of *overlays* (panels shown on top of it). Every
//! displayed view is a [`View`] implementation driven through a fixed
//! lifecycle:
//!
//! ```text
//! ┌──────────┐ show  ┌─────────┐ complete ┌────────┐ hide  ┌────────┐ complete ┌───────────┐
//! │ Creating │──────>│ Showing │─────────>│ Active │──────>│ Hiding │─────────>│ Destroyed │
//! └──────────┘       └─────────┘          └────────┘       └────────┘          └───────────┘
//!                         │                                    ↑
//!                         └─────────────── hide ───────────────┘
//! ```
//!
//! Lifecycle hooks never borrow the controller. They receive a
//! [`ViewContext`] that records [`ViewAction`]s (transition completions and
//! navigation requests), and the [`ViewController`] applies those actions
//! once the hook returns. Show and hide hooks are handed a [`Transition`]
//! token which completes the transition when redeemed, either right away or
//! on a later frame.
//!
//! Backing resources and visual objects come from the host through the
//! [`ResourceLoader`] and [`SceneHost`] traits. Resources are reference
//! counted per registered view and released when the last user goes away.
//!
//! # Components
//!
//! - [`controller`]: Orchestrator (location slot, overlays, queued targets)
//! - [`instance`]: Per-view lifecycle state machine
//! - [`descriptor`]: Registry of views and their ref-counted resources
//! - [`context`]: Hook context and the actions it records
//! - [`event`]: Lifecycle event channel
//! - [`host`]: External collaborator traits
//! - [`config`]: Controller configuration
//! - [`error`]: Error types

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod controller;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod host;
pub mod instance;
pub mod payload;
pub mod view;

pub use config::{ControllerConfig, ViewRegistration};
pub use context::{NavRequest, ViewAction, ViewContext, WaitFor};
pub use controller::ViewController;
pub use descriptor::{ViewDescriptor, ViewRegistry};
pub use error::ViewError;
pub use event::{ControllerId, ViewEvent, ViewEventKind};
pub use host::{Instantiated, ResourceLoader, SceneHost};
pub use instance::{InstanceId, InstanceInfo, Phase, Transition, ViewState};
pub use payload::Payload;
pub use view::{DisplayMode, View, ViewId};
