//! Session-level orchestration.
//!
//! This module owns the run/repair lifecycle: the controller loop, the
//! iteration budget policy, and the progress ticker. Presentation layers
//! drive it through the command/event channel pair.

mod budget;
mod controller;
mod ticker;

pub(crate) use controller::{run_controller, SessionCommand};
