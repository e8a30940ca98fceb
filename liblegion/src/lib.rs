//! Hardware control and input core for the Legion Go helper.
//!
//! Everything that talks to hardware lives here: the management-instrumentation
//! client and the thermal/display/lighting controllers built on it, the raw
//! HID polling loops (side button, touchpad), the controller-to-pointer loop,
//! and the shared state that ties the always-running loops to the UI shell.
//!
//! The shell consumes this crate through plain commands and the [`state::CoreEvent`]
//! queue; no egui types appear below this line.

pub mod device;
pub mod display;
pub mod input;
pub mod lighting;
pub mod mgmt;
pub mod registry;
pub mod state;
pub mod thermal;
pub mod types;
