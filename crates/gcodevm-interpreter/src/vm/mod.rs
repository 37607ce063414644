//! Virtual machine module
//!
//! This module provides:
//! - Configuration and the initial-state override (config)
//! - Modal state store (state)
//! - Work/machine coordinate conversion (coords)
//! - Move timing (estimator) and arc geometry (arcs)
//! - Line interpretation (interpreter) and motion events (events)
//! - The `GcodeVm` facade and its report

pub mod arcs;
pub mod config;
pub mod coords;
pub mod estimator;
pub mod events;
pub mod interpreter;
pub mod machine;
pub mod report;
pub mod state;

pub use arcs::{CenterSpec, PlaneArc};
pub use config::{InitialState, PerAxis, VmConfig};
pub use coords::convert_coord_sys;
pub use events::{ModalSnapshot, MotionEvent, MotionEvents, MotionGeometry};
pub use interpreter::{LineResult, MotionCode};
pub use machine::GcodeVm;
pub use report::{AxisValues, BoundingBox, VmReport};
pub use state::{Bounds, Coolant, DistinctValues, SpindleDirection, VmState, COORD_SYS_COUNT};
