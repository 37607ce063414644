//! # GCodeVM Core
//!
//! Core types and utilities shared by the GCodeVM crates.
//! Provides the error taxonomy, unit handling and arc plane selection.

pub mod error;
pub mod modal;
pub mod units;

pub use error::{ConfigError, Error, InterpretError, Result};
pub use modal::Plane;
pub use units::Units;
