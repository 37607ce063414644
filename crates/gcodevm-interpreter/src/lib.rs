//! # GCodeVM Interpreter
//!
//! Headless G-code virtual machine: parses lines, tracks modal state,
//! converts between work and machine coordinates and estimates run time,
//! bounds and tool usage without driving any hardware.

pub mod gcode;
pub mod vm;

pub use gcode::{format_code, parse_line, strip_comments, to_code, ParsedLine, Word};

pub use vm::{
    convert_coord_sys, AxisValues, BoundingBox, Bounds, CenterSpec, Coolant, DistinctValues,
    GcodeVm, InitialState, LineResult, ModalSnapshot, MotionCode, MotionEvent, MotionEvents,
    MotionGeometry, PerAxis, PlaneArc, SpindleDirection, VmConfig, VmReport, VmState,
    COORD_SYS_COUNT,
};

pub use gcodevm_core::{ConfigError, Error, InterpretError, Plane, Result, Units};
