//! # GCodeVM
//!
//! A headless G-code virtual machine for CNC programs:
//! - Run-time estimation with per-axis feed limits and acceleration
//! - Work and machine bounding boxes
//! - Tool, feed and spindle catalogues plus invalid-line detection
//! - A pull-style stream of motion events for preview renderers
//!
//! ## Architecture
//!
//! GCodeVM is organized as a workspace with multiple crates:
//!
//! 1. **gcodevm-core** - Error taxonomy, units, arc planes
//! 2. **gcodevm-interpreter** - Line parser, modal state, coordinate frames, estimator
//! 3. **gcodevm** - This crate: re-exports, logging setup and the CLI binary

use std::fmt::Write;

pub use gcodevm_core::{ConfigError, Error, InterpretError, Plane, Result, Units};

pub use gcodevm_interpreter::{
    parse_line, AxisValues, BoundingBox, Coolant, GcodeVm, InitialState, LineResult,
    ModalSnapshot, MotionCode, MotionEvent, MotionEvents, MotionGeometry, ParsedLine, PerAxis,
    SpindleDirection, VmConfig, VmReport, VmState,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - Output on stderr so reports on stdout stay machine-readable
/// - RUST_LOG environment variable support (INFO by default)
/// - Pretty formatting, or one JSON object per event with `json`
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    if json {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .json();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true)
            .pretty();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}

/// Format seconds as `h:mm:ss`
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

/// Human-readable summary of a report
pub fn format_report(report: &VmReport) -> String {
    let mut out = String::new();
    let join = |values: &mut dyn Iterator<Item = String>| values.collect::<Vec<_>>().join(", ");

    let _ = writeln!(
        out,
        "Estimated time: {} ({:.1} s)",
        format_duration(report.total_time),
        report.total_time
    );
    let _ = writeln!(out, "Lines: {}", report.line_count);
    let _ = writeln!(out, "Units: {}", report.units);

    for (title, bbox) in [("Work bounds", &report.bbox), ("Machine bounds", &report.machine_bbox)] {
        let _ = writeln!(out, "{}:", title);
        for ((label, min), (_, max)) in bbox.min.iter().zip(bbox.max.iter()) {
            let _ = writeln!(
                out,
                "  {}: {:.3} .. {:.3}",
                label.to_ascii_uppercase(),
                min,
                max
            );
        }
    }

    let _ = writeln!(
        out,
        "Tools: {}",
        join(&mut report.tools.iter().map(|t| format!("T{}", t)))
    );
    let _ = writeln!(
        out,
        "Feed rates: {}",
        join(&mut report.feedrates.iter().map(|f| f.to_string()))
    );
    let _ = writeln!(
        out,
        "Spindle speeds: {}",
        join(&mut report.spindle_rates.iter().map(|s| s.to_string()))
    );
    let _ = writeln!(
        out,
        "Tool selects: {}, tool changes: {}",
        report.count_t, report.count_m6
    );

    if report.has_invalid_gcode() {
        let _ = writeln!(out, "Invalid lines ({}):", report.invalid_gcode.len());
        for line in &report.invalid_gcode {
            let _ = writeln!(out, "  {}", line);
        }
    }
    out
}
