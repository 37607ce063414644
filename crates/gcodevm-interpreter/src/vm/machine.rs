//! G-code virtual machine facade
//!
//! `GcodeVm` owns a validated configuration and the state of one evaluation
//! pass. Feed it lines one at a time, whole programs, readers or files; ask
//! it for bounding boxes, a summary report or a stream of motion events.

use gcodevm_core::{ConfigError, Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::config::VmConfig;
use super::events::MotionEvents;
use super::interpreter::{apply_line, LineResult};
use super::report::{BoundingBox, VmReport};
use super::state::VmState;
use crate::gcode::ParsedLine;

#[derive(Debug, Clone)]
pub struct GcodeVm {
    config: VmConfig,
    state: VmState,
}

impl GcodeVm {
    /// Build a VM, rejecting an invalid configuration
    pub fn new(config: VmConfig) -> std::result::Result<Self, ConfigError> {
        let state = VmState::new(&config)?;
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn state(&self) -> &VmState {
        &self.state
    }

    /// Return to the power-on state, keeping the configuration
    pub fn reset(&mut self) -> std::result::Result<(), ConfigError> {
        self.state.reset(&self.config)
    }

    /// Swap in a new configuration and reset
    ///
    /// On error the VM keeps its previous configuration and state.
    pub fn reconfigure(&mut self, config: VmConfig) -> std::result::Result<(), ConfigError> {
        let state = VmState::new(&config)?;
        self.config = config;
        self.state = state;
        Ok(())
    }

    /// Interpret one raw source line
    pub fn run_line(&mut self, line: &str) -> LineResult {
        self.apply(&ParsedLine::parse(line))
    }

    /// Interpret an already parsed line
    pub fn apply(&mut self, line: &ParsedLine) -> LineResult {
        apply_line(&mut self.state, &self.config, line)
    }

    /// Interpret every line and summarise
    pub fn run_program<I>(&mut self, lines: I) -> VmReport
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for line in lines {
            self.run_line(line.as_ref());
        }
        self.report()
    }

    /// Interpret a line-oriented reader
    ///
    /// Bytes that are not valid UTF-8 (typically in comments) are replaced
    /// rather than ending the evaluation.
    pub fn run_reader<R: BufRead>(&mut self, mut reader: R) -> Result<VmReport> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            self.run_line(line.trim_end_matches(['\n', '\r']));
        }
        Ok(self.report())
    }

    /// Interpret a G-code file
    pub fn run_file(&mut self, path: &Path) -> Result<VmReport> {
        let file = File::open(path).map_err(|e| {
            tracing::error!("Failed to open {}: {}", path.display(), e);
            Error::Io(e)
        })?;
        tracing::debug!("Evaluating {}", path.display());
        self.run_reader(BufReader::new(file))
    }

    /// Lazily interpret `lines`, yielding each motion as it is reached
    pub fn motion_events<I>(&mut self, lines: I) -> MotionEvents<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        MotionEvents::new(&mut self.state, &self.config, lines.into_iter())
    }

    /// Bounds in work or machine coordinates; unobserved axes read 0
    pub fn get_bbox(&self, use_machine: bool) -> BoundingBox {
        let bounds = if use_machine {
            &self.state.mbounds
        } else {
            &self.state.bounds
        };
        BoundingBox::from_bounds(&self.state.axis_labels, bounds)
    }

    pub fn report(&self) -> VmReport {
        VmReport::from_state(&self.state)
    }

    pub fn total_time(&self) -> f64 {
        self.state.total_time
    }

    pub fn to_machine(&self, pos: &[f64]) -> Vec<f64> {
        self.state.to_machine(pos)
    }

    pub fn to_work(&self, mpos: &[f64]) -> Vec<f64> {
        self.state.to_work(mpos)
    }
}
