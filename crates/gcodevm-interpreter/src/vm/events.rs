//! Motion events
//!
//! Every detected motion yields one event carrying its start and end points
//! in both frames and the modal context that was active. Renderers consume
//! these to build preview geometry; the VM does no tessellation itself.

use gcodevm_core::{Plane, Units};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::config::VmConfig;
use super::interpreter::{apply_line, MotionCode};
use super::state::{Coolant, SpindleDirection, VmState};
use crate::gcode::ParsedLine;

/// Modal context captured at the moment a move was made
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalSnapshot {
    pub motion: MotionCode,
    pub plane: Plane,
    pub units: Units,
    pub incremental: bool,
    pub inverse_feed: bool,
    pub feed: f64,
    pub tool: Option<u32>,
    pub spindle: bool,
    pub spindle_direction: SpindleDirection,
    pub spindle_speed: f64,
    pub coolant: Coolant,
}

impl ModalSnapshot {
    /// Snapshot the state's modal settings for a move of kind `motion`
    pub fn capture(state: &VmState, motion: MotionCode) -> Self {
        Self {
            motion,
            plane: state.arc_plane,
            units: state.units,
            incremental: state.incremental,
            inverse_feed: state.inverse_feed,
            feed: state.feed,
            tool: state.tool,
            spindle: state.spindle,
            spindle_direction: state.spindle_direction,
            spindle_speed: state.spindle_speed,
            coolant: state.coolant,
        }
    }
}

/// Path shape of a move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MotionGeometry {
    /// Straight segment
    Line,
    /// Circular or helical arc
    Arc {
        /// Centre in work coordinates; the normal axis keeps its start value
        center: Vec<f64>,
        /// Centre in machine coordinates
        machine_center: Vec<f64>,
        clockwise: bool,
        plane: Plane,
    },
}

/// One move replayed by the VM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionEvent {
    /// Line counter value of the source line
    pub line: u64,
    pub modal: ModalSnapshot,
    /// Start, work coordinates
    pub from: Vec<f64>,
    /// End, work coordinates
    pub to: Vec<f64>,
    /// Start, machine coordinates
    pub machine_from: Vec<f64>,
    /// End, machine coordinates
    pub machine_to: Vec<f64>,
    pub geometry: MotionGeometry,
    /// Seconds attributed to this move
    pub time: f64,
}

impl MotionEvent {
    pub fn is_arc(&self) -> bool {
        matches!(self.geometry, MotionGeometry::Arc { .. })
    }

    pub fn is_rapid(&self) -> bool {
        matches!(
            self.modal.motion,
            MotionCode::Rapid | MotionCode::Home | MotionCode::SecondaryHome
        )
    }

    /// Straight-line distance between start and end
    pub fn chord_length(&self) -> f64 {
        self.from
            .iter()
            .zip(&self.to)
            .map(|(a, b)| (b - a) * (b - a))
            .sum::<f64>()
            .sqrt()
    }
}

/// Pull-style stream of motion events
///
/// Source lines are interpreted only as the consumer asks for events, so a
/// renderer can stop early or interleave its own work. Lines without motion
/// still update the state as they are passed over.
pub struct MotionEvents<'a, I> {
    state: &'a mut VmState,
    config: &'a VmConfig,
    lines: I,
    pending: VecDeque<MotionEvent>,
}

impl<'a, I> MotionEvents<'a, I> {
    pub(crate) fn new(state: &'a mut VmState, config: &'a VmConfig, lines: I) -> Self {
        Self {
            state,
            config,
            lines,
            pending: VecDeque::new(),
        }
    }

    /// State as of the last line pulled
    pub fn state(&self) -> &VmState {
        self.state
    }
}

impl<I> Iterator for MotionEvents<'_, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = MotionEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            let line = self.lines.next()?;
            let parsed = ParsedLine::parse(line.as_ref());
            let result = apply_line(self.state, self.config, &parsed);
            self.pending.extend(result.events);
        }
    }
}
