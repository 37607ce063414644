//! Evaluation summary
//!
//! Snapshot types handed to callers once a program (or a prefix of one) has
//! been evaluated.

use gcodevm_core::Units;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;

use super::state::{Bounds, DistinctValues, VmState};

/// Per-axis values keyed by axis label, in configured axis order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisValues(Vec<(char, f64)>);

impl AxisValues {
    pub fn new(labels: &[char], values: &[f64]) -> Self {
        Self(labels.iter().copied().zip(values.iter().copied()).collect())
    }

    /// Value for an axis label, case-insensitive
    pub fn get(&self, label: char) -> Option<f64> {
        let label = label.to_ascii_lowercase();
        self.0.iter().find(|(l, _)| *l == label).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        self.0.iter().copied()
    }

    pub fn values(&self) -> Vec<f64> {
        self.0.iter().map(|(_, v)| *v).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for AxisValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, value) in &self.0 {
            map.serialize_entry(&label.to_string(), value)?;
        }
        map.end()
    }
}

/// Axis-aligned bounding box; axes never moved report 0
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min: AxisValues,
    pub max: AxisValues,
}

impl BoundingBox {
    pub fn from_bounds(labels: &[char], bounds: &Bounds) -> Self {
        let flatten = |values: &[Option<f64>]| -> Vec<f64> {
            values.iter().map(|v| v.unwrap_or(0.0)).collect()
        };
        Self {
            min: AxisValues::new(labels, &flatten(&bounds.min)),
            max: AxisValues::new(labels, &flatten(&bounds.max)),
        }
    }

    /// Extent along one axis
    pub fn size(&self, label: char) -> Option<f64> {
        Some(self.max.get(label)? - self.min.get(label)?)
    }
}

/// Summary of an evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VmReport {
    /// Estimated run time in seconds
    pub total_time: f64,
    pub line_count: u64,
    pub units: Units,
    pub bbox: BoundingBox,
    pub machine_bbox: BoundingBox,
    pub tools: BTreeSet<u32>,
    pub feedrates: DistinctValues,
    pub spindle_rates: DistinctValues,
    pub invalid_gcode: BTreeSet<String>,
    pub seen_words: BTreeSet<char>,
    pub count_t: u64,
    pub count_m6: u64,
    pub position: AxisValues,
    pub machine_position: AxisValues,
}

impl VmReport {
    pub fn from_state(state: &VmState) -> Self {
        let labels = &state.axis_labels;
        Self {
            total_time: state.total_time,
            line_count: state.line_counter,
            units: state.units,
            bbox: BoundingBox::from_bounds(labels, &state.bounds),
            machine_bbox: BoundingBox::from_bounds(labels, &state.mbounds),
            tools: state.tools.clone(),
            feedrates: state.feedrates.clone(),
            spindle_rates: state.spindle_rates.clone(),
            invalid_gcode: state.invalid_gcode.clone(),
            seen_words: state.seen_word_set.clone(),
            count_t: state.count_t,
            count_m6: state.count_m6,
            position: AxisValues::new(labels, &state.pos),
            machine_position: AxisValues::new(labels, &state.mpos),
        }
    }

    pub fn has_invalid_gcode(&self) -> bool {
        !self.invalid_gcode.is_empty()
    }
}
