//! Modal state store
//!
//! `VmState` holds every persistent modal setting plus the accumulators the
//! interpreter fills in while a program is replayed. It is owned by one
//! evaluation and mutated once per processed line.

use gcodevm_core::{ConfigError, Plane, Units};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use super::config::VmConfig;
use super::interpreter::MotionCode;

/// Number of selectable work coordinate systems (G54..G59)
pub const COORD_SYS_COUNT: usize = 6;

/// Spindle rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpindleDirection {
    /// M3
    Cw,
    /// M4
    Ccw,
}

impl Default for SpindleDirection {
    fn default() -> Self {
        Self::Cw
    }
}

/// Coolant state as a 2-bit set: mist = 1, flood = 2, both = 3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coolant(u8);

impl Coolant {
    pub const OFF: Coolant = Coolant(0);
    pub const MIST: Coolant = Coolant(1);
    pub const FLOOD: Coolant = Coolant(2);
    pub const BOTH: Coolant = Coolant(3);

    /// Build from the raw encoding; bits above the two coolant bits are dropped
    pub fn from_bits(bits: u8) -> Self {
        Coolant(bits & 0b11)
    }

    /// Raw 0..=3 encoding
    pub fn bits(self) -> u8 {
        self.0 & 0b11
    }

    /// Add mist or flood to the current state
    pub fn with(self, other: Coolant) -> Self {
        Coolant::from_bits(self.0 | other.0)
    }

    pub fn mist(self) -> bool {
        self.bits() & Self::MIST.0 != 0
    }

    pub fn flood(self) -> bool {
        self.bits() & Self::FLOOD.0 != 0
    }

    pub fn is_on(self) -> bool {
        self.bits() != 0
    }
}

impl fmt::Display for Coolant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bits() {
            0 => write!(f, "off"),
            1 => write!(f, "mist"),
            2 => write!(f, "flood"),
            _ => write!(f, "mist+flood"),
        }
    }
}

/// Min/max envelope per axis; `None` means the axis was never observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec<Option<f64>>,
    pub max: Vec<Option<f64>>,
}

impl Bounds {
    /// Empty bounds for `axis_count` axes
    pub fn new(axis_count: usize) -> Self {
        Self {
            min: vec![None; axis_count],
            max: vec![None; axis_count],
        }
    }

    /// Widen one axis to include `value`
    pub fn include(&mut self, axis: usize, value: f64) {
        if let Some(min) = self.min.get_mut(axis) {
            if min.map_or(true, |m| value < m) {
                *min = Some(value);
            }
        }
        if let Some(max) = self.max.get_mut(axis) {
            if max.map_or(true, |m| value > m) {
                *max = Some(value);
            }
        }
    }

    /// True until any axis has been observed
    pub fn is_empty(&self) -> bool {
        self.min.iter().all(Option::is_none)
    }
}

/// Distinct numeric values in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistinctValues {
    values: Vec<f64>,
    seen: HashSet<u64>,
}

impl DistinctValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value; returns true if it was new
    pub fn insert(&mut self, value: f64) -> bool {
        // -0.0 and 0.0 are the same rate
        let key = if value == 0.0 { 0 } else { value.to_bits() };
        if self.seen.insert(key) {
            self.values.push(value);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.values.iter().any(|v| *v == value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }
}

impl Serialize for DistinctValues {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

/// Complete simulation state for one program evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct VmState {
    pub axis_labels: Vec<char>,
    /// Work position
    pub pos: Vec<f64>,
    /// Machine position
    pub mpos: Vec<f64>,
    /// 0 = G54 .. 5 = G59
    pub active_coord_sys: usize,
    pub coord_sys_offsets: Vec<Vec<f64>>,
    /// G92 offset
    pub offset: Vec<f64>,
    pub offset_enabled: bool,
    /// G28 and G30 reference positions, machine coordinates
    pub stored_positions: [Vec<f64>; 2],

    pub units: Units,
    pub incremental: bool,
    pub motion_mode: Option<MotionCode>,
    pub arc_plane: Plane,
    pub inverse_feed: bool,
    pub feed: f64,
    pub spindle: bool,
    pub spindle_direction: SpindleDirection,
    pub spindle_speed: f64,
    pub coolant: Coolant,
    pub tool: Option<u32>,
    /// Last `N` word seen
    pub line: Option<u64>,

    /// Seconds, never decreases
    pub total_time: f64,
    pub bounds: Bounds,
    pub mbounds: Bounds,
    pub line_counter: u64,
    pub has_moved_to_axes: Vec<bool>,
    pub seen_word_set: BTreeSet<char>,
    pub feedrates: DistinctValues,
    pub tools: BTreeSet<u32>,
    pub spindle_rates: DistinctValues,
    pub invalid_gcode: BTreeSet<String>,
    /// Tool selections (`T` words)
    pub count_t: u64,
    /// Tool changes actually performed (`M6`)
    pub count_m6: u64,

    /// Per-axis feed components of the previous move, units/min
    pub(crate) last_move_axis_feeds: Option<Vec<f64>>,
}

impl VmState {
    /// Build the power-on state for a configuration, applying any initial override
    pub fn new(config: &VmConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let n = config.axis_count();
        let mut state = Self {
            axis_labels: config
                .axis_labels
                .iter()
                .map(|l| l.to_ascii_lowercase())
                .collect(),
            pos: vec![0.0; n],
            mpos: vec![0.0; n],
            active_coord_sys: 0,
            coord_sys_offsets: vec![vec![0.0; n]; COORD_SYS_COUNT],
            offset: vec![0.0; n],
            offset_enabled: false,
            stored_positions: [vec![0.0; n], vec![0.0; n]],
            units: Units::Mm,
            incremental: false,
            motion_mode: Some(MotionCode::Rapid),
            arc_plane: Plane::Xy,
            inverse_feed: false,
            feed: 0.0,
            spindle: false,
            spindle_direction: SpindleDirection::Cw,
            spindle_speed: 0.0,
            coolant: Coolant::OFF,
            tool: None,
            line: None,
            total_time: 0.0,
            bounds: Bounds::new(n),
            mbounds: Bounds::new(n),
            line_counter: 0,
            has_moved_to_axes: vec![false; n],
            seen_word_set: BTreeSet::new(),
            feedrates: DistinctValues::new(),
            tools: BTreeSet::new(),
            spindle_rates: DistinctValues::new(),
            invalid_gcode: BTreeSet::new(),
            count_t: 0,
            count_m6: 0,
            last_move_axis_feeds: None,
        };

        if let Some(initial) = &config.initial_state {
            if let Some(units) = initial.units {
                state.units = units;
            }
            if let Some(incremental) = initial.incremental {
                state.incremental = incremental;
            }
            if let Some(plane) = initial.plane {
                state.arc_plane = plane;
            }
            if let Some(inverse_feed) = initial.inverse_feed {
                state.inverse_feed = inverse_feed;
            }
            if let Some(motion) = initial.motion_mode {
                state.motion_mode = Some(motion);
            }
            if let Some(index) = initial.active_coord_sys {
                state.active_coord_sys = index;
            }
            if let Some(offsets) = &initial.coord_sys_offsets {
                for (slot, values) in state.coord_sys_offsets.iter_mut().zip(offsets) {
                    slot.clone_from(values);
                }
            }
            if let Some(offset) = &initial.offset {
                state.offset.clone_from(offset);
            }
            if let Some(enabled) = initial.offset_enabled {
                state.offset_enabled = enabled;
            }
            if let Some(stored) = &initial.stored_positions {
                state.stored_positions = stored.clone();
            }
            if let Some(mpos) = &initial.mpos {
                state.mpos.clone_from(mpos);
            }
            if let Some(feed) = initial.feed {
                state.feed = feed;
            }
            if let Some(spindle) = initial.spindle {
                state.spindle = spindle;
            }
            if let Some(direction) = initial.spindle_direction {
                state.spindle_direction = direction;
            }
            if let Some(speed) = initial.spindle_speed {
                state.spindle_speed = speed;
            }
            if let Some(coolant) = initial.coolant {
                state.coolant = coolant;
            }
            if let Some(tool) = initial.tool {
                state.tool = Some(tool);
            }
        }

        state.update_pos_from_mpos();
        Ok(state)
    }

    /// Return to the power-on state for `config`
    pub fn reset(&mut self, config: &VmConfig) -> Result<(), ConfigError> {
        *self = Self::new(config)?;
        Ok(())
    }

    /// Number of axes this state was built for
    pub fn axis_count(&self) -> usize {
        self.axis_labels.len()
    }

    /// Index of an axis label, case-insensitive
    pub fn axis_index(&self, label: char) -> Option<usize> {
        let label = label.to_ascii_lowercase();
        self.axis_labels.iter().position(|l| *l == label)
    }
}
