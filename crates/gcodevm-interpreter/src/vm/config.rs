//! VM configuration
//!
//! Machine limits, axis layout and an optional modal-state override for
//! resuming a simulation from a controller's live state.

use gcodevm_core::{ConfigError, Plane, Units};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::interpreter::MotionCode;
use super::state::{Coolant, SpindleDirection, COORD_SYS_COUNT};

/// Word letters the interpreter gives a meaning, so they cannot name an axis
pub const RESERVED_LETTERS: &[char] = &[
    'G', 'M', 'N', 'F', 'S', 'T', 'P', 'L', 'R', 'I', 'J', 'K', 'H', 'D', 'O', 'Q',
];

const DEFAULT_MAX_FEED: f64 = 1000.0;
const DEFAULT_ACCELERATION: f64 = 500.0;

/// A limit given either once for every axis or once per axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerAxis {
    /// Same value on every axis
    Uniform(f64),
    /// One value per configured axis
    Axes(Vec<f64>),
}

impl PerAxis {
    /// Value for one axis
    pub fn for_axis(&self, axis: usize) -> f64 {
        match self {
            PerAxis::Uniform(v) => *v,
            PerAxis::Axes(values) => values.get(axis).copied().unwrap_or(f64::NAN),
        }
    }

    fn validate(&self, field: &str, axis_count: usize) -> Result<(), ConfigError> {
        let values: &[f64] = match self {
            PerAxis::Uniform(v) => std::slice::from_ref(v),
            PerAxis::Axes(values) => {
                if values.len() != axis_count {
                    return Err(ConfigError::AxisCountMismatch {
                        field: field.to_string(),
                        expected: axis_count,
                        actual: values.len(),
                    });
                }
                values
            }
        };

        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v <= 0.0) {
            return Err(ConfigError::ValueOutOfRange {
                field: field.to_string(),
                reason: format!("{} must be a positive number", bad),
            });
        }
        Ok(())
    }
}

impl From<f64> for PerAxis {
    fn from(value: f64) -> Self {
        PerAxis::Uniform(value)
    }
}

impl From<Vec<f64>> for PerAxis {
    fn from(values: Vec<f64>) -> Self {
        PerAxis::Axes(values)
    }
}

/// Modal state override applied on top of the defaults at reset
///
/// Every field is optional; absent fields keep their power-on default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialState {
    pub units: Option<Units>,
    pub incremental: Option<bool>,
    pub plane: Option<Plane>,
    pub inverse_feed: Option<bool>,
    pub motion_mode: Option<MotionCode>,
    /// 0 = G54 .. 5 = G59
    pub active_coord_sys: Option<usize>,
    pub coord_sys_offsets: Option<Vec<Vec<f64>>>,
    /// G92 offset
    pub offset: Option<Vec<f64>>,
    pub offset_enabled: Option<bool>,
    /// G28 and G30 reference positions, machine coordinates
    pub stored_positions: Option<[Vec<f64>; 2]>,
    /// Machine position; the work position is derived from it
    pub mpos: Option<Vec<f64>>,
    pub feed: Option<f64>,
    pub spindle: Option<bool>,
    pub spindle_direction: Option<SpindleDirection>,
    pub spindle_speed: Option<f64>,
    pub coolant: Option<Coolant>,
    pub tool: Option<u32>,
}

impl InitialState {
    /// Check vector lengths and indices against the axis count
    pub fn validate(&self, axis_count: usize) -> Result<(), ConfigError> {
        let check = |field: &str, values: &[f64]| {
            if values.len() == axis_count {
                Ok(())
            } else {
                Err(ConfigError::AxisCountMismatch {
                    field: field.to_string(),
                    expected: axis_count,
                    actual: values.len(),
                })
            }
        };

        if let Some(index) = self.active_coord_sys {
            if index >= COORD_SYS_COUNT {
                return Err(ConfigError::CoordSysOutOfRange { index });
            }
        }
        if let Some(offsets) = &self.coord_sys_offsets {
            if offsets.len() > COORD_SYS_COUNT {
                return Err(ConfigError::CoordSysOutOfRange {
                    index: offsets.len() - 1,
                });
            }
            for system in offsets {
                check("initial_state.coord_sys_offsets", system)?;
            }
        }
        if let Some(offset) = &self.offset {
            check("initial_state.offset", offset)?;
        }
        if let Some(stored) = &self.stored_positions {
            check("initial_state.stored_positions", &stored[0])?;
            check("initial_state.stored_positions", &stored[1])?;
        }
        if let Some(mpos) = &self.mpos {
            check("initial_state.mpos", mpos)?;
        }
        if let Some(feed) = self.feed {
            if !feed.is_finite() || feed < 0.0 {
                return Err(ConfigError::ValueOutOfRange {
                    field: "initial_state.feed".to_string(),
                    reason: format!("{} is not a valid feed rate", feed),
                });
            }
        }
        Ok(())
    }
}

/// Configuration accepted when building a VM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Active axes, in coordinate-array order
    pub axis_labels: Vec<char>,
    /// Maximum feed rate in mm/min
    pub max_feed: PerAxis,
    /// Acceleration in mm/s²
    pub acceleration: PerAxis,
    /// Shortest duration any single move may report, in seconds
    pub min_move_time: f64,
    /// Time arcs over their true length instead of the chord
    pub arc_length_travel: bool,
    pub initial_state: Option<InitialState>,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            axis_labels: vec!['x', 'y', 'z'],
            max_feed: PerAxis::Uniform(DEFAULT_MAX_FEED),
            acceleration: PerAxis::Uniform(DEFAULT_ACCELERATION),
            min_move_time: 0.0,
            arc_length_travel: false,
            initial_state: None,
        }
    }
}

impl VmConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the axis list
    pub fn with_axes(mut self, labels: impl IntoIterator<Item = char>) -> Self {
        self.axis_labels = labels.into_iter().collect();
        self
    }

    /// Set the maximum feed rate(s), mm/min
    pub fn with_max_feed(mut self, max_feed: impl Into<PerAxis>) -> Self {
        self.max_feed = max_feed.into();
        self
    }

    /// Set the acceleration(s), mm/s²
    pub fn with_acceleration(mut self, acceleration: impl Into<PerAxis>) -> Self {
        self.acceleration = acceleration.into();
        self
    }

    /// Set the per-move duration floor, seconds
    pub fn with_min_move_time(mut self, seconds: f64) -> Self {
        self.min_move_time = seconds;
        self
    }

    /// Time arcs over their true length
    pub fn with_arc_length_travel(mut self, enabled: bool) -> Self {
        self.arc_length_travel = enabled;
        self
    }

    /// Resume from a known modal state
    pub fn with_initial_state(mut self, state: InitialState) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Number of configured axes
    pub fn axis_count(&self) -> usize {
        self.axis_labels.len()
    }

    /// Index of an axis label, case-insensitive
    pub fn axis_index(&self, label: char) -> Option<usize> {
        let label = label.to_ascii_lowercase();
        self.axis_labels
            .iter()
            .position(|l| l.to_ascii_lowercase() == label)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.axis_labels.is_empty() {
            return Err(ConfigError::NoAxes);
        }

        for (i, label) in self.axis_labels.iter().enumerate() {
            if !label.is_ascii_alphabetic() {
                return Err(ConfigError::InvalidAxisLabel { label: *label });
            }
            if RESERVED_LETTERS.contains(&label.to_ascii_uppercase()) {
                return Err(ConfigError::ReservedAxisLabel { label: *label });
            }
            if self.axis_index(*label) != Some(i) {
                return Err(ConfigError::DuplicateAxis { label: *label });
            }
        }

        let axis_count = self.axis_count();
        self.max_feed.validate("max_feed", axis_count)?;
        self.acceleration.validate("acceleration", axis_count)?;

        if !self.min_move_time.is_finite() || self.min_move_time < 0.0 {
            return Err(ConfigError::ValueOutOfRange {
                field: "min_move_time".to_string(),
                reason: format!("{} must be zero or positive", self.min_move_time),
            });
        }

        if let Some(initial) = &self.initial_state {
            initial.validate(axis_count)?;
        }

        Ok(())
    }

    /// Load config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.extension().is_some_and(|ext| ext == "json") {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::File(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ConfigError::File(format!("Invalid JSON config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::File(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)
            .map_err(|e| ConfigError::File(format!("Failed to write {}: {}", path.display(), e)))?;

        Ok(())
    }
}
