//! Instruction interpreter
//!
//! `apply_line` consumes one parsed line against the modal state: it updates
//! every modal group the line touches, handles the non-modal commands that
//! consume axis words (G10, G28.1, G92, ...), and dispatches motion to the
//! estimator. Input problems are logged and skipped; a bad line never aborts
//! the evaluation.

use gcodevm_core::{InterpretError, Plane, Units};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::arcs::{plane_axes, CenterSpec, PlaneArc};
use super::config::VmConfig;
use super::estimator::process_move;
use super::events::{ModalSnapshot, MotionEvent, MotionGeometry};
use super::state::{Coolant, SpindleDirection, VmState};
use crate::gcode::{format_code, ParsedLine};

/// Motion a line performs
///
/// Codes are stored in tenths where they carry a decimal (`G38.2` is `382`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionCode {
    /// G0
    Rapid,
    /// G1
    Linear,
    /// G2
    ArcCw,
    /// G3
    ArcCcw,
    /// G28, non-modal
    Home,
    /// G30, non-modal
    SecondaryHome,
    /// Motion-group code the VM recognises but does not simulate
    Unsupported(i32),
}

impl MotionCode {
    /// Map a modal motion-group code (in tenths) to a motion code
    pub fn from_modal_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Rapid),
            10 => Some(Self::Linear),
            20 => Some(Self::ArcCw),
            30 => Some(Self::ArcCcw),
            // splines, threading, probing, canned cycles
            50 | 51 | 330 | 382..=385 | 730 | 760 => Some(Self::Unsupported(code)),
            810..=890 if code % 10 == 0 => Some(Self::Unsupported(code)),
            _ => None,
        }
    }

    /// The code in tenths
    pub fn tenths(self) -> i32 {
        match self {
            Self::Rapid => 0,
            Self::Linear => 10,
            Self::ArcCw => 20,
            Self::ArcCcw => 30,
            Self::Home => 280,
            Self::SecondaryHome => 300,
            Self::Unsupported(code) => code,
        }
    }

    pub fn is_arc(self) -> bool {
        matches!(self, Self::ArcCw | Self::ArcCcw)
    }

}

impl fmt::Display for MotionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_code('G', self.tenths()))
    }
}

/// Per-line summary returned by `apply_line`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineResult {
    pub is_motion: bool,
    pub motion_code: Option<MotionCode>,
    /// A coordinate system, G92 offset or program reset changed the work frame
    pub changed_coord_offsets: bool,
    /// Seconds added to the total by this line
    pub time: f64,
    pub events: Vec<MotionEvent>,
}

/// Axis words present on a line
#[derive(Debug, Clone)]
struct AxisWords {
    values: Vec<Option<f64>>,
    flags: Vec<bool>,
    /// G53: values are machine coordinates
    machine_frame: bool,
}

impl AxisWords {
    fn collect(state: &VmState, line: &ParsedLine, machine_frame: bool) -> Self {
        let values: Vec<Option<f64>> = state
            .axis_labels
            .iter()
            .map(|label| line.get(*label))
            .collect();
        let flags = values.iter().map(Option::is_some).collect();
        Self {
            values,
            flags,
            machine_frame,
        }
    }

    fn any(&self) -> bool {
        self.flags.iter().any(|f| *f)
    }

    /// Absolute work-coordinate targets; unspecified axes stay `None`
    fn targets(&self, state: &VmState) -> Vec<Option<f64>> {
        if self.machine_frame {
            return state.machine_words_to_work(&self.values);
        }
        let incremental = state.incremental;
        self.values
            .iter()
            .zip(&state.pos)
            .map(|(value, pos)| value.map(|v| if incremental { pos + v } else { v }))
            .collect()
    }
}

/// Apply one parsed line to the state
///
/// `config` must be the configuration `state` was built from; `GcodeVm`
/// keeps the two together.
pub(crate) fn apply_line(state: &mut VmState, config: &VmConfig, line: &ParsedLine) -> LineResult {
    let mut result = LineResult::default();
    let time_before = state.total_time;
    state.line_counter += 1;

    for letter in line.letters() {
        state.seen_word_set.insert(letter);
    }
    if line.is_invalid() {
        tracing::debug!(
            "Invalid G-code at line {}: {}",
            state.line_counter,
            line.source()
        );
        state.invalid_gcode.insert(line.source().to_string());
    }
    if let Some(n) = line.get('N').filter(|n| *n >= 0.0) {
        state.line = Some(n as u64);
    }

    let g_codes: Vec<i32> = line.codes('G').collect();
    let m_codes: Vec<i32> = line.codes('M').collect();
    let has_g = |code: i32| g_codes.contains(&code);
    let has_m = |code: i32| m_codes.contains(&code);

    apply_modal_words(state, line, &g_codes, &m_codes, &mut result);

    let words = AxisWords::collect(state, line, has_g(530));
    if has_g(100) {
        set_coord_sys_offsets(state, line, &words);
        result.changed_coord_offsets = true;
    } else if has_g(281) {
        state.stored_positions[0] = state.mpos.clone();
    } else if has_g(301) {
        state.stored_positions[1] = state.mpos.clone();
    } else if has_g(282) || has_g(283) {
        home_axes(state, &words);
    } else if let Some(code) = g_codes.iter().copied().find(|c| (920..=923).contains(c)) {
        apply_g92(state, code, &words);
        result.changed_coord_offsets = true;
    } else if let Some(code) = motion_for_line(state, line, &g_codes, &words) {
        result.motion_code = Some(code);
        match run_motion(state, config, line, code, &words, &mut result) {
            Ok(()) => result.is_motion = true,
            Err(e) => {
                tracing::error!("{}", e);
                result.events.clear();
            }
        }
    }

    if has_m(20) || has_m(300) {
        program_end(state);
        result.changed_coord_offsets = true;
    }

    result.time = state.total_time - time_before;
    result
}

/// Feed, spindle, tool, coolant, dwell and the modal G groups
fn apply_modal_words(
    state: &mut VmState,
    line: &ParsedLine,
    g_codes: &[i32],
    m_codes: &[i32],
    result: &mut LineResult,
) {
    for &code in g_codes {
        match code {
            930 => state.inverse_feed = true,
            940 => state.inverse_feed = false,
            170 | 180 | 190 => {
                if let Some(plane) = Plane::from_gcode((code / 10) as u8) {
                    state.arc_plane = plane;
                }
            }
            200 => state.units = Units::In,
            210 => state.units = Units::Mm,
            540 | 550 | 560 | 570 | 580 | 590 => {
                state.set_coord_sys(((code - 540) / 10) as usize);
                result.changed_coord_offsets = true;
            }
            800 => state.motion_mode = None,
            900 => state.incremental = false,
            910 => state.incremental = true,
            40 => dwell(state, line),
            c if is_simulated_gcode(c) => {}
            c => tracing::debug!(
                "{} at line {} is not simulated",
                format_code('G', c),
                state.line_counter
            ),
        }
    }

    if let Some(feed) = line.get('F') {
        if feed >= 0.0 {
            state.feed = feed;
            state.feedrates.insert(feed);
        }
    }

    if let Some(speed) = line.get('S') {
        if speed >= 0.0 {
            state.spindle_speed = speed;
            state.spindle_rates.insert(speed);
        }
    }

    for tool in line.get_all('T') {
        if tool < 0.0 {
            continue;
        }
        let tool = tool.round() as u32;
        state.tools.insert(tool);
        state.tool = Some(tool);
        state.count_t += 1;
    }

    for &code in m_codes {
        match code {
            30 => {
                state.spindle = true;
                state.spindle_direction = SpindleDirection::Cw;
            }
            40 => {
                state.spindle = true;
                state.spindle_direction = SpindleDirection::Ccw;
            }
            50 => state.spindle = false,
            60 => state.count_m6 += 1,
            70 => state.coolant = state.coolant.with(Coolant::MIST),
            80 => state.coolant = state.coolant.with(Coolant::FLOOD),
            90 => state.coolant = Coolant::OFF,
            _ => {}
        }
    }
}

/// G-codes handled somewhere in `apply_line`
fn is_simulated_gcode(code: i32) -> bool {
    matches!(
        code,
        0 | 10 | 20 | 30 | 100 | 280..=283 | 300 | 301 | 530 | 920..=923
    ) || MotionCode::from_modal_code(code).is_some()
}

/// G4 P<seconds>
fn dwell(state: &mut VmState, line: &ParsedLine) {
    match line.get('P') {
        Some(seconds) if seconds > 0.0 => state.total_time += seconds,
        Some(_) => {}
        None => tracing::warn!(
            "{}",
            InterpretError::InvalidParameter {
                line: state.line_counter,
                param: "G4".to_string(),
                reason: "dwell without P word".to_string(),
            }
        ),
    }
}

/// Which motion this line performs, updating the sticky motion mode
fn motion_for_line(
    state: &mut VmState,
    line: &ParsedLine,
    g_codes: &[i32],
    words: &AxisWords,
) -> Option<MotionCode> {
    if g_codes.contains(&280) {
        return Some(MotionCode::Home);
    }
    if g_codes.contains(&300) {
        return Some(MotionCode::SecondaryHome);
    }

    let explicit = g_codes.iter().find_map(|c| MotionCode::from_modal_code(*c));
    if let Some(code) = explicit {
        state.motion_mode = Some(code);
    }

    let mode = state.motion_mode?;
    let full_circle = mode.is_arc() && (line.has('I') || line.has('J') || line.has('K'));
    if words.any() || full_circle {
        Some(mode)
    } else {
        if explicit.is_none() && line.has('R') {
            tracing::debug!(
                "R word without axis words at line {} ignored",
                state.line_counter
            );
        }
        None
    }
}

fn run_motion(
    state: &mut VmState,
    config: &VmConfig,
    line: &ParsedLine,
    code: MotionCode,
    words: &AxisWords,
    result: &mut LineResult,
) -> Result<(), InterpretError> {
    match code {
        MotionCode::Rapid => {
            straight_move(state, config, code, words, None, result);
        }
        MotionCode::Linear => {
            let feed = feed_for_move(state);
            straight_move(state, config, code, words, feed, result);
        }
        MotionCode::ArcCw | MotionCode::ArcCcw => {
            arc_move(state, config, line, code, words, result);
        }
        MotionCode::Home | MotionCode::SecondaryHome => {
            reference_move(state, config, code, words, result);
        }
        MotionCode::Unsupported(_) => {
            return Err(InterpretError::UnsupportedMotion {
                line: state.line_counter,
                code: code.to_string(),
                source_line: line.source().to_string(),
            });
        }
    }
    Ok(())
}

/// Programmed feed for G1/G2/G3; a missing feed falls back to rapid timing
fn feed_for_move(state: &VmState) -> Option<f64> {
    if state.feed > 0.0 {
        Some(state.feed)
    } else {
        tracing::warn!(
            "Feed move at line {} without a feed rate, timing it as a rapid",
            state.line_counter
        );
        None
    }
}

fn straight_move(
    state: &mut VmState,
    config: &VmConfig,
    code: MotionCode,
    words: &AxisWords,
    feed: Option<f64>,
    result: &mut LineResult,
) {
    let modal = ModalSnapshot::capture(state, code);
    let from = state.pos.clone();
    let machine_from = state.mpos.clone();

    let targets = words.targets(state);
    let time = process_move(state, config, &targets, Some(&words.flags), feed, None, false);

    result.events.push(MotionEvent {
        line: state.line_counter,
        modal,
        from,
        to: state.pos.clone(),
        machine_from,
        machine_to: state.mpos.clone(),
        geometry: MotionGeometry::Line,
        time,
    });
}

fn arc_move(
    state: &mut VmState,
    config: &VmConfig,
    line: &ParsedLine,
    code: MotionCode,
    words: &AxisWords,
    result: &mut LineResult,
) {
    let feed = feed_for_move(state);
    let plane = state.arc_plane;
    let (a, b, normal) = plane_axes(plane, |c| state.axis_index(c));
    let (Some(a), Some(b)) = (a, b) else {
        let (first, second, _) = plane.axes();
        let missing = if a.is_none() { first } else { second };
        tracing::warn!(
            "{}",
            InterpretError::UnknownAxis {
                line: state.line_counter,
                axis: missing,
            }
        );
        straight_move(state, config, code, words, feed, result);
        return;
    };

    let (oa, ob) = plane.offset_words();
    let spec = if line.has(oa) || line.has(ob) {
        CenterSpec::Offsets(line.get_or(oa, 0.0), line.get_or(ob, 0.0))
    } else if let Some(r) = line.get('R') {
        CenterSpec::Radius(r)
    } else {
        tracing::warn!(
            "{}",
            InterpretError::InvalidParameter {
                line: state.line_counter,
                param: code.to_string(),
                reason: "arc without centre offsets or radius".to_string(),
            }
        );
        straight_move(state, config, code, words, feed, result);
        return;
    };

    let targets = words.targets(state);
    let end: Vec<f64> = targets
        .iter()
        .zip(&state.pos)
        .map(|(t, p)| t.unwrap_or(*p))
        .collect();

    let arc = PlaneArc::resolve(
        (state.pos[a], state.pos[b]),
        (end[a], end[b]),
        spec,
        code == MotionCode::ArcCw,
        state.line_counter,
    );

    let mut center = state.pos.clone();
    center[a] = arc.center.0;
    center[b] = arc.center.1;
    let machine_center = state.to_machine(&center);

    let travel = config.arc_length_travel.then(|| {
        let helical = normal.map_or(0.0, |n| end[n] - state.pos[n]);
        arc.length(helical)
    });

    let modal = ModalSnapshot::capture(state, code);
    let from = state.pos.clone();
    let machine_from = state.mpos.clone();
    let time = process_move(state, config, &targets, Some(&words.flags), feed, travel, false);

    result.events.push(MotionEvent {
        line: state.line_counter,
        modal,
        from,
        to: state.pos.clone(),
        machine_from,
        machine_to: state.mpos.clone(),
        geometry: MotionGeometry::Arc {
            center,
            machine_center,
            clockwise: arc.clockwise,
            plane,
        },
        time,
    });
}

/// G28/G30: optional intermediate point, then the stored reference position
fn reference_move(
    state: &mut VmState,
    config: &VmConfig,
    code: MotionCode,
    words: &AxisWords,
    result: &mut LineResult,
) {
    if words.any() {
        straight_move(state, config, code, words, None, result);
    }

    let slot = if code == MotionCode::Home { 0 } else { 1 };
    let reference = state.to_work(&state.stored_positions[slot]);
    let targets: Vec<Option<f64>> = reference.into_iter().map(Some).collect();

    let modal = ModalSnapshot::capture(state, code);
    let from = state.pos.clone();
    let machine_from = state.mpos.clone();
    let time = process_move(state, config, &targets, None, None, None, false);

    result.events.push(MotionEvent {
        line: state.line_counter,
        modal,
        from,
        to: state.pos.clone(),
        machine_from,
        machine_to: state.mpos.clone(),
        geometry: MotionGeometry::Line,
        time,
    });
}

/// G10 L2 / L20
///
/// L2 stores the axis words as the system's offsets. L20 derives them from
/// the current machine position: every named axis of the system is moved so
/// that the current machine position becomes its work origin.
fn set_coord_sys_offsets(state: &mut VmState, line: &ParsedLine, words: &AxisWords) {
    let l2 = line.has_code('L', 2.0);
    let l20 = line.has_code('L', 20.0);
    if !l2 && !l20 {
        tracing::debug!(
            "G10 without L2/L20 at line {} is not simulated",
            state.line_counter
        );
        return;
    }

    let index = match line.get('P') {
        None => state.active_coord_sys,
        Some(p) if p == 0.0 => state.active_coord_sys,
        Some(p) if p.fract() == 0.0 && (1.0..=6.0).contains(&p) => p as usize - 1,
        Some(p) => {
            tracing::warn!(
                "{}",
                InterpretError::InvalidParameter {
                    line: state.line_counter,
                    param: "P".to_string(),
                    reason: format!("{} is not a coordinate system (0-6)", p),
                }
            );
            return;
        }
    };

    for (axis, value) in words.values.iter().enumerate() {
        let Some(value) = value else { continue };
        let new_offset = if l20 {
            let g92 = if state.offset_enabled {
                state.offset[axis]
            } else {
                0.0
            };
            state.mpos[axis] - g92
        } else {
            *value
        };
        state.coord_sys_offsets[index][axis] = new_offset;
    }

    if index == state.active_coord_sys {
        state.update_pos_from_mpos();
    }
}

/// G28.2 / G28.3: the named axes are homed, so their machine position is zero
fn home_axes(state: &mut VmState, words: &AxisWords) {
    for (axis, flagged) in words.flags.iter().enumerate() {
        if *flagged {
            state.mpos[axis] = 0.0;
        }
    }
    state.update_pos_from_mpos();
}

/// G92 / G92.1 / G92.2 / G92.3
fn apply_g92(state: &mut VmState, code: i32, words: &AxisWords) {
    match code {
        920 => {
            let sys = state.active_coord_sys;
            for (axis, value) in words.values.iter().enumerate() {
                if let Some(value) = value {
                    state.offset[axis] =
                        state.mpos[axis] - state.coord_sys_offsets[sys][axis] - value;
                }
            }
            state.offset_enabled = true;
        }
        921 => {
            state.offset.iter_mut().for_each(|v| *v = 0.0);
            state.offset_enabled = false;
        }
        922 => state.offset_enabled = false,
        923 => state.offset_enabled = true,
        _ => return,
    }
    state.update_pos_from_mpos();
}

/// M2 / M30
fn program_end(state: &mut VmState) {
    state.offset.iter_mut().for_each(|v| *v = 0.0);
    state.offset_enabled = false;
    state.active_coord_sys = 0;
    state.arc_plane = Plane::Xy;
    state.incremental = false;
    state.inverse_feed = false;
    state.spindle = false;
    state.coolant = Coolant::OFF;
    state.units = Units::Mm;
    state.last_move_axis_feeds = None;
    state.update_pos_from_mpos();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(config: &VmConfig, lines: &[&str]) -> (VmState, Vec<LineResult>) {
        let mut state = VmState::new(config).unwrap();
        let results = lines
            .iter()
            .map(|l| apply_line(&mut state, config, &ParsedLine::parse(l)))
            .collect();
        (state, results)
    }

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_motion_code_mapping() {
        assert_eq!(MotionCode::from_modal_code(10), Some(MotionCode::Linear));
        assert_eq!(
            MotionCode::from_modal_code(382),
            Some(MotionCode::Unsupported(382))
        );
        assert_eq!(
            MotionCode::from_modal_code(830),
            Some(MotionCode::Unsupported(830))
        );
        assert_eq!(MotionCode::from_modal_code(900), None);
        assert_eq!(MotionCode::Unsupported(382).to_string(), "G38.2");
        assert_eq!(MotionCode::Home.to_string(), "G28");
    }

    #[test]
    fn test_sticky_motion_mode() {
        let config = VmConfig::default();
        let (state, results) = run(&config, &["G1 X1 F100", "X2", "Y3"]);
        assert_eq!(results[1].motion_code, Some(MotionCode::Linear));
        assert!(results[2].is_motion);
        assert!(close(&state.pos, &[2.0, 3.0, 0.0]));
    }

    #[test]
    fn test_motion_word_without_axes_sets_mode_only() {
        let config = VmConfig::default();
        let (state, results) = run(&config, &["G1"]);
        assert!(!results[0].is_motion);
        assert_eq!(state.motion_mode, Some(MotionCode::Linear));
    }

    #[test]
    fn test_g80_clears_motion_mode() {
        let config = VmConfig::default();
        let (state, results) = run(&config, &["G1 X1 F100", "G80", "X5"]);
        assert!(!results[2].is_motion);
        assert_eq!(results[2].motion_code, None);
        assert!(close(&state.pos, &[1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_modal_groups() {
        let config = VmConfig::default();
        let (state, _) = run(
            &config,
            &["G18 G20 G91 G93", "S12000 M4", "M7", "M8", "F250"],
        );
        assert_eq!(state.arc_plane, Plane::Zx);
        assert_eq!(state.units, Units::In);
        assert!(state.incremental);
        assert!(state.inverse_feed);
        assert!(state.spindle);
        assert_eq!(state.spindle_direction, SpindleDirection::Ccw);
        assert_eq!(state.spindle_speed, 12000.0);
        assert_eq!(state.coolant, Coolant::BOTH);
        assert_eq!(state.feed, 250.0);
        assert!(state.spindle_rates.contains(12000.0));
    }

    #[test]
    fn test_coolant_and_spindle_off() {
        let config = VmConfig::default();
        let (state, _) = run(&config, &["M3 M8", "M5 M9"]);
        assert!(!state.spindle);
        assert_eq!(state.coolant, Coolant::OFF);
    }

    #[test]
    fn test_dwell_adds_time() {
        let config = VmConfig::default();
        let (state, results) = run(&config, &["G4 P2.5", "G4 P-1"]);
        assert_eq!(state.total_time, 2.5);
        assert_eq!(results[0].time, 2.5);
        assert!(!results[0].is_motion);
        assert_eq!(results[1].time, 0.0);
    }

    #[test]
    fn test_unsupported_motion_is_skipped() {
        let config = VmConfig::default();
        let (state, results) = run(&config, &["G38.2 Z-10 F50", "T4"]);
        assert!(!results[0].is_motion);
        assert_eq!(results[0].time, 0.0);
        assert_eq!(results[0].motion_code, Some(MotionCode::Unsupported(382)));
        assert!(results[0].events.is_empty());
        assert_eq!(state.feed, 50.0);
        assert_eq!(state.pos, vec![0.0; 3]);
        assert_eq!(state.line_counter, 2);
        assert_eq!(state.count_t, 1);
    }

    #[test]
    fn test_line_number_word() {
        let config = VmConfig::default();
        let (state, _) = run(&config, &["N40 G0 X1", "G0 X2"]);
        assert_eq!(state.line, Some(40));
        assert_eq!(state.line_counter, 2);
    }

    #[test]
    fn test_coord_sys_selection() {
        let config = VmConfig::default();
        let (state, results) = run(&config, &["G10 L2 P2 X10 Y20", "G55", "G0 X0 Y0"]);
        assert!(results[0].changed_coord_offsets);
        assert!(results[1].changed_coord_offsets);
        assert_eq!(state.active_coord_sys, 1);
        assert!(close(&state.pos, &[0.0, 0.0, 0.0]));
        assert!(close(&state.mpos, &[10.0, 20.0, 0.0]));
    }

    #[test]
    fn test_g10_l2_on_active_system_shifts_work_position() {
        let config = VmConfig::default();
        let (state, _) = run(&config, &["G0 X5", "G10 L2 P1 X2"]);
        assert!(close(&state.mpos, &[5.0, 0.0, 0.0]));
        assert!(close(&state.pos, &[3.0, 0.0, 0.0]));
    }

    #[test]
    fn test_g10_l20_zeroes_named_axes_at_machine_position() {
        let config = VmConfig::default();
        let (state, _) = run(&config, &["G0 X5 Y5 Z2", "G10 L20 P1 X5 Y5"]);
        assert!(close(&state.coord_sys_offsets[0], &[5.0, 5.0, 0.0]));
        assert!(close(&state.pos, &[0.0, 0.0, 2.0]));
        assert!(close(&state.mpos, &[5.0, 5.0, 2.0]));
    }

    #[test]
    fn test_g10_l20_on_inactive_system() {
        let config = VmConfig::default();
        let (state, _) = run(&config, &["G0 X3", "G10 L20 P2 X0", "G55"]);
        assert!(close(&state.coord_sys_offsets[1], &[3.0, 0.0, 0.0]));
        assert!(close(&state.pos, &[0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_g10_bad_p_is_ignored() {
        let config = VmConfig::default();
        let (state, _) = run(&config, &["G10 L2 P9 X5"]);
        assert!(state.coord_sys_offsets.iter().all(|o| o.iter().all(|v| *v == 0.0)));
    }

    #[test]
    fn test_axis_words_on_g10_are_not_motion() {
        let config = VmConfig::default();
        let (_, results) = run(&config, &["G1 X1 F100", "G10 L2 P2 X5"]);
        assert!(!results[1].is_motion);
        assert!(results[1].events.is_empty());
    }

    #[test]
    fn test_g92_family() {
        let config = VmConfig::default();
        let (state, results) = run(&config, &["G0 X10 Y4", "G92 X0"]);
        assert!(results[1].changed_coord_offsets);
        assert!(state.offset_enabled);
        assert!(close(&state.pos, &[0.0, 4.0, 0.0]));
        assert!(close(&state.mpos, &[10.0, 4.0, 0.0]));

        let (state, _) = run(&config, &["G0 X10", "G92 X0", "G92.2"]);
        assert!(close(&state.pos, &[10.0, 0.0, 0.0]));
        assert_eq!(state.offset[0], 10.0);

        let (state, _) = run(&config, &["G0 X10", "G92 X0", "G92.2", "G92.3"]);
        assert!(close(&state.pos, &[0.0, 0.0, 0.0]));

        let (state, _) = run(&config, &["G0 X10", "G92 X0", "G92.1"]);
        assert!(close(&state.pos, &[10.0, 0.0, 0.0]));
        assert_eq!(state.offset, vec![0.0; 3]);
        assert!(!state.offset_enabled);
    }

    #[test]
    fn test_stored_positions_and_reference_return() {
        let config = VmConfig::default();
        let (state, results) = run(
            &config,
            &["G0 X7 Y8 Z9", "G28.1", "G0 X0 Y0 Z0", "G28 Z5"],
        );
        assert!(close(&state.stored_positions[0], &[7.0, 8.0, 9.0]));
        let last = &results[3];
        assert!(last.is_motion);
        assert_eq!(last.motion_code, Some(MotionCode::Home));
        assert_eq!(last.events.len(), 2);
        assert!(close(&last.events[0].to, &[0.0, 0.0, 5.0]));
        assert!(close(&state.pos, &[7.0, 8.0, 9.0]));
        // G28 is non-modal
        assert_eq!(state.motion_mode, Some(MotionCode::Rapid));
    }

    #[test]
    fn test_g30_uses_second_slot() {
        let config = VmConfig::default();
        let (state, _) = run(&config, &["G0 X3", "G30.1", "G0 X0", "G28", "G30"]);
        assert!(close(&state.stored_positions[1], &[3.0, 0.0, 0.0]));
        assert!(close(&state.pos, &[3.0, 0.0, 0.0]));
    }

    #[test]
    fn test_reference_return_in_work_frame() {
        let config = VmConfig::default();
        let (state, _) = run(&config, &["G10 L2 P1 X100", "G28"]);
        assert!(close(&state.mpos, &[0.0, 0.0, 0.0]));
        assert!(close(&state.pos, &[-100.0, 0.0, 0.0]));
    }

    #[test]
    fn test_homing_zeroes_named_axes() {
        let config = VmConfig::default();
        let (state, _) = run(&config, &["G0 X5 Y6 Z7", "G28.2 X0 Z0"]);
        assert!(close(&state.mpos, &[0.0, 6.0, 0.0]));
        assert!(close(&state.pos, &[0.0, 6.0, 0.0]));
    }

    #[test]
    fn test_g53_moves_in_machine_coordinates() {
        let config = VmConfig::default();
        let (state, results) = run(
            &config,
            &["G10 L2 P1 X10 Z-50", "G0 X0 Z0", "G53 G0 X0 Z0"],
        );
        let event = &results[2].events[0];
        assert!(close(&event.machine_from, &[10.0, 0.0, -50.0]));
        assert!(close(&event.machine_to, &[0.0, 0.0, 0.0]));
        assert!(close(&event.from, &[0.0, 0.0, 0.0]));
        assert!(close(&event.to, &[-10.0, 0.0, 50.0]));
        assert!(close(&state.mpos, &[0.0, 0.0, 0.0]));
        assert!(close(&state.pos, &[-10.0, 0.0, 50.0]));
        assert_eq!(state.active_coord_sys, 0);
    }

    #[test]
    fn test_g53_keeps_bounds_in_their_frames() {
        let config = VmConfig::default();
        let (state, _) = run(
            &config,
            &["G10 L2 P1 X10 Z-50", "G0 X0 Z0", "G53 G0 X0 Z0"],
        );
        assert_eq!(state.bounds.min, vec![Some(-10.0), None, Some(0.0)]);
        assert_eq!(state.bounds.max, vec![Some(0.0), None, Some(50.0)]);
        assert_eq!(state.mbounds.min, vec![Some(0.0), None, Some(-50.0)]);
        assert_eq!(state.mbounds.max, vec![Some(10.0), None, Some(0.0)]);
    }

    #[test]
    fn test_program_end_resets_modes() {
        let config = VmConfig::default();
        let (state, results) = run(
            &config,
            &["G20 G91 G93 G19 G55 M3 M8", "G92 X1", "M30"],
        );
        assert!(results[2].changed_coord_offsets);
        assert_eq!(state.units, Units::Mm);
        assert!(!state.incremental);
        assert!(!state.inverse_feed);
        assert_eq!(state.arc_plane, Plane::Xy);
        assert_eq!(state.active_coord_sys, 0);
        assert!(!state.offset_enabled);
        assert!(!state.spindle);
        assert_eq!(state.coolant, Coolant::OFF);
    }

    #[test]
    fn test_tool_words() {
        let config = VmConfig::default();
        let (state, _) = run(&config, &["T1 T7", "M6", "T3"]);
        assert_eq!(state.count_t, 3);
        assert_eq!(state.count_m6, 1);
        assert_eq!(state.tool, Some(3));
        assert_eq!(state.tools.iter().copied().collect::<Vec<_>>(), vec![1, 3, 7]);
    }

    #[test]
    fn test_arc_event_center() {
        let config = VmConfig::default();
        let (state, results) = run(&config, &["G0 X10 Y0", "G3 X0 Y10 I-10 J0 F600"]);
        let event = &results[1].events[0];
        assert!(event.is_arc());
        match &event.geometry {
            MotionGeometry::Arc {
                center,
                clockwise,
                plane,
                ..
            } => {
                assert!(close(center, &[0.0, 0.0, 0.0]));
                assert!(!clockwise);
                assert_eq!(*plane, Plane::Xy);
            }
            MotionGeometry::Line => panic!("expected an arc"),
        }
        assert!(close(&state.pos, &[0.0, 10.0, 0.0]));
    }

    #[test]
    fn test_arc_radius_form_in_zx_plane() {
        let config = VmConfig::default();
        let (_, results) = run(&config, &["G18", "G0 X10 Z0", "G2 X0 Z10 R10 F600"]);
        match &results[2].events[0].geometry {
            MotionGeometry::Arc { center, .. } => {
                // CW in ZX measured from Z toward X
                assert!(close(center, &[0.0, 0.0, 0.0]));
            }
            MotionGeometry::Line => panic!("expected an arc"),
        }
    }

    #[test]
    fn test_full_circle_with_offsets_only() {
        let config = VmConfig::new().with_arc_length_travel(true).with_acceleration(1e12);
        let (state, results) = run(&config, &["G0 X5", "G2 I-5 F600"]);
        assert!(results[1].is_motion);
        // Circumference 10π mm at 10 mm/s
        let expected = 10.0 * std::f64::consts::PI / 10.0;
        assert!((results[1].time - expected).abs() < 1e-6);
        assert!(close(&state.pos, &[5.0, 0.0, 0.0]));
    }

    #[test]
    fn test_arc_without_center_moves_straight() {
        let config = VmConfig::default();
        let (state, results) = run(&config, &["G2 X4 F100"]);
        assert!(results[0].is_motion);
        assert!(!results[0].events[0].is_arc());
        assert!(close(&state.pos, &[4.0, 0.0, 0.0]));
    }

    #[test]
    fn test_arc_plane_axis_missing() {
        let config = VmConfig::new().with_axes(['x', 'y']);
        let (state, results) = run(&config, &["G18", "G2 X4 I2 F100"]);
        assert!(results[1].is_motion);
        assert!(!results[1].events[0].is_arc());
        assert!(close(&state.pos, &[4.0, 0.0]));
    }

    #[test]
    fn test_incremental_moves() {
        let config = VmConfig::default();
        let (state, _) = run(&config, &["G91", "G0 X1 Y1", "G1 X1 F100", "G90", "G0 X0"]);
        assert!(close(&state.pos, &[0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_seen_words_and_invalid_lines() {
        let config = VmConfig::default();
        let (state, _) = run(&config, &["G0 X1", "$H", "T1 M6"]);
        assert!(state.seen_word_set.contains(&'G'));
        assert!(state.seen_word_set.contains(&'T'));
        assert!(state.invalid_gcode.contains("$H"));
        assert!(state.invalid_gcode.contains("T1 M6"));
        assert!(!state.invalid_gcode.contains("G0 X1"));
    }

    #[test]
    fn test_feed_move_without_feed_uses_rapid_rate() {
        let config = VmConfig::new().with_acceleration(1e12).with_max_feed(600.0);
        let (state, results) = run(&config, &["G1 X10"]);
        assert!(results[0].is_motion);
        assert!((state.total_time - 1.0).abs() < 1e-6);
    }
}
