//! Motion and time estimation
//!
//! Each move is timed with a per-move trapezoidal approximation: the change in
//! every axis's feed component since the previous move costs an acceleration
//! ramp, and the rest of the travel runs at the programmed (or rapid) rate.
//! There is no look-ahead, corner blending or jerk limiting.

use super::config::VmConfig;
use super::state::VmState;

/// Replay one move against the state
///
/// `to` holds one entry per axis; `None` keeps the current coordinate. With
/// `incremental` set, entries are deltas from the current work position.
/// `axis_flags` names the axes the program specified; `None` means all axes.
/// A `feed` of `None` is a rapid move at each axis's maximum rate. A
/// precomputed `travel` replaces the straight-line distance (arcs use this).
///
/// Updates work and machine position, both bounds, the moved-axis flags and
/// the total time, and returns the seconds this move took.
pub(crate) fn process_move(
    state: &mut VmState,
    config: &VmConfig,
    to: &[Option<f64>],
    axis_flags: Option<&[bool]>,
    feed: Option<f64>,
    travel: Option<f64>,
    incremental: bool,
) -> f64 {
    let n = state.axis_count();
    let target: Vec<f64> = (0..n)
        .map(|i| match to.get(i).copied().flatten() {
            Some(v) if incremental => state.pos[i] + v,
            Some(v) => v,
            None => state.pos[i],
        })
        .collect();

    let axis_travel: Vec<f64> = target
        .iter()
        .zip(&state.pos)
        .map(|(t, p)| (t - p).abs())
        .collect();
    let travel = travel.unwrap_or_else(|| axis_travel.iter().map(|d| d * d).sum::<f64>().sqrt());

    let move_time = if travel <= 0.0 {
        0.0
    } else if state.inverse_feed && feed.is_some_and(|f| f > 0.0) {
        inverse_time_move(state, config, &axis_travel, feed.unwrap_or_default())
    } else {
        timed_move(state, config, &axis_travel, travel, feed)
    };
    let move_time = move_time.max(config.min_move_time);

    let start = std::mem::replace(&mut state.pos, target);
    let mstart = state.mpos.clone();
    state.update_mpos_from_pos();

    for axis in 0..n {
        let specified = axis_flags.map_or(true, |flags| flags.get(axis).copied().unwrap_or(false));
        if !specified {
            continue;
        }
        state.bounds.include(axis, start[axis]);
        state.bounds.include(axis, state.pos[axis]);
        state.mbounds.include(axis, mstart[axis]);
        state.mbounds.include(axis, state.mpos[axis]);
        if !incremental {
            state.has_moved_to_axes[axis] = true;
        }
    }

    state.total_time += move_time;
    move_time
}

/// Maximum feed for an axis in the program's units per minute
fn axis_max_feed(state: &VmState, config: &VmConfig, axis: usize) -> f64 {
    state.units.from_mm(config.max_feed.for_axis(axis))
}

/// Acceleration for an axis in the program's units per second squared
fn axis_acceleration(state: &VmState, config: &VmConfig, axis: usize) -> f64 {
    state.units.from_mm(config.acceleration.for_axis(axis))
}

/// G93: the move takes 1/F minutes, but never less than the slowest axis allows
fn inverse_time_move(
    state: &mut VmState,
    config: &VmConfig,
    axis_travel: &[f64],
    feed: f64,
) -> f64 {
    let min_time = axis_travel
        .iter()
        .enumerate()
        .map(|(axis, d)| d / axis_max_feed(state, config, axis) * 60.0)
        .fold(0.0, f64::max);

    let move_time = (60.0 / feed).max(min_time);
    state.last_move_axis_feeds = Some(axis_travel.iter().map(|d| d / move_time * 60.0).collect());
    move_time
}

/// Units-per-minute mode with acceleration ramps
fn timed_move(
    state: &mut VmState,
    config: &VmConfig,
    axis_travel: &[f64],
    travel: f64,
    feed: Option<f64>,
) -> f64 {
    let n = axis_travel.len();
    let feed = feed.filter(|f| *f > 0.0);
    let last = state
        .last_move_axis_feeds
        .take()
        .unwrap_or_else(|| vec![0.0; n]);

    let axis_feeds: Vec<f64> = (0..n)
        .map(|axis| match feed {
            Some(f) => f * axis_travel[axis] / travel,
            None if axis_travel[axis] > 0.0 => axis_max_feed(state, config, axis),
            None => 0.0,
        })
        .collect();

    // Seconds to move each axis's feed component from the previous move's value
    let accel_times: Vec<f64> = (0..n)
        .map(|axis| {
            let prev = last.get(axis).copied().unwrap_or(0.0);
            (axis_feeds[axis] - prev).abs() / 60.0 / axis_acceleration(state, config, axis)
        })
        .collect();

    let move_time = match feed {
        Some(f) => {
            let max_accel_time = accel_times.iter().copied().fold(0.0, f64::max);
            let speed = f / 60.0;
            let prev_speed = last.iter().map(|v| v * v).sum::<f64>().sqrt() / 60.0;
            let accel_dist = ((prev_speed + speed) / 2.0 * max_accel_time).min(travel);
            (travel - accel_dist) / speed + max_accel_time
        }
        None => (0..n)
            .map(|axis| {
                let speed = axis_feeds[axis] / 60.0;
                let accel_time = accel_times[axis];
                if speed <= 0.0 {
                    return accel_time;
                }
                let prev_speed = last.get(axis).copied().unwrap_or(0.0) / 60.0;
                let accel_dist = ((prev_speed + speed) / 2.0 * accel_time).min(axis_travel[axis]);
                (axis_travel[axis] - accel_dist) / speed + accel_time
            })
            .fold(0.0, f64::max),
    };

    state.last_move_axis_feeds = Some(axis_feeds);
    move_time
}
