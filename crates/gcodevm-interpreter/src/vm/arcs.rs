//! Arc geometry for G2/G3
//!
//! Resolves the arc centre from either centre-offset words (I/J/K) or a radius
//! word (R), and measures arc length for callers that time arcs over their
//! true path. Tessellation is left to consumers of the motion events.

use gcodevm_core::{InterpretError, Plane};
use std::f64::consts::TAU;

/// How the arc centre was programmed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CenterSpec {
    /// Offsets from the start point along the two in-plane axes
    Offsets(f64, f64),
    /// Radius; negative selects the arc longer than a semicircle
    Radius(f64),
}

/// Resolved in-plane arc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneArc {
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub center: (f64, f64),
    pub clockwise: bool,
}

impl PlaneArc {
    /// Resolve the centre of an arc in its plane
    ///
    /// A radius too short to span the chord is clamped to a semicircle and
    /// logged; `line` only labels that diagnostic.
    pub fn resolve(
        start: (f64, f64),
        end: (f64, f64),
        spec: CenterSpec,
        clockwise: bool,
        line: u64,
    ) -> Self {
        let center = match spec {
            CenterSpec::Offsets(i, j) => (start.0 + i, start.1 + j),
            CenterSpec::Radius(r) => radius_center(start, end, r, clockwise, line),
        };
        Self {
            start,
            end,
            center,
            clockwise,
        }
    }

    /// Radius measured from the start point
    pub fn radius(&self) -> f64 {
        (self.start.0 - self.center.0).hypot(self.start.1 - self.center.1)
    }

    /// Swept angle in radians, in (0, 2π]; coincident endpoints are a full circle
    pub fn sweep(&self) -> f64 {
        let a0 = (self.start.1 - self.center.1).atan2(self.start.0 - self.center.0);
        let a1 = (self.end.1 - self.center.1).atan2(self.end.0 - self.center.0);
        let mut sweep = if self.clockwise { a0 - a1 } else { a1 - a0 };
        if sweep <= 1e-9 {
            sweep += TAU;
        }
        sweep.min(TAU)
    }

    /// Path length, including travel along the plane normal for helices
    pub fn length(&self, helical: f64) -> f64 {
        (self.radius() * self.sweep()).hypot(helical)
    }
}

fn radius_center(
    start: (f64, f64),
    end: (f64, f64),
    r: f64,
    clockwise: bool,
    line: u64,
) -> (f64, f64) {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let chord = dx.hypot(dy);

    if chord < 1e-12 {
        tracing::warn!(
            "{}",
            InterpretError::InvalidParameter {
                line,
                param: "R".to_string(),
                reason: "radius arc with coincident endpoints".to_string(),
            }
        );
        return start;
    }

    let mut h_sq = 4.0 * r * r - dx * dx - dy * dy;
    if h_sq < 0.0 {
        tracing::warn!(
            "{}",
            InterpretError::ArcRadiusTooSmall {
                line,
                radius: r,
                chord,
            }
        );
        h_sq = 0.0;
    }

    // Distance from chord midpoint to centre, scaled by 2/chord
    let mut h = -h_sq.sqrt() / chord;
    if !clockwise {
        h = -h;
    }
    if r < 0.0 {
        h = -h;
    }

    (
        start.0 + 0.5 * (dx - dy * h),
        start.1 + 0.5 * (dy + dx * h),
    )
}

/// Axis indices of a plane's two in-plane axes and its normal
///
/// Axes that are not configured come back as `None`.
pub fn plane_axes(
    plane: Plane,
    axis_index: impl Fn(char) -> Option<usize>,
) -> (Option<usize>, Option<usize>, Option<usize>) {
    let (a, b, n) = plane.axes();
    (axis_index(a), axis_index(b), axis_index(n))
}
