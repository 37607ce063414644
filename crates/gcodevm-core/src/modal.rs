//! Arc plane selection (G17/G18/G19)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Active plane for circular interpolation
///
/// Each plane names its two in-plane axes (in the order the arc direction is
/// measured) and the normal axis used for helical motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    /// G17
    Xy,
    /// G18
    Zx,
    /// G19
    Yz,
}

impl Default for Plane {
    fn default() -> Self {
        Self::Xy
    }
}

impl Plane {
    /// Map a G-code number to a plane
    pub fn from_gcode(code: u8) -> Option<Self> {
        match code {
            17 => Some(Self::Xy),
            18 => Some(Self::Zx),
            19 => Some(Self::Yz),
            _ => None,
        }
    }

    /// The G-code that selects this plane
    pub fn gcode(self) -> u8 {
        match self {
            Self::Xy => 17,
            Self::Zx => 18,
            Self::Yz => 19,
        }
    }

    /// In-plane axes followed by the normal axis, as lowercase labels
    pub fn axes(self) -> (char, char, char) {
        match self {
            Self::Xy => ('x', 'y', 'z'),
            Self::Zx => ('z', 'x', 'y'),
            Self::Yz => ('y', 'z', 'x'),
        }
    }

    /// Arc centre offset word letters matching the in-plane axes
    pub fn offset_words(self) -> (char, char) {
        match self {
            Self::Xy => ('I', 'J'),
            Self::Zx => ('K', 'I'),
            Self::Yz => ('J', 'K'),
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xy => write!(f, "XY"),
            Self::Zx => write!(f, "ZX"),
            Self::Yz => write!(f, "YZ"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_gcode_roundtrip() {
        for plane in [Plane::Xy, Plane::Zx, Plane::Yz] {
            assert_eq!(Plane::from_gcode(plane.gcode()), Some(plane));
        }
        assert_eq!(Plane::from_gcode(20), None);
    }

    #[test]
    fn test_plane_axes() {
        assert_eq!(Plane::Zx.axes(), ('z', 'x', 'y'));
        assert_eq!(Plane::Zx.offset_words(), ('K', 'I'));
        assert_eq!(Plane::default(), Plane::Xy);
    }
}
