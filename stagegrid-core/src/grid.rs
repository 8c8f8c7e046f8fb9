//! Grid shape classification
//!
//! Maps the number of visible tiles to one of the discrete grid layouts the
//! view layer knows how to draw. The mapping uses descending thresholds; the
//! first one the count reaches wins.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest number of tiles any grid shape can hold (6x6)
pub const MAX_TILES: usize = 36;

/// Discrete grid layout, named columns x rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridShape {
    #[serde(rename = "1x1")]
    Grid1x1,
    #[serde(rename = "2x1")]
    Grid2x1,
    #[serde(rename = "2x2")]
    Grid2x2,
    #[serde(rename = "3x2")]
    Grid3x2,
    #[serde(rename = "3x3")]
    Grid3x3,
    #[serde(rename = "4x3")]
    Grid4x3,
    #[serde(rename = "4x4")]
    Grid4x4,
    #[serde(rename = "5x4")]
    Grid5x4,
    #[serde(rename = "5x5")]
    Grid5x5,
    #[serde(rename = "6x5")]
    Grid6x5,
    #[serde(rename = "6x6")]
    Grid6x6,
}

/// Lower bound of each shape, highest first
const THRESHOLDS: [(usize, GridShape); 11] = [
    (31, GridShape::Grid6x6),
    (26, GridShape::Grid6x5),
    (21, GridShape::Grid5x5),
    (17, GridShape::Grid5x4),
    (13, GridShape::Grid4x4),
    (10, GridShape::Grid4x3),
    (7, GridShape::Grid3x3),
    (5, GridShape::Grid3x2),
    (3, GridShape::Grid2x2),
    (2, GridShape::Grid2x1),
    (1, GridShape::Grid1x1),
];

impl GridShape {
    /// Classify a visible-tile count.
    ///
    /// Returns `None` for zero; callers keep whatever shape was in effect.
    #[must_use]
    pub fn classify(count: usize) -> Option<Self> {
        THRESHOLDS
            .iter()
            .find(|(min, _)| count >= *min)
            .map(|(_, shape)| *shape)
    }

    #[must_use]
    pub const fn columns(&self) -> usize {
        match self {
            Self::Grid1x1 => 1,
            Self::Grid2x1 | Self::Grid2x2 => 2,
            Self::Grid3x2 | Self::Grid3x3 => 3,
            Self::Grid4x3 | Self::Grid4x4 => 4,
            Self::Grid5x4 | Self::Grid5x5 => 5,
            Self::Grid6x5 | Self::Grid6x6 => 6,
        }
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        match self {
            Self::Grid1x1 | Self::Grid2x1 => 1,
            Self::Grid2x2 | Self::Grid3x2 => 2,
            Self::Grid3x3 | Self::Grid4x3 => 3,
            Self::Grid4x4 | Self::Grid5x4 => 4,
            Self::Grid5x5 | Self::Grid6x5 => 5,
            Self::Grid6x6 => 6,
        }
    }

    /// Number of tiles the shape can hold
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.columns() * self.rows()
    }

    /// Stylesheet class the view layer attaches to the stage container
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Grid1x1 => "grid1x1",
            Self::Grid2x1 => "grid2x1",
            Self::Grid2x2 => "grid2x2",
            Self::Grid3x2 => "grid3x2",
            Self::Grid3x3 => "grid3x3",
            Self::Grid4x3 => "grid4x3",
            Self::Grid4x4 => "grid4x4",
            Self::Grid5x4 => "grid5x4",
            Self::Grid5x5 => "grid5x5",
            Self::Grid6x5 => "grid6x5",
            Self::Grid6x6 => "grid6x6",
        }
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.columns(), self.rows())
    }
}

/// Tracks the shape in effect across recomputations.
///
/// An empty visible set leaves the previous shape untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridTracker {
    current: Option<GridShape>,
}

impl GridTracker {
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Re-classify for a new visible count and return the shape in effect
    pub fn update(&mut self, count: usize) -> Option<GridShape> {
        if let Some(shape) = GridShape::classify(count) {
            self.current = Some(shape);
        }
        self.current
    }

    #[must_use]
    pub const fn current(&self) -> Option<GridShape> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        let cases = [
            (1, GridShape::Grid1x1),
            (2, GridShape::Grid2x1),
            (3, GridShape::Grid2x2),
            (4, GridShape::Grid2x2),
            (5, GridShape::Grid3x2),
            (6, GridShape::Grid3x2),
            (7, GridShape::Grid3x3),
            (9, GridShape::Grid3x3),
            (10, GridShape::Grid4x3),
            (12, GridShape::Grid4x3),
            (13, GridShape::Grid4x4),
            (16, GridShape::Grid4x4),
            (17, GridShape::Grid5x4),
            (20, GridShape::Grid5x4),
            (21, GridShape::Grid5x5),
            (25, GridShape::Grid5x5),
            (26, GridShape::Grid6x5),
            (30, GridShape::Grid6x5),
            (31, GridShape::Grid6x6),
            (35, GridShape::Grid6x6),
            (36, GridShape::Grid6x6),
            (500, GridShape::Grid6x6),
        ];

        for (count, expected) in cases {
            assert_eq!(GridShape::classify(count), Some(expected), "count {count}");
        }
    }

    #[test]
    fn test_classify_zero_is_none() {
        assert_eq!(GridShape::classify(0), None);
    }

    #[test]
    fn test_every_shape_fits_its_range() {
        for count in 1..=MAX_TILES {
            let shape = GridShape::classify(count).unwrap();
            assert!(shape.capacity() >= count, "{shape} cannot hold {count}");
        }
    }

    #[test]
    fn test_display_and_css_class() {
        assert_eq!(GridShape::Grid6x5.to_string(), "6x5");
        assert_eq!(GridShape::Grid6x5.css_class(), "grid6x5");
        assert_eq!(GridShape::Grid2x1.rows(), 1);
        assert_eq!(GridShape::Grid2x1.columns(), 2);
        assert_eq!(
            serde_json::to_string(&GridShape::Grid4x3).unwrap(),
            "\"4x3\""
        );
    }

    #[test]
    fn test_tracker_retains_shape_on_zero() {
        let mut tracker = GridTracker::new();
        assert_eq!(tracker.update(0), None);

        assert_eq!(tracker.update(3), Some(GridShape::Grid2x2));
        assert_eq!(tracker.update(0), Some(GridShape::Grid2x2));
        assert_eq!(tracker.update(1), Some(GridShape::Grid1x1));
    }

    #[test]
    fn test_classify_ignores_history() {
        let mut tracker = GridTracker::new();
        tracker.update(36);
        tracker.update(0);
        assert_eq!(tracker.update(2), GridShape::classify(2));
    }
}
