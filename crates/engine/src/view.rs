//! View parameters: quarter-turn rotation and section-plane culling.
//!
//! Neither mutates the grid. Rotation changes where cells project; the
//! section filter only decides which columns are drawn.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::grid::position::ColumnPos;

/// Camera rotation about the vertical axis, in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::Deg0, Rotation::Deg90, Rotation::Deg180, Rotation::Deg270];

    /// Accepts any multiple of 90, normalized into 0..360.
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        match degrees.rem_euclid(360) {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            _ => Err(EngineError::InvalidRotation(degrees)),
        }
    }

    pub const fn degrees(self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// `(self + delta + 360) mod 360`; `delta` must be a multiple of 90.
    pub fn rotated_by(self, delta: i32) -> Result<Self> {
        if delta % 90 != 0 {
            return Err(EngineError::InvalidRotation(delta));
        }
        Self::from_degrees(self.degrees() + delta.rem_euclid(360))
    }

    /// Next quarter turn clockwise.
    pub fn next(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    /// Rotate grid coordinates into view space.
    #[inline]
    pub const fn apply(self, x: i32, y: i32) -> (i32, i32) {
        match self {
            Rotation::Deg0 => (x, y),
            Rotation::Deg90 => (-y, x),
            Rotation::Deg180 => (-x, -y),
            Rotation::Deg270 => (y, -x),
        }
    }

    /// Undo [`Rotation::apply`] on continuous view-space coordinates.
    #[inline]
    pub fn invert(self, rx: f64, ry: f64) -> (f64, f64) {
        match self {
            Rotation::Deg0 => (rx, ry),
            Rotation::Deg90 => (ry, -rx),
            Rotation::Deg180 => (-rx, -ry),
            Rotation::Deg270 => (-ry, rx),
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = EngineError;

    fn try_from(degrees: i32) -> Result<Self> {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> i32 {
        rotation.degrees()
    }
}

/// Orientation of the cut plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionMode {
    /// Cuts along x + y.
    #[default]
    Diagonal,
    /// Cuts along x.
    Horizontal,
    /// Cuts along y.
    Vertical,
}

/// Cut-plane index at full visibility.
pub const MAX_CUT_PLANE: f64 = 17.0;

/// Section-plane view filter: a mode plus a visibility fraction in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Section {
    pub mode: SectionMode,
    visibility: f64,
    cut: f64,
}

impl Section {
    pub fn new(mode: SectionMode, visibility: f64) -> Result<Self> {
        let mut section = Self::full(mode);
        section.set_visibility(visibility)?;
        Ok(section)
    }

    /// Build from a cut-plane index directly (clamped into [0, 17]).
    pub fn with_cut_plane(mode: SectionMode, cut: f64) -> Result<Self> {
        if !cut.is_finite() {
            return Err(EngineError::InvalidVisibility(cut));
        }
        let cut = cut.clamp(0.0, MAX_CUT_PLANE);
        Ok(Self { mode, visibility: cut / MAX_CUT_PLANE, cut })
    }

    /// Everything visible.
    pub const fn full(mode: SectionMode) -> Self {
        Self { mode, visibility: 1.0, cut: MAX_CUT_PLANE }
    }

    pub fn visibility(&self) -> f64 {
        self.visibility
    }

    /// Clamped into [0, 1]; NaN and infinities are rejected.
    pub fn set_visibility(&mut self, visibility: f64) -> Result<()> {
        if !visibility.is_finite() {
            return Err(EngineError::InvalidVisibility(visibility));
        }
        self.visibility = visibility.clamp(0.0, 1.0);
        self.cut = self.visibility * MAX_CUT_PLANE;
        Ok(())
    }

    /// The cut-plane index `v` in [0, 17].
    pub fn cut_plane(&self) -> f64 {
        self.cut
    }

    /// Whether cells of `column` are drawn.
    pub fn shows(&self, column: ColumnPos) -> bool {
        let (gx, gy) = column.grid_index();
        let v = self.cut_plane();
        match self.mode {
            SectionMode::Diagonal => f64::from(gx + gy) < v,
            SectionMode::Horizontal => f64::from(gx) < v / 2.0,
            SectionMode::Vertical => f64::from(gy) < v / 2.0,
        }
    }
}

impl Default for Section {
    fn default() -> Self {
        Self::full(SectionMode::Diagonal)
    }
}
