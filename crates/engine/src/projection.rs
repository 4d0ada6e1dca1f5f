//! Grid <-> screen isometric transform and draw-order keys.
//!
//! Forward: rotate (x, y) by the view rotation, then
//! `sx = (rx - ry) * TILE_W`, `sy = (rx + ry) * TILE_H - z * LAYER_H`,
//! offset by the canvas center. The inverse only recovers (x, y) at z = 0;
//! picking resolves layers separately.

use serde::Serialize;

use crate::grid::position::{CellPos, ColumnPos};
use crate::view::Rotation;

/// Half-width of a tile diamond in pixels.
pub const TILE_W: f64 = 16.0;
/// Half-height of a tile diamond in pixels.
pub const TILE_H: f64 = 8.0;
/// Vertical pixels per layer.
pub const LAYER_H: f64 = 20.0;

pub const DEFAULT_CANVAS_WIDTH: u32 = 480;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 470;

/// Multiplier separating (x + y) diagonals in a depth key. Must exceed the
/// layer range so z never reorders across diagonals.
const DIAGONAL_STRIDE: i32 = 1000;

/// A point in canvas pixels, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Draw-order key. Lower keys are further back and drawn first.
///
/// `key` is `(rx + ry) * 1000 + z` on rotated coordinates; `raised` entries
/// (highlights) sort just after their cell's block but before anything at
/// the next key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DepthKey {
    pub key: i32,
    pub raised: bool,
}

impl DepthKey {
    pub fn of(pos: CellPos, rotation: Rotation) -> Self {
        let (rx, ry) = rotation.apply(pos.x, pos.y);
        Self {
            key: (rx + ry) * DIAGONAL_STRIDE + pos.z,
            raised: false,
        }
    }

    /// Same slot, marginally in front.
    pub const fn raised(self) -> Self {
        Self { key: self.key, raised: true }
    }
}

/// Canvas-anchored isometric projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    width: f64,
    height: f64,
    origin: ScreenPoint,
}

impl Projection {
    /// Projection for a `width` x `height` canvas with the grid center at the
    /// canvas center.
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (f64::from(width), f64::from(height));
        Self {
            width,
            height,
            origin: ScreenPoint::new(width / 2.0, height / 2.0),
        }
    }

    /// Whether `point` lies on the canvas.
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.is_finite()
            && point.x >= 0.0
            && point.y >= 0.0
            && point.x <= self.width
            && point.y <= self.height
    }

    /// Screen position of the cell origin (bottom-center of its voxel).
    pub fn project(&self, x: i32, y: i32, z: i32, rotation: Rotation) -> ScreenPoint {
        let (rx, ry) = rotation.apply(x, y);
        let (rx, ry, z) = (f64::from(rx), f64::from(ry), f64::from(z));
        ScreenPoint::new(
            (rx - ry) * TILE_W + self.origin.x,
            (rx + ry) * TILE_H - z * LAYER_H + self.origin.y,
        )
    }

    pub fn to_screen(&self, pos: CellPos, rotation: Rotation) -> ScreenPoint {
        self.project(pos.x, pos.y, pos.z, rotation)
    }

    /// Inverse transform at z = 0, rounded to the nearest cell. No bounds
    /// check; `None` only for non-finite input.
    pub fn to_grid(&self, point: ScreenPoint, rotation: Rotation) -> Option<(i32, i32)> {
        if !point.is_finite() {
            return None;
        }
        let sx = point.x - self.origin.x;
        let sy = point.y - self.origin.y;
        let rx = (sx / TILE_W + sy / TILE_H) / 2.0;
        let ry = (sy / TILE_H - sx / TILE_W) / 2.0;
        let (gx, gy) = rotation.invert(rx, ry);
        Some((round_half_up(gx) as i32, round_half_up(gy) as i32))
    }

    /// Ground column under `point`, if it is inside the footprint.
    pub fn column_at(&self, point: ScreenPoint, rotation: Rotation) -> Option<ColumnPos> {
        self.to_grid(point, rotation)
            .map(|(x, y)| ColumnPos::new(x, y))
            .filter(ColumnPos::in_bounds)
    }

    /// Diamond around `center`: top, right, bottom, left.
    pub fn tile_diamond(&self, center: ScreenPoint) -> [ScreenPoint; 4] {
        [
            center.offset(0.0, -TILE_H),
            center.offset(TILE_W, 0.0),
            center.offset(0.0, TILE_H),
            center.offset(-TILE_W, 0.0),
        ]
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

/// Round half toward positive infinity, the way canvas hosts round pixels.
pub(crate) fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}
