//! Pointer -> cell resolution.
//!
//! Two passes, in priority order:
//!
//! 1. Top faces of existing blocks, front-most first (descending depth key).
//! 2. "Light beams": the vertical strip above each column, between layer 7
//!    and the column's current top. A pointer inside a beam addresses the
//!    empty layer it points at, provided that layer is above the stack (or
//!    is the ground, for an empty column).

use serde::Serialize;

use crate::grid::GridModel;
use crate::grid::position::{CellPos, ColumnPos, LAYER_COUNT};
use crate::projection::{DepthKey, LAYER_H, Projection, ScreenPoint, TILE_H, TILE_W, round_half_up};
use crate::view::Rotation;

/// Highest layer a placement beam reaches.
pub const BEAM_TOP_LAYER: i32 = 7;

/// What the pointer addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pick {
    /// The top face of an occupied cell.
    Block { cell: CellPos },
    /// An empty cell above a column's stack, inside its light beam.
    Placement { cell: CellPos },
}

impl Pick {
    pub fn cell(&self) -> CellPos {
        match self {
            Pick::Block { cell } | Pick::Placement { cell } => *cell,
        }
    }

    pub fn column(&self) -> ColumnPos {
        self.cell().column()
    }

    pub fn layer(&self) -> i32 {
        self.cell().z
    }
}

/// Resolve `point` against `grid` under `rotation`. `None` when the pointer
/// is off-canvas, non-finite, or addresses neither a top face nor a beam.
pub fn pick(
    point: ScreenPoint,
    grid: &GridModel,
    rotation: Rotation,
    projection: &Projection,
) -> Option<Pick> {
    if !projection.contains(point) {
        return None;
    }
    pick_block(point, grid, rotation, projection)
        .map(|cell| Pick::Block { cell })
        .or_else(|| pick_placement(point, grid, rotation, projection).map(|cell| Pick::Placement { cell }))
}

/// Whether `point` is inside the top-face diamond of the voxel at `pos`.
pub fn hits_top_face(point: ScreenPoint, pos: CellPos, rotation: Rotation, projection: &Projection) -> bool {
    let origin = projection.to_screen(pos, rotation);
    let dx = (point.x - origin.x).abs();
    let dy = (point.y - (origin.y - LAYER_H / 2.0)).abs();
    dx / TILE_W + dy / TILE_H <= 1.0
}

fn pick_block(
    point: ScreenPoint,
    grid: &GridModel,
    rotation: Rotation,
    projection: &Projection,
) -> Option<CellPos> {
    let mut cells: Vec<CellPos> = grid.occupied().map(|(pos, _)| pos).collect();
    cells.sort_by_key(|pos| std::cmp::Reverse(DepthKey::of(*pos, rotation)));
    cells
        .into_iter()
        .find(|pos| hits_top_face(point, *pos, rotation, projection))
}

fn pick_placement(
    point: ScreenPoint,
    grid: &GridModel,
    rotation: Rotation,
    projection: &Projection,
) -> Option<CellPos> {
    ColumnPos::all()
        .filter_map(|column| beam_layer(point, grid, column, rotation, projection).map(|z| column.cell(z)))
        .max_by_key(|cell| DepthKey::of(column_ground(*cell), rotation))
}

fn column_ground(cell: CellPos) -> CellPos {
    cell.column().cell(0)
}

/// The layer `point` selects inside `column`'s beam, if any.
pub fn beam_layer(
    point: ScreenPoint,
    grid: &GridModel,
    column: ColumnPos,
    rotation: Rotation,
    projection: &Projection,
) -> Option<i32> {
    let top = grid.column_top(column);
    let ground = projection.to_screen(column.cell(0), rotation);
    let stack_top = projection.to_screen(column.cell(top.unwrap_or(0)), rotation);
    let beam_top = projection.to_screen(column.cell(BEAM_TOP_LAYER), rotation);

    if (point.x - ground.x).abs() > TILE_W / 2.0 {
        return None;
    }
    if point.y < beam_top.y || point.y >= stack_top.y {
        return None;
    }

    let layer = round_half_up((ground.y - point.y) / LAYER_H) as i32;
    let layer = layer.clamp(0, LAYER_COUNT - 1);
    // Same support rule as placement: an empty column only takes the ground.
    let supported = match top {
        Some(top) => layer > top,
        None => layer == 0,
    };
    supported.then_some(layer)
}
