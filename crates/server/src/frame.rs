//! Serializable frame snapshots handed to the host UI.

use cityblock_engine::grid::GridModel;
use cityblock_engine::grid::position::{ColumnPos, GRID_HALF};
use cityblock_engine::picking::Pick;
use cityblock_engine::render::Primitive;
use cityblock_engine::view::{Rotation, Section};
use serde::Serialize;

/// Occupancy overview: one row per y (ascending), one flag per x.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Default)]
pub struct Minimap {
    pub rows: Vec<Vec<bool>>,
    pub current: Option<ColumnPos>,
}

impl Minimap {
    pub fn of(grid: &GridModel, hover: Option<Pick>) -> Self {
        let rows = (-GRID_HALF..=GRID_HALF)
            .map(|y| {
                (-GRID_HALF..=GRID_HALF)
                    .map(|x| grid.column_top(ColumnPos::new(x, y)).is_some())
                    .collect()
            })
            .collect();
        Self {
            rows,
            current: hover.map(|h| h.column()),
        }
    }

    pub fn is_filled(&self, column: ColumnPos) -> bool {
        let (gx, gy) = column.grid_index();
        self.rows
            .get(gy as usize)
            .and_then(|row| row.get(gx as usize))
            .copied()
            .unwrap_or(false)
    }
}

/// Everything the host needs to paint one frame.
#[derive(Clone, Debug, Serialize)]
pub struct FrameSnapshot {
    /// Increments on every rebuilt frame.
    pub sequence: u64,
    pub rotation: Rotation,
    pub section: Section,
    pub hover: Option<Pick>,
    pub blocks: usize,
    pub primitives: Vec<Primitive>,
    pub minimap: Minimap,
}
