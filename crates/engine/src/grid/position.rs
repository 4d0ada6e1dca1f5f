use serde::{Deserialize, Serialize};

/// Columns on each side of the footprint center.
pub const GRID_HALF: i32 = 4;
/// Footprint edge length (9x9).
pub const GRID_SIZE: i32 = GRID_HALF * 2 + 1;
/// Number of stackable layers (z in 0..LAYER_COUNT).
pub const LAYER_COUNT: i32 = 10;
/// Total cell count of the bounded grid.
pub const CELL_COUNT: usize = (GRID_SIZE * GRID_SIZE * LAYER_COUNT) as usize;

/// A cell of the grid. x and y are centered on the footprint (-4..=4),
/// z counts layers up from the ground (0..=9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The column this cell belongs to.
    pub const fn column(&self) -> ColumnPos {
        ColumnPos { x: self.x, y: self.y }
    }

    pub const fn in_bounds(&self) -> bool {
        self.column().in_bounds() && self.z >= 0 && self.z < LAYER_COUNT
    }

    /// Flat index into a dense XYZ-ordered array, layers contiguous per column.
    /// `None` outside the grid.
    #[inline]
    pub const fn index(&self) -> Option<usize> {
        if !self.in_bounds() {
            return None;
        }
        let (gx, gy) = self.column().grid_index();
        Some(((gy * GRID_SIZE + gx) * LAYER_COUNT + self.z) as usize)
    }

    /// Inverse of [`CellPos::index`].
    pub const fn from_index(index: usize) -> Self {
        let index = index as i32;
        let z = index % LAYER_COUNT;
        let column = index / LAYER_COUNT;
        Self {
            x: column % GRID_SIZE - GRID_HALF,
            y: column / GRID_SIZE - GRID_HALF,
            z,
        }
    }
}

/// A vertical stack of cells sharing (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnPos {
    pub x: i32,
    pub y: i32,
}

impl ColumnPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn in_bounds(&self) -> bool {
        self.x >= -GRID_HALF && self.x <= GRID_HALF && self.y >= -GRID_HALF && self.y <= GRID_HALF
    }

    /// Zero-based footprint indices (0..=8 each axis).
    pub const fn grid_index(&self) -> (i32, i32) {
        (self.x + GRID_HALF, self.y + GRID_HALF)
    }

    pub const fn cell(&self, z: i32) -> CellPos {
        CellPos::new(self.x, self.y, z)
    }

    /// All 81 columns, row by row (y outer, x inner).
    pub fn all() -> impl Iterator<Item = ColumnPos> {
        (-GRID_HALF..=GRID_HALF)
            .flat_map(|y| (-GRID_HALF..=GRID_HALF).map(move |x| ColumnPos::new(x, y)))
    }
}
