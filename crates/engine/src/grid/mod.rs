pub mod block;
pub mod position;

use block::BlockId;
use position::{CELL_COUNT, CellPos, ColumnPos, LAYER_COUNT};

/// Why a placement left the grid unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The target cell already holds a block.
    Occupied(BlockId),
    /// z > 0 and no layer below it in the column is occupied.
    Unsupported,
    OutOfBounds,
    /// `BlockId::EMPTY` cannot be placed.
    EmptyBlock,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Occupied(id) => write!(f, "cell already holds block {id}"),
            Rejection::Unsupported => f.write_str("no support below"),
            Rejection::OutOfBounds => f.write_str("outside the grid"),
            Rejection::EmptyBlock => f.write_str("empty block id"),
        }
    }
}

/// Result of [`GridModel::place`]. A rejection is a policy decision, not an
/// error: the grid is simply unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceOutcome {
    Placed,
    Rejected(Rejection),
}

impl PlaceOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, PlaceOutcome::Placed)
    }
}

/// The 9x9x10 block grid.
///
/// Stored as a flat array with each column's layers contiguous, so column
/// scans (support checks, cascading removal, top-of-stack) walk adjacent
/// slots. `BlockId::EMPTY` marks an empty cell.
#[derive(Clone)]
pub struct GridModel {
    cells: Box<[BlockId; CELL_COUNT]>,
    occupied: usize,
}

impl GridModel {
    pub fn new() -> Self {
        Self {
            cells: Box::new([BlockId::EMPTY; CELL_COUNT]),
            occupied: 0,
        }
    }

    /// Block at `pos`, or `None` if empty or outside the grid.
    pub fn get(&self, pos: CellPos) -> Option<BlockId> {
        pos.index()
            .map(|i| self.cells[i])
            .filter(|id| !id.is_empty())
    }

    pub fn is_occupied(&self, pos: CellPos) -> bool {
        self.get(pos).is_some()
    }

    /// Place `block` at `pos`.
    ///
    /// A block rests on the ground unconditionally, or on any occupied layer
    /// below it in the same column (not necessarily the adjacent one).
    pub fn place(&mut self, pos: CellPos, block: BlockId) -> PlaceOutcome {
        let outcome = self.check_placement(pos, block);
        match outcome {
            PlaceOutcome::Placed => {
                if let Some(i) = pos.index() {
                    self.cells[i] = block;
                    self.occupied += 1;
                }
                tracing::debug!("Placed block {} at ({},{},{})", block, pos.x, pos.y, pos.z);
            }
            PlaceOutcome::Rejected(reason) => {
                tracing::debug!(
                    "Rejected block {} at ({},{},{}): {}",
                    block, pos.x, pos.y, pos.z, reason
                );
            }
        }
        outcome
    }

    fn check_placement(&self, pos: CellPos, block: BlockId) -> PlaceOutcome {
        if block.is_empty() {
            return PlaceOutcome::Rejected(Rejection::EmptyBlock);
        }
        if !pos.in_bounds() {
            return PlaceOutcome::Rejected(Rejection::OutOfBounds);
        }
        if let Some(existing) = self.get(pos) {
            return PlaceOutcome::Rejected(Rejection::Occupied(existing));
        }
        if pos.z > 0 && !self.has_support(pos) {
            return PlaceOutcome::Rejected(Rejection::Unsupported);
        }
        PlaceOutcome::Placed
    }

    /// Any occupied layer in `0..pos.z` of the same column.
    pub fn has_support(&self, pos: CellPos) -> bool {
        let column = pos.column();
        (0..pos.z).any(|z| self.is_occupied(column.cell(z)))
    }

    /// Remove the block at `pos` and everything stacked above it.
    ///
    /// Returns the cleared cells bottom-up with their former blocks; empty if
    /// `pos` held nothing.
    pub fn remove(&mut self, pos: CellPos) -> Vec<(CellPos, BlockId)> {
        if !self.is_occupied(pos) {
            return Vec::new();
        }
        let column = pos.column();
        let mut cleared = Vec::new();
        for z in pos.z..LAYER_COUNT {
            let cell = column.cell(z);
            if let Some(i) = cell.index() {
                let old = std::mem::replace(&mut self.cells[i], BlockId::EMPTY);
                if !old.is_empty() {
                    cleared.push((cell, old));
                }
            }
        }
        self.occupied -= cleared.len();
        tracing::debug!(
            "Removed {} block(s) from ({},{}) at layer {} and above",
            cleared.len(), pos.x, pos.y, pos.z
        );
        cleared
    }

    /// Highest occupied layer of a column, `None` if the column is empty.
    pub fn column_top(&self, column: ColumnPos) -> Option<i32> {
        (0..LAYER_COUNT).rev().find(|&z| self.is_occupied(column.cell(z)))
    }

    /// Occupied layers of a column, bottom-up.
    pub fn column_blocks(&self, column: ColumnPos) -> impl Iterator<Item = (i32, BlockId)> + '_ {
        (0..LAYER_COUNT).filter_map(move |z| self.get(column.cell(z)).map(|id| (z, id)))
    }

    /// Every occupied cell, in storage order.
    pub fn occupied(&self) -> impl Iterator<Item = (CellPos, BlockId)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, id)| !id.is_empty())
            .map(|(i, id)| (CellPos::from_index(i), *id))
    }

    pub fn block_count(&self) -> usize {
        self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Empty the grid ("restore").
    pub fn clear(&mut self) {
        self.cells.fill(BlockId::EMPTY);
        self.occupied = 0;
    }
}

impl Default for GridModel {
    fn default() -> Self {
        Self::new()
    }
}
