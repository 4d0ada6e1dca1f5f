use serde::{Deserialize, Serialize};

/// Catalog block identifier. The grid stores these without interpreting them;
/// `catalog` maps them to family and color.
///
/// `BlockId::EMPTY` (0) marks an unoccupied cell and is never placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u16);

impl BlockId {
    /// The "nothing here" value.
    pub const EMPTY: BlockId = BlockId(0);

    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
