//! Block families and per-block metadata.
//!
//! Six fixed families partition ids `1..=387` without gaps. Every id maps to
//! a display name and the color of its family, which doubles as the flat
//! placeholder color when a block's visual is unavailable.

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::grid::block::BlockId;

/// Highest id in the catalog.
pub const MAX_BLOCK_ID: u16 = 387;

/// Blocks whose visuals are fetched as soon as the editor opens.
pub const COMMON_BLOCKS: [BlockId; 7] = [
    BlockId(1),
    BlockId(2),
    BlockId(3),
    BlockId(40),
    BlockId(41),
    BlockId(65),
    BlockId(100),
];

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale each channel by `factor` (0..=1), for shaded cube faces.
    pub fn shade(self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (f32::from(c) * f).round() as u8;
        Self::rgb(scale(self.r), scale(self.g), scale(self.b))
    }

    /// `#RRGGBB`
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Color reported for ids outside the catalog.
pub const UNKNOWN_COLOR: Color = Color::rgb(0x80, 0x80, 0x80);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockFamily {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: BlockId,
    pub color: Color,
    #[serde(skip)]
    pub range: RangeInclusive<u16>,
}

impl BlockFamily {
    pub fn contains(&self, id: BlockId) -> bool {
        self.range.contains(&id.0)
    }

    /// Member ids in ascending order.
    pub fn blocks(&self) -> impl Iterator<Item = BlockId> {
        self.range.clone().map(BlockId)
    }

    pub fn first(&self) -> BlockId {
        BlockId(*self.range.start())
    }

    pub fn last(&self) -> BlockId {
        BlockId(*self.range.end())
    }
}

pub static FAMILIES: [BlockFamily; 6] = [
    BlockFamily {
        id: "ground",
        name: "Ground",
        icon: BlockId(1),
        color: Color::rgb(0x7C, 0xFC, 0x00),
        range: 1..=39,
    },
    BlockFamily {
        id: "roads",
        name: "Roads",
        icon: BlockId(40),
        color: Color::rgb(0x40, 0x40, 0x40),
        range: 40..=64,
    },
    BlockFamily {
        id: "buildings",
        name: "Buildings",
        icon: BlockId(65),
        color: Color::rgb(0xBE, 0xBE, 0xBE),
        range: 65..=149,
    },
    BlockFamily {
        id: "nature",
        name: "Nature",
        icon: BlockId(150),
        color: Color::rgb(0x22, 0x8B, 0x22),
        range: 150..=199,
    },
    BlockFamily {
        id: "decorations",
        name: "Decorations",
        icon: BlockId(200),
        color: Color::rgb(0xFF, 0xD7, 0x00),
        range: 200..=299,
    },
    BlockFamily {
        id: "special",
        name: "Special",
        icon: BlockId(300),
        color: Color::rgb(0x93, 0x70, 0xDB),
        range: 300..=387,
    },
];

/// Metadata for one block id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockInfo {
    pub id: BlockId,
    pub name: String,
    pub family: Option<&'static str>,
    pub color: Color,
}

/// The family an id belongs to.
pub fn family_of(id: BlockId) -> Option<&'static BlockFamily> {
    FAMILIES.iter().find(|f| f.contains(id))
}

pub fn family(family_id: &str) -> Result<&'static BlockFamily> {
    FAMILIES
        .iter()
        .find(|f| f.id == family_id)
        .ok_or_else(|| EngineError::UnknownFamily(family_id.to_string()))
}

/// Ids belonging to `family_id`, ascending.
pub fn blocks_in_family(family_id: &str) -> Result<Vec<BlockId>> {
    Ok(family(family_id)?.blocks().collect())
}

/// Metadata for `id`; ids outside the catalog get an "Unknown" gray entry.
pub fn info(id: BlockId) -> BlockInfo {
    match family_of(id) {
        Some(family) => BlockInfo {
            id,
            name: format!("Block {}", id.0),
            family: Some(family.id),
            color: family.color,
        },
        None => BlockInfo {
            id,
            name: "Unknown".to_string(),
            family: None,
            color: UNKNOWN_COLOR,
        },
    }
}

/// Flat placeholder color for `id`.
pub fn color_of(id: BlockId) -> Color {
    family_of(id).map_or(UNKNOWN_COLOR, |f| f.color)
}

/// Reject ids that are not in the catalog.
pub fn validate(id: BlockId) -> Result<BlockId> {
    if family_of(id).is_some() {
        Ok(id)
    } else {
        Err(EngineError::UnknownBlock(id.0))
    }
}
