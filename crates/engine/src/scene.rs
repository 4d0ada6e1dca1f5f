//! Per-frame draw list.
//!
//! Occlusion in the oblique projection comes from draw order alone: every
//! entry gets a [`DepthKey`] and the list is sorted once, ascending, within
//! three fixed layers (terrain, content, overlay). Content covers placed
//! blocks and the hover guide elements so a highlight can slot between the
//! blocks around it.

use serde::Serialize;

use crate::grid::GridModel;
use crate::grid::block::BlockId;
use crate::grid::position::{CellPos, ColumnPos};
use crate::picking::{BEAM_TOP_LAYER, Pick};
use crate::projection::{DepthKey, Projection, ScreenPoint};
use crate::view::{Rotation, Section};

/// Coarse draw layer. Sorted before depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Ground lattice.
    Terrain,
    /// Blocks and depth-sorted guides.
    Content,
    /// Hover outline and light beam, always on top.
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawKind {
    Tile,
    Block { block: BlockId },
    /// Marker cube at the hovered column's ground cell.
    GuideBase,
    /// Translucent block at the candidate layer.
    Preview { block: BlockId },
    /// Placement diamond at the candidate layer.
    Highlight,
    HoverOutline,
    /// Vertical guide from the ground up to `top` (screen space).
    LightBeam { top: ScreenPoint },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawCall {
    pub layer: Layer,
    pub kind: DrawKind,
    pub cell: CellPos,
    /// Projected cell origin.
    pub at: ScreenPoint,
    pub depth: DepthKey,
}

/// View state the compositor needs beyond the grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SceneParams {
    pub rotation: Rotation,
    pub section: Section,
    pub hover: Option<Pick>,
    /// Block to ghost at the hovered cell while placing.
    pub preview: Option<BlockId>,
}

/// An ordered draw list. Emit `calls` front to back as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub rotation: Rotation,
    pub calls: Vec<DrawCall>,
}

impl Frame {
    /// Placed blocks that survived culling, in draw order.
    pub fn blocks(&self) -> impl Iterator<Item = (CellPos, BlockId)> + '_ {
        self.calls.iter().filter_map(|call| match call.kind {
            DrawKind::Block { block } => Some((call.cell, block)),
            _ => None,
        })
    }
}

/// Build the sorted draw list for one frame.
pub fn compose(grid: &GridModel, projection: &Projection, params: &SceneParams) -> Frame {
    let rotation = params.rotation;
    let call = |layer, kind, cell: CellPos, depth| DrawCall {
        layer,
        kind,
        cell,
        at: projection.to_screen(cell, rotation),
        depth,
    };

    let mut calls = Vec::with_capacity(81 + grid.block_count() + 6);

    for column in ColumnPos::all() {
        let cell = column.cell(0);
        calls.push(call(Layer::Terrain, DrawKind::Tile, cell, DepthKey::of(cell, rotation)));
    }

    for (cell, block) in grid.occupied() {
        if !params.section.shows(cell.column()) {
            continue;
        }
        calls.push(call(Layer::Content, DrawKind::Block { block }, cell, DepthKey::of(cell, rotation)));
    }

    if let Some(hover) = params.hover.filter(|h| params.section.shows(h.column())) {
        let target = hover.cell();
        let ground = hover.column().cell(0);
        calls.push(call(Layer::Content, DrawKind::GuideBase, ground, DepthKey::of(ground, rotation)));

        let occupied = grid.is_occupied(target);
        let depth = DepthKey::of(target, rotation);
        match params.preview {
            Some(block) if !occupied => {
                calls.push(call(Layer::Content, DrawKind::Preview { block }, target, depth));
                calls.push(call(Layer::Content, DrawKind::Highlight, target, depth.raised()));
            }
            None if !occupied => {
                calls.push(call(Layer::Content, DrawKind::Highlight, target, depth.raised()));
            }
            _ => {}
        }

        let beam_top = projection.to_screen(hover.column().cell(BEAM_TOP_LAYER), rotation);
        let overlay_depth = DepthKey::of(ground, rotation);
        calls.push(call(Layer::Overlay, DrawKind::HoverOutline, ground, overlay_depth));
        calls.push(call(Layer::Overlay, DrawKind::LightBeam { top: beam_top }, ground, overlay_depth));
    }

    calls.sort_by_key(|c| (c.layer, c.depth));
    Frame { rotation, calls }
}
