//! Turns a sorted [`Frame`] into canvas-ready 2D primitives.
//!
//! Block visuals are images when the host has them loaded; otherwise a
//! three-face cube in the block's family color stands in.

use serde::Serialize;

use crate::catalog::{self, Color};
use crate::grid::block::BlockId;
use crate::projection::{LAYER_H, Projection, ScreenPoint, TILE_H, TILE_W};
use crate::scene::{DrawCall, DrawKind, Frame};

/// Block image size and the anchor that sits on the projected cell origin.
pub const BLOCK_IMAGE_WIDTH: f64 = 48.0;
pub const BLOCK_IMAGE_HEIGHT: f64 = 119.0;
pub const BLOCK_IMAGE_ANCHOR_X: f64 = 23.35;
pub const BLOCK_IMAGE_ANCHOR_Y: f64 = 108.0;

pub const PREVIEW_ALPHA: f32 = 0.6;
const GUIDE_BASE_ALPHA: f32 = 0.4;
const GUIDE_BASE_COLOR: Color = Color::rgb(100, 100, 100);
const BEAM_HALF_WIDTH: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_color(color: Color, a: f32) -> Self {
        Self::new(color.r, color.g, color.b, a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Polygon {
        points: Vec<ScreenPoint>,
        fill: Option<Rgba>,
        stroke: Option<Stroke>,
    },
    Image {
        href: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        alpha: f32,
    },
    /// Polygon filled with a linear gradient running `from` -> `to`.
    Gradient {
        points: Vec<ScreenPoint>,
        from: ScreenPoint,
        to: ScreenPoint,
        stops: Vec<GradientStop>,
    },
}

/// Rasterize `frame` in order. `visual` returns an image href for blocks
/// whose asset is loaded, `None` to fall back to the placeholder cube.
pub fn rasterize<F>(frame: &Frame, projection: &Projection, visual: F) -> Vec<Primitive>
where
    F: Fn(BlockId) -> Option<String>,
{
    let mut out = Vec::with_capacity(frame.calls.len() * 2);
    for call in &frame.calls {
        emit(call, projection, &visual, &mut out);
    }
    out
}

fn emit<F>(call: &DrawCall, projection: &Projection, visual: &F, out: &mut Vec<Primitive>)
where
    F: Fn(BlockId) -> Option<String>,
{
    let at = call.at;
    match call.kind {
        DrawKind::Tile => out.push(Primitive::Polygon {
            points: projection.tile_diamond(at).to_vec(),
            fill: Some(Rgba::new(50, 50, 50, 0.1)),
            stroke: Some(Stroke { color: Rgba::new(255, 255, 255, 0.1), width: 1.0 }),
        }),
        DrawKind::Block { block } => block_visual(block, at, 1.0, visual, out),
        DrawKind::Preview { block } => block_visual(block, at, PREVIEW_ALPHA, visual, out),
        DrawKind::GuideBase => out.extend(cube(at, GUIDE_BASE_COLOR, GUIDE_BASE_ALPHA)),
        DrawKind::Highlight => out.push(Primitive::Polygon {
            points: projection.tile_diamond(at).to_vec(),
            fill: Some(Rgba::new(255, 255, 0, 0.5)),
            stroke: Some(Stroke { color: Rgba::new(255, 255, 0, 1.0), width: 3.0 }),
        }),
        DrawKind::HoverOutline => out.push(Primitive::Polygon {
            points: projection.tile_diamond(at).to_vec(),
            fill: None,
            stroke: Some(Stroke { color: Rgba::new(255, 255, 255, 0.8), width: 2.0 }),
        }),
        DrawKind::LightBeam { top } => out.push(Primitive::Gradient {
            points: vec![
                at.offset(-BEAM_HALF_WIDTH, 0.0),
                top.offset(-BEAM_HALF_WIDTH, 0.0),
                top.offset(BEAM_HALF_WIDTH, 0.0),
                at.offset(BEAM_HALF_WIDTH, 0.0),
            ],
            from: at,
            to: top,
            stops: vec![
                GradientStop { offset: 0.0, color: Rgba::new(255, 255, 100, 0.9) },
                GradientStop { offset: 0.3, color: Rgba::new(255, 255, 150, 0.7) },
                GradientStop { offset: 1.0, color: Rgba::new(255, 255, 200, 0.3) },
            ],
        }),
    }
}

fn block_visual<F>(block: BlockId, at: ScreenPoint, alpha: f32, visual: &F, out: &mut Vec<Primitive>)
where
    F: Fn(BlockId) -> Option<String>,
{
    match visual(block) {
        Some(href) => out.push(Primitive::Image {
            href,
            x: at.x - BLOCK_IMAGE_ANCHOR_X,
            y: at.y - BLOCK_IMAGE_ANCHOR_Y,
            width: BLOCK_IMAGE_WIDTH,
            height: BLOCK_IMAGE_HEIGHT,
            alpha,
        }),
        None => out.extend(cube(at, catalog::color_of(block), alpha)),
    }
}

/// Placeholder voxel: left face, right face, top diamond.
pub fn cube(at: ScreenPoint, color: Color, alpha: f32) -> [Primitive; 3] {
    let top = at.offset(0.0, -LAYER_H);
    let face = |points: Vec<ScreenPoint>, shade: f32| Primitive::Polygon {
        points,
        fill: Some(Rgba::from_color(color.shade(shade), alpha)),
        stroke: None,
    };
    [
        face(vec![at, at.offset(-TILE_W, 0.0), top.offset(-TILE_W, 0.0), top], 0.8),
        face(vec![at, at.offset(TILE_W, 0.0), top.offset(TILE_W, 0.0), top], 0.6),
        face(
            vec![
                top.offset(0.0, -TILE_H),
                top.offset(TILE_W, 0.0),
                top.offset(0.0, TILE_H),
                top.offset(-TILE_W, 0.0),
            ],
            1.0,
        ),
    ]
}
