//! Core of the isometric city-block editor.
//!
//! The [`grid::GridModel`] is the single source of truth. Everything else
//! takes it as an explicit input: [`picking`] resolves pointer positions,
//! [`scene`] builds the depth-sorted draw list, [`render`] turns that list
//! into 2D primitives and [`export`] flattens the grid into a document.

pub mod catalog;
pub mod error;
pub mod export;
pub mod grid;
pub mod picking;
pub mod projection;
pub mod render;
pub mod scene;
pub mod view;

pub use error::{EngineError, Result};
pub use grid::block::BlockId;
pub use grid::position::{CellPos, ColumnPos};
pub use grid::{GridModel, PlaceOutcome, Rejection};
