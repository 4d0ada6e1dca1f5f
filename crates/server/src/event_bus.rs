//! Editor event bus.
//!
//! Every grid mutation, policy rejection and view change is published as an
//! [`EditorEvent`] on a shared `tokio::sync::broadcast` channel. Rejections
//! travel only here and in the log; callers just see an unchanged grid.
//! WebSocket clients subscribe to mirror selection and minimap state.

use std::sync::Arc;

use cityblock_engine::view::{Rotation, Section};
use cityblock_engine::{BlockId, CellPos};
use serde::Serialize;
use tokio::sync::broadcast;

/// Recommended capacity for the broadcast channel.
pub const BUS_CAPACITY: usize = 256;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EditorEvent {
    Placed {
        cell: CellPos,
        block: BlockId,
    },
    /// A placement left the grid unchanged.
    Rejected {
        cell: CellPos,
        block: BlockId,
        reason: String,
    },
    /// A removal and everything it cascaded to, bottom-up.
    ///
    /// `Arc<[...]>` so cloning per subscriber is a refcount bump.
    Removed {
        changes: Arc<[(CellPos, BlockId)]>,
    },
    Selected {
        block: BlockId,
        family: Option<&'static str>,
    },
    ViewChanged {
        rotation: Rotation,
        section: Section,
    },
    Reset {
        cleared: usize,
    },
    AssetFailed {
        block: BlockId,
        error: String,
    },
}

pub fn channel() -> broadcast::Sender<EditorEvent> {
    broadcast::channel(BUS_CAPACITY).0
}

/// Publish, ignoring the "no subscribers" case.
pub fn publish(bus: &broadcast::Sender<EditorEvent>, event: EditorEvent) {
    let _ = bus.send(event);
}
