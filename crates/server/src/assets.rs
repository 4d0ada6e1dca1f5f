//! Memoized, coalescing block-visual cache.
//!
//! Each block id moves through a small state machine:
//!
//! ```text
//! Unrequested --request--> Loading --ok--> Loaded
//!                             |
//!                             +--err--> Failed --request--> Loading
//! ```
//!
//! Concurrent requests for an id that is already `Loading` share the one
//! in-flight fetch. A failure is logged and remembered; the next request
//! (typically the next placement of that block) starts a fresh fetch.
//! Nothing here blocks the editor task: `preload` spawns and returns.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

use anyhow::{Context, Result, anyhow};
use cityblock_engine::BlockId;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{broadcast, watch};

use crate::event_bus::{self, EditorEvent};

/// A fetched block visual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockAsset {
    pub block: BlockId,
    /// URL the host uses to draw it.
    pub href: String,
    pub size: usize,
}

/// Public view of a cache slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetState {
    Unrequested,
    Loading,
    Loaded(Arc<BlockAsset>),
    Failed(String),
}

pub type FetchFuture = Pin<Box<dyn Future<Output = Result<BlockAsset>> + Send>>;

/// Where block visuals come from.
pub trait AssetSource: Send + Sync + 'static {
    fn fetch(&self, block: BlockId) -> FetchFuture;
}

/// Reads `{dir}/{block}.svg` and serves it under `{url_prefix}/{block}.svg`.
pub struct FsAssetSource {
    dir: PathBuf,
    url_prefix: String,
}

impl FsAssetSource {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn path_for(&self, block: BlockId) -> PathBuf {
        self.dir.join(format!("{block}.svg"))
    }
}

impl AssetSource for FsAssetSource {
    fn fetch(&self, block: BlockId) -> FetchFuture {
        let path = self.path_for(block);
        let href = format!("{}/{block}.svg", self.url_prefix);
        Box::pin(async move {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(BlockAsset { block, href, size: bytes.len() })
        })
    }
}

type Outcome = std::result::Result<Arc<BlockAsset>, String>;

enum Slot {
    Loading(watch::Receiver<Option<Outcome>>),
    Loaded(Arc<BlockAsset>),
    Failed(String),
}

pub struct AssetCache {
    slots: DashMap<BlockId, Slot>,
    source: Box<dyn AssetSource>,
    events: Option<broadcast::Sender<EditorEvent>>,
    /// Bumped whenever a fetch settles, so frames can be redrawn.
    revision: AtomicU64,
}

impl AssetCache {
    pub fn new(source: impl AssetSource) -> Arc<Self> {
        Arc::new(Self {
            slots: DashMap::new(),
            source: Box::new(source),
            events: None,
            revision: AtomicU64::new(0),
        })
    }

    /// Like [`AssetCache::new`], also publishing load failures on `events`.
    pub fn with_events(source: impl AssetSource, events: broadcast::Sender<EditorEvent>) -> Arc<Self> {
        Arc::new(Self {
            slots: DashMap::new(),
            source: Box::new(source),
            events: Some(events),
            revision: AtomicU64::new(0),
        })
    }

    pub fn state(&self, block: BlockId) -> AssetState {
        match self.slots.get(&block).as_deref() {
            None => AssetState::Unrequested,
            Some(Slot::Loading(_)) => AssetState::Loading,
            Some(Slot::Loaded(asset)) => AssetState::Loaded(Arc::clone(asset)),
            Some(Slot::Failed(err)) => AssetState::Failed(err.clone()),
        }
    }

    /// Image URL for a loaded block.
    pub fn href(&self, block: BlockId) -> Option<String> {
        match self.slots.get(&block).as_deref() {
            Some(Slot::Loaded(asset)) => Some(asset.href.clone()),
            _ => None,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Relaxed)
    }

    /// Fire-and-forget: start a fetch unless one is loaded or in flight.
    pub fn preload(self: &Arc<Self>, block: BlockId) {
        let _ = self.request(block);
    }

    /// Wait for `block`'s visual, joining any in-flight fetch.
    pub async fn load(self: &Arc<Self>, block: BlockId) -> Result<Arc<BlockAsset>> {
        let mut rx = match self.request(block) {
            Ok(asset) => return Ok(asset),
            Err(rx) => rx,
        };
        let settled = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| anyhow!("fetch for block {block} was abandoned"))?;
        match settled.as_ref() {
            Some(Ok(asset)) => Ok(Arc::clone(asset)),
            Some(Err(err)) => Err(anyhow!("block {block}: {err}")),
            None => Err(anyhow!("fetch for block {block} settled without a result")),
        }
    }

    /// `Ok` when already loaded, otherwise a receiver for the pending fetch.
    fn request(self: &Arc<Self>, block: BlockId) -> std::result::Result<Arc<BlockAsset>, watch::Receiver<Option<Outcome>>> {
        let tx = match self.slots.entry(block) {
            Entry::Occupied(mut entry) => {
                match entry.get() {
                    Slot::Loaded(asset) => return Ok(Arc::clone(asset)),
                    Slot::Loading(rx) => return Err(rx.clone()),
                    Slot::Failed(_) => {}
                }
                tracing::debug!("Retrying asset for block {}", block);
                let (tx, rx) = watch::channel(None);
                entry.insert(Slot::Loading(rx));
                tx
            }
            Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(None);
                entry.insert(Slot::Loading(rx));
                tx
            }
        };
        let rx = tx.subscribe();
        self.spawn_fetch(block, tx);
        Err(rx)
    }

    fn spawn_fetch(self: &Arc<Self>, block: BlockId, tx: watch::Sender<Option<Outcome>>) {
        let cache = Arc::clone(self);
        let fetch = self.source.fetch(block);
        tokio::spawn(async move {
            let outcome: Outcome = fetch.await.map(Arc::new).map_err(|e| format!("{e:#}"));
            match &outcome {
                Ok(asset) => {
                    tracing::debug!("Loaded asset for block {} ({} bytes)", block, asset.size);
                    cache.slots.insert(block, Slot::Loaded(Arc::clone(asset)));
                }
                Err(err) => {
                    tracing::warn!("Failed to load block {}: {}", block, err);
                    cache.slots.insert(block, Slot::Failed(err.clone()));
                    if let Some(events) = &cache.events {
                        event_bus::publish(events, EditorEvent::AssetFailed { block, error: err.clone() });
                    }
                }
            }
            cache.revision.fetch_add(1, Relaxed);
            tx.send_replace(Some(outcome));
        });
    }
}
