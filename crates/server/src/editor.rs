//! The editor controller and the task that owns it.
//!
//! [`Editor`] is synchronous and holds the only [`GridModel`]. [`spawn`]
//! moves it onto a single tokio task; everything else talks to it through
//! an [`EditorHandle`] (commands in over mpsc, frames out over `watch`).
//! No locks: the task applies one command at a time and builds frames
//! between commands, so every frame sees a consistent grid.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use cityblock_engine::export::{self, ExportMetadata};
use cityblock_engine::picking::{self, Pick};
use cityblock_engine::projection::{Projection, ScreenPoint};
use cityblock_engine::scene::{self, SceneParams};
use cityblock_engine::view::{Rotation, Section, SectionMode};
use cityblock_engine::{BlockId, CellPos, EngineError, GridModel, PlaceOutcome, catalog, render};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;

use crate::assets::AssetCache;
use crate::event_bus::{self, EditorEvent};
use crate::frame::{FrameSnapshot, Minimap};

/// Commands queued per editor before senders wait.
const COMMAND_QUEUE: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Place,
    Select,
    Delete,
}

/// Discrete input forwarded by the host shell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    PointerMove { x: f64, y: f64 },
    PointerLeave,
    /// Apply the active tool to the hovered cell.
    Click,
    Place { x: i32, y: i32, z: i32 },
    Remove { x: i32, y: i32, z: i32 },
    Select { x: i32, y: i32, z: i32 },
    DeleteHovered,
    /// Rotate by a multiple of 90 degrees (negative = counter-clockwise).
    Rotate { delta: i32 },
    SetTool { tool: Tool },
    SelectBlock { block: BlockId },
    SelectFamily { family: String },
    SetSectionMode { mode: SectionMode },
    SetVisibility { visibility: f64 },
    SetTitle { title: String },
    SetDescription { description: String },
    Reset,
    /// `date` defaults to today (`YYYY.MM.DD`).
    Export { date: Option<String> },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Reply {
    Done,
    Hover { hover: Option<Pick> },
    Placed { placed: bool, reason: Option<String> },
    Removed { cells: Vec<CellPos> },
    Selected { block: Option<BlockId> },
    Exported { xml: String },
    Error { message: String },
}

impl From<EngineError> for Reply {
    fn from(err: EngineError) -> Self {
        Reply::Error { message: err.to_string() }
    }
}

pub struct Editor {
    grid: GridModel,
    projection: Projection,
    rotation: Rotation,
    section: Section,
    hover: Option<Pick>,
    pointer: Option<ScreenPoint>,
    tool: Tool,
    selected: BlockId,
    family: &'static str,
    meta: ExportMetadata,
    assets: Arc<AssetCache>,
    events: broadcast::Sender<EditorEvent>,
    sequence: u64,
    dirty: bool,
}

impl Editor {
    pub fn new(
        projection: Projection,
        meta: ExportMetadata,
        assets: Arc<AssetCache>,
        events: broadcast::Sender<EditorEvent>,
    ) -> Self {
        let ground = &catalog::FAMILIES[0];
        Self {
            grid: GridModel::new(),
            projection,
            rotation: Rotation::default(),
            section: Section::default(),
            hover: None,
            pointer: None,
            tool: Tool::default(),
            selected: ground.first(),
            family: ground.id,
            meta,
            assets,
            events,
            sequence: 0,
            dirty: true,
        }
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn hover(&self) -> Option<Pick> {
        self.hover
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn selected_block(&self) -> BlockId {
        self.selected
    }

    pub fn selected_family(&self) -> &'static str {
        self.family
    }

    pub fn assets(&self) -> &Arc<AssetCache> {
        &self.assets
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Dispatch one host command.
    pub fn apply(&mut self, command: Command) -> Reply {
        tracing::debug!("Editor command: {:?}", command);
        match command {
            Command::PointerMove { x, y } => Reply::Hover { hover: self.pointer_moved(ScreenPoint::new(x, y)) },
            Command::PointerLeave => {
                self.pointer_left();
                Reply::Hover { hover: None }
            }
            Command::Click => self.click(),
            Command::Place { x, y, z } => self.place_reply(CellPos::new(x, y, z)),
            Command::Remove { x, y, z } => Reply::Removed { cells: self.remove(CellPos::new(x, y, z)) },
            Command::Select { x, y, z } => Reply::Selected { block: self.select(CellPos::new(x, y, z)) },
            Command::DeleteHovered => match self.hover {
                Some(hover) => Reply::Removed { cells: self.remove(hover.cell()) },
                None => Reply::Removed { cells: Vec::new() },
            },
            Command::Rotate { delta } => self.rotate(delta).map_or_else(Reply::from, |_| Reply::Done),
            Command::SetTool { tool } => {
                self.set_tool(tool);
                Reply::Done
            }
            Command::SelectBlock { block } => self.select_block(block).map_or_else(Reply::from, |_| Reply::Done),
            Command::SelectFamily { family } => self.select_family(&family).map_or_else(Reply::from, |_| Reply::Done),
            Command::SetSectionMode { mode } => {
                self.set_section_mode(mode);
                Reply::Done
            }
            Command::SetVisibility { visibility } => {
                self.set_visibility(visibility).map_or_else(Reply::from, |_| Reply::Done)
            }
            Command::SetTitle { title } => {
                self.set_title(title);
                Reply::Done
            }
            Command::SetDescription { description } => {
                self.set_description(description);
                Reply::Done
            }
            Command::Reset => {
                self.reset();
                Reply::Done
            }
            Command::Export { date } => Reply::Exported { xml: self.export(date) },
        }
    }

    // ── Pointer ─────────────────────────────────────────────────────────

    pub fn pointer_moved(&mut self, point: ScreenPoint) -> Option<Pick> {
        self.pointer = Some(point);
        self.repick();
        self.hover
    }

    pub fn pointer_left(&mut self) {
        self.pointer = None;
        if self.hover.take().is_some() {
            self.dirty = true;
        }
    }

    /// Hover depends on the grid and rotation, so it is recomputed from the
    /// last pointer position after either changes.
    fn repick(&mut self) {
        let hover = self
            .pointer
            .and_then(|p| picking::pick(p, &self.grid, self.rotation, &self.projection));
        if hover != self.hover {
            self.hover = hover;
            self.dirty = true;
        }
    }

    /// Apply the active tool at the hovered cell.
    pub fn click(&mut self) -> Reply {
        let Some(hover) = self.hover else {
            return Reply::Done;
        };
        let cell = hover.cell();
        match self.tool {
            Tool::Place => self.place_reply(cell),
            Tool::Delete => Reply::Removed { cells: self.remove(cell) },
            Tool::Select => Reply::Selected { block: self.select(cell) },
        }
    }

    // ── Grid mutation ───────────────────────────────────────────────────

    fn place_reply(&mut self, cell: CellPos) -> Reply {
        match self.place(cell, self.selected) {
            PlaceOutcome::Placed => Reply::Placed { placed: true, reason: None },
            PlaceOutcome::Rejected(reason) => Reply::Placed {
                placed: false,
                reason: Some(reason.to_string()),
            },
        }
    }

    /// Place `block`, preloading its visual on success. Rejections are
    /// published on the event bus only.
    pub fn place(&mut self, cell: CellPos, block: BlockId) -> PlaceOutcome {
        let outcome = self.grid.place(cell, block);
        match outcome {
            PlaceOutcome::Placed => {
                self.assets.preload(block);
                event_bus::publish(&self.events, EditorEvent::Placed { cell, block });
                self.dirty = true;
                self.repick();
            }
            PlaceOutcome::Rejected(reason) => {
                event_bus::publish(
                    &self.events,
                    EditorEvent::Rejected { cell, block, reason: reason.to_string() },
                );
            }
        }
        outcome
    }

    /// Remove `cell` and everything above it; returns the cleared cells.
    pub fn remove(&mut self, cell: CellPos) -> Vec<CellPos> {
        let changes = self.grid.remove(cell);
        if changes.is_empty() {
            return Vec::new();
        }
        let cells = changes.iter().map(|(pos, _)| *pos).collect();
        event_bus::publish(&self.events, EditorEvent::Removed { changes: changes.into() });
        self.dirty = true;
        self.repick();
        cells
    }

    /// Copy the block at `cell` into the selection.
    pub fn select(&mut self, cell: CellPos) -> Option<BlockId> {
        let block = self.grid.get(cell)?;
        self.selected = block;
        let family = catalog::family_of(block).map(|f| f.id);
        if let Some(id) = family {
            self.family = id;
        }
        event_bus::publish(&self.events, EditorEvent::Selected { block, family });
        self.dirty = true;
        Some(block)
    }

    pub fn reset(&mut self) {
        let cleared = self.grid.block_count();
        self.grid.clear();
        tracing::info!("Grid reset ({} blocks cleared)", cleared);
        event_bus::publish(&self.events, EditorEvent::Reset { cleared });
        self.dirty = true;
        self.repick();
    }

    // ── Selection and tools ─────────────────────────────────────────────

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.dirty = true;
    }

    pub fn select_block(&mut self, block: BlockId) -> Result<(), EngineError> {
        let block = catalog::validate(block)?;
        self.selected = block;
        if let Some(family) = catalog::family_of(block) {
            self.family = family.id;
        }
        self.dirty = true;
        Ok(())
    }

    /// Switch family; the selection moves to the family's icon block.
    pub fn select_family(&mut self, family_id: &str) -> Result<(), EngineError> {
        let family = catalog::family(family_id)?;
        self.family = family.id;
        self.selected = family.icon;
        self.dirty = true;
        Ok(())
    }

    // ── View ────────────────────────────────────────────────────────────

    pub fn rotate(&mut self, delta: i32) -> Result<Rotation, EngineError> {
        self.rotation = self.rotation.rotated_by(delta)?;
        self.view_changed();
        self.repick();
        Ok(self.rotation)
    }

    pub fn set_section_mode(&mut self, mode: SectionMode) {
        self.section.mode = mode;
        self.view_changed();
    }

    pub fn set_visibility(&mut self, visibility: f64) -> Result<(), EngineError> {
        self.section.set_visibility(visibility)?;
        self.view_changed();
        Ok(())
    }

    fn view_changed(&mut self) {
        event_bus::publish(
            &self.events,
            EditorEvent::ViewChanged { rotation: self.rotation, section: self.section },
        );
        self.dirty = true;
    }

    // ── Output ──────────────────────────────────────────────────────────

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.meta.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.meta.description = description.into();
    }

    pub fn export(&self, date: Option<String>) -> String {
        let mut meta = self.meta.clone();
        meta.date = date.unwrap_or_else(|| chrono::Local::now().format("%Y.%m.%d").to_string());
        let document = export::export(&self.grid, &meta);
        tracing::info!("Exported {} blocks in {} rows", document.block_count(), document.rows.len());
        document.to_xml()
    }

    pub fn minimap(&self) -> Minimap {
        Minimap::of(&self.grid, self.hover)
    }

    /// Ghost block shown while the place tool hovers an empty cell.
    fn preview(&self) -> Option<BlockId> {
        match (self.tool, self.hover) {
            (Tool::Place, Some(Pick::Placement { .. })) => Some(self.selected),
            _ => None,
        }
    }

    /// Compose, sort and rasterize the current frame. Clears the dirty flag.
    pub fn frame(&mut self) -> FrameSnapshot {
        let params = SceneParams {
            rotation: self.rotation,
            section: self.section,
            hover: self.hover,
            preview: self.preview(),
        };
        let frame = scene::compose(&self.grid, &self.projection, &params);
        let assets = &self.assets;
        let primitives = render::rasterize(&frame, &self.projection, |block| assets.href(block));

        self.sequence += 1;
        self.dirty = false;
        FrameSnapshot {
            sequence: self.sequence,
            rotation: self.rotation,
            section: self.section,
            hover: self.hover,
            blocks: self.grid.block_count(),
            primitives,
            minimap: self.minimap(),
        }
    }
}

// ── Owning task ─────────────────────────────────────────────────────────

struct Request {
    command: Command,
    reply: oneshot::Sender<Reply>,
}

/// Start/stop switch for the redraw ticker. Both operations are idempotent;
/// a stopped loop still serves commands.
#[derive(Clone)]
pub struct FrameLoop {
    running: Arc<watch::Sender<bool>>,
}

impl FrameLoop {
    pub fn start(&self) {
        if !self.running.send_replace(true) {
            tracing::debug!("Redraw loop started");
        }
    }

    pub fn stop(&self) {
        if self.running.send_replace(false) {
            tracing::debug!("Redraw loop stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }
}

/// Cloneable front door to the editor task.
#[derive(Clone)]
pub struct EditorHandle {
    commands: mpsc::Sender<Request>,
    frames: watch::Receiver<Arc<FrameSnapshot>>,
    events: broadcast::Sender<EditorEvent>,
    frame_loop: FrameLoop,
}

impl EditorHandle {
    pub async fn send(&self, command: Command) -> Result<Reply> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Request { command, reply })
            .await
            .map_err(|_| anyhow!("editor task has stopped"))?;
        rx.await.map_err(|_| anyhow!("editor task dropped the reply"))
    }

    /// Most recently published frame.
    pub fn latest_frame(&self) -> Arc<FrameSnapshot> {
        Arc::clone(&self.frames.borrow())
    }

    pub fn frames(&self) -> watch::Receiver<Arc<FrameSnapshot>> {
        self.frames.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }
}

/// Move `editor` onto its own task. The redraw loop starts running; it
/// republishes a frame at most once per `frame_interval`, and only when a
/// command or a finished asset load changed what would be drawn.
pub fn spawn(mut editor: Editor, frame_interval: Duration) -> EditorHandle {
    let (commands, rx) = mpsc::channel(COMMAND_QUEUE);
    let (frames_tx, frames) = watch::channel(Arc::new(editor.frame()));
    let (running, running_rx) = watch::channel(true);
    let events = editor.events.clone();

    tokio::spawn(run(editor, rx, frames_tx, running_rx, frame_interval));

    EditorHandle {
        commands,
        frames,
        events,
        frame_loop: FrameLoop { running: Arc::new(running) },
    }
}

async fn run(
    mut editor: Editor,
    mut commands: mpsc::Receiver<Request>,
    frames: watch::Sender<Arc<FrameSnapshot>>,
    mut running: watch::Receiver<bool>,
    frame_interval: Duration,
) {
    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut seen_assets = editor.assets().revision();

    tracing::info!("Editor task started (frame interval {:?})", frame_interval);

    loop {
        let redrawing = *running.borrow_and_update();
        tokio::select! {
            request = commands.recv() => {
                let Some(Request { command, reply }) = request else {
                    break; // every handle dropped
                };
                let _ = reply.send(editor.apply(command));
            }

            _ = ticker.tick(), if redrawing => {
                let assets = editor.assets().revision();
                if editor.is_dirty() || assets != seen_assets {
                    seen_assets = assets;
                    frames.send_replace(Arc::new(editor.frame()));
                }
            }

            changed = running.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!("Editor task stopped");
}
