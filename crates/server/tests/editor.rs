//! Editor controller semantics and the owning task's frame loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use cityblock_engine::picking::Pick;
use cityblock_engine::projection::{Projection, ScreenPoint};
use cityblock_engine::render::Primitive;
use cityblock_engine::view::{Rotation, SectionMode};
use cityblock_engine::export::ExportMetadata;
use cityblock_engine::{BlockId, CellPos, ColumnPos};
use cityblock_server::assets::{AssetCache, AssetSource, AssetState, BlockAsset, FetchFuture};
use cityblock_server::editor::{self, Command, Editor, Reply, Tool};
use cityblock_server::event_bus::{self, EditorEvent};

struct InstantSource;

impl AssetSource for InstantSource {
    fn fetch(&self, block: BlockId) -> FetchFuture {
        Box::pin(async move {
            if block.0 >= 300 {
                return Err(anyhow!("missing"));
            }
            Ok(BlockAsset { block, href: format!("/blocks/{block}.svg"), size: 10 })
        })
    }
}

fn new_editor() -> (Editor, tokio::sync::broadcast::Receiver<EditorEvent>) {
    let events = event_bus::channel();
    let rx = events.subscribe();
    let assets = AssetCache::with_events(InstantSource, events.clone());
    let editor = Editor::new(Projection::default(), ExportMetadata::default(), assets, events);
    (editor, rx)
}

fn place(x: i32, y: i32, z: i32) -> Command {
    Command::Place { x, y, z }
}

// ---------------------------------------------------------------------------
// Grid commands
// ---------------------------------------------------------------------------

#[tokio::test]
async fn place_preloads_the_visual() {
    let (mut editor, mut events) = new_editor();
    editor.apply(Command::SelectBlock { block: BlockId(65) });
    let reply = editor.apply(place(0, 0, 0));
    assert_eq!(reply, Reply::Placed { placed: true, reason: None });
    assert_ne!(editor.assets().state(BlockId(65)), AssetState::Unrequested);
    assert!(matches!(
        events.recv().await,
        Ok(EditorEvent::Placed { block: BlockId(65), .. })
    ));

    let asset = editor.assets().load(BlockId(65)).await.unwrap();
    assert_eq!(asset.href, "/blocks/65.svg");
}

#[tokio::test]
async fn rejected_place_leaves_grid_unchanged() {
    let (mut editor, mut events) = new_editor();
    let reply = editor.apply(place(0, 0, 2));
    assert!(matches!(reply, Reply::Placed { placed: false, reason: Some(_) }));
    assert!(editor.grid().is_empty());
    assert!(matches!(events.recv().await, Ok(EditorEvent::Rejected { .. })));
    // Nothing was fetched for a rejected block.
    assert_eq!(editor.assets().state(editor.selected_block()), AssetState::Unrequested);
}

#[tokio::test]
async fn remove_cascades_and_reports_cells() {
    let (mut editor, _events) = new_editor();
    for z in [0, 1, 3] {
        editor.apply(place(2, 2, z));
    }
    let reply = editor.apply(Command::Remove { x: 2, y: 2, z: 1 });
    assert_eq!(
        reply,
        Reply::Removed { cells: vec![CellPos::new(2, 2, 1), CellPos::new(2, 2, 3)] }
    );
    assert_eq!(editor.grid().get(CellPos::new(2, 2, 3)), None);
    assert_eq!(editor.grid().block_count(), 1);
}

#[tokio::test]
async fn reset_clears_the_grid() {
    let (mut editor, _events) = new_editor();
    editor.apply(place(0, 0, 0));
    editor.apply(place(1, 0, 0));
    assert_eq!(editor.apply(Command::Reset), Reply::Done);
    assert!(editor.grid().is_empty());
}

// ---------------------------------------------------------------------------
// Pointer and tools
// ---------------------------------------------------------------------------

#[tokio::test]
async fn click_applies_the_active_tool() {
    let (mut editor, _events) = new_editor();

    // Empty grid: the ground beam of the center column.
    let hover = editor.pointer_moved(ScreenPoint::new(240.0, 230.0));
    assert_eq!(hover, Some(Pick::Placement { cell: CellPos::new(0, 0, 0) }));
    assert!(matches!(editor.apply(Command::Click), Reply::Placed { placed: true, .. }));

    // The new block's top face is now under the pointer.
    assert_eq!(editor.hover(), Some(Pick::Block { cell: CellPos::new(0, 0, 0) }));

    editor.apply(Command::SetTool { tool: Tool::Select });
    assert_eq!(editor.apply(Command::Click), Reply::Selected { block: Some(BlockId(1)) });

    editor.apply(Command::SetTool { tool: Tool::Delete });
    assert_eq!(
        editor.apply(Command::Click),
        Reply::Removed { cells: vec![CellPos::new(0, 0, 0)] }
    );
    assert!(editor.grid().is_empty());
}

#[tokio::test]
async fn pointer_leave_clears_hover() {
    let (mut editor, _events) = new_editor();
    editor.pointer_moved(ScreenPoint::new(240.0, 230.0));
    assert!(editor.hover().is_some());
    assert_eq!(editor.apply(Command::PointerLeave), Reply::Hover { hover: None });
    assert_eq!(editor.apply(Command::Click), Reply::Done);
    assert_eq!(editor.apply(Command::DeleteHovered), Reply::Removed { cells: vec![] });
}

#[tokio::test]
async fn off_canvas_pointer_has_no_hover() {
    let (mut editor, _events) = new_editor();
    let reply = editor.apply(Command::PointerMove { x: -50.0, y: 9999.0 });
    assert_eq!(reply, Reply::Hover { hover: None });
}

#[tokio::test]
async fn selecting_blocks_and_families() {
    let (mut editor, _events) = new_editor();
    assert_eq!(editor.selected_family(), "ground");

    editor.apply(Command::SelectFamily { family: "nature".into() });
    assert_eq!(editor.selected_block(), BlockId(150));

    editor.apply(Command::SelectBlock { block: BlockId(45) });
    assert_eq!(editor.selected_family(), "roads");

    assert!(matches!(editor.apply(Command::SelectBlock { block: BlockId(0) }), Reply::Error { .. }));
    assert!(matches!(
        editor.apply(Command::SelectFamily { family: "lava".into() }),
        Reply::Error { .. }
    ));
    assert_eq!(editor.selected_block(), BlockId(45));
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rotation_steps_and_validates() {
    let (mut editor, mut events) = new_editor();
    assert_eq!(editor.apply(Command::Rotate { delta: -90 }), Reply::Done);
    assert_eq!(editor.rotation(), Rotation::Deg270);
    assert!(matches!(events.recv().await, Ok(EditorEvent::ViewChanged { rotation: Rotation::Deg270, .. })));

    assert!(matches!(editor.apply(Command::Rotate { delta: 45 }), Reply::Error { .. }));
    assert_eq!(editor.rotation(), Rotation::Deg270);
}

#[tokio::test]
async fn section_controls() {
    let (mut editor, _events) = new_editor();
    editor.apply(Command::SetSectionMode { mode: SectionMode::Vertical });
    editor.apply(Command::SetVisibility { visibility: 0.5 });
    assert_eq!(editor.section().mode, SectionMode::Vertical);
    assert_eq!(editor.section().cut_plane(), 8.5);
    assert!(matches!(
        editor.apply(Command::SetVisibility { visibility: f64::NAN }),
        Reply::Error { .. }
    ));
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[tokio::test]
async fn export_uses_metadata_and_date() {
    let (mut editor, _events) = new_editor();
    editor.apply(place(0, 0, 0));
    editor.apply(Command::SetTitle { title: "Home".into() });
    let Reply::Exported { xml } = editor.apply(Command::Export { date: Some("2024.01.02".into()) }) else {
        panic!("expected an export reply");
    };
    assert!(xml.starts_with("<cb_x_y date=\"2024.01.02\""));
    assert!(xml.contains("title=\"Home\""));
    assert!(xml.contains("<r_0><c_0 b_0=\"1\" /></r_0>"));
}

#[tokio::test]
async fn export_defaults_to_today() {
    let (editor, _events) = new_editor();
    let xml = editor.export(None);
    let date = date_attr(&xml);
    assert_eq!(date.len(), 10);
    assert_eq!(date.matches('.').count(), 2);
    assert!(date.starts_with("20"));
}

fn date_attr(xml: &str) -> &str {
    let start = xml.find("date=\"").map(|i| i + 6).unwrap_or(0);
    &xml[start..start + 10]
}

#[tokio::test]
async fn frame_draws_images_once_loaded() {
    let (mut editor, _events) = new_editor();
    editor.apply(place(0, 0, 0));
    editor.assets().load(BlockId(1)).await.unwrap();

    let frame = editor.frame();
    assert!(!editor.is_dirty());
    assert_eq!(frame.blocks, 1);
    assert!(frame.primitives.iter().any(|p| matches!(p, Primitive::Image { href, .. } if href == "/blocks/1.svg")));
    assert!(frame.minimap.is_filled(ColumnPos::new(0, 0)));
    assert!(!frame.minimap.is_filled(ColumnPos::new(1, 0)));

    let next = editor.frame();
    assert_eq!(next.sequence, frame.sequence + 1);
}

#[tokio::test]
async fn frame_falls_back_to_cubes() {
    let (mut editor, _events) = new_editor();
    editor.apply(Command::SelectBlock { block: BlockId(300) });
    editor.apply(place(0, 0, 0));
    assert!(editor.assets().load(BlockId(300)).await.is_err());

    let frame = editor.frame();
    assert!(!frame.primitives.iter().any(|p| matches!(p, Primitive::Image { .. })));
    // 81 tiles plus three cube faces.
    assert_eq!(frame.primitives.len(), 84);
}

// ---------------------------------------------------------------------------
// Owning task
// ---------------------------------------------------------------------------

#[tokio::test]
async fn handle_serves_commands_and_publishes_frames() {
    let (editor, _events) = new_editor();
    let handle = editor::spawn(editor, Duration::from_millis(5));
    let mut frames = handle.frames();
    let first = handle.latest_frame().sequence;

    let reply = handle.send(place(0, 0, 0)).await.unwrap();
    assert_eq!(reply, Reply::Placed { placed: true, reason: None });

    let frame = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            frames.changed().await.unwrap();
            let frame = Arc::clone(&frames.borrow_and_update());
            if frame.blocks == 1 {
                return frame;
            }
        }
    })
    .await
    .unwrap();
    assert!(frame.sequence > first);
}

#[tokio::test]
async fn huge_rotation_keeps_the_task_alive() {
    let (editor, _events) = new_editor();
    let handle = editor::spawn(editor, Duration::from_millis(5));

    assert_eq!(handle.send(Command::Rotate { delta: 90 }).await.unwrap(), Reply::Done);
    assert_eq!(handle.send(Command::Rotate { delta: 2_147_483_610 }).await.unwrap(), Reply::Done);
    assert!(matches!(
        handle.send(Command::Rotate { delta: i32::MAX }).await.unwrap(),
        Reply::Error { .. }
    ));

    let reply = handle.send(place(0, 0, 0)).await.unwrap();
    assert_eq!(reply, Reply::Placed { placed: true, reason: None });
    let mut frames = handle.frames();
    let frame = tokio::time::timeout(Duration::from_secs(2), frames.wait_for(|f| f.blocks == 1))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert_eq!(frame.rotation, Rotation::Deg180);
}

#[tokio::test]
async fn stopped_loop_still_serves_commands() {
    let (editor, _events) = new_editor();
    let handle = editor::spawn(editor, Duration::from_millis(5));
    let frame_loop = handle.frame_loop();

    frame_loop.stop();
    frame_loop.stop();
    assert!(!frame_loop.is_running());
    tokio::time::sleep(Duration::from_millis(20)).await;
    let before = handle.latest_frame().sequence;

    handle.send(place(1, 1, 0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(handle.latest_frame().sequence, before);

    frame_loop.start();
    frame_loop.start();
    assert!(frame_loop.is_running());
    let mut frames = handle.frames();
    tokio::time::timeout(Duration::from_secs(2), frames.wait_for(|f| f.blocks == 1))
        .await
        .unwrap()
        .unwrap();
}
