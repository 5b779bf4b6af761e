use std::cell::RefCell;

use lanewise_core::loaders::{load_auto, native::lane_from_value};
use lanewise_core::model::LaneData;
use lanewise_core::{ActiveBrush, Board, BoardConfig, SyncOutcome, ZoomLevel};
use lanewise_protocol::{Point, SharedStr, Viewport};
use serde::Serialize;
use wasm_bindgen::prelude::*;

thread_local! {
    static BOARD: RefCell<Board> = RefCell::new(Board::new(BoardConfig::default()));
}

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(js_err)
}

fn with_board<T>(f: impl FnOnce(&mut Board) -> T) -> T {
    BOARD.with(|board| f(&mut board.borrow_mut()))
}

/// Replace the board with a fresh one built from a JSON config.
/// Missing keys fall back to defaults.
#[wasm_bindgen]
pub fn configure(config_json: &str) -> Result<(), JsError> {
    let config: BoardConfig = serde_json::from_str(config_json).map_err(js_err)?;
    config.validate().map_err(js_err)?;
    with_board(|board| *board = Board::new(config));
    Ok(())
}

/// A lane from `load_sessions` that could not be used.
#[derive(Serialize)]
struct SkippedLane {
    index: usize,
    error: String,
}

#[derive(Serialize)]
struct LoadReport {
    loaded: usize,
    skipped: Vec<SkippedLane>,
}

/// Load sessions from a JSON array of lane objects (`{session, records}`).
/// Replaces the current set. Each lane is read on its own: a bad entry is
/// reported in `skipped` and the rest still load.
#[wasm_bindgen]
pub fn load_sessions(json: &str) -> Result<String, JsError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json).map_err(js_err)?;
    to_json(&with_board(|board| replace_sessions(board, values)))
}

fn replace_sessions(board: &mut Board, values: Vec<serde_json::Value>) -> LoadReport {
    let mut lanes = Vec::with_capacity(values.len());
    let mut skipped = Vec::new();
    for (index, value) in values.into_iter().enumerate() {
        match lane_from_value(value) {
            Ok(lane) => lanes.push(lane),
            Err(err) => skipped.push(SkippedLane {
                index,
                error: err.to_string(),
            }),
        }
    }
    let loaded = lanes.len();
    board.set_sessions(lanes);
    LoadReport { loaded, skipped }
}

/// Add or refresh one session from raw file bytes, either native JSON or a
/// Claude Code transcript. Returns the number of malformed lines skipped.
#[wasm_bindgen]
pub fn add_session(session_id: &str, data: &[u8]) -> Result<usize, JsError> {
    let loaded = load_auto(data, session_id).map_err(js_err)?;
    with_board(|board| {
        let id = loaded.data.session.id.clone();
        let mut sessions: Vec<LaneData> = board
            .lanes()
            .iter()
            .filter(|lane| *lane.id() != id)
            .map(|lane| lane.data().clone())
            .collect();
        sessions.push(loaded.data);
        board.set_sessions(sessions);
    });
    Ok(loaded.skipped_lines)
}

/// Show only these lane ids, in this order. Takes a JSON array of strings.
#[wasm_bindgen]
pub fn set_visible_lanes(ids_json: &str) -> Result<(), JsError> {
    let ids: Vec<SharedStr> = serde_json::from_str(ids_json).map_err(js_err)?;
    with_board(|board| board.set_visible_lanes(ids));
    Ok(())
}

/// `"pixel"`, `"skim"` or `"detail"`.
#[wasm_bindgen]
pub fn set_zoom(zoom: &str) -> Result<(), JsError> {
    let zoom: ZoomLevel =
        serde_json::from_value(serde_json::Value::String(zoom.to_owned())).map_err(js_err)?;
    with_board(|board| board.set_zoom(zoom));
    Ok(())
}

/// Set the brush from `{"type": "tool", "value": "Bash"}`.
#[wasm_bindgen]
pub fn set_brush(brush_json: &str) -> Result<(), JsError> {
    let brush: ActiveBrush = serde_json::from_str(brush_json).map_err(js_err)?;
    with_board(|board| board.set_brush(Some(brush)));
    Ok(())
}

#[wasm_bindgen]
pub fn clear_brush() {
    with_board(|board| board.set_brush(None));
}

#[wasm_bindgen]
pub fn set_sync_enabled(enabled: bool) {
    with_board(|board| board.set_sync_enabled(enabled));
}

/// Report a native scroll of one lane. Returns how many lanes moved.
#[wasm_bindgen]
pub fn scroll_lane(lane_id: &str, offset: f64) -> Result<usize, JsError> {
    let outcome = with_board(|board| board.on_lane_scroll(lane_id, offset)).map_err(js_err)?;
    Ok(match outcome {
        SyncOutcome::Broadcast { updated, .. } => updated + 1,
        SyncOutcome::Local { .. } => 1,
        SyncOutcome::Suppressed | SyncOutcome::Ignored => 0,
    })
}

#[wasm_bindgen]
pub fn scroll_columns(delta: f64) {
    with_board(|board| board.scroll_columns(delta));
}

/// Call once scrolling has settled so the next user scroll broadcasts again.
#[wasm_bindgen]
pub fn idle_tick() {
    with_board(Board::idle_tick);
}

/// Lay out the board and return render commands as JSON.
#[wasm_bindgen]
pub fn render(x: f64, y: f64, width: f64, height: f64, dpr: f64) -> Result<String, JsError> {
    let viewport = Viewport {
        x,
        y,
        width,
        height,
        dpr,
    };
    let commands = with_board(|board| board.render(&viewport));
    to_json(&commands)
}

/// Click at a point from the last render. Returns the hit target as JSON,
/// or `null`.
#[wasm_bindgen]
pub fn click(x: f64, y: f64) -> Result<String, JsError> {
    let target = with_board(|board| board.click(Point { x, y }));
    to_json(&target)
}

#[wasm_bindgen]
pub fn hover(x: f64, y: f64) {
    with_board(|board| board.hover(Point { x, y }));
}

#[wasm_bindgen]
pub fn reload() {
    with_board(Board::reload);
}

/// Pending board events as a JSON array, oldest first.
#[wasm_bindgen]
pub fn drain_events() -> Result<String, JsError> {
    let events = with_board(Board::drain_events);
    to_json(&events)
}
