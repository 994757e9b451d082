#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::indexing_slicing)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! `GerberLens` WASM module: layer classification, Gerber parsing, board
//! bounds, preview projection and quote-time design rule checks.

pub mod config;
pub mod drc;
pub mod error;
pub mod geometry;
pub mod gerber;
pub mod layers;
pub mod workspace;

use std::cell::RefCell;
use std::fmt::Display;

use log::warn;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::config::BoardSpecs;
use crate::error::WorkspaceError;
use crate::geometry::{saturate_u32, LayerGeometry, MeshMeta};
use crate::layers::{Progress, UploadedFile};
use crate::workspace::{Workspace, WorkspaceSnapshot};

thread_local! {
    static WORKSPACE: RefCell<Workspace> = RefCell::new(Workspace::default());
    static LAST_GEOMETRY: RefCell<Option<LayerGeometry>> = const { RefCell::new(None) };
}

fn with_workspace<R>(f: impl FnOnce(&mut Workspace) -> R) -> R {
    WORKSPACE.with(|ws| f(&mut ws.borrow_mut()))
}

fn store_geometry(geom: Option<LayerGeometry>) {
    LAST_GEOMETRY.with(|g| {
        *g.borrow_mut() = geom;
    });
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

fn js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// One entry of the array handed to [`load_files`].
#[derive(Debug, Deserialize)]
struct FileInput {
    name: String,
    content: Option<String>,
}

impl From<FileInput> for UploadedFile {
    fn from(input: FileInput) -> Self {
        match input.content {
            Some(text) => Self::text(input.name, text),
            None => Self::unavailable(input.name),
        }
    }
}

/// Initialize the WASM module. Sets up the panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
}

/// Classify a file name. `mask_color` names the solder mask color used for
/// mask layers.
///
/// # Errors
///
/// Returns an error string if the result cannot be serialized.
#[wasm_bindgen]
pub fn classify_layer(name: &str, mask_color: &str) -> Result<JsValue, JsValue> {
    to_js(&layers::classify(name, mask_color))
}

/// Parse Gerber text without touching the workspace.
///
/// # Errors
///
/// Returns an error string if the result cannot be serialized.
#[wasm_bindgen]
pub fn parse_layer(content: &str) -> Result<JsValue, JsValue> {
    to_js(&gerber::parse(content))
}

/// Add an array of `{ name, content }` objects to the workspace. A missing
/// or `null` content marks the file as unreadable.
///
/// `progress`, if given, is called as `progress(completed, total)` after
/// each file. The workspace is rebuilt on a staged copy, so the callback
/// may read the current state; it sees the files as they were before this
/// call.
///
/// # Errors
///
/// Returns an error string if `files` has the wrong shape.
#[allow(clippy::needless_pass_by_value)]
#[wasm_bindgen]
pub fn load_files(
    files: JsValue,
    progress: Option<js_sys::Function>,
) -> Result<JsValue, JsValue> {
    let inputs: Vec<FileInput> = serde_wasm_bindgen::from_value(files).map_err(js_error)?;
    let uploads = inputs.into_iter().map(UploadedFile::from).collect();

    let snapshot = load_files_internal(uploads, |step| {
        if let Some(callback) = &progress {
            let result = callback.call2(
                &JsValue::NULL,
                &JsValue::from(saturate_u32(step.completed)),
                &JsValue::from(saturate_u32(step.total)),
            );
            if let Err(err) = result {
                warn!("progress callback failed: {err:?}");
            }
        }
    });
    to_js(&snapshot)
}

/// Internal load logic shared between the wasm export and native tests.
#[doc(hidden)]
pub fn load_files_internal(
    files: Vec<UploadedFile>,
    on_progress: impl FnMut(Progress),
) -> WorkspaceSnapshot {
    let mut staged = WORKSPACE.with(|ws| ws.borrow().clone());
    staged.add_files_with_progress(files, on_progress);
    let snapshot = staged.snapshot();
    with_workspace(|ws| *ws = staged);
    snapshot
}

/// Add one file from raw bytes. Bytes that are not UTF-8 leave the layer
/// without geometry.
///
/// # Errors
///
/// Returns an error string if the snapshot cannot be serialized.
#[wasm_bindgen]
pub fn add_file_bytes(name: &str, data: &[u8]) -> Result<JsValue, JsValue> {
    let snapshot = load_files_internal(vec![UploadedFile::bytes(name, data.to_vec())], |_| {});
    to_js(&snapshot)
}

/// Remove a file from the workspace.
///
/// # Errors
///
/// Returns an error string if no file has this name.
#[wasm_bindgen]
pub fn remove_file(name: &str) -> Result<JsValue, JsValue> {
    let snapshot = with_workspace(|ws| ws.remove_file(name).map(|()| ws.snapshot()));
    to_js(&snapshot.map_err(js_error)?)
}

/// Show or hide a layer.
///
/// # Errors
///
/// Returns an error string if no file has this name.
#[wasm_bindgen]
pub fn set_layer_visible(name: &str, visible: bool) -> Result<JsValue, JsValue> {
    let snapshot = with_workspace(|ws| ws.set_visibility(name, visible).map(|()| ws.snapshot()));
    to_js(&snapshot.map_err(js_error)?)
}

/// Replace the declared board specs. Missing fields take their defaults;
/// numeric fields that are null or not numbers are kept as NaN and fail
/// their checks.
///
/// # Errors
///
/// Returns an error string if `specs` is not an object.
#[wasm_bindgen]
pub fn set_board_specs(specs: JsValue) -> Result<JsValue, JsValue> {
    let specs: BoardSpecs = serde_wasm_bindgen::from_value(specs)
        .map_err(|err| js_error(WorkspaceError::InvalidSpecs(err.to_string())))?;
    let snapshot = with_workspace(|ws| {
        ws.set_specs(specs);
        ws.snapshot()
    });
    to_js(&snapshot)
}

/// Layers, bounds and check results of the current workspace.
///
/// # Errors
///
/// Returns an error string if the snapshot cannot be serialized.
#[wasm_bindgen]
pub fn workspace_snapshot() -> Result<JsValue, JsValue> {
    to_js(&with_workspace(|ws| ws.snapshot()))
}

/// Visible layers projected into the preview viewbox.
///
/// # Errors
///
/// Returns an error string if the result cannot be serialized.
#[wasm_bindgen]
pub fn project_layers() -> Result<JsValue, JsValue> {
    to_js(&with_workspace(|ws| ws.project_visible_layers()))
}

/// Build the triangle mesh of one layer.
///
/// Returns mesh metadata, or `null` when the layer has no geometry.
/// Buffers are stored internally; retrieve with [`get_positions`] and
/// [`get_indices`].
///
/// # Errors
///
/// Returns an error string if no layer has this name.
#[wasm_bindgen]
pub fn layer_mesh(name: &str) -> Result<JsValue, JsValue> {
    to_js(&layer_mesh_internal(name).map_err(js_error)?)
}

/// Internal mesh logic shared between the wasm export and native tests.
#[doc(hidden)]
pub fn layer_mesh_internal(name: &str) -> Result<Option<MeshMeta>, WorkspaceError> {
    let geom = with_workspace(|ws| ws.layer_mesh(name))?;
    let meta = geom.as_ref().map(MeshMeta::from);
    store_geometry(geom);
    Ok(meta)
}

/// Retrieve the position buffer for the last meshed layer.
///
/// Returns a copy of the interleaved `[x0, y0, x1, y1, ...]` positions.
/// Returns an empty array if no layer has been meshed yet.
#[wasm_bindgen]
pub fn get_positions() -> Vec<f32> {
    LAST_GEOMETRY.with(|g| {
        g.borrow()
            .as_ref()
            .map_or_else(Vec::new, |geom| geom.positions.clone())
    })
}

/// Retrieve the index buffer for the last meshed layer.
///
/// Returns an empty array if no layer has been meshed yet.
#[wasm_bindgen]
pub fn get_indices() -> Vec<u32> {
    LAST_GEOMETRY.with(|g| {
        g.borrow()
            .as_ref()
            .map_or_else(Vec::new, |geom| geom.indices.clone())
    })
}

/// First `max_lines` lines of a file.
///
/// # Errors
///
/// Returns an error string if the file is unknown or unreadable.
#[wasm_bindgen]
pub fn content_preview(name: &str, max_lines: u32) -> Result<String, JsValue> {
    let max_lines = usize::try_from(max_lines).unwrap_or(usize::MAX);
    with_workspace(|ws| ws.content_preview(name, max_lines)).map_err(js_error)
}

/// Drop every file, toggle and stored mesh. Board specs are kept.
#[wasm_bindgen]
pub fn reset_workspace() {
    with_workspace(Workspace::clear);
    store_geometry(None);
}

#[cfg(test)]
mod tests {
    use super::*;

    const COPPER: &str = "%ADD10C,0.2*%\nD10*\nX50000Y50000D02*\nX250000Y250000D01*\n";
    const DRILL: &str = "%ADD10C,0.8*%\nD10*\nX100000Y100000D03*\n";

    #[test]
    fn load_reports_progress_per_file() {
        reset_workspace();
        let mut seen = Vec::new();
        let snapshot = load_files_internal(
            vec![
                UploadedFile::text("board-F_Cu.gbr", COPPER),
                UploadedFile::text("board.drl", DRILL),
            ],
            |step| seen.push((step.completed, step.total)),
        );
        assert_eq!(seen, vec![(1, 2), (2, 2)]);
        assert_eq!(snapshot.layers.len(), 2);
        assert!(snapshot.summary.ready);
    }

    #[test]
    fn progress_callback_may_read_the_workspace() {
        reset_workspace();
        load_files_internal(vec![UploadedFile::text("board.drl", DRILL)], |_| {});

        let mut seen = Vec::new();
        let snapshot = load_files_internal(
            vec![UploadedFile::text("board-F_Cu.gbr", COPPER)],
            |_| seen.push(with_workspace(|ws| ws.snapshot().layers.len())),
        );

        assert_eq!(seen, vec![1, 1]);
        assert_eq!(snapshot.layers.len(), 2);
        assert_eq!(with_workspace(|ws| ws.layers().len()), 2);
    }

    #[test]
    fn file_input_without_content_is_unavailable() {
        let upload = UploadedFile::from(FileInput {
            name: "board.drl".to_string(),
            content: None,
        });
        assert_eq!(upload, UploadedFile::unavailable("board.drl"));
    }

    #[test]
    fn mesh_buffers_follow_last_meshed_layer() {
        reset_workspace();
        assert!(get_positions().is_empty(), "no mesh yet => empty positions");
        assert!(get_indices().is_empty(), "no mesh yet => empty indices");

        load_files_internal(vec![UploadedFile::text("board.drl", DRILL)], |_| {});
        let meta = layer_mesh_internal("board.drl");
        assert!(matches!(meta, Ok(Some(ref meta)) if meta.vertex_count == 32));
        assert_eq!(get_positions().len(), 64);
        assert_eq!(get_indices().len(), 90);

        reset_workspace();
        assert!(get_positions().is_empty());
    }

    #[test]
    fn unknown_layer_mesh_is_an_error() {
        reset_workspace();
        assert!(matches!(
            layer_mesh_internal("missing.gtl"),
            Err(WorkspaceError::UnknownLayer(_))
        ));
    }

    #[test]
    fn unreadable_layer_clears_stored_mesh() {
        reset_workspace();
        load_files_internal(
            vec![
                UploadedFile::text("board.drl", DRILL),
                UploadedFile::bytes("board-F_Cu.gbr", vec![0xff, 0xfe]),
            ],
            |_| {},
        );
        assert!(layer_mesh_internal("board.drl").is_ok());
        assert!(matches!(layer_mesh_internal("board-F_Cu.gbr"), Ok(None)));
        assert!(get_positions().is_empty());
    }
}
