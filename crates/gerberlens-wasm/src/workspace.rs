//! Session state for one PCB job and its derived views.
//!
//! The workspace owns the inputs (files, visibility toggles, board specs)
//! and re-derives layers, bounds and checks from scratch after every
//! mutation.

use log::{info, warn};
use serde::Serialize;

use crate::config::BoardSpecs;
use crate::drc::{self, DrcCheck, DrcSummary};
use crate::error::WorkspaceError;
use crate::geometry::{self, BoundingBox, LayerGeometry, Projection, RenderPrimitive};
use crate::layers::{
    build_layer_set_with_progress, Color, LayerInfo, LayerSummary, Progress, UploadedFile,
    VisibilityMap,
};

/// Projected primitives of one visible layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedLayer {
    /// File name.
    pub name: String,
    /// Display color.
    pub color: Color,
    /// Primitives in viewbox coordinates.
    pub primitives: Vec<RenderPrimitive>,
}

/// Everything the UI needs after a recomputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    /// Layer panel rows, in upload order.
    pub layers: Vec<LayerSummary>,
    /// Combined extent of the visible layers.
    pub bounds: BoundingBox,
    /// Ordered check results.
    pub drc: Vec<DrcCheck>,
    /// Check totals.
    pub summary: DrcSummary,
}

/// Files, toggles and specs of one session, with derived results.
#[derive(Debug, Clone)]
pub struct Workspace {
    files: Vec<UploadedFile>,
    visibility: VisibilityMap,
    specs: BoardSpecs,
    layers: Vec<LayerInfo>,
    bounds: BoundingBox,
    drc: Vec<DrcCheck>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(BoardSpecs::default())
    }
}

impl Workspace {
    /// Creates an empty workspace for the given specs.
    pub fn new(specs: BoardSpecs) -> Self {
        let mut workspace = Self {
            files: Vec::new(),
            visibility: VisibilityMap::new(),
            specs,
            layers: Vec::new(),
            bounds: BoundingBox::DEFAULT_LAYER,
            drc: Vec::new(),
        };
        workspace.recompute(|_| {});
        workspace
    }

    /// Adds files to the working set.
    ///
    /// A file whose name is already present replaces the earlier upload in
    /// place; its visibility toggle is kept.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = UploadedFile>) {
        self.add_files_with_progress(files, |_| {});
    }

    /// Same as [`Workspace::add_files`], reporting progress while layers are
    /// rebuilt.
    pub fn add_files_with_progress<F>(
        &mut self,
        files: impl IntoIterator<Item = UploadedFile>,
        on_progress: F,
    ) where
        F: FnMut(Progress),
    {
        for file in files {
            if let Some(existing) = self.files.iter_mut().find(|f| f.name == file.name) {
                warn!("`{}` uploaded again; replacing the earlier file", file.name);
                *existing = file;
            } else {
                self.files.push(file);
            }
        }
        self.recompute(on_progress);
    }

    /// Removes a file and forgets its toggle.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::UnknownLayer`] if no file has this name.
    pub fn remove_file(&mut self, name: &str) -> Result<(), WorkspaceError> {
        let before = self.files.len();
        self.files.retain(|file| file.name != name);
        if self.files.len() == before {
            return Err(WorkspaceError::UnknownLayer(name.to_string()));
        }

        self.visibility
            .retain_names(self.files.iter().map(|file| file.name.as_str()));
        self.recompute(|_| {});
        Ok(())
    }

    /// Shows or hides a layer.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::UnknownLayer`] if no file has this name.
    pub fn set_visibility(&mut self, name: &str, visible: bool) -> Result<(), WorkspaceError> {
        if !self.files.iter().any(|file| file.name == name) {
            return Err(WorkspaceError::UnknownLayer(name.to_string()));
        }

        self.visibility.set(name, visible);
        self.recompute(|_| {});
        Ok(())
    }

    /// Replaces the declared board specs.
    pub fn set_specs(&mut self, specs: BoardSpecs) {
        self.specs = specs;
        self.recompute(|_| {});
    }

    /// Drops every file and toggle, keeping the specs.
    pub fn clear(&mut self) {
        self.files.clear();
        self.visibility = VisibilityMap::new();
        self.recompute(|_| {});
    }

    /// Declared specs.
    pub const fn specs(&self) -> &BoardSpecs {
        &self.specs
    }

    /// Current layer list, in upload order.
    pub fn layers(&self) -> &[LayerInfo] {
        &self.layers
    }

    /// Combined extent of the visible layers.
    pub const fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Current check results.
    pub fn drc(&self) -> &[DrcCheck] {
        &self.drc
    }

    /// Serializable view of the derived state.
    pub fn snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            layers: self.layers.iter().map(LayerSummary::from).collect(),
            bounds: self.bounds,
            drc: self.drc.clone(),
            summary: DrcSummary::from_checks(&self.drc),
        }
    }

    /// Projects every visible, parsed layer through one shared projection.
    pub fn project_visible_layers(&self) -> Vec<ProjectedLayer> {
        let projection = Projection::new(self.bounds);

        self.layers
            .iter()
            .filter(|layer| self.visibility.is_visible(layer))
            .filter(|layer| layer.parsed.is_some())
            .map(|layer| ProjectedLayer {
                name: layer.name.clone(),
                color: layer.color,
                primitives: projection.project_layer(layer.parsed.as_ref()),
            })
            .collect()
    }

    /// Triangle mesh for one layer; `None` when the layer has no geometry.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::UnknownLayer`] if no layer has this name.
    pub fn layer_mesh(&self, name: &str) -> Result<Option<LayerGeometry>, WorkspaceError> {
        let layer = self.layer(name)?;
        Ok(layer.parsed.as_ref().map(geometry::build_layer_mesh))
    }

    /// First `max_lines` lines of a file, for the raw-content preview.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::UnknownLayer`] for an unknown name, or the
    /// read error if the content is unavailable or not text.
    pub fn content_preview(&self, name: &str, max_lines: usize) -> Result<String, WorkspaceError> {
        let file = self
            .files
            .iter()
            .find(|file| file.name == name)
            .ok_or_else(|| WorkspaceError::UnknownLayer(name.to_string()))?;

        let text = file.read_text()?;
        Ok(text.lines().take(max_lines).collect::<Vec<_>>().join("\n"))
    }

    fn layer(&self, name: &str) -> Result<&LayerInfo, WorkspaceError> {
        self.layers
            .iter()
            .find(|layer| layer.name == name)
            .ok_or_else(|| WorkspaceError::UnknownLayer(name.to_string()))
    }

    fn recompute<F>(&mut self, on_progress: F)
    where
        F: FnMut(Progress),
    {
        self.layers = build_layer_set_with_progress(
            &self.files,
            &self.visibility,
            self.specs.mask_color(),
            on_progress,
        );
        self.bounds = geometry::aggregate(
            &self.layers,
            &self.visibility,
            self.specs.board_width_mm,
            self.specs.board_height_mm,
        );
        self.drc = drc::evaluate(
            self.specs.board_width_mm,
            self.specs.board_height_mm,
            self.specs.layer_count,
            self.files.len(),
            &self.layers,
        );

        let summary = DrcSummary::from_checks(&self.drc);
        info!(
            "recomputed {} layers; {} critical check failures",
            self.layers.len(),
            summary.critical_failures
        );
    }
}
