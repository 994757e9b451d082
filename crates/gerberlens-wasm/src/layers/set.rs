//! Building the per-file layer list.

use std::collections::HashMap;

use log::{debug, warn};
use serde::Serialize;

use crate::config::SolderMaskColor;
use crate::error::WorkspaceError;
use crate::geometry::BoundingBox;
use crate::gerber::{self, ParsedGerberData};

use super::classify::{classify_with, Color, LayerRole};

/// Content of an uploaded file as handed over by the upload collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Already decoded text.
    Text(String),
    /// Raw bytes, decoded as UTF-8 on read.
    Bytes(Vec<u8>),
    /// The collaborator failed to deliver the content.
    Unavailable,
}

/// One file of the working set. Identified by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// File name as uploaded.
    pub name: String,
    /// File content.
    pub content: FileContent,
}

impl UploadedFile {
    /// A file with decoded text content.
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: FileContent::Text(content.into()),
        }
    }

    /// A file with raw byte content.
    pub fn bytes(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content: FileContent::Bytes(content),
        }
    }

    /// A file whose content could not be obtained.
    pub fn unavailable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: FileContent::Unavailable,
        }
    }

    /// Reads the file as text.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::ContentUnavailable`] when no content was
    /// delivered and [`WorkspaceError::InvalidEncoding`] when the bytes are
    /// not UTF-8.
    pub fn read_text(&self) -> Result<&str, WorkspaceError> {
        match &self.content {
            FileContent::Text(text) => Ok(text),
            FileContent::Bytes(bytes) => {
                std::str::from_utf8(bytes).map_err(|source| WorkspaceError::InvalidEncoding {
                    name: self.name.clone(),
                    source,
                })
            }
            FileContent::Unavailable => Err(WorkspaceError::ContentUnavailable(self.name.clone())),
        }
    }
}

/// Per-file visibility toggles, carried across rebuilds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisibilityMap(HashMap<String, bool>);

impl VisibilityMap {
    /// Creates an empty map; every layer is visible until toggled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a toggle.
    pub fn set(&mut self, name: impl Into<String>, visible: bool) {
        self.0.insert(name.into(), visible);
    }

    /// Stored toggle, if the file has been seen.
    pub fn get(&self, name: &str) -> Option<bool> {
        self.0.get(name).copied()
    }

    /// Whether `layer` should be drawn. A stored toggle wins over the
    /// layer's own flag.
    pub fn is_visible(&self, layer: &LayerInfo) -> bool {
        self.get(&layer.name).unwrap_or(layer.visible)
    }

    /// Drops toggles for files no longer in the working set.
    pub fn retain_names<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        let keep: Vec<&str> = names.into_iter().collect();
        self.0.retain(|name, _| keep.contains(&name.as_str()));
    }
}

/// One entry of the layer panel.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInfo {
    /// File name.
    pub name: String,
    /// Classified role.
    pub role: LayerRole,
    /// Display color.
    pub color: Color,
    /// Whether the layer is drawn.
    pub visible: bool,
    /// Parse result; absent when the content could not be read.
    pub parsed: Option<ParsedGerberData>,
}

impl LayerInfo {
    /// Bounds of the parsed geometry, if any.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.parsed.as_ref().map(|parsed| parsed.bounds)
    }
}

/// Light view of a [`LayerInfo`] for the layer panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummary {
    /// File name.
    pub name: String,
    /// Classified role.
    pub role: LayerRole,
    /// Display color.
    pub color: Color,
    /// Whether the layer is drawn.
    pub visible: bool,
    /// Whether the content could be read and parsed.
    pub parsed: bool,
    /// Number of parsed commands.
    pub command_count: usize,
    /// Number of draws and flashes.
    pub primitive_count: usize,
    /// Number of defined apertures.
    pub aperture_count: usize,
    /// Parsed bounds, if any.
    pub bounds: Option<BoundingBox>,
    /// Parser warnings.
    pub warnings: Vec<String>,
}

impl From<&LayerInfo> for LayerSummary {
    fn from(layer: &LayerInfo) -> Self {
        let parsed = layer.parsed.as_ref();
        Self {
            name: layer.name.clone(),
            role: layer.role,
            color: layer.color,
            visible: layer.visible,
            parsed: parsed.is_some(),
            command_count: parsed.map_or(0, |data| data.commands.len()),
            primitive_count: parsed.map_or(0, ParsedGerberData::primitive_count),
            aperture_count: parsed.map_or(0, |data| data.apertures.len()),
            bounds: layer.bounds(),
            warnings: parsed.map_or_else(Vec::new, |data| data.warnings.clone()),
        }
    }
}

/// Fraction of files processed during a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Files finished so far.
    pub completed: usize,
    /// Files in the batch.
    pub total: usize,
}

impl Progress {
    /// Completed share in `[0, 1]`; an empty batch counts as done.
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Build one [`LayerInfo`] per file.
///
/// Files are processed in order. Visibility comes from `visibility` for
/// files already seen and defaults to visible for new ones.
pub fn build_layer_set(
    files: &[UploadedFile],
    visibility: &VisibilityMap,
    mask: SolderMaskColor,
) -> Vec<LayerInfo> {
    build_layer_set_with_progress(files, visibility, mask, |_| {})
}

/// Same as [`build_layer_set`], calling `on_progress` after each file.
pub fn build_layer_set_with_progress<F>(
    files: &[UploadedFile],
    visibility: &VisibilityMap,
    mask: SolderMaskColor,
    mut on_progress: F,
) -> Vec<LayerInfo>
where
    F: FnMut(Progress),
{
    let total = files.len();
    let mut layers = Vec::with_capacity(total);

    for (index, file) in files.iter().enumerate() {
        layers.push(build_layer(file, visibility, mask));
        on_progress(Progress {
            completed: index + 1,
            total,
        });
    }

    layers
}

fn build_layer(file: &UploadedFile, visibility: &VisibilityMap, mask: SolderMaskColor) -> LayerInfo {
    let classification = classify_with(&file.name, mask);

    let parsed = match file.read_text() {
        Ok(text) => Some(gerber::parse(text)),
        Err(err) => {
            warn!("layer kept without geometry: {err}");
            None
        }
    };

    debug!(
        "classified `{}` as {} ({})",
        file.name, classification.role, classification.color
    );

    LayerInfo {
        name: file.name.clone(),
        role: classification.role,
        color: classification.color,
        visible: visibility.get(&file.name).unwrap_or(true),
        parsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COPPER: &str = "%ADD10C,0.2*%\nD10*\nX50000Y50000D02*\nX250000Y250000D01*\n";

    fn sample_files() -> Vec<UploadedFile> {
        vec![
            UploadedFile::text("board-F_Cu.gbr", COPPER),
            UploadedFile::text("board-F_Mask.gbr", "X0Y0D03*\n"),
            UploadedFile::unavailable("board.drl"),
        ]
    }

    #[test]
    fn one_layer_per_file_in_order() {
        let layers = build_layer_set(&sample_files(), &VisibilityMap::new(), SolderMaskColor::Green);
        let names: Vec<&str> = layers.iter().map(|layer| layer.name.as_str()).collect();
        assert_eq!(names, vec!["board-F_Cu.gbr", "board-F_Mask.gbr", "board.drl"]);
        assert!(layers.iter().all(|layer| layer.visible));
    }

    #[test]
    fn unreadable_file_keeps_role_without_geometry() {
        let layers = build_layer_set(&sample_files(), &VisibilityMap::new(), SolderMaskColor::Green);
        let drill = layers.last();
        assert!(drill.is_some(), "drill layer missing");
        if let Some(drill) = drill {
            assert_eq!(drill.role, LayerRole::Drill);
            assert!(drill.parsed.is_none());
            assert_eq!(drill.bounds(), None);
        }
    }

    #[test]
    fn invalid_utf8_bytes_are_unparsed() {
        let files = vec![UploadedFile::bytes("top.gtl", vec![0xff, 0xfe, 0x00])];
        let layers = build_layer_set(&files, &VisibilityMap::new(), SolderMaskColor::Green);
        assert_eq!(layers.len(), 1);
        assert!(layers.iter().all(|layer| layer.parsed.is_none()));
        assert!(matches!(
            files.first().map(UploadedFile::read_text),
            Some(Err(WorkspaceError::InvalidEncoding { .. }))
        ));
    }

    #[test]
    fn previous_visibility_is_carried_over() {
        let mut visibility = VisibilityMap::new();
        visibility.set("board-F_Mask.gbr", false);
        let layers = build_layer_set(&sample_files(), &visibility, SolderMaskColor::Green);
        let hidden: Vec<&str> = layers
            .iter()
            .filter(|layer| !layer.visible)
            .map(|layer| layer.name.as_str())
            .collect();
        assert_eq!(hidden, vec!["board-F_Mask.gbr"]);
    }

    #[test]
    fn mask_color_change_recolors_mask_layers() {
        let green = build_layer_set(&sample_files(), &VisibilityMap::new(), SolderMaskColor::Green);
        let red = build_layer_set(&sample_files(), &VisibilityMap::new(), SolderMaskColor::Red);
        let mask_colors: Vec<(Color, Color)> = green
            .iter()
            .zip(&red)
            .filter(|(layer, _)| layer.role == LayerRole::TopSolderMask)
            .map(|(g, r)| (g.color, r.color))
            .collect();
        assert_eq!(
            mask_colors,
            vec![(
                SolderMaskColor::Green.display_color(),
                SolderMaskColor::Red.display_color()
            )]
        );
    }

    #[test]
    fn rebuild_is_idempotent() {
        let files = sample_files();
        let first = build_layer_set(&files, &VisibilityMap::new(), SolderMaskColor::Blue);
        let second = build_layer_set(&files, &VisibilityMap::new(), SolderMaskColor::Blue);
        assert_eq!(first, second);
    }

    #[test]
    fn progress_is_monotonic_and_complete() {
        let mut seen = Vec::new();
        build_layer_set_with_progress(
            &sample_files(),
            &VisibilityMap::new(),
            SolderMaskColor::Green,
            |progress| seen.push(progress.completed),
        );
        assert_eq!(seen, vec![1, 2, 3]);
        assert!((Progress { completed: 3, total: 3 }.fraction() - 1.0).abs() < f64::EPSILON);
        assert!((Progress { completed: 0, total: 0 }.fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn retain_names_forgets_removed_files() {
        let mut visibility = VisibilityMap::new();
        visibility.set("a.gtl", false);
        visibility.set("b.gbl", false);
        visibility.retain_names(["a.gtl"]);
        assert_eq!(visibility.get("a.gtl"), Some(false));
        assert_eq!(visibility.get("b.gbl"), None);
    }

    #[test]
    fn summary_reports_parse_state() {
        let layers = build_layer_set(&sample_files(), &VisibilityMap::new(), SolderMaskColor::Green);
        let summaries: Vec<LayerSummary> = layers.iter().map(LayerSummary::from).collect();
        let copper = summaries.first();
        assert!(copper.is_some(), "copper summary missing");
        if let Some(copper) = copper {
            assert!(copper.parsed);
            assert_eq!(copper.command_count, 2);
            assert_eq!(copper.primitive_count, 1);
            assert_eq!(copper.aperture_count, 1);
            assert_eq!(
                copper.bounds,
                Some(BoundingBox::from_extent(5.0, 25.0, 5.0, 25.0))
            );
        }
        assert!(summaries.last().is_some_and(|drill| !drill.parsed));
    }
}
