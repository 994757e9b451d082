//! Layer classification and the per-file layer set.

pub mod classify;
pub mod set;

pub use classify::{classify, classify_with, Classification, Color, LayerRole};
pub use set::{
    build_layer_set, build_layer_set_with_progress, FileContent, LayerInfo, LayerSummary,
    Progress, UploadedFile, VisibilityMap,
};
