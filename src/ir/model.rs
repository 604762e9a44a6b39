//! Annotation records shared by every reconciliation stage.
//!
//! A [`RawAnnotation`] is what a loader hands over: one labeled box with its
//! provenance. Once inserted into the store it becomes an [`Annotation`],
//! which the pipeline enriches in place with the annotator name, the
//! associated inner box, per-annotator IoU scores and a mislabel warning.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use super::bbox::BBox;
use super::ids::AnnotationId;

/// Whether a box outlines the whole object or its stem/meristem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassType {
    Outer,
    Inner,
}

impl ClassType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassType::Outer => "outer",
            ClassType::Inner => "inner",
        }
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labeled box as produced by a loader, before any enrichment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawAnnotation {
    /// Image identifier (file stem), shared by every annotator's file.
    pub image: String,

    /// Directory of the annotation file; identifies the annotator.
    pub source_dir: String,

    /// The annotation file the box was read from.
    pub source_file: PathBuf,

    /// Normalized class name, e.g. `carrot`.
    pub class_base: String,

    pub class_type: ClassType,

    pub difficult: bool,

    pub bbox: BBox,
}

impl RawAnnotation {
    /// Creates a record with the given provenance; `source_file` defaults
    /// to `<source_dir>/<image>.xml`.
    pub fn new(
        image: impl Into<String>,
        source_dir: impl Into<String>,
        class_base: impl Into<String>,
        class_type: ClassType,
        bbox: BBox,
    ) -> Self {
        let image = image.into();
        let source_dir = source_dir.into();
        let source_file = PathBuf::from(&source_dir).join(format!("{image}.xml"));
        Self {
            image,
            source_dir,
            source_file,
            class_base: class_base.into(),
            class_type,
            difficult: false,
            bbox,
        }
    }

    /// Sets the source file.
    pub fn with_source_file(mut self, source_file: impl Into<PathBuf>) -> Self {
        self.source_file = source_file.into();
        self
    }

    /// Marks the box as difficult.
    pub fn with_difficult(mut self, difficult: bool) -> Self {
        self.difficult = difficult;
        self
    }
}

/// An annotation held by the store, with the fields derived by the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Annotation {
    pub id: AnnotationId,

    pub image: String,

    /// Directory of the annotation file, with `/` separators.
    pub source_dir: String,

    pub source_file: PathBuf,

    /// Short annotator name; empty until the store's stats are built.
    pub annotator: String,

    pub class_base: String,

    pub class_type: ClassType,

    pub difficult: bool,

    pub bbox: BBox,

    /// Nearest enclosed inner box of the same annotator, image and class.
    /// Only ever set on outer annotations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_inner: Option<AnnotationId>,

    /// Best-match IoU against each other annotator's boxes of the same
    /// image, class and type.
    pub iou: BTreeMap<String, f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Annotation {
    pub(crate) fn from_raw(id: AnnotationId, raw: RawAnnotation) -> Self {
        Self {
            id,
            image: raw.image,
            source_dir: normalize_dir(&raw.source_dir),
            source_file: raw.source_file,
            annotator: String::new(),
            class_base: raw.class_base,
            class_type: raw.class_type,
            difficult: raw.difficult,
            bbox: raw.bbox,
            associated_inner: None,
            iou: BTreeMap::new(),
            warning: None,
        }
    }

    #[inline]
    pub fn has_associated_inner(&self) -> bool {
        self.associated_inner.is_some()
    }

    #[inline]
    pub fn is_outer(&self) -> bool {
        self.class_type == ClassType::Outer
    }

    /// Highest IoU reached against any other annotator, or 0 when there
    /// are no other annotators.
    pub fn max_iou(&self) -> f64 {
        self.iou.values().copied().fold(0.0, f64::max)
    }

    /// Label in the `<class>_<type>` form used by annotation files.
    pub fn label(&self) -> String {
        format!("{}_{}", self.class_base, self.class_type)
    }
}

/// Normalize a directory path to `/` separators without a trailing slash.
pub fn normalize_dir(dir: &str) -> String {
    let dir = dir.replace('\\', "/");
    let trimmed = dir.trim_end_matches('/');
    if trimmed.is_empty() && !dir.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
