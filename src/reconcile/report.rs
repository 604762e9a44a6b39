//! Reconciliation report types and text formatting.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::MislabelWarning;
use crate::ir::{AnnotationId, BBox};

/// Outcome of one reconciliation run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReconcileReport {
    pub counts: ReconcileCounts,
    /// One entry per annotator, in name order.
    pub annotators: Vec<AnnotatorEntry>,
    /// Reference annotator per image and class.
    pub references: Vec<ReferenceEntry>,
    /// Mean best-match IoU of each annotator against each other annotator.
    pub agreement: Vec<AgreementEntry>,
    pub mislabels: Vec<MislabelWarning>,
    /// Optional detail section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ReconcileDetail>,
}

/// Run-level counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileCounts {
    pub images: usize,
    pub annotators: usize,
    pub annotations: usize,
    pub outer: usize,
    pub inner: usize,
    pub associated: usize,
    pub unassociated: usize,
    pub iou_groups: usize,
    pub iou_comparisons: usize,
    pub mislabels: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnnotatorEntry {
    pub name: String,
    pub dir: String,
    pub annotations: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReferenceEntry {
    pub image: String,
    pub class_base: String,
    pub annotator: String,
}

/// How well `annotator`'s boxes are matched by `other`, averaged over
/// every box `annotator` drew.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgreementEntry {
    pub annotator: String,
    pub other: String,
    pub mean_iou: f64,
    pub boxes: usize,
}

/// Per-annotation listing, truncated to `max_items`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReconcileDetail {
    pub annotations: Vec<AnnotationDetail>,
    pub total: usize,
    pub max_items: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnnotationDetail {
    pub id: AnnotationId,
    pub image: String,
    pub annotator: String,
    pub label: String,
    pub bbox: BBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_inner: Option<AnnotationId>,
    pub iou: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ReconcileReport {
    pub fn has_mislabels(&self) -> bool {
        !self.mislabels.is_empty()
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counts;
        writeln!(
            f,
            "Images:      {} ({} annotator(s), {} annotation(s))",
            c.images, c.annotators, c.annotations
        )?;
        writeln!(
            f,
            "Boxes:       {} outer, {} inner ({} outer with an inner box, {} without)",
            c.outer, c.inner, c.associated, c.unassociated
        )?;
        writeln!(
            f,
            "IoU:         {} group(s), {} comparison(s)",
            c.iou_groups, c.iou_comparisons
        )?;
        writeln!(f, "Mislabels:   {}", c.mislabels)?;

        writeln!(f)?;
        writeln!(f, "Annotators:")?;
        if self.annotators.is_empty() {
            writeln!(f, "  - (none)")?;
        } else {
            for entry in &self.annotators {
                writeln!(
                    f,
                    "  - {} ({} annotation(s)) <- {}",
                    entry.name, entry.annotations, entry.dir
                )?;
            }
        }

        if !self.agreement.is_empty() {
            writeln!(f)?;
            writeln!(f, "Agreement (mean IoU):")?;
            for entry in &self.agreement {
                writeln!(
                    f,
                    "  - {} vs {}: {:.2} over {} box(es)",
                    entry.annotator, entry.other, entry.mean_iou, entry.boxes
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Potential mislabels:")?;
        if self.mislabels.is_empty() {
            writeln!(f, "  - (none)")?;
        } else {
            for warning in &self.mislabels {
                writeln!(
                    f,
                    "  - {} ann#{}: {} (same-class {:.2}, cross-class {:.2})",
                    warning.image,
                    warning.annotation_id,
                    warning.message,
                    warning.same_class_iou,
                    warning.cross_class_iou
                )?;
            }
        }

        if let Some(detail) = &self.detail {
            writeln!(f)?;
            writeln!(f, "References:")?;
            if self.references.is_empty() {
                writeln!(f, "  - (none)")?;
            } else {
                for entry in &self.references {
                    writeln!(
                        f,
                        "  - {} {}: {}",
                        entry.image, entry.class_base, entry.annotator
                    )?;
                }
            }

            writeln!(f)?;
            writeln!(
                f,
                "Annotations (showing {} of {}):",
                detail.annotations.len(),
                detail.total
            )?;
            if detail.annotations.is_empty() {
                writeln!(f, "  - (none)")?;
            }
            for item in &detail.annotations {
                write!(
                    f,
                    "  - {} ann#{} {} by {} {}",
                    item.image, item.id, item.label, item.annotator, item.bbox
                )?;
                if let Some(inner) = item.associated_inner {
                    write!(f, " inner=ann#{inner}")?;
                }
                if !item.iou.is_empty() {
                    let scores: Vec<String> = item
                        .iou
                        .iter()
                        .map(|(other, iou)| format!("{other}={iou:.2}"))
                        .collect();
                    write!(f, " iou[{}]", scores.join(", "))?;
                }
                if let Some(warning) = &item.warning {
                    write!(f, " WARNING: {warning}")?;
                }
                writeln!(f)?;
            }
        }

        Ok(())
    }
}
