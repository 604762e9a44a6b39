//! The reconciliation pipeline.
//!
//! Stages run in a fixed order over one [`AnnotationStore`], each enriching
//! the annotations in place:
//!
//! 1. [`associate`] links outer boxes to the inner box they enclose.
//! 2. [`select_references`] picks a reference annotator per image and class.
//! 3. [`compute_iou`] scores every box against every other annotator.
//! 4. [`locate_potential_mislabels`] flags likely class mix-ups.
//!
//! [`reconcile`] runs all of them and summarizes the run in a
//! [`ReconcileReport`]. Every stage can also be run on its own; each one
//! clears what it derived on a previous run before recomputing.

mod associate;
mod iou;
mod mislabel;
mod reference;
mod report;

pub use associate::{associate, nearest_enclosed_inner, AssociationSummary};
pub use iou::{best_iou, compute_iou, IouSummary};
pub use mislabel::{locate_potential_mislabels, MislabelThresholds, MislabelWarning};
pub use reference::select_references;
pub use report::{
    AgreementEntry, AnnotationDetail, AnnotatorEntry, ReconcileCounts, ReconcileDetail,
    ReconcileReport, ReferenceEntry,
};

use std::collections::BTreeMap;

use log::info;

use crate::error::AnnocompareError;
use crate::ir::{round2, ClassType};
use crate::store::AnnotationStore;

/// Reconciliation options.
#[derive(Clone, Debug)]
pub struct ReconcileOptions {
    pub thresholds: MislabelThresholds,
    /// Include the per-annotation detail section in the report.
    pub detail: bool,
    /// Maximum number of annotations listed in the detail section.
    pub max_items: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            thresholds: MislabelThresholds::default(),
            detail: false,
            max_items: 20,
        }
    }
}

/// Run every stage over `store` and report the outcome.
pub fn reconcile(
    store: &mut AnnotationStore,
    opts: &ReconcileOptions,
) -> Result<ReconcileReport, AnnocompareError> {
    opts.thresholds.validate()?;
    store.refresh()?;

    let association = associate(store)?;
    select_references(store)?;
    let iou = compute_iou(store)?;
    let mislabels = locate_potential_mislabels(store, &opts.thresholds)?;

    let report = build_report(store, association, iou, mislabels, opts);
    info!(
        "reconciled {} annotation(s) from {} annotator(s) over {} image(s)",
        report.counts.annotations, report.counts.annotators, report.counts.images
    );
    Ok(report)
}

fn build_report(
    store: &AnnotationStore,
    association: AssociationSummary,
    iou: IouSummary,
    mislabels: Vec<MislabelWarning>,
    opts: &ReconcileOptions,
) -> ReconcileReport {
    let stats = store.stats();

    let counts = ReconcileCounts {
        images: stats.image_list.len(),
        annotators: stats.annotator_list.len(),
        annotations: store.len(),
        outer: association.outer,
        inner: store
            .iter()
            .filter(|ann| ann.class_type == ClassType::Inner)
            .count(),
        associated: association.associated,
        unassociated: association.unassociated,
        iou_groups: iou.groups,
        iou_comparisons: iou.comparisons,
        mislabels: mislabels.len(),
    };

    let annotators = stats
        .annotator_list
        .iter()
        .map(|name| AnnotatorEntry {
            name: name.clone(),
            dir: stats.annotator_to_dir.get(name).cloned().unwrap_or_default(),
            annotations: store.by_annotator(name).len(),
        })
        .collect();

    let references = stats
        .reference_annotator
        .iter()
        .map(|(key, annotator)| ReferenceEntry {
            image: key.image.clone(),
            class_base: key.class_base.clone(),
            annotator: annotator.clone(),
        })
        .collect();

    let mut sums: BTreeMap<(&str, &str), (f64, usize)> = BTreeMap::new();
    for ann in store.iter() {
        for (other, score) in &ann.iou {
            let entry = sums
                .entry((ann.annotator.as_str(), other.as_str()))
                .or_insert((0.0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
    }
    let agreement = sums
        .into_iter()
        .map(|((annotator, other), (sum, boxes))| AgreementEntry {
            annotator: annotator.to_string(),
            other: other.to_string(),
            mean_iou: round2(sum / boxes as f64),
            boxes,
        })
        .collect();

    let detail = opts.detail.then(|| ReconcileDetail {
        annotations: store
            .iter()
            .take(opts.max_items)
            .map(|ann| AnnotationDetail {
                id: ann.id,
                image: ann.image.clone(),
                annotator: ann.annotator.clone(),
                label: ann.label(),
                bbox: ann.bbox,
                associated_inner: ann.associated_inner,
                iou: ann.iou.clone(),
                warning: ann.warning.clone(),
            })
            .collect(),
        total: store.len(),
        max_items: opts.max_items,
    });

    ReconcileReport {
        counts,
        annotators,
        references,
        agreement,
        mislabels,
        detail,
    }
}
