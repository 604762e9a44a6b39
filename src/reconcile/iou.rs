//! Pairwise best-match IoU between annotators.

use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use log::{debug, info};
use serde::Serialize;

use crate::error::AnnocompareError;
use crate::ir::{round2, Annotation, AnnotationId, BBox};
use crate::store::AnnotationStore;

/// Counts from one IoU pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IouSummary {
    /// Number of `(image, class_base, class_type)` groups.
    pub groups: usize,
    /// Number of annotations scored.
    pub scored: usize,
    /// Number of box pairs whose IoU was evaluated.
    pub comparisons: usize,
}

/// Score every annotation against every other annotator.
///
/// `iou[U]` is the best IoU between the annotation and any box annotator
/// `U` drew in the same `(image, class_base, class_type)` group, rounded to
/// two decimals, or 0 if `U` drew none there. Every annotator of the run
/// gets an entry except the annotation's own.
///
/// Groups are independent; with the `parallel` feature they are scored on
/// the rayon pool and the results written back after the join.
pub fn compute_iou(store: &mut AnnotationStore) -> Result<IouSummary, AnnocompareError> {
    store.refresh()?;

    let annotators = store.stats().annotator_list.clone();
    let (scores, summary) = {
        let groups: Vec<Vec<&Annotation>> = store.groups().into_values().collect();

        #[cfg(feature = "parallel")]
        let scored: Vec<GroupScores> = groups
            .par_iter()
            .map(|group| score_group(group, &annotators))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let scored: Vec<GroupScores> = groups
            .iter()
            .map(|group| score_group(group, &annotators))
            .collect();

        let mut summary = IouSummary {
            groups: groups.len(),
            ..Default::default()
        };
        let mut scores = Vec::with_capacity(store.len());
        for group in scored {
            summary.comparisons += group.comparisons;
            scores.extend(group.scores);
        }
        summary.scored = scores.len();
        (scores, summary)
    };

    for (id, iou) in scores {
        if let Some(ann) = store.get_mut(id) {
            ann.iou = iou;
        }
    }

    info!(
        "computed IoU for {} annotation(s) in {} group(s) ({} comparisons)",
        summary.scored, summary.groups, summary.comparisons
    );
    Ok(summary)
}

/// Best IoU between `bbox` and any of `candidates`; 0 for no candidates.
pub fn best_iou<'a, I>(bbox: &BBox, candidates: I) -> f64
where
    I: IntoIterator<Item = &'a BBox>,
{
    candidates
        .into_iter()
        .map(|other| bbox.iou(other))
        .fold(0.0, f64::max)
}

struct GroupScores {
    scores: Vec<(AnnotationId, BTreeMap<String, f64>)>,
    comparisons: usize,
}

fn score_group(group: &[&Annotation], annotators: &[String]) -> GroupScores {
    let mut by_annotator: BTreeMap<&str, Vec<&BBox>> = BTreeMap::new();
    for ann in group {
        by_annotator
            .entry(ann.annotator.as_str())
            .or_default()
            .push(&ann.bbox);
    }

    let mut comparisons = 0;
    let scores = group
        .iter()
        .map(|ann| {
            let iou: BTreeMap<String, f64> = annotators
                .iter()
                .filter(|other| **other != ann.annotator)
                .map(|other| {
                    let candidates = by_annotator
                        .get(other.as_str())
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    comparisons += candidates.len();
                    let score = round2(best_iou(&ann.bbox, candidates.iter().copied()));
                    (other.clone(), score)
                })
                .collect();
            (ann.id, iou)
        })
        .collect();

    if let Some(first) = group.first() {
        debug!(
            "scored {} box(es) for {} {} ({} annotator(s))",
            group.len(),
            first.image,
            first.label(),
            by_annotator.len()
        );
    }

    GroupScores {
        scores,
        comparisons,
    }
}
