//! Reference annotator selection.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::error::AnnocompareError;
use crate::store::{AnnotationStore, ImageClassKey};

/// Pick, for every `(image, class_base)`, the annotator with the most boxes
/// (outer and inner together). Ties go to the annotator whose name sorts
/// first. Returns the number of references selected.
///
/// The result only decides whose boxes are displayed as ground truth; IoU
/// scores are symmetric and do not depend on it.
pub fn select_references(store: &mut AnnotationStore) -> Result<usize, AnnocompareError> {
    store.refresh()?;

    let references: BTreeMap<ImageClassKey, String> = {
        let mut counts: BTreeMap<ImageClassKey, BTreeMap<&str, usize>> = BTreeMap::new();
        for ann in store.iter() {
            *counts
                .entry(ImageClassKey::of(ann))
                .or_default()
                .entry(ann.annotator.as_str())
                .or_insert(0) += 1;
        }

        counts
            .into_iter()
            .filter_map(|(key, per_annotator)| {
                let reference = most_annotations(&per_annotator)?;
                debug!("reference for {key}: {reference} ({per_annotator:?})");
                Some((key, reference.to_string()))
            })
            .collect()
    };

    let selected = references.len();
    store.set_reference_annotators(references);
    info!("selected reference annotators for {selected} image/class pair(s)");
    Ok(selected)
}

/// The annotator with the strictly greatest count; iteration is in name
/// order, so the first name wins ties.
fn most_annotations<'a>(counts: &BTreeMap<&'a str, usize>) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for (&annotator, &count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((annotator, count));
        }
    }
    best.map(|(annotator, _)| annotator)
}
