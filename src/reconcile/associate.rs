//! Link each outer box to the inner (stem) box it encloses.

use std::collections::HashMap;

use log::{debug, info};
use serde::Serialize;

use crate::error::AnnocompareError;
use crate::ir::{Annotation, AnnotationId, ClassType};
use crate::store::AnnotationStore;

/// Counts from one association pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AssociationSummary {
    pub outer: usize,
    pub associated: usize,
    pub unassociated: usize,
}

/// For every outer annotation, link the nearest inner annotation of the
/// same annotator, image and class whose center lies inside the outer box.
///
/// Distance is measured between box centers. Exact ties go to the inner
/// box with the smaller `(xmin, ymin, xmax, ymax)`, then the smaller id.
/// Outer boxes without a candidate are left unlinked.
pub fn associate(store: &mut AnnotationStore) -> Result<AssociationSummary, AnnocompareError> {
    store.refresh()?;

    let links: Vec<(AnnotationId, Option<AnnotationId>)> = {
        let mut inner_groups: HashMap<(&str, &str, &str), Vec<&Annotation>> = HashMap::new();
        for ann in store.iter().filter(|ann| ann.class_type == ClassType::Inner) {
            inner_groups
                .entry((
                    ann.source_dir.as_str(),
                    ann.image.as_str(),
                    ann.class_base.as_str(),
                ))
                .or_default()
                .push(ann);
        }

        store
            .iter()
            .filter(|ann| ann.is_outer())
            .map(|outer| {
                let key = (
                    outer.source_dir.as_str(),
                    outer.image.as_str(),
                    outer.class_base.as_str(),
                );
                let candidates = inner_groups.get(&key).map(Vec::as_slice).unwrap_or(&[]);
                (outer.id, nearest_enclosed_inner(outer, candidates))
            })
            .collect()
    };

    for ann in store.annotations_mut() {
        ann.associated_inner = None;
    }

    let mut summary = AssociationSummary::default();
    for (outer_id, inner_id) in links {
        summary.outer += 1;
        match inner_id {
            Some(_) => summary.associated += 1,
            None => summary.unassociated += 1,
        }
        if let Some(outer) = store.get_mut(outer_id) {
            if inner_id.is_none() {
                debug!(
                    "no inner box found for {} {} in {}",
                    outer.label(),
                    outer.bbox,
                    outer.image
                );
            }
            outer.associated_inner = inner_id;
        }
    }

    info!(
        "associated {} of {} outer box(es) with an inner box",
        summary.associated, summary.outer
    );
    Ok(summary)
}

/// Nearest candidate whose center lies within `outer`, bounds inclusive.
pub fn nearest_enclosed_inner(
    outer: &Annotation,
    candidates: &[&Annotation],
) -> Option<AnnotationId> {
    let mut best: Option<(f64, &Annotation)> = None;

    for &inner in candidates {
        let (cx, cy) = inner.bbox.center();
        if !outer.bbox.contains_point(cx, cy) {
            continue;
        }

        let dist = outer.bbox.center_distance(&inner.bbox);
        let closer = match best {
            None => true,
            Some((best_dist, current)) => {
                dist < best_dist
                    || (dist == best_dist && (inner.bbox, inner.id) < (current.bbox, current.id))
            }
        };
        if closer {
            best = Some((dist, inner));
        }
    }

    best.map(|(_, inner)| inner.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BBox, RawAnnotation};

    fn raw(dir: &str, class_base: &str, class_type: ClassType, bbox: BBox) -> RawAnnotation {
        RawAnnotation::new("img1", dir, class_base, class_type, bbox)
    }

    #[test]
    fn links_enclosed_inner() {
        let mut store = AnnotationStore::from_raw(vec![
            raw("a", "carrot", ClassType::Outer, BBox::from_xyxy(0, 0, 10, 10)),
            raw("a", "carrot", ClassType::Inner, BBox::from_xyxy(4, 4, 6, 6)),
        ]);
        let summary = associate(&mut store).unwrap();

        assert_eq!(summary.associated, 1);
        let outer = store.get(AnnotationId(0)).unwrap();
        assert!(outer.has_associated_inner());
        assert_eq!(outer.associated_inner, Some(AnnotationId(1)));
        assert_eq!(store.associated_inner(outer).unwrap().class_type, ClassType::Inner);
    }

    #[test]
    fn picks_nearest_center() {
        let mut store = AnnotationStore::from_raw(vec![
            raw("a", "carrot", ClassType::Outer, BBox::from_xyxy(0, 0, 20, 20)),
            raw("a", "carrot", ClassType::Inner, BBox::from_xyxy(1, 1, 3, 3)),
            raw("a", "carrot", ClassType::Inner, BBox::from_xyxy(9, 9, 12, 12)),
        ]);
        associate(&mut store).unwrap();
        assert_eq!(store.annotations()[0].associated_inner, Some(AnnotationId(2)));
    }

    #[test]
    fn ignores_other_annotators_classes_and_outside_centers() {
        let mut store = AnnotationStore::from_raw(vec![
            raw("a", "carrot", ClassType::Outer, BBox::from_xyxy(0, 0, 10, 10)),
            raw("b", "carrot", ClassType::Inner, BBox::from_xyxy(4, 4, 6, 6)),
            raw("a", "weed", ClassType::Inner, BBox::from_xyxy(4, 4, 6, 6)),
            raw("a", "carrot", ClassType::Inner, BBox::from_xyxy(20, 20, 24, 24)),
        ]);
        let summary = associate(&mut store).unwrap();
        assert_eq!(summary.unassociated, 1);
        assert!(!store.annotations()[0].has_associated_inner());
    }

    #[test]
    fn equal_distance_tie_prefers_smaller_bbox() {
        let mut store = AnnotationStore::from_raw(vec![
            raw("a", "carrot", ClassType::Outer, BBox::from_xyxy(0, 0, 20, 20)),
            raw("a", "carrot", ClassType::Inner, BBox::from_xyxy(12, 9, 14, 11)),
            raw("a", "carrot", ClassType::Inner, BBox::from_xyxy(6, 9, 8, 11)),
        ]);
        associate(&mut store).unwrap();
        assert_eq!(store.annotations()[0].associated_inner, Some(AnnotationId(2)));
    }

    #[test]
    fn center_on_the_edge_counts_as_inside() {
        let mut store = AnnotationStore::from_raw(vec![
            raw("a", "carrot", ClassType::Outer, BBox::from_xyxy(0, 0, 10, 10)),
            raw("a", "carrot", ClassType::Inner, BBox::from_xyxy(8, 8, 12, 12)),
        ]);
        associate(&mut store).unwrap();
        assert!(store.annotations()[0].has_associated_inner());
    }

    #[test]
    fn empty_store_is_a_no_op() {
        let mut store = AnnotationStore::new();
        assert_eq!(associate(&mut store).unwrap(), AssociationSummary::default());
    }
}
