//! Flag outer boxes that probably carry the wrong class.
//!
//! A box that nobody else drew under its own class (low same-class IoU) but
//! that overlaps a box of a different class very well (high cross-class IoU)
//! was most likely given the wrong label by one of the two annotators.

use log::{info, warn};
use serde::Serialize;

use crate::error::AnnocompareError;
use crate::ir::{round2, Annotation, AnnotationId};
use crate::store::AnnotationStore;

/// Same-class and cross-class IoU thresholds of the mislabel heuristic.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MislabelThresholds {
    /// A box is suspicious when its best same-class IoU is below this.
    pub same_class: f64,
    /// A suspicious box is flagged when its best IoU against another
    /// class is above this.
    pub cross_class: f64,
}

impl Default for MislabelThresholds {
    fn default() -> Self {
        Self {
            same_class: 0.2,
            cross_class: 0.5,
        }
    }
}

impl MislabelThresholds {
    /// Check both thresholds lie within `[0, 1]`.
    pub fn validate(&self) -> Result<(), AnnocompareError> {
        for (name, value) in [("same-class", self.same_class), ("cross-class", self.cross_class)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnnocompareError::InvalidThreshold { name, value });
            }
        }
        Ok(())
    }
}

/// One flagged box and the box it conflicts with.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MislabelWarning {
    pub image: String,
    pub annotation_id: AnnotationId,
    pub annotator: String,
    pub class_base: String,
    pub same_class_iou: f64,
    pub conflicting_id: AnnotationId,
    pub conflicting_annotator: String,
    pub conflicting_class: String,
    pub cross_class_iou: f64,
    pub message: String,
}

/// Flag outer annotations with low same-class and high cross-class
/// agreement, setting their `warning` text.
///
/// Expects IoU scores to be computed already: an annotation without
/// scores counts as having a same-class IoU of 0. Cross-class candidates
/// are the outer boxes of every annotator, the annotation's own included,
/// in the same image with a different `class_base`. Warnings from a
/// previous run are cleared first.
pub fn locate_potential_mislabels(
    store: &mut AnnotationStore,
    thresholds: &MislabelThresholds,
) -> Result<Vec<MislabelWarning>, AnnocompareError> {
    thresholds.validate()?;
    store.refresh()?;

    let warnings: Vec<MislabelWarning> = {
        let mut warnings = Vec::new();
        for image in &store.stats().image_list {
            let outers: Vec<&Annotation> = store
                .by_image(image)
                .into_iter()
                .filter(|ann| ann.is_outer())
                .collect();

            for ann in &outers {
                if let Some(warning) = check_annotation(ann, &outers, thresholds) {
                    warnings.push(warning);
                }
            }
        }
        warnings
    };

    for ann in store.annotations_mut() {
        ann.warning = None;
    }
    for warning in &warnings {
        warn!("{}: {}", warning.image, warning.message);
        if let Some(ann) = store.get_mut(warning.annotation_id) {
            ann.warning = Some(warning.message.clone());
        }
    }

    info!("flagged {} potential mislabel(s)", warnings.len());
    Ok(warnings)
}

fn check_annotation(
    ann: &Annotation,
    outers: &[&Annotation],
    thresholds: &MislabelThresholds,
) -> Option<MislabelWarning> {
    let same_class_iou = ann.max_iou();
    if same_class_iou >= thresholds.same_class {
        return None;
    }

    let mut best: Option<(f64, &Annotation)> = None;
    for &other in outers.iter().filter(|other| other.class_base != ann.class_base) {
        let iou = round2(ann.bbox.iou(&other.bbox));
        if best.map_or(true, |(best_iou, _)| iou > best_iou) {
            best = Some((iou, other));
        }
    }

    let (cross_class_iou, other) = best?;
    if cross_class_iou <= thresholds.cross_class {
        return None;
    }

    Some(MislabelWarning {
        image: ann.image.clone(),
        annotation_id: ann.id,
        annotator: ann.annotator.clone(),
        class_base: ann.class_base.clone(),
        same_class_iou,
        conflicting_id: other.id,
        conflicting_annotator: other.annotator.clone(),
        conflicting_class: other.class_base.clone(),
        cross_class_iou,
        message: format!(
            "{} by {} vs {} by {}",
            ann.class_base, ann.annotator, other.class_base, other.annotator
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BBox, ClassType, RawAnnotation};
    use crate::reconcile::compute_iou;

    fn outer(dir: &str, class_base: &str, bbox: BBox) -> RawAnnotation {
        RawAnnotation::new("img1", dir, class_base, ClassType::Outer, bbox)
    }

    /// alice calls it a weed, bob calls a near-identical box a carrot.
    fn conflicting_store() -> AnnotationStore {
        AnnotationStore::from_raw(vec![
            outer("alice", "weed", BBox::from_xyxy(0, 0, 10, 10)),
            outer("bob", "carrot", BBox::from_xyxy(1, 1, 10, 10)),
        ])
    }

    #[test]
    fn flags_low_same_class_high_cross_class() {
        let mut store = conflicting_store();
        compute_iou(&mut store).unwrap();
        let warnings =
            locate_potential_mislabels(&mut store, &MislabelThresholds::default()).unwrap();

        assert_eq!(warnings.len(), 2);
        let weed = &store.annotations()[0];
        assert_eq!(
            weed.warning.as_deref(),
            Some("weed by alice vs carrot by bob")
        );
        assert_eq!(warnings[0].conflicting_class, "carrot");
        assert_eq!(warnings[0].cross_class_iou, 0.81);
    }

    #[test]
    fn good_same_class_agreement_is_not_flagged() {
        let mut store = conflicting_store();
        store.insert(outer("carol", "weed", BBox::from_xyxy(0, 0, 10, 10)));
        compute_iou(&mut store).unwrap();
        let warnings =
            locate_potential_mislabels(&mut store, &MislabelThresholds::default()).unwrap();

        assert!(store.annotations()[0].warning.is_none());
        assert!(store.annotations()[2].warning.is_none());
        // bob's carrot is still the odd one out
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].annotator, "bob");
    }

    #[test]
    fn weak_cross_class_overlap_is_not_flagged() {
        let mut store = AnnotationStore::from_raw(vec![
            outer("alice", "weed", BBox::from_xyxy(0, 0, 10, 10)),
            outer("bob", "carrot", BBox::from_xyxy(5, 5, 15, 15)),
        ]);
        compute_iou(&mut store).unwrap();
        let warnings =
            locate_potential_mislabels(&mut store, &MislabelThresholds::default()).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn inner_boxes_are_never_flagged() {
        let mut store = AnnotationStore::from_raw(vec![
            RawAnnotation::new(
                "img1",
                "alice",
                "weed",
                ClassType::Inner,
                BBox::from_xyxy(0, 0, 10, 10),
            ),
            RawAnnotation::new(
                "img1",
                "bob",
                "carrot",
                ClassType::Inner,
                BBox::from_xyxy(0, 0, 10, 10),
            ),
        ]);
        compute_iou(&mut store).unwrap();
        let warnings =
            locate_potential_mislabels(&mut store, &MislabelThresholds::default()).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn rerun_clears_stale_warnings() {
        let mut store = conflicting_store();
        compute_iou(&mut store).unwrap();
        locate_potential_mislabels(&mut store, &MislabelThresholds::default()).unwrap();

        let strict = MislabelThresholds {
            same_class: 0.0,
            cross_class: 0.5,
        };
        let warnings = locate_potential_mislabels(&mut store, &strict).unwrap();
        assert!(warnings.is_empty());
        assert!(store.iter().all(|ann| ann.warning.is_none()));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut store = conflicting_store();
        let bad = MislabelThresholds {
            same_class: 1.5,
            cross_class: 0.5,
        };
        let err = locate_potential_mislabels(&mut store, &bad).unwrap_err();
        assert!(matches!(
            err,
            AnnocompareError::InvalidThreshold {
                name: "same-class",
                ..
            }
        ));
    }
}
