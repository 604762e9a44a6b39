//! Aggregate views over the store, rebuilt from scratch on every refresh.

use std::collections::{BTreeMap, BTreeSet};

use super::keys::ImageClassKey;
use crate::error::AnnocompareError;
use crate::ir::Annotation;
use crate::naming::name_annotators;

/// Run-level statistics derived from the loaded annotations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    /// Distinct image identifiers, sorted.
    pub image_list: Vec<String>,

    /// Distinct annotator names, sorted.
    pub annotator_list: Vec<String>,

    pub dir_to_annotator: BTreeMap<String, String>,

    pub annotator_to_dir: BTreeMap<String, String>,

    /// Sorted distinct class names present in each image.
    pub image_to_classes: BTreeMap<String, Vec<String>>,

    /// Sorted distinct annotators who labeled each image.
    pub image_to_annotators: BTreeMap<String, Vec<String>>,

    /// Annotator whose boxes are shown as ground truth for each
    /// `(image, class_base)`. Filled in by reference selection.
    pub reference_annotator: BTreeMap<ImageClassKey, String>,
}

impl Stats {
    /// Build stats for `annotations`, naming annotators from their directories.
    ///
    /// Only the annotator naming can fail; everything else is a pure
    /// aggregation. The reference map starts out empty.
    pub(crate) fn build(annotations: &[Annotation]) -> Result<Self, AnnocompareError> {
        let dir_to_annotator =
            name_annotators(annotations.iter().map(|ann| ann.source_dir.as_str()))?;
        let annotator_to_dir: BTreeMap<String, String> = dir_to_annotator
            .iter()
            .map(|(dir, name)| (name.clone(), dir.clone()))
            .collect();

        let mut images = BTreeSet::new();
        let mut classes: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut annotators: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for ann in annotations {
            images.insert(ann.image.clone());
            classes
                .entry(ann.image.clone())
                .or_default()
                .insert(ann.class_base.clone());
            if let Some(name) = dir_to_annotator.get(&ann.source_dir) {
                annotators
                    .entry(ann.image.clone())
                    .or_default()
                    .insert(name.clone());
            }
        }

        Ok(Self {
            image_list: images.into_iter().collect(),
            annotator_list: annotator_to_dir.keys().cloned().collect(),
            dir_to_annotator,
            annotator_to_dir,
            image_to_classes: into_sorted_lists(classes),
            image_to_annotators: into_sorted_lists(annotators),
            reference_annotator: BTreeMap::new(),
        })
    }

    /// Reference annotator for `(image, class_base)`, if one was selected.
    pub fn reference_annotator(&self, image: &str, class_base: &str) -> Option<&str> {
        self.reference_annotator
            .get(&ImageClassKey::new(image, class_base))
            .map(String::as_str)
    }
}

fn into_sorted_lists(map: BTreeMap<String, BTreeSet<String>>) -> BTreeMap<String, Vec<String>> {
    map.into_iter()
        .map(|(key, values)| (key, values.into_iter().collect()))
        .collect()
}
