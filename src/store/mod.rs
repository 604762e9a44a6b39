//! In-memory annotation store.
//!
//! The store owns every annotation of a run in an arena indexed by
//! [`AnnotationId`], plus indices by image, annotator and class and the
//! run-level [`Stats`]. Inserting marks the store dirty; [`AnnotationStore::refresh`]
//! then rebuilds the indices and stats from scratch and (re)assigns
//! annotator names.

mod keys;
pub mod query;
mod stats;

pub use keys::{GroupKey, ImageClassKey};
pub use query::{Constraint, Query};
pub use stats::Stats;

use std::collections::BTreeMap;

use log::debug;

use crate::error::AnnocompareError;
use crate::ir::{Annotation, AnnotationId, RawAnnotation};

#[derive(Clone, Debug, Default)]
struct Indices {
    by_image: BTreeMap<String, Vec<AnnotationId>>,
    by_annotator: BTreeMap<String, Vec<AnnotationId>>,
    by_class: BTreeMap<String, Vec<AnnotationId>>,
}

impl Indices {
    fn build(annotations: &[Annotation]) -> Self {
        let mut indices = Self::default();
        for ann in annotations {
            indices
                .by_image
                .entry(ann.image.clone())
                .or_default()
                .push(ann.id);
            indices
                .by_annotator
                .entry(ann.annotator.clone())
                .or_default()
                .push(ann.id);
            indices
                .by_class
                .entry(ann.class_base.clone())
                .or_default()
                .push(ann.id);
        }
        indices
    }
}

/// All annotations of a run, with derived indices and stats.
#[derive(Clone, Debug, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    indices: Indices,
    stats: Stats,
    dirty: bool,
}

impl AnnotationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `raw` annotations. The store is dirty until
    /// the first [`refresh`](Self::refresh).
    pub fn from_raw<I>(raw: I) -> Self
    where
        I: IntoIterator<Item = RawAnnotation>,
    {
        let mut store = Self::new();
        store.extend(raw);
        store
    }

    /// Adds one annotation and marks the store dirty.
    pub fn insert(&mut self, raw: RawAnnotation) -> AnnotationId {
        let id = AnnotationId::new(self.annotations.len());
        self.annotations.push(Annotation::from_raw(id, raw));
        self.dirty = true;
        id
    }

    /// Adds annotations and marks the store dirty.
    pub fn extend<I>(&mut self, raw: I)
    where
        I: IntoIterator<Item = RawAnnotation>,
    {
        for item in raw {
            self.insert(item);
        }
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// True if annotations were added since the last refresh.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rebuild annotator names, indices and stats if the store is dirty.
    ///
    /// Rebuilding clears the reference annotator map; reference selection
    /// has to run again afterwards.
    pub fn refresh(&mut self) -> Result<(), AnnocompareError> {
        if !self.dirty {
            return Ok(());
        }

        let stats = Stats::build(&self.annotations)?;
        for ann in &mut self.annotations {
            if let Some(name) = stats.dir_to_annotator.get(&ann.source_dir) {
                ann.annotator.clone_from(name);
            }
        }
        self.indices = Indices::build(&self.annotations);
        self.stats = stats;
        self.dirty = false;

        debug!(
            "store refreshed: {} annotation(s), {} image(s), {} annotator(s)",
            self.annotations.len(),
            self.stats.image_list.len(),
            self.stats.annotator_list.len()
        );
        Ok(())
    }

    /// Current stats. Stale while the store is dirty.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.annotations.iter()
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.get_mut(id.index())
    }

    pub(crate) fn annotations_mut(&mut self) -> &mut [Annotation] {
        &mut self.annotations
    }

    pub(crate) fn set_reference_annotators(&mut self, references: BTreeMap<ImageClassKey, String>) {
        self.stats.reference_annotator = references;
    }

    /// Resolve an outer annotation's link to its inner annotation.
    pub fn associated_inner(&self, annotation: &Annotation) -> Option<&Annotation> {
        annotation.associated_inner.and_then(|id| self.get(id))
    }

    /// Annotations of one image, in insertion order.
    pub fn by_image(&self, image: &str) -> Vec<&Annotation> {
        self.resolve(self.indices.by_image.get(image))
    }

    /// Annotations of one annotator, in insertion order.
    pub fn by_annotator(&self, annotator: &str) -> Vec<&Annotation> {
        self.resolve(self.indices.by_annotator.get(annotator))
    }

    /// Annotations of one class (both types), in insertion order.
    pub fn by_class(&self, class_base: &str) -> Vec<&Annotation> {
        self.resolve(self.indices.by_class.get(class_base))
    }

    /// Annotations matching every constraint of `query`.
    pub fn filter(&self, query: &Query) -> Vec<&Annotation> {
        query::filter(&self.annotations, query)
    }

    /// Annotations matching none of the constraints of `query`.
    pub fn rfilter(&self, query: &Query) -> Vec<&Annotation> {
        query::rfilter(&self.annotations, query)
    }

    /// Annotations grouped by `(image, class_base, class_type)`.
    pub fn groups(&self) -> BTreeMap<GroupKey<'_>, Vec<&Annotation>> {
        let mut groups: BTreeMap<GroupKey<'_>, Vec<&Annotation>> = BTreeMap::new();
        for ann in &self.annotations {
            groups.entry(GroupKey::of(ann)).or_default().push(ann);
        }
        groups
    }

    fn resolve(&self, ids: Option<&Vec<AnnotationId>>) -> Vec<&Annotation> {
        ids.map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }
}
