//! Typed field queries over annotations.
//!
//! A [`Query`] is a list of field constraints combined with AND. It answers
//! two questions about an annotation: does it match every constraint
//! ([`Query::matches`]), and does it match none of them
//! ([`Query::excludes`]).

use std::collections::BTreeSet;

use crate::ir::{Annotation, ClassType};

/// One `field == value` constraint.
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    Image(String),
    SourceDir(String),
    Annotator(String),
    ClassBase(String),
    ClassType(ClassType),
    Difficult(bool),
}

impl Constraint {
    /// Returns true if `annotation`'s field equals the constraint value.
    pub fn holds(&self, annotation: &Annotation) -> bool {
        match self {
            Constraint::Image(image) => annotation.image == *image,
            Constraint::SourceDir(dir) => annotation.source_dir == *dir,
            Constraint::Annotator(name) => annotation.annotator == *name,
            Constraint::ClassBase(class_base) => annotation.class_base == *class_base,
            Constraint::ClassType(class_type) => annotation.class_type == *class_type,
            Constraint::Difficult(difficult) => annotation.difficult == *difficult,
        }
    }
}

/// An AND-composed set of field constraints.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    constraints: Vec<Constraint>,
}

impl Query {
    /// A query with no constraints; it matches every annotation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constraint.
    pub fn and(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn image(self, image: impl Into<String>) -> Self {
        self.and(Constraint::Image(image.into()))
    }

    pub fn source_dir(self, dir: impl Into<String>) -> Self {
        self.and(Constraint::SourceDir(dir.into()))
    }

    pub fn annotator(self, name: impl Into<String>) -> Self {
        self.and(Constraint::Annotator(name.into()))
    }

    pub fn class_base(self, class_base: impl Into<String>) -> Self {
        self.and(Constraint::ClassBase(class_base.into()))
    }

    pub fn class_type(self, class_type: ClassType) -> Self {
        self.and(Constraint::ClassType(class_type))
    }

    pub fn difficult(self, difficult: bool) -> Self {
        self.and(Constraint::Difficult(difficult))
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// True if every constraint holds.
    pub fn matches(&self, annotation: &Annotation) -> bool {
        self.constraints.iter().all(|c| c.holds(annotation))
    }

    /// True if no constraint holds, i.e. every constrained field differs.
    pub fn excludes(&self, annotation: &Annotation) -> bool {
        self.constraints.iter().all(|c| !c.holds(annotation))
    }
}

/// Annotations matching every constraint of `query`.
pub fn filter<'a, I>(annotations: I, query: &Query) -> Vec<&'a Annotation>
where
    I: IntoIterator<Item = &'a Annotation>,
{
    annotations
        .into_iter()
        .filter(|ann| query.matches(ann))
        .collect()
}

/// Annotations matching none of the constraints of `query`.
pub fn rfilter<'a, I>(annotations: I, query: &Query) -> Vec<&'a Annotation>
where
    I: IntoIterator<Item = &'a Annotation>,
{
    annotations
        .into_iter()
        .filter(|ann| query.excludes(ann))
        .collect()
}

/// Annotations whose annotator is in `visible`.
pub fn filter_visible_annotators<'a, I>(
    annotations: I,
    visible: &BTreeSet<String>,
) -> Vec<&'a Annotation>
where
    I: IntoIterator<Item = &'a Annotation>,
{
    annotations
        .into_iter()
        .filter(|ann| visible.contains(&ann.annotator))
        .collect()
}

/// Keep the reference annotator's boxes plus every other box that agrees
/// with the reference less than `threshold`, i.e. the disagreements.
///
/// A box with no score against the reference counts as 0.
pub fn filter_by_iou<'a, I>(annotations: I, reference: &str, threshold: f64) -> Vec<&'a Annotation>
where
    I: IntoIterator<Item = &'a Annotation>,
{
    annotations
        .into_iter()
        .filter(|ann| {
            ann.annotator == reference
                || ann.iou.get(reference).copied().unwrap_or(0.0) < threshold
        })
        .collect()
}
