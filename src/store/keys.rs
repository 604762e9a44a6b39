//! Composite keys used to group annotations.

use std::fmt;

use crate::ir::{Annotation, ClassType};

/// An `(image, class_base)` pair; the unit a reference annotator is chosen for.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageClassKey {
    pub image: String,
    pub class_base: String,
}

impl ImageClassKey {
    pub fn new(image: impl Into<String>, class_base: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            class_base: class_base.into(),
        }
    }

    pub fn of(annotation: &Annotation) -> Self {
        Self::new(&annotation.image, &annotation.class_base)
    }
}

impl fmt::Display for ImageClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.image, self.class_base)
    }
}

/// An `(image, class_base, class_type)` triple. Boxes are only ever
/// compared against boxes with the same group key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey<'a> {
    pub image: &'a str,
    pub class_base: &'a str,
    pub class_type: ClassType,
}

impl<'a> GroupKey<'a> {
    pub fn of(annotation: &'a Annotation) -> Self {
        Self {
            image: &annotation.image,
            class_base: &annotation.class_base,
            class_type: annotation.class_type,
        }
    }
}
