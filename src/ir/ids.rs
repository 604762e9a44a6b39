//! Newtype IDs for annotations held in an [`AnnotationStore`](crate::store::AnnotationStore).
//!
//! An id is the annotation's position in the store's arena. Links between
//! annotations (outer box to its inner box) are stored as ids rather than
//! references, so they stay valid while the store is mutated in place.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for an annotation in the store.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub usize);

impl AnnotationId {
    /// Creates a new AnnotationId.
    #[inline]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for AnnotationId {
    fn from(index: usize) -> Self {
        AnnotationId::new(index)
    }
}

impl fmt::Debug for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnnotationId({})", self.0)
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
