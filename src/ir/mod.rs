//! Annotation records and the loaders that produce them.
//!
//! Boxes from every annotator share one representation: integer pixel
//! XYXY rectangles tagged with an image, a provenance directory and a
//! normalized `(class_base, class_type)` label.
//!
//! # Example
//!
//! ```
//! use annocompare::ir::{BBox, ClassType, RawAnnotation};
//!
//! let raw = RawAnnotation::new(
//!     "img1",
//!     "/data/alice/run1",
//!     "carrot",
//!     ClassType::Outer,
//!     BBox::from_xyxy(0, 0, 10, 10),
//! );
//! assert_eq!(raw.bbox.area(), 100);
//! ```

mod bbox;
mod ids;
pub mod io_voc_xml;
pub mod label;
mod model;

// Re-export core types for convenient access
pub use bbox::{round2, BBox};
pub use ids::AnnotationId;
pub use model::{normalize_dir, Annotation, ClassType, RawAnnotation};
