#![allow(dead_code)]

use annocompare::ir::{BBox, ClassType, RawAnnotation};
use annocompare::store::AnnotationStore;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const IMAGES: &[&str] = &["img1", "img2", "img3"];
pub const CLASSES: &[&str] = &["carrot", "weed", "spinach"];
pub const ANNOTATOR_DIRS: &[&str] = &[
    "/data/alice/run1",
    "/data/bob/run1",
    "/data/carol/run2",
    "/data/dave/run1",
];

const DIR_SEGMENTS: &[&str] = &["a", "b", "run1", "run2", "alice", "bob"];

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Ordered boxes inside a `size` x `size` canvas; zero width or height is allowed.
pub fn arb_bbox_within(size: i64) -> BoxedStrategy<BBox> {
    (0..=size, 0..=size, 0..=size, 0..=size)
        .prop_map(|(x1, y1, x2, y2)| {
            BBox::from_xyxy(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
        })
        .boxed()
}

/// Boxes with arbitrary corner order, degenerate ones included.
pub fn arb_any_bbox() -> BoxedStrategy<BBox> {
    (-50i64..150, -50i64..150, -50i64..150, -50i64..150)
        .prop_map(|(x1, y1, x2, y2)| BBox::from_xyxy(x1, y1, x2, y2))
        .boxed()
}

pub fn arb_raw_annotation() -> BoxedStrategy<RawAnnotation> {
    (
        prop::sample::select(IMAGES),
        prop::sample::select(ANNOTATOR_DIRS),
        prop::sample::select(CLASSES),
        prop::bool::weighted(0.7),
        arb_bbox_within(100),
    )
        .prop_map(|(image, dir, class_base, is_outer, bbox)| {
            let class_type = if is_outer {
                ClassType::Outer
            } else {
                ClassType::Inner
            };
            RawAnnotation::new(image, dir, class_base, class_type, bbox)
        })
        .boxed()
}

pub fn arb_raw_annotations(max_anns: usize) -> BoxedStrategy<Vec<RawAnnotation>> {
    proptest::collection::vec(arb_raw_annotation(), 0..=max_anns).boxed()
}

pub fn arb_store(max_anns: usize) -> BoxedStrategy<AnnotationStore> {
    arb_raw_annotations(max_anns)
        .prop_map(AnnotationStore::from_raw)
        .boxed()
}

/// Distinct directory paths of one to four segments drawn from a small
/// alphabet, so shared tails are common.
pub fn arb_dirs(max_dirs: usize) -> BoxedStrategy<Vec<String>> {
    let segment = prop::sample::select(DIR_SEGMENTS);
    let dir = proptest::collection::vec(segment, 1..=4).prop_map(|parts| parts.join("/"));
    proptest::collection::btree_set(dir, 1..=max_dirs)
        .prop_map(|dirs| dirs.into_iter().collect())
        .boxed()
}
