use std::fs;
use std::path::{Path, PathBuf};

use annocompare::ir::io_voc_xml::{load_annotation_dirs, LoadOptions};
use annocompare::ir::{BBox, ClassType};
use annocompare::reconcile::{reconcile, ReconcileOptions};
use annocompare::store::AnnotationStore;
use annocompare::AnnocompareError;

fn voc_xml(objects: &[(&str, [i64; 4])]) -> String {
    let mut xml = String::from("<annotation>\n  <filename>x.png</filename>\n");
    for (name, [xmin, ymin, xmax, ymax]) in objects {
        xml.push_str(&format!("  <object>\n    <name>{name}</name>\n    <bndbox>\n"));
        xml.push_str(&format!("      <xmin>{xmin}</xmin>\n      <ymin>{ymin}</ymin>\n"));
        xml.push_str(&format!("      <xmax>{xmax}</xmax>\n      <ymax>{ymax}</ymax>\n"));
        xml.push_str("    </bndbox>\n  </object>\n");
    }
    xml.push_str("</annotation>\n");
    xml
}

fn write_file(dir: &Path, name: &str, contents: &str) {
    fs::create_dir_all(dir).expect("create dir");
    fs::write(dir.join(name), contents).expect("write file");
}

#[test]
fn loads_nested_annotator_directories() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let alice = temp.path().join("alice").join("session1");
    let bob = temp.path().join("bob").join("session1");
    write_file(
        &alice,
        "plot7.xml",
        &voc_xml(&[("carrot_outer", [0, 0, 10, 10]), ("carrot_stem", [4, 4, 6, 6])]),
    );
    write_file(&bob, "plot7.xml", &voc_xml(&[("Carrot-Outer", [1, 1, 10, 10])]));
    write_file(&bob, "notes.txt", "not an annotation");

    let raw = load_annotation_dirs(&[temp.path().to_path_buf()], &LoadOptions::default())
        .expect("load");
    assert_eq!(raw.len(), 3);
    assert!(raw.iter().all(|ann| ann.image == "plot7"));
    assert_eq!(raw[1].class_type, ClassType::Inner);
    assert_eq!(raw[2].class_base, "carrot");
    assert_eq!(raw[2].bbox, BBox::from_xyxy(1, 1, 10, 10));
    assert_eq!(raw[2].source_file, bob.join("plot7.xml"));

    let mut store = AnnotationStore::from_raw(raw);
    let report = reconcile(&mut store, &ReconcileOptions::default()).expect("reconcile");
    let names: Vec<&str> = report.annotators.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["alice_session1", "bob_session1"]);
    assert_eq!(report.counts.associated, 1);
}

#[test]
fn several_roots_are_merged_by_stem() {
    let first = tempfile::tempdir().expect("create temp dir");
    let second = tempfile::tempdir().expect("create temp dir");
    write_file(first.path(), "a.xml", &voc_xml(&[("weed_outer", [0, 0, 5, 5])]));
    write_file(first.path(), "b.xml", &voc_xml(&[("weed_outer", [0, 0, 5, 5])]));
    write_file(second.path(), "a.xml", &voc_xml(&[("weed_outer", [0, 0, 5, 5])]));

    let roots: Vec<PathBuf> = vec![first.path().to_path_buf(), second.path().to_path_buf()];
    let all = load_annotation_dirs(&roots, &LoadOptions::default()).expect("load");
    assert_eq!(all.len(), 3);

    let pruned = load_annotation_dirs(
        &roots,
        &LoadOptions {
            prune: true,
            ..Default::default()
        },
    )
    .expect("load pruned");
    assert_eq!(pruned.len(), 2);
    assert!(pruned.iter().all(|ann| ann.image == "a"));
}

#[test]
fn relaxed_loading_collapses_classes() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_file(
        temp.path(),
        "img.xml",
        &voc_xml(&[("pigweed_outer", [0, 0, 5, 5]), ("carrot_seedling_stem", [1, 1, 2, 2])]),
    );

    let raw = load_annotation_dirs(
        &[temp.path().to_path_buf()],
        &LoadOptions {
            relaxed: true,
            ..Default::default()
        },
    )
    .expect("load");
    let classes: Vec<&str> = raw.iter().map(|ann| ann.class_base.as_str()).collect();
    assert_eq!(classes, vec!["weed", "carrot"]);
}

#[test]
fn malformed_xml_reports_the_file() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_file(temp.path(), "broken.xml", "<annotation><object>");

    let err = load_annotation_dirs(&[temp.path().to_path_buf()], &LoadOptions::default())
        .expect_err("malformed xml should fail");
    match err {
        AnnocompareError::VocXmlParse { path, .. } => {
            assert!(path.ends_with("broken.xml"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn file_root_is_rejected() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let file = temp.path().join("single.xml");
    fs::write(&file, voc_xml(&[])).expect("write file");

    let err = load_annotation_dirs(&[file], &LoadOptions::default()).expect_err("not a dir");
    assert!(matches!(err, AnnocompareError::DirectoryWalk { .. }));
}

#[test]
fn coordinates_beyond_pixel_range_fail_to_load() {
    let temp = tempfile::tempdir().expect("create temp dir");
    for annotator in ["alice", "bob"] {
        write_file(
            &temp.path().join(annotator),
            "huge.xml",
            &voc_xml(&[("carrot_outer", [0, 0, 4_000_000_000, 4_000_000_000])]),
        );
    }

    let err = load_annotation_dirs(&[temp.path().to_path_buf()], &LoadOptions::default())
        .expect_err("out-of-range coordinates should fail");
    match err {
        AnnocompareError::VocXmlParse { message, .. } => {
            assert!(message.contains("out of range"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn huge_boxes_reconcile_without_overflow() {
    let big = BBox::from_xyxy(0, 0, 4_000_000_000, 4_000_000_000);
    let mut store = AnnotationStore::from_raw(vec![
        annocompare::ir::RawAnnotation::new("img", "/d/alice", "carrot", ClassType::Outer, big),
        annocompare::ir::RawAnnotation::new("img", "/d/bob", "carrot", ClassType::Outer, big),
    ]);

    let report = reconcile(&mut store, &ReconcileOptions::default()).expect("reconcile");
    assert_eq!(report.counts.annotations, 2);
    assert!(store.iter().all(|ann| ann.iou.values().all(|iou| *iou == 1.0)));
}
