//! Pascal VOC XML loader for multi-annotator label sets.
//!
//! Every annotator (or annotation session) keeps its own directory of VOC
//! files. The same picture is recognized across annotators by the XML file
//! stem, and the directory an XML file lives in identifies who labeled it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use roxmltree::Node;
use walkdir::WalkDir;

use super::label::normalize_label;
use super::model::RawAnnotation;
use super::BBox;
use crate::error::AnnocompareError;

const VOC_XML_EXTENSION: &str = "xml";

/// Largest accepted pixel coordinate magnitude.
const MAX_COORD: i64 = i32::MAX as i64;

/// Options for loading annotation directories.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Only keep images annotated in more than one XML file.
    pub prune: bool,
    /// Collapse class names onto the coarse relaxed classes.
    pub relaxed: bool,
}

/// Walk `roots` for VOC XML files and read every box they contain.
///
/// Files are read in stem order, then path order, so the output is stable
/// for a given directory tree.
pub fn load_annotation_dirs(
    roots: &[PathBuf],
    opts: &LoadOptions,
) -> Result<Vec<RawAnnotation>, AnnocompareError> {
    let mut stem_to_files = collect_xml_by_stem(roots)?;
    if opts.prune {
        let before = stem_to_files.len();
        stem_to_files.retain(|_, files| files.len() > 1);
        info!(
            "pruned {} image(s) annotated only once",
            before - stem_to_files.len()
        );
    }

    let mut annotations = Vec::new();
    for (stem, files) in &stem_to_files {
        for file in files {
            let boxes = read_voc_file(file, stem, opts)?;
            info!("loaded {} ({} boxes)", file.display(), boxes.len());
            annotations.extend(boxes);
        }
    }
    Ok(annotations)
}

/// Find all `.xml` files under `roots`, grouped by file stem.
pub fn collect_xml_by_stem(
    roots: &[PathBuf],
) -> Result<BTreeMap<String, Vec<PathBuf>>, AnnocompareError> {
    let mut stem_to_files: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    for root in roots {
        if !root.is_dir() {
            return Err(AnnocompareError::DirectoryWalk {
                path: root.clone(),
                message: "input must be a directory".to_string(),
            });
        }

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|source| AnnocompareError::DirectoryWalk {
                path: root.clone(),
                message: source.to_string(),
            })?;

            let path = entry.path();
            if !entry.file_type().is_file() || !has_xml_extension(path) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                stem_to_files
                    .entry(stem.to_string())
                    .or_default()
                    .push(path.to_path_buf());
            }
        }
    }

    for files in stem_to_files.values_mut() {
        files.sort();
        files.dedup();
    }
    debug!("found {} distinct image stem(s)", stem_to_files.len());
    Ok(stem_to_files)
}

/// Read one VOC file as annotations of `image`.
pub fn read_voc_file(
    path: &Path,
    image: &str,
    opts: &LoadOptions,
) -> Result<Vec<RawAnnotation>, AnnocompareError> {
    let xml = fs::read_to_string(path).map_err(AnnocompareError::Io)?;
    let objects = parse_voc_xml_str(&xml, path)?;

    let source_dir = path
        .parent()
        .map(|dir| dir.to_string_lossy().to_string())
        .unwrap_or_default();
    let origin = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(objects
        .into_iter()
        .map(|object| {
            if !object.bbox.is_ordered() {
                warn!(
                    "{origin}: box {} for '{}' is empty or inverted",
                    object.bbox, object.name
                );
            }
            let (class_base, class_type) = normalize_label(&origin, &object.name, opts.relaxed);
            RawAnnotation::new(image, source_dir.clone(), class_base, class_type, object.bbox)
                .with_source_file(path)
                .with_difficult(object.difficult)
        })
        .collect())
}

/// Parse VOC XML from a UTF-8 string.
///
/// This helper is primarily useful for testing/fuzzing parse behavior in-memory.
pub fn from_voc_xml_str(xml: &str) -> Result<(), AnnocompareError> {
    parse_voc_xml_str(xml, Path::new("<memory>"))?;
    Ok(())
}

/// Parse VOC XML from bytes.
///
/// The input must be valid UTF-8.
pub fn from_voc_xml_slice(bytes: &[u8]) -> Result<(), AnnocompareError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| AnnocompareError::VocXmlParse {
        path: PathBuf::from("<memory>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    from_voc_xml_str(xml)
}

#[derive(Debug)]
struct ParsedVocObject {
    name: String,
    difficult: bool,
    bbox: BBox,
}

fn parse_voc_xml_str(xml: &str, path: &Path) -> Result<Vec<ParsedVocObject>, AnnocompareError> {
    let document =
        roxmltree::Document::parse(xml).map_err(|source| AnnocompareError::VocXmlParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    let annotation = document.root_element();
    if annotation.tag_name().name() != "annotation" {
        return Err(AnnocompareError::VocXmlParse {
            path: path.to_path_buf(),
            message: "missing <annotation> root element".to_string(),
        });
    }

    let mut objects = Vec::new();
    for object in annotation
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "object")
    {
        let name = required_child_text(object, "name", path, "<object>")?;
        let difficult = match optional_child_text(object, "difficult") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| AnnocompareError::VocXmlParse {
                path: path.to_path_buf(),
                message: format!("invalid <difficult> value '{raw}' in <object>; expected 0 or 1"),
            })?,
            None => false,
        };

        let bndbox = required_child_element(object, "bndbox", path, "<object>")?;
        let bbox = BBox::from_xyxy(
            parse_required_coord(bndbox, "xmin", path)?,
            parse_required_coord(bndbox, "ymin", path)?,
            parse_required_coord(bndbox, "xmax", path)?,
            parse_required_coord(bndbox, "ymax", path)?,
        );

        objects.push(ParsedVocObject {
            name,
            difficult,
            bbox,
        });
    }

    Ok(objects)
}

fn required_child_element<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<Node<'a, 'input>, AnnocompareError> {
    child_element(node, tag).ok_or_else(|| AnnocompareError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

fn required_child_text(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<String, AnnocompareError> {
    optional_child_text(node, tag).ok_or_else(|| AnnocompareError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

/// Pixel coordinates are integers; labeling tools that write decimals get
/// rounded to the nearest pixel. Values beyond `±MAX_COORD` are rejected.
fn parse_required_coord(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
) -> Result<i64, AnnocompareError> {
    let raw = required_child_text(node, tag, path, "<bndbox>")?;
    let value = match raw.parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => raw
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(|value| value.round() as i64),
    };

    match value {
        Some(value) if (-MAX_COORD..=MAX_COORD).contains(&value) => Ok(value),
        Some(_) => Err(AnnocompareError::VocXmlParse {
            path: path.to_path_buf(),
            message: format!(
                "<{tag}> value '{raw}' in <bndbox> is out of range (limit ±{MAX_COORD})"
            ),
        }),
        None => Err(AnnocompareError::VocXmlParse {
            path: path.to_path_buf(),
            message: format!("invalid <{tag}> value '{raw}' in <bndbox>; expected a number"),
        }),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

fn optional_child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child_element(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

fn has_xml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(VOC_XML_EXTENSION))
        .unwrap_or(false)
}
