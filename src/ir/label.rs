//! Class label normalization.
//!
//! Annotators type labels by hand, so the same class shows up as
//! `Carrot-Outer`, `carrot_meristem` or plain `carrot`. Everything is folded
//! into a `(class_base, ClassType)` pair before the reconciliation stages see
//! it.

use log::{debug, warn};

use super::model::ClassType;

/// Plant names used by the field labeling guidelines. Other names are kept
/// but reported.
pub const KNOWN_CLASSES: &[&str] = &[
    "carrot",
    "carrot_seedling",
    "spinach",
    "grass",
    "mallow",
    "nettle",
    "pigweed",
    "purslane",
    "shepherds_purse",
    "weed_other",
    "unknown",
];

/// Coarse classes used by relaxed checking; anything else is a weed.
const RELAXED_CLASSES: &[&str] = &["carrot", "spinach", "unknown"];
const RELAXED_FALLBACK: &str = "weed";

/// Split a raw label into its class name and type.
///
/// `origin` names the file the label came from and is only used for log
/// messages. With `relaxed`, the class name is collapsed onto the coarse
/// classes `carrot`, `spinach`, `unknown` and `weed`.
pub fn normalize_label(origin: &str, raw: &str, relaxed: bool) -> (String, ClassType) {
    let mut text = raw.trim().to_lowercase();

    if text.contains('-') {
        let fixed = text.replace('-', "_");
        debug!("{origin}: replaced dash so {text} -> {fixed}");
        text = fixed;
    }
    if text.contains("_meristem") {
        text = text.replace("_meristem", "_stem");
    }

    let (base, class_type) = match split_type_suffix(&text) {
        Some((base, class_type)) => (base.to_string(), class_type),
        None => {
            warn!("{origin}: label '{raw}' is missing an _outer/_stem suffix, assuming outer");
            (text.clone(), ClassType::Outer)
        }
    };

    if !KNOWN_CLASSES.contains(&base.as_str()) {
        warn!("{origin}: label '{raw}' is not a standard class name");
    }

    let base = if relaxed { collapse_class(&base) } else { base };
    (base, class_type)
}

fn split_type_suffix(text: &str) -> Option<(&str, ClassType)> {
    let (base, suffix) = text.rsplit_once('_')?;
    let class_type = match suffix {
        "outer" => ClassType::Outer,
        "stem" | "inner" => ClassType::Inner,
        _ => return None,
    };
    (!base.is_empty()).then_some((base, class_type))
}

/// Map a class name onto the coarse relaxed classes.
pub fn collapse_class(base: &str) -> String {
    RELAXED_CLASSES
        .iter()
        .find(|class| base.contains(*class))
        .copied()
        .unwrap_or(RELAXED_FALLBACK)
        .to_string()
}
