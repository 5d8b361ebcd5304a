// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-element-type property schemas.
//!
//! Validation is pure and exhaustive: every violation is collected so the
//! operator sees the complete list at once. The live-updatable set lives here
//! as well so the validator and the sequencer agree on it.

use crate::element::{ElementType, PropertyMap};
use serde_json::Value;

/// Anchor points accepted by `position.anchor`
pub const ANCHORS: &[&str] = &[
    "top-left",
    "top-center",
    "top-right",
    "center-left",
    "center",
    "center-right",
    "bottom-left",
    "bottom-center",
    "bottom-right",
];

/// Anchor used when `position.anchor` is absent
pub const DEFAULT_ANCHOR: &str = "top-left";

/// Properties that may be patched on a playing element without a rebuild.
///
/// Structural fields (`media_roles`, `autoplay`, ...) are deliberately absent.
pub const LIVE_UPDATABLE_PROPERTIES: &[&str] = &[
    "position",
    "size",
    "opacity",
    "rotation",
    "scale_x",
    "scale_y",
    "z_index",
    "filter",
    "color",
    "background_color",
    "font_size",
    "font_weight",
    "text_shadow",
    "volume",
];

/// Properties the timeline knows how to tween or snap.
pub const ANIMATABLE_PROPERTIES: &[&str] = &[
    "opacity",
    "rotation",
    "scale",
    "scale_x",
    "scale_y",
    "translate_x",
    "translate_y",
    "position",
    "size",
    "color",
    "background_color",
    "font_size",
    "filter",
    "z_index",
    "volume",
    "blur",
];

/// Transform-like properties cleared when an element is reset
pub const TRANSFORM_PROPERTIES: &[&str] = &[
    "translate_x",
    "translate_y",
    "scale",
    "scale_x",
    "scale_y",
    "rotation",
];

const VISUAL: &[&str] = &[
    "position", "size", "opacity", "rotation", "scale_x", "scale_y", "z_index", "filter",
];

const TYPOGRAPHY: &[&str] = &[
    "color",
    "font_family",
    "font_size",
    "font_weight",
    "text_align",
    "text_shadow",
];

/// Whether a property may be patched during playback
pub fn is_live_updatable(property: &str) -> bool {
    LIVE_UPDATABLE_PROPERTIES.contains(&property)
}

/// Whether a property can be driven by the timeline
pub fn is_animatable(property: &str) -> bool {
    ANIMATABLE_PROPERTIES.contains(&property)
}

/// Resting value of an animatable property, used as a tween's start when
/// neither the step nor the element supplies one
pub fn neutral_value(property: &str) -> Option<Value> {
    let value = match property {
        "opacity" | "scale" | "scale_x" | "scale_y" | "volume" => 1.0,
        "rotation" | "translate_x" | "translate_y" | "blur" => 0.0,
        _ => return None,
    };
    Some(serde_json::json!(value))
}

/// Allow-list for an element type
pub fn allowed_properties(element_type: ElementType) -> Vec<&'static str> {
    let extra: &[&str] = match element_type {
        ElementType::Image => &["aspect_ratio"],
        ElementType::Video => &["aspect_ratio", "volume", "autoplay", "loop", "muted"],
        ElementType::Audio => return vec!["volume", "autoplay", "loop"],
        ElementType::Text => &["text", "background_color"],
        ElementType::Timer => &["duration", "format", "countdown"],
        ElementType::Counter => &["value", "step", "prefix", "suffix"],
        ElementType::Animation => &["aspect_ratio", "loop", "speed"],
        ElementType::Canvas => &["background_color"],
        ElementType::Card => &[
            "background_color",
            "border",
            "border_radius",
            "padding",
            "media_roles",
        ],
    };

    let typography: &[&str] = match element_type {
        ElementType::Text | ElementType::Timer | ElementType::Counter | ElementType::Card => {
            TYPOGRAPHY
        }
        _ => &[],
    };

    VISUAL
        .iter()
        .chain(typography)
        .chain(extra)
        .copied()
        .collect()
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyError {
    /// Key not in the element type's allow-list
    #[error("unknown property '{property}' for {element_type} elements")]
    Unknown {
        /// Offending key
        property: String,
        /// Element type that was validated
        element_type: ElementType,
    },

    /// Value has the wrong JSON type
    #[error("'{property}' must be {expected}")]
    WrongType {
        /// Offending key (dotted for nested fields)
        property: String,
        /// Human-readable expectation
        expected: &'static str,
    },

    /// Numeric value outside its allowed range
    #[error("'{property}' must be within {range}, got {value}")]
    OutOfRange {
        /// Offending key (dotted for nested fields)
        property: String,
        /// Human-readable range
        range: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Required nested field missing
    #[error("'{property}' is required")]
    Missing {
        /// Dotted path of the missing field
        property: String,
    },

    /// `position.anchor` not in [`ANCHORS`]
    #[error("'position.anchor' must be one of {}, got '{anchor}'", ANCHORS.join(", "))]
    InvalidAnchor {
        /// Rejected anchor
        anchor: String,
    },
}

/// Outcome of validating a property map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Every violation found, in key order
    pub errors: Vec<PropertyError>,
}

impl ValidationReport {
    /// True when no violation was found
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable messages for every violation
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// `(ok, messages)` pair for callers rendering a flat error list
    pub fn into_parts(self) -> (bool, Vec<String>) {
        (self.is_ok(), self.messages())
    }
}

/// Validate a property map against the schema of `element_type`.
pub fn validate(element_type: ElementType, properties: &PropertyMap) -> ValidationReport {
    let allowed = allowed_properties(element_type);
    let mut errors = Vec::new();

    for (name, value) in properties {
        if !allowed.contains(&name.as_str()) {
            errors.push(PropertyError::Unknown {
                property: name.clone(),
                element_type,
            });
            continue;
        }
        check_value(name, value, &mut errors);
    }

    ValidationReport { errors }
}

fn check_value(name: &str, value: &Value, errors: &mut Vec<PropertyError>) {
    match name {
        "position" => check_position(value, errors),
        "size" => check_size(value, errors),
        "opacity" | "volume" => check_unit(name, value, errors),
        "rotation" | "scale_x" | "scale_y" | "speed" | "value" | "step" | "duration" => {
            check_number(name, value, errors);
        }
        "z_index" => {
            if !(value.is_i64() || value.is_u64()) {
                errors.push(wrong_type(name, "an integer"));
            }
        }
        "font_size" => {
            if let Some(size) = number(name, value, errors) {
                if size <= 0.0 {
                    errors.push(PropertyError::OutOfRange {
                        property: name.to_string(),
                        range: "(0, inf)",
                        value: size,
                    });
                }
            }
        }
        "font_weight" | "border_radius" | "padding" => {
            if !(value.is_number() || value.is_string()) {
                errors.push(wrong_type(name, "a number or a string"));
            }
        }
        "autoplay" | "loop" | "muted" | "countdown" => {
            if !value.is_boolean() {
                errors.push(wrong_type(name, "a boolean"));
            }
        }
        "media_roles" => {
            if !value.is_object() {
                errors.push(wrong_type(name, "an object"));
            }
        }
        _ => {
            // Free-form strings: colors, fonts, filters, text, ...
            if !value.is_string() {
                errors.push(wrong_type(name, "a string"));
            }
        }
    }
}

fn check_position(value: &Value, errors: &mut Vec<PropertyError>) {
    let Some(position) = value.as_object() else {
        errors.push(wrong_type("position", "an object with 'x' and 'y'"));
        return;
    };

    for axis in ["x", "y"] {
        let path = format!("position.{axis}");
        match position.get(axis) {
            None => errors.push(PropertyError::Missing { property: path }),
            Some(v) => check_unit(&path, v, errors),
        }
    }

    match position.get("anchor") {
        None => {}
        Some(Value::String(anchor)) if ANCHORS.contains(&anchor.as_str()) => {}
        Some(Value::String(anchor)) => errors.push(PropertyError::InvalidAnchor {
            anchor: anchor.clone(),
        }),
        Some(_) => errors.push(wrong_type("position.anchor", "a string")),
    }
}

fn check_size(value: &Value, errors: &mut Vec<PropertyError>) {
    let Some(size) = value.as_object() else {
        errors.push(wrong_type("size", "an object with 'width' and 'height'"));
        return;
    };

    for dim in ["width", "height"] {
        let Some(v) = size.get(dim) else { continue };
        let path = format!("size.{dim}");
        match v {
            Value::String(s) if s == "auto" => {}
            Value::Number(n) => {
                let n = n.as_f64().unwrap_or(f64::NAN);
                if !(n > 0.0 && n <= 1.0) {
                    errors.push(PropertyError::OutOfRange {
                        property: path,
                        range: "(0, 1]",
                        value: n,
                    });
                }
            }
            _ => errors.push(PropertyError::WrongType {
                property: path,
                expected: "a number or \"auto\"",
            }),
        }
    }
}

fn check_unit(name: &str, value: &Value, errors: &mut Vec<PropertyError>) {
    if let Some(n) = number(name, value, errors) {
        if !(0.0..=1.0).contains(&n) {
            errors.push(PropertyError::OutOfRange {
                property: name.to_string(),
                range: "[0, 1]",
                value: n,
            });
        }
    }
}

fn check_number(name: &str, value: &Value, errors: &mut Vec<PropertyError>) {
    number(name, value, errors);
}

fn number(name: &str, value: &Value, errors: &mut Vec<PropertyError>) -> Option<f64> {
    let n = value.as_f64();
    if n.is_none() {
        errors.push(wrong_type(name, "a number"));
    }
    n
}

fn wrong_type(name: &str, expected: &'static str) -> PropertyError {
    PropertyError::WrongType {
        property: name.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> PropertyMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_collects_every_violation() {
        let report = validate(ElementType::Image, &props(json!({"foo": 1, "opacity": 2})));

        assert!(!report.is_ok());
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.contains(&PropertyError::Unknown {
            property: "foo".into(),
            element_type: ElementType::Image,
        }));
        assert!(matches!(
            report.errors.iter().find(|e| matches!(e, PropertyError::OutOfRange { .. })),
            Some(PropertyError::OutOfRange { property, .. }) if property == "opacity"
        ));
    }

    #[test]
    fn test_valid_image_properties() {
        let report = validate(
            ElementType::Image,
            &props(json!({
                "position": {"x": 0.5, "y": 0.25, "anchor": "center"},
                "size": {"width": "auto", "height": 0.5},
                "opacity": 1.0,
                "rotation": -45,
                "z_index": 3,
                "aspect_ratio": "16/9",
            })),
        );
        assert!(report.is_ok(), "{:?}", report.messages());
    }

    #[test]
    fn test_position_checks() {
        let report = validate(
            ElementType::Text,
            &props(json!({"position": {"x": 1.5, "anchor": "middle"}})),
        );
        let messages = report.messages();
        assert_eq!(report.errors.len(), 3, "{messages:?}");
        assert!(messages.iter().any(|m| m.contains("position.x")));
        assert!(messages.iter().any(|m| m.contains("position.y")));
        assert!(messages.iter().any(|m| m.contains("middle")));
    }

    #[test]
    fn test_size_bounds() {
        let report = validate(
            ElementType::Image,
            &props(json!({"size": {"width": 0, "height": true}})),
        );
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_z_index_must_be_integer() {
        let report = validate(ElementType::Image, &props(json!({"z_index": 1.5})));
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_audio_schema_is_narrow() {
        let report = validate(
            ElementType::Audio,
            &props(json!({"volume": 0.4, "loop": true, "opacity": 1})),
        );
        assert_eq!(report.errors.len(), 1);
        assert!(report.messages()[0].contains("opacity"));
    }

    #[test]
    fn test_live_set_excludes_structural_fields() {
        assert!(is_live_updatable("color"));
        assert!(is_live_updatable("position"));
        assert!(!is_live_updatable("media_roles"));
        assert!(!is_live_updatable("autoplay"));
    }

    #[test]
    fn test_into_parts() {
        let (ok, messages) = validate(ElementType::Card, &PropertyMap::new()).into_parts();
        assert!(ok);
        assert!(messages.is_empty());
    }
}
