// SPDX-License-Identifier: MIT OR Apache-2.0
//! Behavior steps.
//!
//! A behavior is an ordered JSON array of steps discriminated by `type`.
//! Parsing is per step: one malformed step never invalidates its neighbours,
//! and inside `animate_property` one malformed entry never invalidates the
//! other entries.

use crate::catalog::Catalogs;
use crate::config::SequencerConfig;
use crate::easing::Modulation;
use crate::element::PropertyMap;
use crate::schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Step `type` strings understood by the interpreter
pub const STEP_TYPES: &[&str] = &[
    "appear",
    "animate_property",
    "animate",
    "wait",
    "set",
    "disappear",
];

/// Why a step (or one `animate_property` entry) was skipped
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StepError {
    /// Step is not a JSON object
    #[error("step must be an object, got {0}")]
    NotAnObject(&'static str),

    /// No `type` field
    #[error("missing required field 'type'")]
    MissingType,

    /// `type` not in [`STEP_TYPES`]
    #[error("unknown step type '{0}'")]
    UnknownType(String),

    /// Fields do not match the step's shape
    #[error("malformed {kind} step: {reason}")]
    Malformed {
        /// Step type
        kind: &'static str,
        /// Deserializer message
        reason: String,
    },

    /// A numeric field is negative or not finite
    #[error("'{field}' must be a non-negative number, got {value}")]
    InvalidDuration {
        /// Field name (`duration` or `delay`)
        field: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Preset name not in the animation catalog
    #[error("unknown animation '{0}'")]
    UnknownAnimation(String),

    /// Property the timeline cannot drive
    #[error("property '{0}' cannot be animated")]
    UnsupportedProperty(String),

    /// `animate_property` entry could not be read
    #[error("malformed property entry: {0}")]
    MalformedEntry(String),
}

impl StepError {
    /// The step field this error is about, for structured logs
    pub fn field(&self) -> &'static str {
        match self {
            Self::NotAnObject(_) | Self::Malformed { .. } => "step",
            Self::MissingType | Self::UnknownType(_) => "type",
            Self::InvalidDuration { field, .. } => field,
            Self::UnknownAnimation(_) => "animation",
            Self::UnsupportedProperty(_) | Self::MalformedEntry(_) => "properties",
        }
    }
}

/// One property channel inside an `animate_property` step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAnimation {
    /// Animated property
    pub property: String,
    /// Explicit start value; defaults to the value in effect when it starts
    #[serde(default)]
    pub from: Option<Value>,
    /// End value
    pub to: Value,
    /// Duration in milliseconds
    pub duration: f64,
    /// Offset from the step start in milliseconds
    #[serde(default)]
    pub delay: f64,
    /// Easing curve
    #[serde(default)]
    pub modulation: Option<Modulation>,
}

impl PropertyAnimation {
    /// Read one entry
    pub fn parse(value: &Value) -> Result<Self, StepError> {
        let entry: Self = serde_json::from_value(value.clone())
            .map_err(|e| StepError::MalformedEntry(e.to_string()))?;
        check_duration("duration", entry.duration)?;
        check_duration("delay", entry.delay)?;
        Ok(entry)
    }

    /// Time from step start until this entry finishes
    pub fn end_ms(&self) -> f64 {
        self.delay + self.duration
    }
}

/// A parsed behavior step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Entrance preset; no-op if already visible
    Appear {
        /// Preset name, config default when absent
        animation: Option<String>,
        /// Milliseconds, config default when absent
        duration: Option<f64>,
    },
    /// Parallel property tweens
    AnimateProperty {
        /// Entries in declaration order; malformed ones are kept as errors
        entries: Vec<Result<PropertyAnimation, StepError>>,
    },
    /// Preset animation
    Animate {
        /// Preset name
        animation: String,
        /// Milliseconds, config default when absent
        duration: Option<f64>,
    },
    /// Pure delay
    Wait {
        /// Milliseconds, config default when absent
        duration: Option<f64>,
    },
    /// Instant property assignment
    Set {
        /// Values to apply
        properties: PropertyMap,
    },
    /// Exit preset, then hidden; no-op if already hidden
    Disappear {
        /// Preset name, config default when absent
        animation: Option<String>,
        /// Milliseconds, config default when absent
        duration: Option<f64>,
    },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawStep {
    Appear {
        #[serde(default)]
        animation: Option<String>,
        #[serde(default)]
        duration: Option<f64>,
    },
    AnimateProperty {
        properties: Vec<Value>,
    },
    Animate {
        animation: String,
        #[serde(default)]
        duration: Option<f64>,
    },
    Wait {
        #[serde(default)]
        duration: Option<f64>,
    },
    Set {
        properties: PropertyMap,
    },
    Disappear {
        #[serde(default)]
        animation: Option<String>,
        #[serde(default)]
        duration: Option<f64>,
    },
}

impl Step {
    /// Parse one raw step
    pub fn parse(value: &Value) -> Result<Self, StepError> {
        let Some(object) = value.as_object() else {
            return Err(StepError::NotAnObject(json_type(value)));
        };
        let kind = match object.get("type") {
            None => return Err(StepError::MissingType),
            Some(Value::String(kind)) => kind.as_str(),
            Some(other) => return Err(StepError::UnknownType(other.to_string())),
        };
        let Some(kind) = STEP_TYPES.iter().copied().find(|known| *known == kind) else {
            return Err(StepError::UnknownType(kind.to_string()));
        };

        let raw: RawStep = serde_json::from_value(value.clone()).map_err(|e| StepError::Malformed {
            kind,
            reason: e.to_string(),
        })?;

        let step = match raw {
            RawStep::Appear { animation, duration } => Self::Appear { animation, duration },
            RawStep::AnimateProperty { properties } => Self::AnimateProperty {
                entries: properties.iter().map(PropertyAnimation::parse).collect(),
            },
            RawStep::Animate { animation, duration } => Self::Animate { animation, duration },
            RawStep::Wait { duration } => Self::Wait { duration },
            RawStep::Set { properties } => Self::Set { properties },
            RawStep::Disappear { animation, duration } => Self::Disappear { animation, duration },
        };

        if let Some(duration) = step.declared_duration() {
            check_duration("duration", duration)?;
        }
        Ok(step)
    }

    /// Wire name of the step type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Appear { .. } => "appear",
            Self::AnimateProperty { .. } => "animate_property",
            Self::Animate { .. } => "animate",
            Self::Wait { .. } => "wait",
            Self::Set { .. } => "set",
            Self::Disappear { .. } => "disappear",
        }
    }

    fn declared_duration(&self) -> Option<f64> {
        match self {
            Self::Appear { duration, .. }
            | Self::Animate { duration, .. }
            | Self::Wait { duration }
            | Self::Disappear { duration, .. } => *duration,
            Self::AnimateProperty { .. } | Self::Set { .. } => None,
        }
    }

    /// Milliseconds this step gates the next one by.
    ///
    /// `animate_property` lasts until its longest entry (delay included)
    /// finishes; malformed entries do not count.
    pub fn duration_ms(&self, config: &SequencerConfig) -> f64 {
        match self {
            Self::Appear { duration, .. } => duration.unwrap_or(config.appear_duration_ms),
            Self::Animate { duration, .. } => duration.unwrap_or(config.animate_duration_ms),
            Self::Wait { duration } => duration.unwrap_or(config.wait_duration_ms),
            Self::Disappear { duration, .. } => duration.unwrap_or(config.disappear_duration_ms),
            Self::AnimateProperty { entries } => entries
                .iter()
                .filter_map(|entry| entry.as_ref().ok())
                .map(PropertyAnimation::end_ms)
                .fold(0.0, f64::max),
            Self::Set { .. } => 0.0,
        }
    }
}

/// Sum of step durations; malformed steps contribute nothing.
pub fn total_duration_ms(steps: &[Step], config: &SequencerConfig) -> f64 {
    steps.iter().map(|step| step.duration_ms(config)).sum()
}

fn check_duration(field: &'static str, value: f64) -> Result<(), StepError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(StepError::InvalidDuration { field, value })
    }
}

/// JSON type name for messages
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One problem found while linting a behavior
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorIssue {
    /// Step index, `None` for container-level problems
    pub step: Option<usize>,
    /// Description
    pub message: String,
}

impl fmt::Display for BehaviorIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            Some(step) => write!(f, "Step {step}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Lint a behavior the way the admin write path does: every problem in
/// every step is reported. An empty array is valid.
pub fn validate_behavior(behavior: &Value, catalogs: &Catalogs) -> Vec<BehaviorIssue> {
    let Some(steps) = behavior.as_array() else {
        return vec![BehaviorIssue {
            step: None,
            message: format!("behavior must be an array, got {}", json_type(behavior)),
        }];
    };

    let mut issues = Vec::new();
    for (index, raw) in steps.iter().enumerate() {
        let mut push = |message: String| {
            issues.push(BehaviorIssue {
                step: Some(index),
                message,
            });
        };

        let step = match Step::parse(raw) {
            Ok(step) => step,
            Err(err @ (StepError::NotAnObject(_) | StepError::MissingType | StepError::UnknownType(_))) => {
                push(err.to_string());
                continue;
            }
            Err(err) => {
                // Report each bad field on its own, not just the first one
                let mut found = lint_fields(raw, catalogs);
                if found.is_empty() {
                    found.push(err.to_string());
                }
                found.into_iter().for_each(&mut push);
                continue;
            }
        };

        match &step {
            Step::Appear { animation: Some(name), .. }
            | Step::Disappear { animation: Some(name), .. }
            | Step::Animate { animation: name, .. } => {
                if !catalogs.animations.contains(name) {
                    push(format!(
                        "unknown animation '{name}'. Known animations: {}",
                        catalogs.animations.names().join(", ")
                    ));
                }
            }
            Step::AnimateProperty { entries } => {
                if entries.is_empty() {
                    push("'properties' array must not be empty".to_string());
                }
                for (entry_index, entry) in entries.iter().enumerate() {
                    match entry {
                        Err(err) => push(format!("property[{entry_index}] {err}")),
                        Ok(entry) => {
                            if !schema::is_animatable(&entry.property) {
                                push(format!(
                                    "property[{entry_index}] '{}' cannot be animated",
                                    entry.property
                                ));
                            }
                            if let Some(message) = modulation_issue(entry.modulation.as_ref(), catalogs) {
                                push(format!("property[{entry_index}] {message}"));
                            }
                        }
                    }
                }
            }
            Step::Appear { animation: None, .. }
            | Step::Disappear { animation: None, .. }
            | Step::Wait { .. }
            | Step::Set { .. } => {}
        }
    }
    issues
}

/// Field-by-field checks for a step `Step::parse` rejected
fn lint_fields(raw: &Value, catalogs: &Catalogs) -> Vec<String> {
    let mut found = Vec::new();
    let (Some(object), Some(kind)) = (raw.as_object(), raw.get("type").and_then(Value::as_str)) else {
        return found;
    };

    if matches!(kind, "appear" | "animate" | "disappear") {
        match object.get("animation") {
            None if kind == "animate" => found.push("missing required field 'animation'".to_string()),
            None => {}
            Some(Value::String(name)) if !catalogs.animations.contains(name) => found.push(format!(
                "unknown animation '{name}'. Known animations: {}",
                catalogs.animations.names().join(", ")
            )),
            Some(Value::String(_)) => {}
            Some(other) => found.push(format!("'animation' must be string, got {}", json_type(other))),
        }
    }

    if matches!(kind, "appear" | "animate" | "disappear" | "wait") {
        match object.get("duration") {
            None => {}
            Some(Value::Number(number)) => {
                if let Some(value) = number.as_f64().filter(|value| *value < 0.0) {
                    found.push(format!("'duration' must be non-negative, got {value}"));
                }
            }
            Some(other) => found.push(format!("'duration' must be number, got {}", json_type(other))),
        }
    }

    match (kind, object.get("properties")) {
        ("animate_property", None) => found.push("'animate_property' requires 'properties' field".to_string()),
        ("animate_property", Some(Value::Array(_))) => {}
        ("animate_property", Some(other)) => {
            found.push(format!("'properties' must be array, got {}", json_type(other)));
        }
        ("set", None) => found.push("'set' requires 'properties' field".to_string()),
        ("set", Some(Value::Object(_))) => {}
        ("set", Some(other)) => {
            found.push(format!("'properties' must be object, got {}", json_type(other)));
        }
        _ => {}
    }

    found
}

fn modulation_issue(modulation: Option<&Modulation>, catalogs: &Catalogs) -> Option<String> {
    match modulation? {
        Modulation::Named(name) if !catalogs.easings.contains(name) => {
            Some(format!("unknown modulation '{name}'"))
        }
        Modulation::Parameterized(params) if !params.contains_key("type") => {
            Some("modulation object missing 'type'".to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_every_kind() {
        let behavior = json!([
            {"type": "appear"},
            {"type": "animate_property", "properties": [
                {"property": "opacity", "to": 1, "duration": 300}
            ]},
            {"type": "animate", "animation": "spin", "duration": 200},
            {"type": "wait", "duration": 50},
            {"type": "set", "properties": {"color": "#fff"}},
            {"type": "disappear", "animation": "fade-out"},
        ]);

        let kinds: Vec<&str> = behavior
            .as_array()
            .unwrap()
            .iter()
            .map(|raw| Step::parse(raw).unwrap().kind())
            .collect();
        assert_eq!(kinds, STEP_TYPES.to_vec());
    }

    #[test]
    fn test_step_errors() {
        assert_eq!(Step::parse(&json!(3)), Err(StepError::NotAnObject("number")));
        assert_eq!(Step::parse(&json!({})), Err(StepError::MissingType));
        assert_eq!(
            Step::parse(&json!({"type": "teleport"})),
            Err(StepError::UnknownType("teleport".into()))
        );
        assert!(matches!(
            Step::parse(&json!({"type": "animate"})),
            Err(StepError::Malformed { kind: "animate", .. })
        ));
        assert_eq!(
            Step::parse(&json!({"type": "wait", "duration": -5})),
            Err(StepError::InvalidDuration { field: "duration", value: -5.0 })
        );
    }

    #[test]
    fn test_bad_entry_does_not_poison_step() {
        let step = Step::parse(&json!({"type": "animate_property", "properties": [
            {"property": "opacity", "to": 1, "duration": 300},
            {"property": "scale"},
            {"property": "rotation", "to": 90, "duration": 900, "delay": 100},
        ]}))
        .unwrap();

        let Step::AnimateProperty { entries } = &step else {
            panic!("expected animate_property");
        };
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_ok());
        assert!(entries[1].is_err());
        assert!(entries[2].is_ok());
        assert_eq!(step.duration_ms(&SequencerConfig::default()), 1000.0);
    }

    #[test]
    fn test_durations_use_config_defaults() {
        let config = SequencerConfig::default();
        let steps: Vec<Step> = [
            json!({"type": "appear"}),
            json!({"type": "animate", "animation": "pop"}),
            json!({"type": "wait"}),
            json!({"type": "set", "properties": {}}),
            json!({"type": "disappear", "duration": 250}),
        ]
        .iter()
        .map(|raw| Step::parse(raw).unwrap())
        .collect();

        assert_eq!(total_duration_ms(&steps, &config), 500.0 + 1000.0 + 1000.0 + 250.0);
    }

    #[test]
    fn test_validate_behavior_collects_everything() {
        let catalogs = Catalogs::builtin();
        let issues = validate_behavior(
            &json!([
                {"type": "appear", "animation": "does-not-exist"},
                "oops",
                {"type": "animate_property", "properties": []},
                {"type": "animate_property", "properties": [
                    {"property": "opacity", "to": 0, "duration": 10, "modulation": "wobble"},
                    {"property": "media_roles", "to": {}, "duration": 10},
                ]},
                {"type": "wait", "duration": 100},
            ]),
            &catalogs,
        );

        let rendered: Vec<String> = issues.iter().map(ToString::to_string).collect();
        assert_eq!(issues.len(), 5, "{rendered:#?}");
        assert!(rendered[0].starts_with("Step 0: unknown animation 'does-not-exist'"));
        assert!(rendered[1].starts_with("Step 1: step must be an object"));
        assert!(rendered[2].starts_with("Step 2:"));
        assert!(rendered[3].contains("wobble"));
        assert!(rendered[4].contains("media_roles"));
    }

    #[test]
    fn test_validate_behavior_reports_every_field() {
        let catalogs = Catalogs::builtin();
        let issues = validate_behavior(
            &json!([
                {"type": "appear", "animation": "nope", "duration": -1},
                {"type": "animate", "duration": "slow"},
                {"type": "set", "properties": [1, 2]},
            ]),
            &catalogs,
        );

        let rendered: Vec<String> = issues.iter().map(ToString::to_string).collect();
        assert_eq!(issues.len(), 5, "{rendered:#?}");
        assert!(rendered[0].starts_with("Step 0: unknown animation 'nope'"));
        assert_eq!(rendered[1], "Step 0: 'duration' must be non-negative, got -1");
        assert_eq!(rendered[2], "Step 1: missing required field 'animation'");
        assert_eq!(rendered[3], "Step 1: 'duration' must be number, got string");
        assert_eq!(rendered[4], "Step 2: 'properties' must be object, got array");
    }

    #[test]
    fn test_validate_behavior_container() {
        let catalogs = Catalogs::builtin();
        assert!(validate_behavior(&json!([]), &catalogs).is_empty());
        let issues = validate_behavior(&json!({"type": "appear"}), &catalogs);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].step, None);
        assert_eq!(issues[0].to_string(), "behavior must be an array, got object");
    }
}
