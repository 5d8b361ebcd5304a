// SPDX-License-Identifier: MIT OR Apache-2.0
//! Overlay elements as seen by the sequencer.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Property name → value mapping carried by elements and steps.
pub type PropertyMap = serde_json::Map<String, serde_json::Value>;

/// Opaque element identifier, stable across updates.
///
/// The backend sends integer ids; anything else that arrives as a string is
/// kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl ElementId {
    /// Create an id from anything string-like
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for ElementId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(id) => Self(id.to_string()),
            RawId::Text(id) => Self(id),
        })
    }
}

/// Kind of overlay element. Determines the property schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    /// Still image
    Image,
    /// Video clip
    Video,
    /// Audio-only element
    Audio,
    /// Text label
    Text,
    /// Countdown / count-up timer
    Timer,
    /// Numeric counter
    Counter,
    /// Animated image (gif, lottie, ...)
    Animation,
    /// Free-form drawing surface
    Canvas,
    /// Composite card with media slots
    Card,
}

impl ElementType {
    /// Wire name of this element type
    pub fn name(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Text => "text",
            Self::Timer => "timer",
            Self::Counter => "counter",
            Self::Animation => "animation",
            Self::Canvas => "canvas",
            Self::Card => "card",
        }
    }

    /// All element types
    pub fn all() -> &'static [ElementType] {
        &[
            Self::Image,
            Self::Video,
            Self::Audio,
            Self::Text,
            Self::Timer,
            Self::Counter,
            Self::Animation,
            Self::Canvas,
            Self::Card,
        ]
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Full element state as pushed by the backend.
///
/// `behavior` stays raw JSON: a container that is not an array must reach the
/// sequencer so it can be rejected there instead of failing the whole update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementState {
    /// Element id
    pub id: ElementId,
    /// Element type
    pub element_type: ElementType,
    /// Whether the behavior sequence should be running
    #[serde(default, alias = "visible")]
    pub playing: bool,
    /// Display properties
    #[serde(default)]
    pub properties: PropertyMap,
    /// Ordered behavior steps
    #[serde(default = "empty_behavior")]
    pub behavior: serde_json::Value,
}

fn empty_behavior() -> serde_json::Value {
    serde_json::Value::Array(Vec::new())
}

impl ElementState {
    /// Create a stopped element with no properties and no behavior
    pub fn new(id: impl Into<ElementId>, element_type: ElementType) -> Self {
        Self {
            id: id.into(),
            element_type,
            playing: false,
            properties: PropertyMap::new(),
            behavior: empty_behavior(),
        }
    }

    /// Set the playing flag
    pub fn with_playing(mut self, playing: bool) -> Self {
        self.playing = playing;
        self
    }

    /// Replace the behavior
    pub fn with_behavior(mut self, behavior: serde_json::Value) -> Self {
        self.behavior = behavior;
        self
    }

    /// Set a single property
    pub fn with_property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }
}
