// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named animation presets.
//!
//! Presets are canned from/to bundles over one or more properties. The
//! catalog is built once and shared read-only between every sequencer.

use crate::easing::{Easing, EasingCatalog};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// One property channel of a preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetTrack {
    /// Animated property
    pub property: String,
    /// Start value
    pub from: Value,
    /// End value
    pub to: Value,
    /// Curve, if the preset wants something other than the catalog default
    #[serde(default)]
    pub easing: Option<Easing>,
}

impl PresetTrack {
    /// Create a track using the catalog default easing
    pub fn new(property: impl Into<String>, from: Value, to: Value) -> Self {
        Self {
            property: property.into(),
            from,
            to,
            easing: None,
        }
    }

    /// Override the easing for this track
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }
}

/// A named preset animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationPreset {
    /// Preset name
    pub name: String,
    /// Property channels, all spanning the full step duration
    pub tracks: Vec<PresetTrack>,
}

impl AnimationPreset {
    /// Create a preset from its tracks
    pub fn new(name: impl Into<String>, tracks: Vec<PresetTrack>) -> Self {
        Self {
            name: name.into(),
            tracks,
        }
    }
}

/// Read-only table of preset animations.
#[derive(Debug, Clone, Default)]
pub struct AnimationCatalog {
    presets: HashMap<String, AnimationPreset>,
}

impl AnimationCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in overlay presets
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        let fade_in = PresetTrack::new("opacity", json!(0), json!(1));
        let fade_out = PresetTrack::new("opacity", json!(1), json!(0));

        catalog.insert(AnimationPreset::new("fade-in", vec![fade_in.clone()]));
        catalog.insert(AnimationPreset::new("fade-out", vec![fade_out.clone()]));
        catalog.insert(AnimationPreset::new(
            "slide-in",
            vec![
                PresetTrack::new("translate_x", json!(-100), json!(0)),
                fade_in.clone(),
            ],
        ));
        catalog.insert(AnimationPreset::new(
            "slide-out",
            vec![
                PresetTrack::new("translate_x", json!(0), json!(100)),
                fade_out.clone(),
            ],
        ));
        catalog.insert(AnimationPreset::new(
            "scale-in",
            vec![PresetTrack::new("scale", json!(0), json!(1)), fade_in.clone()],
        ));
        catalog.insert(AnimationPreset::new(
            "scale-out",
            vec![PresetTrack::new("scale", json!(1), json!(0)), fade_out.clone()],
        ));
        catalog.insert(AnimationPreset::new(
            "explosion",
            vec![
                PresetTrack::new("scale", json!(1), json!(3)).with_easing(Easing::EaseOut),
                fade_out,
            ],
        ));
        catalog.insert(AnimationPreset::new(
            "pop",
            vec![
                PresetTrack::new("scale", json!(0), json!(1)).with_easing(Easing::BackOut),
                fade_in.clone(),
            ],
        ));
        catalog.insert(AnimationPreset::new(
            "spin",
            vec![PresetTrack::new("rotation", json!(0), json!(360)).with_easing(Easing::Linear)],
        ));
        catalog.insert(AnimationPreset::new(
            "flip",
            vec![PresetTrack::new("scale_x", json!(1), json!(-1))],
        ));
        catalog.insert(AnimationPreset::new(
            "zoom",
            vec![PresetTrack::new("scale", json!(1), json!(1.5))],
        ));
        catalog.insert(AnimationPreset::new(
            "fly",
            vec![
                PresetTrack::new("translate_y", json!(100), json!(0)).with_easing(Easing::EaseOut),
                fade_in,
            ],
        ));
        catalog.insert(AnimationPreset::new(
            "swipe",
            vec![PresetTrack::new("translate_x", json!(100), json!(0))],
        ));

        catalog
    }

    /// Register or replace a preset
    pub fn insert(&mut self, preset: AnimationPreset) {
        self.presets.insert(preset.name.clone(), preset);
    }

    /// Look up a preset by name
    pub fn get(&self, name: &str) -> Option<&AnimationPreset> {
        self.presets.get(name)
    }

    /// Whether a preset exists
    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    /// Sorted preset names, for error messages
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.presets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of presets
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Whether the catalog has no presets
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

/// Both catalogs, shared by reference between all sequencers.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    /// Preset animations
    pub animations: AnimationCatalog,
    /// Named easing curves
    pub easings: EasingCatalog,
}

impl Catalogs {
    /// Built-in presets and curves
    pub fn builtin() -> Self {
        Self {
            animations: AnimationCatalog::builtin(),
            easings: EasingCatalog::builtin(),
        }
    }

    /// Wrap in an `Arc` for sharing
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_presets() {
        let catalog = AnimationCatalog::builtin();
        for name in [
            "fade-in", "fade-out", "slide-in", "slide-out", "scale-in", "scale-out", "explosion",
            "pop", "spin", "flip", "zoom", "fly", "swipe",
        ] {
            assert!(catalog.contains(name), "missing preset {name}");
        }
        assert_eq!(catalog.len(), 13);
    }

    #[test]
    fn test_fade_in_is_opacity_zero_to_one() {
        let catalog = AnimationCatalog::builtin();
        let preset = catalog.get("fade-in").unwrap();
        assert_eq!(preset.tracks.len(), 1);
        assert_eq!(preset.tracks[0].property, "opacity");
        assert_eq!(preset.tracks[0].from, json!(0));
        assert_eq!(preset.tracks[0].to, json!(1));
    }

    #[test]
    fn test_custom_preset() {
        let mut catalog = AnimationCatalog::new();
        assert!(catalog.is_empty());
        catalog.insert(AnimationPreset::new(
            "blink",
            vec![PresetTrack::new("opacity", json!(1), json!(0))],
        ));
        assert_eq!(catalog.names(), vec!["blink"]);
    }
}
