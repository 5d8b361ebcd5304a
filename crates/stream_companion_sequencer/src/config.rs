// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequencer defaults.

use serde::{Deserialize, Serialize};

/// Defaults applied when a step omits optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Preset used by `appear` without `animation`
    pub appear_animation: String,
    /// `appear` duration in milliseconds
    pub appear_duration_ms: f64,
    /// Preset used by `disappear` without `animation`
    pub disappear_animation: String,
    /// `disappear` duration in milliseconds
    pub disappear_duration_ms: f64,
    /// `animate` duration in milliseconds
    pub animate_duration_ms: f64,
    /// `wait` duration in milliseconds
    pub wait_duration_ms: f64,
    /// Curve used when a modulation is absent or unknown
    pub default_easing: String,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            appear_animation: "fade-in".to_string(),
            appear_duration_ms: 500.0,
            disappear_animation: "fade-out".to_string(),
            disappear_duration_ms: 500.0,
            animate_duration_ms: 1000.0,
            wait_duration_ms: 1000.0,
            default_easing: crate::easing::DEFAULT_EASING.to_string(),
        }
    }
}
