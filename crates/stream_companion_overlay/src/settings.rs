// SPDX-License-Identifier: MIT OR Apache-2.0
//! Overlay runner settings, stored as RON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stream_companion_sequencer::SequencerConfig;
use thiserror::Error;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file looked up when no path is given
pub const SETTINGS_FILE_NAME: &str = "overlay.ron";

/// Highest accepted frame rate; one frame per millisecond
pub const MAX_FRAME_RATE: f64 = 1000.0;

const DEFAULT_FRAME_RATE: f64 = 60.0;

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File could not be read or written
    #[error("settings file {}: {source}", .path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid settings RON
    #[error("settings file {} is malformed: {message}", .path.display())]
    Parse {
        /// File involved
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Written by a newer runner
    #[error("settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },

    /// Frame rate outside `(0, MAX_FRAME_RATE]`
    #[error("frame rate must be a number in (0, 1000], got {0}")]
    InvalidFrameRate(f64),

    /// Settings could not be serialized
    #[error("failed to serialize settings: {0}")]
    Serialize(String),
}

/// End-of-run diagnostic summary options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// Print warnings and errors collected during the run
    pub enabled: bool,
    /// Cap on printed entries
    pub max_entries: usize,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 50,
        }
    }
}

/// Complete runner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    /// Settings format version
    pub version: u32,
    /// Sequencer defaults
    pub sequencer: SequencerConfig,
    /// Ticks per second while advancing time
    pub frame_rate: f64,
    /// Upper bound on the end-of-input drain, in milliseconds
    pub drain_limit_ms: f64,
    /// Default `EnvFilter` directives; `RUST_LOG` takes precedence
    pub log_filter: String,
    /// Diagnostic summary
    pub summary: SummarySettings,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            sequencer: SequencerConfig::default(),
            frame_rate: DEFAULT_FRAME_RATE,
            drain_limit_ms: 60_000.0,
            log_filter: "info,stream_companion_sequencer=info".to_string(),
            summary: SummarySettings::default(),
        }
    }
}

impl OverlaySettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: OverlaySettings =
            ron::from_str(&content).map_err(|e| SettingsError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        // Version check
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }
        check_frame_rate(settings.frame_rate)?;

        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config)
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Milliseconds per frame; an out-of-range rate falls back to the default
    pub fn frame_ms(&self) -> f64 {
        match check_frame_rate(self.frame_rate) {
            Ok(rate) => 1000.0 / rate,
            Err(_) => 1000.0 / DEFAULT_FRAME_RATE,
        }
    }
}

/// Accept finite frame rates in `(0, MAX_FRAME_RATE]`
pub fn check_frame_rate(frame_rate: f64) -> Result<f64, SettingsError> {
    if frame_rate.is_finite() && frame_rate > 0.0 && frame_rate <= MAX_FRAME_RATE {
        Ok(frame_rate)
    } else {
        Err(SettingsError::InvalidFrameRate(frame_rate))
    }
}
