// SPDX-License-Identifier: MIT OR Apache-2.0
//! Behavior-driven animation sequencing for Stream Companion overlays.
//!
//! Each overlay element carries a declarative behavior: an ordered list of
//! steps such as `appear`, `animate_property`, `wait`, `set` and `disappear`.
//! This crate turns that list into a deterministic timeline and plays it:
//! - Step parsing and linting
//! - Preset animation and easing catalogs
//! - Timeline construction with graceful per-step degradation
//! - A per-element playback state machine
//! - Update dispatch: rebuild on behavior change, live patch on property change
//!
//! ## Architecture
//!
//! Rendering happens behind the [`ElementHost`] trait. Sequencers are driven
//! by [`Sequencer::tick`] with elapsed milliseconds, so playback is fully
//! deterministic and testable without a clock.

pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod easing;
pub mod element;
pub mod host;
pub mod interp;
pub mod interpreter;
pub mod layout;
pub mod schema;
pub mod sequencer;
pub mod step;
pub mod timeline;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::{AnimationCatalog, AnimationPreset, Catalogs, PresetTrack};
pub use config::SequencerConfig;
pub use dispatcher::{DispatchError, Dispatcher, ElementAction, OverlayMessage, UpdateOutcome};
pub use easing::{Easing, EasingCatalog, Modulation};
pub use element::{ElementId, ElementState, ElementType, PropertyMap};
pub use host::{ElementHost, HostCall, RecordingHost};
pub use interp::Interpolation;
pub use interpreter::{StepInterpreter, StepOutcome};
pub use layout::{centered_grid_positions, grid_positions, GridPosition, GridSpec, LayoutError};
pub use schema::{PropertyError, ValidationReport};
pub use sequencer::{
    BuildSummary, RenderState, Sequencer, SequencerState, SequencerStatus, TickOutcome,
};
pub use step::{validate_behavior, BehaviorIssue, PropertyAnimation, Step, StepError};
pub use timeline::{Timeline, TimelineHandle, TimelineId, TimelineOp, Tween, Visibility};
