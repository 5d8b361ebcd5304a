// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-element sequencer state machine.
//!
//! A sequencer owns one built [`Timeline`] and a playback position. It is
//! driven by [`Sequencer::tick`] with elapsed milliseconds; each tick samples
//! the timeline and pushes the resulting frame to an [`ElementHost`].

use crate::catalog::Catalogs;
use crate::config::SequencerConfig;
use crate::element::{ElementId, ElementType, PropertyMap};
use crate::host::ElementHost;
use crate::interpreter::{StepInterpreter, StepOutcome};
use crate::schema;
use crate::timeline::Timeline;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Sequencer lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencerState {
    /// No timeline built
    #[default]
    Idle,
    /// Built, at position 0, not rendered
    Ready,
    /// Advancing on every tick
    Playing,
    /// Frozen mid-run; the last frame stays on screen
    Paused,
    /// Reached the end of the timeline
    Complete,
}

/// Diagnostic snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencerStatus {
    /// Whether the timeline is advancing
    pub is_playing: bool,
    /// Total timeline length in milliseconds
    pub duration: f64,
    /// Element the sequencer drives
    pub element_id: ElementId,
    /// Number of entries in the built behavior
    pub step_count: usize,
}

/// Step tally of the last build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildSummary {
    /// Steps that added operations or time
    pub scheduled: usize,
    /// Valid steps that had nothing to do
    pub no_ops: usize,
    /// Steps that were logged and skipped
    pub skipped: usize,
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing; nothing happened
    Idle,
    /// Position moved and a frame was rendered
    Advanced,
    /// The final frame was rendered and playback finished
    Completed,
}

/// Frame the host should be showing
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    /// Whether the element is on screen
    pub rendered: bool,
    /// Sampled style
    pub style: PropertyMap,
}

/// A live-patched value and the position it was applied at
#[derive(Debug, Clone, PartialEq)]
struct LiveOverride {
    value: Value,
    at_ms: f64,
}

/// Drives one element's behavior.
#[derive(Debug, Clone)]
pub struct Sequencer {
    element_id: ElementId,
    element_type: ElementType,
    properties: PropertyMap,
    catalogs: Arc<Catalogs>,
    config: Arc<SequencerConfig>,
    timeline: Timeline,
    step_count: usize,
    state: SequencerState,
    position: f64,
    overrides: IndexMap<String, LiveOverride>,
}

impl Sequencer {
    /// Create an idle sequencer; `properties` are the element's base style
    pub fn new(
        element_id: ElementId,
        element_type: ElementType,
        properties: PropertyMap,
        catalogs: Arc<Catalogs>,
        config: Arc<SequencerConfig>,
    ) -> Self {
        Self {
            element_id,
            element_type,
            properties,
            catalogs,
            config,
            timeline: Timeline::new(),
            step_count: 0,
            state: SequencerState::Idle,
            position: 0.0,
            overrides: IndexMap::new(),
        }
    }

    /// Build a fresh timeline from `behavior`, replacing any previous one.
    ///
    /// A non-array behavior is logged and leaves the sequencer idle.
    pub fn build(&mut self, behavior: &Value) -> BuildSummary {
        self.timeline = Timeline::new();
        self.position = 0.0;
        self.step_count = 0;
        self.overrides.clear();

        let Some(steps) = behavior.as_array() else {
            error!(
                element = %self.element_id,
                got = crate::step::json_type(behavior),
                "behavior must be an array; nothing built"
            );
            self.state = SequencerState::Idle;
            return BuildSummary::default();
        };

        let interpreter = StepInterpreter::new(&self.catalogs, &self.config, &self.element_id);
        let mut summary = BuildSummary::default();
        for (index, raw) in steps.iter().enumerate() {
            match interpreter.apply(&mut self.timeline, raw, index) {
                StepOutcome::Scheduled { .. } => summary.scheduled += 1,
                StepOutcome::NoOp => summary.no_ops += 1,
                StepOutcome::Skipped(_) => summary.skipped += 1,
            }
        }

        self.step_count = steps.len();
        self.state = SequencerState::Ready;
        info!(
            element = %self.element_id,
            element_type = %self.element_type,
            timeline = %self.timeline.id(),
            steps = self.step_count,
            skipped = summary.skipped,
            duration_ms = self.timeline.duration(),
            "built timeline"
        );
        summary
    }

    /// Start from position 0
    pub fn play(&mut self, host: &mut dyn ElementHost) {
        if self.state == SequencerState::Idle || self.timeline.is_empty() {
            info!(element = %self.element_id, "no animation steps; nothing to play");
            return;
        }

        // Patches already live in the base style; a replay starts clean
        self.position = 0.0;
        self.overrides.clear();
        if self.timeline.duration() <= 0.0 {
            self.state = SequencerState::Complete;
            self.render(host);
            info!(element = %self.element_id, "sequence complete (instant)");
            return;
        }

        self.state = SequencerState::Playing;
        self.render(host);
        info!(
            element = %self.element_id,
            timeline = %self.timeline.id(),
            duration_ms = self.timeline.duration(),
            "playing"
        );
    }

    /// Same as [`play`](Self::play): always from the first step
    pub fn restart(&mut self, host: &mut dyn ElementHost) {
        self.play(host);
    }

    /// Freeze at the current position
    pub fn pause(&mut self) {
        if self.state == SequencerState::Playing {
            self.state = SequencerState::Paused;
            debug!(element = %self.element_id, position_ms = self.position, "paused");
        }
    }

    /// Rewind to 0 and force the hidden reset style. No-op when idle.
    pub fn stop(&mut self, host: &mut dyn ElementHost) {
        if self.state == SequencerState::Idle {
            return;
        }

        self.state = SequencerState::Ready;
        self.position = 0.0;

        let mut reset = PropertyMap::new();
        reset.insert("opacity".to_string(), Value::from(0));
        for property in schema::TRANSFORM_PROPERTIES {
            reset.insert((*property).to_string(), Value::Null);
        }
        host.apply_style(&self.element_id, &reset);
        host.set_rendered(&self.element_id, false);
        info!(element = %self.element_id, "stopped");
    }

    /// Advance by `delta_ms` and render
    pub fn tick(&mut self, delta_ms: f64, host: &mut dyn ElementHost) -> TickOutcome {
        if self.state != SequencerState::Playing {
            return TickOutcome::Idle;
        }

        let duration = self.timeline.duration();
        self.position = (self.position + delta_ms.max(0.0)).min(duration);
        let finished = self.position >= duration;
        if finished {
            self.state = SequencerState::Complete;
        }
        self.render(host);

        if finished {
            info!(
                element = %self.element_id,
                timeline = %self.timeline.id(),
                "sequence complete"
            );
            TickOutcome::Completed
        } else {
            TickOutcome::Advanced
        }
    }

    /// Apply the live-updatable subset of `properties` without touching
    /// playback. Returns the names that were applied.
    ///
    /// A patched value holds over whatever the timeline already did to that
    /// property, until an op touching it starts later in the run.
    /// Callers validate first; this only filters.
    pub fn update_properties(
        &mut self,
        properties: &PropertyMap,
        host: &mut dyn ElementHost,
    ) -> Vec<String> {
        let mut patch = PropertyMap::new();
        for (key, value) in properties {
            if schema::is_live_updatable(key) {
                patch.insert(key.clone(), value.clone());
            } else {
                debug!(element = %self.element_id, property = %key, "not live-updatable; ignored");
            }
        }

        for (key, value) in &patch {
            self.properties.insert(key.clone(), value.clone());
            self.overrides.insert(
                key.clone(),
                LiveOverride {
                    value: value.clone(),
                    at_ms: self.position,
                },
            );
        }
        if !patch.is_empty() && self.render_state().rendered {
            host.apply_style(&self.element_id, &patch);
        }

        debug!(
            element = %self.element_id,
            applied = patch.len(),
            position_ms = self.position,
            "live property update"
        );
        patch.into_iter().map(|(key, _)| key).collect()
    }

    /// Replace the base style without rendering
    pub fn set_base_properties(&mut self, properties: PropertyMap) {
        self.properties = properties;
    }

    /// Frame for the current position
    pub fn render_state(&self) -> RenderState {
        let started = matches!(
            self.state,
            SequencerState::Playing | SequencerState::Paused | SequencerState::Complete
        );
        let mut style = self.timeline.sample(self.position, &self.properties);
        for (key, live) in &self.overrides {
            if !self.timeline.touches_between(key, live.at_ms, self.position) {
                style.insert(key.clone(), live.value.clone());
            }
        }
        RenderState {
            rendered: started && self.timeline.visible_at(self.position),
            style,
        }
    }

    fn render(&self, host: &mut dyn ElementHost) {
        let frame = self.render_state();
        host.apply_style(&self.element_id, &frame.style);
        host.set_rendered(&self.element_id, frame.rendered);
    }

    /// Diagnostic snapshot
    pub fn status(&self) -> SequencerStatus {
        SequencerStatus {
            is_playing: self.is_playing(),
            duration: self.timeline.duration(),
            element_id: self.element_id.clone(),
            step_count: self.step_count,
        }
    }

    /// Whether the timeline is advancing
    pub fn is_playing(&self) -> bool {
        self.state == SequencerState::Playing
    }

    /// Current lifecycle state
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Playback position in milliseconds
    pub fn position(&self) -> f64 {
        self.position
    }

    /// The built timeline
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Base style
    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    /// Driven element
    pub fn element_id(&self) -> &ElementId {
        &self.element_id
    }

    /// Driven element's type
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }
}
