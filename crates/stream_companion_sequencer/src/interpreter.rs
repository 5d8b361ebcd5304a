// SPDX-License-Identifier: MIT OR Apache-2.0
//! Step interpreter.
//!
//! Translates one behavior step into timeline operations. The interpreter
//! never fails the build: anything it cannot use is logged and skipped.

use crate::catalog::Catalogs;
use crate::config::SequencerConfig;
use crate::easing::{Easing, Modulation};
use crate::element::ElementId;
use crate::schema;
use crate::step::{PropertyAnimation, Step, StepError};
use crate::timeline::{TimelineHandle, Tween, Visibility};
use serde_json::Value;
use tracing::{debug, warn};

/// Result of interpreting one step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Operations were added; the cursor moved by `duration_ms`
    Scheduled {
        /// Time the step occupies
        duration_ms: f64,
    },
    /// Valid step with nothing to do (appear while shown, disappear while hidden)
    NoOp,
    /// Step could not be used
    Skipped(StepError),
}

/// Interprets behavior steps for one element.
pub struct StepInterpreter<'a> {
    catalogs: &'a Catalogs,
    config: &'a SequencerConfig,
    element: &'a ElementId,
}

impl<'a> StepInterpreter<'a> {
    /// Create an interpreter bound to an element's catalogs and defaults
    pub fn new(catalogs: &'a Catalogs, config: &'a SequencerConfig, element: &'a ElementId) -> Self {
        Self {
            catalogs,
            config,
            element,
        }
    }

    /// Interpret `raw` (the step at `index`) into `timeline`
    pub fn apply<T>(&self, timeline: &mut T, raw: &Value, index: usize) -> StepOutcome
    where
        T: TimelineHandle + ?Sized,
    {
        let step = match Step::parse(raw) {
            Ok(step) => step,
            Err(err) => return self.skip(index, err),
        };

        let start = timeline.cursor();
        let outcome = match &step {
            Step::Appear { animation, duration } => {
                if timeline.visibility() == Visibility::Shown {
                    debug!(element = %self.element, step = index, "appear while visible, nothing to do");
                    return StepOutcome::NoOp;
                }
                let name = animation.as_deref().unwrap_or(&self.config.appear_animation);
                let duration = duration.unwrap_or(self.config.appear_duration_ms);
                match self.schedule_preset(timeline, name, start, duration, index) {
                    Ok(()) => {
                        timeline.mark_visibility(start, true);
                        timeline.advance(duration);
                        StepOutcome::Scheduled { duration_ms: duration }
                    }
                    Err(err) => return self.skip(index, err),
                }
            }
            Step::Disappear { animation, duration } => {
                if timeline.visibility() == Visibility::Hidden {
                    debug!(element = %self.element, step = index, "disappear while hidden, nothing to do");
                    return StepOutcome::NoOp;
                }
                let name = animation.as_deref().unwrap_or(&self.config.disappear_animation);
                let duration = duration.unwrap_or(self.config.disappear_duration_ms);
                match self.schedule_preset(timeline, name, start, duration, index) {
                    Ok(()) => {
                        timeline.mark_visibility(start + duration, false);
                        timeline.advance(duration);
                        StepOutcome::Scheduled { duration_ms: duration }
                    }
                    Err(err) => return self.skip(index, err),
                }
            }
            Step::Animate { animation, duration } => {
                let duration = duration.unwrap_or(self.config.animate_duration_ms);
                match self.schedule_preset(timeline, animation, start, duration, index) {
                    Ok(()) => {
                        timeline.advance(duration);
                        StepOutcome::Scheduled { duration_ms: duration }
                    }
                    Err(err) => return self.skip(index, err),
                }
            }
            Step::Wait { duration } => {
                let duration = duration.unwrap_or(self.config.wait_duration_ms);
                timeline.advance(duration);
                StepOutcome::Scheduled { duration_ms: duration }
            }
            Step::Set { properties } => {
                timeline.add_set(start, properties.clone(), index);
                StepOutcome::Scheduled { duration_ms: 0.0 }
            }
            Step::AnimateProperty { entries } => {
                let mut longest: Option<f64> = None;
                for (entry_index, entry) in entries.iter().enumerate() {
                    let scheduled = entry
                        .as_ref()
                        .map_err(Clone::clone)
                        .and_then(|entry| self.schedule_entry(timeline, entry, start, index));
                    match scheduled {
                        Ok(end) => longest = Some(longest.map_or(end, |l: f64| l.max(end))),
                        Err(err) => {
                            warn!(
                                element = %self.element,
                                step = index,
                                entry = entry_index,
                                field = err.field(),
                                error = %err,
                                "skipping property entry"
                            );
                        }
                    }
                }
                match longest {
                    Some(duration) => {
                        timeline.advance(duration);
                        StepOutcome::Scheduled { duration_ms: duration }
                    }
                    None => {
                        return self.skip(
                            index,
                            StepError::MalformedEntry("no usable property entries".to_string()),
                        )
                    }
                }
            }
        };

        if let StepOutcome::Scheduled { duration_ms } = &outcome {
            debug!(
                element = %self.element,
                step = index,
                kind = step.kind(),
                start_ms = start,
                duration_ms = *duration_ms,
                "scheduled step"
            );
        }
        outcome
    }

    fn skip(&self, index: usize, err: StepError) -> StepOutcome {
        warn!(
            element = %self.element,
            step = index,
            field = err.field(),
            error = %err,
            "skipping step"
        );
        StepOutcome::Skipped(err)
    }

    fn schedule_preset<T>(
        &self,
        timeline: &mut T,
        name: &str,
        start: f64,
        duration: f64,
        index: usize,
    ) -> Result<(), StepError>
    where
        T: TimelineHandle + ?Sized,
    {
        let Some(preset) = self.catalogs.animations.get(name) else {
            return Err(StepError::UnknownAnimation(name.to_string()));
        };

        for track in &preset.tracks {
            timeline.add_tween(Tween {
                property: track.property.clone(),
                from: Some(track.from.clone()),
                to: track.to.clone(),
                start_ms: start,
                duration_ms: duration,
                easing: track.easing.unwrap_or_else(|| self.default_easing()),
                step: index,
            });
        }
        Ok(())
    }

    /// Schedule one entry; returns its end offset from the step start
    fn schedule_entry<T>(
        &self,
        timeline: &mut T,
        entry: &PropertyAnimation,
        start: f64,
        index: usize,
    ) -> Result<f64, StepError>
    where
        T: TimelineHandle + ?Sized,
    {
        if !schema::is_animatable(&entry.property) {
            return Err(StepError::UnsupportedProperty(entry.property.clone()));
        }

        timeline.add_tween(Tween {
            property: entry.property.clone(),
            from: entry.from.clone(),
            to: entry.to.clone(),
            start_ms: start + entry.delay,
            duration_ms: entry.duration,
            easing: self.easing_for(entry.modulation.as_ref(), index),
            step: index,
        });
        Ok(entry.end_ms())
    }

    fn easing_for(&self, modulation: Option<&Modulation>, index: usize) -> Easing {
        let Some(modulation) = modulation else {
            return self.default_easing();
        };
        match self.catalogs.easings.resolve(modulation) {
            Some(easing) => easing,
            None => {
                debug!(
                    element = %self.element,
                    step = index,
                    modulation = ?modulation,
                    fallback = %self.config.default_easing,
                    "unknown modulation, using default easing"
                );
                self.default_easing()
            }
        }
    }

    fn default_easing(&self) -> Easing {
        self.catalogs
            .easings
            .get(&self.config.default_easing)
            .unwrap_or_default()
    }
}
