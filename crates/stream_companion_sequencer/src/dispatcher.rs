// SPDX-License-Identifier: MIT OR Apache-2.0
//! Element update dispatcher.
//!
//! Receives full element states from the transport and decides, per element,
//! whether to rebuild and restart its sequencer, patch live properties, or
//! toggle playback.

use crate::catalog::Catalogs;
use crate::config::SequencerConfig;
use crate::element::{ElementId, ElementState, PropertyMap};
use crate::host::ElementHost;
use crate::schema::{self, ValidationReport};
use crate::sequencer::{Sequencer, SequencerState, SequencerStatus, TickOutcome};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors returned to the transport
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A live patch failed schema validation; nothing was applied
    #[error("invalid properties for element {element}: {}", .report.messages().join("; "))]
    InvalidProperties {
        /// Target element
        element: ElementId,
        /// Every violation found
        report: ValidationReport,
    },

    /// Message names an element the dispatcher does not track
    #[error("unknown element: {0}")]
    UnknownElement(ElementId),

    /// Message could not be decoded
    #[error("malformed overlay message: {0}")]
    Decode(#[from] serde_json::Error),
}

/// What an update did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// First sighting; built and started if `playing`
    Created {
        /// Whether playback started
        playing: bool,
    },
    /// Behavior changed while playing; rebuilt and restarted from step 0
    Restarted,
    /// Behavior changed while stopped; rebuilt, not started
    Rebuilt,
    /// Playing turned on
    Started,
    /// Playing turned off; stopped and hidden
    Stopped,
    /// Live properties patched without touching playback
    Patched {
        /// Properties pushed to the host
        applied: Vec<String>,
    },
    /// Properties changed while stopped; kept for the next run
    Stored,
    /// Nothing relevant changed
    Unchanged,
    /// Element stopped and removed
    Removed,
    /// Every element stopped and removed
    Cleared {
        /// Number of elements dropped
        count: usize,
    },
    /// Message carried nothing to act on
    Ignored,
}

/// Action attached to an `element_update` message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementAction {
    /// Full state replacement
    #[default]
    Update,
    /// Start playback
    Show,
    /// Stop playback
    Hide,
    /// Drop the element
    Delete,
}

/// Message pushed by the backend over the overlay socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayMessage {
    /// One element changed
    ElementUpdate {
        /// What happened
        #[serde(default)]
        action: ElementAction,
        /// Full element state
        element: ElementState,
    },
    /// A dashboard went live
    DashboardActivated {
        /// Dashboard id
        dashboard_id: i64,
    },
    /// The live dashboard was switched off; every element goes away
    DashboardDeactivated {
        /// Dashboard id
        dashboard_id: i64,
    },
}

impl OverlayMessage {
    /// Decode one JSON text frame
    pub fn parse(text: &str) -> Result<Self, DispatchError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug)]
struct TrackedElement {
    state: ElementState,
    sequencer: Sequencer,
}

/// Owns one sequencer per element.
pub struct Dispatcher {
    catalogs: Arc<Catalogs>,
    config: Arc<SequencerConfig>,
    elements: IndexMap<ElementId, TrackedElement>,
}

impl Dispatcher {
    /// Create a dispatcher sharing `catalogs` between all sequencers
    pub fn new(catalogs: Arc<Catalogs>, config: SequencerConfig) -> Self {
        Self {
            catalogs,
            config: Arc::new(config),
            elements: IndexMap::new(),
        }
    }

    /// Dispatcher with built-in catalogs and default config
    pub fn with_defaults() -> Self {
        Self::new(Catalogs::builtin().shared(), SequencerConfig::default())
    }

    fn sequencer_for(&self, state: &ElementState) -> Sequencer {
        Sequencer::new(
            state.id.clone(),
            state.element_type,
            state.properties.clone(),
            Arc::clone(&self.catalogs),
            Arc::clone(&self.config),
        )
    }

    /// Apply a full element state.
    ///
    /// A behavior change always wins over a property change: the element is
    /// rebuilt with the new properties as its starting style.
    pub fn on_element_update(
        &mut self,
        update: ElementState,
        host: &mut dyn ElementHost,
    ) -> Result<UpdateOutcome, DispatchError> {
        if !self.elements.contains_key(&update.id) {
            let mut sequencer = self.sequencer_for(&update);
            sequencer.build(&update.behavior);
            if update.playing {
                sequencer.play(host);
            }
            let playing = update.playing;
            info!(element = %update.id, playing, "tracking element");
            self.elements.insert(
                update.id.clone(),
                TrackedElement {
                    state: update,
                    sequencer,
                },
            );
            return Ok(UpdateOutcome::Created { playing });
        }

        let rebuild = self
            .elements
            .get(&update.id)
            .map(|tracked| {
                tracked.state.behavior != update.behavior
                    || tracked.state.element_type != update.element_type
            })
            .unwrap_or(false);
        if rebuild {
            return Ok(self.rebuild(update, host));
        }

        let Some(tracked) = self.elements.get_mut(&update.id) else {
            return Err(DispatchError::UnknownElement(update.id));
        };

        let outcome = match (tracked.state.playing, update.playing) {
            (true, false) => {
                tracked.sequencer.stop(host);
                host.set_rendered(&update.id, false);
                tracked.sequencer.set_base_properties(update.properties.clone());
                UpdateOutcome::Stopped
            }
            (false, true) => {
                tracked.sequencer.set_base_properties(update.properties.clone());
                if tracked.sequencer.state() == SequencerState::Idle {
                    tracked.sequencer.build(&update.behavior);
                }
                tracked.sequencer.play(host);
                UpdateOutcome::Started
            }
            (true, true) => {
                let changed = changed_properties(&tracked.state.properties, &update.properties);
                if changed.is_empty() {
                    UpdateOutcome::Unchanged
                } else {
                    let report = schema::validate(update.element_type, &changed);
                    if !report.is_ok() {
                        warn!(
                            element = %update.id,
                            errors = report.errors.len(),
                            "rejected live property update"
                        );
                        return Err(DispatchError::InvalidProperties {
                            element: update.id,
                            report,
                        });
                    }
                    let applied = tracked.sequencer.update_properties(&changed, host);
                    UpdateOutcome::Patched { applied }
                }
            }
            (false, false) => {
                if tracked.state.properties == update.properties {
                    UpdateOutcome::Unchanged
                } else {
                    tracked.sequencer.set_base_properties(update.properties.clone());
                    UpdateOutcome::Stored
                }
            }
        };

        debug!(element = %update.id, outcome = ?outcome, "element update");
        tracked.state = update;
        Ok(outcome)
    }

    fn rebuild(&mut self, update: ElementState, host: &mut dyn ElementHost) -> UpdateOutcome {
        let mut sequencer = self.sequencer_for(&update);
        if let Some(tracked) = self.elements.get_mut(&update.id) {
            tracked.sequencer.stop(host);
        }

        sequencer.build(&update.behavior);
        let outcome = if update.playing {
            sequencer.play(host);
            UpdateOutcome::Restarted
        } else {
            UpdateOutcome::Rebuilt
        };
        info!(element = %update.id, outcome = ?outcome, "behavior changed");

        self.elements.insert(
            update.id.clone(),
            TrackedElement {
                state: update,
                sequencer,
            },
        );
        outcome
    }

    /// Route one transport message
    pub fn handle_message(
        &mut self,
        message: OverlayMessage,
        host: &mut dyn ElementHost,
    ) -> Result<UpdateOutcome, DispatchError> {
        match message {
            OverlayMessage::ElementUpdate { action, mut element } => match action {
                ElementAction::Update => self.on_element_update(element, host),
                ElementAction::Show | ElementAction::Hide => {
                    element.playing = action == ElementAction::Show;
                    self.on_element_update(element, host)
                }
                ElementAction::Delete => self.remove(&element.id, host),
            },
            OverlayMessage::DashboardActivated { dashboard_id } => {
                info!(dashboard_id, "dashboard activated");
                Ok(UpdateOutcome::Ignored)
            }
            OverlayMessage::DashboardDeactivated { dashboard_id } => {
                let count = self.clear(host);
                info!(dashboard_id, count, "dashboard deactivated");
                Ok(UpdateOutcome::Cleared { count })
            }
        }
    }

    /// Stop and drop one element
    pub fn remove(
        &mut self,
        id: &ElementId,
        host: &mut dyn ElementHost,
    ) -> Result<UpdateOutcome, DispatchError> {
        let Some(mut tracked) = self.elements.shift_remove(id) else {
            return Err(DispatchError::UnknownElement(id.clone()));
        };
        tracked.sequencer.stop(host);
        host.remove(id);
        info!(element = %id, "removed element");
        Ok(UpdateOutcome::Removed)
    }

    /// Stop and drop every element; returns how many there were
    pub fn clear(&mut self, host: &mut dyn ElementHost) -> usize {
        let count = self.elements.len();
        for (id, mut tracked) in self.elements.drain(..) {
            tracked.sequencer.stop(host);
            host.remove(&id);
        }
        count
    }

    /// Advance every playing sequencer; returns the ids that finished
    pub fn tick(&mut self, delta_ms: f64, host: &mut dyn ElementHost) -> Vec<ElementId> {
        self.elements
            .iter_mut()
            .filter_map(|(id, tracked)| {
                (tracked.sequencer.tick(delta_ms, host) == TickOutcome::Completed)
                    .then(|| id.clone())
            })
            .collect()
    }

    /// Whether any sequencer is advancing
    pub fn any_playing(&self) -> bool {
        self.elements.values().any(|tracked| tracked.sequencer.is_playing())
    }

    /// Diagnostic snapshot for one element
    pub fn status(&self, id: &ElementId) -> Option<SequencerStatus> {
        self.elements.get(id).map(|tracked| tracked.sequencer.status())
    }

    /// Diagnostic snapshots in arrival order
    pub fn statuses(&self) -> Vec<SequencerStatus> {
        self.elements
            .values()
            .map(|tracked| tracked.sequencer.status())
            .collect()
    }

    /// Borrow an element's sequencer
    pub fn sequencer(&self, id: &ElementId) -> Option<&Sequencer> {
        self.elements.get(id).map(|tracked| &tracked.sequencer)
    }

    /// Number of tracked elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether no elements are tracked
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Keys whose value differs from `old` (added or changed; removals are not
/// patchable and wait for the next rebuild)
fn changed_properties(old: &PropertyMap, new: &PropertyMap) -> PropertyMap {
    new.iter()
        .filter(|(key, value)| old.get(key.as_str()) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use crate::host::{HostCall, RecordingHost};
    use serde_json::json;

    fn card(id: u64) -> ElementState {
        ElementState::new(id, ElementType::Card)
            .with_property("color", json!("#000000"))
            .with_behavior(json!([
                {"type": "appear", "duration": 500},
                {"type": "animate_property", "properties": [
                    {"property": "opacity", "from": 1, "to": 0.5, "duration": 2000}
                ]}
            ]))
    }

    #[test]
    fn test_new_playing_element_starts() {
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        let outcome = dispatcher
            .on_element_update(card(1).with_playing(true), &mut host)
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Created { playing: true });
        assert!(dispatcher.status(&ElementId::from(1u64)).unwrap().is_playing);
    }

    #[test]
    fn test_behavior_change_restarts_from_zero() {
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        dispatcher.on_element_update(card(1).with_playing(true), &mut host).unwrap();
        dispatcher.tick(1200.0, &mut host);

        let update = card(1)
            .with_playing(true)
            .with_behavior(json!([{"type": "wait", "duration": 300}]));
        let outcome = dispatcher.on_element_update(update, &mut host).unwrap();

        assert_eq!(outcome, UpdateOutcome::Restarted);
        let seq = dispatcher.sequencer(&ElementId::from(1u64)).unwrap();
        assert_eq!(seq.position(), 0.0);
        assert!(seq.is_playing());
        assert_eq!(seq.status().duration, 300.0);
    }

    #[test]
    fn test_behavior_change_wins_over_properties() {
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        dispatcher.on_element_update(card(1).with_playing(true), &mut host).unwrap();

        let update = card(1)
            .with_playing(true)
            .with_property("color", json!("#ff0000"))
            .with_behavior(json!([{"type": "wait", "duration": 300}]));
        let outcome = dispatcher.on_element_update(update, &mut host).unwrap();

        assert_eq!(outcome, UpdateOutcome::Restarted);
        let seq = dispatcher.sequencer(&ElementId::from(1u64)).unwrap();
        assert_eq!(seq.properties()["color"], json!("#ff0000"));
    }

    #[test]
    fn test_live_color_update_keeps_position() {
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        dispatcher.on_element_update(card(1).with_playing(true), &mut host).unwrap();
        dispatcher.tick(1200.0, &mut host);

        let update = card(1)
            .with_playing(true)
            .with_property("color", json!("#ff0000"));
        let outcome = dispatcher.on_element_update(update, &mut host).unwrap();

        assert_eq!(
            outcome,
            UpdateOutcome::Patched {
                applied: vec!["color".to_string()]
            }
        );
        let id = ElementId::from(1u64);
        assert_eq!(dispatcher.sequencer(&id).unwrap().position(), 1200.0);
        assert!(dispatcher.status(&id).unwrap().is_playing);
        assert_eq!(host.style(&id)["color"], json!("#ff0000"));
    }

    #[test]
    fn test_invalid_live_update_applies_nothing() {
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        dispatcher.on_element_update(card(1).with_playing(true), &mut host).unwrap();
        host.clear();

        let update = card(1)
            .with_playing(true)
            .with_property("foo", json!(1))
            .with_property("opacity", json!(2));
        let err = dispatcher.on_element_update(update, &mut host).unwrap_err();

        match err {
            DispatchError::InvalidProperties { report, .. } => assert_eq!(report.errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(host.calls().is_empty());
        let seq = dispatcher.sequencer(&ElementId::from(1u64)).unwrap();
        assert!(!seq.properties().contains_key("opacity"));
    }

    #[test]
    fn test_toggle_playing_off_resets_opacity() {
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        dispatcher.on_element_update(card(1).with_playing(true), &mut host).unwrap();
        dispatcher.tick(800.0, &mut host);

        let outcome = dispatcher
            .on_element_update(card(1).with_playing(false), &mut host)
            .unwrap();

        let id = ElementId::from(1u64);
        assert_eq!(outcome, UpdateOutcome::Stopped);
        assert_eq!(host.style(&id)["opacity"], json!(0));
        assert_eq!(host.rendered(&id), Some(false));
        assert!(!dispatcher.status(&id).unwrap().is_playing);
    }

    #[test]
    fn test_toggle_playing_on_starts_from_zero() {
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        dispatcher.on_element_update(card(1), &mut host).unwrap();
        assert!(host.calls().is_empty());

        let outcome = dispatcher
            .on_element_update(card(1).with_playing(true), &mut host)
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Started);
        assert_eq!(dispatcher.sequencer(&ElementId::from(1u64)).unwrap().position(), 0.0);
    }

    #[test]
    fn test_stopped_property_change_is_stored() {
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        dispatcher.on_element_update(card(1), &mut host).unwrap();
        let outcome = dispatcher
            .on_element_update(card(1).with_property("color", json!("#123456")), &mut host)
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Stored);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_identical_update_is_unchanged() {
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        dispatcher.on_element_update(card(1).with_playing(true), &mut host).unwrap();
        let outcome = dispatcher
            .on_element_update(card(1).with_playing(true), &mut host)
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Unchanged);
    }

    #[test]
    fn test_delete_message_removes_element() {
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        dispatcher.on_element_update(card(1).with_playing(true), &mut host).unwrap();

        let message = OverlayMessage::parse(
            r#"{"type": "element_update", "action": "delete",
                "element": {"id": 1, "element_type": "card"}}"#,
        )
        .unwrap();
        let outcome = dispatcher.handle_message(message, &mut host).unwrap();

        assert_eq!(outcome, UpdateOutcome::Removed);
        assert!(dispatcher.is_empty());
        assert!(matches!(host.calls().last(), Some(HostCall::Remove { .. })));
    }

    #[test]
    fn test_show_and_hide_actions_force_playing() {
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        let show = OverlayMessage::ElementUpdate {
            action: ElementAction::Show,
            element: card(3),
        };
        assert_eq!(
            dispatcher.handle_message(show, &mut host).unwrap(),
            UpdateOutcome::Created { playing: true }
        );

        let hide = OverlayMessage::ElementUpdate {
            action: ElementAction::Hide,
            element: card(3).with_playing(true),
        };
        assert_eq!(
            dispatcher.handle_message(hide, &mut host).unwrap(),
            UpdateOutcome::Stopped
        );
    }

    #[test]
    fn test_dashboard_deactivated_clears_everything() {
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        dispatcher.on_element_update(card(1).with_playing(true), &mut host).unwrap();
        dispatcher.on_element_update(card(2), &mut host).unwrap();

        let message =
            OverlayMessage::parse(r#"{"type": "dashboard_deactivated", "dashboard_id": 4}"#).unwrap();
        assert_eq!(
            dispatcher.handle_message(message, &mut host).unwrap(),
            UpdateOutcome::Cleared { count: 2 }
        );
        assert!(dispatcher.statuses().is_empty());
    }

    #[test]
    fn test_unknown_delete_is_an_error() {
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        let err = dispatcher.remove(&ElementId::from(9u64), &mut host).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownElement(_)));
    }

    #[test]
    fn test_tick_reports_completions() {
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        dispatcher.on_element_update(card(1).with_playing(true), &mut host).unwrap();
        assert!(dispatcher.tick(1000.0, &mut host).is_empty());
        assert_eq!(dispatcher.tick(1500.0, &mut host), vec![ElementId::from(1u64)]);
        assert!(!dispatcher.any_playing());
    }
}
