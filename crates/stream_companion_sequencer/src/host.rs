// SPDX-License-Identifier: MIT OR Apache-2.0
//! Outbound interface to whatever renders elements.

use crate::element::{ElementId, PropertyMap};

/// Receiver of rendered frames.
///
/// The sequencer calls [`apply_style`](ElementHost::apply_style) with the full
/// sampled style on every rendered frame and with partial patches for live
/// property updates.
pub trait ElementHost {
    /// Apply style values to an element
    fn apply_style(&mut self, element: &ElementId, style: &PropertyMap);

    /// Show or hide an element
    fn set_rendered(&mut self, element: &ElementId, rendered: bool);

    /// Drop an element entirely
    fn remove(&mut self, element: &ElementId) {
        self.set_rendered(element, false);
    }
}

/// One call received by a [`RecordingHost`]
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    /// [`ElementHost::apply_style`]
    ApplyStyle {
        /// Target element
        element: ElementId,
        /// Applied values
        style: PropertyMap,
    },
    /// [`ElementHost::set_rendered`]
    SetRendered {
        /// Target element
        element: ElementId,
        /// New visibility
        rendered: bool,
    },
    /// [`ElementHost::remove`]
    Remove {
        /// Target element
        element: ElementId,
    },
}

impl HostCall {
    /// Element the call targets
    pub fn element(&self) -> &ElementId {
        match self {
            Self::ApplyStyle { element, .. }
            | Self::SetRendered { element, .. }
            | Self::Remove { element } => element,
        }
    }
}

/// Host that records every call, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    calls: Vec<HostCall>,
}

impl RecordingHost {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call in order
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    /// Forget recorded calls
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Most recent style values pushed for `element`, merged over time
    pub fn style(&self, element: &ElementId) -> PropertyMap {
        let mut style = PropertyMap::new();
        for call in &self.calls {
            if let HostCall::ApplyStyle { element: target, style: applied } = call {
                if target == element {
                    for (key, value) in applied {
                        style.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        style
    }

    /// Last visibility set for `element`, `None` if never set
    pub fn rendered(&self, element: &ElementId) -> Option<bool> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::SetRendered { element: target, rendered } if target == element => {
                Some(*rendered)
            }
            _ => None,
        })
    }

    /// Whether `element` was removed
    pub fn removed(&self, element: &ElementId) -> bool {
        self.calls
            .iter()
            .any(|call| matches!(call, HostCall::Remove { element: target } if target == element))
    }
}

impl ElementHost for RecordingHost {
    fn apply_style(&mut self, element: &ElementId, style: &PropertyMap) {
        self.calls.push(HostCall::ApplyStyle {
            element: element.clone(),
            style: style.clone(),
        });
    }

    fn set_rendered(&mut self, element: &ElementId, rendered: bool) {
        self.calls.push(HostCall::SetRendered {
            element: element.clone(),
            rendered,
        });
    }

    fn remove(&mut self, element: &ElementId) {
        self.calls.push(HostCall::Remove {
            element: element.clone(),
        });
    }
}
