// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless element host: logs every call instead of touching a DOM.

use indexmap::IndexMap;
use stream_companion_sequencer::{ElementHost, ElementId, PropertyMap};
use tracing::{debug, trace};

/// Host that keeps the last applied style per element and logs calls.
#[derive(Debug, Default)]
pub struct LoggingHost {
    styles: IndexMap<ElementId, PropertyMap>,
    rendered: IndexMap<ElementId, bool>,
    calls: usize,
}

impl LoggingHost {
    /// Create an empty host
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls received
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Elements currently on screen, in first-seen order
    pub fn visible(&self) -> Vec<&ElementId> {
        self.rendered
            .iter()
            .filter_map(|(id, rendered)| rendered.then_some(id))
            .collect()
    }

    /// Accumulated style for an element
    pub fn style(&self, element: &ElementId) -> Option<&PropertyMap> {
        self.styles.get(element)
    }
}

impl ElementHost for LoggingHost {
    fn apply_style(&mut self, element: &ElementId, style: &PropertyMap) {
        self.calls += 1;
        trace!(element = %element, properties = style.len(), "apply style");
        let current = self.styles.entry(element.clone()).or_default();
        for (key, value) in style {
            current.insert(key.clone(), value.clone());
        }
    }

    fn set_rendered(&mut self, element: &ElementId, rendered: bool) {
        self.calls += 1;
        let previous = self.rendered.insert(element.clone(), rendered);
        if previous != Some(rendered) {
            debug!(element = %element, rendered, "visibility changed");
        }
    }

    fn remove(&mut self, element: &ElementId) {
        self.calls += 1;
        self.styles.shift_remove(element);
        self.rendered.shift_remove(element);
        debug!(element = %element, "element removed");
    }
}
