// SPDX-License-Identifier: MIT OR Apache-2.0
//! Diagnostic bridge: collects warnings and errors for the end-of-run summary.

use std::collections::BTreeMap;
use std::sync::mpsc;

/// A warning or error captured by the [`TracingBridge`] layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticEvent {
    /// The log level.
    pub level: tracing::Level,
    /// The formatted message.
    pub message: String,
    /// Element the event is about, if any.
    pub element: Option<String>,
    /// Step index, if any.
    pub step: Option<String>,
}

/// A `tracing_subscriber::Layer` that forwards warnings and errors over an
/// `mpsc` channel so the runner can summarize them at exit.
pub struct TracingBridge {
    sender: mpsc::Sender<DiagnosticEvent>,
}

impl TracingBridge {
    /// Create a new bridge and return `(layer, receiver)`.
    pub fn new() -> (Self, mpsc::Receiver<DiagnosticEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl<S> tracing_subscriber::Layer<S> for TracingBridge
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let level = *event.metadata().level();
        if level > tracing::Level::WARN {
            return;
        }

        let mut visitor = DiagnosticVisitor::default();
        event.record(&mut visitor);

        let message = if visitor.message.is_empty() {
            "(empty)".to_string()
        } else if visitor.detail.is_empty() {
            visitor.message
        } else {
            format!("{}: {}", visitor.message, visitor.detail)
        };

        let _ = self.sender.send(DiagnosticEvent {
            level,
            message,
            element: visitor.element,
            step: visitor.step,
        });
    }
}

/// Visitor that extracts the message and the element/step fields.
#[derive(Default)]
struct DiagnosticVisitor {
    message: String,
    detail: String,
    element: Option<String>,
    step: Option<String>,
}

impl DiagnosticVisitor {
    fn record(&mut self, name: &str, value: String) {
        match name {
            "message" => self.message = value,
            "element" => self.element = Some(value),
            "step" => self.step = Some(value),
            "error" => self.detail = value,
            _ => {}
        }
    }
}

impl tracing::field::Visit for DiagnosticVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.record(field.name(), format!("{:?}", value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.record(field.name(), value.to_string());
    }
}

/// Collected diagnostics, grouped per element
#[derive(Debug, Default)]
pub struct DiagnosticSummary {
    events: Vec<DiagnosticEvent>,
}

impl DiagnosticSummary {
    /// Drain everything the bridge has sent so far
    pub fn collect(receiver: &mpsc::Receiver<DiagnosticEvent>) -> Self {
        Self {
            events: receiver.try_iter().collect(),
        }
    }

    /// Number of warnings
    pub fn warnings(&self) -> usize {
        self.events
            .iter()
            .filter(|event| event.level == tracing::Level::WARN)
            .count()
    }

    /// Number of errors
    pub fn errors(&self) -> usize {
        self.events
            .iter()
            .filter(|event| event.level == tracing::Level::ERROR)
            .count()
    }

    /// Whether nothing was collected
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Render at most `max_entries` lines grouped by element
    pub fn render(&self, max_entries: usize) -> String {
        let mut grouped: BTreeMap<&str, Vec<&DiagnosticEvent>> = BTreeMap::new();
        for event in &self.events {
            grouped
                .entry(event.element.as_deref().unwrap_or("-"))
                .or_default()
                .push(event);
        }

        let mut out = format!(
            "{} warning(s), {} error(s)\n",
            self.warnings(),
            self.errors()
        );
        let mut printed = 0;
        for (element, events) in grouped {
            for event in events {
                if printed == max_entries {
                    out.push_str(&format!(
                        "... {} more\n",
                        self.events.len() - max_entries
                    ));
                    return out;
                }
                let step = event
                    .step
                    .as_deref()
                    .map(|step| format!(" step {step}"))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "[{}] element {element}{step}: {}\n",
                    event.level, event.message
                ));
                printed += 1;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_bridge_forwards_warnings_only() {
        let (bridge, receiver) = TracingBridge::new();
        let subscriber = tracing_subscriber::registry().with(bridge);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(element = "a", "built timeline");
            tracing::warn!(element = "a", step = 2, error = "unknown step type 'x'", "skipping step");
            tracing::error!(element = "b", "behavior must be an array; nothing built");
        });

        let summary = DiagnosticSummary::collect(&receiver);
        assert_eq!(summary.warnings(), 1);
        assert_eq!(summary.errors(), 1);

        let text = summary.render(10);
        assert!(text.starts_with("1 warning(s), 1 error(s)"));
        assert!(text.contains("element a step 2: skipping step: unknown step type 'x'"));
        assert!(text.contains("element b:"));
    }

    #[test]
    fn test_render_truncates() {
        let (bridge, receiver) = TracingBridge::new();
        let subscriber = tracing_subscriber::registry().with(bridge);
        tracing::subscriber::with_default(subscriber, || {
            for step in 0..5 {
                tracing::warn!(element = "a", step, "skipping step");
            }
        });

        let text = DiagnosticSummary::collect(&receiver).render(2);
        assert!(text.contains("... 3 more"));
    }
}
