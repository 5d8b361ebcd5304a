// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless runner: replays newline-delimited overlay messages.
//!
//! Each input line is either an overlay message as the backend would push it
//! over the socket, or a control line `{"type": "advance", "ms": N}` that
//! moves the clock forward at the configured frame rate.

use crate::settings::OverlaySettings;
use serde::Deserialize;
use serde_json::Value;
use std::io::BufRead;
use stream_companion_sequencer::{
    Catalogs, Dispatcher, ElementHost, OverlayMessage, SequencerStatus, UpdateOutcome,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Runner errors. Bad lines are logged and counted, not fatal.
#[derive(Debug, Error)]
pub enum RunError {
    /// Input could not be read
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ControlLine {
    Advance { ms: f64 },
}

/// Totals for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Messages dispatched successfully
    pub dispatched: usize,
    /// Lines that failed to decode or were rejected
    pub rejected: usize,
    /// Simulated milliseconds
    pub elapsed_ms: f64,
    /// Final per-element status
    pub statuses: Vec<SequencerStatus>,
}

/// Replays overlay input against a dispatcher.
pub struct Runner<H> {
    dispatcher: Dispatcher,
    host: H,
    frame_ms: f64,
    drain_limit_ms: f64,
    elapsed_ms: f64,
}

impl<H: ElementHost> Runner<H> {
    /// Create a runner from settings
    pub fn new(settings: &OverlaySettings, host: H) -> Self {
        Self {
            dispatcher: Dispatcher::new(Catalogs::builtin().shared(), settings.sequencer.clone()),
            host,
            frame_ms: settings.frame_ms(),
            drain_limit_ms: settings.drain_limit_ms.max(0.0),
            elapsed_ms: 0.0,
        }
    }

    /// Process every line, then let running sequences finish
    pub fn run(&mut self, input: impl BufRead) -> Result<RunReport, RunError> {
        let mut report = RunReport::default();

        for (index, line) in input.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match self.handle_line(line) {
                Ok(outcome) => {
                    debug!(line = index + 1, outcome = ?outcome, "dispatched");
                    report.dispatched += 1;
                }
                Err(message) => {
                    warn!(line = index + 1, error = %message, "rejected input line");
                    report.rejected += 1;
                }
            }
        }

        self.drain();
        report.elapsed_ms = self.elapsed_ms;
        report.statuses = self.dispatcher.statuses();
        info!(
            dispatched = report.dispatched,
            rejected = report.rejected,
            elapsed_ms = report.elapsed_ms,
            "run finished"
        );
        Ok(report)
    }

    fn handle_line(&mut self, line: &str) -> Result<Option<UpdateOutcome>, String> {
        let value: Value = serde_json::from_str(line).map_err(|e| e.to_string())?;
        if value.get("type").and_then(Value::as_str) == Some("advance") {
            let ControlLine::Advance { ms } =
                serde_json::from_value(value).map_err(|e| e.to_string())?;
            self.advance(ms);
            return Ok(None);
        }

        let message: OverlayMessage = serde_json::from_value(value).map_err(|e| e.to_string())?;
        self.dispatcher
            .handle_message(message, &mut self.host)
            .map(Some)
            .map_err(|e| e.to_string())
    }

    /// Tick every sequencer for `ms` in frame-sized steps
    pub fn advance(&mut self, ms: f64) {
        let mut remaining = ms.max(0.0);
        while remaining > 0.0 {
            let delta = remaining.min(self.frame_ms);
            for id in self.dispatcher.tick(delta, &mut self.host) {
                debug!(element = %id, at_ms = self.elapsed_ms + delta, "sequence finished");
            }
            self.elapsed_ms += delta;
            remaining -= delta;
        }
    }

    fn drain(&mut self) {
        let mut drained = 0.0;
        while self.dispatcher.any_playing() && drained < self.drain_limit_ms {
            self.advance(self.frame_ms);
            drained += self.frame_ms;
        }
        if self.dispatcher.any_playing() {
            warn!(limit_ms = self.drain_limit_ms, "sequences still playing after drain limit");
        }
    }

    /// The dispatcher, for inspection
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The host, for inspection
    pub fn host(&self) -> &H {
        &self.host
    }
}
