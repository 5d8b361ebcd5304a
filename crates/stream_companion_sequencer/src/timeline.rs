// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recorded animation timeline.
//!
//! The interpreter writes into a [`TimelineHandle`]; the [`Timeline`] it
//! produces is a passive description that the sequencer samples each frame.

use crate::easing::Easing;
use crate::element::PropertyMap;
use crate::interp::Interpolation;
use crate::schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one built timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimelineId(pub Uuid);

impl TimelineId {
    /// Create a new random timeline ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TimelineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single property tween
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    /// Animated property
    pub property: String,
    /// Start value; `None` continues from the value in effect
    pub from: Option<Value>,
    /// End value
    pub to: Value,
    /// Absolute start in milliseconds
    pub start_ms: f64,
    /// Length in milliseconds
    pub duration_ms: f64,
    /// Curve
    pub easing: Easing,
    /// Index of the step that scheduled it
    pub step: usize,
}

impl Tween {
    /// Absolute end in milliseconds
    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }
}

/// Instant assignment of properties
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySet {
    /// Absolute time in milliseconds
    pub at_ms: f64,
    /// Values assigned
    pub properties: PropertyMap,
    /// Index of the step that scheduled it
    pub step: usize,
}

/// Scheduled timeline operation
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineOp {
    /// Interpolated change
    Tween(Tween),
    /// Instant change
    Set(PropertySet),
}

impl TimelineOp {
    /// Absolute start in milliseconds
    pub fn start_ms(&self) -> f64 {
        match self {
            Self::Tween(tween) => tween.start_ms,
            Self::Set(set) => set.at_ms,
        }
    }

    /// Absolute end in milliseconds
    pub fn end_ms(&self) -> f64 {
        match self {
            Self::Tween(tween) => tween.end_ms(),
            Self::Set(set) => set.at_ms,
        }
    }
}

/// Visibility as tracked while a behavior is being built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// No `appear` or `disappear` scheduled yet
    #[default]
    Implicit,
    /// Last mark shows the element
    Shown,
    /// Last mark hides the element
    Hidden,
}

/// Build-side interface the step interpreter writes to.
///
/// All times are absolute milliseconds from the start of the timeline.
pub trait TimelineHandle {
    /// Current insertion time
    fn cursor(&self) -> f64;

    /// Schedule a tween
    fn add_tween(&mut self, tween: Tween);

    /// Schedule an instant assignment
    fn add_set(&mut self, at_ms: f64, properties: PropertyMap, step: usize);

    /// Record a visibility change at `at_ms`
    fn mark_visibility(&mut self, at_ms: f64, visible: bool);

    /// Visibility after the last recorded mark
    fn visibility(&self) -> Visibility;

    /// Move the insertion cursor forward
    fn advance(&mut self, ms: f64);
}

/// A built timeline
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    id: TimelineId,
    ops: Vec<TimelineOp>,
    marks: Vec<(f64, bool)>,
    cursor: f64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self {
            id: TimelineId::new(),
            ops: Vec::new(),
            marks: Vec::new(),
            cursor: 0.0,
        }
    }

    /// Timeline identifier
    pub fn id(&self) -> TimelineId {
        self.id
    }

    /// Scheduled operations, ordered by start time
    pub fn ops(&self) -> &[TimelineOp] {
        &self.ops
    }

    /// Tweens only
    pub fn tweens(&self) -> impl Iterator<Item = &Tween> {
        self.ops.iter().filter_map(|op| match op {
            TimelineOp::Tween(tween) => Some(tween),
            TimelineOp::Set(_) => None,
        })
    }

    /// Total length in milliseconds
    pub fn duration(&self) -> f64 {
        self.ops
            .iter()
            .map(TimelineOp::end_ms)
            .chain(self.marks.iter().map(|(at, _)| *at))
            .fold(self.cursor, f64::max)
    }

    /// Whether nothing was scheduled and no time passes
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty() && self.marks.is_empty() && self.cursor <= 0.0
    }

    /// Whether an op touching `property` starts in `(after_ms, until_ms]`
    pub fn touches_between(&self, property: &str, after_ms: f64, until_ms: f64) -> bool {
        self.ops
            .iter()
            .filter(|op| op.start_ms() > after_ms && op.start_ms() <= until_ms)
            .any(|op| match op {
                TimelineOp::Tween(tween) => tween.property == property,
                TimelineOp::Set(set) => set.properties.contains_key(property),
            })
    }

    /// Whether the element is shown at `position_ms`.
    ///
    /// Before the first mark the element is visible, unless that first mark
    /// shows it (an entrance starts hidden).
    pub fn visible_at(&self, position_ms: f64) -> bool {
        let initial = !matches!(self.marks.first(), Some((_, true)));
        self.marks
            .iter()
            .take_while(|(at, _)| *at <= position_ms)
            .last()
            .map_or(initial, |(_, visible)| *visible)
    }

    /// Property values at `position_ms`, layered over `base`.
    ///
    /// Only properties the timeline touches, plus everything in `base`, appear
    /// in the result.
    pub fn sample(&self, position_ms: f64, base: &PropertyMap) -> PropertyMap {
        let mut frame = base.clone();

        for op in self.ops.iter().take_while(|op| op.start_ms() <= position_ms) {
            match op {
                TimelineOp::Set(set) => {
                    for (key, value) in &set.properties {
                        frame.insert(key.clone(), value.clone());
                    }
                }
                TimelineOp::Tween(tween) => {
                    let value = sample_tween(tween, position_ms, frame.get(&tween.property));
                    frame.insert(tween.property.clone(), value);
                }
            }
        }

        frame
    }

    fn insert_op(&mut self, op: TimelineOp) {
        let start = op.start_ms();
        let index = self.ops.partition_point(|existing| existing.start_ms() <= start);
        self.ops.insert(index, op);
    }
}

fn sample_tween(tween: &Tween, position_ms: f64, current: Option<&Value>) -> Value {
    if position_ms >= tween.end_ms() || tween.duration_ms <= 0.0 {
        return tween.to.clone();
    }

    let from = match (&tween.from, current) {
        (Some(from), _) => from.clone(),
        (None, Some(current)) => current.clone(),
        (None, None) => schema::neutral_value(&tween.property).unwrap_or(Value::Null),
    };
    let progress = (position_ms - tween.start_ms) / tween.duration_ms;
    Interpolation::lerp_value(&from, &tween.to, tween.easing.apply(progress))
}

impl TimelineHandle for Timeline {
    fn cursor(&self) -> f64 {
        self.cursor
    }

    fn add_tween(&mut self, tween: Tween) {
        self.insert_op(TimelineOp::Tween(tween));
    }

    fn add_set(&mut self, at_ms: f64, properties: PropertyMap, step: usize) {
        self.insert_op(TimelineOp::Set(PropertySet {
            at_ms,
            properties,
            step,
        }));
    }

    fn mark_visibility(&mut self, at_ms: f64, visible: bool) {
        let index = self.marks.partition_point(|(at, _)| *at <= at_ms);
        self.marks.insert(index, (at_ms, visible));
    }

    fn visibility(&self) -> Visibility {
        match self.marks.last() {
            None => Visibility::Implicit,
            Some((_, true)) => Visibility::Shown,
            Some((_, false)) => Visibility::Hidden,
        }
    }

    fn advance(&mut self, ms: f64) {
        self.cursor += ms.max(0.0);
    }
}
