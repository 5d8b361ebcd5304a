// SPDX-License-Identifier: MIT OR Apache-2.0
//! Easing curves and the named modulation catalog.

use crate::interp::Interpolation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Name of the curve used whenever a modulation cannot be resolved
pub const DEFAULT_EASING: &str = "ease-in-out";

/// An interpolation curve mapping linear progress to eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Easing {
    /// Constant speed
    Linear,
    /// Slow start
    EaseIn,
    /// Slow end
    EaseOut,
    /// Slow start and end
    EaseInOut,
    /// Overshoots slightly before settling
    BackOut,
    /// CSS-style cubic bezier with control points `(x1, y1)` and `(x2, y2)`
    CubicBezier {
        /// First control point x
        x1: f64,
        /// First control point y
        y1: f64,
        /// Second control point x
        x2: f64,
        /// Second control point y
        y2: f64,
    },
    /// Jump in `steps` equal increments
    Steps {
        /// Number of increments
        steps: u32,
    },
}

impl Default for Easing {
    fn default() -> Self {
        Self::EaseInOut
    }
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` to eased progress
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t * t,
            Self::EaseOut => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::BackOut => {
                const C1: f64 = 1.70158;
                const C3: f64 = C1 + 1.0;
                1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2)
            }
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(x1, y1, x2, y2, t),
            Self::Steps { steps } => {
                if steps == 0 {
                    return t;
                }
                let n = f64::from(steps);
                (t * n).floor().min(n) / n
            }
        }
    }
}

/// Solve the bezier for `x == t` and return the matching `y`.
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, t: f64) -> f64 {
    if t <= 0.0 || t >= 1.0 {
        return t;
    }

    // Bisection on the x curve; x(s) is monotonic for x1, x2 in [0, 1].
    let (x1, x2) = (x1.clamp(0.0, 1.0), x2.clamp(0.0, 1.0));
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    let mut s = t;
    for _ in 0..48 {
        let x = Interpolation::bezier(0.0, x1, x2, 1.0, s);
        if (x - t).abs() < 1e-7 {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }

    Interpolation::bezier(0.0, y1, y2, 1.0, s)
}

/// A modulation as written in a step: a bare name or a parameterized object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Modulation {
    /// Catalog name, e.g. `"ease-out"`
    Named(String),
    /// Object with a `type` field plus curve parameters
    Parameterized(serde_json::Map<String, serde_json::Value>),
}

/// Read-only table of named easing curves.
///
/// Resolution never fails a step: callers substitute their default curve when
/// [`EasingCatalog::resolve`] returns `None`.
#[derive(Debug, Clone)]
pub struct EasingCatalog {
    curves: IndexMap<String, Easing>,
}

impl EasingCatalog {
    /// Catalog with the built-in curves
    pub fn builtin() -> Self {
        let curves = [
            ("linear", Easing::Linear),
            ("ease", Easing::CubicBezier { x1: 0.25, y1: 0.1, x2: 0.25, y2: 1.0 }),
            ("ease-in", Easing::EaseIn),
            ("ease-out", Easing::EaseOut),
            ("ease-in-out", Easing::EaseInOut),
            ("back-out", Easing::BackOut),
        ]
        .into_iter()
        .map(|(name, easing)| (name.to_string(), easing))
        .collect();

        Self { curves }
    }

    /// Register or replace a named curve
    pub fn insert(&mut self, name: impl Into<String>, easing: Easing) {
        self.curves.insert(name.into(), easing);
    }

    /// Look up a plain name
    pub fn get(&self, name: &str) -> Option<Easing> {
        self.curves.get(name).copied()
    }

    /// Plain curve names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.curves.keys().map(String::as_str).collect()
    }

    /// Whether a name is known (including the parameterized kinds)
    pub fn contains(&self, name: &str) -> bool {
        self.curves.contains_key(name) || matches!(name, "cubic-bezier" | "steps")
    }

    /// Resolve a modulation as written in a step
    pub fn resolve(&self, modulation: &Modulation) -> Option<Easing> {
        match modulation {
            Modulation::Named(name) => self.get(name),
            Modulation::Parameterized(params) => self.resolve_parameterized(params),
        }
    }

    fn resolve_parameterized(
        &self,
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> Option<Easing> {
        let kind = params.get("type")?.as_str()?;
        match kind {
            "cubic-bezier" => {
                let points: Vec<f64> = match params.get("points") {
                    Some(serde_json::Value::Array(points)) => {
                        points.iter().filter_map(serde_json::Value::as_f64).collect()
                    }
                    _ => ["x1", "y1", "x2", "y2"]
                        .iter()
                        .filter_map(|k| params.get(*k).and_then(serde_json::Value::as_f64))
                        .collect(),
                };
                match points[..] {
                    [x1, y1, x2, y2] => Some(Easing::CubicBezier { x1, y1, x2, y2 }),
                    _ => None,
                }
            }
            "steps" => {
                let steps = params
                    .get("steps")
                    .or_else(|| params.get("count"))
                    .and_then(serde_json::Value::as_u64)?;
                u32::try_from(steps).ok().map(|steps| Easing::Steps { steps })
            }
            other => self.get(other),
        }
    }
}

impl Default for EasingCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn all() -> Vec<Easing> {
        vec![
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::BackOut,
            Easing::CubicBezier { x1: 0.42, y1: 0.0, x2: 0.58, y2: 1.0 },
        ]
    }

    #[test]
    fn test_endpoints_are_stable() {
        for easing in all() {
            assert!((easing.apply(0.0)).abs() < 1e-9, "{easing:?}");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-9, "{easing:?}");
        }
    }

    #[test]
    fn test_linear_bezier_matches_linear() {
        let easing = Easing::CubicBezier { x1: 0.0, y1: 0.0, x2: 1.0, y2: 1.0 };
        for t in [0.1, 0.25, 0.5, 0.9] {
            assert!((easing.apply(t) - t).abs() < 1e-4);
        }
    }

    #[test]
    fn test_steps() {
        let easing = Easing::Steps { steps: 4 };
        assert_eq!(easing.apply(0.1), 0.0);
        assert_eq!(easing.apply(0.3), 0.25);
        assert_eq!(easing.apply(1.0), 1.0);
    }

    #[test]
    fn test_named_lookup() {
        let catalog = EasingCatalog::builtin();
        assert_eq!(catalog.resolve(&Modulation::Named("wobble".into())), None);
        assert_eq!(
            catalog.resolve(&Modulation::Named("linear".into())),
            Some(Easing::Linear)
        );
        assert!(catalog.contains("steps"));
    }

    #[test]
    fn test_names_keep_registration_order() {
        let mut catalog = EasingCatalog::builtin();
        catalog.insert("snap", Easing::Steps { steps: 1 });
        assert_eq!(
            catalog.names(),
            vec!["linear", "ease", "ease-in", "ease-out", "ease-in-out", "back-out", "snap"]
        );
    }

    #[test]
    fn test_parameterized_modulations() {
        let catalog = EasingCatalog::builtin();

        let bezier: Modulation =
            serde_json::from_value(json!({"type": "cubic-bezier", "points": [0.1, 0.2, 0.3, 0.4]}))
                .unwrap();
        assert_eq!(
            catalog.resolve(&bezier),
            Some(Easing::CubicBezier { x1: 0.1, y1: 0.2, x2: 0.3, y2: 0.4 })
        );

        let steps: Modulation = serde_json::from_value(json!({"type": "steps", "steps": 5})).unwrap();
        assert_eq!(catalog.resolve(&steps), Some(Easing::Steps { steps: 5 }));

        let broken: Modulation = serde_json::from_value(json!({"type": "cubic-bezier"})).unwrap();
        assert_eq!(catalog.resolve(&broken), None);
    }
}
