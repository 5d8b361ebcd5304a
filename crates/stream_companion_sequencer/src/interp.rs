// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interpolation of property values.

use serde_json::{Map, Number, Value};

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * t
    }

    /// Cubic bezier interpolation
    pub fn bezier(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        p0 * mt3 + 3.0 * p1 * mt2 * t + 3.0 * p2 * mt * t2 + p3 * t3
    }

    /// Interpolate RGB colors channel by channel
    pub fn lerp_rgb(a: [u8; 3], b: [u8; 3], t: f64) -> [u8; 3] {
        let channel = |i: usize| {
            Self::lerp(f64::from(a[i]), f64::from(b[i]), t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        [channel(0), channel(1), channel(2)]
    }

    /// Interpolate two JSON property values at eased progress `t`.
    ///
    /// Numbers and `#rgb`/`#rrggbb` colors blend; objects blend field by field
    /// (e.g. `position`); anything else snaps to `to` once `t` reaches 1.
    pub fn lerp_value(from: &Value, to: &Value, t: f64) -> Value {
        if t >= 1.0 {
            return to.clone();
        }

        match (from, to) {
            (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => number(Self::lerp(a, b, t)),
                _ => from.clone(),
            },
            (Value::String(a), Value::String(b)) => match (parse_hex_color(a), parse_hex_color(b)) {
                (Some(a), Some(b)) => Value::String(format_hex_color(Self::lerp_rgb(a, b, t))),
                _ => from.clone(),
            },
            (Value::Object(a), Value::Object(b)) => {
                let mut out: Map<String, Value> = a.clone();
                for (key, target) in b {
                    let blended = match a.get(key) {
                        Some(start) => Self::lerp_value(start, target, t),
                        None => target.clone(),
                    };
                    out.insert(key.clone(), blended);
                }
                Value::Object(out)
            }
            _ => from.clone(),
        }
    }
}

fn number(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Parse `#rgb` or `#rrggbb`
pub fn parse_hex_color(text: &str) -> Option<[u8; 3]> {
    let hex = text.strip_prefix('#')?;
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(rgb)
        }
        6 => {
            let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            Some([channel(0)?, channel(2)?, channel(4)?])
        }
        _ => None,
    }
}

/// Format as lowercase `#rrggbb`
pub fn format_hex_color(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_blend() {
        assert_eq!(Interpolation::lerp_value(&json!(0), &json!(10), 0.5), json!(5.0));
        assert_eq!(Interpolation::lerp_value(&json!(0), &json!(10), 1.0), json!(10));
    }

    #[test]
    fn test_colors_blend() {
        let mid = Interpolation::lerp_value(&json!("#000000"), &json!("#ffffff"), 0.5);
        assert_eq!(mid, json!("#808080"));
        assert_eq!(parse_hex_color("#f00"), Some([255, 0, 0]));
        assert_eq!(parse_hex_color("red"), None);
    }

    #[test]
    fn test_objects_blend_per_field() {
        let from = json!({"x": 0.0, "y": 0.0, "anchor": "center"});
        let to = json!({"x": 1.0, "y": 0.5});
        let mid = Interpolation::lerp_value(&from, &to, 0.5);
        assert_eq!(mid, json!({"x": 0.5, "y": 0.25, "anchor": "center"}));
    }

    #[test]
    fn test_discrete_values_snap_at_end() {
        assert_eq!(Interpolation::lerp_value(&json!("left"), &json!("right"), 0.9), json!("left"));
        assert_eq!(Interpolation::lerp_value(&json!("left"), &json!("right"), 1.0), json!("right"));
    }
}
