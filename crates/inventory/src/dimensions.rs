//! Free-form size strings → physical shapes → linear/areal/volumetric metrics.
//!
//! A size string is two or three tokens separated by `x`, `×`, `*` or the
//! Cyrillic `х`. Two tokens describe a log (diameter × length), three describe
//! sawn lumber (height × width × length). Each token carries an optional unit
//! marker; unmarked numbers are millimeters. Malformed input is a valid "no
//! measurement" outcome, never an error.

use std::f64::consts::PI;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Parsed shape, every dimension in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DimensionSpec {
    Cylindrical { diameter: f64, length: f64 },
    Rectangular { height: f64, width: f64, length: f64 },
}

/// Derived metrics, each rounded to 3 fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    /// Running meters.
    pub linear: Option<f64>,
    /// Square meters.
    pub area: Option<f64>,
    /// Cubic meters.
    pub volume: Option<f64>,
}

impl Metrics {
    /// Multiply every present metric by `factor`, re-rounding each result.
    pub fn scaled(&self, factor: f64) -> Metrics {
        let scale = |value: Option<f64>| value.and_then(|v| round3(v * factor));
        Metrics {
            linear: scale(self.linear),
            area: scale(self.area),
            volume: scale(self.volume),
        }
    }
}

/// Round half away from zero to 3 fractional digits.
///
/// Rounds the exact binary value of `value`. Non-finite input has no rounded
/// value. Magnitudes beyond `Decimal`'s range carry no fractional digits and
/// are returned unchanged. Shared by per-unit and total metrics so both round
/// identically.
pub fn round3(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    match Decimal::from_f64_retain(value) {
        Some(exact) => exact
            .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
            .to_f64(),
        None => Some(value),
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, 'x' | 'X' | '×' | '*' | 'х' | 'Х')
}

/// Parse a raw size string into a shape.
pub fn parse_dimensions(raw: &str) -> Option<DimensionSpec> {
    let tokens: Vec<&str> = raw
        .split(is_separator)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    match tokens.as_slice() {
        [diameter, length] => Some(DimensionSpec::Cylindrical {
            diameter: positive_meters(diameter)?,
            length: positive_meters(length)?,
        }),
        [height, width, length] => Some(DimensionSpec::Rectangular {
            height: positive_meters(height)?,
            width: positive_meters(width)?,
            length: positive_meters(length)?,
        }),
        _ => None,
    }
}

fn positive_meters(token: &str) -> Option<f64> {
    token_to_meters(token).filter(|m| m.is_finite() && *m > 0.0)
}

fn token_to_meters(token: &str) -> Option<f64> {
    let s = token.trim().to_lowercase();
    let numeric: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    let value: f64 = numeric.replacen(',', ".", 1).parse().ok()?;

    let meters = if s.contains("мм") || s.contains("mm") {
        value / 1000.0
    } else if s.contains("см") || s.contains("cm") {
        value / 100.0
    } else if ends_with_bare_meter(&s) {
        value
    } else {
        value / 1000.0
    };
    Some(meters)
}

/// `"6м"` / `"6m"`: a meter marker directly after a digit (or alone).
fn ends_with_bare_meter(s: &str) -> bool {
    let mut rev = s.chars().rev();
    matches!(rev.next(), Some('м' | 'm')) && rev.next().is_none_or(|c| c.is_ascii_digit())
}

/// Derive metrics from a shape.
///
/// - cylindrical: `linear = l`, `area = π·d·l` (lateral surface), `volume = π·(d/2)²·l`
/// - rectangular: `linear = l`, `area = w·l`, `volume = h·w·l`
pub fn derive_metrics(spec: &DimensionSpec) -> Metrics {
    match *spec {
        DimensionSpec::Cylindrical { diameter, length } => Metrics {
            linear: round3(length),
            area: round3(PI * diameter * length),
            volume: round3(PI * (diameter / 2.0).powi(2) * length),
        },
        DimensionSpec::Rectangular {
            height,
            width,
            length,
        } => Metrics {
            linear: round3(length),
            area: round3(width * length),
            volume: round3(height * width * length),
        },
    }
}

/// Parse + derive in one step; absent or unparsable sizes have no metrics.
pub fn metrics_for_size(raw: Option<&str>) -> Option<Metrics> {
    let spec = parse_dimensions(raw?)?;
    Some(derive_metrics(&spec))
}
