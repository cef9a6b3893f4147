//! Step-function resampling of Wavefront samples onto the Prometheus grid.
//!
//! Wavefront reports values at its own, possibly irregular, times. For each
//! grid timestamp we take the most recent sample at or before it and assume
//! the value held constant since then. A sample older than one step is
//! considered stale and the grid point is left out rather than filled.
//! This is lossy: the value between two Wavefront points is not knowable.

use crate::models::{GridPoint, Query, Sample};

/// Resamples ascending `samples` onto the grid described by `query`.
pub fn resample(samples: &[Sample], query: &Query) -> Vec<GridPoint> {
    if samples.is_empty() {
        return Vec::new();
    }

    let mut points = Vec::new();
    // One past the latest sample known to be at or before the current grid
    // timestamp. Only moves forward since both sequences are ascending.
    let mut cursor = 1;
    for timestamp in query.grid() {
        while cursor < samples.len() && samples[cursor].timestamp <= timestamp {
            cursor += 1;
        }
        let candidate = &samples[cursor - 1];
        let age = timestamp - candidate.timestamp;
        if age >= 0.0 && age < query.step {
            points.push(GridPoint::new(timestamp, format_value(candidate.value)));
        }
    }
    points
}

/// Shortest decimal text that parses back to the same `f64`.
///
/// Switches to exponent form (`1e+06`, `2.5e-05`) when the decimal exponent
/// is below -4 or at least 6, with a signed exponent of at least two digits.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    } else if value == f64::INFINITY {
        return "+Inf".to_string();
    } else if value == f64::NEG_INFINITY {
        return "-Inf".to_string();
    }

    let scientific = format!("{:e}", value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    match exponent.parse::<i32>() {
        Ok(exp) if !(-4..6).contains(&exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        _ => value.to_string(),
    }
}
