//! Conversion between the Prometheus and Wavefront time models.

use crate::models::{Granularity, Query, RawSeries, TranslatedQuery};

/// Wavefront's first sample may land strictly after the nominal start. Asking
/// for this much extra history keeps the first grid point fillable.
pub const LEAD_IN_SECONDS: f64 = 15.0;

/// Maps a query onto Wavefront's window.
///
/// `skew_seconds` is how much earlier the Wavefront clock runs than ours, so
/// the window is moved earlier by that amount. Prometheus' end is inclusive
/// and Wavefront's is exclusive, hence the extra second on `end_ms`.
/// Granularity is always one second; the caller's step is applied later by
/// the resampler.
pub fn translate(query: &Query, skew_seconds: f64) -> TranslatedQuery {
    TranslatedQuery {
        expression: query.expression.clone(),
        start_ms: to_millis(query.start - LEAD_IN_SECONDS - skew_seconds),
        end_ms: to_millis(query.end + 1.0 - skew_seconds),
        granularity: Granularity::Second,
    }
}

/// Moves Wavefront sample timestamps back onto our clock. Must run before
/// resampling.
pub fn correct_skew(series: &mut [RawSeries], skew_seconds: f64) {
    if skew_seconds == 0.0 {
        return;
    }
    for sample in series.iter_mut().flat_map(|s| s.samples.iter_mut()) {
        sample.timestamp += skew_seconds;
    }
}

fn to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).floor() as i64
}
