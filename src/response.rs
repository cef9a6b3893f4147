use std::collections::HashMap;

use crate::{
    models::{
        MatrixResponse, Query, RawSeries, ResampledSeries, UpstreamResponse, INSTANCE_LABEL,
        METRIC_NAME_LABEL,
    },
    resample::resample,
    ProxyError, Result,
};

/// Builds the matrix response for `query` from a (skew corrected) chart API
/// response. Series come back in [`sort_series`] order.
pub fn assemble(upstream: UpstreamResponse, query: &Query) -> Result<MatrixResponse> {
    if let Some(message) = upstream.error() {
        return Err(ProxyError::Upstream(message.to_string()));
    }

    let series = upstream
        .timeseries
        .iter()
        .map(|raw| ResampledSeries {
            metric: metric_labels(raw),
            values: resample(&raw.samples, query),
        })
        .collect();

    Ok(MatrixResponse::success(sort_series(series)))
}

/// Reconstructs Prometheus labels for a Wavefront series.
///
/// Tags are applied last, so a tag named `__name__` or `instance` replaces
/// the value taken from the series label or host.
pub fn metric_labels(raw: &RawSeries) -> HashMap<String, String> {
    let mut labels = HashMap::with_capacity(raw.tags.len() + 2);
    if !raw.label.is_empty() {
        labels.insert(METRIC_NAME_LABEL.to_string(), raw.label.clone());
    }
    if !raw.host.is_empty() {
        labels.insert(INSTANCE_LABEL.to_string(), raw.host.clone());
    }
    for (key, value) in &raw.tags {
        labels.insert(key.clone(), value.clone());
    }
    labels
}

/// Orders series by their labels so output does not depend on map
/// iteration order. Stable for series with identical labels.
pub fn sort_series(series: Vec<ResampledSeries>) -> Vec<ResampledSeries> {
    let mut keyed: Vec<(Vec<String>, ResampledSeries)> = series
        .into_iter()
        .map(|s| (sort_key(&s.metric), s))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, s)| s).collect()
}

/// Label entries sorted by name, flattened to `name, value, name, value, ...`.
pub fn sort_key(labels: &HashMap<String, String>) -> Vec<String> {
    let mut entries: Vec<(&String, &String)> = labels.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
        .into_iter()
        .flat_map(|(k, v)| [k.clone(), v.clone()])
        .collect()
}
