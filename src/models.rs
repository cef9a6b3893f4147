use serde::{ser::SerializeTuple, Deserialize, Serialize, Serializer};
use std::collections::HashMap;

/// Label carrying the Wavefront series label.
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Label carrying the Wavefront source host.
pub const INSTANCE_LABEL: &str = "instance";

/// A validated range query, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub start: f64,
    pub end: f64,
    pub step: f64,
    pub expression: String,
}

impl Query {
    /// Number of grid points in `[start, end]` at `step` spacing.
    pub fn grid_len(&self) -> usize {
        (((self.end - self.start) / self.step).floor() as usize).saturating_add(1)
    }

    /// The grid timestamps the caller expects values at.
    pub fn grid(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.grid_len()).map(move |i| self.start + i as f64 * self.step)
    }
}

/// Wavefront's native sampling resolution. Queries are always issued at
/// one-second granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Second,
}

impl Granularity {
    /// Value of the `g` parameter on the chart API.
    pub fn as_param(&self) -> &'static str {
        match self {
            Granularity::Second => "s",
        }
    }
}

/// A query in Wavefront's time model: epoch milliseconds, exclusive end.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedQuery {
    pub expression: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub granularity: Granularity,
}

/// A raw `[timestamp, value]` pair as reported by Wavefront.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "(f64, f64)")]
pub struct Sample {
    pub timestamp: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl From<(f64, f64)> for Sample {
    fn from((timestamp, value): (f64, f64)) -> Self {
        Self { timestamp, value }
    }
}

/// One series from the chart API. Samples are expected in ascending
/// timestamp order; this is not checked.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSeries {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default, rename = "data")]
    pub samples: Vec<Sample>,
}

/// Body of a chart API response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpstreamResponse {
    #[serde(default)]
    pub timeseries: Vec<RawSeries>,
    #[serde(rename = "errorType", default)]
    pub error_type: Option<String>,
    #[serde(rename = "errorMessage", default)]
    pub error_message: Option<String>,
}

impl UpstreamResponse {
    pub fn with_series(timeseries: Vec<RawSeries>) -> Self {
        Self {
            timeseries,
            ..Default::default()
        }
    }

    pub fn with_error(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timeseries: Vec::new(),
            error_type: Some(error_type.into()),
            error_message: Some(message.into()),
        }
    }

    /// The upstream message, if the response reports a query-level error.
    pub fn error(&self) -> Option<&str> {
        match self.error_type.as_deref() {
            Some(kind) if !kind.is_empty() => {
                Some(self.error_message.as_deref().unwrap_or_default())
            }
            _ => None,
        }
    }
}

/// A `[timestamp, "value"]` pair on the caller's grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    pub timestamp: f64,
    pub value: String,
}

impl GridPoint {
    pub fn new(timestamp: f64, value: impl Into<String>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }
}

// Whole-second timestamps are written as integers, the way Prometheus does.
impl Serialize for GridPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        if self.timestamp.fract() == 0.0 && self.timestamp.abs() < 9.0e15 {
            tuple.serialize_element(&(self.timestamp as i64))?;
        } else {
            tuple.serialize_element(&self.timestamp)?;
        }
        tuple.serialize_element(&self.value)?;
        tuple.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResampledSeries {
    pub metric: HashMap<String, String>,
    pub values: Vec<GridPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixData {
    #[serde(rename = "resultType")]
    pub result_type: &'static str,
    pub result: Vec<ResampledSeries>,
}

/// Successful `query_range` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixResponse {
    pub status: &'static str,
    pub data: MatrixData,
}

impl MatrixResponse {
    pub fn success(result: Vec<ResampledSeries>) -> Self {
        Self {
            status: "success",
            data: MatrixData {
                result_type: "matrix",
                result,
            },
        }
    }

    pub fn series(&self) -> &[ResampledSeries] {
        &self.data.result
    }
}

/// Failed `query_range` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub status: String,
    #[serde(rename = "errorType")]
    pub error_type: String,
    pub error: String,
}

impl ErrorPayload {
    pub fn new(error_type: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error_type: error_type.into(),
            error: error.into(),
        }
    }

    pub fn bad_data(error: impl Into<String>) -> Self {
        Self::new("bad_data", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn query(start: f64, end: f64, step: f64) -> Query {
        Query {
            start,
            end,
            step,
            expression: "ts(cpu.load)".to_string(),
        }
    }

    #[test]
    fn test_grid_covers_inclusive_end() {
        let grid: Vec<f64> = query(100.0, 130.0, 10.0).grid().collect();
        assert_eq!(grid, vec![100.0, 110.0, 120.0, 130.0]);
    }

    #[test]
    fn test_grid_stops_before_partial_step() {
        let q = query(100.0, 125.0, 10.0);
        assert_eq!(q.grid_len(), 3);
        assert_eq!(q.grid().last(), Some(120.0));
    }

    #[test]
    fn test_single_point_grid() {
        let q = query(100.0, 100.0, 10.0);
        assert_eq!(q.grid().collect::<Vec<_>>(), vec![100.0]);
    }

    #[test]
    fn test_chart_response_deserializes() {
        let body = json!({
            "name": "ts(cpu.load)",
            "granularity": 1,
            "timeseries": [{
                "label": "cpu.load",
                "host": "web-1",
                "tags": {"env": "prod"},
                "data": [[100.0, 1.5], [101, 2]]
            }]
        });

        let response: UpstreamResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.error(), None);
        assert_eq!(
            response.timeseries,
            vec![RawSeries {
                label: "cpu.load".to_string(),
                host: "web-1".to_string(),
                tags: HashMap::from([("env".to_string(), "prod".to_string())]),
                samples: vec![Sample::new(100.0, 1.5), Sample::new(101.0, 2.0)],
            }]
        );
    }

    #[test]
    fn test_chart_error_response() {
        let body = json!({"errorType": "QuerySyntaxError", "errorMessage": "Unknown function: tss"});
        let response: UpstreamResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.error(), Some("Unknown function: tss"));

        let empty_kind: UpstreamResponse =
            serde_json::from_value(json!({"errorType": "", "timeseries": []})).unwrap();
        assert_eq!(empty_kind.error(), None);
    }

    #[test]
    fn test_chart_error_without_message_passes_empty_text() {
        let response: UpstreamResponse =
            serde_json::from_value(json!({"errorType": "QuerySyntaxError"})).unwrap();
        assert_eq!(response.error(), Some(""));
    }

    #[test]
    fn test_matrix_response_shape() {
        let response = MatrixResponse::success(vec![ResampledSeries {
            metric: HashMap::from([("__name__".to_string(), "up".to_string())]),
            values: vec![GridPoint::new(100.0, "1"), GridPoint::new(100.5, "0.25")],
        }]);

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "status": "success",
                "data": {
                    "resultType": "matrix",
                    "result": [{
                        "metric": {"__name__": "up"},
                        "values": [[100, "1"], [100.5, "0.25"]]
                    }]
                }
            })
        );
    }

    #[test]
    fn test_error_payload_shape() {
        let payload = ErrorPayload::bad_data("end timestamp must not be before start time");
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "status": "error",
                "errorType": "bad_data",
                "error": "end timestamp must not be before start time"
            })
        );
    }
}
