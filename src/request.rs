//! Parsing of inbound `query_range` parameters.

use crate::{models::Query, ProxyError, Result};

/// Raw `query_range` parameters as they arrived on the request.
///
/// A missing parameter is treated like an empty one, so it fails to parse
/// with the usual message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub step: Option<String>,
    pub query: Option<String>,
}

impl RangeParams {
    /// Collects parameters from decoded form pairs. The first occurrence of
    /// a name wins.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = RangeParams::default();
        for (name, value) in pairs {
            let slot = match name.as_str() {
                "start" => &mut params.start,
                "end" => &mut params.end,
                "step" => &mut params.step,
                "query" => &mut params.query,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    /// Fills every parameter missing here from `fallback`.
    pub fn or(self, fallback: RangeParams) -> Self {
        Self {
            start: self.start.or(fallback.start),
            end: self.end.or(fallback.end),
            step: self.step.or(fallback.step),
            query: self.query.or(fallback.query),
        }
    }

    /// Validates the parameters into a [`Query`].
    ///
    /// Checks run in a fixed order: `start`, `end`, `step`, step sign, range
    /// ordering, then resolution when a `max_points` ceiling is configured.
    pub fn parse(&self, max_points: Option<usize>) -> Result<Query> {
        let start = parse_number("start", self.start.as_deref(), "timestamp")?;
        let end = parse_number("end", self.end.as_deref(), "timestamp")?;
        let step = parse_number("step", self.step.as_deref(), "duration")?;

        if step <= 0.0 {
            return Err(ProxyError::BadData(
                "zero or negative query resolution step widths are not accepted. Try a positive integer"
                    .to_string(),
            ));
        }
        if end < start {
            return Err(ProxyError::BadData(
                "end timestamp must not be before start time".to_string(),
            ));
        }
        if let Some(limit) = max_points {
            if (end - start) / step > limit as f64 {
                return Err(ProxyError::BadData(format!(
                    "exceeded maximum resolution of {} points per timeseries. Try decreasing the query resolution (?step=XX)",
                    limit
                )));
            }
        }

        Ok(Query {
            start,
            end,
            step,
            expression: self.query.clone().unwrap_or_default(),
        })
    }
}

/// Plain decimal seconds. `NaN` and infinities are rejected along with
/// anything else that is not a finite number.
fn parse_number(param: &'static str, raw: Option<&str>, expected: &'static str) -> Result<f64> {
    let raw = raw.unwrap_or_default();
    match raw.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() => Ok(seconds),
        _ => Err(ProxyError::InvalidParameter {
            param,
            raw: raw.to_string(),
            expected,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(start: &str, end: &str, step: &str) -> RangeParams {
        RangeParams {
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            step: Some(step.to_string()),
            query: Some("ts(cpu.load, env=prod)".to_string()),
        }
    }

    fn error_message(params: RangeParams) -> String {
        params.parse(None).unwrap_err().to_string()
    }

    #[test]
    fn test_parse_valid_query() {
        let query = params("100", "130.5", "10").parse(None).unwrap();
        assert_eq!(query.start, 100.0);
        assert_eq!(query.end, 130.5);
        assert_eq!(query.step, 10.0);
        assert_eq!(query.expression, "ts(cpu.load, env=prod)");
    }

    #[test]
    fn test_start_equal_to_end_is_accepted() {
        let query = params("100", "100", "1").parse(None).unwrap();
        assert_eq!(query.grid_len(), 1);
    }

    #[test]
    fn test_unparseable_start() {
        assert_eq!(
            error_message(params("yesterday", "130", "10")),
            "invalid parameter 'start': cannot parse \"yesterday\" to a valid timestamp"
        );
    }

    #[test]
    fn test_unparseable_end() {
        assert_eq!(
            error_message(params("100", "", "10")),
            "invalid parameter 'end': cannot parse \"\" to a valid timestamp"
        );
    }

    #[test]
    fn test_unparseable_step() {
        assert_eq!(
            error_message(params("100", "130", "fast")),
            "invalid parameter 'step': cannot parse \"fast\" to a valid duration"
        );
    }

    #[test]
    fn test_rfc3339_and_duration_text_are_not_numbers() {
        assert_eq!(
            error_message(params("100", "130", "30s")),
            "invalid parameter 'step': cannot parse \"30s\" to a valid duration"
        );
        assert_eq!(
            error_message(params("2021-01-01T00:00:00Z", "1609459300", "10")),
            "invalid parameter 'start': cannot parse \"2021-01-01T00:00:00Z\" to a valid timestamp"
        );
    }

    #[test]
    fn test_missing_parameters_report_empty_text() {
        let err = RangeParams::default().parse(None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid parameter 'start': cannot parse \"\" to a valid timestamp"
        );
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        assert!(matches!(
            params("NaN", "130", "10").parse(None),
            Err(ProxyError::InvalidParameter { param: "start", .. })
        ));
        assert!(matches!(
            params("100", "inf", "10").parse(None),
            Err(ProxyError::InvalidParameter { param: "end", .. })
        ));
        assert!(matches!(
            params("100", "130", "NaN").parse(None),
            Err(ProxyError::InvalidParameter { param: "step", .. })
        ));
    }

    #[test]
    fn test_zero_step_rejected() {
        assert!(error_message(params("100", "130", "0"))
            .starts_with("zero or negative query resolution step widths are not accepted"));
        assert!(error_message(params("100", "130", "-5"))
            .starts_with("zero or negative query resolution step widths are not accepted"));
    }

    #[test]
    fn test_end_before_start_rejected() {
        assert_eq!(
            error_message(params("100", "50", "10")),
            "end timestamp must not be before start time"
        );
    }

    #[test]
    fn test_step_checked_before_ordering() {
        assert!(error_message(params("100", "50", "0")).starts_with("zero or negative"));
    }

    #[test]
    fn test_fine_grids_accepted_without_limit() {
        let query = params("0", "86400", "1").parse(None).unwrap();
        assert_eq!(query.grid_len(), 86_401);
    }

    #[test]
    fn test_configured_resolution_limit() {
        assert!(params("0", "11000", "1").parse(Some(11_000)).is_ok());
        let err = params("0", "11001", "1").parse(Some(11_000)).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("exceeded maximum resolution of 11000 points per timeseries"));
    }

    #[test]
    fn test_first_pair_wins_and_fallback_fills_gaps() {
        let body = RangeParams::from_pairs(vec![
            ("start".to_string(), "100".to_string()),
            ("start".to_string(), "999".to_string()),
            ("other".to_string(), "ignored".to_string()),
        ]);
        let url = RangeParams::from_pairs(vec![
            ("start".to_string(), "1".to_string()),
            ("end".to_string(), "130".to_string()),
        ]);

        let merged = body.or(url);
        assert_eq!(merged.start.as_deref(), Some("100"));
        assert_eq!(merged.end.as_deref(), Some("130"));
        assert_eq!(merged.step, None);
    }
}
