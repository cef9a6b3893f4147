//! The `query_range` pipeline, independent of HTTP.

use tracing::{debug, info};

use crate::{
    backend::QueryExecutor,
    config::ProxyConfig,
    models::MatrixResponse,
    request::RangeParams,
    response::assemble,
    translate::{correct_skew, translate},
    Result,
};

/// Answers one range query: parse, translate, execute, correct skew,
/// resample, assemble and sort. The first failing stage ends the request.
pub async fn query_range(
    executor: &dyn QueryExecutor,
    config: &ProxyConfig,
    params: &RangeParams,
) -> Result<MatrixResponse> {
    let query = params.parse(config.max_points)?;
    let translated = translate(&query, config.skew_seconds);
    debug!(
        "Translated [{}, {}] step {} to [{}, {})",
        query.start, query.end, query.step, translated.start_ms, translated.end_ms
    );

    let mut upstream = executor.execute(&translated).await?;
    correct_skew(&mut upstream.timeseries, config.skew_seconds);

    let response = assemble(upstream, &query)?;
    info!(
        "Answered query {:?} with {} series",
        query.expression,
        response.series().len()
    );
    Ok(response)
}
