//! In-memory executor for tests.
//!
//! Returns a canned response and remembers every query it was asked to run,
//! so tests can check what would have been sent to Wavefront.

use async_trait::async_trait;
use std::sync::Mutex;
use tracing::debug;

use super::QueryExecutor;
use crate::{
    models::{TranslatedQuery, UpstreamResponse},
    ProxyError, Result,
};

enum Outcome {
    Respond(UpstreamResponse),
    Unreachable(String),
}

pub struct MockExecutor {
    outcome: Outcome,
    queries: Mutex<Vec<TranslatedQuery>>,
}

impl MockExecutor {
    /// Answers every query with `response`.
    pub fn responding(response: UpstreamResponse) -> Self {
        Self {
            outcome: Outcome::Respond(response),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Fails every query as if Wavefront could not be reached.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Unreachable(message.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queries received so far, oldest first.
    pub fn queries(&self) -> Vec<TranslatedQuery> {
        self.queries
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QueryExecutor for MockExecutor {
    async fn execute(&self, query: &TranslatedQuery) -> Result<UpstreamResponse> {
        debug!("Mock executing query: {:?}", query);
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }

        match &self.outcome {
            Outcome::Respond(response) => Ok(response.clone()),
            Outcome::Unreachable(message) => Err(ProxyError::Transport(message.clone())),
        }
    }
}
