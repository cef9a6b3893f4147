pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod proxy;
pub mod request;
pub mod resample;
pub mod response;
pub mod translate;

pub use error::{ProxyError, Result};
