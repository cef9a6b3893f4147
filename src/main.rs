use std::sync::Arc;
use tracing::{error, info};
use wavefront_promql_proxy::{
    api,
    backend::{QueryExecutor, WavefrontClient},
    config::ProxyConfig,
    logging, metrics, Result,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!("{}", err);
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    logging::init_logger()?;

    // Load configuration
    let config = Arc::new(ProxyConfig::load()?);
    info!("Loaded configuration: {:?}", config);

    // Initialize metrics
    metrics::init_metrics();

    let executor: Arc<dyn QueryExecutor> = Arc::new(WavefrontClient::new(&config.wavefront)?);

    api::start_server(config, executor).await
}
