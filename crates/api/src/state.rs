//! Shared application state for the Axum API server.

use ledgerlens_common::config::AppConfig;
use ledgerlens_common::error::AppError;
use ledgerlens_engine::aggregator::FeedAggregator;
use ledgerlens_engine::explorer::{ExplorerClient, ExplorerConfig};

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: FeedAggregator,
}

impl AppState {
    /// Wire the Etherscan client and aggregator from configuration.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let explorer = ExplorerClient::new(ExplorerConfig::from_app_config(config))?;
        let aggregator = FeedAggregator::new(explorer, config.explorer_url.clone());

        Ok(Self { aggregator })
    }
}
