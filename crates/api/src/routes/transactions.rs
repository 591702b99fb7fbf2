//! Merged transaction feed route.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use ledgerlens_common::error::AppError;
use ledgerlens_common::types::{Feed, WalletAddress};
use ledgerlens_engine::aggregator::{DEFAULT_LIMIT, MAX_LIMIT, MIN_LIMIT};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/transactions", get(get_transactions))
}

#[derive(Debug, Deserialize)]
pub struct TransactionsParams {
    /// EVM address starting with 0x
    pub address: String,
    /// How many recent items to return (merged ETH + ERC20)
    pub limit: Option<i64>,
}

/// Out-of-range limits are rejected, never clamped.
pub fn validate_limit(limit: Option<i64>) -> Result<u32, AppError> {
    let limit = limit.unwrap_or(i64::from(DEFAULT_LIMIT));
    if limit < i64::from(MIN_LIMIT) || limit > i64::from(MAX_LIMIT) {
        return Err(AppError::Validation(format!(
            "limit must be between {MIN_LIMIT} and {MAX_LIMIT}, got {limit}"
        )));
    }
    Ok(limit as u32)
}

/// GET /api/transactions — Latest ETH + ERC-20 activity for an address.
///
/// Input is fully validated before Etherscan is contacted.
async fn get_transactions(
    State(state): State<AppState>,
    params: Result<Query<TransactionsParams>, QueryRejection>,
) -> Result<Json<Feed>, AppError> {
    let Query(params) = params.map_err(|e| AppError::Validation(e.body_text()))?;

    let limit = validate_limit(params.limit)?;
    let address = WalletAddress::parse(&params.address)?;

    let feed = state.aggregator.build_feed(&address, limit).await?;
    Ok(Json(feed))
}
