//! Etherscan gateway — issues account API queries and turns Etherscan's
//! `status` / `message` / `result` conventions into typed outcomes.
//!
//! Etherscan encodes success, "nothing found" and errors on the same channel:
//! - OK: `{"status":"1","message":"OK","result":[...]}`
//! - No tx: `{"status":"0","message":"No transactions found","result":[]}`
//! - Error: `{"status":"0","message":"NOTOK","result":"Max rate limit reached"}`
//!
//! Every reply is classified exactly once into an [`ExplorerOutcome`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ledgerlens_common::config::AppConfig;
use ledgerlens_common::error::AppError;
use ledgerlens_common::types::WalletAddress;

/// Block window sent with native transaction queries.
const FULL_BLOCK_RANGE: (u64, u64) = (0, 99_999_999);

/// Connection settings for [`ExplorerClient`].
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub api_url: String,
    /// `None` when the server has no usable key.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ExplorerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            api_url: config.etherscan_api_url.clone(),
            api_key: config.usable_api_key().map(str::to_string),
            timeout: Duration::from_secs(config.upstream_timeout_secs),
        }
    }
}

/// Account API actions used by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountAction {
    /// Normal (native coin) transactions
    TxList,
    /// ERC-20 token transfer events
    TokenTx,
}

impl AccountAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountAction::TxList => "txlist",
            AccountAction::TokenTx => "tokentx",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// A single `module=account` query.
#[derive(Debug, Clone)]
pub struct AccountQuery {
    pub action: AccountAction,
    pub address: WalletAddress,
    pub page: u32,
    /// Page size
    pub offset: u32,
    pub sort: SortOrder,
    pub block_range: Option<(u64, u64)>,
}

impl AccountQuery {
    /// Most recent `limit` native transactions.
    pub fn latest_native(address: &WalletAddress, limit: u32) -> Self {
        Self {
            action: AccountAction::TxList,
            address: address.clone(),
            page: 1,
            offset: limit,
            sort: SortOrder::Desc,
            block_range: Some(FULL_BLOCK_RANGE),
        }
    }

    /// Most recent `limit` token transfers.
    pub fn latest_token(address: &WalletAddress, limit: u32) -> Self {
        Self {
            action: AccountAction::TokenTx,
            address: address.clone(),
            page: 1,
            offset: limit,
            sort: SortOrder::Desc,
            block_range: None,
        }
    }

    /// Query string parameters, without the API key.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("module", "account".to_string()),
            ("action", self.action.as_str().to_string()),
            ("address", self.address.to_string()),
        ];
        if let Some((start, end)) = self.block_range {
            params.push(("startblock", start.to_string()));
            params.push(("endblock", end.to_string()));
        }
        params.push(("page", self.page.to_string()));
        params.push(("offset", self.offset.to_string()));
        params.push(("sort", self.sort.as_str().to_string()));
        params
    }
}

/// Raw Etherscan reply body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplorerEnvelope {
    #[serde(default)]
    pub status: Value,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Value,
}

impl ExplorerEnvelope {
    fn status_code(&self) -> String {
        match &self.status {
            Value::String(s) => s.trim().to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Free-text detail carried in `result`, if any.
    fn result_text(&self) -> Option<String> {
        match &self.result {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Array(items) if !items.is_empty() => Some(self.result.to_string()),
            Value::Object(map) if !map.is_empty() => Some(self.result.to_string()),
            Value::Number(_) | Value::Bool(_) => Some(self.result.to_string()),
            _ => None,
        }
    }
}

/// Closed set of outcomes of one Etherscan call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerOutcome {
    /// `status = "1"` with a list of records
    Records(Vec<Value>),
    /// `status = "0"` with a "No transactions found" message
    NoTransactions,
    /// NOTOK whose detail mentions a rate limit
    RateLimited(String),
    /// Any other failure, with the best available detail
    Failed(String),
}

impl ExplorerOutcome {
    pub fn classify(envelope: ExplorerEnvelope) -> Self {
        let status = envelope.status_code();
        let message = envelope.message.clone().unwrap_or_default();

        if status == "1" {
            return match envelope.result {
                Value::Array(records) => ExplorerOutcome::Records(records),
                Value::Null => ExplorerOutcome::Records(Vec::new()),
                other => ExplorerOutcome::Failed(format!("unexpected result payload: {other}")),
            };
        }

        if status == "0" && message == "NOTOK" {
            let detail = envelope
                .result_text()
                .unwrap_or_else(|| "Etherscan NOTOK".to_string());
            if detail.to_lowercase().contains("rate limit") {
                return ExplorerOutcome::RateLimited(detail);
            }
            return ExplorerOutcome::Failed(detail);
        }

        if status == "0" && message.to_lowercase().starts_with("no transactions") {
            return ExplorerOutcome::NoTransactions;
        }

        let detail = envelope
            .result_text()
            .or_else(|| Some(message.trim().to_string()).filter(|m| !m.is_empty()))
            .unwrap_or_else(|| format!("unexpected status {status:?}"));
        ExplorerOutcome::Failed(detail)
    }

    /// Collapse the outcome into records or a typed error.
    pub fn into_records(self) -> Result<Vec<Value>, AppError> {
        match self {
            ExplorerOutcome::Records(records) => Ok(records),
            ExplorerOutcome::NoTransactions => Ok(Vec::new()),
            ExplorerOutcome::RateLimited(detail) => Err(AppError::RateLimited(detail)),
            ExplorerOutcome::Failed(detail) => Err(AppError::Upstream(detail)),
        }
    }
}

/// HTTP client for the Etherscan account API.
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl ExplorerClient {
    pub fn new(config: ExplorerConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        if config.api_key.is_none() {
            tracing::warn!("No usable ETHERSCAN_API_KEY configured; transaction queries will fail");
        }

        Ok(Self {
            http,
            api_url: config.api_url,
            api_key: config.api_key,
        })
    }

    /// Run one query and return the raw records. No retry.
    pub async fn fetch(&self, query: &AccountQuery) -> Result<Vec<Value>, AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Config("Server is not configured with an Etherscan API key.".to_string())
        })?;

        let mut params = query.params();
        params.push(("apikey", api_key.to_string()));

        tracing::debug!(
            action = query.action.as_str(),
            address = %query.address,
            offset = query.offset,
            "Querying Etherscan"
        );

        // Strip the URL so the API key in the query string never reaches logs or clients.
        let envelope: ExplorerEnvelope = self
            .http
            .get(&self.api_url)
            .query(&params)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?
            .error_for_status()
            .map_err(reqwest::Error::without_url)?
            .json()
            .await
            .map_err(reqwest::Error::without_url)?;

        let outcome = ExplorerOutcome::classify(envelope);
        match &outcome {
            ExplorerOutcome::Records(records) => tracing::debug!(
                action = query.action.as_str(),
                records = records.len(),
                "Etherscan returned records"
            ),
            ExplorerOutcome::NoTransactions => tracing::debug!(
                action = query.action.as_str(),
                "Etherscan reported no transactions"
            ),
            ExplorerOutcome::RateLimited(detail) => tracing::warn!(
                action = query.action.as_str(),
                detail = %detail,
                "Etherscan rate limit hit"
            ),
            ExplorerOutcome::Failed(detail) => tracing::warn!(
                action = query.action.as_str(),
                detail = %detail,
                "Etherscan returned an error"
            ),
        }

        outcome.into_records()
    }
}
