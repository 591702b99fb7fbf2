//! Item normalizer — maps raw Etherscan records onto [`TransferItem`].
//!
//! Two record shapes are handled:
//! 1. `txlist` rows (native coin): value in wei, error/receipt flags, function signature
//! 2. `tokentx` rows (ERC-20): value in token base units, symbol, decimals, contract
//!
//! Both share the direction rule relative to the queried address.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use ledgerlens_common::types::{Direction, TransferItem, TransferKind, TxStatus, WalletAddress};

use crate::amount::{self, AmountError};

/// Symbol used when a token record carries none.
pub const PLACEHOLDER_SYMBOL: &str = "TOKEN";

const NATIVE_SYMBOL: &str = "ETH";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("malformed record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("invalid token decimals: {0:?}")]
    InvalidDecimals(String),

    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// A `txlist` row.
#[derive(Debug, Clone, Deserialize)]
pub struct RawNativeTx {
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    pub hash: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(rename = "isError", default)]
    pub is_error: Option<String>,
    #[serde(default)]
    pub txreceipt_status: Option<String>,
    #[serde(rename = "functionName", default)]
    pub function_name: Option<String>,
}

/// A `tokentx` row.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTokenTransfer {
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    pub hash: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(rename = "contractAddress", default)]
    pub contract_address: Option<String>,
    #[serde(rename = "tokenSymbol", default)]
    pub token_symbol: Option<String>,
    #[serde(rename = "tokenDecimal", default)]
    pub token_decimal: Option<String>,
}

/// `out` if `owner` sent it, `in` if `owner` received it, `other` otherwise.
pub fn direction(owner: &WalletAddress, from: Option<&str>, to: Option<&str>) -> Direction {
    if from.is_some_and(|addr| owner.matches(addr)) {
        Direction::Out
    } else if to.is_some_and(|addr| owner.matches(addr)) {
        Direction::In
    } else {
        Direction::Other
    }
}

/// `isError = 1` wins over the receipt status.
pub fn native_status(is_error: Option<&str>, receipt_status: Option<&str>) -> TxStatus {
    if is_error == Some("1") {
        TxStatus::Failed
    } else if receipt_status == Some("1") {
        TxStatus::Success
    } else {
        TxStatus::Unknown
    }
}

/// `transfer(address,uint256)` → `transfer`
pub fn function_name(signature: Option<&str>) -> String {
    signature
        .and_then(|sig| sig.split('(').next())
        .unwrap_or_default()
        .to_string()
}

fn parse_timestamp(raw: &str) -> Result<(i64, String), NormalizeError> {
    let timestamp: i64 = raw
        .trim()
        .parse()
        .map_err(|_| NormalizeError::InvalidTimestamp(raw.to_string()))?;
    let time_utc = DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| NormalizeError::InvalidTimestamp(raw.to_string()))?
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string();
    Ok((timestamp, time_utc))
}

fn parse_decimals(raw: Option<&str>) -> Result<i64, NormalizeError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(0),
        Some(d) => d
            .parse()
            .map_err(|_| NormalizeError::InvalidDecimals(d.to_string())),
    }
}

/// Normalizes records on behalf of one queried address.
pub struct ItemNormalizer<'a> {
    owner: &'a WalletAddress,
    explorer_url: &'a str,
}

impl<'a> ItemNormalizer<'a> {
    pub fn new(owner: &'a WalletAddress, explorer_url: &'a str) -> Self {
        Self {
            owner,
            explorer_url: explorer_url.trim_end_matches('/'),
        }
    }

    fn link(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, hash)
    }

    pub fn native(&self, raw: &RawNativeTx) -> Result<TransferItem, NormalizeError> {
        let (timestamp, time_utc) = parse_timestamp(&raw.time_stamp)?;
        let amount = amount::format_wei(raw.value.as_deref().unwrap_or("0"))?;

        Ok(TransferItem {
            kind: TransferKind::Native,
            timestamp,
            time_utc,
            hash: raw.hash.clone(),
            from: raw.from.clone(),
            to: raw.to.clone(),
            direction: direction(self.owner, raw.from.as_deref(), raw.to.as_deref()),
            amount,
            symbol: NATIVE_SYMBOL.to_string(),
            function_name: function_name(raw.function_name.as_deref()),
            status: Some(native_status(
                raw.is_error.as_deref(),
                raw.txreceipt_status.as_deref(),
            )),
            token_contract: None,
            link: self.link(&raw.hash),
        })
    }

    pub fn token(&self, raw: &RawTokenTransfer) -> Result<TransferItem, NormalizeError> {
        let (timestamp, time_utc) = parse_timestamp(&raw.time_stamp)?;
        let decimals = parse_decimals(raw.token_decimal.as_deref())?;
        let amount = amount::format_amount(raw.value.as_deref().unwrap_or("0"), Some(decimals))?;
        let symbol = raw
            .token_symbol
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(PLACEHOLDER_SYMBOL)
            .to_string();

        Ok(TransferItem {
            kind: TransferKind::Token,
            timestamp,
            time_utc,
            hash: raw.hash.clone(),
            from: raw.from.clone(),
            to: raw.to.clone(),
            direction: direction(self.owner, raw.from.as_deref(), raw.to.as_deref()),
            amount,
            symbol,
            function_name: String::new(),
            status: None,
            token_contract: raw.contract_address.clone(),
            link: self.link(&raw.hash),
        })
    }

    fn normalize_record(&self, kind: TransferKind, record: Value) -> Result<TransferItem, NormalizeError> {
        match kind {
            TransferKind::Native => self.native(&serde_json::from_value::<RawNativeTx>(record)?),
            TransferKind::Token => self.token(&serde_json::from_value::<RawTokenTransfer>(record)?),
        }
    }

    /// Normalize a batch, skipping records that cannot be normalized.
    pub fn normalize_all(&self, kind: TransferKind, records: Vec<Value>) -> Vec<TransferItem> {
        let mut items = Vec::with_capacity(records.len());

        for record in records {
            let hash = record
                .get("hash")
                .and_then(Value::as_str)
                .unwrap_or("<unknown>")
                .to_string();

            match self.normalize_record(kind, record) {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::warn!(
                        kind = %kind,
                        hash = %hash,
                        error = %e,
                        "Skipping malformed Etherscan record"
                    );
                }
            }
        }

        items
    }
}
