use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// An EVM account address as supplied by the caller.
///
/// The original spelling is kept for output; comparisons are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse a `0x`-prefixed, 40 hex digit address.
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let valid = input.len() == 42
            && input.starts_with("0x")
            && input[2..].bytes().all(|b| b.is_ascii_hexdigit());

        if !valid {
            return Err(AppError::Validation(
                "Invalid address. Expected a 0x… EVM address.".to_string(),
            ));
        }

        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against an address taken from an upstream record.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(address: WalletAddress) -> Self {
        address.0
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transfer category of a feed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferKind {
    /// Native coin transfer (`txlist`)
    #[serde(rename = "ETH")]
    Native,
    /// Fungible token transfer (`tokentx`)
    #[serde(rename = "ERC20")]
    Token,
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferKind::Native => write!(f, "ETH"),
            TransferKind::Token => write!(f, "ERC20"),
        }
    }
}

/// Direction of a transfer relative to the queried address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
    Other,
}

/// Execution status of a native transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Failed,
    Success,
    Unknown,
}

/// One entry of the merged activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferItem {
    #[serde(rename = "type")]
    pub kind: TransferKind,
    /// Unix seconds
    pub timestamp: i64,
    /// ISO-8601 UTC rendering of `timestamp`
    pub time_utc: String,
    pub hash: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub direction: Direction,
    /// Human-readable amount (already scaled by the token decimals)
    pub amount: String,
    pub symbol: String,
    /// Invoked function name for native items, empty for token items
    #[serde(rename = "functionName")]
    pub function_name: String,
    /// Only present for native items
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<TxStatus>,
    /// Only present for token items
    #[serde(
        rename = "tokenContract",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub token_contract: Option<String>,
    /// Block explorer permalink
    pub link: String,
}

/// Per-category item counts over the returned feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    #[serde(rename = "ETH")]
    pub native: usize,
    #[serde(rename = "ERC20")]
    pub token: usize,
}

impl CategoryCounts {
    pub fn tally(items: &[TransferItem]) -> Self {
        items.iter().fold(Self::default(), |mut counts, item| {
            match item.kind {
                TransferKind::Native => counts.native += 1,
                TransferKind::Token => counts.token += 1,
            }
            counts
        })
    }
}

/// Response document for `GET /api/transactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub address: WalletAddress,
    pub returned: usize,
    pub counts: CategoryCounts,
    pub items: Vec<TransferItem>,
}
