//! Feed aggregator — builds the merged activity feed for one address.
//!
//! Pipeline:
//! 1. Fetch native and token transfers from Etherscan concurrently
//! 2. Normalize each list (malformed records are dropped)
//! 3. Merge, sort by timestamp descending, truncate to the limit
//! 4. Tally per-category counts over the truncated feed

use ledgerlens_common::error::AppError;
use ledgerlens_common::types::{CategoryCounts, Feed, TransferItem, TransferKind, WalletAddress};

use crate::explorer::{AccountQuery, ExplorerClient};
use crate::normalizer::ItemNormalizer;

/// Smallest accepted feed size.
pub const MIN_LIMIT: u32 = 1;
/// Largest accepted feed size.
pub const MAX_LIMIT: u32 = 200;
/// Feed size used when the caller does not pass one.
pub const DEFAULT_LIMIT: u32 = 25;

/// Merge both lists newest first and keep the first `limit` items.
///
/// The sort is stable: on equal timestamps native items stay ahead of token
/// items, and each list keeps its upstream order.
pub fn merge_items(
    native: Vec<TransferItem>,
    token: Vec<TransferItem>,
    limit: usize,
) -> (Vec<TransferItem>, CategoryCounts) {
    let mut combined = native;
    combined.extend(token);
    combined.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    combined.truncate(limit);

    let counts = CategoryCounts::tally(&combined);
    (combined, counts)
}

/// Builds feeds on top of an [`ExplorerClient`].
#[derive(Debug, Clone)]
pub struct FeedAggregator {
    explorer: ExplorerClient,
    explorer_url: String,
}

impl FeedAggregator {
    pub fn new(explorer: ExplorerClient, explorer_url: impl Into<String>) -> Self {
        Self {
            explorer,
            explorer_url: explorer_url.into(),
        }
    }

    /// Build the feed for an already validated address and limit.
    ///
    /// Either fetch failing fails the whole feed; no partial result is returned.
    pub async fn build_feed(&self, address: &WalletAddress, limit: u32) -> Result<Feed, AppError> {
        if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::Validation(format!(
                "limit must be between {MIN_LIMIT} and {MAX_LIMIT}"
            )));
        }

        let native_query = AccountQuery::latest_native(address, limit);
        let token_query = AccountQuery::latest_token(address, limit);

        let (native_records, token_records) = tokio::try_join!(
            self.explorer.fetch(&native_query),
            self.explorer.fetch(&token_query),
        )?;

        let normalizer = ItemNormalizer::new(address, &self.explorer_url);
        let native = normalizer.normalize_all(TransferKind::Native, native_records);
        let token = normalizer.normalize_all(TransferKind::Token, token_records);

        let fetched_native = native.len();
        let fetched_token = token.len();
        let (items, counts) = merge_items(native, token, limit as usize);

        tracing::info!(
            address = %address,
            limit,
            fetched_native,
            fetched_token,
            returned = items.len(),
            "Built transaction feed"
        );

        Ok(Feed {
            address: address.clone(),
            returned: items.len(),
            counts,
            items,
        })
    }
}
