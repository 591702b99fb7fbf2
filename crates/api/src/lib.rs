//! Ledgerlens API: a server-side proxy that merges an address's recent ETH
//! and ERC-20 activity from Etherscan into one feed.
//!
//! Endpoints:
//! - GET /api/transactions?address=0x…&limit=1..200 — merged activity feed
//! - GET /api/ping — liveness probe
//! - GET /health — service info

pub mod routes;
pub mod state;
