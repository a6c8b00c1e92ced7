// SPDX-License-Identifier: Apache-2.0

//! Result types returned by command handlers.
//!
//! These types allow command handlers to return data instead of printing
//! directly, improving testability and separation of concerns.

use postgram_core::{PendingPost, PublishStats, TokenCheck, UsageReport};
use serde::Serialize;

/// Result from the pending command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PendingResult {
    /// Parked posts, soonest retry first.
    pub posts: Vec<PendingPost>,
}

/// Result from the resume command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ResumeResult {
    /// Entries whose retry windows had reopened when the pass started.
    pub due: usize,
    /// Posts published by this pass.
    pub published: u64,
    /// Entries still parked after the pass.
    pub remaining: usize,
    /// Counters after the pass.
    pub stats: PublishStats,
}

/// Result from the stats command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StatsResult {
    /// Publish counters accumulated across runs.
    pub stats: PublishStats,
    /// Number of posts currently parked.
    pub pending_posts: usize,
    /// Path of the backing state file.
    pub state_file: String,
}

/// Result from the auth command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AuthResult {
    /// Token validity and missing publish scopes.
    pub token: TokenCheck,
    /// Usage report, when the token was valid enough to fetch one.
    pub usage: Option<UsageReport>,
}
