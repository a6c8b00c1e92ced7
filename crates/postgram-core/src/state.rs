// SPDX-License-Identifier: Apache-2.0

//! Durable pending-container state and publish statistics.
//!
//! Rate-limited publish jobs are parked in a single JSON file
//! (`~/.local/share/postgram/api_state.json` by default) so they survive
//! process restarts. Loading never fails: a missing or corrupt file yields an
//! empty store rather than blocking startup. Saves write a temp file and
//! rename it over the target, and run after every mutation, so a crash loses
//! at most the most recent change.
//!
//! Single-process only. There is no file locking; concurrent writers race
//! last-writer-wins.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A rate-limited publish job awaiting a later retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PendingContainer {
    /// Container id assigned by the Graph API.
    pub container_id: String,
    /// Number of rate-limited publish attempts so far.
    pub retry_count: u32,
    /// Earliest time the next attempt may run.
    pub next_attempt_time: DateTime<Utc>,
    /// Last error message observed for this container.
    pub last_error: String,
    /// When the entry was first parked.
    pub created_at: DateTime<Utc>,
    /// When the entry was last attempted.
    pub last_attempt: DateTime<Utc>,
}

impl Default for PendingContainer {
    fn default() -> Self {
        Self {
            container_id: String::new(),
            retry_count: 0,
            next_attempt_time: Utc::now(),
            last_error: String::new(),
            created_at: Utc::now(),
            last_attempt: Utc::now(),
        }
    }
}

/// Monotonic counters for publish outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishStats {
    /// Posts published successfully.
    pub successful_posts: u64,
    /// Posts that failed with a non-recoverable error.
    pub failed_posts: u64,
    /// Publish attempts deferred by rate limiting.
    pub rate_limited_posts: u64,
}

/// On-disk layout of the state file.
///
/// Unknown keys are ignored on load and missing keys take defaults, so
/// newer writers do not break older readers and vice versa.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StateFile {
    /// Pending containers keyed by container id.
    #[serde(default)]
    pub pending_containers: HashMap<String, PendingContainer>,
    /// Publish statistics.
    #[serde(default)]
    pub stats: PublishStats,
    /// When the file was last written.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Read-only view of one pending container for operators.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PendingPost {
    /// Container id.
    pub container_id: String,
    /// Rate-limited attempts so far.
    pub retry_count: u32,
    /// Seconds until the entry becomes eligible (0 when already due).
    pub next_attempt_in_secs: u64,
    /// Absolute time of the next attempt.
    pub next_attempt_time: DateTime<Utc>,
    /// When the entry was first parked.
    pub created_at: DateTime<Utc>,
    /// When the entry was last attempted.
    pub last_attempt: DateTime<Utc>,
    /// Last error observed.
    pub last_error: String,
}

impl StateFile {
    /// Projects pending containers into a display view, soonest retry first.
    #[must_use]
    pub fn pending_view(&self) -> Vec<PendingPost> {
        let now = Utc::now();
        let mut posts: Vec<PendingPost> = self
            .pending_containers
            .values()
            .map(|entry| PendingPost {
                container_id: entry.container_id.clone(),
                retry_count: entry.retry_count,
                next_attempt_in_secs: u64::try_from(
                    (entry.next_attempt_time - now).num_seconds(),
                )
                .unwrap_or(0),
                next_attempt_time: entry.next_attempt_time,
                created_at: entry.created_at,
                last_attempt: entry.last_attempt,
                last_error: entry.last_error.clone(),
            })
            .collect();
        posts.sort_by_key(|post| post.next_attempt_time);
        posts
    }
}

/// Serialization form used by [`StateStore::save`] so `last_updated` is
/// stamped without mutating the caller's state.
#[derive(Serialize)]
struct StateSnapshot<'a> {
    pending_containers: &'a HashMap<String, PendingContainer>,
    stats: &'a PublishStats,
    last_updated: DateTime<Utc>,
}

/// Handle to the durable state file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Creates a store backed by the given path. No I/O happens here.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the state file.
    ///
    /// A missing file yields the default state. An unreadable or corrupt
    /// file is logged and also yields the default, so startup is never
    /// blocked by a bad state file.
    #[must_use]
    pub fn load(&self) -> StateFile {
        match self.try_load() {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Could not load state file, starting empty"
                );
                StateFile::default()
            }
        }
    }

    fn try_load(&self) -> Result<StateFile> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No state file yet");
            return Ok(StateFile::default());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file: {}", self.path.display()))?;
        let state: StateFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse state file: {}", self.path.display()))?;
        debug!(
            pending = state.pending_containers.len(),
            "Loaded state file"
        );
        Ok(state)
    }

    /// Saves the state, stamping `last_updated` with the current time.
    ///
    /// Writes to a temp file in the same directory and renames it over the
    /// target so readers never observe a partial file.
    pub fn save(&self, state: &StateFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let snapshot = StateSnapshot {
            pending_containers: &state.pending_containers,
            stats: &state.stats,
            last_updated: Utc::now(),
        };
        let contents =
            serde_json::to_string_pretty(&snapshot).context("Failed to serialize state")?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, contents)
            .with_context(|| format!("Failed to write temp state file: {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to rename state file: {}", self.path.display()))?;

        debug!(path = %self.path.display(), "State saved");
        Ok(())
    }
}
