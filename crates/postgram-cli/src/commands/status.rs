// SPDX-License-Identifier: Apache-2.0

//! Read-only store views: the pending and stats commands.
//!
//! Both commands only read the state file, so they work without any
//! credentials configured.

use postgram_core::{AppConfig, StateStore};

use crate::commands::types::{PendingResult, StatsResult};

/// Run the pending command - list parked posts.
pub fn run_pending(config: &AppConfig) -> PendingResult {
    let store = StateStore::new(config.state.file_path());
    let state = store.load();
    PendingResult {
        posts: state.pending_view(),
    }
}

/// Run the stats command - show publish counters.
pub fn run_stats(config: &AppConfig) -> StatsResult {
    let store = StateStore::new(config.state.file_path());
    let state = store.load();
    StatsResult {
        stats: state.stats,
        pending_posts: state.pending_containers.len(),
        state_file: store.path().display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use postgram_core::{PendingContainer, StateConfig, StateFile};
    use std::path::PathBuf;

    fn config_with_state_file(path: PathBuf) -> AppConfig {
        AppConfig {
            state: StateConfig { file: Some(path) },
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_pending_empty_without_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_state_file(dir.path().join("api_state.json"));

        let result = run_pending(&config);
        assert!(result.posts.is_empty());
    }

    #[test]
    fn test_pending_lists_parked_posts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_state.json");

        let mut state = StateFile::default();
        state.pending_containers.insert(
            "17900001".to_string(),
            PendingContainer {
                container_id: "17900001".to_string(),
                retry_count: 2,
                next_attempt_time: Utc::now() + Duration::seconds(600),
                last_error: "Rate limited".to_string(),
                created_at: Utc::now(),
                last_attempt: Utc::now(),
            },
        );
        StateStore::new(&path).save(&state).unwrap();

        let result = run_pending(&config_with_state_file(path));
        assert_eq!(result.posts.len(), 1);
        assert_eq!(result.posts[0].container_id, "17900001");
        assert_eq!(result.posts[0].retry_count, 2);
    }

    #[test]
    fn test_stats_reports_counters_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_state.json");

        let mut state = StateFile::default();
        state.stats.successful_posts = 7;
        state.stats.rate_limited_posts = 2;
        StateStore::new(&path).save(&state).unwrap();

        let result = run_stats(&config_with_state_file(path.clone()));
        assert_eq!(result.stats.successful_posts, 7);
        assert_eq!(result.stats.rate_limited_posts, 2);
        assert_eq!(result.pending_posts, 0);
        assert_eq!(result.state_file, path.display().to_string());
    }
}
