// SPDX-License-Identifier: Apache-2.0

//! Media publish state machine.
//!
//! Drives the create, wait, publish pipeline against a [`ContainerApi`],
//! converts publish-time rate limits into durable pending entries, and
//! replays those entries once their windows reopen. Pending state and stats
//! persist through the [`StateStore`] after every mutation, so a crash loses
//! at most the step in flight.

use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backoff::poll_delay;
use crate::config::PublishConfig;
use crate::error::PostgramError;
use crate::graph::{ContainerApi, ContainerRequest, ContainerStatus, MediaKind};
use crate::state::{PendingContainer, PendingPost, PublishStats, StateFile, StateStore};

/// Outcome of a top-level post operation.
///
/// Rate limiting at publish time is an expected, self-recovering condition,
/// so it is a variant here rather than an error: the container is parked
/// durably and republished by a later [`MediaPublisher::resume_pending`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PostOutcome {
    /// The media went live.
    Published {
        /// Post id assigned by the API.
        id: String,
        /// Container the post was published from.
        container_id: String,
        /// Permalink, when the API exposes one.
        permalink: Option<String>,
        /// Kind of media published.
        media_type: MediaKind,
    },
    /// Publish was rate limited; the container is parked for later.
    Pending {
        /// Container awaiting republish.
        container_id: String,
        /// Seconds until the first automatic retry.
        retry_after: u64,
        /// Kind of media parked.
        media_type: MediaKind,
        /// Human-readable explanation for display.
        message: String,
    },
}

/// Publishes media containers and durably recovers from rate limits.
///
/// Generic over [`ContainerApi`] so the state machine can be driven by a
/// scripted API in tests. Construct one per process; the backing store
/// assumes single-process access.
#[derive(Debug)]
pub struct MediaPublisher<A> {
    api: A,
    store: StateStore,
    state: StateFile,
    poll_max_attempts: u32,
    poll_base_delay: f64,
    max_pending_retries: u32,
}

impl<A: ContainerApi> MediaPublisher<A> {
    /// Creates a publisher, loading prior pending state from the store.
    ///
    /// Pending entries are not replayed here; call
    /// [`MediaPublisher::resume_pending`] to republish those whose windows
    /// have reopened.
    pub fn new(api: A, store: StateStore, config: &PublishConfig) -> Self {
        let state = store.load();
        if !state.pending_containers.is_empty() {
            info!(
                pending = state.pending_containers.len(),
                "Loaded pending containers from previous runs"
            );
        }
        Self {
            api,
            store,
            state,
            poll_max_attempts: config.poll_max_attempts,
            poll_base_delay: config.poll_base_delay_secs,
            max_pending_retries: config.max_pending_retries,
        }
    }

    /// Publish statistics accumulated across runs.
    #[must_use]
    pub fn stats(&self) -> PublishStats {
        self.state.stats
    }

    /// Pending containers, soonest retry first.
    #[must_use]
    pub fn pending_posts(&self) -> Vec<PendingPost> {
        self.state.pending_view()
    }

    /// Creates a media container for the given request.
    ///
    /// # Errors
    ///
    /// Returns [`PostgramError::Media`] when the API returns no container id,
    /// or the underlying API error.
    pub async fn create_job(&self, request: &ContainerRequest) -> Result<String, PostgramError> {
        self.api.create_container(request).await
    }

    /// Checks a container's processing status once.
    ///
    /// # Errors
    ///
    /// Returns the underlying API error.
    pub async fn poll_status(&self, container_id: &str) -> Result<ContainerStatus, PostgramError> {
        self.api.container_status(container_id).await
    }

    /// Polls until the container reaches a terminal status or the attempt
    /// budget is spent.
    ///
    /// Rate limits during polling are slept through using the error's own
    /// recommended window; other poll errors wait out the base delay and try
    /// again. Returns [`ContainerStatus::Timeout`] when the budget runs out.
    pub async fn wait_until_ready(&self, container_id: &str) -> ContainerStatus {
        for attempt in 0..self.poll_max_attempts {
            match self.api.container_status(container_id).await {
                Ok(status) if status.is_terminal() => return status,
                Ok(status) => {
                    debug!(container_id, %status, attempt, "Container still processing");
                    sleep_secs(poll_delay(attempt, self.poll_base_delay)).await;
                }
                Err(PostgramError::RateLimited {
                    retry_seconds,
                    details,
                }) => {
                    warn!(
                        container_id,
                        retry_seconds,
                        error = %details,
                        "Rate limited while polling, waiting out the window"
                    );
                    tokio::time::sleep(Duration::from_secs(retry_seconds)).await;
                }
                Err(err) => {
                    warn!(container_id, error = %err, "Status check failed, retrying after base delay");
                    sleep_secs(self.poll_base_delay).await;
                }
            }
        }
        warn!(
            container_id,
            attempts = self.poll_max_attempts,
            "Container did not reach a terminal status in time"
        );
        ContainerStatus::Timeout
    }

    /// Publishes a finished container.
    ///
    /// On success the container leaves the pending store and the success
    /// counter increments. On a rate limit the container is parked with
    /// `retry_count = 1` and the error is returned so callers can surface
    /// the deferral. Any other failure increments the failed counter and
    /// propagates.
    ///
    /// # Errors
    ///
    /// Returns [`PostgramError::RateLimited`] when the publish quota is
    /// spent, or the underlying API error.
    pub async fn publish(&mut self, container_id: &str) -> Result<String, PostgramError> {
        match self.api.publish_container(container_id).await {
            Ok(post_id) => {
                if self.state.pending_containers.remove(container_id).is_some() {
                    debug!(container_id, "Removed published container from pending state");
                }
                self.state.stats.successful_posts += 1;
                self.persist();
                info!(container_id, post_id, "Published media container");
                Ok(post_id)
            }
            Err(PostgramError::RateLimited {
                retry_seconds,
                details,
            }) => {
                self.park(container_id, 1, retry_seconds, &details.to_string());
                self.state.stats.rate_limited_posts += 1;
                self.persist();
                Err(PostgramError::RateLimited {
                    retry_seconds,
                    details,
                })
            }
            Err(err) => {
                self.state.stats.failed_posts += 1;
                self.persist();
                Err(err)
            }
        }
    }

    /// Runs the full create, wait, publish pipeline for one media asset.
    ///
    /// Rate limiting at publish time yields [`PostOutcome::Pending`] rather
    /// than an error; the container republishes automatically once the
    /// window reopens.
    ///
    /// # Errors
    ///
    /// Returns [`PostgramError::Media`] when the container never finishes
    /// processing, or the underlying API error from create or publish.
    pub async fn post_media(
        &mut self,
        request: &ContainerRequest,
    ) -> Result<PostOutcome, PostgramError> {
        let container_id = self.api.create_container(request).await?;
        info!(container_id, kind = %request.kind, "Created media container");

        let status = self.wait_until_ready(&container_id).await;
        if status != ContainerStatus::Finished {
            return Err(PostgramError::media(format!(
                "Container {container_id} did not finish processing (status {status})"
            )));
        }

        match self.publish(&container_id).await {
            Ok(post_id) => {
                let permalink = match self.api.permalink(&post_id).await {
                    Ok(link) => link,
                    Err(err) => {
                        debug!(post_id, error = %err, "Permalink lookup failed");
                        None
                    }
                };
                Ok(PostOutcome::Published {
                    id: post_id,
                    container_id,
                    permalink,
                    media_type: request.kind,
                })
            }
            Err(PostgramError::RateLimited { retry_seconds, .. }) => Ok(PostOutcome::Pending {
                container_id,
                retry_after: retry_seconds,
                media_type: request.kind,
                message:
                    "Rate limit reached. Post will be published automatically when the limit allows."
                        .to_string(),
            }),
            Err(err) => Err(err),
        }
    }

    /// Posts a single image, the most common operation.
    ///
    /// # Errors
    ///
    /// Same as [`MediaPublisher::post_media`].
    pub async fn post_image(
        &mut self,
        image_url: &str,
        caption: Option<String>,
    ) -> Result<PostOutcome, PostgramError> {
        self.post_media(&ContainerRequest::image(image_url, caption))
            .await
    }

    /// Republishes pending containers whose retry windows have reopened.
    ///
    /// Never fails: each entry's errors are contained to that entry, so a
    /// poison entry cannot block the rest. Entries are abandoned once their
    /// retry budget is spent or their container reaches a dead status.
    pub async fn resume_pending(&mut self) {
        let now = Utc::now();
        let due: Vec<PendingContainer> = self
            .state
            .pending_containers
            .values()
            .filter(|entry| entry.next_attempt_time <= now)
            .cloned()
            .collect();
        if due.is_empty() {
            return;
        }

        info!(
            due = due.len(),
            total = self.state.pending_containers.len(),
            "Processing pending containers"
        );
        for entry in due {
            self.resume_one(entry).await;
        }
    }

    /// Replays a single pending entry.
    async fn resume_one(&mut self, entry: PendingContainer) {
        let container_id = entry.container_id.clone();
        debug!(
            container_id,
            retry_count = entry.retry_count,
            "Retrying pending container"
        );

        let status = match self.api.container_status(&container_id).await {
            Ok(status) => status,
            Err(PostgramError::RateLimited {
                retry_seconds,
                details,
            }) => {
                self.bump_or_abandon(&entry, retry_seconds, &details.to_string());
                return;
            }
            Err(err) => {
                warn!(container_id, error = %err, "Abandoning pending container after status failure");
                self.abandon(&container_id);
                return;
            }
        };

        match status {
            ContainerStatus::Finished => match self.publish(&container_id).await {
                Ok(post_id) => {
                    info!(container_id, post_id, "Published pending container");
                }
                Err(PostgramError::RateLimited {
                    retry_seconds,
                    details,
                }) => {
                    self.bump_or_abandon(&entry, retry_seconds, &details.to_string());
                }
                Err(err) => {
                    warn!(container_id, error = %err, "Abandoning pending container after publish failure");
                    self.abandon(&container_id);
                }
            },
            ContainerStatus::Error | ContainerStatus::Expired | ContainerStatus::Timeout => {
                warn!(container_id, %status, "Abandoning pending container in dead status");
                self.abandon(&container_id);
            }
            ContainerStatus::InProgress => {
                debug!(container_id, "Container still processing, leaving pending");
            }
        }
    }

    /// Re-parks an entry with an incremented retry count, or abandons it once
    /// the budget is spent.
    fn bump_or_abandon(&mut self, entry: &PendingContainer, retry_seconds: u64, last_error: &str) {
        let retry_count = entry.retry_count + 1;
        if retry_count >= self.max_pending_retries {
            warn!(
                container_id = %entry.container_id,
                retry_count,
                "Abandoning container after exhausting pending retries"
            );
            self.abandon(&entry.container_id);
            return;
        }
        self.park(&entry.container_id, retry_count, retry_seconds, last_error);
        self.persist();
    }

    /// Inserts or overwrites a pending entry. The original `created_at`
    /// survives overwrites.
    fn park(&mut self, container_id: &str, retry_count: u32, retry_seconds: u64, last_error: &str) {
        let now = Utc::now();
        let created_at = self
            .state
            .pending_containers
            .get(container_id)
            .map_or(now, |existing| existing.created_at);

        self.state.pending_containers.insert(
            container_id.to_string(),
            PendingContainer {
                container_id: container_id.to_string(),
                retry_count,
                next_attempt_time: now
                    .checked_add_signed(chrono_secs(retry_seconds))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
                last_error: last_error.to_string(),
                created_at,
                last_attempt: now,
            },
        );
        warn!(
            container_id,
            retry_count, retry_seconds, "Parked rate-limited container for a later attempt"
        );
    }

    /// Drops a pending entry, persisting when one was present.
    fn abandon(&mut self, container_id: &str) {
        if self.state.pending_containers.remove(container_id).is_some() {
            self.persist();
        }
    }

    /// Saves current state. Failures are logged; the in-memory state stays
    /// authoritative for this process.
    fn persist(&self) {
        if let Err(err) = self.store.save(&self.state) {
            warn!(error = %err, "Failed to persist publisher state");
        }
    }
}

async fn sleep_secs(secs: f64) {
    tokio::time::sleep(Duration::from_secs_f64(secs.max(0.0))).await;
}

fn chrono_secs(secs: u64) -> ChronoDuration {
    i64::try_from(secs)
        .ok()
        .and_then(ChronoDuration::try_seconds)
        .unwrap_or(ChronoDuration::MAX)
}
