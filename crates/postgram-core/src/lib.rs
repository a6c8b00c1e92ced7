// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! # Postgram Core
//!
//! Core library for the Postgram CLI - Instagram Graph API publishing with
//! durable rate-limit recovery.
//!
//! This crate provides reusable components for:
//! - Graph API transport (request pacing, connection retries, error decoding)
//! - Media container publishing (create, poll, publish)
//! - Durable pending state so rate-limited posts complete on a later run
//! - Token and usage introspection
//! - Configuration management
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use postgram_core::{GraphClient, MediaPublisher, StateStore, load_config};
//!
//! # async fn example() -> anyhow::Result<()> {
//! // Load configuration
//! let config = load_config()?;
//!
//! // Create the Graph API client and the durable state store
//! let client = GraphClient::new(&config.api)?;
//! let store = StateStore::new(config.state.file_path());
//!
//! // Recover posts rate-limited on previous runs, then publish
//! let mut publisher = MediaPublisher::new(client, store, &config.publish);
//! publisher.resume_pending().await;
//!
//! let outcome = publisher
//!     .post_image(
//!         "https://example.com/sunset.jpg",
//!         Some("Golden hour".to_string()),
//!     )
//!     .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`backoff`] - Retry delay calculators
//! - [`config`] - Configuration loading and paths
//! - [`error`] - Error types and Graph error classification
//! - [`graph`] - Graph API client (transport, media, auth)
//! - [`publisher`] - Publish state machine
//! - [`state`] - Durable pending-post store

// ============================================================================
// Error Handling
// ============================================================================

pub use error::{ErrorDetails, ErrorKind, PostgramError, classify, recommended_retry_secs};

/// Convenience Result type for Postgram operations.
///
/// This is equivalent to `std::result::Result<T, PostgramError>`.
pub type Result<T> = std::result::Result<T, PostgramError>;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{
    ApiConfig, AppConfig, PublishConfig, StateConfig, config_dir, config_file_path, data_dir,
    load_config,
};

// ============================================================================
// Graph API
// ============================================================================

pub use graph::{
    ContainerApi, ContainerOptions, ContainerRequest, ContainerStatus, GraphClient, MediaKind,
    TokenCheck, UsageReport,
};

// ============================================================================
// Publishing
// ============================================================================

pub use publisher::{MediaPublisher, PostOutcome};

// ============================================================================
// Durable State
// ============================================================================

pub use state::{PendingContainer, PendingPost, PublishStats, StateFile, StateStore};

// ============================================================================
// Backoff
// ============================================================================

pub use backoff::{MAX_ATTEMPTS, poll_delay, rate_limit_backoff};

// ============================================================================
// Modules
// ============================================================================

pub mod backoff;
pub mod config;
pub mod error;
pub mod graph;
pub mod publisher;
pub mod state;
