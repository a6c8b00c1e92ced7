// SPDX-License-Identifier: Apache-2.0

//! Instagram Graph API surface.
//!
//! [`client`] owns the authenticated transport (pacing, retries, envelope
//! decoding), [`media`] the container endpoints behind the [`ContainerApi`]
//! seam, [`auth`] token introspection and usage reporting, and [`types`] the
//! shared request/status types.

pub mod auth;
pub mod client;
pub mod media;
pub mod types;

pub use auth::{TokenCheck, UsageReport};
pub use client::GraphClient;
pub use media::ContainerApi;
pub use types::{ContainerOptions, ContainerRequest, ContainerStatus, MediaKind};
