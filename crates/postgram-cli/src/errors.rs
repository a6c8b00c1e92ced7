// SPDX-License-Identifier: Apache-2.0

//! CLI-specific error formatting with user-friendly hints.
//!
//! This module provides a formatting layer that downcasts `anyhow::Error` to
//! `PostgramError` and adds actionable hints for different error types. This
//! separates structured error data (library) from user-friendly presentation
//! (CLI).

use std::fmt::Write;

use anyhow::Error;
use postgram_core::PostgramError;

/// Formats an error for CLI display with helpful hints.
///
/// Downcasts `anyhow::Error` to `PostgramError` and adds per-variant hints.
/// If the error is not a `PostgramError`, returns the original error message.
pub fn format_error(error: &Error) -> String {
    if let Some(postgram_err) = error.downcast_ref::<PostgramError>() {
        match postgram_err {
            PostgramError::RateLimited { retry_seconds, .. } => {
                format_rate_limited_error(*retry_seconds)
            }
            PostgramError::Authentication(_) => {
                format!(
                    "{postgram_err}\n\nTip: Generate a fresh access token, update POSTGRAM_API__ACCESS_TOKEN, then run `postgram auth` to verify it."
                )
            }
            PostgramError::Permission(_) => {
                format!(
                    "{postgram_err}\n\nTip: The token is missing a publishing permission. Run `postgram auth` to see which scopes are missing."
                )
            }
            PostgramError::Media(_) => {
                format!(
                    "{postgram_err}\n\nTip: Check that the media URL is publicly reachable and the asset meets Instagram's format limits."
                )
            }
            PostgramError::TemporaryServer(_) => {
                format!(
                    "{postgram_err}\n\nTip: This is usually a transient Graph API problem. Try again in a moment."
                )
            }
            PostgramError::Config { message: _ } => {
                format!(
                    "{postgram_err}\n\nTip: Check your config file at {}",
                    postgram_core::config_file_path().display()
                )
            }
            PostgramError::Network(_) => {
                format!("{postgram_err}\n\nTip: Check your internet connection and try again.")
            }
            PostgramError::Api(_) => postgram_err.to_string(),
        }
    } else {
        // Not a PostgramError, return the original error chain
        error.to_string()
    }
}

/// Formats a rate limit error with recovery hints.
fn format_rate_limited_error(retry_seconds: u64) -> String {
    let mut msg = format!("Rate limit reached, retry after {retry_seconds}s");

    msg.push_str("\n\nTip: The account hit its publishing quota.");
    msg.push_str("\n- Wait at least ");
    let _ = write!(msg, "{retry_seconds}");
    msg.push_str(" seconds before retrying.");
    msg.push_str("\n- Rate-limited posts are parked; `postgram resume` republishes them once the window reopens.");

    msg
}
