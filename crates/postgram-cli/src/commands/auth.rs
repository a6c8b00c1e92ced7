// SPDX-License-Identifier: Apache-2.0

//! Auth command: token validity, scopes, and usage reporting.

use anyhow::Result;
use postgram_core::{AppConfig, GraphClient};
use tracing::debug;

use crate::commands::types::AuthResult;

/// Run the auth command - verify the token and gather usage info.
pub async fn run(config: &AppConfig) -> Result<AuthResult> {
    let client = GraphClient::new(&config.api)?;
    let token = client.check_token_permissions().await?;

    // Usage is informational; an invalid token cannot fetch it anyway.
    let usage = if token.is_valid {
        match client.usage_report().await {
            Ok(report) => Some(report),
            Err(err) => {
                debug!(error = %err, "Usage report unavailable");
                None
            }
        }
    } else {
        None
    };

    Ok(AuthResult { token, usage })
}
