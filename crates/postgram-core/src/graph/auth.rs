// SPDX-License-Identifier: Apache-2.0

//! Token introspection and usage reporting.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::client::{GraphClient, decode_body};
use crate::error::PostgramError;

/// Scopes that qualify a token obtained through Facebook Login.
pub const FACEBOOK_LOGIN_SCOPES: [&str; 2] =
    ["instagram_basic", "instagram_content_publishing"];

/// Scopes that qualify a token obtained through Instagram Login (business).
pub const INSTAGRAM_LOGIN_SCOPES: [&str; 2] = [
    "instagram_business_basic",
    "instagram_business_content_publishing",
];

/// Result of a `debug_token` permission check.
#[derive(Debug, Clone, Serialize)]
pub struct TokenCheck {
    /// Whether the token itself is valid (not expired or revoked).
    pub is_valid: bool,
    /// Scopes missing from the closest qualifying permission set. Empty when
    /// the token can publish, or when the token is invalid outright.
    pub missing_scopes: Vec<String>,
}

impl TokenCheck {
    /// True when the token is valid and holds a complete publish scope set.
    #[must_use]
    pub fn is_publish_ready(&self) -> bool {
        self.is_valid && self.missing_scopes.is_empty()
    }
}

/// Account identity plus the rate-limit signals collected so far.
#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    /// Account id, when the API returns one.
    pub account_id: Option<String>,
    /// Account display name, when the API returns one.
    pub account_name: Option<String>,
    /// Most recent `x-app-usage` header payload seen on any response.
    pub app_usage: Option<Value>,
    /// Estimated per-app-id times at which rate-limited access resumes.
    pub regain_access: HashMap<String, DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct DebugTokenResponse {
    data: Option<TokenData>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenData {
    #[serde(default)]
    is_valid: bool,
    #[serde(default)]
    scopes: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AccountInfo {
    id: Option<String>,
    name: Option<String>,
}

impl GraphClient {
    /// Verifies the access token and its publish permissions.
    ///
    /// Either login flavor qualifies: the Facebook Login scope pair or the
    /// Instagram Login (business) pair. When neither set is complete, the
    /// closer one is reported as missing to guide configuration.
    ///
    /// # Errors
    ///
    /// Returns the decoded API error when the `debug_token` call fails.
    pub async fn check_token_permissions(&self) -> Result<TokenCheck, PostgramError> {
        let token = self.token().expose_secret().to_string();
        let body = self.get("debug_token", &[("input_token", token)]).await?;
        let response: DebugTokenResponse = decode_body(body)?;

        let Some(data) = response.data else {
            debug!("debug_token response carried no data");
            return Ok(TokenCheck {
                is_valid: false,
                missing_scopes: Vec::new(),
            });
        };
        if !data.is_valid {
            return Ok(TokenCheck {
                is_valid: false,
                missing_scopes: Vec::new(),
            });
        }

        let granted: HashSet<&str> = data.scopes.iter().map(String::as_str).collect();
        Ok(TokenCheck {
            is_valid: true,
            missing_scopes: missing_scopes(&granted),
        })
    }

    /// Fetches account identity and reports collected usage signals.
    ///
    /// # Errors
    ///
    /// Returns the decoded API error when the `me` lookup fails.
    pub async fn usage_report(&self) -> Result<UsageReport, PostgramError> {
        let body = self
            .get(
                "me",
                &[
                    ("debug", "all".to_string()),
                    ("fields", "id,name".to_string()),
                ],
            )
            .await?;
        let account: AccountInfo = decode_body(body)?;

        Ok(UsageReport {
            account_id: account.id,
            account_name: account.name,
            app_usage: self.app_usage(),
            regain_access: self.usage_windows(),
        })
    }
}

/// Scopes missing from the closest qualifying set, Facebook Login winning
/// ties.
fn missing_scopes(granted: &HashSet<&str>) -> Vec<String> {
    let missing_fb: Vec<&str> = FACEBOOK_LOGIN_SCOPES
        .iter()
        .copied()
        .filter(|scope| !granted.contains(scope))
        .collect();
    let missing_ig: Vec<&str> = INSTAGRAM_LOGIN_SCOPES
        .iter()
        .copied()
        .filter(|scope| !granted.contains(scope))
        .collect();

    let closest = if missing_fb.len() <= missing_ig.len() {
        missing_fb
    } else {
        missing_ig
    };
    closest.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn granted(scopes: &[&'static str]) -> HashSet<&'static str> {
        scopes.iter().copied().collect()
    }

    #[test]
    fn facebook_scope_set_is_publish_ready() {
        let scopes = granted(&["instagram_basic", "instagram_content_publishing", "email"]);
        assert!(missing_scopes(&scopes).is_empty());
    }

    #[test]
    fn instagram_scope_set_is_publish_ready() {
        let scopes = granted(&[
            "instagram_business_basic",
            "instagram_business_content_publishing",
        ]);
        assert!(missing_scopes(&scopes).is_empty());
    }

    #[test]
    fn reports_closest_missing_set() {
        // One Facebook scope missing versus both Instagram scopes missing.
        let scopes = granted(&["instagram_basic"]);
        assert_eq!(missing_scopes(&scopes), vec!["instagram_content_publishing"]);

        let scopes = granted(&["instagram_business_basic", "pages_show_list"]);
        assert_eq!(
            missing_scopes(&scopes),
            vec!["instagram_business_content_publishing"]
        );
    }

    #[test]
    fn ties_report_facebook_set() {
        let scopes = granted(&["email"]);
        assert_eq!(
            missing_scopes(&scopes),
            vec!["instagram_basic", "instagram_content_publishing"]
        );
    }

    #[test]
    fn publish_ready_requires_valid_token_and_full_scopes() {
        let check = TokenCheck {
            is_valid: true,
            missing_scopes: Vec::new(),
        };
        assert!(check.is_publish_ready());

        let check = TokenCheck {
            is_valid: false,
            missing_scopes: Vec::new(),
        };
        assert!(!check.is_publish_ready());

        let check = TokenCheck {
            is_valid: true,
            missing_scopes: vec!["instagram_basic".to_string()],
        };
        assert!(!check.is_publish_ready());
    }

    #[test]
    fn debug_token_response_decodes() {
        let response: DebugTokenResponse = decode_body(Some(json!({
            "data": {
                "app_id": "1234567890",
                "is_valid": true,
                "scopes": ["instagram_basic", "instagram_content_publishing"],
                "expires_at": 1_735_689_600
            }
        })))
        .unwrap();
        let data = response.data.unwrap();
        assert!(data.is_valid);
        assert_eq!(data.scopes.len(), 2);
    }

    #[test]
    fn debug_token_response_tolerates_missing_data() {
        let response: DebugTokenResponse = decode_body(Some(json!({}))).unwrap();
        assert!(response.data.is_none());
    }
}
