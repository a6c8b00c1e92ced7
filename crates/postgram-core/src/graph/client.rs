// SPDX-License-Identifier: Apache-2.0

//! Paced HTTP transport for the Graph API.
//!
//! Every call goes through [`GraphClient::request`], which paces outbound
//! traffic, injects the access token, retries transient connection failures,
//! and decodes the Graph error envelope into typed [`PostgramError`] values.
//! Rate-limited responses are additionally retried here with capped
//! exponential backoff before the error surfaces to the publisher.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use backon::Retryable;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::backoff::{connection_backoff, is_transient_http, rate_limit_backoff};
use crate::config::ApiConfig;
use crate::error::{ErrorEnvelope, PostgramError};

/// Paced Graph API client.
///
/// Holds the HTTP client, credentials, and pacing state for reuse across
/// requests. All interior state is behind locks, so the client can be shared
/// freely behind an `Arc`.
#[derive(Debug)]
pub struct GraphClient {
    /// HTTP client with configured timeout.
    http: Client,
    /// Versioned API root, e.g. `https://graph.facebook.com/v23.0`.
    base_url: String,
    /// Access token injected into every request's query string.
    access_token: SecretString,
    /// Instagram account id used by the media endpoints.
    user_id: String,
    /// Minimum wall-clock interval between consecutive outbound calls.
    min_request_interval: Duration,
    /// Attempt budget for rate-limited requests.
    rate_limit_attempts: u32,
    /// Start time of the most recent outbound call.
    last_request: tokio::sync::Mutex<Option<Instant>>,
    /// Per-app-id deadlines parsed from usage headers. Informational only;
    /// nothing blocks on them.
    usage_windows: Mutex<HashMap<String, DateTime<Utc>>>,
    /// Most recent `x-app-usage` header payload.
    app_usage: Mutex<Option<Value>>,
}

impl GraphClient {
    /// Creates a client from API configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PostgramError::Config`] if the access token or user id is
    /// missing, or [`PostgramError::Network`] if the HTTP client cannot be
    /// built.
    pub fn new(config: &ApiConfig) -> Result<Self, PostgramError> {
        if config.access_token.trim().is_empty() {
            return Err(PostgramError::Config {
                message: "api.access_token is not set; add it to config.toml or export POSTGRAM_API__ACCESS_TOKEN".to_string(),
            });
        }
        if config.user_id.trim().is_empty() {
            return Err(PostgramError::Config {
                message: "api.user_id is not set; add it to config.toml or export POSTGRAM_API__USER_ID".to_string(),
            });
        }

        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            base_url: format!(
                "{}/{}",
                config.base_url.trim_end_matches('/'),
                config.api_version
            ),
            access_token: config.token(),
            user_id: config.user_id.clone(),
            min_request_interval: config.min_request_interval(),
            rate_limit_attempts: config.rate_limit_attempts,
            last_request: tokio::sync::Mutex::new(None),
            usage_windows: Mutex::new(HashMap::new()),
            app_usage: Mutex::new(None),
        })
    }

    /// Instagram account id this client posts as.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Access token, exposed for endpoints that take it as a parameter.
    pub(crate) fn token(&self) -> &SecretString {
        &self.access_token
    }

    /// Issues a GET request against a relative endpoint.
    ///
    /// # Errors
    ///
    /// Returns the decoded API error, a rate-limit error once the retry
    /// budget is exhausted, or a network error.
    pub async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Option<Value>, PostgramError> {
        self.request(Method::GET, endpoint, params, None).await
    }

    /// Issues a POST request with a form-encoded body.
    ///
    /// # Errors
    ///
    /// Same as [`GraphClient::get`].
    pub async fn post_form(
        &self,
        endpoint: &str,
        form: &[(String, String)],
    ) -> Result<Option<Value>, PostgramError> {
        self.request(Method::POST, endpoint, &[], Some(form)).await
    }

    /// Sends a request, absorbing rate limits with capped exponential backoff.
    ///
    /// Each attempt is paced and connection-retried individually. Once the
    /// attempt budget is spent the rate-limit error is returned unchanged so
    /// the caller can park the work durably instead.
    ///
    /// # Errors
    ///
    /// Returns the decoded API error, a rate-limit error once the retry
    /// budget is exhausted, or a network error.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, String)],
        form: Option<&[(String, String)]>,
    ) -> Result<Option<Value>, PostgramError> {
        let mut attempt: u32 = 0;
        loop {
            match self.send_paced(method.clone(), endpoint, params, form).await {
                Err(PostgramError::RateLimited {
                    retry_seconds,
                    details,
                }) if attempt + 1 < self.rate_limit_attempts => {
                    #[allow(clippy::cast_precision_loss)]
                    let delay = Duration::from_secs_f64(rate_limit_backoff(
                        attempt,
                        retry_seconds as f64,
                    ));
                    warn!(
                        error = %details,
                        attempt = attempt + 1,
                        max_attempts = self.rate_limit_attempts,
                        delay = ?delay,
                        "Rate limited, backing off before retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Sends one paced request, retrying transient connection failures.
    ///
    /// The pacing lock is held across the call so concurrent callers keep the
    /// minimum interval between request starts.
    async fn send_paced(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, String)],
        form: Option<&[(String, String)]>,
    ) -> Result<Option<Value>, PostgramError> {
        let guard = self.pace().await;

        let response = (|| async { self.execute(method.clone(), endpoint, params, form).await })
            .retry(connection_backoff())
            .when(Self::is_transient)
            .notify(|err: &PostgramError, dur: Duration| {
                warn!(error = %err, delay = ?dur, "Retrying transient connection failure");
            })
            .await?;
        drop(guard);

        self.record_usage_headers(response.headers());
        Self::decode(response).await
    }

    /// Sleeps out the remainder of the minimum request interval, then stamps
    /// the start of the next call.
    async fn pace(&self) -> tokio::sync::MutexGuard<'_, Option<Instant>> {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_request_interval {
                let wait = self.min_request_interval - elapsed;
                debug!(wait = ?wait, "Pacing outbound request");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
        last
    }

    /// Builds and sends a single HTTP request.
    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, String)],
        form: Option<&[(String, String)]>,
    ) -> Result<reqwest::Response, PostgramError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut request = self
            .http
            .request(method, &url)
            .query(&[("access_token", self.access_token.expose_secret())]);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(form) = form {
            request = request.form(form);
        }

        let response = request.send().await?;

        // 5xx surfaces as a network error (matched by the transient retry filter).
        if is_transient_http(response.status().as_u16())
            && let Err(err) = response.error_for_status_ref()
        {
            return Err(PostgramError::Network(err));
        }
        Ok(response)
    }

    /// Connection-level failures worth a transparent retry.
    fn is_transient(err: &PostgramError) -> bool {
        match err {
            PostgramError::Network(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| is_transient_http(s.as_u16()))
            }
            _ => false,
        }
    }

    /// Reads the response body and decodes it.
    async fn decode(response: reqwest::Response) -> Result<Option<Value>, PostgramError> {
        let status = response.status();
        let body = response.text().await?;
        Self::decode_text(status, &body)
    }

    /// Decodes a response body, mapping the Graph error envelope to typed
    /// errors.
    ///
    /// The envelope is checked regardless of HTTP status since the API can
    /// return an error payload with a 200. Empty bodies decode to `None`.
    fn decode_text(status: StatusCode, body: &str) -> Result<Option<Value>, PostgramError> {
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
            return Err(envelope.into_error());
        }
        if !status.is_success() {
            return Err(PostgramError::api(format!(
                "Failed to parse error response (HTTP {})",
                status.as_u16()
            )));
        }
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(body)
            .map(Some)
            .map_err(|err| PostgramError::api(format!("Invalid JSON in response body: {err}")))
    }

    /// Records usage-accounting headers when present.
    fn record_usage_headers(&self, headers: &HeaderMap) {
        if let Some(raw) = headers
            .get("x-business-use-case-usage")
            .and_then(|v| v.to_str().ok())
        {
            let windows = parse_business_usage(raw);
            if !windows.is_empty()
                && let Ok(mut recorded) = self.usage_windows.lock()
            {
                recorded.extend(windows);
            }
        }

        if let Some(raw) = headers.get("x-app-usage").and_then(|v| v.to_str().ok())
            && let Ok(value) = serde_json::from_str::<Value>(raw)
            && let Ok(mut usage) = self.app_usage.lock()
        {
            *usage = Some(value);
        }
    }

    /// Estimated per-app-id times at which rate-limited access resumes, as
    /// reported by the API on earlier responses.
    #[must_use]
    pub fn usage_windows(&self) -> HashMap<String, DateTime<Utc>> {
        self.usage_windows
            .lock()
            .map(|windows| windows.clone())
            .unwrap_or_default()
    }

    /// Most recent `x-app-usage` header payload, when one has been seen.
    #[must_use]
    pub fn app_usage(&self) -> Option<Value> {
        self.app_usage.lock().ok().and_then(|usage| usage.clone())
    }
}

/// Parses the `x-business-use-case-usage` header into per-app-id deadlines.
///
/// The header is a JSON map of app id to an array of usage metrics; the first
/// entry's `estimated_time_to_regain_access` is seconds from now.
fn parse_business_usage(raw: &str) -> HashMap<String, DateTime<Utc>> {
    let mut windows = HashMap::new();
    let Ok(data) = serde_json::from_str::<Value>(raw) else {
        warn!("Failed to parse business usage header");
        return windows;
    };
    let Some(entries) = data.as_object() else {
        return windows;
    };

    let now = Utc::now();
    for (app_id, metrics) in entries {
        if let Some(first) = metrics.as_array().and_then(|list| list.first())
            && let Some(secs) = first
                .get("estimated_time_to_regain_access")
                .and_then(Value::as_i64)
        {
            windows.insert(app_id.clone(), now + chrono::Duration::seconds(secs));
        }
    }
    windows
}

/// Decodes an already-parsed response body into a typed value.
///
/// `None` bodies decode to the type's default, which keeps endpoint wrappers
/// total over empty responses.
pub(crate) fn decode_body<T>(body: Option<Value>) -> Result<T, PostgramError>
where
    T: serde::de::DeserializeOwned + Default,
{
    match body {
        Some(value) => serde_json::from_value(value)
            .map_err(|err| PostgramError::api(format!("Unexpected response shape: {err}"))),
        None => Ok(T::default()),
    }
}
