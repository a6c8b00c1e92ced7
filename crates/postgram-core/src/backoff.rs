// SPDX-License-Identifier: Apache-2.0

//! Backoff calculators for rate-limit retries and container polling.
//!
//! The functions here are pure: they return delays and never sleep, so
//! callers own the awaiting and tests stay fast. The connection-level retry
//! policy for transient HTTP failures lives here too, built on `backon`.

use std::time::Duration;

use backon::ExponentialBuilder;

/// Upper bound on any computed rate-limit backoff (seconds).
pub const MAX_DELAY_SECS: f64 = 3600.0;

/// Rate-limit retry budget before an operation is abandoned.
pub const MAX_ATTEMPTS: u32 = 5;

/// Cap on a single polling delay (seconds).
const POLL_MAX_DELAY_SECS: f64 = 45.0;

/// Spread of the additive polling jitter (seconds).
const POLL_JITTER_SECS: f64 = 3.0;

/// Computes the jittered delay before the next rate-limit retry.
///
/// Attempt 0 waits a flat 300 seconds; the first throttling window is long
/// and retrying sooner just burns quota. Later attempts double `base_delay`
/// per attempt, capped at [`MAX_DELAY_SECS`]. Multiplicative jitter in
/// `[0.75, 1.25]` spreads concurrent publishers apart.
///
/// `base_delay` is normally the retry window reported by the API error.
#[must_use]
pub fn rate_limit_backoff(attempt: u32, base_delay: f64) -> f64 {
    let delay = if attempt == 0 {
        300.0
    } else {
        MAX_DELAY_SECS.min(base_delay * 2f64.powf(f64::from(attempt)))
    };
    delay * (0.75 + fastrand::f64() * 0.5)
}

/// Computes the delay before the next container status poll.
///
/// Grows by 1.5x per attempt from `base_delay`, plus up to 3 seconds of
/// additive jitter, capped at 45 seconds.
#[must_use]
pub fn poll_delay(attempt: u32, base_delay: f64) -> f64 {
    let delay = base_delay * 1.5f64.powf(f64::from(attempt)) + fastrand::f64() * POLL_JITTER_SECS;
    delay.min(POLL_MAX_DELAY_SECS)
}

/// Determines if an HTTP status is a transient server failure worth an
/// immediate connection-level retry.
#[must_use]
pub fn is_transient_http(status: u16) -> bool {
    matches!(status, 500 | 502 | 503 | 504)
}

/// Creates the exponential backoff for connection-level retries.
///
/// Up to 3 retries with doubling delay starting at 500ms, jittered. This is
/// separate from the rate-limit loop: it covers 5xx responses and dropped
/// connections, not API throttling.
#[must_use]
pub fn connection_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_factor(2.0)
        .with_min_delay(Duration::from_millis(500))
        .with_max_times(3)
        .with_jitter()
}
