// SPDX-License-Identifier: Apache-2.0

//! Output rendering for CLI commands.
//!
//! Centralizes all output formatting logic, supporting text and JSON formats.
//! Command handlers return data; this module handles presentation.

use console::style;
use postgram_core::PostOutcome;

use crate::cli::{OutputContext, OutputFormat};
use crate::commands::types::{AuthResult, PendingResult, ResumeResult, StatsResult};

/// Render the outcome of a post command.
pub fn render_post(outcome: &PostOutcome, ctx: &OutputContext) {
    match ctx.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(outcome)
                    .expect("Failed to serialize post outcome to JSON")
            );
        }
        OutputFormat::Text => match outcome {
            PostOutcome::Published {
                id,
                container_id,
                permalink,
                media_type,
            } => {
                println!();
                println!("{} Post published!", style("*").green().bold());
                println!("  Post ID: {}", style(id).cyan());
                println!("  Media type: {media_type}");
                println!("  Container: {}", style(container_id).dim());
                if let Some(link) = permalink {
                    println!("  Permalink: {}", style(link).cyan().underlined());
                }
                println!();
            }
            PostOutcome::Pending {
                container_id,
                retry_after,
                media_type,
                message,
            } => {
                println!();
                println!(
                    "{} Publish deferred by rate limiting.",
                    style("!").yellow().bold()
                );
                println!(
                    "  Container {} ({media_type}) parked; next attempt in {}.",
                    style(container_id).cyan(),
                    format_eta(*retry_after)
                );
                println!("  {}", style(message).dim());
                println!();
            }
        },
    }
}

/// Render the pending-posts listing.
pub fn render_pending(result: &PendingResult, ctx: &OutputContext) {
    match ctx.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&result.posts)
                    .expect("Failed to serialize pending posts to JSON")
            );
        }
        OutputFormat::Text => {
            if result.posts.is_empty() {
                println!();
                println!("{}", style("No pending posts.").yellow());
                println!("Rate-limited posts are parked here until they are republished.");
                println!();
                return;
            }

            println!();
            println!(
                "{}",
                style(format!("Pending posts ({} total):", result.posts.len())).bold()
            );
            println!();

            println!(
                "  {} {} {} {}",
                style(format!("{:<18}", "Container")).cyan(),
                style(format!("{:<8}", "Retries")).cyan(),
                style(format!("{:<14}", "Next attempt")).cyan(),
                style("Last error").cyan()
            );
            println!("  {}", style("-".repeat(70)).dim());

            for post in &result.posts {
                let container = format!("{:<18}", post.container_id);
                let retries = format!("{:<8}", post.retry_count);
                let next = if post.next_attempt_in_secs == 0 {
                    "due now".to_string()
                } else {
                    format!("in {}", format_eta(post.next_attempt_in_secs))
                };

                println!(
                    "  {} {} {:<14} {}",
                    style(container).green(),
                    retries,
                    next,
                    style(truncate(&post.last_error, 40)).dim()
                );
            }

            println!();
        }
    }
}

/// Render the outcome of a resume pass.
pub fn render_resume(result: &ResumeResult, ctx: &OutputContext) {
    match ctx.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(result)
                    .expect("Failed to serialize resume result to JSON")
            );
        }
        OutputFormat::Text => {
            println!();
            if result.due == 0 {
                println!("{}", style("No pending posts are due yet.").yellow());
                if result.remaining > 0 {
                    println!("Run `postgram pending` to see upcoming retry windows.");
                }
            } else {
                println!("{} Resume pass complete.", style("*").green().bold());
                println!("  Due: {}", result.due);
                println!("  Published: {}", style(result.published).green());
                println!("  Still pending: {}", result.remaining);
            }
            println!();
        }
    }
}

/// Render publish statistics.
pub fn render_stats(result: &StatsResult, ctx: &OutputContext) {
    match ctx.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(result).expect("Failed to serialize stats to JSON")
            );
        }
        OutputFormat::Text => {
            println!();
            println!("{}", style("Publish statistics:").bold());
            println!();
            println!(
                "  Successful:   {}",
                style(result.stats.successful_posts).green()
            );
            println!("  Failed:       {}", style(result.stats.failed_posts).red());
            println!(
                "  Rate limited: {}",
                style(result.stats.rate_limited_posts).yellow()
            );
            println!("  Pending now:  {}", result.pending_posts);
            println!();
            println!(
                "  {}",
                style(format!("State file: {}", result.state_file)).dim()
            );
            println!();
        }
    }
}

/// Render the auth check result.
pub fn render_auth(result: &AuthResult, ctx: &OutputContext) {
    match ctx.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(result)
                    .expect("Failed to serialize auth result to JSON")
            );
        }
        OutputFormat::Text => {
            println!();
            if result.token.is_publish_ready() {
                println!(
                    "{} Token is valid and publish-ready.",
                    style("*").green().bold()
                );
            } else if result.token.is_valid {
                println!(
                    "{} Token is valid but missing publish scopes:",
                    style("!").yellow().bold()
                );
                for scope in &result.token.missing_scopes {
                    println!("  {} {}", style("-").dim(), scope);
                }
            } else {
                println!("{} Token is invalid or expired.", style("!").red().bold());
            }

            if let Some(usage) = &result.usage {
                println!();
                if let (Some(id), Some(name)) = (&usage.account_id, &usage.account_name) {
                    println!("Account: {} ({})", style(name).cyan(), style(id).dim());
                }
                if let Some(app_usage) = &usage.app_usage {
                    println!("App usage: {app_usage}");
                }
                if !usage.regain_access.is_empty() {
                    println!("{}", style("Regain-access deadlines:").bold());
                    for (app_id, deadline) in &usage.regain_access {
                        println!(
                            "  {} {}",
                            style(app_id).cyan(),
                            deadline.format("%Y-%m-%d %H:%M:%S UTC")
                        );
                    }
                }
            }
            println!();
        }
    }
}

/// Formats a second count as a short human-readable duration.
fn format_eta(secs: u64) -> String {
    if secs == 0 {
        return "now".to_string();
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Truncates text to a maximum character count, adding an ellipsis.
fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_eta_zero_is_now() {
        assert_eq!(format_eta(0), "now");
    }

    #[test]
    fn test_format_eta_seconds_only() {
        assert_eq!(format_eta(45), "45s");
    }

    #[test]
    fn test_format_eta_minutes_and_seconds() {
        assert_eq!(format_eta(65), "1m 5s");
        assert_eq!(format_eta(900), "15m 0s");
    }

    #[test]
    fn test_format_eta_hours_and_minutes() {
        assert_eq!(format_eta(3700), "1h 1m");
        assert_eq!(format_eta(7200), "2h 0m");
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("short", 40), "short");
    }

    #[test]
    fn test_truncate_long_text_gets_ellipsis() {
        let long = "Application request limit reached, please slow down and retry";
        let result = truncate(long, 20);
        assert!(result.ends_with("..."));
        assert_eq!(result.chars().count(), 20);
    }
}
