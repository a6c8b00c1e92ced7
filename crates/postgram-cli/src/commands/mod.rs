// SPDX-License-Identifier: Apache-2.0

//! Command handlers for the postgram CLI.

pub mod auth;
pub mod post;
pub mod resume;
pub mod status;
pub mod types;

use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use postgram_core::{AppConfig, ContainerOptions, GraphClient, MediaPublisher, StateStore};

use crate::cli::{Commands, OutputContext};
use crate::output;

/// Creates a styled spinner (only if interactive).
fn maybe_spinner(ctx: &OutputContext, message: &str) -> Option<ProgressBar> {
    if ctx.is_interactive() {
        let s = ProgressBar::new_spinner();
        s.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("Invalid spinner template"),
        );
        s.set_message(message.to_string());
        s.enable_steady_tick(Duration::from_millis(100));
        Some(s)
    } else {
        None
    }
}

/// Builds the publisher the network-facing commands drive.
fn build_publisher(config: &AppConfig) -> Result<MediaPublisher<GraphClient>> {
    let client = GraphClient::new(&config.api)?;
    let store = StateStore::new(config.state.file_path());
    Ok(MediaPublisher::new(client, store, &config.publish))
}

/// Dispatch to the appropriate command handler.
#[allow(clippy::too_many_lines)]
pub async fn run(command: Commands, ctx: OutputContext, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Post {
            url,
            caption,
            kind,
            no_share_to_feed,
            audio_name,
            cover_url,
            thumb_offset,
            video_story,
            no_resume,
        } => {
            let options = ContainerOptions {
                share_to_feed: no_share_to_feed.then_some(false),
                audio_name,
                cover_url,
                thumb_offset,
                video_story,
            };
            let request = post::build_request(kind, url, caption, options);
            let mut publisher = build_publisher(config)?;

            // Due pending posts go out before the new one.
            if !no_resume {
                let spinner = maybe_spinner(&ctx, "Republishing due pending posts...");
                publisher.resume_pending().await;
                if let Some(s) = spinner {
                    s.finish_and_clear();
                }
            }

            let spinner = maybe_spinner(&ctx, "Creating and publishing media...");
            let outcome = publisher.post_media(&request).await?;
            if let Some(s) = spinner {
                s.finish_and_clear();
            }

            output::render_post(&outcome, &ctx);
            Ok(())
        }

        Commands::Pending => {
            let result = status::run_pending(config);
            output::render_pending(&result, &ctx);
            Ok(())
        }

        Commands::Resume => {
            let mut publisher = build_publisher(config)?;
            let spinner = maybe_spinner(&ctx, "Republishing due pending posts...");
            let result = resume::run(&mut publisher).await;
            if let Some(s) = spinner {
                s.finish_and_clear();
            }
            output::render_resume(&result, &ctx);
            Ok(())
        }

        Commands::Stats => {
            let result = status::run_stats(config);
            output::render_stats(&result, &ctx);
            Ok(())
        }

        Commands::Auth => {
            let spinner = maybe_spinner(&ctx, "Checking access token...");
            let result = auth::run(config).await;
            if let Some(s) = spinner {
                s.finish_and_clear();
            }
            let result = result?;
            output::render_auth(&result, &ctx);
            Ok(())
        }
    }
}
