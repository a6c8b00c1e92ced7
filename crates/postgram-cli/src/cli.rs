// SPDX-License-Identifier: Apache-2.0

//! Command-line interface definition for postgram.
//!
//! Uses clap's derive API for declarative CLI parsing.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use postgram_core::MediaKind;

/// Output format for CLI results.
#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with colors (default)
    #[default]
    Text,
    /// JSON output for programmatic consumption
    Json,
}

/// Global output configuration passed to commands.
#[derive(Clone)]
pub struct OutputContext {
    /// Output format (text, json)
    pub format: OutputFormat,
    /// Suppress non-essential output (spinners, progress)
    pub quiet: bool,
    /// Enable verbose output (debug-level logging)
    pub verbose: bool,
    /// Whether stdout is a terminal (TTY)
    pub is_tty: bool,
}

impl OutputContext {
    /// Creates an `OutputContext` from CLI arguments.
    pub fn from_cli(format: OutputFormat, quiet: bool, verbose: bool) -> Self {
        Self {
            format,
            quiet,
            verbose,
            is_tty: std::io::stdout().is_terminal(),
        }
    }

    /// Returns true if interactive elements (spinners, colors) should be shown.
    pub fn is_interactive(&self) -> bool {
        self.is_tty && !self.quiet && matches!(self.format, OutputFormat::Text)
    }
}

/// Kind of media to publish, as accepted on the command line.
#[derive(Clone, Copy, Default, ValueEnum)]
pub enum MediaKindArg {
    /// Single image post (default)
    #[default]
    Image,
    /// Single video post
    Video,
    /// Reel
    Reel,
    /// Story (image asset unless --video-story is passed)
    Story,
}

impl From<MediaKindArg> for MediaKind {
    fn from(arg: MediaKindArg) -> Self {
        match arg {
            MediaKindArg::Image => MediaKind::Image,
            MediaKindArg::Video => MediaKind::Video,
            MediaKindArg::Reel => MediaKind::Reels,
            MediaKindArg::Story => MediaKind::Story,
        }
    }
}

/// Postgram - Reliable Instagram publishing via the Graph API.
///
/// Publishes images, videos, reels, and stories through the Instagram
/// Graph API, parking rate-limited posts durably and republishing them
/// once their retry windows reopen.
#[derive(Parser)]
#[command(name = "postgram")]
#[command(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Output format (text, json)
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    pub output: OutputFormat,

    /// Suppress non-essential output (spinners, progress)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug-level logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Override the state file location
    #[arg(long, global = true, value_name = "PATH")]
    pub state_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Publish a media asset from a publicly reachable URL
    Post {
        /// URL of the media asset
        url: String,

        /// Caption attached at creation time
        #[arg(long, short = 'c')]
        caption: Option<String>,

        /// Kind of media to publish
        #[arg(long, short = 'k', default_value = "image", value_enum)]
        kind: MediaKindArg,

        /// Reels: do not surface the reel in the main feed
        #[arg(long)]
        no_share_to_feed: bool,

        /// Reels: name of the audio track
        #[arg(long)]
        audio_name: Option<String>,

        /// Reels: cover image URL
        #[arg(long)]
        cover_url: Option<String>,

        /// Reels: cover frame offset into the video, in milliseconds
        #[arg(long)]
        thumb_offset: Option<u32>,

        /// Story: the asset URL points at a video rather than an image
        #[arg(long)]
        video_story: bool,

        /// Skip republishing due pending posts before this one
        #[arg(long)]
        no_resume: bool,
    },

    /// List rate-limited posts awaiting republish
    Pending,

    /// Republish pending posts whose retry windows have reopened
    Resume,

    /// Show publish statistics
    Stats,

    /// Check access token validity, scopes, and API usage
    Auth,
}
