// SPDX-License-Identifier: Apache-2.0

//! Shared types for the Graph API media surface.

use bon::Builder;
use serde::{Deserialize, Serialize};

/// Kind of media being published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaKind {
    /// Single image post.
    Image,
    /// Single video post.
    Video,
    /// Reel.
    Reels,
    /// Story. Image by default; see [`ContainerOptions::video_story`].
    Story,
}

impl MediaKind {
    /// Wire value for the create endpoint's `media_type` parameter.
    #[must_use]
    pub fn api_media_type(self) -> &'static str {
        match self {
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
            Self::Reels => "REELS",
            Self::Story => "STORIES",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.api_media_type())
    }
}

/// Remote processing status of a media container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerStatus {
    /// Still processing remotely.
    InProgress,
    /// Ready to publish.
    Finished,
    /// Processing failed remotely.
    Error,
    /// Container expired before it was published.
    Expired,
    /// Local marker: the poll budget ran out with no terminal status.
    Timeout,
}

impl ContainerStatus {
    /// Maps a raw `status_code` value onto the enum.
    ///
    /// Codes this client does not recognize are treated as still in
    /// progress so the poll loop keeps watching them.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "FINISHED" => Self::Finished,
            "ERROR" => Self::Error,
            "EXPIRED" => Self::Expired,
            _ => Self::InProgress,
        }
    }

    /// True when the remote side will not change this status anymore.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Error | Self::Expired)
    }

    /// Wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Finished => "FINISHED",
            Self::Error => "ERROR",
            Self::Expired => "EXPIRED",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional create-time parameters beyond the asset URL and caption.
///
/// All fields are ignored for kinds they do not apply to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerOptions {
    /// Reels: also surface the reel in the main feed. The API defaults to
    /// true when the parameter is omitted.
    pub share_to_feed: Option<bool>,
    /// Reels: name of the audio track.
    pub audio_name: Option<String>,
    /// Reels: cover image URL.
    pub cover_url: Option<String>,
    /// Reels: cover frame offset into the video, in milliseconds.
    pub thumb_offset: Option<u32>,
    /// Story: the asset URL points at a video rather than an image.
    pub video_story: bool,
}

/// Parameters for creating a media container.
#[derive(Debug, Clone, Builder)]
pub struct ContainerRequest {
    /// Kind of media to create.
    pub kind: MediaKind,
    /// Publicly reachable URL of the media asset.
    pub source_url: String,
    /// Optional caption attached at creation time.
    pub caption: Option<String>,
    /// Kind-specific extras.
    #[builder(default)]
    pub options: ContainerOptions,
}

impl ContainerRequest {
    /// Shorthand for a single-image post.
    #[must_use]
    pub fn image(source_url: impl Into<String>, caption: Option<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            source_url: source_url.into(),
            caption,
            options: ContainerOptions::default(),
        }
    }

    /// Shorthand for a single-video post.
    #[must_use]
    pub fn video(source_url: impl Into<String>, caption: Option<String>) -> Self {
        Self {
            kind: MediaKind::Video,
            source_url: source_url.into(),
            caption,
            options: ContainerOptions::default(),
        }
    }

    /// Shorthand for a reel with default options.
    #[must_use]
    pub fn reel(source_url: impl Into<String>, caption: Option<String>) -> Self {
        Self {
            kind: MediaKind::Reels,
            source_url: source_url.into(),
            caption,
            options: ContainerOptions::default(),
        }
    }

    /// Shorthand for a story. `video` selects a video asset.
    #[must_use]
    pub fn story(source_url: impl Into<String>, video: bool) -> Self {
        Self {
            kind: MediaKind::Story,
            source_url: source_url.into(),
            caption: None,
            options: ContainerOptions {
                video_story: video,
                ..ContainerOptions::default()
            },
        }
    }

    /// Query parameter carrying the asset URL for this request.
    #[must_use]
    pub fn source_param(&self) -> &'static str {
        match self.kind {
            MediaKind::Image => "image_url",
            MediaKind::Video | MediaKind::Reels => "video_url",
            MediaKind::Story => {
                if self.options.video_story {
                    "video_url"
                } else {
                    "image_url"
                }
            }
        }
    }

    /// Form parameters for the container create endpoint.
    ///
    /// Image posts omit `media_type` (the API default); every other kind
    /// sends it explicitly. Reel extras are only attached for reels.
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![(self.source_param().to_string(), self.source_url.clone())];
        if self.kind != MediaKind::Image {
            params.push(("media_type".to_string(), self.kind.api_media_type().to_string()));
        }
        if let Some(caption) = &self.caption {
            params.push(("caption".to_string(), caption.clone()));
        }
        if self.kind == MediaKind::Reels {
            let share = self.options.share_to_feed.unwrap_or(true);
            params.push(("share_to_feed".to_string(), share.to_string()));
            if let Some(audio_name) = &self.options.audio_name {
                params.push(("audio_name".to_string(), audio_name.clone()));
            }
            if let Some(cover_url) = &self.options.cover_url {
                params.push(("cover_url".to_string(), cover_url.clone()));
            }
            if let Some(thumb_offset) = self.options.thumb_offset {
                params.push(("thumb_offset".to_string(), thumb_offset.to_string()));
            }
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn status_from_code_maps_terminal_codes() {
        assert_eq!(ContainerStatus::from_code("FINISHED"), ContainerStatus::Finished);
        assert_eq!(ContainerStatus::from_code("ERROR"), ContainerStatus::Error);
        assert_eq!(ContainerStatus::from_code("EXPIRED"), ContainerStatus::Expired);
    }

    #[test]
    fn status_from_code_treats_unknown_as_in_progress() {
        assert_eq!(
            ContainerStatus::from_code("IN_PROGRESS"),
            ContainerStatus::InProgress
        );
        assert_eq!(
            ContainerStatus::from_code("PUBLISHED"),
            ContainerStatus::InProgress
        );
        assert_eq!(ContainerStatus::from_code(""), ContainerStatus::InProgress);
    }

    #[test]
    fn status_terminality() {
        assert!(ContainerStatus::Finished.is_terminal());
        assert!(ContainerStatus::Error.is_terminal());
        assert!(ContainerStatus::Expired.is_terminal());
        assert!(!ContainerStatus::InProgress.is_terminal());
        assert!(!ContainerStatus::Timeout.is_terminal());
    }

    #[test]
    fn image_params_omit_media_type() {
        let request = ContainerRequest::image("https://example.com/a.jpg", Some("hi".into()));
        let params = request.to_params();
        assert_eq!(param(&params, "image_url"), Some("https://example.com/a.jpg"));
        assert_eq!(param(&params, "media_type"), None);
        assert_eq!(param(&params, "caption"), Some("hi"));
    }

    #[test]
    fn video_params_use_video_url() {
        let request = ContainerRequest::video("https://example.com/v.mp4", None);
        let params = request.to_params();
        assert_eq!(param(&params, "video_url"), Some("https://example.com/v.mp4"));
        assert_eq!(param(&params, "media_type"), Some("VIDEO"));
        assert_eq!(param(&params, "caption"), None);
    }

    #[test]
    fn reel_params_default_share_to_feed() {
        let request = ContainerRequest::reel("https://example.com/r.mp4", None);
        let params = request.to_params();
        assert_eq!(param(&params, "media_type"), Some("REELS"));
        assert_eq!(param(&params, "share_to_feed"), Some("true"));
        assert_eq!(param(&params, "audio_name"), None);
    }

    #[test]
    fn reel_params_carry_extras() {
        let request = ContainerRequest::builder()
            .kind(MediaKind::Reels)
            .source_url("https://example.com/r.mp4".to_string())
            .caption("reel time".to_string())
            .options(ContainerOptions {
                share_to_feed: Some(false),
                audio_name: Some("Original Audio".to_string()),
                cover_url: Some("https://example.com/c.jpg".to_string()),
                thumb_offset: Some(1500),
                video_story: false,
            })
            .build();
        let params = request.to_params();
        assert_eq!(param(&params, "share_to_feed"), Some("false"));
        assert_eq!(param(&params, "audio_name"), Some("Original Audio"));
        assert_eq!(param(&params, "cover_url"), Some("https://example.com/c.jpg"));
        assert_eq!(param(&params, "thumb_offset"), Some("1500"));
    }

    #[test]
    fn story_params_select_url_by_asset_kind() {
        let image_story = ContainerRequest::story("https://example.com/s.jpg", false);
        let params = image_story.to_params();
        assert_eq!(param(&params, "image_url"), Some("https://example.com/s.jpg"));
        assert_eq!(param(&params, "media_type"), Some("STORIES"));

        let video_story = ContainerRequest::story("https://example.com/s.mp4", true);
        let params = video_story.to_params();
        assert_eq!(param(&params, "video_url"), Some("https://example.com/s.mp4"));
        assert_eq!(param(&params, "media_type"), Some("STORIES"));
    }

    #[test]
    fn media_kind_wire_names() {
        assert_eq!(MediaKind::Image.api_media_type(), "IMAGE");
        assert_eq!(MediaKind::Video.api_media_type(), "VIDEO");
        assert_eq!(MediaKind::Reels.api_media_type(), "REELS");
        assert_eq!(MediaKind::Story.api_media_type(), "STORIES");
    }

    #[test]
    fn media_kind_serde_round_trip() {
        let json = serde_json::to_string(&MediaKind::Reels).unwrap();
        assert_eq!(json, r#""REELS""#);
        let kind: MediaKind = serde_json::from_str(r#""IMAGE""#).unwrap();
        assert_eq!(kind, MediaKind::Image);
    }
}
