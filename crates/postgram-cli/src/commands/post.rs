// SPDX-License-Identifier: Apache-2.0

//! Post command: maps CLI arguments onto a container request.

use postgram_core::{ContainerOptions, ContainerRequest};

use crate::cli::MediaKindArg;

/// Builds the container request for the post command.
pub fn build_request(
    kind: MediaKindArg,
    url: String,
    caption: Option<String>,
    options: ContainerOptions,
) -> ContainerRequest {
    ContainerRequest::builder()
        .kind(kind.into())
        .source_url(url)
        .maybe_caption(caption)
        .options(options)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use postgram_core::MediaKind;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_build_image_request() {
        let request = build_request(
            MediaKindArg::Image,
            "https://example.com/a.jpg".to_string(),
            Some("caption".to_string()),
            ContainerOptions::default(),
        );

        assert_eq!(request.kind, MediaKind::Image);
        let params = request.to_params();
        assert_eq!(
            param(&params, "image_url"),
            Some("https://example.com/a.jpg")
        );
        assert_eq!(param(&params, "caption"), Some("caption"));
        assert_eq!(param(&params, "media_type"), None);
    }

    #[test]
    fn test_build_reel_request_with_extras() {
        let options = ContainerOptions {
            share_to_feed: Some(false),
            audio_name: Some("Original Audio".to_string()),
            cover_url: None,
            thumb_offset: Some(2000),
            video_story: false,
        };
        let request = build_request(
            MediaKindArg::Reel,
            "https://example.com/r.mp4".to_string(),
            None,
            options,
        );

        assert_eq!(request.kind, MediaKind::Reels);
        let params = request.to_params();
        assert_eq!(param(&params, "media_type"), Some("REELS"));
        assert_eq!(param(&params, "share_to_feed"), Some("false"));
        assert_eq!(param(&params, "audio_name"), Some("Original Audio"));
        assert_eq!(param(&params, "thumb_offset"), Some("2000"));
    }

    #[test]
    fn test_build_video_story_request() {
        let options = ContainerOptions {
            video_story: true,
            ..ContainerOptions::default()
        };
        let request = build_request(
            MediaKindArg::Story,
            "https://example.com/s.mp4".to_string(),
            None,
            options,
        );

        assert_eq!(request.kind, MediaKind::Story);
        let params = request.to_params();
        assert_eq!(
            param(&params, "video_url"),
            Some("https://example.com/s.mp4")
        );
        assert_eq!(param(&params, "media_type"), Some("STORIES"));
    }
}
