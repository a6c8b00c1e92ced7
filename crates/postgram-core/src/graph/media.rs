// SPDX-License-Identifier: Apache-2.0

//! Media container endpoints.
//!
//! Covers the container lifecycle: create on `{user_id}/media`, poll the
//! container id for `status_code`, publish on `{user_id}/media_publish`, and
//! fetch the post permalink. The publisher consumes these through
//! [`ContainerApi`] so its state machine can be tested without HTTP.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::client::{GraphClient, decode_body};
use super::types::{ContainerRequest, ContainerStatus};
use crate::error::PostgramError;

/// Container lifecycle operations against the Graph API.
#[async_trait]
pub trait ContainerApi: Send + Sync {
    /// Creates a media container, returning its id.
    ///
    /// # Errors
    ///
    /// Returns [`PostgramError::Media`] if the response carries no id, or the
    /// decoded API error otherwise.
    async fn create_container(&self, request: &ContainerRequest)
    -> Result<String, PostgramError>;

    /// Fetches the current processing status of a container.
    ///
    /// # Errors
    ///
    /// Returns the decoded API error when the status check fails.
    async fn container_status(&self, container_id: &str)
    -> Result<ContainerStatus, PostgramError>;

    /// Publishes a finished container, returning the new post id.
    ///
    /// # Errors
    ///
    /// Returns [`PostgramError::RateLimited`] when the publish quota is spent,
    /// [`PostgramError::Media`] if the response carries no id, or the decoded
    /// API error otherwise.
    async fn publish_container(&self, container_id: &str) -> Result<String, PostgramError>;

    /// Fetches the permalink of a published post, when the API exposes one.
    ///
    /// # Errors
    ///
    /// Returns the decoded API error when the lookup fails.
    async fn permalink(&self, post_id: &str) -> Result<Option<String>, PostgramError>;
}

#[derive(Debug, Default, Deserialize)]
struct CreateResponse {
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusResponse {
    status_code: Option<String>,
    /// Free-form detail string, only interesting when processing failed.
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PublishResponse {
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PermalinkResponse {
    permalink: Option<String>,
}

#[async_trait]
impl ContainerApi for GraphClient {
    async fn create_container(
        &self,
        request: &ContainerRequest,
    ) -> Result<String, PostgramError> {
        debug!(kind = %request.kind, url = %request.source_url, "Creating media container");
        let endpoint = format!("{}/media", self.user_id());
        let body = self.post_form(&endpoint, &request.to_params()).await?;
        let response: CreateResponse = decode_body(body)?;
        response
            .id
            .ok_or_else(|| PostgramError::media("Container create response carried no id"))
    }

    async fn container_status(
        &self,
        container_id: &str,
    ) -> Result<ContainerStatus, PostgramError> {
        let body = self
            .get(container_id, &[("fields", "status_code,status".to_string())])
            .await?;
        let response: StatusResponse = decode_body(body)?;
        let status =
            ContainerStatus::from_code(response.status_code.as_deref().unwrap_or_default());
        if status == ContainerStatus::Error {
            warn!(
                container_id,
                detail = response.status.as_deref().unwrap_or("unknown"),
                "Container processing failed"
            );
        } else {
            debug!(container_id, status = %status, "Container status");
        }
        Ok(status)
    }

    async fn publish_container(&self, container_id: &str) -> Result<String, PostgramError> {
        debug!(container_id, "Publishing media container");
        let endpoint = format!("{}/media_publish", self.user_id());
        let form = [("creation_id".to_string(), container_id.to_string())];
        let body = self.post_form(&endpoint, &form).await?;
        let response: PublishResponse = decode_body(body)?;
        response
            .id
            .ok_or_else(|| PostgramError::media("Publish response carried no post id"))
    }

    async fn permalink(&self, post_id: &str) -> Result<Option<String>, PostgramError> {
        let body = self
            .get(post_id, &[("fields", "permalink".to_string())])
            .await?;
        let response: PermalinkResponse = decode_body(body)?;
        Ok(response.permalink)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn create_response_decodes_id() {
        let response: CreateResponse =
            decode_body(Some(json!({"id": "17900000000000001"}))).unwrap();
        assert_eq!(response.id.as_deref(), Some("17900000000000001"));
    }

    #[test]
    fn status_response_decodes_code_and_detail() {
        let response: StatusResponse = decode_body(Some(json!({
            "status_code": "ERROR",
            "status": "Media processing failed: unsupported format",
            "id": "17900000000000001"
        })))
        .unwrap();
        assert_eq!(response.status_code.as_deref(), Some("ERROR"));
        assert!(response.status.unwrap().contains("unsupported format"));
    }

    #[test]
    fn status_response_tolerates_missing_fields() {
        let response: StatusResponse =
            decode_body(Some(json!({"id": "17900000000000001"}))).unwrap();
        assert_eq!(
            ContainerStatus::from_code(response.status_code.as_deref().unwrap_or_default()),
            ContainerStatus::InProgress
        );
    }

    #[test]
    fn permalink_response_decodes_link() {
        let response: PermalinkResponse =
            decode_body(Some(json!({"permalink": "https://www.instagram.com/p/xyz/"}))).unwrap();
        assert_eq!(
            response.permalink.as_deref(),
            Some("https://www.instagram.com/p/xyz/")
        );

        let empty: PermalinkResponse = decode_body(Some(json!({"id": "123"}))).unwrap();
        assert!(empty.permalink.is_none());
    }
}
