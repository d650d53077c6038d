//! HTTP client for the ticketing REST API.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use super::{decode_created_id, TicketingError, TicketingResult, WorkItemApi, WorkItemKind};

/// TargetProcess-style REST client.
///
/// Sends the access token both as a bearer header and as the
/// `access_token` query parameter.
#[derive(Debug, Clone)]
pub struct TargetProcessClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl TargetProcessClient {
    /// Create a new client.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, kind: WorkItemKind) -> String {
        format!("{}{}", self.base_url, kind.endpoint())
    }
}

#[async_trait]
impl WorkItemApi for TargetProcessClient {
    async fn create(
        &self,
        kind: WorkItemKind,
        payload: &serde_json::Value,
    ) -> TicketingResult<u64> {
        debug!(%kind, payload = %payload, "Creating work item");

        let response = self
            .client
            .post(self.url(kind))
            .query(&[("access_token", self.token.as_str())])
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TicketingError::Unauthorized);
        }

        if !status.is_success() {
            return Err(TicketingError::Api { status: status.as_u16(), message: error_message(&body) });
        }

        Ok(decode_created_id(content_type.as_deref(), &body))
    }
}

/// Pull `message`/`Message` out of an error body, else use the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message").or_else(|| v.get("Message")).and_then(|m| m.as_str()).map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_string())
}


#[cfg(all(test, feature = "server"))]
mod http_tests {
    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::Router;
    use serde_json::json;

    use super::*;

    fn authorized(query: &HashMap<String, String>, headers: &HeaderMap) -> bool {
        query.get("access_token").map(String::as_str) == Some("tok")
            && headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer tok")
    }

    async fn create_epic(
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Response {
        if !authorized(&query, &headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        ([(header::CONTENT_TYPE, "application/json")], r#"{"Id": 77, "Name": "Epic"}"#)
            .into_response()
    }

    async fn create_story() -> Response {
        ([(header::CONTENT_TYPE, "application/xml")], r#"<UserStory Id="88" Name="Pay" />"#)
            .into_response()
    }

    async fn create_feature() -> Response {
        (
            StatusCode::BAD_REQUEST,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"Status": "BadRequest", "Message": "Epic is required"}"#,
        )
            .into_response()
    }

    async fn stub_tracker() -> String {
        let app = Router::new()
            .route("/api/v1/Epic/", post(create_epic))
            .route("/api/v1/UserStory/", post(create_story))
            .route("/api/v1/features/", post(create_feature));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_create_decodes_by_content_type() {
        let client = TargetProcessClient::new(stub_tracker().await, "tok");
        let payload = json!({ "Name": "x" });

        assert_eq!(client.create(WorkItemKind::Epic, &payload).await.unwrap(), 77);
        assert_eq!(client.create(WorkItemKind::UserStory, &payload).await.unwrap(), 88);
    }

    #[tokio::test]
    async fn test_create_error_mapping() {
        let base = stub_tracker().await;
        let payload = json!({ "Name": "x" });

        let err = TargetProcessClient::new(base.as_str(), "nope")
            .create(WorkItemKind::Epic, &payload)
            .await;
        assert!(matches!(err, Err(TicketingError::Unauthorized)));

        match TargetProcessClient::new(base.as_str(), "tok").create(WorkItemKind::Feature, &payload).await {
            Err(TicketingError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Epic is required");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
