//! HTTP client for the Miro REST API v2.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{
    Board, BoardApi, BoardError, BoardItem, BoardResult, Connector, Group, Tag,
};

/// Default Miro API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.miro.com/v2";

/// Miro API client.
#[derive(Debug, Clone)]
pub struct MiroClient {
    /// Miro access token
    token: String,
    /// API base URL (no trailing slash)
    base_url: String,
    /// HTTP client
    client: reqwest::Client,
}

/// List envelope returned by the Miro API.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct Page<T> {
    #[serde(default, alias = "tags")]
    data: Vec<T>,
}

impl MiroClient {
    /// Create a new Miro client.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Use a different API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build a URL below `/boards/{board_id}`.
    fn board_url(&self, board_id: &str, path: &str) -> String {
        format!("{}/boards/{}{}", self.base_url, urlencoding::encode(board_id), path)
    }

    /// Make an authenticated GET request.
    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
    }

    /// Issue a GET and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, u32)],
    ) -> BoardResult<T> {
        tracing::debug!(url, "Miro GET");

        let response = self.request(url).query(query).send().await?;

        if !response.status().is_success() {
            return Err(parse_error(response).await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| BoardError::Decode(e.to_string()))
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, u32)],
    ) -> BoardResult<Vec<T>> {
        let page: Page<T> = self.get_json(url, query).await?;
        Ok(page.data)
    }
}

/// Parse error response from the Miro API.
async fn parse_error(response: reqwest::Response) -> BoardError {
    let status = response.status().as_u16();

    match status {
        401 => BoardError::Unauthorized,
        404 => BoardError::NotFound(response.url().path().to_string()),
        429 => BoardError::RateLimited,
        _ => {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| format!("HTTP {}", status));
            BoardError::Api { status, message }
        }
    }
}

#[async_trait]
impl BoardApi for MiroClient {
    async fn list_boards(&self, limit: u32, offset: u32) -> BoardResult<Vec<Board>> {
        let url = format!("{}/boards", self.base_url);
        self.get_page(&url, &[("limit", limit), ("offset", offset)]).await
    }

    async fn get_board(&self, board_id: &str) -> BoardResult<Board> {
        self.get_json(&self.board_url(board_id, ""), &[]).await
    }

    async fn list_items(
        &self,
        board_id: &str,
        limit: u32,
        offset: u32,
    ) -> BoardResult<Vec<BoardItem>> {
        let url = self.board_url(board_id, "/items");
        self.get_page(&url, &[("limit", limit), ("offset", offset)]).await
    }

    async fn list_connectors(&self, board_id: &str, limit: u32) -> BoardResult<Vec<Connector>> {
        let url = self.board_url(board_id, "/connectors");
        self.get_page(&url, &[("limit", limit)]).await
    }

    async fn list_groups(&self, board_id: &str, limit: u32) -> BoardResult<Vec<Group>> {
        let url = self.board_url(board_id, "/groups");
        self.get_page(&url, &[("limit", limit)]).await
    }

    async fn list_group_items(
        &self,
        board_id: &str,
        group_id: &str,
    ) -> BoardResult<Vec<BoardItem>> {
        let url =
            self.board_url(board_id, &format!("/groups/{}/items", urlencoding::encode(group_id)));
        self.get_page(&url, &[]).await
    }

    async fn list_tags(&self, board_id: &str) -> BoardResult<Vec<Tag>> {
        let url = self.board_url(board_id, "/tags");
        self.get_page(&url, &[]).await
    }

    async fn list_item_tags(&self, board_id: &str, item_id: &str) -> BoardResult<Vec<Tag>> {
        let url =
            self.board_url(board_id, &format!("/items/{}/tags", urlencoding::encode(item_id)));
        self.get_page(&url, &[]).await
    }
}


#[cfg(all(test, feature = "server"))]
mod http_tests {
    use std::collections::HashMap;

    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    async fn get_board(Path(board_id): Path<String>, headers: HeaderMap) -> impl IntoResponse {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer secret") {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "bad token" })));
        }
        match board_id.as_str() {
            "uXj=" => (StatusCode::OK, Json(json!({ "id": "uXj=", "name": "Roadmap" }))),
            "busy" => (StatusCode::TOO_MANY_REQUESTS, Json(json!({}))),
            "broken" => (StatusCode::BAD_GATEWAY, Json(json!({ "message": "upstream down" }))),
            _ => (StatusCode::NOT_FOUND, Json(json!({ "message": "no board" }))),
        }
    }

    async fn list_items(Query(query): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        let id = format!("item-{}-{}", query["limit"], query["offset"]);
        Json(json!({ "data": [{ "id": id, "type": "sticky_note" }], "total": 1 }))
    }

    async fn list_tags() -> Json<serde_json::Value> {
        Json(json!({ "tags": [{ "id": "t1", "title": "urgent" }] }))
    }

    async fn list_connectors() -> Json<serde_json::Value> {
        Json(json!({ "total": 0 }))
    }

    async fn stub_miro() -> String {
        let app = Router::new()
            .route("/v2/boards/{board_id}", get(get_board))
            .route("/v2/boards/{board_id}/items", get(list_items))
            .route("/v2/boards/{board_id}/tags", get(list_tags))
            .route("/v2/boards/{board_id}/connectors", get(list_connectors));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}/v2", addr)
    }

    #[tokio::test]
    async fn test_pages_and_envelopes() {
        let client = MiroClient::new("secret").with_base_url(stub_miro().await);

        let board = client.get_board("uXj=").await.unwrap();
        assert_eq!(board.name, "Roadmap");

        let items = client.list_items("uXj=", 50, 100).await.unwrap();
        assert_eq!(items[0].id, "item-50-100");

        let tags = client.list_tags("uXj=").await.unwrap();
        assert_eq!(tags[0].title, "urgent");

        assert!(client.list_connectors("uXj=", 50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let base = stub_miro().await;
        let client = MiroClient::new("secret").with_base_url(base.as_str());

        let err = MiroClient::new("wrong").with_base_url(base.as_str()).get_board("uXj=").await;
        assert!(matches!(err, Err(BoardError::Unauthorized)));
        assert!(matches!(client.get_board("missing").await, Err(BoardError::NotFound(_))));
        assert!(matches!(client.get_board("busy").await, Err(BoardError::RateLimited)));
        match client.get_board("broken").await {
            Err(BoardError::Api { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
