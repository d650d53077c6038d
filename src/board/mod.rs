//! Whiteboard (Miro REST API v2) integration.
//!
//! Provides the raw board payload types, the [`BoardApi`] trait the workflow
//! builder reads through, an HTTP implementation ([`MiroClient`]) and an
//! in-memory implementation ([`InMemoryBoard`]) for fixtures.

mod client;
mod memory;
mod pagination;

pub use client::{MiroClient, DEFAULT_BASE_URL};
pub use memory::InMemoryBoard;
pub use pagination::{fetch_all_items, MAX_ITEM_OFFSET, PAGE_SIZE};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A whiteboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    /// Board ID
    pub id: String,
    /// Board name
    #[serde(default)]
    pub name: String,
    /// Board description
    #[serde(default)]
    pub description: Option<String>,
    /// Created timestamp
    #[serde(default)]
    pub created_at: Option<String>,
    /// Modified timestamp
    #[serde(default)]
    pub modified_at: Option<String>,
    /// Board owner
    #[serde(default)]
    pub owner: Option<Actor>,
}

/// A user or app referenced by a board object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Actor ID
    pub id: String,
    /// Display name, when the API includes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Actor type (user, app)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Canvas coordinates of an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Item geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Any placeable board object (sticky note, card, shape, frame, ...).
///
/// `data` and `style` differ per item type and are kept untyped; the graph
/// builder reads the fields it needs by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardItem {
    /// Item ID
    pub id: String,
    /// Item type as reported by the API (e.g. "sticky_note")
    #[serde(rename = "type")]
    pub item_type: String,
    /// Type-specific content
    #[serde(default)]
    pub data: serde_json::Value,
    /// Type-specific style
    #[serde(default)]
    pub style: serde_json::Value,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub position: Option<Position>,
    /// Parent frame, if any
    #[serde(default)]
    pub parent: Option<ItemRef>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(default)]
    pub created_by: Option<Actor>,
    #[serde(default)]
    pub modified_by: Option<Actor>,
}

/// Reference to an item from a connector or a parent link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snap_to: Option<String>,
}

/// Text placed on a connector line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Caption {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub position: Option<serde_json::Value>,
}

/// A directed edge between two items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    /// Connector ID
    pub id: String,
    #[serde(default)]
    pub start_item: Option<ItemRef>,
    #[serde(default)]
    pub end_item: Option<ItemRef>,
    #[serde(default)]
    pub captions: Vec<Caption>,
    #[serde(default)]
    pub style: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

/// A group of items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Group {
    /// Group ID
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// A board tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Tag ID
    pub id: String,
    /// Tag text
    #[serde(default)]
    pub title: String,
    /// Fill color name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
}

/// Result type for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// Error types for board operations.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Miro API error: {message} (status: {status})")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Read access to a whiteboard.
///
/// Every call is a single request; callers own pagination and the choice of
/// which failures are fatal.
#[async_trait]
pub trait BoardApi: Send + Sync {
    /// List boards visible to the token.
    async fn list_boards(&self, limit: u32, offset: u32) -> BoardResult<Vec<Board>>;

    /// Get board metadata.
    async fn get_board(&self, board_id: &str) -> BoardResult<Board>;

    /// List one page of items on a board.
    async fn list_items(&self, board_id: &str, limit: u32, offset: u32)
        -> BoardResult<Vec<BoardItem>>;

    /// List connectors on a board (single request).
    async fn list_connectors(&self, board_id: &str, limit: u32) -> BoardResult<Vec<Connector>>;

    /// List groups on a board (single request).
    async fn list_groups(&self, board_id: &str, limit: u32) -> BoardResult<Vec<Group>>;

    /// List the items belonging to a group.
    async fn list_group_items(&self, board_id: &str, group_id: &str)
        -> BoardResult<Vec<BoardItem>>;

    /// List all tags defined on a board.
    async fn list_tags(&self, board_id: &str) -> BoardResult<Vec<Tag>>;

    /// List the tags attached to one item.
    async fn list_item_tags(&self, board_id: &str, item_id: &str) -> BoardResult<Vec<Tag>>;
}
