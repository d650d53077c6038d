//! Project-tracking (TargetProcess-style REST API) integration.
//!
//! Creates the project/epic/feature/user story hierarchy produced by the
//! analyzer. The [`WorkItemApi`] trait is the single seam to the remote
//! service; [`WorkItemPublisher`] owns the ordering and parent-id plumbing.

mod client;
mod decode;
mod memory;
mod publisher;

pub use client::TargetProcessClient;
pub use decode::{decode_created_id, decode_json_id, decode_xml_id, IdFormat};
pub use memory::InMemoryTracker;
pub use publisher::{project_name, PublishReport, WorkItemPublisher, WorkItemResult};

use std::fmt;

use async_trait::async_trait;

/// Kinds of work item this crate creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkItemKind {
    Project,
    Epic,
    Feature,
    UserStory,
}

impl WorkItemKind {
    /// Collection endpoint, relative to the API base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Project => "/api/v1/Project/",
            Self::Epic => "/api/v1/Epic/",
            Self::Feature => "/api/v1/features/",
            Self::UserStory => "/api/v1/UserStory/",
        }
    }
}

impl fmt::Display for WorkItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Epic => write!(f, "epic"),
            Self::Feature => write!(f, "feature"),
            Self::UserStory => write!(f, "user story"),
        }
    }
}

/// Result type for ticketing operations.
pub type TicketingResult<T> = Result<T, TicketingError>;

/// Error types for ticketing operations.
#[derive(Debug, thiserror::Error)]
pub enum TicketingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ticketing API error: {message} (status: {status})")]
    Api { status: u16, message: String },

    #[error("Authentication required")]
    Unauthorized,
}

/// Write access to the ticketing service.
#[async_trait]
pub trait WorkItemApi: Send + Sync {
    /// Create one work item and return its server-assigned ID (0 if none
    /// could be read from the response).
    async fn create(&self, kind: WorkItemKind, payload: &serde_json::Value)
        -> TicketingResult<u64>;
}
