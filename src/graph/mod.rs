//! Workflow graph extraction.
//!
//! Turns raw board items and connectors into a node/edge workflow graph and
//! derives structural insights from it.
//!
//! ## Overview
//!
//! - [`build_connections`] keeps connectors with both endpoints
//! - [`build_node`] resolves a node's title, connections and tags
//! - [`Insights::derive`] computes entry/exit points, bottlenecks and
//!   recommendations
//! - [`WorkflowBuilder`] drives the whole extraction against a [`BoardApi`]
//!
//! [`BoardApi`]: crate::board::BoardApi

mod builder;
mod content;
mod insights;

pub use builder::{assemble_nodes, build_connections, build_node, WorkflowBuilder};
pub use content::{extract_content, ItemContent, ItemKind, MAX_TITLE_CHARS};
pub use insights::{dangling_references, InsightThresholds, Insights};

use serde::{Deserialize, Serialize};

use crate::board::{Actor, Geometry, Position, Tag};

/// Connection type recorded on every workflow connection.
pub const CONNECTOR_TYPE: &str = "connector";

/// Connector IDs attached to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConnections {
    /// Connections ending at this node
    pub incoming: Vec<String>,
    /// Connections starting at this node
    pub outgoing: Vec<String>,
}

/// Provenance copied from the raw item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Actor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<Actor>,
    #[serde(default)]
    pub style: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

/// A step in the workflow, one per non-connector board item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Board item ID
    pub id: String,
    /// Raw item type
    #[serde(rename = "type")]
    pub node_type: String,
    /// Display title, at most [`MAX_TITLE_CHARS`] characters
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub position: Position,
    pub connections: NodeConnections,
    /// Tag titles attached to the item
    pub tags: Vec<String>,
    pub metadata: NodeMetadata,
}

impl WorkflowNode {
    /// Number of incoming connections.
    pub fn in_degree(&self) -> usize {
        self.connections.incoming.len()
    }

    /// Number of outgoing connections.
    pub fn out_degree(&self) -> usize {
        self.connections.outgoing.len()
    }
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConnection {
    /// Connector ID
    pub id: String,
    /// Source node ID
    pub from: String,
    /// Target node ID
    pub to: String,
    /// First caption on the connector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub connection_type: String,
}

/// Items grouped together on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowGroup {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub node_ids: Vec<String>,
}

/// Board identity carried with an analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardInfo {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Everything extracted from one board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowAnalysis {
    pub board_info: BoardInfo,
    pub nodes: Vec<WorkflowNode>,
    pub connections: Vec<WorkflowConnection>,
    pub groups: Vec<WorkflowGroup>,
    pub tags: Vec<Tag>,
    pub insights: Insights,
}

impl WorkflowAnalysis {
    /// Look up a node by ID.
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
