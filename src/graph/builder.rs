//! Workflow graph construction from a board.

use std::collections::HashMap;
use std::future::Future;

use tracing::{debug, info, warn};

use super::{
    dangling_references, extract_content, BoardInfo, InsightThresholds, Insights, ItemKind,
    NodeConnections, NodeMetadata, WorkflowAnalysis, WorkflowConnection, WorkflowGroup,
    WorkflowNode, CONNECTOR_TYPE,
};
use crate::board::{
    fetch_all_items, BoardApi, BoardItem, BoardResult, Connector, Group, Position, PAGE_SIZE,
};

/// Extracts a [`WorkflowAnalysis`] from a board.
///
/// Board metadata and item listing are required; everything else is fetched
/// best-effort and replaced by an empty result on failure.
pub struct WorkflowBuilder<'a> {
    api: &'a dyn BoardApi,
    thresholds: InsightThresholds,
}

impl<'a> WorkflowBuilder<'a> {
    /// Create a builder reading from `api`.
    pub fn new(api: &'a dyn BoardApi) -> Self {
        Self { api, thresholds: InsightThresholds::default() }
    }

    /// Use custom insight thresholds.
    pub fn with_thresholds(mut self, thresholds: InsightThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Analyze a board.
    pub async fn analyze(&self, board_id: &str) -> BoardResult<WorkflowAnalysis> {
        info!(board_id, "Getting board info");
        let board = self.api.get_board(board_id).await?;

        info!(board_id, "Getting board items");
        let items = fetch_all_items(self.api, board_id).await?;
        info!(board_id, count = items.len(), "Fetched items from board");

        let connectors =
            soft(board_id, "connectors", self.api.list_connectors(board_id, PAGE_SIZE)).await;
        let groups = soft(board_id, "groups", self.api.list_groups(board_id, PAGE_SIZE)).await;
        let tags = soft(board_id, "tags", self.api.list_tags(board_id)).await;

        let connections = build_connections(&connectors);
        let nodes = self.build_nodes(board_id, &items, &connections).await;
        let groups = self.resolve_groups(board_id, &groups).await;

        let dangling = dangling_references(&nodes, &connections);
        if !dangling.is_empty() {
            debug!(board_id, connections = ?dangling, "Connections reference unknown nodes");
        }

        let insights = Insights::derive(&nodes, &connections, &self.thresholds);

        Ok(WorkflowAnalysis {
            board_info: BoardInfo {
                id: board.id,
                name: board.name,
                description: board.description,
            },
            nodes,
            connections,
            groups,
            tags,
            insights,
        })
    }

    /// Build nodes, looking up each item's tags one at a time.
    async fn build_nodes(
        &self,
        board_id: &str,
        items: &[BoardItem],
        connections: &[WorkflowConnection],
    ) -> Vec<WorkflowNode> {
        let mut nodes = Vec::with_capacity(items.len());

        for item in items {
            if ItemKind::parse(&item.item_type).is_connector() {
                continue;
            }

            let tags = match self.api.list_item_tags(board_id, &item.id).await {
                Ok(tags) => tags.into_iter().map(|t| t.title).collect(),
                Err(e) => {
                    debug!(board_id, item_id = %item.id, error = %e, "No tags for item");
                    Vec::new()
                }
            };

            nodes.push(build_node(item, tags, connections));
        }

        nodes
    }

    /// Resolve group members; groups whose lookup fails are left out.
    async fn resolve_groups(&self, board_id: &str, groups: &[Group]) -> Vec<WorkflowGroup> {
        let mut resolved = Vec::with_capacity(groups.len());

        for group in groups {
            match self.api.list_group_items(board_id, &group.id).await {
                Ok(members) => resolved.push(WorkflowGroup {
                    id: group.id.clone(),
                    name: None,
                    node_ids: members.into_iter().map(|item| item.id).collect(),
                }),
                Err(e) => {
                    warn!(board_id, group_id = %group.id, error = %e, "Could not get items for group");
                }
            }
        }

        resolved
    }
}

/// Await a best-effort listing, logging and swallowing failures.
async fn soft<T>(
    board_id: &str,
    what: &str,
    request: impl Future<Output = BoardResult<Vec<T>>>,
) -> Vec<T> {
    info!(board_id, "Getting {}", what);
    match request.await {
        Ok(values) => values,
        Err(e) => {
            warn!(board_id, error = %e, "Could not fetch {}", what);
            Vec::new()
        }
    }
}

/// Turn connectors into connections, dropping those missing an endpoint.
pub fn build_connections(connectors: &[Connector]) -> Vec<WorkflowConnection> {
    connectors
        .iter()
        .filter_map(|connector| {
            let from = connector.start_item.as_ref()?;
            let to = connector.end_item.as_ref()?;
            Some(WorkflowConnection {
                id: connector.id.clone(),
                from: from.id.clone(),
                to: to.id.clone(),
                label: connector
                    .captions
                    .first()
                    .map(|c| c.content.clone())
                    .filter(|s| !s.is_empty()),
                connection_type: CONNECTOR_TYPE.to_string(),
            })
        })
        .collect()
}

/// Build the node for one item.
pub fn build_node(
    item: &BoardItem,
    tags: Vec<String>,
    connections: &[WorkflowConnection],
) -> WorkflowNode {
    let content = extract_content(item);

    let incoming = connections.iter().filter(|c| c.to == item.id).map(|c| c.id.clone()).collect();
    let outgoing =
        connections.iter().filter(|c| c.from == item.id).map(|c| c.id.clone()).collect();

    WorkflowNode {
        id: item.id.clone(),
        node_type: item.item_type.clone(),
        title: content.title,
        description: content.description,
        position: node_position(item),
        connections: NodeConnections { incoming, outgoing },
        tags,
        metadata: NodeMetadata {
            created_at: item.created_at.clone(),
            modified_at: item.modified_at.clone(),
            created_by: item.created_by.clone(),
            modified_by: item.modified_by.clone(),
            style: item.style.clone(),
            geometry: item.geometry,
        },
    }
}

/// Build nodes without network access, with tags supplied up front.
pub fn assemble_nodes(
    items: &[BoardItem],
    item_tags: &HashMap<String, Vec<String>>,
    connections: &[WorkflowConnection],
) -> Vec<WorkflowNode> {
    items
        .iter()
        .filter(|item| !ItemKind::parse(&item.item_type).is_connector())
        .map(|item| {
            let tags = item_tags.get(&item.id).cloned().unwrap_or_default();
            build_node(item, tags, connections)
        })
        .collect()
}

/// Canvas position: `position` when set, else `geometry`, else the origin.
fn node_position(item: &BoardItem) -> Position {
    let pick = |primary: Option<f64>, secondary: Option<f64>| {
        primary.filter(|v| *v != 0.0).or(secondary.filter(|v| *v != 0.0)).unwrap_or(0.0)
    };

    Position {
        x: pick(item.position.map(|p| p.x), item.geometry.map(|g| g.x)),
        y: pick(item.position.map(|p| p.y), item.geometry.map(|g| g.y)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::board::{Caption, Geometry, InMemoryBoard, ItemRef, Tag};

    fn item(id: &str, item_type: &str, data: serde_json::Value) -> BoardItem {
        BoardItem { id: id.into(), item_type: item_type.into(), data, ..Default::default() }
    }

    fn connector(id: &str, from: Option<&str>, to: Option<&str>) -> Connector {
        Connector {
            id: id.into(),
            start_item: from.map(|id| ItemRef { id: id.into(), snap_to: None }),
            end_item: to.map(|id| ItemRef { id: id.into(), snap_to: None }),
            ..Default::default()
        }
    }

    fn tag(title: &str) -> Tag {
        Tag { id: format!("tag-{title}"), title: title.into(), fill_color: None }
    }

    fn start_process_board() -> InMemoryBoard {
        InMemoryBoard::new("b1")
            .with_name("Onboarding")
            .with_items([
                item("start", "sticky_note", json!({"content": "Start"})),
                item("process", "card", json!({"title": "Process", "description": "Do work"})),
            ])
            .with_connectors([connector("c1", Some("start"), Some("process"))])
    }

    #[tokio::test]
    async fn test_start_process_round_trip() {
        let board = start_process_board();

        let analysis = WorkflowBuilder::new(&board).analyze("b1").await.unwrap();

        assert_eq!(analysis.board_info.name, "Onboarding");
        assert_eq!(analysis.nodes.len(), 2);
        assert_eq!(analysis.connections.len(), 1);
        assert_eq!(analysis.insights.total_steps, 2);
        assert_eq!(analysis.insights.entry_points, vec!["start"]);
        assert_eq!(analysis.insights.exit_points, vec!["process"]);
        assert!(analysis.insights.bottlenecks.is_empty());
        assert!(analysis.insights.recommendations.is_empty());

        let process = analysis.node("process").unwrap();
        assert_eq!(process.title, "Process");
        assert_eq!(process.description.as_deref(), Some("Do work"));
        assert_eq!(process.connections.incoming, vec!["c1"]);
        assert!(process.connections.outgoing.is_empty());
    }

    #[tokio::test]
    async fn test_connector_items_are_not_nodes() {
        let board = start_process_board().with_items([item("c1", "connector", json!({}))]);

        let analysis = WorkflowBuilder::new(&board).analyze("b1").await.unwrap();

        assert_eq!(analysis.nodes.len(), 2);
        assert!(analysis.node("c1").is_none());
        // no tag lookup is spent on the connector item
        assert_eq!(board.item_tag_requests(), 2);
    }

    #[test]
    fn test_connectors_missing_endpoints_are_dropped() {
        let connectors = vec![
            connector("ok", Some("a"), Some("b")),
            connector("no-end", Some("a"), None),
            connector("no-start", None, Some("b")),
        ];

        let connections = build_connections(&connectors);

        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].id, "ok");
        assert_eq!(connections[0].connection_type, "connector");
    }

    #[test]
    fn test_degrees_match_kept_connections() {
        let items = vec![item("a", "shape", json!({})), item("b", "shape", json!({}))];
        let connectors = vec![
            connector("c1", Some("a"), Some("b")),
            connector("c2", Some("a"), Some("b")),
            connector("half", None, Some("b")),
        ];
        let connections = build_connections(&connectors);

        let nodes = assemble_nodes(&items, &HashMap::new(), &connections);

        for node in &nodes {
            let to = connections.iter().filter(|c| c.to == node.id).count();
            let from = connections.iter().filter(|c| c.from == node.id).count();
            assert_eq!(node.in_degree(), to);
            assert_eq!(node.out_degree(), from);
        }
        assert_eq!(nodes[1].connections.incoming, vec!["c1", "c2"]);
    }

    #[test]
    fn test_label_from_first_caption() {
        let mut labelled = connector("c1", Some("a"), Some("b"));
        labelled.captions = vec![
            Caption { content: "yes".into(), position: None },
            Caption { content: "ignored".into(), position: None },
        ];
        let mut blank = connector("c2", Some("a"), Some("b"));
        blank.captions = vec![Caption { content: String::new(), position: None }];

        let connections = build_connections(&[labelled, blank]);

        assert_eq!(connections[0].label.as_deref(), Some("yes"));
        assert_eq!(connections[1].label, None);
    }

    #[test]
    fn test_position_falls_back_to_geometry() {
        let mut positioned = item("a", "shape", json!({}));
        positioned.position = Some(Position { x: 0.0, y: 7.0 });
        positioned.geometry = Some(Geometry { x: 3.0, y: 9.0, width: None, height: None });

        let node = build_node(&positioned, Vec::new(), &[]);

        assert_eq!(node.position, Position { x: 3.0, y: 7.0 });
        assert_eq!(build_node(&item("b", "shape", json!({})), Vec::new(), &[]).position, Position::default());
    }

    #[tokio::test]
    async fn test_item_tags_attached() {
        let board = start_process_board().with_item_tags("start", [tag("kickoff"), tag("q1")]);

        let analysis = WorkflowBuilder::new(&board).analyze("b1").await.unwrap();

        assert_eq!(analysis.node("start").unwrap().tags, vec!["kickoff", "q1"]);
        assert!(analysis.node("process").unwrap().tags.is_empty());
    }

    #[tokio::test]
    async fn test_soft_failures_degrade_to_empty() {
        let board = start_process_board()
            .with_tags([tag("board-wide")])
            .with_item_tags("start", [tag("kickoff")])
            .failing_connectors()
            .failing_tags()
            .failing_item_tags();

        let analysis = WorkflowBuilder::new(&board).analyze("b1").await.unwrap();

        assert_eq!(analysis.nodes.len(), 2);
        assert!(analysis.connections.is_empty());
        assert!(analysis.tags.is_empty());
        assert!(analysis.nodes.iter().all(|n| n.tags.is_empty()));
        assert_eq!(analysis.insights.entry_points.len(), 2);
        assert_eq!(
            analysis.insights.recommendations,
            vec!["Found 2 disconnected nodes that might need connections"]
        );
    }

    #[tokio::test]
    async fn test_failed_group_is_omitted() {
        let board = start_process_board()
            .with_group("g1", ["start", "process"])
            .with_group("g2", ["process"])
            .failing_group("g2");

        let analysis = WorkflowBuilder::new(&board).analyze("b1").await.unwrap();

        assert_eq!(analysis.groups.len(), 1);
        assert_eq!(analysis.groups[0].id, "g1");
        assert_eq!(analysis.groups[0].node_ids, vec!["start", "process"]);
        assert_eq!(analysis.groups[0].name, None);
    }

    #[tokio::test]
    async fn test_group_listing_failure_is_soft() {
        let board = start_process_board().with_group("g1", ["start"]).failing_groups();

        let analysis = WorkflowBuilder::new(&board).analyze("b1").await.unwrap();

        assert!(analysis.groups.is_empty());
    }

    #[tokio::test]
    async fn test_board_and_item_failures_are_fatal() {
        let board = start_process_board().failing_board();
        assert!(WorkflowBuilder::new(&board).analyze("b1").await.is_err());

        let board = start_process_board().failing_items();
        assert!(WorkflowBuilder::new(&board).analyze("b1").await.is_err());
    }

    #[tokio::test]
    async fn test_dangling_connections_are_kept() {
        let board = start_process_board().with_connectors([connector("c9", Some("process"), Some("ghost"))]);

        let analysis = WorkflowBuilder::new(&board).analyze("b1").await.unwrap();

        assert_eq!(analysis.connections.len(), 2);
        assert_eq!(analysis.node("process").unwrap().connections.outgoing, vec!["c9"]);
        assert!(analysis.insights.exit_points.is_empty());
    }
}
