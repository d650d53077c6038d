//! Structural insights over a workflow graph.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{WorkflowConnection, WorkflowNode};

/// Heuristic thresholds used when deriving insights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightThresholds {
    /// Nodes with more incoming connections than this are bottlenecks
    pub bottleneck_incoming: usize,
    /// More entry points than this triggers a consolidation hint
    pub max_entry_points: usize,
    /// More exit points than this triggers a consolidation hint
    pub max_exit_points: usize,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self { bottleneck_incoming: 2, max_entry_points: 3, max_exit_points: 3 }
    }
}

/// Derived facts about a workflow graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub total_steps: usize,
    /// Nodes without incoming connections
    pub entry_points: Vec<String>,
    /// Nodes without outgoing connections
    pub exit_points: Vec<String>,
    pub bottlenecks: Vec<String>,
    pub recommendations: Vec<String>,
}

impl Insights {
    /// Derive insights from nodes and connections.
    pub fn derive(
        nodes: &[WorkflowNode],
        connections: &[WorkflowConnection],
        thresholds: &InsightThresholds,
    ) -> Self {
        let entry_points = node_ids(nodes, |n| n.in_degree() == 0);
        let exit_points = node_ids(nodes, |n| n.out_degree() == 0);
        let bottlenecks = node_ids(nodes, |n| n.in_degree() > thresholds.bottleneck_incoming);

        let mut recommendations = Vec::new();

        let connected: HashSet<&str> =
            connections.iter().flat_map(|c| [c.from.as_str(), c.to.as_str()]).collect();
        let disconnected = nodes.iter().filter(|n| !connected.contains(n.id.as_str())).count();
        if disconnected > 0 {
            recommendations.push(format!(
                "Found {} disconnected nodes that might need connections",
                disconnected
            ));
        }

        if entry_points.len() > thresholds.max_entry_points {
            recommendations.push(format!(
                "Consider consolidating {} entry points for clearer workflow start",
                entry_points.len()
            ));
        }

        if exit_points.len() > thresholds.max_exit_points {
            recommendations.push(format!(
                "Consider consolidating {} exit points for clearer workflow end",
                exit_points.len()
            ));
        }

        Self { total_steps: nodes.len(), entry_points, exit_points, bottlenecks, recommendations }
    }
}

fn node_ids(nodes: &[WorkflowNode], pred: impl Fn(&WorkflowNode) -> bool) -> Vec<String> {
    nodes.iter().filter(|n| pred(n)).map(|n| n.id.clone()).collect()
}

/// IDs of connections whose `from` or `to` names no node.
///
/// Such connections are kept as-is; this only reports them.
pub fn dangling_references<'a>(
    nodes: &[WorkflowNode],
    connections: &'a [WorkflowConnection],
) -> Vec<&'a str> {
    let known: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    connections
        .iter()
        .filter(|c| !known.contains(c.from.as_str()) || !known.contains(c.to.as_str()))
        .map(|c| c.id.as_str())
        .collect()
}
