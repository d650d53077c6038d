//! Prompt templates.

use crate::graph::WorkflowAnalysis;

use super::WorkflowInsights;

const RESPONSE_SCHEMA: &str = r#"```json
{
  "workflowSummary": "Brief summary of the workflow",
  "epics": [
    {
      "epicId": "EPIC-001",
      "title": "Epic title extracted from the board",
      "description": "Brief description of the epic",
      "businessValue": "Business value statement",
      "acceptanceCriteria": ["Key acceptance criteria"],
      "estimatedEffort": "T-shirt size (XS, S, M, L, XL)",
      "priority": "high|medium|low"
    }
  ],
  "features": [
    {
      "featureId": "FEAT-001",
      "epicId": "EPIC-001",
      "title": "Feature title from the board",
      "description": "Feature description",
      "userStories": [
        {
          "storyId": "US-001",
          "title": "User story title",
          "asA": "As a [user type]",
          "iWant": "I want [functionality]",
          "soThat": "So that [business benefit]",
          "acceptanceCriteria": ["Acceptance criteria"],
          "tasks": [
            {
              "taskId": "TASK-001",
              "title": "Task title",
              "description": "Task description",
              "estimatedHours": 8
            }
          ]
        }
      ]
    }
  ],
  "targetProcessImplementation": {
    "processName": "Name of the process",
    "targetSystem": "System the work items belong to",
    "implementationApproach": "How to roll out the work",
    "keyStakeholders": ["Stakeholder"],
    "successMetrics": ["Metric"]
  },
  "businessValue": "Overall business value",
  "estimatedTimeToMarket": "Rough estimate",
  "riskAssessment": [
    {
      "risk": "Risk description",
      "impact": "high|medium|low",
      "mitigation": "How to mitigate"
    }
  ]
}
```"#;

fn or_none(values: &[String], none: &str) -> String {
    if values.is_empty() {
        none.to_string()
    } else {
        values.join(", ")
    }
}

/// Build the prompt asking for the epic/feature/story breakdown.
pub fn analysis_prompt(analysis: &WorkflowAnalysis) -> String {
    let board = &analysis.board_info;

    let nodes = analysis
        .nodes
        .iter()
        .map(|n| {
            format!(
                "- Node {}: \"{}\" (Type: {}, Position: {},{}, Incoming: {}, Outgoing: {})",
                n.id,
                n.title,
                n.node_type,
                n.position.x,
                n.position.y,
                n.in_degree(),
                n.out_degree()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let connections = analysis
        .connections
        .iter()
        .map(|c| match &c.label {
            Some(label) => {
                format!("- Connection {}: From {} to {} (Label: \"{}\")", c.id, c.from, c.to, label)
            }
            None => format!("- Connection {}: From {} to {}", c.id, c.from, c.to),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let groups = if analysis.groups.is_empty() {
        "No groups defined".to_string()
    } else {
        analysis
            .groups
            .iter()
            .map(|g| format!("- Group {}: Contains {} nodes", g.id, g.node_ids.len()))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let tags = if analysis.tags.is_empty() {
        "No tags defined".to_string()
    } else {
        analysis.tags.iter().map(|t| format!("- Tag: \"{}\"", t.title)).collect::<Vec<_>>().join("\n")
    };

    let insights = &analysis.insights;

    format!(
        r"You are an expert Product Owner analyzing a Miro workflow. Extract and structure the key deliverables from this workflow into epics, features, user stories, and tasks with their titles.

## Board Information
- Board Name: {name}
- Board ID: {id}
- Description: {description}

## Workflow Nodes ({node_count} total):
{nodes}

## Workflow Connections ({connection_count} total):
{connections}

## Groups:
{groups}

## Tags:
{tags}

## Current Insights:
- Total Steps: {total_steps}
- Entry Points: {entry_points}
- Exit Points: {exit_points}
- Potential Bottlenecks: {bottlenecks}

## Analysis Request
Extract the titles of epics, features, user stories, and tasks (if needed) from this Miro board workflow. Provide your analysis in the following JSON format:

{schema}

Focus on:
1. Extracting titles directly from the Miro board nodes
2. Creating clear, concise titles for epics, features, and user stories
3. Including tasks only when they are clearly identifiable from the board
4. Maintaining the hierarchy: Epic -> Feature -> User Story -> Task
",
        name = board.name,
        id = board.id,
        description = board.description.as_deref().unwrap_or("No description provided"),
        node_count = analysis.nodes.len(),
        nodes = nodes,
        connection_count = analysis.connections.len(),
        connections = connections,
        groups = groups,
        tags = tags,
        total_steps = insights.total_steps,
        entry_points = insights.entry_points.join(", "),
        exit_points = insights.exit_points.join(", "),
        bottlenecks = or_none(&insights.bottlenecks, "None identified"),
        schema = RESPONSE_SCHEMA,
    )
}

/// Build the prompt asking for a Markdown report of the extracted hierarchy.
pub fn report_prompt(analysis: &WorkflowAnalysis, insights: &WorkflowInsights) -> String {
    let insights_json = serde_json::to_string_pretty(insights).unwrap_or_default();

    format!(
        r"Create a clean report focusing on the extracted epics, features, user stories, and tasks from the Miro board:

Board: {name}
Workflow Nodes: {node_count}

Product Owner Analysis:
{insights_json}

Please create a well-formatted markdown report that includes:
1. Summary of extracted items
2. Epic Titles and Brief Descriptions
3. Feature Titles grouped by Epic
4. User Story Titles grouped by Feature
5. Task Titles (if any) grouped by User Story

Keep it simple and focused on the titles and hierarchy extracted from the board.
",
        name = analysis.board_info.name,
        node_count = analysis.nodes.len(),
        insights_json = insights_json,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::extract_json_block;
    use crate::graph::{BoardInfo, Insights, WorkflowConnection};

    fn analysis() -> WorkflowAnalysis {
        WorkflowAnalysis {
            board_info: BoardInfo { id: "b1".into(), name: "Onboarding".into(), description: None },
            nodes: Vec::new(),
            connections: vec![WorkflowConnection {
                id: "c1".into(),
                from: "a".into(),
                to: "b".into(),
                label: Some("approved".into()),
                connection_type: "connector".into(),
            }],
            groups: Vec::new(),
            tags: Vec::new(),
            insights: Insights { total_steps: 0, ..Default::default() },
        }
    }

    #[test]
    fn test_analysis_prompt_sections() {
        let prompt = analysis_prompt(&analysis());

        assert!(prompt.contains("- Board Name: Onboarding"));
        assert!(prompt.contains("- Description: No description provided"));
        assert!(prompt.contains("- Connection c1: From a to b (Label: \"approved\")"));
        assert!(prompt.contains("No groups defined"));
        assert!(prompt.contains("No tags defined"));
        assert!(prompt.contains("- Potential Bottlenecks: None identified"));
    }

    #[test]
    fn test_schema_is_a_parseable_block() {
        let prompt = analysis_prompt(&analysis());
        let block = extract_json_block(&prompt).unwrap();
        let schema: serde_json::Value = serde_json::from_str(block).unwrap();
        assert!(schema["epics"].is_array());
    }

    #[test]
    fn test_report_prompt_embeds_insights() {
        let insights = WorkflowInsights::degraded("Response parsing failed", None);
        let prompt = report_prompt(&analysis(), &insights);

        assert!(prompt.contains("Board: Onboarding"));
        assert!(prompt.contains("\"workflowSummary\""));
    }
}
