//! Workflow analysis and report generation.

use std::sync::Arc;

use tracing::{info, warn};

use super::{analysis_prompt, parse_insights, report_prompt, CompletionProvider, WorkflowInsights};
use crate::graph::WorkflowAnalysis;

/// Turns a workflow graph into [`WorkflowInsights`] via a completion provider.
pub struct InsightAnalyzer {
    provider: Arc<dyn CompletionProvider>,
}

impl InsightAnalyzer {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Ask the model for an epic/feature/story breakdown.
    ///
    /// Never fails: call and parse errors yield [`WorkflowInsights::degraded`].
    pub async fn analyze(&self, analysis: &WorkflowAnalysis) -> WorkflowInsights {
        info!(provider = self.provider.name(), board_id = %analysis.board_info.id, "Analyzing workflow");

        let reply = match self.provider.complete(&analysis_prompt(analysis)).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Workflow analysis request failed");
                return WorkflowInsights::degraded(format!("AI analysis request failed: {}", e), None);
            }
        };

        match parse_insights(&reply) {
            Ok(insights) => {
                info!(
                    epics = insights.epics.len(),
                    features = insights.features.len(),
                    user_stories = insights.user_story_count(),
                    "Parsed workflow insights"
                );
                insights
            }
            Err(e) => {
                warn!(error = %e, "Could not parse workflow analysis response");
                WorkflowInsights::degraded("Response parsing failed", Some(&reply))
            }
        }
    }

    /// Ask the model for a Markdown report, falling back to [`fallback_report`].
    pub async fn generate_report(
        &self,
        analysis: &WorkflowAnalysis,
        insights: &WorkflowInsights,
    ) -> String {
        match self.provider.complete(&report_prompt(analysis, insights)).await {
            Ok(report) if !report.trim().is_empty() => report,
            Ok(_) => {
                warn!("Report generation returned an empty response");
                fallback_report(analysis, insights)
            }
            Err(e) => {
                warn!(error = %e, "Report generation failed");
                fallback_report(analysis, insights)
            }
        }
    }
}

impl std::fmt::Debug for InsightAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightAnalyzer").field("provider", &self.provider.name()).finish()
    }
}

/// Render a Markdown report locally.
pub fn fallback_report(analysis: &WorkflowAnalysis, insights: &WorkflowInsights) -> String {
    let mut lines = vec![
        "# Miro Board Analysis Report".to_string(),
        String::new(),
        format!("## Board: {}", analysis.board_info.name),
        String::new(),
        "### Summary".to_string(),
        insights.workflow_summary.clone(),
        String::new(),
        "### Epics".to_string(),
    ];

    if insights.epics.is_empty() {
        lines.push("No epics identified".to_string());
    }
    for epic in &insights.epics {
        lines.push(format!("#### {} ({})", epic.title, epic.epic_id));
        lines.push(epic.description.clone());
        lines.push(String::new());
    }

    lines.push(String::new());
    lines.push("### Features and User Stories".to_string());
    if insights.features.is_empty() {
        lines.push("No features identified".to_string());
    }
    for feature in &insights.features {
        lines.push(format!("#### {} ({})", feature.title, feature.feature_id));
        lines.push(feature.description.clone());
        lines.push(String::new());
        lines.push("**User Stories:**".to_string());
        for story in &feature.user_stories {
            lines.push(format!("- **{}** ({})", story.title, story.story_id));
            lines.push(format!("  {}", story.narrative()));
            if !story.tasks.is_empty() {
                lines.push("  **Tasks:**".to_string());
                lines.extend(story.tasks.iter().map(|t| format!("    - {}", t.title)));
            }
        }
        lines.push(String::new());
    }

    let structure = &analysis.insights;
    lines.push(String::new());
    lines.push("### Workflow Structure".to_string());
    lines.push(format!("- Total Steps: {}", structure.total_steps));
    lines.push(format!("- Connections: {}", analysis.connections.len()));
    lines.push(format!("- Entry Points: {}", structure.entry_points.len()));
    lines.push(format!("- Exit Points: {}", structure.exit_points.len()));
    if !structure.bottlenecks.is_empty() {
        lines.push(format!("- Bottlenecks: {}", structure.bottlenecks.join(", ")));
    }
    if !structure.recommendations.is_empty() {
        lines.push(String::new());
        lines.push("#### Recommendations".to_string());
        lines.extend(structure.recommendations.iter().map(|r| format!("- {}", r)));
    }

    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{Epic, Feature, ScriptedProvider, Task, UserStory};
    use crate::graph::{BoardInfo, Insights};

    fn analysis() -> WorkflowAnalysis {
        WorkflowAnalysis {
            board_info: BoardInfo { id: "b1".into(), name: "Onboarding".into(), description: None },
            nodes: Vec::new(),
            connections: Vec::new(),
            groups: Vec::new(),
            tags: Vec::new(),
            insights: Insights {
                total_steps: 3,
                bottlenecks: vec!["review".into()],
                recommendations: vec!["Found 1 disconnected nodes that might need connections".into()],
                ..Default::default()
            },
        }
    }

    fn analyzer(provider: ScriptedProvider) -> (InsightAnalyzer, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        (InsightAnalyzer::new(provider.clone()), provider)
    }

    #[tokio::test]
    async fn test_analyze_parses_reply() {
        let (analyzer, provider) = analyzer(ScriptedProvider::new().reply(
            "```json\n{\"workflowSummary\": \"Signup flow\", \"epics\": [{\"epicId\": \"E1\", \"title\": \"Signup\"}]}\n```",
        ));

        let insights = analyzer.analyze(&analysis()).await;

        assert_eq!(insights.workflow_summary, "Signup flow");
        assert_eq!(insights.epics.len(), 1);
        assert!(provider.prompts()[0].contains("Onboarding"));
    }

    #[tokio::test]
    async fn test_malformed_reply_degrades() {
        let (analyzer, _) = analyzer(ScriptedProvider::new().reply("I could not produce JSON, sorry."));

        let insights = analyzer.analyze(&analysis()).await;

        assert_eq!(
            insights.workflow_summary,
            "Analysis completed but response formatting was invalid"
        );
        assert_eq!(insights.risk_assessment.len(), 1);
        assert_eq!(insights.risk_assessment[0].risk, "Response parsing failed");
        assert_eq!(
            insights.raw_excerpt.as_deref(),
            Some("I could not produce JSON, sorry....")
        );
    }

    #[tokio::test]
    async fn test_failed_call_degrades() {
        let (analyzer, _) = analyzer(ScriptedProvider::new().fail("connection refused"));

        let insights = analyzer.analyze(&analysis()).await;

        assert_eq!(insights.risk_assessment.len(), 1);
        assert_eq!(
            insights.risk_assessment[0].risk,
            "AI analysis request failed: API error: connection refused"
        );
        assert!(insights.raw_excerpt.is_none());
    }

    #[tokio::test]
    async fn test_report_uses_model_output() {
        let (analyzer, _) = analyzer(ScriptedProvider::new().reply("# Report"));
        let insights = WorkflowInsights::degraded("x", None);

        assert_eq!(analyzer.generate_report(&analysis(), &insights).await, "# Report");
    }

    #[tokio::test]
    async fn test_report_falls_back() {
        let (analyzer, _) = analyzer(ScriptedProvider::new().reply("   "));
        let insights = WorkflowInsights::degraded("x", None);

        let report = analyzer.generate_report(&analysis(), &insights).await;

        assert!(report.starts_with("# Miro Board Analysis Report"));
        assert!(report.contains("No epics identified"));
    }

    #[test]
    fn test_fallback_report_hierarchy() {
        let mut insights = WorkflowInsights::degraded("x", None);
        insights.workflow_summary = "Signup flow".into();
        insights.epics = vec![Epic {
            epic_id: "E1".into(),
            title: "Signup".into(),
            description: "Accounts".into(),
            ..Default::default()
        }];
        insights.features = vec![Feature {
            feature_id: "F1".into(),
            epic_id: "E1".into(),
            title: "Register".into(),
            description: "Form".into(),
            user_stories: vec![UserStory {
                story_id: "US1".into(),
                title: "Create account".into(),
                as_a: "As a visitor".into(),
                i_want: "I want an account".into(),
                so_that: "so that I can log in".into(),
                tasks: vec![Task { title: "Build form".into(), ..Default::default() }],
                ..Default::default()
            }],
        }];

        let report = fallback_report(&analysis(), &insights);

        assert!(report.contains("## Board: Onboarding"));
        assert!(report.contains("Signup flow"));
        assert!(report.contains("#### Signup (E1)"));
        assert!(report.contains("#### Register (F1)"));
        assert!(report.contains("- **Create account** (US1)"));
        assert!(report.contains("  As a visitor, I want an account so that I can log in"));
        assert!(report.contains("    - Build form"));
        assert!(report.contains("- Bottlenecks: review"));
        assert!(report.contains("#### Recommendations"));
    }
}
