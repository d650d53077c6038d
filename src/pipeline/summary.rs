//! Human-readable run summary.

use super::RunOutcome;
use crate::ai::Level;

fn level(level: Level) -> &'static str {
    match level {
        Level::High => "HIGH",
        Level::Medium => "MEDIUM",
        Level::Low => "LOW",
    }
}

fn created(results: &[crate::ticketing::WorkItemResult]) -> String {
    format!("{}/{}", results.iter().filter(|r| r.success).count(), results.len())
}

impl RunOutcome {
    /// Lines printed after a CLI run.
    pub fn summary_lines(&self) -> Vec<String> {
        let analysis = &self.analysis;
        let insights = &self.insights;
        let publish = &self.publish;

        let mut lines = vec![
            "Analysis Complete!".to_string(),
            "================================".to_string(),
            format!("Board: {}", analysis.board_info.name),
            format!("Nodes: {}", analysis.nodes.len()),
            format!("Connections: {}", analysis.connections.len()),
            format!("Tags: {}", analysis.tags.len()),
            format!("Groups: {}", analysis.groups.len()),
            format!("Entry Points: {}", analysis.insights.entry_points.len()),
            format!("Exit Points: {}", analysis.insights.exit_points.len()),
        ];

        if !insights.epics.is_empty() {
            lines.push(format!("Epics: {}", insights.epics.len()));
        }
        if !insights.features.is_empty() {
            lines.push(format!(
                "Features: {}, User Stories: {}",
                insights.features.len(),
                insights.user_story_count()
            ));
        }
        if !insights.risk_assessment.is_empty() {
            lines.push(format!("Risks Identified: {}", insights.risk_assessment.len()));
        }

        lines.push(String::new());
        lines.push("Output Files:".to_string());
        lines.push(format!("Raw Data: {}", self.artifacts.data.display()));
        lines.push(format!("Report: {}", self.artifacts.report.display()));
        lines.push(format!("Work Items: {}", self.artifacts.work_items.display()));

        lines.push(String::new());
        lines.push("Work Item Creation Results:".to_string());
        if let Some(project) = &publish.project {
            let status = project.id.filter(|_| project.success).map_or("Failed".to_string(), |id| id.to_string());
            lines.push(format!("Project Created: {} ({})", project.name, status));
        }
        lines.push(format!("Epics Created: {}", created(&publish.epics)));
        lines.push(format!("Features Created: {}", created(&publish.features)));
        lines.push(format!("User Stories Created: {}", created(&publish.user_stories)));

        lines.push(String::new());
        lines.push("Quick Insights:".to_string());
        lines.push(format!("Summary: {}", insights.workflow_summary));
        if let Some(ttm) = &insights.estimated_time_to_market {
            lines.push(format!("Time to Market: {}", ttm));
        }
        lines.push(format!("Target System: {}", insights.target_process_implementation.target_system));
        lines.push(format!("Business Value: {}", insights.business_value));

        if !insights.epics.is_empty() {
            lines.push(String::new());
            lines.push("Top Epics:".to_string());
            for (i, epic) in insights.epics.iter().take(3).enumerate() {
                lines.push(format!("{}. [{}] {} ({})", i + 1, level(epic.priority), epic.title, epic.epic_id));
            }
        }

        if !insights.risk_assessment.is_empty() {
            lines.push(String::new());
            lines.push("Key Risks:".to_string());
            for (i, risk) in insights.risk_assessment.iter().take(3).enumerate() {
                lines.push(format!("{}. [{}] {}", i + 1, level(risk.impact), risk.risk));
            }
        }

        lines
    }
}
