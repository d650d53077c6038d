//! Per-run output files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::ai::WorkflowInsights;
use crate::graph::WorkflowAnalysis;
use crate::ticketing::PublishReport;

/// Files written for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactPaths {
    /// `workflow-data-{ts}.json`
    pub data: PathBuf,
    /// `workflow-report-{ts}.md`
    pub report: PathBuf,
    /// `work-items-{ts}.json`
    pub work_items: PathBuf,
}

impl ArtifactPaths {
    /// Paths for a run stamped `timestamp` under `dir`.
    pub fn new(dir: &Path, timestamp: &str) -> Self {
        Self {
            data: dir.join(format!("workflow-data-{}.json", timestamp)),
            report: dir.join(format!("workflow-report-{}.md", timestamp)),
            work_items: dir.join(format!("work-items-{}.json", timestamp)),
        }
    }
}

/// ISO-8601 UTC time with `:` and `.` replaced by `-`, safe in file names.
pub fn artifact_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string().replace([':', '.'], "-")
}

/// Everything persisted for a run.
pub struct RunArtifacts<'a> {
    pub analysis: &'a WorkflowAnalysis,
    pub insights: &'a WorkflowInsights,
    pub publish: &'a PublishReport,
    pub report: &'a str,
}

impl RunArtifacts<'_> {
    /// Write all three files under `dir`, creating it if missing.
    pub async fn write(&self, dir: &Path, timestamp: &str) -> anyhow::Result<ArtifactPaths> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        let paths = ArtifactPaths::new(dir, timestamp);

        let data = json!({
            "workflowData": self.analysis,
            "insights": self.insights,
            "workItemResults": self.publish,
        });
        write_file(&paths.data, serde_json::to_string_pretty(&data)?).await?;
        write_file(&paths.report, self.report.to_string()).await?;
        write_file(&paths.work_items, serde_json::to_string_pretty(self.publish)?).await?;

        Ok(paths)
    }
}

async fn write_file(path: &Path, contents: String) -> anyhow::Result<()> {
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::graph::{BoardInfo, Insights};

    #[test]
    fn test_artifact_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(artifact_timestamp(at), "2024-03-05T14-07-09-042Z");
    }

    #[tokio::test]
    async fn test_write_creates_directory_and_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("output");

        let analysis = WorkflowAnalysis {
            board_info: BoardInfo { id: "b1".into(), name: "Board".into(), description: None },
            nodes: Vec::new(),
            connections: Vec::new(),
            groups: Vec::new(),
            tags: Vec::new(),
            insights: Insights::default(),
        };
        let insights = WorkflowInsights::degraded("Response parsing failed", None);
        let publish = PublishReport::default();

        let artifacts =
            RunArtifacts { analysis: &analysis, insights: &insights, publish: &publish, report: "# Report" };
        let paths = artifacts.write(&dir, "2024-03-05T14-07-09-042Z").await.unwrap();

        assert_eq!(paths.report.file_name().unwrap(), "workflow-report-2024-03-05T14-07-09-042Z.md");
        assert_eq!(std::fs::read_to_string(&paths.report).unwrap(), "# Report");

        let data: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths.data).unwrap()).unwrap();
        assert_eq!(data["workflowData"]["boardInfo"]["id"], "b1");
        assert_eq!(data["insights"]["riskAssessment"].as_array().unwrap().len(), 1);
        assert!(data["workItemResults"]["epics"].is_array());

        let items: PublishReport =
            serde_json::from_str(&std::fs::read_to_string(&paths.work_items).unwrap()).unwrap();
        assert_eq!(items, publish);
    }
}
