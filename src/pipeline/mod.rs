//! End-to-end run: board → graph → insights → work items → artifacts.
//!
//! Every step is awaited in sequence. Board metadata and item listing
//! failures abort the run; everything downstream degrades instead.

mod artifacts;
mod summary;

pub use artifacts::{artifact_timestamp, ArtifactPaths, RunArtifacts};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::ai::{build_provider, CompletionProvider, InsightAnalyzer, WorkflowInsights};
use crate::board::{Board, BoardApi, MiroClient};
use crate::core::Settings;
use crate::graph::{InsightThresholds, WorkflowAnalysis, WorkflowBuilder};
use crate::ticketing::{PublishReport, TargetProcessClient, WorkItemApi, WorkItemPublisher};

/// Boards shown by `list`.
pub const LIST_LIMIT: u32 = 20;

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub board_id: String,
    pub output_dir: PathBuf,
    /// Used to name the project when one has to be created
    pub workflow_name: Option<String>,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub analysis: WorkflowAnalysis,
    pub insights: WorkflowInsights,
    pub publish: PublishReport,
    pub artifacts: ArtifactPaths,
}

/// Counts reported for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCounts {
    pub nodes: usize,
    pub connections: usize,
    pub epics_created: usize,
    pub features_created: usize,
    pub user_stories_created: usize,
    pub failed_items: usize,
}

impl RunOutcome {
    pub fn counts(&self) -> RunCounts {
        let ok = |results: &[crate::ticketing::WorkItemResult]| {
            results.iter().filter(|r| r.success).count()
        };
        RunCounts {
            nodes: self.analysis.nodes.len(),
            connections: self.analysis.connections.len(),
            epics_created: ok(&self.publish.epics),
            features_created: ok(&self.publish.features),
            user_stories_created: ok(&self.publish.user_stories),
            failed_items: self.publish.failed(),
        }
    }
}

/// The three services a run talks to.
pub struct Pipeline {
    board: Arc<dyn BoardApi>,
    analyzer: InsightAnalyzer,
    tracker: Arc<dyn WorkItemApi>,
    thresholds: InsightThresholds,
    project_id: Option<u64>,
}

impl Pipeline {
    pub fn new(
        board: Arc<dyn BoardApi>,
        provider: Arc<dyn CompletionProvider>,
        tracker: Arc<dyn WorkItemApi>,
    ) -> Self {
        Self {
            board,
            analyzer: InsightAnalyzer::new(provider),
            tracker,
            thresholds: InsightThresholds::default(),
            project_id: None,
        }
    }

    /// Build the HTTP-backed pipeline described by `settings`.
    pub fn from_settings(settings: &Settings, project_id: Option<u64>) -> Self {
        let config = &settings.config;
        let credentials = &settings.credentials;

        let board = MiroClient::new(credentials.miro_token.as_str())
            .with_base_url(config.board.base_url.as_str());
        let provider = build_provider(
            settings.provider,
            &credentials.ai_key,
            &config.ai.completion_options(),
        );
        let tracker = TargetProcessClient::new(
            credentials.ticketing_base_url.as_str(),
            credentials.ticketing_token.as_str(),
        );

        Self::new(Arc::new(board), Arc::from(provider), Arc::new(tracker))
            .with_thresholds(config.analysis)
            .with_project_id(project_id)
    }

    pub fn with_thresholds(mut self, thresholds: InsightThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Scope created work items to a project; `None` or 0 creates one.
    pub fn with_project_id(mut self, project_id: Option<u64>) -> Self {
        self.project_id = project_id;
        self
    }

    /// Project that created work items are scoped to.
    pub fn project_id(&self) -> Option<u64> {
        self.project_id
    }

    /// Run the whole pipeline for one board.
    pub async fn run(&self, options: &RunOptions) -> anyhow::Result<RunOutcome> {
        let board_id = options.board_id.as_str();
        info!(board_id, "Starting analysis of board");

        let analysis = WorkflowBuilder::new(self.board.as_ref())
            .with_thresholds(self.thresholds)
            .analyze(board_id)
            .await
            .with_context(|| format!("Failed to extract workflow from board {}", board_id))?;
        info!(
            board_id,
            nodes = analysis.nodes.len(),
            connections = analysis.connections.len(),
            "Extracted workflow"
        );

        let insights = self.analyzer.analyze(&analysis).await;

        info!(board_id, "Creating work items");
        let publish = WorkItemPublisher::new(self.tracker.as_ref(), self.project_id)
            .publish(&insights, options.workflow_name.as_deref())
            .await;

        info!(board_id, "Generating report");
        let report = self.analyzer.generate_report(&analysis, &insights).await;

        let timestamp = artifact_timestamp(Utc::now());
        let artifacts = RunArtifacts {
            analysis: &analysis,
            insights: &insights,
            publish: &publish,
            report: &report,
        }
        .write(&options.output_dir, &timestamp)
        .await?;
        info!(board_id, data = %artifacts.data.display(), "Saved run artifacts");

        Ok(RunOutcome { analysis, insights, publish, artifacts })
    }

    /// List boards visible to the token.
    pub async fn list_boards(&self, limit: u32) -> anyhow::Result<Vec<Board>> {
        self.board.list_boards(limit, 0).await.context("Failed to list boards")
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("analyzer", &self.analyzer)
            .field("thresholds", &self.thresholds)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}
