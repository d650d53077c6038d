//! Epic → feature → user story creation.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::{WorkItemApi, WorkItemKind};
use crate::ai::{Epic, Feature, UserStory, WorkflowInsights};

/// Workflow name used for project naming when none is given.
pub const DEFAULT_WORKFLOW_NAME: &str = "Miro_Board_Analysis";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Outcome of one create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkItemResult {
    fn created(name: &str, id: u64) -> Self {
        Self { success: true, id: Some(id), name: name.to_string(), error: None }
    }

    fn failed(name: &str, error: impl ToString) -> Self {
        Self { success: false, id: None, name: name.to_string(), error: Some(error.to_string()) }
    }

    /// Server ID when the create succeeded with a usable ID.
    pub fn usable_id(&self) -> Option<u64> {
        self.id.filter(|id| self.success && *id != 0)
    }
}

/// Everything one publish run created or tried to create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReport {
    /// Present only when the project had to be created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<WorkItemResult>,
    pub epics: Vec<WorkItemResult>,
    pub features: Vec<WorkItemResult>,
    pub user_stories: Vec<WorkItemResult>,
}

impl PublishReport {
    /// Number of successful creates across all kinds.
    pub fn succeeded(&self) -> usize {
        self.all().filter(|r| r.success).count()
    }

    /// Number of failed creates across all kinds.
    pub fn failed(&self) -> usize {
        self.all().filter(|r| !r.success).count()
    }

    fn all(&self) -> impl Iterator<Item = &WorkItemResult> {
        self.project.iter().chain(&self.epics).chain(&self.features).chain(&self.user_stories)
    }
}

/// Name of the project created for a workflow.
pub fn project_name(workflow_name: Option<&str>) -> String {
    let name = workflow_name.filter(|n| !n.is_empty()).unwrap_or(DEFAULT_WORKFLOW_NAME);
    format!("AI_Workflow_{}_Analysis", WHITESPACE.replace_all(name, "_"))
}

/// Creates work items for an analysis, one call at a time.
pub struct WorkItemPublisher<'a> {
    api: &'a dyn WorkItemApi,
    project_id: u64,
}

impl<'a> WorkItemPublisher<'a> {
    /// Create a publisher scoped to `project_id`; `None` or 0 creates a
    /// project first.
    pub fn new(api: &'a dyn WorkItemApi, project_id: Option<u64>) -> Self {
        Self { api, project_id: project_id.unwrap_or(0) }
    }

    /// Create the hierarchy described by `insights`.
    ///
    /// Individual failures are recorded in the report; nothing is retried.
    pub async fn publish(
        &mut self,
        insights: &WorkflowInsights,
        workflow_name: Option<&str>,
    ) -> PublishReport {
        let mut report = PublishReport::default();

        if self.project_id == 0 {
            info!("No project ID set, creating new project");
            let project = self.create_project(workflow_name).await;
            let usable = project.usable_id();
            report.project = Some(project);
            match usable {
                Some(id) => self.project_id = id,
                None => {
                    error!("Failed to create project, skipping work item creation");
                    return report;
                }
            }
        }

        let mut epic_ids: HashMap<&str, u64> = HashMap::new();
        for epic in &insights.epics {
            let result = self.create_epic(epic).await;
            if let Some(id) = result.usable_id() {
                epic_ids.insert(epic.epic_id.as_str(), id);
            }
            report.epics.push(result);
        }
        if insights.epics.is_empty() {
            warn!("No epics found in analysis");
        }

        for feature in &insights.features {
            let Some(&epic_id) = epic_ids.get(feature.epic_id.as_str()) else {
                error!(
                    feature = %feature.title,
                    epic_id = %feature.epic_id,
                    "Cannot create feature: epic not found"
                );
                continue;
            };

            let result = self.create_feature(feature, epic_id).await;
            let feature_id = result.usable_id();
            report.features.push(result);

            if let Some(feature_id) = feature_id {
                for story in &feature.user_stories {
                    report.user_stories.push(self.create_user_story(story, feature_id).await);
                }
            }
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            project_id = self.project_id,
            "Work item creation finished"
        );
        report
    }

    /// Project ID in use (set after a successful project create).
    pub fn project_id(&self) -> u64 {
        self.project_id
    }

    async fn create_project(&self, workflow_name: Option<&str>) -> WorkItemResult {
        let name = project_name(workflow_name);
        self.create(WorkItemKind::Project, &name, json!({ "Name": name })).await
    }

    async fn create_epic(&self, epic: &Epic) -> WorkItemResult {
        let payload = json!({
            "Name": epic.title,
            "Description": epic.description,
            "Project": { "Id": self.project_id },
        });
        self.create(WorkItemKind::Epic, &epic.title, payload).await
    }

    async fn create_feature(&self, feature: &Feature, epic_id: u64) -> WorkItemResult {
        let payload = json!({
            "Name": feature.title,
            "Description": feature.description,
            "Epic": { "Id": epic_id },
            "Project": { "Id": self.project_id },
        });
        self.create(WorkItemKind::Feature, &feature.title, payload).await
    }

    async fn create_user_story(&self, story: &UserStory, feature_id: u64) -> WorkItemResult {
        let payload = json!({
            "Name": story.title,
            "Description": story.narrative(),
            "Feature": { "Id": feature_id },
            "Project": { "Id": self.project_id },
        });
        self.create(WorkItemKind::UserStory, &story.title, payload).await
    }

    async fn create(&self, kind: WorkItemKind, name: &str, payload: Value) -> WorkItemResult {
        match self.api.create(kind, &payload).await {
            Ok(id) => {
                info!(%kind, name, id, "Created work item");
                WorkItemResult::created(name, id)
            }
            Err(e) => {
                error!(%kind, name, error = %e, "Failed to create work item");
                WorkItemResult::failed(name, e)
            }
        }
    }
}
