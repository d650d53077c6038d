//! Typed analysis result and reply parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::AIError;

/// Characters of the raw reply kept in a degraded result.
pub const RAW_EXCERPT_CHARS: usize = 500;

static JSON_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```json\s*([\s\S]*?)\s*```").unwrap());

/// Priority or impact rating.
///
/// Parsed case-insensitively; anything unrecognized becomes `Medium`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum Level {
    High,
    #[default]
    Medium,
    Low,
}

impl From<String> for Level {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

/// A large body of work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Epic {
    /// Logical ID assigned by the model (e.g. "EPIC-001")
    pub epic_id: String,
    pub title: String,
    pub description: String,
    pub business_value: String,
    pub acceptance_criteria: Vec<String>,
    /// T-shirt size
    pub estimated_effort: String,
    pub priority: Level,
}

/// A feature under an epic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Feature {
    pub feature_id: String,
    /// Logical ID of the parent epic
    pub epic_id: String,
    pub title: String,
    pub description: String,
    pub user_stories: Vec<UserStory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserStory {
    pub story_id: String,
    pub title: String,
    pub as_a: String,
    pub i_want: String,
    pub so_that: String,
    pub acceptance_criteria: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,
}

impl UserStory {
    /// "As a ..., I want ... so that ..." sentence.
    pub fn narrative(&self) -> String {
        format!("{}, {} {}", self.as_a, self.i_want, self.so_that)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    pub title: String,
    pub description: String,
    pub estimated_hours: f64,
}

/// How the workflow maps onto the ticketing system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetProcessImplementation {
    pub process_name: String,
    pub target_system: String,
    pub implementation_approach: String,
    pub key_stakeholders: Vec<String>,
    pub success_metrics: Vec<String>,
}

impl Default for TargetProcessImplementation {
    fn default() -> Self {
        Self {
            process_name: "Unknown process".to_string(),
            target_system: "Not specified".to_string(),
            implementation_approach: "Not specified".to_string(),
            key_stakeholders: Vec::new(),
            success_metrics: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Risk {
    pub risk: String,
    pub impact: Level,
    pub mitigation: String,
}

/// What the model made of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInsights {
    pub workflow_summary: String,
    pub epics: Vec<Epic>,
    pub features: Vec<Feature>,
    pub target_process_implementation: TargetProcessImplementation,
    pub business_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time_to_market: Option<String>,
    #[serde(default)]
    pub risk_assessment: Vec<Risk>,
    /// Start of the raw reply, kept only when parsing failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_excerpt: Option<String>,
}

impl WorkflowInsights {
    /// Placeholder result used when the call or the parse fails.
    pub fn degraded(risk: impl Into<String>, raw: Option<&str>) -> Self {
        Self {
            workflow_summary: "Analysis completed but response formatting was invalid".to_string(),
            epics: Vec::new(),
            features: Vec::new(),
            target_process_implementation: TargetProcessImplementation {
                implementation_approach: "Manual review required due to parsing error".to_string(),
                ..Default::default()
            },
            business_value: "Unable to determine from malformed response".to_string(),
            estimated_time_to_market: None,
            risk_assessment: vec![Risk {
                risk: risk.into(),
                impact: Level::Medium,
                mitigation: "Review the workflow manually for detailed analysis".to_string(),
            }],
            raw_excerpt: raw.map(excerpt),
        }
    }

    /// Total user stories across all features.
    pub fn user_story_count(&self) -> usize {
        self.features.iter().map(|f| f.user_stories.len()).sum()
    }
}

/// Loosely-typed reply; everything optional so defaults can be applied.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInsights {
    workflow_summary: Option<String>,
    epics: Option<Vec<Epic>>,
    features: Option<Vec<Feature>>,
    target_process_implementation: Option<TargetProcessImplementation>,
    business_value: Option<String>,
    estimated_time_to_market: Option<String>,
    risk_assessment: Option<Vec<Risk>>,
}

/// Return the contents of the first fenced `json` block.
pub fn extract_json_block(text: &str) -> Option<&str> {
    JSON_BLOCK.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Parse a model reply into [`WorkflowInsights`], filling missing fields.
pub fn parse_insights(text: &str) -> Result<WorkflowInsights, AIError> {
    let block = extract_json_block(text).ok_or(AIError::MissingJsonBlock)?;
    let raw: RawInsights =
        serde_json::from_str(block).map_err(|e| AIError::InvalidJson(e.to_string()))?;

    Ok(WorkflowInsights {
        workflow_summary: non_empty(raw.workflow_summary)
            .unwrap_or_else(|| "No summary provided".to_string()),
        epics: raw.epics.unwrap_or_default(),
        features: raw.features.unwrap_or_default(),
        target_process_implementation: raw.target_process_implementation.unwrap_or_default(),
        business_value: non_empty(raw.business_value)
            .unwrap_or_else(|| "Business value not specified".to_string()),
        estimated_time_to_market: non_empty(raw.estimated_time_to_market),
        risk_assessment: raw.risk_assessment.unwrap_or_default(),
        raw_excerpt: None,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn excerpt(raw: &str) -> String {
    let mut out: String = raw.chars().take(RAW_EXCERPT_CHARS).collect();
    out.push_str("...");
    out
}
