//! Research domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One titled section of a generated research report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchSection {
    pub title: String,
    pub content: String,
}

/// A previously generated research report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchReport {
    pub id: String,
    pub holding_id: Option<String>,
    pub symbol: Option<String>,
    pub title: String,
    pub sections: Vec<ResearchSection>,
    pub created_at: DateTime<Utc>,
}

/// Request to generate a new research report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchRequest {
    pub holding_id: Option<String>,
    pub symbol: String,
    pub focus: Option<String>,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResearchStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// Handle returned when a research report has been triggered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchJob {
    pub id: String,
    pub symbol: String,
    pub status: ResearchStatus,
    pub requested_at: DateTime<Utc>,
}
