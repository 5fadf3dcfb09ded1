use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role label applied when an assignment is created without one.
pub const DEFAULT_ASSIGNMENT_ROLE: &str = "Developer";

/// Links an engineer to a project for a share of their capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(rename = "_id")]
    pub id: String,
    pub engineer_id: String,
    pub project_id: String,
    pub allocation_percentage: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentInput {
    pub engineer_id: String,
    pub project_id: String,
    pub allocation_percentage: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl AssignmentInput {
    pub fn new(
        engineer_id: impl Into<String>,
        project_id: impl Into<String>,
        allocation_percentage: u32,
    ) -> Self {
        Self {
            engineer_id: engineer_id.into(),
            project_id: project_id.into(),
            allocation_percentage,
            start_date: None,
            end_date: None,
            role: None,
        }
    }

    /// Replaces a missing or blank role label with [`DEFAULT_ASSIGNMENT_ROLE`].
    pub fn with_default_role(mut self) -> Self {
        let blank = self
            .role
            .as_deref()
            .map(|role| role.trim().is_empty())
            .unwrap_or(true);
        if blank {
            self.role = Some(DEFAULT_ASSIGNMENT_ROLE.to_string());
        }
        self
    }
}
