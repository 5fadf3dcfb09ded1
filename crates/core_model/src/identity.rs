use core_types::{Role, Seniority};
use serde::{Deserialize, Serialize};

/// Capacity assumed for identities whose record carries no `maxCapacity`.
pub const DEFAULT_MAX_CAPACITY: u32 = 100;

/// A user known to the backend, either an engineer or a manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seniority: Option<Seniority>,
    /// Percentage of a full-time load this person can take on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl Identity {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            role,
            skills: None,
            seniority: None,
            max_capacity: None,
            department: None,
        }
    }

    pub fn effective_capacity(&self) -> u32 {
        self.max_capacity.unwrap_or(DEFAULT_MAX_CAPACITY)
    }

    pub fn is_engineer(&self) -> bool {
        self.role == Role::Engineer
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    pub fn skills(&self) -> &[String] {
        self.skills.as_deref().unwrap_or_default()
    }
}

/// Payload for registering or creating a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seniority: Option<Seniority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_capacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}
