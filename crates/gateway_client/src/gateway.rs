use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use core_model::{Assignment, AssignmentInput, Identity, Project, ProjectInput, UserInput};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Body returned by `/auth/login`. The backend answers rejected logins with
/// the same endpoint, so every field is optional and callers decide success
/// from the presence of a token.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<Identity>,
    #[serde(default)]
    pub message: Option<String>,
}

impl LoginResponse {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.is_empty())
    }
}

/// Envelope used by endpoints that report a status alongside their payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One operation per backend resource. Implementations attach the persisted
/// bearer token to everything except `login` and `register`, and never
/// interpret HTTP status codes: a body that decodes is returned as-is.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;

    async fn profile(&self) -> Result<Identity>;

    async fn register(&self, user: &UserInput) -> Result<ApiResponse<Identity>>;

    async fn list_users(&self) -> Result<Vec<Identity>>;

    async fn get_user(&self, id: &str) -> Result<Identity>;

    async fn create_user(&self, user: &UserInput) -> Result<Identity>;

    async fn list_projects(&self) -> Result<Vec<Project>>;

    async fn get_project(&self, id: &str) -> Result<Project>;

    async fn create_project(&self, project: &ProjectInput) -> Result<Project>;

    async fn update_project(&self, id: &str, project: &ProjectInput) -> Result<Project>;

    async fn delete_project(&self, id: &str) -> Result<DeleteResponse>;

    async fn list_assignments(&self) -> Result<Vec<Assignment>>;

    async fn get_assignment(&self, id: &str) -> Result<Assignment>;

    async fn create_assignment(&self, assignment: &AssignmentInput) -> Result<Assignment>;
}
