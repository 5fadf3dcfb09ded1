use anyhow::{Context, Result};
use tracing::info;

use core_model::{Assignment, AssignmentInput, Project, ProjectInput};
use gateway_client::DeleteResponse;

use crate::store::SessionStore;

// Form submissions. Unlike background fetches these surface their errors,
// and on success refresh the collection they touched.
impl SessionStore {
    pub async fn create_project(&self, input: &ProjectInput) -> Result<Project> {
        let project = self
            .gateway
            .create_project(input)
            .await
            .context("failed to create project")?;
        info!(project_id = %project.id, "project created");
        self.fetch_projects().await;
        Ok(project)
    }

    pub async fn update_project(&self, id: &str, input: &ProjectInput) -> Result<Project> {
        let project = self
            .gateway
            .update_project(id, input)
            .await
            .with_context(|| format!("failed to update project {}", id))?;
        info!(project_id = %project.id, "project updated");
        self.fetch_projects().await;
        Ok(project)
    }

    /// Deletes a project. Assignments that referenced it stay cached.
    pub async fn delete_project(&self, id: &str) -> Result<DeleteResponse> {
        let response = self
            .gateway
            .delete_project(id)
            .await
            .with_context(|| format!("failed to delete project {}", id))?;
        info!(project_id = id, "project deleted");
        self.fetch_projects().await;
        Ok(response)
    }

    pub async fn create_assignment(&self, input: AssignmentInput) -> Result<Assignment> {
        let input = input.with_default_role();
        let assignment = self
            .gateway
            .create_assignment(&input)
            .await
            .context("failed to create assignment")?;
        info!(
            assignment_id = %assignment.id,
            engineer_id = %assignment.engineer_id,
            project_id = %assignment.project_id,
            "assignment created"
        );
        self.fetch_assignments().await;
        Ok(assignment)
    }
}
