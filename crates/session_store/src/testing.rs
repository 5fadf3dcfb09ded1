use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::sync::Notify;

use core_model::{
    Assignment, AssignmentInput, Identity, Project, ProjectInput, ProjectStatus, Role, UserInput,
};
use gateway_client::{
    ApiResponse, BackendGateway, CredentialStorage, DeleteResponse, LoginRequest, LoginResponse,
    MemoryCredentials,
};

use crate::store::SessionStore;

pub(crate) const VALID_TOKEN: &str = "tok-valid";
pub(crate) const EMAIL: &str = "ada@example.com";
pub(crate) const PASSWORD: &str = "secret";

pub(crate) fn identity(id: &str, role: Role) -> Identity {
    let mut identity = Identity::new(id, format!("{id}@example.com"), id.to_uppercase(), role);
    identity.max_capacity = Some(100);
    identity
}

pub(crate) fn project(id: &str) -> Project {
    Project {
        id: id.into(),
        name: format!("Project {id}"),
        description: None,
        start_date: None,
        end_date: None,
        required_skills: None,
        team_size: None,
        status: ProjectStatus::Active,
        manager_id: Some("m1".into()),
    }
}

pub(crate) fn assignment(id: &str, engineer: &str, project: &str, pct: u32) -> Assignment {
    Assignment {
        id: id.into(),
        engineer_id: engineer.into(),
        project_id: project.into(),
        allocation_percentage: pct,
        start_date: None,
        end_date: None,
        role: None,
    }
}

/// In-memory backend with switchable failures and a call counter. Reads the
/// bearer token from the same credential store the session store writes.
pub(crate) struct ScriptedGateway {
    credentials: Arc<MemoryCredentials>,
    users: Mutex<Vec<Identity>>,
    projects: Mutex<Vec<Project>>,
    assignments: Mutex<Vec<Assignment>>,
    login_requests: Mutex<Vec<LoginRequest>>,
    created_assignments: Mutex<Vec<AssignmentInput>>,
    calls: AtomicUsize,
    transport_down: AtomicBool,
    users_failing: AtomicBool,
    projects_failing: AtomicBool,
    writes_failing: AtomicBool,
    hold_projects: AtomicBool,
    projects_gate: Notify,
    hold_login: AtomicBool,
    login_gate: Notify,
    hold_profile: AtomicBool,
    profile_gate: Notify,
    profile_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub(crate) fn new(credentials: Arc<MemoryCredentials>) -> Self {
        Self {
            credentials,
            users: Mutex::new(vec![
                identity("e1", Role::Engineer),
                identity("e2", Role::Engineer),
                identity("m1", Role::Manager),
            ]),
            projects: Mutex::new(vec![project("p1"), project("p2")]),
            assignments: Mutex::new(vec![assignment("a1", "e1", "p1", 50)]),
            login_requests: Mutex::new(Vec::new()),
            created_assignments: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            transport_down: AtomicBool::new(false),
            users_failing: AtomicBool::new(false),
            projects_failing: AtomicBool::new(false),
            writes_failing: AtomicBool::new(false),
            hold_projects: AtomicBool::new(false),
            projects_gate: Notify::new(),
            hold_login: AtomicBool::new(false),
            login_gate: Notify::new(),
            hold_profile: AtomicBool::new(false),
            profile_gate: Notify::new(),
            profile_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn login_requests(&self) -> Vec<LoginRequest> {
        self.login_requests.lock().unwrap().clone()
    }

    pub(crate) fn created_assignments(&self) -> Vec<AssignmentInput> {
        self.created_assignments.lock().unwrap().clone()
    }

    pub(crate) fn set_assignments(&self, assignments: Vec<Assignment>) {
        *self.assignments.lock().unwrap() = assignments;
    }

    pub(crate) fn bring_transport_down(&self) {
        self.transport_down.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_users(&self) {
        self.users_failing.store(true, Ordering::SeqCst);
    }

    pub(crate) fn set_projects_failing(&self, failing: bool) {
        self.projects_failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn fail_writes(&self) {
        self.writes_failing.store(true, Ordering::SeqCst);
    }

    pub(crate) fn hold_projects(&self) {
        self.hold_projects.store(true, Ordering::SeqCst);
    }

    pub(crate) fn release_projects(&self) {
        self.projects_gate.notify_one();
    }

    /// Parks the next login call until `release_login`. Later calls pass.
    pub(crate) fn hold_login(&self) {
        self.hold_login.store(true, Ordering::SeqCst);
    }

    pub(crate) fn release_login(&self) {
        self.login_gate.notify_one();
    }

    /// Parks the next profile call until `release_profile`. The bearer token is
    /// checked before parking, the way a real request carries it when sent.
    pub(crate) fn hold_profile(&self) {
        self.hold_profile.store(true, Ordering::SeqCst);
    }

    pub(crate) fn release_profile(&self) {
        self.profile_gate.notify_one();
    }

    pub(crate) fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_writes(&self) -> Result<()> {
        if self.writes_failing.load(Ordering::SeqCst) {
            bail!("Failed to send write request");
        }
        Ok(())
    }

    fn bearer_is_valid(&self) -> bool {
        matches!(self.credentials.get(), Ok(Some(token)) if token == VALID_TOKEN)
    }
}

#[async_trait]
impl BackendGateway for ScriptedGateway {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.touch();
        self.login_requests.lock().unwrap().push(request.clone());
        if self.hold_login.swap(false, Ordering::SeqCst) {
            self.login_gate.notified().await;
        }
        if self.transport_down.load(Ordering::SeqCst) {
            bail!("Failed to send POST /auth/login");
        }
        if request.email == EMAIL && request.password == PASSWORD {
            Ok(LoginResponse {
                token: Some(VALID_TOKEN.into()),
                user: Some(identity("e1", Role::Engineer)),
                message: None,
            })
        } else {
            Ok(LoginResponse {
                message: Some("Invalid credentials".into()),
                ..Default::default()
            })
        }
    }

    async fn profile(&self) -> Result<Identity> {
        self.touch();
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let valid = self.bearer_is_valid();
        if self.hold_profile.swap(false, Ordering::SeqCst) {
            self.profile_gate.notified().await;
        }
        if !valid {
            bail!("Failed to parse GET /auth/profile response");
        }
        Ok(identity("e1", Role::Engineer))
    }

    async fn register(&self, user: &UserInput) -> Result<ApiResponse<Identity>> {
        self.touch();
        self.check_writes()?;
        let email = user.email.clone().context("email required")?;
        let created = Identity::new("new", email, "New", user.role.unwrap_or(Role::Engineer));
        Ok(ApiResponse {
            success: Some(true),
            message: None,
            data: Some(created),
        })
    }

    async fn list_users(&self) -> Result<Vec<Identity>> {
        self.touch();
        if self.users_failing.load(Ordering::SeqCst) {
            bail!("Failed to send GET /users");
        }
        Ok(self.users.lock().unwrap().clone())
    }

    async fn get_user(&self, id: &str) -> Result<Identity> {
        self.touch();
        let users = self.users.lock().unwrap();
        users
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .context("Failed to parse GET /users/:id response")
    }

    async fn create_user(&self, user: &UserInput) -> Result<Identity> {
        self.touch();
        self.check_writes()?;
        let created = Identity::new(
            format!("u{}", self.users.lock().unwrap().len() + 1),
            user.email.clone().unwrap_or_default(),
            user.name.clone().unwrap_or_default(),
            user.role.unwrap_or(Role::Engineer),
        );
        self.users.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.touch();
        if self.hold_projects.load(Ordering::SeqCst) {
            self.projects_gate.notified().await;
        }
        if self.projects_failing.load(Ordering::SeqCst) {
            bail!("Failed to send GET /projects");
        }
        Ok(self.projects.lock().unwrap().clone())
    }

    async fn get_project(&self, id: &str) -> Result<Project> {
        self.touch();
        let projects = self.projects.lock().unwrap();
        projects
            .iter()
            .find(|project| project.id == id)
            .cloned()
            .context("Failed to parse GET /projects/:id response")
    }

    async fn create_project(&self, input: &ProjectInput) -> Result<Project> {
        self.touch();
        self.check_writes()?;
        let mut projects = self.projects.lock().unwrap();
        let mut created = project(&format!("p{}", projects.len() + 1));
        if let Some(name) = &input.name {
            created.name = name.clone();
        }
        projects.push(created.clone());
        Ok(created)
    }

    async fn update_project(&self, id: &str, input: &ProjectInput) -> Result<Project> {
        self.touch();
        self.check_writes()?;
        let mut projects = self.projects.lock().unwrap();
        let existing = projects
            .iter_mut()
            .find(|project| project.id == id)
            .context("Failed to parse PUT /projects/:id response")?;
        if let Some(status) = input.status {
            existing.status = status;
        }
        Ok(existing.clone())
    }

    async fn delete_project(&self, id: &str) -> Result<DeleteResponse> {
        self.touch();
        self.check_writes()?;
        self.projects.lock().unwrap().retain(|project| project.id != id);
        Ok(DeleteResponse {
            success: Some(true),
            message: Some("Project deleted".into()),
        })
    }

    async fn list_assignments(&self) -> Result<Vec<Assignment>> {
        self.touch();
        Ok(self.assignments.lock().unwrap().clone())
    }

    async fn get_assignment(&self, id: &str) -> Result<Assignment> {
        self.touch();
        let assignments = self.assignments.lock().unwrap();
        assignments
            .iter()
            .find(|assignment| assignment.id == id)
            .cloned()
            .context("Failed to parse GET /assignments/:id response")
    }

    async fn create_assignment(&self, input: &AssignmentInput) -> Result<Assignment> {
        self.touch();
        self.check_writes()?;
        self.created_assignments.lock().unwrap().push(input.clone());
        let mut assignments = self.assignments.lock().unwrap();
        let mut created = assignment(
            &format!("a{}", assignments.len() + 1),
            &input.engineer_id,
            &input.project_id,
            input.allocation_percentage,
        );
        created.role = input.role.clone();
        assignments.push(created.clone());
        Ok(created)
    }
}

/// Store wired to a scripted gateway, optionally with a token already persisted.
pub(crate) fn fixture(
    token: Option<&str>,
) -> (SessionStore, Arc<ScriptedGateway>, Arc<MemoryCredentials>) {
    let credentials = Arc::new(match token {
        Some(token) => MemoryCredentials::with_token(token),
        None => MemoryCredentials::new(),
    });
    let gateway = Arc::new(ScriptedGateway::new(credentials.clone()));
    let store = SessionStore::new(gateway.clone(), credentials.clone());
    (store, gateway, credentials)
}
