use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{IntoUrl, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use core_model::{Assignment, AssignmentInput, Identity, Project, ProjectInput, UserInput};

use crate::credentials::CredentialStorage;
use crate::gateway::{ApiResponse, BackendGateway, DeleteResponse, LoginRequest, LoginResponse};

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api";

const AUTH_LOGIN: &str = "/auth/login";
const AUTH_PROFILE: &str = "/auth/profile";
const AUTH_REGISTER: &str = "/auth/register";
const USERS: &str = "/users";
const PROJECTS: &str = "/projects";
const ASSIGNMENTS: &str = "/assignments";

/// REST gateway backed by `reqwest`. The bearer token is read from the
/// credential store on every request rather than cached here.
pub struct HttpGateway {
    http: reqwest::Client,
    api_base: String,
    credentials: Arc<dyn CredentialStorage>,
}

impl HttpGateway {
    pub fn new(api_base: impl Into<String>, credentials: Arc<dyn CredentialStorage>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: normalize_base(api_base.into()),
            credentials,
        }
    }

    pub fn with_timeout(
        api_base: impl Into<String>,
        credentials: Arc<dyn CredentialStorage>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            api_base: normalize_base(api_base.into()),
            credentials,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// `{collection}/{id}` with the id percent-encoded as a single path segment.
    fn resource_url(&self, collection: &str, id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url(collection))
            .with_context(|| format!("Invalid API base {}", self.api_base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("API base {} cannot carry a path", self.api_base))?
            .push(id);
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .credentials
            .get()
            .context("Failed to read stored bearer token")?;
        Ok(match token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        })
    }

    async fn execute<T>(&self, builder: RequestBuilder, label: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let body = self.execute_text(builder, label).await?;
        serde_json::from_str(&body).with_context(|| format!("Failed to parse {} response", label))
    }

    async fn execute_text(&self, builder: RequestBuilder, label: &str) -> Result<String> {
        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to send {}", label))?;
        let status = response.status();
        debug!(request = label, %status, "backend responded");
        response
            .text()
            .await
            .with_context(|| format!("Failed to read {} response body", label))
    }

    async fn get_json<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.get_from(self.url(path), &format!("GET {}", path)).await
    }

    async fn get_resource<T>(&self, collection: &str, id: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.resource_url(collection, id)?;
        self.get_from(url, &format!("GET {}/{}", collection, id)).await
    }

    async fn get_from<T, U>(&self, url: U, label: &str) -> Result<T>
    where
        T: DeserializeOwned,
        U: IntoUrl,
    {
        let builder = self.authorized(self.http.get(url))?;
        self.execute(builder, label).await
    }
}

#[async_trait]
impl BackendGateway for HttpGateway {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        debug!(email = %request.email, url = %self.url(AUTH_LOGIN), "attempting login");
        let builder = self.http.post(self.url(AUTH_LOGIN)).json(request);
        self.execute(builder, "POST /auth/login").await
    }

    async fn profile(&self) -> Result<Identity> {
        self.get_json(AUTH_PROFILE).await
    }

    async fn register(&self, user: &UserInput) -> Result<ApiResponse<Identity>> {
        let builder = self.http.post(self.url(AUTH_REGISTER)).json(user);
        self.execute(builder, "POST /auth/register").await
    }

    async fn list_users(&self) -> Result<Vec<Identity>> {
        self.get_json(USERS).await
    }

    async fn get_user(&self, id: &str) -> Result<Identity> {
        self.get_resource(USERS, id).await
    }

    async fn create_user(&self, user: &UserInput) -> Result<Identity> {
        let builder = self.authorized(self.http.post(self.url(USERS)).json(user))?;
        self.execute(builder, "POST /users").await
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.get_json(PROJECTS).await
    }

    async fn get_project(&self, id: &str) -> Result<Project> {
        self.get_resource(PROJECTS, id).await
    }

    async fn create_project(&self, project: &ProjectInput) -> Result<Project> {
        let builder = self.authorized(self.http.post(self.url(PROJECTS)).json(project))?;
        self.execute(builder, "POST /projects").await
    }

    async fn update_project(&self, id: &str, project: &ProjectInput) -> Result<Project> {
        let url = self.resource_url(PROJECTS, id)?;
        let builder = self.authorized(self.http.put(url).json(project))?;
        self.execute(builder, &format!("PUT {PROJECTS}/{id}")).await
    }

    async fn delete_project(&self, id: &str) -> Result<DeleteResponse> {
        let label = format!("DELETE {PROJECTS}/{id}");
        let builder = self.authorized(self.http.delete(self.resource_url(PROJECTS, id)?))?;
        let body = self.execute_text(builder, &label).await?;
        if body.trim().is_empty() {
            return Ok(DeleteResponse::default());
        }
        serde_json::from_str(&body).with_context(|| format!("Failed to parse {} response", label))
    }

    async fn list_assignments(&self) -> Result<Vec<Assignment>> {
        self.get_json(ASSIGNMENTS).await
    }

    async fn get_assignment(&self, id: &str) -> Result<Assignment> {
        self.get_resource(ASSIGNMENTS, id).await
    }

    async fn create_assignment(&self, assignment: &AssignmentInput) -> Result<Assignment> {
        let builder = self.authorized(self.http.post(self.url(ASSIGNMENTS)).json(assignment))?;
        self.execute(builder, "POST /assignments").await
    }
}

fn normalize_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post, put};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::credentials::MemoryCredentials;

    const VALID_TOKEN: &str = "tok-1";

    #[derive(Clone, Default)]
    struct Recorder {
        auth_headers: Arc<Mutex<Vec<(String, Option<String>)>>>,
        bodies: Arc<Mutex<Vec<Value>>>,
    }

    impl Recorder {
        fn record(&self, route: &str, headers: &HeaderMap) {
            let auth = headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            self.auth_headers
                .lock()
                .unwrap()
                .push((route.to_string(), auth));
        }

        fn headers_for(&self, route: &str) -> Vec<Option<String>> {
            self.auth_headers
                .lock()
                .unwrap()
                .iter()
                .filter(|(r, _)| r == route)
                .map(|(_, auth)| auth.clone())
                .collect()
        }
    }

    fn user_json() -> Value {
        json!({
            "_id": "e1",
            "email": "ada@example.com",
            "name": "Ada",
            "role": "engineer",
            "maxCapacity": 80
        })
    }

    fn project_json(id: &str, name: &str) -> Value {
        json!({"_id": id, "name": name, "status": "planning"})
    }

    async fn login(
        State(recorder): State<Recorder>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        recorder.record("login", &headers);
        if body["password"] == "secret" {
            Json(json!({"token": VALID_TOKEN, "user": user_json()})).into_response()
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Invalid credentials"})),
            )
                .into_response()
        }
    }

    async fn profile(State(recorder): State<Recorder>, headers: HeaderMap) -> Response {
        recorder.record("profile", &headers);
        let expected = format!("Bearer {VALID_TOKEN}");
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some(value) if value == expected => Json(user_json()).into_response(),
            _ => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Token is not valid"})),
            )
                .into_response(),
        }
    }

    async fn list_projects(State(recorder): State<Recorder>, headers: HeaderMap) -> Json<Value> {
        recorder.record("projects", &headers);
        Json(json!([project_json("p1", "Billing"), project_json("p2", "Search")]))
    }

    async fn create_project(
        State(recorder): State<Recorder>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        recorder.record("create_project", &headers);
        recorder.bodies.lock().unwrap().push(body.clone());
        let name = body["name"].as_str().unwrap_or("unnamed").to_string();
        Json(project_json("p9", &name))
    }

    async fn update_project(
        Path(id): Path<String>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let mut project = project_json(&id, "Billing");
        if let Some(status) = body.get("status") {
            project["status"] = status.clone();
        }
        Json(project)
    }

    async fn get_project(Path(id): Path<String>) -> Json<Value> {
        Json(project_json(&id, "Echo"))
    }

    async fn delete_project(Path(id): Path<String>) -> Response {
        if id == "silent" {
            StatusCode::NO_CONTENT.into_response()
        } else {
            Json(json!({"message": "Project deleted"})).into_response()
        }
    }

    async fn broken_assignments() -> &'static str {
        "<html>Internal Server Error</html>"
    }

    async fn spawn_backend(recorder: Recorder) -> String {
        let api = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/profile", get(profile))
            .route("/projects", get(list_projects).post(create_project))
            .route(
                "/projects/:id",
                get(get_project).put(update_project).delete(delete_project),
            )
            .route("/assignments", get(broken_assignments))
            .with_state(recorder);
        let app = Router::new().nest("/api", api);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/")
    }

    #[tokio::test]
    async fn login_returns_token_without_bearer_header() {
        let recorder = Recorder::default();
        let base = spawn_backend(recorder.clone()).await;
        let gateway = HttpGateway::new(base, Arc::new(MemoryCredentials::with_token("stale")));

        let response = gateway
            .login(&LoginRequest::new("ada@example.com", "secret"))
            .await
            .unwrap();

        assert_eq!(response.token(), Some(VALID_TOKEN));
        assert_eq!(response.user.unwrap().id, "e1");
        assert_eq!(recorder.headers_for("login"), vec![None]);
    }

    #[tokio::test]
    async fn rejected_login_body_is_passed_through() {
        let base = spawn_backend(Recorder::default()).await;
        let gateway = HttpGateway::new(base, Arc::new(MemoryCredentials::new()));

        let response = gateway
            .login(&LoginRequest::new("ada@example.com", "wrong"))
            .await
            .unwrap();

        assert!(response.token().is_none());
        assert_eq!(response.message.as_deref(), Some("Invalid credentials"));
    }

    #[tokio::test]
    async fn reads_attach_stored_bearer_token() {
        let recorder = Recorder::default();
        let base = spawn_backend(recorder.clone()).await;
        let credentials = Arc::new(MemoryCredentials::with_token(VALID_TOKEN));
        let gateway = HttpGateway::new(base, credentials.clone());

        let projects = gateway.list_projects().await.unwrap();
        assert_eq!(projects.len(), 2);

        credentials.set("rotated").unwrap();
        gateway.list_projects().await.unwrap();

        assert_eq!(
            recorder.headers_for("projects"),
            vec![
                Some(format!("Bearer {VALID_TOKEN}")),
                Some("Bearer rotated".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn profile_with_invalid_token_fails_to_decode() {
        let base = spawn_backend(Recorder::default()).await;
        let gateway = HttpGateway::new(base, Arc::new(MemoryCredentials::with_token("expired")));

        let err = gateway.profile().await.unwrap_err();
        assert!(err.to_string().contains("GET /auth/profile"));
    }

    #[tokio::test]
    async fn writes_serialize_payload() {
        let recorder = Recorder::default();
        let base = spawn_backend(recorder.clone()).await;
        let gateway = HttpGateway::new(base, Arc::new(MemoryCredentials::with_token(VALID_TOKEN)));

        let input = ProjectInput {
            name: Some("Payments".into()),
            team_size: Some(2),
            ..Default::default()
        };
        let created = gateway.create_project(&input).await.unwrap();

        assert_eq!(created.name, "Payments");
        assert_eq!(
            recorder.bodies.lock().unwrap().as_slice(),
            &[json!({"name": "Payments", "teamSize": 2})]
        );
        assert_eq!(
            recorder.headers_for("create_project"),
            vec![Some(format!("Bearer {VALID_TOKEN}"))]
        );
    }

    #[tokio::test]
    async fn update_and_delete_project() {
        let base = spawn_backend(Recorder::default()).await;
        let gateway = HttpGateway::new(base, Arc::new(MemoryCredentials::with_token(VALID_TOKEN)));

        let input = ProjectInput {
            status: Some(core_model::ProjectStatus::Completed),
            ..Default::default()
        };
        let updated = gateway.update_project("p1", &input).await.unwrap();
        assert_eq!(updated.status, core_model::ProjectStatus::Completed);

        let deleted = gateway.delete_project("p1").await.unwrap();
        assert_eq!(deleted.message.as_deref(), Some("Project deleted"));

        let silent = gateway.delete_project("silent").await.unwrap();
        assert_eq!(silent, DeleteResponse::default());
    }

    #[tokio::test]
    async fn non_json_body_is_a_parse_failure() {
        let base = spawn_backend(Recorder::default()).await;
        let gateway = HttpGateway::new(base, Arc::new(MemoryCredentials::with_token(VALID_TOKEN)));

        let err = gateway.list_assignments().await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse GET /assignments"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_failure() {
        let gateway = HttpGateway::new(
            "http://127.0.0.1:1/api",
            Arc::new(MemoryCredentials::with_token(VALID_TOKEN)),
        );
        let err = gateway.list_users().await.unwrap_err();
        assert!(err.to_string().contains("Failed to send GET /users"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let gateway = HttpGateway::new(
            "http://localhost:5000/api/",
            Arc::new(MemoryCredentials::new()),
        );
        assert_eq!(gateway.api_base(), "http://localhost:5000/api");
        assert_eq!(gateway.url(PROJECTS), "http://localhost:5000/api/projects");
    }

    #[test]
    fn resource_ids_stay_in_one_segment() {
        let gateway = HttpGateway::new(DEFAULT_API_BASE, Arc::new(MemoryCredentials::new()));
        let url = gateway.resource_url(PROJECTS, "a/b?c#d").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/projects/a%2Fb%3Fc%23d");
    }

    #[tokio::test]
    async fn ids_with_reserved_characters_reach_the_right_route() {
        let base = spawn_backend(Recorder::default()).await;
        let gateway = HttpGateway::new(base, Arc::new(MemoryCredentials::with_token(VALID_TOKEN)));

        let project = gateway.get_project("p1/../users?x=1").await.unwrap();
        assert_eq!(project.id, "p1/../users?x=1");
        assert_eq!(project.name, "Echo");
    }
}
