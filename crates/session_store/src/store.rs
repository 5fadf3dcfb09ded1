use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use core_model::access::Route;
use core_model::{Identity, Session};
use gateway_client::{BackendGateway, CredentialStorage, LoginRequest};

use crate::state::{
    Collection, CollectionSync, LoginOutcome, SessionCheck, SessionPhase, StoreState, SyncReport,
};

const LOGIN_FAILED: &str = "Login failed";

/// Process-wide session and collection cache. Construct one per client and
/// share it behind an `Arc`; every mutation goes through the watch sender so
/// writes are serialised and subscribers see each patch.
pub struct SessionStore {
    pub(crate) gateway: Arc<dyn BackendGateway>,
    credentials: Arc<dyn CredentialStorage>,
    pub(crate) state: watch::Sender<StoreState>,
    navigation: watch::Sender<Option<Route>>,
}

impl SessionStore {
    pub fn new(gateway: Arc<dyn BackendGateway>, credentials: Arc<dyn CredentialStorage>) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        let (navigation, _) = watch::channel(None);
        Self {
            gateway,
            credentials,
            state,
            navigation,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// Receives a route each time the store asks the view layer to navigate.
    pub fn navigation(&self) -> watch::Receiver<Option<Route>> {
        self.navigation.subscribe()
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        let request = LoginRequest::new(email.trim(), password.trim());
        let epoch = self.begin_session_change(|state| {
            state.loading = true;
            state.error = None;
        });

        let response = match self.gateway.login(&request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "login request failed");
                return self.reject_login(epoch, LOGIN_FAILED.to_string());
            }
        };

        let (token, user) = match (response.token(), response.user.clone()) {
            (Some(token), Some(user)) => (token.to_string(), user),
            _ => {
                let message = response
                    .message
                    .clone()
                    .unwrap_or_else(|| LOGIN_FAILED.to_string());
                info!(email = %request.email, "login rejected");
                return self.reject_login(epoch, message);
            }
        };

        match self.commit_session(epoch, user, token) {
            Ok(true) => {}
            Ok(false) => {
                debug!("login superseded before it completed");
                return LoginOutcome::Rejected {
                    message: LOGIN_FAILED.to_string(),
                };
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed to persist bearer token");
                return self.reject_login(epoch, LOGIN_FAILED.to_string());
            }
        }

        info!(email = %request.email, "login succeeded");
        LoginOutcome::Authenticated(self.sync_collections(epoch).await)
    }

    /// Drops the session, the persisted token and every cached collection.
    /// Safe to call when already signed out.
    pub fn logout(&self) {
        self.state.send_modify(|state| {
            self.clear_persisted_token();
            state.epoch += 1;
            state.phase = SessionPhase::Anonymous;
            state.session = None;
            state.loading = false;
            state.users.clear();
            state.projects.clear();
            state.assignments.clear();
        });
        self.navigation.send_replace(Some(Route::Login));
    }

    /// Restores a session from the persisted token, if there is one.
    pub async fn check_auth(&self) -> SessionCheck {
        let token = match self.credentials.get() {
            Ok(Some(token)) => token,
            Ok(None) => return SessionCheck::NotAuthenticated,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed to read stored bearer token");
                return SessionCheck::NotAuthenticated;
            }
        };

        let epoch = self.begin_session_change(|state| state.loading = true);

        match self.gateway.profile().await {
            Ok(identity) => {
                let applied = self.apply_if_current(epoch, |state| {
                    state.session = Some(Session::new(identity, token));
                    state.phase = SessionPhase::Authenticated;
                    state.loading = false;
                });
                if !applied {
                    return SessionCheck::NotAuthenticated;
                }
                SessionCheck::Authenticated(self.sync_collections(epoch).await)
            }
            Err(err) => {
                debug!(error = %format!("{err:#}"), "stored session could not be restored");
                self.apply_if_current(epoch, |state| {
                    self.clear_persisted_token();
                    state.session = None;
                    state.phase = SessionPhase::Anonymous;
                    state.loading = false;
                });
                SessionCheck::NotAuthenticated
            }
        }
    }

    pub async fn fetch_users(&self) -> CollectionSync {
        let epoch = self.begin_fetch();
        let result = self.gateway.list_users().await;
        self.finish_fetch(epoch, Collection::Users, result, |state, users| {
            state.users = users
        })
    }

    pub async fn fetch_projects(&self) -> CollectionSync {
        let epoch = self.begin_fetch();
        let result = self.gateway.list_projects().await;
        self.finish_fetch(epoch, Collection::Projects, result, |state, projects| {
            state.projects = projects
        })
    }

    pub async fn fetch_assignments(&self) -> CollectionSync {
        let epoch = self.begin_fetch();
        let result = self.gateway.list_assignments().await;
        self.finish_fetch(epoch, Collection::Assignments, result, |state, assignments| {
            state.assignments = assignments
        })
    }

    /// Fetches all three collections concurrently and applies them as one
    /// patch only if every fetch succeeded. Otherwise all three keep their
    /// previous snapshot.
    async fn sync_collections(&self, epoch: u64) -> SyncReport {
        let (users, projects, assignments) = tokio::join!(
            self.gateway.list_users(),
            self.gateway.list_projects(),
            self.gateway.list_assignments()
        );
        let (users_sync, users) = settle(Collection::Users, users);
        let (projects_sync, projects) = settle(Collection::Projects, projects);
        let (assignments_sync, assignments) = settle(Collection::Assignments, assignments);

        let Some((users, projects, assignments)) = complete_batch(users, projects, assignments)
        else {
            if self.state.borrow().epoch != epoch {
                return SyncReport::discarded();
            }
            warn!("collection batch incomplete, keeping previous snapshots");
            return SyncReport {
                users: users_sync.withheld(),
                projects: projects_sync.withheld(),
                assignments: assignments_sync.withheld(),
            };
        };

        let applied = self.apply_if_current(epoch, |state| {
            state.users = users;
            state.projects = projects;
            state.assignments = assignments;
        });
        if !applied {
            debug!("discarding collection sync for superseded session");
            return SyncReport::discarded();
        }
        SyncReport {
            users: users_sync,
            projects: projects_sync,
            assignments: assignments_sync,
        }
    }

    /// Persists `token` and installs the session in the same state write, so
    /// a newer login or logout can never interleave between the two. Returns
    /// `Ok(false)` without touching storage when `epoch` was superseded.
    fn commit_session(&self, epoch: u64, identity: Identity, token: String) -> Result<bool> {
        let mut persisted = Ok(());
        let applied = self.apply_if_current(epoch, |state| {
            persisted = self.credentials.set(&token);
            if persisted.is_ok() {
                state.session = Some(Session::new(identity, token));
                state.phase = SessionPhase::Authenticated;
                state.loading = false;
            }
        });
        persisted.map(|()| applied)
    }

    fn begin_session_change(&self, prepare: impl FnOnce(&mut StoreState)) -> u64 {
        let mut epoch = 0;
        self.state.send_modify(|state| {
            state.epoch += 1;
            epoch = state.epoch;
            state.phase = SessionPhase::Authenticating;
            state.session = None;
            prepare(state);
        });
        epoch
    }

    fn reject_login(&self, epoch: u64, message: String) -> LoginOutcome {
        self.apply_if_current(epoch, |state| {
            self.clear_persisted_token();
            state.phase = SessionPhase::Anonymous;
            state.session = None;
            state.loading = false;
            state.error = Some(message.clone());
        });
        LoginOutcome::Rejected { message }
    }

    /// Runs `patch` only if no login, restoration or logout started since
    /// `epoch` was taken. Returns whether the patch was applied.
    pub(crate) fn apply_if_current(&self, epoch: u64, patch: impl FnOnce(&mut StoreState)) -> bool {
        self.state.send_if_modified(|state| {
            if state.epoch != epoch {
                return false;
            }
            patch(state);
            true
        })
    }

    fn begin_fetch(&self) -> u64 {
        let mut epoch = 0;
        self.state.send_modify(|state| {
            state.loading = true;
            epoch = state.epoch;
        });
        epoch
    }

    fn finish_fetch<T>(
        &self,
        epoch: u64,
        collection: Collection,
        result: Result<Vec<T>>,
        replace: impl FnOnce(&mut StoreState, Vec<T>),
    ) -> CollectionSync {
        let (sync, items) = settle(collection, result);
        let mut outcome = sync;
        self.state.send_modify(|state| {
            state.loading = false;
            if let Some(items) = items {
                if state.epoch == epoch {
                    replace(state, items);
                } else {
                    debug!(%collection, "discarding fetch for superseded session");
                    outcome = CollectionSync::Discarded;
                }
            }
        });
        outcome
    }

    fn clear_persisted_token(&self) {
        if let Err(err) = self.credentials.clear() {
            warn!(error = %format!("{err:#}"), "failed to clear stored bearer token");
        }
    }
}

fn complete_batch<U, P, A>(
    users: Option<U>,
    projects: Option<P>,
    assignments: Option<A>,
) -> Option<(U, P, A)> {
    Some((users?, projects?, assignments?))
}

fn settle<T>(collection: Collection, result: Result<Vec<T>>) -> (CollectionSync, Option<Vec<T>>) {
    match result {
        Ok(items) => (CollectionSync::Fresh(items.len()), Some(items)),
        Err(err) => {
            warn!(%collection, error = %format!("{err:#}"), "failed to fetch collection");
            (CollectionSync::Stale(format!("{err:#}")), None)
        }
    }
}
