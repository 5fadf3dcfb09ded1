use std::fmt;

use core_model::{Assignment, Identity, Project, Session};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated,
}

/// Everything the view layer renders from. Replaced piecewise through the
/// store's single write path and observed via `SessionStore::subscribe`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub phase: SessionPhase,
    pub session: Option<Session>,
    pub users: Vec<Identity>,
    pub projects: Vec<Project>,
    pub assignments: Vec<Assignment>,
    pub loading: bool,
    /// User-visible message from the last rejected login.
    pub error: Option<String>,
    /// Bumped by login, session restoration and logout. Fetches started under
    /// an older generation are discarded when they resolve.
    pub(crate) epoch: u64,
}

impl StoreState {
    pub fn current_user(&self) -> Option<&Identity> {
        self.session.as_ref().map(|session| &session.identity)
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated && self.session.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Projects,
    Assignments,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Users => "users",
            Collection::Projects => "projects",
            Collection::Assignments => "assignments",
        };
        f.write_str(name)
    }
}

/// Result of refreshing one cached collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionSync {
    /// Replaced with this many items.
    Fresh(usize),
    /// Fetch failed; the previous snapshot was kept.
    Stale(String),
    /// Fetched this many items but kept the previous snapshot because another
    /// collection in the same batch failed.
    Withheld(usize),
    /// Fetch resolved after the session changed and was not applied.
    Discarded,
}

impl CollectionSync {
    pub fn is_fresh(&self) -> bool {
        matches!(self, CollectionSync::Fresh(_))
    }

    pub(crate) fn withheld(self) -> Self {
        match self {
            CollectionSync::Fresh(count) => CollectionSync::Withheld(count),
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub users: CollectionSync,
    pub projects: CollectionSync,
    pub assignments: CollectionSync,
}

impl SyncReport {
    pub fn all_fresh(&self) -> bool {
        self.users.is_fresh() && self.projects.is_fresh() && self.assignments.is_fresh()
    }

    pub(crate) fn discarded() -> Self {
        Self {
            users: CollectionSync::Discarded,
            projects: CollectionSync::Discarded,
            assignments: CollectionSync::Discarded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Session established. Collection failures inside the report do not
    /// make the login unsuccessful.
    Authenticated(SyncReport),
    Rejected { message: String },
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Authenticated(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck {
    Authenticated(SyncReport),
    NotAuthenticated,
}

impl SessionCheck {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionCheck::Authenticated(_))
    }
}
