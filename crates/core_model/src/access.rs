//! Role-gated route resolution for whatever renders the store.

use core_types::Role;
use serde::Serialize;

use crate::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Loading,
    Login,
    Manager,
    Engineer,
}

impl Route {
    pub fn home_for(role: Role) -> Self {
        match role {
            Role::Manager => Route::Manager,
            Role::Engineer => Route::Engineer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// A session operation is in flight; render nothing yet.
    Pending,
    Granted,
    RedirectLogin,
    Unauthorized,
}

/// Where an entry-point visit should land given the current session.
pub fn resolve_route(loading: bool, identity: Option<&Identity>) -> Route {
    if loading {
        return Route::Loading;
    }
    match identity {
        Some(identity) => Route::home_for(identity.role),
        None => Route::Login,
    }
}

pub fn authorize(loading: bool, identity: Option<&Identity>, allowed: &[Role]) -> Access {
    if loading {
        return Access::Pending;
    }
    match identity {
        None => Access::RedirectLogin,
        Some(identity) if allowed.contains(&identity.role) => Access::Granted,
        Some(_) => Access::Unauthorized,
    }
}
