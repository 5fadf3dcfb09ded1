use core_model::access::{self, Access, Route};
use core_model::capacity::{self, CapacitySummary};
use core_model::{Assignment, Identity, Role};

use crate::store::SessionStore;

// Derived views. Recomputed from the current snapshot on every call.
impl SessionStore {
    pub fn current_user(&self) -> Option<Identity> {
        self.state.borrow().current_user().cloned()
    }

    pub fn engineers(&self) -> Vec<Identity> {
        self.users_with_role(Role::Engineer)
    }

    pub fn managers(&self) -> Vec<Identity> {
        self.users_with_role(Role::Manager)
    }

    fn users_with_role(&self, role: Role) -> Vec<Identity> {
        let state = self.state.borrow();
        capacity::by_role(&state.users, role).cloned().collect()
    }

    pub fn user_assignments(&self, user_id: &str) -> Vec<Assignment> {
        let state = self.state.borrow();
        capacity::assignments_for(&state.assignments, user_id)
            .cloned()
            .collect()
    }

    /// Assignments for `user_id` whose project is still cached.
    pub fn active_assignments(&self, user_id: &str) -> Vec<Assignment> {
        let state = self.state.borrow();
        capacity::active_assignments_for(&state.assignments, &state.projects, user_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Capacity of a cached user, falling back to the signed-in identity when
    /// the user list has not been loaded.
    pub fn capacity_for(&self, engineer_id: &str) -> Option<CapacitySummary> {
        let state = self.state.borrow();
        let engineer = state
            .users
            .iter()
            .find(|user| user.id == engineer_id)
            .or_else(|| state.current_user().filter(|user| user.id == engineer_id))?;
        Some(capacity::capacity_for(engineer, &state.assignments))
    }

    pub fn team_overview(&self) -> Vec<CapacitySummary> {
        let state = self.state.borrow();
        capacity::team_overview(&state.users, &state.assignments)
    }

    pub fn current_route(&self) -> Route {
        let state = self.state.borrow();
        access::resolve_route(state.loading, state.current_user())
    }

    pub fn authorize(&self, allowed: &[Role]) -> Access {
        let state = self.state.borrow();
        access::authorize(state.loading, state.current_user(), allowed)
    }
}
