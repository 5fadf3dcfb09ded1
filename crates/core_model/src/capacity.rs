//! Pure selectors over cached collections. Nothing here mutates state and
//! every result is recomputed from the slices it is given.

use std::collections::HashSet;

use core_types::Role;
use serde::Serialize;

use crate::assignment::Assignment;
use crate::identity::Identity;
use crate::project::Project;

/// How an engineer's summed allocation compares with their capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityLoad {
    Available,
    Full,
    Over,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacitySummary {
    pub engineer_id: String,
    pub max_capacity: u32,
    pub total_allocated: u32,
    /// Negative when the engineer is over-allocated.
    pub available: i64,
}

impl CapacitySummary {
    pub fn load(&self) -> CapacityLoad {
        match self.available {
            n if n > 0 => CapacityLoad::Available,
            0 => CapacityLoad::Full,
            _ => CapacityLoad::Over,
        }
    }

    pub fn is_over_allocated(&self) -> bool {
        self.load() == CapacityLoad::Over
    }
}

pub fn by_role(users: &[Identity], role: Role) -> impl Iterator<Item = &Identity> {
    users.iter().filter(move |user| user.role == role)
}

/// Assignments held by `engineer_id`, in cache order.
pub fn assignments_for<'a>(
    assignments: &'a [Assignment],
    engineer_id: &'a str,
) -> impl Iterator<Item = &'a Assignment> {
    assignments
        .iter()
        .filter(move |assignment| assignment.engineer_id == engineer_id)
}

/// Assignments for `engineer_id` whose project is still present in `projects`.
/// Assignments pointing at unknown projects are skipped, not treated as deleted.
pub fn active_assignments_for<'a>(
    assignments: &'a [Assignment],
    projects: &[Project],
    engineer_id: &'a str,
) -> Vec<&'a Assignment> {
    let known: HashSet<&str> = projects.iter().map(|p| p.id.as_str()).collect();
    assignments_for(assignments, engineer_id)
        .filter(|assignment| known.contains(assignment.project_id.as_str()))
        .collect()
}

/// Saturates at `u32::MAX`; allocation values come unchecked from the backend.
pub fn total_allocation<'a, I>(assignments: I) -> u32
where
    I: IntoIterator<Item = &'a Assignment>,
{
    assignments
        .into_iter()
        .map(|assignment| assignment.allocation_percentage)
        .fold(0u32, u32::saturating_add)
}

pub fn summarize<'a, I>(engineer: &Identity, assignments: I) -> CapacitySummary
where
    I: IntoIterator<Item = &'a Assignment>,
{
    let max_capacity = engineer.effective_capacity();
    let total_allocated = total_allocation(assignments);
    CapacitySummary {
        engineer_id: engineer.id.clone(),
        max_capacity,
        total_allocated,
        available: i64::from(max_capacity) - i64::from(total_allocated),
    }
}

/// Capacity of one engineer over every cached assignment that names them.
pub fn capacity_for(engineer: &Identity, assignments: &[Assignment]) -> CapacitySummary {
    summarize(engineer, assignments_for(assignments, &engineer.id))
}

/// One summary per engineer, in the order the engineers were cached.
pub fn team_overview(users: &[Identity], assignments: &[Assignment]) -> Vec<CapacitySummary> {
    by_role(users, Role::Engineer)
        .map(|engineer| capacity_for(engineer, assignments))
        .collect()
}
