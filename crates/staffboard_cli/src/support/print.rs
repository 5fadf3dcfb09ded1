use core_model::capacity::{CapacityLoad, CapacitySummary};
use core_model::assignment::DEFAULT_ASSIGNMENT_ROLE;
use core_model::{Assignment, Identity, Project};
use session_store::{CollectionSync, SessionCheck, SessionStore, SyncReport};

pub fn print_identity(user: &Identity) {
    println!("{} <{}>", user.name, user.email);
    println!("Role: {} | Id: {}", user.role, user.id);
    if let Some(department) = &user.department {
        println!("Department: {}", department);
    }
    if !user.skills().is_empty() {
        println!("Skills: {}", user.skills().join(", "));
    }
    if user.is_engineer() {
        println!("Capacity: {}%", user.effective_capacity());
    }
}

pub fn print_sync_report(report: &SyncReport) {
    for line in stale_lines(report) {
        eprintln!("{}", line);
    }
}

pub fn print_stale_collections(check: &SessionCheck) {
    if let SessionCheck::Authenticated(report) = check {
        print_sync_report(report);
    }
}

pub fn print_project(project: &Project) {
    let skills = project.required_skills();
    println!(
        "- {} [{}] {} (team size: {})",
        project.id,
        project.status,
        project.name,
        project
            .team_size
            .map(|size| size.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    if let Some(description) = &project.description {
        println!("  {}", description);
    }
    if !skills.is_empty() {
        println!("  needs: {}", skills.join(", "));
    }
}

pub fn print_manager_view(store: &SessionStore) {
    let state = store.snapshot();
    if let Some(user) = state.current_user() {
        println!("Manager dashboard for {}", user.name);
    }

    let overview = store.team_overview();
    if overview.is_empty() {
        println!("No engineers loaded.");
    } else {
        println!("\nTeam capacity:");
        for summary in &overview {
            let name = state
                .users
                .iter()
                .find(|user| user.id == summary.engineer_id)
                .map(|user| user.name.as_str())
                .unwrap_or(summary.engineer_id.as_str());
            println!("- {}", capacity_line(name, summary));
        }
    }

    println!("\nProjects ({}):", state.projects.len());
    for project in &state.projects {
        print_project(project);
    }

    println!("\nAssignments ({}):", state.assignments.len());
    for assignment in &state.assignments {
        println!("- {}", assignment_line(assignment, &state.projects));
    }
}

pub fn print_engineer_view(store: &SessionStore) {
    let Some(user) = store.current_user() else {
        return;
    };
    print_identity(&user);

    if let Some(summary) = store.capacity_for(&user.id) {
        println!("{}", capacity_line("Allocated", &summary));
    }

    let state = store.snapshot();
    let active = store.active_assignments(&user.id);
    if active.is_empty() {
        println!("\nNo active assignments.");
        return;
    }
    println!("\nActive assignments:");
    for assignment in &active {
        println!("- {}", assignment_line(assignment, &state.projects));
    }
}

fn stale_lines(report: &SyncReport) -> Vec<String> {
    [
        ("users", &report.users),
        ("projects", &report.projects),
        ("assignments", &report.assignments),
    ]
    .into_iter()
    .filter_map(|(name, sync)| match sync {
        CollectionSync::Stale(reason) => {
            Some(format!("warning: could not refresh {}: {}", name, reason))
        }
        CollectionSync::Withheld(_) => Some(format!(
            "warning: kept cached {} until every collection loads",
            name
        )),
        CollectionSync::Fresh(_) | CollectionSync::Discarded => None,
    })
    .collect()
}

fn capacity_line(label: &str, summary: &CapacitySummary) -> String {
    let marker = match summary.load() {
        CapacityLoad::Available => "",
        CapacityLoad::Full => " (full)",
        CapacityLoad::Over => " (over capacity)",
    };
    format!(
        "{}: {}% of {}%, {}% free{}",
        label, summary.total_allocated, summary.max_capacity, summary.available, marker
    )
}

fn assignment_line(assignment: &Assignment, projects: &[Project]) -> String {
    let project = projects
        .iter()
        .find(|project| project.id == assignment.project_id)
        .map(|project| project.name.as_str())
        .unwrap_or(assignment.project_id.as_str());
    format!(
        "{} on {} at {}% as {}",
        assignment.engineer_id,
        project,
        assignment.allocation_percentage,
        assignment.role.as_deref().unwrap_or(DEFAULT_ASSIGNMENT_ROLE)
    )
}
