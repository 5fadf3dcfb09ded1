pub mod access;
pub mod assignment;
pub mod capacity;
pub mod identity;
pub mod project;
pub mod session;

pub use core_types::{ProjectStatus, Role, Seniority};

pub use assignment::{Assignment, AssignmentInput};
pub use identity::{Identity, UserInput};
pub use project::{Project, ProjectInput};
pub use session::Session;
