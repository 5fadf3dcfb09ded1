mod actions;
mod selectors;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use state::{Collection, CollectionSync, LoginOutcome, SessionCheck, SessionPhase, StoreState, SyncReport};
pub use store::SessionStore;
