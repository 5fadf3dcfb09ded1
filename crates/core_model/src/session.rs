use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// Authenticated identity and the bearer token issued for it. Held as a single
/// value so the two can never be set or cleared independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
    pub token: String,
}

impl Session {
    pub fn new(identity: Identity, token: impl Into<String>) -> Self {
        Self {
            identity,
            token: token.into(),
        }
    }
}
