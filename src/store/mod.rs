//! Session persistence boundary.
//!
//! Load-by-user-id and idempotent save-by-user-id over the serialized
//! session aggregate. Absence of a stored session or any load error is
//! handled by the caller (the manager falls back to a fresh session);
//! nothing here ever takes the engine down.

mod libsql_backend;
mod memory;

pub use libsql_backend::LibSqlStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::session::model::OnboardingSession;

/// Backend-agnostic session store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the stored session for a user, if any.
    async fn load(&self, user_id: &str) -> Result<Option<OnboardingSession>, StoreError>;

    /// Save a session snapshot, overwriting any prior one for the user.
    async fn save(&self, user_id: &str, session: &OnboardingSession) -> Result<(), StoreError>;
}
