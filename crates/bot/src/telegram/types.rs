//! Handler types and dependencies

use std::sync::Arc;

use farmconnect_core::storage::db::DbPool;

use crate::telegram::onboarding::OnboardingStore;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub onboarding: OnboardingStore,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(db_pool: Arc<DbPool>, onboarding: OnboardingStore) -> Self {
        Self { db_pool, onboarding }
    }
}
