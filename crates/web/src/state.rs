use std::sync::Arc;

use storage::{Backend, services::MarkPolicy};

/// Shared handler state: the storage backend and the grading policy.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub policy: MarkPolicy,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>, policy: MarkPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }
}
