use async_trait::async_trait;
use thiserror::Error;
use todogenius_core::category::Category;
use todogenius_core::context::{ContextEntry, ContextFilter, CreateContext};
use todogenius_core::suggestion::Enhancement;
use todogenius_core::task::{Task, TaskFilter, TaskPayload};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),

    /// The request never produced a response (connection refused, timeout).
    #[error("server unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    /// Message to show the user: whatever the server said, or `fallback`
    /// when it said nothing usable.
    pub fn user_message(&self, fallback: &str) -> String {
        let msg = match self {
            ServiceError::NotFound(m) | ServiceError::InvalidInput(m) | ServiceError::Internal(m) => {
                m.trim()
            }
            ServiceError::Unavailable(_) => "",
        };
        if msg.is_empty() {
            fallback.to_string()
        } else {
            msg.to_string()
        }
    }
}

/// Abstraction over the TodoGenius REST API.
///
/// The TUI programs against this trait. `HttpService` talks to a running
/// server; `mock::MockService` (feature `test-helpers`) scripts responses
/// and records calls for tests.
#[async_trait]
pub trait TodoService: Send + Sync {
    // -- Tasks --
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ServiceError>;
    async fn create_task(&self, payload: &TaskPayload) -> Result<Task, ServiceError>;
    async fn update_task(&self, id: &str, payload: &TaskPayload) -> Result<Task, ServiceError>;
    async fn delete_task(&self, id: &str) -> Result<(), ServiceError>;

    // -- Categories --
    async fn list_categories(&self) -> Result<Vec<Category>, ServiceError>;

    // -- Context --
    async fn list_context(&self, filter: &ContextFilter) -> Result<Vec<ContextEntry>, ServiceError>;
    async fn create_context(&self, input: &CreateContext) -> Result<ContextEntry, ServiceError>;
    async fn delete_context(&self, id: &str) -> Result<(), ServiceError>;
    async fn mark_context_processed(&self, id: &str) -> Result<ContextEntry, ServiceError>;

    // -- AI --
    async fn enhance_task(&self, title: &str) -> Result<Enhancement, ServiceError>;
}
