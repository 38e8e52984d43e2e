#[derive(Clone, Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("backend error: {0}")]
    Backend(String),
}
