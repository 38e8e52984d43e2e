/// Typed error hierarchy for payment-provider calls.
/// Every variant is caught at the tool boundary and converted to a
/// structured error payload; nothing here crosses the HTTP layer.
#[derive(Clone, Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("card declined: {0}")]
    Card(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("provider error: {0}")]
    Api(String),
    #[error("network error: {0}")]
    Network(String),
}

impl PaymentError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "authentication",
            Self::Card(_) => "card",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Api(_) => "api",
            Self::Network(_) => "network",
        }
    }

    /// Classify a provider error body by its reported type, falling back
    /// to the HTTP status.
    pub fn from_api_error(status: u16, error_type: Option<&str>, message: String) -> Self {
        match error_type {
            Some("card_error") => Self::Card(message),
            Some("authentication_error") => Self::Authentication(message),
            Some("invalid_request_error") => Self::InvalidRequest(message),
            _ => match status {
                401 | 403 => Self::Authentication(message),
                400 => Self::InvalidRequest(message),
                _ => Self::Api(message),
            },
        }
    }
}
