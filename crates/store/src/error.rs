use shotbridge_core::entity::{EntityId, EntityKind};

/// Errors from an [`EntityStore`](crate::EntityStore) implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The tracker could not be reached (network, DNS, TLS, timeout).
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The tracker refused the credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: EntityId },

    /// The tracker processed the request but refused an operation.
    #[error("Rejected by tracker: {0}")]
    Rejected(String),

    /// Non-2xx response other than an auth failure.
    #[error("Tracker API error ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The response body did not have the expected shape.
    #[error("Invalid tracker response: {0}")]
    Decode(String),

    #[error("Invalid tracker configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether the error means no further request can succeed in this
    /// session. Callers stop a batch instead of moving to the next shot.
    pub fn is_connection_level(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Unauthorized(_))
    }

    /// Map a non-2xx HTTP status and its body to an error variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized(body),
            _ => Self::Http { status, body },
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        match err.status() {
            Some(status) => Self::from_status(status.as_u16(), err.to_string()),
            None => Self::Connection(err.to_string()),
        }
    }
}
