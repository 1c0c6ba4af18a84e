use std::fmt;

/// Error type for remote store operations.
///
/// Variants are kept distinct so callers can tell an expired credential
/// from a server that broke its response contract.
#[derive(Debug)]
pub enum StoreError {
    /// Credential rejected (401/403, or login refused)
    Auth(String),
    /// Transport failure or 5xx from the server
    Remote(String),
    /// Response missing expected fields; carries the raw body
    Protocol { message: String, raw: String },
    /// Any other non-success status
    Rejected { status: u16, body: String },
    /// HTTP client could not be built
    Config(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Auth(msg) => write!(f, "authentication failed: {msg}"),
            StoreError::Remote(msg) => write!(f, "remote error: {msg}"),
            StoreError::Protocol { message, raw } => {
                write!(f, "protocol error: {message} (response: {})", truncate(raw, 512))
            }
            StoreError::Rejected { status, body } => {
                write!(f, "request rejected (HTTP {status}): {}", truncate(body, 512))
            }
            StoreError::Config(msg) => write!(f, "client configuration error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl StoreError {
    pub(crate) fn protocol(message: impl Into<String>, raw: impl Into<String>) -> Self {
        StoreError::Protocol { message: message.into(), raw: raw.into() }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
