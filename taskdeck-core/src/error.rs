use crate::mutation::TransitionError;
use crate::validation::ValidationErrors;

/// Failure talking to the REST API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RemoteError::Status { status: 401, .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::Status { status: 404, .. })
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            RemoteError::Status {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            RemoteError::Transport(e.to_string())
        }
    }
}

/// Failure persisting or loading the login session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session data: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to load data: {0}")]
    Fetch(#[source] RemoteError),

    #[error("Failed to save changes: {0}")]
    Mutation(#[source] RemoteError),

    #[error("Login failed: {0}")]
    Login(#[source] RemoteError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Not logged in")]
    NotAuthenticated,
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
