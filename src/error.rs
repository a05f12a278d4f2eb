//! Error Types
//!
//! Errors raised by the relay core and its remote collaborators.

use thiserror::Error;

/// Result alias used across the relay.
pub type Result<T> = std::result::Result<T, BuddyError>;

/// Which remote collaborator an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remote {
    Completion,
    Speech,
}

impl std::fmt::Display for Remote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Remote::Completion => "completion",
            Remote::Speech => "speech",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum BuddyError {
    /// Network or HTTP failure against a remote service
    #[error("{remote} transport error: {message}")]
    Transport { remote: Remote, message: String },

    /// Invalid or expired credential
    #[error("{remote} authorization failed: {message}")]
    Auth { remote: Remote, message: String },

    /// User sent a message without any text
    #[error("message has no text")]
    EmptyInput,

    /// Speech service answered with zero bytes
    #[error("speech service returned empty audio")]
    EmptyAudio,

    /// Delivery to the user channel failed
    #[error("channel delivery failed: {0}")]
    Channel(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Stable short codes, used as a structured log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Transport,
    Auth,
    EmptyInput,
    EmptyAudio,
    Channel,
    Config,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Transport => "transport",
            ErrorCode::Auth => "auth",
            ErrorCode::EmptyInput => "empty_input",
            ErrorCode::EmptyAudio => "empty_audio",
            ErrorCode::Channel => "channel",
            ErrorCode::Config => "config",
        }
    }
}

impl BuddyError {
    pub fn transport(remote: Remote, message: impl Into<String>) -> Self {
        BuddyError::Transport {
            remote,
            message: message.into(),
        }
    }

    pub fn auth(remote: Remote, message: impl Into<String>) -> Self {
        BuddyError::Auth {
            remote,
            message: message.into(),
        }
    }

    /// Map a non-success HTTP status into the matching error.
    /// 401 and 403 mean the credential was rejected.
    pub fn from_status(remote: Remote, status: reqwest::StatusCode, body: &str) -> Self {
        let message = format!("HTTP {}: {}", status, body);
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            Self::auth(remote, message)
        } else {
            Self::transport(remote, message)
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            BuddyError::Transport { .. } => ErrorCode::Transport,
            BuddyError::Auth { .. } => ErrorCode::Auth,
            BuddyError::EmptyInput => ErrorCode::EmptyInput,
            BuddyError::EmptyAudio => ErrorCode::EmptyAudio,
            BuddyError::Channel(_) => ErrorCode::Channel,
            BuddyError::Config(_) => ErrorCode::Config,
        }
    }

    /// Transport failures and empty audio are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BuddyError::Transport { .. } | BuddyError::EmptyAudio)
    }
}

#[cfg(feature = "telegram")]
impl From<teloxide::RequestError> for BuddyError {
    fn from(err: teloxide::RequestError) -> Self {
        BuddyError::Channel(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_status_maps_to_auth() {
        let err = BuddyError::from_status(
            Remote::Completion,
            reqwest::StatusCode::UNAUTHORIZED,
            "bad key",
        );
        assert_eq!(err.code(), ErrorCode::Auth);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_server_error_maps_to_transport() {
        let err = BuddyError::from_status(
            Remote::Speech,
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "",
        );
        assert_eq!(err.code(), ErrorCode::Transport);
        assert!(err.is_retryable());
        assert!(err.to_string().starts_with("speech transport error"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(BuddyError::EmptyInput.code().as_str(), "empty_input");
        assert_eq!(BuddyError::EmptyAudio.code().as_str(), "empty_audio");
        assert!(BuddyError::EmptyAudio.is_retryable());
        assert!(!BuddyError::Channel("x".into()).is_retryable());
    }
}
