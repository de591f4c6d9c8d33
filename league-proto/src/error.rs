//! Application error taxonomy
//!
//! Errors that cross the wire are carried as data with a stable short code,
//! never as panics. Transport failures (E001/E009) are the retryable tier;
//! the rest are surfaced immediately.

use serde::{Deserialize, Serialize};

use crate::rpc::RpcError;

/// Stable short codes from the league protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "E001")]
    Timeout,
    #[serde(rename = "E003")]
    MissingRequiredField,
    #[serde(rename = "E004")]
    InvalidParityChoice,
    #[serde(rename = "E005")]
    PlayerNotRegistered,
    #[serde(rename = "E009")]
    ConnectionError,
    #[serde(rename = "E011")]
    AuthTokenMissing,
    #[serde(rename = "E012")]
    AuthTokenInvalid,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Timeout => "E001",
            ErrorCode::MissingRequiredField => "E003",
            ErrorCode::InvalidParityChoice => "E004",
            ErrorCode::PlayerNotRegistered => "E005",
            ErrorCode::ConnectionError => "E009",
            ErrorCode::AuthTokenMissing => "E011",
            ErrorCode::AuthTokenInvalid => "E012",
        }
    }
}

/// Errors raised by league agents and the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum LeagueError {
    #[error("E001: request timed out after {0:.1}s")]
    Timeout(f64),

    #[error("E003: missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("E004: invalid parity choice: {0}")]
    InvalidParityChoice(String),

    #[error("E005: player not registered: {0}")]
    PlayerNotRegistered(String),

    #[error("E009: connection failed: {0}")]
    Connection(String),

    #[error("E011: auth token missing")]
    AuthTokenMissing,

    #[error("E012: auth token invalid")]
    AuthTokenInvalid,

    #[error("rpc error {}: {}", .0.code, .0.message)]
    Rpc(RpcError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LeagueError {
    /// Stable code for errors in the protocol taxonomy.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            LeagueError::Timeout(_) => Some(ErrorCode::Timeout),
            LeagueError::MissingRequiredField(_) => Some(ErrorCode::MissingRequiredField),
            LeagueError::InvalidParityChoice(_) => Some(ErrorCode::InvalidParityChoice),
            LeagueError::PlayerNotRegistered(_) => Some(ErrorCode::PlayerNotRegistered),
            LeagueError::Connection(_) => Some(ErrorCode::ConnectionError),
            LeagueError::AuthTokenMissing => Some(ErrorCode::AuthTokenMissing),
            LeagueError::AuthTokenInvalid => Some(ErrorCode::AuthTokenInvalid),
            LeagueError::Rpc(_) | LeagueError::Serialization(_) => None,
        }
    }

    /// Transport-transient errors are the only retryable tier.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LeagueError::Timeout(_) | LeagueError::Connection(_))
    }

    /// JSON-RPC error object with the E-code attached as data.
    pub fn to_rpc_error(&self) -> RpcError {
        RpcError {
            code: crate::rpc::INVALID_PARAMS,
            message: self.to_string(),
            data: self
                .code()
                .map(|c| serde_json::json!({"error_code": c.as_str()})),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ErrorCode::Timeout.as_str(), "E001");
        assert_eq!(ErrorCode::MissingRequiredField.as_str(), "E003");
        assert_eq!(ErrorCode::InvalidParityChoice.as_str(), "E004");
        assert_eq!(ErrorCode::PlayerNotRegistered.as_str(), "E005");
        assert_eq!(ErrorCode::ConnectionError.as_str(), "E009");
        assert_eq!(ErrorCode::AuthTokenMissing.as_str(), "E011");
        assert_eq!(ErrorCode::AuthTokenInvalid.as_str(), "E012");
    }

    #[test]
    fn test_retryable_tiers() {
        assert!(LeagueError::Timeout(10.0).is_retryable());
        assert!(LeagueError::Connection("refused".into()).is_retryable());
        assert!(!LeagueError::InvalidParityChoice("prime".into()).is_retryable());
        assert!(!LeagueError::AuthTokenInvalid.is_retryable());
    }

    #[test]
    fn test_display_carries_code() {
        let err = LeagueError::Connection("refused".into());
        assert!(err.to_string().starts_with("E009"));
        assert_eq!(err.code(), Some(ErrorCode::ConnectionError));
    }

    #[test]
    fn test_rpc_error_carries_code_as_data() {
        let rpc = LeagueError::AuthTokenMissing.to_rpc_error();
        assert_eq!(rpc.code, crate::rpc::INVALID_PARAMS);
        assert_eq!(rpc.data.unwrap()["error_code"], "E011");
    }
}
