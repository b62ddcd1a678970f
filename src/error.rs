//! Failure taxonomy shared by every service.
//!
//! Each service error keeps its own context-rich variants but can be
//! collapsed to an [`ErrorKind`] so the request layer can branch on it
//! without matching nested enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Distinguishable failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A referenced task, user or balance does not exist.
    NotFound,
    /// The caller may not perform the requested operation.
    NotEnoughPermission,
    /// The operation is illegal from the entity's current state.
    InvalidState,
    /// The sender's balance cannot cover the transfer.
    InsufficientFunds,
    /// The input failed validation.
    Validation,
    /// The operation collides with existing data.
    Conflict,
    /// The underlying persistence layer failed.
    Storage,
}

impl ErrorKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::NotEnoughPermission => "not_enough_permission",
            Self::InvalidState => "invalid_state",
            Self::InsufficientFunds => "insufficient_funds",
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::Storage => "storage",
        }
    }

    /// Returns `true` when the failure was caused by the request itself.
    #[must_use]
    pub const fn is_client_error(self) -> bool {
        !matches!(self, Self::Storage)
    }

    /// Returns `true` when repeating the whole operation may succeed.
    ///
    /// Only storage failures qualify: store operations either commit fully
    /// or roll back, so a retry never doubles an effect.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Storage)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can be classified into an [`ErrorKind`].
pub trait Classify {
    /// Returns the failure category of this error.
    fn kind(&self) -> ErrorKind;
}
