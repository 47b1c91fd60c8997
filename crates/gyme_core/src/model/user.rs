//! User account model.
//!
//! # Responsibility
//! - Define the flat account record used by visibility and friendship rules.
//! - Validate user name shape before persistence.
//!
//! # Invariants
//! - `user_name` is unique across accounts (enforced by storage).
//! - Only `valid` accounts can be found or friended.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static USER_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]{3,32}$").expect("valid user name regex"));

/// Stable account identifier.
pub type UserId = Uuid;

/// Account record. Credentials live with the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    /// Private accounts expose exercises and workouts to friends only.
    pub private_account: bool,
    /// Account finished activation.
    pub valid: bool,
}

impl User {
    /// Creates a valid, public account with a generated id.
    pub fn new(
        user_name: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_name: user_name.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            private_account: false,
            valid: true,
        }
    }

    /// Validates persisted shape of the record.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if !USER_NAME_RE.is_match(&self.user_name) {
            return Err(UserValidationError::InvalidUserName(self.user_name.clone()));
        }
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(UserValidationError::BlankName);
        }
        Ok(())
    }
}

/// User record validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    InvalidUserName(String),
    BlankName,
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUserName(value) => write!(
                f,
                "user name `{value}` must be 3-32 characters of letters, digits, `_`, `.` or `-`"
            ),
            Self::BlankName => write!(f, "first and last name must not be blank"),
        }
    }
}

impl Error for UserValidationError {}

#[cfg(test)]
mod tests {
    use super::{User, UserValidationError};

    #[test]
    fn new_user_is_valid_and_public() {
        let user = User::new("lifter_01", "Ada", "Strong");
        assert!(user.valid);
        assert!(!user.private_account);
        user.validate().expect("well-formed user should validate");
    }

    #[test]
    fn rejects_short_or_symbolic_user_names() {
        for bad in ["ab", "with space", "semi;colon", ""] {
            let user = User::new(bad, "Ada", "Strong");
            assert!(matches!(
                user.validate(),
                Err(UserValidationError::InvalidUserName(_))
            ));
        }
    }

    #[test]
    fn rejects_blank_names() {
        let user = User::new("lifter", "  ", "Strong");
        assert_eq!(user.validate(), Err(UserValidationError::BlankName));
    }
}
