//! User identity as issued by the external authentication provider.
//!
//! The backend never mints accounts; it trusts an identifier verified
//! upstream and stores it opaquely. Provider identifiers are not UUIDs
//! (e.g. `user_2abc...`), so validation is limited to shape checks.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted length for a provider-issued user identifier.
pub const USER_ID_MAX_LEN: usize = 128;

/// Validation errors returned by [`UserId::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Identifier was empty.
    #[error("user id must not be empty")]
    EmptyId,
    /// Identifier exceeded [`USER_ID_MAX_LEN`].
    #[error("user id must be at most {max} characters")]
    IdTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// Identifier contained whitespace or non-printable characters.
    #[error("user id may only contain printable ASCII without whitespace")]
    InvalidCharacters,
}

/// Stable, opaque user identifier.
///
/// # Examples
/// ```
/// use receipt_tracker::domain::UserId;
///
/// let id = UserId::new("user_2bXk9").expect("valid id");
/// assert_eq!(id.as_ref(), "user_2bXk9");
/// assert!(UserId::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a random identifier in the provider's `user_` format.
    pub fn random() -> Self {
        Self(format!("user_{}", Uuid::new_v4().simple()))
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.chars().count() > USER_ID_MAX_LEN {
            return Err(UserValidationError::IdTooLong {
                max: USER_ID_MAX_LEN,
            });
        }
        if !id.chars().all(|c| c.is_ascii_graphic()) {
            return Err(UserValidationError::InvalidCharacters);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::provider_format("user_2bXk9QwErTy")]
    #[case::uuid("3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    #[case::email_like("someone@example.com")]
    fn accepts_provider_identifiers(#[case] raw: &str) {
        let id = UserId::new(raw).expect("valid id");
        assert_eq!(id.to_string(), raw);
    }

    #[rstest]
    #[case::empty("", UserValidationError::EmptyId)]
    #[case::padded(" user_1", UserValidationError::InvalidCharacters)]
    #[case::inner_space("user 1", UserValidationError::InvalidCharacters)]
    #[case::non_ascii("usér", UserValidationError::InvalidCharacters)]
    fn rejects_malformed_identifiers(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(UserId::new(raw), Err(expected));
    }

    #[rstest]
    fn rejects_overlong_identifiers() {
        let raw = "u".repeat(USER_ID_MAX_LEN + 1);
        assert_eq!(
            UserId::new(raw),
            Err(UserValidationError::IdTooLong {
                max: USER_ID_MAX_LEN
            })
        );
    }

    #[rstest]
    fn random_ids_are_valid_and_distinct() {
        let first = UserId::random();
        let second = UserId::random();
        assert_ne!(first, second);
        assert!(UserId::new(first.as_ref()).is_ok());
    }

    #[rstest]
    fn deserialisation_validates_input() {
        let ok: Result<UserId, _> = serde_json::from_str("\"user_42\"");
        let bad: Result<UserId, _> = serde_json::from_str("\"\"");
        assert!(ok.is_ok());
        assert!(bad.is_err());
    }
}
