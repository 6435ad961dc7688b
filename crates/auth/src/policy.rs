//! Password strength rules, checked before a secret is ever hashed.
use march_core::PASSWORD_MIN_LENGTH;

/// First rule a candidate password breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("password must be at least 6 characters long")]
    TooShort,
    #[error("password must contain at least one uppercase letter")]
    MissingUpper,
    #[error("password must contain at least one lowercase letter")]
    MissingLower,
    #[error("password must contain at least one digit")]
    MissingDigit,
}

/// Checks length, then upper, then lower, then digit.
/// Stops at the first failure so the reported violation is deterministic.
pub fn validate(password: &str) -> Result<(), PolicyViolation> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(PolicyViolation::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PolicyViolation::MissingUpper);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PolicyViolation::MissingLower);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PolicyViolation::MissingDigit);
    }
    Ok(())
}
