//! Form checks run before anything is sent to the server.

use crate::api::models::DEFAULT_TARGET_AGE;
use crate::error::ClientError;
use std::fmt;
use std::ops::RangeInclusive;

pub const TARGET_AGE_RANGE: RangeInclusive<u8> = 3..=12;
pub const MIN_REGISTRATION_PASSWORD: usize = 4;
pub const MIN_NEW_PASSWORD: usize = 6;

fn invalid(message: &str) -> ClientError {
    ClientError::Validation(message.to_string())
}

pub fn validate_theme(theme: &str) -> Result<(), ClientError> {
    if theme.trim().is_empty() {
        return Err(invalid("Please write a theme for the story."));
    }
    Ok(())
}

/// Empty input means the default age.
pub fn parse_target_age(raw: Option<&str>) -> Result<u8, ClientError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(DEFAULT_TARGET_AGE);
    };

    let age: u8 = raw
        .parse()
        .map_err(|_| ClientError::Validation(format!("Target age must be a number, got '{}'", raw)))?;
    validate_target_age(age)?;
    Ok(age)
}

pub fn validate_target_age(age: u8) -> Result<(), ClientError> {
    if !TARGET_AGE_RANGE.contains(&age) {
        return Err(ClientError::Validation(format!(
            "Target age must be between {} and {}",
            TARGET_AGE_RANGE.start(),
            TARGET_AGE_RANGE.end()
        )));
    }
    Ok(())
}

pub fn validate_registration(username: &str, password: &str, confirm: &str) -> Result<(), ClientError> {
    if username.trim().is_empty() {
        return Err(invalid("Username is required"));
    }
    if password != confirm {
        return Err(invalid("Passwords do not match"));
    }
    if password.chars().count() < MIN_REGISTRATION_PASSWORD {
        return Err(ClientError::Validation(format!(
            "Password must be at least {} characters",
            MIN_REGISTRATION_PASSWORD
        )));
    }
    Ok(())
}

pub fn validate_password_reset(new_password: &str, confirm: &str) -> Result<(), ClientError> {
    if new_password != confirm {
        return Err(invalid("Passwords do not match"));
    }
    if new_password.chars().count() < MIN_NEW_PASSWORD {
        return Err(ClientError::Validation(format!(
            "Password must be at least {} characters",
            MIN_NEW_PASSWORD
        )));
    }
    Ok(())
}

pub fn validate_password_change(current: &str, new_password: &str, confirm: &str) -> Result<(), ClientError> {
    validate_password_reset(new_password, confirm)?;
    if current == new_password {
        return Err(invalid("The new password must differ from the current one"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

impl PasswordStrength {
    pub fn of(password: &str) -> Self {
        match password.chars().count() {
            n if n >= 12 => PasswordStrength::Strong,
            n if n >= 8 => PasswordStrength::Medium,
            _ => PasswordStrength::Weak,
        }
    }
}

impl fmt::Display for PasswordStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordStrength::Weak => write!(f, "weak"),
            PasswordStrength::Medium => write!(f, "medium"),
            PasswordStrength::Strong => write!(f, "strong"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_must_not_be_blank() {
        assert!(validate_theme("   ").is_err());
        assert!(validate_theme("").is_err());
        assert!(validate_theme("a lighthouse keeper").is_ok());
    }

    #[test]
    fn test_target_age() {
        assert_eq!(parse_target_age(None).unwrap(), 6);
        assert_eq!(parse_target_age(Some("  ")).unwrap(), 6);
        assert_eq!(parse_target_age(Some("12")).unwrap(), 12);
        assert!(parse_target_age(Some("2")).is_err());
        assert!(parse_target_age(Some("13")).is_err());
        assert!(parse_target_age(Some("six")).is_err());
    }

    #[test]
    fn test_registration_rules() {
        assert!(validate_registration("ana", "abcd", "abcd").is_ok());
        assert!(validate_registration("ana", "abc", "abc").is_err());
        assert!(validate_registration("ana", "abcd", "abce").is_err());
        assert!(validate_registration(" ", "abcd", "abcd").is_err());
    }

    #[test]
    fn test_password_change_rules() {
        assert!(validate_password_change("old-pass", "new-pass", "new-pass").is_ok());
        assert!(validate_password_change("same-pass", "same-pass", "same-pass").is_err());
        assert!(validate_password_change("old-pass", "short", "short").is_err());
        assert!(validate_password_reset("longenough", "different").is_err());
    }

    #[test]
    fn test_password_strength() {
        assert_eq!(PasswordStrength::of("abc"), PasswordStrength::Weak);
        assert_eq!(PasswordStrength::of("abcdefgh"), PasswordStrength::Medium);
        assert_eq!(PasswordStrength::of("abcdefghijkl"), PasswordStrength::Strong);
    }
}
