use std::borrow::Cow;

use serde::Serialize;
use validator::ValidationError;

pub const MIN_LENGTH: usize = 8;

fn long_enough(p: &str) -> bool {
    p.chars().count() >= MIN_LENGTH
}

fn has_uppercase(p: &str) -> bool {
    p.chars().any(|c| c.is_ascii_uppercase())
}

fn has_lowercase(p: &str) -> bool {
    p.chars().any(|c| c.is_ascii_lowercase())
}

fn has_digit(p: &str) -> bool {
    p.chars().any(|c| c.is_ascii_digit())
}

/// Rule checks in display order, each with the message shown when it fails.
const RULES: &[(fn(&str) -> bool, &str)] = &[
    (long_enough, "Password must be at least 8 characters"),
    (has_uppercase, "Password must contain at least one uppercase letter"),
    (has_lowercase, "Password must contain at least one lowercase letter"),
    (has_digit, "Password must contain at least one number"),
];

/// Messages for every rule `password` breaks.
pub fn violations(password: &str) -> Vec<&'static str> {
    RULES
        .iter()
        .filter(|(check, _)| !check(password))
        .map(|(_, message)| *message)
        .collect()
}

/// `validator` hook; reports the first broken rule.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    match violations(password).first().copied() {
        None => Ok(()),
        Some(message) => Err(ValidationError::new("password").with_message(Cow::Borrowed(message))),
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct PasswordStrength {
    pub length: bool,
    pub uppercase: bool,
    pub lowercase: bool,
    pub number: bool,
    pub special: bool,
}

impl PasswordStrength {
    pub fn of(password: &str) -> Self {
        Self {
            length: long_enough(password),
            uppercase: has_uppercase(password),
            lowercase: has_lowercase(password),
            number: has_digit(password),
            special: password.chars().any(|c| !c.is_ascii_alphanumeric()),
        }
    }

    /// Number of satisfied checks, 0 to 5.
    pub fn score(&self) -> u8 {
        [self.length, self.uppercase, self.lowercase, self.number, self.special]
            .into_iter()
            .filter(|ok| *ok)
            .count() as u8
    }

    pub fn label(&self) -> &'static str {
        match self.score() {
            0..=2 => "weak",
            3..=4 => "medium",
            _ => "strong",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_each_missing_rule() {
        assert_eq!(violations("Abc12"), vec!["Password must be at least 8 characters"]);
        assert_eq!(
            violations("abcdefg1"),
            vec!["Password must contain at least one uppercase letter"]
        );
        assert_eq!(
            violations("ABCDEFG1"),
            vec!["Password must contain at least one lowercase letter"]
        );
        assert_eq!(violations("Abcdefgh"), vec!["Password must contain at least one number"]);
        assert!(violations("Abcdef12").is_empty());
        assert!(validate_password("Abcdef12").is_ok());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn strength_score() {
        assert_eq!(PasswordStrength::of("").score(), 0);
        assert_eq!(PasswordStrength::of("abc").score(), 1);
        assert_eq!(PasswordStrength::of("Abcdef12").score(), 4);
        assert_eq!(PasswordStrength::of("Abcdef12!").score(), 5);
        assert_eq!(PasswordStrength::of("Abcdef12!").label(), "strong");
        assert_eq!(PasswordStrength::of("ab").label(), "weak");
    }
}
