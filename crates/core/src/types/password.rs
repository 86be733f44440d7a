//! Client-side password policy.
//!
//! This check only gives early feedback in registration forms. The API is
//! the authority on which passwords it accepts.

use core::fmt;

use thiserror::Error;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters that satisfy the symbol rule.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";

/// One requirement of the password policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordRule {
    MinLength,
    Uppercase,
    Lowercase,
    Digit,
    Symbol,
}

impl PasswordRule {
    /// Every rule, in the order they are shown to the user.
    pub const ALL: [Self; 5] = [
        Self::MinLength,
        Self::Uppercase,
        Self::Lowercase,
        Self::Digit,
        Self::Symbol,
    ];

    /// Whether `password` satisfies this rule.
    #[must_use]
    pub fn is_met(self, password: &str) -> bool {
        match self {
            Self::MinLength => password.chars().count() >= MIN_PASSWORD_LENGTH,
            Self::Uppercase => password.chars().any(|c| c.is_ascii_uppercase()),
            Self::Lowercase => password.chars().any(|c| c.is_ascii_lowercase()),
            Self::Digit => password.chars().any(|c| c.is_ascii_digit()),
            Self::Symbol => password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)),
        }
    }

    /// Checklist label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MinLength => "At least 8 characters",
            Self::Uppercase => "Contains uppercase letter",
            Self::Lowercase => "Contains lowercase letter",
            Self::Digit => "Contains a number",
            Self::Symbol => "Contains special character (!@#$%^&*)",
        }
    }
}

impl fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A password failed one or more policy rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Password does not meet requirements: {}", format_rules(.unmet))]
pub struct PasswordPolicyError {
    /// Rules the password does not satisfy, in display order.
    pub unmet: Vec<PasswordRule>,
}

fn format_rules(rules: &[PasswordRule]) -> String {
    rules
        .iter()
        .map(|rule| rule.label().to_lowercase())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rules `password` does not meet, in display order.
#[must_use]
pub fn unmet_rules(password: &str) -> Vec<PasswordRule> {
    PasswordRule::ALL
        .into_iter()
        .filter(|rule| !rule.is_met(password))
        .collect()
}

/// Check a password against the policy.
///
/// # Errors
///
/// Returns [`PasswordPolicyError`] listing every unmet rule.
pub fn validate_password(password: &str) -> Result<(), PasswordPolicyError> {
    let unmet = unmet_rules(password);
    if unmet.is_empty() {
        Ok(())
    } else {
        Err(PasswordPolicyError { unmet })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_password_passes() {
        assert!(validate_password("Abcdef1!").is_ok());
    }

    #[test]
    fn test_short_password_fails_every_missing_rule() {
        let err = validate_password("abc").unwrap_err();
        assert_eq!(
            err.unmet,
            vec![
                PasswordRule::MinLength,
                PasswordRule::Uppercase,
                PasswordRule::Digit,
                PasswordRule::Symbol,
            ]
        );
        assert!(err.to_string().starts_with("Password does not meet requirements"));
    }

    #[test]
    fn test_symbol_set() {
        assert!(PasswordRule::Symbol.is_met("a\"b"));
        assert!(PasswordRule::Symbol.is_met("pipe|"));
        assert!(!PasswordRule::Symbol.is_met("under_score-dash"));
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(PasswordRule::MinLength.is_met("ééééééé1"));
        assert!(!PasswordRule::MinLength.is_met("Abc1!"));
    }
}
