//! Credential policy checks.
//!
//! [`validate_password`] runs on every keystroke of a password field, so it
//! is pure and allocation-light. All rules are checked independently and
//! every violation is reported, in a fixed order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum password length, counted in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters that satisfy the special-character rule.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*()-_=+[]{}|;:'\",.<>/?";

/// A single unmet password rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleViolation {
    TooShort,
    MissingUppercase,
    MissingDigit,
    MissingSpecial,
}

impl RuleViolation {
    /// Every rule, in reporting order.
    pub const ALL: [RuleViolation; 4] = [
        RuleViolation::TooShort,
        RuleViolation::MissingUppercase,
        RuleViolation::MissingDigit,
        RuleViolation::MissingSpecial,
    ];

    /// The requirement text shown next to the password field.
    pub fn message(&self) -> &'static str {
        match self {
            RuleViolation::TooShort => "At least 8 characters",
            RuleViolation::MissingUppercase => "One uppercase letter",
            RuleViolation::MissingDigit => "One number",
            RuleViolation::MissingSpecial => "One special character",
        }
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Check a candidate password against the policy.
///
/// Returns the violated rules in [`RuleViolation::ALL`] order. An empty
/// result means the candidate is acceptable.
pub fn validate_password(candidate: &str) -> Vec<RuleViolation> {
    let mut violations = Vec::new();
    if candidate.chars().count() < MIN_PASSWORD_LENGTH {
        violations.push(RuleViolation::TooShort);
    }
    if !candidate.chars().any(|c| c.is_ascii_uppercase()) {
        violations.push(RuleViolation::MissingUppercase);
    }
    if !candidate.chars().any(|c| c.is_ascii_digit()) {
        violations.push(RuleViolation::MissingDigit);
    }
    if !candidate.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        violations.push(RuleViolation::MissingSpecial);
    }
    violations
}

/// Number of satisfied rules, from 0 to 4. Drives the strength meter.
pub fn password_strength(candidate: &str) -> usize {
    RuleViolation::ALL.len() - validate_password(candidate).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_digits_only() {
        assert_eq!(
            validate_password("abc12345"),
            vec![RuleViolation::MissingUppercase, RuleViolation::MissingSpecial]
        );
    }

    #[test]
    fn acceptable_password_has_no_violations() {
        assert!(validate_password("Abc123!@").is_empty());
    }

    #[test]
    fn empty_password_violates_everything_in_order() {
        assert_eq!(validate_password(""), RuleViolation::ALL.to_vec());
    }

    #[test]
    fn short_password_still_reports_other_rules() {
        assert_eq!(
            validate_password("a1"),
            vec![
                RuleViolation::TooShort,
                RuleViolation::MissingUppercase,
                RuleViolation::MissingSpecial,
            ]
        );
    }

    #[test]
    fn short_password_meeting_other_rules_reports_only_length() {
        assert_eq!(validate_password("A1!"), vec![RuleViolation::TooShort]);
    }

    #[test]
    fn non_ascii_uppercase_does_not_count() {
        let v = validate_password("ÉÉÉÉ1234!");
        assert_eq!(v, vec![RuleViolation::MissingUppercase]);
    }

    #[test]
    fn every_special_character_is_accepted() {
        for c in SPECIAL_CHARACTERS.chars() {
            let candidate = format!("Abcdefg1{}", c);
            assert!(
                validate_password(&candidate).is_empty(),
                "special character {:?} was rejected",
                c
            );
        }
    }

    #[test]
    fn whitespace_and_tilde_are_not_special() {
        assert_eq!(
            validate_password("Abcdefg1 ~"),
            vec![RuleViolation::MissingSpecial]
        );
    }

    #[test]
    fn empty_iff_all_rules_hold() {
        let samples = [
            "", "short", "Sh0rt!", "alllowercase1!", "ALLUPPER1!", "NoDigits!!",
            "NoSpecial12", "Valid#Pass1", "Abc123!@", "ÄÖÜäöü12!A",
        ];
        for p in samples {
            let expected = p.chars().count() >= 8
                && p.chars().any(|c| c.is_ascii_uppercase())
                && p.chars().any(|c| c.is_ascii_digit())
                && p.chars().any(|c| SPECIAL_CHARACTERS.contains(c));
            assert_eq!(validate_password(p).is_empty(), expected, "{:?}", p);
        }
    }

    #[test]
    fn messages_match_form_text() {
        let messages: Vec<&str> = RuleViolation::ALL.iter().map(|v| v.message()).collect();
        assert_eq!(
            messages,
            vec![
                "At least 8 characters",
                "One uppercase letter",
                "One number",
                "One special character"
            ]
        );
    }

    #[test]
    fn strength_counts_satisfied_rules() {
        assert_eq!(password_strength(""), 0);
        assert_eq!(password_strength("abc12345"), 2);
        assert_eq!(password_strength("Abc123!@"), 4);
    }
}
