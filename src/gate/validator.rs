use super::verdict::DenialReason;
use crate::error::GateError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Longest accepted display name, in Unicode code points
pub const MAX_NAME_CHARS: usize = 16;

static ALLOWED_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9 _-]+$").unwrap()
});

/// A trimmed display name that passed the syntactic checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateName {
    pub raw: String,
    pub normalized: String,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid(CandidateName),
    Denied(DenialReason),
}

/// Syntactic checks and case folding
///
/// Empty input is a caller fault rather than a denial. Length is checked
/// before the character set, so an overlong name with bad characters reports
/// `too_long`.
pub fn validate(raw: &str) -> Result<Validation, GateError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GateError::EmptyInput);
    }

    let length = trimmed.chars().count();
    if length > MAX_NAME_CHARS {
        return Ok(Validation::Denied(DenialReason::TooLong));
    }

    if !ALLOWED_CHARSET.is_match(trimmed) {
        return Ok(Validation::Denied(DenialReason::InvalidChars));
    }

    // Charset is ASCII-only at this point, so the fold is locale independent
    Ok(Validation::Valid(CandidateName {
        raw: trimmed.to_string(),
        normalized: trimmed.to_ascii_lowercase(),
        length,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(raw: &str) -> CandidateName {
        match validate(raw) {
            Ok(Validation::Valid(name)) => name,
            other => panic!("expected {raw:?} to validate, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_and_whitespace_are_faults() {
        assert_eq!(validate(""), Err(GateError::EmptyInput));
        assert_eq!(validate("   \t\n"), Err(GateError::EmptyInput));
    }

    #[test]
    fn test_trims_and_normalizes() {
        let name = valid("  Night_Owl-42 ");
        assert_eq!(name.raw, "Night_Owl-42");
        assert_eq!(name.normalized, "night_owl-42");
        assert_eq!(name.length, 12);
    }

    #[test]
    fn test_length_limit_is_inclusive() {
        assert_eq!(valid("abcdefghijklmnop").length, 16);
        assert_eq!(
            validate("abcdefghijklmnopq"),
            Ok(Validation::Denied(DenialReason::TooLong))
        );
    }

    #[test]
    fn test_length_counts_code_points() {
        // 16 code points but more bytes: fails the charset, not the length
        let name = "éééééééééééééééé";
        assert_eq!(name.chars().count(), 16);
        assert_eq!(
            validate(name),
            Ok(Validation::Denied(DenialReason::InvalidChars))
        );

        let name = "ééééééééééééééééé";
        assert_eq!(validate(name), Ok(Validation::Denied(DenialReason::TooLong)));
    }

    #[test]
    fn test_invalid_chars() {
        for raw in ["bad$char", "f.u.c.k", "tab\there", "emoji🙂", "ümlaut", "a/b"] {
            assert_eq!(
                validate(raw),
                Ok(Validation::Denied(DenialReason::InvalidChars)),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn test_allowed_charset() {
        for raw in ["Alice", "bob_99", "night owl", "x-y_z 0"] {
            valid(raw);
        }
    }
}
