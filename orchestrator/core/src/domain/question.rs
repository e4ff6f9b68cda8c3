// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Question Validation
//!
//! A [`Question`] can only be obtained through [`Question::parse`], so holding
//! one proves the text passed every rule of the active [`ValidationPolicy`].
//!
//! Rules run in a fixed order and stop at the first violation:
//!
//! | # | Rule | Message |
//! |---|------|---------|
//! | 1 | not empty / whitespace-only | `empty question` |
//! | 2 | trimmed length >= `min_length` | `question too short` |
//! | 3 | trimmed length <= `max_length` | `question too long` |
//! | 4 | only word chars, whitespace and `. , ! ? - @ ( ) /` | `invalid characters` |
//! | 5 | no character repeated more than `max_repeat` times in a row | `excessive repetition` |
//! | 6 | no banned term (case-insensitive substring) | `inappropriate language` |
//!
//! Lengths are counted in characters, not bytes.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

pub const DEFAULT_MAX_LENGTH: usize = 500;
pub const DEFAULT_MAX_REPEAT: usize = 5;
pub const LENIENT_MIN_LENGTH: usize = 3;
pub const STRICT_MIN_LENGTH: usize = 10;

const STRICT_BANNED_TERMS: &[&str] = &[
    "fuck", "shit", "bitch", "bastard", "asshole", "cunt", "motherfucker",
];

fn disallowed_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\w\s.,!?\-@()/]").expect("static pattern compiles"))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("empty question")]
    Empty,

    #[error("question too short: {length} characters (minimum {min})")]
    TooShort { length: usize, min: usize },

    #[error("question too long: {length} characters (maximum {max})")]
    TooLong { length: usize, max: usize },

    #[error("invalid characters in question: {0:?}")]
    InvalidCharacters(String),

    #[error("excessive repetition of '{0}'")]
    ExcessiveRepetition(char),

    #[error("inappropriate language")]
    InappropriateLanguage,
}

/// Named rule sets. A deployment picks exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationProfile {
    /// 3-character minimum, no built-in banned terms
    #[default]
    Lenient,
    /// 10-character minimum, built-in banned-term list
    Strict,
}

impl std::str::FromStr for ValidationProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown validation profile '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub min_length: usize,
    pub max_length: usize,
    /// Longest allowed run of one character
    pub max_repeat: usize,
    /// Stored lowercase
    banned_terms: Vec<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::lenient()
    }
}

impl ValidationPolicy {
    pub fn lenient() -> Self {
        Self {
            min_length: LENIENT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
            max_repeat: DEFAULT_MAX_REPEAT,
            banned_terms: Vec::new(),
        }
    }

    pub fn strict() -> Self {
        Self {
            min_length: STRICT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
            max_repeat: DEFAULT_MAX_REPEAT,
            banned_terms: STRICT_BANNED_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn for_profile(profile: ValidationProfile) -> Self {
        match profile {
            ValidationProfile::Lenient => Self::lenient(),
            ValidationProfile::Strict => Self::strict(),
        }
    }

    /// Add banned terms; blanks are ignored and matching is case-insensitive.
    pub fn with_banned_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if !term.is_empty() && !self.banned_terms.contains(&term) {
                self.banned_terms.push(term);
            }
        }
        self
    }

    pub fn banned_terms(&self) -> &[String] {
        &self.banned_terms
    }

    pub fn validate(&self, raw: &str) -> Result<(), ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty);
        }

        let length = trimmed.chars().count();
        if length < self.min_length {
            return Err(ValidationError::TooShort {
                length,
                min: self.min_length,
            });
        }
        if length > self.max_length {
            return Err(ValidationError::TooLong {
                length,
                max: self.max_length,
            });
        }

        if let Some(found) = disallowed_chars().find(trimmed) {
            return Err(ValidationError::InvalidCharacters(found.as_str().to_string()));
        }

        if let Some(c) = first_excessive_run(trimmed, self.max_repeat) {
            return Err(ValidationError::ExcessiveRepetition(c));
        }

        if !self.banned_terms.is_empty() {
            let lowered = trimmed.to_lowercase();
            if self.banned_terms.iter().any(|term| lowered.contains(term.as_str())) {
                return Err(ValidationError::InappropriateLanguage);
            }
        }

        Ok(())
    }
}

/// First character whose consecutive run is longer than `max_repeat`.
fn first_excessive_run(text: &str, max_repeat: usize) -> Option<char> {
    let mut previous = None;
    let mut run = 0usize;
    for c in text.chars() {
        if Some(c) == previous {
            run += 1;
        } else {
            previous = Some(c);
            run = 1;
        }
        if run > max_repeat {
            return Some(c);
        }
    }
    None
}

/// A validated question (Value Object). Holds the trimmed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Question {
    content: String,
}

impl Question {
    pub fn parse(raw: &str, policy: &ValidationPolicy) -> Result<Self, ValidationError> {
        policy.validate(raw)?;
        Ok(Self {
            content: raw.trim().to_string(),
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.content)
    }
}

/// Free-function form of [`ValidationPolicy::validate`].
pub fn validate_question(raw: &str, policy: &ValidationPolicy) -> Result<(), ValidationError> {
    policy.validate(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_and_whitespace() {
        let policy = ValidationPolicy::lenient();
        assert_eq!(policy.validate(""), Err(ValidationError::Empty));
        assert_eq!(policy.validate("   \n\t "), Err(ValidationError::Empty));
    }

    #[test]
    fn test_length_bounds_lenient() {
        let policy = ValidationPolicy::lenient();
        assert!(matches!(
            policy.validate("hi"),
            Err(ValidationError::TooShort { length: 2, min: 3 })
        ));
        assert!(policy.validate("why").is_ok());
        // surrounding whitespace does not count
        assert!(matches!(
            policy.validate("   hi   "),
            Err(ValidationError::TooShort { .. })
        ));

        let at_limit = "ab ".repeat(166) + "ab";
        assert_eq!(at_limit.chars().count(), 500);
        assert!(policy.validate(&at_limit).is_ok());

        let over = format!("{}c", at_limit);
        assert!(matches!(
            policy.validate(&over),
            Err(ValidationError::TooLong { length: 501, max: 500 })
        ));
    }

    #[test]
    fn test_strict_profile_minimum() {
        let policy = ValidationPolicy::strict();
        assert!(matches!(
            policy.validate("Why rust"),
            Err(ValidationError::TooShort { min: 10, .. })
        ));
        assert!(policy.validate("Why is Rust fast?").is_ok());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let policy = ValidationPolicy::lenient();
        // three multi-byte word characters
        assert!(policy.validate("日本語").is_ok());
    }

    #[test]
    fn test_allows_ordinary_punctuation() {
        let policy = ValidationPolicy::strict();
        let question = "Hello, what (exactly) is needed - e.g. visa/passport @ border? Thanks!";
        assert!(policy.validate(question).is_ok());
    }

    #[test]
    fn test_rejects_disallowed_characters() {
        let policy = ValidationPolicy::lenient();
        for q in [
            "What is <script>?",
            "DROP TABLE users;",
            "rm -rf $HOME",
            "What's up",
            "a = b",
        ] {
            assert!(
                matches!(policy.validate(q), Err(ValidationError::InvalidCharacters(_))),
                "expected rejection for {q:?}"
            );
        }
    }

    #[test]
    fn test_repetition_threshold() {
        let policy = ValidationPolicy::lenient();
        assert!(policy.validate("Sooooo good").is_ok()); // five o's
        assert_eq!(
            policy.validate("Soooooo good"),
            Err(ValidationError::ExcessiveRepetition('o'))
        );
        assert_eq!(
            policy.validate("Why??????"),
            Err(ValidationError::ExcessiveRepetition('?'))
        );
    }

    #[test]
    fn test_banned_terms_case_insensitive() {
        let policy = ValidationPolicy::lenient().with_banned_terms(["Frobnicate", "  "]);
        assert_eq!(policy.banned_terms(), &["frobnicate".to_string()]);
        assert_eq!(
            policy.validate("How do I FROBNICATE a widget?"),
            Err(ValidationError::InappropriateLanguage)
        );
        assert!(ValidationPolicy::strict()
            .validate("What the shit is this?")
            .is_err());
    }

    #[test]
    fn test_rule_order_short_circuits() {
        // too short wins over invalid characters
        let policy = ValidationPolicy::strict();
        assert!(matches!(
            policy.validate("<<>>"),
            Err(ValidationError::TooShort { .. })
        ));
        // invalid characters win over banned terms
        assert!(matches!(
            policy.validate("shit; what now?"),
            Err(ValidationError::InvalidCharacters(_))
        ));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let policy = ValidationPolicy::lenient();
        for q in ["What visa do I need for Japan as a US citizen?", "hi", "aaaaaaa"] {
            assert_eq!(policy.validate(q), policy.validate(q));
        }
    }

    #[test]
    fn test_question_stores_trimmed_text() {
        let q = Question::parse("  What is Rust?  ", &ValidationPolicy::lenient()).unwrap();
        assert_eq!(q.content(), "What is Rust?");
        assert_eq!(q.to_string(), "What is Rust?");
        assert_eq!(validate_question("ok?", &ValidationPolicy::lenient()), Ok(()));
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!("STRICT".parse::<ValidationProfile>().unwrap(), ValidationProfile::Strict);
        assert_eq!(
            ValidationPolicy::for_profile(ValidationProfile::Lenient),
            ValidationPolicy::default()
        );
        assert!("paranoid".parse::<ValidationProfile>().is_err());
    }
}
