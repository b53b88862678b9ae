//! Password Value Object
//!
//! A plaintext credential that satisfied the strength policy at construction.
//!
//! # Invariants
//! - Length 12..=128 characters
//! - At least one lowercase, uppercase, digit and special character
//! - No known weak substring, no 3-character ascending sequence
//!   (`abc`, `123`), no character repeated 3+ times in a row
//!
//! The plain value never appears in `Debug` or `Display` output.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const MIN_PASSWORD_LENGTH: usize = 12;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Representation used wherever a password would otherwise be rendered
pub const REDACTED: &str = "[REDACTED]";

/// Substrings rejected regardless of case
const WEAK_SUBSTRINGS: &[&str] = &[
    "password",
    "passw0rd",
    "qwerty",
    "asdfgh",
    "zxcvbn",
    "letmein",
    "welcome",
    "admin",
    "login",
    "iloveyou",
    "monkey",
    "dragon",
    "master",
    "sunshine",
    "football",
    "baseball",
    "trustno1",
    "changeme",
    "secret",
];

static WEAK_MATCHER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostFirst)
        .build(WEAK_SUBSTRINGS)
        .expect("Failed to build Aho-Corasick")
});

/// Password value object
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Create a password, enforcing the full policy
    pub fn new(value: impl Into<String>) -> Result<Self, PasswordError> {
        let value = value.into();
        let length = value.chars().count();

        if length == 0 {
            return Err(PasswordError::Empty);
        }
        if length < MIN_PASSWORD_LENGTH {
            return Err(PasswordError::TooShort(length));
        }
        if length > MAX_PASSWORD_LENGTH {
            return Err(PasswordError::TooLong(length));
        }

        let classes = CharClasses::of(&value);
        if classes.lowercase == 0 {
            return Err(PasswordError::MissingLowercase);
        }
        if classes.uppercase == 0 {
            return Err(PasswordError::MissingUppercase);
        }
        if classes.digits == 0 {
            return Err(PasswordError::MissingDigit);
        }
        if classes.special == 0 {
            return Err(PasswordError::MissingSpecial);
        }

        if let Some(m) = WEAK_MATCHER.find(&value) {
            return Err(PasswordError::WeakPattern(
                WEAK_SUBSTRINGS[m.pattern().as_usize()].to_string(),
            ));
        }

        if let Some(run) = find_sequence(&value) {
            return Err(PasswordError::Sequence(run));
        }

        if let Some(c) = find_repeat(&value) {
            return Err(PasswordError::RepeatedCharacters(c));
        }

        Ok(Self(value))
    }

    /// Plain value, for handing to a hasher only
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Always false; an accepted password has at least 12 characters
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Advisory strength classification.
    ///
    /// Never a substitute for the construction-time policy.
    pub fn strength(&self) -> PasswordStrength {
        let classes = CharClasses::of(&self.0);
        let unique = self.0.chars().collect::<HashSet<_>>().len();

        let length_points = ((self.len() - MIN_PASSWORD_LENGTH) / 4).min(3);
        let unique_points = match unique {
            0..=7 => 0,
            8..=11 => 1,
            12..=15 => 2,
            _ => 3,
        };
        let diversity_points = [classes.lowercase, classes.uppercase, classes.digits, classes.special]
            .iter()
            .filter(|&&count| count >= 2)
            .count()
            .min(2);

        match length_points + unique_points + diversity_points {
            0..=2 => PasswordStrength::Weak,
            3..=4 => PasswordStrength::Medium,
            5..=6 => PasswordStrength::Strong,
            _ => PasswordStrength::VeryStrong,
        }
    }

    /// Hash with Argon2id and a random salt, PHC string format
    pub fn hash(&self) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(self.0.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hashing(e.to_string()))
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Password").field(&REDACTED).finish()
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl TryFrom<String> for Password {
    type Error = PasswordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Advisory strength levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

impl PasswordStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Medium => "medium",
            Self::Strong => "strong",
            Self::VeryStrong => "very_strong",
        }
    }
}

impl fmt::Display for PasswordStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("password cannot be empty")]
    Empty,

    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters, got {0}")]
    TooShort(usize),

    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters, got {0}")]
    TooLong(usize),

    #[error("password must contain at least one lowercase letter")]
    MissingLowercase,

    #[error("password must contain at least one uppercase letter")]
    MissingUppercase,

    #[error("password must contain at least one digit")]
    MissingDigit,

    #[error("password must contain at least one special character")]
    MissingSpecial,

    #[error("password contains a common weak pattern: {0}")]
    WeakPattern(String),

    #[error("password contains a sequential run: {0}")]
    Sequence(String),

    #[error("password repeats '{0}' three or more times in a row")]
    RepeatedCharacters(char),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

#[derive(Default)]
struct CharClasses {
    lowercase: usize,
    uppercase: usize,
    digits: usize,
    special: usize,
}

impl CharClasses {
    fn of(value: &str) -> Self {
        let mut classes = Self::default();
        for c in value.chars() {
            if c.is_lowercase() {
                classes.lowercase += 1;
            } else if c.is_uppercase() {
                classes.uppercase += 1;
            } else if c.is_ascii_digit() {
                classes.digits += 1;
            } else if !c.is_alphanumeric() && !c.is_whitespace() {
                classes.special += 1;
            }
        }
        classes
    }
}

/// First run of three ascending ASCII letters or digits, case-insensitive
fn find_sequence(value: &str) -> Option<String> {
    let chars: Vec<char> = value.chars().map(|c| c.to_ascii_lowercase()).collect();
    chars.windows(3).find_map(|w| {
        let same_kind = w.iter().all(|c| c.is_ascii_digit()) || w.iter().all(|c| c.is_ascii_lowercase());
        let ascending = (w[1] as u32) == (w[0] as u32) + 1 && (w[2] as u32) == (w[1] as u32) + 1;
        (same_kind && ascending).then(|| w.iter().collect())
    })
}

fn find_repeat(value: &str) -> Option<char> {
    let chars: Vec<char> = value.chars().collect();
    chars
        .windows(3)
        .find(|w| w[0] == w[1] && w[1] == w[2])
        .map(|w| w[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const GOOD: &str = "Tr0ub4dor&Zx";

    #[test]
    fn test_accepts_policy_compliant_password() {
        let password = Password::new(GOOD).unwrap();
        assert_eq!(password.len(), 12);
        assert_eq!(password.expose_secret(), GOOD);
    }

    #[test]
    fn test_length_bounds() {
        assert_eq!(Password::new(""), Err(PasswordError::Empty));
        assert_eq!(Password::new("Tr0ub4dor&Z"), Err(PasswordError::TooShort(11)));

        let long = format!("{}{}", GOOD, "xQ7!".repeat(30));
        assert_eq!(Password::new(long), Err(PasswordError::TooLong(132)));
    }

    #[test]
    fn test_character_classes() {
        assert_eq!(Password::new("TR0UB4DOR&ZX"), Err(PasswordError::MissingLowercase));
        assert_eq!(Password::new("tr0ub4dor&zx"), Err(PasswordError::MissingUppercase));
        assert_eq!(Password::new("TroubIdor&Zx"), Err(PasswordError::MissingDigit));
        assert_eq!(Password::new("Tr0ub4dorQZx"), Err(PasswordError::MissingSpecial));
    }

    #[test]
    fn test_weak_patterns() {
        assert_eq!(
            Password::new("MyPassWord#94"),
            Err(PasswordError::WeakPattern("password".into()))
        );
        assert!(matches!(Password::new("Qwerty#9Zk!w"), Err(PasswordError::WeakPattern(_))));
    }

    #[test]
    fn test_sequences() {
        assert_eq!(Password::new("Zk!w9A123mq#"), Err(PasswordError::Sequence("123".into())));
        assert_eq!(Password::new("Zk!w9AbCmq#4"), Err(PasswordError::Sequence("abc".into())));
    }

    #[test]
    fn test_repeated_characters() {
        assert_eq!(
            Password::new("Tr0ub4dor&Zxxx"),
            Err(PasswordError::RepeatedCharacters('x'))
        );
    }

    #[test]
    fn test_redacted_representation() {
        let password = Password::new(GOOD).unwrap();
        assert_eq!(password.to_string(), REDACTED);
        assert!(!format!("{password:?}").contains(GOOD));
    }

    #[test]
    fn test_strength_is_advisory() {
        assert_eq!(Password::new("Aa1!Aa1!Aa1!").unwrap().strength(), PasswordStrength::Weak);
        assert_eq!(Password::new(GOOD).unwrap().strength(), PasswordStrength::Medium);
        assert_eq!(
            Password::new("Vk7#mQ2!pL9@wZ4$").unwrap().strength(),
            PasswordStrength::Strong
        );
        assert_eq!(
            Password::new("Vk7#mQ2!pL9@wZ4$hN6%jR8^").unwrap().strength(),
            PasswordStrength::VeryStrong
        );
        assert_eq!(PasswordStrength::VeryStrong.as_str(), "very_strong");
    }

    #[test]
    fn test_hash_is_phc_and_not_plaintext() {
        let password = Password::new(GOOD).unwrap();
        let hash = password.hash().unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains(GOOD));
    }

    proptest! {
        #[test]
        fn accepted_passwords_satisfy_policy(candidate in "[a-zA-Z0-9!@#$%^&*]{0,40}") {
            if let Ok(password) = Password::new(candidate.clone()) {
                let len = candidate.chars().count();
                prop_assert!((MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&len));
                prop_assert!(candidate.chars().any(|c| c.is_ascii_lowercase()));
                prop_assert!(candidate.chars().any(|c| c.is_ascii_uppercase()));
                prop_assert!(candidate.chars().any(|c| c.is_ascii_digit()));
                prop_assert!(candidate.chars().any(|c| !c.is_ascii_alphanumeric()));
                let chars: Vec<char> = candidate.chars().collect();
                prop_assert!(!chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2]));
                prop_assert_eq!(password.len(), len);
            }
        }
    }
}
