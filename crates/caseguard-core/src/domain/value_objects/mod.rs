//! Value Objects module
//!
//! Immutable, validated domain primitives. Every constructor validates;
//! there are no setters and no unchecked constructors.

pub mod email;
pub mod password;
pub mod evidence_type;

pub use email::{Email, EmailError};
pub use password::{Password, PasswordError, PasswordStrength};
pub use evidence_type::{EvidenceType, EvidenceTypeError};
