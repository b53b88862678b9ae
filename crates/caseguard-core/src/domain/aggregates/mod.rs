//! Aggregates module
//!
//! Users, cases and evidence: the aggregates audit events attach to.

pub mod user;
pub mod case;
pub mod evidence;

pub use user::{Session, User};
pub use case::{Case, CaseChanges, CaseStatus};
pub use evidence::{Evidence, NewEvidence};
