//! Audit logging system for Tally
//!
//! Records all create, update, delete operations with before/after values
//! in an append-only audit log. This is the application's logging layer:
//! admin actions on the user directory and bulk repairs both leave a
//! trail here.
//!
//! The system consists of three components:
//!
//! - `AuditEntry`: a single log entry with timestamp, operation, entity
//!   information, and optional before/after values.
//! - `AuditLogger`: writes entries to the log file using a line-delimited
//!   JSON format (JSONL).
//! - `generate_diff`: creates human-readable diffs between entity states.

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
