//! VDO Audit Log
//!
//! Append-only, tamper-evident event trail for workflow sessions.
//!
//! # Contract
//!
//! - [`AuditLog::append`] never fails silently: a sink failure is surfaced
//!   as [`AuditError::SinkUnavailable`], because an un-auditable execution
//!   is not regulatory-compliant.
//! - There is no update or delete operation in the public contract.
//! - Concurrent writers are serialized through a single mutex-guarded
//!   writer path; every entry carries a strictly increasing sequence number
//!   assigned inside that critical section, so causally dependent entries
//!   can never be observed out of sequence order.
//! - Entries chain SHA-256 hashes ([`AuditEntry::prev_hash`] /
//!   [`AuditEntry::hash`]); [`AuditLog::verify_chain`] recomputes the chain.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod entry;
mod log;
mod sink;

pub use entry::{compute_hash, AuditEntry, AuditEventType, GENESIS_HASH};
pub use log::{verify_entries, AuditError, AuditLog, AuditReceipt};
pub use sink::{AuditSink, JsonlSink, MemorySink, SinkError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
