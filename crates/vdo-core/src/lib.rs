//! VDO Core - Workflow Orchestrator
//!
//! The top-level state machine for regulated validation-document
//! generation:
//!
//! - Sequences categorization, specialist coordination, document
//!   generation, and finalization
//! - Escalates every insufficiently confident or structurally invalid
//!   automated determination to a human reviewer; a low-confidence result
//!   is never silently accepted and never silently downgraded
//! - Writes every transition and decision through the tamper-evident audit
//!   log, and surfaces the audit entry range on the terminal outcome
//!
//! # Example
//!
//! ```rust,ignore
//! use vdo_core::{WorkflowConfig, WorkflowInput, WorkflowOrchestrator};
//!
//! # async fn example(reasoning: std::sync::Arc<dyn vdo_engine::ReasoningCapability>,
//! #                  retrieval: std::sync::Arc<dyn vdo_engine::ContextRetrieval>) {
//! let audit = std::sync::Arc::new(vdo_audit::AuditLog::in_memory());
//! let orchestrator = WorkflowOrchestrator::new(
//!     WorkflowConfig::new(),
//!     reasoning,
//!     retrieval,
//!     audit,
//! ).unwrap();
//!
//! let outcome = orchestrator.run(WorkflowInput::new("URS-042")).await;
//! println!("{:?}: {:?}", outcome.status, outcome.audit_entries);
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod config;
mod context;
mod error;
mod orchestrator;
mod state;

// Re-exports for convenience
pub use config::WorkflowConfig;
pub use context::SessionContext;
pub use error::WorkflowError;
pub use orchestrator::{
    FailureReport, WorkflowInput, WorkflowOrchestrator, WorkflowOutcome, WorkflowStatus,
};
pub use state::{allowed_transitions, validate_transition, IllegalTransition, WorkflowState};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving validation workflows
    pub use crate::{
        WorkflowConfig, WorkflowInput, WorkflowOrchestrator, WorkflowOutcome, WorkflowState,
        WorkflowStatus,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
