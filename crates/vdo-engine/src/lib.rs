//! VDO Engine
//!
//! The workflow's working parts, beneath the orchestrator:
//!
//! - [`ReasoningCapability`] / [`ContextRetrieval`]: seams to the external
//!   reasoning and retrieval collaborators
//! - [`ConsultationManager`]: correlated human escalation with bounded
//!   timeout and cancellation, exactly one terminal resolution per request
//! - [`AgentCoordinator`]: bounded-concurrency specialist fan-out that never
//!   fails fast and always returns the full partial-failure aggregate
//! - [`CategorizationStep`] / [`GenerationStep`]: the two reasoning calls,
//!   with strict structural validation of their output
//!
//! Every decision point writes through the audit log handed in at
//! construction; nothing here mutates the workflow session.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod categorize;
mod consult;
mod coordinator;
mod error;
mod generate;
mod plan;
mod reasoning;
mod retrieval;
mod schema;

pub use categorize::{CategorizationDecision, CategorizationStep, Escalation};
pub use consult::{ConsultError, ConsultationManager};
pub use coordinator::{
    AgentCoordinator, CoordinatorConfig, ReasoningSpecialist, SpecialistError, SpecialistExecutor,
    DEFAULT_POOL_SIZE,
};
pub use error::EngineError;
pub use generate::GenerationStep;
pub use plan::plan_for_category;
pub use reasoning::{ReasoningCapability, ReasoningError, ReasoningRequest};
pub use retrieval::{ContextRetrieval, RetrievalError, RetrievalFilters, Snippet};
pub use schema::{categorization_schema, protocol_schema};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
