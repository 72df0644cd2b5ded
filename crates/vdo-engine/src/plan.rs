//! Specialist planning
//!
//! The task set for a categorized input is fixed at planning time, so the
//! coordinator always fans out a known N.

use serde_json::json;
use vdo_domain::{AgentTask, Specialty, ValidationCategory};

/// Derive the specialist task set for a category.
///
/// Lighter categories get risk and functional analysis; configured and
/// custom systems additionally get data-integrity and regulatory
/// traceability review.
#[must_use]
pub fn plan_for_category(category: ValidationCategory, input_reference: &str) -> Vec<AgentTask> {
    let specialties: &[Specialty] = match category {
        ValidationCategory::InfrastructureSoftware | ValidationCategory::NonConfiguredProduct => {
            &[Specialty::RiskAssessment, Specialty::FunctionalCoverage]
        }
        ValidationCategory::ConfiguredProduct | ValidationCategory::CustomApplication => &[
            Specialty::RiskAssessment,
            Specialty::DataIntegrity,
            Specialty::FunctionalCoverage,
            Specialty::RegulatoryTraceability,
        ],
    };

    specialties
        .iter()
        .map(|specialty| {
            AgentTask::new(
                *specialty,
                json!({
                    "input_reference": input_reference,
                    "category": category,
                }),
            )
        })
        .collect()
}
