//! Regulatory validation categories
//!
//! The category taxonomy is a closed enum: downstream generation bounds are
//! resolved once from the variant, never from runtime configuration.

use crate::error::DomainError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Inclusive test-case cardinality bounds for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardinalityBounds {
    /// Minimum number of test cases
    pub min: usize,
    /// Maximum number of test cases
    pub max: usize,
}

impl CardinalityBounds {
    /// Check whether a count satisfies the bounds
    #[inline]
    #[must_use]
    pub fn contains(&self, count: usize) -> bool {
        count >= self.min && count <= self.max
    }
}

/// Software validation category (GAMP-style, fixed finite set)
///
/// Ordering of the variants follows increasing regulatory scrutiny.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCategory {
    /// Infrastructure software (operating systems, middleware)
    InfrastructureSoftware,
    /// Non-configured commercial product used as supplied
    NonConfiguredProduct,
    /// Commercial product configured for the business process
    ConfiguredProduct,
    /// Custom-built application
    CustomApplication,
}

impl ValidationCategory {
    /// The pre-declared conservative fallback: the highest-scrutiny category.
    ///
    /// Used only when a consultation times out. Never computed from a failed
    /// confidence score.
    pub const CONSERVATIVE_DEFAULT: Self = Self::CustomApplication;

    /// Test-case cardinality bounds for protocols generated in this category
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> CardinalityBounds {
        match self {
            Self::InfrastructureSoftware => CardinalityBounds { min: 2, max: 8 },
            Self::NonConfiguredProduct => CardinalityBounds { min: 5, max: 10 },
            Self::ConfiguredProduct => CardinalityBounds { min: 8, max: 25 },
            Self::CustomApplication => CardinalityBounds { min: 12, max: 40 },
        }
    }

    /// Numeric scrutiny rank (higher means more restrictive)
    #[inline]
    #[must_use]
    pub fn scrutiny(&self) -> u8 {
        match self {
            Self::InfrastructureSoftware => 1,
            Self::NonConfiguredProduct => 2,
            Self::ConfiguredProduct => 3,
            Self::CustomApplication => 4,
        }
    }

    /// Canonical snake_case name used in payloads and audit records
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InfrastructureSoftware => "infrastructure_software",
            Self::NonConfiguredProduct => "non_configured_product",
            Self::ConfiguredProduct => "configured_product",
            Self::CustomApplication => "custom_application",
        }
    }

    /// All categories, in scrutiny order
    #[inline]
    #[must_use]
    pub fn all() -> [Self; 4] {
        [
            Self::InfrastructureSoftware,
            Self::NonConfiguredProduct,
            Self::ConfiguredProduct,
            Self::CustomApplication,
        ]
    }
}

impl std::fmt::Display for ValidationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationCategory {
    type Err = DomainError;

    /// Accepts the canonical names plus the GAMP numeral aliases.
    ///
    /// This is the only normalization applied to reasoning output; anything
    /// else is an unknown category and a hard failure.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "infrastructure_software" | "category_1" => Ok(Self::InfrastructureSoftware),
            "non_configured_product" | "category_3" => Ok(Self::NonConfiguredProduct),
            "configured_product" | "category_4" => Ok(Self::ConfiguredProduct),
            "custom_application" | "category_5" => Ok(Self::CustomApplication),
            other => Err(DomainError::UnknownCategory(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conservative_default_is_highest_scrutiny() {
        let max = ValidationCategory::all()
            .into_iter()
            .max_by_key(ValidationCategory::scrutiny)
            .unwrap();
        assert_eq!(ValidationCategory::CONSERVATIVE_DEFAULT, max);
    }

    #[test]
    fn bounds_are_ordered() {
        for category in ValidationCategory::all() {
            let bounds = category.bounds();
            assert!(bounds.min <= bounds.max);
            assert!(bounds.min > 0);
        }
    }

    #[test]
    fn parses_canonical_and_alias_names() {
        assert_eq!(
            "configured_product".parse::<ValidationCategory>().unwrap(),
            ValidationCategory::ConfiguredProduct
        );
        assert_eq!(
            "Category_5".parse::<ValidationCategory>().unwrap(),
            ValidationCategory::CustomApplication
        );
        assert!(" non_configured_product "
            .parse::<ValidationCategory>()
            .is_ok());
    }

    #[test]
    fn rejects_unknown_category() {
        let err = "spreadsheet".parse::<ValidationCategory>().unwrap_err();
        assert!(matches!(err, DomainError::UnknownCategory(_)));
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&ValidationCategory::CustomApplication).unwrap();
        assert_eq!(json, "\"custom_application\"");
    }

    #[test]
    fn bounds_contains_is_inclusive() {
        let bounds = ValidationCategory::NonConfiguredProduct.bounds();
        assert!(bounds.contains(5));
        assert!(bounds.contains(10));
        assert!(!bounds.contains(4));
        assert!(!bounds.contains(11));
    }
}
