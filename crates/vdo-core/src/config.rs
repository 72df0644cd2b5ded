//! Workflow configuration

use crate::error::WorkflowError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vdo_engine::CoordinatorConfig;

/// Orchestrator configuration
///
/// Validated once at startup; an invalid value is a fatal configuration
/// error, not a silently corrected one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Minimum acceptable categorization confidence
    pub confidence_threshold: f64,
    /// Margin under which near-equal category scores escalate
    pub ambiguity_margin: f64,
    /// Consultation wait before the conservative default applies
    pub consultation_timeout_secs: u64,
    /// Specialist worker pool bound
    pub pool_size: usize,
    /// Per-specialist-task deadline
    pub task_timeout_secs: u64,
    /// Overall specialist fan-out deadline
    pub coordinator_timeout_secs: u64,
    /// Grace given to in-flight tasks after a deadline or cancellation
    pub cancellation_grace_secs: u64,
    /// Optional whole-workflow deadline
    pub workflow_deadline_secs: Option<u64>,
    /// Human-authorized regeneration attempts after a rejected artifact
    pub max_generation_retries: u32,
}

impl WorkflowConfig {
    /// Create the default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With confidence threshold
    #[inline]
    #[must_use]
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// With ambiguity margin
    #[inline]
    #[must_use]
    pub fn with_ambiguity_margin(mut self, margin: f64) -> Self {
        self.ambiguity_margin = margin;
        self
    }

    /// With consultation timeout
    #[inline]
    #[must_use]
    pub fn with_consultation_timeout(mut self, timeout: Duration) -> Self {
        self.consultation_timeout_secs = timeout.as_secs();
        self
    }

    /// With specialist pool size
    #[inline]
    #[must_use]
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// With per-task timeout
    #[inline]
    #[must_use]
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout_secs = timeout.as_secs();
        self
    }

    /// With whole-workflow deadline
    #[inline]
    #[must_use]
    pub fn with_workflow_deadline(mut self, deadline: Duration) -> Self {
        self.workflow_deadline_secs = Some(deadline.as_secs());
        self
    }

    /// Parse from a TOML document
    ///
    /// # Errors
    /// `WorkflowError::FatalConfiguration` on parse or validation failure.
    pub fn from_toml_str(raw: &str) -> Result<Self, WorkflowError> {
        let config: Self = toml::from_str(raw)
            .map_err(|err| WorkflowError::FatalConfiguration(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate at startup.
    ///
    /// # Errors
    /// `WorkflowError::FatalConfiguration` for any out-of-range value.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if !self.confidence_threshold.is_finite()
            || self.confidence_threshold <= 0.0
            || self.confidence_threshold > 1.0
        {
            return Err(WorkflowError::FatalConfiguration(format!(
                "confidence_threshold must be in (0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !self.ambiguity_margin.is_finite()
            || self.ambiguity_margin < 0.0
            || self.ambiguity_margin >= 1.0
        {
            return Err(WorkflowError::FatalConfiguration(format!(
                "ambiguity_margin must be in [0, 1), got {}",
                self.ambiguity_margin
            )));
        }
        if self.pool_size == 0 {
            return Err(WorkflowError::FatalConfiguration(
                "pool_size must be at least 1".to_string(),
            ));
        }
        if self.consultation_timeout_secs == 0 {
            return Err(WorkflowError::FatalConfiguration(
                "consultation_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Consultation timeout as a duration
    #[inline]
    #[must_use]
    pub fn consultation_timeout(&self) -> Duration {
        Duration::from_secs(self.consultation_timeout_secs)
    }

    /// Workflow deadline as a duration, when configured
    #[inline]
    #[must_use]
    pub fn workflow_deadline(&self) -> Option<Duration> {
        self.workflow_deadline_secs.map(Duration::from_secs)
    }

    /// Coordinator tuning derived from this configuration
    #[must_use]
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        let mut config = CoordinatorConfig::default()
            .with_pool_size(self.pool_size)
            .with_task_timeout(Duration::from_secs(self.task_timeout_secs))
            .with_overall_timeout(Duration::from_secs(self.coordinator_timeout_secs));
        config.cancellation_grace = Duration::from_secs(self.cancellation_grace_secs);
        config
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            ambiguity_margin: 0.10,
            consultation_timeout_secs: 300,
            pool_size: vdo_engine::DEFAULT_POOL_SIZE,
            task_timeout_secs: 60,
            coordinator_timeout_secs: 300,
            cancellation_grace_secs: 5,
            workflow_deadline_secs: None,
            max_generation_retries: 1,
        }
    }
}
