//! Error types for plan execution and watching.

use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for all plan operations.
///
/// Every failure mode of the plan engine has its own variant so callers can
/// route them precisely: handled interrupts are swallowed at the UI boundary,
/// retryable failures can be resubmitted, and the rest surface as errors.
#[derive(Error, Debug)]
pub enum PlanError {
    /// The plan is corrupted or was permanently rejected; never retry it.
    #[error("Plan {plan_id} aborted: {reason}")]
    AbortPlan { plan_id: String, reason: String },

    /// Transient failure; resubmitting from the current plan state is safe.
    #[error("Plan {plan_id} should be retried: {reason}")]
    ShouldRetryPlan { plan_id: String, reason: String },

    /// Malformed plan or step data returned by the backend.
    #[error("Invalid plan data for field '{field}': {reason}")]
    PlanValidation { field: String, reason: String },

    /// The refreshed quote is worse than the accepted trade beyond tolerance.
    #[error("Plan {plan_id} output dropped from {original_output} to {new_output}; new trade must be accepted")]
    PlanPriceChange {
        plan_id: String,
        original_output: u128,
        new_output: u128,
    },

    /// The user left the flow while the plan was running.
    #[error("Plan {plan_id} interrupted: {reason}")]
    ExpectedPlan { plan_id: String, reason: String },

    /// Polling for a step exceeded the attempt budget.
    #[error("Timed out waiting for step {step_index} of plan {plan_id} after {attempts} attempts")]
    PlanStepTimeout {
        plan_id: String,
        step_index: u32,
        attempts: u32,
    },

    /// The plan was cancelled while being watched or executed.
    #[error("Plan {plan_id} was cancelled")]
    HandledInterrupt { plan_id: String },

    /// The backend response did not contain the requested step.
    #[error("Step {step_index} not found in plan {plan_id}")]
    StepNotFound { plan_id: String, step_index: u32 },

    /// The plan could not be fetched or its response could not be parsed.
    #[error("Failed to fetch plan {plan_id}: {message}")]
    PlanFetch { plan_id: String, message: String },

    /// Network transport failure talking to the planning service.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Batched `wallet_sendCalls` submission is not available in this wallet.
    #[error("Batched call submission is not supported for step {step_index} of plan {plan_id}")]
    UnsupportedBatchedCalls { plan_id: String, step_index: u32 },

    /// A signing collaborator failed.
    #[error("Signing error on chain {chain_id}: {message}")]
    Signing { chain_id: u64, message: String },

    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },

    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Coarse routing category for a [`PlanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Safe to resubmit from the current plan state.
    Retry,
    /// Must not be retried or resumed.
    Abort,
    /// Backend contract violation in plan data.
    Validation,
    /// Expected interruption; no error dialog.
    Interrupt,
    /// Polling budget exhausted.
    Timeout,
    /// Local infrastructure failure (database, filesystem, config).
    Internal,
}

/// Builder for creating plan validation errors.
pub struct ValidationErrorBuilder {
    field: String,
}

impl ValidationErrorBuilder {
    /// Create a new validation error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> PlanError {
        PlanError::PlanValidation {
            field: self.field,
            reason: reason.into(),
        }
    }
}

/// Builder for creating database errors with a message.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> PlanError {
        PlanError::Database {
            message: self.message,
            source,
        }
    }
}

impl PlanError {
    /// Creates a builder for plan validation errors.
    pub fn validation(field: impl Into<String>) -> ValidationErrorBuilder {
        ValidationErrorBuilder::new(field)
    }

    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a transport error without an underlying HTTP error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Returns the routing class of this error.
    pub fn classify(&self) -> ErrorClass {
        match self {
            Self::ShouldRetryPlan { .. } | Self::Transport { .. } | Self::Signing { .. } => {
                ErrorClass::Retry
            }
            Self::AbortPlan { .. } | Self::UnsupportedBatchedCalls { .. } => ErrorClass::Abort,
            Self::PlanValidation { .. } | Self::StepNotFound { .. } | Self::PlanFetch { .. } => {
                ErrorClass::Validation
            }
            Self::PlanPriceChange { .. }
            | Self::ExpectedPlan { .. }
            | Self::HandledInterrupt { .. } => ErrorClass::Interrupt,
            Self::PlanStepTimeout { .. } => ErrorClass::Timeout,
            Self::Database { .. }
            | Self::FileSystem { .. }
            | Self::XdgDirectory(_)
            | Self::Serialization { .. }
            | Self::Configuration { .. } => ErrorClass::Internal,
        }
    }

    /// True for interrupts that must not be shown as an error dialog.
    pub fn is_handled_interrupt(&self) -> bool {
        self.classify() == ErrorClass::Interrupt
    }

    /// True when resubmitting from the current plan state is safe.
    pub fn is_retryable(&self) -> bool {
        self.classify() == ErrorClass::Retry
    }
}

impl From<reqwest::Error> for PlanError {
    fn from(source: reqwest::Error) -> Self {
        Self::Transport {
            message: source.to_string(),
            source: Some(source),
        }
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| PlanError::database(message).with_source(e))
    }
}

/// Result type alias for plan operations
pub type Result<T> = std::result::Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupts_are_handled() {
        let cancelled = PlanError::HandledInterrupt {
            plan_id: "p1".to_string(),
        };
        let price = PlanError::PlanPriceChange {
            plan_id: "p1".to_string(),
            original_output: 100,
            new_output: 90,
        };
        let expected = PlanError::ExpectedPlan {
            plan_id: "p1".to_string(),
            reason: "closed".to_string(),
        };

        assert!(cancelled.is_handled_interrupt());
        assert!(price.is_handled_interrupt());
        assert!(expected.is_handled_interrupt());
    }

    #[test]
    fn test_classification() {
        let timeout = PlanError::PlanStepTimeout {
            plan_id: "p1".to_string(),
            step_index: 2,
            attempts: 60,
        };
        assert_eq!(timeout.classify(), ErrorClass::Timeout);
        assert!(!timeout.is_handled_interrupt());

        let retry = PlanError::transport("connection reset");
        assert!(retry.is_retryable());

        let batched = PlanError::UnsupportedBatchedCalls {
            plan_id: "p1".to_string(),
            step_index: 0,
        };
        assert_eq!(batched.classify(), ErrorClass::Abort);

        let invalid = PlanError::validation("steps").with_reason("empty");
        assert_eq!(invalid.classify(), ErrorClass::Validation);
        assert_eq!(
            invalid.to_string(),
            "Invalid plan data for field 'steps': empty"
        );
    }

    #[test]
    fn test_step_not_found_message_names_plan_and_index() {
        let err = PlanError::StepNotFound {
            plan_id: "plan-abc".to_string(),
            step_index: 7,
        };
        let message = err.to_string();
        assert!(message.contains("plan-abc"));
        assert!(message.contains('7'));
    }
}
