use super::progressive::EstimationStage;

/// Typed failures surfaced by the estimation core.
///
/// Catalog unavailability is not listed here: it degrades to an empty snapshot instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EstimationError {
    #[error("{field} is required for the {} stage", stage.label())]
    MissingInput {
        stage: EstimationStage,
        field: &'static str,
    },
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
    #[error("cannot move from the {} stage to the {} stage", from.label(), to.label())]
    InvalidTransition {
        from: EstimationStage,
        to: EstimationStage,
    },
    #[error("estimate invariant violated: {detail}")]
    ComputationInvariantViolation { detail: String },
}

impl EstimationError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Errors the caller can fix by changing its inputs.
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, Self::ComputationInvariantViolation { .. })
    }
}
