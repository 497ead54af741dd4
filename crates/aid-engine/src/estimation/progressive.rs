//! Three-stage "reveal more, narrow the estimate" protocol.
//!
//! The caller owns an [`EstimationSession`] and passes it, with a catalog snapshot, to
//! the stateless [`ProgressiveEstimator`] on every interaction.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::catalog::CatalogSnapshot;
use super::context::{CompleteInputs, EligibilityContext, ProfileInputs, QuickInputs};
use super::engine::estimate;
use super::error::EstimationError;
use super::result::EstimateResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationStage {
    Quick,
    Fast,
    Complete,
}

impl EstimationStage {
    pub const fn label(self) -> &'static str {
        match self {
            EstimationStage::Quick => "quick",
            EstimationStage::Fast => "fast",
            EstimationStage::Complete => "complete",
        }
    }

    pub const fn ordered() -> [EstimationStage; 3] {
        [
            EstimationStage::Quick,
            EstimationStage::Fast,
            EstimationStage::Complete,
        ]
    }

    /// Staying put or moving one stage forward is allowed; nothing else.
    pub fn can_move_to(self, next: EstimationStage) -> bool {
        next == self
            || matches!(
                (self, next),
                (EstimationStage::Quick, EstimationStage::Fast)
                    | (EstimationStage::Fast, EstimationStage::Complete)
            )
    }
}

/// Caller-owned progress of one family through the stages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EstimationSession {
    stage: Option<EstimationStage>,
    context: Option<EligibilityContext>,
    last_result: Option<EstimateResult>,
}

impl EstimationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stage; a fresh or reset session sits at QUICK.
    pub fn stage(&self) -> EstimationStage {
        self.stage.unwrap_or(EstimationStage::Quick)
    }

    pub fn context(&self) -> Option<&EligibilityContext> {
        self.context.as_ref()
    }

    pub fn last_result(&self) -> Option<&EstimateResult> {
        self.last_result.as_ref()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Stateless orchestration of context enrichment and estimation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressiveEstimator;

impl ProgressiveEstimator {
    pub fn new() -> Self {
        Self
    }

    /// QUICK: age, price, period, optional categories and duration.
    pub fn quick(
        &self,
        snapshot: &CatalogSnapshot,
        session: &mut EstimationSession,
        inputs: &QuickInputs,
    ) -> Result<EstimateResult, EstimationError> {
        self.ensure_transition(session, EstimationStage::Quick)?;
        let context = match session.context() {
            Some(existing) => {
                let mut next = existing.clone();
                next.merge_quick(inputs)?;
                next
            }
            None => EligibilityContext::from_quick(inputs)?,
        };
        self.commit(snapshot, session, context, EstimationStage::Quick)
    }

    /// FAST: household profile (QF, CAF, social condition, school level, child count).
    pub fn fast(
        &self,
        snapshot: &CatalogSnapshot,
        session: &mut EstimationSession,
        inputs: &ProfileInputs,
    ) -> Result<EstimateResult, EstimationError> {
        let mut context = self.started_context(session, EstimationStage::Fast)?;
        self.ensure_transition(session, EstimationStage::Fast)?;
        context.merge_profile(inputs)?;
        self.commit(snapshot, session, context, EstimationStage::Fast)
    }

    /// COMPLETE: territory and any profile field not given at FAST.
    pub fn complete(
        &self,
        snapshot: &CatalogSnapshot,
        session: &mut EstimationSession,
        inputs: &CompleteInputs,
    ) -> Result<EstimateResult, EstimationError> {
        let mut context = self.started_context(session, EstimationStage::Complete)?;
        self.ensure_transition(session, EstimationStage::Complete)?;
        context.merge_complete(inputs)?;
        self.commit(snapshot, session, context, EstimationStage::Complete)
    }

    /// Drop all context and return to QUICK.
    pub fn reset(&self, session: &mut EstimationSession) {
        info!(from = session.stage().label(), "estimation session reset");
        session.reset();
    }

    fn started_context(
        &self,
        session: &EstimationSession,
        stage: EstimationStage,
    ) -> Result<EligibilityContext, EstimationError> {
        session
            .context()
            .cloned()
            .ok_or(EstimationError::MissingInput {
                stage,
                field: "child_age",
            })
    }

    fn ensure_transition(
        &self,
        session: &EstimationSession,
        to: EstimationStage,
    ) -> Result<(), EstimationError> {
        let from = session.stage();
        if from.can_move_to(to) {
            Ok(())
        } else {
            Err(EstimationError::InvalidTransition { from, to })
        }
    }

    // The session changes only once the estimate succeeded.
    fn commit(
        &self,
        snapshot: &CatalogSnapshot,
        session: &mut EstimationSession,
        context: EligibilityContext,
        stage: EstimationStage,
    ) -> Result<EstimateResult, EstimationError> {
        let result = estimate(snapshot, &context, stage)?;
        if session.stage != Some(stage) {
            info!(
                from = session.stage().label(),
                to = stage.label(),
                "estimation stage advanced"
            );
        }
        session.stage = Some(stage);
        session.context = Some(context);
        session.last_result = Some(result.clone());
        Ok(result)
    }
}
