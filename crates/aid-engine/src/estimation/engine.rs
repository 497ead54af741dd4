use tracing::debug;

use super::aggregate::{compute_totals, resolve_exclusive_groups};
use super::amount::{confirmed_amount, possible_amount};
use super::catalog::{AidDefinition, CatalogSnapshot};
use super::context::{EligibilityContext, TriState};
use super::eligibility::{self, AidStatus, MissingCriterion, Verdict};
use super::error::EstimationError;
use super::messaging::guidance;
use super::progressive::EstimationStage;
use super::result::{ConfidenceLevel, EstimateResult, EvaluatedAid};

/// Run evaluator, calculator, aggregator, and formatter for one stage.
///
/// Fields the stage does not accept are hidden from the evaluator, so a QUICK estimate
/// built from a rich context still treats income-gated aids as potential.
pub fn estimate(
    snapshot: &CatalogSnapshot,
    context: &EligibilityContext,
    stage: EstimationStage,
) -> Result<EstimateResult, EstimationError> {
    context.validate()?;
    let visible = visible_at(context, stage);

    let mut confirmed = Vec::new();
    let mut potential = Vec::new();
    let mut ineligible = Vec::new();
    let mut income_gated_applies = false;

    for aid in snapshot.catalog().aids() {
        let verdict = eligibility::evaluate(aid, &visible);
        debug!(aid = %aid.id, ?verdict, stage = stage.label(), "evaluated aid");

        if !matches!(verdict, Verdict::NotApplicable | Verdict::Ineligible(_))
            && aid.criteria.is_income_gated()
        {
            income_gated_applies = true;
        }

        match verdict {
            Verdict::NotApplicable => {}
            Verdict::Eligible => confirmed.push(eligible_aid(aid, &visible)?),
            Verdict::Potential(missing) => potential.push(potential_aid(aid, &visible, missing)),
            Verdict::Ineligible(reason) => {
                let mut evaluated = EvaluatedAid::from_definition(aid, AidStatus::Ineligible);
                evaluated.ineligibility = Some(reason);
                ineligible.push(evaluated);
            }
        }
    }

    let (confirmed, superseded) = resolve_exclusive_groups(confirmed);
    let totals = compute_totals(visible.price_cents, &confirmed, &potential)?;
    let confidence = confidence_for(stage, &potential, income_gated_applies);

    let mut result = EstimateResult {
        stage,
        confirmed,
        potential,
        ineligible,
        superseded,
        totals,
        confidence,
        guidance: String::new(),
        catalog_degraded: snapshot.is_degraded(),
    };
    result.guidance = guidance(&result);

    debug!(
        stage = stage.label(),
        confirmed_cents = result.totals.confirmed_cents,
        potential_cents = result.totals.potential_cents,
        confidence = confidence.label(),
        "estimate computed"
    );
    Ok(result)
}

fn eligible_aid(
    aid: &AidDefinition,
    context: &EligibilityContext,
) -> Result<EvaluatedAid, EstimationError> {
    // The evaluator only confirms aids whose amount inputs are all known.
    let amount = confirmed_amount(&aid.amount, context).ok_or_else(|| {
        EstimationError::ComputationInvariantViolation {
            detail: format!("eligible aid '{}' has no computable amount", aid.id),
        }
    })?;
    let mut evaluated = EvaluatedAid::from_definition(aid, AidStatus::Eligible);
    evaluated.amount_cents = Some(amount);
    Ok(evaluated)
}

fn potential_aid(
    aid: &AidDefinition,
    context: &EligibilityContext,
    missing: Vec<MissingCriterion>,
) -> EvaluatedAid {
    let mut evaluated = EvaluatedAid::from_definition(aid, AidStatus::Potential);
    evaluated.possible_amount_cents = Some(possible_amount(&aid.amount, context));
    evaluated.missing = missing;
    evaluated
}

fn visible_at(context: &EligibilityContext, stage: EstimationStage) -> EligibilityContext {
    let mut visible = context.clone();
    match stage {
        EstimationStage::Quick => {
            visible.qf = None;
            visible.caf_affiliation = TriState::Unknown;
            visible.social_condition = TriState::Unknown;
            visible.school_level = None;
            visible.household_children = None;
            visible.territory_code = None;
        }
        EstimationStage::Fast => {
            visible.territory_code = None;
        }
        EstimationStage::Complete => {}
    }
    visible
}

fn confidence_for(
    stage: EstimationStage,
    potential: &[EvaluatedAid],
    income_gated_applies: bool,
) -> ConfidenceLevel {
    let open_questions = potential.iter().any(|aid| {
        aid.missing
            .iter()
            .any(|criterion| criterion.resolvable_by_input())
    });

    match stage {
        EstimationStage::Quick if income_gated_applies => ConfidenceLevel::Low,
        EstimationStage::Quick => ConfidenceLevel::Medium,
        EstimationStage::Fast if potential.is_empty() => ConfidenceLevel::High,
        EstimationStage::Fast => ConfidenceLevel::Medium,
        EstimationStage::Complete if open_questions => ConfidenceLevel::Medium,
        EstimationStage::Complete => ConfidenceLevel::High,
    }
}
