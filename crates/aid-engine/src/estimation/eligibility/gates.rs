use super::{IneligibilityReason, MissingCriterion};
use crate::estimation::catalog::{AidDefinition, AmountKind, EligibilityCriteria};
use crate::estimation::context::{EligibilityContext, TriState};

pub(super) enum GateOutcome {
    Pass,
    Unknown(MissingCriterion),
    Fail(IneligibilityReason),
}

type Gate = fn(&AidDefinition, &EligibilityContext) -> GateOutcome;

/// Gates run after the age gate, in this order.
pub(super) const GATES: [Gate; 7] = [
    income,
    territory,
    caf_affiliation,
    social_condition,
    school_level,
    household_children,
    duration,
];

pub(super) fn age(criteria: &EligibilityCriteria, context: &EligibilityContext) -> GateOutcome {
    let age = context.child_age;
    if (criteria.age_min..=criteria.age_max).contains(&age) {
        GateOutcome::Pass
    } else {
        GateOutcome::Fail(IneligibilityReason::AgeOutOfRange {
            age,
            min: criteria.age_min,
            max: criteria.age_max,
        })
    }
}

fn income(aid: &AidDefinition, context: &EligibilityContext) -> GateOutcome {
    let Some(qf_max) = aid.criteria.qf_max else {
        return GateOutcome::Pass;
    };
    match context.qf {
        None => GateOutcome::Unknown(MissingCriterion::Qf),
        Some(qf) if qf <= qf_max => GateOutcome::Pass,
        Some(qf) => GateOutcome::Fail(IneligibilityReason::QfAboveCeiling { qf, qf_max }),
    }
}

fn territory(aid: &AidDefinition, context: &EligibilityContext) -> GateOutcome {
    let allowed = &aid.criteria.territory_codes;
    if allowed.is_empty() {
        return GateOutcome::Pass;
    }
    match context.territory_code.as_deref() {
        None => GateOutcome::Unknown(MissingCriterion::Territory),
        Some(code) if allowed.iter().any(|candidate| candidate.trim() == code) => GateOutcome::Pass,
        Some(code) => GateOutcome::Fail(IneligibilityReason::TerritoryMismatch {
            territory_code: code.to_string(),
        }),
    }
}

fn caf_affiliation(aid: &AidDefinition, context: &EligibilityContext) -> GateOutcome {
    required_tri_state(
        aid.criteria.requires_caf_affiliation,
        context.caf_affiliation,
        MissingCriterion::CafAffiliation,
        IneligibilityReason::NotCafAffiliated,
    )
}

fn social_condition(aid: &AidDefinition, context: &EligibilityContext) -> GateOutcome {
    required_tri_state(
        aid.criteria.requires_social_condition,
        context.social_condition,
        MissingCriterion::SocialCondition,
        IneligibilityReason::SocialConditionNotMet,
    )
}

fn required_tri_state(
    required: bool,
    answer: TriState,
    missing: MissingCriterion,
    failure: IneligibilityReason,
) -> GateOutcome {
    if !required {
        return GateOutcome::Pass;
    }
    match answer.known() {
        None => GateOutcome::Unknown(missing),
        Some(true) => GateOutcome::Pass,
        Some(false) => GateOutcome::Fail(failure),
    }
}

fn school_level(aid: &AidDefinition, context: &EligibilityContext) -> GateOutcome {
    let covered = &aid.criteria.school_levels;
    if covered.is_empty() {
        return GateOutcome::Pass;
    }
    match context.school_level {
        None => GateOutcome::Unknown(MissingCriterion::SchoolLevel),
        Some(level) if covered.contains(&level) => GateOutcome::Pass,
        Some(level) => GateOutcome::Fail(IneligibilityReason::SchoolLevelNotCovered { level }),
    }
}

fn household_children(aid: &AidDefinition, context: &EligibilityContext) -> GateOutcome {
    let Some(required) = aid.criteria.min_household_children else {
        return GateOutcome::Pass;
    };
    match context.household_children {
        None => GateOutcome::Unknown(MissingCriterion::HouseholdChildren),
        Some(children) if children >= required => GateOutcome::Pass,
        Some(children) => {
            GateOutcome::Fail(IneligibilityReason::TooFewChildren { children, required })
        }
    }
}

// Not a condition on the family: a per-day amount cannot be confirmed without it.
fn duration(aid: &AidDefinition, context: &EligibilityContext) -> GateOutcome {
    if aid.amount.kind == AmountKind::PerDay && context.duration_days.is_none() {
        GateOutcome::Unknown(MissingCriterion::DurationDays)
    } else {
        GateOutcome::Pass
    }
}
