//! Per-aid eligibility decisions.
//!
//! The evaluator is a pure function of one [`AidDefinition`] and one
//! [`EligibilityContext`]; it can be called with any partial context, in any order,
//! without residual effect.

mod gates;

use serde::{Deserialize, Serialize};

use super::catalog::AidDefinition;
use super::context::{EligibilityContext, SchoolLevel};
use gates::{GateOutcome, GATES};

/// Final status of an aid against a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AidStatus {
    Eligible,
    Potential,
    Ineligible,
}

/// Information whose absence keeps an aid in the potential set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCriterion {
    Category,
    Qf,
    Territory,
    CafAffiliation,
    SocialCondition,
    SchoolLevel,
    HouseholdChildren,
    DurationDays,
    /// Supporting documents are checked by the funder, never by the engine.
    DocumentVerification,
}

impl MissingCriterion {
    pub const fn label(self) -> &'static str {
        match self {
            MissingCriterion::Category => "activity category needed",
            MissingCriterion::Qf => "QF needed",
            MissingCriterion::Territory => "home municipality needed",
            MissingCriterion::CafAffiliation => "CAF affiliation needed",
            MissingCriterion::SocialCondition => "social situation needed",
            MissingCriterion::SchoolLevel => "school level needed",
            MissingCriterion::HouseholdChildren => "number of children needed",
            MissingCriterion::DurationDays => "activity duration needed",
            MissingCriterion::DocumentVerification => "supporting documents to be verified",
        }
    }

    /// Whether more form input could ever resolve this criterion.
    pub const fn resolvable_by_input(self) -> bool {
        !matches!(self, MissingCriterion::DocumentVerification)
    }

    /// Known only once the household profile is given.
    pub const fn is_household_detail(self) -> bool {
        matches!(
            self,
            MissingCriterion::Qf
                | MissingCriterion::Territory
                | MissingCriterion::CafAffiliation
                | MissingCriterion::SocialCondition
                | MissingCriterion::SchoolLevel
                | MissingCriterion::HouseholdChildren
        )
    }

    /// Describes the activity itself and is only accepted at QUICK.
    pub const fn is_activity_detail(self) -> bool {
        matches!(self, MissingCriterion::Category | MissingCriterion::DurationDays)
    }
}

/// First known gate that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum IneligibilityReason {
    AgeOutOfRange { age: u8, min: u8, max: u8 },
    QfAboveCeiling { qf: u32, qf_max: u32 },
    TerritoryMismatch { territory_code: String },
    NotCafAffiliated,
    SocialConditionNotMet,
    SchoolLevelNotCovered { level: SchoolLevel },
    TooFewChildren { children: u8, required: u8 },
}

impl IneligibilityReason {
    pub fn summary(&self) -> String {
        match self {
            IneligibilityReason::AgeOutOfRange { age, min, max } => {
                format!("age {age} outside {min}-{max}")
            }
            IneligibilityReason::QfAboveCeiling { qf, qf_max } => {
                format!("QF {qf} above ceiling {qf_max}")
            }
            IneligibilityReason::TerritoryMismatch { territory_code } => {
                format!("territory {territory_code} not covered")
            }
            IneligibilityReason::NotCafAffiliated => "household not affiliated to CAF".to_string(),
            IneligibilityReason::SocialConditionNotMet => {
                "social condition not met".to_string()
            }
            IneligibilityReason::SchoolLevelNotCovered { level } => {
                format!("school level {level:?} not covered")
            }
            IneligibilityReason::TooFewChildren { children, required } => {
                format!("{children} child(ren) in household, {required} required")
            }
        }
    }
}

/// Outcome of evaluating one aid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Period or category does not match; the aid is left out of the result.
    NotApplicable,
    Eligible,
    Potential(Vec<MissingCriterion>),
    Ineligible(IneligibilityReason),
}

impl Verdict {
    pub fn status(&self) -> Option<AidStatus> {
        match self {
            Verdict::NotApplicable => None,
            Verdict::Eligible => Some(AidStatus::Eligible),
            Verdict::Potential(_) => Some(AidStatus::Potential),
            Verdict::Ineligible(_) => Some(AidStatus::Ineligible),
        }
    }
}

/// Run the applicability filter and the gates of one aid in fixed order.
pub fn evaluate(aid: &AidDefinition, context: &EligibilityContext) -> Verdict {
    let criteria = &aid.criteria;

    if !criteria.period.covers(context.period) {
        return Verdict::NotApplicable;
    }
    let category_known = match criteria.matches_categories(&context.categories) {
        Some(false) => return Verdict::NotApplicable,
        Some(true) => true,
        None => false,
    };

    // Age is always known, so a failure here settles the aid.
    if let GateOutcome::Fail(reason) = gates::age(criteria, context) {
        return Verdict::Ineligible(reason);
    }

    let mut missing = Vec::new();
    if !category_known {
        missing.push(MissingCriterion::Category);
    }

    for gate in GATES {
        match gate(aid, context) {
            GateOutcome::Pass => {}
            GateOutcome::Unknown(criterion) => missing.push(criterion),
            GateOutcome::Fail(reason) => return Verdict::Ineligible(reason),
        }
    }

    if !missing.is_empty() {
        return Verdict::Potential(missing);
    }
    if criteria.requires_document_verification {
        return Verdict::Potential(vec![MissingCriterion::DocumentVerification]);
    }
    Verdict::Eligible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::catalog::{AmountRule, PeriodApplicability};
    use crate::estimation::context::{PeriodType, TriState};
    use crate::estimation::tests::common::{aid, context};

    #[test]
    fn age_failure_short_circuits_unknown_gates() {
        let mut municipal = aid("ville", AmountRule::fixed(1_500));
        municipal.criteria.qf_max = Some(800);
        municipal.criteria.territory_codes = vec!["69123".to_string()];

        let verdict = evaluate(&municipal, &EligibilityContext::new(19, 6_000, PeriodType::Scolaire));

        assert_eq!(
            verdict,
            Verdict::Ineligible(IneligibilityReason::AgeOutOfRange {
                age: 19,
                min: 3,
                max: 17
            })
        );
    }

    #[test]
    fn unknown_qf_and_territory_are_both_reported() {
        let mut municipal = aid("ville", AmountRule::fixed(1_500));
        municipal.criteria.qf_max = Some(800);
        municipal.criteria.territory_codes = vec!["69123".to_string()];

        let verdict = evaluate(&municipal, &context());

        assert_eq!(
            verdict,
            Verdict::Potential(vec![MissingCriterion::Qf, MissingCriterion::Territory])
        );
    }

    #[test]
    fn known_failure_wins_over_missing_information() {
        let mut municipal = aid("ville", AmountRule::fixed(1_500));
        municipal.criteria.qf_max = Some(800);
        municipal.criteria.territory_codes = vec!["69123".to_string()];
        let mut ctx = context();
        ctx.qf = Some(1_200);

        let verdict = evaluate(&municipal, &ctx);

        assert_eq!(
            verdict,
            Verdict::Ineligible(IneligibilityReason::QfAboveCeiling {
                qf: 1_200,
                qf_max: 800
            })
        );
    }

    #[test]
    fn period_and_category_mismatch_make_the_aid_not_applicable() {
        let mut holidays = aid("vacances", AmountRule::per_day(1_000));
        holidays.criteria.period = PeriodApplicability::Vacances;
        assert_eq!(evaluate(&holidays, &context()), Verdict::NotApplicable);

        let mut music = aid("musique", AmountRule::fixed(2_000));
        music.criteria.categories = vec!["musique".to_string()];
        assert_eq!(evaluate(&music, &context()), Verdict::NotApplicable);
    }

    #[test]
    fn unknown_category_keeps_the_aid_potential() {
        let mut sport = aid("sport", AmountRule::fixed(2_000));
        sport.criteria.categories = vec!["sport".to_string()];
        let mut ctx = context();
        ctx.categories.clear();

        assert_eq!(
            evaluate(&sport, &ctx),
            Verdict::Potential(vec![MissingCriterion::Category])
        );
    }

    #[test]
    fn document_verification_keeps_a_fully_decided_aid_potential() {
        let mut ccas = aid("ccas", AmountRule::percentage(80));
        ccas.criteria.requires_social_condition = true;
        ccas.criteria.requires_document_verification = true;
        let mut ctx = context();
        ctx.social_condition = TriState::Yes;

        assert_eq!(
            evaluate(&ccas, &ctx),
            Verdict::Potential(vec![MissingCriterion::DocumentVerification])
        );
        assert!(!MissingCriterion::DocumentVerification.resolvable_by_input());
    }

    #[test]
    fn per_day_aid_needs_a_duration() {
        let holidays = aid("journee", AmountRule::per_day(1_000));
        let mut ctx = context();
        ctx.duration_days = None;

        assert_eq!(
            evaluate(&holidays, &ctx),
            Verdict::Potential(vec![MissingCriterion::DurationDays])
        );

        ctx.duration_days = Some(5);
        assert_eq!(evaluate(&holidays, &ctx), Verdict::Eligible);
    }

    #[test]
    fn evaluation_is_repeatable() {
        let mut municipal = aid("ville", AmountRule::fixed(1_500));
        municipal.criteria.qf_max = Some(800);
        let partial = context();
        let mut enriched = context();
        enriched.qf = Some(600);

        let first = evaluate(&municipal, &partial);
        let _ = evaluate(&municipal, &enriched);
        let second = evaluate(&municipal, &partial);

        assert_eq!(first, second);
        assert_eq!(evaluate(&municipal, &enriched), Verdict::Eligible);
    }
}
