use std::collections::BTreeMap;

use crate::estimation::catalog::{
    AidCatalog, AidDefinition, AidId, AmountRule, CatalogSnapshot, Combinability,
    EligibilityCriteria, PeriodApplicability, TerritoryLevel,
};
use crate::estimation::context::{EligibilityContext, PeriodType};
use crate::estimation::eligibility::AidStatus;
use crate::estimation::progressive::EstimationStage;
use crate::estimation::result::{ConfidenceLevel, EstimateResult, EstimateTotals, EvaluatedAid};

/// Aid for children aged 3-17 with no other condition.
pub(crate) fn aid(id: &str, amount: AmountRule) -> AidDefinition {
    AidDefinition {
        id: AidId(id.to_string()),
        name: format!("Aide {id}"),
        short_label: id.to_string(),
        territory_level: TerritoryLevel::National,
        criteria: EligibilityCriteria {
            age_min: 3,
            age_max: 17,
            qf_max: None,
            categories: Vec::new(),
            period: PeriodApplicability::All,
            territory_codes: Vec::new(),
            requires_caf_affiliation: false,
            requires_social_condition: false,
            school_levels: Vec::new(),
            min_household_children: None,
            requires_document_verification: false,
        },
        amount,
        combinability: Combinability::Cumulative,
        active: true,
        metadata: BTreeMap::new(),
    }
}

/// Twelve-year-old, 60 € school-term sport activity, one day.
pub(crate) fn context() -> EligibilityContext {
    let mut context = EligibilityContext::new(12, 6_000, PeriodType::Scolaire);
    context.categories = vec!["sport".to_string()];
    context.duration_days = Some(1);
    context
}

pub(crate) fn evaluated(aid: &AidDefinition, status: AidStatus, cents: u32) -> EvaluatedAid {
    let mut evaluated = EvaluatedAid::from_definition(aid, status);
    match status {
        AidStatus::Eligible => evaluated.amount_cents = Some(cents),
        AidStatus::Potential => evaluated.possible_amount_cents = Some(cents),
        AidStatus::Ineligible => {}
    }
    evaluated
}

pub(crate) fn empty_result(price_cents: u32) -> EstimateResult {
    EstimateResult {
        stage: EstimationStage::Quick,
        confirmed: Vec::new(),
        potential: Vec::new(),
        ineligible: Vec::new(),
        superseded: Vec::new(),
        totals: EstimateTotals {
            price_cents,
            confirmed_cents: 0,
            potential_cents: 0,
            reste_actuel_cents: price_cents,
            reste_estime_cents: price_cents,
        },
        confidence: ConfidenceLevel::Low,
        guidance: String::new(),
        catalog_degraded: false,
    }
}

/// National 25 € aid for sport plus a municipal 15 € aid capped at QF 800.
pub(crate) fn scenario_snapshot() -> CatalogSnapshot {
    let mut national = aid("national-sport", AmountRule::fixed(2_500));
    national.criteria.categories = vec!["sport".to_string()];

    let mut municipal = aid("municipal", AmountRule::fixed(1_500));
    municipal.territory_level = TerritoryLevel::Commune;
    municipal.criteria.qf_max = Some(800);

    let catalog = AidCatalog::new(vec![national, municipal]).expect("valid catalog");
    CatalogSnapshot::available(catalog)
}
