use std::collections::BTreeMap;

use super::{
    AidCatalog, AidDefinition, AidId, AmountRule, Combinability, EligibilityCriteria,
    PeriodApplicability, TerritoryLevel,
};
use crate::estimation::context::SchoolLevel;

fn criteria(age_min: u8, age_max: u8) -> EligibilityCriteria {
    EligibilityCriteria {
        age_min,
        age_max,
        qf_max: None,
        categories: Vec::new(),
        period: PeriodApplicability::All,
        territory_codes: Vec::new(),
        requires_caf_affiliation: false,
        requires_social_condition: false,
        school_levels: Vec::new(),
        min_household_children: None,
        requires_document_verification: false,
    }
}

fn aid(
    id: &str,
    name: &str,
    short_label: &str,
    territory_level: TerritoryLevel,
    criteria: EligibilityCriteria,
    amount: AmountRule,
) -> AidDefinition {
    AidDefinition {
        id: AidId(id.to_string()),
        name: name.to_string(),
        short_label: short_label.to_string(),
        territory_level,
        criteria,
        amount,
        combinability: Combinability::Cumulative,
        active: true,
        metadata: BTreeMap::new(),
    }
}

/// Built-in catalog used when no catalog file is configured.
///
/// Amounts are indicative; deployments are expected to ship their own catalog.
pub fn standard_catalog() -> AidCatalog {
    let definitions = vec![
        aid(
            "pass-sport",
            "Pass'Sport",
            "Pass'Sport",
            TerritoryLevel::National,
            EligibilityCriteria {
                categories: vec!["sport".to_string()],
                requires_social_condition: true,
                ..criteria(6, 17)
            },
            AmountRule::fixed(5_000),
        ),
        aid(
            "caf-vacances",
            "Aide aux vacances enfants",
            "AVE CAF",
            TerritoryLevel::National,
            EligibilityCriteria {
                qf_max: Some(700),
                period: PeriodApplicability::Vacances,
                requires_caf_affiliation: true,
                ..criteria(3, 17)
            },
            AmountRule::per_day(1_200).capped(24_000),
        ),
        aid(
            "region-pass-jeunes",
            "Pass Jeunes Région",
            "Pass Région",
            TerritoryLevel::Region,
            EligibilityCriteria {
                qf_max: Some(1_000),
                categories: vec!["sport".to_string(), "culture".to_string()],
                school_levels: vec![SchoolLevel::College, SchoolLevel::Lycee],
                ..criteria(11, 18)
            },
            AmountRule::percentage(30).capped(10_000),
        ),
        aid(
            "metropole-loisirs",
            "Chèque Loisirs Métropole",
            "Chèque Loisirs",
            TerritoryLevel::Metropole,
            EligibilityCriteria {
                qf_max: Some(900),
                territory_codes: vec!["69123".to_string(), "69266".to_string()],
                ..criteria(3, 16)
            },
            AmountRule::fixed(3_000),
        ),
        aid(
            "commune-famille-nombreuse",
            "Coup de pouce familles nombreuses",
            "Familles nombreuses",
            TerritoryLevel::Commune,
            EligibilityCriteria {
                qf_max: Some(800),
                territory_codes: vec!["69123".to_string()],
                min_household_children: Some(3),
                ..criteria(4, 14)
            },
            AmountRule::fixed(1_500),
        ),
        aid(
            "ccas-secours",
            "Aide exceptionnelle CCAS",
            "CCAS",
            TerritoryLevel::Commune,
            EligibilityCriteria {
                territory_codes: vec!["69123".to_string()],
                requires_social_condition: true,
                requires_document_verification: true,
                ..criteria(0, 25)
            },
            AmountRule::percentage(80).capped(15_000),
        ),
    ];

    AidCatalog { aids: definitions }
}
