//! Aid reference data: the declarative table the evaluator interprets.
//!
//! Each [`AidDefinition`] row fully describes one subsidy. Adding an aid is a data
//! change; the evaluator and calculator never branch on an aid id.

mod fixtures;
mod provider;

pub use fixtures::standard_catalog;
pub use provider::{
    AidCatalogProvider, CatalogAvailability, CatalogSnapshot, JsonFileCatalogProvider,
    StaticCatalogProvider,
};

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use serde::{Deserialize, Serialize};

use super::context::{PeriodType, SchoolLevel};

/// Identifier wrapper for catalog rows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AidId(pub String);

impl std::fmt::Display for AidId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issuing-authority tier of an aid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerritoryLevel {
    National,
    Region,
    Metropole,
    Commune,
}

impl TerritoryLevel {
    pub const fn label(self) -> &'static str {
        match self {
            TerritoryLevel::National => "national",
            TerritoryLevel::Region => "region",
            TerritoryLevel::Metropole => "metropole",
            TerritoryLevel::Commune => "commune",
        }
    }
}

/// Which activity periods an aid covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodApplicability {
    Scolaire,
    Vacances,
    #[default]
    All,
}

impl PeriodApplicability {
    pub fn covers(self, period: PeriodType) -> bool {
        match self {
            PeriodApplicability::All => true,
            PeriodApplicability::Scolaire => period == PeriodType::Scolaire,
            PeriodApplicability::Vacances => period == PeriodType::Vacances,
        }
    }
}

/// Conditions a child, household, and activity must meet.
///
/// Empty collections mean "no restriction".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityCriteria {
    pub age_min: u8,
    pub age_max: u8,
    #[serde(default)]
    pub qf_max: Option<u32>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub period: PeriodApplicability,
    #[serde(default)]
    pub territory_codes: Vec<String>,
    #[serde(default)]
    pub requires_caf_affiliation: bool,
    #[serde(default)]
    pub requires_social_condition: bool,
    #[serde(default)]
    pub school_levels: Vec<SchoolLevel>,
    #[serde(default)]
    pub min_household_children: Option<u8>,
    #[serde(default)]
    pub requires_document_verification: bool,
}

impl EligibilityCriteria {
    pub fn is_income_gated(&self) -> bool {
        self.qf_max.is_some()
    }

    pub fn is_territory_restricted(&self) -> bool {
        !self.territory_codes.is_empty()
    }

    /// `None` means the activity categories are not known yet.
    pub fn matches_categories(&self, activity: &[String]) -> Option<bool> {
        if self.categories.is_empty() {
            return Some(true);
        }
        if activity.is_empty() {
            return None;
        }
        Some(self.categories.iter().any(|wanted| {
            let wanted = category_key(wanted);
            activity
                .iter()
                .any(|offered| category_key(offered) == wanted)
        }))
    }

    fn normalize(&mut self) {
        self.categories = self
            .categories
            .iter()
            .map(|category| category_key(category))
            .filter(|category| !category.is_empty())
            .collect();
        self.territory_codes = self
            .territory_codes
            .iter()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();
    }
}

/// Categories compare trimmed and Unicode-lowercased on both sides.
pub(crate) fn category_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountKind {
    Fixed,
    PerDay,
    Percentage,
}

/// How an aid's value is computed.
///
/// `value` is in cents for `fixed`/`per_day` and a whole percent for `percentage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountRule {
    pub kind: AmountKind,
    pub value: u32,
    #[serde(default)]
    pub cap_cents: Option<u32>,
}

impl AmountRule {
    pub const fn fixed(cents: u32) -> Self {
        Self {
            kind: AmountKind::Fixed,
            value: cents,
            cap_cents: None,
        }
    }

    pub const fn per_day(cents: u32) -> Self {
        Self {
            kind: AmountKind::PerDay,
            value: cents,
            cap_cents: None,
        }
    }

    pub const fn percentage(percent: u32) -> Self {
        Self {
            kind: AmountKind::Percentage,
            value: percent,
            cap_cents: None,
        }
    }

    pub const fn capped(mut self, cap_cents: u32) -> Self {
        self.cap_cents = Some(cap_cents);
        self
    }
}

/// Whether an aid stacks with others.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Combinability {
    #[default]
    Cumulative,
    /// At most one confirmed aid per group survives aggregation.
    Exclusive { group: String },
}

impl Combinability {
    pub fn group(&self) -> Option<&str> {
        match self {
            Combinability::Cumulative => None,
            Combinability::Exclusive { group } => Some(group.as_str()),
        }
    }
}

/// One row of the aid catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AidDefinition {
    pub id: AidId,
    pub name: String,
    pub short_label: String,
    pub territory_level: TerritoryLevel,
    pub criteria: EligibilityCriteria,
    pub amount: AmountRule,
    #[serde(default)]
    pub combinability: Combinability,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Fields the engine does not interpret, kept for the presentation layer.
    #[serde(flatten)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

fn default_active() -> bool {
    true
}

impl AidDefinition {
    pub fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::InvalidDefinition {
            id: self.id.0.clone(),
            reason: reason.to_string(),
        };

        if self.id.0.trim().is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if self.criteria.age_min > self.criteria.age_max {
            return Err(invalid("age_min exceeds age_max"));
        }
        if self.amount.kind == AmountKind::Percentage && self.amount.value > 100 {
            return Err(invalid("percentage above 100"));
        }
        Ok(())
    }
}

/// Immutable, validated set of active aid definitions in catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AidCatalog {
    aids: Vec<AidDefinition>,
}

impl AidCatalog {
    /// Validate and normalize every row, then drop inactive ones.
    ///
    /// Ids must be unique across the whole input, inactive rows included.
    pub fn new(definitions: Vec<AidDefinition>) -> Result<Self, CatalogError> {
        let mut aids = Vec::with_capacity(definitions.len());
        let mut seen = BTreeSet::new();
        for mut definition in definitions {
            definition.validate()?;
            if !seen.insert(definition.id.clone()) {
                return Err(CatalogError::InvalidDefinition {
                    id: definition.id.0.clone(),
                    reason: "duplicate id".to_string(),
                });
            }
            definition.criteria.normalize();
            if definition.active {
                aids.push(definition);
            }
        }
        Ok(Self { aids })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let definitions: Vec<AidDefinition> = serde_json::from_reader(reader)?;
        Self::new(definitions)
    }

    pub fn aids(&self) -> &[AidDefinition] {
        &self.aids
    }

    pub fn get(&self, id: &AidId) -> Option<&AidDefinition> {
        self.aids.iter().find(|aid| &aid.id == id)
    }

    pub fn len(&self) -> usize {
        self.aids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aids.is_empty()
    }
}

/// Failure to obtain or accept catalog data.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("aid catalog unavailable: {0}")]
    Unavailable(String),
    #[error("aid catalog is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("aid definition '{id}' is invalid: {reason}")]
    InvalidDefinition { id: String, reason: String },
}
