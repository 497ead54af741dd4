use serde::{Deserialize, Serialize};

use super::catalog::{AidDefinition, AidId, TerritoryLevel};
use super::eligibility::{AidStatus, IneligibilityReason, MissingCriterion};
use super::progressive::EstimationStage;

/// One aid as judged against one context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatedAid {
    pub aid_id: AidId,
    pub name: String,
    pub short_label: String,
    pub territory_level: TerritoryLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_group: Option<String>,
    pub status: AidStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<MissingCriterion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ineligibility: Option<IneligibilityReason>,
    /// Present only for eligible aids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_cents: Option<u32>,
    /// Optimistic upper bound, present only for potential aids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub possible_amount_cents: Option<u32>,
}

impl EvaluatedAid {
    pub(crate) fn from_definition(aid: &AidDefinition, status: AidStatus) -> Self {
        Self {
            aid_id: aid.id.clone(),
            name: aid.name.clone(),
            short_label: aid.short_label.clone(),
            territory_level: aid.territory_level,
            exclusive_group: aid.combinability.group().map(str::to_string),
            status,
            missing: Vec::new(),
            ineligibility: None,
            amount_cents: None,
            possible_amount_cents: None,
        }
    }

    pub fn reason(&self) -> Option<String> {
        if let Some(reason) = &self.ineligibility {
            return Some(reason.summary());
        }
        if self.missing.is_empty() {
            return None;
        }
        let labels: Vec<&str> = self.missing.iter().map(|m| m.label()).collect();
        Some(labels.join(", "))
    }
}

/// Monetary totals derived by the aggregator, all in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateTotals {
    pub price_cents: u32,
    pub confirmed_cents: u32,
    pub potential_cents: u32,
    pub reste_actuel_cents: u32,
    pub reste_estime_cents: u32,
}

impl EstimateTotals {
    /// Aid the family can count on.
    pub fn min_aid_cents(&self) -> u32 {
        self.confirmed_cents
    }

    /// Aid if every potential aid comes through, bounded by the price.
    pub fn max_aid_cents(&self) -> u32 {
        self.price_cents - self.reste_estime_cents
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub const fn label(self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
        }
    }
}

/// Indicative estimate handed to the presentation layer. Never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateResult {
    pub stage: EstimationStage,
    pub confirmed: Vec<EvaluatedAid>,
    pub potential: Vec<EvaluatedAid>,
    pub ineligible: Vec<EvaluatedAid>,
    /// Confirmed aids dropped because a better aid of the same exclusive group applies.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub superseded: Vec<EvaluatedAid>,
    pub totals: EstimateTotals,
    pub confidence: ConfidenceLevel,
    pub guidance: String,
    pub catalog_degraded: bool,
}

impl EstimateResult {
    pub fn find(&self, id: &str) -> Option<&EvaluatedAid> {
        self.confirmed
            .iter()
            .chain(&self.potential)
            .chain(&self.ineligible)
            .chain(&self.superseded)
            .find(|aid| aid.aid_id.0 == id)
    }
}
