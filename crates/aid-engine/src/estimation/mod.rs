//! Financial-aid eligibility and estimation core.
//!
//! Every entry point takes an immutable catalog snapshot and an immutable context and
//! returns a new value. Nothing here performs I/O except the catalog providers, whose
//! failures degrade to an empty catalog.

pub mod aggregate;
pub mod amount;
pub mod bracket;
pub mod catalog;
pub mod context;
pub mod eligibility;
mod engine;
mod error;
pub mod messaging;
pub mod progressive;
pub mod result;
pub mod simulator;

#[cfg(test)]
mod tests;

pub use bracket::{Bareme, BaremeError, BracketAssignment, BracketMatch, QfBracket};
pub use catalog::{
    standard_catalog, AidCatalog, AidCatalogProvider, AidDefinition, AidId, AmountKind,
    AmountRule, CatalogAvailability, CatalogError, CatalogSnapshot, Combinability,
    EligibilityCriteria, JsonFileCatalogProvider, PeriodApplicability, StaticCatalogProvider,
    TerritoryLevel,
};
pub use context::{
    child_age_on, CompleteInputs, EligibilityContext, PeriodType, ProfileInputs, QuickInputs,
    SchoolLevel, TriState,
};
pub use eligibility::{AidStatus, IneligibilityReason, MissingCriterion, Verdict};
pub use engine::estimate;
pub use error::EstimationError;
pub use progressive::{EstimationSession, EstimationStage, ProgressiveEstimator};
pub use result::{ConfidenceLevel, EstimateResult, EstimateTotals, EvaluatedAid};
pub use simulator::{simulate, SimulationOutcome};
