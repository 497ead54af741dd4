use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::catalog::category_key;
use super::error::EstimationError;
use super::progressive::EstimationStage;

/// Oldest child age the engine accepts.
pub const MAX_SUPPORTED_AGE: u8 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Scolaire,
    Vacances,
}

/// Yes / no / not-yet-answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    Yes,
    No,
    #[default]
    Unknown,
}

impl TriState {
    pub fn known(self) -> Option<bool> {
        match self {
            TriState::Yes => Some(true),
            TriState::No => Some(false),
            TriState::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchoolLevel {
    Maternelle,
    Elementaire,
    College,
    Lycee,
    Superieur,
}

/// Everything known about a child, household, and activity at one point in time.
///
/// Built from QUICK inputs and enriched by later stages; fields are only added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityContext {
    pub child_age: u8,
    pub price_cents: u32,
    pub period: PeriodType,
    pub categories: Vec<String>,
    pub duration_days: Option<u32>,
    pub qf: Option<u32>,
    pub territory_code: Option<String>,
    pub household_children: Option<u8>,
    pub caf_affiliation: TriState,
    pub social_condition: TriState,
    pub school_level: Option<SchoolLevel>,
}

impl EligibilityContext {
    /// A context carrying only the fields a QUICK estimate needs.
    pub fn new(child_age: u8, price_cents: u32, period: PeriodType) -> Self {
        Self {
            child_age,
            price_cents,
            period,
            categories: Vec::new(),
            duration_days: None,
            qf: None,
            territory_code: None,
            household_children: None,
            caf_affiliation: TriState::Unknown,
            social_condition: TriState::Unknown,
            school_level: None,
        }
    }

    pub fn from_quick(inputs: &QuickInputs) -> Result<Self, EstimationError> {
        let stage = EstimationStage::Quick;
        let child_age = validate_age(inputs.child_age.ok_or(EstimationError::MissingInput {
            stage,
            field: "child_age",
        })?)?;
        let price_cents = validate_price(inputs.price_cents.ok_or(
            EstimationError::MissingInput {
                stage,
                field: "price_cents",
            },
        )?)?;
        let period = inputs.period.ok_or(EstimationError::MissingInput {
            stage,
            field: "period",
        })?;

        let mut context = Self::new(child_age, price_cents, period);
        context.categories = normalize_categories(&inputs.categories);
        context.duration_days = inputs.duration_days.map(validate_duration).transpose()?;
        Ok(context)
    }

    /// Union QUICK fields into an existing context. Base fields must match.
    pub fn merge_quick(&mut self, inputs: &QuickInputs) -> Result<(), EstimationError> {
        let incoming = Self::from_quick(inputs)?;
        let mut next = self.clone();

        ensure_same("child_age", &next.child_age, &incoming.child_age)?;
        ensure_same("price_cents", &next.price_cents, &incoming.price_cents)?;
        ensure_same("period", &next.period, &incoming.period)?;
        for category in incoming.categories {
            if !next.categories.contains(&category) {
                next.categories.push(category);
            }
        }
        union("duration_days", &mut next.duration_days, incoming.duration_days)?;

        *self = next;
        Ok(())
    }

    /// Union household profile fields (FAST stage and the profile part of COMPLETE).
    pub fn merge_profile(&mut self, inputs: &ProfileInputs) -> Result<(), EstimationError> {
        let mut next = self.clone();

        let qf = inputs.qf.map(validate_qf).transpose()?;
        union("qf", &mut next.qf, qf)?;
        union_tri("caf_affiliation", &mut next.caf_affiliation, inputs.caf_affiliation)?;
        union_tri("social_condition", &mut next.social_condition, inputs.social_condition)?;
        union("school_level", &mut next.school_level, inputs.school_level)?;
        let children = inputs
            .household_children
            .map(validate_children)
            .transpose()?;
        union("household_children", &mut next.household_children, children)?;

        *self = next;
        Ok(())
    }

    /// Union COMPLETE fields: territory plus any profile field not given earlier.
    pub fn merge_complete(&mut self, inputs: &CompleteInputs) -> Result<(), EstimationError> {
        let mut next = self.clone();
        next.merge_profile(&inputs.profile)?;
        let territory = inputs
            .territory_code
            .as_deref()
            .map(validate_territory)
            .transpose()?;
        union("territory_code", &mut next.territory_code, territory)?;

        *self = next;
        Ok(())
    }

    /// Re-check domain bounds on a context built outside the stage inputs.
    pub fn validate(&self) -> Result<(), EstimationError> {
        validate_age(i64::from(self.child_age))?;
        if let Some(duration) = self.duration_days {
            validate_duration(i64::from(duration))?;
        }
        if let Some(children) = self.household_children {
            validate_children(i64::from(children))?;
        }
        if let Some(code) = &self.territory_code {
            validate_territory(code)?;
        }
        Ok(())
    }
}

/// Fields accepted by the QUICK stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickInputs {
    #[serde(default)]
    pub child_age: Option<i64>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub period: Option<PeriodType>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub duration_days: Option<i64>,
}

/// Household profile fields accepted by the FAST stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileInputs {
    #[serde(default)]
    pub qf: Option<i64>,
    #[serde(default)]
    pub caf_affiliation: TriState,
    #[serde(default)]
    pub social_condition: TriState,
    #[serde(default)]
    pub school_level: Option<SchoolLevel>,
    #[serde(default)]
    pub household_children: Option<i64>,
}

/// Fine-grained fields accepted by the COMPLETE stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteInputs {
    #[serde(default)]
    pub territory_code: Option<String>,
    #[serde(flatten)]
    pub profile: ProfileInputs,
}

/// Age in whole years on `on`; `None` when the birth date lies in the future.
pub fn child_age_on(birth_date: NaiveDate, on: NaiveDate) -> Option<u8> {
    if birth_date > on {
        return None;
    }
    let mut years = on.year() - birth_date.year();
    if (on.month(), on.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    u8::try_from(years).ok()
}

fn validate_age(raw: i64) -> Result<u8, EstimationError> {
    if !(0..=i64::from(MAX_SUPPORTED_AGE)).contains(&raw) {
        return Err(EstimationError::invalid(
            "child_age",
            format!("{raw} is outside the supported 0-{MAX_SUPPORTED_AGE} range"),
        ));
    }
    Ok(raw as u8)
}

fn validate_price(raw: i64) -> Result<u32, EstimationError> {
    if raw < 0 {
        return Err(EstimationError::invalid(
            "price_cents",
            format!("{raw} is negative"),
        ));
    }
    u32::try_from(raw)
        .map_err(|_| EstimationError::invalid("price_cents", format!("{raw} is too large")))
}

fn validate_qf(raw: i64) -> Result<u32, EstimationError> {
    if raw < 0 {
        return Err(EstimationError::invalid("qf", format!("{raw} is negative")));
    }
    u32::try_from(raw).map_err(|_| EstimationError::invalid("qf", format!("{raw} is too large")))
}

fn validate_duration(raw: i64) -> Result<u32, EstimationError> {
    if raw < 1 {
        return Err(EstimationError::invalid(
            "duration_days",
            "must be at least one day",
        ));
    }
    u32::try_from(raw)
        .map_err(|_| EstimationError::invalid("duration_days", format!("{raw} is too large")))
}

fn validate_children(raw: i64) -> Result<u8, EstimationError> {
    if raw < 1 {
        return Err(EstimationError::invalid(
            "household_children",
            "household must count at least one child",
        ));
    }
    u8::try_from(raw)
        .map_err(|_| EstimationError::invalid("household_children", format!("{raw} is too large")))
}

fn validate_territory(raw: &str) -> Result<String, EstimationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EstimationError::invalid("territory_code", "must not be blank"));
    }
    Ok(trimmed.to_string())
}

fn normalize_categories(raw: &[String]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for category in raw {
        let normalized = category_key(category);
        if !normalized.is_empty() && !categories.contains(&normalized) {
            categories.push(normalized);
        }
    }
    categories
}

fn ensure_same<T: PartialEq>(
    field: &'static str,
    existing: &T,
    incoming: &T,
) -> Result<(), EstimationError> {
    if existing == incoming {
        Ok(())
    } else {
        Err(already_supplied(field))
    }
}

fn union<T: PartialEq>(
    field: &'static str,
    slot: &mut Option<T>,
    incoming: Option<T>,
) -> Result<(), EstimationError> {
    match (slot.as_ref(), incoming) {
        (_, None) => Ok(()),
        (None, Some(value)) => {
            *slot = Some(value);
            Ok(())
        }
        (Some(existing), Some(value)) if *existing == value => Ok(()),
        (Some(_), Some(_)) => Err(already_supplied(field)),
    }
}

fn union_tri(
    field: &'static str,
    slot: &mut TriState,
    incoming: TriState,
) -> Result<(), EstimationError> {
    match (*slot, incoming) {
        (_, TriState::Unknown) => Ok(()),
        (TriState::Unknown, value) => {
            *slot = value;
            Ok(())
        }
        (existing, value) if existing == value => Ok(()),
        _ => Err(already_supplied(field)),
    }
}

fn already_supplied(field: &'static str) -> EstimationError {
    EstimationError::invalid(
        field,
        "already supplied with a different value; reset to change it",
    )
}
