use crate::infra::{deserialize_optional_date, ReferenceData};
use aid_engine::error::AppError;
use aid_engine::estimation::{
    child_age_on, CompleteInputs, EstimateResult, EstimationError, EstimationSession,
    EstimationStage, ProfileInputs, ProgressiveEstimator, QuickInputs,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Cumulative inputs for one estimate; the server keeps no session between requests.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EstimateRequest {
    pub(crate) stage: EstimationStage,
    pub(crate) quick: QuickInputs,
    /// Used to derive `quick.child_age` when the age is not given directly.
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) birth_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) profile: ProfileInputs,
    #[serde(default)]
    pub(crate) complete: CompleteInputs,
}

#[derive(Debug, Serialize)]
pub(crate) struct EstimateResponse {
    pub(crate) min_aid_cents: u32,
    pub(crate) max_aid_cents: u32,
    #[serde(flatten)]
    pub(crate) result: EstimateResult,
}

impl From<EstimateResult> for EstimateResponse {
    fn from(result: EstimateResult) -> Self {
        Self {
            min_aid_cents: result.totals.min_aid_cents(),
            max_aid_cents: result.totals.max_aid_cents(),
            result,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SimulateRequest {
    #[serde(default)]
    pub(crate) qf: Option<i64>,
    pub(crate) price_cents: i64,
}

/// Replay the stages up to the requested one in a fresh session.
pub(crate) fn replay_estimate(
    reference: &ReferenceData,
    request: EstimateRequest,
) -> Result<EstimateResult, AppError> {
    let EstimateRequest {
        stage,
        mut quick,
        birth_date,
        today,
        profile,
        complete,
    } = request;

    if quick.child_age.is_none() {
        if let Some(birth_date) = birth_date {
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            let age = child_age_on(birth_date, today).ok_or(EstimationError::InvalidInput {
                field: "birth_date",
                reason: format!("{birth_date} is after {today}"),
            })?;
            quick.child_age = Some(i64::from(age));
        }
    }

    let estimator = ProgressiveEstimator::new();
    let mut session = EstimationSession::new();
    let snapshot = &reference.snapshot;

    let mut result = estimator.quick(snapshot, &mut session, &quick)?;
    if stage >= EstimationStage::Fast {
        result = estimator.fast(snapshot, &mut session, &profile)?;
    }
    if stage == EstimationStage::Complete {
        result = estimator.complete(snapshot, &mut session, &complete)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> EstimateRequest {
        serde_json::from_value(value).expect("valid request")
    }

    #[test]
    fn derives_age_from_birth_date() {
        let reference = ReferenceData::standard();
        let result = replay_estimate(
            &reference,
            request(json!({
                "stage": "quick",
                "quick": { "price_cents": 12000, "period": "scolaire", "categories": ["sport"] },
                "birth_date": "2014-05-10",
                "today": "2025-09-01"
            })),
        )
        .expect("estimate");

        let pass_sport = result.find("pass-sport").expect("listed");
        assert_eq!(result.stage, EstimationStage::Quick);
        assert!(pass_sport.missing.contains(
            &aid_engine::estimation::MissingCriterion::SocialCondition
        ));
    }

    #[test]
    fn future_birth_date_is_rejected() {
        let reference = ReferenceData::standard();
        let err = replay_estimate(
            &reference,
            request(json!({
                "stage": "quick",
                "quick": { "price_cents": 12000, "period": "scolaire" },
                "birth_date": "2030-01-01",
                "today": "2025-09-01"
            })),
        )
        .expect_err("future birth date");

        assert!(matches!(
            err,
            AppError::Estimation(EstimationError::InvalidInput {
                field: "birth_date",
                ..
            })
        ));
    }

    #[test]
    fn complete_stage_replays_every_earlier_stage() {
        let reference = ReferenceData::standard();
        let result = replay_estimate(
            &reference,
            request(json!({
                "stage": "complete",
                "quick": { "child_age": 9, "price_cents": 30000, "period": "scolaire", "categories": ["sport"] },
                "profile": { "qf": 500, "social_condition": "yes", "household_children": 3 },
                "complete": { "territory_code": "69123" }
            })),
        )
        .expect("estimate");

        assert_eq!(result.stage, EstimationStage::Complete);
        assert_eq!(result.totals.confirmed_cents, 9_500);
    }
}
