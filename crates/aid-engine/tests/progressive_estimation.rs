//! End-to-end behavior of the progressive estimation protocol through the public API.
//!
//! Scenarios use a small catalog loaded from JSON, the same way a deployment would feed
//! the engine.

use aid_engine::estimation::{
    estimate, simulate, standard_catalog, AidCatalog, AidStatus, Bareme, BracketMatch,
    CatalogSnapshot, ConfidenceLevel, EligibilityContext, EstimationSession, EstimationStage,
    MissingCriterion, PeriodType, ProfileInputs, ProgressiveEstimator, QuickInputs, TriState,
};
use serde_json::json;

fn scenario_catalog() -> CatalogSnapshot {
    let rows = json!([
        {
            "id": "national-sport",
            "name": "Aide nationale au sport",
            "short_label": "Sport national",
            "territory_level": "national",
            "criteria": { "age_min": 6, "age_max": 17, "categories": ["sport"] },
            "amount": { "kind": "fixed", "value": 2500 }
        },
        {
            "id": "municipal",
            "name": "Aide municipale aux loisirs",
            "short_label": "Ville",
            "territory_level": "commune",
            "criteria": { "age_min": 3, "age_max": 17, "qf_max": 800 },
            "amount": { "kind": "fixed", "value": 1500 }
        }
    ]);
    let catalog =
        AidCatalog::from_json_reader(rows.to_string().as_bytes()).expect("valid catalog");
    CatalogSnapshot::available(catalog)
}

fn scenario_quick() -> QuickInputs {
    QuickInputs {
        child_age: Some(12),
        price_cents: Some(6_000),
        period: Some(PeriodType::Scolaire),
        categories: vec!["sport".to_string()],
        duration_days: None,
    }
}

fn with_qf(qf: i64) -> ProfileInputs {
    ProfileInputs {
        qf: Some(qf),
        ..ProfileInputs::default()
    }
}

#[test]
fn quick_stage_confirms_national_aid_and_flags_municipal_as_potential() {
    let snapshot = scenario_catalog();
    let estimator = ProgressiveEstimator::new();
    let mut session = EstimationSession::new();

    let result = estimator
        .quick(&snapshot, &mut session, &scenario_quick())
        .expect("quick estimate");

    assert_eq!(result.stage, EstimationStage::Quick);
    assert_eq!(result.confirmed.len(), 1);
    assert_eq!(result.confirmed[0].aid_id.0, "national-sport");
    assert_eq!(result.confirmed[0].amount_cents, Some(2_500));
    assert_eq!(result.potential.len(), 1);
    assert_eq!(result.potential[0].aid_id.0, "municipal");
    assert_eq!(result.potential[0].missing, vec![MissingCriterion::Qf]);
    assert_eq!(result.totals.reste_actuel_cents, 3_500);
    assert_eq!(result.totals.reste_estime_cents, 2_000);
    assert_eq!(result.confidence, ConfidenceLevel::Low);
    assert!(result.guidance.contains("Tell us a bit more"));
}

#[test]
fn fast_stage_with_low_qf_confirms_municipal_aid() {
    let snapshot = scenario_catalog();
    let estimator = ProgressiveEstimator::new();
    let mut session = EstimationSession::new();
    estimator
        .quick(&snapshot, &mut session, &scenario_quick())
        .expect("quick estimate");

    let result = estimator
        .fast(&snapshot, &mut session, &with_qf(600))
        .expect("fast estimate");

    assert_eq!(result.totals.confirmed_cents, 4_000);
    assert_eq!(result.totals.reste_actuel_cents, 2_000);
    assert!(result.potential.is_empty());
    assert_eq!(result.confidence, ConfidenceLevel::High);
    assert_eq!(session.stage(), EstimationStage::Fast);
}

#[test]
fn fast_stage_with_high_qf_rules_municipal_aid_out() {
    let snapshot = scenario_catalog();
    let estimator = ProgressiveEstimator::new();
    let mut session = EstimationSession::new();
    estimator
        .quick(&snapshot, &mut session, &scenario_quick())
        .expect("quick estimate");

    let result = estimator
        .fast(&snapshot, &mut session, &with_qf(1_200))
        .expect("fast estimate");

    assert_eq!(result.totals.confirmed_cents, 2_500);
    assert_eq!(result.totals.potential_cents, 0);
    let municipal = result.find("municipal").expect("municipal listed");
    assert_eq!(municipal.status, AidStatus::Ineligible);
    assert!(municipal
        .reason()
        .expect("reason given")
        .contains("above ceiling 800"));
}

#[test]
fn cumulative_aids_are_capped_at_the_activity_price() {
    let rows = json!([
        {
            "id": "half",
            "name": "Demi-tarif",
            "short_label": "50%",
            "territory_level": "region",
            "criteria": { "age_min": 0, "age_max": 25 },
            "amount": { "kind": "percentage", "value": 50 }
        },
        {
            "id": "flat",
            "name": "Forfait",
            "short_label": "8 €",
            "territory_level": "commune",
            "criteria": { "age_min": 0, "age_max": 25 },
            "amount": { "kind": "fixed", "value": 800 }
        }
    ]);
    let catalog = AidCatalog::from_json_reader(rows.to_string().as_bytes()).expect("valid");
    let snapshot = CatalogSnapshot::available(catalog);
    let context = EligibilityContext::new(10, 1_000, PeriodType::Vacances);

    let result = estimate(&snapshot, &context, EstimationStage::Quick).expect("estimate");

    assert_eq!(result.confirmed.len(), 2);
    assert_eq!(result.totals.confirmed_cents, 1_000);
    assert_eq!(result.totals.reste_actuel_cents, 0);
    assert_eq!(result.totals.reste_estime_cents, 0);
}

#[test]
fn bracket_classifier_applies_policy_outside_the_table() {
    let bareme = Bareme::standard();
    let lowest = &bareme.brackets()[0];
    let top = &bareme.brackets()[bareme.brackets().len() - 1];

    for qf in [Some(0), Some(-40)] {
        let assignment = bareme.classify(qf);
        assert_eq!(assignment.label, lowest.label);
        assert_eq!(assignment.amount_cents, lowest.amount_cents);
    }

    let clamped = bareme.classify(Some(99_999));
    assert_eq!(clamped.label, top.label);
    assert_eq!(clamped.amount_cents, top.amount_cents);
    assert_eq!(clamped.matched, BracketMatch::ClampedToTop);

    let simulated = simulate(&bareme, Some(99_999), 5_000).expect("simulates");
    assert_eq!(simulated.aid_cents, top.amount_cents);
}

#[test]
fn reset_then_replay_reproduces_the_quick_result() {
    let snapshot = scenario_catalog();
    let estimator = ProgressiveEstimator::new();
    let mut session = EstimationSession::new();

    let original = estimator
        .quick(&snapshot, &mut session, &scenario_quick())
        .expect("quick estimate");
    estimator
        .fast(&snapshot, &mut session, &with_qf(600))
        .expect("fast estimate");

    estimator.reset(&mut session);
    assert_eq!(session.stage(), EstimationStage::Quick);

    let replayed = estimator
        .quick(&snapshot, &mut session, &scenario_quick())
        .expect("replayed quick estimate");
    assert_eq!(replayed, original);
}

#[test]
fn re_estimating_an_unchanged_context_is_identical() {
    let snapshot = CatalogSnapshot::available(standard_catalog());
    let mut context = EligibilityContext::new(13, 18_000, PeriodType::Vacances);
    context.categories = vec!["sport".to_string()];
    context.qf = Some(650);
    context.caf_affiliation = TriState::Yes;

    for stage in EstimationStage::ordered() {
        let first = estimate(&snapshot, &context, stage).expect("estimate");
        let second = estimate(&snapshot, &context, stage).expect("estimate");
        assert_eq!(first, second);
    }
}

#[test]
fn totals_stay_within_bounds_across_contexts() {
    let snapshot = CatalogSnapshot::available(standard_catalog());

    for age in [0u8, 5, 12, 17, 25] {
        for price in [0u32, 500, 6_000, 40_000] {
            for period in [PeriodType::Scolaire, PeriodType::Vacances] {
                for qf in [None, Some(0), Some(650), Some(2_000)] {
                    let mut context = EligibilityContext::new(age, price, period);
                    context.categories = vec!["sport".to_string()];
                    context.qf = qf;
                    context.duration_days = Some(10);
                    context.territory_code = Some("69123".to_string());
                    context.social_condition = TriState::Yes;

                    for stage in EstimationStage::ordered() {
                        let totals = estimate(&snapshot, &context, stage)
                            .expect("estimate")
                            .totals;
                        assert!(totals.confirmed_cents <= price);
                        assert!(totals.reste_actuel_cents <= price);
                        assert!(totals.reste_estime_cents <= totals.reste_actuel_cents);
                        assert_eq!(
                            totals.reste_actuel_cents,
                            price - totals.confirmed_cents
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn enriching_the_context_never_reopens_a_decided_aid() {
    let snapshot = CatalogSnapshot::available(standard_catalog());
    let estimator = ProgressiveEstimator::new();
    let mut session = EstimationSession::new();

    let quick = estimator
        .quick(
            &snapshot,
            &mut session,
            &QuickInputs {
                child_age: Some(9),
                price_cents: Some(25_000),
                period: Some(PeriodType::Vacances),
                categories: vec!["sport".to_string()],
                duration_days: Some(5),
            },
        )
        .expect("quick");
    let fast = estimator
        .fast(
            &snapshot,
            &mut session,
            &ProfileInputs {
                qf: Some(650),
                caf_affiliation: TriState::Yes,
                social_condition: TriState::No,
                household_children: Some(2),
                ..ProfileInputs::default()
            },
        )
        .expect("fast");
    let complete = estimator
        .complete(
            &snapshot,
            &mut session,
            &aid_engine::estimation::CompleteInputs {
                territory_code: Some("69123".to_string()),
                ..Default::default()
            },
        )
        .expect("complete");

    let stages = [&quick, &fast, &complete];
    for window in stages.windows(2) {
        let (before, after) = (window[0], window[1]);
        for aid in before.confirmed.iter().chain(&before.ineligible) {
            let later = after.find(&aid.aid_id.0).expect("decided aid still listed");
            assert_eq!(later.status, aid.status, "{} flipped", aid.aid_id);
        }
        for aid in &after.potential {
            let earlier = before.find(&aid.aid_id.0).expect("aid listed earlier");
            assert_eq!(earlier.status, AidStatus::Potential);
        }
    }

    assert_eq!(
        complete.find("caf-vacances").map(|aid| aid.status),
        Some(AidStatus::Eligible)
    );
    assert_eq!(
        complete.find("pass-sport").map(|aid| aid.status),
        Some(AidStatus::Ineligible)
    );
}
