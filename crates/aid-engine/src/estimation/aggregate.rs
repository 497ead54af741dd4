use std::collections::BTreeMap;

use tracing::error;

use super::error::EstimationError;
use super::result::{EstimateTotals, EvaluatedAid};

/// Keep at most one confirmed aid per exclusive group: the largest, ties to the first.
///
/// Returns `(kept, superseded)`, both in input order.
pub fn resolve_exclusive_groups(
    confirmed: Vec<EvaluatedAid>,
) -> (Vec<EvaluatedAid>, Vec<EvaluatedAid>) {
    let winning: Vec<usize> = {
        let mut winners: BTreeMap<&str, (usize, u32)> = BTreeMap::new();
        for (index, aid) in confirmed.iter().enumerate() {
            let Some(group) = aid.exclusive_group.as_deref() else {
                continue;
            };
            let amount = aid.amount_cents.unwrap_or(0);
            winners
                .entry(group)
                .and_modify(|best| {
                    if amount > best.1 {
                        *best = (index, amount);
                    }
                })
                .or_insert((index, amount));
        }
        winners.values().map(|(index, _)| *index).collect()
    };

    let mut kept = Vec::new();
    let mut superseded = Vec::new();
    for (index, aid) in confirmed.into_iter().enumerate() {
        if aid.exclusive_group.is_none() || winning.contains(&index) {
            kept.push(aid);
        } else {
            superseded.push(aid);
        }
    }
    (kept, superseded)
}

/// Sum and cap the amounts, then derive what the family still owes.
pub fn compute_totals(
    price_cents: u32,
    confirmed: &[EvaluatedAid],
    potential: &[EvaluatedAid],
) -> Result<EstimateTotals, EstimationError> {
    let raw_confirmed: u64 = confirmed
        .iter()
        .map(|aid| u64::from(aid.amount_cents.unwrap_or(0)))
        .sum();
    let raw_potential: u64 = potential
        .iter()
        .map(|aid| u64::from(aid.possible_amount_cents.unwrap_or(0)))
        .sum();

    let price = u64::from(price_cents);
    let confirmed_cents = raw_confirmed.min(price);
    let potential_cents = raw_potential.min(u64::from(u32::MAX));
    let reste_actuel = price - confirmed_cents;
    let reste_estime = reste_actuel.saturating_sub(potential_cents);

    let totals = EstimateTotals {
        price_cents,
        confirmed_cents: confirmed_cents as u32,
        potential_cents: potential_cents as u32,
        reste_actuel_cents: reste_actuel as u32,
        reste_estime_cents: reste_estime as u32,
    };
    check_invariants(&totals)?;
    Ok(totals)
}

pub(crate) fn check_invariants(totals: &EstimateTotals) -> Result<(), EstimationError> {
    let detail = if totals.confirmed_cents > totals.price_cents {
        Some(format!(
            "confirmed total {} exceeds price {}",
            totals.confirmed_cents, totals.price_cents
        ))
    } else if totals.reste_actuel_cents > totals.price_cents {
        Some(format!(
            "reste actuel {} exceeds price {}",
            totals.reste_actuel_cents, totals.price_cents
        ))
    } else if totals.reste_estime_cents > totals.reste_actuel_cents {
        Some(format!(
            "reste estimé {} exceeds reste actuel {}",
            totals.reste_estime_cents, totals.reste_actuel_cents
        ))
    } else {
        None
    };

    match detail {
        Some(detail) => {
            error!(%detail, "estimate invariant violated");
            Err(EstimationError::ComputationInvariantViolation { detail })
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::catalog::AmountRule;
    use crate::estimation::eligibility::AidStatus;
    use crate::estimation::tests::common::{aid, evaluated};

    #[test]
    fn confirmed_total_is_capped_at_price() {
        let confirmed = vec![
            evaluated(&aid("half", AmountRule::percentage(50)), AidStatus::Eligible, 500),
            evaluated(&aid("fixed", AmountRule::fixed(800)), AidStatus::Eligible, 800),
        ];

        let totals = compute_totals(1_000, &confirmed, &[]).expect("totals");

        assert_eq!(totals.confirmed_cents, 1_000);
        assert_eq!(totals.reste_actuel_cents, 0);
        assert_eq!(totals.reste_estime_cents, 0);
    }

    #[test]
    fn potential_total_narrows_the_estimate_without_going_negative() {
        let confirmed = vec![evaluated(
            &aid("national", AmountRule::fixed(2_500)),
            AidStatus::Eligible,
            2_500,
        )];
        let potential = vec![
            evaluated(&aid("ville", AmountRule::fixed(1_500)), AidStatus::Potential, 1_500),
            evaluated(&aid("region", AmountRule::fixed(3_000)), AidStatus::Potential, 3_000),
        ];

        let totals = compute_totals(6_000, &confirmed, &potential).expect("totals");

        assert_eq!(totals.potential_cents, 4_500);
        assert_eq!(totals.reste_actuel_cents, 3_500);
        assert_eq!(totals.reste_estime_cents, 0);
        assert_eq!(totals.max_aid_cents(), 6_000);
        assert_eq!(totals.min_aid_cents(), 2_500);
    }

    #[test]
    fn exclusive_group_keeps_the_largest_aid() {
        let mut small = aid("small", AmountRule::fixed(1_000));
        small.combinability = crate::estimation::catalog::Combinability::Exclusive {
            group: "ville".to_string(),
        };
        let mut large = aid("large", AmountRule::fixed(2_000));
        large.combinability = small.combinability.clone();
        let free = aid("free", AmountRule::fixed(500));

        let (kept, superseded) = resolve_exclusive_groups(vec![
            evaluated(&small, AidStatus::Eligible, 1_000),
            evaluated(&free, AidStatus::Eligible, 500),
            evaluated(&large, AidStatus::Eligible, 2_000),
        ]);

        let kept_ids: Vec<&str> = kept.iter().map(|aid| aid.aid_id.0.as_str()).collect();
        assert_eq!(kept_ids, vec!["free", "large"]);
        assert_eq!(superseded.len(), 1);
        assert_eq!(superseded[0].aid_id.0, "small");
    }

    #[test]
    fn invariant_check_flags_inconsistent_totals() {
        let broken = EstimateTotals {
            price_cents: 1_000,
            confirmed_cents: 200,
            potential_cents: 0,
            reste_actuel_cents: 800,
            reste_estime_cents: 900,
        };

        let err = check_invariants(&broken).expect_err("violation detected");
        assert!(!err.is_caller_error());
    }
}
