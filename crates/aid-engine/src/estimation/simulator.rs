use serde::{Deserialize, Serialize};
use tracing::debug;

use super::bracket::{Bareme, BracketMatch};
use super::error::EstimationError;

/// Result of the simplified, bracket-only simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub bracket_label: String,
    pub matched: BracketMatch,
    pub price_cents: u32,
    pub aid_cents: u32,
    pub reste_a_charge_cents: u32,
}

/// Estimate a flat bracket aid for a raw QF and price.
///
/// Unlike the full engine, a missing or non-positive QF is not an error here.
pub fn simulate(
    bareme: &Bareme,
    qf: Option<i64>,
    price_cents: i64,
) -> Result<SimulationOutcome, EstimationError> {
    if price_cents < 0 {
        return Err(EstimationError::invalid(
            "price_cents",
            format!("{price_cents} is negative"),
        ));
    }
    let price_cents = u32::try_from(price_cents).map_err(|_| {
        EstimationError::invalid("price_cents", format!("{price_cents} is too large"))
    })?;

    let assignment = bareme.classify(qf);
    let aid_cents = assignment.amount_cents.min(price_cents);
    debug!(bracket = %assignment.label, aid_cents, "simulated bracket aid");

    Ok(SimulationOutcome {
        bracket_label: assignment.label,
        matched: assignment.matched,
        price_cents,
        aid_cents,
        reste_a_charge_cents: price_cents - aid_cents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_amount_is_deducted_from_price() {
        let outcome = simulate(&Bareme::standard(), Some(800), 12_000).expect("simulates");
        assert_eq!(outcome.bracket_label, "T3");
        assert_eq!(outcome.aid_cents, 3_500);
        assert_eq!(outcome.reste_a_charge_cents, 8_500);
    }

    #[test]
    fn aid_never_exceeds_price() {
        let outcome = simulate(&Bareme::standard(), None, 4_000).expect("simulates");
        assert_eq!(outcome.matched, BracketMatch::DefaultedToLowest);
        assert_eq!(outcome.aid_cents, 4_000);
        assert_eq!(outcome.reste_a_charge_cents, 0);
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = simulate(&Bareme::standard(), Some(300), -1).expect_err("rejected");
        assert!(matches!(
            err,
            EstimationError::InvalidInput {
                field: "price_cents",
                ..
            }
        ));
    }
}
