use super::catalog::{AmountKind, AmountRule};
use super::context::EligibilityContext;

/// Value of an eligible aid. `None` when an input the rule needs is missing.
pub fn confirmed_amount(rule: &AmountRule, context: &EligibilityContext) -> Option<u32> {
    let raw = match rule.kind {
        AmountKind::Fixed => u64::from(rule.value),
        AmountKind::PerDay => u64::from(rule.value) * u64::from(context.duration_days?),
        AmountKind::Percentage => percent_of(context.price_cents, rule.value),
    };
    Some(bounded(raw, rule, context.price_cents))
}

/// Upper-bound value of a potential aid, assuming every missing input goes our way.
///
/// This is never a confirmed amount.
pub fn possible_amount(rule: &AmountRule, context: &EligibilityContext) -> u32 {
    let raw = match rule.kind {
        AmountKind::Fixed => u64::from(rule.value),
        AmountKind::PerDay => match context.duration_days {
            Some(days) => u64::from(rule.value) * u64::from(days),
            None => u64::MAX,
        },
        AmountKind::Percentage => percent_of(context.price_cents, rule.value),
    };
    bounded(raw, rule, context.price_cents)
}

fn percent_of(price_cents: u32, percent: u32) -> u64 {
    u64::from(price_cents) * u64::from(percent) / 100
}

// Aid cap first, then the activity price. Unsigned, so the zero floor holds by type.
fn bounded(raw: u64, rule: &AmountRule, price_cents: u32) -> u32 {
    let capped = match rule.cap_cents {
        Some(cap) => raw.min(u64::from(cap)),
        None => raw,
    };
    capped.min(u64::from(price_cents)) as u32
}
