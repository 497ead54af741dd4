use super::eligibility::MissingCriterion;
use super::result::EstimateResult;

/// Short guidance line for the family, derived only from the result.
///
/// Amounts are left out on purpose: currency formatting belongs to the caller.
pub fn guidance(result: &EstimateResult) -> String {
    if result.catalog_degraded {
        return "Aid information is temporarily unavailable; the price shown does not include any aid yet.".to_string();
    }

    let confirmed = result.confirmed.len();
    let refinable = result.totals.potential_cents > 0;
    let missing = || result.potential.iter().flat_map(|aid| aid.missing.iter().copied());
    let prompt = if missing().any(MissingCriterion::is_household_detail) {
        Some("Tell us a bit more about your household")
    } else if missing().any(MissingCriterion::is_activity_detail) {
        Some("Add the activity's category and duration")
    } else {
        None
    };

    match (confirmed > 0, refinable, prompt) {
        (true, true, Some(prompt)) => format!(
            "Good news: {} already reduce{} the cost. {prompt} to see if you qualify for more.",
            aid_count(confirmed),
            if confirmed == 1 { "s" } else { "" }
        ),
        (true, true, None) => format!(
            "Good news: {} reduce{} the cost. Other aids may apply once the funder has checked your supporting documents.",
            aid_count(confirmed),
            if confirmed == 1 { "s" } else { "" }
        ),
        (true, false, _) => format!(
            "Good news: {} reduce{} the cost of this activity.",
            aid_count(confirmed),
            if confirmed == 1 { "s" } else { "" }
        ),
        (false, true, Some(prompt)) => format!("Some aids may apply. {prompt} to find out."),
        (false, true, None) => {
            "Some aids may apply once the funder has checked your supporting documents.".to_string()
        }
        (false, false, _) => "No aid applies to this activity with the information provided.".to_string(),
    }
}

fn aid_count(count: usize) -> String {
    if count == 1 {
        "1 aid".to_string()
    } else {
        format!("{count} aids")
    }
}
