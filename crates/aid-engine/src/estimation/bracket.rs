//! QF bracket classifier used by the standalone simulator.

use std::io::Read;

use serde::{Deserialize, Serialize};

/// One labeled QF range mapped to a flat amount. `qf_max = None` means open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QfBracket {
    pub label: String,
    pub qf_min: u32,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub qf_max: Option<u32>,
    pub amount_cents: u32,
}

/// How a QF landed in its bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketMatch {
    InRange,
    /// Missing or non-positive QF: lowest bracket by policy.
    DefaultedToLowest,
    /// QF above the last bound: top bracket by policy.
    ClampedToTop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketAssignment {
    pub label: String,
    pub amount_cents: u32,
    pub matched: BracketMatch,
}

/// Ordered barème. Brackets are contiguous and ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bareme {
    brackets: Vec<QfBracket>,
}

impl Bareme {
    pub fn new(brackets: Vec<QfBracket>) -> Result<Self, BaremeError> {
        if brackets.is_empty() {
            return Err(BaremeError::Invalid("barème has no brackets".to_string()));
        }
        for (index, bracket) in brackets.iter().enumerate() {
            let is_last = index + 1 == brackets.len();
            match bracket.qf_max {
                Some(max) if max < bracket.qf_min => {
                    return Err(BaremeError::Invalid(format!(
                        "bracket '{}' has qf_max below qf_min",
                        bracket.label
                    )));
                }
                None if !is_last => {
                    return Err(BaremeError::Invalid(format!(
                        "only the last bracket may be open-ended ('{}' is not last)",
                        bracket.label
                    )));
                }
                _ => {}
            }
            if let Some(next) = brackets.get(index + 1) {
                let expected = bracket.qf_max.map(|max| max.saturating_add(1));
                if expected != Some(next.qf_min) {
                    return Err(BaremeError::Invalid(format!(
                        "bracket '{}' must start right after '{}'",
                        next.label, bracket.label
                    )));
                }
            }
        }
        Ok(Self { brackets })
    }

    /// Reads `label,qf_min,qf_max,amount_cents` rows; the last `qf_max` may be blank.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, BaremeError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut brackets = Vec::new();
        for row in csv_reader.deserialize::<QfBracket>() {
            brackets.push(row?);
        }
        Self::new(brackets)
    }

    /// Municipal-style default table.
    pub fn standard() -> Self {
        let bracket = |label: &str, qf_min, qf_max, amount_cents| QfBracket {
            label: label.to_string(),
            qf_min,
            qf_max: Some(qf_max),
            amount_cents,
        };
        Self {
            brackets: vec![
                bracket("T1", 0, 450, 9_000),
                bracket("T2", 451, 700, 6_000),
                bracket("T3", 701, 1_000, 3_500),
                bracket("T4", 1_001, 1_400, 1_500),
                bracket("T5", 1_401, 1_800, 1_000),
            ],
        }
    }

    pub fn brackets(&self) -> &[QfBracket] {
        &self.brackets
    }

    /// Map a raw QF to its bracket. Never fails: out-of-table values follow policy.
    pub fn classify(&self, qf: Option<i64>) -> BracketAssignment {
        let lowest = &self.brackets[0];
        let top = &self.brackets[self.brackets.len() - 1];

        let qf = match qf {
            Some(value) if value > 0 => value,
            _ => return assignment(lowest, BracketMatch::DefaultedToLowest),
        };

        for bracket in &self.brackets {
            let above_min = qf >= i64::from(bracket.qf_min);
            let below_max = bracket.qf_max.map_or(true, |max| qf <= i64::from(max));
            if above_min && below_max {
                return assignment(bracket, BracketMatch::InRange);
            }
        }

        if qf < i64::from(lowest.qf_min) {
            assignment(lowest, BracketMatch::DefaultedToLowest)
        } else {
            assignment(top, BracketMatch::ClampedToTop)
        }
    }
}

fn assignment(bracket: &QfBracket, matched: BracketMatch) -> BracketAssignment {
    BracketAssignment {
        label: bracket.label.clone(),
        amount_cents: bracket.amount_cents,
        matched,
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BaremeError {
    #[error("failed to read barème: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid barème: {0}")]
    Invalid(String),
}
