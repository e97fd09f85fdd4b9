//! Free-text item descriptions to per-tier item counts.
//!
//! Classification itself is an external service (a language model asked to
//! bucket "2 bikes and a sofa" into small/medium/large). This module defines
//! the seam and turns the service's raw textual reply into [`TierCounts`].

use serde_json::Value;

use crate::error::{Result, StowageError};
use crate::tier::{Tier, TierCounts};

/// Classifies a free-text description of the items a renter wants to store.
pub trait ItemClassifier {
    fn classify(&self, description: &str) -> Result<TierCounts>;
}

impl<F> ItemClassifier for F
where
    F: Fn(&str) -> Result<TierCounts>,
{
    fn classify(&self, description: &str) -> Result<TierCounts> {
        self(description)
    }
}

/// Parse a classifier reply such as `{ "small": 0, "medium": 2, "large": 1 }`.
///
/// Tolerates Markdown code fences and chatter around the JSON object. Missing
/// tiers count as zero.
///
/// # Errors
/// - `Classification` if no JSON object can be found or a count is not a
///   whole number
/// - `InvalidInput` if a count is negative
pub fn parse_classifier_reply(reply: &str) -> Result<TierCounts> {
    let cleaned = reply.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let object = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(open), Some(close)) if open < close => &cleaned[open..=close],
        _ => {
            return Err(StowageError::Classification(format!(
                "no JSON object in reply: {cleaned:?}"
            )))
        }
    };

    let value: Value = serde_json::from_str(object)
        .map_err(|e| StowageError::Classification(format!("malformed reply: {e}")))?;

    let mut counts = TierCounts::ZERO;
    for tier in Tier::ALL {
        let count = match value.get(tier.as_str()) {
            None | Some(Value::Null) => 0,
            Some(raw) => whole_count(tier, raw)?,
        };
        counts.set(tier, count);
    }
    Ok(counts)
}

fn whole_count(tier: Tier, raw: &Value) -> Result<u32> {
    let number = raw.as_f64().ok_or_else(|| {
        StowageError::Classification(format!("{tier} count is not a number: {raw}"))
    })?;
    if number < 0.0 {
        return Err(StowageError::InvalidInput(format!(
            "{tier} count must be non-negative, got {raw}"
        )));
    }
    if number.fract() != 0.0 || number > f64::from(u32::MAX) {
        return Err(StowageError::Classification(format!(
            "{tier} count is not a whole number: {raw}"
        )));
    }
    Ok(number as u32)
}
