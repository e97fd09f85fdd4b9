//! WASM bindings for stowage-engine.
//!
//! Exposes remaining-capacity computation, price estimates and space
//! filtering to the browser booking UI via `wasm-bindgen`, so the quantity
//! pickers and the server-side booking check run the very same code. All
//! complex types are passed as JSON strings.
//!
//! Reservations cross the boundary in the shape the UI already holds them:
//! `{start_date, end_date, qty_small, qty_medium, qty_large}`. Quantities are
//! accepted as signed integers and rejected when negative. Money amounts come
//! back as decimal strings (`"66"`, `"24.15"`) to avoid float rounding.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p stowage-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/src/wasm/ \
//!   target/wasm32-unknown-unknown/release/stowage_engine_wasm.wasm
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stowage_engine::availability::{compute_remaining_capacity, Commitment};
use stowage_engine::dates::{days_between_inclusive, enumerate_days, parse_date, DateRange};
use stowage_engine::pricing::quote;
use stowage_engine::search::{fit, SearchQuery};
use stowage_engine::tier::{TierCounts, TierPrices};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

/// Per-tier quantities as sent by JavaScript. Missing tiers are zero.
#[derive(Deserialize)]
struct CountsInput {
    #[serde(default)]
    small: i64,
    #[serde(default)]
    medium: i64,
    #[serde(default)]
    large: i64,
}

impl CountsInput {
    fn into_counts(self) -> Result<TierCounts, String> {
        TierCounts::from_signed(self.small, self.medium, self.large).map_err(|e| e.to_string())
    }
}

/// One existing reservation of a space, already filtered by the caller.
/// Its `end_date` may not precede its `start_date`.
#[derive(Deserialize)]
struct ReservationInput {
    start_date: String,
    end_date: String,
    #[serde(default)]
    qty_small: i64,
    #[serde(default)]
    qty_medium: i64,
    #[serde(default)]
    qty_large: i64,
}

impl ReservationInput {
    fn into_commitment(self) -> Result<Commitment, String> {
        let range = DateRange::parse(&self.start_date, &self.end_date)
            .and_then(|r| DateRange::checked(r.start, r.end))
            .map_err(|e| e.to_string())?;
        let quantity = TierCounts::from_signed(self.qty_small, self.qty_medium, self.qty_large)
            .map_err(|e| e.to_string())?;
        Ok(Commitment::new(range, quantity))
    }
}

/// A candidate space with its live reservations.
#[derive(Deserialize)]
struct SpaceInput {
    id: String,
    capacity: CountsInput,
    prices: TierPrices,
    #[serde(default)]
    reservations: Vec<ReservationInput>,
}

#[derive(Serialize)]
struct SpaceMatchDto {
    id: String,
    remaining: TierCounts,
    days: u64,
    total: Decimal,
}

// ---------------------------------------------------------------------------
// Helpers: JSON in, JSON out, plain `String` errors
// ---------------------------------------------------------------------------

fn parse_counts_json(json: &str) -> Result<TierCounts, String> {
    let input: CountsInput =
        serde_json::from_str(json).map_err(|e| format!("Invalid counts JSON: {}", e))?;
    input.into_counts()
}

fn parse_reservations_json(json: &str) -> Result<Vec<Commitment>, String> {
    let inputs: Vec<ReservationInput> =
        serde_json::from_str(json).map_err(|e| format!("Invalid reservations JSON: {}", e))?;
    inputs
        .into_iter()
        .map(ReservationInput::into_commitment)
        .collect()
}

fn parse_range(start: &str, end: &str) -> Result<DateRange, String> {
    DateRange::parse(start, end).map_err(|e| e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn remaining_capacity_json(
    capacity_json: &str,
    reservations_json: &str,
    start: &str,
    end: &str,
) -> Result<String, String> {
    let capacity = parse_counts_json(capacity_json)?;
    let reservations = parse_reservations_json(reservations_json)?;
    let range = parse_range(start, end)?;
    to_json(&compute_remaining_capacity(capacity, &reservations, range))
}

fn total_price_json(
    prices_json: &str,
    requested_json: &str,
    start: &str,
    end: &str,
) -> Result<String, String> {
    let prices: TierPrices =
        serde_json::from_str(prices_json).map_err(|e| format!("Invalid prices JSON: {}", e))?;
    let requested = parse_counts_json(requested_json)?;
    let range = parse_range(start, end)?;
    to_json(&quote(&prices, requested, range))
}

fn filter_spaces_json(
    spaces_json: &str,
    requested_json: &str,
    start: &str,
    end: &str,
) -> Result<String, String> {
    let spaces: Vec<SpaceInput> =
        serde_json::from_str(spaces_json).map_err(|e| format!("Invalid spaces JSON: {}", e))?;
    let requested = parse_counts_json(requested_json)?;
    let range = parse_range(start, end)?;

    let query = SearchQuery::new(range, requested);
    let mut matches = Vec::new();
    for space in spaces {
        let capacity = space.capacity.into_counts()?;
        let reservations = space
            .reservations
            .into_iter()
            .map(ReservationInput::into_commitment)
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(found) = fit(capacity, &space.prices, &reservations, &query) {
            matches.push(SpaceMatchDto {
                id: space.id,
                remaining: found.remaining,
                days: found.estimate.days,
                total: found.estimate.total,
            });
        }
    }
    to_json(&matches)
}

fn day_count(start: &str, end: &str) -> Result<u32, String> {
    let start = parse_date(start).map_err(|e| e.to_string())?;
    let end = parse_date(end).map_err(|e| e.to_string())?;
    u32::try_from(days_between_inclusive(start, end)).map_err(|e| e.to_string())
}

fn days_json(start: &str, end: &str) -> Result<String, String> {
    let range = parse_range(start, end)?;
    let days: Vec<String> = enumerate_days(range.start, range.end)
        .map(|day| day.to_string())
        .collect();
    to_json(&days)
}

fn classifier_reply_json(reply: &str) -> Result<String, String> {
    let counts = stowage_engine::parse_classifier_reply(reply).map_err(|e| e.to_string())?;
    to_json(&counts)
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Remaining bookable quantity per tier for a space over an inclusive range.
///
/// Returns a JSON string `{small, medium, large}`. An inverted range yields
/// zero on every tier.
///
/// # Arguments
/// - `capacity_json` -- `{small, medium, large}` capacity of the space
/// - `reservations_json` -- array of `{start_date, end_date, qty_small, qty_medium, qty_large}`,
///   already stripped of rejected reservations
/// - `start`, `end` -- `YYYY-MM-DD` calendar dates, both inclusive
#[wasm_bindgen(js_name = "computeRemainingCapacity")]
pub fn compute_remaining_capacity_js(
    capacity_json: &str,
    reservations_json: &str,
    start: &str,
    end: &str,
) -> Result<String, JsValue> {
    remaining_capacity_json(capacity_json, reservations_json, start, end)
        .map_err(|e| JsValue::from_str(&e))
}

/// Price estimate for the requested items over an inclusive range.
///
/// Returns a JSON string `{days, daily_total, total}` with the money amounts
/// as decimal strings.
#[wasm_bindgen(js_name = "computeTotalPrice")]
pub fn compute_total_price_js(
    prices_json: &str,
    requested_json: &str,
    start: &str,
    end: &str,
) -> Result<String, JsValue> {
    total_price_json(prices_json, requested_json, start, end).map_err(|e| JsValue::from_str(&e))
}

/// Keep the spaces that can take the requested items on every day of the range.
///
/// `spaces_json` is an array of `{id, capacity, prices, reservations}`.
/// Returns a JSON array of `{id, remaining, days, total}` in input order.
#[wasm_bindgen(js_name = "filterAvailableSpaces")]
pub fn filter_available_spaces_js(
    spaces_json: &str,
    requested_json: &str,
    start: &str,
    end: &str,
) -> Result<String, JsValue> {
    filter_spaces_json(spaces_json, requested_json, start, end).map_err(|e| JsValue::from_str(&e))
}

/// Number of calendar days between two dates, counting both ends.
#[wasm_bindgen(js_name = "daysBetweenInclusive")]
pub fn days_between_inclusive_js(start: &str, end: &str) -> Result<u32, JsValue> {
    day_count(start, end).map_err(|e| JsValue::from_str(&e))
}

/// Every calendar day from `start` to `end` inclusive, as a JSON array of
/// `YYYY-MM-DD` strings.
#[wasm_bindgen(js_name = "enumerateDays")]
pub fn enumerate_days_js(start: &str, end: &str) -> Result<String, JsValue> {
    days_json(start, end).map_err(|e| JsValue::from_str(&e))
}

/// Turn a raw item-classifier reply into `{small, medium, large}` counts.
#[wasm_bindgen(js_name = "parseClassifierReply")]
pub fn parse_classifier_reply_js(reply: &str) -> Result<String, JsValue> {
    classifier_reply_json(reply).map_err(|e| JsValue::from_str(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn parse(s: &str) -> Value {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn remaining_capacity_uses_ui_reservation_shape() {
        let reservations = json!([
            {"start_date": "2024-06-10", "end_date": "2024-06-12", "qty_small": 1, "qty_medium": 1, "qty_large": 0}
        ])
        .to_string();
        let out = remaining_capacity_json(
            r#"{"small": 2, "medium": 1, "large": 0}"#,
            &reservations,
            "2024-06-11",
            "2024-06-13",
        )
        .unwrap();
        assert_eq!(parse(&out), json!({"small": 1, "medium": 0, "large": 0}));
    }

    #[test]
    fn negative_quantities_are_rejected() {
        let reservations =
            json!([{"start_date": "2024-06-10", "end_date": "2024-06-12", "qty_small": -1}]).to_string();
        let err = remaining_capacity_json(r#"{"small": 2}"#, &reservations, "2024-06-11", "2024-06-13")
            .unwrap_err();
        assert!(err.contains("non-negative"), "{err}");

        assert!(parse_counts_json(r#"{"large": -3}"#).is_err());
    }

    #[test]
    fn reservation_ending_before_it_starts_is_rejected() {
        let reservations = json!([
            {"start_date": "2024-06-12", "end_date": "2024-06-10", "qty_small": 1}
        ])
        .to_string();
        let err = remaining_capacity_json(r#"{"small": 1}"#, &reservations, "2024-06-10", "2024-06-12")
            .unwrap_err();
        assert!(err.contains("is after end"), "{err}");

        let spaces = json!([{
            "id": "box",
            "capacity": {"small": 1},
            "prices": {"small": 1},
            "reservations": [{"start_date": "2024-06-12", "end_date": "2024-06-10", "qty_small": 1}]
        }])
        .to_string();
        assert!(filter_spaces_json(&spaces, r#"{"small": 1}"#, "2024-06-10", "2024-06-12").is_err());
    }

    #[test]
    fn total_price_returns_decimal_strings() {
        let out = total_price_json(
            r#"{"small": 2, "medium": 5, "large": 10}"#,
            r#"{"small": 1, "large": 2}"#,
            "2024-05-01",
            "2024-05-03",
        )
        .unwrap();
        assert_eq!(parse(&out), json!({"days": 3, "daily_total": "22", "total": "66"}));
    }

    #[test]
    fn filter_keeps_matching_spaces_in_order() {
        let spaces = json!([
            {
                "id": "trastero",
                "capacity": {"small": 2, "medium": 1},
                "prices": {"small": 1, "medium": 3},
                "reservations": [
                    {"start_date": "2024-06-10", "end_date": "2024-06-12", "qty_small": 1, "qty_medium": 1}
                ]
            },
            {
                "id": "garaje",
                "capacity": {"small": 4, "medium": 2},
                "prices": {"small": "1.50", "medium": 2}
            }
        ])
        .to_string();

        let out = filter_spaces_json(&spaces, r#"{"small": 1, "medium": 1}"#, "2024-06-11", "2024-06-13")
            .unwrap();
        assert_eq!(
            parse(&out),
            json!([{"id": "garaje", "remaining": {"small": 4, "medium": 2, "large": 0}, "days": 3, "total": "10.50"}])
        );
    }

    #[test]
    fn malformed_dates_are_reported() {
        let err = remaining_capacity_json(r#"{"small": 1}"#, "[]", "2024-13-01", "2024-12-31").unwrap_err();
        assert!(err.starts_with("Invalid date"), "{err}");
        assert!(day_count("yesterday", "2024-01-01").is_err());
    }

    #[test]
    fn day_helpers() {
        assert_eq!(day_count("2024-05-03", "2024-05-01").unwrap(), 3);
        assert_eq!(
            parse(&days_json("2024-02-28", "2024-03-01").unwrap()),
            json!(["2024-02-28", "2024-02-29", "2024-03-01"])
        );
    }

    #[test]
    fn classifier_reply_in_code_fence() {
        let out = classifier_reply_json("```json\n{\"small\": 2, \"large\": 1}\n```").unwrap();
        assert_eq!(parse(&out), json!({"small": 2, "medium": 0, "large": 1}));
    }
}
