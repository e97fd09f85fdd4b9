//! Space search: keep the spaces that can take the requested items for the
//! whole requested range, and estimate what each would cost.
//!
//! The filter does not care where reservations come from. Callers hand it a
//! lookup, which may hit a repository, an in-memory snapshot or a pre-grouped
//! list; the capacity rule applied is the same in every case.

use serde::{Deserialize, Serialize};

use crate::availability::{compute_remaining_capacity, Occupancy};
use crate::dates::DateRange;
use crate::error::Result;
use crate::pricing::{quote, Quote};
use crate::space::Space;
use crate::tier::{TierCounts, TierPrices};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub range: DateRange,
    #[serde(default)]
    pub requested: TierCounts,
}

impl SearchQuery {
    pub fn new(range: DateRange, requested: TierCounts) -> Self {
        Self { range, requested }
    }
}

/// A space that satisfies the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub space: Space,
    /// Remaining capacity over the queried range, before this booking.
    pub remaining: TierCounts,
    pub estimate: Quote,
}

/// What a capacity can still take over the query range, and the price of the
/// requested items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fit {
    pub remaining: TierCounts,
    pub estimate: Quote,
}

/// `Some` when `capacity`, less the peak usage of `reservations`, can take
/// `query.requested` on every day of `query.range`.
///
/// Shared by server search and the browser bindings, which hold capacity,
/// prices and reservations without a full [`Space`].
pub fn fit<O: Occupancy>(
    capacity: TierCounts,
    unit_prices: &TierPrices,
    reservations: &[O],
    query: &SearchQuery,
) -> Option<Fit> {
    let remaining = compute_remaining_capacity(capacity, reservations, query.range);
    query.requested.fits_within(&remaining).then(|| Fit {
        remaining,
        estimate: quote(unit_prices, query.requested, query.range),
    })
}

/// Filter `spaces` down to those that satisfy `query`, in input order.
///
/// `reservations_for` returns the live reservations of a space; excluding
/// rejected ones is its job.
///
/// # Errors
/// Propagates the first error returned by `reservations_for`.
pub fn filter_available<'a, S, F, O>(
    spaces: S,
    mut reservations_for: F,
    query: &SearchQuery,
) -> Result<Vec<SearchHit>>
where
    S: IntoIterator<Item = &'a Space>,
    F: FnMut(&Space) -> Result<Vec<O>>,
    O: Occupancy,
{
    let mut hits = Vec::new();
    for space in spaces {
        let reservations = reservations_for(space)?;
        if let Some(Fit { remaining, estimate }) =
            fit(space.capacity, &space.prices, &reservations, query)
        {
            hits.push(SearchHit {
                space: space.clone(),
                remaining,
                estimate,
            });
        }
    }
    Ok(hits)
}
