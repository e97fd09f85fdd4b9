//! Tests for remaining-capacity computation over date ranges.

use stowage_engine::availability::{
    can_accommodate, compute_remaining_capacity, daily_usage, peak_usage, Commitment,
};
use stowage_engine::dates::DateRange;
use stowage_engine::tier::TierCounts;

// ── Helpers ─────────────────────────────────────────────────────────────────

fn range(start: &str, end: &str) -> DateRange {
    DateRange::parse(start, end).unwrap()
}

fn commit(start: &str, end: &str, small: u32, medium: u32, large: u32) -> Commitment {
    Commitment::new(range(start, end), TierCounts::new(small, medium, large))
}

fn small(n: u32) -> TierCounts {
    TierCounts::new(n, 0, 0)
}

// ── Empty reservations ──────────────────────────────────────────────────────

#[test]
fn no_reservations_leaves_capacity_untouched() {
    let capacity = TierCounts::new(4, 2, 1);
    let none: [Commitment; 0] = [];
    assert_eq!(
        compute_remaining_capacity(capacity, &none, range("2024-01-01", "2024-12-31")),
        capacity
    );
}

// ── Peak day, not sum ───────────────────────────────────────────────────────

#[test]
fn disjoint_reservations_only_count_the_one_inside_the_range() {
    let reservations = [
        commit("2024-01-01", "2024-01-05", 2, 0, 0),
        commit("2024-01-10", "2024-01-15", 2, 0, 0),
    ];
    let remaining =
        compute_remaining_capacity(small(3), &reservations, range("2024-01-01", "2024-01-05"));
    assert_eq!(remaining, small(1));
}

#[test]
fn range_spanning_two_disjoint_reservations_uses_the_busiest_day() {
    // Both fall inside the range, but never on the same day.
    let reservations = [
        commit("2024-01-01", "2024-01-05", 2, 0, 0),
        commit("2024-01-10", "2024-01-15", 2, 0, 0),
    ];
    let remaining =
        compute_remaining_capacity(small(3), &reservations, range("2024-01-01", "2024-01-15"));
    assert_eq!(remaining, small(1));
}

// ── Overlap attribution ─────────────────────────────────────────────────────

#[test]
fn overlapping_reservations_stack_and_floor_at_zero() {
    let reservations = [
        commit("2024-03-01", "2024-03-10", 3, 0, 0),
        commit("2024-03-05", "2024-03-08", 3, 0, 0),
    ];
    let window = range("2024-03-05", "2024-03-08");
    assert_eq!(peak_usage(&reservations, window), small(6));
    assert_eq!(
        compute_remaining_capacity(small(5), &reservations, window),
        TierCounts::ZERO
    );
}

#[test]
fn partial_overlap_counts_on_each_touched_day_without_prorating() {
    // Only the last day of the reservation falls inside the window.
    let reservations = [commit("2024-02-01", "2024-02-10", 0, 2, 0)];
    let remaining = compute_remaining_capacity(
        TierCounts::new(0, 3, 0),
        &reservations,
        range("2024-02-10", "2024-02-20"),
    );
    assert_eq!(remaining, TierCounts::new(0, 1, 0));
}

#[test]
fn reservation_ending_the_day_before_does_not_count() {
    let reservations = [commit("2024-02-01", "2024-02-09", 0, 3, 0)];
    let remaining = compute_remaining_capacity(
        TierCounts::new(0, 3, 0),
        &reservations,
        range("2024-02-10", "2024-02-20"),
    );
    assert_eq!(remaining, TierCounts::new(0, 3, 0));
}

#[test]
fn tiers_are_tracked_independently() {
    // Small peaks on the 2nd, large peaks on the 4th.
    let reservations = [
        commit("2024-04-01", "2024-04-02", 2, 0, 0),
        commit("2024-04-02", "2024-04-03", 1, 0, 1),
        commit("2024-04-04", "2024-04-04", 0, 0, 2),
    ];
    let peak = peak_usage(&reservations, range("2024-04-01", "2024-04-04"));
    assert_eq!(peak, TierCounts::new(3, 0, 2));
}

// ── Single-day and inverted ranges ──────────────────────────────────────────

#[test]
fn single_day_range_evaluates_exactly_that_day() {
    let reservations = [
        commit("2024-05-01", "2024-05-01", 1, 0, 0),
        commit("2024-05-02", "2024-05-02", 2, 0, 0),
    ];
    let day = range("2024-05-02", "2024-05-02");
    assert_eq!(compute_remaining_capacity(small(3), &reservations, day), small(1));
    assert_eq!(daily_usage(&reservations, day).len(), 1);
}

#[test]
fn inverted_range_has_zero_capacity() {
    let none: [Commitment; 0] = [];
    let inverted = range("2024-05-03", "2024-05-01");
    assert_eq!(
        compute_remaining_capacity(TierCounts::new(5, 5, 5), &none, inverted),
        TierCounts::ZERO
    );
    assert!(daily_usage(&none, inverted).is_empty());
    assert!(!can_accommodate(TierCounts::new(5, 5, 5), &none, inverted, small(1)));
}

// ── Bounds ──────────────────────────────────────────────────────────────────

#[test]
fn remaining_never_exceeds_capacity_or_goes_negative() {
    let capacity = TierCounts::new(2, 1, 0);
    let reservations = [
        commit("2024-07-01", "2024-07-31", 5, 5, 5),
        commit("2024-07-15", "2024-07-16", 1, 0, 0),
    ];
    let remaining =
        compute_remaining_capacity(capacity, &reservations, range("2024-07-10", "2024-07-20"));
    assert_eq!(remaining, TierCounts::ZERO);
    assert!(remaining.fits_within(&capacity));
}

// ── Daily breakdown ─────────────────────────────────────────────────────────

#[test]
fn daily_usage_lists_every_day_in_order() {
    let reservations = [
        commit("2024-06-10", "2024-06-12", 1, 1, 0),
        commit("2024-06-12", "2024-06-14", 1, 0, 0),
    ];
    let days = daily_usage(&reservations, range("2024-06-11", "2024-06-13"));
    let used: Vec<(String, TierCounts)> = days
        .iter()
        .map(|d| (d.date.to_string(), d.used))
        .collect();
    assert_eq!(
        used,
        vec![
            ("2024-06-11".to_string(), TierCounts::new(1, 1, 0)),
            ("2024-06-12".to_string(), TierCounts::new(2, 1, 0)),
            ("2024-06-13".to_string(), TierCounts::new(1, 0, 0)),
        ]
    );
}

#[test]
fn peak_matches_the_busiest_day_of_the_breakdown() {
    let reservations = [
        commit("2024-08-01", "2024-08-20", 1, 2, 0),
        commit("2024-08-05", "2024-08-06", 3, 0, 1),
        commit("2024-08-06", "2024-08-09", 0, 1, 1),
        commit("2024-08-19", "2024-08-25", 2, 2, 2),
    ];
    let window = range("2024-08-03", "2024-08-21");
    let from_days = daily_usage(&reservations, window)
        .into_iter()
        .fold(TierCounts::ZERO, |acc, d| acc.max(d.used));
    assert_eq!(peak_usage(&reservations, window), from_days);
    assert_eq!(from_days, TierCounts::new(4, 4, 2));
}

// ── End-to-end scenario ─────────────────────────────────────────────────────

#[test]
fn medium_shortfall_excludes_the_space() {
    let capacity = TierCounts::new(2, 1, 0);
    let reservations = [commit("2024-06-10", "2024-06-12", 1, 1, 0)];
    let window = range("2024-06-11", "2024-06-13");

    let remaining = compute_remaining_capacity(capacity, &reservations, window);
    assert_eq!(remaining, TierCounts::new(1, 0, 0));
    assert!(!can_accommodate(
        capacity,
        &reservations,
        window,
        TierCounts::new(1, 1, 0)
    ));
    assert!(can_accommodate(capacity, &reservations, window, small(1)));
}
