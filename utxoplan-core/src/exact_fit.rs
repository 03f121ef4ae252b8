//! Exact-fit search
//!
//! Looks for a fixed number of inputs whose total lands inside a narrow band
//! above the payment, so the transaction can be sent without a change output.
//! The band is not literal subset-sum equality: anything between
//! `target + ceil(0.9 * fee_no_change)` and `target + max(fee_with_change, dust)`
//! is accepted.
//!
//! The search is a bounded, pure function over a slice of values sorted in
//! descending order. Its only state is an increasing list of indices into that
//! slice (the working combination). Every forward scan costs one work unit per
//! value in the slice, and the search gives up once the budget is spent.
//!
//! ```
//! use utxoplan_core::exact_fit::{find_exact_fit, FitWindow, SearchBudget, SearchOutcome};
//!
//! let values = [70_000, 40_000, 31_769];
//! let window = FitWindow::new(100_000, 1_770, 2_080, 546).unwrap();
//!
//! let outcome = find_exact_fit(&values, 2, &window, SearchBudget::default());
//! assert_eq!(outcome, SearchOutcome::Found(vec![0, 2]));
//! ```

use utxoplan_common::config::DEFAULT_SEARCH_BUDGET;
use utxoplan_common::error::PlanResult;
use utxoplan_common::math;

/// Acceptable input-sum band for a no-change transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitWindow {
    /// Smallest acceptable input sum
    pub min_sum: u64,
    /// Largest acceptable input sum
    pub max_sum: u64,
}

impl FitWindow {
    /// Build the band for a payment
    ///
    /// # Arguments
    /// * `target` - Payment value
    /// * `fee_no_change` - Measured fee without a change output
    /// * `fee_with_change` - Measured fee with a change output
    /// * `dust` - Dust threshold
    pub fn new(target: u64, fee_no_change: u64, fee_with_change: u64, dust: u64) -> PlanResult<Self> {
        let min_sum = math::checked_add(target, math::mul_ratio_ceil(fee_no_change, 9, 10))?;
        let max_sum = math::checked_add(target, fee_with_change.max(dust))?;
        Ok(Self { min_sum, max_sum })
    }

    pub fn contains(&self, sum: u64) -> bool {
        sum >= self.min_sum && sum <= self.max_sum
    }
}

/// Work budget for one search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget(pub u64);

impl Default for SearchBudget {
    fn default() -> Self {
        SearchBudget(DEFAULT_SEARCH_BUDGET)
    }
}

/// How a search ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Indices (ascending) of the values that fit the window
    Found(Vec<usize>),
    /// Every combination the heuristic visits was tried
    NotFound,
    /// The work budget ran out first
    BudgetExhausted,
}

/// Search `values` for `input_count` entries whose sum lies in `window`
///
/// `values` must be sorted in descending order. The working combination starts
/// as the `input_count - 1` largest values. Each round scans forward past the
/// last index of the combination for a closing value that brings the total
/// into the window. The scan stops early once the total drops below the
/// window, since every later value is smaller still. When no closing value
/// exists, the combination backtracks (see [`advance`]).
///
/// Equal values are picked by position, never twice. Among equal values the
/// earliest one is used.
pub fn find_exact_fit(
    values: &[u64],
    input_count: usize,
    window: &FitWindow,
    budget: SearchBudget,
) -> SearchOutcome {
    if input_count == 0 || input_count > values.len() {
        return SearchOutcome::NotFound;
    }

    let scan_cost = values.len() as u64;
    let mut combo: Vec<usize> = (0..input_count - 1).collect();
    let mut work = 0u64;

    loop {
        if work >= budget.0 {
            return SearchOutcome::BudgetExhausted;
        }
        work = work.saturating_add(scan_cost);

        let partial = sum_of(values, &combo);
        if partial < window.max_sum as u128 {
            let start = combo.last().map_or(0, |last| last + 1);
            for (offset, value) in values[start..].iter().enumerate() {
                let total = partial + *value as u128;
                if total < window.min_sum as u128 {
                    break;
                }
                if total <= window.max_sum as u128 {
                    let mut found = combo.clone();
                    found.push(start + offset);
                    return SearchOutcome::Found(found);
                }
            }
        }

        if !advance(values, &mut combo) {
            return SearchOutcome::NotFound;
        }
    }
}

/// Move the working combination to the next one worth scanning
///
/// Picks the rightmost position that can move to a later index holding a
/// strictly smaller value, while leaving room for the positions after it and
/// for one closing value. Positions after it are refilled with the indices
/// that directly follow. Returns `false` when no position can move.
fn advance(values: &[u64], combo: &mut [usize]) -> bool {
    let len = values.len();
    let width = combo.len();

    for pos in (0..width).rev() {
        let current = combo[pos];
        let needed_after = width - pos;

        let next = (current + 1..len)
            .take_while(|idx| idx + needed_after < len)
            .find(|&idx| values[idx] < values[current]);

        if let Some(next) = next {
            for (offset, slot) in combo[pos..].iter_mut().enumerate() {
                *slot = next + offset;
            }
            return true;
        }
    }

    false
}

fn sum_of(values: &[u64], combo: &[usize]) -> u128 {
    combo.iter().map(|&idx| values[idx] as u128).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_rightmost_position_first() {
        let values = [50, 40, 30, 20, 10];
        let mut combo = vec![0, 1];
        assert!(advance(&values, &mut combo));
        assert_eq!(combo, vec![0, 2]);
    }

    #[test]
    fn advance_skips_equal_values() {
        let values = [50, 40, 40, 40, 10, 5];
        let mut combo = vec![1];
        assert!(advance(&values, &mut combo));
        assert_eq!(combo, vec![4]);
    }

    #[test]
    fn advance_refills_following_positions() {
        let values = [50, 40, 30, 20, 10];
        let mut combo = vec![0, 3];
        assert!(advance(&values, &mut combo));
        assert_eq!(combo, vec![1, 2]);
    }

    #[test]
    fn advance_stops_when_no_room_is_left() {
        let values = [50, 40, 30];
        let mut combo = vec![1];
        assert!(!advance(&values, &mut combo));
    }
}
