//! Input selector
//!
//! Orders the wallet's unspent outputs by value and finds the smallest prefix
//! of the ordering that pays for the target plus the fee that prefix would
//! cost without a change output.

use log::debug;

use utxoplan_common::error::{PlanError, PlanResult};
use utxoplan_common::math;
use utxoplan_common::types::UnspentOutput;

use crate::fee_oracle::{FeeEstimate, FeeOracle};
use crate::request::SelectionRequest;

/// Result of the minimal-prefix walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimalSelection {
    /// Number of leading inputs of the sorted list
    pub input_count: usize,
    /// Sum of those inputs
    pub input_sum: u64,
    /// Measured no-change fee for exactly that prefix
    pub fee: FeeEstimate,
}

/// Sort unspent outputs by descending value
///
/// The sort is stable: outputs with equal values keep their original order.
pub fn sort_by_value_desc(utxos: &[UnspentOutput]) -> Vec<UnspentOutput> {
    let mut sorted = utxos.to_vec();
    sorted.sort_by(|a, b| b.value.cmp(&a.value));
    sorted
}

/// Find the smallest prefix of `sorted` that covers the target and its own fee
///
/// Inputs are accumulated in order. Once the running sum reaches the target,
/// each further prefix is measured by the fee oracle until one is found whose
/// sum strictly exceeds `target + fee(prefix)`.
///
/// # Arguments
/// * `sorted` - Unspent outputs, already sorted by descending value
/// * `request` - The selection request (target, fee rate, destination, script kind)
/// * `oracle` - Fee oracle of the current session
///
/// # Returns
/// * The prefix length, its sum and its measured fee
/// * `PlanError::InsufficientFunds` when no prefix qualifies. If the whole set is
///   below the target the oracle is never called.
pub fn select_minimal_inputs(
    sorted: &[UnspentOutput],
    request: &SelectionRequest,
    oracle: &mut FeeOracle,
) -> PlanResult<MinimalSelection> {
    let target = request.target_value;
    let available = math::checked_sum(sorted.iter().map(|u| u.value))?;

    if available < target {
        debug!(
            "UTXO set of {} sat cannot cover target {} sat",
            available, target
        );
        return Err(PlanError::InsufficientFunds {
            available,
            required: target,
        });
    }

    let payment = [request.payment_txout()];
    let mut input_sum = 0u64;
    let mut last_required = target;

    for (index, utxo) in sorted.iter().enumerate() {
        input_sum = math::checked_add(input_sum, utxo.value)?;
        if input_sum < target {
            continue;
        }

        let input_count = index + 1;
        let fee = oracle.estimate_fee(
            &sorted[..input_count],
            &payment,
            request.fee_rate,
            request.input_kind,
            request.network,
        )?;
        last_required = math::checked_add(target, fee.fee)?;

        if input_sum > last_required {
            debug!(
                "Minimal prefix: {} inputs, {} sat, no-change fee {} sat",
                input_count, input_sum, fee.fee
            );
            return Ok(MinimalSelection {
                input_count,
                input_sum,
                fee,
            });
        }
    }

    Err(PlanError::InsufficientFunds {
        available,
        required: last_required,
    })
}
