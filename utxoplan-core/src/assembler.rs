//! Transaction assembler
//!
//! Turns a chosen input list and output set into an [`UnsignedTransactionPlan`]
//! and implements the change-output fallback. Legacy inputs carry their full
//! previous transaction in the PSBT, so it is decoded and checked against the
//! input here.

use bitcoin::absolute::LockTime;
use bitcoin::consensus;
use bitcoin::psbt::PartiallySignedTransaction;
use bitcoin::{ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use serde_json::json;

use utxoplan_common::error::{PlanError, PlanResult};
use utxoplan_common::logging::{self, LogContext, LogLevel};
use utxoplan_common::math;
use utxoplan_common::types::{is_dust, InputScriptKind, PlannedOutput, UnspentOutput};

use crate::fee_oracle::{FeeEstimate, FeeOracle};
use crate::plan::{PlanKind, UnsignedTransactionPlan};
use crate::request::SelectionRequest;

/// Result of trying to build a change-bearing plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Change above dust; the plan has two outputs
    Built(UnsignedTransactionPlan),
    /// Change at or below dust
    NotProfitable {
        /// Computed change (0 if the fee ate all of it)
        change: u64,
    },
}

/// Build the unsigned transaction spending `inputs` into `outputs`
pub fn unsigned_transaction(inputs: &[UnspentOutput], outputs: &[PlannedOutput]) -> Transaction {
    Transaction {
        version: 2,
        lock_time: LockTime::ZERO,
        input: inputs
            .iter()
            .map(|utxo| TxIn {
                previous_output: utxo.outpoint(),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
            .collect(),
        output: outputs
            .iter()
            .map(|output| TxOut {
                value: output.value,
                script_pubkey: output.script_pubkey(),
            })
            .collect(),
    }
}

/// Assemble a plan from its parts
///
/// The fee paid is `sum(inputs) - sum(outputs)`; `measured` is what the fee
/// oracle reported for this composition.
///
/// # Arguments
/// * `inputs` - Inputs in transaction order
/// * `outputs` - Outputs in transaction order
/// * `change_index` - Position of the change output, if any
/// * `kind` - How the plan was reached
/// * `measured` - Size and fee measured for exactly these inputs and outputs
/// * `input_kind` - Script kind of the inputs, selects the PSBT UTXO fields
///
/// # Returns
/// * The plan, or an error if the outputs exceed the inputs or a legacy
///   input's previous transaction is missing or wrong
pub fn build_plan(
    inputs: Vec<UnspentOutput>,
    outputs: Vec<PlannedOutput>,
    change_index: Option<usize>,
    kind: PlanKind,
    measured: FeeEstimate,
    input_kind: InputScriptKind,
) -> PlanResult<UnsignedTransactionPlan> {
    let input_sum = math::checked_sum(inputs.iter().map(|u| u.value))?;
    let output_sum = math::checked_sum(outputs.iter().map(|o| o.value))?;
    let estimated_fee = input_sum
        .checked_sub(output_sum)
        .ok_or(PlanError::InsufficientFunds {
            available: input_sum,
            required: output_sum,
        })?;

    let mut psbt = PartiallySignedTransaction::from_unsigned_tx(unsigned_transaction(
        &inputs, &outputs,
    ))?;

    for (psbt_input, utxo) in psbt.inputs.iter_mut().zip(&inputs) {
        match input_kind {
            InputScriptKind::P2wpkh => {
                psbt_input.witness_utxo = Some(TxOut {
                    value: utxo.value,
                    script_pubkey: utxo.script_pubkey.clone(),
                });
            }
            InputScriptKind::P2pkh => {
                psbt_input.non_witness_utxo = Some(previous_transaction(utxo)?);
            }
        }
    }

    logging::log_planner(
        LogLevel::Debug,
        LogContext::Assembly,
        "Assembled unsigned transaction",
        Some(json!({
            "kind": format!("{:?}", kind),
            "inputs": inputs.len(),
            "outputs": outputs.len(),
            "estimated_fee": estimated_fee,
            "required_fee": measured.fee,
        })),
    );

    Ok(UnsignedTransactionPlan {
        inputs,
        outputs,
        change_index,
        estimated_fee,
        required_fee: measured.fee,
        vsize: measured.vsize,
        kind,
        psbt,
    })
}

/// Build a plan with a payment and a change output
///
/// Measures the two-output fee for `inputs`, then computes
/// `change = sum(inputs) - fee - payment`. Change at or below the dust
/// threshold is reported as [`ChangeOutcome::NotProfitable`].
pub fn build_change_transaction(
    oracle: &mut FeeOracle,
    request: &SelectionRequest,
    inputs: Vec<UnspentOutput>,
) -> PlanResult<ChangeOutcome> {
    let measured = oracle.estimate_fee(
        &inputs,
        &[request.payment_txout(), request.change_txout()],
        request.fee_rate,
        request.input_kind,
        request.network,
    )?;

    let input_sum = math::checked_sum(inputs.iter().map(|u| u.value))?;
    let change = input_sum
        .saturating_sub(measured.fee)
        .saturating_sub(request.target_value);

    if is_dust(change, request.dust_threshold) {
        logging::log_planner(
            LogLevel::Debug,
            LogContext::Assembly,
            "Change is not above the dust threshold",
            Some(json!({ "change": change, "dust_threshold": request.dust_threshold })),
        );
        return Ok(ChangeOutcome::NotProfitable { change });
    }

    let outputs = vec![request.payment(), request.change(change)];
    build_plan(
        inputs,
        outputs,
        Some(1),
        PlanKind::WithChange,
        measured,
        request.input_kind,
    )
    .map(ChangeOutcome::Built)
}

/// Build a single-output plan whose fee absorbs the leftover
///
/// Fails with `ChangeNotProfitable` if the leftover does not even cover the
/// measured no-change fee.
pub fn build_absorbed_plan(
    oracle: &mut FeeOracle,
    request: &SelectionRequest,
    inputs: Vec<UnspentOutput>,
    change: u64,
) -> PlanResult<UnsignedTransactionPlan> {
    let measured = oracle.estimate_fee(
        &inputs,
        &[request.payment_txout()],
        request.fee_rate,
        request.input_kind,
        request.network,
    )?;

    let input_sum = math::checked_sum(inputs.iter().map(|u| u.value))?;
    let paid = input_sum.saturating_sub(request.target_value);
    if paid < measured.fee {
        return Err(PlanError::ChangeNotProfitable {
            change,
            dust: request.dust_threshold,
        });
    }

    build_plan(
        inputs,
        vec![request.payment()],
        None,
        PlanKind::DustAbsorbed,
        measured,
        request.input_kind,
    )
}

/// Decode and check the previous transaction of a legacy input
fn previous_transaction(utxo: &UnspentOutput) -> PlanResult<Transaction> {
    let raw = utxo
        .previous_raw_tx
        .as_ref()
        .ok_or(PlanError::MissingPreviousTransaction {
            outpoint: utxo.outpoint(),
        })?;

    let mismatch = || PlanError::PreviousTransactionMismatch {
        outpoint: utxo.outpoint(),
    };

    let tx: Transaction = consensus::deserialize(raw).map_err(|_| mismatch())?;
    if tx.txid() != utxo.txid {
        return Err(mismatch());
    }

    match tx.output.get(utxo.vout as usize) {
        Some(output) if output.value == utxo.value => Ok(tx),
        _ => Err(mismatch()),
    }
}
