//! Unsigned transaction plans
//!
//! A plan is the only thing the planner hands back: the chosen inputs, the
//! outputs, the fee it pays and an unsigned PSBT ready for the caller's signer.
//! Ownership passes to the caller.

use bitcoin::psbt::PartiallySignedTransaction;
use bitcoin::Transaction;
use serde::{Deserialize, Serialize};

use utxoplan_common::types::{PlannedOutput, UnspentOutput};

/// How a plan settles the difference between inputs and payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    /// Inputs found by the exact-fit search; no change output
    ExactFit,
    /// Minimal inputs with a change output back to the source
    WithChange,
    /// Minimal inputs; change at or below dust paid to the miner
    DustAbsorbed,
}

/// A complete, fee-correct unsigned transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransactionPlan {
    pub(crate) inputs: Vec<UnspentOutput>,
    pub(crate) outputs: Vec<PlannedOutput>,
    pub(crate) change_index: Option<usize>,
    pub(crate) estimated_fee: u64,
    pub(crate) required_fee: u64,
    pub(crate) vsize: usize,
    pub(crate) kind: PlanKind,
    pub(crate) psbt: PartiallySignedTransaction,
}

impl UnsignedTransactionPlan {
    /// Inputs in transaction order
    pub fn inputs(&self) -> &[UnspentOutput] {
        &self.inputs
    }

    /// Outputs in transaction order; the payment comes first
    pub fn outputs(&self) -> &[PlannedOutput] {
        &self.outputs
    }

    /// Fee the transaction pays: `sum(inputs) - sum(outputs)`
    pub fn estimated_fee(&self) -> u64 {
        self.estimated_fee
    }

    /// Fee measured for this exact composition: `ceil(vsize * fee_rate)`
    pub fn required_fee(&self) -> u64 {
        self.required_fee
    }

    /// Virtual size of the signed transaction
    pub fn vsize(&self) -> usize {
        self.vsize
    }

    pub fn kind(&self) -> PlanKind {
        self.kind
    }

    /// The change output, if any
    pub fn change_output(&self) -> Option<&PlannedOutput> {
        self.change_index.and_then(|idx| self.outputs.get(idx))
    }

    pub fn has_change(&self) -> bool {
        self.change_index.is_some()
    }

    pub fn input_sum(&self) -> u64 {
        self.inputs.iter().map(|u| u.value).sum()
    }

    pub fn output_sum(&self) -> u64 {
        self.outputs.iter().map(|o| o.value).sum()
    }

    /// The unsigned PSBT, with UTXO information for every input
    pub fn psbt(&self) -> &PartiallySignedTransaction {
        &self.psbt
    }

    /// The unsigned transaction
    pub fn unsigned_tx(&self) -> &Transaction {
        &self.psbt.unsigned_tx
    }

    /// Hand the PSBT to a signer
    pub fn into_psbt(self) -> PartiallySignedTransaction {
        self.psbt
    }

    /// A serializable summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            kind: self.kind,
            inputs: self
                .inputs
                .iter()
                .map(|u| InputSummary {
                    outpoint: u.id(),
                    value: u.value,
                })
                .collect(),
            outputs: self
                .outputs
                .iter()
                .enumerate()
                .map(|(idx, o)| OutputSummary {
                    address: o.address.to_string(),
                    value: o.value,
                    change: Some(idx) == self.change_index,
                })
                .collect(),
            estimated_fee: self.estimated_fee,
            required_fee: self.required_fee,
            vsize: self.vsize,
        }
    }
}

/// JSON-friendly view of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub kind: PlanKind,
    pub inputs: Vec<InputSummary>,
    pub outputs: Vec<OutputSummary>,
    pub estimated_fee: u64,
    pub required_fee: u64,
    pub vsize: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSummary {
    /// `txid:vout`
    pub outpoint: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSummary {
    pub address: String,
    pub value: u64,
    pub change: bool,
}

impl PlanSummary {
    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
