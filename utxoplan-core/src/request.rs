//! Selection requests
//!
//! A [`SelectionRequest`] is everything one planning call needs: the wallet's
//! unspent outputs, the payment, the fee rate and the policy knobs. It is
//! created per call and only read by the planner.

use bitcoin::{Address, Network, TxOut};
use std::collections::HashSet;

use utxoplan_common::config::PlannerConfig;
use utxoplan_common::error::{PlanError, PlanResult};
use utxoplan_common::types::{
    DustPolicy, FeeRate, InputScriptKind, PlannedOutput, UnspentOutput, DUST_THRESHOLD,
};

/// Parameters of one planning call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRequest {
    /// Available unspent outputs, in the order the caller fetched them
    pub utxos: Vec<UnspentOutput>,
    /// Payment value in satoshis
    pub target_value: u64,
    /// Fee rate in satoshis per virtual byte
    pub fee_rate: FeeRate,
    /// Outputs at or below this value are never created
    pub dust_threshold: u64,
    /// Address the inputs belong to; change is paid back here
    pub source: Address,
    /// Payment destination
    pub destination: Address,
    /// Script kind of every input
    pub input_kind: InputScriptKind,
    /// Network both addresses must belong to
    pub network: Network,
    /// Handling of dust change
    pub dust_policy: DustPolicy,
}

impl SelectionRequest {
    /// Create a request with the default dust threshold, P2WPKH inputs and dust absorption
    ///
    /// The network is taken from the destination address.
    pub fn new(
        utxos: Vec<UnspentOutput>,
        target_value: u64,
        fee_rate: FeeRate,
        source: Address,
        destination: Address,
    ) -> Self {
        let network = destination.network;
        Self {
            utxos,
            target_value,
            fee_rate,
            dust_threshold: DUST_THRESHOLD,
            source,
            destination,
            input_kind: InputScriptKind::default(),
            network,
            dust_policy: DustPolicy::default(),
        }
    }

    /// Set the dust threshold
    pub fn with_dust_threshold(mut self, dust_threshold: u64) -> Self {
        self.dust_threshold = dust_threshold;
        self
    }

    /// Set the input script kind
    pub fn with_input_kind(mut self, input_kind: InputScriptKind) -> Self {
        self.input_kind = input_kind;
        self
    }

    /// Set the dust policy
    pub fn with_dust_policy(mut self, dust_policy: DustPolicy) -> Self {
        self.dust_policy = dust_policy;
        self
    }

    /// Apply configured defaults (dust threshold, script kind, dust policy)
    ///
    /// Fails if the configuration is invalid or names a different network than
    /// the request's addresses.
    pub fn with_config(mut self, config: &PlannerConfig) -> PlanResult<Self> {
        let network = config
            .network()
            .map_err(|e| PlanError::InvalidRequest(e.to_string()))?;
        if network != self.network {
            return Err(PlanError::InvalidAddress(format!(
                "request addresses are for {}, configuration expects {}",
                self.network, network
            )));
        }

        self.dust_threshold = config.dust_threshold;
        self.input_kind = config
            .script_kind()
            .map_err(|e| PlanError::InvalidRequest(e.to_string()))?;
        self.dust_policy = config
            .dust_policy()
            .map_err(|e| PlanError::InvalidRequest(e.to_string()))?;
        Ok(self)
    }

    /// Check the request before planning
    ///
    /// Rejects a zero target, addresses on another network and outpoints
    /// listed twice.
    pub fn validate(&self) -> PlanResult<()> {
        if self.target_value == 0 {
            return Err(PlanError::InvalidRequest(
                "target value must be greater than 0".into(),
            ));
        }

        for (role, address) in [("source", &self.source), ("destination", &self.destination)] {
            if address.network != self.network {
                return Err(PlanError::InvalidAddress(format!(
                    "{} address {} is for {}, expected {}",
                    role, address, address.network, self.network
                )));
            }
        }

        let mut seen = HashSet::with_capacity(self.utxos.len());
        for utxo in &self.utxos {
            if !seen.insert(utxo.outpoint()) {
                return Err(PlanError::InvalidRequest(format!(
                    "duplicate outpoint {}",
                    utxo.id()
                )));
            }
        }

        Ok(())
    }

    /// The payment as a planned output
    pub fn payment(&self) -> PlannedOutput {
        PlannedOutput::new(self.destination.clone(), self.target_value)
    }

    /// A change output of `value` back to the source address
    pub fn change(&self, value: u64) -> PlannedOutput {
        PlannedOutput::new(self.source.clone(), value)
    }

    pub(crate) fn payment_txout(&self) -> TxOut {
        TxOut {
            value: self.target_value,
            script_pubkey: self.destination.script_pubkey(),
        }
    }

    /// Change output used for size measurement; its value does not affect the size
    pub(crate) fn change_txout(&self) -> TxOut {
        TxOut {
            value: self.dust_threshold,
            script_pubkey: self.source.script_pubkey(),
        }
    }
}
