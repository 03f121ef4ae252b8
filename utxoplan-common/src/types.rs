//! Common data types for the UtxoPlan transaction planner
//!
//! These types describe what the planner consumes (unspent outputs fetched by
//! surrounding tooling, fee rates, dust thresholds) and the pieces of a plan it
//! hands back. They carry no key material.
//!
//! # Serialization
//!
//! `bitcoin` types are stored as plain strings (txid as hex, scripts as hex) so
//! the records can be written to JSON or TOML without enabling the `serde`
//! feature of the `bitcoin` crate.

use bitcoin::address::NetworkUnchecked;
use bitcoin::{Address, Network, OutPoint, ScriptBuf, Txid};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PlanError;

/// Default dust threshold (minimum output value) for the reference chain
pub const DUST_THRESHOLD: u64 = 546;

/// An unspent transaction output available to the planner
///
/// Immutable once fetched. The planner only ever reads these; a plan holds
/// clones of the outputs it spends.
///
/// # Fields
///
/// * `txid` - Hash of the transaction that created this output
/// * `vout` - Index of the output inside that transaction
/// * `value` - Value in satoshis
/// * `script_pubkey` - Locking script of the output
/// * `previous_raw_tx` - Full serialized previous transaction (required for legacy inputs)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UtxoRecord", into = "UtxoRecord")]
pub struct UnspentOutput {
    /// Hash of the funding transaction
    pub txid: Txid,

    /// Output index inside the funding transaction
    pub vout: u32,

    /// Value in satoshis
    pub value: u64,

    /// Locking script
    pub script_pubkey: ScriptBuf,

    /// Previous raw transaction, if the caller fetched it
    pub previous_raw_tx: Option<Vec<u8>>,
}

impl UnspentOutput {
    /// Create a new unspent output without a previous raw transaction
    pub fn new(txid: Txid, vout: u32, value: u64, script_pubkey: ScriptBuf) -> Self {
        Self {
            txid,
            vout,
            value,
            script_pubkey,
            previous_raw_tx: None,
        }
    }

    /// Attach the full previous transaction (needed to spend legacy P2PKH outputs)
    pub fn with_previous_raw_tx(mut self, raw: Vec<u8>) -> Self {
        self.previous_raw_tx = Some(raw);
        self
    }

    /// The outpoint this output is spent through
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.vout)
    }

    /// Unique identifier in `txid:vout` form
    pub fn id(&self) -> String {
        format!("{}:{}", self.txid, self.vout)
    }
}

/// String form of [`UnspentOutput`] used for persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtxoRecord {
    pub txid: String,
    pub vout: u32,
    pub value: u64,
    /// Locking script as hex
    pub script: String,
    /// Previous raw transaction as hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_tx: Option<String>,
}

impl TryFrom<UtxoRecord> for UnspentOutput {
    type Error = PlanError;

    fn try_from(record: UtxoRecord) -> Result<Self, Self::Error> {
        let txid = Txid::from_str(&record.txid)
            .map_err(|e| PlanError::InvalidUtxo(format!("invalid txid {}: {}", record.txid, e)))?;
        let script = hex::decode(&record.script)
            .map_err(|e| PlanError::InvalidUtxo(format!("invalid script hex: {}", e)))?;
        let previous_raw_tx = match record.raw_tx {
            Some(raw) => Some(
                hex::decode(&raw)
                    .map_err(|e| PlanError::InvalidUtxo(format!("invalid raw tx hex: {}", e)))?,
            ),
            None => None,
        };

        Ok(UnspentOutput {
            txid,
            vout: record.vout,
            value: record.value,
            script_pubkey: ScriptBuf::from(script),
            previous_raw_tx,
        })
    }
}

impl From<UnspentOutput> for UtxoRecord {
    fn from(utxo: UnspentOutput) -> Self {
        UtxoRecord {
            txid: utxo.txid.to_string(),
            vout: utxo.vout,
            value: utxo.value,
            script: hex::encode(utxo.script_pubkey.as_bytes()),
            raw_tx: utxo.previous_raw_tx.as_ref().map(hex::encode),
        }
    }
}

/// One entry of a block explorer's "unspent outputs for address" response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerTxRef {
    pub tx_hash: String,
    pub tx_output_n: u32,
    pub value: u64,
    /// Locking script as hex (present when the explorer is asked to include scripts)
    #[serde(default)]
    pub script: Option<String>,
    /// Full previous transaction as hex, when fetched separately
    #[serde(default)]
    pub raw: Option<String>,
}

/// A block explorer's address response restricted to the fields the planner uses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplorerAddressResponse {
    #[serde(default)]
    pub txrefs: Vec<ExplorerTxRef>,
    #[serde(default)]
    pub final_balance: u64,
    #[serde(default)]
    pub unconfirmed_balance: i64,
}

impl ExplorerAddressResponse {
    /// Parse the JSON body returned by the explorer
    pub fn from_json(body: &str) -> Result<Self, PlanError> {
        serde_json::from_str(body)
            .map_err(|e| PlanError::InvalidUtxo(format!("invalid explorer response: {}", e)))
    }

    /// Confirmed plus unconfirmed balance, clamped at zero
    pub fn balance(&self) -> u64 {
        let total = self.final_balance as i128 + self.unconfirmed_balance as i128;
        total.max(0).min(u64::MAX as i128) as u64
    }

    /// Convert the explorer entries into planner inputs, keeping explorer order
    pub fn into_unspent(self) -> Result<Vec<UnspentOutput>, PlanError> {
        self.txrefs
            .into_iter()
            .map(|tx_ref| {
                let record = UtxoRecord {
                    txid: tx_ref.tx_hash,
                    vout: tx_ref.tx_output_n,
                    value: tx_ref.value,
                    script: tx_ref.script.unwrap_or_default(),
                    raw_tx: tx_ref.raw,
                };
                UnspentOutput::try_from(record)
            })
            .collect()
    }
}

/// Script kind of the inputs being spent
///
/// Determines the placeholder scripts the fee oracle signs with and which UTXO
/// information the plan's PSBT carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputScriptKind {
    /// Legacy pay-to-pubkey-hash
    P2pkh,
    /// Native SegWit pay-to-witness-pubkey-hash
    P2wpkh,
}

impl Default for InputScriptKind {
    fn default() -> Self {
        InputScriptKind::P2wpkh
    }
}

impl fmt::Display for InputScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputScriptKind::P2pkh => write!(f, "p2pkh"),
            InputScriptKind::P2wpkh => write!(f, "p2wpkh"),
        }
    }
}

impl FromStr for InputScriptKind {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "p2pkh" => Ok(InputScriptKind::P2pkh),
            "p2wpkh" => Ok(InputScriptKind::P2wpkh),
            other => Err(PlanError::InvalidRequest(format!(
                "unsupported input script kind: {}",
                other
            ))),
        }
    }
}

/// What to do when a change output would be at or below the dust threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DustPolicy {
    /// Drop the change output and pay the excess to the miner
    Absorb,
    /// Fail with `PlanError::ChangeNotProfitable`
    Reject,
}

impl Default for DustPolicy {
    fn default() -> Self {
        DustPolicy::Absorb
    }
}

impl FromStr for DustPolicy {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "absorb" => Ok(DustPolicy::Absorb),
            "reject" => Ok(DustPolicy::Reject),
            other => Err(PlanError::InvalidRequest(format!(
                "unsupported dust policy: {}",
                other
            ))),
        }
    }
}

/// Fee rate in satoshis per virtual byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeeRate(u64);

impl FeeRate {
    /// Create a fee rate from satoshis per virtual byte
    pub const fn from_sat_per_vb(sat_per_vb: u64) -> Self {
        FeeRate(sat_per_vb)
    }

    /// Convert an explorer's per-kilobyte fee level into a per-byte rate, rounding up
    ///
    /// Explorers quote fee levels per 1024 bytes.
    pub fn from_sat_per_kb_ceil(sat_per_kb: u64) -> Self {
        FeeRate(crate::math::div_ceil(sat_per_kb, 1024))
    }

    /// Satoshis per virtual byte
    pub fn as_sat_per_vb(&self) -> u64 {
        self.0
    }

    /// Fee for a transaction of `vsize` virtual bytes: `ceil(vsize * rate)`
    ///
    /// The rate is integral so the product is already exact. Returns `None` on overflow.
    pub fn fee_for_vsize(&self, vsize: usize) -> Option<u64> {
        (vsize as u64).checked_mul(self.0)
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sat/vB", self.0)
    }
}

/// A payment output of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOutput {
    /// Receiving address
    pub address: Address,
    /// Value in satoshis
    pub value: u64,
}

impl PlannedOutput {
    pub fn new(address: Address, value: u64) -> Self {
        Self { address, value }
    }

    /// Locking script of the receiving address
    pub fn script_pubkey(&self) -> ScriptBuf {
        self.address.script_pubkey()
    }
}

/// Parse and validate a Bitcoin address for the expected network
pub fn parse_address(address: &str, network: Network) -> Result<Address, PlanError> {
    let unchecked = Address::<NetworkUnchecked>::from_str(address.trim())
        .map_err(|e| PlanError::InvalidAddress(format!("{}: {}", address, e)))?;

    unchecked.require_network(network).map_err(|e| {
        PlanError::InvalidAddress(format!("{} is not valid for {}: {}", address, network, e))
    })
}

/// Check whether an amount is at or below the given dust threshold
pub fn is_dust(amount: u64, dust_threshold: u64) -> bool {
    amount <= dust_threshold
}
