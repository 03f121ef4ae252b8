//! Fee oracle: measures the fee of a candidate transaction by dummy-signing it
//!
//! The fee of a transaction depends on its signed size, and the signed size
//! depends on the script kind and the number of inputs and outputs. Instead of
//! keeping per-script byte tables, the oracle builds a same-shape clone of the
//! candidate, signs every input with a throwaway key, extracts the finalized
//! transaction and reads its virtual size.
//!
//! Throwaway keys are created lazily, one per `(network, script kind)` pair, and
//! live as long as the [`FeeOracle`]. Each dummy signature is ground to the
//! 70-byte DER encoding, so the measured size is the same for every key and
//! the key never influences a plan.
//!
//! 70 bytes is the size a low-R signer produces for nearly every signature,
//! and the smallest size such a signer commonly produces. A signer that does
//! not grind for low R emits a 71-byte signature about half the time. Each
//! such signature adds 1 vB to a P2PKH input and 1/4 vB to a P2WPKH input, so
//! a transaction signed that way pays slightly less than the requested rate.

use bitcoin::absolute::LockTime;
use bitcoin::psbt::PartiallySignedTransaction;
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::secp256k1::{All, Message, Secp256k1, SecretKey};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{
    ecdsa, Network, OutPoint, PublicKey, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness,
};
use serde_json::json;
use std::collections::HashMap;

use utxoplan_common::error::{PlanError, PlanResult};
use utxoplan_common::logging::{self, LogContext, LogLevel};
use utxoplan_common::types::{FeeRate, InputScriptKind, UnspentOutput};

/// DER length of a signature with full-length low-R and low-S components
const GROUND_SIGNATURE_DER_LEN: usize = 70;

/// Attempts before giving up on grinding a signature
const MAX_GRIND_ATTEMPTS: u32 = 1_024;

/// Value of the placeholder output a fake legacy input spends
const FAKE_PREVIOUS_VALUE: u64 = 1_000_000_000_000_000;

/// Size and fee measured for one candidate composition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEstimate {
    /// Virtual size of the dummy-signed transaction
    pub vsize: usize,
    /// `ceil(vsize * fee_rate)`
    pub fee: u64,
}

/// Throwaway key material and placeholder scripts for one script kind
struct ThrowawaySigner {
    secret_key: SecretKey,
    public_key: PublicKey,
    /// Locking script the dummy inputs pretend to spend
    placeholder_script: ScriptBuf,
    /// Previous transaction legacy inputs point into
    fake_previous_tx: Option<Transaction>,
}

impl ThrowawaySigner {
    fn generate(secp: &Secp256k1<All>, kind: InputScriptKind) -> PlanResult<Self> {
        let secret_key = (0..16)
            .find_map(|_| SecretKey::from_slice(&rand::random::<[u8; 32]>()).ok())
            .ok_or_else(|| PlanError::FeeOracle("could not generate a throwaway key".into()))?;
        let public_key = PublicKey::new(secret_key.public_key(secp));

        let (placeholder_script, fake_previous_tx) = match kind {
            InputScriptKind::P2wpkh => {
                let wpubkey_hash = public_key.wpubkey_hash().ok_or_else(|| {
                    PlanError::FeeOracle("throwaway key is not compressed".into())
                })?;
                (ScriptBuf::new_v0_p2wpkh(&wpubkey_hash), None)
            }
            InputScriptKind::P2pkh => {
                let script = ScriptBuf::new_p2pkh(&public_key.pubkey_hash());
                let previous = Transaction {
                    version: 1,
                    lock_time: LockTime::ZERO,
                    input: vec![TxIn {
                        previous_output: OutPoint::null(),
                        script_sig: ScriptBuf::new(),
                        sequence: Sequence::MAX,
                        witness: Witness::new(),
                    }],
                    output: vec![TxOut {
                        value: FAKE_PREVIOUS_VALUE,
                        script_pubkey: script.clone(),
                    }],
                };
                (script, Some(previous))
            }
        };

        Ok(Self {
            secret_key,
            public_key,
            placeholder_script,
            fake_previous_tx,
        })
    }

    /// Sign a message, grinding the nonce until the DER encoding is 70 bytes
    fn sign_ground(&self, secp: &Secp256k1<All>, msg: &Message) -> PlanResult<ecdsa::Signature> {
        for counter in 0..MAX_GRIND_ATTEMPTS {
            let mut extra_entropy = [0u8; 32];
            extra_entropy[..4].copy_from_slice(&counter.to_le_bytes());
            let sig = secp.sign_ecdsa_with_noncedata(msg, &self.secret_key, &extra_entropy);
            if sig.serialize_der().len() == GROUND_SIGNATURE_DER_LEN {
                return Ok(ecdsa::Signature::sighash_all(sig));
            }
        }
        Err(PlanError::FeeOracle(
            "signature grinding budget exhausted".into(),
        ))
    }
}

/// Dummy-signing fee oracle owned by one planning session
pub struct FeeOracle {
    secp: Secp256k1<All>,
    signers: HashMap<(Network, InputScriptKind), ThrowawaySigner>,
    estimates_made: u64,
}

impl Default for FeeOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl FeeOracle {
    /// Create an oracle with an empty key cache
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
            signers: HashMap::new(),
            estimates_made: 0,
        }
    }

    /// Number of dummy-signed transactions measured so far
    pub fn estimates_made(&self) -> u64 {
        self.estimates_made
    }

    /// Number of throwaway keys currently cached
    pub fn cached_keys(&self) -> usize {
        self.signers.len()
    }

    /// Estimate the fee of spending `inputs` into `outputs`
    ///
    /// Builds a dummy-signed clone with the same input count, the same output
    /// scripts and placeholder unlocking data for `kind`, then returns its
    /// virtual size and `ceil(vsize * fee_rate)`. Output values do not change
    /// the size, so the caller may pass placeholder amounts.
    ///
    /// # Arguments
    /// * `inputs` - Inputs of the candidate transaction
    /// * `outputs` - Outputs of the candidate transaction
    /// * `fee_rate` - Fee rate in satoshis per virtual byte
    /// * `kind` - Script kind of the inputs
    /// * `network` - Network the throwaway key is cached for
    ///
    /// # Returns
    /// * The measured size and fee, or a `PlanError::FeeOracle` if signing fails
    pub fn estimate_fee(
        &mut self,
        inputs: &[UnspentOutput],
        outputs: &[TxOut],
        fee_rate: FeeRate,
        kind: InputScriptKind,
        network: Network,
    ) -> PlanResult<FeeEstimate> {
        if inputs.is_empty() {
            return Err(PlanError::FeeOracle(
                "cannot measure a transaction without inputs".into(),
            ));
        }

        if !self.signers.contains_key(&(network, kind)) {
            logging::log_planner(
                LogLevel::Debug,
                LogContext::FeeOracle,
                "Generating throwaway key",
                Some(json!({ "kind": kind.to_string(), "network": network.to_string() })),
            );
            let signer = ThrowawaySigner::generate(&self.secp, kind)?;
            self.signers.insert((network, kind), signer);
        }
        let signer = self
            .signers
            .get(&(network, kind))
            .ok_or_else(|| PlanError::FeeOracle("throwaway key cache miss".into()))?;

        let signed = dummy_sign(&self.secp, signer, inputs, outputs, kind)?;
        self.estimates_made += 1;

        let vsize = signed.vsize();
        let fee = fee_rate
            .fee_for_vsize(vsize)
            .ok_or(PlanError::AmountOverflow)?;

        logging::log_planner(
            LogLevel::Trace,
            LogContext::FeeOracle,
            "Measured dummy-signed transaction",
            Some(json!({
                "inputs": inputs.len(),
                "outputs": outputs.len(),
                "kind": kind.to_string(),
                "vsize": vsize,
                "fee": fee,
            })),
        );

        Ok(FeeEstimate { vsize, fee })
    }
}

/// Build, sign and finalize the same-shape dummy transaction
fn dummy_sign(
    secp: &Secp256k1<All>,
    signer: &ThrowawaySigner,
    inputs: &[UnspentOutput],
    outputs: &[TxOut],
    kind: InputScriptKind,
) -> PlanResult<Transaction> {
    // Legacy inputs must point into the fake previous transaction so its
    // output is the one being signed for.
    let fake_previous = signer
        .fake_previous_tx
        .as_ref()
        .map(|tx| OutPoint::new(tx.txid(), 0));

    let unsigned = Transaction {
        version: 2,
        lock_time: LockTime::ZERO,
        input: inputs
            .iter()
            .map(|utxo| TxIn {
                previous_output: fake_previous.unwrap_or_else(|| utxo.outpoint()),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
            .collect(),
        output: outputs.to_vec(),
    };

    let mut psbt = PartiallySignedTransaction::from_unsigned_tx(unsigned)?;
    for (psbt_input, utxo) in psbt.inputs.iter_mut().zip(inputs) {
        match kind {
            InputScriptKind::P2wpkh => {
                psbt_input.witness_utxo = Some(TxOut {
                    value: utxo.value,
                    script_pubkey: signer.placeholder_script.clone(),
                });
            }
            InputScriptKind::P2pkh => {
                psbt_input.non_witness_utxo = signer.fake_previous_tx.clone();
            }
        }
    }

    let mut cache = SighashCache::new(&psbt.unsigned_tx);
    let mut finalized = Vec::with_capacity(inputs.len());
    for (index, utxo) in inputs.iter().enumerate() {
        let msg = match kind {
            InputScriptKind::P2wpkh => {
                let script_code = signer
                    .placeholder_script
                    .p2wpkh_script_code()
                    .ok_or_else(|| PlanError::FeeOracle("placeholder is not p2wpkh".into()))?;
                let sighash = cache.segwit_signature_hash(
                    index,
                    &script_code,
                    utxo.value,
                    EcdsaSighashType::All,
                )?;
                Message::from(sighash)
            }
            InputScriptKind::P2pkh => {
                let sighash = cache.legacy_signature_hash(
                    index,
                    &signer.placeholder_script,
                    EcdsaSighashType::All.to_u32(),
                )?;
                Message::from(sighash)
            }
        };
        finalized.push(signer.sign_ground(secp, &msg)?);
    }

    for (psbt_input, sig) in psbt.inputs.iter_mut().zip(finalized) {
        match kind {
            InputScriptKind::P2wpkh => {
                let mut witness = Witness::new();
                witness.push(sig.to_vec());
                witness.push(signer.public_key.to_bytes());
                psbt_input.final_script_witness = Some(witness);
            }
            InputScriptKind::P2pkh => {
                let sig_push = PushBytesBuf::try_from(sig.to_vec())
                    .map_err(|e| PlanError::FeeOracle(format!("signature push failed: {}", e)))?;
                psbt_input.final_script_sig = Some(
                    Builder::new()
                        .push_slice(sig_push)
                        .push_key(&signer.public_key)
                        .into_script(),
                );
            }
        }
    }

    Ok(psbt.extract_tx())
}
