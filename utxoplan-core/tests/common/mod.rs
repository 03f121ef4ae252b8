//! Shared helpers for the planner integration tests

#![allow(dead_code)]

use bitcoin::absolute::LockTime;
use bitcoin::{consensus, Address, Network, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use std::str::FromStr;
use std::sync::Once;
use utxoplan_common::logging::{self, LogConfig, LogLevel};
use utxoplan_common::types::{parse_address, FeeRate, UnspentOutput};
use utxoplan_core::SelectionRequest;

static INIT_LOGGER: Once = Once::new();

pub fn setup() {
    INIT_LOGGER.call_once(|| {
        let config = LogConfig {
            level: LogLevel::Error,
            log_file: None,
            include_timestamps: false,
            include_source_location: false,
            json_format: false,
        };
        let _ = logging::init(&config);
    });
}

/// Native SegWit address the test wallet spends from
pub fn source_address() -> Address {
    parse_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", Network::Bitcoin).unwrap()
}

/// Native SegWit payment destination
pub fn destination_address() -> Address {
    parse_address("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq", Network::Bitcoin).unwrap()
}

/// Legacy address for P2PKH wallets
pub fn legacy_address() -> Address {
    parse_address("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", Network::Bitcoin).unwrap()
}

/// A distinct txid per `n`
pub fn txid(n: u64) -> Txid {
    Txid::from_str(&format!("{:064x}", n + 1)).unwrap()
}

/// P2WPKH outputs with the given values, each from its own transaction
pub fn segwit_utxos(values: &[u64]) -> Vec<UnspentOutput> {
    let script = source_address().script_pubkey();
    values
        .iter()
        .enumerate()
        .map(|(i, &value)| UnspentOutput::new(txid(i as u64), 0, value, script.clone()))
        .collect()
}

/// A P2PKH output together with a previous transaction that really funds it
pub fn legacy_utxo(value: u64, salt: u32) -> UnspentOutput {
    let script: ScriptBuf = legacy_address().script_pubkey();
    let previous = Transaction {
        version: 1,
        lock_time: LockTime::from_consensus(salt),
        input: vec![TxIn {
            previous_output: OutPoint::new(txid(u64::from(salt) + 1_000), 0),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value,
            script_pubkey: script.clone(),
        }],
    };

    UnspentOutput::new(previous.txid(), 0, value, script)
        .with_previous_raw_tx(consensus::serialize(&previous))
}

/// A request paying `target` at `rate` sat/vB from the SegWit test wallet
pub fn segwit_request(values: &[u64], target: u64, rate: u64) -> SelectionRequest {
    SelectionRequest::new(
        segwit_utxos(values),
        target,
        FeeRate::from_sat_per_vb(rate),
        source_address(),
        destination_address(),
    )
}
