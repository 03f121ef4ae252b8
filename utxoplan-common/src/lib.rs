//! UtxoPlan Common Library
//!
//! Shared types and ambient infrastructure for the UtxoPlan transaction
//! planner. The selection algorithms live in `utxoplan-core`; this crate only
//! holds what both the core and the tooling around it need.
//!
//! # Modules
//!
//! - `types`: UTXOs, fee rates, script kinds and planned outputs
//! - `error`: the planner error type
//! - `math`: integer satoshi arithmetic
//! - `logging`: `env_logger` setup and structured planner events
//! - `config`: TOML configuration

/// Core domain types
pub mod types;

/// Planner errors
pub mod error;

/// Satoshi arithmetic
pub mod math;

/// Logging infrastructure
pub mod logging;

/// Configuration management
pub mod config;

pub use bitcoin::{Address, Network, OutPoint, Transaction, Txid};

pub use config::{Config, PlannerConfig, DEFAULT_SEARCH_BUDGET};
pub use error::{PlanError, PlanResult};
pub use types::{
    is_dust, parse_address, DustPolicy, ExplorerAddressResponse, ExplorerTxRef, FeeRate,
    InputScriptKind, PlannedOutput, UnspentOutput, UtxoRecord, DUST_THRESHOLD,
};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use std::sync::Once;

// Ensure initialization happens only once
static INIT: Once = Once::new();

/// Library initialization
///
/// Installs logging with the default configuration. Can be called any number
/// of times; only the first call does anything.
///
/// # Returns
/// * Result with () on success, or an error message string
pub fn init() -> Result<(), String> {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = logging::init(&logging::LogConfig::default())
            .map_err(|e| format!("Failed to initialize logging: {}", e));
    });
    result
}
