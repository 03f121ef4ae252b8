//! UtxoPlan Core
//!
//! Input selection and unsigned transaction planning. Given a wallet's unspent
//! outputs, a destination, a payment value and a fee rate, the planner picks
//! inputs and builds an unsigned transaction whose fee matches the size the
//! signed transaction will actually have.
//!
//! # Modules
//!
//! - `selector`: value ordering and the minimal covering prefix
//! - `exact_fit`: bounded search for a no-change input combination
//! - `fee_oracle`: fee measurement through dummy-signed transactions
//! - `assembler`: plan and PSBT construction, change fallback
//! - `planner`: the planning session tying the above together
//!
//! The core performs no I/O: it does not fetch UTXOs, sign or broadcast.
//!
//! # Example
//!
//! ```
//! use std::str::FromStr;
//! use bitcoin::{Network, ScriptBuf, Txid};
//! use utxoplan_common::types::{parse_address, FeeRate, UnspentOutput};
//! use utxoplan_core::{PlanKind, SelectionRequest, TransactionPlanner};
//!
//! let source = parse_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", Network::Bitcoin).unwrap();
//! let destination = parse_address("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq", Network::Bitcoin).unwrap();
//! let txid = Txid::from_str("7967a5185e907a25225574544c31f7b059c1a191d65b53dcc1554d339c4f9efc").unwrap();
//!
//! let utxos = vec![UnspentOutput::new(txid, 0, 200_000, source.script_pubkey())];
//! let request = SelectionRequest::new(utxos, 100_000, FeeRate::from_sat_per_vb(10), source, destination);
//!
//! let mut planner = TransactionPlanner::new();
//! let plan = planner.plan(&request).unwrap();
//!
//! assert_eq!(plan.kind(), PlanKind::WithChange);
//! assert_eq!(plan.input_sum(), plan.output_sum() + plan.estimated_fee());
//! ```

pub mod assembler;
pub mod exact_fit;
pub mod fee_oracle;
pub mod plan;
pub mod planner;
pub mod request;
pub mod selector;

pub use exact_fit::{find_exact_fit, FitWindow, SearchBudget, SearchOutcome};
pub use fee_oracle::{FeeEstimate, FeeOracle};
pub use plan::{PlanKind, PlanSummary, UnsignedTransactionPlan};
pub use planner::{make_plan, PlanningState, TransactionPlanner};
pub use request::SelectionRequest;
pub use selector::{select_minimal_inputs, sort_by_value_desc, MinimalSelection};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
