//! Standardized error handling for UtxoPlan
//!
//! A single error type covers every failure a planning call can surface. Only
//! true resource exhaustion (`InsufficientFunds`, `ChangeNotProfitable`) and
//! malformed inputs reach the caller; a missed exact fit is not an error and
//! never appears here.
//!
//! # Usage
//!
//! ```
//! use utxoplan_common::error::{PlanError, PlanResult};
//!
//! fn check_funds(available: u64, required: u64) -> PlanResult<()> {
//!     if available < required {
//!         return Err(PlanError::InsufficientFunds { available, required });
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_funds(1_000, 1_000_000).is_err());
//! ```

use bitcoin::OutPoint;
use thiserror::Error;

/// Result alias used throughout the planner
pub type PlanResult<T> = Result<T, PlanError>;

/// The error type for planning operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The UTXO set cannot cover the payment plus any feasible fee
    #[error("Insufficient funds: needed {required}, available {available}")]
    InsufficientFunds { available: u64, required: u64 },

    /// The only feasible change would be at or below the dust threshold
    #[error("Change of {change} satoshis is not above the dust threshold of {dust} satoshis")]
    ChangeNotProfitable { change: u64, dust: u64 },

    /// The request itself is malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An address failed to parse or belongs to another network
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// A UTXO record failed to parse
    #[error("Invalid UTXO: {0}")]
    InvalidUtxo(String),

    /// A legacy input was supplied without its previous transaction
    #[error("Missing previous transaction for legacy input {outpoint}")]
    MissingPreviousTransaction { outpoint: OutPoint },

    /// The supplied previous transaction does not fund the input
    #[error("Previous transaction does not match input {outpoint}")]
    PreviousTransactionMismatch { outpoint: OutPoint },

    /// Dummy-signing the candidate transaction failed
    #[error("Fee oracle error: {0}")]
    FeeOracle(String),

    /// Checked satoshi arithmetic overflowed
    #[error("Amount arithmetic overflowed")]
    AmountOverflow,

    /// PSBT construction failed
    #[error("PSBT error: {0}")]
    Psbt(String),
}

impl PlanError {
    /// Whether this error reports exhausted funds rather than a malformed call
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(
            self,
            PlanError::InsufficientFunds { .. } | PlanError::ChangeNotProfitable { .. }
        )
    }
}

impl From<bitcoin::psbt::Error> for PlanError {
    fn from(err: bitcoin::psbt::Error) -> Self {
        PlanError::Psbt(err.to_string())
    }
}

impl From<bitcoin::sighash::Error> for PlanError {
    fn from(err: bitcoin::sighash::Error) -> Self {
        PlanError::FeeOracle(format!("sighash computation failed: {}", err))
    }
}
