//! Planning sessions
//!
//! A [`TransactionPlanner`] drives one or more planning calls. It owns the fee
//! oracle, so the oracle's throwaway keys are created once per session and
//! dropped with it. Each call runs the same state machine:
//!
//! ```text
//! Idle -> MinimalInputsFound -> ExactFitFound -> Done
//!                            -> ExactFitNotFound -> ChangePlanBuilt -> Done
//!                                                -> ChangePlanNotProfitable -> DustAbsorbed -> Done
//!                                                                           -> Failed
//! ```
//!
//! A missed exact fit and an exhausted search budget are both treated as
//! `ExactFitNotFound`. Only `InsufficientFunds` and `ChangeNotProfitable`
//! (plus malformed input) reach the caller.

use log::{debug, info, warn};
use serde_json::json;
use std::fmt;

use utxoplan_common::config::PlannerConfig;
use utxoplan_common::error::{PlanError, PlanResult};
use utxoplan_common::logging::{self, LogContext, LogLevel};
use utxoplan_common::types::{DustPolicy, UnspentOutput};

use crate::assembler::{self, ChangeOutcome};
use crate::exact_fit::{find_exact_fit, FitWindow, SearchBudget, SearchOutcome};
use crate::fee_oracle::FeeOracle;
use crate::plan::{PlanKind, UnsignedTransactionPlan};
use crate::request::SelectionRequest;
use crate::selector;

/// States of one planning call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanningState {
    Idle,
    MinimalInputsFound,
    ExactFitFound,
    ExactFitNotFound,
    ChangePlanBuilt,
    ChangePlanNotProfitable,
    DustAbsorbed,
    Done,
    Failed,
}

impl fmt::Display for PlanningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlanningState::Idle => "idle",
            PlanningState::MinimalInputsFound => "minimal-inputs-found",
            PlanningState::ExactFitFound => "exact-fit-found",
            PlanningState::ExactFitNotFound => "exact-fit-not-found",
            PlanningState::ChangePlanBuilt => "change-plan-built",
            PlanningState::ChangePlanNotProfitable => "change-plan-not-profitable",
            PlanningState::DustAbsorbed => "dust-absorbed",
            PlanningState::Done => "done",
            PlanningState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Tracks and logs the state of one call
struct StateTracker {
    state: PlanningState,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            state: PlanningState::Idle,
        }
    }

    fn transition(&mut self, next: PlanningState) {
        debug!("Planning state {} -> {}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, err: PlanError) -> PlanError {
        self.transition(PlanningState::Failed);
        warn!("Planning failed: {}", err);
        err
    }
}

/// A planning session
pub struct TransactionPlanner {
    oracle: FeeOracle,
    search_budget: SearchBudget,
}

impl Default for TransactionPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionPlanner {
    /// Create a session with the default search budget
    pub fn new() -> Self {
        Self {
            oracle: FeeOracle::new(),
            search_budget: SearchBudget::default(),
        }
    }

    /// Create a session from configuration
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new().with_search_budget(config.search_budget)
    }

    /// Set the work budget of the exact-fit search
    pub fn with_search_budget(mut self, budget: u64) -> Self {
        self.search_budget = SearchBudget(budget);
        self
    }

    pub fn search_budget(&self) -> SearchBudget {
        self.search_budget
    }

    /// The session's fee oracle
    pub fn oracle(&self) -> &FeeOracle {
        &self.oracle
    }

    /// Plan a payment
    ///
    /// # Arguments
    /// * `request` - Inputs, payment and policy for this call
    ///
    /// # Returns
    /// * A complete unsigned plan, or the terminal error. No partial plan is
    ///   ever returned.
    pub fn plan(&mut self, request: &SelectionRequest) -> PlanResult<UnsignedTransactionPlan> {
        let mut tracker = StateTracker::new();
        request.validate().map_err(|e| tracker.fail(e))?;

        logging::log_planner(
            LogLevel::Debug,
            LogContext::Selection,
            "planning started",
            Some(json!({
                "utxo_count": request.utxos.len(),
                "target": request.target_value,
                "fee_rate": request.fee_rate.as_sat_per_vb(),
                "destination": request.destination.to_string(),
            })),
        );

        let plan = self.run(request, &mut tracker).map_err(|e| tracker.fail(e))?;
        tracker.transition(PlanningState::Done);

        info!(
            "Planned {:?} transaction: {} inputs, {} outputs, fee {} sat, {} vB",
            plan.kind(),
            plan.inputs().len(),
            plan.outputs().len(),
            plan.estimated_fee(),
            plan.vsize()
        );

        Ok(plan)
    }

    fn run(
        &mut self,
        request: &SelectionRequest,
        tracker: &mut StateTracker,
    ) -> PlanResult<UnsignedTransactionPlan> {
        let sorted = selector::sort_by_value_desc(&request.utxos);
        let minimal = selector::select_minimal_inputs(&sorted, request, &mut self.oracle)?;
        tracker.transition(PlanningState::MinimalInputsFound);

        let prefix = &sorted[..minimal.input_count];
        let with_change = self.oracle.estimate_fee(
            prefix,
            &[request.payment_txout(), request.change_txout()],
            request.fee_rate,
            request.input_kind,
            request.network,
        )?;
        let window = FitWindow::new(
            request.target_value,
            minimal.fee.fee,
            with_change.fee,
            request.dust_threshold,
        )?;

        let values: Vec<u64> = sorted.iter().map(|u| u.value).collect();
        let outcome = find_exact_fit(&values, minimal.input_count, &window, self.search_budget);

        logging::log_planner(
            LogLevel::Debug,
            LogContext::Search,
            "exact-fit search finished",
            Some(json!({
                "input_count": minimal.input_count,
                "min_sum": window.min_sum,
                "max_sum": window.max_sum,
                "outcome": format!("{:?}", outcome),
            })),
        );

        if let SearchOutcome::Found(indices) = outcome {
            tracker.transition(PlanningState::ExactFitFound);
            let inputs: Vec<UnspentOutput> = indices.iter().map(|&i| sorted[i].clone()).collect();
            let measured = self.oracle.estimate_fee(
                &inputs,
                &[request.payment_txout()],
                request.fee_rate,
                request.input_kind,
                request.network,
            )?;
            return assembler::build_plan(
                inputs,
                vec![request.payment()],
                None,
                PlanKind::ExactFit,
                measured,
                request.input_kind,
            );
        }

        tracker.transition(PlanningState::ExactFitNotFound);
        let inputs = prefix.to_vec();
        match assembler::build_change_transaction(&mut self.oracle, request, inputs.clone())? {
            ChangeOutcome::Built(plan) => {
                tracker.transition(PlanningState::ChangePlanBuilt);
                Ok(plan)
            }
            ChangeOutcome::NotProfitable { change } => {
                tracker.transition(PlanningState::ChangePlanNotProfitable);
                match request.dust_policy {
                    DustPolicy::Absorb => {
                        let plan =
                            assembler::build_absorbed_plan(&mut self.oracle, request, inputs, change)?;
                        tracker.transition(PlanningState::DustAbsorbed);
                        Ok(plan)
                    }
                    DustPolicy::Reject => Err(PlanError::ChangeNotProfitable {
                        change,
                        dust: request.dust_threshold,
                    }),
                }
            }
        }
    }
}

/// Plan a single payment with a fresh session
pub fn make_plan(request: &SelectionRequest) -> PlanResult<UnsignedTransactionPlan> {
    TransactionPlanner::new().plan(request)
}
