//! Configuration management for UtxoPlan.
//!
//! Planner defaults are stored in TOML. The planner core never reads files
//! itself; surrounding tooling loads a [`Config`] and hands the
//! [`PlannerConfig`] section to the core when it builds requests and sessions.
//!
//! ```toml
//! [planner]
//! network = "testnet"
//! dust_threshold = 546
//! input_script_kind = "p2wpkh"
//! dust_policy = "absorb"
//! search_budget = 10000
//!
//! [logging]
//! level = "Debug"
//! ```

use anyhow::{anyhow, Context, Result};
use bitcoin::Network;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::logging::{self, LogConfig, LogContext, LogLevel};
use crate::types::{DustPolicy, InputScriptKind, DUST_THRESHOLD};

/// Default work budget for the exact-fit search
pub const DEFAULT_SEARCH_BUDGET: u64 = 10_000;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub planner: PlannerConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Defaults applied to every selection request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannerConfig {
    /// Bitcoin network ("bitcoin", "testnet", "signet", "regtest")
    #[serde(default = "default_network")]
    pub network: String,

    /// Outputs at or below this value are never created
    #[serde(default = "default_dust_threshold")]
    pub dust_threshold: u64,

    /// Script kind of the wallet's inputs ("p2pkh", "p2wpkh")
    #[serde(default = "default_script_kind")]
    pub input_script_kind: String,

    /// What to do with dust change ("absorb", "reject")
    #[serde(default = "default_dust_policy")]
    pub dust_policy: String,

    /// Work units the exact-fit search may spend
    #[serde(default = "default_search_budget")]
    pub search_budget: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            dust_threshold: default_dust_threshold(),
            input_script_kind: default_script_kind(),
            dust_policy: default_dust_policy(),
            search_budget: default_search_budget(),
        }
    }
}

impl PlannerConfig {
    /// The configured network
    pub fn network(&self) -> Result<Network> {
        match self.network.trim().to_lowercase().as_str() {
            "bitcoin" | "mainnet" => Ok(Network::Bitcoin),
            "testnet" => Ok(Network::Testnet),
            "signet" => Ok(Network::Signet),
            "regtest" => Ok(Network::Regtest),
            other => Err(anyhow!("Invalid network type: {}", other)),
        }
    }

    /// The configured input script kind
    pub fn script_kind(&self) -> Result<InputScriptKind> {
        InputScriptKind::from_str(&self.input_script_kind).map_err(|e| anyhow!(e))
    }

    /// The configured dust policy
    pub fn dust_policy(&self) -> Result<DustPolicy> {
        DustPolicy::from_str(&self.dust_policy).map_err(|e| anyhow!(e))
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        logging::log_planner(
            LogLevel::Debug,
            LogContext::Config,
            "configuration loaded",
            Some(serde_json::json!({
                "network": config.planner.network,
                "input_script_kind": config.planner.input_script_kind,
                "dust_policy": config.planner.dust_policy,
            })),
        );

        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| anyhow!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file, creating parent directories as needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.planner.network()?;
        self.planner.script_kind()?;
        self.planner.dust_policy()?;

        if self.planner.search_budget == 0 {
            return Err(anyhow!("Invalid search budget: must be greater than 0"));
        }

        Ok(())
    }
}

// Default value functions

fn default_network() -> String {
    "bitcoin".to_string()
}

fn default_dust_threshold() -> u64 {
    DUST_THRESHOLD
}

fn default_script_kind() -> String {
    InputScriptKind::default().to_string()
}

fn default_dust_policy() -> String {
    "absorb".to_string()
}

fn default_search_budget() -> u64 {
    DEFAULT_SEARCH_BUDGET
}
