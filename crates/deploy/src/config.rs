//! Deployment run configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Well-known dev-node account #0 private key. Suitable only for local
/// deployments; real runs configure `private_key` via `CALABI_PRIVATE_KEY`.
pub const DEV_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Settings for a deployment run, loadable from `Calabi.toml` and the
/// `CALABI_*` environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// JSON-RPC endpoint of the target node.
    pub rpc_url: String,
    /// Path of the persisted deployments registry.
    pub deployments: PathBuf,
    /// Directory holding compiled contract artifacts (`<Name>.json`).
    pub artifacts: PathBuf,
    /// Private key of the deployer account.
    pub private_key: String,
    /// Gas limit attached to creation transactions.
    pub gas_limit: u64,
    /// How long to wait for a creation transaction to confirm.
    pub confirm_timeout_secs: u64,
    /// Delay between consecutive steps, in milliseconds. Unset disables
    /// pacing.
    pub step_delay_ms: Option<u64>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            deployments: PathBuf::from(crate::registry::DEPLOYMENTS_FILENAME),
            artifacts: PathBuf::from("artifacts"),
            private_key: DEV_PRIVATE_KEY.to_string(),
            gas_limit: 12_000_000,
            confirm_timeout_secs: 1800,
            step_delay_ms: None,
        }
    }
}
