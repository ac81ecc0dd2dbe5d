//! JSON-RPC deploy backend: compiled artifact in, confirmed address out.

use std::{fs, path::PathBuf, time::Duration};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use backon::{ConstantBuilder, Retryable};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{plan::ConstructorArg, rpc::EthRpc, runner::ContractDeployer};

/// Interval between receipt polls while waiting for confirmation.
const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// The compiled-contract fields the backend needs from an artifact file.
#[derive(Debug, Clone, Deserialize)]
struct ContractArtifact {
    bytecode: String,
}

/// Deploys contracts through an Ethereum JSON-RPC node.
///
/// Creation transactions are submitted with `eth_sendTransaction`, so signing
/// stays with the node's configured accounts; the backend only decides the
/// sender. Compiled artifacts are read from `<artifacts_dir>/<Name>.json`.
#[derive(Debug, Clone)]
pub struct RpcDeployer {
    rpc: EthRpc,
    sender: Address,
    artifacts_dir: PathBuf,
    gas_limit: u64,
    confirm_timeout: Duration,
}

impl RpcDeployer {
    pub fn new(
        rpc: EthRpc,
        sender: Address,
        artifacts_dir: impl Into<PathBuf>,
        gas_limit: u64,
        confirm_timeout: Duration,
    ) -> Self {
        Self {
            rpc,
            sender,
            artifacts_dir: artifacts_dir.into(),
            gas_limit,
            confirm_timeout,
        }
    }

    fn load_artifact(&self, contract: &str) -> Result<ContractArtifact> {
        let path = self.artifacts_dir.join(format!("{contract}.json"));
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;
        let artifact: ContractArtifact = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse artifact {}", path.display()))?;

        if artifact.bytecode.trim_start_matches("0x").is_empty() {
            anyhow::bail!("Artifact {} carries no bytecode", path.display());
        }
        Ok(artifact)
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<Value> {
        let attempts = (self.confirm_timeout.as_secs() / CONFIRMATION_POLL_INTERVAL.as_secs())
            .max(1) as usize;

        let fetch = || async {
            let receipt: Option<Value> = self
                .rpc
                .call("eth_getTransactionReceipt", vec![json!(tx_hash)])
                .await?;
            receipt.ok_or_else(|| anyhow::anyhow!("transaction {tx_hash} not yet mined"))
        };

        fetch
            .retry(
                ConstantBuilder::default()
                    .with_delay(CONFIRMATION_POLL_INTERVAL)
                    .with_max_times(attempts),
            )
            .notify(|err, _| tracing::trace!(err = %err, "Deployment not yet confirmed, retrying..."))
            .await
            .with_context(|| format!("Timed out waiting for confirmation of {tx_hash}"))
    }
}

impl ContractDeployer for RpcDeployer {
    async fn deploy(&mut self, contract: &str, args: &[ConstructorArg]) -> Result<Address> {
        let artifact = self.load_artifact(contract)?;
        let data = encode_creation_data(&artifact.bytecode, args)?;

        let tx_hash: String = self
            .rpc
            .call(
                "eth_sendTransaction",
                vec![json!({
                    "from": format!("0x{}", hex::encode(self.sender)),
                    "data": data,
                    "gas": format!("{:#x}", self.gas_limit),
                })],
            )
            .await
            .with_context(|| format!("Failed to broadcast creation of {contract}"))?;

        tracing::info!(
            contract = contract,
            tx_hash = %tx_hash,
            "Creation transaction sent, waiting for confirmation..."
        );

        let receipt = self.wait_for_receipt(&tx_hash).await?;

        let status = receipt
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("0x0");
        if status != "0x1" {
            anyhow::bail!("Creation of {contract} reverted (tx {tx_hash})");
        }

        let address = receipt
            .get("contractAddress")
            .and_then(|a| a.as_str())
            .with_context(|| format!("No contract address in receipt for {tx_hash}"))?;

        address
            .parse()
            .with_context(|| format!("Invalid contract address in receipt: {address}"))
    }
}

/// Assemble creation calldata: deployment bytecode followed by the ABI
/// encoding of the constructor arguments.
///
/// All supported argument types (addresses and uint256) are head-encoded
/// static words, so the encoding is a plain concatenation.
fn encode_creation_data(bytecode: &str, args: &[ConstructorArg]) -> Result<String> {
    let bytecode = bytecode.trim_start_matches("0x");
    if bytecode.len() % 2 != 0 || !bytecode.chars().all(|c| c.is_ascii_hexdigit()) {
        anyhow::bail!("Artifact bytecode is not valid hex");
    }

    let mut data = String::with_capacity(2 + bytecode.len() + args.len() * 64);
    data.push_str("0x");
    data.push_str(bytecode);
    for arg in args {
        data.push_str(&encode_word(arg));
    }
    Ok(data)
}

/// ABI-encode a single static argument as a 32-byte word.
fn encode_word(arg: &ConstructorArg) -> String {
    match arg {
        ConstructorArg::Address(address) => format!("{:0>64}", hex::encode(address)),
        ConstructorArg::Uint(value) => format!("{:0>64}", format!("{value:x}")),
    }
}
