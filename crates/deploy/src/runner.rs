//! Sequential execution of a deployment plan.
//!
//! Each step resolves its constructor arguments against the registry, hands
//! them to the deploy backend, and persists the resulting address before the
//! next step starts. Execution is strictly sequential; the first failure
//! aborts the rest of the plan and everything persisted so far stays valid.

use std::future::Future;

use alloy_core::primitives::Address;
use thiserror::Error;

use crate::{
    pacer::Pacer,
    plan::{ArgSource, ConstructorArg, DeploymentStep},
    registry::{DeploymentRegistry, RegistryError, RegistryFile},
};

/// Errors raised while running a deployment step.
#[derive(Debug, Error)]
pub enum StepError {
    /// A registry lookup for a constructor argument failed. The plan is
    /// misordered or a prerequisite deployment is missing.
    #[error("cannot resolve `{category}.{name}` for constructor argument {index} of `{step}`")]
    UnresolvedDependency {
        step: String,
        category: String,
        name: String,
        index: usize,
        #[source]
        source: RegistryError,
    },
    /// The deploy capability itself failed; the underlying cause is kept.
    #[error("deployment of `{step}` failed")]
    DeploymentFailure {
        step: String,
        #[source]
        source: anyhow::Error,
    },
    /// The address was deployed but could not be persisted.
    #[error("failed to persist registry entry for `{step}`")]
    Persist {
        step: String,
        #[source]
        source: RegistryError,
    },
}

/// The deploy capability: turns a contract logical name and resolved
/// constructor arguments into a confirmed on-chain address.
///
/// Implementations block until the creation transaction is confirmed. The
/// runner treats the capability as opaque; compilation, signing, and network
/// configuration live behind it.
pub trait ContractDeployer {
    fn deploy(
        &mut self,
        contract: &str,
        args: &[ConstructorArg],
    ) -> impl Future<Output = anyhow::Result<Address>> + Send;
}

/// Options governing a plan run.
#[derive(Debug, Default)]
pub struct PlanOptions {
    /// Re-run steps whose registry entry already exists. When false, such
    /// steps are skipped so a completed run can be repeated safely.
    pub redeploy: bool,
    /// Optional pacing between consecutive steps.
    pub pacer: Option<Pacer>,
}

/// Run a single step: resolve arguments, deploy, record and persist the
/// address. No skip logic and no retries live here; both are caller
/// decisions.
pub async fn run_step<D: ContractDeployer>(
    step: &DeploymentStep,
    registry: &mut DeploymentRegistry,
    store: &RegistryFile,
    backend: &mut D,
) -> Result<Address, StepError> {
    let args = resolve_args(step, registry)?;

    tracing::info!(
        contract = %step.contract,
        category = step.category.as_str(),
        args = ?args.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "Deploying contract..."
    );

    let address = backend
        .deploy(&step.contract, &args)
        .await
        .map_err(|source| StepError::DeploymentFailure {
            step: step.contract.clone(),
            source,
        })?;

    registry.set(step.category.as_str(), &step.contract, address);
    store.save(registry).map_err(|source| StepError::Persist {
        step: step.contract.clone(),
        source,
    })?;

    tracing::info!(
        contract = %step.contract,
        address = %address.to_checksum(None),
        "Contract deployed and recorded"
    );

    Ok(address)
}

/// Run every step of `plan` in order, aborting on the first failure.
///
/// Entries persisted by earlier successful steps survive a failure, so the
/// same plan can be re-invoked; with `redeploy` unset, already-recorded steps
/// are skipped on the re-run.
pub async fn run_plan<D: ContractDeployer>(
    plan: &[DeploymentStep],
    registry: &mut DeploymentRegistry,
    store: &RegistryFile,
    backend: &mut D,
    mut options: PlanOptions,
) -> Result<(), StepError> {
    for (index, step) in plan.iter().enumerate() {
        if !options.redeploy && registry.contains(step.category.as_str(), &step.contract) {
            tracing::info!(
                contract = %step.contract,
                category = step.category.as_str(),
                "Already deployed, skipping"
            );
            continue;
        }

        if index > 0
            && let Some(pacer) = options.pacer.as_mut()
        {
            pacer.wait().await;
        }

        run_step(step, registry, store, backend).await?;
    }

    Ok(())
}

fn resolve_args(
    step: &DeploymentStep,
    registry: &DeploymentRegistry,
) -> Result<Vec<ConstructorArg>, StepError> {
    step.args
        .iter()
        .enumerate()
        .map(|(index, source)| match source {
            ArgSource::Literal(arg) => Ok(*arg),
            ArgSource::ZeroAddress => Ok(ConstructorArg::Address(Address::ZERO)),
            ArgSource::Lookup { category, name } => registry
                .get(category.as_str(), name)
                .map(ConstructorArg::Address)
                .map_err(|source| StepError::UnresolvedDependency {
                    step: step.contract.clone(),
                    category: category.as_str().to_string(),
                    name: name.clone(),
                    index,
                    source,
                }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Category;
    use alloy_core::primitives::U256;
    use tempdir::TempDir;

    /// Backend that hands out a fixed sequence of addresses and records every
    /// call it receives.
    struct ScriptedDeployer {
        results: Vec<anyhow::Result<Address>>,
        calls: Vec<(String, Vec<ConstructorArg>)>,
    }

    impl ScriptedDeployer {
        fn new(results: Vec<anyhow::Result<Address>>) -> Self {
            Self {
                results,
                calls: Vec::new(),
            }
        }
    }

    impl ContractDeployer for ScriptedDeployer {
        async fn deploy(
            &mut self,
            contract: &str,
            args: &[ConstructorArg],
        ) -> anyhow::Result<Address> {
            self.calls.push((contract.to_string(), args.to_vec()));
            self.results.remove(0)
        }
    }

    fn scratch_store(dir: &TempDir) -> RegistryFile {
        RegistryFile::new(dir.path().join("deployments.json"))
    }

    fn step_with_lookup() -> DeploymentStep {
        DeploymentStep::new(
            "CalabiRouter02",
            Category::Swap,
            vec![
                ArgSource::lookup(Category::Swap, "CalabiFactory"),
                ArgSource::lookup(Category::Tokens, "wFIL"),
            ],
        )
    }

    #[test]
    fn test_resolve_args_mixes_sources() {
        let mut registry = DeploymentRegistry::new();
        let factory = Address::repeat_byte(0x01);
        registry.set("swap", "CalabiFactory", factory);

        let step = DeploymentStep::new(
            "Sampler",
            Category::Swap,
            vec![
                ArgSource::Literal(ConstructorArg::Uint(U256::from(7u64))),
                ArgSource::lookup(Category::Swap, "CalabiFactory"),
                ArgSource::ZeroAddress,
            ],
        );

        let args = resolve_args(&step, &registry).unwrap();
        assert_eq!(
            args,
            vec![
                ConstructorArg::Uint(U256::from(7u64)),
                ConstructorArg::Address(factory),
                ConstructorArg::Address(Address::ZERO),
            ]
        );
    }

    #[test]
    fn test_resolve_args_reports_failing_lookup() {
        let registry = DeploymentRegistry::new();
        let err = resolve_args(&step_with_lookup(), &registry).unwrap_err();

        match err {
            StepError::UnresolvedDependency {
                step,
                category,
                name,
                index,
                ..
            } => {
                assert_eq!(step, "CalabiRouter02");
                assert_eq!(category, "swap");
                assert_eq!(name, "CalabiFactory");
                assert_eq!(index, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_step_persists_address_immediately() {
        let dir = TempDir::new("calabi-runner").unwrap();
        let store = scratch_store(&dir);
        let mut registry = store.load().unwrap();

        let deployed = Address::repeat_byte(0xfa);
        let mut backend = ScriptedDeployer::new(vec![Ok(deployed)]);
        let step = DeploymentStep::new(
            "CalabiFactory",
            Category::Swap,
            vec![ArgSource::address(Address::repeat_byte(0xaa))],
        );

        let address = run_step(&step, &mut registry, &store, &mut backend)
            .await
            .unwrap();
        assert_eq!(address, deployed);

        // The entry is on disk, not just in memory.
        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.get("swap", "CalabiFactory").unwrap(), deployed);
    }

    #[tokio::test]
    async fn test_run_step_aborts_on_unresolved_dependency() {
        let dir = TempDir::new("calabi-runner").unwrap();
        let store = scratch_store(&dir);
        let mut registry = store.load().unwrap();
        let mut backend = ScriptedDeployer::new(vec![]);

        let err = run_step(&step_with_lookup(), &mut registry, &store, &mut backend)
            .await
            .unwrap_err();

        assert!(matches!(err, StepError::UnresolvedDependency { .. }));
        // The backend must never see a step with placeholder arguments.
        assert!(backend.calls.is_empty());
    }

    #[tokio::test]
    async fn test_run_plan_skips_recorded_steps_unless_redeploy() {
        let dir = TempDir::new("calabi-runner").unwrap();
        let store = scratch_store(&dir);
        let mut registry = store.load().unwrap();

        let recorded = Address::repeat_byte(0x0f);
        registry.set("swap", "CalabiFactory", recorded);
        store.save(&registry).unwrap();

        let plan = vec![DeploymentStep::new(
            "CalabiFactory",
            Category::Swap,
            vec![ArgSource::address(Address::repeat_byte(0xaa))],
        )];

        let mut backend = ScriptedDeployer::new(vec![]);
        run_plan(
            &plan,
            &mut registry,
            &store,
            &mut backend,
            PlanOptions::default(),
        )
        .await
        .unwrap();
        assert!(backend.calls.is_empty());
        assert_eq!(registry.get("swap", "CalabiFactory").unwrap(), recorded);

        let fresh = Address::repeat_byte(0x10);
        let mut backend = ScriptedDeployer::new(vec![Ok(fresh)]);
        run_plan(
            &plan,
            &mut registry,
            &store,
            &mut backend,
            PlanOptions {
                redeploy: true,
                pacer: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(backend.calls.len(), 1);
        assert_eq!(registry.get("swap", "CalabiFactory").unwrap(), fresh);
    }
}
