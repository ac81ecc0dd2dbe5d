//! calabi-deploy - Deployment library for the Calabi swap stack.
//!
//! This crate drives the sequential deployment of the swap contracts against
//! an Ethereum-compatible node: a declarative ordered plan, a persisted
//! registry of deployed addresses keyed by category and contract name, and a
//! step runner that wires later deployments to the addresses recorded by
//! earlier ones.

mod config;
pub use config::{DEV_PRIVATE_KEY, DeployConfig};

mod deployer;
pub use deployer::RpcDeployer;

mod pacer;
pub use pacer::{DEFAULT_STEP_DELAY, Pacer};

mod plan;
pub use plan::{
    ArgSource, ConstructorArg, DeploymentStep, FACTORY_CONTRACT, ROUTER_CONTRACT,
    WRAPPED_NATIVE_TOKEN, swap_plan,
};

mod registry;
pub use registry::{
    Category, DEPLOYMENTS_FILENAME, DeploymentRegistry, RegistryError, RegistryFile, RegistryLock,
};

mod rpc;
pub use rpc::EthRpc;

mod runner;
pub use runner::{ContractDeployer, PlanOptions, StepError, run_plan, run_step};

mod units;
pub use units::{AmountError, to_base_units};
