//! Declarative deployment plan for the swap stack.
//!
//! The plan is an explicit ordered list of [`DeploymentStep`] descriptors.
//! Step order is the dependency order: a step that looks an address up in the
//! registry must come after the step (or prior run) that recorded it. The
//! runner performs no dependency-graph resolution of its own.

use std::fmt::{self, Display};

use alloy_core::primitives::{Address, U256};

use crate::{
    registry::Category,
    units::{AmountError, to_base_units},
};

/// Registry key of the swap factory contract.
pub const FACTORY_CONTRACT: &str = "CalabiFactory";
/// Registry key of the swap router contract.
pub const ROUTER_CONTRACT: &str = "CalabiRouter02";
/// Registry key of the wrapped native token the router settles through.
pub const WRAPPED_NATIVE_TOKEN: &str = "wFIL";

/// A fully resolved constructor argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorArg {
    Address(Address),
    Uint(U256),
}

impl Display for ConstructorArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructorArg::Address(address) => write!(f, "{}", address.to_checksum(None)),
            ConstructorArg::Uint(value) => write!(f, "{value}"),
        }
    }
}

/// Where a constructor argument's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgSource {
    /// A value known when the plan is built.
    Literal(ConstructorArg),
    /// An address recorded by an earlier step (or a previous run).
    Lookup { category: Category, name: String },
    /// The zero-address sentinel.
    ZeroAddress,
}

impl ArgSource {
    pub fn address(address: Address) -> Self {
        Self::Literal(ConstructorArg::Address(address))
    }

    /// A token amount scaled to `decimals` base units.
    pub fn amount(value: f64, decimals: u8) -> Result<Self, AmountError> {
        Ok(Self::Literal(ConstructorArg::Uint(to_base_units(
            value, decimals,
        )?)))
    }

    pub fn lookup(category: Category, name: impl Into<String>) -> Self {
        Self::Lookup {
            category,
            name: name.into(),
        }
    }
}

/// One contract deployment: logical name, target category, and the ordered
/// sources of its constructor arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStep {
    pub contract: String,
    pub category: Category,
    pub args: Vec<ArgSource>,
}

impl DeploymentStep {
    pub fn new(contract: impl Into<String>, category: Category, args: Vec<ArgSource>) -> Self {
        Self {
            contract: contract.into(),
            category,
            args,
        }
    }
}

/// The canonical swap-stack plan: the factory, then the router wired to the
/// factory and the wrapped native token.
///
/// `fee_to_setter` is the account allowed to change the factory's fee
/// recipient, conventionally the deployer.
pub fn swap_plan(fee_to_setter: Address) -> Vec<DeploymentStep> {
    vec![
        DeploymentStep::new(
            FACTORY_CONTRACT,
            Category::Swap,
            vec![ArgSource::address(fee_to_setter)],
        ),
        DeploymentStep::new(
            ROUTER_CONTRACT,
            Category::Swap,
            vec![
                ArgSource::lookup(Category::Swap, FACTORY_CONTRACT),
                ArgSource::lookup(Category::Tokens, WRAPPED_NATIVE_TOKEN),
            ],
        ),
    ]
}
