//! Persistent registry of deployed contract addresses.
//!
//! The registry is the single source of truth for wiring deployment steps
//! together: every successful step records its address here before the next
//! step runs, so a crash loses at most the in-flight step's result.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy_core::primitives::Address;
use fs2::FileExt;
use strum::IntoEnumIterator;
use thiserror::Error;

/// Default file name for the persisted registry.
pub const DEPLOYMENTS_FILENAME: &str = "deployments.json";

/// The fixed deployment categories tracked by the registry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Tokens,
    Swap,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

/// Errors raised by registry lookups and persistence.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The requested category does not exist in the registry.
    #[error("unknown deployment category `{0}`")]
    UnknownCategory(String),
    /// The category exists but holds no entry under the requested name.
    #[error("no `{name}` entry under `{category}` in the deployments registry")]
    MissingEntry { category: String, name: String },
    /// The deployments file could not be read.
    #[error("failed to read deployments file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The deployments file is not valid JSON of the expected shape.
    #[error("deployments file {} is malformed", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A recorded address string does not parse as an on-chain address.
    #[error("`{address}` under `{category}.{name}` is not a valid address")]
    MalformedAddress {
        category: String,
        name: String,
        address: String,
    },
    /// The deployments file could not be written.
    #[error("failed to write deployments file {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The deployments lock file could not be acquired.
    #[error("failed to lock deployments file {}, is another deployment running?", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// In-memory mapping of `category -> contract name -> deployed address`.
///
/// A fresh registry carries an empty map for every [`Category`]; additional
/// categories found in a persisted file are kept as-is so that `save` after
/// `load` never drops data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRegistry {
    categories: BTreeMap<String, BTreeMap<String, Address>>,
}

impl Default for DeploymentRegistry {
    fn default() -> Self {
        let categories = Category::iter()
            .map(|category| (category.as_str().to_string(), BTreeMap::new()))
            .collect();
        Self { categories }
    }
}

impl DeploymentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a recorded address, distinguishing a missing entry from a
    /// category that does not exist at all.
    pub fn get(&self, category: &str, name: &str) -> Result<Address, RegistryError> {
        let contracts = self
            .categories
            .get(category)
            .ok_or_else(|| RegistryError::UnknownCategory(category.to_string()))?;

        contracts
            .get(name)
            .copied()
            .ok_or_else(|| RegistryError::MissingEntry {
                category: category.to_string(),
                name: name.to_string(),
            })
    }

    /// Record a deployed address. Overwriting an existing entry is allowed;
    /// intentional re-deployment replaces the old address.
    pub fn set(&mut self, category: &str, name: &str, address: Address) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .insert(name.to_string(), address);
    }

    /// Whether an address is already recorded for `category.name`.
    pub fn contains(&self, category: &str, name: &str) -> bool {
        self.get(category, name).is_ok()
    }

    /// All recorded entries in `(category, contract, address)` order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, Address)> + '_ {
        self.categories.iter().flat_map(|(category, contracts)| {
            contracts
                .iter()
                .map(move |(name, address)| (category.as_str(), name.as_str(), *address))
        })
    }

    fn from_file_map(
        raw: BTreeMap<String, BTreeMap<String, String>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (category, contracts) in raw {
            for (name, address) in contracts {
                let parsed = Address::from_str(&address).map_err(|_| {
                    RegistryError::MalformedAddress {
                        category: category.clone(),
                        name: name.clone(),
                        address,
                    }
                })?;
                registry.set(&category, &name, parsed);
            }
            // Categories persisted with no entries survive the round trip.
            registry.categories.entry(category).or_default();
        }
        Ok(registry)
    }

    fn to_file_map(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.categories
            .iter()
            .map(|(category, contracts)| {
                let contracts = contracts
                    .iter()
                    .map(|(name, address)| (name.clone(), address.to_checksum(None)))
                    .collect();
                (category.clone(), contracts)
            })
            .collect()
    }
}

/// The on-disk home of a [`DeploymentRegistry`].
///
/// `load` and `save` are the only I/O boundary for registry state; step logic
/// never touches the file directly.
#[derive(Debug, Clone)]
pub struct RegistryFile {
    path: PathBuf,
}

impl RegistryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted registry. A missing file yields a fresh registry;
    /// only malformed content is an error.
    pub fn load(&self) -> Result<DeploymentRegistry, RegistryError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(DeploymentRegistry::new());
            }
            Err(err) => {
                return Err(RegistryError::Read {
                    path: self.path.clone(),
                    source: err,
                });
            }
        };

        let raw: BTreeMap<String, BTreeMap<String, String>> = serde_json::from_str(&contents)
            .map_err(|err| RegistryError::Parse {
                path: self.path.clone(),
                source: err,
            })?;

        DeploymentRegistry::from_file_map(raw)
    }

    /// Persist the full registry, replacing the file atomically so a
    /// concurrent reader never observes a torn write.
    pub fn save(&self, registry: &DeploymentRegistry) -> Result<(), RegistryError> {
        let write_err = |source| RegistryError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let contents = serde_json::to_string_pretty(&registry.to_file_map()).map_err(|err| {
            RegistryError::Parse {
                path: self.path.clone(),
                source: err,
            }
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents).map_err(write_err)?;
        fs::rename(&tmp_path, &self.path).map_err(write_err)?;

        tracing::debug!(path = %self.path.display(), "Deployments registry saved");
        Ok(())
    }

    /// Take the exclusive advisory lock guarding this registry. The registry
    /// file is not designed for concurrent writers; hold the guard for the
    /// duration of a deployment run.
    pub fn lock(&self) -> Result<RegistryLock, RegistryError> {
        let lock_err = |source| RegistryError::Lock {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(lock_err)?;
        }

        let lock_path = self.path.with_extension("json.lock");
        let file = File::create(&lock_path).map_err(lock_err)?;
        file.try_lock_exclusive().map_err(lock_err)?;

        Ok(RegistryLock { file })
    }
}

/// Guard for the registry's advisory lock, released on drop.
#[derive(Debug)]
pub struct RegistryLock {
    file: File,
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
