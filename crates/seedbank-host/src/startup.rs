//! Host startup helpers.
//!
//! The binary calls these in order: [`load_config`], then [`open_registry`],
//! then [`build_service`]. Each failure is reported as a [`HostError`]
//! naming the stage that failed.

use std::path::Path;

use seedbank_registry::{Registry, load_registry, save_registry};
use tracing::info;

use crate::config::{HostConfig, PersistenceConfig};
use crate::error::HostError;
use crate::file_store::FileStore;
use crate::service::{BoxedStore, RegistryService};

/// Load the configuration file, falling back to defaults when the implicit
/// default file is absent.
///
/// # Errors
///
/// Returns [`HostError::Config`] if an explicit file is missing, or any
/// file fails to parse or validate.
pub fn load_config(path: &Path, explicit: bool) -> Result<HostConfig, HostError> {
    if explicit || path.exists() {
        return Ok(HostConfig::from_file(path)?);
    }
    let mut config = HostConfig::default();
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Restore the registry from the configured snapshot directory.
///
/// With persistence off, returns an empty registry and no store. With it
/// on, opens the directory, restores the saved snapshot and, when there is
/// none yet, writes one for the empty registry so the directory is known
/// to be writable before any request is served.
///
/// # Errors
///
/// Returns [`HostError::Store`] if the directory cannot be opened, or
/// [`HostError::Persist`] if the snapshot cannot be read, fails its
/// invariant checks, or the initial snapshot cannot be written.
pub fn open_registry(
    persistence: &PersistenceConfig,
) -> Result<(Registry, Option<BoxedStore>), HostError> {
    if !persistence.enabled {
        return Ok((Registry::new(), None));
    }

    let mut store = FileStore::open(persistence.directory_path())?;
    let registry = if let Some(registry) = load_registry(&store)? {
        registry
    } else {
        info!(root = %store.root().display(), "No snapshot found, starting empty");
        let registry = Registry::new();
        save_registry(&mut store, &registry)?;
        registry
    };
    let store: BoxedStore = Box::new(store);
    Ok((registry, Some(store)))
}

/// Wrap `registry` in a service configured by `config`.
pub fn build_service(
    config: &HostConfig,
    registry: Registry,
    store: Option<BoxedStore>,
) -> RegistryService {
    let mut service = RegistryService::new(registry).with_name(config.registry.name.clone());
    if let Some(store) = store {
        service = service.with_store(store);
    }
    if config.dedup.enabled {
        service = service.with_dedup(config.dedup.capacity);
    }
    service
}
