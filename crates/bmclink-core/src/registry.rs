// ── Adapter registry ──
//
// Process-wide map from vendor key to adapter factory. Adapter crates
// register during start-up, before any `Client` is built; afterwards the
// registry is only read. A second registration for the same key replaces
// the first.

use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use tracing::{debug, info};

use bmclink_api::{ConnectionDescriptor, VendorKey};

use crate::adapter::Adapter;
use crate::error::CoreError;

/// Builds an adapter bound to one connection.
pub type AdapterFactory =
    Arc<dyn Fn(&ConnectionDescriptor) -> Result<Box<dyn Adapter>, CoreError> + Send + Sync>;

/// Makes an externally packaged adapter available on demand.
///
/// The registry asks its loader at most once per failed lookup. A loader
/// that succeeds is expected to have called [`AdapterRegistry::register`].
pub trait AdapterLoader: Send + Sync {
    /// Conventional package name for a vendor's adapter.
    fn package_name(&self, vendor: &VendorKey) -> String {
        package_name(vendor)
    }

    fn load(&self, vendor: &VendorKey, registry: &AdapterRegistry) -> Result<(), CoreError>;
}

/// `bmclink-<vendor>`.
pub fn package_name(vendor: &VendorKey) -> String {
    format!("bmclink-{vendor}")
}

static GLOBAL: LazyLock<Arc<AdapterRegistry>> = LazyLock::new(|| Arc::new(AdapterRegistry::new()));

#[derive(Default)]
pub struct AdapterRegistry {
    factories: DashMap<VendorKey, AdapterFactory>,
    loader: ArcSwapOption<Box<dyn AdapterLoader>>,
}

impl AdapterRegistry {
    /// An empty, private registry. Mostly useful in tests.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry clients use unless told otherwise.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Register `factory` under the normalized `vendor` key.
    pub fn register<F>(&self, vendor: impl Into<VendorKey>, factory: F)
    where
        F: Fn(&ConnectionDescriptor) -> Result<Box<dyn Adapter>, CoreError> + Send + Sync + 'static,
    {
        let vendor = vendor.into();
        let replaced = self
            .factories
            .insert(vendor.clone(), Arc::new(factory))
            .is_some();
        info!(vendor = %vendor, replaced, "adapter registered");
    }

    pub fn lookup(&self, vendor: &VendorKey) -> Option<AdapterFactory> {
        self.factories
            .get(vendor)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn registered_keys(&self) -> BTreeSet<VendorKey> {
        self.factories
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn is_registered(&self, vendor: &VendorKey) -> bool {
        self.factories.contains_key(vendor)
    }

    /// Install the hook used when a lookup misses.
    pub fn set_loader(&self, loader: impl AdapterLoader + 'static) {
        self.loader.store(Some(Arc::new(Box::new(loader))));
    }

    pub fn clear_loader(&self) {
        self.loader.store(None);
    }

    /// Lookup, falling back to one load attempt through the loader.
    pub fn resolve(&self, vendor: &VendorKey) -> Result<AdapterFactory, CoreError> {
        if let Some(factory) = self.lookup(vendor) {
            return Ok(factory);
        }

        let loader = self.loader.load_full();
        let package = loader
            .as_ref()
            .map_or_else(|| package_name(vendor), |l| l.package_name(vendor));

        if let Some(loader) = loader {
            match loader.load(vendor, self) {
                Ok(()) => {
                    if let Some(factory) = self.lookup(vendor) {
                        debug!(vendor = %vendor, package = %package, "adapter loaded on demand");
                        return Ok(factory);
                    }
                    debug!(vendor = %vendor, package = %package, "loader did not register an adapter");
                }
                Err(e) => {
                    debug!(vendor = %vendor, package = %package, error = %e, "adapter load failed");
                }
            }
        }

        Err(CoreError::UnsupportedVendor {
            message: format!(
                "no adapter for vendor '{vendor}'. Install the '{package}' package and \
                 register its adapter before connecting"
            ),
        })
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("vendors", &self.registered_keys())
            .field("loader", &self.loader.load().is_some())
            .finish()
    }
}
