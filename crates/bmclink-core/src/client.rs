// ── Client ──
//
// Binds one connection and one vendor key to exactly one adapter for its
// whole lifetime. Every domain call goes through the adapter's capability
// traits; a category the adapter does not declare, or an operation it
// opts out of, surfaces as `CoreError::NotImplemented` naming the vendor.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use bmclink_api::{ConnectionDescriptor, DetectorConfig, VendorDetector, VendorKey};

use crate::adapter::{
    self, Adapter, BootOps, JobOps, NetworkOps, PowerOps, StorageOps, SystemOps, UtilityOps,
    VirtualMediaOps,
};
use crate::error::CoreError;
use crate::facade::{BmcInfo, FacadeMemos, PciInfo, PowerInfo, SystemInfo, ThermalInfo};
use crate::model::{BmcNetworkSettings, BootOverride, Capability};
use crate::registry::AdapterRegistry;
use crate::storage::{self, Controller, Volume};

type Result<T> = std::result::Result<T, CoreError>;

// ── Builder ─────────────────────────────────────────────────────────

/// Resolves the vendor and adapter for a connection.
///
/// Without an explicit vendor the BMC is probed with [`VendorDetector`].
/// Without an explicit registry the process-wide one is used.
#[derive(Debug)]
pub struct ClientBuilder {
    descriptor: ConnectionDescriptor,
    vendor: Option<VendorKey>,
    registry: Option<Arc<AdapterRegistry>>,
    detector: DetectorConfig,
}

impl ClientBuilder {
    pub fn new(descriptor: ConnectionDescriptor) -> Self {
        Self {
            descriptor,
            vendor: None,
            registry: None,
            detector: DetectorConfig::default(),
        }
    }

    /// Skip detection. The value is normalized like a detected vendor.
    pub fn vendor(mut self, vendor: impl Into<VendorKey>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn registry(mut self, registry: Arc<AdapterRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn detector_config(mut self, config: DetectorConfig) -> Self {
        self.detector = config;
        self
    }

    pub async fn build(self) -> Result<Client> {
        let Self {
            descriptor,
            vendor,
            registry,
            detector,
        } = self;

        let vendor = match vendor {
            Some(vendor) => {
                debug!(vendor = %vendor, "using specified vendor");
                vendor
            }
            None => detect(&descriptor, detector).await?,
        };

        let registry = registry.unwrap_or_else(AdapterRegistry::global);
        let factory = registry.resolve(&vendor)?;
        let adapter = factory(&descriptor)?;

        info!(host = %descriptor.host, vendor = %vendor, "client bound to adapter");
        Ok(Client::with_adapter(vendor, descriptor, adapter))
    }
}

async fn detect(descriptor: &ConnectionDescriptor, config: DetectorConfig) -> Result<VendorKey> {
    let detector = VendorDetector::with_config(descriptor, config)?;
    match detector.detect().await {
        Some(vendor) => {
            debug!(vendor = %vendor, "auto-detected vendor");
            Ok(vendor)
        }
        None => Err(CoreError::UnsupportedVendor {
            message: format!(
                "could not detect vendor for {}:{}. Please check: 1) the host is reachable, \
                 2) the credentials for '{}' are correct, 3) the BMC has Redfish enabled",
                descriptor.host, descriptor.port, descriptor.username
            ),
        }),
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// Summary of a bound client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientInfo {
    pub vendor: VendorKey,
    pub features: Vec<Capability>,
    pub host: String,
    pub port: u16,
    pub base_url: Option<String>,
}

/// A BMC handle bound to one vendor adapter.
///
/// Call [`login`](Self::login) before domain operations and
/// [`logout`](Self::logout) afterwards, or use [`session`](Self::session).
pub struct Client {
    vendor: VendorKey,
    descriptor: ConnectionDescriptor,
    adapter: Box<dyn Adapter>,
    pub(crate) memos: FacadeMemos,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("vendor", &self.vendor)
            .field("host", &self.descriptor.host)
            .field("features", &self.supported_features())
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn builder(descriptor: ConnectionDescriptor) -> ClientBuilder {
        ClientBuilder::new(descriptor)
    }

    /// Detect (if needed) and bind using the global registry.
    pub async fn connect(
        descriptor: ConnectionDescriptor,
        vendor: Option<VendorKey>,
    ) -> Result<Self> {
        let builder = ClientBuilder::new(descriptor);
        match vendor {
            Some(vendor) => builder.vendor(vendor).build().await,
            None => builder.build().await,
        }
    }

    /// Bind an already constructed adapter, bypassing detection and the
    /// registry.
    pub fn with_adapter(
        vendor: impl Into<VendorKey>,
        descriptor: ConnectionDescriptor,
        adapter: Box<dyn Adapter>,
    ) -> Self {
        Self {
            vendor: vendor.into(),
            descriptor,
            adapter,
            memos: FacadeMemos::default(),
        }
    }

    // ── Identity & introspection ────────────────────────────────────

    pub fn vendor(&self) -> &VendorKey {
        &self.vendor
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    pub fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    /// Categories the adapter declares, in canonical order.
    pub fn supported_features(&self) -> Vec<Capability> {
        Capability::iter()
            .filter(|c| adapter::declares(self.adapter.as_ref(), *c))
            .collect()
    }

    pub fn supports(&self, capability: Capability) -> bool {
        adapter::declares(self.adapter.as_ref(), capability)
    }

    pub fn info(&self) -> ClientInfo {
        ClientInfo {
            vendor: self.vendor.clone(),
            features: self.supported_features(),
            host: self.descriptor.host.clone(),
            port: self.descriptor.port,
            base_url: self.descriptor.base_url().ok().map(String::from),
        }
    }

    // ── Session ─────────────────────────────────────────────────────

    pub async fn login(&self) -> Result<()> {
        self.tag(self.adapter.login().await)
    }

    pub async fn logout(&self) -> Result<()> {
        self.tag(self.adapter.logout().await)
    }

    /// Run `f` between login and logout. Logout is attempted whenever login
    /// succeeded, also when `f` fails; the error from `f` takes precedence.
    pub async fn session<T, F>(&self, f: F) -> Result<T>
    where
        F: AsyncFnOnce(&Client) -> Result<T>,
    {
        self.login().await?;
        let outcome = f(self).await;
        let logout = self.logout().await;

        match (outcome, logout) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(logout_err)) => {
                warn!(host = %self.descriptor.host, error = %logout_err, "logout failed after error");
                Err(e)
            }
        }
    }

    // ── Facades ─────────────────────────────────────────────────────

    pub fn system(&self) -> SystemInfo<'_> {
        SystemInfo::new(self)
    }

    pub fn power(&self) -> PowerInfo<'_> {
        PowerInfo::new(self)
    }

    pub fn bmc(&self) -> BmcInfo<'_> {
        BmcInfo::new(self)
    }

    pub fn thermal(&self) -> ThermalInfo<'_> {
        ThermalInfo::new(self)
    }

    pub fn pci(&self) -> PciInfo<'_> {
        PciInfo::new(self)
    }

    pub async fn service_tag(&self) -> Result<Option<String>> {
        self.system().service_tag().await
    }

    // ── Power ───────────────────────────────────────────────────────

    pub async fn power_status(&self) -> Result<Value> {
        let ops = self.power_ops("power_status")?;
        self.tag(ops.power_status().await)
    }

    pub async fn power_on(&self) -> Result<()> {
        let ops = self.power_ops("power_on")?;
        self.tag(ops.power_on().await)
    }

    pub async fn power_off(&self, force: bool) -> Result<()> {
        let ops = self.power_ops("power_off")?;
        self.tag(ops.power_off(force).await)
    }

    pub async fn power_restart(&self, force: bool) -> Result<()> {
        let ops = self.power_ops("power_restart")?;
        self.tag(ops.power_restart(force).await)
    }

    pub async fn power_cycle(&self) -> Result<()> {
        let ops = self.power_ops("power_cycle")?;
        self.tag(ops.power_cycle().await)
    }

    pub async fn reset_type_allowed(&self) -> Result<Vec<String>> {
        let ops = self.power_ops("reset_type_allowed")?;
        self.tag(ops.reset_type_allowed().await)
    }

    // ── System ──────────────────────────────────────────────────────

    pub async fn system_info(&self) -> Result<Value> {
        let ops = self.system_ops("system_info")?;
        self.tag(ops.system_info().await)
    }

    pub async fn cpus(&self) -> Result<Vec<Value>> {
        let ops = self.system_ops("cpus")?;
        self.tag(ops.cpus().await)
    }

    pub async fn memory(&self) -> Result<Vec<Value>> {
        let ops = self.system_ops("memory")?;
        self.tag(ops.memory().await)
    }

    pub async fn nics(&self) -> Result<Vec<Value>> {
        let ops = self.system_ops("nics")?;
        self.tag(ops.nics().await)
    }

    pub async fn fans(&self) -> Result<Vec<Value>> {
        let ops = self.system_ops("fans")?;
        self.tag(ops.fans().await)
    }

    pub async fn temperatures(&self) -> Result<Vec<Value>> {
        let ops = self.system_ops("temperatures")?;
        self.tag(ops.temperatures().await)
    }

    pub async fn psus(&self) -> Result<Vec<Value>> {
        let ops = self.system_ops("psus")?;
        self.tag(ops.psus().await)
    }

    pub async fn power_consumption(&self) -> Result<Value> {
        let ops = self.system_ops("power_consumption")?;
        self.tag(ops.power_consumption().await)
    }

    pub async fn power_consumption_watts(&self) -> Result<Option<f64>> {
        let ops = self.system_ops("power_consumption_watts")?;
        self.tag(ops.power_consumption_watts().await)
    }

    pub async fn system_health(&self) -> Result<Value> {
        let ops = self.system_ops("system_health")?;
        self.tag(ops.system_health().await)
    }

    pub async fn bmc_info(&self) -> Result<Value> {
        let ops = self.system_ops("bmc_info")?;
        self.tag(ops.bmc_info().await)
    }

    pub async fn pci_devices(&self) -> Result<Vec<Value>> {
        let ops = self.system_ops("pci_devices")?;
        self.tag(ops.pci_devices().await)
    }

    pub async fn nics_with_pci_info(&self) -> Result<Vec<Value>> {
        let ops = self.system_ops("nics_with_pci_info")?;
        self.tag(ops.nics_with_pci_info().await)
    }

    // ── Storage ─────────────────────────────────────────────────────

    /// Raw controller records as the adapter reports them.
    pub async fn storage_controllers(&self) -> Result<Vec<Value>> {
        let ops = self.storage_ops("storage_controllers")?;
        self.tag(ops.storage_controllers().await)
    }

    /// Freshly normalized controllers. Successive calls build new values.
    /// Records the adapter reports without an identifier are skipped.
    pub async fn controllers(&self) -> Result<Vec<Controller>> {
        let raws = self.storage_controllers().await?;
        Ok(storage::controllers_from(&self.vendor, raws))
    }

    pub async fn drives(&self, controller: &Controller) -> Result<Vec<Value>> {
        self.check_vendor(&controller.vendor, "controller")?;
        let ops = self.storage_ops("drives")?;
        self.tag(ops.drives(controller).await)
    }

    pub async fn volumes(&self, controller: &Controller) -> Result<Vec<Volume>> {
        self.check_vendor(&controller.vendor, "controller")?;
        let ops = self.storage_ops("volumes")?;
        let raws = self.tag(ops.volumes(controller).await)?;
        Ok(storage::volumes_from(controller, raws))
    }

    pub async fn volume_drives(&self, volume: &Volume) -> Result<Vec<Value>> {
        self.check_vendor(&volume.vendor, "volume")?;
        let ops = self.storage_ops("volume_drives")?;
        self.tag(ops.volume_drives(volume).await)
    }

    // ── Virtual media ───────────────────────────────────────────────

    pub async fn virtual_media(&self) -> Result<Vec<Value>> {
        let ops = self.virtual_media_ops("virtual_media")?;
        self.tag(ops.virtual_media().await)
    }

    pub async fn insert_virtual_media(&self, iso_url: &str, device: Option<&str>) -> Result<()> {
        let ops = self.virtual_media_ops("insert_virtual_media")?;
        self.tag(ops.insert_virtual_media(iso_url, device).await)
    }

    pub async fn eject_virtual_media(&self, device: Option<&str>) -> Result<()> {
        let ops = self.virtual_media_ops("eject_virtual_media")?;
        self.tag(ops.eject_virtual_media(device).await)
    }

    pub async fn virtual_media_status(&self) -> Result<Value> {
        let ops = self.virtual_media_ops("virtual_media_status")?;
        self.tag(ops.virtual_media_status().await)
    }

    // ── Boot ────────────────────────────────────────────────────────

    pub async fn boot_options(&self) -> Result<Value> {
        let ops = self.boot_ops("boot_options")?;
        self.tag(ops.boot_options().await)
    }

    pub async fn set_boot_override(&self, request: &BootOverride) -> Result<()> {
        let ops = self.boot_ops("set_boot_override")?;
        self.tag(ops.set_boot_override(request).await)
    }

    pub async fn clear_boot_override(&self) -> Result<()> {
        let ops = self.boot_ops("clear_boot_override")?;
        self.tag(ops.clear_boot_override().await)
    }

    pub async fn boot_to_pxe(&self) -> Result<()> {
        let ops = self.boot_ops("boot_to_pxe")?;
        self.tag(ops.boot_to_pxe().await)
    }

    // ── Jobs ────────────────────────────────────────────────────────

    pub async fn jobs(&self) -> Result<Vec<Value>> {
        let ops = self.job_ops("jobs")?;
        self.tag(ops.jobs().await)
    }

    pub async fn job_status(&self, job_id: &str) -> Result<Value> {
        let ops = self.job_ops("job_status")?;
        self.tag(ops.job_status(job_id).await)
    }

    pub async fn wait_for_job(&self, job_id: &str, timeout: Duration) -> Result<Value> {
        let ops = self.job_ops("wait_for_job")?;
        self.tag(ops.wait_for_job(job_id, timeout).await)
    }

    // ── Utility ─────────────────────────────────────────────────────

    pub async fn sel_log(&self) -> Result<Vec<Value>> {
        let ops = self.utility_ops("sel_log")?;
        self.tag(ops.sel_log().await)
    }

    pub async fn accounts(&self) -> Result<Vec<Value>> {
        let ops = self.utility_ops("accounts")?;
        self.tag(ops.accounts().await)
    }

    pub async fn sessions(&self) -> Result<Vec<Value>> {
        let ops = self.utility_ops("sessions")?;
        self.tag(ops.sessions().await)
    }

    // ── BMC network ─────────────────────────────────────────────────

    pub async fn get_bmc_network(&self) -> Result<Value> {
        let ops = self.network_ops("get_bmc_network")?;
        self.tag(ops.get_bmc_network().await)
    }

    pub async fn set_bmc_network(&self, settings: &BmcNetworkSettings) -> Result<()> {
        let ops = self.network_ops("set_bmc_network")?;
        self.tag(ops.set_bmc_network(settings).await)
    }

    // ── Dispatch helpers ────────────────────────────────────────────

    fn missing(&self, operation: &'static str) -> CoreError {
        CoreError::NotImplemented {
            vendor: self.vendor.to_string(),
            operation,
        }
    }

    fn tag<T>(&self, result: Result<T>) -> Result<T> {
        result.map_err(|e| e.with_vendor(self.vendor.as_str()))
    }

    fn check_vendor(&self, owner: &VendorKey, what: &str) -> Result<()> {
        if *owner == self.vendor {
            Ok(())
        } else {
            Err(CoreError::InvalidArgument {
                message: format!(
                    "{what} belongs to vendor '{owner}' but this client is bound to '{}'",
                    self.vendor
                ),
            })
        }
    }

    fn power_ops(&self, operation: &'static str) -> Result<&dyn PowerOps> {
        self.adapter.power().ok_or_else(|| self.missing(operation))
    }

    fn system_ops(&self, operation: &'static str) -> Result<&dyn SystemOps> {
        self.adapter.system().ok_or_else(|| self.missing(operation))
    }

    fn storage_ops(&self, operation: &'static str) -> Result<&dyn StorageOps> {
        self.adapter.storage().ok_or_else(|| self.missing(operation))
    }

    fn virtual_media_ops(&self, operation: &'static str) -> Result<&dyn VirtualMediaOps> {
        self.adapter
            .virtual_media()
            .ok_or_else(|| self.missing(operation))
    }

    fn boot_ops(&self, operation: &'static str) -> Result<&dyn BootOps> {
        self.adapter.boot().ok_or_else(|| self.missing(operation))
    }

    fn job_ops(&self, operation: &'static str) -> Result<&dyn JobOps> {
        self.adapter.jobs().ok_or_else(|| self.missing(operation))
    }

    fn utility_ops(&self, operation: &'static str) -> Result<&dyn UtilityOps> {
        self.adapter.utility().ok_or_else(|| self.missing(operation))
    }

    fn network_ops(&self, operation: &'static str) -> Result<&dyn NetworkOps> {
        self.adapter.network().ok_or_else(|| self.missing(operation))
    }
}
