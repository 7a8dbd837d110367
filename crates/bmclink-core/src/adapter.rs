// ── Adapter contract ──
//
// One vendor implementation is bound to each `Client`. The contract is
// split into capability traits; an adapter advertises a category by
// returning `Some(self)` from the matching accessor on `Adapter`. Inside a
// category, operations the vendor cannot perform keep their default body,
// which reports `CoreError::NotImplemented`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CoreError;
use crate::model::{BmcNetworkSettings, BootOverride, Capability};
use crate::storage::{Controller, Volume};

type Result<T> = std::result::Result<T, CoreError>;

/// A vendor-specific BMC implementation.
///
/// `login` and `logout` are mandatory. Everything else is reached through
/// the capability accessors, so `Client::supported_features` reflects what
/// the adapter declares rather than what happens to compile.
#[async_trait]
pub trait Adapter: Send + Sync {
    async fn login(&self) -> Result<()>;

    async fn logout(&self) -> Result<()>;

    fn power(&self) -> Option<&dyn PowerOps> {
        None
    }

    fn system(&self) -> Option<&dyn SystemOps> {
        None
    }

    fn storage(&self) -> Option<&dyn StorageOps> {
        None
    }

    fn virtual_media(&self) -> Option<&dyn VirtualMediaOps> {
        None
    }

    fn boot(&self) -> Option<&dyn BootOps> {
        None
    }

    fn jobs(&self) -> Option<&dyn JobOps> {
        None
    }

    fn utility(&self) -> Option<&dyn UtilityOps> {
        None
    }

    fn network(&self) -> Option<&dyn NetworkOps> {
        None
    }
}

/// Whether `adapter` declares `capability`.
pub fn declares(adapter: &dyn Adapter, capability: Capability) -> bool {
    match capability {
        Capability::Power => adapter.power().is_some(),
        Capability::System => adapter.system().is_some(),
        Capability::Storage => adapter.storage().is_some(),
        Capability::VirtualMedia => adapter.virtual_media().is_some(),
        Capability::Boot => adapter.boot().is_some(),
        Capability::Jobs => adapter.jobs().is_some(),
        Capability::Utility => adapter.utility().is_some(),
        Capability::Network => adapter.network().is_some(),
    }
}

// ── Power ───────────────────────────────────────────────────────────

#[async_trait]
pub trait PowerOps: Send + Sync {
    /// Current power state: a bare string such as `"On"`, or an object
    /// carrying `power_state` and friends.
    async fn power_status(&self) -> Result<Value>;

    async fn power_on(&self) -> Result<()>;

    async fn power_off(&self, force: bool) -> Result<()>;

    async fn power_restart(&self, force: bool) -> Result<()>;

    async fn power_cycle(&self) -> Result<()>;

    async fn reset_type_allowed(&self) -> Result<Vec<String>> {
        Err(CoreError::not_implemented("reset_type_allowed"))
    }
}

// ── System inventory ────────────────────────────────────────────────

#[async_trait]
pub trait SystemOps: Send + Sync {
    async fn system_info(&self) -> Result<Value>;

    async fn cpus(&self) -> Result<Vec<Value>> {
        Err(CoreError::not_implemented("cpus"))
    }

    async fn memory(&self) -> Result<Vec<Value>> {
        Err(CoreError::not_implemented("memory"))
    }

    async fn nics(&self) -> Result<Vec<Value>> {
        Err(CoreError::not_implemented("nics"))
    }

    async fn fans(&self) -> Result<Vec<Value>> {
        Err(CoreError::not_implemented("fans"))
    }

    async fn temperatures(&self) -> Result<Vec<Value>> {
        Err(CoreError::not_implemented("temperatures"))
    }

    async fn psus(&self) -> Result<Vec<Value>> {
        Err(CoreError::not_implemented("psus"))
    }

    async fn power_consumption(&self) -> Result<Value> {
        Err(CoreError::not_implemented("power_consumption"))
    }

    async fn power_consumption_watts(&self) -> Result<Option<f64>> {
        Err(CoreError::not_implemented("power_consumption_watts"))
    }

    async fn system_health(&self) -> Result<Value> {
        Err(CoreError::not_implemented("system_health"))
    }

    async fn bmc_info(&self) -> Result<Value> {
        Err(CoreError::not_implemented("bmc_info"))
    }

    async fn pci_devices(&self) -> Result<Vec<Value>> {
        Err(CoreError::not_implemented("pci_devices"))
    }

    async fn nics_with_pci_info(&self) -> Result<Vec<Value>> {
        Err(CoreError::not_implemented("nics_with_pci_info"))
    }
}

// ── Storage ─────────────────────────────────────────────────────────

#[async_trait]
pub trait StorageOps: Send + Sync {
    /// Raw controller records; the client normalizes them into
    /// [`Controller`] values.
    async fn storage_controllers(&self) -> Result<Vec<Value>>;

    async fn drives(&self, controller: &Controller) -> Result<Vec<Value>>;

    async fn volumes(&self, controller: &Controller) -> Result<Vec<Value>>;

    async fn volume_drives(&self, _volume: &Volume) -> Result<Vec<Value>> {
        Err(CoreError::not_implemented("volume_drives"))
    }
}

// ── Virtual media ───────────────────────────────────────────────────

#[async_trait]
pub trait VirtualMediaOps: Send + Sync {
    async fn virtual_media(&self) -> Result<Vec<Value>>;

    async fn insert_virtual_media(&self, iso_url: &str, device: Option<&str>) -> Result<()>;

    async fn eject_virtual_media(&self, device: Option<&str>) -> Result<()>;

    async fn virtual_media_status(&self) -> Result<Value>;
}

// ── Boot ────────────────────────────────────────────────────────────

#[async_trait]
pub trait BootOps: Send + Sync {
    async fn boot_options(&self) -> Result<Value>;

    async fn set_boot_override(&self, request: &BootOverride) -> Result<()>;

    async fn clear_boot_override(&self) -> Result<()>;

    /// One-shot network boot on the next reset.
    async fn boot_to_pxe(&self) -> Result<()> {
        self.set_boot_override(&BootOverride::once("Pxe")).await
    }
}

// ── Jobs ────────────────────────────────────────────────────────────

#[async_trait]
pub trait JobOps: Send + Sync {
    async fn jobs(&self) -> Result<Vec<Value>>;

    async fn job_status(&self, job_id: &str) -> Result<Value>;

    /// Poll until the job settles. Adapters raise `TaskError::Timeout` when
    /// `timeout` elapses and `TaskError::Failed` on a failed job.
    async fn wait_for_job(&self, job_id: &str, timeout: Duration) -> Result<Value>;
}

// ── Utility ─────────────────────────────────────────────────────────

#[async_trait]
pub trait UtilityOps: Send + Sync {
    async fn sel_log(&self) -> Result<Vec<Value>>;

    async fn accounts(&self) -> Result<Vec<Value>> {
        Err(CoreError::not_implemented("accounts"))
    }

    async fn sessions(&self) -> Result<Vec<Value>> {
        Err(CoreError::not_implemented("sessions"))
    }
}

// ── BMC network ─────────────────────────────────────────────────────

#[async_trait]
pub trait NetworkOps: Send + Sync {
    async fn get_bmc_network(&self) -> Result<Value>;

    async fn set_bmc_network(&self, _settings: &BmcNetworkSettings) -> Result<()> {
        Err(CoreError::not_implemented("set_bmc_network"))
    }
}
