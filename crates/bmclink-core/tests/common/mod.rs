#![allow(dead_code, clippy::unwrap_used)]
// Mock adapters shared by the core integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{json, Value};

use bmclink_core::{
    Adapter, BootOps, BootOverride, ConnectionDescriptor, Controller, CoreError, JobOps, PowerOps,
    StorageOps, SystemOps, VirtualMediaOps, Volume,
};

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn count(log: &CallLog, name: &str) -> usize {
    log.lock().unwrap().iter().filter(|c| *c == name).count()
}

pub fn descriptor() -> ConnectionDescriptor {
    ConnectionDescriptor::new("10.1.2.3", "root", SecretString::from("calvin"))
}

// ── Full adapter: power, system, storage ────────────────────────────

pub struct MockAdapter {
    pub log: CallLog,
    pub system_info: Value,
    pub power_status: Value,
    /// `None` means the adapter opts out of the operation.
    pub power_consumption: Option<Value>,
    pub power_consumption_watts: Option<Option<f64>>,
    pub bmc_info: Option<Value>,
    pub controllers: Vec<Value>,
    pub volumes: Vec<Value>,
    pub pci_devices: Vec<Value>,
    pub fail_psus: bool,
    pub fail_logout: bool,
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self {
            log: CallLog::default(),
            system_info: json!({
                "service_tag": "7XJ2K3",
                "make": "Dell Inc.",
                "model": "PowerEdge R650",
                "serial": "CN7016",
                "bmc_firmware_version": "7.00.00.171"
            }),
            power_status: json!("On"),
            power_consumption: None,
            power_consumption_watts: None,
            bmc_info: None,
            controllers: vec![json!({
                "id": "RAID.Integrated.1-1",
                "name": "PERC H755",
                "drives_count": 2
            })],
            volumes: vec![json!({
                "Id": "Disk.Virtual.0",
                "Name": "os",
                "RAIDType": "RAID1",
                "CapacityBytes": 479_559_942_144_u64
            })],
            pci_devices: vec![
                json!({ "manufacturer": "Mellanox Technologies", "device_class": "NetworkController", "name": "CX-6" }),
                json!({ "manufacturer": "Broadcom / LSI", "device_class": "MassStorageController", "name": "PERC" }),
                json!({ "manufacturer": "Intel", "device_class": "NetworkController", "name": "X710" }),
            ],
            fail_psus: false,
            fail_logout: false,
        }
    }
}

impl MockAdapter {
    fn record(&self, call: impl Into<String>) {
        self.log.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl Adapter for MockAdapter {
    async fn login(&self) -> Result<(), CoreError> {
        self.record("login");
        Ok(())
    }

    async fn logout(&self) -> Result<(), CoreError> {
        self.record("logout");
        if self.fail_logout {
            return Err(CoreError::adapter("session already gone"));
        }
        Ok(())
    }

    fn power(&self) -> Option<&dyn PowerOps> {
        Some(self)
    }

    fn system(&self) -> Option<&dyn SystemOps> {
        Some(self)
    }

    fn storage(&self) -> Option<&dyn StorageOps> {
        Some(self)
    }
}

#[async_trait]
impl PowerOps for MockAdapter {
    async fn power_status(&self) -> Result<Value, CoreError> {
        self.record("power_status");
        Ok(self.power_status.clone())
    }

    async fn power_on(&self) -> Result<(), CoreError> {
        self.record("power_on");
        Ok(())
    }

    async fn power_off(&self, force: bool) -> Result<(), CoreError> {
        self.record(format!("power_off(force={force})"));
        Ok(())
    }

    async fn power_restart(&self, force: bool) -> Result<(), CoreError> {
        self.record(format!("power_restart(force={force})"));
        Ok(())
    }

    async fn power_cycle(&self) -> Result<(), CoreError> {
        self.record("power_cycle");
        Ok(())
    }
}

#[async_trait]
impl SystemOps for MockAdapter {
    async fn system_info(&self) -> Result<Value, CoreError> {
        self.record("system_info");
        Ok(self.system_info.clone())
    }

    async fn cpus(&self) -> Result<Vec<Value>, CoreError> {
        self.record("cpus");
        Ok(vec![json!({ "model": "Xeon Gold 6338", "cores": 32 })])
    }

    async fn memory(&self) -> Result<Vec<Value>, CoreError> {
        self.record("memory");
        Ok(vec![json!({ "capacity_gb": 64 }), json!({ "capacity_gb": 64 })])
    }

    async fn nics(&self) -> Result<Vec<Value>, CoreError> {
        self.record("nics");
        Ok(vec![json!({ "mac": "b0:26:28:aa:bb:cc" })])
    }

    async fn fans(&self) -> Result<Vec<Value>, CoreError> {
        self.record("fans");
        Ok(vec![json!({ "name": "Fan1", "rpm": 5400 })])
    }

    async fn psus(&self) -> Result<Vec<Value>, CoreError> {
        self.record("psus");
        if self.fail_psus {
            return Err(CoreError::adapter("PSU sensor read failed"));
        }
        Ok(vec![json!({ "name": "PSU1", "watts": 800 })])
    }

    async fn system_health(&self) -> Result<Value, CoreError> {
        self.record("system_health");
        Ok(json!({ "overall": "OK" }))
    }

    async fn power_consumption(&self) -> Result<Value, CoreError> {
        self.record("power_consumption");
        self.power_consumption
            .clone()
            .ok_or_else(|| CoreError::not_implemented("power_consumption"))
    }

    async fn power_consumption_watts(&self) -> Result<Option<f64>, CoreError> {
        self.record("power_consumption_watts");
        self.power_consumption_watts
            .ok_or_else(|| CoreError::not_implemented("power_consumption_watts"))
    }

    async fn bmc_info(&self) -> Result<Value, CoreError> {
        self.record("bmc_info");
        self.bmc_info
            .clone()
            .ok_or_else(|| CoreError::not_implemented("bmc_info"))
    }

    async fn pci_devices(&self) -> Result<Vec<Value>, CoreError> {
        self.record("pci_devices");
        Ok(self.pci_devices.clone())
    }
}

#[async_trait]
impl StorageOps for MockAdapter {
    async fn storage_controllers(&self) -> Result<Vec<Value>, CoreError> {
        self.record("storage_controllers");
        Ok(self.controllers.clone())
    }

    async fn drives(&self, controller: &Controller) -> Result<Vec<Value>, CoreError> {
        self.record(format!("drives({})", controller.id));
        Ok(vec![json!({ "id": "Disk.Bay.0" }), json!({ "id": "Disk.Bay.1" })])
    }

    async fn volumes(&self, controller: &Controller) -> Result<Vec<Value>, CoreError> {
        self.record(format!("volumes({})", controller.id));
        Ok(self.volumes.clone())
    }

    async fn volume_drives(&self, volume: &Volume) -> Result<Vec<Value>, CoreError> {
        self.record(format!("volume_drives({})", volume.id));
        Ok(vec![json!({ "id": "Disk.Bay.0" })])
    }
}

// ── Minimal adapter: session only ───────────────────────────────────

#[derive(Default)]
pub struct MinimalAdapter {
    pub log: CallLog,
}

#[async_trait]
impl Adapter for MinimalAdapter {
    async fn login(&self) -> Result<(), CoreError> {
        self.log.lock().unwrap().push("login".into());
        Ok(())
    }

    async fn logout(&self) -> Result<(), CoreError> {
        self.log.lock().unwrap().push("logout".into());
        Ok(())
    }
}

// ── Provisioning adapter: virtual media, boot, jobs ─────────────────

#[derive(Default)]
pub struct ProvisioningAdapter {
    pub log: CallLog,
    pub last_override: Mutex<Option<BootOverride>>,
}

impl ProvisioningAdapter {
    fn record(&self, call: impl Into<String>) {
        self.log.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl Adapter for ProvisioningAdapter {
    async fn login(&self) -> Result<(), CoreError> {
        Ok(())
    }

    async fn logout(&self) -> Result<(), CoreError> {
        Ok(())
    }

    fn virtual_media(&self) -> Option<&dyn VirtualMediaOps> {
        Some(self)
    }

    fn boot(&self) -> Option<&dyn BootOps> {
        Some(self)
    }

    fn jobs(&self) -> Option<&dyn JobOps> {
        Some(self)
    }
}

#[async_trait]
impl VirtualMediaOps for ProvisioningAdapter {
    async fn virtual_media(&self) -> Result<Vec<Value>, CoreError> {
        Ok(vec![json!({ "device": "CD", "inserted": false })])
    }

    async fn insert_virtual_media(
        &self,
        iso_url: &str,
        device: Option<&str>,
    ) -> Result<(), CoreError> {
        self.record(format!("insert({iso_url},{})", device.unwrap_or("default")));
        Ok(())
    }

    async fn eject_virtual_media(&self, device: Option<&str>) -> Result<(), CoreError> {
        self.record(format!("eject({})", device.unwrap_or("default")));
        Ok(())
    }

    async fn virtual_media_status(&self) -> Result<Value, CoreError> {
        Ok(json!({ "inserted": true }))
    }
}

#[async_trait]
impl BootOps for ProvisioningAdapter {
    async fn boot_options(&self) -> Result<Value, CoreError> {
        Ok(json!({ "allowed": ["Pxe", "Hdd", "Cd"] }))
    }

    async fn set_boot_override(&self, request: &BootOverride) -> Result<(), CoreError> {
        *self.last_override.lock().unwrap() = Some(request.clone());
        Ok(())
    }

    async fn clear_boot_override(&self) -> Result<(), CoreError> {
        self.record("clear_boot_override");
        *self.last_override.lock().unwrap() = None;
        Ok(())
    }
}

#[async_trait]
impl JobOps for ProvisioningAdapter {
    async fn jobs(&self) -> Result<Vec<Value>, CoreError> {
        Ok(vec![json!({ "id": "JID_1", "state": "Completed" })])
    }

    async fn job_status(&self, job_id: &str) -> Result<Value, CoreError> {
        Ok(json!({ "id": job_id, "state": "Running" }))
    }

    async fn wait_for_job(&self, job_id: &str, timeout: Duration) -> Result<Value, CoreError> {
        self.record(format!("wait({job_id},{}s)", timeout.as_secs()));
        Ok(json!({ "id": job_id, "state": "Completed" }))
    }
}
