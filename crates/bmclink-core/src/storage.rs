// ── Storage value objects ──
//
// Controllers and volumes as the client hands them out: normalized
// attributes plus the untouched adapter payload. They are rebuilt on
// every inventory call and compare equal by (vendor, id) alone.

use serde_json::Value;
use tracing::debug;

use bmclink_api::VendorKey;

use crate::client::Client;
use crate::error::CoreError;
use crate::fields::{
    as_record, first_bool, first_f64, first_present, first_string, first_u64, insert_opt,
    scalar_to_string,
};
use crate::model::Record;

// ── Candidate keys ──────────────────────────────────────────────────

const ID: &[&str] = &["id", "Id", "@odata.id"];
const NAME: &[&str] = &["name", "Name"];
const MODEL: &[&str] = &["model", "Model"];
const FIRMWARE_VERSION: &[&str] = &["firmware_version", "FirmwareVersion"];
const ENCRYPTION_MODE: &[&str] = &["encryption_mode", "EncryptionMode"];
const ENCRYPTION_CAPABILITY: &[&str] = &["encryption_capability", "EncryptionCapability"];
const CONTROLLER_TYPE: &[&str] = &["controller_type", "ControllerType"];
const PCI_SLOT: &[&str] = &["pci_slot", "PCISlot", "PciSlot"];
const STATUS: &[&str] = &["status", "health", "Health"];
const DRIVES_COUNT: &[&str] = &["drives_count", "DrivesCount", "Drives@odata.count"];

const CAPACITY_BYTES: &[&str] = &["capacity_bytes", "CapacityBytes"];
const RAID_TYPE: &[&str] = &["raid_type", "RAIDType"];
const VOLUME_TYPE: &[&str] = &["volume_type", "VolumeType"];
const DRIVES: &[&str] = &["drives", "Drives"];
const ENCRYPTED: &[&str] = &["encrypted", "Encrypted"];
const LOCK_STATUS: &[&str] = &["lock_status", "LockStatus"];
const STRIPE_SIZE: &[&str] = &["stripe_size", "StripSizeBytes", "OptimumIOSizeBytes"];
const PERCENT_COMPLETE: &[&str] = &["operation_percent_complete", "PercentageComplete"];
const OPERATION_NAME: &[&str] = &["operation_name", "OperationName"];
const WRITE_CACHE_POLICY: &[&str] = &["write_cache_policy", "WriteCachePolicy"];
const READ_CACHE_POLICY: &[&str] = &["read_cache_policy", "ReadCachePolicy"];
const HEALTH: &[&str] = &["health", "Health"];

// ── Controller ──────────────────────────────────────────────────────

/// A storage controller bound to the vendor that reported it.
#[derive(Debug, Clone)]
pub struct Controller {
    pub id: String,
    pub name: Option<String>,
    pub model: Option<String>,
    pub firmware_version: Option<String>,
    pub encryption_mode: Option<String>,
    pub encryption_capability: Option<String>,
    pub controller_type: Option<String>,
    pub pci_slot: Option<String>,
    pub status: Option<String>,
    pub drives_count: Option<u64>,
    pub vendor: VendorKey,
    /// The payload exactly as the adapter returned it.
    pub adapter_data: Value,
}

impl Controller {
    /// Normalize one adapter record. Fails if no identifier is present.
    pub fn from_adapter(vendor: &VendorKey, raw: Value) -> Result<Self, CoreError> {
        let r = as_record(&raw);
        let id = first_string(&r, ID).ok_or_else(|| CoreError::InvalidPayload {
            message: format!("storage controller without an id from vendor '{vendor}'"),
        })?;

        Ok(Self {
            id,
            name: first_string(&r, NAME),
            model: first_string(&r, MODEL),
            firmware_version: first_string(&r, FIRMWARE_VERSION),
            encryption_mode: first_string(&r, ENCRYPTION_MODE),
            encryption_capability: first_string(&r, ENCRYPTION_CAPABILITY),
            controller_type: first_string(&r, CONTROLLER_TYPE),
            pci_slot: first_string(&r, PCI_SLOT),
            status: first_string(&r, STATUS).or_else(|| status_health(&r)),
            drives_count: first_u64(&r, DRIVES_COUNT),
            vendor: vendor.clone(),
            adapter_data: raw,
        })
    }

    /// Drives attached to this controller.
    pub async fn drives(&self, client: &Client) -> Result<Vec<Value>, CoreError> {
        client.drives(self).await
    }

    /// Volumes configured on this controller.
    pub async fn volumes(&self, client: &Client) -> Result<Vec<Volume>, CoreError> {
        client.volumes(self).await
    }

    /// Canonical attributes, omitting absent ones.
    pub fn to_record(&self) -> Record {
        let mut out = Record::new();
        out.insert("id".into(), Value::from(self.id.clone()));
        insert_opt(&mut out, "name", self.name.clone());
        insert_opt(&mut out, "model", self.model.clone());
        out.insert("vendor".into(), Value::from(self.vendor.as_str()));
        insert_opt(&mut out, "firmware_version", self.firmware_version.clone());
        insert_opt(&mut out, "encryption_mode", self.encryption_mode.clone());
        insert_opt(&mut out, "encryption_capability", self.encryption_capability.clone());
        insert_opt(&mut out, "controller_type", self.controller_type.clone());
        insert_opt(&mut out, "pci_slot", self.pci_slot.clone());
        insert_opt(&mut out, "status", self.status.clone());
        insert_opt(&mut out, "drives_count", self.drives_count);
        out
    }
}

impl PartialEq for Controller {
    fn eq(&self, other: &Self) -> bool {
        self.vendor == other.vendor && self.id == other.id
    }
}

impl Eq for Controller {}

// ── Volume ──────────────────────────────────────────────────────────

/// A logical volume on a controller.
#[derive(Debug, Clone)]
pub struct Volume {
    pub id: String,
    pub name: Option<String>,
    pub capacity_bytes: Option<u64>,
    pub raid_type: Option<String>,
    pub volume_type: Option<String>,
    /// Drive references (usually `@odata.id` paths).
    pub drive_refs: Vec<String>,
    pub encrypted: Option<bool>,
    pub lock_status: Option<String>,
    pub stripe_size: Option<u64>,
    pub operation_percent_complete: Option<f64>,
    pub operation_name: Option<String>,
    pub write_cache_policy: Option<String>,
    pub read_cache_policy: Option<String>,
    pub health: Option<String>,
    pub vendor: VendorKey,
    pub controller_id: String,
    pub adapter_data: Value,
}

impl Volume {
    pub fn from_adapter(controller: &Controller, raw: Value) -> Result<Self, CoreError> {
        let r = as_record(&raw);
        let id = first_string(&r, ID).ok_or_else(|| CoreError::InvalidPayload {
            message: format!("volume without an id on controller '{}'", controller.id),
        })?;
        let operation = first_operation(&r);

        Ok(Self {
            id,
            name: first_string(&r, NAME),
            capacity_bytes: first_u64(&r, CAPACITY_BYTES),
            raid_type: first_string(&r, RAID_TYPE),
            volume_type: first_string(&r, VOLUME_TYPE),
            drive_refs: drive_refs(&r),
            encrypted: first_bool(&r, ENCRYPTED),
            lock_status: first_string(&r, LOCK_STATUS),
            stripe_size: first_u64(&r, STRIPE_SIZE),
            operation_percent_complete: first_f64(&r, PERCENT_COMPLETE)
                .or_else(|| first_f64(&operation, PERCENT_COMPLETE)),
            operation_name: first_string(&r, OPERATION_NAME)
                .or_else(|| first_string(&operation, OPERATION_NAME)),
            write_cache_policy: first_string(&r, WRITE_CACHE_POLICY),
            read_cache_policy: first_string(&r, READ_CACHE_POLICY),
            health: first_string(&r, HEALTH).or_else(|| status_health(&r)),
            vendor: controller.vendor.clone(),
            controller_id: controller.id.clone(),
            adapter_data: raw,
        })
    }

    /// Drives backing this volume.
    pub async fn drives(&self, client: &Client) -> Result<Vec<Value>, CoreError> {
        client.volume_drives(self).await
    }

    pub fn to_record(&self) -> Record {
        let mut out = Record::new();
        out.insert("id".into(), Value::from(self.id.clone()));
        insert_opt(&mut out, "name", self.name.clone());
        insert_opt(&mut out, "capacity_bytes", self.capacity_bytes);
        insert_opt(&mut out, "raid_type", self.raid_type.clone());
        insert_opt(&mut out, "volume_type", self.volume_type.clone());
        out.insert("drives".into(), Value::from(self.drive_refs.clone()));
        insert_opt(&mut out, "encrypted", self.encrypted);
        insert_opt(&mut out, "lock_status", self.lock_status.clone());
        insert_opt(&mut out, "stripe_size", self.stripe_size);
        insert_opt(&mut out, "operation_percent_complete", self.operation_percent_complete);
        insert_opt(&mut out, "operation_name", self.operation_name.clone());
        insert_opt(&mut out, "write_cache_policy", self.write_cache_policy.clone());
        insert_opt(&mut out, "read_cache_policy", self.read_cache_policy.clone());
        insert_opt(&mut out, "health", self.health.clone());
        out
    }
}

impl PartialEq for Volume {
    fn eq(&self, other: &Self) -> bool {
        self.vendor == other.vendor && self.id == other.id
    }
}

impl Eq for Volume {}

// ── Listing ─────────────────────────────────────────────────────────

/// Normalize a controller listing. Records without an identifier are
/// dropped so one malformed entry does not hide the rest.
pub(crate) fn controllers_from(vendor: &VendorKey, raws: Vec<Value>) -> Vec<Controller> {
    raws.into_iter()
        .filter_map(|raw| match Controller::from_adapter(vendor, raw) {
            Ok(controller) => Some(controller),
            Err(e) => {
                debug!(vendor = %vendor, error = %e, "skipping storage controller");
                None
            }
        })
        .collect()
}

/// Normalize a volume listing, dropping records without an identifier.
pub(crate) fn volumes_from(controller: &Controller, raws: Vec<Value>) -> Vec<Volume> {
    raws.into_iter()
        .filter_map(|raw| match Volume::from_adapter(controller, raw) {
            Ok(volume) => Some(volume),
            Err(e) => {
                debug!(controller = %controller.id, error = %e, "skipping volume");
                None
            }
        })
        .collect()
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Redfish nests health as `Status.Health`.
fn status_health(r: &Record) -> Option<String> {
    r.get("Status")
        .and_then(|s| s.get("Health"))
        .and_then(scalar_to_string)
}

/// First entry of a Redfish `Operations` array, if any.
fn first_operation(r: &Record) -> Record {
    r.get("Operations")
        .and_then(Value::as_array)
        .and_then(|ops| ops.first())
        .map(as_record)
        .unwrap_or_default()
}

/// Drive references from `drives`, `Drives` or `Links.Drives`, accepting
/// plain strings or `{"@odata.id": ...}` links.
fn drive_refs(r: &Record) -> Vec<String> {
    let links = r.get("Links").map(as_record).unwrap_or_default();
    let list = first_present(r, DRIVES)
        .or_else(|| first_present(&links, DRIVES))
        .and_then(Value::as_array);

    list.map(|items| {
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(o) => o.get("@odata.id").and_then(scalar_to_string),
                _ => None,
            })
            .collect()
    })
    .unwrap_or_default()
}
