// ── Domain request types ──
//
// Small typed inputs for adapter operations. Read results stay as raw
// JSON records (`Record`) and are normalized by the facades.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// One raw object as an adapter returned it.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Feature categories an adapter can declare.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    Power,
    System,
    Storage,
    VirtualMedia,
    Boot,
    Jobs,
    Utility,
    Network,
}

/// How long a boot override lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum BootPersistence {
    Once,
    Continuous,
    Disabled,
}

/// Firmware boot mode requested alongside an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum BootMode {
    #[strum(serialize = "UEFI")]
    #[serde(rename = "UEFI")]
    Uefi,
    Legacy,
}

/// A one-shot or persistent boot source override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootOverride {
    /// Redfish boot target, e.g. `Pxe`, `Hdd`, `Cd`, `Usb`, `BiosSetup`.
    pub target: String,
    pub persistence: Option<BootPersistence>,
    pub mode: Option<BootMode>,
}

impl BootOverride {
    pub fn once(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            persistence: Some(BootPersistence::Once),
            mode: None,
        }
    }

    pub fn persistent(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            persistence: Some(BootPersistence::Continuous),
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: BootMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// Desired BMC network configuration. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BmcNetworkSettings {
    pub ip_address: Option<String>,
    pub subnet_mask: Option<String>,
    pub gateway: Option<String>,
    pub dns_primary: Option<String>,
    pub dns_secondary: Option<String>,
    pub hostname: Option<String>,
    #[serde(default)]
    pub dhcp: bool,
}
