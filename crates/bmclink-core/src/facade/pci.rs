use serde_json::Value;

use super::{into_list, list, Memo};
use crate::client::Client;
use crate::error::CoreError;
use crate::fields::{as_record, first_string};

type Result<T> = std::result::Result<T, CoreError>;

const MANUFACTURER: &[&str] = &["manufacturer", "Manufacturer"];
const DEVICE_CLASS: &[&str] = &["device_class", "DeviceClass"];

/// PCI inventory. Strict: adapter failures propagate.
#[derive(Debug, Clone, Copy)]
pub struct PciInfo<'a> {
    client: &'a Client,
}

impl<'a> PciInfo<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn memo(&self) -> &'a Memo {
        &self.client.memos.pci
    }

    pub async fn devices(&self) -> Result<Vec<Value>> {
        let value = self
            .memo()
            .get_or_try("devices", || async {
                self.client.pci_devices().await.map(list)
            })
            .await?;
        Ok(into_list(value))
    }

    /// NICs annotated with the PCI slot they sit in.
    pub async fn nics_with_slots(&self) -> Result<Vec<Value>> {
        let value = self
            .memo()
            .get_or_try("nics_with_slots", || async {
                self.client.nics_with_pci_info().await.map(list)
            })
            .await?;
        Ok(into_list(value))
    }

    /// Devices whose manufacturer contains `manufacturer`, ignoring case.
    pub async fn devices_by_manufacturer(&self, manufacturer: &str) -> Result<Vec<Value>> {
        let needle = manufacturer.to_lowercase();
        Ok(self
            .devices()
            .await?
            .into_iter()
            .filter(|d| field_contains(d, MANUFACTURER, &needle))
            .collect())
    }

    pub async fn mellanox_devices(&self) -> Result<Vec<Value>> {
        self.devices_by_manufacturer("Mellanox").await
    }

    pub async fn network_controllers(&self) -> Result<Vec<Value>> {
        Ok(self
            .devices()
            .await?
            .into_iter()
            .filter(|d| field_contains(d, DEVICE_CLASS, "networkcontroller"))
            .collect())
    }
}

fn field_contains(device: &Value, candidates: &[&str], needle: &str) -> bool {
    first_string(&as_record(device), candidates)
        .is_some_and(|value| value.to_lowercase().contains(needle))
}
