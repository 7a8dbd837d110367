use serde_json::Value;

use super::{into_list, list, Memo};
use crate::client::Client;
use crate::error::CoreError;
use crate::fields::{as_record, first_string};
use crate::model::Record;
use crate::storage::{self, Controller};

type Result<T> = std::result::Result<T, CoreError>;

const SERVICE_TAG: &[&str] = &["service_tag", "ServiceTag", "SKU"];
const MAKE: &[&str] = &["manufacturer", "make", "Manufacturer"];
const MODEL: &[&str] = &["model", "Model"];
const SERIAL: &[&str] = &["serial_number", "serial", "SerialNumber"];

/// Host identity and inventory. Strict: adapter failures propagate.
#[derive(Debug, Clone, Copy)]
pub struct SystemInfo<'a> {
    client: &'a Client,
}

impl<'a> SystemInfo<'a> {
    pub const KEYS: [&'static str; 11] = [
        "service_tag",
        "make",
        "model",
        "serial",
        "cpus",
        "memory",
        "nics",
        "fans",
        "psus",
        "health",
        "controllers",
    ];

    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn memo(&self) -> &'a Memo {
        &self.client.memos.system
    }

    async fn summary(&self) -> Result<Record> {
        let value = self
            .memo()
            .get_or_try("system_info", || self.client.system_info())
            .await?;
        Ok(as_record(&value))
    }

    pub async fn service_tag(&self) -> Result<Option<String>> {
        Ok(first_string(&self.summary().await?, SERVICE_TAG))
    }

    pub async fn make(&self) -> Result<Option<String>> {
        Ok(first_string(&self.summary().await?, MAKE))
    }

    pub async fn model(&self) -> Result<Option<String>> {
        Ok(first_string(&self.summary().await?, MODEL))
    }

    pub async fn serial(&self) -> Result<Option<String>> {
        Ok(first_string(&self.summary().await?, SERIAL))
    }

    pub async fn cpus(&self) -> Result<Vec<Value>> {
        let value = self
            .memo()
            .get_or_try("cpus", || async { self.client.cpus().await.map(list) })
            .await?;
        Ok(into_list(value))
    }

    pub async fn memory(&self) -> Result<Vec<Value>> {
        let value = self
            .memo()
            .get_or_try("memory", || async { self.client.memory().await.map(list) })
            .await?;
        Ok(into_list(value))
    }

    pub async fn nics(&self) -> Result<Vec<Value>> {
        let value = self
            .memo()
            .get_or_try("nics", || async { self.client.nics().await.map(list) })
            .await?;
        Ok(into_list(value))
    }

    pub async fn fans(&self) -> Result<Vec<Value>> {
        let value = self
            .memo()
            .get_or_try("fans", || async { self.client.fans().await.map(list) })
            .await?;
        Ok(into_list(value))
    }

    pub async fn psus(&self) -> Result<Vec<Value>> {
        let value = self
            .memo()
            .get_or_try("psus", || async { self.client.psus().await.map(list) })
            .await?;
        Ok(into_list(value))
    }

    pub async fn health(&self) -> Result<Value> {
        self.memo()
            .get_or_try("health", || self.client.system_health())
            .await
    }

    /// Controllers are rebuilt from the cached adapter payload on each
    /// call.
    pub async fn controllers(&self) -> Result<Vec<Controller>> {
        let value = self
            .memo()
            .get_or_try("controllers", || async {
                self.client.storage_controllers().await.map(list)
            })
            .await?;
        Ok(storage::controllers_from(self.client.vendor(), into_list(value)))
    }

    /// Every key in [`Self::KEYS`]. The first failing accessor aborts.
    pub async fn to_record(&self) -> Result<Record> {
        let mut out = Record::new();
        out.insert("service_tag".into(), self.service_tag().await?.into());
        out.insert("make".into(), self.make().await?.into());
        out.insert("model".into(), self.model().await?.into());
        out.insert("serial".into(), self.serial().await?.into());
        out.insert("cpus".into(), list(self.cpus().await?));
        out.insert("memory".into(), list(self.memory().await?));
        out.insert("nics".into(), list(self.nics().await?));
        out.insert("fans".into(), list(self.fans().await?));
        out.insert("psus".into(), list(self.psus().await?));
        out.insert("health".into(), self.health().await?);
        let controllers = self
            .controllers()
            .await?
            .iter()
            .map(|c| Value::Object(c.to_record()))
            .collect();
        out.insert("controllers".into(), Value::Array(controllers));
        Ok(out)
    }
}
