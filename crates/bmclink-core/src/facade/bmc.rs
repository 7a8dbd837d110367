use serde_json::Value;

use super::{or_when_missing, Memo};
use crate::client::Client;
use crate::error::CoreError;
use crate::fields::{as_record, first_string, first_value};
use crate::model::Record;

type Result<T> = std::result::Result<T, CoreError>;

const LICENSE_VERSION: &[&str] = &["license_version", "bmc_license_version"];
const FIRMWARE_VERSION: &[&str] = &["firmware_version", "bmc_firmware_version"];
const REDFISH_VERSION: &[&str] = &["redfish_version"];
const MAC_ADDRESS: &[&str] = &["mac_address", "bmc_mac_address"];
const IP_ADDRESS: &[&str] = &["ip_address", "bmc_ip_address"];
const HOSTNAME: &[&str] = &["hostname", "bmc_hostname"];
const HEALTH: &[&str] = &["health", "bmc_health"];

/// Management controller identity. Strict: adapter failures propagate.
#[derive(Debug, Clone, Copy)]
pub struct BmcInfo<'a> {
    client: &'a Client,
}

impl<'a> BmcInfo<'a> {
    pub const KEYS: [&'static str; 7] = [
        "license_version",
        "firmware_version",
        "redfish_version",
        "mac_address",
        "ip_address",
        "hostname",
        "health",
    ];

    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn memo(&self) -> &'a Memo {
        &self.client.memos.bmc
    }

    /// The adapter's `bmc_info`, else the BMC fields of `system_info`,
    /// else an empty record.
    async fn source(&self) -> Result<Record> {
        let value = self
            .memo()
            .get_or_try("bmc_info", || async {
                match self.client.bmc_info().await {
                    Err(e) if e.is_not_implemented() => {
                        let derived = self.client.system_info().await.map(|info| {
                            Value::Object(from_system_info(&as_record(&info)))
                        });
                        or_when_missing(derived, Value::Object(Record::new()))
                    }
                    other => other,
                }
            })
            .await?;
        Ok(as_record(&value))
    }

    pub async fn license_version(&self) -> Result<Option<String>> {
        Ok(first_string(&self.source().await?, LICENSE_VERSION))
    }

    pub async fn firmware_version(&self) -> Result<Option<String>> {
        Ok(first_string(&self.source().await?, FIRMWARE_VERSION))
    }

    pub async fn redfish_version(&self) -> Result<Option<String>> {
        Ok(first_string(&self.source().await?, REDFISH_VERSION))
    }

    pub async fn mac_address(&self) -> Result<Option<String>> {
        Ok(first_string(&self.source().await?, MAC_ADDRESS))
    }

    pub async fn ip_address(&self) -> Result<Option<String>> {
        Ok(first_string(&self.source().await?, IP_ADDRESS))
    }

    pub async fn hostname(&self) -> Result<Option<String>> {
        Ok(first_string(&self.source().await?, HOSTNAME))
    }

    pub async fn health(&self) -> Result<Option<String>> {
        Ok(first_string(&self.source().await?, HEALTH))
    }

    pub async fn to_record(&self) -> Result<Record> {
        let mut out = Record::new();
        out.insert("license_version".into(), self.license_version().await?.into());
        out.insert("firmware_version".into(), self.firmware_version().await?.into());
        out.insert("redfish_version".into(), self.redfish_version().await?.into());
        out.insert("mac_address".into(), self.mac_address().await?.into());
        out.insert("ip_address".into(), self.ip_address().await?.into());
        out.insert("hostname".into(), self.hostname().await?.into());
        out.insert("health".into(), self.health().await?.into());
        Ok(out)
    }
}

/// BMC attributes an adapter folded into its system summary. Here the
/// `bmc_` spelling is preferred, since a bare `firmware_version` in a
/// system record usually means the host BIOS.
fn from_system_info(info: &Record) -> Record {
    let pick = |candidates: &[&str]| first_value(info, candidates).unwrap_or(Value::Null);

    let mut out = Record::new();
    out.insert(
        "firmware_version".into(),
        pick(&["bmc_firmware_version", "firmware_version"]),
    );
    out.insert(
        "license_version".into(),
        pick(&["bmc_license_version", "license_version"]),
    );
    out.insert("redfish_version".into(), pick(&["redfish_version"]));
    out.insert("mac_address".into(), pick(&["bmc_mac_address"]));
    out.insert("ip_address".into(), pick(&["bmc_ip_address"]));
    out.insert("hostname".into(), pick(&["bmc_hostname"]));
    out.insert("health".into(), pick(&["bmc_health"]));
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn system_info_extraction_prefers_bmc_spelling() {
        let info = as_record(&json!({
            "firmware_version": "2.19.1",
            "bmc_firmware_version": "7.00.00.171",
            "bmc_ip_address": "10.0.0.5"
        }));
        let out = from_system_info(&info);
        assert_eq!(out["firmware_version"], json!("7.00.00.171"));
        assert_eq!(out["ip_address"], json!("10.0.0.5"));
        assert_eq!(out["hostname"], Value::Null);
    }
}
