// Vendor detection
//
// Probes the Redfish service root (and, if needed, the first manager) to
// work out which vendor dialect a BMC speaks. Detection failure is an
// ordinary outcome: every probe error is logged and absorbed, and the
// caller gets `None` rather than an `Err`.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::descriptor::{ConnectionDescriptor, RetryPolicy};
use crate::error::Error;
use crate::transport::{RequestOptions, Transport, TransportConfig};
use crate::vendor::{match_alias, VendorKey};

const SERVICE_ROOT: &str = "/redfish/v1";

/// Timeouts and retry budget used while probing.
///
/// Deliberately tighter than normal requests so an unreachable host fails
/// fast instead of stalling client construction.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Send credentials with the probes. Some BMCs refuse anonymous access
    /// to the service root.
    pub authenticated: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::new(2, Duration::from_millis(500)),
            authenticated: true,
        }
    }
}

/// What the service root alone says about the vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identification {
    /// A vendor field, OEM key or product name settled it.
    Vendor(VendorKey),
    /// No direct evidence; the manager collection at this path may help.
    Managers(String),
    /// Nothing to go on.
    Generic,
}

/// Inspect a service root document. Pure: no I/O, no hidden state.
///
/// Checks, in order: an explicit `Vendor`/`Manufacturer` field, the first
/// key of the `Oem` map, then the `Product` string against the alias
/// table. Falls back to the manager collection link, then to generic.
pub fn identify_vendor(root: &Value) -> Identification {
    let explicit = ["Vendor", "Manufacturer"]
        .iter()
        .find_map(|field| root.get(*field).and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty());
    if let Some(vendor) = explicit {
        return Identification::Vendor(VendorKey::new(vendor));
    }

    let oem_family = root
        .get("Oem")
        .and_then(Value::as_object)
        .and_then(|oem| oem.keys().find(|k| !k.starts_with('@')));
    if let Some(family) = oem_family {
        return Identification::Vendor(VendorKey::new(family));
    }

    if let Some(vendor) = root
        .get("Product")
        .and_then(Value::as_str)
        .and_then(match_alias)
    {
        return Identification::Vendor(VendorKey::new(vendor));
    }

    match odata_id(root.get("Managers")) {
        Some(path) => Identification::Managers(path.to_owned()),
        None => Identification::Generic,
    }
}

/// Infers the vendor dialect of a BMC.
pub struct VendorDetector {
    transport: Transport,
    config: DetectorConfig,
}

impl VendorDetector {
    pub fn new(descriptor: &ConnectionDescriptor) -> Result<Self, Error> {
        Self::with_config(descriptor, DetectorConfig::default())
    }

    pub fn with_config(
        descriptor: &ConnectionDescriptor,
        config: DetectorConfig,
    ) -> Result<Self, Error> {
        let descriptor = descriptor.clone().with_retry(config.retry);
        let transport_config = TransportConfig {
            timeout: config.timeout,
            connect_timeout: (config.timeout / 2).min(Duration::from_secs(5)),
            ..TransportConfig::default()
        };
        let transport = Transport::with_config(descriptor, transport_config)?;
        Ok(Self { transport, config })
    }

    /// Detect the vendor key, or `None` if the BMC could not be probed.
    ///
    /// A reachable, well-formed service root with no vendor hints yields
    /// [`VendorKey::GENERIC`], never `None`.
    pub async fn detect(&self) -> Option<VendorKey> {
        let host = self.transport.host();
        debug!(%host, port = self.transport.descriptor().port, "detecting vendor");

        let Some(root) = self.fetch_json(SERVICE_ROOT).await else {
            debug!(%host, "service root unavailable, vendor undetected");
            return None;
        };

        let vendor = match identify_vendor(&root) {
            Identification::Vendor(vendor) => vendor,
            Identification::Managers(path) => self
                .detect_from_managers(&path)
                .await
                .unwrap_or_else(VendorKey::generic),
            Identification::Generic => VendorKey::generic(),
        };

        info!(%host, %vendor, "detected vendor");
        Some(vendor)
    }

    async fn detect_from_managers(&self, managers_path: &str) -> Option<VendorKey> {
        let collection = self.fetch_json(managers_path).await?;
        let manager_path = collection
            .get("Members")
            .and_then(Value::as_array)
            .and_then(|members| members.first())
            .and_then(|member| odata_id(Some(member)))?;

        // Dell names its manager iDRAC.Embedded.1.
        if manager_path.contains("iDRAC") {
            return Some(VendorKey::new(VendorKey::DELL));
        }

        let manager = self.fetch_json(manager_path).await?;
        ["Model", "Description"]
            .iter()
            .filter_map(|field| manager.get(*field).and_then(Value::as_str))
            .find_map(match_alias)
            .map(VendorKey::new)
    }

    /// GET a JSON document, absorbing every failure into `None`.
    async fn fetch_json(&self, path: &str) -> Option<Value> {
        let mut options = RequestOptions::new().timeout(self.config.timeout);
        if !self.config.authenticated {
            options = options.unauthenticated();
        }

        let resp = match self
            .transport
            .request(reqwest::Method::GET, path, options)
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                debug!(path, error = %e, "probe failed");
                return None;
            }
        };

        match resp.status() {
            200 => {}
            401 => {
                debug!(path, "authentication failed (HTTP 401), check username/password");
                return None;
            }
            404 => {
                debug!(path, "Redfish API not found (HTTP 404)");
                return None;
            }
            status => {
                debug!(path, status, "unexpected status while probing");
                return None;
            }
        }

        match resp.json::<Value>() {
            Ok(doc) if doc.is_object() => Some(doc),
            Ok(_) => {
                debug!(path, "probe returned a non-object JSON document");
                None
            }
            Err(e) => {
                debug!(path, error = %e, "probe returned invalid JSON");
                None
            }
        }
    }
}

/// Detect the vendor behind `descriptor` with default probing settings.
pub async fn detect_vendor(descriptor: &ConnectionDescriptor) -> Option<VendorKey> {
    match VendorDetector::new(descriptor) {
        Ok(detector) => detector.detect().await,
        Err(e) => {
            debug!(error = %e, "could not build detector transport");
            None
        }
    }
}

fn odata_id(link: Option<&Value>) -> Option<&str> {
    link?.get("@odata.id")?.as_str()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn vendor(key: &str) -> Identification {
        Identification::Vendor(VendorKey::new(key))
    }

    #[test]
    fn explicit_vendor_field_wins() {
        let root = json!({ "Vendor": "Dell", "Product": "Integrated Lights Out" });
        assert_eq!(identify_vendor(&root), vendor("dell"));
    }

    #[test]
    fn manufacturer_field_counts_as_explicit() {
        let root = json!({ "Manufacturer": "Supermicro", "RedfishVersion": "1.8.0" });
        assert_eq!(identify_vendor(&root), vendor("supermicro"));
    }

    #[test]
    fn oem_family_key() {
        let root = json!({ "Oem": { "Dell": { "ServiceTag": "ABC1234" } } });
        assert_eq!(identify_vendor(&root), vendor("dell"));
    }

    #[test]
    fn oem_keeps_document_order() {
        let root = json!({ "Oem": { "Hpe": {}, "Ami": {} } });
        assert_eq!(identify_vendor(&root), vendor("hpe"));
    }

    #[test]
    fn empty_oem_falls_through_to_product() {
        let root = json!({ "Oem": {}, "Product": "ProLiant DL380 Gen10" });
        assert_eq!(identify_vendor(&root), vendor("hpe"));
    }

    #[test]
    fn product_patterns() {
        for (product, expected) in [
            ("PowerEdge R640", "dell"),
            ("iDRAC 9", "dell"),
            ("Supermicro X12", "supermicro"),
            ("ThinkSystem SR630", "lenovo"),
            ("ASRockRack ROMED8", "asrockrack"),
        ] {
            let root = json!({ "Product": product });
            assert_eq!(identify_vendor(&root), vendor(expected), "{product}");
        }
    }

    #[test]
    fn unrecognised_vendor_string_is_kept() {
        let root = json!({ "Vendor": "AMI" });
        assert_eq!(identify_vendor(&root), vendor("ami"));
    }

    #[test]
    fn falls_back_to_managers_link() {
        let root = json!({
            "Product": "Some BMC",
            "Managers": { "@odata.id": "/redfish/v1/Managers" }
        });
        assert_eq!(
            identify_vendor(&root),
            Identification::Managers("/redfish/v1/Managers".into())
        );
    }

    #[test]
    fn no_hints_is_generic() {
        let root = json!({ "RedfishVersion": "1.6.0", "Product": "OpenBMC" });
        assert_eq!(identify_vendor(&root), Identification::Generic);
    }

    #[test]
    fn identification_is_deterministic() {
        let root = json!({ "Oem": { "Supermicro": {} }, "Product": "X11" });
        let first = identify_vendor(&root);
        for _ in 0..10 {
            assert_eq!(identify_vendor(&root), first);
        }
    }
}
