// ── Normalized facades ──
//
// Read-through views over a `Client`. Each facade owns a memo keyed by
// attribute name; a value is fetched from the adapter at most once per
// client and never invalidated. Failures are not cached.
//
// SystemInfo, BmcInfo and PciInfo are strict: adapter errors propagate.
// PowerInfo and ThermalInfo are best effort: accessors return `None` on
// failure and `to_record` omits those keys.

mod bmc;
mod pci;
mod power;
mod system;
mod thermal;

use std::future::Future;

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::error::CoreError;

pub use bmc::BmcInfo;
pub use pci::PciInfo;
pub use power::PowerInfo;
pub use system::SystemInfo;
pub use thermal::ThermalInfo;

/// Per-attribute cache. The first stored value wins.
#[derive(Debug, Default)]
pub(crate) struct Memo {
    values: DashMap<&'static str, Value>,
}

impl Memo {
    pub(crate) async fn get_or_try<F, Fut>(
        &self,
        key: &'static str,
        compute: F,
    ) -> Result<Value, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, CoreError>>,
    {
        let cached = self.values.get(key).map(|entry| entry.value().clone());
        if let Some(value) = cached {
            return Ok(value);
        }

        let value = compute().await?;
        Ok(self.values.entry(key).or_insert(value).value().clone())
    }

    /// Best-effort variant: failures are logged and read as absent.
    pub(crate) async fn get_or_none<F, Fut>(&self, key: &'static str, compute: F) -> Option<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, CoreError>>,
    {
        match self.get_or_try(key, compute).await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(attribute = key, error = %e, "best-effort attribute unavailable");
                None
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }
}

/// One memo per facade, owned by the client.
#[derive(Debug, Default)]
pub(crate) struct FacadeMemos {
    pub(crate) system: Memo,
    pub(crate) power: Memo,
    pub(crate) bmc: Memo,
    pub(crate) thermal: Memo,
    pub(crate) pci: Memo,
}

/// Treat an adapter that opted out of an operation as having answered
/// `fallback`.
pub(crate) fn or_when_missing(
    result: Result<Value, CoreError>,
    fallback: Value,
) -> Result<Value, CoreError> {
    match result {
        Err(e) if e.is_not_implemented() => Ok(fallback),
        other => other,
    }
}

pub(crate) fn list(values: Vec<Value>) -> Value {
    Value::Array(values)
}

pub(crate) fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
