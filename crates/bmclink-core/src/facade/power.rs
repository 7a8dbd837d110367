use serde_json::Value;

use super::{into_list, list, or_when_missing, Memo};
use crate::client::Client;
use crate::error::CoreError;
use crate::fields::{as_record, first_f64, first_string, insert_opt};
use crate::model::Record;

const STATE: &[&str] = &["power_state", "state", "PowerState"];
const USAGE_WATTS: &[&str] = &["consumed_watts", "power_usage_watts", "PowerConsumedWatts"];
const CAPACITY_WATTS: &[&str] = &["capacity_watts", "power_capacity_watts", "PowerCapacityWatts"];
const ALLOCATED_WATTS: &[&str] = &[
    "allocated_watts",
    "power_allocated_watts",
    "PowerAllocatedWatts",
];

/// Power state, consumption and actions. Best effort: data accessors
/// return `None` when the adapter cannot answer.
#[derive(Debug, Clone, Copy)]
pub struct PowerInfo<'a> {
    client: &'a Client,
}

impl<'a> PowerInfo<'a> {
    /// Data keys reported by [`Self::to_record`]; the actions are not data.
    pub const KEYS: [&'static str; 6] = [
        "state",
        "usage_watts",
        "capacity_watts",
        "allocated_watts",
        "reset_types_allowed",
        "psus",
    ];

    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn memo(&self) -> &'a Memo {
        &self.client.memos.power
    }

    /// `power_status` as a record. A bare state string is wrapped as
    /// `power_state`; an adapter without power support reads as empty.
    async fn status(&self) -> Option<Record> {
        let value = self
            .memo()
            .get_or_none("power_status", || async {
                let status = match self.client.power_status().await {
                    Ok(Value::Object(map)) => Ok(Value::Object(map)),
                    Ok(other) => {
                        let mut map = Record::new();
                        map.insert("power_state".into(), other);
                        Ok(Value::Object(map))
                    }
                    Err(e) => Err(e),
                };
                or_when_missing(status, Value::Object(Record::new()))
            })
            .await?;
        Some(as_record(&value))
    }

    async fn consumption(&self) -> Option<Record> {
        let value = self
            .memo()
            .get_or_none("power_consumption", || async {
                or_when_missing(
                    self.client.power_consumption().await,
                    Value::Object(Record::new()),
                )
            })
            .await?;
        Some(as_record(&value))
    }

    async fn consumption_watts(&self) -> Option<f64> {
        self.memo()
            .get_or_none("power_consumption_watts", || async {
                let watts = self
                    .client
                    .power_consumption_watts()
                    .await
                    .map(|w| w.map_or(Value::Null, Value::from));
                or_when_missing(watts, Value::Null)
            })
            .await?
            .as_f64()
    }

    pub async fn state(&self) -> Option<String> {
        first_string(&self.status().await?, STATE)
    }

    /// Consumed watts from the consumption record, else the adapter's
    /// single-number reading.
    pub async fn usage_watts(&self) -> Option<f64> {
        let from_record = match self.consumption().await {
            Some(record) => first_f64(&record, USAGE_WATTS),
            None => None,
        };
        match from_record {
            Some(watts) => Some(watts),
            None => self.consumption_watts().await,
        }
    }

    pub async fn capacity_watts(&self) -> Option<f64> {
        first_f64(&self.consumption().await?, CAPACITY_WATTS)
    }

    pub async fn allocated_watts(&self) -> Option<f64> {
        first_f64(&self.consumption().await?, ALLOCATED_WATTS)
    }

    pub async fn reset_types_allowed(&self) -> Option<Vec<String>> {
        let value = self
            .memo()
            .get_or_none("reset_types", || async {
                self.client
                    .reset_type_allowed()
                    .await
                    .map(|types| types.into_iter().map(Value::from).collect())
            })
            .await?;
        Some(
            into_list(value)
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect(),
        )
    }

    pub async fn psus(&self) -> Option<Vec<Value>> {
        let value = self
            .memo()
            .get_or_none("psus", || async { self.client.psus().await.map(list) })
            .await?;
        Some(into_list(value))
    }

    // ── Actions (never cached) ──────────────────────────────────────

    pub async fn on(&self) -> Result<(), CoreError> {
        self.client.power_on().await
    }

    pub async fn off(&self, force: bool) -> Result<(), CoreError> {
        self.client.power_off(force).await
    }

    pub async fn restart(&self, force: bool) -> Result<(), CoreError> {
        self.client.power_restart(force).await
    }

    pub async fn cycle(&self) -> Result<(), CoreError> {
        self.client.power_cycle().await
    }

    /// Data keys that could be computed; the rest are left out.
    pub async fn to_record(&self) -> Record {
        let mut out = Record::new();
        insert_opt(&mut out, "state", self.state().await);
        insert_opt(&mut out, "usage_watts", self.usage_watts().await);
        insert_opt(&mut out, "capacity_watts", self.capacity_watts().await);
        insert_opt(&mut out, "allocated_watts", self.allocated_watts().await);
        insert_opt(&mut out, "reset_types_allowed", self.reset_types_allowed().await);
        insert_opt(&mut out, "psus", self.psus().await);
        out
    }
}
