use serde_json::Value;

use super::{into_list, list, Memo};
use crate::client::Client;
use crate::fields::insert_opt;
use crate::model::Record;

/// Fans and temperature sensors. Best effort.
#[derive(Debug, Clone, Copy)]
pub struct ThermalInfo<'a> {
    client: &'a Client,
}

impl<'a> ThermalInfo<'a> {
    pub const KEYS: [&'static str; 2] = ["fans", "temperatures"];

    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn memo(&self) -> &'a Memo {
        &self.client.memos.thermal
    }

    pub async fn fans(&self) -> Option<Vec<Value>> {
        let value = self
            .memo()
            .get_or_none("fans", || async { self.client.fans().await.map(list) })
            .await?;
        Some(into_list(value))
    }

    pub async fn temperatures(&self) -> Option<Vec<Value>> {
        let value = self
            .memo()
            .get_or_none("temperatures", || async {
                self.client.temperatures().await.map(list)
            })
            .await?;
        Some(into_list(value))
    }

    pub async fn to_record(&self) -> Record {
        let mut out = Record::new();
        insert_opt(&mut out, "fans", self.fans().await);
        insert_opt(&mut out, "temperatures", self.temperatures().await);
        out
    }
}
