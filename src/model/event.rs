use crate::model::uint;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The three kinds of events the inventory contract emits. The serialized form is the event name
/// on the ledger.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "ProductAdded")]
    Added,
    #[serde(rename = "ProductUpdated")]
    Updated,
    #[serde(rename = "ProductDeleted")]
    Deleted,
}

serde_plain::derive_display_from_serialize!(EventKind);
serde_plain::derive_fromstr_from_deserialize!(EventKind);

impl EventKind {
    /// The short action label used in history listings and exports.
    pub fn action(&self) -> &'static str {
        match self {
            EventKind::Added => "add",
            EventKind::Updated => "update",
            EventKind::Deleted => "delete",
        }
    }
}

/// An event exactly as the ledger returns it.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub block_number: u64,
    pub transaction_hash: String,
    #[serde(default)]
    pub return_values: Map<String, Value>,
}

/// The product fields carried by `Added` and `Updated` events.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProductLine {
    pub product_id: u64,
    pub product_name: String,
    pub quantity: u64,
    pub price: u64,
}

/// What an event did to the inventory. Each variant carries only the fields that kind of event
/// actually has.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    Added(ProductLine),
    Updated(ProductLine),
    Deleted { product_id: u64 },
}

impl Change {
    pub fn kind(&self) -> EventKind {
        match self {
            Change::Added(_) => EventKind::Added,
            Change::Updated(_) => EventKind::Updated,
            Change::Deleted { .. } => EventKind::Deleted,
        }
    }

    pub fn product_id(&self) -> u64 {
        match self {
            Change::Added(line) | Change::Updated(line) => line.product_id,
            Change::Deleted { product_id } => *product_id,
        }
    }

    pub fn line(&self) -> Option<&ProductLine> {
        match self {
            Change::Added(line) | Change::Updated(line) => Some(line),
            Change::Deleted { .. } => None,
        }
    }
}

/// A normalized ledger event together with where it was recorded.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerEvent {
    #[serde(flatten)]
    pub change: Change,
    pub block_number: u64,
    pub transaction_hash: String,
}

impl LedgerEvent {
    /// Normalizes a `RawEvent` of the given `kind`. The product id is required. Missing quantity
    /// or price values are read as zero and a missing name as empty.
    pub fn from_raw(kind: EventKind, raw: RawEvent) -> Result<Self> {
        let values = &raw.return_values;
        let product_id = values
            .get("id")
            .with_context(|| format!("{kind} event in block {} has no id", raw.block_number))
            .and_then(uint)?;

        let change = match kind {
            EventKind::Deleted => Change::Deleted { product_id },
            EventKind::Added | EventKind::Updated => {
                let line = ProductLine {
                    product_id,
                    product_name: values
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    quantity: optional_uint(values, "quantity").with_context(|| {
                        format!("Bad quantity in {kind} event {}", raw.transaction_hash)
                    })?,
                    price: optional_uint(values, "price").with_context(|| {
                        format!("Bad price in {kind} event {}", raw.transaction_hash)
                    })?,
                };
                if kind == EventKind::Added {
                    Change::Added(line)
                } else {
                    Change::Updated(line)
                }
            }
        };

        Ok(Self {
            change,
            block_number: raw.block_number,
            transaction_hash: raw.transaction_hash,
        })
    }

    pub fn kind(&self) -> EventKind {
        self.change.kind()
    }
}

fn optional_uint(values: &Map<String, Value>, key: &str) -> Result<u64> {
    match values.get(key) {
        None | Some(Value::Null) => Ok(0),
        Some(v) => uint(v),
    }
}
