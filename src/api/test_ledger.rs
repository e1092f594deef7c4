//! Implements the `Ledger` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a ledger gateway.

use crate::api::inventory::{
    ADD_PRODUCT, DELETE_PRODUCT, GET_PRODUCT, GET_TOTAL_PRODUCTS, UPDATE_PRODUCT,
};
use crate::api::{Block, BlockRange, Ledger, TxReceipt};
use crate::model::{uint, EventKind, Product, RawEvent};
use crate::{import, Result};
use anyhow::{bail, ensure, Context};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashSet;

/// Timestamp of block 0. Each following block is `BLOCK_INTERVAL` seconds later.
const GENESIS_TIMESTAMP: i64 = 1_735_689_600;
const BLOCK_INTERVAL: i64 = 12;

/// Failures a `TestLedger` should simulate.
#[derive(Debug, Default, Clone)]
pub struct Failures {
    writes_for: HashSet<String>,
    products: HashSet<u64>,
    blocks: HashSet<u64>,
    events: bool,
}

impl Failures {
    /// Reject any write whose product name is `name`.
    pub fn fail_writes_for(mut self, name: impl Into<String>) -> Self {
        self.writes_for.insert(name.into());
        self
    }

    /// Fail reads of product `id`.
    pub fn fail_product(mut self, id: u64) -> Self {
        self.products.insert(id);
        self
    }

    /// Fail lookups of block `number`.
    pub fn fail_block(mut self, number: u64) -> Self {
        self.blocks.insert(number);
        self
    }

    /// Fail every event query, as if the ledger were unreachable.
    pub fn fail_events(mut self) -> Self {
        self.events = true;
        self
    }
}

#[derive(Debug, Default)]
struct State {
    products: Vec<Product>,
    events: Vec<(EventKind, RawEvent)>,
    height: u64,
}

impl State {
    /// Applies a contract write, producing one new block holding one event.
    fn write(&mut self, method: &str, args: &[Value]) -> Result<TxReceipt> {
        let (kind, values) = match method {
            ADD_PRODUCT => {
                let [name, quantity, price] = args else {
                    bail!("{ADD_PRODUCT} expects 3 arguments, got {}", args.len());
                };
                let name = text(name)?;
                ensure!(!name.is_empty(), "Product name cannot be empty");
                let id = self.products.len() as u64 + 1;
                let product = Product {
                    id,
                    name: name.to_string(),
                    quantity: uint(quantity)?,
                    price: uint(price)?,
                    active: true,
                };
                let values = line_values(&product);
                self.products.push(product);
                (EventKind::Added, values)
            }
            UPDATE_PRODUCT => {
                let [id, name, quantity, price] = args else {
                    bail!("{UPDATE_PRODUCT} expects 4 arguments, got {}", args.len());
                };
                let product = self.active_mut(uint(id)?)?;
                product.name = text(name)?.to_string();
                product.quantity = uint(quantity)?;
                product.price = uint(price)?;
                (EventKind::Updated, line_values(product))
            }
            DELETE_PRODUCT => {
                let [id] = args else {
                    bail!("{DELETE_PRODUCT} expects 1 argument, got {}", args.len());
                };
                let product = self.active_mut(uint(id)?)?;
                product.active = false;
                (EventKind::Deleted, json!({ "id": product.id.to_string() }))
            }
            other => bail!("Unknown contract method '{other}'"),
        };

        self.height += 1;
        let receipt = TxReceipt {
            transaction_hash: transaction_hash(self.height),
            block_number: self.height,
        };
        self.events.push((
            kind,
            RawEvent {
                block_number: self.height,
                transaction_hash: receipt.transaction_hash.clone(),
                return_values: values.as_object().cloned().unwrap_or_default(),
            },
        ));
        Ok(receipt)
    }

    fn active_mut(&mut self, id: u64) -> Result<&mut Product> {
        match self.products.iter_mut().find(|p| p.id == id) {
            Some(product) if product.active => Ok(product),
            _ => bail!("Product {id} does not exist"),
        }
    }
}

/// An implementation of the `Ledger` trait that keeps a simulated inventory contract in memory.
#[derive(Debug, Default)]
pub struct TestLedger {
    state: Mutex<State>,
    failures: Failures,
}

impl TestLedger {
    /// An empty ledger that fails as described by `failures`.
    pub fn with_failures(failures: Failures) -> Self {
        Self {
            state: Mutex::new(State::default()),
            failures,
        }
    }

    /// A ledger holding the seed products, one of which has been updated and one deleted.
    pub fn seeded() -> Result<Self> {
        let ledger = Self::default();
        {
            let mut state = ledger.state.lock();
            for record in import::parse(SEED_PRODUCTS).context("Invalid seed data")? {
                state.write(
                    ADD_PRODUCT,
                    &[
                        json!(record.name()),
                        json!(record.quantity()),
                        json!(record.price()),
                    ],
                )?;
            }
            state.write(UPDATE_PRODUCT, &[json!(2), json!("Hex Nut M6"), json!(450), json!(2)])?;
            state.write(DELETE_PRODUCT, &[json!(4)])?;
        }
        Ok(ledger)
    }

    /// Records an event directly, without touching the products. Lets tests place several events
    /// in the same block.
    pub(crate) fn record(&self, kind: EventKind, event: RawEvent) {
        let mut state = self.state.lock();
        state.height = state.height.max(event.block_number);
        state.events.push((kind, event));
    }
}

#[async_trait::async_trait]
impl Ledger for TestLedger {
    async fn send_write(&self, method: &str, args: &[Value], signer: &str) -> Result<TxReceipt> {
        ensure!(!signer.is_empty(), "A signer is required for {method}");
        let name = args.iter().find_map(Value::as_str).unwrap_or_default();
        if self.failures.writes_for.contains(name) {
            bail!("Transaction rejected for '{name}'");
        }
        self.state.lock().write(method, args)
    }

    async fn call(&self, method: &str, args: &[Value]) -> Result<Vec<Value>> {
        let state = self.state.lock();
        match method {
            GET_TOTAL_PRODUCTS => Ok(vec![json!(state.products.len().to_string())]),
            GET_PRODUCT => {
                let id = args
                    .first()
                    .with_context(|| format!("{GET_PRODUCT} expects an id"))
                    .and_then(uint)?;
                if self.failures.products.contains(&id) {
                    bail!("Call to {GET_PRODUCT} reverted for product {id}");
                }
                let product = state
                    .products
                    .iter()
                    .find(|p| p.id == id)
                    .with_context(|| format!("Product {id} does not exist"))?;
                Ok(vec![
                    json!(product.id.to_string()),
                    json!(product.name),
                    json!(product.quantity.to_string()),
                    json!(product.price.to_string()),
                    json!(product.active),
                ])
            }
            other => bail!("Unknown contract method '{other}'"),
        }
    }

    async fn past_events(&self, kind: EventKind, range: BlockRange) -> Result<Vec<RawEvent>> {
        if self.failures.events {
            bail!("The ledger is unreachable");
        }
        let state = self.state.lock();
        Ok(state
            .events
            .iter()
            .filter(|(k, e)| *k == kind && range.contains(e.block_number))
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn block(&self, number: u64) -> Result<Block> {
        if self.failures.blocks.contains(&number) {
            bail!("Block {number} is unavailable");
        }
        let height = self.state.lock().height;
        ensure!(number <= height, "Block {number} not found");
        Ok(Block {
            timestamp: GENESIS_TIMESTAMP + BLOCK_INTERVAL * number as i64,
        })
    }
}

fn text(value: &Value) -> Result<&str> {
    value
        .as_str()
        .with_context(|| format!("Expected a string, got {value}"))
}

fn line_values(product: &Product) -> Value {
    json!({
        "id": product.id.to_string(),
        "name": product.name,
        "quantity": product.quantity.to_string(),
        "price": product.price.to_string(),
    })
}

fn transaction_hash(block_number: u64) -> String {
    format!("0x{block_number:064x}")
}

/// Seed product data.
const SEED_PRODUCTS: &str = r##"Product Name,Quantity,Price per Unit
Steel Bolt M6,1200,3
Hex Nut M6,500,1
Washer M6,800,1
"Cable Tie, 200mm",300,2
Wood Screw 4x40,650,4
"##;
