//! Typed access to the inventory contract on top of a `Ledger`.

use crate::api::{BlockRange, Ledger, TxReceipt};
use crate::model::{uint, EventKind, Product, RawEvent};
use crate::Result;
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, trace};

pub(crate) const ADD_PRODUCT: &str = "addProduct";
pub(crate) const UPDATE_PRODUCT: &str = "updateProduct";
pub(crate) const DELETE_PRODUCT: &str = "deleteProduct";
pub(crate) const GET_PRODUCT: &str = "getProduct";
pub(crate) const GET_TOTAL_PRODUCTS: &str = "getTotalProducts";

/// The inventory contract as seen by a single signer. Cloning is cheap, clones share the ledger.
#[derive(Clone)]
pub struct Inventory {
    ledger: Arc<dyn Ledger>,
    signer: String,
}

impl Inventory {
    pub fn new(ledger: Arc<dyn Ledger>, signer: impl Into<String>) -> Self {
        Self {
            ledger,
            signer: signer.into(),
        }
    }

    pub fn signer(&self) -> &str {
        &self.signer
    }

    pub async fn add_product(&self, name: &str, quantity: u64, price: u64) -> Result<TxReceipt> {
        self.ledger
            .send_write(
                ADD_PRODUCT,
                &[json!(name), json!(quantity), json!(price)],
                &self.signer,
            )
            .await
            .with_context(|| format!("Unable to add product '{name}'"))
    }

    pub async fn update_product(
        &self,
        id: u64,
        name: &str,
        quantity: u64,
        price: u64,
    ) -> Result<TxReceipt> {
        self.ledger
            .send_write(
                UPDATE_PRODUCT,
                &[json!(id), json!(name), json!(quantity), json!(price)],
                &self.signer,
            )
            .await
            .with_context(|| format!("Unable to update product {id}"))
    }

    pub async fn delete_product(&self, id: u64) -> Result<TxReceipt> {
        self.ledger
            .send_write(DELETE_PRODUCT, &[json!(id)], &self.signer)
            .await
            .with_context(|| format!("Unable to delete product {id}"))
    }

    /// Reads a product, whether it is active or deleted.
    pub async fn get_product(&self, id: u64) -> Result<Product> {
        let tuple = self
            .ledger
            .call(GET_PRODUCT, &[json!(id)])
            .await
            .with_context(|| format!("Unable to read product {id}"))?;
        Product::from_tuple(&tuple)
    }

    /// The number of product ids ever issued. Ids run from 1 to this number.
    pub async fn total_products(&self) -> Result<u64> {
        let tuple = self
            .ledger
            .call(GET_TOTAL_PRODUCTS, &[])
            .await
            .context("Unable to read the total number of products")?;
        match tuple.first() {
            Some(value) => uint(value),
            None => bail!("{GET_TOTAL_PRODUCTS} returned no value"),
        }
    }

    /// Scans every product id and returns the products that are currently active. Ids that
    /// cannot be read are skipped.
    pub async fn active_products(&self) -> Result<Vec<Product>> {
        let total = self.total_products().await?;
        let mut products = Vec::new();
        for id in 1..=total {
            match self.get_product(id).await {
                Ok(product) if product.is_active() => products.push(product),
                Ok(_) => trace!("Product {id} is deleted"),
                Err(e) => debug!("Skipping product {id}: {e:#}"),
            }
        }
        Ok(products)
    }

    /// The live stock value: `quantity * price` summed over the active products.
    pub async fn current_stock_value(&self) -> Result<u128> {
        Ok(self
            .active_products()
            .await?
            .iter()
            .map(Product::total_value)
            .sum())
    }

    /// The complete history of one kind of event, from genesis to the latest block.
    pub async fn events(&self, kind: EventKind) -> Result<Vec<RawEvent>> {
        self.ledger
            .past_events(kind, BlockRange::all())
            .await
            .with_context(|| format!("Unable to fetch {kind} events"))
    }

    /// The time at which block `number` was produced.
    pub async fn block_time(&self, number: u64) -> Result<DateTime<Utc>> {
        let block = self
            .ledger
            .block(number)
            .await
            .with_context(|| format!("Unable to read block {number}"))?;
        DateTime::<Utc>::from_timestamp(block.timestamp, 0)
            .with_context(|| format!("Block {number} has an invalid timestamp {}", block.timestamp))
    }
}
