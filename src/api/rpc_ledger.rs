//! Implements the `Ledger` trait with JSON-RPC 2.0 requests to a ledger gateway.

use crate::api::{Block, BlockRange, Ledger, TxReceipt};
use crate::model::{EventKind, RawEvent};
use crate::Result;
use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;
use url::Url;

const SEND_WRITE: &str = "ledger_sendWrite";
const CALL: &str = "ledger_call";
const GET_PAST_EVENTS: &str = "ledger_getPastEvents";
const GET_BLOCK: &str = "ledger_getBlock";

/// Sends each `Ledger` operation as a JSON-RPC request to the gateway at `url`.
pub(crate) struct RpcLedger {
    url: Url,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcLedger {
    pub(crate) fn new(url: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Unable to create the HTTP client")?;
        Ok(Self {
            url,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    async fn request<T>(&self, method: &str, params: Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!("{method} request {id}");
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to send {method} request to {}", self.url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("Ledger request {method} failed with status {status}: {body}");
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse the {method} response"))?;
        envelope.into_result(method)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl<T> Envelope<T> {
    fn into_result(self, method: &str) -> Result<T> {
        match (self.result, self.error) {
            (_, Some(e)) => bail!("{method} failed: {} (code {})", e.message, e.code),
            (Some(result), None) => Ok(result),
            (None, None) => bail!("{method} returned neither a result nor an error"),
        }
    }
}

#[async_trait::async_trait]
impl Ledger for RpcLedger {
    async fn send_write(&self, method: &str, args: &[Value], signer: &str) -> Result<TxReceipt> {
        self.request(SEND_WRITE, json!([method, args, signer]))
            .await
    }

    async fn call(&self, method: &str, args: &[Value]) -> Result<Vec<Value>> {
        self.request(CALL, json!([method, args])).await
    }

    async fn past_events(&self, kind: EventKind, range: BlockRange) -> Result<Vec<RawEvent>> {
        self.request(GET_PAST_EVENTS, json!([kind.to_string(), range]))
            .await
    }

    async fn block(&self, number: u64) -> Result<Block> {
        self.request(GET_BLOCK, json!([number])).await
    }
}
