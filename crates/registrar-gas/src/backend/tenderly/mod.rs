//! Simulations through the Tenderly API. Contract reads and block lookups are
//! not supported by the API and go through a regular node instead.

pub mod dto;

use {
    super::{Backend, CallRequest, Simulation},
    crate::overrides::{SlotEncoding, StateOverrides},
    alloy::{
        primitives::{Address, Bytes},
        rpc::types::BlockNumberOrTag,
    },
    anyhow::Result,
    reqwest::{
        StatusCode,
        Url,
        header::{HeaderMap, HeaderValue},
    },
    std::{collections::BTreeMap, sync::Arc, time::Duration},
    thiserror::Error,
};

pub const DEFAULT_URL: &str = "https://api.tenderly.co/api/v1/";

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("unexpected response {0}: {1}")]
    Status(StatusCode, String),
    #[error("invalid response body: {0}")]
    Body(#[from] serde_json::Error),
    /// The error object returned by Tenderly in place of a simulation.
    #[error("{0}")]
    Api(serde_json::Value),
    #[error("simulation reverted: {0}")]
    Reverted(String),
}

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait TenderlyApi: Send + Sync + 'static {
    async fn simulate(&self, request: dto::Request) -> Result<dto::Response, Error>;
}

pub struct TenderlyHttpApi {
    url: Url,
    client: reqwest::Client,
}

impl TenderlyHttpApi {
    pub fn new(
        base: &Url,
        user: &str,
        project: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let mut api_key = HeaderValue::from_str(api_key)?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("x-access-key", api_key);

        Ok(Self {
            url: base.join(&format!("account/{user}/project/{project}/simulate"))?,
            client: reqwest::Client::builder()
                .default_headers(headers)
                .timeout(timeout)
                .build()?,
        })
    }
}

#[async_trait::async_trait]
impl TenderlyApi for TenderlyHttpApi {
    async fn simulate(&self, request: dto::Request) -> Result<dto::Response, Error> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        // Errors come with a non-success status but still carry the error
        // object in their body.
        match serde_json::from_str(&body) {
            Ok(response) => Ok(response),
            Err(err) if status.is_success() => Err(err.into()),
            Err(_) => Err(Error::Status(status, body)),
        }
    }
}

/// Backend simulating through Tenderly on one chain.
pub struct TenderlyBackend {
    node: Arc<dyn Backend>,
    api: Arc<dyn TenderlyApi>,
    network_id: u64,
    value_format: dto::ValueFormat,
}

impl TenderlyBackend {
    pub fn new(
        node: Arc<dyn Backend>,
        api: Arc<dyn TenderlyApi>,
        network_id: u64,
        value_format: dto::ValueFormat,
    ) -> Self {
        Self {
            node,
            api,
            network_id,
            value_format,
        }
    }

    fn state_objects(&self, overrides: &StateOverrides) -> BTreeMap<Address, dto::StateObject> {
        overrides
            .iter()
            .map(|(address, account)| {
                let storage = (!account.state_diff.is_empty()).then(|| {
                    account
                        .state_diff
                        .iter()
                        .map(|(slot, value)| (*slot, value.word()))
                        .collect()
                });
                let object = dto::StateObject {
                    balance: account
                        .balance
                        .map(|balance| self.value_format.quantity(balance)),
                    code: account.code.clone(),
                    storage,
                };
                (*address, object)
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl Backend for TenderlyBackend {
    fn name(&self) -> String {
        "tenderly".to_owned()
    }

    fn slot_encoding(&self) -> SlotEncoding {
        SlotEncoding::Padded
    }

    async fn read(&self, to: Address, data: Bytes, block: BlockNumberOrTag) -> Result<Bytes> {
        self.node.read(to, data, block).await
    }

    async fn block_timestamp(&self, number: u64) -> Result<u64> {
        self.node.block_timestamp(number).await
    }

    async fn simulate(
        &self,
        call: CallRequest,
        block: BlockNumberOrTag,
        overrides: StateOverrides,
    ) -> Result<Simulation> {
        let request = dto::Request {
            network_id: self.network_id,
            block_number: block.as_number(),
            from: call.from,
            to: call.to,
            input: call.input,
            value: self.value_format.quantity(call.value),
            save: false,
            save_if_fails: false,
            simulation_type: dto::SimulationType::Quick,
            state_objects: self.state_objects(&overrides),
        };

        let response = self.api.simulate(request).await?;
        if let Some(error) = response.error {
            return Err(Error::Api(error).into());
        }
        let transaction = response
            .transaction
            .ok_or_else(|| anyhow::anyhow!("response without transaction or error"))?;
        let trace = transaction
            .call_trace
            .and_then(|trace| trace.into_iter().next())
            .unwrap_or_default();
        if !transaction.status {
            let reason = trace.error.unwrap_or_else(|| "unknown reason".to_owned());
            return Err(Error::Reverted(reason).into());
        }

        Ok(Simulation {
            output: trace.output.unwrap_or_default(),
            gas_used: Some(transaction.gas_used),
        })
    }
}
