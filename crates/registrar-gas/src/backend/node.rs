//! Backend talking to a node's JSON RPC API directly.

use {
    super::{Backend, CallRequest, Simulation},
    crate::overrides::{SlotEncoding, StateOverrides},
    alloy::{
        primitives::{Address, Bytes},
        providers::{DynProvider, Provider, ProviderBuilder},
        rpc::types::{BlockNumberOrTag, TransactionRequest},
    },
    anyhow::{Context, Result},
    std::{error::Error, future::Future, time::Duration},
    url::Url,
};

/// Node supporting `eth_call` with state overrides.
pub struct NodeBackend {
    name: String,
    provider: DynProvider,
    encoding: SlotEncoding,
    timeout: Duration,
}

impl NodeBackend {
    pub fn new(name: String, url: Url, encoding: SlotEncoding, timeout: Duration) -> Self {
        Self::with_provider(
            name,
            ProviderBuilder::new()
                .disable_recommended_fillers()
                .connect_http(url)
                .erased(),
            encoding,
            timeout,
        )
    }

    pub fn with_provider(
        name: String,
        provider: DynProvider,
        encoding: SlotEncoding,
        timeout: Duration,
    ) -> Self {
        Self {
            name,
            provider,
            encoding,
            timeout,
        }
    }

    async fn request<T, E>(
        &self,
        method: &str,
        request: impl Future<Output = Result<T, E>>,
    ) -> Result<T>
    where
        E: Error + Send + Sync + 'static,
    {
        tokio::time::timeout(self.timeout, request)
            .await
            .with_context(|| format!("{method} timed out after {:?}", self.timeout))?
            .with_context(|| format!("{method} failed on {}", self.name))
    }
}

#[async_trait::async_trait]
impl Backend for NodeBackend {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn slot_encoding(&self) -> SlotEncoding {
        self.encoding
    }

    async fn read(&self, to: Address, data: Bytes, block: BlockNumberOrTag) -> Result<Bytes> {
        let tx = TransactionRequest::default().to(to).input(data.into());
        self.request("eth_call", async {
            self.provider.call(tx).block(block.into()).await
        })
        .await
    }

    async fn block_timestamp(&self, number: u64) -> Result<u64> {
        let block = self
            .request("eth_getBlockByNumber", async {
                self.provider
                    .get_block_by_number(BlockNumberOrTag::Number(number))
                    .await
            })
            .await?
            .with_context(|| format!("block {number} not found"))?;
        Ok(block.header.timestamp)
    }

    async fn simulate(
        &self,
        call: CallRequest,
        block: BlockNumberOrTag,
        overrides: StateOverrides,
    ) -> Result<Simulation> {
        // Untyped so that storage values keep this endpoint's slot encoding.
        let output: Bytes = self
            .request("eth_call", async {
                self.provider
                    .raw_request("eth_call".into(), (call, block, overrides))
                    .await
            })
            .await?;
        Ok(Simulation {
            output,
            gas_used: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::{primitives::address, providers::mock::Asserter},
    };

    fn backend(asserter: &Asserter) -> NodeBackend {
        NodeBackend::with_provider(
            "1/test".to_owned(),
            ProviderBuilder::new()
                .disable_recommended_fillers()
                .connect_mocked_client(asserter.clone())
                .erased(),
            SlotEncoding::Padded,
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn reads_contract() {
        let asserter = Asserter::new();
        asserter.push_success(&"0x0000000000000000000000000000000000000000000000000000000000000001");
        let output = backend(&asserter)
            .read(
                address!("253553366Da8546fC250F225fe3d25d0C782303b"),
                Bytes::from_static(&[1, 2, 3, 4]),
                BlockNumberOrTag::Latest,
            )
            .await
            .unwrap();
        assert_eq!(output.len(), 32);
        assert_eq!(output[31], 1);
    }

    #[tokio::test]
    async fn simulates_call() {
        let asserter = Asserter::new();
        asserter.push_success(&"0x000000000000000000000000000000000000000000000000000000000001e240");
        let simulation = backend(&asserter)
            .simulate(
                CallRequest::default(),
                BlockNumberOrTag::Number(9000000),
                StateOverrides::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            crate::gas_meter::decode(&simulation.output).unwrap(),
            123456
        );
        assert_eq!(simulation.gas_used, None);
    }

    #[tokio::test]
    async fn propagates_rpc_errors() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("execution reverted");
        let result = backend(&asserter)
            .simulate(
                CallRequest::default(),
                BlockNumberOrTag::Latest,
                StateOverrides::default(),
            )
            .await;
        assert!(format!("{:#}", result.unwrap_err()).contains("execution reverted"));
    }

    #[tokio::test]
    async fn missing_block() {
        let asserter = Asserter::new();
        asserter.push_success(&serde_json::Value::Null);
        let result = backend(&asserter).block_timestamp(1).await;
        assert!(result.unwrap_err().to_string().contains("block 1 not found"));
    }

    #[tokio::test]
    #[ignore]
    async fn node_block_timestamp() {
        let url = std::env::var("NODE_URL").unwrap().parse().unwrap();
        let backend = NodeBackend::new(
            "node".to_owned(),
            url,
            SlotEncoding::Padded,
            Duration::from_secs(10),
        );
        assert!(backend.block_timestamp(1).await.unwrap() > 0);
    }
}
