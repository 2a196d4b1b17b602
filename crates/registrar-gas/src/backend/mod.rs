//! Endpoints that contract reads and simulations can be executed against.

pub mod node;
pub mod tenderly;

use {
    crate::overrides::{SlotEncoding, StateOverrides},
    alloy::{
        primitives::{Address, Bytes, U256},
        rpc::types::BlockNumberOrTag,
    },
    anyhow::Result,
    serde::Serialize,
};

/// A transaction to simulate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    #[serde(rename = "data")]
    pub input: Bytes,
    pub value: U256,
}

/// Outcome of a successful simulation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Simulation {
    /// Return data of the simulated call.
    pub output: Bytes,
    /// Gas used by the whole simulated transaction, if the endpoint reports
    /// it.
    pub gas_used: Option<u64>,
}

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Label used when logging about this endpoint.
    fn name(&self) -> String;

    /// Encoding of storage words this endpoint accepts in overrides.
    fn slot_encoding(&self) -> SlotEncoding;

    /// Executes a read-only contract call.
    async fn read(&self, to: Address, data: Bytes, block: BlockNumberOrTag) -> Result<Bytes>;

    /// Timestamp of the block with the given number.
    async fn block_timestamp(&self, number: u64) -> Result<u64>;

    /// Executes `call` on top of `block` with `overrides` applied. A reverted
    /// call is an error.
    async fn simulate(
        &self,
        call: CallRequest,
        block: BlockNumberOrTag,
        overrides: StateOverrides,
    ) -> Result<Simulation>;
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::address, serde_json::json};

    #[test]
    fn serializes_call_request() {
        let call = CallRequest {
            from: address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045"),
            to: address!("00000000000000000000000000000000deadbeef"),
            input: Bytes::from_static(&[0x05, 0xe8, 0x32, 0xbc]),
            value: U256::from(255),
        };
        assert_eq!(
            serde_json::to_value(call).unwrap(),
            json!({
                "from": "0xd8da6bf26964af9d7eed9e03e53415d37aa96045",
                "to": "0x00000000000000000000000000000000deadbeef",
                "data": "0x05e832bc",
                "value": "0xff",
            }),
        );
    }
}
