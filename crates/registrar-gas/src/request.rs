//! Estimation requests and results.

use {
    alloy::primitives::{Address, Bytes},
    serde::{Deserialize, Serialize},
};

/// One year (365.25 days), the default registration duration.
pub const DEFAULT_DURATION: u64 = 31557600;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub network_id: u64,
    pub label: String,
    pub owner: Address,
    pub resolver: Address,
    /// Resolver calls (e.g. `setAddr`) executed as part of the registration.
    pub data: Vec<Bytes>,
    pub reverse_record: bool,
    pub owner_controlled_fuses: u16,
    #[serde(default = "default_duration")]
    pub duration: u64,
    /// Simulate against this block instead of the latest one.
    #[serde(default)]
    pub block_number: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionRequest {
    pub network_id: u64,
    pub labels: Vec<String>,
    pub duration: u64,
    /// The account paying for the renewal.
    pub from: Address,
    #[serde(default)]
    pub block_number: Option<u64>,
}

impl ExtensionRequest {
    /// More than one label is renewed through the bulk renewal contract.
    pub fn is_bulk(&self) -> bool {
        self.labels.len() > 1
    }
}

fn default_duration() -> u64 {
    DEFAULT_DURATION
}

/// The final estimate reported to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    pub gas_used: u64,
    pub status: bool,
}

impl GasEstimate {
    pub fn success(gas_used: u64) -> Self {
        Self {
            gas_used,
            status: true,
        }
    }
}
