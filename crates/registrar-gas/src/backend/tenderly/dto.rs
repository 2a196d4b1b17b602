//! Wire format of the Tenderly simulation API.

use {
    alloy::primitives::{Address, B256, Bytes, U256},
    serde::{Deserialize, Deserializer, Serialize, Serializer},
    serde_with::{DisplayFromStr, serde_as},
    std::{
        collections::BTreeMap,
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Request {
    #[serde_as(as = "DisplayFromStr")]
    pub network_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub from: Address,
    pub to: Address,
    pub input: Bytes,
    pub value: Quantity,
    pub save: bool,
    pub save_if_fails: bool,
    pub simulation_type: SimulationType,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub state_objects: BTreeMap<Address, StateObject>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationType {
    Full,
    #[default]
    Quick,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StateObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Quantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Bytes>,
    /// Full 32 byte storage words, Tenderly does not accept quantities here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<BTreeMap<B256, B256>>,
}

/// How amounts of wei are written in requests. The older API versions only
/// parse decimal strings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValueFormat {
    #[default]
    Decimal,
    Hex,
}

impl ValueFormat {
    pub fn quantity(self, value: U256) -> Quantity {
        Quantity {
            value,
            format: self,
        }
    }
}

impl FromStr for ValueFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "decimal" => Ok(Self::Decimal),
            "hex" => Ok(Self::Hex),
            _ => anyhow::bail!("unknown value format {s:?}, expected `decimal` or `hex`"),
        }
    }
}

impl Display for ValueFormat {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Decimal => "decimal",
            Self::Hex => "hex",
        })
    }
}

/// An amount of wei rendered as a string in the configured format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Quantity {
    pub value: U256,
    pub format: ValueFormat,
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.format {
            ValueFormat::Decimal => serializer.collect_str(&self.value),
            ValueFormat::Hex => serializer.collect_str(&format_args!("{:#x}", self.value)),
        }
    }
}

/// Either a simulated transaction or an error object, never both.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub transaction: Option<Transaction>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Transaction {
    pub status: bool,
    #[serde(deserialize_with = "gas")]
    pub gas_used: u64,
    #[serde(default)]
    pub call_trace: Option<Vec<CallTrace>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CallTrace {
    #[serde(default)]
    pub output: Option<Bytes>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Gas is reported as a number or as a decimal or hex string depending on the
/// API version.
fn gas<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Gas {
        Number(u64),
        String(String),
    }

    match Gas::deserialize(deserializer)? {
        Gas::Number(gas) => Ok(gas),
        Gas::String(gas) => match gas.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => gas.parse(),
        }
        .map_err(|err| serde::de::Error::custom(format!("invalid gas {gas:?}: {err}"))),
    }
}
