//! State overrides that make registration and renewal calls executable in a
//! simulation, regardless of the caller's funds and permissions.

use {
    crate::{
        commitment::Commitment,
        gas_meter,
        network::Network,
        request::RegistrationRequest,
        slots,
    },
    alloy::primitives::{Address, B256, Bytes, U256},
    serde::{Serialize, Serializer},
    std::{
        collections::BTreeMap,
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

/// Balance credited on top of the transaction value so that balance checks
/// never fail (10 ETH).
pub const BALANCE_BUFFER: U256 = U256::from_limbs([10_000_000_000_000_000_000, 0, 0, 0]);

/// How a node expects storage values in `stateDiff` overrides to be encoded.
///
/// Geth only accepts full 32 byte words while some other implementations
/// parse them as quantities and reject leading zeros.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SlotEncoding {
    /// `0x0000…0001`
    #[default]
    Padded,
    /// `0x1`
    Compact,
}

impl FromStr for SlotEncoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "padded" => Ok(Self::Padded),
            "compact" => Ok(Self::Compact),
            _ => anyhow::bail!("unknown slot encoding {s:?}, expected `padded` or `compact`"),
        }
    }
}

impl Display for SlotEncoding {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Padded => "padded",
            Self::Compact => "compact",
        })
    }
}

/// A storage word as it will be sent to the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageValue {
    Padded(B256),
    Compact(U256),
}

impl StorageValue {
    /// The full storage word, independent of the encoding.
    pub fn word(&self) -> B256 {
        match self {
            Self::Padded(word) => *word,
            Self::Compact(value) => B256::from(*value),
        }
    }
}

impl Serialize for StorageValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Padded(word) => word.serialize(serializer),
            Self::Compact(value) => value.serialize(serializer),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Bytes>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub state_diff: BTreeMap<B256, StorageValue>,
}

/// Override set for a single simulated call, keyed by account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StateOverrides(pub BTreeMap<Address, AccountOverride>);

impl StateOverrides {
    pub fn get(&self, account: &Address) -> Option<&AccountOverride> {
        self.0.get(account)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &AccountOverride)> {
        self.0.iter()
    }
}

/// Incrementally assembles [`StateOverrides`] for one endpoint.
#[derive(Debug)]
pub struct Builder {
    encoding: SlotEncoding,
    overrides: BTreeMap<Address, AccountOverride>,
}

impl Builder {
    pub fn new(encoding: SlotEncoding) -> Self {
        Self {
            encoding,
            overrides: Default::default(),
        }
    }

    pub fn code(mut self, account: Address, code: Bytes) -> Self {
        self.account(account).code = Some(code);
        self
    }

    pub fn balance(mut self, account: Address, balance: U256) -> Self {
        self.account(account).balance = Some(balance);
        self
    }

    pub fn storage(mut self, account: Address, slot: B256, word: B256) -> Self {
        let value = match self.encoding {
            SlotEncoding::Padded => StorageValue::Padded(word),
            SlotEncoding::Compact => StorageValue::Compact(U256::from_be_bytes(word.0)),
        };
        self.account(account).state_diff.insert(slot, value);
        self
    }

    /// Sets a `bool` storage variable to `true`.
    pub fn flag(self, account: Address, slot: B256) -> Self {
        self.storage(account, slot, B256::with_last_byte(1))
    }

    pub fn build(self) -> StateOverrides {
        StateOverrides(self.overrides)
    }

    fn account(&mut self, account: Address) -> &mut AccountOverride {
        self.overrides.entry(account).or_default()
    }
}

/// Overrides for `register`:
/// - the gas meter on the relay, with the commitment timestamp in its storage
///   since the controller code runs in the relay's context
/// - the relay as a name wrapper controller
/// - the relay as an approved operator of the owner on the resolver
/// - the relay as a reverse registrar controller, if a reverse record is set
/// - enough balance for the owner to pay for the name
pub fn registration(
    encoding: SlotEncoding,
    network: &Network,
    request: &RegistrationRequest,
    commitment: &Commitment,
    commitment_timestamp: u64,
    value: U256,
) -> StateOverrides {
    let relay = network.relay;
    let mut builder = Builder::new(encoding)
        .code(relay, gas_meter::Variant::Generic.code())
        .storage(
            relay,
            commitment.slot(),
            B256::from(U256::from(commitment_timestamp)),
        )
        .flag(
            network.contracts.name_wrapper,
            slots::mapping(&relay, slots::NAME_WRAPPER_CONTROLLERS),
        )
        .flag(
            request.resolver,
            slots::nested_mapping(&request.owner, &relay, slots::RESOLVER_OPERATOR_APPROVALS),
        )
        .balance(request.owner, value + BALANCE_BUFFER);
    if request.reverse_record {
        builder = builder.flag(
            network.contracts.reverse_registrar,
            slots::mapping(&relay, slots::REVERSE_REGISTRAR_CONTROLLERS),
        );
    }
    builder.build()
}

/// Overrides for renewing a single name through the controller, which in
/// turn renews it on the name wrapper.
pub fn renewal(
    encoding: SlotEncoding,
    network: &Network,
    from: Address,
    value: U256,
) -> StateOverrides {
    let relay = network.relay;
    Builder::new(encoding)
        .code(relay, gas_meter::Variant::Generic.code())
        .flag(
            network.contracts.name_wrapper,
            slots::mapping(&relay, slots::NAME_WRAPPER_CONTROLLERS),
        )
        .balance(from, value + BALANCE_BUFFER)
        .build()
}

/// Overrides for renewing multiple names through the bulk renewal contract.
/// Its code runs in the relay's context so the relay needs the controller
/// address in the slot the bulk renewal contract reads it from.
pub fn bulk_renewal(
    encoding: SlotEncoding,
    network: &Network,
    from: Address,
    value: U256,
) -> StateOverrides {
    let relay = network.relay;
    Builder::new(encoding)
        .code(relay, gas_meter::Variant::Renewal.code())
        .storage(
            relay,
            slots::word(slots::BULK_RENEWAL_CONTROLLER),
            network.contracts.registrar_controller.into_word(),
        )
        .balance(from, value + BALANCE_BUFFER)
        .build()
}
