//! Static registry of the networks that estimates can be simulated on.

use {
    alloy::primitives::{Address, address},
    contracts::networks,
};

/// Account that has no code on any supported network. The gas meter gets
/// installed here for the duration of a single simulated call.
pub const RELAY: Address = address!("00000000000000000000000000000000deadbeef");

/// Addresses of the protocol contracts that are touched when registering or
/// renewing a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contracts {
    pub registrar_controller: Address,
    pub bulk_renewal: Address,
    pub name_wrapper: Address,
    pub reverse_registrar: Address,
}

/// A supported chain and its deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Network {
    pub chain_id: u64,
    pub name: &'static str,
    pub contracts: Contracts,
    /// Scratch account that hosts the gas meter during simulations.
    pub relay: Address,
}

pub const MAINNET: Network = Network {
    chain_id: networks::MAINNET,
    name: "mainnet",
    contracts: Contracts {
        registrar_controller: address!("253553366Da8546fC250F225fe3d25d0C782303b"),
        bulk_renewal: address!("a12159e5131b1eEf6B4857EEE3e1954744b5033A"),
        name_wrapper: address!("D4416b13d2b3a9aBae7AcD5D6C2BbDBE25686401"),
        reverse_registrar: address!("a58E81fe9b61B5c3fE2AFD33CF304c454AbFc7Cb"),
    },
    relay: RELAY,
};

pub const GOERLI: Network = Network {
    chain_id: networks::GOERLI,
    name: "goerli",
    contracts: Contracts {
        registrar_controller: address!("Cc5e7dB10E65EED1BBD105359e7268aa660f6734"),
        bulk_renewal: address!("eA64C81d0d718620daBC02D61f3B255C641f475F"),
        name_wrapper: address!("114D4603199df73e7D157787f8778E21fCd13066"),
        reverse_registrar: address!("4f7A657451358a22dc397d5eE7981FfC526cd856"),
    },
    relay: RELAY,
};

pub const SEPOLIA: Network = Network {
    chain_id: networks::SEPOLIA,
    name: "sepolia",
    contracts: Contracts {
        registrar_controller: address!("FED6a969AaA60E4961FCD3EBF1A2e8913ac65B72"),
        bulk_renewal: address!("4EF77b90762Eddb33C8Eba5B5a19558DaE53D7a1"),
        name_wrapper: address!("0635513f179D50A207757E05759CbD106d7dFcE8"),
        reverse_registrar: address!("A0a1AbcDAe1a2a4A2EF8e9113Ff0e02DD81DC0C6"),
    },
    relay: RELAY,
};

pub const SUPPORTED: &[Network] = &[MAINNET, GOERLI, SEPOLIA];

/// Looks up a supported network by its chain ID.
pub fn find(chain_id: u64) -> Option<&'static Network> {
    SUPPORTED.iter().find(|network| network.chain_id == chain_id)
}

/// Whether the chain is a local development chain that is served with fixed
/// estimates.
pub fn is_local(chain_id: u64) -> bool {
    chain_id == networks::LOCAL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_supported_networks() {
        assert_eq!(find(1), Some(&MAINNET));
        assert_eq!(find(11155111).map(|n| n.name), Some("sepolia"));
        assert_eq!(find(3), None);
        assert_eq!(find(1337), None);
        assert!(is_local(1337));
    }

    #[test]
    fn relay_is_not_a_protocol_contract() {
        for network in SUPPORTED {
            let Contracts {
                registrar_controller,
                bulk_renewal,
                name_wrapper,
                reverse_registrar,
            } = network.contracts;
            assert!(
                ![registrar_controller, bulk_renewal, name_wrapper, reverse_registrar]
                    .contains(&network.relay)
            );
        }
    }
}
