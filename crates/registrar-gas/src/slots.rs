//! Storage slot computation for Solidity mappings [^1].
//!
//! The base slot indices below are properties of the deployed contract
//! versions. A wrong index does not fail loudly, the override just lands in
//! an unused slot and the simulation reverts on the original precondition.
//!
//! [^1]: <https://docs.soliditylang.org/en/latest/internals/layout_in_storage.html#mappings-and-dynamic-arrays>

use alloy::primitives::{Address, B256, U256, keccak256};

/// `ETHRegistrarController.commitments` (`mapping(bytes32 => uint256)`).
pub const COMMITMENTS: u64 = 1;
/// `NameWrapper.controllers` (`mapping(address => bool)`).
pub const NAME_WRAPPER_CONTROLLERS: u64 = 4;
/// `PublicResolver._operatorApprovals`
/// (`mapping(address => mapping(address => bool))`).
pub const RESOLVER_OPERATOR_APPROVALS: u64 = 11;
/// `ReverseRegistrar.controllers` (`mapping(address => bool)`).
pub const REVERSE_REGISTRAR_CONTROLLERS: u64 = 1;
/// `BulkRenewal` storage word holding the registrar controller.
pub const BULK_RENEWAL_CONTROLLER: u64 = 0;

/// Key of a storage mapping entry, left padded to a full word.
pub trait MappingKey {
    fn to_word(&self) -> B256;
}

impl MappingKey for B256 {
    fn to_word(&self) -> B256 {
        *self
    }
}

impl MappingKey for Address {
    fn to_word(&self) -> B256 {
        self.into_word()
    }
}

impl MappingKey for U256 {
    fn to_word(&self) -> B256 {
        B256::from(*self)
    }
}

/// Slot of `mapping[key]` for a mapping declared at `base`.
pub fn mapping(key: &impl MappingKey, base: u64) -> B256 {
    hash_pair(key.to_word(), word(base))
}

/// Slot of `mapping[outer][inner]` for a nested mapping declared at `base`.
pub fn nested_mapping(
    outer: &impl MappingKey,
    inner: &impl MappingKey,
    base: u64,
) -> B256 {
    hash_pair(inner.to_word(), mapping(outer, base))
}

/// Slot of a plain (non-mapping) state variable.
pub fn word(index: u64) -> B256 {
    B256::from(U256::from(index))
}

fn hash_pair(key: B256, base: B256) -> B256 {
    let mut buf = [0; 64];
    buf[..32].copy_from_slice(key.as_slice());
    buf[32..].copy_from_slice(base.as_slice());
    keccak256(buf)
}
