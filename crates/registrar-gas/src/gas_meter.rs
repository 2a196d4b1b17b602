//! Encoding and decoding of calls through the gas meter helper contract.

use {
    alloy::{
        primitives::{Address, Bytes, U256},
        sol_types::SolCall,
    },
    contracts::{GasMeter, RenewalGasMeter},
    thiserror::Error,
};

/// The two deployed variants of the gas meter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    Generic,
    /// Sweeps leftover value back to the caller after measuring.
    Renewal,
}

impl Variant {
    /// Runtime code to install on the relay account.
    pub fn code(self) -> Bytes {
        match self {
            Self::Generic => GasMeter::DEPLOYED_BYTECODE.clone(),
            Self::Renewal => RenewalGasMeter::DEPLOYED_BYTECODE.clone(),
        }
    }
}

/// Encodes a call to the meter that measures running `data` against
/// `target`'s code.
pub fn encode(target: Address, data: Bytes) -> Bytes {
    // Both variants share the ABI.
    GasMeter::measureCall { target, data }.abi_encode().into()
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid gas meter output: {0}")]
    Abi(#[from] alloy::sol_types::Error),
    #[error("measured gas {0} does not fit into 64 bits")]
    Overflow(U256),
}

/// Decodes the measured gas from the meter's return data.
pub fn decode(output: &[u8]) -> Result<u64, DecodeError> {
    let gas_used = GasMeter::measureCall::abi_decode_returns(output)?;
    u64::try_from(gas_used).map_err(|_| DecodeError::Overflow(gas_used))
}
