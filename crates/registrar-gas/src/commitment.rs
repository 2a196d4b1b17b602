//! Registration commitments.
//!
//! The registrar controller only registers names that were committed to
//! beforehand. Simulations skip the commit transaction by writing the
//! commitment's timestamp straight into storage, which requires computing
//! the commitment exactly like the controller does.

use {
    crate::{request::RegistrationRequest, slots},
    alloy::{
        primitives::{B256, Bytes, U256, b256, keccak256},
        sol_types::{SolCall, SolValue},
    },
    contracts::ETHRegistrarController,
};

/// Fixed secret used for all simulated registrations. Its value does not
/// matter since the commitment never ends up on chain.
pub const SECRET: B256 =
    b256!("a3f29d8e0b1743c6a9b6c213f12d8e6b932b6a7fcb8d0e042c57d1e1ba89f2a8");

/// Everything derived from a registration request that is needed to simulate
/// it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commitment {
    /// The commitment hash as computed by `makeCommitment`.
    pub hash: B256,
    /// Calldata of the `register` call matching the commitment.
    pub register_call: Bytes,
}

impl Commitment {
    pub fn new(request: &RegistrationRequest) -> Self {
        let duration = U256::from(request.duration);
        let hash = keccak256(
            (
                label_hash(&request.label),
                request.owner,
                duration,
                SECRET,
                request.resolver,
                request.data.clone(),
                request.reverse_record,
                request.owner_controlled_fuses,
            )
                .abi_encode_params(),
        );
        let register_call = ETHRegistrarController::registerCall {
            name: request.label.clone(),
            owner: request.owner,
            duration,
            secret: SECRET,
            resolver: request.resolver,
            data: request.data.clone(),
            reverseRecord: request.reverse_record,
            ownerControlledFuses: request.owner_controlled_fuses,
        }
        .abi_encode()
        .into();

        Self {
            hash,
            register_call,
        }
    }

    /// Storage slot of this commitment's timestamp in the controller's
    /// `commitments` mapping.
    pub fn slot(&self) -> B256 {
        slots::mapping(&self.hash, slots::COMMITMENTS)
    }
}

/// Hash of a single name label, e.g. `"nick"` for `nick.eth`.
pub fn label_hash(label: &str) -> B256 {
    keccak256(label.as_bytes())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::primitives::{address, bytes},
    };

    fn request() -> RegistrationRequest {
        RegistrationRequest {
            network_id: 1,
            label: "test".to_owned(),
            owner: address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045"),
            resolver: address!("231b0Ee14048e9dCcD1d247744d114a4EB5E8E63"),
            data: vec![],
            reverse_record: false,
            owner_controlled_fuses: 0,
            duration: 31557600,
            block_number: None,
        }
    }

    #[test]
    fn computes_label_hash() {
        assert_eq!(
            label_hash("test"),
            b256!("9c22ff5f21f0b81b113e63f7db6da94fedef11b2119b4088b89664fb9a3cb658"),
        );
    }

    #[test]
    fn computes_commitment_and_slot() {
        let commitment = Commitment::new(&request());
        assert_eq!(
            commitment.hash,
            b256!("54b871c3e3963317b9c88d11b7b37d0f932ff64536771355e8a33d6a7a7254d9"),
        );
        assert_eq!(
            commitment.slot(),
            b256!("11a5e3e918babffb81afd3f3be95f395e07cbb44938db84f973a83364bc3bd9f"),
        );
    }

    #[test]
    fn commitment_covers_all_parameters() {
        let base = Commitment::new(&request());
        let variations = [
            RegistrationRequest {
                duration: 86400,
                ..request()
            },
            RegistrationRequest {
                reverse_record: true,
                ..request()
            },
            RegistrationRequest {
                owner_controlled_fuses: 1,
                ..request()
            },
            RegistrationRequest {
                data: vec![bytes!("")],
                ..request()
            },
        ];
        for variation in variations {
            assert_ne!(Commitment::new(&variation).hash, base.hash);
        }
    }

    #[test]
    fn register_call_matches_request() {
        let commitment = Commitment::new(&request());
        let call =
            ETHRegistrarController::registerCall::abi_decode(&commitment.register_call).unwrap();
        assert_eq!(call.name, "test");
        assert_eq!(call.secret, SECRET);
        assert_eq!(call.duration, U256::from(31557600));
        assert_eq!(call.resolver, request().resolver);
        assert!(!call.reverseRecord);
    }
}
