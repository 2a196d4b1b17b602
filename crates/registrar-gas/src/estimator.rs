//! Gas estimation for registrations and renewals.

use {
    crate::{
        accounting,
        backend::{Backend, CallRequest},
        commitment::Commitment,
        endpoints::Endpoints,
        gas_meter,
        network::{self, Network},
        overrides,
        request::{ExtensionRequest, GasEstimate, RegistrationRequest},
    },
    alloy::{
        primitives::{Address, Bytes, U256},
        rpc::types::BlockNumberOrTag,
        sol_types::SolCall,
    },
    anyhow::Context,
    contracts::{BulkRenewal, ETHRegistrarController},
    std::{collections::HashMap, sync::Arc},
    thiserror::Error,
    tracing::instrument,
};

/// How long before the simulated block the commitment is pretended to have
/// been made. Has to exceed the controller's minimum commitment age.
pub const COMMITMENT_AGE: u64 = 1000;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported network")]
    UnsupportedNetwork(u64),
    #[error("Bad request, {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

/// Current unix time in seconds.
pub type Clock = fn() -> u64;

fn system_clock() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

pub struct Estimator {
    endpoints: HashMap<u64, Endpoints>,
    clock: Clock,
}

impl Estimator {
    pub fn new(endpoints: HashMap<u64, Endpoints>) -> Self {
        Self::with_clock(endpoints, system_clock)
    }

    pub fn with_clock(endpoints: HashMap<u64, Endpoints>, clock: Clock) -> Self {
        Self { endpoints, clock }
    }

    /// Estimates the gas of a `register` transaction.
    #[instrument(skip_all, fields(network = request.network_id, label = %request.label))]
    pub async fn registration(&self, request: &RegistrationRequest) -> Result<GasEstimate, Error> {
        if network::is_local(request.network_id) {
            let gas = accounting::local::registration(request.data.len(), request.reverse_record);
            return Ok(GasEstimate::success(gas));
        }
        let (network, endpoints) = self.network(request.network_id)?;
        if request.label.is_empty() {
            return Err(Error::InvalidRequest("empty label".to_owned()));
        }

        let commitment = Commitment::new(request);
        let block = block(request.block_number);
        let estimate = endpoints
            .first_success(|backend| {
                self.simulate_registration(backend, network, request, &commitment, block)
            })
            .await?;
        Ok(estimate)
    }

    /// Estimates the gas of a `renew` transaction, or of a `renewAll`
    /// transaction through the bulk renewal contract for multiple labels.
    #[instrument(skip_all, fields(network = request.network_id, labels = request.labels.len()))]
    pub async fn extension(&self, request: &ExtensionRequest) -> Result<GasEstimate, Error> {
        if network::is_local(request.network_id) {
            return Ok(GasEstimate::success(accounting::local::extension(
                request.labels.len(),
            )));
        }
        let (network, endpoints) = self.network(request.network_id)?;
        if request.labels.is_empty() {
            return Err(Error::InvalidRequest("no labels".to_owned()));
        }

        let block = block(request.block_number);
        let estimate = endpoints
            .first_success(|backend| self.simulate_extension(backend, network, request, block))
            .await?;
        Ok(estimate)
    }

    fn network(&self, chain_id: u64) -> Result<(&'static Network, &Endpoints), Error> {
        let network = network::find(chain_id).ok_or(Error::UnsupportedNetwork(chain_id))?;
        let endpoints = self
            .endpoints
            .get(&chain_id)
            .filter(|endpoints| !endpoints.is_empty())
            .ok_or(Error::UnsupportedNetwork(chain_id))?;
        Ok((network, endpoints))
    }

    async fn simulate_registration(
        &self,
        backend: &Arc<dyn Backend>,
        network: &Network,
        request: &RegistrationRequest,
        commitment: &Commitment,
        block: BlockNumberOrTag,
    ) -> anyhow::Result<GasEstimate> {
        let price = ETHRegistrarController::rentPriceCall::abi_decode_returns(
            &read(
                backend.as_ref(),
                network.contracts.registrar_controller,
                ETHRegistrarController::rentPriceCall {
                    name: request.label.clone(),
                    duration: U256::from(request.duration),
                },
                block,
            )
            .await?,
        )
        .context("invalid rent price")?;
        let value = price.base + price.premium * U256::from(2);

        let now = match block.as_number() {
            Some(number) => backend.block_timestamp(number).await?,
            None => (self.clock)(),
        };
        let overrides = overrides::registration(
            backend.slot_encoding(),
            network,
            request,
            commitment,
            now.saturating_sub(COMMITMENT_AGE),
            value,
        );

        let measured = measure(
            backend,
            network,
            CallRequest {
                from: request.owner,
                to: network.relay,
                input: gas_meter::encode(
                    network.contracts.registrar_controller,
                    commitment.register_call.clone(),
                ),
                value,
            },
            block,
            overrides,
        )
        .await?;
        Ok(GasEstimate::success(accounting::registration(
            measured,
            &commitment.register_call,
        )))
    }

    async fn simulate_extension(
        &self,
        backend: &Arc<dyn Backend>,
        network: &Network,
        request: &ExtensionRequest,
        block: BlockNumberOrTag,
    ) -> anyhow::Result<GasEstimate> {
        let duration = U256::from(request.duration);
        let (target, data, value, overrides) = if request.is_bulk() {
            let total = BulkRenewal::rentPriceCall::abi_decode_returns(
                &read(
                    backend.as_ref(),
                    network.contracts.bulk_renewal,
                    BulkRenewal::rentPriceCall {
                        names: request.labels.clone(),
                        duration,
                    },
                    block,
                )
                .await?,
            )
            .context("invalid bulk rent price")?;
            let value = total * U256::from(2);
            let call = BulkRenewal::renewAllCall {
                names: request.labels.clone(),
                duration,
            };
            (
                network.contracts.bulk_renewal,
                call.abi_encode(),
                value,
                overrides::bulk_renewal(backend.slot_encoding(), network, request.from, value),
            )
        } else {
            let label = request.labels[0].clone();
            let price = ETHRegistrarController::rentPriceCall::abi_decode_returns(
                &read(
                    backend.as_ref(),
                    network.contracts.registrar_controller,
                    ETHRegistrarController::rentPriceCall {
                        name: label.clone(),
                        duration,
                    },
                    block,
                )
                .await?,
            )
            .context("invalid rent price")?;
            let value = price.base + price.premium * U256::from(2);
            let call = ETHRegistrarController::renewCall {
                name: label,
                duration,
            };
            (
                network.contracts.registrar_controller,
                call.abi_encode(),
                value,
                overrides::renewal(backend.slot_encoding(), network, request.from, value),
            )
        };

        let measured = measure(
            backend,
            network,
            CallRequest {
                from: request.from,
                to: network.relay,
                input: gas_meter::encode(target, data.into()),
                value,
            },
            block,
            overrides,
        )
        .await?;
        Ok(GasEstimate::success(accounting::renewal(measured)))
    }
}

/// Block to simulate on. Block 0 means "latest", like an absent number.
fn block(number: Option<u64>) -> BlockNumberOrTag {
    number
        .filter(|number| *number != 0)
        .map_or(BlockNumberOrTag::Latest, BlockNumberOrTag::Number)
}

async fn read(
    backend: &dyn Backend,
    to: Address,
    call: impl SolCall,
    block: BlockNumberOrTag,
) -> anyhow::Result<Bytes> {
    backend.read(to, call.abi_encode().into(), block).await
}

/// Simulates `call` through the gas meter and returns the gas measured for
/// the inner call.
async fn measure(
    backend: &Arc<dyn Backend>,
    network: &Network,
    call: CallRequest,
    block: BlockNumberOrTag,
    overrides: overrides::StateOverrides,
) -> anyhow::Result<u64> {
    let simulation = backend.simulate(call, block, overrides).await?;
    let measured = gas_meter::decode(&simulation.output)?;
    tracing::debug!(
        backend = %backend.name(),
        network = network.name,
        measured,
        transaction_gas = ?simulation.gas_used,
        "simulated"
    );
    Ok(measured)
}
