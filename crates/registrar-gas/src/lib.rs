pub mod accounting;
pub mod backend;
pub mod commitment;
pub mod endpoints;
pub mod estimator;
pub mod gas_meter;
pub mod network;
pub mod overrides;
pub mod request;
pub mod slots;

pub use {
    endpoints::Endpoints,
    estimator::{Error, Estimator},
    request::{ExtensionRequest, GasEstimate, RegistrationRequest},
};
