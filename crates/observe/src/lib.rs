//! Initialization of logging for the binaries and helpers to set it up in
//! tests.
pub mod config;
pub mod tracing;

pub use config::Config;
