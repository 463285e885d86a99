//! Batch configuration and driver for morphocrate
//!
//! The `morpho` binary is a thin layer over this library: it turns command
//! line flags into a [`BatchConfig`] and hands it to [`run_batch`].

pub mod config;
pub mod driver;

pub use config::{BatchConfig, MAX_PRECISION};
pub use driver::run_batch;
