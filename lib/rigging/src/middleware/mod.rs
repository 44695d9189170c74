//! Tower middleware for the [`HyperClient`](crate::HyperClient) transport.
//!
//! Layers wrap the transport service and see every request after the
//! interceptors and transformers ran. Add them with
//! [`HyperClientBuilder::layer`](crate::HyperClientBuilder::layer); the first
//! layer added is the outermost one.

mod logging;

pub use logging::{Logging, LoggingLayer};
