//! `qx-http` is an async HTTP client for a quantum computing cloud REST API.
//!
//! Requests are issued through [`QxClient::get`], [`QxClient::post`] and
//! [`QxClient::put`]. Each call returns a [`RequestHandle`] that resolves to
//! exactly one outcome and can be cancelled as a unit, covering the
//! in-flight attempt, any scheduled retry and any pending token refresh.
//!
//! Transient failures are retried with a fixed delay up to a configured
//! budget; a 401 triggers one token refresh and one replay per attempt.

mod cancel;
mod classify;
mod client;
mod config;
mod credentials;
mod error;
mod request;
mod transport;

pub mod qasm;
pub mod sim;

pub use cancel::CancelHandle;
pub use client::{QxClient, RequestHandle};
pub use config::ClientConfig;
pub use error::QxError;

pub type Result<T> = std::result::Result<T, QxError>;
