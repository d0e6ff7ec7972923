//! cert-gate library
//!
//! Mutual-TLS front door that pins client certificates: a request reaches a
//! protected route only if the client presented a CA-validated certificate
//! that is inside its validity window, whose fingerprint is on the
//! allow-list, and whose issuer Common Name is the required one.
//!
//! # Features
//!
//! - **Pure decision core**: [`mtls::authorize`] is a total, side-effect-free
//!   function of handshake outcome, certificate, clock and configuration
//! - **rustls listener**: peer certificates are extracted per connection and
//!   handed to the router as a [`mtls::TlsPeer`] extension
//! - **Operator tooling**: fingerprint printing, offline checks and throwaway
//!   CA / leaf generation from the CLI
//! - **Production Ready**: structured logging, health endpoint, graceful shutdown

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod mtls;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// `RUST_LOG` takes precedence over `level`.  `format` selects `json` output;
/// anything else is human-readable text.
///
/// # Errors
///
/// Returns `Error::Internal` if a global subscriber is already installed.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        Some("json") => subscriber.with(fmt::layer().json()).try_init(),
        _ => subscriber.with(fmt::layer()).try_init(),
    };

    installed.map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {e}")))
}
