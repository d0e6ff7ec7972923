//! Gateway server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use tokio::signal;
use tracing::{info, warn};

use super::acceptor::PeerCertAcceptor;
use super::auth::CertGuard;
use super::router::create_router;
use crate::config::Config;
use crate::mtls::{AuthorizerConfig, CertificateAuthorizer, build_tls_config};
use crate::{Error, Result};

/// mTLS gateway server
pub struct Gateway {
    /// Configuration
    config: Config,
    /// Decision core shared by every connection
    authorizer: CertificateAuthorizer,
    /// Listener handle (bound address, graceful shutdown)
    handle: Handle<SocketAddr>,
}

impl Gateway {
    /// Create a new gateway
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the authorization rules are invalid.
    pub fn new(config: Config) -> Result<Self> {
        let authorizer_config = AuthorizerConfig::from_settings(&config.mtls.authorization)?;

        Ok(Self {
            config,
            authorizer: CertificateAuthorizer::new(authorizer_config),
            handle: Handle::new(),
        })
    }

    /// Replace the authorizer (e.g. to inject a fixed clock).
    #[must_use]
    pub fn with_authorizer(mut self, authorizer: CertificateAuthorizer) -> Self {
        self.authorizer = authorizer;
        self
    }

    /// Handle for observing the bound address and triggering shutdown.
    #[must_use]
    pub fn handle(&self) -> Handle<SocketAddr> {
        self.handle.clone()
    }

    /// Run the gateway until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// Returns an error if the host is invalid, the TLS material cannot be
    /// loaded, or the listener cannot be bound.
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let tls_config = build_tls_config(&self.config.mtls)?;
        let acceptor = PeerCertAcceptor::new(RustlsConfig::from_config(Arc::new(tls_config)));

        let guard = Arc::new(CertGuard::new(
            self.authorizer.clone(),
            self.config.mtls.authorization.expose_deny_reason,
        ));
        let app = create_router(guard);

        info!("============================================================");
        info!("CERT GATE v{}", env!("CARGO_PKG_VERSION"));
        info!("============================================================");
        info!(host = %self.config.server.host, port = %self.config.server.port, "Listening (mTLS)");
        info!(
            trusted_fingerprints = self.authorizer.config().trusted_count(),
            required_issuer = %self.authorizer.config().required_issuer(),
            require_client_cert = self.config.mtls.require_client_cert,
            expose_deny_reason = self.config.mtls.authorization.expose_deny_reason,
            "Certificate pinning enabled"
        );
        info!(
            "  GET  https://{}:{}/private  (protected)",
            self.config.server.host, self.config.server.port
        );
        info!(
            "  GET  https://{}:{}/health   (public)",
            self.config.server.host, self.config.server.port
        );
        info!("============================================================");

        tokio::spawn(shutdown_signal(
            self.handle.clone(),
            self.config.server.shutdown_timeout,
        ));

        axum_server::bind(addr)
            .acceptor(acceptor)
            .handle(self.handle)
            .serve(app.into_make_service())
            .await?;

        info!("Listener closed");
        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal(handle: Handle<SocketAddr>, timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!(timeout = ?timeout, "Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(timeout));
}
