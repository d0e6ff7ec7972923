//! TLS acceptor that exposes the client certificate to handlers.
//!
//! Wraps `axum-server`'s rustls acceptor.  Once the handshake completes, the
//! peer chain is read off the session, turned into a [`TlsPeer`] and attached
//! to the connection's service so that every request on that connection
//! carries it as an extension.

use std::io;

use axum_server::accept::{Accept, DefaultAcceptor};
use axum_server::tls_rustls::{RustlsAcceptor, RustlsConfig};
use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::server::TlsStream;
use tower_http::add_extension::AddExtension;
use tracing::debug;

use crate::mtls::TlsPeer;

/// rustls acceptor that injects a [`TlsPeer`] into each connection.
#[derive(Debug, Clone)]
pub struct PeerCertAcceptor {
    inner: RustlsAcceptor<DefaultAcceptor>,
}

impl PeerCertAcceptor {
    /// Create an acceptor over an already-built rustls configuration.
    #[must_use]
    pub fn new(config: RustlsConfig) -> Self {
        Self {
            inner: RustlsAcceptor::new(config),
        }
    }
}

impl<I, S> Accept<I, S> for PeerCertAcceptor
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    S: Send + 'static,
{
    type Stream = TlsStream<I>;
    type Service = AddExtension<S, TlsPeer>;
    type Future = BoxFuture<'static, io::Result<(Self::Stream, Self::Service)>>;

    fn accept(&self, stream: I, service: S) -> Self::Future {
        let acceptor = self.inner.clone();

        Box::pin(async move {
            let (stream, service) = acceptor.accept(stream, service).await?;

            let (_, session) = stream.get_ref();
            let peer = TlsPeer::from_peer_certificates(session.peer_certificates());

            debug!(
                handshake_validated = peer.handshake_validated,
                client = peer
                    .certificate
                    .as_ref()
                    .map_or("<none>", |cert| cert.display_name()),
                "TLS handshake complete"
            );

            Ok((stream, AddExtension::new(service, peer)))
        })
    }
}
