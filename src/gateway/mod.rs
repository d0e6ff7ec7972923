//! Gateway server implementation

mod acceptor;
pub mod auth;
mod router;
mod server;

pub use acceptor::PeerCertAcceptor;
pub use auth::{CertGuard, cert_auth_middleware, deny_response};
pub use router::create_router;
pub use server::Gateway;
