//! Mutual TLS (mTLS) certificate pinning.
//!
//! # Architecture
//!
//! ```text
//! TCP connection
//!   → TLS handshake  (rustls verifies the client chain against the CA)
//!   → TlsPeer built from the peer certificate
//!   → Injected into request extensions
//!   → CertificateAuthorizer decides on protected routes
//! ```
//!
//! # Modules
//!
//! - [`config`] - YAML configuration types (`MtlsConfig`, `AuthorizationConfig`)
//! - [`fingerprint`] - canonical fingerprint encoding (`Fingerprint`)
//! - [`certificate`] - X.509 field extraction (`Certificate`, `TlsPeer`)
//! - [`authorizer`] - the decision procedure (`CertificateAuthorizer`, `Decision`)
//! - [`cert_manager`] - rustls config building and certificate generation CLI helpers
//!
//! # Quick start
//!
//! ```yaml
//! mtls:
//!   server_cert: "ssl/server/server-crt.pem"
//!   server_key:  "ssl/server/server-key.pem"
//!   ca_cert:     "ssl/server/ca-crt.pem"
//!   authorization:
//!     trusted_fingerprints: ["98:D8:24:56:F8:BF:73:5C:BB:89:B9:D9:83:A2:4F:79:01:F9:21:C4:18:DC:DF:A5:82:5E:EB:A1:D9:5C:E3:64"]
//!     required_issuer_cn: "localhost"
//! ```

pub mod authorizer;
pub mod cert_manager;
pub mod certificate;
pub mod config;
pub mod fingerprint;

pub use authorizer::{
    AuthorizerConfig, CertificateAuthorizer, Clock, Decision, DenyReason, FixedClock,
    SystemClock, authorize,
};
pub use cert_manager::{
    CaParams, CertGenerator, GeneratedCert, LeafCertParams, build_tls_config, load_certs,
    load_private_key,
};
pub use certificate::{Certificate, TlsPeer};
pub use config::{AuthorizationConfig, MtlsConfig};
pub use fingerprint::Fingerprint;
