//! mTLS configuration types.
//!
//! Defines the YAML-deserialisable configuration for mutual TLS: server
//! certificate paths, the CA trust anchor for client chains, and the
//! certificate pinning rules applied on protected routes.
//!
//! # Example YAML
//!
//! ```yaml
//! mtls:
//!   server_cert: "ssl/server/server-crt.pem"
//!   server_key:  "ssl/server/server-key.pem"
//!   ca_cert:     "ssl/server/ca-crt.pem"
//!   require_client_cert: true
//!   authorization:
//!     trusted_fingerprints:
//!       - "98:D8:24:56:F8:BF:73:5C:BB:89:B9:D9:83:A2:4F:79:01:F9:21:C4:18:DC:DF:A5:82:5E:EB:A1:D9:5C:E3:64"
//!     required_issuer_cn: "localhost"
//!     expose_deny_reason: true
//! ```

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level mTLS config
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level mTLS configuration block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MtlsConfig {
    /// Path to the PEM-encoded server certificate chain.
    pub server_cert: String,

    /// Path to the PEM-encoded server private key.
    pub server_key: String,

    /// Path to the PEM-encoded CA certificate(s) used to verify client certs.
    pub ca_cert: String,

    /// When `true` (default), clients that do not present a certificate
    /// signed by `ca_cert` are rejected at the TLS handshake.
    ///
    /// When `false`, clients may connect without a certificate.  Such
    /// requests reach protected routes as unvalidated and are denied there;
    /// public routes still answer.  A certificate that *is* presented must
    /// still chain to `ca_cert`.
    pub require_client_cert: bool,

    /// Certificate pinning rules for protected routes.
    pub authorization: AuthorizationConfig,
}

impl Default for MtlsConfig {
    fn default() -> Self {
        Self {
            server_cert: "ssl/server/server-crt.pem".to_string(),
            server_key: "ssl/server/server-key.pem".to_string(),
            ca_cert: "ssl/server/ca-crt.pem".to_string(),
            require_client_cert: true,
            authorization: AuthorizationConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization rules
// ─────────────────────────────────────────────────────────────────────────────

/// Certificate pinning rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Allow-list of leaf certificate SHA-256 fingerprints.
    ///
    /// Bare or colon-delimited hex, any case.  Empty denies every request.
    pub trusted_fingerprints: Vec<String>,

    /// Issuer Common Name every client certificate must carry
    /// (case-insensitive).
    pub required_issuer_cn: String,

    /// When `true`, denial responses name the failed check
    /// (e.g. `"Fingerprint mismatch"`).  When `false`, every denial reads
    /// `"Unauthorized"` so clients learn nothing about the allow-list.
    pub expose_deny_reason: bool,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            trusted_fingerprints: Vec::new(),
            required_issuer_cn: "localhost".to_string(),
            expose_deny_reason: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
