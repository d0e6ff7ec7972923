//! Certificate authorization decision.
//!
//! Decides whether a request bearing a given peer certificate may reach a
//! protected route.  The decision is a pure function of the handshake
//! outcome, the certificate, the evaluation time and an immutable
//! [`AuthorizerConfig`]; it performs no I/O and never fails.
//!
//! # Evaluation order
//!
//! Checks run in this order and stop at the first failure:
//!
//! | # | Check | Denial |
//! |---|-------|--------|
//! | 1 | handshake validated and certificate present | [`DenyReason::NoClientCertificate`] |
//! | 2 | `valid_from <= now <= valid_to` | [`DenyReason::ExpiredOrNotYetValid`] |
//! | 3 | fingerprint is in the trusted set (exact, normalized) | [`DenyReason::FingerprintNotTrusted`] |
//! | 4 | issuer CN equals the required CN (case-insensitive) | [`DenyReason::IssuerMismatch`] |
//!
//! If all pass the result is [`Decision::Allow`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::mtls::certificate::Certificate;
use crate::mtls::config::AuthorizationConfig;
use crate::mtls::fingerprint::Fingerprint;
use crate::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Decision
// ─────────────────────────────────────────────────────────────────────────────

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The handshake was not validated or no certificate was presented.
    NoClientCertificate,
    /// The evaluation time falls outside the certificate's validity window.
    ExpiredOrNotYetValid,
    /// The certificate fingerprint is not on the allow-list.
    FingerprintNotTrusted,
    /// The issuer Common Name is not the required one.
    IssuerMismatch,
}

impl DenyReason {
    /// Stable machine-readable code, used as a log field.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::NoClientCertificate => "no_client_certificate",
            Self::ExpiredOrNotYetValid => "expired_or_not_yet_valid",
            Self::FingerprintNotTrusted => "fingerprint_not_trusted",
            Self::IssuerMismatch => "issuer_mismatch",
        }
    }

    /// Reason-specific message for clients.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::NoClientCertificate => "SSL certificate is required",
            Self::ExpiredOrNotYetValid => "Expired certificate",
            Self::FingerprintNotTrusted => "Fingerprint mismatch",
            Self::IssuerMismatch => "Invalid issuer",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of authorizing one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// The request may proceed to the protected handler.
    Allow,
    /// The request is rejected for the given reason.
    Deny(DenyReason),
}

impl Decision {
    /// Returns `true` for [`Decision::Allow`].
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// The denial reason, if any.
    #[must_use]
    pub fn deny_reason(self) -> Option<DenyReason> {
        match self {
            Self::Allow => None,
            Self::Deny(reason) => Some(reason),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clock
// ─────────────────────────────────────────────────────────────────────────────

/// Time source for authorization decisions.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant, for deterministic tests and offline checks.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable authorization settings, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AuthorizerConfig {
    /// Canonical fingerprints.  Empty means every request is denied.
    trusted_fingerprints: BTreeSet<Fingerprint>,
    /// Required issuer CN, already lower-cased.
    required_issuer: String,
    clock: Arc<dyn Clock>,
}

impl AuthorizerConfig {
    /// Build a config from raw allow-list entries and the required issuer.
    ///
    /// Entries are SHA-256 digests in any spelling accepted by
    /// [`Fingerprint::parse_sha256`]; duplicates collapse.  The clock defaults to [`SystemClock`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if an entry is not a 32-byte SHA-256
    /// fingerprint or the required issuer is blank.
    pub fn new<I, S>(trusted_fingerprints: I, required_issuer: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let trusted_fingerprints = trusted_fingerprints
            .into_iter()
            .map(|fp| Fingerprint::parse_sha256(fp.as_ref()))
            .collect::<Result<BTreeSet<_>>>()?;

        if required_issuer.trim().is_empty() {
            return Err(Error::Config(
                "required_issuer_cn must not be empty".to_string(),
            ));
        }

        if trusted_fingerprints.is_empty() {
            warn!("No trusted fingerprints configured: every protected request will be denied");
        }

        Ok(Self {
            trusted_fingerprints,
            required_issuer: required_issuer.to_lowercase(),
            clock: Arc::new(SystemClock),
        })
    }

    /// Build from the `mtls.authorization` configuration block.
    ///
    /// # Errors
    ///
    /// See [`AuthorizerConfig::new`].
    pub fn from_settings(settings: &AuthorizationConfig) -> Result<Self> {
        Self::new(&settings.trusted_fingerprints, &settings.required_issuer_cn)
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the configured clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Number of distinct trusted fingerprints.
    #[must_use]
    pub fn trusted_count(&self) -> usize {
        self.trusted_fingerprints.len()
    }

    /// The required issuer CN (lower-cased).
    #[must_use]
    pub fn required_issuer(&self) -> &str {
        &self.required_issuer
    }

    /// Exact membership test on the normalized value.
    ///
    /// Every entry is compared in constant time and the results are folded
    /// without short-circuiting.
    fn is_trusted(&self, fingerprint: &str) -> bool {
        let normalized = Fingerprint::normalize(fingerprint);
        self.trusted_fingerprints
            .iter()
            .fold(false, |found, trusted| found | trusted.ct_matches(&normalized))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision procedure
// ─────────────────────────────────────────────────────────────────────────────

/// Decide whether a request may proceed.
///
/// `cert` is `None` when the client presented no certificate or the
/// transport could not parse it.
#[must_use]
pub fn authorize(
    handshake_validated: bool,
    cert: Option<&Certificate>,
    now: DateTime<Utc>,
    config: &AuthorizerConfig,
) -> Decision {
    let Some(cert) = cert.filter(|_| handshake_validated) else {
        return Decision::Deny(DenyReason::NoClientCertificate);
    };

    if now < cert.valid_from || now > cert.valid_to {
        return Decision::Deny(DenyReason::ExpiredOrNotYetValid);
    }

    if !config.is_trusted(&cert.fingerprint) {
        return Decision::Deny(DenyReason::FingerprintNotTrusted);
    }

    if cert.issuer_common_name.to_lowercase() != config.required_issuer {
        return Decision::Deny(DenyReason::IssuerMismatch);
    }

    Decision::Allow
}

/// Shared handle around an [`AuthorizerConfig`].
///
/// Cheap to clone; safe to call from any number of tasks at once.
#[derive(Debug, Clone)]
pub struct CertificateAuthorizer {
    config: Arc<AuthorizerConfig>,
}

impl CertificateAuthorizer {
    /// Wrap a configuration snapshot.
    #[must_use]
    pub fn new(config: AuthorizerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Decide at an explicit evaluation time.
    #[must_use]
    pub fn authorize(
        &self,
        handshake_validated: bool,
        cert: Option<&Certificate>,
        now: DateTime<Utc>,
    ) -> Decision {
        authorize(handshake_validated, cert, now, &self.config)
    }

    /// Decide at the configured clock's current time.
    #[must_use]
    pub fn authorize_now(&self, handshake_validated: bool, cert: Option<&Certificate>) -> Decision {
        self.authorize(handshake_validated, cert, self.config.now())
    }

    /// The configuration snapshot.
    #[must_use]
    pub fn config(&self) -> &AuthorizerConfig {
        &self.config
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
