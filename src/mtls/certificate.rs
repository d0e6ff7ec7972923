//! Peer certificate extraction.
//!
//! Parses an X.509 DER-encoded certificate and extracts the fields the
//! authorizer looks at: fingerprint, validity window and issuer Common Name.
//!
//! # Missing fields
//!
//! An issuer DN without a CN yields an empty `issuer_common_name`, which no
//! required issuer can equal.  A leaf that does not parse reaches the
//! authorizer as an absent certificate.

use chrono::{DateTime, Utc};
use rustls::pki_types::CertificateDer;
use tracing::debug;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;
use x509_parser::time::ASN1Time;

use crate::mtls::fingerprint::Fingerprint;
use crate::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Certificate
// ─────────────────────────────────────────────────────────────────────────────

/// The fields of a client certificate that authorization depends on.
///
/// Owned by the caller for the duration of one request and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// Hex digest of the DER encoding.  Any spelling is accepted; the
    /// authorizer normalizes it before comparing.
    pub fingerprint: String,

    /// Start of the validity window (`notBefore`).
    pub valid_from: DateTime<Utc>,

    /// End of the validity window (`notAfter`).
    pub valid_to: DateTime<Utc>,

    /// Issuer Common Name.  Empty when the issuer DN carries no CN.
    pub issuer_common_name: String,

    /// Subject Common Name, for logs only.
    pub subject_common_name: Option<String>,
}

impl Certificate {
    /// Parse a DER-encoded certificate and extract the authorization fields.
    ///
    /// # Errors
    ///
    /// Returns `Error::Certificate` if the bytes are not a certificate or
    /// the validity dates are outside the representable range.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| Error::Certificate(format!("Failed to parse certificate: {e}")))?;

        let validity = cert.validity();

        Ok(Self {
            fingerprint: Fingerprint::sha256(der).to_string(),
            valid_from: asn1_to_utc(validity.not_before)?,
            valid_to: asn1_to_utc(validity.not_after)?,
            issuer_common_name: first_common_name(cert.issuer()).unwrap_or_default(),
            subject_common_name: first_common_name(cert.subject()),
        })
    }

    /// Human-readable label for logs.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.subject_common_name.as_deref().unwrap_or("<unknown>")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TLS peer (what the transport hands to the routing layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Per-connection result of the TLS handshake.
///
/// Inserted into every request's extensions by the listener.  The default
/// value (no validated handshake, no certificate) is what a request carries
/// when it did not arrive over the mTLS listener at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsPeer {
    /// Whether the client's chain was validated against the trust anchor.
    pub handshake_validated: bool,

    /// The parsed leaf certificate, if one was presented and parseable.
    pub certificate: Option<Certificate>,
}

impl TlsPeer {
    /// Build from the peer chain exposed by rustls after the handshake.
    ///
    /// rustls only completes a handshake with a presented chain if its client
    /// verifier accepted that chain, so a non-empty chain means validated.
    /// A leaf that cannot be parsed is reported as absent.
    #[must_use]
    pub fn from_peer_certificates(chain: Option<&[CertificateDer<'_>]>) -> Self {
        let Some(leaf) = chain.and_then(<[_]>::first) else {
            return Self::default();
        };

        let certificate = match Certificate::from_der(leaf.as_ref()) {
            Ok(cert) => Some(cert),
            Err(e) => {
                debug!(error = %e, "Peer certificate could not be parsed");
                None
            }
        };

        Self {
            handshake_validated: true,
            certificate,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Extraction helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Extract the first CN attribute from a DN.
fn first_common_name(name: &x509_parser::x509::X509Name<'_>) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_owned)
}

fn asn1_to_utc(time: ASN1Time) -> Result<DateTime<Utc>> {
    let secs = time.timestamp();
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| Error::Certificate(format!("Validity timestamp out of range: {secs}")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
