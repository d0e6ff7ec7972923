//! Property tests for the authorization decision.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use cert_gate::mtls::{AuthorizerConfig, Certificate, Decision, DenyReason, Fingerprint, authorize};

const TRUSTED_BYTES: [u8; 32] = [
    0x98, 0xd8, 0x24, 0x56, 0xf8, 0xbf, 0x73, 0x5c, 0xbb, 0x89, 0xb9, 0xd9, 0x83, 0xa2, 0x4f, 0x79,
    0x01, 0xf9, 0x21, 0xc4, 0x18, 0xdc, 0xdf, 0xa5, 0x82, 0x5e, 0xeb, 0xa1, 0xd9, 0x5c, 0xe3, 0x64,
];

fn trusted_hex() -> String {
    hex::encode(TRUSTED_BYTES)
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

fn config() -> AuthorizerConfig {
    AuthorizerConfig::new([trusted_hex()], "localhost").unwrap()
}

/// Render `bytes` the way `openssl x509 -fingerprint` does.
fn colon_upper(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

// Certificate fields are drawn independently of each other.
prop_compose! {
    fn arb_certificate()(
        trusted in any::<bool>(),
        other in proptest::collection::vec(any::<u8>(), 1..32),
        from_offset in -1_000i64..1_000,
        len in 0i64..2_000,
        issuer in prop_oneof![
            Just("localhost".to_string()),
            Just("LOCALHOST".to_string()),
            "[a-zA-Z0-9 .-]{0,16}",
        ],
    ) -> Certificate {
        let valid_from = epoch() + Duration::seconds(from_offset);
        Certificate {
            fingerprint: if trusted { colon_upper(&TRUSTED_BYTES) } else { hex::encode(other) },
            valid_from,
            valid_to: valid_from + Duration::seconds(len),
            issuer_common_name: issuer,
            subject_common_name: None,
        }
    }
}

proptest! {
    /// Every input yields exactly one decision, and it agrees with the
    /// first failing check in evaluation order.
    #[test]
    fn decision_follows_evaluation_order(
        validated in any::<bool>(),
        present in any::<bool>(),
        cert in arb_certificate(),
        now_offset in -3_000i64..3_000,
    ) {
        let cfg = config();
        let now = epoch() + Duration::seconds(now_offset);
        let decision = authorize(validated, present.then_some(&cert), now, &cfg);

        let expected = if !(validated && present) {
            Decision::Deny(DenyReason::NoClientCertificate)
        } else if now < cert.valid_from || now > cert.valid_to {
            Decision::Deny(DenyReason::ExpiredOrNotYetValid)
        } else if Fingerprint::normalize(&cert.fingerprint) != trusted_hex() {
            Decision::Deny(DenyReason::FingerprintNotTrusted)
        } else if !cert.issuer_common_name.eq_ignore_ascii_case("localhost") {
            Decision::Deny(DenyReason::IssuerMismatch)
        } else {
            Decision::Allow
        };

        prop_assert_eq!(decision, expected);
    }

    /// Both window endpoints are inside the window.
    #[test]
    fn window_is_inclusive_at_both_ends(len in 0i64..10_000, at_end in any::<bool>()) {
        let valid_from = epoch();
        let valid_to = valid_from + Duration::seconds(len);
        let cert = Certificate {
            fingerprint: trusted_hex(),
            valid_from,
            valid_to,
            issuer_common_name: "localhost".to_string(),
            subject_common_name: None,
        };
        let now = if at_end { valid_to } else { valid_from };

        prop_assert_eq!(authorize(true, Some(&cert), now, &config()), Decision::Allow);
    }

    /// Any digest rendered as colon-delimited uppercase normalizes to its
    /// bare lowercase hex, and parses to the same fingerprint.
    #[test]
    fn colon_uppercase_normalizes_to_bare_lowercase(
        bytes in proptest::collection::vec(any::<u8>(), 1..64),
    ) {
        let colon = colon_upper(&bytes);
        let bare = hex::encode(&bytes);

        prop_assert_eq!(Fingerprint::normalize(&colon), bare.clone());
        prop_assert_eq!(
            Fingerprint::parse(&colon).unwrap(),
            Fingerprint::parse(&bare).unwrap()
        );
    }

    /// Only 32-byte digests are accepted as allow-list entries.
    #[test]
    fn allow_list_accepts_only_sha256_lengths(
        bytes in proptest::collection::vec(any::<u8>(), 1..64),
    ) {
        let result = AuthorizerConfig::new([colon_upper(&bytes)], "localhost");
        prop_assert_eq!(result.is_ok(), bytes.len() == 32);
    }

    /// Proper prefixes of a trusted fingerprint are never trusted.
    #[test]
    fn prefix_of_trusted_fingerprint_is_denied(cut in 0usize..64) {
        let hex = trusted_hex();
        let cert = Certificate {
            fingerprint: hex[..cut].to_string(),
            valid_from: epoch(),
            valid_to: epoch() + Duration::days(1),
            issuer_common_name: "localhost".to_string(),
            subject_common_name: None,
        };

        prop_assert_eq!(
            authorize(true, Some(&cert), epoch(), &config()),
            Decision::Deny(DenyReason::FingerprintNotTrusted)
        );
    }
}
