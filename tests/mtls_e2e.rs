//! End-to-end: a real rustls client against a running gateway.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{ClientConfig, RootCertStore};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use cert_gate::config::Config;
use cert_gate::gateway::Gateway;
use cert_gate::mtls::{CaParams, CertGenerator, Fingerprint, GeneratedCert, LeafCertParams};

// ── fixture ──────────────────────────────────────────────────────────────────

struct Pki {
    _dir: tempfile::TempDir,
    ca: GeneratedCert,
    trusted_client: GeneratedCert,
    untrusted_client: GeneratedCert,
    config: Config,
}

fn leaf(ca: &GeneratedCert, cn: &str, san_dns: &[&str]) -> GeneratedCert {
    let params = LeafCertParams {
        cn,
        ou: None,
        san_dns: san_dns.iter().map(|s| (*s).to_string()).collect(),
        validity_days: 30,
    };
    CertGenerator::issue_leaf(&params, &ca.cert_pem, &ca.key_pem).unwrap()
}

fn path_string(dir: &Path, file: &str) -> String {
    dir.join(file).to_string_lossy().into_owned()
}

/// CA "localhost", a server leaf and two client leaves; only the first
/// client is pinned.
fn pki(require_client_cert: bool) -> Pki {
    let dir = tempfile::tempdir().unwrap();
    let ca = CertGenerator::init_ca(&CaParams {
        cn: "localhost",
        validity_days: 30,
    })
    .unwrap();
    let server = leaf(&ca, "gate-server", &["localhost"]);
    let trusted_client = leaf(&ca, "client-trusted", &[]);
    let untrusted_client = leaf(&ca, "client-untrusted", &[]);

    CertGenerator::write_to_dir(&ca, dir.path(), "ca").unwrap();
    CertGenerator::write_to_dir(&server, dir.path(), "server").unwrap();

    let trusted_der = CertificateDer::from_pem_slice(trusted_client.cert_pem.as_bytes()).unwrap();

    let mut config = Config::default();
    config.server.port = 0;
    config.server.shutdown_timeout = Duration::from_secs(1);
    config.mtls.server_cert = path_string(dir.path(), "server-crt.pem");
    config.mtls.server_key = path_string(dir.path(), "server-key.pem");
    config.mtls.ca_cert = path_string(dir.path(), "ca-crt.pem");
    config.mtls.require_client_cert = require_client_cert;
    config.mtls.authorization.trusted_fingerprints =
        vec![Fingerprint::sha256(trusted_der.as_ref()).to_colon_hex()];

    Pki {
        _dir: dir,
        ca,
        trusted_client,
        untrusted_client,
        config,
    }
}

async fn start(config: Config) -> (SocketAddr, axum_server::Handle<SocketAddr>) {
    let gateway = Gateway::new(config).unwrap();
    let handle = gateway.handle();
    tokio::spawn(async move {
        gateway.run().await.unwrap();
    });
    let addr = handle.listening().await.expect("gateway failed to bind");
    (addr, handle)
}

fn client_config(ca: &GeneratedCert, client: Option<&GeneratedCert>) -> ClientConfig {
    let mut roots = RootCertStore::empty();
    roots
        .add(CertificateDer::from_pem_slice(ca.cert_pem.as_bytes()).unwrap())
        .unwrap();

    let builder = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::aws_lc_rs::default_provider(),
    ))
    .with_protocol_versions(&[&rustls::version::TLS13])
    .unwrap()
    .with_root_certificates(roots);

    match client {
        Some(client) => {
            let chain = vec![CertificateDer::from_pem_slice(client.cert_pem.as_bytes()).unwrap()];
            let key = PrivateKeyDer::from_pem_slice(client.key_pem.as_bytes()).unwrap();
            builder.with_client_auth_cert(chain, key).unwrap()
        }
        None => builder.with_no_client_auth(),
    }
}

/// Send `GET path` over HTTP/1.1 and return (status, body).
async fn get(addr: SocketAddr, config: ClientConfig, path: &str) -> (u16, serde_json::Value) {
    let connector = TlsConnector::from(Arc::new(config));
    let tcp = TcpStream::connect(addr).await.unwrap();
    let server_name = ServerName::try_from("localhost").unwrap();
    let mut tls = connector.connect(server_name, tcp).await.unwrap();

    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    tls.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    if let Err(e) = tls.read_to_end(&mut raw).await {
        // Peers may close without close_notify once the response is sent
        assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof, "read failed: {e}");
    }

    let text = String::from_utf8(raw).unwrap();
    let (head, body) = text.split_once("\r\n\r\n").expect("malformed response");
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("missing status code");
    (status, serde_json::from_str(body.trim()).unwrap())
}

// ── tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn pinned_client_certificate_is_admitted() {
    // GIVEN: a running gateway pinning the trusted client
    let pki = pki(true);
    let (addr, handle) = start(pki.config.clone()).await;

    // WHEN: the trusted client calls /private
    let config = client_config(&pki.ca, Some(&pki.trusted_client));
    let (status, body) = get(addr, config, "/private").await;

    // THEN: welcome
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Welcome to private section");

    handle.graceful_shutdown(Some(Duration::from_secs(1)));
}

#[tokio::test]
async fn ca_signed_but_unpinned_certificate_is_rejected() {
    // GIVEN: a client whose cert chains to the CA but is not on the allow-list
    let pki = pki(true);
    let (addr, handle) = start(pki.config.clone()).await;

    // WHEN: it calls /private
    let config = client_config(&pki.ca, Some(&pki.untrusted_client));
    let (status, body) = get(addr, config, "/private").await;

    // THEN: the handshake succeeds but authorization fails
    assert_eq!(status, 401);
    assert_eq!(body["message"], "Fingerprint mismatch");

    handle.graceful_shutdown(Some(Duration::from_secs(1)));
}

#[tokio::test]
async fn optional_client_auth_reports_missing_certificate() {
    // GIVEN: client certificates optional at the TLS layer
    let pki = pki(false);
    let (addr, handle) = start(pki.config.clone()).await;

    // WHEN: a client without a certificate connects
    let (health, _) = get(addr, client_config(&pki.ca, None), "/health").await;
    let (status, body) = get(addr, client_config(&pki.ca, None), "/private").await;

    // THEN: public route works, protected route demands a certificate
    assert_eq!(health, 200);
    assert_eq!(status, 401);
    assert_eq!(body["message"], "SSL certificate is required");

    handle.graceful_shutdown(Some(Duration::from_secs(1)));
}
