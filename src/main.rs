//! cert-gate - mutual TLS gateway with client certificate pinning

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use rustls::pki_types::CertificateDer;
use rustls::pki_types::pem::PemObject;
use tracing::{error, info};

use cert_gate::{
    cli::{Cli, Command, TlsCommand},
    config::Config,
    gateway::Gateway,
    mtls::{
        AuthorizerConfig, CaParams, CertGenerator, Certificate, CertificateAuthorizer, Decision,
        Fingerprint, LeafCertParams, load_certs,
    },
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    // Handle subcommands
    match cli.command {
        Some(Command::Fingerprint { ref cert }) => run_fingerprint(cert),
        Some(Command::Check { ref cert }) => run_check(&cli, cert),
        Some(Command::Tls(ref tls_cmd)) => run_tls_command(tls_cmd),
        Some(Command::Serve) | None => run_server(cli).await,
    }
}

/// Print fingerprints of every certificate in a PEM file
fn run_fingerprint(path: &Path) -> ExitCode {
    let certs = match load_certs(&path.to_string_lossy()) {
        Ok(certs) => certs,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    for der in &certs {
        let fingerprint = Fingerprint::sha256(der.as_ref());
        let name = Certificate::from_der(der.as_ref())
            .ok()
            .and_then(|c| c.subject_common_name)
            .unwrap_or_else(|| "<unknown>".to_string());

        println!("📜 {name}");
        println!("   SHA-256: {fingerprint}");
        println!("   Colon:   {}", fingerprint.to_colon_hex());
    }

    ExitCode::SUCCESS
}

/// Offline authorization check for a client certificate
fn run_check(cli: &Cli, path: &Path) -> ExitCode {
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let authorizer = match AuthorizerConfig::from_settings(&config.mtls.authorization) {
        Ok(cfg) => CertificateAuthorizer::new(cfg),
        Err(e) => {
            eprintln!("❌ Invalid authorization settings: {e}");
            return ExitCode::FAILURE;
        }
    };

    let pem = match fs::read(path) {
        Ok(pem) => pem,
        Err(e) => {
            eprintln!("❌ Cannot read '{}': {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    // A file without a parseable leaf is judged as "no certificate"
    let cert = CertificateDer::from_pem_slice(&pem)
        .ok()
        .and_then(|der| Certificate::from_der(der.as_ref()).ok());

    // The chain is assumed to have passed the TLS layer
    match authorizer.authorize_now(cert.is_some(), cert.as_ref()) {
        Decision::Allow => {
            let name = cert.as_ref().map_or("<unknown>", Certificate::display_name);
            println!("✅ {name} - allowed");
            ExitCode::SUCCESS
        }
        Decision::Deny(reason) => {
            println!("❌ denied: {} ({reason})", reason.message());
            ExitCode::FAILURE
        }
    }
}

/// Run certificate generation commands
fn run_tls_command(cmd: &TlsCommand) -> ExitCode {
    match cmd {
        TlsCommand::InitCa {
            cn,
            days,
            out_dir,
            stem,
        } => {
            let params = CaParams {
                cn,
                validity_days: *days,
            };
            let result = CertGenerator::init_ca(&params)
                .and_then(|ca| CertGenerator::write_to_dir(&ca, out_dir, stem));

            match result {
                Ok(()) => {
                    println!("✅ CA '{cn}' written to {}/{stem}-crt.pem", out_dir.display());
                    println!("   Key: {}/{stem}-key.pem (keep it private)", out_dir.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("❌ Failed to create CA: {e}");
                    ExitCode::FAILURE
                }
            }
        }

        TlsCommand::Issue {
            cn,
            ou,
            san_dns,
            days,
            ca_cert,
            ca_key,
            out_dir,
            stem,
        } => {
            let (ca_cert_pem, ca_key_pem) =
                match (fs::read_to_string(ca_cert), fs::read_to_string(ca_key)) {
                    (Ok(cert), Ok(key)) => (cert, key),
                    (Err(e), _) | (_, Err(e)) => {
                        eprintln!("❌ Cannot read CA material: {e}");
                        return ExitCode::FAILURE;
                    }
                };

            let params = LeafCertParams {
                cn,
                ou: ou.as_deref(),
                san_dns: san_dns.clone(),
                validity_days: *days,
            };

            let issued = match CertGenerator::issue_leaf(&params, &ca_cert_pem, &ca_key_pem) {
                Ok(issued) => issued,
                Err(e) => {
                    eprintln!("❌ Failed to issue certificate: {e}");
                    return ExitCode::FAILURE;
                }
            };

            if let Err(e) = CertGenerator::write_to_dir(&issued, out_dir, stem) {
                eprintln!("❌ {e}");
                return ExitCode::FAILURE;
            }

            println!("✅ '{cn}' written to {}/{stem}-crt.pem", out_dir.display());
            if let Ok(der) = CertificateDer::from_pem_slice(issued.cert_pem.as_bytes()) {
                println!("   SHA-256: {}", Fingerprint::sha256(der.as_ref()));
            }
            ExitCode::SUCCESS
        }
    }
}

/// Run the gateway server
async fn run_server(cli: Cli) -> ExitCode {
    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(mut config) => {
            // Apply CLI overrides
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            if let Some(ref host) = cli.host {
                config.server.host = host.clone();
            }
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        trusted_fingerprints = config.mtls.authorization.trusted_fingerprints.len(),
        "Starting cert-gate"
    );

    // Create and run gateway
    let gateway = match Gateway::new(config) {
        Ok(g) => g,
        Err(e) => {
            error!("Failed to create gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Run with graceful shutdown
    if let Err(e) = gateway.run().await {
        error!("Gateway error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Gateway shutdown complete");
    ExitCode::SUCCESS
}
