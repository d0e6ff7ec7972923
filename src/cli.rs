//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// cert-gate - mutual TLS gateway with client certificate pinning
#[derive(Parser, Debug)]
#[command(name = "cert-gate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "CERT_GATE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    ///
    /// Overrides `server.port` after the config is loaded.  The config-layer
    /// spelling of the same setting is `CERT_GATE_SERVER__PORT`.
    #[arg(short, long, env = "CERT_GATE_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    ///
    /// Overrides `server.host` after the config is loaded.  The config-layer
    /// spelling is `CERT_GATE_SERVER__HOST`.
    #[arg(long, env = "CERT_GATE_HOST")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "CERT_GATE_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "CERT_GATE_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the gateway server (default)
    Serve,

    /// Print the SHA-256 fingerprint of every certificate in a PEM file
    Fingerprint {
        /// Path to a PEM certificate file
        #[arg(required = true)]
        cert: PathBuf,
    },

    /// Decide offline whether a client certificate would be admitted
    ///
    /// Uses the authorization rules from the loaded configuration and the
    /// current time. Exits 0 on allow, 1 on deny.
    Check {
        /// Path to the client's PEM certificate (leaf first)
        #[arg(required = true)]
        cert: PathBuf,
    },

    /// Certificate generation for local setups
    #[command(subcommand)]
    Tls(TlsCommand),
}

/// TLS material subcommands
#[derive(Subcommand, Debug)]
pub enum TlsCommand {
    /// Generate a self-signed CA
    InitCa {
        /// CA Common Name (client certificates carry it as issuer CN)
        #[arg(long, default_value = "localhost")]
        cn: String,

        /// Validity in days
        #[arg(long, default_value_t = 3650)]
        days: u32,

        /// Output directory
        #[arg(short, long, default_value = "ssl/server")]
        out_dir: PathBuf,

        /// File stem (`<stem>-crt.pem`, `<stem>-key.pem`)
        #[arg(long, default_value = "ca")]
        stem: String,
    },

    /// Issue a leaf certificate signed by an existing CA
    Issue {
        /// Leaf Common Name
        #[arg(long, required = true)]
        cn: String,

        /// Organisational Unit
        #[arg(long)]
        ou: Option<String>,

        /// DNS Subject Alternative Name (repeatable); needed for server certs
        #[arg(long = "san-dns")]
        san_dns: Vec<String>,

        /// Validity in days
        #[arg(long, default_value_t = 365)]
        days: u32,

        /// CA certificate PEM
        #[arg(long, default_value = "ssl/server/ca-crt.pem")]
        ca_cert: PathBuf,

        /// CA private key PEM
        #[arg(long, default_value = "ssl/server/ca-key.pem")]
        ca_key: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "ssl/client")]
        out_dir: PathBuf,

        /// File stem (`<stem>-crt.pem`, `<stem>-key.pem`)
        #[arg(long, default_value = "client")]
        stem: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["cert-gate", "--port", "8443"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.port, Some(8443));
    }

    #[test]
    fn check_takes_a_certificate_path() {
        let cli = Cli::try_parse_from(["cert-gate", "check", "client.pem"]).unwrap();
        match cli.command {
            Some(Command::Check { cert }) => assert_eq!(cert, PathBuf::from("client.pem")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn tls_issue_collects_repeated_sans() {
        let cli = Cli::try_parse_from([
            "cert-gate",
            "tls",
            "issue",
            "--cn",
            "gate-server",
            "--san-dns",
            "localhost",
            "--san-dns",
            "gate.internal",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Tls(TlsCommand::Issue { cn, san_dns, days, .. })) => {
                assert_eq!(cn, "gate-server");
                assert_eq!(san_dns, vec!["localhost", "gate.internal"]);
                assert_eq!(days, 365);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
