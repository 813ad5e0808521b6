//! TLS client configuration

use anyhow::{Context, Result};
use rustls::pki_types::CertificateDer;
use rustls::{ClientConfig, RootCertStore};
use rustls_pemfile::certs;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::TlsConnector;
use tracing::info;

/// TLS settings for outgoing `https://` requests
#[derive(Clone)]
pub struct TlsConfig {
    connector: Option<TlsConnector>,
}

impl TlsConfig {
    /// No TLS: `https://` requests fail
    pub fn disabled() -> Self {
        Self { connector: None }
    }

    /// Trust the CA certificates in a PEM bundle
    pub fn from_ca_file<P: AsRef<Path>>(ca_path: P) -> Result<Self> {
        let ca_path = ca_path.as_ref();
        info!("Loading CA certificates from: {:?}", ca_path);

        let ca_file =
            File::open(ca_path).context(format!("Failed to open CA bundle: {:?}", ca_path))?;
        let mut reader = BufReader::new(ca_file);
        let ca_certs: Vec<CertificateDer> = certs(&mut reader)
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to parse CA bundle")?;

        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(ca_certs);
        if added == 0 {
            anyhow::bail!("No usable certificates found in CA bundle");
        }
        info!("Trusted {} CA certificates ({} ignored)", added, ignored);

        let client_config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            connector: Some(TlsConnector::from(Arc::new(client_config))),
        })
    }

    /// Check if TLS is available
    pub fn is_enabled(&self) -> bool {
        self.connector.is_some()
    }

    /// Connector for `https://` requests, if TLS is available
    pub fn connector(&self) -> Option<&TlsConnector> {
        self.connector.as_ref()
    }
}
