// src/tls/mod.rs
// =============================================================================
// This module inspects the TLS connection behind an https URL.
//
// reqwest does not expose the peer certificate chain, so --analyze-tls makes
// one dedicated handshake of its own: resolve the host, connect, negotiate
// TLS with verification disabled (inspection has to work against self-signed
// and expired endpoints - that is the point), then read the negotiated
// parameters and parse each peer certificate.
//
// The handshake uses openssl's blocking connector inside spawn_blocking;
// certificate fields come from x509-parser over the DER bytes.
// =============================================================================

use std::fmt::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use openssl::hash::{hash, MessageDigest};
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use url::Url;
use x509_parser::prelude::*;

// Everything we report about one peer certificate
pub struct CertificateReport {
    pub is_ca: bool,
    pub not_after: String,
    pub issuer: String,
    pub subject: String,
    pub sha1_fingerprint: String,
    pub subject_alternative_names: Vec<String>,
}

// The negotiated connection parameters plus the peer chain
pub struct TlsReport {
    pub cipher_suite: String,
    pub protocol: String,
    pub certificates: Vec<CertificateReport>,
}

impl TlsReport {
    /// Renders the console block for --analyze-tls
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "TLS Connection Info");
        let _ = writeln!(out, "-------------------");
        let _ = writeln!(out, "cipher suite: {}", self.cipher_suite);
        let _ = writeln!(out, "version: {}", self.protocol);
        let _ = writeln!(out, "associated certs: {}", self.certificates.len());

        for cert in &self.certificates {
            let _ = writeln!(out, "    CA? {}", cert.is_ca);
            let _ = writeln!(out, "    expires on: {}", cert.not_after);
            let _ = writeln!(out, "    issuer: {}", cert.issuer);
            let _ = writeln!(out, "    subject: {}", cert.subject);
            let _ = writeln!(out, "    fingerprint (sha1): {}", cert.sha1_fingerprint);
            if !cert.subject_alternative_names.is_empty() {
                let _ = writeln!(
                    out,
                    "    SANs: {}",
                    cert.subject_alternative_names.join(", ")
                );
            }
            let _ = writeln!(out);
        }

        out
    }
}

// Inspects the TLS connection serving the given URL
pub async fn inspect(url: &Url, timeout: Duration) -> Result<TlsReport> {
    if url.scheme() != "https" {
        bail!("TLS analysis requires an https URL, got '{}'", url);
    }

    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("URL has no host: {}", url))?
        .to_string();
    let port = url.port_or_known_default().unwrap_or(443);

    tokio::task::spawn_blocking(move || inspect_blocking(&host, port, timeout))
        .await
        .context("TLS inspection task failed")?
}

fn inspect_blocking(host: &str, port: u16, timeout: Duration) -> Result<TlsReport> {
    let addr = (host, port)
        .to_socket_addrs()
        .with_context(|| format!("could not resolve {}:{}", host, port))?
        .next()
        .ok_or_else(|| anyhow!("no address found for {}:{}", host, port))?;

    let stream = TcpStream::connect_timeout(&addr, timeout)
        .with_context(|| format!("could not connect to {}:{}", host, port))?;
    let _ = stream.set_read_timeout(Some(timeout));
    let _ = stream.set_write_timeout(Some(timeout));

    let mut builder =
        SslConnector::builder(SslMethod::tls()).context("failed to build TLS connector")?;
    // Inspection, not trust: we want the handshake to complete for any
    // certificate so we can report on it.
    builder.set_verify(SslVerifyMode::NONE);
    let connector = builder.build();

    let mut config = connector
        .configure()
        .context("failed to configure TLS connection")?;
    config.set_verify_hostname(false);

    let ssl_stream = config
        .connect(host, stream)
        .map_err(|e| anyhow!("TLS handshake with {} failed: {}", host, e))?;

    let ssl = ssl_stream.ssl();
    let protocol = ssl.version_str().to_string();
    let cipher_suite = ssl
        .current_cipher()
        .map(|cipher| cipher.name().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut certificates = Vec::new();
    if let Some(chain) = ssl.peer_cert_chain() {
        for cert in chain {
            let der = cert
                .to_der()
                .context("could not encode peer certificate")?;
            certificates.push(describe_certificate(&der)?);
        }
    }

    Ok(TlsReport {
        cipher_suite,
        protocol,
        certificates,
    })
}

// Parses one DER-encoded certificate into its report fields
fn describe_certificate(der: &[u8]) -> Result<CertificateReport> {
    let (_, cert) = parse_x509_certificate(der)
        .map_err(|e| anyhow!("could not parse peer certificate: {}", e))?;

    let digest = hash(MessageDigest::sha1(), der).context("fingerprint digest failed")?;

    let is_ca = cert
        .basic_constraints()
        .ok()
        .flatten()
        .map(|bc| bc.value.ca)
        .unwrap_or(false);

    let subject_alternative_names = cert
        .subject_alternative_name()
        .ok()
        .flatten()
        .map(|san| {
            san.value
                .general_names
                .iter()
                .map(general_name_label)
                .collect()
        })
        .unwrap_or_default();

    Ok(CertificateReport {
        is_ca,
        not_after: cert.validity().not_after.to_string(),
        issuer: cert.issuer().to_string(),
        subject: cert.subject().to_string(),
        sha1_fingerprint: hex_fingerprint(&digest),
        subject_alternative_names,
    })
}

fn general_name_label(name: &GeneralName) -> String {
    match name {
        GeneralName::DNSName(name) => format!("DNS:{}", name),
        GeneralName::RFC822Name(addr) => format!("EMAIL:{}", addr),
        GeneralName::URI(uri) => format!("URI:{}", uri),
        GeneralName::IPAddress(bytes) => format!("IP:{}", ip_label(bytes)),
        other => format!("{:?}", other),
    }
}

fn ip_label(bytes: &[u8]) -> String {
    match bytes.len() {
        4 => format!("{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3]),
        _ => bytes
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":"),
    }
}

// Colon-separated lowercase hex, the usual fingerprint presentation
fn hex_fingerprint(digest: &[u8]) -> String {
    digest
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect::<Vec<_>>()
        .join(":")
}
