//! Certificate directory scanning.
//!
//! Certificates are derived on every call from the certificate directory, the
//! private-key directory and the revocation ledger. Nothing is cached.

use chrono::{DateTime, TimeZone, Utc};
use certdesk_core::{CertdeskError, Certificate, Result};
use std::path::Path;
use tracing::debug;

use crate::config::AuthorityConfig;
use crate::ledger::{self, RevokedSet};

/// Files in the certificate directory that belong to the authority itself.
pub const EXCLUDED_FILES: &[&str] = &[
    "ca.cert.pem",
    "intermediate.cert.pem",
    "ca-chain.cert.pem",
    "ocsp.cert.pem",
];

/// Suffix of issued certificates
pub const CERT_SUFFIX: &str = ".cert.pem";

/// Suffix of private keys
pub const KEY_SUFFIX: &str = ".key.pem";

/// Subject and validity read from one certificate file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCertificate {
    /// Subject common name, empty if the subject has none
    pub common_name: String,
    /// not-before
    pub not_before: DateTime<Utc>,
    /// not-after
    pub not_after: DateTime<Utc>,
}

/// List every issued certificate with its current revocation status.
///
/// Never fails: a missing directory yields an empty list, unreadable files
/// are skipped.
pub async fn scan_certificates(config: &AuthorityConfig) -> Vec<Certificate> {
    let revoked = ledger::load_revoked(&config.index_file).await;
    scan_directory(&config.certs_dir, &config.private_dir, &revoked).await
}

/// Scan `certs_dir` against an already loaded revoked set.
pub async fn scan_directory(
    certs_dir: &Path,
    private_dir: &Path,
    revoked: &RevokedSet,
) -> Vec<Certificate> {
    let mut entries = match tokio::fs::read_dir(certs_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(path = %certs_dir.display(), error = %e, "certificate directory unreadable");
            return Vec::new();
        }
    };

    let mut certs = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                debug!(path = %certs_dir.display(), error = %e, "stopping directory scan");
                break;
            }
        };

        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let Some(id) = certificate_id(file_name) else {
            continue;
        };

        let path = entry.path();
        let parsed = match read_certificate(&path).await {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping certificate file");
                continue;
            }
        };

        let key_path = private_dir.join(format!("{id}{KEY_SUFFIX}"));
        let has_private_key = tokio::fs::try_exists(&key_path).await.unwrap_or(false);

        certs.push(Certificate {
            id: id.to_string(),
            name: id.to_string(),
            domain: parsed.common_name,
            issued_date: parsed.not_before,
            expiry_date: parsed.not_after,
            is_revoked: revoked.is_revoked(id),
            has_private_key,
            revoked_by: None,
            revoked_date: None,
        });
    }

    debug!(path = %certs_dir.display(), count = certs.len(), "scanned certificate directory");
    certs
}

/// Certificate ID for a directory entry, `None` if the file is not an issued
/// certificate.
#[must_use]
pub fn certificate_id(file_name: &str) -> Option<&str> {
    if EXCLUDED_FILES.contains(&file_name) {
        return None;
    }
    file_name
        .strip_suffix(CERT_SUFFIX)
        .filter(|id| !id.is_empty())
}

/// Read the first PEM certificate in `path`.
///
/// # Errors
///
/// Returns `CertdeskError::Io` if the file cannot be read and
/// `CertdeskError::Validation` if it holds no parsable certificate.
pub async fn read_certificate(path: &Path) -> Result<ParsedCertificate> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| CertdeskError::io(path.display().to_string(), e))?;
    parse_pem(&content)
}

/// Parse the first `CERTIFICATE` block of a PEM document.
///
/// # Errors
///
/// Returns `CertdeskError::Validation` if there is no certificate block or the
/// DER inside it is not a valid X.509 certificate.
pub fn parse_pem(content: &[u8]) -> Result<ParsedCertificate> {
    let blocks = pem::parse_many(content)
        .map_err(|e| CertdeskError::validation(format!("invalid PEM: {e}")))?;
    let block = blocks
        .iter()
        .find(|p| p.tag() == "CERTIFICATE")
        .ok_or_else(|| CertdeskError::validation("no CERTIFICATE block"))?;

    let (_, cert) = x509_parser::parse_x509_certificate(block.contents())
        .map_err(|e| CertdeskError::validation(format!("invalid certificate: {e}")))?;

    let common_name = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or_default()
        .to_string();

    Ok(ParsedCertificate {
        common_name,
        not_before: asn1_to_utc(cert.validity().not_before),
        not_after: asn1_to_utc(cert.validity().not_after),
    })
}

fn asn1_to_utc(t: x509_parser::time::ASN1Time) -> DateTime<Utc> {
    Utc.timestamp_opt(t.timestamp(), 0)
        .single()
        .unwrap_or_else(Utc::now)
}
