//! On-disk certificate inspection.
//!
//! Reads the current certificate for a domain independently of whatever the
//! domain record last recorded, which lets callers detect drift and verify
//! externally-issued certificates.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::traits::CommandSpec;
use crate::types::CertificateMetadata;

/// Reads certificate metadata from disk via the external inspection command.
pub struct CertificateInspector {
    ctx: Arc<ServiceContext>,
}

impl CertificateInspector {
    /// Creates the inspector.
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Inspects the domain's fullchain file.
    ///
    /// A missing file is [`CoreError::CertificateNotFound`], not an
    /// operational error. A malformed or empty parse yields metadata with
    /// only the fields that were present.
    pub async fn inspect(&self, domain: &str) -> CoreResult<CertificateMetadata> {
        let cert_path = self.ctx.config.fullchain_path(domain);
        if !cert_path.exists() {
            return Err(CoreError::CertificateNotFound(domain.to_string()));
        }

        let mut metadata = CertificateMetadata {
            domain: domain.to_string(),
            cert_path: cert_path.clone(),
            exists: true,
            valid_from: None,
            valid_to: None,
            subject: None,
        };

        let spec = CommandSpec::new("openssl", "inspect", self.ctx.config.inspect_timeout())
            .arg("x509")
            .arg("-in")
            .arg(cert_path.to_string_lossy())
            .args(["-noout", "-dates", "-subject"]);

        let output = match self.ctx.process_runner.run(spec).await {
            Ok(output) if output.success() => output,
            Ok(output) => {
                log::warn!(
                    "Certificate inspection for {domain} exited {}: {}",
                    output.exit_code,
                    output.diagnostic()
                );
                return Ok(metadata);
            }
            Err(e) => {
                log::warn!("Certificate inspection for {domain} failed: {e}");
                return Ok(metadata);
            }
        };

        for line in output.stdout.lines() {
            if let Some(v) = line.strip_prefix("notBefore=") {
                metadata.valid_from = Some(v.trim().to_string());
            } else if let Some(v) = line.strip_prefix("notAfter=") {
                metadata.valid_to = Some(v.trim().to_string());
            } else if let Some(v) = line.strip_prefix("subject=") {
                metadata.subject = Some(v.trim().to_string());
            }
        }

        Ok(metadata)
    }

    /// The certificate's validity window as parsed timestamps.
    ///
    /// `None` when the certificate is missing, unparseable, or reports an
    /// inverted window.
    pub async fn validity_window(&self, domain: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let metadata = self.inspect(domain).await.ok()?;
        let from = parse_openssl_date(metadata.valid_from.as_deref()?)?;
        let to = parse_openssl_date(metadata.valid_to.as_deref()?)?;
        (to > from).then_some((from, to))
    }
}

/// Parses openssl's date format, e.g. `May 12 14:30:00 2026 GMT`.
fn parse_openssl_date(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), "%b %e %H:%M:%S %Y GMT")
        .ok()
        .map(|dt| dt.and_utc())
}
