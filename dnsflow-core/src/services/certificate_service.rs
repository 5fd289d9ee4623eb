//! 证书服务
//!
//! A certificate row moves `pending -> valid | invalid`. Issuance and
//! renewal both run the ACME client; on success the issued certificate is
//! read back from the client's lineage directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio_util::sync::CancellationToken;
use x509_parser::prelude::*;

use crate::config::CertificateSettings;
use crate::error::{CoreError, CoreResult};
use crate::services::{AcmeRequest, AcmeRunner, ServiceContext};
use crate::types::{
    Certificate, CertificateKind, CertificateMetadata, CertificateStatus, RenewalSummary,
};
use crate::utils::domain_name::{is_within_zone, normalize_zone};

pub struct CertificateService {
    ctx: Arc<ServiceContext>,
    runner: Arc<dyn AcmeRunner>,
    settings: CertificateSettings,
    /// Persistent ACME client state
    config_dir: PathBuf,
    /// Command line the ACME client runs for hooks, minus `auth`/`cleanup`
    hook_command: String,
    shutdown: CancellationToken,
}

impl CertificateService {
    #[must_use]
    pub fn new(
        ctx: Arc<ServiceContext>,
        runner: Arc<dyn AcmeRunner>,
        settings: CertificateSettings,
        storage_root: &Path,
        hook_command: String,
    ) -> Self {
        Self {
            ctx,
            runner,
            settings,
            config_dir: storage_root.join("certbot_config"),
            hook_command,
            shutdown: CancellationToken::new(),
        }
    }

    /// Cancels every in-flight ACME run; each one terminates its process.
    pub fn cancel_all(&self) {
        self.shutdown.cancel();
    }

    pub fn teardown_limit(&self) -> std::time::Duration {
        self.settings.teardown_limit()
    }

    pub async fn list_certificates(&self) -> CoreResult<Vec<Certificate>> {
        self.ctx.certificate_repository().find_all().await
    }

    pub async fn get_certificate(&self, certificate_id: &str) -> CoreResult<Certificate> {
        self.ctx
            .certificate_repository()
            .find_by_id(certificate_id)
            .await?
            .ok_or_else(|| CoreError::CertificateNotFound(certificate_id.to_string()))
    }

    /// 申请证书
    ///
    /// The row is stored as `pending` before the ACME client starts, so a
    /// failed attempt stays visible as `invalid` with its error.
    pub async fn request_certificate(
        &self,
        domain_id: &str,
        name: &str,
        auto_renew: bool,
    ) -> CoreResult<Certificate> {
        let domain = self.ctx.load_domain(domain_id).await?;
        let name = normalize_zone(name);
        let base = name.strip_prefix("*.").unwrap_or(&name);
        if base.is_empty() || base.contains('*') || !is_within_zone(base, &domain.name) {
            return Err(CoreError::ValidationError(format!(
                "{name} is not a valid certificate name in {}",
                domain.name
            )));
        }
        if self
            .ctx
            .certificate_repository()
            .find_by_name(&name)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict(format!(
                "a certificate for {name} already exists"
            )));
        }

        let now = Utc::now();
        let mut certificate = Certificate {
            id: uuid::Uuid::new_v4().to_string(),
            domain_id: domain.id.clone(),
            kind: CertificateKind::for_name(&name),
            name,
            status: CertificateStatus::Pending,
            issuer: None,
            subject: None,
            serial_number: None,
            not_before: None,
            not_after: None,
            auto_renew,
            renewal_days: self.settings.renewal_days,
            last_renewed_at: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        let lineage = certificate.lineage_name();
        if let Some(other) = self
            .ctx
            .certificate_repository()
            .find_all()
            .await?
            .into_iter()
            .find(|c| c.lineage_name() == lineage)
        {
            return Err(CoreError::Conflict(format!(
                "{} already uses the ACME lineage {lineage}",
                other.name
            )));
        }

        self.ctx.certificate_repository().save(&certificate).await?;
        log::info!("Requesting certificate {}", certificate.name);

        self.issue(&mut certificate, false).await?;
        Ok(certificate)
    }

    /// 续期证书
    pub async fn renew(&self, certificate_id: &str) -> CoreResult<Certificate> {
        let mut certificate = self.get_certificate(certificate_id).await?;
        self.ctx.load_domain(&certificate.domain_id).await?;
        log::info!("Renewing certificate {}", certificate.name);

        self.issue(&mut certificate, true).await?;
        certificate.last_renewed_at = Some(certificate.updated_at);
        self.ctx.certificate_repository().save(&certificate).await?;
        Ok(certificate)
    }

    /// Issued certificates whose `not_after` falls within `days` of `now`.
    ///
    /// Only rows stored as valid or expiring soon are listed, soonest first.
    pub async fn list_expiring(&self, now: DateTime<Utc>, days: i64) -> CoreResult<Vec<Certificate>> {
        if days < 0 {
            return Err(CoreError::ValidationError(format!(
                "days must not be negative, got {days}"
            )));
        }
        let cutoff = now + Duration::days(days);
        let mut expiring: Vec<Certificate> = self
            .ctx
            .certificate_repository()
            .find_all()
            .await?
            .into_iter()
            .filter(|c| {
                matches!(
                    c.status,
                    CertificateStatus::Valid | CertificateStatus::ExpiringSoon
                ) && c.not_after.is_some_and(|not_after| not_after <= cutoff)
            })
            .collect();
        expiring.sort_by_key(|c| c.not_after);
        Ok(expiring)
    }

    /// Removes the row only; issued files stay with the ACME client.
    pub async fn delete_certificate(&self, certificate_id: &str) -> CoreResult<()> {
        self.ctx.certificate_repository().delete(certificate_id).await
    }

    /// Re-evaluates every status at `now`, storing only the ones that change.
    pub async fn refresh_statuses(&self, now: DateTime<Utc>) -> CoreResult<Vec<Certificate>> {
        let mut changed = Vec::new();
        for mut certificate in self.ctx.certificate_repository().find_all().await? {
            let status = certificate.evaluated_status(now);
            if status != certificate.status {
                log::info!(
                    "Certificate {} is now {}",
                    certificate.name,
                    status.as_str()
                );
                certificate.status = status;
                certificate.updated_at = now;
                self.ctx.certificate_repository().save(&certificate).await?;
                changed.push(certificate);
            }
        }
        Ok(changed)
    }

    /// Renews auto-renew certificates inside their renewal window.
    pub async fn renew_due(&self, now: DateTime<Utc>) -> CoreResult<RenewalSummary> {
        let mut summary = RenewalSummary::default();
        if !self.settings.auto_renewal_enabled {
            log::debug!("Automatic renewal disabled");
            return Ok(summary);
        }

        for certificate in self.ctx.certificate_repository().find_all().await? {
            if !certificate.auto_renew {
                continue;
            }
            if !matches!(
                certificate.evaluated_status(now),
                CertificateStatus::ExpiringSoon | CertificateStatus::Expired
            ) {
                continue;
            }
            match self.renew(&certificate.id).await {
                Ok(_) => summary.renewed.push(certificate.name),
                Err(e) => {
                    log::error!("Renewal of {} failed: {e}", certificate.name);
                    summary.failed.push((certificate.name, e.to_string()));
                }
            }
        }
        Ok(summary)
    }

    fn acme_request(&self, certificate: &Certificate, force_renewal: bool) -> AcmeRequest {
        AcmeRequest {
            cert_name: certificate.lineage_name(),
            domains: vec![certificate.name.clone()],
            email: self.settings.email.clone(),
            config_dir: self.config_dir.clone(),
            auth_hook: format!("{} hook auth", self.hook_command),
            cleanup_hook: format!("{} hook cleanup", self.hook_command),
            force_renewal,
        }
    }

    /// Runs the ACME client and stores the outcome on `certificate`.
    async fn issue(&self, certificate: &mut Certificate, force_renewal: bool) -> CoreResult<()> {
        let request = self.acme_request(certificate, force_renewal);
        let outcome = self
            .runner
            .run(&request, self.shutdown.child_token())
            .await;
        let now = Utc::now();
        certificate.updated_at = now;

        if let Err(e) = outcome {
            let message = match &e {
                CoreError::ElevatedPrivileges(_) => {
                    "the ACME client needs administrator/root privileges; run dnsflow with elevated rights"
                        .to_string()
                }
                other => other.to_string(),
            };
            log::error!("Certificate {} failed: {message}", certificate.name);
            certificate.status = CertificateStatus::Invalid;
            certificate.last_error = Some(message);
            self.ctx.certificate_repository().save(certificate).await?;
            return Err(e);
        }

        let path = self
            .config_dir
            .join("live")
            .join(&request.cert_name)
            .join("fullchain.pem");
        let metadata = read_certificate_metadata(&path).unwrap_or_else(|| {
            log::warn!(
                "Could not read {}, assuming a {}-day certificate",
                path.display(),
                self.settings.validity_days
            );
            CertificateMetadata {
                issuer: self.settings.default_issuer.clone(),
                subject: format!("CN={}", certificate.name),
                serial_number: None,
                not_before: now,
                not_after: now + Duration::days(self.settings.validity_days),
            }
        });

        certificate.issuer = Some(metadata.issuer);
        certificate.subject = Some(metadata.subject);
        certificate.serial_number = metadata.serial_number;
        certificate.not_before = Some(metadata.not_before);
        certificate.not_after = Some(metadata.not_after);
        certificate.status = CertificateStatus::Valid;
        certificate.last_error = None;
        self.ctx.certificate_repository().save(certificate).await?;
        log::info!(
            "Certificate {} valid until {}",
            certificate.name,
            metadata.not_after
        );
        Ok(())
    }
}

/// Reads the leaf certificate of a PEM chain.
pub fn read_certificate_metadata(path: &Path) -> Option<CertificateMetadata> {
    let pem = std::fs::read(path).ok()?;
    parse_certificate_metadata(&pem)
}

fn parse_certificate_metadata(pem: &[u8]) -> Option<CertificateMetadata> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(pem)
        .map_err(|e| log::debug!("PEM parsing failed: {e}"))
        .ok()?;
    let (_, cert) = X509Certificate::from_der(&pem.contents)
        .map_err(|e| log::debug!("Certificate parsing failed: {e}"))
        .ok()?;

    let validity = cert.validity();
    Some(CertificateMetadata {
        issuer: cert.issuer().to_string(),
        subject: cert.subject().to_string(),
        serial_number: Some(cert.serial.to_str_radix(16).to_uppercase()),
        not_before: DateTime::from_timestamp(validity.not_before.timestamp(), 0)?,
        not_after: DateTime::from_timestamp(validity.not_after.timestamp(), 0)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        add_domain, add_provider, create_test_context, AcmeScript, MockAcmeRunner, MockDnsProvider,
    };

    struct Fixture {
        svc: CertificateService,
        ctx: Arc<ServiceContext>,
        runner: Arc<MockAcmeRunner>,
        storage: tempfile::TempDir,
    }

    async fn fixture(script: AcmeScript) -> Fixture {
        let (ctx, _) = create_test_context();
        add_provider(&ctx, "p1", Arc::new(MockDnsProvider::new("mock"))).await;
        add_domain(&ctx, "d1", "example.com", "p1").await;
        let runner = Arc::new(MockAcmeRunner::new(script));
        let storage = tempfile::tempdir().unwrap();
        let svc = CertificateService::new(
            ctx.clone(),
            runner.clone(),
            CertificateSettings::default(),
            storage.path(),
            "/usr/bin/dnsflow --config /etc/dnsflow.toml".to_string(),
        );
        Fixture {
            svc,
            ctx,
            runner,
            storage,
        }
    }

    #[tokio::test]
    async fn successful_issuance_falls_back_to_default_metadata() {
        let f = fixture(AcmeScript::Succeed).await;
        let cert = f.svc.request_certificate("d1", "*.Example.com", true).await.unwrap();

        assert_eq!(cert.name, "*.example.com");
        assert_eq!(cert.kind, CertificateKind::Wildcard);
        assert_eq!(cert.status, CertificateStatus::Valid);
        assert_eq!(cert.issuer.as_deref(), Some("Let's Encrypt"));
        let days = (cert.not_after.unwrap() - cert.not_before.unwrap()).num_days();
        assert_eq!(days, 90);

        let request = &f.runner.requests()[0];
        assert_eq!(request.cert_name, "wildcard_example.com");
        assert_eq!(request.domains, vec!["*.example.com".to_string()]);
        assert_eq!(
            request.auth_hook,
            "/usr/bin/dnsflow --config /etc/dnsflow.toml hook auth"
        );
        assert!(!request.force_renewal);
    }

    #[tokio::test]
    async fn timeout_marks_invalid_without_metadata() {
        let f = fixture(AcmeScript::TimeOut).await;
        let err = f
            .svc
            .request_certificate("d1", "www.example.com", true)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AcmeTimeout { .. }));

        let stored = f.svc.list_certificates().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, CertificateStatus::Invalid);
        assert!(stored[0].not_after.is_none());
        assert!(stored[0].issuer.is_none());
        assert!(stored[0].last_error.as_ref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn failure_keeps_client_message() {
        let f = fixture(AcmeScript::Fail("DNS problem: NXDOMAIN".to_string())).await;
        assert!(f.svc.request_certificate("d1", "www.example.com", true).await.is_err());
        let stored = f.svc.list_certificates().await.unwrap();
        assert!(stored[0].last_error.as_ref().unwrap().contains("NXDOMAIN"));
    }

    #[tokio::test]
    async fn names_outside_the_domain_are_rejected() {
        let f = fixture(AcmeScript::Succeed).await;
        for bad in ["www.other.com", "*.*.example.com", ""] {
            assert!(matches!(
                f.svc.request_certificate("d1", bad, true).await,
                Err(CoreError::ValidationError(_))
            ));
        }
        assert!(f.runner.requests().is_empty());
    }

    #[tokio::test]
    async fn duplicate_name_is_a_conflict() {
        let f = fixture(AcmeScript::Succeed).await;
        f.svc.request_certificate("d1", "www.example.com", true).await.unwrap();
        assert!(matches!(
            f.svc.request_certificate("d1", "WWW.example.com.", true).await,
            Err(CoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn apex_and_wildcard_get_separate_lineages() {
        let f = fixture(AcmeScript::Succeed).await;
        f.svc.request_certificate("d1", "example.com", true).await.unwrap();
        f.svc.request_certificate("d1", "*.example.com", true).await.unwrap();

        let lineages: Vec<_> = f.runner.requests().into_iter().map(|r| r.cert_name).collect();
        assert_eq!(lineages, vec!["example.com", "wildcard_example.com"]);

        // A literal name that collides with a wildcard lineage is refused.
        add_domain(&f.ctx, "d2", "wildcard_example.com", "p1").await;
        assert!(matches!(
            f.svc.request_certificate("d2", "wildcard_example.com", true).await,
            Err(CoreError::Conflict(_))
        ));
        assert_eq!(f.runner.requests().len(), 2);
    }

    #[tokio::test]
    async fn renew_sets_last_renewed_and_forces() {
        let f = fixture(AcmeScript::Succeed).await;
        let cert = f.svc.request_certificate("d1", "www.example.com", true).await.unwrap();

        let renewed = f.svc.renew(&cert.id).await.unwrap();
        assert!(renewed.last_renewed_at.is_some());
        assert_eq!(renewed.id, cert.id);
        assert!(f.runner.requests()[1].force_renewal);
        assert_eq!(f.svc.list_certificates().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn renewal_failure_marks_invalid() {
        let f = fixture(AcmeScript::Succeed).await;
        let cert = f.svc.request_certificate("d1", "www.example.com", true).await.unwrap();
        f.runner.set_script(AcmeScript::Fail("rate limited".to_string()));

        assert!(f.svc.renew(&cert.id).await.is_err());
        let stored = f.svc.get_certificate(&cert.id).await.unwrap();
        assert_eq!(stored.status, CertificateStatus::Invalid);
        assert!(stored.last_renewed_at.is_none());
    }

    #[tokio::test]
    async fn refresh_and_renew_due() {
        let f = fixture(AcmeScript::Succeed).await;
        let due = f.svc.request_certificate("d1", "a.example.com", true).await.unwrap();
        let manual = f.svc.request_certificate("d1", "b.example.com", false).await.unwrap();
        let fresh = f.svc.request_certificate("d1", "c.example.com", true).await.unwrap();

        // 70 days later the 90-day certificates are inside the 30-day window.
        let later = Utc::now() + Duration::days(70);
        let mut fresh = fresh;
        fresh.not_after = Some(later + Duration::days(60));
        f.ctx.certificate_repository().save(&fresh).await.unwrap();

        let changed = f.svc.refresh_statuses(later).await.unwrap();
        let mut names: Vec<_> = changed.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a.example.com", "b.example.com"]);
        assert!(f.svc.refresh_statuses(later).await.unwrap().is_empty());

        let summary = f.svc.renew_due(later).await.unwrap();
        assert_eq!(summary.renewed, vec![due.name.clone()]);
        assert!(summary.failed.is_empty());
        assert_eq!(
            f.svc.get_certificate(&manual.id).await.unwrap().status,
            CertificateStatus::ExpiringSoon
        );
    }

    #[tokio::test]
    async fn expiring_lists_valid_certificates_by_deadline() {
        let f = fixture(AcmeScript::Succeed).await;
        let now = Utc::now();
        let mut rows = Vec::new();
        for (name, days_left) in [("a.example.com", 20), ("b.example.com", 5), ("c.example.com", 60)] {
            let mut cert = f.svc.request_certificate("d1", name, true).await.unwrap();
            cert.not_after = Some(now + Duration::days(days_left));
            f.ctx.certificate_repository().save(&cert).await.unwrap();
            rows.push(cert);
        }
        // A failed certificate is not listed even inside the window.
        rows[0].status = CertificateStatus::Invalid;
        rows[0].not_after = Some(now + Duration::days(1));
        f.ctx.certificate_repository().save(&rows[0]).await.unwrap();

        let names: Vec<String> = f
            .svc
            .list_expiring(now, 30)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["b.example.com"]);

        let all = f.svc.list_expiring(now, 90).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].name, "c.example.com");
        assert!(matches!(
            f.svc.list_expiring(now, -1).await,
            Err(CoreError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn failed_automatic_renewal_is_retried() {
        let f = fixture(AcmeScript::Succeed).await;
        let cert = f.svc.request_certificate("d1", "www.example.com", true).await.unwrap();
        let issued_until = cert.not_after.unwrap();

        f.runner.set_script(AcmeScript::Fail("rate limited".to_string()));
        let first = Utc::now() + Duration::days(70);
        let summary = f.svc.renew_due(first).await.unwrap();
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(
            f.svc.get_certificate(&cert.id).await.unwrap().status,
            CertificateStatus::Invalid
        );
        // The failed row still reports its renewal window.
        assert_eq!(f.svc.refresh_statuses(first).await.unwrap().len(), 1);

        f.runner.set_script(AcmeScript::Succeed);
        let summary = f.svc.renew_due(first + Duration::days(1)).await.unwrap();
        assert_eq!(summary.renewed, vec![cert.name.clone()]);
        assert_eq!(f.runner.requests().len(), 3);

        let stored = f.svc.get_certificate(&cert.id).await.unwrap();
        assert_eq!(stored.status, CertificateStatus::Valid);
        assert!(stored.last_error.is_none());
        assert!(stored.not_after.unwrap() >= issued_until);
    }

    #[tokio::test]
    async fn expired_after_failed_renewal_is_still_due() {
        let f = fixture(AcmeScript::Succeed).await;
        let cert = f.svc.request_certificate("d1", "www.example.com", true).await.unwrap();
        f.runner.set_script(AcmeScript::Fail("rate limited".to_string()));
        assert!(f.svc.renew(&cert.id).await.is_err());

        f.runner.set_script(AcmeScript::Succeed);
        let past_expiry = cert.not_after.unwrap() + Duration::days(1);
        let summary = f.svc.renew_due(past_expiry).await.unwrap();
        assert_eq!(summary.renewed, vec![cert.name]);
    }

    const FULLCHAIN: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/fullchain.pem"));

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn leaf_metadata_is_read_from_the_chain() {
        let metadata = parse_certificate_metadata(FULLCHAIN).unwrap();
        assert_eq!(metadata.issuer, "O=Dnsflow Test, CN=Dnsflow Test CA");
        assert_eq!(metadata.subject, "CN=www.example.com");
        assert_eq!(metadata.serial_number.as_deref(), Some("1A2B3C4D"));
        assert_eq!(metadata.not_before, utc("2026-01-01T00:00:00Z"));
        assert_eq!(metadata.not_after, utc("2035-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn issuance_reads_the_lineage_fullchain() {
        let f = fixture(AcmeScript::Succeed).await;
        let live = f.storage.path().join("certbot_config/live/www.example.com");
        std::fs::create_dir_all(&live).unwrap();
        std::fs::write(live.join("fullchain.pem"), FULLCHAIN).unwrap();

        let cert = f.svc.request_certificate("d1", "www.example.com", true).await.unwrap();
        assert_eq!(cert.status, CertificateStatus::Valid);
        assert_eq!(cert.issuer.as_deref(), Some("O=Dnsflow Test, CN=Dnsflow Test CA"));
        assert_eq!(cert.subject.as_deref(), Some("CN=www.example.com"));
        assert_eq!(cert.serial_number.as_deref(), Some("1A2B3C4D"));
        assert_eq!(cert.not_after, Some(utc("2035-01-01T00:00:00Z")));

        let stored = f.svc.get_certificate(&cert.id).await.unwrap();
        assert_eq!(stored.not_before, Some(utc("2026-01-01T00:00:00Z")));
    }

    #[test]
    fn garbage_pem_yields_no_metadata() {
        assert!(parse_certificate_metadata(b"not a certificate").is_none());
        assert!(read_certificate_metadata(Path::new("/nonexistent/fullchain.pem")).is_none());
    }
}
