//! Certificate types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    /// Requested, issuance not finished
    Pending,
    Valid,
    ExpiringSoon,
    Expired,
    /// Issuance or renewal failed
    Invalid,
}

impl CertificateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Valid => "valid",
            Self::ExpiringSoon => "expiring_soon",
            Self::Expired => "expired",
            Self::Invalid => "invalid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "valid" => Some(Self::Valid),
            "expiring_soon" => Some(Self::ExpiringSoon),
            "expired" => Some(Self::Expired),
            "invalid" => Some(Self::Invalid),
            _ => None,
        }
    }

    /// Status of an issued certificate at `now`.
    pub fn evaluate(not_after: DateTime<Utc>, now: DateTime<Utc>, renewal_days: i64) -> Self {
        if now >= not_after {
            Self::Expired
        } else if now + Duration::days(renewal_days) >= not_after {
            Self::ExpiringSoon
        } else {
            Self::Valid
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CertificateKind {
    /// A single host name
    Single,
    /// `*.example.com`
    Wildcard,
}

impl CertificateKind {
    pub fn for_name(name: &str) -> Self {
        if name.starts_with("*.") {
            Self::Wildcard
        } else {
            Self::Single
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Wildcard => "wildcard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single" => Some(Self::Single),
            "wildcard" => Some(Self::Wildcard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Certificate {
    pub id: String,
    pub domain_id: String,
    pub name: String,
    pub kind: CertificateKind,
    pub status: CertificateStatus,
    pub issuer: Option<String>,
    pub subject: Option<String>,
    pub serial_number: Option<String>,
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,
    pub auto_renew: bool,
    pub renewal_days: i64,
    pub last_renewed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Certificate {
    /// Re-derives the status at `now`.
    ///
    /// Pending certificates, and anything without a validity window, keep
    /// their stored status. An invalid certificate that still holds an issued
    /// window stays invalid until that window reaches its renewal period, so
    /// a failed renewal is retried instead of parked.
    pub fn evaluated_status(&self, now: DateTime<Utc>) -> CertificateStatus {
        match (self.status, self.not_after) {
            (CertificateStatus::Pending, _) | (_, None) => self.status,
            (CertificateStatus::Invalid, Some(not_after)) => {
                match CertificateStatus::evaluate(not_after, now, self.renewal_days) {
                    CertificateStatus::Valid => CertificateStatus::Invalid,
                    due => due,
                }
            }
            (_, Some(not_after)) => CertificateStatus::evaluate(not_after, now, self.renewal_days),
        }
    }

    /// Name used for the ACME client's lineage directory.
    ///
    /// `*.example.com` and `example.com` are separate certificates, so the
    /// wildcard gets its own prefix.
    pub fn lineage_name(&self) -> String {
        match self.name.strip_prefix("*.") {
            Some(base) => format!("wildcard_{base}"),
            None => self.name.clone(),
        }
    }
}

/// Metadata read back from an issued certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateMetadata {
    pub issuer: String,
    pub subject: String,
    pub serial_number: Option<String>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenewalSummary {
    pub renewed: Vec<String>,
    pub failed: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_boundaries() {
        let now = Utc::now();
        assert_eq!(
            CertificateStatus::evaluate(now - Duration::seconds(1), now, 30),
            CertificateStatus::Expired
        );
        assert_eq!(
            CertificateStatus::evaluate(now + Duration::days(10), now, 30),
            CertificateStatus::ExpiringSoon
        );
        assert_eq!(
            CertificateStatus::evaluate(now + Duration::days(60), now, 30),
            CertificateStatus::Valid
        );
    }

    fn certificate(name: &str, status: CertificateStatus, not_after: Option<DateTime<Utc>>) -> Certificate {
        let now = Utc::now();
        Certificate {
            id: "c".into(),
            domain_id: "d".into(),
            name: name.into(),
            kind: CertificateKind::for_name(name),
            status,
            issuer: None,
            subject: None,
            serial_number: None,
            not_before: None,
            not_after,
            auto_renew: true,
            renewal_days: 30,
            last_renewed_at: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn pending_is_never_re_evaluated() {
        let now = Utc::now();
        let cert = certificate(
            "*.example.com",
            CertificateStatus::Pending,
            Some(now - Duration::days(1)),
        );
        assert_eq!(cert.kind, CertificateKind::Wildcard);
        assert_eq!(cert.evaluated_status(now), CertificateStatus::Pending);
    }

    #[test]
    fn invalid_with_window_re_enters_renewal() {
        let now = Utc::now();
        let issued = Some(now + Duration::days(80));
        let cert = certificate("www.example.com", CertificateStatus::Invalid, issued);

        assert_eq!(cert.evaluated_status(now), CertificateStatus::Invalid);
        assert_eq!(
            cert.evaluated_status(now + Duration::days(60)),
            CertificateStatus::ExpiringSoon
        );
        assert_eq!(
            cert.evaluated_status(now + Duration::days(81)),
            CertificateStatus::Expired
        );

        // Never issued: nothing to re-evaluate against.
        let never = certificate("www.example.com", CertificateStatus::Invalid, None);
        assert_eq!(
            never.evaluated_status(now + Duration::days(365)),
            CertificateStatus::Invalid
        );
    }

    #[test]
    fn wildcard_and_apex_lineages_differ() {
        let apex = certificate("example.com", CertificateStatus::Valid, None);
        let wildcard = certificate("*.example.com", CertificateStatus::Valid, None);
        assert_eq!(apex.lineage_name(), "example.com");
        assert_eq!(wildcard.lineage_name(), "wildcard_example.com");
    }
}
