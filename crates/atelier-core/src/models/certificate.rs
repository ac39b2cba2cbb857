use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::time;

/// Proof of completion, issued by the backend and immutable afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkshopCertificate {
    pub id: String,
    pub workshop_id: String,
    pub user_id: String,
    pub workshop_title: String,
    pub user_name: String,
    pub instructor_name: String,
    pub certificate_number: String,
    /// Globally unique, public verification handle.
    pub verification_code: String,
    pub issued_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_logo_url: Option<String>,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competency_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
}

impl WorkshopCertificate {
    pub fn valid_until_at(&self) -> Option<DateTime<Utc>> {
        self.valid_until.as_deref().and_then(time::parse_instant)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until_at().is_some_and(|until| until < now)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Valid,
    Expired,
    Unverified,
    NotFound,
}

pub const CERTIFICATE_EXPIRED: &str = "Certificate has expired";
pub const CERTIFICATE_UNVERIFIED: &str = "Certificate has not been verified";
pub const CERTIFICATE_NOT_FOUND: &str = "Certificate not found";

/// Result of looking up a verification code. Callers branch on `outcome`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CertificateVerification {
    pub is_valid: bool,
    pub outcome: VerificationOutcome,
    pub certificate: Option<WorkshopCertificate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CertificateVerification {
    /// Expiry is checked before verification state.
    pub fn classify(certificate: Option<WorkshopCertificate>, now: DateTime<Utc>) -> Self {
        let Some(certificate) = certificate else {
            return Self {
                is_valid: false,
                outcome: VerificationOutcome::NotFound,
                certificate: None,
                error: Some(CERTIFICATE_NOT_FOUND.to_string()),
            };
        };

        let (outcome, error) = if certificate.is_expired_at(now) {
            (VerificationOutcome::Expired, Some(CERTIFICATE_EXPIRED))
        } else if !certificate.is_verified {
            (VerificationOutcome::Unverified, Some(CERTIFICATE_UNVERIFIED))
        } else {
            (VerificationOutcome::Valid, None)
        };

        Self {
            is_valid: outcome == VerificationOutcome::Valid,
            outcome,
            certificate: Some(certificate),
            error: error.map(str::to_string),
        }
    }
}

/// Response of `POST /certificates/{id}/share`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    pub shareable_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn certificate(valid_until: Option<DateTime<Utc>>, is_verified: bool) -> WorkshopCertificate {
        WorkshopCertificate {
            id: "c1".to_string(),
            verification_code: "ABC123".to_string(),
            valid_until: valid_until.map(|t| t.to_rfc3339()),
            is_verified,
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_each_outcome() {
        let now = Utc::now();

        let valid = CertificateVerification::classify(
            Some(certificate(Some(now + Duration::days(30)), true)),
            now,
        );
        assert!(valid.is_valid);
        assert_eq!(valid.outcome, VerificationOutcome::Valid);
        assert!(valid.error.is_none());

        let no_expiry = CertificateVerification::classify(Some(certificate(None, true)), now);
        assert!(no_expiry.is_valid);

        let expired = CertificateVerification::classify(
            Some(certificate(Some(now - Duration::days(1)), true)),
            now,
        );
        assert!(!expired.is_valid);
        assert_eq!(expired.error.as_deref(), Some(CERTIFICATE_EXPIRED));
        assert!(expired.certificate.is_some());

        let unverified = CertificateVerification::classify(Some(certificate(None, false)), now);
        assert_eq!(unverified.outcome, VerificationOutcome::Unverified);
        assert_eq!(unverified.error.as_deref(), Some(CERTIFICATE_UNVERIFIED));

        let missing = CertificateVerification::classify(None, now);
        assert_eq!(missing.outcome, VerificationOutcome::NotFound);
        assert_eq!(missing.error.as_deref(), Some(CERTIFICATE_NOT_FOUND));
        assert!(missing.certificate.is_none());
    }

    #[test]
    fn test_expired_wins_over_unverified() {
        let now = Utc::now();
        let result = CertificateVerification::classify(
            Some(certificate(Some(now - Duration::hours(1)), false)),
            now,
        );
        assert_eq!(result.outcome, VerificationOutcome::Expired);
    }

    #[test]
    fn test_calendar_date_expiry() {
        let cert = WorkshopCertificate {
            valid_until: Some("2020-01-01".to_string()),
            is_verified: true,
            ..Default::default()
        };
        assert!(cert.is_expired_at(Utc::now()));
    }
}
