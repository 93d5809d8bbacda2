//! The credential: a strategy's acquired output, with freshness tracking.

use std::time::{Duration, SystemTime};

/// Margin subtracted from a credential's reported expiry before it is
/// treated as stale. Refresh is triggered ahead of the hard deadline so an
/// in-flight request never races an upstream 401.
pub const EXPIRY_SKEW: Duration = Duration::from_secs(5 * 60);

/// An acquired credential, ready to sign or attach to an outbound request.
#[derive(Debug, Clone)]
pub enum Credential {
    /// AWS SigV4 material (static keys or an assumed-role session).
    Aws {
        /// Access key id.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Session token, present for temporary (assumed-role) credentials.
        session_token: Option<String>,
        /// Expiry, if the issuing strategy reported one.
        expires_at: Option<SystemTime>,
    },
    /// An Azure AD bearer token.
    AzureToken {
        /// The bearer token value.
        token: String,
        /// Expiry reported by Azure AD.
        expires_at: SystemTime,
    },
    /// A GCP OAuth2 access token.
    GcpToken {
        /// The bearer token value.
        token: String,
        /// Expiry reported by the token endpoint.
        expires_at: SystemTime,
    },
    /// A bearer/API key (OpenAI, Anthropic, IBM, Oracle API-key auth,
    /// mounted secrets, cloud secret-store payloads). Expiry is absent for
    /// mounted/static values and present when the issuing store advertises
    /// a lease or a default freshness window.
    ApiKey {
        /// The key value.
        key: String,
        /// Expiry, if the issuing strategy reported or defaulted one.
        expires_at: Option<SystemTime>,
    },
}

impl Credential {
    /// Whether this credential is fresh enough to use right now, applying
    /// [`EXPIRY_SKEW`] to any reported expiry. Credentials without an
    /// expiry (API keys, and AWS credentials whose strategy didn't report
    /// one) are always fresh.
    #[must_use]
    pub fn is_fresh(&self, now: SystemTime) -> bool {
        match self.expires_at() {
            Some(expires_at) => match expires_at.checked_sub(EXPIRY_SKEW) {
                Some(deadline) => now < deadline,
                None => false,
            },
            None => true,
        }
    }

    /// The reported expiry, if any.
    #[must_use]
    pub fn expires_at(&self) -> Option<SystemTime> {
        match self {
            Self::Aws { expires_at, .. } => *expires_at,
            Self::AzureToken { expires_at, .. } | Self::GcpToken { expires_at, .. } => {
                Some(*expires_at)
            }
            Self::ApiKey { expires_at, .. } => *expires_at,
        }
    }

    /// A short tag identifying the credential kind, for metrics labels.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Aws { .. } => "aws",
            Self::AzureToken { .. } => "azure_token",
            Self::GcpToken { .. } => "gcp_token",
            Self::ApiKey { .. } => "api_key",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_without_expiry_is_always_fresh() {
        let cred = Credential::ApiKey {
            key: "sk-test".into(),
            expires_at: None,
        };
        assert!(cred.is_fresh(SystemTime::now()));
    }

    #[test]
    fn api_key_with_expiry_honors_skew() {
        let now = SystemTime::now();
        let cred = Credential::ApiKey {
            key: "sk-test".into(),
            expires_at: Some(now + Duration::from_secs(60)),
        };
        assert!(!cred.is_fresh(now));
    }

    #[test]
    fn token_within_skew_window_is_stale() {
        let now = SystemTime::now();
        let cred = Credential::GcpToken {
            token: "tok".into(),
            expires_at: now + Duration::from_secs(60),
        };
        assert!(!cred.is_fresh(now));
    }

    #[test]
    fn token_well_before_expiry_is_fresh() {
        let now = SystemTime::now();
        let cred = Credential::AzureToken {
            token: "tok".into(),
            expires_at: now + Duration::from_secs(3600),
        };
        assert!(cred.is_fresh(now));
    }

    #[test]
    fn aws_credential_without_expiry_is_always_fresh() {
        let cred = Credential::Aws {
            access_key_id: "AKIA".into(),
            secret_access_key: "secret".into(),
            session_token: None,
            expires_at: None,
        };
        assert!(cred.is_fresh(SystemTime::now()));
    }
}
