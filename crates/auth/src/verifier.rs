//! Identity verification against an external provider.
//!
//! Every request performs a full provider round-trip; nothing is cached, so a
//! revoked credential stops working immediately.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_core::UserId;

use crate::{extract_bearer, Principal};

/// User record as returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Structured reason a provider gives when it rejects a credential.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProviderRejection {
    InvalidToken,
    ExpiredToken,
    Other,
}

/// Error surface of an identity provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider looked at the credential and refused it.
    ///
    /// `kind` is `None` when the provider did not say why; classification then
    /// falls back to the message text.
    #[error("credential rejected (status {status:?}): {message}")]
    Rejected {
        kind: Option<ProviderRejection>,
        message: String,
        status: Option<u16>,
    },

    /// Transport failure, provider-side error or an unparseable response.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    pub fn rejected(kind: Option<ProviderRejection>, message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Rejected {
            kind,
            message: message.into(),
            status,
        }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// External identity service (token verification and user directory).
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange a raw token for the user it was issued to.
    async fn verify_token(&self, token: &str) -> Result<ProviderUser, ProviderError>;

    /// Every user known to the provider.
    async fn list_users(&self) -> Result<Vec<ProviderUser>, ProviderError>;

    /// Look a single user up; `Ok(None)` means the provider does not know the id.
    async fn get_user_by_id(&self, id: UserId) -> Result<Option<ProviderUser>, ProviderError>;
}

#[async_trait::async_trait]
impl<P> IdentityProvider for Arc<P>
where
    P: IdentityProvider + ?Sized,
{
    async fn verify_token(&self, token: &str) -> Result<ProviderUser, ProviderError> {
        (**self).verify_token(token).await
    }

    async fn list_users(&self) -> Result<Vec<ProviderUser>, ProviderError> {
        (**self).list_users().await
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<ProviderUser>, ProviderError> {
        (**self).get_user_by_id(id).await
    }
}

/// Subtype of a refused credential.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidCredentialKind {
    Expired,
    Invalid,
    /// Refused for a reason the provider did not make recognisable.
    Generic,
}

impl InvalidCredentialKind {
    pub fn message(&self) -> &'static str {
        match self {
            InvalidCredentialKind::Expired => "token has expired",
            InvalidCredentialKind::Invalid => "invalid token provided",
            InvalidCredentialKind::Generic => "authentication failed",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    #[error("{}", .0.message())]
    InvalidCredential(InvalidCredentialKind),

    #[error("identity verifier unavailable: {0}")]
    VerifierUnavailable(String),
}

impl AuthError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedCredential(msg.into())
    }

    /// True for failures the client caused (surfaced as "unauthorized").
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AuthError::VerifierUnavailable(_))
    }
}

/// Classify a provider rejection.
///
/// The structured kind wins. Substring matching on the message is a degraded
/// mode for providers that only send free text; it is order-sensitive
/// ("invalid" is checked before "expired").
pub fn classify_rejection(kind: Option<ProviderRejection>, message: &str) -> InvalidCredentialKind {
    match kind {
        Some(ProviderRejection::InvalidToken) => InvalidCredentialKind::Invalid,
        Some(ProviderRejection::ExpiredToken) => InvalidCredentialKind::Expired,
        Some(ProviderRejection::Other) => InvalidCredentialKind::Generic,
        None => {
            let message = message.to_lowercase();
            if message.contains("invalid") {
                InvalidCredentialKind::Invalid
            } else if message.contains("expired") {
                InvalidCredentialKind::Expired
            } else {
                InvalidCredentialKind::Generic
            }
        }
    }
}

/// Exchanges bearer credentials for verified principals.
#[derive(Clone)]
pub struct IdentityVerifier {
    provider: Arc<dyn IdentityProvider>,
    deadline: Duration,
}

impl IdentityVerifier {
    pub fn new(provider: Arc<dyn IdentityProvider>, deadline: Duration) -> Self {
        Self { provider, deadline }
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Verify a raw `Authorization` header value.
    ///
    /// Malformed headers fail before the provider is contacted.
    pub async fn verify(&self, header: Option<&str>) -> Result<Principal, AuthError> {
        let token = extract_bearer(header).inspect_err(|e| tracing::warn!("rejecting request: {e}"))?;
        self.verify_token(token).await
    }

    /// Verify an already extracted token, bounded by the configured deadline.
    pub async fn verify_token(&self, token: &str) -> Result<Principal, AuthError> {
        let outcome = tokio::time::timeout(self.deadline, self.provider.verify_token(token)).await;

        match outcome {
            Err(_) => {
                tracing::error!(deadline_ms = self.deadline.as_millis() as u64, "identity provider timed out");
                Err(AuthError::VerifierUnavailable("identity provider deadline exceeded".to_string()))
            }
            Ok(Ok(user)) => {
                tracing::info!(
                    user_id = %user.id,
                    email = user.email.as_deref().unwrap_or("no email"),
                    "token validated"
                );
                Ok(Principal::new(user.id, user.email))
            }
            Ok(Err(ProviderError::Rejected { kind, message, status })) => {
                tracing::warn!(?status, "token validation failed: {message}");
                Err(AuthError::InvalidCredential(classify_rejection(kind, &message)))
            }
            Ok(Err(ProviderError::Unavailable(msg))) => {
                tracing::error!("unexpected error during token validation: {msg}");
                Err(AuthError::VerifierUnavailable(msg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        calls: AtomicUsize,
        reply: Result<ProviderUser, ProviderError>,
        delay: Option<Duration>,
    }

    impl StubProvider {
        fn replying(reply: Result<ProviderUser, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply,
                delay: None,
            })
        }
    }

    #[async_trait::async_trait]
    impl IdentityProvider for StubProvider {
        async fn verify_token(&self, _token: &str) -> Result<ProviderUser, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply.clone()
        }

        async fn list_users(&self) -> Result<Vec<ProviderUser>, ProviderError> {
            Ok(vec![])
        }

        async fn get_user_by_id(&self, _id: UserId) -> Result<Option<ProviderUser>, ProviderError> {
            Ok(None)
        }
    }

    fn verifier(provider: Arc<StubProvider>) -> IdentityVerifier {
        IdentityVerifier::new(provider, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn valid_token_yields_principal() {
        let id = UserId::new();
        let provider = StubProvider::replying(Ok(ProviderUser {
            id,
            email: Some("alice@example.com".to_string()),
        }));

        let principal = verifier(provider.clone()).verify(Some("Bearer good")).await.unwrap();
        assert_eq!(principal.id, id);
        assert_eq!(principal.email.as_deref(), Some("alice@example.com"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn wrong_scheme_never_reaches_provider() {
        let provider = StubProvider::replying(Ok(ProviderUser { id: UserId::new(), email: None }));

        let err = verifier(provider.clone()).verify(Some("Basic xyz")).await.unwrap_err();
        assert!(matches!(err, AuthError::MalformedCredential(_)));
        assert!(err.is_client_error());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn structured_rejection_wins_over_message() {
        let provider = StubProvider::replying(Err(ProviderError::rejected(
            Some(ProviderRejection::ExpiredToken),
            "invalid JWT",
            Some(401),
        )));

        let err = verifier(provider).verify(Some("Bearer old")).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredential(InvalidCredentialKind::Expired));
        assert_eq!(err.to_string(), "token has expired");
    }

    #[tokio::test]
    async fn unstructured_rejection_uses_message_heuristic() {
        let provider = StubProvider::replying(Err(ProviderError::rejected(None, "JWT expired", Some(401))));
        let err = verifier(provider).verify(Some("Bearer old")).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredential(InvalidCredentialKind::Expired));
    }

    #[test]
    fn heuristic_fallbacks() {
        assert_eq!(classify_rejection(None, "Invalid JWT"), InvalidCredentialKind::Invalid);
        assert_eq!(classify_rejection(None, "jwt EXPIRED"), InvalidCredentialKind::Expired);
        assert_eq!(classify_rejection(None, "user banned"), InvalidCredentialKind::Generic);
        assert_eq!(
            classify_rejection(Some(ProviderRejection::Other), "invalid"),
            InvalidCredentialKind::Generic
        );
    }

    #[tokio::test]
    async fn provider_failure_is_unavailable() {
        let provider = StubProvider::replying(Err(ProviderError::unavailable("connection refused")));
        let err = verifier(provider).verify(Some("Bearer t")).await.unwrap_err();
        assert!(matches!(err, AuthError::VerifierUnavailable(_)));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn stalled_provider_hits_deadline() {
        let provider = Arc::new(StubProvider {
            calls: AtomicUsize::new(0),
            reply: Ok(ProviderUser { id: UserId::new(), email: None }),
            delay: Some(Duration::from_secs(5)),
        });
        let verifier = IdentityVerifier::new(provider, Duration::from_millis(20));

        let err = verifier.verify(Some("Bearer slow")).await.unwrap_err();
        assert!(matches!(err, AuthError::VerifierUnavailable(_)));
    }
}
