//! Supabase (GoTrue) identity provider over HTTP.
//!
//! Endpoints:
//! - `GET {url}/auth/v1/user` with the caller's token: token verification
//! - `GET {url}/auth/v1/admin/users?page=&per_page=`: user directory
//! - `GET {url}/auth/v1/admin/users/{id}`: single user lookup
//!
//! Admin calls authenticate with the service role key. A 4xx on the user
//! endpoint is a rejection of the caller's credential; anything else that is
//! not a success (5xx, transport errors, unreadable bodies, admin 4xx) means
//! the provider is unavailable.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use stockroom_auth::{IdentityProvider, ProviderError, ProviderRejection, ProviderUser};
use stockroom_core::UserId;

const ADMIN_PAGE_SIZE: usize = 200;

/// Error body shapes GoTrue has used across versions.
#[derive(Debug, Default, Deserialize)]
struct GoTrueError {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl GoTrueError {
    fn text(&self) -> String {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
            .unwrap_or("authentication failed")
            .to_string()
    }
}

#[derive(Debug, Deserialize)]
struct AdminUsersPage {
    #[serde(default)]
    users: Vec<ProviderUser>,
}

/// Map a GoTrue `error_code` to a structured rejection kind.
///
/// GoTrue reports expired access tokens as `bad_jwt`, with the expiry only in
/// the message, so that one code is refined by its text.
fn rejection_kind(error_code: Option<&str>, message: &str) -> Option<ProviderRejection> {
    match error_code? {
        "session_expired" => Some(ProviderRejection::ExpiredToken),
        "bad_jwt" if message.to_lowercase().contains("token is expired") => Some(ProviderRejection::ExpiredToken),
        "bad_jwt" | "no_authorization" => Some(ProviderRejection::InvalidToken),
        _ => Some(ProviderRejection::Other),
    }
}

#[derive(Debug, Clone)]
pub struct SupabaseIdentityProvider {
    base_url: String,
    service_role_key: String,
    http: Client,
}

impl SupabaseIdentityProvider {
    /// `request_timeout` bounds every HTTP call made by this client.
    pub fn new(
        base_url: impl Into<String>,
        service_role_key: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(request_timeout)
            .build()
            .map_err(|e| ProviderError::unavailable(format!("creating HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!("identity provider client initialized with base_url={base_url}");

        Ok(Self {
            base_url,
            service_role_key: service_role_key.into(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn admin_get(&self, path: &str) -> Result<Response, ProviderError> {
        self.http
            .get(self.url(path))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await
            .map_err(|e| ProviderError::unavailable(format!("GET {path}: {e}")))
    }
}

async fn read_json<T: DeserializeOwned>(response: Response, operation: &str) -> Result<T, ProviderError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::unavailable(format!("{operation}: unreadable response: {e}")))
}

async fn admin_failure(response: Response, operation: &str) -> ProviderError {
    let status = response.status();
    let body = response.json::<GoTrueError>().await.unwrap_or_default();
    warn!(%status, "identity provider refused {operation}: {}", body.text());
    ProviderError::unavailable(format!("{operation} failed with status {status}: {}", body.text()))
}

#[async_trait::async_trait]
impl IdentityProvider for SupabaseIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<ProviderUser, ProviderError> {
        let response = self
            .http
            .get(self.url("user"))
            .header("apikey", &self.service_role_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ProviderError::unavailable(format!("GET user: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return read_json(response, "verify_token").await;
        }

        if status.is_client_error() {
            let body = response.json::<GoTrueError>().await.unwrap_or_default();
            let message = body.text();
            return Err(ProviderError::rejected(
                rejection_kind(body.error_code.as_deref(), &message),
                message,
                Some(status.as_u16()),
            ));
        }

        Err(ProviderError::unavailable(format!("verify_token failed with status {status}")))
    }

    async fn list_users(&self) -> Result<Vec<ProviderUser>, ProviderError> {
        let mut users = Vec::new();
        let mut page = 1usize;

        loop {
            let response = self
                .admin_get(&format!("admin/users?page={page}&per_page={ADMIN_PAGE_SIZE}"))
                .await?;
            if !response.status().is_success() {
                return Err(admin_failure(response, "list_users").await);
            }

            let batch: AdminUsersPage = read_json(response, "list_users").await?;
            let fetched = batch.users.len();
            users.extend(batch.users);
            if fetched < ADMIN_PAGE_SIZE {
                break;
            }
            page += 1;
        }

        debug!(count = users.len(), "listed identity provider users");
        Ok(users)
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<ProviderUser>, ProviderError> {
        let response = self.admin_get(&format!("admin/users/{id}")).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => read_json(response, "get_user_by_id").await.map(Some),
            _ => Err(admin_failure(response, "get_user_by_id").await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_structured_kinds() {
        assert_eq!(
            rejection_kind(Some("bad_jwt"), "invalid JWT: unable to parse or verify signature"),
            Some(ProviderRejection::InvalidToken)
        );
        assert_eq!(
            rejection_kind(Some("bad_jwt"), "invalid JWT: token has invalid claims: token is expired"),
            Some(ProviderRejection::ExpiredToken)
        );
        assert_eq!(rejection_kind(Some("session_expired"), ""), Some(ProviderRejection::ExpiredToken));
        assert_eq!(rejection_kind(Some("session_not_found"), ""), Some(ProviderRejection::Other));
        assert_eq!(rejection_kind(None, "invalid JWT"), None);
    }

    #[test]
    fn error_body_text_prefers_msg() {
        let body: GoTrueError =
            serde_json::from_str(r#"{"code":401,"error_code":"bad_jwt","msg":"invalid JWT"}"#).unwrap();
        assert_eq!(body.text(), "invalid JWT");

        let legacy: GoTrueError =
            serde_json::from_str(r#"{"error":"invalid_grant","error_description":"Token expired"}"#).unwrap();
        assert_eq!(legacy.text(), "Token expired");
        assert_eq!(GoTrueError::default().text(), "authentication failed");
    }

    #[test]
    fn user_payload_ignores_extra_fields() {
        let id = UserId::new();
        let json = format!(r#"{{"id":"{id}","aud":"authenticated","email":"a@b.c","role":"authenticated"}}"#);
        let user: ProviderUser = serde_json::from_str(&json).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email.as_deref(), Some("a@b.c"));

        let page: AdminUsersPage = serde_json::from_str(&format!(r#"{{"users":[{json}],"aud":"x"}}"#)).unwrap();
        assert_eq!(page.users.len(), 1);
    }

    #[test]
    fn base_url_is_trimmed() {
        let provider = SupabaseIdentityProvider::new("https://x.supabase.co/", "k", Duration::from_secs(1)).unwrap();
        assert_eq!(provider.url("user"), "https://x.supabase.co/auth/v1/user");
    }
}
