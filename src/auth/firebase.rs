//! Email/password sign-in against the hosted identity REST API.
//!
//! - `POST {identity}/v1/accounts:signInWithPassword?key=API_KEY`
//! - `POST {securetoken}/v1/token?key=API_KEY` (refresh)

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{AuthProvider, Credentials};
use crate::backend::BackendError;

const IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com";

pub struct FirebaseAuth {
    http: Client,
    api_key: String,
    identity_url: String,
    token_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    user_id: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseAuth {
    pub fn new(api_key: impl Into<String>) -> Result<Self, BackendError> {
        Self::with_endpoints(api_key, IDENTITY_URL, SECURE_TOKEN_URL)
    }

    /// Point at other endpoints (local emulator)
    pub fn with_endpoints(
        api_key: impl Into<String>,
        identity_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            identity_url: identity_url.into(),
            token_url: token_url.into(),
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = request.query(&[("key", &self.api_key)]).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Error payloads look like {"error": {"message": "INVALID_PASSWORD", ...}}
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            return Err(BackendError::Auth(message));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

fn parse_expiry(expires_in: &str) -> i64 {
    expires_in.parse().unwrap_or(3600)
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credentials, BackendError> {
        let url = format!("{}/v1/accounts:signInWithPassword", self.identity_url);
        let request = self.http.post(url).json(&json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        }));
        let response: SignInResponse = self.send(request).await?;

        Ok(Credentials {
            uid: response.local_id,
            email: response.email,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_in: parse_expiry(&response.expires_in),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, BackendError> {
        let url = format!("{}/v1/token", self.token_url);
        let request = self.http.post(url).form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ]);
        let response: RefreshResponse = self.send(request).await?;

        Ok(Credentials {
            uid: response.user_id,
            email: None,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_in: parse_expiry(&response.expires_in),
        })
    }
}
