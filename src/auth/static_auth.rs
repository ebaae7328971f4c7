//! Fixed credential table for the in-process backend.

use async_trait::async_trait;
use std::collections::HashMap;

use super::{AuthProvider, Credentials};
use crate::backend::BackendError;

const REFRESH_PREFIX: &str = "local-refresh:";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Accepts the configured email/password pairs and nothing else.
pub struct StaticAuth {
    users: HashMap<String, String>,
}

impl StaticAuth {
    pub fn new(users: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            users: users.into_iter().collect(),
        }
    }

    fn credentials(email: &str) -> Credentials {
        Credentials {
            uid: format!("local:{}", email),
            email: Some(email.to_string()),
            id_token: format!("local-id:{}", email),
            refresh_token: format!("{}{}", REFRESH_PREFIX, email),
            expires_in: TOKEN_LIFETIME_SECS,
        }
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credentials, BackendError> {
        match self.users.get(email) {
            Some(expected) if expected == password => Ok(Self::credentials(email)),
            _ => Err(BackendError::Auth("INVALID_LOGIN_CREDENTIALS".to_string())),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, BackendError> {
        refresh_token
            .strip_prefix(REFRESH_PREFIX)
            .filter(|email| self.users.contains_key(*email))
            .map(Self::credentials)
            .ok_or_else(|| BackendError::Auth("INVALID_REFRESH_TOKEN".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refresh_requires_known_user() {
        let auth = StaticAuth::new([("a@b.cl".to_string(), "pw".to_string())]);
        let credentials = auth.sign_in("a@b.cl", "pw").await.unwrap();
        assert!(auth.refresh(&credentials.refresh_token).await.is_ok());
        assert!(auth.refresh("local-refresh:ghost@b.cl").await.is_err());
        assert!(auth.refresh("garbage").await.is_err());
    }
}
