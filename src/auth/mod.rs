//! Admin authentication.
//!
//! [`AuthClient`] is the auth handle of one backend connection. It publishes
//! the auth state on a `watch` channel: it starts as
//! [`AuthState::Initializing`] while a persisted session is restored, then
//! settles to signed-in or signed-out. Anything that needs a definitive
//! answer (the admin route guard) waits for the state to settle first.
//!
//! The browser side of a session is an opaque random token kept in a
//! cookie; only its SHA-256 digest is stored with the signed-in user.

pub mod firebase;
pub mod static_auth;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::BackendError;

pub use firebase::FirebaseAuth;
pub use static_auth::StaticAuth;

/// Refresh the ID token when it expires within this many seconds
const REFRESH_MARGIN_SECS: i64 = 60;

/// Tokens returned by a successful sign-in or refresh
#[derive(Debug, Clone)]
pub struct Credentials {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    /// Seconds until `id_token` expires
    pub expires_in: i64,
}

/// Identity service of the backend
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credentials, BackendError>;
    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, BackendError>;
}

/// The signed-in admin
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
    id_token: String,
    refresh_token: String,
    session_digest: String,
}

impl AuthUser {
    fn from_credentials(credentials: Credentials, email: Option<String>, session_digest: String) -> Self {
        Self {
            uid: credentials.uid,
            email: credentials.email.or(email),
            expires_at: Utc::now() + chrono::Duration::seconds(credentials.expires_in),
            id_token: credentials.id_token,
            refresh_token: credentials.refresh_token,
            session_digest,
        }
    }

    /// True when `token` is the browser token issued at sign-in
    pub fn owns_session(&self, token: &str) -> bool {
        session_digest(token) == self.session_digest
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// Persisted session not yet restored
    Initializing,
    SignedOut,
    SignedIn(AuthUser),
}

impl AuthState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, AuthState::Initializing)
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}

/// Session persisted across restarts
#[derive(Debug, Serialize, Deserialize)]
struct SavedSession {
    uid: String,
    email: Option<String>,
    refresh_token: String,
    session_digest: String,
}

pub struct AuthClient {
    provider: Arc<dyn AuthProvider>,
    state: watch::Sender<AuthState>,
    session_path: PathBuf,
}

impl AuthClient {
    /// Create the handle and start restoring the saved session.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(provider: Arc<dyn AuthProvider>, session_path: PathBuf) -> Arc<Self> {
        let (state, _) = watch::channel(AuthState::Initializing);
        let client = Arc::new(Self {
            provider,
            state,
            session_path,
        });

        let restoring = client.clone();
        tokio::spawn(async move {
            restoring.restore().await;
        });

        client
    }

    /// Receiver for auth state changes
    pub fn on_auth_state_changed(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Wait until the initial session restore has finished
    pub async fn settled(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(AuthState::is_settled).await;
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().user().cloned()
    }

    /// Sign in and return the browser session token.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<String, BackendError> {
        let credentials = self.provider.sign_in(email, password).await?;
        let token = new_session_token();
        let user = AuthUser::from_credentials(
            credentials,
            Some(email.to_string()),
            session_digest(&token),
        );

        self.save_session(&user).await;
        info!("Admin signed in: {}", user.email.as_deref().unwrap_or(&user.uid));
        self.state.send_replace(AuthState::SignedIn(user));
        Ok(token)
    }

    pub async fn sign_out(&self) {
        match tokio::fs::remove_file(&self.session_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove saved session: {}", e),
        }
        if self.state.send_replace(AuthState::SignedOut).user().is_some() {
            info!("Admin signed out");
        }
    }

    /// ID token for database requests, refreshed when close to expiry.
    /// `None` when nobody is signed in.
    pub async fn id_token(&self) -> Result<Option<String>, BackendError> {
        let Some(user) = self.current_user() else {
            return Ok(None);
        };
        if user.expires_at - Utc::now() > chrono::Duration::seconds(REFRESH_MARGIN_SECS) {
            return Ok(Some(user.id_token));
        }

        debug!("Refreshing ID token for {}", user.uid);
        let credentials = self.provider.refresh(&user.refresh_token).await?;
        let refreshed =
            AuthUser::from_credentials(credentials, user.email.clone(), user.session_digest.clone());
        let token = refreshed.id_token.clone();

        self.save_session(&refreshed).await;
        self.state.send_if_modified(|state| match state {
            AuthState::SignedIn(current) if current.uid == refreshed.uid => {
                *current = refreshed;
                true
            }
            _ => false,
        });
        Ok(Some(token))
    }

    async fn restore(&self) {
        let next = match self.load_session().await {
            Some(saved) => match self.provider.refresh(&saved.refresh_token).await {
                Ok(credentials) => {
                    let user =
                        AuthUser::from_credentials(credentials, saved.email, saved.session_digest);
                    info!("Restored admin session for {}", user.uid);
                    AuthState::SignedIn(user)
                }
                Err(e) => {
                    warn!("Could not restore admin session: {}", e);
                    AuthState::SignedOut
                }
            },
            None => AuthState::SignedOut,
        };

        // A sign-in that completed while restoring takes precedence
        self.state.send_if_modified(|state| {
            if state.is_settled() {
                return false;
            }
            *state = next;
            true
        });
    }

    async fn load_session(&self) -> Option<SavedSession> {
        let content = match tokio::fs::read_to_string(&self.session_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read saved session: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(saved) => Some(saved),
            Err(e) => {
                warn!("Failed to parse saved session: {}", e);
                None
            }
        }
    }

    async fn save_session(&self, user: &AuthUser) {
        let saved = SavedSession {
            uid: user.uid.clone(),
            email: user.email.clone(),
            refresh_token: user.refresh_token.clone(),
            session_digest: user.session_digest.clone(),
        };
        if let Err(e) = self.write_session(&saved).await {
            warn!("Failed to save session: {}", e);
        }
    }

    async fn write_session(&self, saved: &SavedSession) -> Result<(), BackendError> {
        if let Some(parent) = self.session_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(saved)?;
        tokio::fs::write(&self.session_path, json).await?;
        Ok(())
    }
}

fn new_session_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

fn session_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
