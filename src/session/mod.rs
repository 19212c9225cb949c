//! Session Guard.
//!
//! Verifies the stored token of one role before a protected view loads:
//! - no token: `Unauthenticated`, no request is sent
//! - token: `GET {apiBase}/check-login`, then hydrate, clear, or leave alone
//!
//! Only the guard (and login/logout) ever write the token and profile keys.

mod role;

pub use role::Role;

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{endpoints, validation, ApiClient, ApiError, ApiRequest, Scope};
use crate::models::{LoginRequest, LoginResponse, UserProfile};
use crate::storage::{KeyValueStore, StorageError};

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub profile: UserProfile,
}

/// Why a session check could not produce `Authenticated`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not reach the server: {0}")]
    NetworkError(String),

    #[error("token rejected: {0}")]
    InvalidToken(String),

    #[error("server error {status}")]
    ServerError { status: u16 },

    #[error("malformed check-login response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ApiError> for SessionError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(msg) => SessionError::NetworkError(msg),
            ApiError::Timeout(after) => {
                SessionError::NetworkError(format!("timed out after {:?}", after))
            }
            ApiError::MissingToken => SessionError::InvalidToken("no token".to_string()),
            ApiError::InvalidToken { message } | ApiError::Rejected { message, .. } => {
                SessionError::InvalidToken(message)
            }
            ApiError::Server { status, .. } => SessionError::ServerError { status },
            ApiError::Malformed(msg) => SessionError::MalformedResponse(msg),
            ApiError::Validation(v) => SessionError::MalformedResponse(v.to_string()),
        }
    }
}

#[derive(Debug)]
pub enum SessionResult {
    Authenticated(Session),
    /// Caller must navigate to `login_route`. `reason` is `None` when no
    /// token was stored at all.
    Unauthenticated {
        login_route: &'static str,
        reason: Option<SessionError>,
    },
    /// The server could not be asked. Storage is untouched and the user stays
    /// on the current page.
    Indeterminate(SessionError),
}

impl SessionResult {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionResult::Authenticated(s) => Some(s),
            _ => None,
        }
    }

    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            SessionResult::Unauthenticated { login_route, .. } => Some(login_route),
            _ => None,
        }
    }
}

/// Role-namespaced view over a [`KeyValueStore`]: `token{Role}` holds the
/// bearer token, `data{Role}` the cached profile JSON.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    role: Role,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, role: Role) -> Self {
        Self { store, role }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn token(&self) -> Result<Option<String>, StorageError> {
        Ok(self
            .store
            .get(&self.role.token_key())?
            .filter(|t| !t.trim().is_empty()))
    }

    /// Cached profile; an unreadable cache is treated as absent.
    pub fn profile(&self) -> Option<UserProfile> {
        let raw = match self.store.get(&self.role.data_key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(role = %self.role, error = %e, "Failed to read cached profile");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(role = %self.role, error = %e, "Cached profile is not valid JSON");
                None
            }
        }
    }

    pub fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        // UserProfile is plain data; serializing it cannot fail.
        let raw = serde_json::to_string(profile).unwrap_or_else(|_| "{}".to_string());
        self.store.set(&self.role.data_key(), &raw)
    }

    pub fn save(&self, token: &str, profile: &UserProfile) -> Result<(), StorageError> {
        self.store.set(&self.role.token_key(), token)?;
        self.save_profile(profile)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(&self.role.token_key())?;
        self.store.remove(&self.role.data_key())
    }
}

pub struct SessionGuard {
    client: ApiClient,
    store: SessionStore,
}

impl SessionGuard {
    pub fn new(client: ApiClient, storage: Arc<dyn KeyValueStore>, role: Role) -> Self {
        Self {
            client,
            store: SessionStore::new(storage, role),
        }
    }

    pub fn role(&self) -> Role {
        self.store.role()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// The bearer token for authenticated calls, or `MissingToken` so the
    /// caller redirects without touching the network.
    pub fn token(&self) -> Result<String, ApiError> {
        match self.store.token() {
            Ok(Some(token)) => Ok(token),
            Ok(None) => Err(ApiError::MissingToken),
            Err(e) => {
                warn!(role = %self.role(), error = %e, "Failed to read session token");
                Err(ApiError::MissingToken)
            }
        }
    }

    /// Check the stored session. Safe to call on every mount.
    pub async fn check(&self) -> SessionResult {
        let role = self.role();
        let token = match self.store.token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!(%role, "No stored token");
                return SessionResult::Unauthenticated {
                    login_route: role.login_route(),
                    reason: None,
                };
            }
            Err(e) => return SessionResult::Indeterminate(e.into()),
        };

        let request = ApiRequest::get(Scope::Role(role), endpoints::CHECK_LOGIN).bearer(&token);
        match self.client.send::<UserProfile>(request).await {
            Ok(response) => {
                let profile = match response.data {
                    Some(profile) => {
                        if let Err(e) = self.store.save_profile(&profile) {
                            warn!(%role, error = %e, "Failed to refresh cached profile");
                        }
                        profile
                    }
                    None => self.store.profile().unwrap_or_default(),
                };
                SessionResult::Authenticated(Session {
                    token,
                    role,
                    profile,
                })
            }
            Err(err @ ApiError::InvalidToken { .. })
            | Err(err @ ApiError::Rejected { status: 0..=499, .. }) => {
                info!(%role, "Stored session rejected, clearing");
                if let Err(e) = self.store.clear() {
                    warn!(%role, error = %e, "Failed to clear rejected session");
                }
                SessionResult::Unauthenticated {
                    login_route: role.login_route(),
                    reason: Some(err.into()),
                }
            }
            Err(err) => {
                warn!(%role, error = %err, "Session check inconclusive, keeping stored session");
                SessionResult::Indeterminate(err.into())
            }
        }
    }

    /// `POST /login`; on success both keys of this role are written.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let credentials = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        validation::validate_login(&credentials)?;

        let role = self.role();
        let request = ApiRequest::post(Scope::Role(role), endpoints::LOGIN).json(&credentials)?;
        let login: LoginResponse = self.client.send(request).await?.require_data()?;

        if let Err(e) = self.store.save(&login.token, &login.user) {
            warn!(%role, error = %e, "Failed to persist session");
        }
        info!(%role, user = login.user.display_name(), "Signed in");

        Ok(Session {
            token: login.token,
            role,
            profile: login.user,
        })
    }

    /// Forget this role's session. Other roles are untouched.
    pub fn logout(&self) -> Result<(), StorageError> {
        info!(role = %self.role(), "Signing out");
        self.store.clear()
    }
}
