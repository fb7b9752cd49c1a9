//! Who the current user is, kept in step with the API and the token slot.

use std::sync::Arc;

use shared::{
    domain::Identity,
    protocol::{AuthResponse, LoginRequest, SignupRequest},
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    api::AuthApi,
    error::{AuthError, SessionExpired},
    token_store::{token_ttl, TokenStore},
};

pub const LOGIN_FAILED: &str = "Login failed";
pub const SIGNUP_FAILED: &str = "Signup failed";
pub const TOKEN_REFRESH_FAILED: &str = "Token refresh failed";
pub const SESSION_EXPIRED: &str = "Session expired; please log in again";
pub const NOT_LOGGED_IN: &str = "Not logged in";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Startup has not looked at the token slot yet.
    Uninitialized,
    /// A stored token is being checked against the API.
    Loading,
    Authenticated(Identity),
    Anonymous,
}

impl SessionState {
    /// True until the store has decided whether a session exists.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Loading)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Session state plus a counter bumped on every login, signup and logout.
///
/// A refresh that started under an older generation is not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    state: SessionState,
    generation: u64,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            state: SessionState::Uninitialized,
            generation: 0,
        }
    }
}

impl SessionSnapshot {
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Startup found a token to verify.
    pub fn start_loading(&mut self) -> bool {
        if self.state != SessionState::Uninitialized {
            return false;
        }
        self.state = SessionState::Loading;
        true
    }

    /// Startup found no token.
    pub fn resolve_anonymous(&mut self) -> bool {
        if !self.state.is_loading() {
            return false;
        }
        self.state = SessionState::Anonymous;
        true
    }

    pub fn establish(&mut self, identity: Identity) {
        self.generation += 1;
        self.state = SessionState::Authenticated(identity);
    }

    pub fn clear(&mut self) {
        self.generation += 1;
        self.state = SessionState::Anonymous;
    }

    /// Applies a refresh started at `generation`; `None` is an implicit logout.
    pub fn apply_refresh(&mut self, generation: u64, identity: Option<Identity>) -> bool {
        if generation != self.generation {
            return false;
        }
        match identity {
            Some(identity) => self.state = SessionState::Authenticated(identity),
            None => self.clear(),
        }
        true
    }
}

/// Single source of truth for the signed-in user.
///
/// Create one per process and share it by `Arc`.
pub struct SessionStore {
    auth: Arc<dyn AuthApi>,
    tokens: Arc<dyn TokenStore>,
    /// Held across every token-slot write and the state change that goes
    /// with it, so a slot write and its generation bump are observed together.
    slot: Mutex<()>,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    pub fn new(auth: Arc<dyn AuthApi>, tokens: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            auth,
            tokens,
            slot: Mutex::new(()),
            state,
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().state.clone()
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.state.borrow().state.identity().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().state.is_loading()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Token to attach as a bearer credential, read through the slot so the
    /// latest write or delete is always observed.
    pub async fn bearer_token(&self) -> Option<String> {
        match self.tokens.get().await {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "failed to read credential token");
                None
            }
        }
    }

    /// Startup: verify a stored token if there is one, otherwise settle on
    /// anonymous straight away.
    pub async fn initialize(&self) {
        if self.bearer_token().await.is_none() {
            self.state.send_if_modified(SessionSnapshot::resolve_anonymous);
            debug!("no stored credential token; session is anonymous");
            return;
        }
        self.state.send_if_modified(SessionSnapshot::start_loading);
        self.refresh_user().await;
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.auth.login(&request).await.map_err(|err| {
            warn!(error = %err, "login rejected");
            AuthError::from_request(&err, LOGIN_FAILED)
        })?;
        self.establish(response, LOGIN_FAILED).await
    }

    pub async fn signup(
        &self,
        nickname: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let request = SignupRequest {
            nickname: nickname.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.auth.signup(&request).await.map_err(|err| {
            warn!(error = %err, "signup rejected");
            AuthError::from_request(&err, SIGNUP_FAILED)
        })?;
        self.establish(response, SIGNUP_FAILED).await
    }

    async fn establish(
        &self,
        response: AuthResponse,
        fallback: &str,
    ) -> Result<Identity, AuthError> {
        let _slot = self.slot.lock().await;
        self.tokens
            .set(&response.access_token, token_ttl())
            .await
            .map_err(|err| {
                error!(error = %err, "failed to persist credential token");
                AuthError::new(fallback)
            })?;
        let identity = response.user;
        self.state
            .send_modify(|snapshot| snapshot.establish(identity.clone()));
        info!(user_id = identity.id.0, nickname = %identity.nickname, "session established");
        Ok(identity)
    }

    /// Deletes the token and forgets the user. Storage failures are logged.
    pub async fn logout(&self) {
        let _slot = self.slot.lock().await;
        self.remove_token().await;
        self.state.send_modify(SessionSnapshot::clear);
        info!("session cleared");
    }

    /// Callers hold `slot`.
    async fn remove_token(&self) {
        if let Err(err) = self.tokens.remove().await {
            warn!(error = %err, "failed to delete credential token");
        }
    }

    /// Re-reads the current user with the stored token. Any failure logs the
    /// session out; the store is never left loading.
    pub async fn refresh_user(&self) {
        let generation = self.state.borrow().generation;
        match self.fetch_identity().await {
            Ok(identity) => {
                let applied = self
                    .state
                    .send_if_modified(|snapshot| snapshot.apply_refresh(generation, Some(identity)));
                if applied {
                    debug!("session identity refreshed");
                } else {
                    debug!("discarding refresh superseded by a newer session");
                }
            }
            Err(expired) => {
                let _slot = self.slot.lock().await;
                let superseded = self.state.borrow().generation != generation;
                if superseded {
                    debug!(reason = %expired, "discarding failed refresh superseded by a newer session");
                    return;
                }
                warn!(reason = %expired, "stored session is no longer valid; logging out");
                self.remove_token().await;
                self.state
                    .send_if_modified(|snapshot| snapshot.apply_refresh(generation, None));
            }
        }
    }

    async fn fetch_identity(&self) -> Result<Identity, SessionExpired> {
        let token = self
            .tokens
            .get()
            .await
            .map_err(SessionExpired::Storage)?
            .ok_or(SessionExpired::MissingToken)?;
        self.auth
            .current_user(&token)
            .await
            .map_err(SessionExpired::Rejected)
    }

    /// Swaps the stored token for a fresh one with a new TTL.
    ///
    /// A token the API no longer accepts logs the session out. A renewal that
    /// finishes after a login, signup or logout leaves the slot alone.
    pub async fn renew_token(&self) -> Result<(), AuthError> {
        let generation = self.state.borrow().generation;
        let token = self
            .bearer_token()
            .await
            .ok_or_else(|| AuthError::new(NOT_LOGGED_IN))?;
        let outcome = self.auth.refresh_token(&token).await;

        let _slot = self.slot.lock().await;
        let superseded = self.state.borrow().generation != generation;
        if superseded {
            debug!("discarding token renewal superseded by a newer session");
            return Err(AuthError::new(TOKEN_REFRESH_FAILED));
        }
        match outcome {
            Ok(fresh) => {
                self.tokens.set(&fresh, token_ttl()).await.map_err(|err| {
                    error!(error = %err, "failed to persist renewed credential token");
                    AuthError::new(TOKEN_REFRESH_FAILED)
                })?;
                info!("credential token renewed");
                Ok(())
            }
            Err(err) if err.is_unauthorized() => {
                warn!(error = %err, "token renewal rejected; logging out");
                self.remove_token().await;
                self.state.send_modify(SessionSnapshot::clear);
                Err(AuthError::new(SESSION_EXPIRED))
            }
            Err(err) => {
                warn!(error = %err, "token renewal failed");
                Err(AuthError::from_request(&err, TOKEN_REFRESH_FAILED))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
