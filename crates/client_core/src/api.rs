//! Collaborator seams between the session/list components and the network.

use async_trait::async_trait;
use shared::{
    domain::Identity,
    protocol::{AuthResponse, ListPage, LoginRequest, SignupRequest},
};

use crate::error::RequestError;

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, RequestError>;
    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, RequestError>;
    async fn current_user(&self, token: &str) -> Result<Identity, RequestError>;
    /// Exchanges a still-valid token for a fresh one.
    async fn refresh_token(&self, token: &str) -> Result<String, RequestError>;
}

/// Source of one page of a paginated resource.
#[async_trait]
pub trait ListApi<T>: Send + Sync {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<ListPage<T>, RequestError>;
}
