use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Identity;

#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub nickname: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("nickname", &self.nickname)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of a successful login or signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub access_token: String,
    pub user: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub user: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub per_page: u32,
}

/// Number of pages needed for `total` items at `per_page` items each.
///
/// An empty collection has zero pages.
pub fn page_count(total: u32, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

/// One page of a paginated resource.
///
/// List routes name the item array after the resource (`posts`, `comments`,
/// `users`); all of them land in `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPage<T> {
    #[serde(
        default = "Vec::new",
        alias = "posts",
        alias = "comments",
        alias = "users"
    )]
    pub items: Vec<T>,
    pub total: u32,
    pub pages: u32,
    pub current_page: u32,
    pub per_page: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> ListPage<T> {
    /// Builds a page with metadata derived from `total`, `current_page` and
    /// `per_page`.
    pub fn new(items: Vec<T>, total: u32, current_page: u32, per_page: u32) -> Self {
        let pages = page_count(total, per_page);
        Self {
            items,
            total,
            pages,
            current_page,
            per_page,
            has_next: current_page < pages,
            has_prev: current_page > 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
