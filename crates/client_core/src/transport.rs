//! reqwest-backed implementations of the API collaborators.

use std::{marker::PhantomData, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Comment, Identity, Post, PostId},
    error::ApiError,
    protocol::{
        AuthResponse, CurrentUserResponse, ListPage, LoginRequest, PageQuery, SignupRequest,
        TokenRefreshResponse,
    },
};
use tracing::debug;
use url::Url;

use crate::{
    api::{AuthApi, ListApi},
    error::RequestError,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the blog API rooted at `base_url` (e.g. `http://host:5000/api`).
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed =
            Url::parse(base_url).with_context(|| format!("invalid API base url '{base_url}'"))?;
        if parsed.cannot_be_a_base() {
            anyhow::bail!("API base url '{base_url}' cannot carry paths");
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            base: parsed,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    fn segment_url<I>(&self, segments: I) -> Result<Url, RequestError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                RequestError::Transport(format!("base url '{}' cannot carry paths", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn posts(&self) -> HttpList<Post> {
        HttpList::new(self.clone(), ListResource::Posts)
    }

    pub fn search_posts(&self, query: impl Into<String>) -> HttpList<Post> {
        HttpList::new(
            self.clone(),
            ListResource::PostSearch {
                query: query.into(),
            },
        )
    }

    pub fn post_comments(&self, post_id: PostId) -> HttpList<Comment> {
        HttpList::new(self.clone(), ListResource::PostComments { post_id })
    }

    pub fn user_posts(&self, nickname: impl Into<String>) -> HttpList<Post> {
        HttpList::new(
            self.clone(),
            ListResource::UserPosts {
                nickname: nickname.into(),
            },
        )
    }

    pub fn search_users(&self, query: impl Into<String>) -> HttpList<Identity> {
        HttpList::new(
            self.clone(),
            ListResource::UserSearch {
                query: query.into(),
            },
        )
    }
}

async fn send_json<R: DeserializeOwned>(request: RequestBuilder) -> Result<R, RequestError> {
    let response = request.send().await?;
    decode_response(response).await
}

async fn decode_response<R: DeserializeOwned>(response: Response) -> Result<R, RequestError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RequestError::Rejected {
            status: status.as_u16(),
            message: ApiError::message_from_body(&body),
        });
    }
    response
        .json::<R>()
        .await
        .map_err(|err| RequestError::Decode(err.to_string()))
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, RequestError> {
        send_json(self.http.post(self.endpoint("/auth/login")).json(request)).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, RequestError> {
        send_json(self.http.post(self.endpoint("/auth/signup")).json(request)).await
    }

    async fn current_user(&self, token: &str) -> Result<Identity, RequestError> {
        let body: CurrentUserResponse =
            send_json(self.http.get(self.endpoint("/auth/me")).bearer_auth(token)).await?;
        Ok(body.user)
    }

    async fn refresh_token(&self, token: &str) -> Result<String, RequestError> {
        let body: TokenRefreshResponse =
            send_json(self.http.post(self.endpoint("/auth/refresh")).bearer_auth(token)).await?;
        Ok(body.access_token)
    }
}

/// Paginated collections exposed by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListResource {
    Posts,
    PostSearch { query: String },
    PostComments { post_id: PostId },
    UserPosts { nickname: String },
    UserSearch { query: String },
}

impl ListResource {
    /// Path below the API root, one unescaped entry per segment.
    fn segments(&self) -> Vec<String> {
        match self {
            Self::Posts => vec!["posts".into()],
            Self::PostSearch { .. } => vec!["posts".into(), "search".into()],
            Self::PostComments { post_id } => {
                vec!["comments".into(), "post".into(), post_id.0.to_string()]
            }
            Self::UserPosts { nickname } => vec!["users".into(), nickname.clone(), "posts".into()],
            Self::UserSearch { .. } => vec!["users".into(), "search".into()],
        }
    }

    fn search_query(&self) -> Option<&str> {
        match self {
            Self::PostSearch { query } | Self::UserSearch { query } => Some(query.as_str()),
            _ => None,
        }
    }

    /// Reason shown when a fetch fails without an API message.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Posts | Self::UserPosts { .. } => "Failed to load posts",
            Self::PostComments { .. } => "Failed to load comments",
            Self::PostSearch { .. } | Self::UserSearch { .. } => "Search failed",
        }
    }

    /// Page size used when the caller does not pick one.
    pub fn default_per_page(&self) -> u32 {
        match self {
            Self::PostComments { .. } => 20,
            _ => 10,
        }
    }
}

/// A [`ListApi`] that reads `T` items from one API collection.
pub struct HttpList<T> {
    client: ApiClient,
    resource: ListResource,
    _item: PhantomData<fn() -> T>,
}

impl<T> HttpList<T> {
    fn new(client: ApiClient, resource: ListResource) -> Self {
        Self {
            client,
            resource,
            _item: PhantomData,
        }
    }

    pub fn resource(&self) -> &ListResource {
        &self.resource
    }
}

#[async_trait]
impl<T> ListApi<T> for HttpList<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<ListPage<T>, RequestError> {
        let url = self.client.segment_url(self.resource.segments())?;
        debug!(url = %url, page, per_page, "fetching list page");
        let mut request = self
            .client
            .http
            .get(url)
            .query(&PageQuery { page, per_page });
        if let Some(query) = self.resource.search_query() {
            request = request.query(&[("q", query)]);
        }
        send_json(request).await
    }
}
