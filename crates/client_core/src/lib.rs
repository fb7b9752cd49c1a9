use std::sync::Arc;

use serde::de::DeserializeOwned;

pub mod api;
pub mod error;
pub mod list;
pub mod session;
pub mod token_store;
pub mod transport;

pub use api::{AuthApi, ListApi};
pub use error::{AuthError, FetchError, RequestError};
pub use list::{FetchState, ListState, PaginatedListController, RequestId};
pub use session::{SessionSnapshot, SessionState, SessionStore};
pub use token_store::{MemoryTokenStore, TokenStore};
pub use transport::{ApiClient, HttpList, ListResource};

/// Application-wide client context: one API client and one session store,
/// built at startup and handed to whatever renders state.
#[derive(Clone)]
pub struct ClientContext {
    api: ApiClient,
    session: Arc<SessionStore>,
}

impl ClientContext {
    pub fn new(api: ApiClient, tokens: Arc<dyn TokenStore>) -> Self {
        let session = Arc::new(SessionStore::new(Arc::new(api.clone()), tokens));
        Self { api, session }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Controller over `list` with the given page size, or the collection's
    /// usual size when `per_page` is `None`.
    pub fn controller_for<T>(
        &self,
        list: HttpList<T>,
        per_page: Option<u32>,
    ) -> PaginatedListController<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let resource = list.resource().clone();
        PaginatedListController::new(
            Arc::new(list),
            per_page.unwrap_or_else(|| resource.default_per_page()),
            resource.failure_message(),
        )
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
