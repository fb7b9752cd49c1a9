//! Page-at-a-time fetching with last-request-wins ordering.

use std::sync::Arc;

use shared::protocol::ListPage;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{api::ListApi, error::FetchError};

/// Outcome of the most recent list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState<T> {
    Idle,
    Loading,
    Loaded(ListPage<T>),
    Failed(FetchError),
}

impl<T> FetchState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn page(&self) -> Option<&ListPage<T>> {
        match self {
            Self::Loaded(page) => Some(page),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Tag handed to each fetch; strictly increasing per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState<T> {
    current_page: u32,
    latest_request: RequestId,
    fetch: FetchState<T>,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            current_page: 1,
            latest_request: RequestId(0),
            fetch: FetchState::Idle,
        }
    }
}

impl<T> ListState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target page of the latest request, 1-indexed.
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn latest_request(&self) -> RequestId {
        self.latest_request
    }

    pub fn fetch(&self) -> &FetchState<T> {
        &self.fetch
    }

    /// Issues a new request for `page`, superseding any request in flight.
    pub fn begin(&mut self, page: u32) -> RequestId {
        self.latest_request = RequestId(self.latest_request.0 + 1);
        self.current_page = page;
        self.fetch = FetchState::Loading;
        self.latest_request
    }

    /// Applies the outcome of `request`; returns false and leaves the state
    /// untouched when a later request has been issued since.
    pub fn settle(&mut self, request: RequestId, outcome: Result<ListPage<T>, FetchError>) -> bool {
        if request != self.latest_request {
            return false;
        }
        self.fetch = match outcome {
            Ok(page) => FetchState::Loaded(page),
            Err(err) => FetchState::Failed(err),
        };
        true
    }
}

/// Drives one paginated resource for the display layer.
///
/// Page size is fixed at construction. Failures never escape: they end up in
/// [`FetchState::Failed`].
pub struct PaginatedListController<T> {
    source: Arc<dyn ListApi<T>>,
    per_page: u32,
    failure_message: String,
    state: watch::Sender<ListState<T>>,
}

impl<T> PaginatedListController<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(
        source: Arc<dyn ListApi<T>>,
        per_page: u32,
        failure_message: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(ListState::new());
        Self {
            source,
            per_page: per_page.max(1),
            failure_message: failure_message.into(),
            state,
        }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn snapshot(&self) -> ListState<T> {
        self.state.borrow().clone()
    }

    pub fn fetch_state(&self) -> FetchState<T> {
        self.state.borrow().fetch.clone()
    }

    /// Receiver woken after every applied transition.
    pub fn subscribe(&self) -> watch::Receiver<ListState<T>> {
        self.state.subscribe()
    }

    /// Fetches `page` (0 is treated as 1). Pages past the end are forwarded
    /// to the API as-is.
    pub async fn go_to_page(&self, page: u32) {
        let page = page.max(1);
        let mut request = RequestId(0);
        self.state.send_modify(|state| request = state.begin(page));
        debug!(page, request_id = request.0, "list fetch started");

        let outcome = self
            .source
            .fetch_page(page, self.per_page)
            .await
            .map_err(|err| {
                warn!(page, request_id = request.0, error = %err, "list fetch failed");
                FetchError::from_request(&err, &self.failure_message)
            });

        let applied = self
            .state
            .send_if_modified(|state| state.settle(request, outcome));
        if !applied {
            debug!(page, request_id = request.0, "discarding superseded list response");
        }
    }

    /// Moves forward when the last loaded page reports `has_next`.
    pub async fn next_page(&self) -> bool {
        let target = {
            let state = self.state.borrow();
            state
                .fetch
                .page()
                .filter(|page| page.has_next)
                .map(|page| page.current_page.saturating_add(1))
        };
        match target {
            Some(page) => {
                self.go_to_page(page).await;
                true
            }
            None => false,
        }
    }

    /// Moves back when the last loaded page reports `has_prev`.
    pub async fn prev_page(&self) -> bool {
        let target = {
            let state = self.state.borrow();
            state
                .fetch
                .page()
                .filter(|page| page.has_prev)
                .map(|page| page.current_page.saturating_sub(1))
        };
        match target {
            Some(page) => {
                self.go_to_page(page).await;
                true
            }
            None => false,
        }
    }

    pub async fn reload(&self) {
        let page = self.state.borrow().current_page;
        self.go_to_page(page).await;
    }
}

#[cfg(test)]
#[path = "tests/list_tests.rs"]
mod tests;
