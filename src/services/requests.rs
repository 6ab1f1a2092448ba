//! Borrow-request lifecycle manager
//!
//! Creates, lists, and advances a patron's borrow requests. The server is
//! the source of truth for every lifecycle field: after a successful
//! mutation the list is re-fetched, never patched locally.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::api::RequestsApi;
use crate::error::{ClientError, ClientResult};
use crate::models::{BookId, BookRequest, RequestId, RequestSummary};

use super::session::SessionGate;

/// Callback deciding whether an irreversible return actually proceeds.
/// Asked exactly once, before any network call.
pub trait ReturnConfirmation {
    fn confirm_return(&self, request: &BookRequest) -> bool;
}

impl<F> ReturnConfirmation for F
where
    F: Fn(&BookRequest) -> bool,
{
    fn confirm_return(&self, request: &BookRequest) -> bool {
        self(request)
    }
}

/// Outcome of a return action.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnOutcome {
    Returned(BookRequest),
    /// The user declined the confirmation; nothing was sent.
    Cancelled,
}

struct RequestsState {
    requests: Vec<BookRequest>,
    /// Ids ever observed as returned. `is_returned` is monotonic: these
    /// are never presented as unreturned again without a full reset.
    returned_seen: HashSet<RequestId>,
}

pub struct RequestsService {
    api: Arc<dyn RequestsApi>,
    session: Arc<SessionGate>,
    state: Mutex<RequestsState>,
    tx: watch::Sender<Vec<BookRequest>>,
}

impl RequestsService {
    pub fn new(api: Arc<dyn RequestsApi>, session: Arc<SessionGate>) -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            api,
            session,
            state: Mutex::new(RequestsState {
                requests: Vec::new(),
                returned_seen: HashSet::new(),
            }),
            tx,
        }
    }

    /// Subscribe to published request lists.
    pub fn subscribe(&self) -> watch::Receiver<Vec<BookRequest>> {
        self.tx.subscribe()
    }

    /// Subscribe as an async stream.
    pub fn snapshots(&self) -> WatchStream<Vec<BookRequest>> {
        WatchStream::new(self.subscribe())
    }

    /// The list as last fetched, in server order.
    pub fn current(&self) -> Vec<BookRequest> {
        lock(&self.state).requests.clone()
    }

    /// Re-fetch the request list from the source of truth and publish it.
    /// Server order is preserved; no client-side re-sort.
    pub async fn refresh(&self) -> ClientResult<Vec<BookRequest>> {
        let credential = self.session.require_session()?;
        let mut requests = self.api.list_requests(&credential).await?;
        {
            let mut state = lock(&self.state);
            for request in &mut requests {
                if request.is_returned {
                    state.returned_seen.insert(request.id);
                } else if state.returned_seen.contains(&request.id) {
                    tracing::warn!(
                        request = request.id,
                        "refresh contradicts an observed return; keeping returned"
                    );
                    request.is_returned = true;
                }
            }
            state.requests = requests.clone();
        }
        self.tx.send_replace(requests.clone());
        Ok(requests)
    }

    /// Dashboard aggregates over the current list. Counts are cumulative
    /// and overlap; see [`RequestSummary`].
    pub fn summary(&self) -> RequestSummary {
        RequestSummary::of(&lock(&self.state).requests)
    }

    /// Submit a borrow request for the selected book.
    ///
    /// `None` (nothing selected) is rejected locally before any network
    /// call. On success the list is re-fetched. On failure the server's
    /// message travels up verbatim; there is no retry.
    pub async fn create_request(&self, selection: Option<BookId>) -> ClientResult<BookRequest> {
        let book = selection
            .ok_or_else(|| ClientError::required("book", "Please select a book."))?;
        let credential = self.session.require_session()?;
        let created = self
            .api
            .create_request(&credential, book)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ClientError::UnexpectedShape("create returned no request".to_string())
            })?;
        tracing::info!(book, request = created.id, "borrow request created");
        self.refresh().await?;
        Ok(created)
    }

    /// Return a borrowed book.
    ///
    /// Valid only from Approved-Outstanding; other states are rejected
    /// locally (the view must not offer the action there in the first
    /// place). Asks for confirmation before the irreversible call. On
    /// failure the cached state stays untouched: `is_returned` is never
    /// flipped optimistically.
    pub async fn return_request(
        &self,
        id: RequestId,
        confirmation: &dyn ReturnConfirmation,
    ) -> ClientResult<ReturnOutcome> {
        let request = lock(&self.state)
            .requests
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| ClientError::required("request", "Unknown book request."))?;
        if !request.can_return() {
            return Err(ClientError::required(
                "request",
                "Only approved, unreturned books can be returned.",
            ));
        }
        if !confirmation.confirm_return(&request) {
            return Ok(ReturnOutcome::Cancelled);
        }

        let credential = self.session.require_session()?;
        let returned = self.api.return_request(&credential, id).await?;
        tracing::info!(request = id, "book returned");
        self.refresh().await?;
        Ok(ReturnOutcome::Returned(returned))
    }

    /// Full state reset (logout): drops the cached list and the
    /// returned-id memory.
    pub fn reset(&self) {
        {
            let mut state = lock(&self.state);
            state.requests.clear();
            state.returned_seen.clear();
        }
        self.tx.send_replace(Vec::new());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
