//! Catalog query engine
//!
//! Stream choices, one-shot searches, and the debounced search pipeline
//! that coalesces keystrokes and keeps out-of-order responses from
//! clobbering newer results.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::api::CatalogApi;
use crate::error::ClientResult;
use crate::models::{Book, BookQuery, StreamChoice, StreamFilter};

use super::session::SessionGate;

/// Catalog queries against the lending service.
#[derive(Clone)]
pub struct CatalogService {
    api: Arc<dyn CatalogApi>,
    session: Arc<SessionGate>,
    debounce: Duration,
}

impl CatalogService {
    pub fn new(api: Arc<dyn CatalogApi>, session: Arc<SessionGate>, debounce: Duration) -> Self {
        Self {
            api,
            session,
            debounce,
        }
    }

    /// Stream selector choices: the synthetic "All Streams" sentinel
    /// first, then the server's streams in server order. The sentinel is
    /// the absence of the stream constraint and never reaches the server.
    pub async fn stream_choices(&self) -> ClientResult<Vec<StreamChoice>> {
        let credential = self.session.require_session()?;
        let streams = self.api.list_streams(&credential).await?;
        let mut choices = Vec::with_capacity(streams.len() + 1);
        choices.push(StreamChoice::all());
        choices.extend(streams.into_iter().map(StreamChoice::from));
        Ok(choices)
    }

    /// One-shot catalog search; constraints are ANDed.
    pub async fn search_books(&self, query: &BookQuery) -> ClientResult<Vec<Book>> {
        let credential = self.session.require_session()?;
        tracing::debug!(text = ?query.text, stream = ?query.stream, "issuing catalog search");
        self.api.search_books(&credential, query).await
    }

    /// Start a search pipeline publishing into a watch channel.
    pub fn search_pipeline(&self) -> BookSearch {
        BookSearch::new(self.clone())
    }
}

/// Latest catalog result the view should render.
///
/// `seq` identifies the query that produced it. On failure `books` is
/// empty and `message` carries the failure text: stale results are
/// replaced by an explicit empty state, never left on screen.
#[derive(Debug, Clone, Default)]
pub struct SearchSnapshot {
    pub seq: u64,
    pub books: Vec<Book>,
    pub message: Option<String>,
}

struct SearchState {
    query: BookQuery,
    /// Bumped on every keystroke; a debounce timer only fires if it still
    /// owns the latest keystroke when it expires.
    keystroke: u64,
}

/// Debounced, ordered search pipeline.
///
/// Text input coalesces into one query per inactivity window. A stream
/// filter change fires immediately, uncoalesced, and leaves a pending
/// text timer to fire as well. Every issued query carries a monotonic
/// sequence number; a response is rendered only if nothing newer has been
/// rendered already, so network arrival order never decides what the user
/// sees. In-flight calls are not cancelled; stale completions are
/// discarded by the sequence check.
#[derive(Clone)]
pub struct BookSearch {
    inner: Arc<SearchInner>,
}

struct SearchInner {
    service: CatalogService,
    state: Mutex<SearchState>,
    /// Tag for the next issued query.
    seq: AtomicU64,
    /// Highest sequence number already rendered.
    rendered: Mutex<u64>,
    tx: watch::Sender<SearchSnapshot>,
}

impl BookSearch {
    fn new(service: CatalogService) -> Self {
        let (tx, _rx) = watch::channel(SearchSnapshot::default());
        Self {
            inner: Arc::new(SearchInner {
                service,
                state: Mutex::new(SearchState {
                    query: BookQuery::default(),
                    keystroke: 0,
                }),
                seq: AtomicU64::new(0),
                rendered: Mutex::new(0),
                tx,
            }),
        }
    }

    /// Subscribe to rendered snapshots.
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.inner.tx.subscribe()
    }

    /// Subscribe as an async stream.
    pub fn snapshots(&self) -> WatchStream<SearchSnapshot> {
        WatchStream::new(self.subscribe())
    }

    /// Current query as the pipeline sees it.
    pub fn query(&self) -> BookQuery {
        lock(&self.inner.state).query.clone()
    }

    /// Record a keystroke. The query fires only after the debounce window
    /// passes with no further keystrokes.
    pub fn on_text_input(&self, text: &str) {
        let inner = Arc::clone(&self.inner);
        let my_keystroke = {
            let mut state = lock(&inner.state);
            state.query.text = Some(text.to_string());
            state.keystroke += 1;
            state.keystroke
        };
        let debounce = inner.service.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if lock(&inner.state).keystroke != my_keystroke {
                // a later keystroke owns the window now
                return;
            }
            inner.issue().await;
        });
    }

    /// Change the stream filter. Fires immediately; a pending debounced
    /// text timer is not cancelled, so both queries may complete and the
    /// sequence check decides which is rendered.
    pub fn on_stream_change(&self, filter: StreamFilter) {
        lock(&self.inner.state).query.stream = filter;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.issue().await;
        });
    }

    /// Issue the current query immediately (initial page load).
    pub fn refresh(&self) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.issue().await;
        });
    }
}

impl SearchInner {
    async fn issue(&self) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let query = lock(&self.state).query.clone();
        let snapshot = match self.service.search_books(&query).await {
            Ok(books) => SearchSnapshot {
                seq,
                books,
                message: None,
            },
            Err(err) => {
                tracing::warn!(%err, "catalog search failed");
                SearchSnapshot {
                    seq,
                    books: Vec::new(),
                    message: Some(err.to_string()),
                }
            }
        };

        let mut rendered = lock(&self.rendered);
        if seq > *rendered {
            *rendered = seq;
            self.tx.send_replace(snapshot);
        } else {
            tracing::debug!(seq, rendered = *rendered, "discarding stale search response");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockCatalogApi;
    use crate::error::ClientError;
    use crate::models::{Credential, Stream};
    use async_trait::async_trait;

    fn book(id: i64, title: &str) -> Book {
        Book {
            id,
            title: title.to_string(),
            author_name: None,
            stream: None,
            stream_name: None,
        }
    }

    fn service(api: MockCatalogApi, debounce_ms: u64) -> CatalogService {
        CatalogService::new(
            Arc::new(api),
            SessionGate::stubbed(),
            Duration::from_millis(debounce_ms),
        )
    }

    #[tokio::test]
    async fn test_stream_choices_start_with_the_all_sentinel() {
        let mut api = MockCatalogApi::new();
        api.expect_list_streams().returning(|_| {
            Ok(vec![
                Stream {
                    id: 1,
                    name: "Science".to_string(),
                },
                Stream {
                    id: 2,
                    name: "History".to_string(),
                },
            ])
        });

        let choices = service(api, 400).stream_choices().await.unwrap();

        assert_eq!(choices[0], StreamChoice::all());
        assert_eq!(choices[0].label, "All Streams");
        assert_eq!(choices[1].filter, StreamFilter::Stream(1));
        assert_eq!(choices[2].label, "History");
        assert_eq!(choices.len(), 3);
    }

    #[tokio::test]
    async fn test_search_requires_a_session() {
        let api = MockCatalogApi::new();
        let service = CatalogService::new(
            Arc::new(api),
            Arc::new(SessionGate::new(Arc::new(crate::api::MockAuthApi::new()))),
            Duration::from_millis(400),
        );

        let err = service.search_books(&BookQuery::default()).await.unwrap_err();
        assert!(err.is_unauthenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_keystrokes_coalesce_into_one_query() {
        let mut api = MockCatalogApi::new();
        api.expect_search_books()
            .withf(|_, query| query.text.as_deref() == Some("dune"))
            .times(1)
            .returning(|_, _| Ok(vec![book(42, "Dune")]));

        let search = service(api, 400).search_pipeline();
        let rx = search.subscribe();

        search.on_text_input("d");
        tokio::time::sleep(Duration::from_millis(100)).await;
        search.on_text_input("du");
        tokio::time::sleep(Duration::from_millis(100)).await;
        search.on_text_input("dune");
        // silence: the last keystroke's window expires alone
        tokio::time::sleep(Duration::from_millis(600)).await;

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.seq, 1);
        assert_eq!(snapshot.books, vec![book(42, "Dune")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_change_fires_without_waiting() {
        let mut api = MockCatalogApi::new();
        api.expect_search_books()
            .withf(|_, query| query.stream == StreamFilter::Stream(2))
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let search = service(api, 400).search_pipeline();
        search.on_stream_change(StreamFilter::Stream(2));

        // well inside the debounce window
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_change_leaves_pending_text_timer_running() {
        let mut api = MockCatalogApi::new();
        api.expect_search_books().times(2).returning(|_, _| Ok(vec![]));

        let search = service(api, 400).search_pipeline();
        search.on_text_input("dune");
        tokio::time::sleep(Duration::from_millis(100)).await;
        search.on_stream_change(StreamFilter::Stream(2));
        tokio::time::sleep(Duration::from_millis(600)).await;
        // both queries completed: the immediate filter query and the
        // debounced text query (times(2) above is the assertion)
    }

    /// Gateway double whose first search stalls long enough to resolve
    /// after the second.
    struct StaggeredCatalog {
        calls: AtomicU64,
    }

    #[async_trait]
    impl CatalogApi for StaggeredCatalog {
        async fn list_streams(&self, _credential: &Credential) -> ClientResult<Vec<Stream>> {
            Ok(vec![])
        }

        async fn search_books(
            &self,
            _credential: &Credential,
            _query: &BookQuery,
        ) -> ClientResult<Vec<Book>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok(vec![book(1, "stale")])
            } else {
                Ok(vec![book(2, "fresh")])
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_arrival_of_an_older_query_is_discarded() {
        let service = CatalogService::new(
            Arc::new(StaggeredCatalog {
                calls: AtomicU64::new(0),
            }),
            SessionGate::stubbed(),
            Duration::from_millis(400),
        );
        let search = service.search_pipeline();
        let rx = search.subscribe();

        // first query stalls in flight
        search.refresh();
        tokio::task::yield_now().await;
        // second query overtakes it
        search.on_stream_change(StreamFilter::Stream(1));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(rx.borrow().books, vec![book(2, "fresh")]);

        // the first query finally lands, and must not win
        tokio::time::sleep(Duration::from_millis(400)).await;
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.seq, 2);
        assert_eq!(snapshot.books, vec![book(2, "fresh")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_search_renders_an_explicit_empty_state() {
        let mut api = MockCatalogApi::new();
        let mut first = true;
        api.expect_search_books().times(2).returning(move |_, _| {
            if std::mem::take(&mut first) {
                Ok(vec![book(1, "old result")])
            } else {
                Err(ClientError::rejected(502, "upstream broke"))
            }
        });

        let search = service(api, 400).search_pipeline();
        let rx = search.subscribe();

        search.refresh();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(rx.borrow().books.len(), 1);

        search.on_stream_change(StreamFilter::Stream(1));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let snapshot = rx.borrow().clone();
        assert!(snapshot.books.is_empty());
        assert_eq!(snapshot.message.as_deref(), Some("upstream broke"));
    }
}
