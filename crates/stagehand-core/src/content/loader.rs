//! Content loader gate
//!
//! Session-scoped, at-most-once loading of the listing and of per-id detail
//! records. Fetches run on spawned tasks and report back over a channel that
//! the owner drains once per frame, so no caller ever blocks on the network.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::models::{ContentId, ContentItem};
use super::source::ContentSource;
use crate::Error;

const NO_RUNTIME: &str = "no async runtime available";

/// Runtime to spawn fetches on. A caller outside any runtime gets a failed
/// fetch reported through the channel instead of a panic.
fn current_runtime() -> Option<Handle> {
    match Handle::try_current() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot start fetch outside a tokio runtime");
            None
        }
    }
}

/// Loading state of a detail record. Absence from the cache means "never requested".
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Pending,
    Ready(ContentItem),
    Failed(String),
}

/// Loading state of the listing
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ListState {
    #[default]
    Absent,
    Pending,
    Ready(Vec<ContentItem>),
    Failed(String),
}

/// Raw result of a spawned fetch
#[derive(Debug)]
pub enum LoadResult {
    List(std::result::Result<Vec<ContentItem>, String>),
    Detail {
        id: ContentId,
        result: std::result::Result<Option<ContentItem>, String>,
    },
}

/// What a committed result changed
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    ListReady(usize),
    ListFailed(String),
    DetailReady(ContentId),
    DetailFailed(ContentId, String),
}

/// Outcome of a detail request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// First fetch for this id was started
    Spawned,
    /// A failed id was fetched again
    Retried,
    /// A fetch is already in flight; nothing was started
    AlreadyPending,
    /// Detail is cached; nothing was started
    AlreadyReady,
}

impl RequestOutcome {
    pub fn started_fetch(self) -> bool {
        matches!(self, Self::Spawned | Self::Retried)
    }
}

pub struct ContentLoader {
    source: Arc<dyn ContentSource>,
    list: ListState,
    details: HashMap<ContentId, DetailState>,
    tx: mpsc::UnboundedSender<LoadResult>,
    rx: mpsc::UnboundedReceiver<LoadResult>,
}

impl std::fmt::Debug for ContentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentLoader")
            .field("list", &self.list)
            .field("details", &self.details.len())
            .finish()
    }
}

impl ContentLoader {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            list: ListState::Absent,
            details: HashMap::new(),
            tx,
            rx,
        }
    }

    pub fn list_state(&self) -> &ListState {
        &self.list
    }

    /// The cached listing, once loaded
    pub fn listing(&self) -> Option<&[ContentItem]> {
        match &self.list {
            ListState::Ready(items) => Some(items),
            _ => None,
        }
    }

    pub fn detail_state(&self, id: ContentId) -> Option<&DetailState> {
        self.details.get(&id)
    }

    pub fn is_pending(&self, id: ContentId) -> bool {
        matches!(self.details.get(&id), Some(DetailState::Pending))
    }

    /// Start the listing fetch. Only the first call per loader does anything.
    pub fn request_list(&mut self) -> bool {
        if self.list != ListState::Absent {
            return false;
        }
        self.spawn_list();
        true
    }

    /// Fetch the listing again after a failure
    pub fn retry_list(&mut self) -> bool {
        if !matches!(self.list, ListState::Failed(_)) {
            return false;
        }
        self.spawn_list();
        true
    }

    fn spawn_list(&mut self) {
        self.list = ListState::Pending;
        let Some(runtime) = current_runtime() else {
            let _ = self.tx.send(LoadResult::List(Err(NO_RUNTIME.to_string())));
            return;
        };
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        runtime.spawn(async move {
            let result = source.list_items().await.map_err(|e| e.to_string());
            let _ = tx.send(LoadResult::List(result));
        });
    }

    /// Request detail for `id`, issuing at most one in-flight fetch per id
    pub fn request_detail(&mut self, id: ContentId) -> RequestOutcome {
        let outcome = match self.details.get(&id) {
            Some(DetailState::Pending) => return RequestOutcome::AlreadyPending,
            Some(DetailState::Ready(_)) => return RequestOutcome::AlreadyReady,
            Some(DetailState::Failed(_)) => RequestOutcome::Retried,
            None => RequestOutcome::Spawned,
        };

        tracing::debug!(id = %id, retry = outcome == RequestOutcome::Retried, "Fetching detail");
        self.details.insert(id, DetailState::Pending);

        let Some(runtime) = current_runtime() else {
            let _ = self.tx.send(LoadResult::Detail {
                id,
                result: Err(NO_RUNTIME.to_string()),
            });
            return outcome;
        };
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        runtime.spawn(async move {
            let result = source.get_item(id).await.map_err(|e| e.to_string());
            let _ = tx.send(LoadResult::Detail { id, result });
        });

        outcome
    }

    /// Commit every finished fetch without waiting
    pub fn drain(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        while let Ok(result) = self.rx.try_recv() {
            if let Some(event) = self.commit(result) {
                events.push(event);
            }
        }
        events
    }

    /// Wait for the next finished fetch and commit it
    pub async fn next_event(&mut self) -> Option<LoadEvent> {
        loop {
            let result = self.rx.recv().await?;
            if let Some(event) = self.commit(result) {
                return Some(event);
            }
        }
    }

    fn commit(&mut self, result: LoadResult) -> Option<LoadEvent> {
        match result {
            LoadResult::List(result) => {
                if self.list != ListState::Pending {
                    tracing::debug!("Dropping listing result that is no longer awaited");
                    return None;
                }
                match result {
                    Ok(items) => {
                        let count = items.len();
                        self.list = ListState::Ready(items);
                        Some(LoadEvent::ListReady(count))
                    }
                    Err(error) => {
                        tracing::warn!(error = %error, "Content listing failed");
                        self.list = ListState::Failed(error.clone());
                        Some(LoadEvent::ListFailed(error))
                    }
                }
            }
            LoadResult::Detail { id, result } => {
                if !self.is_pending(id) {
                    tracing::debug!(id = %id, "Dropping detail result that is no longer awaited");
                    return None;
                }
                let result = match result {
                    Ok(Some(item)) => Ok(item),
                    Ok(None) => Err(Error::ContentNotFound(id).to_string()),
                    Err(error) => Err(error),
                };
                match result {
                    Ok(item) => {
                        self.details.insert(id, DetailState::Ready(item));
                        Some(LoadEvent::DetailReady(id))
                    }
                    Err(error) => {
                        tracing::warn!(id = %id, error = %error, "Detail fetch failed");
                        self.details.insert(id, DetailState::Failed(error.clone()));
                        Some(LoadEvent::DetailFailed(id, error))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentDetail, StaticContentSource};
    use crate::Result;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Source that counts calls and fails for a configurable set of ids
    struct CountingSource {
        inner: StaticContentSource,
        list_calls: AtomicUsize,
        detail_calls: Mutex<HashMap<ContentId, usize>>,
        failing: Mutex<HashSet<ContentId>>,
    }

    impl CountingSource {
        fn new(numbers: &[u32]) -> Self {
            let items = numbers
                .iter()
                .map(|&n| ContentItem {
                    id: ContentId(n),
                    number: n,
                    title: format!("Issue {}", n),
                    subtitle: None,
                    cover_url: None,
                    published_at: None,
                    detail: Some(ContentDetail {
                        body: format!("Body {}", n),
                        contributors: Vec::new(),
                    }),
                })
                .collect();
            Self {
                inner: StaticContentSource::new(items),
                list_calls: AtomicUsize::new(0),
                detail_calls: Mutex::new(HashMap::new()),
                failing: Mutex::new(HashSet::new()),
            }
        }

        fn detail_calls(&self, id: u32) -> usize {
            self.detail_calls
                .lock()
                .unwrap()
                .get(&ContentId(id))
                .copied()
                .unwrap_or(0)
        }
    }

    #[async_trait::async_trait]
    impl ContentSource for CountingSource {
        async fn list_items(&self) -> Result<Vec<ContentItem>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list_items().await
        }

        async fn get_item(&self, id: ContentId) -> Result<Option<ContentItem>> {
            *self.detail_calls.lock().unwrap().entry(id).or_insert(0) += 1;
            let failing = self.failing.lock().unwrap().contains(&id);
            if failing {
                return Err(Error::Other("service unavailable".to_string()));
            }
            self.inner.get_item(id).await
        }
    }

    #[tokio::test]
    async fn test_listing_fetched_once() {
        let source = Arc::new(CountingSource::new(&[52, 53, 54]));
        let mut loader = ContentLoader::new(source.clone());

        assert!(loader.request_list());
        assert!(!loader.request_list());
        assert_eq!(loader.next_event().await, Some(LoadEvent::ListReady(3)));
        assert!(!loader.request_list());

        assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(loader.listing().unwrap()[0].id, ContentId(54));
    }

    #[tokio::test]
    async fn test_concurrent_requests_issue_one_fetch() {
        let source = Arc::new(CountingSource::new(&[53, 54]));
        let mut loader = ContentLoader::new(source.clone());

        assert_eq!(loader.request_detail(ContentId(54)), RequestOutcome::Spawned);
        assert_eq!(
            loader.request_detail(ContentId(54)),
            RequestOutcome::AlreadyPending
        );
        assert_eq!(
            loader.next_event().await,
            Some(LoadEvent::DetailReady(ContentId(54)))
        );
        assert_eq!(
            loader.request_detail(ContentId(54)),
            RequestOutcome::AlreadyReady
        );
        assert_eq!(source.detail_calls(54), 1);
    }

    #[tokio::test]
    async fn test_failure_flags_only_that_id_and_retry_is_explicit() {
        let source = Arc::new(CountingSource::new(&[53, 54]));
        source.failing.lock().unwrap().insert(ContentId(54));
        let mut loader = ContentLoader::new(source.clone());

        loader.request_detail(ContentId(54));
        match loader.next_event().await {
            Some(LoadEvent::DetailFailed(id, _)) => assert_eq!(id, ContentId(54)),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(
            loader.detail_state(ContentId(54)),
            Some(DetailState::Failed(_))
        ));
        assert!(loader.detail_state(ContentId(53)).is_none());

        // Nothing retries on its own
        tokio::task::yield_now().await;
        assert!(loader.drain().is_empty());
        assert_eq!(source.detail_calls(54), 1);

        source.failing.lock().unwrap().clear();
        assert_eq!(loader.request_detail(ContentId(54)), RequestOutcome::Retried);
        assert_eq!(
            loader.request_detail(ContentId(54)),
            RequestOutcome::AlreadyPending
        );
        assert_eq!(
            loader.next_event().await,
            Some(LoadEvent::DetailReady(ContentId(54)))
        );
        assert_eq!(source.detail_calls(54), 2);
    }

    #[tokio::test]
    async fn test_unknown_id_is_a_failure() {
        let source = Arc::new(CountingSource::new(&[53]));
        let mut loader = ContentLoader::new(source);

        loader.request_detail(ContentId(99));
        match loader.next_event().await {
            Some(LoadEvent::DetailFailed(id, msg)) => {
                assert_eq!(id, ContentId(99));
                assert!(msg.contains("not found"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_requests_outside_a_runtime_fail_instead_of_panicking() {
        let source = Arc::new(CountingSource::new(&[53, 54]));
        let mut loader = ContentLoader::new(source.clone());

        assert!(loader.request_list());
        assert_eq!(
            loader.request_detail(ContentId(54)),
            RequestOutcome::Spawned
        );
        assert!(loader.is_pending(ContentId(54)));

        let events = loader.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(loader.list_state(), ListState::Failed(msg) if msg.contains("runtime")));
        assert!(matches!(
            loader.detail_state(ContentId(54)),
            Some(DetailState::Failed(msg)) if msg.contains("runtime")
        ));
        assert_eq!(source.detail_calls(54), 0);

        // A failed request can still be retried once a runtime exists
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        rt.block_on(async {
            assert_eq!(
                loader.request_detail(ContentId(54)),
                RequestOutcome::Retried
            );
            assert_eq!(
                loader.next_event().await,
                Some(LoadEvent::DetailReady(ContentId(54)))
            );
        });
    }
}
