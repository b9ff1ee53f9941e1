//! Remote feed fetcher.
//!
//! Pulls the hot listing of each configured source, keeps the top items by
//! score, and exposes them through a wrapping cursor.  The listing format
//! is `{"data":{"children":[{"data":{title, score, url, selftext, author}}]}}`.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Local};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::HttpClient;
use crate::config::FeedConfig;
use crate::diagnostics::panic_message;
use crate::error::HttpError;
use crate::state::{OperatingMode, StateRegister};
use crate::worker::{CancelToken, Worker};

/// Bounded wait for the feed loop on stop.
const STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// One item from a remote feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    /// Source (community) the item came from.
    pub source: String,
    pub score: i64,
    pub url: String,
    pub body: String,
    pub author: String,
    /// When the item was fetched.
    pub timestamp: DateTime<Local>,
}

// ── Listing wire format ───────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(default)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ListingData {
    children: Vec<serde_json::Value>,
}

/// Post fields; a `null` field reads as absent.
#[derive(Deserialize, Default)]
#[serde(default)]
struct ListingPost {
    title: Option<String>,
    score: Option<i64>,
    url: Option<String>,
    selftext: Option<String>,
    author: Option<String>,
}

/// Parse up to `limit` items from one source's listing body.
///
/// Missing or null fields take empty/zero values and a child without a
/// usable `data` object is skipped.  A body of the wrong shape is an error.
pub fn parse_listing(
    source: &str,
    body: &serde_json::Value,
    limit: usize,
) -> Result<Vec<FeedItem>, HttpError> {
    let listing = Listing::deserialize(body).map_err(|e| HttpError::Body(e.to_string()))?;
    let timestamp = Local::now();
    Ok(listing
        .data
        .children
        .iter()
        .filter_map(|child| {
            let post = child.get("data").and_then(|d| ListingPost::deserialize(d).ok());
            if post.is_none() {
                debug!("Feed: {}: skipping malformed item", source);
            }
            post
        })
        .take(limit)
        .map(|post| FeedItem {
            title: post.title.unwrap_or_default(),
            source: source.to_string(),
            score: post.score.unwrap_or_default(),
            url: post.url.unwrap_or_default(),
            body: post.selftext.unwrap_or_default(),
            author: post.author.unwrap_or_default(),
            timestamp,
        })
        .collect())
}

/// Sort by score, highest first, keeping fetch order among equal scores.
pub fn rank(mut items: Vec<FeedItem>, max: usize) -> Vec<FeedItem> {
    items.sort_by(|a, b| b.score.cmp(&a.score));
    items.truncate(max);
    items
}

// ── Fetcher ───────────────────────────────────────────────────

/// Observer of a successful refresh.  Receives the new item list.
pub type FeedCallback = Box<dyn Fn(&[FeedItem]) + Send + Sync>;

#[derive(Default)]
struct FeedList {
    items: Vec<FeedItem>,
    cursor: usize,
}

struct Shared {
    config: FeedConfig,
    register: Arc<StateRegister>,
    http: Arc<dyn HttpClient>,
    list: Mutex<FeedList>,
    callback: RwLock<Option<FeedCallback>>,
}

impl Shared {
    fn list(&self) -> MutexGuard<'_, FeedList> {
        self.list.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fetch_source(&self, source: &str) -> Result<Vec<FeedItem>, HttpError> {
        let url = self.config.url_for(source);
        let response = self.http.get_json(&url, self.config.request_timeout())?;
        if response.status != 200 {
            return Err(HttpError::Transport(format!("status {}", response.status)));
        }
        parse_listing(source, &response.body, self.config.items_per_source)
    }

    fn fetch(&self, token: Option<&CancelToken>) -> Vec<FeedItem> {
        let delay = self.config.source_delay();
        let mut merged = Vec::new();
        for (idx, source) in self.config.sources.iter().enumerate() {
            if idx > 0 && !delay.is_zero() {
                match token {
                    Some(token) => {
                        if !token.sleep(delay) {
                            break;
                        }
                    }
                    None => std::thread::sleep(delay),
                }
            }
            match self.fetch_source(source) {
                Ok(items) => merged.extend(items),
                Err(e) => warn!("Feed: error fetching '{}': {}", source, e),
            }
        }

        let ranked = rank(merged, self.config.max_posts);
        if ranked.is_empty() {
            info!("Feed: nothing fetched, keeping previous list");
            return self.list().items.clone();
        }

        {
            let mut list = self.list();
            list.items = ranked.clone();
            list.cursor = 0;
        }
        info!("Feed: refreshed with {} items", ranked.len());
        self.notify(&ranked);
        ranked
    }

    fn notify(&self, items: &[FeedItem]) {
        let callback = self.callback.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(callback) = callback.as_ref() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(items))) {
                error!("Error in feed callback: {}", panic_message(payload.as_ref()));
            }
        }
    }
}

/// Periodic feed fetcher with a browse cursor.
pub struct FeedFetcher {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl FeedFetcher {
    pub fn new(config: FeedConfig, register: Arc<StateRegister>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                register,
                http,
                list: Mutex::new(FeedList::default()),
                callback: RwLock::new(None),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Set the callback invoked after every successful refresh.
    pub fn register_feed_callback(&self, callback: impl Fn(&[FeedItem]) + Send + Sync + 'static) {
        *self
            .shared
            .callback
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(callback));
    }

    /// Fetch every source now, on the calling thread.
    ///
    /// Returns the list in effect afterwards: the new one, or the previous
    /// one when nothing could be fetched.
    pub fn fetch_new_posts(&self) -> Vec<FeedItem> {
        self.shared.fetch(None)
    }

    /// Advance the cursor with wraparound and return the new index.
    /// `None` (and no change) when the list is empty.
    pub fn next_post(&self) -> Option<usize> {
        let mut list = self.shared.list();
        if list.items.is_empty() {
            return None;
        }
        list.cursor = (list.cursor + 1) % list.items.len();
        Some(list.cursor)
    }

    /// The item under the cursor.
    pub fn current_post(&self) -> Option<FeedItem> {
        let list = self.shared.list();
        list.items.get(list.cursor).cloned()
    }

    pub fn cursor(&self) -> usize {
        self.shared.list().cursor
    }

    pub fn posts(&self) -> Vec<FeedItem> {
        self.shared.list().items.clone()
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the fetch loop.  The first fetch runs right away on the
    /// worker thread; later ones only while the mode is `Feed`.
    pub fn start(&self) -> crate::Result<()> {
        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        let interval = shared.config.fetch_interval();
        *slot = Some(Worker::start("feed", move |token| {
            shared.fetch(Some(&token));
            while token.sleep(interval) {
                if shared.register.mode() == OperatingMode::Feed {
                    shared.fetch(Some(&token));
                }
            }
        })?);
        Ok(())
    }

    /// Stop the loop, waiting up to one second.  No-op if not running.
    pub fn stop(&self) {
        let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(worker) = worker {
            worker.stop(STOP_TIMEOUT);
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|w| !w.is_finished())
    }
}

impl Drop for FeedFetcher {
    fn drop(&mut self) {
        self.stop();
    }
}
