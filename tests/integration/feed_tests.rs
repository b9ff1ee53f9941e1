//! Feed fetcher against a mock HTTP client.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cyfox::config::FeedConfig;
use cyfox::feed::FeedFetcher;
use cyfox::state::{OperatingMode, StateRegister};

use crate::mock_hw::{MockHttp, Reply, listing, wait_until};

const TEMPLATE: &str = "http://feeds.test/{source}.json";

fn config(sources: &[&str]) -> FeedConfig {
    FeedConfig {
        sources: sources.iter().map(|s| s.to_string()).collect(),
        source_delay_ms: 0,
        url_template: TEMPLATE.to_string(),
        ..FeedConfig::default()
    }
}

fn url(source: &str) -> String {
    TEMPLATE.replace("{source}", source)
}

fn fetcher(cfg: FeedConfig, http: &Arc<MockHttp>) -> (FeedFetcher, Arc<StateRegister>) {
    let register = Arc::new(StateRegister::new());
    (FeedFetcher::new(cfg, Arc::clone(&register), http.clone()), register)
}

#[test]
fn merges_sources_by_score() {
    let http = MockHttp::new();
    http.reply(&url("a"), Reply::Json(200, listing(&[("a1", 10), ("a2", 50)])));
    http.reply(&url("b"), Reply::Json(200, listing(&[("b1", 30)])));
    let (feed, _) = fetcher(config(&["a", "b"]), &http);

    let posts = feed.fetch_new_posts();

    let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["a2", "b1", "a1"]);
    assert_eq!(posts[1].source, "b");
    assert_eq!(feed.cursor(), 0);
    assert_eq!(feed.current_post().unwrap().title, "a2");
}

#[test]
fn failing_sources_are_omitted() {
    let http = MockHttp::new();
    http.reply(&url("ok"), Reply::Json(200, listing(&[("fine", 1)])));
    http.reply(&url("down"), Reply::Json(503, serde_json::Value::Null));
    http.reply(&url("broken"), Reply::Fail("connection reset".into()));
    let (feed, _) = fetcher(config(&["down", "broken", "ok"]), &http);

    let posts = feed.fetch_new_posts();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "fine");
    assert_eq!(http.request_count(), 3);
}

#[test]
fn per_source_and_total_limits() {
    let http = MockHttp::new();
    let many: Vec<(&str, i64)> = vec![("x", 1); 8];
    http.reply(&url("a"), Reply::Json(200, listing(&many)));
    http.reply(&url("b"), Reply::Json(200, listing(&many)));
    let cfg = FeedConfig {
        max_posts: 7,
        ..config(&["a", "b"])
    };
    let (feed, _) = fetcher(cfg, &http);
    // 5 per source, 10 merged, truncated to 7.
    assert_eq!(feed.fetch_new_posts().len(), 7);
}

#[test]
fn empty_fetch_keeps_previous_list() {
    let http = MockHttp::new();
    http.reply(&url("a"), Reply::Json(200, listing(&[("one", 1), ("two", 2)])));
    let (feed, _) = fetcher(config(&["a"]), &http);
    feed.fetch_new_posts();
    feed.next_post();

    let calls = Arc::new(Mutex::new(0));
    {
        let calls = Arc::clone(&calls);
        feed.register_feed_callback(move |_| *calls.lock().unwrap() += 1);
    }
    http.reply(&url("a"), Reply::Fail("offline".into()));
    let posts = feed.fetch_new_posts();

    assert_eq!(posts.len(), 2);
    assert_eq!(feed.cursor(), 1);
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[test]
fn next_post_wraps_around() {
    let http = MockHttp::new();
    http.reply(&url("a"), Reply::Json(200, listing(&[("p0", 3), ("p1", 2), ("p2", 1)])));
    let (feed, _) = fetcher(config(&["a"]), &http);

    assert_eq!(feed.next_post(), None);
    assert_eq!(feed.cursor(), 0);
    assert!(feed.current_post().is_none());

    feed.fetch_new_posts();
    let seen: Vec<_> = (0..5).filter_map(|_| feed.next_post()).collect();
    assert_eq!(seen, vec![1, 2, 0, 1, 2]);
    assert_eq!(feed.current_post().unwrap().title, "p2");
}

#[test]
fn refresh_resets_cursor_and_notifies() {
    let http = MockHttp::new();
    http.reply(&url("a"), Reply::Json(200, listing(&[("p0", 3), ("p1", 2)])));
    let (feed, _) = fetcher(config(&["a"]), &http);
    let sizes = Arc::new(Mutex::new(Vec::new()));
    {
        let sizes = Arc::clone(&sizes);
        feed.register_feed_callback(move |items| sizes.lock().unwrap().push(items.len()));
    }

    feed.fetch_new_posts();
    feed.next_post();
    feed.fetch_new_posts();

    assert_eq!(feed.cursor(), 0);
    assert_eq!(*sizes.lock().unwrap(), vec![2, 2]);
}

#[test]
fn start_fetches_once_regardless_of_mode() {
    let http = MockHttp::new();
    http.reply(&url("a"), Reply::Json(200, listing(&[("p0", 3)])));
    let (feed, register) = fetcher(config(&["a"]), &http);
    assert_eq!(register.mode(), OperatingMode::Buddy);

    feed.start().unwrap();
    assert!(wait_until(Duration::from_secs(2), || !feed.posts().is_empty()));
    feed.stop();
    assert!(!feed.is_running());
    assert_eq!(http.request_count(), 1);
}

#[test]
fn loop_refetches_only_in_feed_mode() {
    let http = MockHttp::new();
    http.reply(&url("a"), Reply::Json(200, listing(&[("p0", 3)])));
    let cfg = FeedConfig {
        fetch_interval_secs: 1,
        ..config(&["a"])
    };
    let (feed, register) = fetcher(cfg, &http);

    feed.start().unwrap();
    assert!(wait_until(Duration::from_secs(2), || http.request_count() == 1));
    // Two interval ticks pass in Buddy mode without a request.
    std::thread::sleep(Duration::from_millis(2300));
    assert_eq!(http.request_count(), 1);

    register.set_mode(OperatingMode::Feed);
    assert!(wait_until(Duration::from_secs(3), || http.request_count() >= 2));
    feed.stop();
}

#[test]
fn sources_are_spaced_by_the_delay() {
    let http = MockHttp::new();
    http.reply(&url("a"), Reply::Json(200, listing(&[("a1", 1)])));
    http.reply(&url("b"), Reply::Json(200, listing(&[("b1", 2)])));
    let cfg = FeedConfig {
        source_delay_ms: 200,
        ..config(&["a", "b"])
    };
    let (feed, _) = fetcher(cfg, &http);

    let started = Instant::now();
    let posts = feed.fetch_new_posts();

    assert_eq!(posts.len(), 2);
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(http.request_count(), 2);
}
