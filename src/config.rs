//! System configuration parameters
//!
//! All tunable parameters for the Cyfox companion.  Values come from a
//! YAML document addressed by dotted paths (`cyfox.scanner.ports`); a key
//! that is absent, null, or of the wrong type falls back to the default
//! documented on each field.  Configuration never fails the process.

use std::time::Duration;

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::pins;

// ---------------------------------------------------------------------------
// Dotted-path lookup
// ---------------------------------------------------------------------------

/// Parsed YAML document with default-aware dotted lookups.
#[derive(Debug, Clone, Default)]
pub struct ConfigTree {
    root: serde_yaml::Value,
}

impl ConfigTree {
    /// An empty tree: every lookup yields its default.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let root: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        Ok(Self { root })
    }

    /// Raw node at `path`, `None` if any segment is missing or the leaf is null.
    pub fn lookup(&self, path: &str) -> Option<&serde_yaml::Value> {
        path.split('.')
            .try_fold(&self.root, |node, key| node.get(key))
            .filter(|v| !v.is_null())
    }

    /// Typed value at `path`, or `default` if absent or mistyped.
    pub fn get<T: DeserializeOwned>(&self, path: &str, default: T) -> T {
        let Some(node) = self.lookup(path) else {
            return default;
        };
        match serde_yaml::from_value(node.clone()) {
            Ok(value) => value,
            Err(e) => {
                warn!("Config: '{}' has the wrong type ({}), using default", path, e);
                default
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Reminder intervals (`cyfox.reminders.*`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Minutes between meal reminders.
    pub eat_interval_min: u64,
    /// Minutes between hydration reminders.
    pub drink_interval_min: u64,
    /// Minutes between rest reminders.
    pub rest_interval_min: u64,
    /// Minutes between focus reminders.
    pub focus_interval_min: u64,
    /// Seconds between scheduler wakes.
    pub check_interval_secs: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            eat_interval_min: 180,
            drink_interval_min: 60,
            rest_interval_min: 90,
            focus_interval_min: 25,
            check_interval_secs: 10,
        }
    }
}

/// Network scanner settings (`cyfox.scanner.*`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Seconds between periodic scans (Scanner mode only).
    pub scan_interval_secs: u64,
    /// IPv4 CIDR range; host bits are ignored.
    pub network_range: String,
    /// Ports probed on every host, in probe order.
    pub ports: Vec<u16>,
    /// Connect timeout per probe, milliseconds.
    pub probe_timeout_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 3600,
            network_range: "192.168.1.0/24".to_string(),
            ports: vec![22, 80, 443, 445, 3306, 3389],
            probe_timeout_ms: 500,
        }
    }
}

/// Remote feed settings (`cyfox.feed.*`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Source names substituted into `url_template`.
    pub sources: Vec<String>,
    /// Seconds between refreshes while Feed mode is active.
    pub fetch_interval_secs: u64,
    /// Size of the merged, ranked list.
    pub max_posts: usize,
    /// Items taken from the top of each source.
    pub items_per_source: usize,
    /// Per-request timeout, seconds.
    pub request_timeout_secs: u64,
    /// Pause between consecutive source requests, milliseconds.
    pub source_delay_ms: u64,
    /// Listing URL; `{source}` is replaced by the source name.
    pub url_template: String,
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            sources: ["ProgrammerHumor", "sysadmin", "devops", "linuxmemes"]
                .into_iter()
                .map(String::from)
                .collect(),
            fetch_interval_secs: 1800,
            max_posts: 10,
            items_per_source: 5,
            request_timeout_secs: 10,
            source_delay_ms: 1000,
            url_template: "https://www.reddit.com/r/{source}/hot.json".to_string(),
            user_agent: "CyfoxBot/1.0 (by /u/cyfox)".to_string(),
        }
    }
}

/// Button wiring and timing (`cyfox.buttons.*`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonConfig {
    /// Input line per logical button, indexed by `button - 1`.
    pub lines: [u8; 4],
    /// Minimum time between two accepted presses of one line.
    pub debounce_ms: u64,
    /// Poll period of the input loop.
    pub poll_interval_ms: u64,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            lines: pins::BUTTON_LINES,
            debounce_ms: 50,
            poll_interval_ms: 10,
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionConfig {
    pub reminders: ReminderConfig,
    pub scanner: ScannerConfig,
    pub feed: FeedConfig,
    pub buttons: ButtonConfig,
    /// Seconds between status snapshots from the foreground loop.
    pub status_interval_secs: u64,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            reminders: ReminderConfig::default(),
            scanner: ScannerConfig::default(),
            feed: FeedConfig::default(),
            buttons: ButtonConfig::default(),
            status_interval_secs: 5,
        }
    }
}

impl CompanionConfig {
    /// Build from a parsed document, key by key, defaulting each miss.
    pub fn from_tree(tree: &ConfigTree) -> Self {
        let d = Self::default();
        let r = &d.reminders;
        let s = &d.scanner;
        let f = &d.feed;
        let b = &d.buttons;

        let mut lines = b.lines;
        for (idx, line) in lines.iter_mut().enumerate() {
            *line = tree.get(&format!("cyfox.buttons.button{}", idx + 1), *line);
        }

        Self {
            reminders: ReminderConfig {
                eat_interval_min: tree.get("cyfox.reminders.eat_interval", r.eat_interval_min),
                drink_interval_min: tree
                    .get("cyfox.reminders.drink_interval", r.drink_interval_min),
                rest_interval_min: tree.get("cyfox.reminders.rest_interval", r.rest_interval_min),
                focus_interval_min: tree
                    .get("cyfox.reminders.focus_interval", r.focus_interval_min),
                check_interval_secs: tree
                    .get("cyfox.reminders.check_interval_secs", r.check_interval_secs),
            },
            scanner: ScannerConfig {
                scan_interval_secs: tree.get("cyfox.scanner.scan_interval", s.scan_interval_secs),
                network_range: tree.get("cyfox.scanner.network_range", s.network_range.clone()),
                ports: tree.get("cyfox.scanner.ports", s.ports.clone()),
                probe_timeout_ms: tree.get("cyfox.scanner.probe_timeout_ms", s.probe_timeout_ms),
            },
            feed: FeedConfig {
                sources: tree.get("cyfox.feed.sources", f.sources.clone()),
                fetch_interval_secs: tree.get("cyfox.feed.fetch_interval", f.fetch_interval_secs),
                max_posts: tree.get("cyfox.feed.max_posts", f.max_posts),
                items_per_source: tree.get("cyfox.feed.items_per_source", f.items_per_source),
                request_timeout_secs: tree
                    .get("cyfox.feed.request_timeout_secs", f.request_timeout_secs),
                source_delay_ms: tree.get("cyfox.feed.source_delay_ms", f.source_delay_ms),
                url_template: tree.get("cyfox.feed.url_template", f.url_template.clone()),
                user_agent: tree.get("cyfox.feed.user_agent", f.user_agent.clone()),
            },
            buttons: ButtonConfig {
                lines,
                debounce_ms: tree.get("cyfox.buttons.debounce_ms", b.debounce_ms),
                poll_interval_ms: tree.get("cyfox.buttons.poll_interval_ms", b.poll_interval_ms),
            },
            status_interval_secs: tree.get("cyfox.status_interval_secs", d.status_interval_secs),
        }
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs.max(1))
    }
}

impl ReminderConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs.max(1))
    }
}

impl ScannerConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms.max(1))
    }
}

impl FeedConfig {
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn source_delay(&self) -> Duration {
        Duration::from_millis(self.source_delay_ms)
    }

    /// Listing URL for one source.
    pub fn url_for(&self, source: &str) -> String {
        self.url_template.replace("{source}", source)
    }
}

impl ButtonConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
