//! Bundle list filters behind an observable channel.

use tokio::sync::watch;

/// Minimum-activity value applied when the typed input does not parse.
pub const DEFAULT_MIN_ACTIVITY: u32 = 5;

/// One consistent view of all three filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSnapshot {
    /// Free-text search over bundle labels and references.
    pub search_text: String,
    /// Exact authority/group name, empty for "all".
    pub group_filter: String,
    /// Minimum number of recorded applications, always non-negative.
    pub min_activity: u32,
}

/// The filter trio held inside a `watch` channel.
///
/// Every setter goes through `send_modify`, so each mutation reaches every
/// subscriber; the refetch loop in the facade holds a receiver and reloads
/// the list on change. Setters are synchronous and safe to call repeatedly.
#[derive(Debug)]
pub struct FilterState {
    tx: watch::Sender<FilterSnapshot>,
}

impl FilterState {
    pub fn new(min_activity: u32) -> Self {
        let (tx, _rx) = watch::channel(FilterSnapshot {
            search_text: String::new(),
            group_filter: String::new(),
            min_activity,
        });
        Self { tx }
    }

    /// Current values of all three filters.
    pub fn snapshot(&self) -> FilterSnapshot {
        self.tx.borrow().clone()
    }

    /// A receiver that observes every subsequent filter mutation.
    pub fn subscribe(&self) -> watch::Receiver<FilterSnapshot> {
        self.tx.subscribe()
    }

    pub fn set_search_text(&self, text: &str) {
        self.tx.send_modify(|s| s.search_text = text.to_string());
    }

    pub fn set_group_filter(&self, group: &str) {
        self.tx.send_modify(|s| s.group_filter = group.to_string());
    }

    pub fn set_min_activity(&self, value: u32) {
        self.tx.send_modify(|s| s.min_activity = value);
    }

    /// Set the minimum-activity filter from raw typed input.
    ///
    /// Anything that does not parse as a non-negative integer (including an
    /// emptied field) is coerced to [`DEFAULT_MIN_ACTIVITY`]. Returns the
    /// value actually applied.
    pub fn set_min_activity_input(&self, raw: &str) -> u32 {
        let value = raw.trim().parse().unwrap_or(DEFAULT_MIN_ACTIVITY);
        self.set_min_activity(value);
        value
    }
}

// =============================================================================
// Tests
// =============================================================================
