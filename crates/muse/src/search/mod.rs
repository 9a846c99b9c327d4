//! Debounced client-side search over a cached catalog snapshot.
//!
//! The gallery front end fetches the catalog once per page load and filters
//! locally on every keystroke, after a quiet period. At most one evaluation
//! is ever pending: scheduling a new one cancels the previous one, so only
//! the final keystroke's query is evaluated.

use crate::services::CatalogEntry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Quiet period of no further input before a filter evaluation runs
pub const DEBOUNCE_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// What the gallery should display after an evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The snapshot has not been fetched yet; show a loading indicator,
    /// never a filter over partial data
    Loading,
    /// Empty query: the full snapshot, unfiltered
    All(Vec<CatalogEntry>),
    /// Non-empty query with at least one hit
    Matches {
        query: String,
        entries: Vec<CatalogEntry>,
    },
    /// Non-empty query, zero hits: show the explicit no-results indicator
    NoResults { query: String },
}

/// True when the query is a case-insensitive substring of the entry's name
/// or prompt
pub fn matches(entry: &CatalogEntry, query: &str) -> bool {
    let query = query.to_lowercase();
    entry.name.to_lowercase().contains(&query) || entry.prompt.to_lowercase().contains(&query)
}

#[derive(Default)]
struct Snapshot {
    entries: Vec<CatalogEntry>,
    loaded: bool,
}

fn evaluate(snapshot: &Snapshot, query: &str) -> SearchOutcome {
    if !snapshot.loaded {
        return SearchOutcome::Loading;
    }
    if query.is_empty() {
        return SearchOutcome::All(snapshot.entries.clone());
    }
    let entries: Vec<CatalogEntry> = snapshot
        .entries
        .iter()
        .filter(|e| matches(e, query))
        .cloned()
        .collect();
    if entries.is_empty() {
        SearchOutcome::NoResults {
            query: query.to_string(),
        }
    } else {
        SearchOutcome::Matches {
            query: query.to_string(),
            entries,
        }
    }
}

/// One search field's worth of debounce state: the cached snapshot and the
/// single owned handle to the pending evaluation, if any.
pub struct SearchClient {
    snapshot: Arc<RwLock<Snapshot>>,
    outcomes: mpsc::UnboundedSender<SearchOutcome>,
    pending: Option<JoinHandle<()>>,
    quiet_period: Duration,
}

impl SearchClient {
    /// Create a client with the standard 500ms quiet period. The receiver
    /// yields one outcome per executed evaluation.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SearchOutcome>) {
        Self::with_quiet_period(DEBOUNCE_QUIET_PERIOD)
    }

    pub fn with_quiet_period(
        quiet_period: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SearchOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                snapshot: Arc::new(RwLock::new(Snapshot::default())),
                outcomes: tx,
                pending: None,
                quiet_period,
            },
            rx,
        )
    }

    /// Install the catalog snapshot fetched on page load. Done once; queries
    /// never re-fetch.
    pub async fn load_snapshot(&self, entries: Vec<CatalogEntry>) {
        let mut snapshot = self.snapshot.write().await;
        snapshot.entries = entries;
        snapshot.loaded = true;
    }

    /// Handle an input change: cancel the pending evaluation and schedule a
    /// new one after the quiet period.
    pub fn on_input(&mut self, query: &str) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }

        let query = query.to_string();
        let snapshot = Arc::clone(&self.snapshot);
        let outcomes = self.outcomes.clone();
        let quiet_period = self.quiet_period;

        self.pending = Some(tokio::spawn(async move {
            sleep(quiet_period).await;
            let outcome = evaluate(&*snapshot.read().await, &query);
            let _ = outcomes.send(outcome);
        }));
    }
}
