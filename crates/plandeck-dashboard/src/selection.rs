//! Bundle selection and the detail panes it gates.

use std::sync::{Arc, Mutex};

use plandeck_api::PlanningBackend;
use plandeck_core::{Commit, ErrorSlot, Overview, PlandeckError, Result};

/// The currently selected bundle id, if any.
///
/// Selection is the pivot the detail panes and the chat session hang off.
/// `select` is idempotent in value but each call still retriggers a detail
/// load at the facade level.
#[derive(Debug, Default)]
pub struct SelectionController {
    current: Mutex<Option<String>>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.lock().clone()
    }

    pub fn select(&self, bundle_id: &str) {
        *self.lock() = Some(bundle_id.to_string());
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.current.lock().expect("selection mutex poisoned")
    }
}

/// What a finished detail load did to the panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    /// Both panes were replaced; the chat session should be reset.
    Applied,
    /// The selection moved while the fetch was in flight; nothing changed.
    Stale,
    /// Nothing is selected; the panes stay empty and no request is made.
    NoSelection,
}

#[derive(Debug, Default)]
struct DetailPanes {
    history: Vec<Commit>,
    overview: Option<Overview>,
}

/// Fetches history and overview for the selected bundle.
///
/// The selection is captured when the load is issued and compared again
/// when both responses are in. A completion for a bundle that is no longer
/// selected is discarded wholesale, so the panes can never show data for a
/// bundle other than the current selection.
pub struct DetailLoader {
    backend: Arc<dyn PlanningBackend>,
    selection: Arc<SelectionController>,
    errors: Arc<ErrorSlot>,
    panes: Mutex<DetailPanes>,
}

impl DetailLoader {
    pub fn new(
        backend: Arc<dyn PlanningBackend>,
        selection: Arc<SelectionController>,
        errors: Arc<ErrorSlot>,
    ) -> Self {
        Self {
            backend,
            selection,
            errors,
            panes: Mutex::new(DetailPanes::default()),
        }
    }

    /// Load both detail panes for the current selection.
    ///
    /// History and overview are fetched concurrently. The staleness check
    /// runs before any error handling: a stale completion is dropped even
    /// when it failed, so it can neither clear nor populate the panes of a
    /// newer selection.
    pub async fn load(&self) -> Result<DetailOutcome> {
        let Some(issued_for) = self.selection.current() else {
            let mut panes = self.lock_panes();
            panes.history.clear();
            panes.overview = None;
            return Ok(DetailOutcome::NoSelection);
        };

        let (history, overview) = tokio::join!(
            self.backend.bundle_history(&issued_for),
            self.backend.bundle_overview(&issued_for),
        );

        if self.selection.current().as_deref() != Some(issued_for.as_str()) {
            tracing::debug!(bundle = %issued_for, "Discarding detail responses for a superseded selection");
            return Ok(DetailOutcome::Stale);
        }

        match (history, overview) {
            (Ok(history), Ok(overview)) => {
                let mut panes = self.lock_panes();
                panes.history = history;
                panes.overview = Some(overview);
                Ok(DetailOutcome::Applied)
            }
            (history, overview) => {
                let mut failed = Vec::new();
                if let Err(e) = history {
                    failed.push(format!("history: {}", e));
                }
                if let Err(e) = overview {
                    failed.push(format!("overview: {}", e));
                }
                let mut panes = self.lock_panes();
                panes.history.clear();
                panes.overview = None;
                drop(panes);

                let err = PlandeckError::DetailFetch(failed.join("; "));
                self.errors.report(&err);
                Err(err)
            }
        }
    }

    /// The selected bundle's commit history, server order.
    pub fn history(&self) -> Vec<Commit> {
        self.lock_panes().history.clone()
    }

    /// The selected bundle's overview snapshot, if loaded.
    pub fn overview(&self) -> Option<Overview> {
        self.lock_panes().overview.clone()
    }

    fn lock_panes(&self) -> std::sync::MutexGuard<'_, DetailPanes> {
        self.panes.lock().expect("detail panes mutex poisoned")
    }
}

// =============================================================================
// Tests
// =============================================================================
