//! Bundle list loading with issue-ordered application.

use std::sync::{Arc, Mutex};

use plandeck_api::{BundleQuery, PlanningBackend};
use plandeck_core::{Bundle, ErrorSlot, PlandeckError, Result};

use crate::filter::FilterSnapshot;
use crate::selection::SelectionController;

/// What a finished reload did to the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The list was replaced. When nothing was selected and the new list is
    /// non-empty, `default_selection` names the entry the facade should
    /// select.
    Applied { default_selection: Option<String> },
    /// A newer reload was issued while this one was in flight; nothing
    /// changed.
    Superseded,
}

#[derive(Debug, Default)]
struct ListState {
    bundles: Vec<Bundle>,
    /// Token of the most recently issued reload. A completion whose token
    /// is older loses, regardless of arrival order.
    issued: u64,
}

/// Fetches the bundle list for a filter snapshot and replaces it wholesale.
///
/// Reloads are ordered by issue: each one takes the next token, and only
/// the completion carrying the latest token may touch the list. Selection
/// is never mutated here; the loader only reports the default-selection
/// candidate for the facade to act on.
pub struct BundleListLoader {
    backend: Arc<dyn PlanningBackend>,
    selection: Arc<SelectionController>,
    errors: Arc<ErrorSlot>,
    page_size: u32,
    state: Mutex<ListState>,
}

impl BundleListLoader {
    pub fn new(
        backend: Arc<dyn PlanningBackend>,
        selection: Arc<SelectionController>,
        errors: Arc<ErrorSlot>,
        page_size: u32,
    ) -> Self {
        Self {
            backend,
            selection,
            errors,
            page_size,
            state: Mutex::new(ListState::default()),
        }
    }

    /// Fetch the list for `filter` and apply it if still the latest reload.
    ///
    /// A superseded completion returns without mutating anything, success
    /// or failure alike. A current completion replaces the list on success;
    /// on failure it clears the list and reports the error, leaving the
    /// selection untouched.
    pub async fn reload(&self, filter: &FilterSnapshot) -> Result<ReloadOutcome> {
        let token = {
            let mut state = self.lock();
            state.issued += 1;
            state.issued
        };
        let query = BundleQuery {
            council: filter.group_filter.clone(),
            q: filter.search_text.clone(),
            min_apps: filter.min_activity,
            limit: self.page_size,
        };

        let result = self.backend.list_bundles(&query).await;

        let mut state = self.lock();
        if token != state.issued {
            tracing::debug!(token, latest = state.issued, "Discarding superseded bundle list");
            return Ok(ReloadOutcome::Superseded);
        }
        match result {
            Ok(bundles) => {
                tracing::debug!(count = bundles.len(), "Bundle list replaced");
                state.bundles = bundles;
                let default_selection = if self.selection.current().is_none() {
                    state.bundles.first().map(|b| b.id.clone())
                } else {
                    None
                };
                Ok(ReloadOutcome::Applied { default_selection })
            }
            Err(e) => {
                state.bundles.clear();
                drop(state);
                let err = PlandeckError::ListFetch(e.to_string());
                self.errors.report(&err);
                Err(err)
            }
        }
    }

    /// Snapshot of the current list, server order.
    pub fn bundles(&self) -> Vec<Bundle> {
        self.lock().bundles.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ListState> {
        self.state.lock().expect("bundle list mutex poisoned")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use plandeck_api::MockBackend;

    fn bundle(id: &str) -> Bundle {
        Bundle {
            id: id.to_string(),
            ..Bundle::default()
        }
    }

    fn filter(min_activity: u32) -> FilterSnapshot {
        FilterSnapshot {
            search_text: String::new(),
            group_filter: String::new(),
            min_activity,
        }
    }

    fn loader_with(
        backend: Arc<MockBackend>,
        selection: Arc<SelectionController>,
        errors: Arc<ErrorSlot>,
    ) -> Arc<BundleListLoader> {
        Arc::new(BundleListLoader::new(backend, selection, errors, 200))
    }

    #[tokio::test]
    async fn test_reload_replaces_list_and_sends_filters() {
        let backend = Arc::new(MockBackend::new());
        backend.set_bundles(vec![bundle("b1"), bundle("b2")]);
        let loader = loader_with(
            Arc::clone(&backend),
            Arc::new(SelectionController::new()),
            Arc::new(ErrorSlot::new()),
        );

        let snapshot = FilterSnapshot {
            search_text: "mews".to_string(),
            group_filter: "Camden".to_string(),
            min_activity: 7,
        };
        loader.reload(&snapshot).await.unwrap();

        assert_eq!(loader.bundles().len(), 2);
        let queries = backend.list_queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].council, "Camden");
        assert_eq!(queries[0].q, "mews");
        assert_eq!(queries[0].min_apps, 7);
        assert_eq!(queries[0].limit, 200);
    }

    #[tokio::test]
    async fn test_reload_reports_default_selection_when_none() {
        let backend = Arc::new(MockBackend::new());
        backend.set_bundles(vec![bundle("first"), bundle("second")]);
        let loader = loader_with(
            backend,
            Arc::new(SelectionController::new()),
            Arc::new(ErrorSlot::new()),
        );

        let outcome = loader.reload(&filter(5)).await.unwrap();
        assert_eq!(
            outcome,
            ReloadOutcome::Applied {
                default_selection: Some("first".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_reload_keeps_existing_selection() {
        let backend = Arc::new(MockBackend::new());
        backend.set_bundles(vec![bundle("first")]);
        let selection = Arc::new(SelectionController::new());
        selection.select("elsewhere");
        let loader = loader_with(backend, Arc::clone(&selection), Arc::new(ErrorSlot::new()));

        let outcome = loader.reload(&filter(5)).await.unwrap();
        assert_eq!(
            outcome,
            ReloadOutcome::Applied {
                default_selection: None
            }
        );
        assert_eq!(selection.current().as_deref(), Some("elsewhere"));
    }

    #[tokio::test]
    async fn test_empty_result_reports_no_default() {
        let backend = Arc::new(MockBackend::new());
        let loader = loader_with(
            backend,
            Arc::new(SelectionController::new()),
            Arc::new(ErrorSlot::new()),
        );
        let outcome = loader.reload(&filter(5)).await.unwrap();
        assert_eq!(
            outcome,
            ReloadOutcome::Applied {
                default_selection: None
            }
        );
        assert!(loader.bundles().is_empty());
    }

    #[tokio::test]
    async fn test_failure_clears_list_and_keeps_selection() {
        let backend = Arc::new(MockBackend::new());
        backend.set_bundles(vec![bundle("b1")]);
        let selection = Arc::new(SelectionController::new());
        selection.select("b1");
        let errors = Arc::new(ErrorSlot::new());
        let loader = loader_with(
            Arc::clone(&backend),
            Arc::clone(&selection),
            Arc::clone(&errors),
        );

        loader.reload(&filter(5)).await.unwrap();
        assert_eq!(loader.bundles().len(), 1);

        backend.fail_list(true);
        let result = loader.reload(&filter(5)).await;
        assert!(matches!(result, Err(PlandeckError::ListFetch(_))));
        assert!(loader.bundles().is_empty());
        assert!(errors.current().unwrap().contains("Bundle list fetch failed"));
        // The stale selection stays; the detail panes are governed elsewhere.
        assert_eq!(selection.current().as_deref(), Some("b1"));
    }

    #[tokio::test]
    async fn test_superseded_reload_never_overwrites_newer_one() {
        let backend = Arc::new(MockBackend::new());
        backend.set_bundles(vec![bundle("old")]);
        let gate = backend.gate("list");
        let loader = loader_with(
            Arc::clone(&backend),
            Arc::new(SelectionController::new()),
            Arc::new(ErrorSlot::new()),
        );

        let slow = {
            let loader = Arc::clone(&loader);
            tokio::spawn(async move { loader.reload(&filter(5)).await })
        };
        gate.entered().await;

        // Filters changed; a newer reload lands first.
        backend.set_bundles(vec![bundle("new")]);
        let outcome = loader.reload(&filter(3)).await.unwrap();
        assert_eq!(
            outcome,
            ReloadOutcome::Applied {
                default_selection: Some("new".to_string())
            }
        );

        gate.open();
        let stale = slow.await.unwrap().unwrap();
        assert_eq!(stale, ReloadOutcome::Superseded);
        // The older response did not roll the list back.
        assert_eq!(loader.bundles().len(), 1);
        assert_eq!(loader.bundles()[0].id, "new");
    }

    #[tokio::test]
    async fn test_superseded_failure_is_silent() {
        let backend = Arc::new(MockBackend::new());
        backend.fail_list(true);
        let gate = backend.gate("list");
        let errors = Arc::new(ErrorSlot::new());
        let loader = loader_with(
            Arc::clone(&backend),
            Arc::new(SelectionController::new()),
            Arc::clone(&errors),
        );

        let slow = {
            let loader = Arc::clone(&loader);
            tokio::spawn(async move { loader.reload(&filter(5)).await })
        };
        gate.entered().await;

        backend.fail_list(false);
        backend.set_bundles(vec![bundle("kept")]);
        loader.reload(&filter(5)).await.unwrap();

        gate.open();
        let stale = slow.await.unwrap().unwrap();
        assert_eq!(stale, ReloadOutcome::Superseded);
        assert_eq!(loader.bundles().len(), 1);
        assert!(errors.current().is_none());
    }
}
