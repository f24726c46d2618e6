//! Async task management for non-blocking API operations.
//!
//! This module lets the session run API calls in background tasks while the
//! owning loop stays responsive. It uses a tokio channel to communicate
//! results back:
//!
//! 1. The session decides an operation is needed (e.g. the query state went
//!    dirty) and asks the [`TaskSpawner`] to run it
//! 2. The spawner clones what it needs and spawns a tokio task
//! 3. The task sends an [`ApiMessage`] through the channel on completion
//! 4. The session drains the channel with `try_recv()` and applies results
//!
//! List fetches carry the sequence number they were issued under so the
//! session can discard responses superseded by a later request.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::types::{AssigneeRosters, Issue, IssuePage};
use crate::api::IssueApi;
use crate::form::{FormController, SubmitResult};

/// Messages sent from background tasks to the owning loop.
#[derive(Debug)]
pub enum ApiMessage {
    /// A list page arrived for the fetch issued under `seq`.
    IssuesFetched {
        seq: u64,
        result: Result<IssuePage, String>,
    },

    /// Both assignee rosters arrived (or the fetch failed as a whole).
    RostersFetched {
        result: Result<AssigneeRosters, String>,
    },

    /// A create/edit/verify submission finished.
    IssueSubmitted { result: SubmitResult },

    /// A single issue arrived for the detail view.
    IssueFetched { result: Result<Issue, String> },
}

/// Spawns background tasks for async operations.
///
/// Holds the channel sender; each method clones the API handle and spawns a
/// tokio task that reports its result through the channel.
#[derive(Clone)]
pub struct TaskSpawner {
    tx: mpsc::UnboundedSender<ApiMessage>,
}

impl TaskSpawner {
    /// Create a new spawner with the given channel sender.
    pub fn new(tx: mpsc::UnboundedSender<ApiMessage>) -> Self {
        Self { tx }
    }

    /// Spawn a list fetch for the given parameters, tagged with `seq`.
    pub fn spawn_fetch_issues(
        &self,
        api: &Arc<dyn IssueApi>,
        params: Vec<(&'static str, String)>,
        seq: u64,
    ) {
        let tx = self.tx.clone();
        let api = Arc::clone(api);
        tokio::spawn(async move {
            let result = api
                .list_issues(&params)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::IssuesFetched { seq, result });
        });
    }

    /// Spawn a fetch of both assignee rosters.
    pub fn spawn_fetch_rosters(&self, api: &Arc<dyn IssueApi>) {
        let tx = self.tx.clone();
        let api = Arc::clone(api);
        tokio::spawn(async move {
            let (all, available) = tokio::join!(api.assignees(), api.available_assignees());
            let result = all
                .and_then(|all| available.map(|available| AssigneeRosters { all, available }))
                .map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::RostersFetched { result });
        });
    }

    /// Spawn a form submission.
    pub fn spawn_submit(&self, api: &Arc<dyn IssueApi>, controller: FormController) {
        let tx = self.tx.clone();
        let api = Arc::clone(api);
        tokio::spawn(async move {
            let result = controller.submit(api.as_ref()).await;
            let _ = tx.send(ApiMessage::IssueSubmitted { result });
        });
    }

    /// Spawn a single-issue fetch for the detail view.
    pub fn spawn_fetch_issue(&self, api: &Arc<dyn IssueApi>, id: i64) {
        let tx = self.tx.clone();
        let api = Arc::clone(api);
        tokio::spawn(async move {
            let result = api.get_issue(id).await.map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::IssueFetched { result });
        });
    }
}

/// Create a new task channel and spawner.
///
/// The receiver is polled by the owning loop; the spawner is handed to
/// whatever needs to start background work.
pub fn create_task_channel() -> (mpsc::UnboundedReceiver<ApiMessage>, TaskSpawner) {
    let (tx, rx) = mpsc::unbounded_channel();
    (rx, TaskSpawner::new(tx))
}
