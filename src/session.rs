//! Session state and orchestration.
//!
//! The session owns the query state, the current list result, the assignee
//! rosters, and the open form, and decides what request to issue when any of
//! them changes. All state changes flow through here so the reset and
//! staleness rules live in one place.
//!
//! Fetches run on background tasks (see [`crate::tasks`]); the owning loop
//! feeds completed results back through [`Session::handle_message`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::types::{
    AssigneeRosters, Issue, IssuePage, IssueStatus, Priority, SortKey, SortOrder,
};
use crate::api::IssueApi;
use crate::form::{FormController, SubmitError};
use crate::pagination::Pager;
use crate::query::QueryState;
use crate::tasks::{ApiMessage, TaskSpawner};

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// A one-line message for the user, replacing the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }
}

/// One browsing session against the tracker.
///
/// Owns the query state and issue draft exclusively; the list result and
/// rosters it holds are read-only to everything else.
pub struct Session {
    api: Arc<dyn IssueApi>,
    spawner: TaskSpawner,
    query: QueryState,
    /// The last applied list result; kept on fetch failure.
    result: Option<IssuePage>,
    pager: Pager,
    rosters: AssigneeRosters,
    /// The open create/edit form, if any.
    form: Option<FormController>,
    /// A submission is in flight; blocks a second submit.
    submitting: bool,
    /// Sequence number of the most recently issued list fetch.
    issued_seq: u64,
    /// A single issue loaded for the detail view.
    detail: Option<Issue>,
    notice: Option<Notice>,
}

impl Session {
    /// Create a session. Call [`Session::start`] to issue the initial
    /// fetches.
    pub fn new(api: Arc<dyn IssueApi>, spawner: TaskSpawner, page_size: u32) -> Self {
        Self {
            api,
            spawner,
            query: QueryState::with_page_size(page_size),
            result: None,
            pager: Pager::default(),
            rosters: AssigneeRosters::default(),
            form: None,
            submitting: false,
            issued_seq: 0,
            detail: None,
            notice: None,
        }
    }

    /// Issue the initial list fetch and roster fetch.
    pub fn start(&mut self) {
        debug!("starting session");
        self.spawner.spawn_fetch_rosters(&self.api);
        self.sync();
    }

    // ========================================================================
    // Query mutations
    // ========================================================================

    /// Change the search text.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.set_search(search);
        self.sync();
    }

    /// Change or clear the status filter.
    pub fn set_status_filter(&mut self, status: Option<IssueStatus>) {
        self.query.set_status(status);
        self.sync();
    }

    /// Change or clear the priority filter.
    pub fn set_priority_filter(&mut self, priority: Option<Priority>) {
        self.query.set_priority(priority);
        self.sync();
    }

    /// Change or clear the assignee-name filter.
    pub fn set_assignee_filter(&mut self, assignee: Option<String>) {
        self.query.set_assignee(assignee);
        self.sync();
    }

    /// Change the sort key.
    pub fn set_sort_by(&mut self, sort_by: SortKey) {
        self.query.set_sort_by(sort_by);
        self.sync();
    }

    /// Change the sort direction.
    pub fn set_order(&mut self, order: SortOrder) {
        self.query.set_order(order);
        self.sync();
    }

    /// Change the page size.
    pub fn set_page_size(&mut self, page_size: u32) {
        self.query.set_page_size(page_size);
        self.sync();
    }

    /// Go to the next page. No-op on the last page.
    pub fn next_page(&mut self) {
        if self.pager.has_next() {
            self.query.set_page(self.pager.current_page + 1);
            self.sync();
        }
    }

    /// Go to the previous page. No-op on the first page.
    pub fn prev_page(&mut self) {
        if self.pager.has_prev() {
            self.query.set_page(self.pager.current_page - 1);
            self.sync();
        }
    }

    /// Jump to a specific page. Requests outside the known range are
    /// ignored, never wrapped.
    pub fn go_to_page(&mut self, page: u32) {
        if self.pager.contains(page) {
            self.query.set_page(page);
            self.sync();
        } else {
            debug!(page, total = self.pager.total_pages, "ignoring out-of-range page request");
        }
    }

    /// Re-fetch the list with unchanged parameters.
    pub fn refresh(&mut self) {
        self.query.mark_dirty();
        self.sync();
    }

    /// Issue a list fetch if the query state is dirty.
    ///
    /// Every state change funnels through here: one effective change, one
    /// request, tagged with the next sequence number.
    fn sync(&mut self) {
        if self.query.take_dirty() {
            self.issued_seq += 1;
            debug!(seq = self.issued_seq, "issuing list fetch");
            self.spawner
                .spawn_fetch_issues(&self.api, self.query.to_params(), self.issued_seq);
        }
    }

    // ========================================================================
    // Form lifecycle
    // ========================================================================

    /// Open an empty create form. Replaces any open form.
    pub fn open_create_form(&mut self) {
        self.form = Some(FormController::create());
    }

    /// Open an edit form pre-populated from `issue`.
    pub fn open_edit_form(&mut self, issue: &Issue) {
        self.form = Some(FormController::edit(issue));
    }

    /// Discard the open form and its draft.
    pub fn cancel_form(&mut self) {
        self.form = None;
        self.submitting = false;
    }

    /// The open form, if any.
    pub fn form(&self) -> Option<&FormController> {
        self.form.as_ref()
    }

    /// Mutable access to the open form for field edits.
    pub fn form_mut(&mut self) -> Option<&mut FormController> {
        self.form.as_mut()
    }

    /// Submit the open form.
    ///
    /// Validation runs here, before anything is spawned: an invalid draft
    /// surfaces inline and issues zero requests.
    pub fn submit_form(&mut self) {
        if self.submitting {
            debug!("ignoring submit while one is in flight");
            return;
        }
        let Some(form) = self.form.as_ref() else {
            return;
        };

        if let Err(e) = form.draft().validate() {
            self.notice = Some(Notice::error(e.to_string()));
            return;
        }

        self.submitting = true;
        self.spawner.spawn_submit(&self.api, form.clone());
    }

    /// Whether a submission is in flight.
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    // ========================================================================
    // Detail view
    // ========================================================================

    /// Load a single issue for the detail view.
    pub fn open_detail(&mut self, id: i64) {
        self.spawner.spawn_fetch_issue(&self.api, id);
    }

    /// The loaded detail issue, if any.
    pub fn detail(&self) -> Option<&Issue> {
        self.detail.as_ref()
    }

    /// Drop the loaded detail issue.
    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    // ========================================================================
    // Message handling
    // ========================================================================

    /// Apply the result of a background task.
    pub fn handle_message(&mut self, message: ApiMessage) {
        match message {
            ApiMessage::IssuesFetched { seq, result } => self.apply_list_result(seq, result),
            ApiMessage::RostersFetched { result } => self.apply_rosters(result),
            ApiMessage::IssueSubmitted { result } => self.apply_submit_result(result),
            ApiMessage::IssueFetched { result } => match result {
                Ok(issue) => self.detail = Some(issue),
                Err(e) => self.notice = Some(Notice::error(format!("Failed to load issue: {}", e))),
            },
        }
    }

    /// Apply a list fetch result, discarding superseded responses.
    fn apply_list_result(&mut self, seq: u64, result: Result<IssuePage, String>) {
        if seq != self.issued_seq {
            debug!(
                seq,
                latest = self.issued_seq,
                "discarding stale list response"
            );
            return;
        }

        match result {
            Ok(page) => {
                self.pager = Pager::from_page(&page);
                self.query.clamp_to(self.pager.total_pages);
                self.result = Some(page);
                if matches!(self.notice, Some(Notice { kind: NoticeKind::Error, .. })) {
                    self.notice = None;
                }
                // A clamp means the requested page no longer exists; fetch
                // the page the user actually lands on.
                self.sync();
            }
            Err(e) => {
                warn!("list fetch failed: {}", e);
                self.notice = Some(Notice::error(format!("Failed to fetch issues: {}", e)));
            }
        }
    }

    /// Apply a roster fetch result, degrading to empty rosters on failure.
    fn apply_rosters(&mut self, result: Result<AssigneeRosters, String>) {
        match result {
            Ok(rosters) => self.rosters = rosters,
            Err(e) => {
                warn!("roster fetch failed, continuing with empty rosters: {}", e);
                self.rosters = AssigneeRosters::default();
            }
        }
    }

    /// Apply a submission result.
    fn apply_submit_result(&mut self, result: Result<Issue, SubmitError>) {
        self.submitting = false;

        match result {
            Ok(issue) => {
                info!(issue_id = issue.id, "submission succeeded");
                self.form = None;
                self.notice = Some(Notice::success(format!("Issue #{} saved", issue.id)));
                self.refresh_after_mutation();
            }
            Err(SubmitError::PartialFailure { created, source }) => {
                // The record exists on the server as resolved, so the form
                // is closed and the list refreshed; the notice says exactly
                // what state the issue landed in.
                self.form = None;
                self.notice = Some(Notice::error(format!(
                    "Issue #{} created as resolved; verification failed: {}",
                    created.id, source
                )));
                self.refresh_after_mutation();
            }
            Err(e) => {
                // Keep the form open with the user's input intact.
                self.notice = Some(Notice::error(e.to_string()));
            }
        }
    }

    /// Refresh the list and both rosters after a successful mutation; the
    /// available roster can change as a side effect of assignment.
    fn refresh_after_mutation(&mut self) {
        self.query.mark_dirty();
        self.sync();
        self.spawner.spawn_fetch_rosters(&self.api);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The issues on the current page.
    pub fn issues(&self) -> &[Issue] {
        self.result.as_ref().map(|r| r.issues.as_slice()).unwrap_or(&[])
    }

    /// The current list result, if one has arrived.
    pub fn result(&self) -> Option<&IssuePage> {
        self.result.as_ref()
    }

    /// Derived pagination state.
    pub fn pager(&self) -> Pager {
        self.pager
    }

    /// The assignee rosters.
    pub fn rosters(&self) -> &AssigneeRosters {
        &self.rosters
    }

    /// The current query state.
    pub fn query(&self) -> &QueryState {
        &self.query
    }

    /// The current user-visible notice, if any.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Clear the current notice.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Assignee, IssueUpdate, NewIssue};
    use crate::api::{ApiError, Result as ApiResult};
    use crate::form::ValidationError;
    use crate::tasks::create_task_channel;
    use async_trait::async_trait;
    use chrono::NaiveDateTime;

    /// Serves a fixed 12-issue data set, five per page by default.
    struct StubApi;

    fn ts() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-07-01T10:30:00", "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn issue(id: i64) -> Issue {
        Issue {
            id,
            title: format!("Issue {}", id),
            issue_description: None,
            issue_status: IssueStatus::Open,
            priority: Priority::Medium,
            assignee_id: None,
            assignee: None,
            verifier_id: None,
            verifier: None,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn page(page_no: u32, page_size: u32, total: u64, count: usize) -> IssuePage {
        IssuePage {
            page: page_no,
            page_size,
            total_count: total,
            issues: (0..count).map(|i| issue(i as i64 + 1)).collect(),
        }
    }

    #[async_trait]
    impl IssueApi for StubApi {
        async fn list_issues(&self, _params: &[(&'static str, String)]) -> ApiResult<IssuePage> {
            Ok(page(1, 10, 0, 0))
        }

        async fn get_issue(&self, id: i64) -> ApiResult<Issue> {
            Ok(issue(id))
        }

        async fn create_issue(&self, _body: &NewIssue) -> ApiResult<Issue> {
            Ok(issue(1))
        }

        async fn update_issue(&self, id: i64, _body: &IssueUpdate) -> ApiResult<Issue> {
            Ok(issue(id))
        }

        async fn verify_issue(&self, id: i64, _verifier_id: i64) -> ApiResult<Issue> {
            Ok(issue(id))
        }

        async fn assignees(&self) -> ApiResult<Vec<Assignee>> {
            Ok(vec![])
        }

        async fn available_assignees(&self) -> ApiResult<Vec<Assignee>> {
            Ok(vec![])
        }

        async fn health(&self) -> ApiResult<()> {
            Ok(())
        }
    }

    fn session() -> Session {
        let (_rx, spawner) = create_task_channel();
        Session::new(Arc::new(StubApi), spawner, 5)
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let mut session = session();
        session.start(); // seq 1

        // Two rapid filter changes: A then B.
        session.set_search("alpha"); // seq 2
        session.set_search("beta"); // seq 3

        // B's response arrives first and is applied.
        let b = page(1, 5, 2, 2);
        session.handle_message(ApiMessage::IssuesFetched {
            seq: 3,
            result: Ok(b),
        });
        assert_eq!(session.result().unwrap().total_count, 2);

        // A's slow response arrives afterwards and must be dropped.
        let a = page(1, 5, 7, 5);
        session.handle_message(ApiMessage::IssuesFetched {
            seq: 2,
            result: Ok(a),
        });
        assert_eq!(session.result().unwrap().total_count, 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_result() {
        let mut session = session();
        session.start();

        session.handle_message(ApiMessage::IssuesFetched {
            seq: 1,
            result: Ok(page(1, 5, 12, 5)),
        });
        assert_eq!(session.issues().len(), 5);

        session.refresh(); // seq 2
        session.handle_message(ApiMessage::IssuesFetched {
            seq: 2,
            result: Err("connection reset".to_string()),
        });

        // Previous page still shown, error surfaced.
        assert_eq!(session.issues().len(), 5);
        let notice = session.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.message.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_pagination_scenario_twelve_issues_page_size_five() {
        let mut session = session();
        session.start();

        session.handle_message(ApiMessage::IssuesFetched {
            seq: 1,
            result: Ok(page(1, 5, 12, 5)),
        });
        assert_eq!(session.pager().total_pages, 3);
        assert!(!session.pager().has_prev());

        session.go_to_page(3); // seq 2
        session.handle_message(ApiMessage::IssuesFetched {
            seq: 2,
            result: Ok(page(3, 5, 12, 2)),
        });

        assert_eq!(session.issues().len(), 2);
        assert!(!session.pager().has_next());
        assert!(session.pager().has_prev());

        // Next at the last page is a no-op: no new fetch gets issued.
        session.next_page();
        assert!(!session.query().is_dirty());
        assert_eq!(session.query().page(), 3);
    }

    #[tokio::test]
    async fn test_prev_on_first_page_is_noop() {
        let mut session = session();
        session.start();
        session.handle_message(ApiMessage::IssuesFetched {
            seq: 1,
            result: Ok(page(1, 5, 12, 5)),
        });

        session.prev_page();
        assert_eq!(session.query().page(), 1);
        assert!(!session.query().is_dirty());
    }

    #[tokio::test]
    async fn test_out_of_range_page_jump_ignored() {
        let mut session = session();
        session.start();
        session.handle_message(ApiMessage::IssuesFetched {
            seq: 1,
            result: Ok(page(1, 5, 12, 5)),
        });

        session.go_to_page(9);
        assert_eq!(session.query().page(), 1);

        session.go_to_page(0);
        assert_eq!(session.query().page(), 1);
    }

    #[tokio::test]
    async fn test_empty_filter_result_stays_on_page_one() {
        let mut session = session();
        session.start();

        session.set_priority_filter(Some(Priority::High)); // seq 2
        session.set_status_filter(Some(IssueStatus::Open)); // seq 3

        session.handle_message(ApiMessage::IssuesFetched {
            seq: 3,
            result: Ok(page(1, 5, 0, 0)),
        });

        assert!(session.issues().is_empty());
        assert_eq!(session.pager().total_pages, 1);
        assert_eq!(session.query().page(), 1);
    }

    #[tokio::test]
    async fn test_shrunken_result_clamps_and_refetches() {
        let mut session = session();
        session.start();
        session.handle_message(ApiMessage::IssuesFetched {
            seq: 1,
            result: Ok(page(1, 5, 30, 5)),
        });

        session.go_to_page(6); // seq 2

        // The result shrank while we were navigating; the server reports
        // only 2 pages now.
        session.handle_message(ApiMessage::IssuesFetched {
            seq: 2,
            result: Ok(page(6, 5, 8, 0)),
        });

        // Clamped back in range and a follow-up fetch issued (seq 3).
        assert_eq!(session.query().page(), 2);
        session.handle_message(ApiMessage::IssuesFetched {
            seq: 3,
            result: Ok(page(2, 5, 8, 3)),
        });
        assert_eq!(session.issues().len(), 3);
    }

    #[tokio::test]
    async fn test_roster_failure_degrades_to_empty() {
        let mut session = session();
        session.start();

        session.handle_message(ApiMessage::RostersFetched {
            result: Err("roster service down".to_string()),
        });

        assert!(session.rosters().all.is_empty());
        assert!(session.rosters().available.is_empty());
        // Roster failure never produces a blocking error.
        assert!(session.notice().is_none());
    }

    #[tokio::test]
    async fn test_invalid_submit_surfaces_inline_and_keeps_form() {
        let mut session = session();
        session.open_create_form();
        session.form_mut().unwrap().draft_mut().title = String::new();

        session.submit_form();

        assert!(!session.is_submitting());
        assert!(session.form().is_some());
        let notice = session.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(
            notice.message,
            ValidationError::EmptyTitle.to_string()
        );
    }

    #[tokio::test]
    async fn test_successful_submit_closes_form_and_refreshes() {
        let mut session = session();
        session.start(); // seq 1

        session.open_create_form();
        session.form_mut().unwrap().draft_mut().title = "New issue".to_string();
        session.submit_form();
        assert!(session.is_submitting());

        session.handle_message(ApiMessage::IssueSubmitted {
            result: Ok(issue(55)),
        });

        assert!(session.form().is_none());
        assert!(!session.is_submitting());
        assert_eq!(session.notice().unwrap().kind, NoticeKind::Success);
        // The mutation refresh bumped the sequence past the initial fetch.
        assert_eq!(session.issued_seq, 2);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_form_and_input() {
        let mut session = session();
        session.open_create_form();
        session.form_mut().unwrap().draft_mut().title = "Keep me".to_string();
        session.submit_form();

        session.handle_message(ApiMessage::IssueSubmitted {
            result: Err(SubmitError::Api(ApiError::ServerError(
                "boom".to_string(),
            ))),
        });

        assert!(!session.is_submitting());
        let form = session.form().expect("form should stay open");
        assert_eq!(form.draft().title, "Keep me");
        assert_eq!(session.notice().unwrap().kind, NoticeKind::Error);
    }

    #[tokio::test]
    async fn test_partial_failure_reports_distinct_message() {
        let mut session = session();
        session.start();

        session.open_create_form();
        {
            let draft = session.form_mut().unwrap().draft_mut();
            draft.title = "Verify me".to_string();
            draft.status = IssueStatus::Verified;
            draft.verifier_id = Some(3);
        }
        session.submit_form();

        let mut created = issue(70);
        created.issue_status = IssueStatus::Resolved;
        session.handle_message(ApiMessage::IssueSubmitted {
            result: Err(SubmitError::PartialFailure {
                created,
                source: ApiError::ServerError("verify timeout".to_string()),
            }),
        });

        // The record exists server-side, so the form closes and the list
        // refreshes, but the notice names the actual outcome.
        assert!(session.form().is_none());
        let notice = session.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.message.contains("created as resolved"));
        assert!(notice.message.contains("#70"));
    }

    #[tokio::test]
    async fn test_double_submit_is_ignored_while_in_flight() {
        let mut session = session();
        session.open_create_form();
        session.form_mut().unwrap().draft_mut().title = "Once".to_string();

        session.submit_form();
        assert!(session.is_submitting());
        // A second submit while one is in flight is dropped.
        session.submit_form();
        assert!(session.is_submitting());
    }

    #[tokio::test]
    async fn test_detail_fetch_applies() {
        let mut session = session();
        session.open_detail(42);

        session.handle_message(ApiMessage::IssueFetched {
            result: Ok(issue(42)),
        });
        assert_eq!(session.detail().unwrap().id, 42);

        session.close_detail();
        assert!(session.detail().is_none());
    }

    #[tokio::test]
    async fn test_error_notice_clears_on_next_successful_fetch() {
        let mut session = session();
        session.start();

        session.handle_message(ApiMessage::IssuesFetched {
            seq: 1,
            result: Err("timeout".to_string()),
        });
        assert!(session.notice().is_some());

        session.refresh(); // seq 2
        session.handle_message(ApiMessage::IssuesFetched {
            seq: 2,
            result: Ok(page(1, 5, 1, 1)),
        });
        assert!(session.notice().is_none());
    }
}
