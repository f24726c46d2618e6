//! Query state for the issue list.
//!
//! Holds the current search/filter/sort/pagination parameters in one place
//! so the reset rules are enforceable, and tracks a dirty flag the fetch
//! layer drains. Setters never perform I/O; they only record the change and
//! mark the state dirty for the next fetch.

use tracing::{debug, warn};

use crate::api::types::{IssueStatus, Priority, SortKey, SortOrder};
use crate::pagination::clamp_page;

/// Page sizes the list view offers.
pub const PAGE_SIZES: [u32; 4] = [5, 10, 20, 50];

/// Default page size when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// The current search/filter/sort/pagination parameters.
///
/// Changing search text, status, priority, the assignee filter, or the page
/// size resets the current page to 1. Changing the sort key or direction
/// keeps the page but still marks the state dirty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    search: String,
    status: Option<IssueStatus>,
    priority: Option<Priority>,
    assignee: Option<String>,
    sort_by: SortKey,
    order: SortOrder,
    page: u32,
    page_size: u32,
    dirty: bool,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            priority: None,
            assignee: None,
            sort_by: SortKey::CreatedAt,
            order: SortOrder::Desc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            dirty: true,
        }
    }
}

impl QueryState {
    /// Create query state with a configured page size.
    ///
    /// Values outside [`PAGE_SIZES`] fall back to the default.
    pub fn with_page_size(page_size: u32) -> Self {
        let mut state = Self::default();
        if PAGE_SIZES.contains(&page_size) {
            state.page_size = page_size;
        } else {
            warn!(page_size, "ignoring page size outside the allowed set");
        }
        state
    }

    /// Set the search text. Resets the page to 1 on change.
    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if self.search != search {
            self.search = search;
            self.reset_page();
        }
    }

    /// Set or clear the status filter. Resets the page to 1 on change.
    pub fn set_status(&mut self, status: Option<IssueStatus>) {
        if self.status != status {
            self.status = status;
            self.reset_page();
        }
    }

    /// Set or clear the priority filter. Resets the page to 1 on change.
    pub fn set_priority(&mut self, priority: Option<Priority>) {
        if self.priority != priority {
            self.priority = priority;
            self.reset_page();
        }
    }

    /// Set or clear the assignee-name filter. Resets the page to 1 on change.
    pub fn set_assignee(&mut self, assignee: Option<String>) {
        if self.assignee != assignee {
            self.assignee = assignee;
            self.reset_page();
        }
    }

    /// Set the sort key. Keeps the current page but triggers a refetch.
    pub fn set_sort_by(&mut self, sort_by: SortKey) {
        if self.sort_by != sort_by {
            self.sort_by = sort_by;
            self.dirty = true;
        }
    }

    /// Set the sort direction. Keeps the current page but triggers a refetch.
    pub fn set_order(&mut self, order: SortOrder) {
        if self.order != order {
            self.order = order;
            self.dirty = true;
        }
    }

    /// Navigate to a page. Bounds are enforced by the caller against the
    /// current pager; this only records the target.
    pub fn set_page(&mut self, page: u32) {
        if self.page != page {
            self.page = page;
            self.dirty = true;
        }
    }

    /// Set the page size. Resets the page to 1 on change; values outside
    /// the allowed set are ignored.
    pub fn set_page_size(&mut self, page_size: u32) {
        if !PAGE_SIZES.contains(&page_size) {
            warn!(page_size, "ignoring page size outside the allowed set");
            return;
        }
        if self.page_size != page_size {
            self.page_size = page_size;
            self.reset_page();
        }
    }

    /// Pull the current page back into `[1, total_pages]` after a fetch.
    ///
    /// When filters shrink the result set under the requested page, this
    /// marks the state dirty so the follow-up fetch lands on a real page.
    pub fn clamp_to(&mut self, total_pages: u32) {
        let clamped = clamp_page(self.page, total_pages);
        if clamped != self.page {
            debug!(from = self.page, to = clamped, "clamping page after fetch");
            self.page = clamped;
            self.dirty = true;
        }
    }

    fn reset_page(&mut self) {
        self.page = 1;
        self.dirty = true;
    }

    /// Take the dirty flag, leaving the state clean.
    ///
    /// The fetch layer drains this once per state change, which keeps the
    /// change-to-fetch relationship auditable.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Force a refetch without changing any parameter.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether a fetch is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The current page (1-based).
    pub fn page(&self) -> u32 {
        self.page
    }

    /// The current page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The current search text.
    pub fn search(&self) -> &str {
        &self.search
    }

    /// The current status filter.
    pub fn status(&self) -> Option<IssueStatus> {
        self.status
    }

    /// The current priority filter.
    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }

    /// The current assignee-name filter.
    pub fn assignee(&self) -> Option<&str> {
        self.assignee.as_deref()
    }

    /// The current sort key.
    pub fn sort_by(&self) -> SortKey {
        self.sort_by
    }

    /// The current sort direction.
    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Build the list request parameters.
    ///
    /// Absent filters are omitted entirely, never sent as empty strings.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(8);

        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("search", search.to_string()));
        }
        if let Some(status) = self.status {
            params.push(("issue_status", status.as_str().to_string()));
        }
        if let Some(priority) = self.priority {
            params.push(("priority", priority.as_str().to_string()));
        }
        if let Some(assignee) = self.assignee.as_deref() {
            if !assignee.is_empty() {
                params.push(("assignee_name", assignee.to_string()));
            }
        }
        params.push(("sort_by", self.sort_by.as_str().to_string()));
        params.push(("order", self.order.as_str().to_string()));
        params.push(("page", self.page.to_string()));
        params.push(("pageSize", self.page_size.to_string()));

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_default_is_dirty_for_initial_fetch() {
        let mut state = QueryState::default();
        assert!(state.take_dirty());
        assert!(!state.take_dirty());
    }

    #[test]
    fn test_search_change_resets_page() {
        let mut state = QueryState::default();
        state.set_page(3);
        state.take_dirty();

        state.set_search("login");
        assert_eq!(state.page(), 1);
        assert!(state.take_dirty());
    }

    #[test]
    fn test_status_filter_resets_page() {
        let mut state = QueryState::default();
        state.set_page(2);

        state.set_status(Some(IssueStatus::Open));
        assert_eq!(state.page(), 1);
        assert!(state.is_dirty());
    }

    #[test]
    fn test_priority_filter_resets_page() {
        let mut state = QueryState::default();
        state.set_page(2);

        state.set_priority(Some(Priority::High));
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_assignee_filter_resets_page() {
        let mut state = QueryState::default();
        state.set_page(2);

        state.set_assignee(Some("Dana".to_string()));
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_page_size_change_resets_page() {
        let mut state = QueryState::default();
        state.set_page(4);

        state.set_page_size(20);
        assert_eq!(state.page(), 1);
        assert_eq!(state.page_size(), 20);
    }

    #[test]
    fn test_sort_change_keeps_page_but_marks_dirty() {
        let mut state = QueryState::default();
        state.set_page(3);
        state.take_dirty();

        state.set_sort_by(SortKey::Priority);
        assert_eq!(state.page(), 3);
        assert!(state.take_dirty());

        state.set_order(SortOrder::Asc);
        assert_eq!(state.page(), 3);
        assert!(state.take_dirty());
    }

    #[test]
    fn test_unchanged_value_does_not_mark_dirty() {
        let mut state = QueryState::default();
        state.take_dirty();

        state.set_search("");
        state.set_status(None);
        state.set_sort_by(SortKey::CreatedAt);
        state.set_order(SortOrder::Desc);
        assert!(!state.is_dirty());
    }

    #[test]
    fn test_disallowed_page_size_ignored() {
        let mut state = QueryState::default();
        state.take_dirty();

        state.set_page_size(7);
        assert_eq!(state.page_size(), DEFAULT_PAGE_SIZE);
        assert!(!state.is_dirty());
    }

    #[test]
    fn test_with_page_size_validates() {
        assert_eq!(QueryState::with_page_size(50).page_size(), 50);
        assert_eq!(QueryState::with_page_size(3).page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_params_omit_unset_filters() {
        let state = QueryState::default();
        let params = state.to_params();

        assert!(param(&params, "search").is_none());
        assert!(param(&params, "issue_status").is_none());
        assert!(param(&params, "priority").is_none());
        assert!(param(&params, "assignee_name").is_none());
        assert_eq!(param(&params, "sort_by"), Some("created_at"));
        assert_eq!(param(&params, "order"), Some("desc"));
        assert_eq!(param(&params, "page"), Some("1"));
        assert_eq!(param(&params, "pageSize"), Some("10"));
    }

    #[test]
    fn test_params_include_set_filters() {
        let mut state = QueryState::default();
        state.set_search("  export  ");
        state.set_status(Some(IssueStatus::InProgress));
        state.set_priority(Some(Priority::Critical));
        state.set_assignee(Some("Lee".to_string()));
        state.set_sort_by(SortKey::Title);
        state.set_order(SortOrder::Asc);

        let params = state.to_params();
        assert_eq!(param(&params, "search"), Some("export"));
        assert_eq!(param(&params, "issue_status"), Some("in_progress"));
        assert_eq!(param(&params, "priority"), Some("critical"));
        assert_eq!(param(&params, "assignee_name"), Some("Lee"));
        assert_eq!(param(&params, "sort_by"), Some("title"));
        assert_eq!(param(&params, "order"), Some("asc"));
    }

    #[test]
    fn test_whitespace_search_omitted() {
        let mut state = QueryState::default();
        state.set_search("   ");
        assert!(param(&state.to_params(), "search").is_none());
    }

    #[test]
    fn test_filter_reset_happens_before_params_are_built() {
        let mut state = QueryState::default();
        state.set_page(3);
        state.take_dirty();

        state.set_priority(Some(Priority::High));
        let params = state.to_params();
        assert_eq!(param(&params, "page"), Some("1"));
    }

    #[test]
    fn test_clamp_to_marks_dirty_when_out_of_range() {
        let mut state = QueryState::default();
        state.set_page(5);
        state.take_dirty();

        state.clamp_to(2);
        assert_eq!(state.page(), 2);
        assert!(state.take_dirty());
    }

    #[test]
    fn test_clamp_to_noop_in_range() {
        let mut state = QueryState::default();
        state.set_page(2);
        state.take_dirty();

        state.clamp_to(3);
        assert_eq!(state.page(), 2);
        assert!(!state.is_dirty());
    }
}
