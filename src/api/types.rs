//! Request and response types for the tracker API.
//!
//! These types model the wire format of the issue endpoints: list pages,
//! single issues, assignee rosters, and the create/update request bodies.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The lifecycle status of an issue.
///
/// `Verified` is reachable only through the dedicated verification action
/// (`POST /issues/{id}/verify`), never through a plain field update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
    Verified,
    Closed,
}

impl IssueStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [IssueStatus; 5] = [
        IssueStatus::Open,
        IssueStatus::InProgress,
        IssueStatus::Resolved,
        IssueStatus::Verified,
        IssueStatus::Closed,
    ];

    /// The wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Verified => "verified",
            IssueStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(IssueStatus::Open),
            "in_progress" => Ok(IssueStatus::InProgress),
            "resolved" => Ok(IssueStatus::Resolved),
            "verified" => Ok(IssueStatus::Verified),
            "closed" => Ok(IssueStatus::Closed),
            other => Err(format!("unknown issue status '{}'", other)),
        }
    }
}

/// The priority of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    /// The wire representation of this priority.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// The column a list request is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Id,
    CreatedAt,
    UpdatedAt,
    Priority,
    IssueStatus,
    Title,
}

impl SortKey {
    /// The wire representation of this sort key.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::CreatedAt => "created_at",
            SortKey::UpdatedAt => "updated_at",
            SortKey::Priority => "priority",
            SortKey::IssueStatus => "issue_status",
            SortKey::Title => "title",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortKey::Id),
            "created_at" => Ok(SortKey::CreatedAt),
            "updated_at" => Ok(SortKey::UpdatedAt),
            "priority" => Ok(SortKey::Priority),
            "issue_status" => Ok(SortKey::IssueStatus),
            "title" => Ok(SortKey::Title),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}

/// Sort direction for list requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// The wire representation of this order.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// The opposite direction.
    pub fn reversed(&self) -> SortOrder {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// A tracker issue.
///
/// Returned by `GET /issues/{id}` and as part of list pages. The verifier
/// fields are populated only once the issue has gone through verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Server-assigned identifier.
    pub id: i64,
    /// The issue title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub issue_description: Option<String>,
    /// Current lifecycle status.
    pub issue_status: IssueStatus,
    /// Current priority.
    pub priority: Priority,
    /// Assignee id, if assigned.
    #[serde(default)]
    pub assignee_id: Option<i64>,
    /// Denormalized assignee display name.
    #[serde(default)]
    pub assignee: Option<String>,
    /// Verifier id, present only when the status is `verified`.
    #[serde(default)]
    pub verifier_id: Option<i64>,
    /// Denormalized verifier display name.
    #[serde(default)]
    pub verifier: Option<String>,
    /// When the issue was created (server-assigned).
    pub created_at: NaiveDateTime,
    /// When the issue was last mutated (server-assigned).
    pub updated_at: NaiveDateTime,
}

impl Issue {
    /// The assignee display name, or "-" when unassigned.
    pub fn assignee_name(&self) -> &str {
        self.assignee.as_deref().unwrap_or("-")
    }

    /// The verifier display name, or "-" when not verified.
    pub fn verifier_name(&self) -> &str {
        self.verifier.as_deref().unwrap_or("-")
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}: {}", self.id, self.title)
    }
}

/// One page of list results.
///
/// Returned by `GET /issues`. Replaced wholesale on every successful fetch;
/// page and pageSize echo back the values the server used to produce it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePage {
    /// The 1-based page this result holds.
    pub page: u32,
    /// The page size used to produce it.
    pub page_size: u32,
    /// Total number of matching issues across all pages.
    pub total_count: u64,
    /// The issues on this page.
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl IssuePage {
    /// True when no issue matched the query at all.
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

/// A member of the assignee roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    /// Server-assigned identifier.
    pub id: i64,
    /// Display name, unique within the roster.
    pub name: String,
}

impl fmt::Display for Assignee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Response wrapper for the roster endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssigneeList {
    #[serde(default)]
    pub assignees: Vec<Assignee>,
}

/// The full and available assignee rosters, fetched together.
///
/// The available subset holds assignees eligible for auto-assignment today;
/// its composition is an opaque server-side rule.
#[derive(Debug, Clone, Default)]
pub struct AssigneeRosters {
    /// Every assignee known to the server.
    pub all: Vec<Assignee>,
    /// The subset eligible for auto-assignment.
    pub available: Vec<Assignee>,
}

/// Request body for `POST /issues`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    pub issue_description: Option<String>,
    pub issue_status: IssueStatus,
    pub priority: Priority,
    /// Omitting the assignee asks the server to auto-assign from the
    /// available roster.
    pub assignee_id: Option<i64>,
}

/// Request body for `PUT /issues/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueUpdate {
    pub title: String,
    pub issue_description: Option<String>,
    pub issue_status: IssueStatus,
    pub priority: Priority,
    pub assignee_id: Option<i64>,
}
