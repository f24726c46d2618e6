//! Create/edit form controller.
//!
//! Holds the mutable draft for a create or edit session, applies the
//! verification-branch validation rule, and submits through the correct
//! endpoint(s). Verification is special on both paths: the server never
//! accepts `verified` directly on creation, so a verified create is a
//! create-as-resolved followed by the dedicated verify action, and a
//! verified edit sends only the verify action.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::types::{Issue, IssueStatus, IssueUpdate, NewIssue, Priority};
use crate::api::{ApiError, IssueApi};

/// The draft field a validation error points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Verifier,
}

/// Client-side validation failures. These block submission entirely; no
/// request is issued while one holds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The title is empty or whitespace.
    #[error("title must not be empty")]
    EmptyTitle,

    /// Status is `verified` but no verifier was selected.
    #[error("a verifier is required to mark an issue verified")]
    MissingVerifier,
}

impl ValidationError {
    /// The field to surface this error on.
    pub fn field(&self) -> DraftField {
        match self {
            ValidationError::EmptyTitle => DraftField::Title,
            ValidationError::MissingVerifier => DraftField::Verifier,
        }
    }
}

/// Errors from a form submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Rejected before any request was sent.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The API rejected the operation; nothing was changed client-side.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// The create succeeded but the follow-up verification failed, leaving
    /// the record as `resolved` instead of `verified`.
    #[error("issue #{} created as resolved; verification failed: {source}", .created.id)]
    PartialFailure {
        /// The issue that now exists on the server.
        created: Issue,
        source: ApiError,
    },
}

/// Result type for submissions.
pub type SubmitResult = Result<Issue, SubmitError>;

/// The mutable scratch state behind the create/edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: IssueStatus,
    pub priority: Priority,
    /// Absent means the server auto-assigns from the available roster.
    pub assignee_id: Option<i64>,
    /// Only meaningful when `status` is `verified`.
    pub verifier_id: Option<i64>,
}

impl Default for IssueDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            status: IssueStatus::Open,
            priority: Priority::Medium,
            assignee_id: None,
            verifier_id: None,
        }
    }
}

impl IssueDraft {
    /// Pre-populate a draft from an existing issue for editing.
    pub fn from_issue(issue: &Issue) -> Self {
        Self {
            title: issue.title.clone(),
            description: issue.issue_description.clone(),
            status: issue.issue_status,
            priority: issue.priority,
            assignee_id: issue.assignee_id,
            verifier_id: issue.verifier_id,
        }
    }

    /// Check the draft against the pre-request rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.status == IssueStatus::Verified && self.verifier_id.is_none() {
            return Err(ValidationError::MissingVerifier);
        }
        Ok(())
    }

    /// Build the create body, overriding the status where the two-step
    /// verified flow requires it.
    fn to_new_issue(&self, status: IssueStatus) -> NewIssue {
        NewIssue {
            title: self.title.trim().to_string(),
            issue_description: self.description.clone(),
            issue_status: status,
            priority: self.priority,
            assignee_id: self.assignee_id,
        }
    }

    /// Build the update body.
    fn to_update(&self) -> IssueUpdate {
        IssueUpdate {
            title: self.title.trim().to_string(),
            issue_description: self.description.clone(),
            issue_status: self.status,
            priority: self.priority,
            assignee_id: self.assignee_id,
        }
    }
}

/// Whether the form is creating a new issue or editing an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(i64),
}

/// The create/edit form controller.
///
/// Owns the draft for one form session. Created when the form opens,
/// dropped on cancel or successful submit.
#[derive(Debug, Clone)]
pub struct FormController {
    mode: FormMode,
    draft: IssueDraft,
}

impl FormController {
    /// Open a create form with an empty draft.
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            draft: IssueDraft::default(),
        }
    }

    /// Open an edit form pre-populated from `issue`.
    pub fn edit(issue: &Issue) -> Self {
        Self {
            mode: FormMode::Edit(issue.id),
            draft: IssueDraft::from_issue(issue),
        }
    }

    /// The form mode.
    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// The current draft.
    pub fn draft(&self) -> &IssueDraft {
        &self.draft
    }

    /// Mutable access to the draft for field edits.
    pub fn draft_mut(&mut self) -> &mut IssueDraft {
        &mut self.draft
    }

    /// Validate and submit the draft.
    ///
    /// On any error the draft is left untouched so the form can stay open
    /// with the user's input intact.
    pub async fn submit(&self, api: &dyn IssueApi) -> SubmitResult {
        self.draft.validate()?;

        match self.mode {
            FormMode::Create => submit_create(&self.draft, api).await,
            FormMode::Edit(id) => submit_edit(id, &self.draft, api).await,
        }
    }
}

/// Submit a validated create draft.
///
/// A draft with status `verified` takes the two-step path: create the
/// record as `resolved`, then verify it with the chosen verifier. The
/// verify call runs only if the create succeeded; a verify failure is
/// reported as a partial failure carrying the created issue.
async fn submit_create(draft: &IssueDraft, api: &dyn IssueApi) -> SubmitResult {
    if draft.status == IssueStatus::Verified {
        // Validation guarantees the verifier is present on this branch.
        let verifier_id = draft
            .verifier_id
            .ok_or(ValidationError::MissingVerifier)?;

        let created = api
            .create_issue(&draft.to_new_issue(IssueStatus::Resolved))
            .await?;
        debug!(issue_id = created.id, "created, running verification");

        match api.verify_issue(created.id, verifier_id).await {
            Ok(verified) => {
                info!(issue_id = verified.id, "issue created and verified");
                Ok(verified)
            }
            Err(source) => {
                warn!(
                    issue_id = created.id,
                    "verification failed after create: {}", source
                );
                Err(SubmitError::PartialFailure { created, source })
            }
        }
    } else {
        let created = api.create_issue(&draft.to_new_issue(draft.status)).await?;
        info!(issue_id = created.id, "issue created");
        Ok(created)
    }
}

/// Submit a validated edit draft.
///
/// Editing into `verified` issues only the verify action; the other draft
/// fields are not applied in that operation. This mirrors the tracker's
/// transition rule that `verified` is reachable only through verification.
async fn submit_edit(id: i64, draft: &IssueDraft, api: &dyn IssueApi) -> SubmitResult {
    if draft.status == IssueStatus::Verified {
        let verifier_id = draft
            .verifier_id
            .ok_or(ValidationError::MissingVerifier)?;

        let verified = api.verify_issue(id, verifier_id).await?;
        info!(issue_id = id, "issue verified");
        Ok(verified)
    } else {
        let updated = api.update_issue(id, &draft.to_update()).await?;
        info!(issue_id = id, "issue updated");
        Ok(updated)
    }
}
