use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    ContentFields, ContentItem, Feedback, ModerationState, Revision, RevisionDraft, Schedule,
};
use super::validation::{validate, validate_draft, Violation};
use crate::config::WorkflowConfig;
use crate::workflows::identifiers::{AccountId, ContentId, RevisionId};
use crate::workflows::notice::Notice;
use crate::workflows::notifications::{
    deliver, Notification, NotificationKey, NotificationPublisher,
};
use crate::workflows::store::{MarketplaceStore, RepositoryError};

/// Requested move of a content item to a new moderation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub target: ModerationState,
    pub actor: AccountId,
    pub log: String,
    /// Replacement fields; when absent the new revision copies its base.
    pub fields: Option<ContentFields>,
    pub schedule: Option<Schedule>,
}

impl TransitionRequest {
    pub fn new(target: ModerationState, actor: AccountId) -> Self {
        Self {
            target,
            actor,
            log: String::new(),
            fields: None,
            schedule: None,
        }
    }

    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = log.into();
        self
    }

    pub fn with_fields(mut self, fields: ContentFields) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }
}

/// Result of a transition: the updated item, the new revision and any notices.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub content: ContentItem,
    pub revision: Revision,
    pub notices: Vec<Notice>,
}

/// Revision-based editorial workflow for provider profiles and roles.
pub struct ModerationWorkflow<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    config: WorkflowConfig,
}

impl<S, N> ModerationWorkflow<S, N>
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: WorkflowConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub fn content(&self, id: ContentId) -> Result<ContentItem, ModerationError> {
        self.store
            .fetch_content(id)?
            .ok_or(ModerationError::ContentNotFound(id))
    }

    pub fn revision(&self, id: RevisionId) -> Result<Revision, ModerationError> {
        self.store
            .fetch_revision(id)?
            .ok_or(ModerationError::RevisionNotFound(id))
    }

    pub fn default_revision(&self, item: &ContentItem) -> Result<Revision, ModerationError> {
        self.revision(item.default_revision)
    }

    pub fn latest_revision(&self, item: &ContentItem) -> Result<Revision, ModerationError> {
        self.revision(item.latest_revision)
    }

    /// Violations of the default revision.
    pub fn violations(&self, item: &ContentItem) -> Result<Vec<Violation>, ModerationError> {
        let revision = self.default_revision(item)?;
        Ok(validate(item.kind, &revision))
    }

    /// Validated transition starting from the latest revision.
    pub fn transition(
        &self,
        content: ContentId,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, ModerationError> {
        let item = self.content(content)?;
        let latest = self.latest_revision(&item)?;

        if !latest.state.can_transition_to(request.target) {
            return Err(ModerationError::TransitionNotAllowed {
                from: latest.state,
                to: request.target,
            });
        }

        let draft = build_draft(&latest, &request);
        if request.target == ModerationState::ReadyForReview {
            let violations = validate_draft(item.kind, &draft);
            if !violations.is_empty() {
                return Err(ModerationError::Incomplete { violations });
            }
        }

        let (content, revision) = self.store_revision(&item, draft)?;
        tracing::info!(
            content = %content.id,
            from = latest.state.label(),
            to = revision.state.label(),
            "content moderated"
        );

        let mut notices = Vec::new();
        if notifies_owner(&revision) {
            self.notify_owner(&content, &revision, &mut notices)?;
        }

        Ok(TransitionOutcome {
            content,
            revision,
            notices,
        })
    }

    /// Move content from its default revision without consulting the
    /// transition table, running validation or notifying anyone.
    pub(crate) fn force_transition(
        &self,
        content: ContentId,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, ModerationError> {
        let item = self.content(content)?;
        let base = self.default_revision(&item)?;
        let draft = build_draft(&base, &request);
        let (content, revision) = self.store_revision(&item, draft)?;

        tracing::debug!(
            content = %content.id,
            state = revision.state.label(),
            "content state forced"
        );

        Ok(TransitionOutcome {
            content,
            revision,
            notices: Vec::new(),
        })
    }

    pub fn has_been_published(&self, content: ContentId) -> Result<bool, ModerationError> {
        Ok(self.first_published_on(content)?.is_some())
    }

    /// Creation time of the earliest published revision.
    pub fn first_published_on(
        &self,
        content: ContentId,
    ) -> Result<Option<DateTime<Utc>>, ModerationError> {
        let history = self.store.revision_history(content)?;
        Ok(history
            .iter()
            .find(|revision| revision.state.is_published())
            .map(|revision| revision.created_at))
    }

    /// Log of the first draft that followed the most recent review request.
    pub fn latest_feedback(&self, content: ContentId) -> Result<Option<Feedback>, ModerationError> {
        let history = self.store.revision_history(content)?;
        Ok(feedback_in(&history))
    }

    pub fn latest_revision_has_feedback(&self, item: &ContentItem) -> Result<bool, ModerationError> {
        let latest = self.latest_revision(item)?;
        Ok(!latest.log.trim().is_empty())
    }

    fn store_revision(
        &self,
        item: &ContentItem,
        draft: RevisionDraft,
    ) -> Result<(ContentItem, Revision), ModerationError> {
        let current_default = self.default_revision(item)?;
        let make_default =
            draft.state.is_default_revision_state() || !current_default.state.is_published();

        let revision = self.store.append_revision(draft, make_default)?;
        let content = self.content(item.id)?;
        Ok((content, revision))
    }

    fn notify_owner(
        &self,
        item: &ContentItem,
        revision: &Revision,
        notices: &mut Vec<Notice>,
    ) -> Result<(), ModerationError> {
        let Some(owner) = self.store.fetch_account(item.owner)? else {
            tracing::warn!(content = %item.id, owner = %item.owner, "content owner missing");
            return Ok(());
        };

        let mut body = format!(
            "The {} \"{}\" is now {}.",
            kind_noun(item),
            revision.fields.title,
            revision.state.label().replace('_', " ")
        );
        if !revision.log.trim().is_empty() {
            body.push_str("\r\n\r\n");
            body.push_str(revision.log.trim());
        }
        if item.is_role() {
            body.push_str("\r\n\r\n");
            body.push_str(&self.config.role_url(item.id));
        }

        let notification = Notification {
            key: NotificationKey::ContentStateChanged,
            recipients: vec![owner.email],
            subject: format!("{}: {}", self.config.site_name, revision.fields.title),
            body,
        };
        deliver(self.notifier.as_ref(), notification, notices);
        Ok(())
    }
}

fn build_draft(base: &Revision, request: &TransitionRequest) -> RevisionDraft {
    let mut draft = RevisionDraft::from_revision(base, request.target, request.actor);
    if let Some(fields) = &request.fields {
        draft.fields = fields.clone();
    }
    if let Some(schedule) = request.schedule {
        draft.schedule = schedule;
    }
    draft.log = request.log.clone();
    draft
}

fn notifies_owner(revision: &Revision) -> bool {
    match revision.state {
        ModerationState::Approved | ModerationState::Published => true,
        ModerationState::Draft => !revision.log.trim().is_empty(),
        _ => false,
    }
}

fn kind_noun(item: &ContentItem) -> &'static str {
    if item.is_role() {
        "role"
    } else {
        "provider profile"
    }
}

pub(crate) fn feedback_in(history: &[Revision]) -> Option<Feedback> {
    let review = history
        .iter()
        .rposition(|revision| revision.state == ModerationState::ReadyForReview)?;

    history[review + 1..]
        .iter()
        .find(|revision| revision.state == ModerationState::Draft)
        .filter(|revision| !revision.log.trim().is_empty())
        .map(|revision| Feedback {
            revision: revision.id,
            log: revision.log.clone(),
        })
}

/// Error raised by the moderation workflow.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("content {0} not found")]
    ContentNotFound(ContentId),
    #[error("revision {0} not found")]
    RevisionNotFound(RevisionId),
    #[error("cannot move content from {} to {}", .from.label(), .to.label())]
    TransitionNotAllowed {
        from: ModerationState,
        to: ModerationState,
    },
    #[error("content is incomplete ({} problems)", .violations.len())]
    Incomplete { violations: Vec<Violation> },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revision(id: u64, state: ModerationState, log: &str) -> Revision {
        Revision {
            id: RevisionId(id),
            content_id: ContentId(1),
            state,
            fields: ContentFields::default(),
            schedule: Schedule::default(),
            log: log.to_string(),
            author: AccountId(1),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn feedback_comes_from_first_draft_after_latest_review() {
        let history = vec![
            revision(1, ModerationState::Draft, ""),
            revision(2, ModerationState::ReadyForReview, ""),
            revision(3, ModerationState::Draft, "old feedback"),
            revision(4, ModerationState::ReadyForReview, ""),
            revision(5, ModerationState::Draft, "Please add a location."),
            revision(6, ModerationState::Draft, "my own edit"),
        ];

        let feedback = feedback_in(&history).expect("feedback present");
        assert_eq!(feedback.revision, RevisionId(5));
        assert_eq!(feedback.log, "Please add a location.");
    }

    #[test]
    fn no_feedback_without_following_draft() {
        let history = vec![
            revision(1, ModerationState::Draft, ""),
            revision(2, ModerationState::ReadyForReview, ""),
        ];
        assert!(feedback_in(&history).is_none());

        let history = vec![
            revision(1, ModerationState::ReadyForReview, ""),
            revision(2, ModerationState::Draft, "  "),
        ];
        assert!(feedback_in(&history).is_none());
    }

    #[test]
    fn owner_notified_for_feedback_drafts_only() {
        assert!(notifies_owner(&revision(1, ModerationState::Published, "")));
        assert!(notifies_owner(&revision(1, ModerationState::Draft, "fix it")));
        assert!(!notifies_owner(&revision(1, ModerationState::Draft, "")));
        assert!(!notifies_owner(&revision(1, ModerationState::Unpublished, "")));
    }
}
