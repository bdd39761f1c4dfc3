use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::lifecycle::{ProviderError, ProviderLifecycleService};
use crate::workflows::identifiers::{AccountId, ContentId};
use crate::workflows::moderation::{
    ContentDraft, ContentItem, ContentKind, ModerationState, Revision, Schedule,
    TransitionOutcome, TransitionRequest,
};
use crate::workflows::notice::Notice;
use crate::workflows::notifications::NotificationPublisher;
use crate::workflows::store::MarketplaceStore;

/// Why a role can or cannot be duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicationEligibility {
    pub role: ContentId,
    pub default_state: ModerationState,
    pub eligible: bool,
    pub reason: &'static str,
}

impl<S, N> ProviderLifecycleService<S, N>
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    pub(super) fn role(&self, id: ContentId) -> Result<ContentItem, ProviderError> {
        let item = self.moderation.content(id)?;
        if !item.is_role() {
            return Err(ProviderError::NotARole(id));
        }
        Ok(item)
    }

    /// Duplication works from the default revision: live or approved roles
    /// always qualify, unpublished or archived ones only if they were once
    /// published and still pass validation outside the scheduler fields.
    pub fn duplication_eligibility(
        &self,
        id: ContentId,
    ) -> Result<DuplicationEligibility, ProviderError> {
        let item = self.role(id)?;
        let default = self.moderation.default_revision(&item)?;

        let (eligible, reason) = match default.state {
            ModerationState::Published | ModerationState::Approved => {
                (true, "The role has been approved for publishing.")
            }
            ModerationState::Unpublished | ModerationState::Archived => {
                if !self.moderation.has_been_published(id)? {
                    (false, "The role has never been published.")
                } else if self
                    .moderation
                    .violations(&item)?
                    .iter()
                    .any(|violation| !violation.field.is_scheduler())
                {
                    (false, "The role has validation errors that would be copied.")
                } else {
                    (true, "The role was published previously.")
                }
            }
            ModerationState::Draft | ModerationState::ReadyForReview => {
                (false, "The role has never been live.")
            }
        };

        Ok(DuplicationEligibility {
            role: id,
            default_state: default.state,
            eligible,
            reason,
        })
    }

    pub fn can_duplicate(&self, id: ContentId) -> Result<bool, ProviderError> {
        Ok(self.duplication_eligibility(id)?.eligible)
    }

    /// New draft role copied from the default revision, without title,
    /// advert dates or schedule.
    pub fn duplicate_role(
        &self,
        id: ContentId,
        actor: AccountId,
    ) -> Result<ContentItem, ProviderError> {
        if !self.can_duplicate(id)? {
            return Err(ProviderError::NotDuplicable(id));
        }

        let item = self.role(id)?;
        let default = self.moderation.default_revision(&item)?;

        let mut fields = default.fields.clone();
        fields.title = " ".to_string();
        fields.advert_starts_on = None;
        fields.advert_ends_on = None;

        let mut draft = ContentDraft::new(ContentKind::Role, actor, fields)
            .with_state(ModerationState::Draft);
        draft.schedule = Schedule::default();
        draft.organisation = item.organisation;

        let (duplicate, _) = self.store.insert_content(draft)?;
        tracing::info!(role = %id, duplicate = %duplicate.id, "role duplicated");
        Ok(duplicate)
    }

    pub fn archive_role(
        &self,
        id: ContentId,
        actor: AccountId,
        log: Option<String>,
    ) -> Result<TransitionOutcome, ProviderError> {
        self.role_transition(id, ModerationState::Archived, actor, log)
    }

    pub fn unpublish_role(
        &self,
        id: ContentId,
        actor: AccountId,
        log: Option<String>,
    ) -> Result<TransitionOutcome, ProviderError> {
        self.role_transition(id, ModerationState::Unpublished, actor, log)
    }

    fn role_transition(
        &self,
        id: ContentId,
        target: ModerationState,
        actor: AccountId,
        log: Option<String>,
    ) -> Result<TransitionOutcome, ProviderError> {
        self.role(id)?;
        let mut request = TransitionRequest::new(target, actor);
        if let Some(log) = log {
            request = request.with_log(log);
        }
        Ok(self.moderation.transition(id, request)?)
    }

    /// Delete the role, then every application made to it.
    pub fn delete_role(&self, id: ContentId) -> Result<Vec<Notice>, ProviderError> {
        self.role(id)?;
        let submissions = self.store.submissions_for_role(id)?;
        self.store.delete_content(id)?;

        let mut notices = Vec::new();
        for submission in submissions {
            notices.extend(self.applications.delete(submission.id)?);
        }
        tracing::info!(role = %id, "role deleted");
        notices.push(Notice::status("The role has been deleted."));
        Ok(notices)
    }

    /// Advert closes within the configured warning window.
    pub fn role_expiring(&self, id: ContentId, today: NaiveDate) -> Result<bool, ProviderError> {
        let revision = self.default_role_revision(id)?;
        Ok(advert_expiring(
            &revision,
            today,
            self.config.expiry_warning_days,
        ))
    }

    /// Advert closed on or before today.
    pub fn role_expired(&self, id: ContentId, today: NaiveDate) -> Result<bool, ProviderError> {
        let revision = self.default_role_revision(id)?;
        Ok(advert_expired(&revision, today))
    }

    fn default_role_revision(&self, id: ContentId) -> Result<Revision, ProviderError> {
        let item = self.role(id)?;
        Ok(self.moderation.default_revision(&item)?)
    }
}

pub(super) fn advert_expiring(revision: &Revision, today: NaiveDate, window_days: i64) -> bool {
    revision
        .fields
        .advert_ends_on
        .is_some_and(|ends| ends < today + Duration::days(window_days))
}

pub(super) fn advert_expired(revision: &Revision, today: NaiveDate) -> bool {
    revision
        .fields
        .advert_ends_on
        .is_some_and(|ends| ends <= today)
}
