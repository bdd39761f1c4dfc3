use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use super::access::AccessDenied;
use super::domain::{Organisation, OrganisationDraft, RestoreEntry, RestorePlan};
use crate::config::WorkflowConfig;
use crate::workflows::accounts::{Account, AccountRole};
use crate::workflows::applications::{ApplicationService, ApplicationServiceError};
use crate::workflows::identifiers::{AccountId, ContentId, OrganisationId};
use crate::workflows::moderation::{
    ContentDraft, ContentFields, ContentItem, ContentKind, ModerationError, ModerationState,
    ModerationWorkflow, RevisionDraft, Schedule, TransitionOutcome, TransitionRequest,
};
use crate::workflows::notice::Notice;
use crate::workflows::notifications::NotificationPublisher;
use crate::workflows::store::{MarketplaceStore, RepositoryError};

const SUSPENDED_LOG: &str = "Organisation suspended";

/// Content whose default revision sits in one of these states is taken
/// offline on suspension and put back on reactivation.
const RESTORABLE_STATES: [ModerationState; 3] = [
    ModerationState::Published,
    ModerationState::Approved,
    ModerationState::ReadyForReview,
];

#[derive(Debug, Clone, Serialize)]
pub struct SuspensionReport {
    pub organisation: OrganisationId,
    pub restore_plan: RestorePlan,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReactivationReport {
    pub organisation: OrganisationId,
    pub restored: Vec<RestoreEntry>,
    pub skipped: Vec<RestoreEntry>,
    pub notices: Vec<Notice>,
}

/// Outcome of a moderation request routed through the provider lifecycle.
#[derive(Debug, Clone, Serialize)]
pub struct ModerationReport {
    #[serde(flatten)]
    pub transition: TransitionOutcome,
    /// Set when publishing a profile for the first time created its organisation.
    pub created_organisation: Option<Organisation>,
}

/// Provider organisation lifecycle: creation on first publication, team
/// membership, suspension, reactivation and deletion, plus role management.
pub struct ProviderLifecycleService<S, N> {
    pub(super) store: Arc<S>,
    pub(super) moderation: ModerationWorkflow<S, N>,
    pub(super) applications: ApplicationService<S, N>,
    pub(super) config: WorkflowConfig,
}

impl<S, N> ProviderLifecycleService<S, N>
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: WorkflowConfig) -> Self {
        Self {
            moderation: ModerationWorkflow::new(store.clone(), notifier.clone(), config.clone()),
            applications: ApplicationService::new(store.clone(), notifier, config.clone()),
            store,
            config,
        }
    }

    pub fn moderation(&self) -> &ModerationWorkflow<S, N> {
        &self.moderation
    }

    pub fn organisation(&self, id: OrganisationId) -> Result<Organisation, ProviderError> {
        self.store
            .fetch_organisation(id)?
            .ok_or(ProviderError::OrganisationNotFound(id))
    }

    pub(super) fn account(&self, id: AccountId) -> Result<Account, ProviderError> {
        self.store
            .fetch_account(id)?
            .ok_or(ProviderError::AccountNotFound(id))
    }

    /// Take every live item of the organisation offline and remember how to
    /// put it back. Items in other states are left alone.
    pub fn suspend(&self, id: OrganisationId) -> Result<SuspensionReport, ProviderError> {
        let mut organisation = self.organisation(id)?;
        let mut notices = Vec::new();

        if organisation.suspended {
            tracing::warn!(organisation = %id, "organisation already suspended; rebuilding restore plan");
            notices.push(Notice::warning(
                "This organisation was already suspended. Its restore plan has been rebuilt.",
            ));
        }

        let mut plan = RestorePlan::default();
        for item in self.store.content_in_organisation(id)? {
            let default = self.moderation.default_revision(&item)?;
            if !RESTORABLE_STATES.contains(&default.state) {
                continue;
            }

            plan.push(RestoreEntry {
                content_id: item.id,
                revision_id: default.id,
                target_state: default.state,
            });

            let request = TransitionRequest::new(ModerationState::Unpublished, default.author)
                .with_log(SUSPENDED_LOG)
                .with_schedule(Schedule::default());
            self.moderation.force_transition(item.id, request)?;
        }

        organisation.suspended = true;
        organisation.restore_plan = plan.clone();
        self.store.update_organisation(organisation)?;

        tracing::info!(organisation = %id, items = plan.len(), "organisation suspended");
        notices.push(Notice::status("The organisation has been suspended."));

        Ok(SuspensionReport {
            organisation: id,
            restore_plan: plan,
            notices,
        })
    }

    /// Lift a suspension and restore each recorded revision as the default.
    pub fn reactivate(&self, id: OrganisationId) -> Result<ReactivationReport, ProviderError> {
        let mut organisation = self.organisation(id)?;
        let plan = std::mem::take(&mut organisation.restore_plan);
        let mut report = ReactivationReport {
            organisation: id,
            restored: Vec::new(),
            skipped: Vec::new(),
            notices: Vec::new(),
        };

        if !organisation.suspended {
            tracing::warn!(organisation = %id, "reactivating an organisation that is not suspended");
        }

        organisation.suspended = false;
        self.store.update_organisation(organisation)?;

        if plan.is_empty() {
            tracing::warn!(organisation = %id, "restore plan empty; nothing to republish");
            report.notices.push(Notice::warning(
                "No restore information was recorded for this organisation. Content was left as it is.",
            ));
        }

        for entry in plan.entries() {
            if self.restore(entry)? {
                report.restored.push(*entry);
            } else {
                tracing::warn!(
                    organisation = %id,
                    content = %entry.content_id,
                    revision = %entry.revision_id,
                    "restore entry skipped"
                );
                report.notices.push(Notice::warning(format!(
                    "Content {} could not be restored because revision {} no longer exists.",
                    entry.content_id, entry.revision_id
                )));
                report.skipped.push(*entry);
            }
        }

        tracing::info!(
            organisation = %id,
            restored = report.restored.len(),
            skipped = report.skipped.len(),
            "organisation reactivated"
        );
        report
            .notices
            .push(Notice::status("The organisation has been reactivated."));
        Ok(report)
    }

    /// Returns false when the entry's content or revision has gone.
    fn restore(&self, entry: &RestoreEntry) -> Result<bool, ProviderError> {
        if self.store.fetch_content(entry.content_id)?.is_none() {
            return Ok(false);
        }
        let revision = match self.store.fetch_revision(entry.revision_id)? {
            Some(revision) if revision.content_id == entry.content_id => revision,
            _ => return Ok(false),
        };

        if revision.state == entry.target_state {
            self.store
                .promote_revision(entry.content_id, entry.revision_id)?;
        } else {
            // Flat plans only record the revision, so the state may differ.
            let draft = RevisionDraft::from_revision(&revision, entry.target_state, revision.author);
            self.store.append_revision(draft, true)?;
        }
        Ok(true)
    }

    /// Delete the organisation with its applications, content and members.
    /// A failure stops the deletion where it is.
    pub fn delete(&self, id: OrganisationId) -> Result<Vec<Notice>, ProviderError> {
        let organisation = self.organisation(id)?;
        let content = self.store.content_in_organisation(id)?;
        let mut notices = Vec::new();

        let mut submissions: BTreeSet<_> = self
            .store
            .submissions_for_organisation(id)?
            .into_iter()
            .map(|submission| submission.id)
            .collect();
        for item in &content {
            submissions.extend(
                self.store
                    .submissions_for_role(item.id)?
                    .into_iter()
                    .map(|submission| submission.id),
            );
        }
        for submission in submissions {
            notices.extend(self.applications.delete(submission)?);
        }

        for item in &content {
            self.store.delete_content(item.id)?;
        }

        for member in self.store.members(id)? {
            self.store.remove_member(id, member)?;
            self.store.delete_account(member)?;
        }

        self.store.delete_organisation(id)?;
        tracing::info!(organisation = %id, label = %organisation.label, "organisation deleted");
        notices.push(Notice::status("The organisation has been deleted."));
        Ok(notices)
    }

    /// Validated moderation. Publishing a provider profile for the first
    /// time creates its organisation and makes the owner its first member.
    pub fn moderate(
        &self,
        content: ContentId,
        request: TransitionRequest,
    ) -> Result<ModerationReport, ProviderError> {
        let first_publication = request.target == ModerationState::Published
            && !self.moderation.has_been_published(content)?;

        let mut transition = self.moderation.transition(content, request)?;
        let mut created_organisation = None;

        if first_publication
            && transition.content.kind == ContentKind::ProviderProfile
            && transition.content.organisation.is_none()
        {
            let organisation = self.store.insert_organisation(OrganisationDraft {
                label: transition.revision.fields.title.trim().to_string(),
                profile: Some(transition.content.id),
            })?;
            self.add_member(organisation.id, transition.content.owner)?;
            transition.content = self
                .store
                .assign_organisation(transition.content.id, organisation.id)?;

            tracing::info!(
                organisation = %organisation.id,
                profile = %transition.content.id,
                "organisation created from profile"
            );
            created_organisation = Some(organisation);
        }

        Ok(ModerationReport {
            transition,
            created_organisation,
        })
    }

    /// Blank draft profile owned by the account.
    pub fn create_stub_profile(&self, owner: AccountId) -> Result<ContentItem, ProviderError> {
        self.account(owner)?;
        let (item, _) = self.store.insert_content(ContentDraft::new(
            ContentKind::ProviderProfile,
            owner,
            blank_fields(),
        ))?;
        Ok(item)
    }

    /// Blank draft role in the owner's organisation.
    pub fn create_stub_role(&self, owner: AccountId) -> Result<ContentItem, ProviderError> {
        self.account(owner)?;
        let organisation = self
            .store
            .organisation_of(owner)?
            .ok_or(ProviderError::NoOrganisation(owner))?;
        let organisation = self.organisation(organisation)?;
        if organisation.suspended {
            return Err(ProviderError::Access(AccessDenied::Suspended));
        }

        let (item, _) = self.store.insert_content(
            ContentDraft::new(ContentKind::Role, owner, blank_fields())
                .in_organisation(organisation.id),
        )?;
        Ok(item)
    }

    /// Add an account to the organisation, granting it the provider role.
    pub fn add_member(
        &self,
        organisation: OrganisationId,
        account: AccountId,
    ) -> Result<(), ProviderError> {
        self.organisation(organisation)?;
        let mut member = self.account(account)?;
        if member.roles.insert(AccountRole::Provider) {
            self.store.update_account(member)?;
        }
        self.store.add_member(organisation, account)?;
        tracing::debug!(organisation = %organisation, account = %account, "member added");
        Ok(())
    }
}

fn blank_fields() -> ContentFields {
    ContentFields {
        title: " ".to_string(),
        ..ContentFields::default()
    }
}

/// Error raised by the provider lifecycle service.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Moderation(#[from] ModerationError),
    #[error(transparent)]
    Applications(#[from] ApplicationServiceError),
    #[error(transparent)]
    Access(#[from] AccessDenied),
    #[error("organisation {0} not found")]
    OrganisationNotFound(OrganisationId),
    #[error("account {0} not found")]
    AccountNotFound(AccountId),
    #[error("account {0} does not belong to an organisation")]
    NoOrganisation(AccountId),
    #[error("content {0} is not a role")]
    NotARole(ContentId),
    #[error("role {0} cannot be duplicated")]
    NotDuplicable(ContentId),
}
