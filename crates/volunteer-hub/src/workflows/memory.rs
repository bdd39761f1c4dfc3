use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::accounts::{Account, AccountDraft, AccountRepository};
use super::applications::{ApplicationSubmission, SubmissionDraft, SubmissionRepository};
use super::identifiers::{AccountId, ContentId, OrganisationId, RevisionId, SubmissionId};
use super::moderation::{ContentDraft, ContentItem, ContentRepository, Revision, RevisionDraft};
use super::notifications::{Notification, NotificationError, NotificationPublisher};
use super::provider::{Organisation, OrganisationDraft, OrganisationRepository};
use super::store::RepositoryError;

#[derive(Debug, Default)]
struct Sequence(u64);

impl Sequence {
    fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: BTreeMap<AccountId, Account>,
    content: BTreeMap<ContentId, ContentItem>,
    revisions: BTreeMap<RevisionId, Revision>,
    organisations: BTreeMap<OrganisationId, Organisation>,
    memberships: BTreeMap<OrganisationId, Vec<AccountId>>,
    submissions: BTreeMap<SubmissionId, ApplicationSubmission>,
    account_ids: Sequence,
    content_ids: Sequence,
    revision_ids: Sequence,
    organisation_ids: Sequence,
    submission_ids: Sequence,
}

impl MemoryState {
    fn store_revision(&mut self, draft: RevisionDraft) -> Revision {
        let revision = Revision {
            id: RevisionId(self.revision_ids.next()),
            content_id: draft.content_id,
            state: draft.state,
            fields: draft.fields,
            schedule: draft.schedule,
            log: draft.log,
            author: draft.author,
            created_at: draft.created_at,
        };
        self.revisions.insert(revision.id, revision.clone());
        revision
    }

    fn content_mut(&mut self, id: ContentId) -> Result<&mut ContentItem, RepositoryError> {
        self.content.get_mut(&id).ok_or(RepositoryError::NotFound)
    }
}

/// In-process store backing the API service, the demo and the tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl AccountRepository for MemoryStore {
    fn insert_account(&self, draft: AccountDraft) -> Result<Account, RepositoryError> {
        let mut state = self.lock()?;
        if state
            .accounts
            .values()
            .any(|account| account.email.eq_ignore_ascii_case(&draft.email))
        {
            return Err(RepositoryError::Conflict);
        }

        let account = Account {
            id: AccountId(state.account_ids.next()),
            email: draft.email,
            first_name: draft.first_name,
            last_name: draft.last_name,
            roles: draft.roles,
            active: true,
        };
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    fn update_account(&self, account: Account) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let slot = state
            .accounts
            .get_mut(&account.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = account;
        Ok(())
    }

    fn fetch_account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        Ok(self.lock()?.accounts.get(&id).cloned())
    }

    fn delete_account(&self, id: AccountId) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state
            .accounts
            .remove(&id)
            .ok_or(RepositoryError::NotFound)?;
        for members in state.memberships.values_mut() {
            members.retain(|member| *member != id);
        }
        Ok(())
    }
}

impl ContentRepository for MemoryStore {
    fn insert_content(
        &self,
        draft: ContentDraft,
    ) -> Result<(ContentItem, Revision), RepositoryError> {
        let mut state = self.lock()?;
        let id = ContentId(state.content_ids.next());
        let now = Utc::now();
        let revision = state.store_revision(RevisionDraft {
            content_id: id,
            state: draft.state,
            fields: draft.fields,
            schedule: draft.schedule,
            log: String::new(),
            author: draft.owner,
            created_at: now,
        });

        let item = ContentItem {
            id,
            kind: draft.kind,
            owner: draft.owner,
            organisation: draft.organisation,
            default_revision: revision.id,
            latest_revision: revision.id,
            created_at: now,
        };
        state.content.insert(id, item.clone());
        Ok((item, revision))
    }

    fn fetch_content(&self, id: ContentId) -> Result<Option<ContentItem>, RepositoryError> {
        Ok(self.lock()?.content.get(&id).cloned())
    }

    fn fetch_revision(&self, id: RevisionId) -> Result<Option<Revision>, RepositoryError> {
        Ok(self.lock()?.revisions.get(&id).cloned())
    }

    fn revision_history(&self, id: ContentId) -> Result<Vec<Revision>, RepositoryError> {
        Ok(self
            .lock()?
            .revisions
            .values()
            .filter(|revision| revision.content_id == id)
            .cloned()
            .collect())
    }

    fn append_revision(
        &self,
        draft: RevisionDraft,
        make_default: bool,
    ) -> Result<Revision, RepositoryError> {
        let mut state = self.lock()?;
        state.content_mut(draft.content_id)?;

        let revision = state.store_revision(draft);
        let item = state.content_mut(revision.content_id)?;
        item.latest_revision = revision.id;
        if make_default {
            item.default_revision = revision.id;
        }
        Ok(revision)
    }

    fn promote_revision(
        &self,
        content: ContentId,
        revision: RevisionId,
    ) -> Result<ContentItem, RepositoryError> {
        let mut state = self.lock()?;
        let belongs = state
            .revisions
            .get(&revision)
            .is_some_and(|stored| stored.content_id == content);
        if !belongs {
            return Err(RepositoryError::NotFound);
        }

        let item = state.content_mut(content)?;
        item.default_revision = revision;
        item.latest_revision = revision;
        Ok(item.clone())
    }

    fn assign_organisation(
        &self,
        content: ContentId,
        organisation: OrganisationId,
    ) -> Result<ContentItem, RepositoryError> {
        let mut state = self.lock()?;
        let item = state.content_mut(content)?;
        item.organisation = Some(organisation);
        Ok(item.clone())
    }

    fn content_in_organisation(
        &self,
        organisation: OrganisationId,
    ) -> Result<Vec<ContentItem>, RepositoryError> {
        Ok(self
            .lock()?
            .content
            .values()
            .filter(|item| item.organisation == Some(organisation))
            .cloned()
            .collect())
    }

    fn content_owned_by(&self, owner: AccountId) -> Result<Vec<ContentItem>, RepositoryError> {
        Ok(self
            .lock()?
            .content
            .values()
            .filter(|item| item.owner == owner)
            .cloned()
            .collect())
    }

    fn reassign_content(
        &self,
        content: ContentId,
        owner: AccountId,
    ) -> Result<ContentItem, RepositoryError> {
        let mut state = self.lock()?;
        let item = state.content_mut(content)?;
        let previous = item.owner;
        item.owner = owner;
        let item = item.clone();

        for revision in state.revisions.values_mut() {
            if revision.content_id == content && revision.author == previous {
                revision.author = owner;
            }
        }
        Ok(item)
    }

    fn delete_content(&self, id: ContentId) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.content.remove(&id).ok_or(RepositoryError::NotFound)?;
        state.revisions.retain(|_, revision| revision.content_id != id);
        Ok(())
    }
}

impl OrganisationRepository for MemoryStore {
    fn insert_organisation(
        &self,
        draft: OrganisationDraft,
    ) -> Result<Organisation, RepositoryError> {
        let mut state = self.lock()?;
        let organisation = Organisation {
            id: OrganisationId(state.organisation_ids.next()),
            label: draft.label,
            profile: draft.profile,
            suspended: false,
            restore_plan: Default::default(),
            response_templates: Default::default(),
            created_at: Utc::now(),
        };
        state
            .organisations
            .insert(organisation.id, organisation.clone());
        state.memberships.insert(organisation.id, Vec::new());
        Ok(organisation)
    }

    fn update_organisation(&self, organisation: Organisation) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let slot = state
            .organisations
            .get_mut(&organisation.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = organisation;
        Ok(())
    }

    fn fetch_organisation(
        &self,
        id: OrganisationId,
    ) -> Result<Option<Organisation>, RepositoryError> {
        Ok(self.lock()?.organisations.get(&id).cloned())
    }

    fn delete_organisation(&self, id: OrganisationId) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state
            .organisations
            .remove(&id)
            .ok_or(RepositoryError::NotFound)?;
        state.memberships.remove(&id);
        Ok(())
    }

    fn add_member(
        &self,
        organisation: OrganisationId,
        account: AccountId,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if !state.accounts.contains_key(&account) {
            return Err(RepositoryError::NotFound);
        }
        if state
            .memberships
            .iter()
            .any(|(other, members)| *other != organisation && members.contains(&account))
        {
            return Err(RepositoryError::Conflict);
        }

        let members = state
            .memberships
            .get_mut(&organisation)
            .ok_or(RepositoryError::NotFound)?;
        if !members.contains(&account) {
            members.push(account);
        }
        Ok(())
    }

    fn remove_member(
        &self,
        organisation: OrganisationId,
        account: AccountId,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let members = state
            .memberships
            .get_mut(&organisation)
            .ok_or(RepositoryError::NotFound)?;
        let before = members.len();
        members.retain(|member| *member != account);
        if members.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn members(&self, organisation: OrganisationId) -> Result<Vec<AccountId>, RepositoryError> {
        Ok(self
            .lock()?
            .memberships
            .get(&organisation)
            .cloned()
            .unwrap_or_default())
    }

    fn organisation_of(
        &self,
        account: AccountId,
    ) -> Result<Option<OrganisationId>, RepositoryError> {
        Ok(self
            .lock()?
            .memberships
            .iter()
            .find(|(_, members)| members.contains(&account))
            .map(|(organisation, _)| *organisation))
    }
}

impl SubmissionRepository for MemoryStore {
    fn insert_submission(
        &self,
        draft: SubmissionDraft,
    ) -> Result<ApplicationSubmission, RepositoryError> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let submission = ApplicationSubmission {
            id: SubmissionId(state.submission_ids.next()),
            label: draft.label,
            volunteer: draft.volunteer,
            role: draft.role,
            organisation: None,
            applicant: draft.applicant,
            answers: draft.answers,
            submitted: false,
            submitted_at: None,
            responded: false,
            response_type: None,
            response: None,
            created_at: now,
            changed_at: now,
        };
        state.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    fn update_submission(&self, submission: ApplicationSubmission) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let slot = state
            .submissions
            .get_mut(&submission.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = submission;
        Ok(())
    }

    fn fetch_submission(
        &self,
        id: SubmissionId,
    ) -> Result<Option<ApplicationSubmission>, RepositoryError> {
        Ok(self.lock()?.submissions.get(&id).cloned())
    }

    fn delete_submission(&self, id: SubmissionId) -> Result<(), RepositoryError> {
        self.lock()?
            .submissions
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn submissions_for_role(
        &self,
        role: ContentId,
    ) -> Result<Vec<ApplicationSubmission>, RepositoryError> {
        self.filter_submissions(|submission| submission.role == role)
    }

    fn submissions_for_organisation(
        &self,
        organisation: OrganisationId,
    ) -> Result<Vec<ApplicationSubmission>, RepositoryError> {
        self.filter_submissions(|submission| submission.organisation == Some(organisation))
    }

    fn submissions_by_volunteer(
        &self,
        volunteer: AccountId,
    ) -> Result<Vec<ApplicationSubmission>, RepositoryError> {
        self.filter_submissions(|submission| submission.volunteer == volunteer)
    }
}

impl MemoryStore {
    fn filter_submissions<F>(&self, keep: F) -> Result<Vec<ApplicationSubmission>, RepositoryError>
    where
        F: Fn(&ApplicationSubmission) -> bool,
    {
        Ok(self
            .lock()?
            .submissions
            .values()
            .filter(|submission| keep(submission))
            .cloned()
            .collect())
    }
}

/// Notification publisher that records every message instead of sending it.
#[derive(Debug, Default)]
pub struct MemoryNotifications {
    events: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl MemoryNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Simulate a broken mail transport.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::Transport(
                "mail transport offline".to_string(),
            ));
        }

        self.events
            .lock()
            .map_err(|_| NotificationError::Transport("notification log poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::accounts::AccountRole;
    use crate::workflows::moderation::{ContentFields, ContentKind, ModerationState};

    #[test]
    fn appended_revisions_only_move_default_when_asked() {
        let store = MemoryStore::new();
        let (item, first) = store
            .insert_content(ContentDraft::new(
                ContentKind::Role,
                AccountId(1),
                ContentFields::default(),
            ))
            .expect("insert");

        let mut draft = RevisionDraft::from_revision(&first, ModerationState::Draft, AccountId(1));
        draft.log = "edit".to_string();
        let second = store.append_revision(draft, false).expect("append");

        let stored = store.fetch_content(item.id).expect("fetch").expect("exists");
        assert_eq!(stored.default_revision, first.id);
        assert_eq!(stored.latest_revision, second.id);

        let promoted = store.promote_revision(item.id, first.id).expect("promote");
        assert_eq!(promoted.latest_revision, first.id);
        assert_eq!(store.revision_history(item.id).expect("history").len(), 2);
    }

    #[test]
    fn accounts_belong_to_one_organisation() {
        let store = MemoryStore::new();
        let account = store
            .insert_account(AccountDraft::new(
                "p@example.org",
                "Pat",
                "Lee",
                AccountRole::Provider,
            ))
            .expect("account");
        let first = store
            .insert_organisation(OrganisationDraft {
                label: "First".to_string(),
                profile: None,
            })
            .expect("org");
        let second = store
            .insert_organisation(OrganisationDraft {
                label: "Second".to_string(),
                profile: None,
            })
            .expect("org");

        store.add_member(first.id, account.id).expect("join");
        assert!(matches!(
            store.add_member(second.id, account.id),
            Err(RepositoryError::Conflict)
        ));
        assert_eq!(
            store.organisation_of(account.id).expect("lookup"),
            Some(first.id)
        );
    }

    #[test]
    fn reassigning_content_rewrites_revision_authors() {
        let store = MemoryStore::new();
        let (item, revision) = store
            .insert_content(ContentDraft::new(
                ContentKind::Role,
                AccountId(4),
                ContentFields::default(),
            ))
            .expect("insert");

        store.reassign_content(item.id, AccountId(9)).expect("reassign");

        let revision = store
            .fetch_revision(revision.id)
            .expect("fetch")
            .expect("exists");
        assert_eq!(revision.author, AccountId(9));
        assert_eq!(store.revision_history(item.id).expect("history").len(), 1);
    }

    #[test]
    fn failing_notifier_reports_transport_error() {
        let notifier = MemoryNotifications::new();
        notifier.set_failing(true);
        let result = notifier.publish(Notification {
            key: crate::workflows::NotificationKey::ApplicationDeleted,
            recipients: vec!["v@example.org".to_string()],
            subject: "s".to_string(),
            body: "b".to_string(),
        });
        assert!(matches!(result, Err(NotificationError::Transport(_))));
        assert!(notifier.events().is_empty());
    }
}
