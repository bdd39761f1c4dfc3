use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::Account;
use crate::config::WorkflowConfig;
use crate::workflows::applications::{ApplicationService, ApplicationServiceError};
use crate::workflows::identifiers::{AccountId, ContentId, OrganisationId, SubmissionId};
use crate::workflows::notice::Notice;
use crate::workflows::notifications::NotificationPublisher;
use crate::workflows::store::{MarketplaceStore, RepositoryError};

/// Work queued by an account deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum DeletionOperation {
    /// Hand the provider's content to another member of the organisation.
    ReassignContent {
        new_owner: AccountId,
        chunks: Vec<Vec<ContentId>>,
    },
    /// Delete the volunteer's applications.
    RemoveApplications { chunks: Vec<Vec<SubmissionId>> },
}

impl DeletionOperation {
    fn total_chunks(&self) -> usize {
        match self {
            Self::ReassignContent { chunks, .. } => chunks.len(),
            Self::RemoveApplications { chunks } => chunks.len(),
        }
    }
}

/// Resumable account deletion. The cursor counts processed chunks, so a
/// serialized batch can be picked up again after an interruption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionBatch {
    pub account: AccountId,
    pub organisation: Option<OrganisationId>,
    pub operation: DeletionOperation,
    pub cursor: usize,
}

impl DeletionBatch {
    pub fn total_chunks(&self) -> usize {
        self.operation.total_chunks()
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.total_chunks()
    }

    fn progress(&self, message: String) -> BatchProgress {
        let total = self.total_chunks();
        let processed = self.cursor.min(total);
        let finished_fraction = if total == 0 {
            1.0
        } else {
            processed as f32 / total as f32
        };
        BatchProgress {
            processed,
            total,
            finished_fraction,
            message,
            notices: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
    pub finished_fraction: f32,
    pub message: String,
    pub notices: Vec<Notice>,
}

/// Account removal: deletion eligibility, chunked hand-over and team
/// membership management.
pub struct AccountService<S, N> {
    store: Arc<S>,
    applications: ApplicationService<S, N>,
    chunk_size: usize,
}

impl<S, N> AccountService<S, N>
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: WorkflowConfig) -> Self {
        let chunk_size = config.deletion_chunk_size.max(1);
        Self {
            applications: ApplicationService::new(store.clone(), notifier, config),
            store,
            chunk_size,
        }
    }

    pub fn account(&self, id: AccountId) -> Result<Account, AccountError> {
        self.store
            .fetch_account(id)?
            .ok_or(AccountError::AccountNotFound(id))
    }

    /// Volunteers may always delete themselves; providers only when someone
    /// else is left to take over the organisation's content.
    pub fn can_delete(&self, account: &Account) -> Result<bool, AccountError> {
        if account.is_volunteer() {
            return Ok(true);
        }

        match self.store.organisation_of(account.id)? {
            Some(organisation) => Ok(self.store.members(organisation)?.len() > 1),
            None => Ok(false),
        }
    }

    /// First other active member of the account's organisation.
    pub fn next_member(&self, account: &Account) -> Result<Option<Account>, AccountError> {
        let Some(organisation) = self.store.organisation_of(account.id)? else {
            return Ok(None);
        };

        for member in self.store.members(organisation)? {
            if member == account.id {
                continue;
            }
            if let Some(candidate) = self.store.fetch_account(member)? {
                if candidate.active {
                    return Ok(Some(candidate));
                }
            }
        }
        Ok(None)
    }

    pub fn plan_deletion(&self, account: &Account) -> Result<DeletionBatch, AccountError> {
        if !self.can_delete(account)? {
            return Err(AccountError::CannotDelete(account.id));
        }

        let organisation = self.store.organisation_of(account.id)?;
        let operation = if account.is_provider() {
            let new_owner = self
                .next_member(account)?
                .ok_or(AccountError::NoSuccessor(account.id))?;
            let content: Vec<ContentId> = self
                .store
                .content_owned_by(account.id)?
                .into_iter()
                .map(|item| item.id)
                .collect();
            DeletionOperation::ReassignContent {
                new_owner: new_owner.id,
                chunks: self.chunk(content),
            }
        } else {
            let submissions: Vec<SubmissionId> = self
                .store
                .submissions_by_volunteer(account.id)?
                .into_iter()
                .map(|submission| submission.id)
                .collect();
            DeletionOperation::RemoveApplications {
                chunks: self.chunk(submissions),
            }
        };

        let batch = DeletionBatch {
            account: account.id,
            organisation,
            operation,
            cursor: 0,
        };
        tracing::info!(
            account = %account.id,
            chunks = batch.total_chunks(),
            "account deletion planned"
        );
        Ok(batch)
    }

    /// Process exactly one chunk of the batch.
    pub fn run_step(&self, batch: &mut DeletionBatch) -> Result<BatchProgress, AccountError> {
        if batch.is_finished() {
            return Ok(batch.progress("Nothing left to process".to_string()));
        }

        let index = batch.cursor;
        let mut notices = Vec::new();
        match &batch.operation {
            DeletionOperation::ReassignContent { new_owner, chunks } => {
                for content in &chunks[index] {
                    match self.store.reassign_content(*content, *new_owner) {
                        Ok(_) => {}
                        Err(RepositoryError::NotFound) => {
                            tracing::debug!(content = %content, "content vanished before reassignment");
                        }
                        Err(error) => return Err(error.into()),
                    }
                }
            }
            DeletionOperation::RemoveApplications { chunks } => {
                for submission in &chunks[index] {
                    match self.applications.delete(*submission) {
                        Ok(mut raised) => notices.append(&mut raised),
                        Err(ApplicationServiceError::SubmissionNotFound(_)) => {
                            tracing::debug!(submission = %submission, "application vanished before removal");
                        }
                        Err(error) => return Err(error.into()),
                    }
                }
            }
        }

        batch.cursor += 1;
        let mut progress = batch.progress(format!(
            "Running batch {} of {}",
            batch.cursor,
            batch.total_chunks()
        ));
        progress.notices = notices;
        tracing::debug!(
            account = %batch.account,
            processed = progress.processed,
            total = progress.total,
            "account deletion progressed"
        );
        Ok(progress)
    }

    /// Remove the account once every chunk has been processed.
    pub fn finish(&self, batch: &DeletionBatch) -> Result<Notice, AccountError> {
        if !batch.is_finished() {
            return Err(AccountError::BatchIncomplete {
                remaining: batch.total_chunks() - batch.cursor,
            });
        }

        if let Some(organisation) = batch.organisation {
            self.store.remove_member(organisation, batch.account)?;
        }
        self.store.delete_account(batch.account)?;

        tracing::info!(account = %batch.account, "account deleted");
        Ok(Notice::status("The account has been deleted."))
    }

    /// Plan, run and finish the deletion in one go.
    pub fn delete_account(&self, account: &Account) -> Result<Vec<Notice>, AccountError> {
        let mut batch = self.plan_deletion(account)?;
        let mut notices = Vec::new();
        while !batch.is_finished() {
            let mut progress = self.run_step(&mut batch)?;
            notices.append(&mut progress.notices);
        }
        notices.push(self.finish(&batch)?);
        Ok(notices)
    }

    /// Remove a team member on behalf of another member of the organisation.
    pub fn remove_member(
        &self,
        actor: AccountId,
        organisation: OrganisationId,
        member: AccountId,
    ) -> Result<Vec<Notice>, AccountError> {
        if actor == member {
            return Err(AccountError::CannotRemoveSelf);
        }

        let members = self.store.members(organisation)?;
        if !members.contains(&member) {
            return Err(AccountError::NotMember(member));
        }

        let actor_account = self.account(actor)?;
        if !members.contains(&actor) && !actor_account.is_site_administrator() {
            return Err(AccountError::NotMember(actor));
        }

        if members.len() <= 1 {
            return Ok(vec![Notice::warning(
                "The last member of an organisation cannot be removed.",
            )]);
        }

        let account = self.account(member)?;
        tracing::info!(organisation = %organisation, member = %member, "removing team member");
        self.delete_account(&account)
    }

    fn chunk<T: Clone>(&self, items: Vec<T>) -> Vec<Vec<T>> {
        items
            .chunks(self.chunk_size)
            .map(|chunk| chunk.to_vec())
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Applications(#[from] ApplicationServiceError),
    #[error("account {0} not found")]
    AccountNotFound(AccountId),
    #[error("account {0} cannot be deleted")]
    CannotDelete(AccountId),
    #[error("no other active member can take over content owned by account {0}")]
    NoSuccessor(AccountId),
    #[error("deletion batch still has {remaining} chunks to process")]
    BatchIncomplete { remaining: usize },
    #[error("members cannot remove themselves")]
    CannotRemoveSelf,
    #[error("account {0} is not a member of the organisation")]
    NotMember(AccountId),
}
