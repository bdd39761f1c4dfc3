use super::domain::{Account, AccountDraft};
use crate::workflows::identifiers::AccountId;
use crate::workflows::store::RepositoryError;

/// Storage port for user accounts.
pub trait AccountRepository: Send + Sync {
    fn insert_account(&self, draft: AccountDraft) -> Result<Account, RepositoryError>;
    fn update_account(&self, account: Account) -> Result<(), RepositoryError>;
    fn fetch_account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;
    fn delete_account(&self, id: AccountId) -> Result<(), RepositoryError>;
}
