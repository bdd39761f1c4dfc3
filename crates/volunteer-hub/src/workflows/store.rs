use super::accounts::AccountRepository;
use super::applications::SubmissionRepository;
use super::moderation::ContentRepository;
use super::provider::OrganisationRepository;

/// Error enumeration shared by every storage port.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Everything the workflow services need from persistence.
pub trait MarketplaceStore:
    AccountRepository + ContentRepository + OrganisationRepository + SubmissionRepository
{
}

impl<T> MarketplaceStore for T where
    T: AccountRepository + ContentRepository + OrganisationRepository + SubmissionRepository
{
}
