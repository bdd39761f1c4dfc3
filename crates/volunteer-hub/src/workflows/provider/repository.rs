use super::domain::{Organisation, OrganisationDraft};
use crate::workflows::identifiers::{AccountId, OrganisationId};
use crate::workflows::store::RepositoryError;

/// Storage port for organisations and their membership.
pub trait OrganisationRepository: Send + Sync {
    fn insert_organisation(&self, draft: OrganisationDraft)
        -> Result<Organisation, RepositoryError>;
    fn update_organisation(&self, organisation: Organisation) -> Result<(), RepositoryError>;
    fn fetch_organisation(
        &self,
        id: OrganisationId,
    ) -> Result<Option<Organisation>, RepositoryError>;
    fn delete_organisation(&self, id: OrganisationId) -> Result<(), RepositoryError>;
    /// An account belongs to at most one organisation.
    fn add_member(
        &self,
        organisation: OrganisationId,
        account: AccountId,
    ) -> Result<(), RepositoryError>;
    fn remove_member(
        &self,
        organisation: OrganisationId,
        account: AccountId,
    ) -> Result<(), RepositoryError>;
    /// Members in the order they joined.
    fn members(&self, organisation: OrganisationId) -> Result<Vec<AccountId>, RepositoryError>;
    fn organisation_of(&self, account: AccountId)
        -> Result<Option<OrganisationId>, RepositoryError>;
}
