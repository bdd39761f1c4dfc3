use super::domain::{ApplicationSubmission, SubmissionDraft};
use crate::workflows::identifiers::{AccountId, ContentId, OrganisationId, SubmissionId};
use crate::workflows::store::RepositoryError;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait SubmissionRepository: Send + Sync {
    fn insert_submission(
        &self,
        draft: SubmissionDraft,
    ) -> Result<ApplicationSubmission, RepositoryError>;
    fn update_submission(&self, submission: ApplicationSubmission) -> Result<(), RepositoryError>;
    fn fetch_submission(
        &self,
        id: SubmissionId,
    ) -> Result<Option<ApplicationSubmission>, RepositoryError>;
    fn delete_submission(&self, id: SubmissionId) -> Result<(), RepositoryError>;
    fn submissions_for_role(
        &self,
        role: ContentId,
    ) -> Result<Vec<ApplicationSubmission>, RepositoryError>;
    fn submissions_for_organisation(
        &self,
        organisation: OrganisationId,
    ) -> Result<Vec<ApplicationSubmission>, RepositoryError>;
    fn submissions_by_volunteer(
        &self,
        volunteer: AccountId,
    ) -> Result<Vec<ApplicationSubmission>, RepositoryError>;
}
