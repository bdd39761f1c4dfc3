use super::domain::{ContentDraft, ContentItem, Revision, RevisionDraft};
use crate::workflows::identifiers::{AccountId, ContentId, OrganisationId, RevisionId};
use crate::workflows::store::RepositoryError;

/// Storage port for moderated content and its revision history.
pub trait ContentRepository: Send + Sync {
    /// Create the item and its first revision, which is both default and latest.
    fn insert_content(&self, draft: ContentDraft)
        -> Result<(ContentItem, Revision), RepositoryError>;
    fn fetch_content(&self, id: ContentId) -> Result<Option<ContentItem>, RepositoryError>;
    fn fetch_revision(&self, id: RevisionId) -> Result<Option<Revision>, RepositoryError>;
    /// Every revision of the item, oldest first.
    fn revision_history(&self, id: ContentId) -> Result<Vec<Revision>, RepositoryError>;
    /// Store a new latest revision; `make_default` also moves the default pointer.
    fn append_revision(
        &self,
        draft: RevisionDraft,
        make_default: bool,
    ) -> Result<Revision, RepositoryError>;
    /// Point both default and latest at an existing revision of the item.
    fn promote_revision(
        &self,
        content: ContentId,
        revision: RevisionId,
    ) -> Result<ContentItem, RepositoryError>;
    fn assign_organisation(
        &self,
        content: ContentId,
        organisation: OrganisationId,
    ) -> Result<ContentItem, RepositoryError>;
    fn content_in_organisation(
        &self,
        organisation: OrganisationId,
    ) -> Result<Vec<ContentItem>, RepositoryError>;
    fn content_owned_by(&self, owner: AccountId) -> Result<Vec<ContentItem>, RepositoryError>;
    /// Move ownership and revision authorship without creating a revision.
    fn reassign_content(
        &self,
        content: ContentId,
        owner: AccountId,
    ) -> Result<ContentItem, RepositoryError>;
    /// Remove the item and its revisions.
    fn delete_content(&self, id: ContentId) -> Result<(), RepositoryError>;
}
