use crate::workflows::applications::ApplicationSubmission;
use crate::workflows::identifiers::AccountId;
use crate::workflows::moderation::ContentItem;
use crate::workflows::store::{MarketplaceStore, RepositoryError};

/// Why an account may not act on a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("application is not attached to an organisation")]
    Unattached,
    #[error("account does not belong to the application's organisation")]
    NotMember,
    #[error("organisation is suspended")]
    Suspended,
}

/// Providers respond only to applications for their own organisation, and
/// only while that organisation is active.
pub fn respond_access<S>(
    store: &S,
    account: AccountId,
    submission: &ApplicationSubmission,
) -> Result<Result<(), AccessDenied>, RepositoryError>
where
    S: MarketplaceStore + ?Sized,
{
    let Some(organisation_id) = submission.organisation else {
        return Ok(Err(AccessDenied::Unattached));
    };

    if store.organisation_of(account)? != Some(organisation_id) {
        return Ok(Err(AccessDenied::NotMember));
    }

    let suspended = store
        .fetch_organisation(organisation_id)?
        .map_or(true, |organisation| organisation.suspended);
    if suspended {
        return Ok(Err(AccessDenied::Suspended));
    }

    Ok(Ok(()))
}

/// Unpublished edits are visible to every member of the owning organisation.
pub fn can_view_latest<S>(
    store: &S,
    account: AccountId,
    content: &ContentItem,
) -> Result<bool, RepositoryError>
where
    S: MarketplaceStore + ?Sized,
{
    let Some(organisation) = content.organisation else {
        return Ok(content.owner == account);
    };
    Ok(store.organisation_of(account)? == Some(organisation))
}
