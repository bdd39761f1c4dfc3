//! Provider organisations: creation from a published profile, team
//! membership, suspension and reactivation, deletion, role management and
//! the role dashboard.

pub mod access;
pub mod dashboard;
pub mod domain;
pub mod lifecycle;
pub mod repository;
pub mod roles;
pub mod router;

#[cfg(test)]
mod tests;

pub use access::{can_view_latest, respond_access, AccessDenied};
pub use dashboard::{ApplicationCounts, DashboardSection, RoleOverview, RoleSummary, SectionView};
pub use domain::{
    default_response_text, Organisation, OrganisationDraft, ResponseTemplates, RestoreEntry,
    RestorePlan, RestorePlanError,
};
pub use lifecycle::{
    ModerationReport, ProviderError, ProviderLifecycleService, ReactivationReport,
    SuspensionReport,
};
pub use repository::OrganisationRepository;
pub use roles::DuplicationEligibility;
pub use router::provider_router;
