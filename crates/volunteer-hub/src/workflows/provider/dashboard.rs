use chrono::NaiveDate;
use serde::Serialize;

use super::lifecycle::{ProviderError, ProviderLifecycleService};
use crate::workflows::identifiers::{ContentId, OrganisationId, RevisionId};
use crate::workflows::moderation::{ModerationState, Revision};
use crate::workflows::notifications::NotificationPublisher;
use crate::workflows::store::MarketplaceStore;

/// Dashboard groupings of an organisation's roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardSection {
    Archived,
    Draft,
    ReadyForReview,
    Published,
    Approved,
    Unpublished,
    Expired,
    Feedback,
}

impl DashboardSection {
    pub const ALL: [DashboardSection; 8] = [
        DashboardSection::Archived,
        DashboardSection::Draft,
        DashboardSection::ReadyForReview,
        DashboardSection::Published,
        DashboardSection::Approved,
        DashboardSection::Unpublished,
        DashboardSection::Expired,
        DashboardSection::Feedback,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            Self::Archived => "Archived Roles",
            Self::Draft => "Roles you've started",
            Self::ReadyForReview => "Roles you've submitted",
            Self::Published => "Published Roles",
            Self::Approved => "Approved roles yet to be advertised",
            Self::Unpublished => "Unpublished Roles",
            Self::Expired => "Expired Roles",
            Self::Feedback => "Roles with Feedback",
        }
    }

    fn matches(self, revision: &Revision, today: NaiveDate) -> bool {
        let has_log = !revision.log.trim().is_empty();
        match self {
            Self::Archived => revision.state == ModerationState::Archived,
            Self::Draft => revision.state == ModerationState::Draft && !has_log,
            Self::ReadyForReview => revision.state == ModerationState::ReadyForReview,
            Self::Published => revision.state == ModerationState::Published,
            Self::Approved => revision.state == ModerationState::Approved,
            Self::Unpublished => revision.state == ModerationState::Unpublished,
            Self::Expired => revision
                .fields
                .advert_ends_on
                .is_some_and(|ends| ends < today),
            Self::Feedback => revision.state == ModerationState::Draft && has_log,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ApplicationCounts {
    pub awaiting_response: usize,
    pub responded: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleSummary {
    pub id: ContentId,
    pub title: String,
    pub revision: RevisionId,
    /// The matching revision is an unpublished edit, not the default one.
    pub pending: bool,
    pub starts_on: Option<NaiveDate>,
    pub applications: ApplicationCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionView {
    pub section: DashboardSection,
    pub title: &'static str,
    pub roles: Vec<RoleSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleOverview {
    pub organisation: OrganisationId,
    pub label: String,
    pub suspended: bool,
    pub sections: Vec<SectionView>,
}

impl<S, N> ProviderLifecycleService<S, N>
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    /// Roles grouped by section. A role is listed under a section when its
    /// default revision matches, otherwise when its latest revision does.
    pub fn role_overview(
        &self,
        id: OrganisationId,
        today: NaiveDate,
    ) -> Result<RoleOverview, ProviderError> {
        let organisation = self.organisation(id)?;

        let mut roles = Vec::new();
        for item in self.store.content_in_organisation(id)? {
            if !item.is_role() {
                continue;
            }
            let default = self.moderation.default_revision(&item)?;
            let latest = if item.has_pending_revision() {
                Some(self.moderation.latest_revision(&item)?)
            } else {
                None
            };
            let counts = self.application_counts(item.id)?;
            roles.push((item.id, default, latest, counts));
        }

        let sections = DashboardSection::ALL
            .into_iter()
            .map(|section| {
                let listed = roles
                    .iter()
                    .filter_map(|(id, default, latest, counts)| {
                        let (revision, pending) = if section.matches(default, today) {
                            (default, false)
                        } else {
                            match latest {
                                Some(latest) if section.matches(latest, today) => (latest, true),
                                _ => return None,
                            }
                        };
                        Some(summary(*id, revision, pending, *counts))
                    })
                    .collect();
                SectionView {
                    section,
                    title: section.title(),
                    roles: listed,
                }
            })
            .collect();

        Ok(RoleOverview {
            organisation: id,
            label: organisation.label,
            suspended: organisation.suspended,
            sections,
        })
    }

    fn application_counts(&self, role: ContentId) -> Result<ApplicationCounts, ProviderError> {
        let mut counts = ApplicationCounts::default();
        for submission in self.store.submissions_for_role(role)? {
            if !submission.submitted {
                continue;
            }
            if submission.responded {
                counts.responded += 1;
            } else {
                counts.awaiting_response += 1;
            }
        }
        Ok(counts)
    }
}

fn summary(
    id: ContentId,
    revision: &Revision,
    pending: bool,
    applications: ApplicationCounts,
) -> RoleSummary {
    let title = revision.fields.title.trim();
    RoleSummary {
        id,
        title: if title.is_empty() {
            "<Unnamed>".to_string()
        } else {
            title.to_string()
        },
        revision: revision.id,
        pending,
        starts_on: revision.fields.starts_on,
        applications,
    }
}
