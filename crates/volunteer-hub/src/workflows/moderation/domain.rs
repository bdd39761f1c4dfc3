use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::identifiers::{AccountId, ContentId, OrganisationId, RevisionId};

/// Editorial state carried by every revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationState {
    Draft,
    ReadyForReview,
    Approved,
    Published,
    Unpublished,
    Archived,
}

impl ModerationState {
    pub const ALL: [ModerationState; 6] = [
        ModerationState::Draft,
        ModerationState::ReadyForReview,
        ModerationState::Approved,
        ModerationState::Published,
        ModerationState::Unpublished,
        ModerationState::Archived,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::ReadyForReview => "ready_for_review",
            Self::Approved => "approved",
            Self::Published => "published",
            Self::Unpublished => "unpublished",
            Self::Archived => "archived",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.label() == label)
    }

    /// Only published content is visible to the public.
    pub const fn is_published(self) -> bool {
        matches!(self, Self::Published)
    }

    /// A revision entering one of these states always becomes the default revision.
    pub const fn is_default_revision_state(self) -> bool {
        matches!(self, Self::Published | Self::Unpublished | Self::Archived)
    }

    pub fn can_transition_to(self, target: ModerationState) -> bool {
        use ModerationState::*;

        if self == target {
            return true;
        }

        match self {
            Draft => matches!(target, ReadyForReview | Archived),
            ReadyForReview => matches!(target, Draft | Approved | Published),
            Approved => matches!(target, Published | Draft | Unpublished),
            Published => matches!(target, Draft | Unpublished | Archived),
            Unpublished => matches!(target, Draft | Published | Archived),
            Archived => matches!(target, Draft | Published),
        }
    }
}

/// Kind of moderated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    ProviderProfile,
    Role,
}

impl ContentKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ProviderProfile => "provider_profile",
            Self::Role => "role",
        }
    }
}

/// Which optional questions a role puts to its applicants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplicationQuestions {
    pub ask_motivation: bool,
    pub ask_requirements: bool,
}

/// Editable fields of a profile or role revision.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentFields {
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub starts_on: Option<NaiveDate>,
    #[serde(default)]
    pub advert_starts_on: Option<NaiveDate>,
    #[serde(default)]
    pub advert_ends_on: Option<NaiveDate>,
    #[serde(default)]
    pub questions: ApplicationQuestions,
}

/// Scheduled state changes attached to a revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schedule {
    pub publish_on: Option<DateTime<Utc>>,
    pub unpublish_on: Option<DateTime<Utc>>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.publish_on.is_none() && self.unpublish_on.is_none()
    }
}

/// Immutable snapshot of a content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: RevisionId,
    pub content_id: ContentId,
    pub state: ModerationState,
    pub fields: ContentFields,
    pub schedule: Schedule,
    /// Revision log; on drafts following a review this carries reviewer feedback.
    pub log: String,
    pub author: AccountId,
    pub created_at: DateTime<Utc>,
}

/// Revision data before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionDraft {
    pub content_id: ContentId,
    pub state: ModerationState,
    pub fields: ContentFields,
    pub schedule: Schedule,
    pub log: String,
    pub author: AccountId,
    pub created_at: DateTime<Utc>,
}

impl RevisionDraft {
    /// Start from an existing revision, keeping its fields and schedule.
    pub fn from_revision(revision: &Revision, state: ModerationState, author: AccountId) -> Self {
        Self {
            content_id: revision.content_id,
            state,
            fields: revision.fields.clone(),
            schedule: revision.schedule,
            log: String::new(),
            author,
            created_at: Utc::now(),
        }
    }
}

/// Provider profile or role with pointers to its default and latest revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub kind: ContentKind,
    pub owner: AccountId,
    pub organisation: Option<OrganisationId>,
    pub default_revision: RevisionId,
    pub latest_revision: RevisionId,
    pub created_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn is_role(&self) -> bool {
        self.kind == ContentKind::Role
    }

    /// True when an unpublished edit sits on top of the default revision.
    pub fn has_pending_revision(&self) -> bool {
        self.default_revision != self.latest_revision
    }
}

/// Input for creating a content item together with its first revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDraft {
    pub kind: ContentKind,
    pub owner: AccountId,
    pub organisation: Option<OrganisationId>,
    pub state: ModerationState,
    pub fields: ContentFields,
    pub schedule: Schedule,
}

impl ContentDraft {
    pub fn new(kind: ContentKind, owner: AccountId, fields: ContentFields) -> Self {
        Self {
            kind,
            owner,
            organisation: None,
            state: ModerationState::Draft,
            fields,
            schedule: Schedule::default(),
        }
    }

    pub fn in_organisation(mut self, organisation: OrganisationId) -> Self {
        self.organisation = Some(organisation);
        self
    }

    pub fn with_state(mut self, state: ModerationState) -> Self {
        self.state = state;
        self
    }
}

/// Reviewer feedback attached to the draft that followed the latest review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub revision: RevisionId,
    pub log: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_revision_states_cover_terminal_states() {
        let defaults: Vec<_> = ModerationState::ALL
            .into_iter()
            .filter(|state| state.is_default_revision_state())
            .collect();
        assert_eq!(
            defaults,
            vec![
                ModerationState::Published,
                ModerationState::Unpublished,
                ModerationState::Archived
            ]
        );
    }

    #[test]
    fn drafts_cannot_skip_review() {
        assert!(!ModerationState::Draft.can_transition_to(ModerationState::Published));
        assert!(!ModerationState::Draft.can_transition_to(ModerationState::Approved));
        assert!(ModerationState::ReadyForReview.can_transition_to(ModerationState::Published));
        assert!(ModerationState::Archived.can_transition_to(ModerationState::Draft));
        assert!(!ModerationState::Archived.can_transition_to(ModerationState::Unpublished));
    }

    #[test]
    fn labels_round_trip() {
        for state in ModerationState::ALL {
            assert_eq!(ModerationState::from_label(state.label()), Some(state));
        }
        assert_eq!(ModerationState::from_label("needs_work"), None);
    }
}
