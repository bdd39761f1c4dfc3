use serde::Serialize;

use super::domain::{ContentFields, ContentKind, ModerationState, Revision, RevisionDraft, Schedule};

/// Field a validation violation is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Title,
    Summary,
    Location,
    AdvertEnd,
    PublishOn,
    UnpublishOn,
    ModerationState,
}

impl FieldName {
    /// Scheduler fields are ignored when judging whether archived or
    /// unpublished content could be duplicated.
    pub const fn is_scheduler(self) -> bool {
        matches!(
            self,
            Self::PublishOn | Self::UnpublishOn | Self::ModerationState
        )
    }
}

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: FieldName,
    pub message: String,
}

impl Violation {
    fn new(field: FieldName, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Run every content rule against a stored revision.
pub fn validate(kind: ContentKind, revision: &Revision) -> Vec<Violation> {
    check(kind, revision.state, &revision.fields, &revision.schedule)
}

/// Same rules for a revision that has not been stored yet.
pub fn validate_draft(kind: ContentKind, draft: &RevisionDraft) -> Vec<Violation> {
    check(kind, draft.state, &draft.fields, &draft.schedule)
}

fn check(
    kind: ContentKind,
    state: ModerationState,
    fields: &ContentFields,
    schedule: &Schedule,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    if fields.title.trim().is_empty() {
        violations.push(Violation::new(FieldName::Title, "Title is required."));
    }

    if is_blank(fields.summary.as_deref()) {
        violations.push(Violation::new(FieldName::Summary, "Summary is required."));
    }

    if kind == ContentKind::Role && is_blank(fields.location.as_deref()) {
        violations.push(Violation::new(
            FieldName::Location,
            "Roles must state where the volunteering takes place.",
        ));
    }

    if let (Some(start), Some(end)) = (fields.advert_starts_on, fields.advert_ends_on) {
        if end < start {
            violations.push(Violation::new(
                FieldName::AdvertEnd,
                "The advert cannot end before it starts.",
            ));
        }
    }

    violations.extend(check_schedule(state, schedule));
    violations
}

/// Rules enforced by the publishing scheduler.
fn check_schedule(state: ModerationState, schedule: &Schedule) -> Vec<Violation> {
    let mut violations = Vec::new();

    if let (Some(publish_on), Some(unpublish_on)) = (schedule.publish_on, schedule.unpublish_on) {
        if unpublish_on <= publish_on {
            violations.push(Violation::new(
                FieldName::UnpublishOn,
                "The unpublish date must be later than the publish date.",
            ));
        }
    }

    if schedule.publish_on.is_some()
        && matches!(
            state,
            ModerationState::Unpublished | ModerationState::Archived
        )
    {
        violations.push(Violation::new(
            FieldName::PublishOn,
            "Content cannot be scheduled for publishing in this state.",
        ));
        violations.push(Violation::new(
            FieldName::ModerationState,
            "Choose a state that allows scheduled publishing.",
        ));
    }

    violations
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |text| text.trim().is_empty())
}
