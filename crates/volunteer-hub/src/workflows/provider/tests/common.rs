use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::workflows::accounts::{Account, AccountDraft, AccountRepository, AccountRole};
use crate::workflows::applications::{ApplicationAnswers, ApplicationService};
use crate::workflows::identifiers::{ContentId, SubmissionId};
use crate::workflows::memory::{MemoryNotifications, MemoryStore};
use crate::workflows::moderation::{
    ContentDraft, ContentFields, ContentItem, ContentKind, ContentRepository, ModerationState,
    Revision, TransitionRequest,
};
use crate::workflows::provider::{Organisation, ProviderLifecycleService};

pub(super) type Service = ProviderLifecycleService<MemoryStore, MemoryNotifications>;

pub(super) struct Fixture {
    pub(super) store: Arc<MemoryStore>,
    pub(super) notifier: Arc<MemoryNotifications>,
    pub(super) service: Arc<Service>,
    pub(super) owner: Account,
    pub(super) colleague: Account,
    pub(super) profile: ContentItem,
    pub(super) organisation: Organisation,
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn account(store: &MemoryStore, email: &str, role: AccountRole) -> Account {
    store
        .insert_account(AccountDraft::new(email, "Alex", "Morgan", role))
        .expect("account stored")
}

pub(super) fn profile_fields() -> ContentFields {
    ContentFields {
        title: "  Green Spaces ".to_string(),
        summary: Some("Looking after the city's parks.".to_string()),
        ..ContentFields::default()
    }
}

pub(super) fn role_fields(title: &str) -> ContentFields {
    ContentFields {
        title: title.to_string(),
        summary: Some("Hands-on outdoor work.".to_string()),
        location: Some("Victoria Park".to_string()),
        starts_on: Some(date(2026, 11, 2)),
        advert_starts_on: Some(date(2026, 10, 1)),
        advert_ends_on: Some(date(2026, 10, 31)),
        ..ContentFields::default()
    }
}

/// Provider whose profile has been reviewed and published, which creates
/// the organisation, plus a second team member.
pub(super) fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MemoryNotifications::new());
    let service = Arc::new(ProviderLifecycleService::new(
        store.clone(),
        notifier.clone(),
        WorkflowConfig::default(),
    ));

    let owner = account(&store, "pat@greenspaces.org", AccountRole::Provider);
    let profile = service.create_stub_profile(owner.id).expect("stub profile");
    service
        .moderate(
            profile.id,
            TransitionRequest::new(ModerationState::ReadyForReview, owner.id)
                .with_fields(profile_fields()),
        )
        .expect("profile submitted");
    let report = service
        .moderate(
            profile.id,
            TransitionRequest::new(ModerationState::Published, owner.id),
        )
        .expect("profile published");
    let organisation = report.created_organisation.expect("organisation created");
    let profile = report.transition.content;

    let colleague = account(&store, "sam@greenspaces.org", AccountRole::Volunteer);
    service
        .add_member(organisation.id, colleague.id)
        .expect("colleague joins");

    Fixture {
        store,
        notifier,
        service,
        owner,
        colleague,
        profile,
        organisation,
    }
}

/// Role stored directly in the given state, bypassing moderation.
pub(super) fn role_in(fixture: &Fixture, state: ModerationState, title: &str) -> ContentItem {
    let (item, _) = fixture
        .store
        .insert_content(
            ContentDraft::new(ContentKind::Role, fixture.owner.id, role_fields(title))
                .in_organisation(fixture.organisation.id)
                .with_state(state),
        )
        .expect("role stored");
    item
}

pub(super) fn content(fixture: &Fixture, id: ContentId) -> ContentItem {
    fixture
        .store
        .fetch_content(id)
        .expect("lookup")
        .expect("content exists")
}

pub(super) fn default_revision(fixture: &Fixture, id: ContentId) -> Revision {
    let item = content(fixture, id);
    fixture
        .store
        .fetch_revision(item.default_revision)
        .expect("lookup")
        .expect("revision exists")
}

/// Volunteer application submitted to the role.
pub(super) fn application(fixture: &Fixture, role: ContentId, email: &str) -> SubmissionId {
    let applications = ApplicationService::new(
        fixture.store.clone(),
        fixture.notifier.clone(),
        WorkflowConfig::default(),
    );
    let volunteer = account(&fixture.store, email, AccountRole::Volunteer);
    let submission = applications
        .start(volunteer.id, role)
        .expect("application started");
    applications
        .save_answers(submission.id, None, ApplicationAnswers::default())
        .expect("answers saved");
    applications
        .submit(submission.id)
        .expect("application submitted");
    submission.id
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
