use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::workflows::accounts::{Account, AccountDraft, AccountRepository, AccountRole};
use crate::workflows::applications::{ApplicantDetails, ApplicationAnswers, ApplicationService};
use crate::workflows::identifiers::SubmissionId;
use crate::workflows::memory::{MemoryNotifications, MemoryStore};
use crate::workflows::moderation::{
    ApplicationQuestions, ContentDraft, ContentFields, ContentItem, ContentKind, ContentRepository,
    ModerationState,
};
use crate::workflows::provider::{Organisation, OrganisationDraft, OrganisationRepository};

pub(super) type Service = ApplicationService<MemoryStore, MemoryNotifications>;

pub(super) struct Fixture {
    pub(super) store: Arc<MemoryStore>,
    pub(super) notifier: Arc<MemoryNotifications>,
    pub(super) service: Arc<Service>,
    pub(super) provider: Account,
    pub(super) colleague: Account,
    pub(super) volunteer: Account,
    pub(super) organisation: Organisation,
    pub(super) role: ContentItem,
}

pub(super) fn account(store: &MemoryStore, email: &str, first: &str, role: AccountRole) -> Account {
    store
        .insert_account(AccountDraft::new(email, first, "Tester", role))
        .expect("account stored")
}

pub(super) fn role_fields() -> ContentFields {
    ContentFields {
        title: "Park clean-up".to_string(),
        summary: Some("Help keep the park tidy.".to_string()),
        location: Some("Victoria Park".to_string()),
        questions: ApplicationQuestions {
            ask_motivation: true,
            ask_requirements: false,
        },
        ..ContentFields::default()
    }
}

pub(super) fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MemoryNotifications::new());

    let provider = account(&store, "pat@greenspaces.org", "Pat", AccountRole::Provider);
    let colleague = account(&store, "sam@greenspaces.org", "Sam", AccountRole::Provider);
    let volunteer = account(&store, "val@example.org", "Val", AccountRole::Volunteer);

    let organisation = store
        .insert_organisation(OrganisationDraft {
            label: "Green Spaces".to_string(),
            profile: None,
        })
        .expect("organisation stored");
    store
        .add_member(organisation.id, provider.id)
        .expect("provider joins");
    store
        .add_member(organisation.id, colleague.id)
        .expect("colleague joins");

    let (role, _) = store
        .insert_content(
            ContentDraft::new(ContentKind::Role, provider.id, role_fields())
                .in_organisation(organisation.id)
                .with_state(ModerationState::Published),
        )
        .expect("role stored");

    let service = Arc::new(ApplicationService::new(
        store.clone(),
        notifier.clone(),
        WorkflowConfig::default(),
    ));

    Fixture {
        store,
        notifier,
        service,
        provider,
        colleague,
        volunteer,
        organisation,
        role,
    }
}

pub(super) fn motivated() -> ApplicationAnswers {
    ApplicationAnswers {
        motivation: Some("I walk through the park every day.".to_string()),
        ..ApplicationAnswers::default()
    }
}

/// Started, completed and submitted application for the fixture role.
pub(super) fn submitted(fixture: &Fixture) -> SubmissionId {
    let submission = fixture
        .service
        .start(fixture.volunteer.id, fixture.role.id)
        .expect("application started");
    fixture
        .service
        .save_answers(submission.id, None, motivated())
        .expect("answers saved");
    fixture
        .service
        .submit(submission.id)
        .expect("application submitted");
    submission.id
}

pub(super) fn applicant(first_name: &str) -> ApplicantDetails {
    ApplicantDetails {
        email: "val@example.org".to_string(),
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
