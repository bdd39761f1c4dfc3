use std::sync::Arc;

use serde_json::json;
use volunteer_hub::config::WorkflowConfig;
use volunteer_hub::workflows::accounts::{AccountDraft, AccountRepository, AccountRole};
use volunteer_hub::workflows::memory::{MemoryNotifications, MemoryStore};
use volunteer_hub::workflows::moderation::{
    ContentDraft, ContentFields, ContentKind, ContentRepository, ModerationState,
    TransitionRequest,
};
use volunteer_hub::workflows::provider::{
    OrganisationRepository, ProviderLifecycleService, RestorePlan,
};
use volunteer_hub::workflows::{AccountId, ContentId, RevisionId};

type Service = ProviderLifecycleService<MemoryStore, MemoryNotifications>;

fn service() -> (Arc<MemoryStore>, Arc<MemoryNotifications>, Service) {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MemoryNotifications::new());
    let service =
        ProviderLifecycleService::new(store.clone(), notifier.clone(), WorkflowConfig::default());
    (store, notifier, service)
}

fn fields(title: &str) -> ContentFields {
    ContentFields {
        title: title.to_string(),
        summary: Some("Community volunteering.".to_string()),
        location: Some("Hackney".to_string()),
        ..ContentFields::default()
    }
}

fn provider(store: &MemoryStore) -> AccountId {
    store
        .insert_account(AccountDraft::new(
            "coordinator@riverside.org",
            "Jo",
            "Rivers",
            AccountRole::Provider,
        ))
        .expect("provider stored")
        .id
}

fn move_to(service: &Service, content: ContentId, state: ModerationState, actor: AccountId) {
    service
        .moderate(content, TransitionRequest::new(state, actor))
        .expect("transition allowed");
}

fn snapshot(store: &MemoryStore, ids: &[ContentId]) -> Vec<(RevisionId, ModerationState)> {
    ids.iter()
        .map(|id| {
            let item = store.fetch_content(*id).expect("lookup").expect("exists");
            let revision = store
                .fetch_revision(item.default_revision)
                .expect("lookup")
                .expect("exists");
            (revision.id, revision.state)
        })
        .collect()
}

#[test]
fn suspend_then_reactivate_restores_the_worked_example() {
    let (store, notifier, service) = service();
    let owner = provider(&store);

    let profile = service.create_stub_profile(owner).expect("profile");
    let (role, _) = store
        .insert_content(ContentDraft::new(ContentKind::Role, owner, fields("Food bank")))
        .expect("role");

    service
        .moderate(
            role.id,
            TransitionRequest::new(ModerationState::ReadyForReview, owner),
        )
        .expect("role submitted");
    for _ in 0..2 {
        service
            .moderate(
                role.id,
                TransitionRequest::new(ModerationState::Draft, owner).with_log("Needs hours."),
            )
            .expect("role returned");
        move_to(&service, role.id, ModerationState::ReadyForReview, owner);
    }

    service
        .moderate(
            profile.id,
            TransitionRequest::new(ModerationState::ReadyForReview, owner)
                .with_fields(fields("Riverside Trust")),
        )
        .expect("profile submitted");
    move_to(&service, profile.id, ModerationState::Approved, owner);
    let published = service
        .moderate(
            profile.id,
            TransitionRequest::new(ModerationState::Published, owner),
        )
        .expect("profile published");
    let organisation = published
        .created_organisation
        .expect("organisation created on first publication");
    store
        .assign_organisation(role.id, organisation.id)
        .expect("role joins organisation");

    let items = [profile.id, role.id];
    assert_eq!(
        snapshot(&store, &items),
        vec![
            (RevisionId(10), ModerationState::Published),
            (RevisionId(7), ModerationState::ReadyForReview),
        ]
    );
    let mails_before = notifier.events().len();

    let suspension = service.suspend(organisation.id).expect("suspended");
    let expected_plan = RestorePlan::from_value(json!({
        "published": { profile.id.to_string(): 10 },
        "ready_for_review": { role.id.to_string(): 7 },
    }))
    .expect("plan");
    assert_eq!(suspension.restore_plan, expected_plan);

    for (revision, state) in snapshot(&store, &items) {
        assert_eq!(state, ModerationState::Unpublished);
        assert!(revision.0 > 10);
    }

    service.reactivate(organisation.id).expect("reactivated");
    assert_eq!(
        snapshot(&store, &items),
        vec![
            (RevisionId(10), ModerationState::Published),
            (RevisionId(7), ModerationState::ReadyForReview),
        ]
    );
    assert_eq!(notifier.events().len(), mails_before);
}

#[test]
fn suspend_then_reactivate_restores_every_state() {
    let (store, _, service) = service();
    let owner = provider(&store);

    let profile = service.create_stub_profile(owner).expect("profile");
    service
        .moderate(
            profile.id,
            TransitionRequest::new(ModerationState::ReadyForReview, owner)
                .with_fields(fields("Riverside Trust")),
        )
        .expect("profile submitted");
    let organisation = service
        .moderate(
            profile.id,
            TransitionRequest::new(ModerationState::Published, owner),
        )
        .expect("published")
        .created_organisation
        .expect("organisation");

    let mut items = vec![profile.id];
    for state in ModerationState::ALL {
        let (item, _) = store
            .insert_content(
                ContentDraft::new(ContentKind::Role, owner, fields(state.label()))
                    .in_organisation(organisation.id)
                    .with_state(state),
            )
            .expect("role");
        items.push(item.id);
    }

    let before = snapshot(&store, &items);
    service.suspend(organisation.id).expect("suspended");
    service.reactivate(organisation.id).expect("reactivated");
    assert_eq!(snapshot(&store, &items), before);

    let organisation = store
        .fetch_organisation(organisation.id)
        .expect("lookup")
        .expect("exists");
    assert!(!organisation.suspended);
}

#[test]
fn duplication_depends_on_the_default_revision() {
    let (store, _, service) = service();
    let owner = provider(&store);
    let profile = service.create_stub_profile(owner).expect("profile");
    service
        .moderate(
            profile.id,
            TransitionRequest::new(ModerationState::ReadyForReview, owner)
                .with_fields(fields("Riverside Trust")),
        )
        .expect("profile submitted");
    let organisation = service
        .moderate(
            profile.id,
            TransitionRequest::new(ModerationState::Published, owner),
        )
        .expect("published")
        .created_organisation
        .expect("organisation");

    let role_in = |state| {
        store
            .insert_content(
                ContentDraft::new(ContentKind::Role, owner, fields("Food bank"))
                    .in_organisation(organisation.id)
                    .with_state(state),
            )
            .expect("role")
            .0
            .id
    };

    for state in ModerationState::ALL {
        let role = role_in(state);
        let expected = matches!(state, ModerationState::Published | ModerationState::Approved);
        assert_eq!(
            service.can_duplicate(role).expect("eligibility"),
            expected,
            "{}",
            state.label()
        );
    }

    let archived_after_publication = role_in(ModerationState::Published);
    move_to(
        &service,
        archived_after_publication,
        ModerationState::Archived,
        owner,
    );
    assert!(service
        .can_duplicate(archived_after_publication)
        .expect("eligibility"));

    let copy = service
        .duplicate_role(archived_after_publication, owner)
        .expect("duplicated");
    assert_eq!(copy.organisation, Some(organisation.id));
    assert!(store
        .members(organisation.id)
        .expect("members")
        .contains(&copy.owner));
}
