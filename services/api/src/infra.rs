use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use volunteer_hub::config::WorkflowConfig;
use volunteer_hub::error::AppError;
use volunteer_hub::workflows::accounts::{
    AccountDraft, AccountRepository, AccountRole, AccountService,
};
use volunteer_hub::workflows::applications::{ApplicationAnswers, ApplicationService};
use volunteer_hub::workflows::memory::MemoryStore;
use volunteer_hub::workflows::moderation::{
    ApplicationQuestions, ContentFields, ContentItem, ModerationState, TransitionRequest,
};
use volunteer_hub::workflows::provider::{Organisation, ProviderError, ProviderLifecycleService};
use volunteer_hub::workflows::{
    AccountId, Notification, NotificationError, NotificationPublisher, SubmissionId,
};

pub(crate) type Providers = ProviderLifecycleService<MemoryStore, LoggingNotifier>;
pub(crate) type Accounts = AccountService<MemoryStore, LoggingNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) accounts: Arc<Accounts>,
    pub(crate) providers: Arc<Providers>,
}

/// Stand-in mail transport: every notification is written to the log.
#[derive(Debug, Default, Clone)]
pub(crate) struct LoggingNotifier;

impl NotificationPublisher for LoggingNotifier {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        tracing::info!(
            key = notification.key.label(),
            recipients = ?notification.recipients,
            subject = %notification.subject,
            "notification dispatched"
        );
        Ok(())
    }
}

/// Workflow services sharing one store and one notifier.
pub(crate) struct Services<N = LoggingNotifier> {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) applications: Arc<ApplicationService<MemoryStore, N>>,
    pub(crate) providers: Arc<ProviderLifecycleService<MemoryStore, N>>,
    pub(crate) accounts: Arc<AccountService<MemoryStore, N>>,
}

impl Services {
    pub(crate) fn in_memory(config: &WorkflowConfig) -> Self {
        Self::with_notifier(config, Arc::new(LoggingNotifier))
    }
}

impl<N> Services<N>
where
    N: NotificationPublisher + 'static,
{
    pub(crate) fn with_notifier(config: &WorkflowConfig, notifier: Arc<N>) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            applications: Arc::new(ApplicationService::new(
                store.clone(),
                notifier.clone(),
                config.clone(),
            )),
            providers: Arc::new(ProviderLifecycleService::new(
                store.clone(),
                notifier.clone(),
                config.clone(),
            )),
            accounts: Arc::new(AccountService::new(store.clone(), notifier, config.clone())),
            store,
        }
    }
}

/// Identifiers of the sample marketplace.
#[derive(Debug, Clone)]
pub(crate) struct SeededMarketplace {
    pub(crate) coordinator: AccountId,
    pub(crate) teammate: AccountId,
    pub(crate) volunteer: AccountId,
    pub(crate) organisation: Organisation,
    pub(crate) profile: ContentItem,
    pub(crate) role: ContentItem,
    pub(crate) application: SubmissionId,
}

/// One published provider with a live role and a submitted application.
pub(crate) fn seed_marketplace<N>(
    services: &Services<N>,
    today: NaiveDate,
) -> Result<SeededMarketplace, AppError>
where
    N: NotificationPublisher + 'static,
{
    let account = |email: &str, first: &str, last: &str, role| {
        services
            .store
            .insert_account(AccountDraft::new(email, first, last, role))
            .map(|account| account.id)
            .map_err(|err| AppError::Provider(err.into()))
    };
    let coordinator = account(
        "coordinator@riverside.example",
        "Jo",
        "Rivers",
        AccountRole::Provider,
    )?;
    let teammate = account(
        "sam@riverside.example",
        "Sam",
        "Patel",
        AccountRole::Provider,
    )?;
    let volunteer = account("kim@example.org", "Kim", "Okafor", AccountRole::Volunteer)?;

    let providers = &services.providers;
    let profile = providers.create_stub_profile(coordinator)?;
    providers.moderate(
        profile.id,
        TransitionRequest::new(ModerationState::ReadyForReview, coordinator).with_fields(
            ContentFields {
                title: "Riverside Community Trust".to_string(),
                summary: Some("Volunteers keeping the riverside green.".to_string()),
                ..ContentFields::default()
            },
        ),
    )?;
    let published = providers.moderate(
        profile.id,
        TransitionRequest::new(ModerationState::Published, coordinator),
    )?;
    let organisation = published
        .created_organisation
        .ok_or(ProviderError::NoOrganisation(coordinator))?;
    providers.add_member(organisation.id, teammate)?;

    let role = providers.create_stub_role(coordinator)?;
    providers.moderate(
        role.id,
        TransitionRequest::new(ModerationState::ReadyForReview, coordinator).with_fields(
            ContentFields {
                title: "Towpath litter pick".to_string(),
                summary: Some("Two hours of litter picking along the canal.".to_string()),
                location: Some("Regent's Canal".to_string()),
                starts_on: Some(today + chrono::Duration::days(10)),
                advert_starts_on: Some(today),
                advert_ends_on: Some(today + chrono::Duration::days(7)),
                questions: ApplicationQuestions {
                    ask_motivation: true,
                    ask_requirements: false,
                },
            },
        ),
    )?;
    let role = providers
        .moderate(
            role.id,
            TransitionRequest::new(ModerationState::Published, coordinator),
        )?
        .transition
        .content;

    let applications = &services.applications;
    let submission = applications.start(volunteer, role.id)?;
    applications.save_answers(
        submission.id,
        None,
        ApplicationAnswers {
            motivation: Some("I cycle along the canal every day.".to_string()),
            ..ApplicationAnswers::default()
        },
    )?;
    applications.submit(submission.id)?;

    Ok(SeededMarketplace {
        coordinator,
        teammate,
        volunteer,
        organisation,
        profile: published.transition.content,
        role,
        application: submission.id,
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_dates() {
        assert_eq!(
            parse_date(" 2026-10-19 "),
            Ok(NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date"))
        );
        assert!(parse_date("19/10/2026").is_err());
    }

    #[test]
    fn seeding_builds_a_live_marketplace() {
        let services = Services::in_memory(&WorkflowConfig::default());
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date");
        let seeded = seed_marketplace(&services, today).expect("seeded");

        assert_eq!(seeded.organisation.label, "Riverside Community Trust");
        assert_eq!(seeded.role.organisation, Some(seeded.organisation.id));
        let submission = services
            .applications
            .get(seeded.application)
            .expect("application");
        assert!(submission.submitted);
    }
}
