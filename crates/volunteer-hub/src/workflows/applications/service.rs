use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::domain::{
    ApplicantDetails, ApplicationAnswers, ApplicationField, ApplicationSubmission, ResponseType,
    SubmissionDraft, SubmissionTransitionError, SubmissionView,
};
use crate::config::WorkflowConfig;
use crate::workflows::identifiers::{AccountId, ContentId, OrganisationId, SubmissionId};
use crate::workflows::moderation::{ContentItem, Revision};
use crate::workflows::notice::Notice;
use crate::workflows::notifications::{
    deliver, Notification, NotificationKey, NotificationPublisher,
};
use crate::workflows::provider::access::{respond_access, AccessDenied};
use crate::workflows::provider::Organisation;
use crate::workflows::store::{MarketplaceStore, RepositoryError};

/// Submission together with the notices raised while producing it.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub submission: ApplicationSubmission,
    pub notices: Vec<Notice>,
}

/// Service driving a volunteer application from first visit to the
/// provider's response.
pub struct ApplicationService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    config: WorkflowConfig,
}

impl<S, N> ApplicationService<S, N>
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: WorkflowConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Resume the volunteer's unsubmitted application for the role, or
    /// create one prefilled from their account.
    pub fn start(
        &self,
        volunteer: AccountId,
        role: ContentId,
    ) -> Result<ApplicationSubmission, ApplicationServiceError> {
        let account = self
            .store
            .fetch_account(volunteer)?
            .ok_or(ApplicationServiceError::AccountNotFound(volunteer))?;
        let (_, revision) = self.role(role)?;

        let existing = self
            .store
            .submissions_by_volunteer(volunteer)?
            .into_iter()
            .find(|submission| submission.role == role && !submission.submitted);
        if let Some(submission) = existing {
            return Ok(submission);
        }

        let draft = SubmissionDraft {
            label: format!("{} - {}", revision.fields.title, account.display_name()),
            volunteer,
            role,
            applicant: ApplicantDetails {
                email: account.email,
                first_name: account.first_name,
                last_name: account.last_name,
            },
            answers: ApplicationAnswers::default(),
        };
        let submission = self.store.insert_submission(draft)?;
        tracing::debug!(submission = %submission.id, role = %role, "application started");
        Ok(submission)
    }

    pub fn save_answers(
        &self,
        id: SubmissionId,
        applicant: Option<ApplicantDetails>,
        answers: ApplicationAnswers,
    ) -> Result<ApplicationSubmission, ApplicationServiceError> {
        let mut submission = self.submission(id)?;
        submission.ensure_editable()?;

        if let Some(applicant) = applicant {
            submission.applicant = applicant;
        }
        submission.answers = answers;
        submission.changed_at = Utc::now();
        self.store.update_submission(submission.clone())?;
        Ok(submission)
    }

    /// Submit the application, attach it to the role's organisation and
    /// notify the volunteer and every member of the organisation.
    pub fn submit(&self, id: SubmissionId) -> Result<SubmissionOutcome, ApplicationServiceError> {
        let mut submission = self.submission(id)?;
        submission.ensure_editable()?;

        let (role, revision) = self.role(submission.role)?;
        let organisation_id = role
            .organisation
            .ok_or(ApplicationServiceError::MissingOrganisation(role.id))?;
        let organisation = self.organisation(organisation_id)?;

        let missing = submission.missing_fields(revision.fields.questions);
        if !missing.is_empty() {
            return Err(ApplicationServiceError::Incomplete { missing });
        }

        let now = Utc::now();
        submission.submitted = true;
        submission.submitted_at = Some(now);
        submission.organisation = Some(organisation.id);
        submission.changed_at = now;
        self.store.update_submission(submission.clone())?;

        tracing::info!(
            submission = %submission.id,
            role = %role.id,
            organisation = %organisation.id,
            "application submitted"
        );

        let mut notices = Vec::new();
        let details = self.submission_details(&submission, &role, &revision);

        deliver(
            self.notifier.as_ref(),
            Notification {
                key: NotificationKey::ApplicationSubmittedConfirmation,
                recipients: vec![submission.applicant.email.clone()],
                subject: format!("{} application submitted", self.config.site_name),
                body: format!(
                    "Dear {},\r\n\r\nThank you for applying. \
                     Your application has been sent to {}.\r\n{}",
                    submission.applicant.full_name(),
                    organisation.label,
                    details
                ),
            },
            &mut notices,
        );

        let recipients = self.member_emails(organisation.id)?;
        deliver(
            self.notifier.as_ref(),
            Notification {
                key: NotificationKey::ApplicationSubmitted,
                recipients,
                subject: format!("New application: {}", revision.fields.title),
                body: format!("A volunteer has applied for one of your roles.\r\n{details}"),
            },
            &mut notices,
        );

        Ok(SubmissionOutcome {
            submission,
            notices,
        })
    }

    /// Send the provider's response to the volunteer.
    pub fn respond(
        &self,
        id: SubmissionId,
        actor: AccountId,
        response_type: ResponseType,
        text: &str,
    ) -> Result<SubmissionOutcome, ApplicationServiceError> {
        let mut submission = self.submission(id)?;
        submission.ensure_respondable()?;

        let text = text.trim();
        if text.is_empty() {
            return Err(ApplicationServiceError::EmptyResponse);
        }

        respond_access(self.store.as_ref(), actor, &submission)??;

        let organisation_id = submission
            .organisation
            .ok_or(ApplicationServiceError::Access(AccessDenied::Unattached))?;
        let mut organisation = self.organisation(organisation_id)?;
        organisation.response_templates.remember(response_type, text);
        self.store.update_organisation(organisation.clone())?;

        let response = format!(
            "Dear {},\r\n\r\n{}\r\n\r\n{}",
            submission.applicant.full_name(),
            text,
            organisation.label
        );

        submission.responded = true;
        submission.response_type = Some(response_type);
        submission.response = Some(response.clone());
        submission.changed_at = Utc::now();
        self.store.update_submission(submission.clone())?;

        tracing::info!(
            submission = %submission.id,
            response = response_type.label(),
            "application responded"
        );

        let (key, subject) = match response_type {
            ResponseType::Accepted => (
                NotificationKey::ApplicationAccepted,
                "Application approved",
            ),
            ResponseType::Rejected => (
                NotificationKey::ApplicationRejected,
                "Application unsuccessful",
            ),
        };

        let mut notices = Vec::new();
        deliver(
            self.notifier.as_ref(),
            Notification {
                key,
                recipients: vec![submission.applicant.email.clone()],
                subject: subject.to_string(),
                body: response,
            },
            &mut notices,
        );

        Ok(SubmissionOutcome {
            submission,
            notices,
        })
    }

    /// Text to prefill when a provider of the organisation responds next.
    pub fn response_template(
        &self,
        organisation: OrganisationId,
        response_type: ResponseType,
    ) -> Result<String, ApplicationServiceError> {
        let organisation = self.organisation(organisation)?;
        Ok(organisation
            .response_templates
            .text_for(response_type)
            .to_string())
    }

    /// Delete a submission. Volunteers hear about it unless it was rejected.
    pub fn delete(&self, id: SubmissionId) -> Result<Vec<Notice>, ApplicationServiceError> {
        let submission = self.submission(id)?;
        self.store.delete_submission(id)?;
        tracing::info!(submission = %id, "application deleted");

        let mut notices = Vec::new();
        if submission.notifies_on_delete() {
            deliver(
                self.notifier.as_ref(),
                Notification {
                    key: NotificationKey::ApplicationDeleted,
                    recipients: vec![submission.applicant.email.clone()],
                    subject: format!("{} volunteering role deleted", self.config.site_name),
                    body: format!("Dear {},", submission.applicant.full_name()),
                },
                &mut notices,
            );
        }
        Ok(notices)
    }

    /// Read model for a viewer. Providers only see the volunteer's e-mail
    /// once they have accepted the application.
    pub fn view(
        &self,
        id: SubmissionId,
        viewer: AccountId,
    ) -> Result<SubmissionView, ApplicationServiceError> {
        let submission = self.submission(id)?;
        let account = self
            .store
            .fetch_account(viewer)?
            .ok_or(ApplicationServiceError::AccountNotFound(viewer))?;

        let is_applicant = submission.volunteer == viewer;
        let in_organisation = submission.organisation.is_some()
            && self.store.organisation_of(viewer)? == submission.organisation;

        let show_email = if is_applicant || account.is_site_administrator() {
            true
        } else if in_organisation {
            submission.is_accepted()
        } else {
            return Err(ApplicationServiceError::Access(AccessDenied::NotMember));
        };

        Ok(SubmissionView::build(&submission, show_email))
    }

    pub fn get(&self, id: SubmissionId) -> Result<ApplicationSubmission, ApplicationServiceError> {
        self.submission(id)
    }

    fn submission(
        &self,
        id: SubmissionId,
    ) -> Result<ApplicationSubmission, ApplicationServiceError> {
        self.store
            .fetch_submission(id)?
            .ok_or(ApplicationServiceError::SubmissionNotFound(id))
    }

    fn role(&self, id: ContentId) -> Result<(ContentItem, Revision), ApplicationServiceError> {
        let role = self
            .store
            .fetch_content(id)?
            .filter(ContentItem::is_role)
            .ok_or(ApplicationServiceError::RoleNotFound(id))?;
        let revision = self
            .store
            .fetch_revision(role.default_revision)?
            .ok_or(ApplicationServiceError::RoleNotFound(id))?;
        Ok((role, revision))
    }

    fn organisation(&self, id: OrganisationId) -> Result<Organisation, ApplicationServiceError> {
        self.store
            .fetch_organisation(id)?
            .ok_or(ApplicationServiceError::OrganisationNotFound(id))
    }

    fn member_emails(
        &self,
        organisation: OrganisationId,
    ) -> Result<Vec<String>, ApplicationServiceError> {
        let mut emails = Vec::new();
        for member in self.store.members(organisation)? {
            if let Some(account) = self.store.fetch_account(member)? {
                if account.active {
                    emails.push(account.email);
                }
            }
        }
        Ok(emails)
    }

    fn submission_details(
        &self,
        submission: &ApplicationSubmission,
        role: &ContentItem,
        revision: &Revision,
    ) -> String {
        let mut details = format!(
            "\r\nRole title: {}\r\nView role: {}\r\n\r\nEmail: {}\r\nFull name: {}",
            revision.fields.title,
            self.config.role_url(role.id),
            submission.applicant.email,
            submission.applicant.full_name()
        );

        let questions = revision.fields.questions;
        let answers = [
            (
                questions.ask_motivation,
                ApplicationField::Motivation,
                &submission.answers.motivation,
            ),
            (
                questions.ask_requirements,
                ApplicationField::Requirements,
                &submission.answers.requirements,
            ),
        ];
        for (asked, field, answer) in answers {
            if asked {
                details.push_str(&format!(
                    "\r\n{}: {}",
                    field.label(),
                    answer.as_deref().unwrap_or_default()
                ));
            }
        }
        details
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Transition(#[from] SubmissionTransitionError),
    #[error(transparent)]
    Access(#[from] AccessDenied),
    #[error("application {0} not found")]
    SubmissionNotFound(SubmissionId),
    #[error("role {0} not found")]
    RoleNotFound(ContentId),
    #[error("account {0} not found")]
    AccountNotFound(AccountId),
    #[error("organisation {0} not found")]
    OrganisationNotFound(OrganisationId),
    #[error("role {0} does not belong to an organisation")]
    MissingOrganisation(ContentId),
    #[error("application is missing required fields: {}", field_labels(.missing))]
    Incomplete { missing: Vec<ApplicationField> },
    #[error("response text is required")]
    EmptyResponse,
}

fn field_labels(fields: &[ApplicationField]) -> String {
    fields
        .iter()
        .map(|field| field.label())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ApplicationServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Repository(RepositoryError::NotFound)
                | Self::SubmissionNotFound(_)
                | Self::RoleNotFound(_)
                | Self::AccountNotFound(_)
                | Self::OrganisationNotFound(_)
        )
    }
}
