use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::identifiers::{AccountId, ContentId, OrganisationId, SubmissionId};
use crate::workflows::moderation::ApplicationQuestions;

/// Provider decision on a submitted application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Accepted,
    Rejected,
}

impl ResponseType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// Lifecycle position of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Unsubmitted,
    Submitted,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unsubmitted => "unsubmitted",
            Self::Submitted => "submitted",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// Contact details captured on the application form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplicantDetails {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl ApplicantDetails {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Answers to the role's optional questions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplicationAnswers {
    #[serde(default)]
    pub motivation: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
}

/// Form fields checked before a submission is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationField {
    Email,
    FirstName,
    LastName,
    Motivation,
    Requirements,
}

impl ApplicationField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::FirstName => "First name",
            Self::LastName => "Last name",
            Self::Motivation => "Why would you like to volunteer for this role?",
            Self::Requirements => "Do you meet the requirements of this role?",
        }
    }
}

/// A volunteer's application to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub id: SubmissionId,
    pub label: String,
    pub volunteer: AccountId,
    pub role: ContentId,
    pub organisation: Option<OrganisationId>,
    pub applicant: ApplicantDetails,
    pub answers: ApplicationAnswers,
    pub submitted: bool,
    pub submitted_at: Option<DateTime<Utc>>,
    pub responded: bool,
    pub response_type: Option<ResponseType>,
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub changed_at: DateTime<Utc>,
}

impl ApplicationSubmission {
    pub fn status(&self) -> ApplicationStatus {
        match (self.submitted, self.responded, self.response_type) {
            (_, true, Some(ResponseType::Accepted)) => ApplicationStatus::Accepted,
            (_, true, Some(ResponseType::Rejected)) => ApplicationStatus::Rejected,
            (true, _, _) => ApplicationStatus::Submitted,
            (false, _, _) => ApplicationStatus::Unsubmitted,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status() == ApplicationStatus::Accepted
    }

    /// Deleting these submissions tells the volunteer about it.
    pub fn notifies_on_delete(&self) -> bool {
        !self.responded || self.is_accepted()
    }

    /// Required fields left empty, given which questions the role asks.
    pub fn missing_fields(&self, questions: ApplicationQuestions) -> Vec<ApplicationField> {
        let mut missing = Vec::new();
        if self.applicant.email.trim().is_empty() {
            missing.push(ApplicationField::Email);
        }
        if self.applicant.first_name.trim().is_empty() {
            missing.push(ApplicationField::FirstName);
        }
        if self.applicant.last_name.trim().is_empty() {
            missing.push(ApplicationField::LastName);
        }
        if questions.ask_motivation && is_blank(self.answers.motivation.as_deref()) {
            missing.push(ApplicationField::Motivation);
        }
        if questions.ask_requirements && is_blank(self.answers.requirements.as_deref()) {
            missing.push(ApplicationField::Requirements);
        }
        missing
    }

    pub fn ensure_editable(&self) -> Result<(), SubmissionTransitionError> {
        if self.submitted {
            return Err(SubmissionTransitionError::AlreadySubmitted);
        }
        Ok(())
    }

    pub fn ensure_respondable(&self) -> Result<(), SubmissionTransitionError> {
        if !self.submitted {
            return Err(SubmissionTransitionError::NotSubmitted);
        }
        if self.responded {
            return Err(SubmissionTransitionError::AlreadyResponded);
        }
        Ok(())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |text| text.trim().is_empty())
}

/// Submission data before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionDraft {
    pub label: String,
    pub volunteer: AccountId,
    pub role: ContentId,
    pub applicant: ApplicantDetails,
    pub answers: ApplicationAnswers,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionTransitionError {
    #[error("application has already been submitted")]
    AlreadySubmitted,
    #[error("application has not been submitted")]
    NotSubmitted,
    #[error("application has already been responded to")]
    AlreadyResponded,
}

/// Read model returned to volunteers and providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionView {
    pub id: SubmissionId,
    pub label: String,
    pub role: ContentId,
    pub status: &'static str,
    pub applicant_name: String,
    /// Hidden from providers until they accept the application.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub answers: ApplicationAnswers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl SubmissionView {
    pub fn build(submission: &ApplicationSubmission, show_email: bool) -> Self {
        Self {
            id: submission.id,
            label: submission.label.clone(),
            role: submission.role,
            status: submission.status().label(),
            applicant_name: submission.applicant.full_name(),
            email: show_email.then(|| submission.applicant.email.clone()),
            answers: submission.answers.clone(),
            response: submission.response.clone(),
            submitted_at: submission.submitted_at,
        }
    }
}
