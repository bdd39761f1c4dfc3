//! Volunteer applications: intake, submission, provider responses and
//! deletion, with the mail each step sends.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicantDetails, ApplicationAnswers, ApplicationField, ApplicationStatus,
    ApplicationSubmission, ResponseType, SubmissionDraft, SubmissionTransitionError,
    SubmissionView,
};
pub use repository::SubmissionRepository;
pub use router::application_router;
pub use service::{ApplicationService, ApplicationServiceError, SubmissionOutcome};
