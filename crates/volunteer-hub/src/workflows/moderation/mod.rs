//! Revisioned content (provider profiles and roles) and the editorial
//! workflow that moves it between moderation states.

pub mod domain;
pub mod repository;
pub mod validation;
pub mod workflow;

pub use domain::{
    ApplicationQuestions, ContentDraft, ContentFields, ContentItem, ContentKind, Feedback,
    ModerationState, Revision, RevisionDraft, Schedule,
};
pub use repository::ContentRepository;
pub use validation::{validate, FieldName, Violation};
pub use workflow::{ModerationError, ModerationWorkflow, TransitionOutcome, TransitionRequest};
