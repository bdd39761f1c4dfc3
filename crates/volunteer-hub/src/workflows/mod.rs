//! Workflow services for the volunteering marketplace.
//!
//! Storage and mail delivery are reached through the ports declared in
//! [`store`] and [`notifications`]; [`memory`] provides the in-process
//! implementation used by the API service and the tests.

pub mod accounts;
pub mod applications;
pub mod identifiers;
pub mod memory;
pub mod moderation;
pub mod notice;
pub mod notifications;
pub mod provider;
pub mod store;

pub use identifiers::{AccountId, ContentId, OrganisationId, RevisionId, SubmissionId};
pub use notice::{Notice, NoticeLevel};
pub use notifications::{Notification, NotificationError, NotificationKey, NotificationPublisher};
pub use store::{MarketplaceStore, RepositoryError};
