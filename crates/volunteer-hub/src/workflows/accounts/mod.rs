//! User accounts and the batched account deletion flow.

pub mod deletion;
pub mod domain;
pub mod repository;

pub use deletion::{AccountError, AccountService, BatchProgress, DeletionBatch, DeletionOperation};
pub use domain::{Account, AccountDraft, AccountRole};
pub use repository::AccountRepository;
