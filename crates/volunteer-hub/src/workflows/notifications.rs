use serde::{Deserialize, Serialize};

use super::notice::Notice;

/// Outbound mail templates raised by the workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKey {
    ApplicationSubmittedConfirmation,
    ApplicationSubmitted,
    ApplicationAccepted,
    ApplicationRejected,
    ApplicationDeleted,
    ContentStateChanged,
}

impl NotificationKey {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ApplicationSubmittedConfirmation => "application_submitted_confirmation",
            Self::ApplicationSubmitted => "application_submitted",
            Self::ApplicationAccepted => "application_accepted",
            Self::ApplicationRejected => "application_rejected",
            Self::ApplicationDeleted => "application_deleted",
            Self::ContentStateChanged => "content_state_changed",
        }
    }
}

/// Rendered mail ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub key: NotificationKey,
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Mail transport port.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("notification has no recipients")]
    NoRecipients,
}

/// Publish a notification, turning a transport failure into an error notice.
///
/// Workflow operations never fail because mail could not be delivered.
pub(crate) fn deliver<N>(notifier: &N, notification: Notification, notices: &mut Vec<Notice>)
where
    N: NotificationPublisher + ?Sized,
{
    let key = notification.key;
    let result = if notification.recipients.is_empty() {
        Err(NotificationError::NoRecipients)
    } else {
        notifier.publish(notification)
    };

    if let Err(error) = result {
        tracing::warn!(notification = key.label(), %error, "notification not delivered");
        notices.push(Notice::error(
            "There was a problem sending the notification e-mail.",
        ));
    }
}
