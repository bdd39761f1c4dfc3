use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

identifier!(
    /// Volunteer, provider or administrator account.
    AccountId
);
identifier!(
    /// Provider organisation (the group owning profile, roles and members).
    OrganisationId
);
identifier!(
    /// Moderated content item: a provider profile or a volunteering role.
    ContentId
);
identifier!(
    /// Single immutable revision of a content item.
    RevisionId
);
identifier!(
    /// Volunteer application to a role.
    SubmissionId
);
