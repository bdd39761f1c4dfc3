use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::workflows::identifiers::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Volunteer,
    Provider,
    SiteAdministrator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: BTreeSet<AccountRole>,
    pub active: bool,
}

impl Account {
    pub fn has_role(&self, role: AccountRole) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_volunteer(&self) -> bool {
        self.has_role(AccountRole::Volunteer)
    }

    pub fn is_provider(&self) -> bool {
        self.has_role(AccountRole::Provider)
    }

    pub fn is_site_administrator(&self) -> bool {
        self.has_role(AccountRole::SiteAdministrator)
    }

    /// Full name, falling back to the e-mail address when no name is on file.
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

/// Account data before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDraft {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: BTreeSet<AccountRole>,
}

impl AccountDraft {
    pub fn new(email: &str, first_name: &str, last_name: &str, role: AccountRole) -> Self {
        Self {
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            roles: BTreeSet::from([role]),
        }
    }
}
