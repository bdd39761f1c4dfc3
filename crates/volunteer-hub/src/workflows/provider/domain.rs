use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::workflows::applications::ResponseType;
use crate::workflows::identifiers::{ContentId, OrganisationId, RevisionId};
use crate::workflows::moderation::ModerationState;

/// Provider organisation grouping a profile, its roles and member accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
    pub id: OrganisationId,
    pub label: String,
    pub profile: Option<ContentId>,
    pub suspended: bool,
    #[serde(default)]
    pub restore_plan: RestorePlan,
    #[serde(default)]
    pub response_templates: ResponseTemplates,
    pub created_at: DateTime<Utc>,
}

/// Organisation data before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganisationDraft {
    pub label: String,
    pub profile: Option<ContentId>,
}

/// Last response text a provider sent for each response type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseTemplates {
    pub accepted: Option<String>,
    pub rejected: Option<String>,
}

const DEFAULT_ACCEPTED_TEXT: &str = "Thank you for your interest in this volunteering role.\r\n\r\n\
We are keen for you to volunteer with us and would like to discuss the details of this role further with you.\r\n\r\n\
We will be in touch shortly.\r\n\r\n\
Kind wishes,";

const DEFAULT_REJECTED_TEXT: &str = "Thank you for your interest in this volunteering role.\r\n\r\n\
Unfortunately we're no longer accepting volunteers for this role as it has now been filled. We're sorry if this is disappointing.\r\n\r\n\
We wish you all the best in your future volunteering.\r\n\r\n\
Kind wishes,";

impl ResponseTemplates {
    pub fn latest(&self, response_type: ResponseType) -> Option<&str> {
        let text = match response_type {
            ResponseType::Accepted => self.accepted.as_deref(),
            ResponseType::Rejected => self.rejected.as_deref(),
        };
        text.filter(|text| !text.trim().is_empty())
    }

    /// Latest text for the type, or the stock wording when none was saved.
    pub fn text_for(&self, response_type: ResponseType) -> &str {
        self.latest(response_type)
            .unwrap_or_else(|| default_response_text(response_type))
    }

    pub fn remember(&mut self, response_type: ResponseType, text: &str) {
        let slot = match response_type {
            ResponseType::Accepted => &mut self.accepted,
            ResponseType::Rejected => &mut self.rejected,
        };
        *slot = Some(text.to_string());
    }
}

pub fn default_response_text(response_type: ResponseType) -> &'static str {
    match response_type {
        ResponseType::Accepted => DEFAULT_ACCEPTED_TEXT,
        ResponseType::Rejected => DEFAULT_REJECTED_TEXT,
    }
}

/// One content item to put back when a suspended organisation is reactivated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreEntry {
    pub content_id: ContentId,
    pub revision_id: RevisionId,
    pub target_state: ModerationState,
}

/// Ordered restore plan recorded at suspension time.
///
/// Encodes as a list of entries. Decoding also accepts the by-state map
/// `{"published": {"12": 40}}` and the flat `{"12": 40}` map, whose entries
/// are all treated as published.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct RestorePlan {
    entries: Vec<RestoreEntry>,
}

impl RestorePlan {
    pub fn new(entries: Vec<RestoreEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RestoreEntry] {
        &self.entries
    }

    pub fn push(&mut self, entry: RestoreEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn from_value(value: Value) -> Result<Self, RestorePlanError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Array(_) => serde_json::from_value::<Vec<RestoreEntry>>(value)
                .map(Self::new)
                .map_err(|error| RestorePlanError::Malformed(error.to_string())),
            Value::Object(map) => {
                let mut plan = Self::default();
                for (key, value) in map {
                    match (ModerationState::from_label(&key), value) {
                        (Some(state), Value::Object(by_content)) => {
                            for (content, revision) in by_content {
                                plan.push(parse_entry(&content, &revision, state)?);
                            }
                        }
                        // Empty buckets are written as `[]` or `null`.
                        (Some(_), Value::Null) => {}
                        (Some(_), Value::Array(items)) if items.is_empty() => {}
                        (Some(_), other) => {
                            return Err(RestorePlanError::Malformed(format!(
                                "bucket '{key}' should map content to revisions, found {other}"
                            )))
                        }
                        (None, Value::Object(_)) => {
                            return Err(RestorePlanError::UnknownState(key));
                        }
                        (None, revision) => {
                            plan.push(parse_entry(&key, &revision, ModerationState::Published)?)
                        }
                    }
                }
                Ok(plan)
            }
            other => Err(RestorePlanError::Malformed(format!(
                "expected a list or map, found {other}"
            ))),
        }
    }
}

fn parse_entry(
    content: &str,
    revision: &Value,
    target_state: ModerationState,
) -> Result<RestoreEntry, RestorePlanError> {
    let content_id = content
        .trim()
        .parse::<u64>()
        .map_err(|_| RestorePlanError::Malformed(format!("invalid content id '{content}'")))?;

    let revision_id = match revision {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| RestorePlanError::Malformed(format!("invalid revision id '{revision}'")))?;

    Ok(RestoreEntry {
        content_id: ContentId(content_id),
        revision_id: RevisionId(revision_id),
        target_state,
    })
}

impl<'de> Deserialize<'de> for RestorePlan {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        RestorePlan::from_value(value).map_err(D::Error::custom)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RestorePlanError {
    #[error("restore plan is malformed: {0}")]
    Malformed(String),
    #[error("restore plan names unknown state '{0}'")]
    UnknownState(String),
}
