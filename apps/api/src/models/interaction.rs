use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a user did with a posting. `Saved` and `Hidden` are independent;
/// any `Hidden` record excludes the posting from recommendations for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionAction {
    Saved,
    Hidden,
    Applied,
}

impl InteractionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionAction::Saved => "saved",
            InteractionAction::Hidden => "hidden",
            InteractionAction::Applied => "applied",
        }
    }
}

impl FromStr for InteractionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "saved" => Ok(InteractionAction::Saved),
            "hidden" => Ok(InteractionAction::Hidden),
            "applied" => Ok(InteractionAction::Applied),
            other => Err(format!("unknown interaction action '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "jobId")]
    pub posting_id: Uuid,
    pub action: InteractionAction,
    pub timestamp: DateTime<Utc>,
}
