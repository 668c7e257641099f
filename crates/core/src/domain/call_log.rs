use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::load::LoadId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallLogId(pub String);

impl std::fmt::Display for CallLogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One recorded carrier call for a load. Sentiment is whatever label the
/// voice agent supplied; rows emitted by the negotiation sink leave it unset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallLogEntry {
    pub call_id: CallLogId,
    pub load_id: LoadId,
    pub call_started_at: DateTime<Utc>,
    pub sentiment: Option<String>,
    pub outcome: String,
    pub round_count: Option<u32>,
}

/// Insert payload; the repository assigns the `call_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewCallLog {
    pub load_id: LoadId,
    pub call_started_at: DateTime<Utc>,
    pub sentiment: Option<String>,
    pub outcome: String,
    pub round_count: Option<u32>,
}
