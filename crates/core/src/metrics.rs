use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::call_log::CallLogEntry;

/// Dashboard aggregate over recorded calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallMetricsSummary {
    pub total_calls: u64,
    pub sentiment_distribution: BTreeMap<String, u64>,
    pub outcome_breakdown: BTreeMap<String, u64>,
}

impl CallMetricsSummary {
    pub fn empty() -> Self {
        Self {
            total_calls: 0,
            sentiment_distribution: BTreeMap::new(),
            outcome_breakdown: BTreeMap::new(),
        }
    }
}

pub fn summarize(logs: &[CallLogEntry]) -> CallMetricsSummary {
    if logs.is_empty() {
        return CallMetricsSummary::empty();
    }

    CallMetricsSummary {
        total_calls: logs.len() as u64,
        sentiment_distribution: distribution(logs.iter().map(|log| log.sentiment.as_deref())),
        outcome_breakdown: distribution(logs.iter().map(|log| Some(log.outcome.as_str()))),
    }
}

/// Count labels after trimming and lowercasing; missing or blank values land
/// in the `unspecified` bucket.
pub fn distribution<'a, I>(values: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut counts = BTreeMap::new();
    for value in values {
        let normalized = value.map(str::trim).filter(|v| !v.is_empty());
        let key = match normalized {
            Some(label) => label.to_ascii_lowercase(),
            None => "unspecified".to_string(),
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}
