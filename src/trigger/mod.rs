use serde::{Deserialize, Serialize};

pub mod endpoints;
pub mod manager;
pub use endpoints::*;

/// What one trigger invocation did. `checked` counts the candidate set
/// (collecting campaigns at or past their threshold); `triggered` counts
/// the ones this invocation actually claimed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSummary {
    pub checked: u64,
    pub triggered: u64,
    pub emails_sent: u64,
    pub campaigns: Vec<CampaignTriggerReport>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignTriggerReport {
    pub campaign: String,
    pub emails_sent: u64,
}
