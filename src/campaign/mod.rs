use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod db;
pub mod endpoints;
pub mod manager;
pub use endpoints::*;

/// A pledge drive. The key is a human-assigned slug (e.g. `pilot_v1`) and
/// doubles as the document id; campaigns are created out-of-band and only
/// ever mutated by the trigger job.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Campaign {
    #[serde(rename = "_id")]
    pub campaign: String,
    pub name: String,
    /// Site path for this campaign's pledge wall, e.g. `/pilot`.
    pub path: String,
    /// Pledge count required before the campaign triggers.
    pub threshold: i64,
    pub status: CampaignStatus,
    pub copy: CampaignCopy,
    #[serde(with = "crate::utils::option_chrono_datetime_as_bson_datetime")]
    pub triggered_at: Option<DateTime<Utc>>,
    #[serde(with = "crate::utils::option_chrono_datetime_as_bson_datetime")]
    pub notified_at: Option<DateTime<Utc>>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Campaign lifecycle. Transitions are one-directional:
/// `collecting -> triggered -> notified`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Collecting,
    Triggered,
    Notified,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Collecting => "collecting",
            CampaignStatus::Triggered => "triggered",
            CampaignStatus::Notified => "notified",
        }
    }
}

/// Copy used to render the notification email for a campaign.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CampaignCopy {
    pub subject: String,
    pub intro: String,
    pub bullets: Vec<String>,
    pub cta_label: String,
}
