use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::typedid::{TypedId, TypedIdMarker};

pub mod db;
pub mod endpoints;
pub mod manager;
pub use endpoints::*;

pub type PledgeId = TypedId<Pledge>;

/// One person's commitment to a campaign. `notified_at` is null until the
/// trigger job has successfully emailed them, and is set at most once.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Pledge {
    #[serde(rename = "_id")]
    pub id: PledgeId,
    pub campaign: String,
    pub name: String,
    pub email: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::utils::option_chrono_datetime_as_bson_datetime")]
    pub notified_at: Option<DateTime<Utc>>,
}

impl TypedIdMarker for Pledge {
    fn tag() -> &'static str {
        "PLG"
    }
}
