use actix_web::get;
use actix_web::web::{Data, Json, Path};
use chrono::{DateTime, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use serde::Serialize;

use crate::database::{Database, MongoDatabase};
use crate::error::Error;

use super::{manager, Campaign, CampaignStatus};

#[derive(Clone, Debug, Serialize)]
pub struct CampaignBody {
    pub campaign: String,
    pub name: String,
    pub path: String,
    pub threshold: i64,
    pub status: CampaignStatus,
    pub pledge_count: u64,
    pub triggered_at: Option<DateTime<Utc>>,
    pub notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CampaignBody {
    pub async fn render(db: &dyn Database, campaign: Campaign) -> Result<CampaignBody, Error> {
        let pledge_count = db
            .pledges()
            .count_pledges_by_campaign(&campaign.campaign)
            .await?;

        Ok(CampaignBody {
            campaign: campaign.campaign,
            name: campaign.name,
            path: campaign.path,
            threshold: campaign.threshold,
            status: campaign.status,
            pledge_count,
            triggered_at: campaign.triggered_at,
            notified_at: campaign.notified_at,
            created_at: campaign.created_at,
        })
    }
}

#[get("/campaigns")]
#[tracing::instrument(skip(db))]
async fn get_campaigns(db: Data<MongoDatabase>) -> Result<Json<Vec<CampaignBody>>, Error> {
    let campaigns = manager::get_campaigns(db.get_ref()).await?;

    let body = stream::iter(campaigns)
        .then(|campaign| CampaignBody::render(db.get_ref(), campaign))
        .try_collect()
        .await?;

    Ok(Json(body))
}

#[get("/campaigns/{campaign}")]
#[tracing::instrument(skip(db))]
async fn get_campaign_by_key(
    db: Data<MongoDatabase>,
    params: Path<String>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign = manager::get_campaign_by_key(db.get_ref(), &params.into_inner()).await?;

    Ok(Json(CampaignBody::render(db.get_ref(), campaign).await?))
}
