use crate::database::Database;
use crate::error::Error;

use super::Campaign;

#[tracing::instrument(skip(db))]
pub async fn get_campaigns(db: &dyn Database) -> Result<Vec<Campaign>, Error> {
    let campaigns = db.campaigns().fetch_campaigns().await?;

    Ok(campaigns)
}

#[tracing::instrument(skip(db))]
pub async fn get_campaign_by_key(db: &dyn Database, campaign: &str) -> Result<Campaign, Error> {
    let campaign = db
        .campaigns()
        .fetch_campaign_by_key(campaign)
        .await?
        .ok_or_else(|| Error::CampaignDoesNotExist {
            campaign: campaign.to_string(),
        })?;

    Ok(campaign)
}
