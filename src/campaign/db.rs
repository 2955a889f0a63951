use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson;

use crate::database::MongoCampaignStore;
use crate::error::Error;

use super::{Campaign, CampaignStatus};

#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error>;

    async fn fetch_campaigns(&self) -> Result<Vec<Campaign>, Error>;

    async fn fetch_campaign_by_key(&self, campaign: &str) -> Result<Option<Campaign>, Error>;

    async fn fetch_campaigns_by_status(
        &self,
        status: CampaignStatus,
    ) -> Result<Vec<Campaign>, Error>;

    /// Compare-and-swap `collecting -> triggered`. Returns whether this
    /// caller won the claim; `false` means a concurrent invocation already
    /// took it and no state was changed.
    async fn claim_campaign(&self, campaign: &str) -> Result<bool, Error>;

    async fn mark_campaign_notified(&self, campaign: &str) -> Result<(), Error>;
}

#[async_trait]
impl CampaignStore for MongoCampaignStore {
    #[tracing::instrument(skip(self))]
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error> {
        self.insert_one(campaign, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaigns(&self) -> Result<Vec<Campaign>, Error> {
        let campaigns: Vec<Campaign> = self.find(bson::doc! {}, None).await?.try_collect().await?;

        Ok(campaigns)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_by_key(&self, campaign: &str) -> Result<Option<Campaign>, Error> {
        let campaign: Option<Campaign> = self.find_one(bson::doc! { "_id": campaign }, None).await?;

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaigns_by_status(
        &self,
        status: CampaignStatus,
    ) -> Result<Vec<Campaign>, Error> {
        let campaigns: Vec<Campaign> = self
            .find(bson::doc! { "status": status.as_str() }, None)
            .await?
            .try_collect()
            .await?;

        Ok(campaigns)
    }

    // The status precondition lives in the filter so the swap is a single
    // atomic document update; a read-then-write pair would race with
    // overlapping trigger invocations.
    #[tracing::instrument(skip(self))]
    async fn claim_campaign(&self, campaign: &str) -> Result<bool, Error> {
        let result = self
            .update_one(
                bson::doc! {
                    "_id": campaign,
                    "status": CampaignStatus::Collecting.as_str(),
                },
                bson::doc! { "$set": {
                    "status": CampaignStatus::Triggered.as_str(),
                    "triggered_at": bson::DateTime::now(),
                } },
                None,
            )
            .await?;

        Ok(result.matched_count == 1)
    }

    #[tracing::instrument(skip(self))]
    async fn mark_campaign_notified(&self, campaign: &str) -> Result<(), Error> {
        self.update_one(
            bson::doc! { "_id": campaign },
            bson::doc! { "$set": {
                "status": CampaignStatus::Notified.as_str(),
                "notified_at": bson::DateTime::now(),
            } },
            None,
        )
        .await?;

        Ok(())
    }
}
