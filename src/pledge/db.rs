use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson;

use crate::database::MongoPledgeStore;
use crate::error::Error;

use super::{Pledge, PledgeId};

#[async_trait]
pub trait PledgeStore: Send + Sync {
    async fn insert_pledge(&self, pledge: &Pledge) -> Result<(), Error>;

    async fn count_pledges_by_campaign(&self, campaign: &str) -> Result<u64, Error>;

    /// Pledges still owed a notification: `notified_at` unset and a
    /// deliverable email on file.
    async fn fetch_unnotified_pledges_by_campaign(
        &self,
        campaign: &str,
    ) -> Result<Vec<Pledge>, Error>;

    async fn mark_pledge_notified(
        &self,
        pledge_id: PledgeId,
        notified_at: DateTime<Utc>,
    ) -> Result<(), Error>;
}

#[async_trait]
impl PledgeStore for MongoPledgeStore {
    #[tracing::instrument(skip(self, pledge), fields(pledge_id = %pledge.id))]
    async fn insert_pledge(&self, pledge: &Pledge) -> Result<(), Error> {
        self.insert_one(pledge, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn count_pledges_by_campaign(&self, campaign: &str) -> Result<u64, Error> {
        let count = self
            .count_documents(bson::doc! { "campaign": campaign }, None)
            .await?;

        Ok(count)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_unnotified_pledges_by_campaign(
        &self,
        campaign: &str,
    ) -> Result<Vec<Pledge>, Error> {
        let pledges: Vec<Pledge> = self
            .find(
                bson::doc! {
                    "campaign": campaign,
                    "notified_at": null,
                    "email": { "$ne": null },
                },
                None,
            )
            .await?
            .try_collect()
            .await?;

        Ok(pledges)
    }

    #[tracing::instrument(skip(self))]
    async fn mark_pledge_notified(
        &self,
        pledge_id: PledgeId,
        notified_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.update_one(
            bson::doc! { "_id": pledge_id },
            bson::doc! { "$set": {
                "notified_at": bson::DateTime::from_chrono(notified_at),
            } },
            None,
        )
        .await?;

        Ok(())
    }
}
