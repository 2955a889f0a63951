use mongodb::{Collection, Database as MongoDb};

use crate::campaign::db::CampaignStore;
use crate::campaign::Campaign;
use crate::error::Error;
use crate::pledge::db::PledgeStore;
use crate::pledge::Pledge;

pub type MongoCampaignStore = Collection<Campaign>;
pub type MongoPledgeStore = Collection<Pledge>;

/// What the managers see: per-resource stores behind trait objects so
/// tests can substitute mocks.
pub trait Database: Send + Sync {
    fn campaigns(&self) -> &dyn CampaignStore;
    fn pledges(&self) -> &dyn PledgeStore;
}

#[derive(Clone)]
pub struct MongoDatabase {
    campaigns: Collection<Campaign>,
    pledges: Collection<Pledge>,
    db: MongoDb,
}

impl MongoDatabase {
    pub fn new(db: MongoDb) -> MongoDatabase {
        MongoDatabase {
            campaigns: db.collection("campaigns"),
            pledges: db.collection("pledges"),
            db,
        }
    }

    pub async fn drop(&self) -> Result<(), Error> {
        self.db.drop(None).await?;
        Ok(())
    }
}

impl Database for MongoDatabase {
    fn campaigns(&self) -> &dyn CampaignStore {
        &self.campaigns
    }

    fn pledges(&self) -> &dyn PledgeStore {
        &self.pledges
    }
}
