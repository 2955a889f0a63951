use chrono::Utc;

use crate::database::Database;
use crate::error::Error;

use super::{CreatePledgeBody, Pledge, PledgeId};

#[tracing::instrument(skip(db, body))]
pub async fn create_pledge(db: &dyn Database, body: CreatePledgeBody) -> Result<Pledge, Error> {
    if body.name.trim().is_empty() || body.email.trim().is_empty() {
        return Err(Error::PledgeMissingRequiredFields);
    }

    let pledge = Pledge {
        id: PledgeId::new(),
        campaign: body.campaign,
        name: body.name,
        email: Some(body.email),
        city: body.city,
        country: body.country,
        created_at: Utc::now(),
        notified_at: None,
    };

    db.pledges().insert_pledge(&pledge).await?;

    Ok(pledge)
}

#[tracing::instrument(skip(db))]
pub async fn get_pledge_count(db: &dyn Database, campaign: &str) -> Result<u64, Error> {
    let count = db.pledges().count_pledges_by_campaign(campaign).await?;

    Ok(count)
}
