use chrono::Utc;

use crate::campaign::{Campaign, CampaignCopy, CampaignStatus};
use crate::database::{Database, MongoDatabase};
use crate::error::Error;
use crate::pledge::{Pledge, PledgeId};

/// Drops the database and inserts local demo data: the `pilot_v1` campaign
/// one pledge short of its threshold. Opt-in via `SEED_DEMO_DATA`.
pub async fn seed(db: &MongoDatabase) -> Result<(), Error> {
    db.drop().await?;

    let now = Utc::now();
    let campaign = Campaign {
        campaign: "pilot_v1".to_string(),
        name: "If We All Did — Pilot".to_string(),
        path: "/pilot".to_string(),
        threshold: 2,
        status: CampaignStatus::Collecting,
        copy: CampaignCopy {
            subject: "We begin".to_string(),
            intro: "We reached the goal for the pilot. We begin together.".to_string(),
            bullets: vec![
                "Your pledge counted toward the threshold".to_string(),
                "Tell one friend what you pledged".to_string(),
            ],
            cta_label: "See the pledge wall".to_string(),
        },
        triggered_at: None,
        notified_at: None,
        created_at: now,
    };

    let pledge = Pledge {
        id: PledgeId::new(),
        campaign: "pilot_v1".to_string(),
        name: "Demo Pledger".to_string(),
        email: Some("demo@example.org".to_string()),
        city: Some("Rotterdam".to_string()),
        country: Some("NL".to_string()),
        created_at: now,
        notified_at: None,
    };

    db.campaigns().insert_campaign(&campaign).await?;
    db.pledges().insert_pledge(&pledge).await?;

    Ok(())
}
