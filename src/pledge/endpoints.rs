use actix_web::web::{Data, Json, Query};
use actix_web::{get, post, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::MongoDatabase;
use crate::error::Error;

use super::{manager, PledgeId};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreatePledgeBody {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default = "default_campaign")]
    pub campaign: String,
}

fn default_campaign() -> String {
    "pilot_v1".to_string()
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PledgeBody {
    pub id: PledgeId,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PledgeCountQuery {
    #[serde(default = "default_campaign")]
    pub campaign: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PledgeCountBody {
    pub count: u64,
}

#[post("/pledges")]
#[tracing::instrument(skip(db, body))]
async fn create_pledge(
    db: Data<MongoDatabase>,
    body: Json<CreatePledgeBody>,
) -> Result<HttpResponse, Error> {
    let pledge = manager::create_pledge(db.get_ref(), body.into_inner()).await?;

    Ok(HttpResponse::Created().json(PledgeBody {
        id: pledge.id,
        created_at: pledge.created_at,
    }))
}

#[get("/pledges/count")]
#[tracing::instrument(skip(db))]
async fn get_pledge_count(
    db: Data<MongoDatabase>,
    query: Query<PledgeCountQuery>,
) -> Result<Json<PledgeCountBody>, Error> {
    let count = manager::get_pledge_count(db.get_ref(), &query.campaign).await?;

    Ok(Json(PledgeCountBody { count }))
}
