use actix_web::web::{self, Data, FormConfig, JsonConfig, PathConfig, QueryConfig};
use actix_web::{App, HttpServer, ResponseError};
use mongodb::Client;
use tracing::{info, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::fmt::format::FmtSpan;

pub mod campaign;
pub mod config;
pub mod database;
pub mod error;
pub mod mailer;
pub mod pledge;
pub mod seed;
pub mod trigger;
pub mod typedid;
pub mod utils;

pub use campaign::CampaignBody;
pub use config::Config;
pub use error::Error;
pub use pledge::{CreatePledgeBody, PledgeBody, PledgeCountBody};
pub use trigger::{TriggerResponse, TriggerSummary};

use crate::database::MongoDatabase;
use crate::mailer::ResendMailer;

#[actix_web::main]
pub async fn run(seed_demo_data: bool) -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_span_events(FmtSpan::NEW)
        .compact()
        .init();

    let config = Config::from_env()?;

    info!("connecting to db: {}", config.mongodb_uri);
    let db = Client::with_uri_str(&config.mongodb_uri)
        .await?
        .database(&config.database_name);
    let db = MongoDatabase::new(db);

    if seed_demo_data {
        seed::seed(&db).await?;
    }

    let mailer = ResendMailer::new(config.resend_api_key.clone())?;
    let bind_address = config.bind_address.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(JsonConfig::default().error_handler(|err, _req| {
                // format json errors with custom format
                Error::InvalidJson(err).into()
            }))
            .app_data(PathConfig::default().error_handler(|err, _req| {
                // format path errors with custom format
                Error::InvalidPath(err).into()
            }))
            .app_data(FormConfig::default().error_handler(|err, _req| {
                // format form errors with custom format
                Error::InvalidForm(err).into()
            }))
            .app_data(QueryConfig::default().error_handler(|err, _req| {
                // format query errors with custom format
                Error::InvalidQuery(err).into()
            }))
            .app_data(Data::new(db.clone()))
            .app_data(Data::new(mailer.clone()))
            .app_data(Data::new(config.clone()))
            .wrap(TracingLogger::default())
            .service(campaign::endpoints::get_campaigns)
            .service(campaign::endpoints::get_campaign_by_key)
            .service(pledge::endpoints::create_pledge)
            .service(pledge::endpoints::get_pledge_count)
            .service(trigger::endpoints::trigger_campaigns)
            .service(trigger::endpoints::send_test_email)
            .default_service(web::to(|| async { Error::PathDoesNotExist.error_response() }))
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
