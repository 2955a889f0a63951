use actix_web::post;
use actix_web::web::{Data, Json, Query};
use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::database::MongoDatabase;
use crate::error::Error;
use crate::mailer::{EmailMessage, Mailer, ResendMailer};

use super::{manager, TriggerSummary};

const SECRET_HEADER: &str = "x-cron-secret";

#[derive(Clone, Debug, Deserialize)]
pub struct TriggerQuery {
    pub secret: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TriggerResponse {
    pub success: bool,
    pub summary: TriggerSummary,
}

/// Entry point for the external scheduler. Authorization happens before
/// any store access.
#[post("/campaigns/trigger")]
#[tracing::instrument(skip_all)]
async fn trigger_campaigns(
    req: HttpRequest,
    db: Data<MongoDatabase>,
    mailer: Data<ResendMailer>,
    config: Data<Config>,
    query: Query<TriggerQuery>,
) -> Result<Json<TriggerResponse>, Error> {
    let header_secret = req
        .headers()
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    authorize(
        header_secret,
        query.secret.as_deref(),
        config.trigger_secret.as_deref(),
    )?;

    let summary =
        manager::trigger_ready_campaigns(db.get_ref(), mailer.get_ref(), &config).await?;

    Ok(Json(TriggerResponse {
        success: true,
        summary,
    }))
}

fn authorize(
    header_secret: Option<&str>,
    query_secret: Option<&str>,
    expected: Option<&str>,
) -> Result<(), Error> {
    let expected = match expected {
        Some(expected) => expected,
        // No secret configured: allow every caller.
        None => return Ok(()),
    };

    if header_secret == Some(expected) || query_secret == Some(expected) {
        Ok(())
    } else {
        Err(Error::TriggerUnauthorized)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TestEmailBody {
    pub to: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TestEmailResponse {
    pub success: bool,
}

/// Smoke test for the email configuration; sends a fixed message to the
/// given recipient.
#[post("/emails/test")]
#[tracing::instrument(skip(mailer, config, body))]
async fn send_test_email(
    mailer: Data<ResendMailer>,
    config: Data<Config>,
    body: Json<TestEmailBody>,
) -> Result<Json<TestEmailResponse>, Error> {
    let message = EmailMessage {
        from: config.email_from.clone(),
        to: body.into_inner().to,
        subject: "Smoke test: pledgewell".to_string(),
        html: "<p>This is a test email.</p><p>If you received this, email sending works.</p>"
            .to_string(),
    };

    mailer.send(&message).await?;

    Ok(Json(TestEmailResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_configured_secret_allows_everyone() {
        assert_eq!(authorize(None, None, None), Ok(()));
        assert_eq!(authorize(Some("whatever"), None, None), Ok(()));
    }

    #[test]
    fn matching_header_or_query_secret_is_authorized() {
        assert_eq!(authorize(Some("s3cret"), None, Some("s3cret")), Ok(()));
        assert_eq!(authorize(None, Some("s3cret"), Some("s3cret")), Ok(()));
    }

    #[test]
    fn missing_or_wrong_secret_is_rejected() {
        assert_eq!(
            authorize(None, None, Some("s3cret")),
            Err(Error::TriggerUnauthorized)
        );
        assert_eq!(
            authorize(Some("wrong"), Some("also-wrong"), Some("s3cret")),
            Err(Error::TriggerUnauthorized)
        );
    }
}
