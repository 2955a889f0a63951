use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;

const RESEND_SEND_URL: &str = "https://api.resend.com/emails";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), Error>;
}

/// Mailer backed by the Resend transactional email api.
#[derive(Clone, Debug)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
}

impl ResendMailer {
    pub fn new(api_key: String) -> Result<ResendMailer, Error> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;

        Ok(ResendMailer { client, api_key })
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendEmailErrorResponse {
    message: Option<String>,
    name: Option<String>,
}

#[async_trait]
impl Mailer for ResendMailer {
    #[tracing::instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    async fn send(&self, message: &EmailMessage) -> Result<(), Error> {
        let request = SendEmailRequest {
            from: &message.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(RESEND_SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let reason = match response.json::<SendEmailErrorResponse>().await {
                Ok(body) => body
                    .message
                    .or(body.name)
                    .unwrap_or_else(|| format!("email api returned {}", status)),
                Err(_) => format!("email api returned {}", status),
            };

            return Err(Error::EmailSendRejected { reason });
        }

        Ok(())
    }
}
