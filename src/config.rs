use std::env;

use crate::error::Error;

/// Runtime configuration, read once from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub mongodb_uri: String,
    pub database_name: String,
    pub bind_address: String,
    /// Api key for the Resend transactional email service.
    pub resend_api_key: String,
    /// Sender for all outbound mail, e.g. `If We All Did <begin@example.org>`.
    pub email_from: String,
    /// Base url prepended to a campaign's path when building pledge links.
    pub base_url: String,
    /// Shared secret required by the trigger endpoint. When unset, every
    /// caller is authorized; this permissive default is deliberate so a
    /// fresh deployment can be exercised before the scheduler is wired up.
    pub trigger_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Config, Error> {
        Ok(Config {
            mongodb_uri: var_or("MONGODB_URI", "mongodb://localhost:27017"),
            database_name: var_or("MONGODB_DATABASE", "pledgewell"),
            bind_address: var_or("BIND_ADDRESS", "127.0.0.1:8080"),
            resend_api_key: required_var("RESEND_API_KEY")?,
            email_from: required_var("EMAIL_FROM")?,
            base_url: var_or("BASE_URL", "http://localhost:3000"),
            trigger_secret: env::var("CRON_SECRET").ok().filter(|s| !s.is_empty()),
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).ok().unwrap_or_else(|| default.to_string())
}

fn required_var(name: &'static str) -> Result<String, Error> {
    env::var(name).map_err(|_| Error::MissingConfiguration { name })
}
