use chrono::Utc;
use tracing::info;

use crate::campaign::{Campaign, CampaignStatus};
use crate::config::Config;
use crate::database::Database;
use crate::error::Error;
use crate::mailer::{EmailMessage, Mailer};

use super::{CampaignTriggerReport, TriggerSummary};

/// One trigger invocation: find collecting campaigns at or past their
/// threshold, claim each with a conditional status swap, email every
/// unnotified pledger once, then mark the campaign notified.
///
/// Invocations may overlap or be retried; the claim is the only
/// cross-invocation coordination. Work committed before a failure stays
/// committed, and a re-run picks up whatever is still unmarked.
#[tracing::instrument(skip(db, mailer, config))]
pub async fn trigger_ready_campaigns(
    db: &dyn Database,
    mailer: &dyn Mailer,
    config: &Config,
) -> Result<TriggerSummary, Error> {
    let collecting = db
        .campaigns()
        .fetch_campaigns_by_status(CampaignStatus::Collecting)
        .await?;

    let mut candidates = vec![];
    for campaign in collecting {
        let count = db
            .pledges()
            .count_pledges_by_campaign(&campaign.campaign)
            .await?;
        if count as i64 >= campaign.threshold {
            candidates.push(campaign);
        }
    }

    let mut summary = TriggerSummary {
        checked: candidates.len() as u64,
        ..TriggerSummary::default()
    };

    for campaign in candidates {
        // Losing the swap means an overlapping invocation owns this
        // campaign and its sends.
        if !db.campaigns().claim_campaign(&campaign.campaign).await? {
            info!(campaign = %campaign.campaign, "campaign already claimed, skipping");
            continue;
        }
        summary.triggered += 1;

        let pledges = db
            .pledges()
            .fetch_unnotified_pledges_by_campaign(&campaign.campaign)
            .await?;

        let mut emails_sent = 0;
        for pledge in pledges {
            let address = match &pledge.email {
                Some(address) => address,
                None => continue,
            };

            let message = render_notification(&campaign, address, config);

            // Send, then mark, one pledge at a time. A failed send aborts
            // the whole invocation rather than leaving pledgers silently
            // skipped while the campaign sits in `triggered`; a later run
            // resumes from the pledges still unmarked.
            mailer.send(&message).await?;
            emails_sent += 1;
            db.pledges()
                .mark_pledge_notified(pledge.id, Utc::now())
                .await?;
        }

        db.campaigns()
            .mark_campaign_notified(&campaign.campaign)
            .await?;

        summary.emails_sent += emails_sent;
        summary.campaigns.push(CampaignTriggerReport {
            campaign: campaign.campaign,
            emails_sent,
        });
    }

    Ok(summary)
}

/// Renders one notification from the campaign's stored copy. Every
/// campaign-supplied field is escaped before interpolation into the html
/// body.
pub fn render_notification(campaign: &Campaign, to: &str, config: &Config) -> EmailMessage {
    let url = campaign_url(&config.base_url, &campaign.path);

    let mut html = String::new();
    html.push_str(&format!("<p>{}</p>", escape_html(&campaign.copy.intro)));
    if !campaign.copy.bullets.is_empty() {
        html.push_str("<ul>");
        for bullet in &campaign.copy.bullets {
            html.push_str(&format!("<li>{}</li>", escape_html(bullet)));
        }
        html.push_str("</ul>");
    }
    html.push_str(&format!(
        r#"<p><a href="{}">{}</a></p>"#,
        escape_html(&url),
        escape_html(&campaign.copy.cta_label),
    ));

    EmailMessage {
        from: config.email_from.clone(),
        to: to.to_string(),
        subject: campaign.copy.subject.clone(),
        html,
    }
}

fn campaign_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/'),
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::database::test::{collecting_campaign, unnotified_pledge, MockDatabase};
    use crate::mailer::test::MockMailer;
    use crate::pledge::Pledge;

    fn test_config() -> Config {
        Config {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            database_name: "pledgewell_test".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            resend_api_key: "re_test".to_string(),
            email_from: "If We All Did <begin@example.org>".to_string(),
            base_url: "https://example.org".to_string(),
            trigger_secret: None,
        }
    }

    fn log_event(log: &Arc<Mutex<Vec<String>>>, event: String) {
        log.lock().unwrap().push(event);
    }

    #[tokio::test]
    async fn below_threshold_campaigns_are_not_candidates() {
        let mut db = MockDatabase::new();
        db.campaigns.on_fetch_campaigns_by_status =
            Box::new(|_| Ok(vec![collecting_campaign("pilot_v1", 5)]));
        db.pledges.on_count_pledges_by_campaign = Box::new(|_| Ok(3));
        let mailer = MockMailer::new();

        let summary = trigger_ready_campaigns(&db, &mailer, &test_config())
            .await
            .unwrap();

        assert_eq!(summary, TriggerSummary::default());
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ready_campaign_is_claimed_notified_and_reported() {
        let pledge_a = unnotified_pledge("pilot_v1", Some("a@example.org"));
        let pledge_b = unnotified_pledge("pilot_v1", Some("b@example.org"));
        let id_a = pledge_a.id;
        let id_b = pledge_b.id;

        let log = Arc::new(Mutex::new(vec![]));

        let mut db = MockDatabase::new();
        db.campaigns.on_fetch_campaigns_by_status =
            Box::new(|_| Ok(vec![collecting_campaign("pilot_v1", 2)]));
        db.pledges.on_count_pledges_by_campaign = Box::new(|_| Ok(2));
        db.campaigns.on_claim_campaign = {
            let log = Arc::clone(&log);
            Box::new(move |campaign| {
                log_event(&log, format!("claim {}", campaign));
                Ok(true)
            })
        };
        db.pledges.on_fetch_unnotified_pledges_by_campaign = {
            let pledges = vec![pledge_a, pledge_b];
            Box::new(move |_| Ok(pledges.clone()))
        };
        db.pledges.on_mark_pledge_notified = {
            let log = Arc::clone(&log);
            Box::new(move |pledge_id, _| {
                log_event(&log, format!("mark {}", pledge_id));
                Ok(())
            })
        };
        db.campaigns.on_mark_campaign_notified = {
            let log = Arc::clone(&log);
            Box::new(move |campaign| {
                log_event(&log, format!("notified {}", campaign));
                Ok(())
            })
        };

        let mailer = MockMailer::new();
        let mailer_log = Arc::clone(&log);
        let mailer = MockMailer {
            on_send: Box::new(move |message| {
                log_event(&mailer_log, format!("send {}", message.to));
                Ok(())
            }),
            ..mailer
        };

        let summary = trigger_ready_campaigns(&db, &mailer, &test_config())
            .await
            .unwrap();

        assert_eq!(
            summary,
            TriggerSummary {
                checked: 1,
                triggered: 1,
                emails_sent: 2,
                campaigns: vec![CampaignTriggerReport {
                    campaign: "pilot_v1".to_string(),
                    emails_sent: 2,
                }],
            }
        );

        // Strict per-pledge send-then-mark ordering, campaign last.
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "claim pilot_v1".to_string(),
                "send a@example.org".to_string(),
                format!("mark {}", id_a),
                "send b@example.org".to_string(),
                format!("mark {}", id_b),
                "notified pilot_v1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn losing_the_claim_skips_the_campaign_entirely() {
        let mut db = MockDatabase::new();
        db.campaigns.on_fetch_campaigns_by_status =
            Box::new(|_| Ok(vec![collecting_campaign("pilot_v1", 2)]));
        db.pledges.on_count_pledges_by_campaign = Box::new(|_| Ok(4));
        db.campaigns.on_claim_campaign = Box::new(|_| Ok(false));
        // fetch_unnotified / send / mark stay unmocked: touching them panics.
        let mailer = MockMailer::new();

        let summary = trigger_ready_campaigns(&db, &mailer, &test_config())
            .await
            .unwrap();

        assert_eq!(
            summary,
            TriggerSummary {
                checked: 1,
                triggered: 0,
                emails_sent: 0,
                campaigns: vec![],
            }
        );
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_with_no_collecting_campaigns_is_empty() {
        let mut db = MockDatabase::new();
        db.campaigns.on_fetch_campaigns_by_status = Box::new(|_| Ok(vec![]));
        let mailer = MockMailer::new();

        let summary = trigger_ready_campaigns(&db, &mailer, &test_config())
            .await
            .unwrap();

        assert_eq!(summary, TriggerSummary::default());
    }

    #[tokio::test]
    async fn send_failure_aborts_the_invocation_mid_list() {
        let pledges: Vec<Pledge> = vec![
            unnotified_pledge("pilot_v1", Some("a@example.org")),
            unnotified_pledge("pilot_v1", Some("b@example.org")),
            unnotified_pledge("pilot_v1", Some("c@example.org")),
        ];
        let id_a = pledges[0].id;

        let marked = Arc::new(Mutex::new(vec![]));

        let mut db = MockDatabase::new();
        db.campaigns.on_fetch_campaigns_by_status =
            Box::new(|_| Ok(vec![collecting_campaign("pilot_v1", 3)]));
        db.pledges.on_count_pledges_by_campaign = Box::new(|_| Ok(3));
        db.campaigns.on_claim_campaign = Box::new(|_| Ok(true));
        db.pledges.on_fetch_unnotified_pledges_by_campaign =
            Box::new(move |_| Ok(pledges.clone()));
        db.pledges.on_mark_pledge_notified = {
            let marked = Arc::clone(&marked);
            Box::new(move |pledge_id, _| {
                marked.lock().unwrap().push(pledge_id);
                Ok(())
            })
        };
        // mark_campaign_notified stays unmocked: reaching it panics.

        let mailer = MockMailer::new();
        let mailer = MockMailer {
            on_send: Box::new(|message| {
                if message.to == "b@example.org" {
                    Err(Error::EmailSendRejected {
                        reason: "rate limited".to_string(),
                    })
                } else {
                    Ok(())
                }
            }),
            ..mailer
        };

        let result = trigger_ready_campaigns(&db, &mailer, &test_config()).await;

        assert_eq!(
            result.unwrap_err(),
            Error::EmailSendRejected {
                reason: "rate limited".to_string()
            }
        );
        // The pledge before the failure is marked; the failing one and the
        // rest are not, and the campaign stays `triggered`.
        assert_eq!(*marked.lock().unwrap(), vec![id_a]);
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pledges_without_an_email_are_passed_over() {
        let pledges = vec![
            unnotified_pledge("pilot_v1", None),
            unnotified_pledge("pilot_v1", Some("b@example.org")),
        ];
        let id_b = pledges[1].id;

        let marked = Arc::new(Mutex::new(vec![]));

        let mut db = MockDatabase::new();
        db.campaigns.on_fetch_campaigns_by_status =
            Box::new(|_| Ok(vec![collecting_campaign("pilot_v1", 1)]));
        db.pledges.on_count_pledges_by_campaign = Box::new(|_| Ok(2));
        db.campaigns.on_claim_campaign = Box::new(|_| Ok(true));
        db.pledges.on_fetch_unnotified_pledges_by_campaign =
            Box::new(move |_| Ok(pledges.clone()));
        db.pledges.on_mark_pledge_notified = {
            let marked = Arc::clone(&marked);
            Box::new(move |pledge_id, _| {
                marked.lock().unwrap().push(pledge_id);
                Ok(())
            })
        };
        db.campaigns.on_mark_campaign_notified = Box::new(|_| Ok(()));
        let mailer = MockMailer::new();

        let summary = trigger_ready_campaigns(&db, &mailer, &test_config())
            .await
            .unwrap();

        assert_eq!(summary.emails_sent, 1);
        assert_eq!(*marked.lock().unwrap(), vec![id_b]);
    }

    #[test]
    fn notification_copy_is_escaped_and_linked() {
        let mut campaign = collecting_campaign("pilot_v1", 2);
        campaign.path = "/pilot".to_string();
        campaign.copy.intro = "Ready & <waiting>".to_string();
        campaign.copy.bullets = vec!["\"Tell\" a friend".to_string()];
        campaign.copy.cta_label = "Let's go".to_string();

        let message = render_notification(&campaign, "a@example.org", &test_config());

        assert_eq!(message.to, "a@example.org");
        assert_eq!(message.subject, "We begin");
        assert!(message.html.contains("<p>Ready &amp; &lt;waiting&gt;</p>"));
        assert!(message.html.contains("<li>&quot;Tell&quot; a friend</li>"));
        assert!(message
            .html
            .contains(r#"<a href="https://example.org/pilot">Let&#39;s go</a>"#));
    }

    #[test]
    fn link_building_always_joins_with_a_single_slash() {
        assert_eq!(
            campaign_url("https://example.org/", "/pilot"),
            "https://example.org/pilot"
        );
        assert_eq!(
            campaign_url("https://example.org", "/pilot"),
            "https://example.org/pilot"
        );
        assert_eq!(
            campaign_url("https://example.org", "pilot"),
            "https://example.org/pilot"
        );
        assert_eq!(
            campaign_url("https://example.org/", "pilot"),
            "https://example.org/pilot"
        );
    }
}
