//! Outbound pitch delivery.
//!
//! Email is never spoken directly: pitches go to an HTTP mail relay, or are
//! only logged when no relay is configured.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pgl_api::deploy;

const RELAY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FROM: &str = "pitches@pgl.local";
/// How many logged emails the `Log` mailer keeps; older ones are dropped.
const OUTBOX_CAPACITY: usize = 50;

/// A pitch ready to leave the building.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
    /// Used as the `Message-ID` header so replies can be matched later.
    pub message_id: String,
}

/// Where an email went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub message_id: String,
    pub via: &'static str,
}

#[derive(Clone)]
pub enum Mailer {
    /// Log only, keeping the most recent emails.
    Log {
        from: String,
        outbox: Arc<Mutex<VecDeque<OutboundEmail>>>,
    },
    /// POST JSON to a mail relay.
    Http {
        client: reqwest::Client,
        url: String,
        api_key: Option<String>,
        from: String,
    },
}

impl Mailer {
    pub fn log(from: impl Into<String>) -> Self {
        Self::Log {
            from: from.into(),
            outbox: Arc::new(Mutex::new(VecDeque::with_capacity(OUTBOX_CAPACITY))),
        }
    }

    /// Configure from `PGL_MAIL_RELAY_URL`, `PGL_MAIL_RELAY_KEY` and `PGL_MAIL_FROM`.
    pub fn from_env() -> Result<Self> {
        let from = std::env::var(deploy::ENV_MAIL_FROM)
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_FROM.to_string());
        let Some(url) = std::env::var(deploy::ENV_MAIL_RELAY_URL)
            .ok()
            .filter(|s| !s.is_empty())
        else {
            tracing::info!("no mail relay configured; pitches will be logged only");
            return Ok(Self::log(from));
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(RELAY_TIMEOUT_SECS))
            .build()
            .context("building mail relay client")?;
        tracing::info!("mail relay enabled: {url}");
        Ok(Self::Http {
            client,
            url,
            api_key: std::env::var(deploy::ENV_MAIL_RELAY_KEY)
                .ok()
                .filter(|s| !s.is_empty()),
            from,
        })
    }

    pub fn from_address(&self) -> &str {
        match self {
            Self::Log { from, .. } | Self::Http { from, .. } => from,
        }
    }

    /// Fresh `Message-ID` for an outbound pitch.
    pub fn new_message_id(&self) -> String {
        let domain = self
            .from_address()
            .split_once('@')
            .map(|(_, d)| d)
            .filter(|d| !d.is_empty())
            .unwrap_or("pgl.local");
        format!("<{}@{domain}>", uuid::Uuid::new_v4().simple())
    }

    pub async fn send(&self, email: OutboundEmail) -> Result<Delivery> {
        match self {
            Self::Log { outbox, .. } => {
                tracing::info!(
                    to = %email.to,
                    subject = %email.subject,
                    message_id = %email.message_id,
                    "pitch logged (no mail relay)"
                );
                let message_id = email.message_id.clone();
                if let Ok(mut outbox) = outbox.lock() {
                    if outbox.len() == OUTBOX_CAPACITY {
                        outbox.pop_front();
                    }
                    outbox.push_back(email);
                }
                Ok(Delivery {
                    message_id,
                    via: "log",
                })
            }
            Self::Http {
                client,
                url,
                api_key,
                ..
            } => {
                let mut request = client.post(url).json(&email);
                if let Some(key) = api_key {
                    request = request.bearer_auth(key);
                }
                let response = request.send().await.context("mail relay request")?;
                let status = response.status();
                if !status.is_success() {
                    bail!("mail relay returned status {}", status.as_u16());
                }
                Ok(Delivery {
                    message_id: email.message_id,
                    via: "relay",
                })
            }
        }
    }

    /// Emails recorded by the `Log` mailer.
    #[cfg(test)]
    pub fn outbox(&self) -> Vec<OutboundEmail> {
        match self {
            Self::Log { outbox, .. } => outbox
                .lock()
                .map(|o| o.iter().cloned().collect())
                .unwrap_or_default(),
            Self::Http { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids_use_sender_domain() {
        let mailer = Mailer::log("host@agency.example");
        let id = mailer.new_message_id();
        assert!(id.starts_with('<'));
        assert!(id.ends_with("@agency.example>"));
        assert_ne!(id, mailer.new_message_id());
    }

    #[tokio::test]
    async fn log_mailer_records_email() {
        let mailer = Mailer::log(DEFAULT_FROM);
        let delivery = mailer
            .send(OutboundEmail {
                to: "host@show.fm".into(),
                from: DEFAULT_FROM.into(),
                subject: "Guest idea".into(),
                text: "Hi".into(),
                message_id: "<m1@pgl.local>".into(),
            })
            .await
            .unwrap();
        assert_eq!(delivery.via, "log");
        assert_eq!(delivery.message_id, "<m1@pgl.local>");
        assert_eq!(mailer.outbox().len(), 1);
    }

    #[tokio::test]
    async fn log_mailer_keeps_only_recent_emails() {
        let mailer = Mailer::log(DEFAULT_FROM);
        for n in 0..OUTBOX_CAPACITY + 5 {
            mailer
                .send(OutboundEmail {
                    to: "host@show.fm".into(),
                    from: DEFAULT_FROM.into(),
                    subject: format!("Pitch {n}"),
                    text: "Hi".into(),
                    message_id: format!("<m{n}@pgl.local>"),
                })
                .await
                .unwrap();
        }
        let outbox = mailer.outbox();
        assert_eq!(outbox.len(), OUTBOX_CAPACITY);
        assert_eq!(outbox[0].subject, "Pitch 5");
        assert_eq!(
            outbox.last().map(|e| e.subject.as_str()),
            Some(format!("Pitch {}", OUTBOX_CAPACITY + 4).as_str())
        );
    }
}
