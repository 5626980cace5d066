use anyhow::Context;
use async_trait::async_trait;

use super::{EmailSender, Message};
use crate::config::MailgunConfig;

const API_BASE: &str = "https://api.mailgun.net/v3";

/// Delivers through the Mailgun messages API.
pub struct MailgunEmailSender {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    from: String,
}

impl MailgunEmailSender {
    pub fn new(http: reqwest::Client, cfg: &MailgunConfig) -> Self {
        let from = if cfg.from.is_empty() {
            format!("LensLockedBR Support <support@{}>", cfg.domain)
        } else {
            cfg.from.clone()
        };
        Self {
            http,
            api_key: cfg.api_key.clone(),
            endpoint: format!("{API_BASE}/{}/messages", cfg.domain),
            from,
        }
    }
}

#[async_trait]
impl EmailSender for MailgunEmailSender {
    async fn send(&self, message: Message) -> anyhow::Result<()> {
        let form = [
            ("from", self.from.as_str()),
            ("to", message.to.as_str()),
            ("subject", message.subject.as_str()),
            ("text", message.text.as_str()),
            ("html", message.html.as_str()),
        ];
        let resp = self
            .http
            .post(&self.endpoint)
            .basic_auth("api", Some(&self.api_key))
            .form(&form)
            .send()
            .await
            .context("mailgun request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("mailgun returned {status}: {body}");
        }
        tracing::debug!(to = %message.to, subject = %message.subject, "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sender_uses_domain() {
        let cfg = MailgunConfig {
            api_key: "key".into(),
            domain: "mg.example.com".into(),
            ..Default::default()
        };
        let sender = MailgunEmailSender::new(reqwest::Client::new(), &cfg);
        assert_eq!(sender.from, "LensLockedBR Support <support@mg.example.com>");
        assert_eq!(sender.endpoint, "https://api.mailgun.net/v3/mg.example.com/messages");
    }
}
