//! Development mailer: writes messages to the log instead of sending them.

use async_trait::async_trait;

use super::{EmailSender, Message};

#[derive(Debug, Default, Clone)]
pub struct ConsoleEmailSender;

impl ConsoleEmailSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailSender for ConsoleEmailSender {
    async fn send(&self, message: Message) -> anyhow::Result<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.text,
            "email (console)"
        );
        Ok(())
    }
}
