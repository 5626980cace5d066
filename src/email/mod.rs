//! Outbound mail. Message bodies are built here; transports only deliver.

pub mod console;
pub mod mailgun;

use async_trait::async_trait;
use reqwest::Url;

pub use console::ConsoleEmailSender;
pub use mailgun::MailgunEmailSender;

pub const WELCOME_SUBJECT: &str = "Welcome to LensLockedBR.com!";
pub const RESET_SUBJECT: &str = "Instructions for resetting your password.";

/// A fully rendered message, ready for any transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: Message) -> anyhow::Result<()>;

    async fn welcome(&self, name: &str, email: &str) -> anyhow::Result<()> {
        self.send(welcome_message(name, email)).await
    }

    async fn reset_pw(&self, email: &str, reset_url: &str, token: &str) -> anyhow::Result<()> {
        self.send(reset_message(email, reset_url, token)).await
    }
}

/// `<base_url>/reset?token=<token>`, with the token query-encoded.
pub fn reset_url(base_url: &str, token: &str) -> anyhow::Result<String> {
    let mut url = Url::parse(base_url)?.join("/reset")?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url.into())
}

fn recipient(name: &str, email: &str) -> String {
    if name.is_empty() {
        email.to_string()
    } else {
        format!("{name} <{email}>")
    }
}

pub fn welcome_message(name: &str, email: &str) -> Message {
    Message {
        to: recipient(name, email),
        subject: WELCOME_SUBJECT.into(),
        text: "Hi there!\n\n\
               Welcome to LensLockedBR.com! We really hope you enjoy using our application!\n\n\
               Best regards,\n\nLH\n"
            .into(),
        html: "Hi there!<br/><br/>\
               <p>Welcome to LensLockedBR.com! We really hope you enjoy using our application!</p>\
               <p>Best regards,</p><p>LH</p>"
            .into(),
    }
}

pub fn reset_message(email: &str, reset_url: &str, token: &str) -> Message {
    let text = format!(
        "Hi there!\n\n\
         It appears that you have requested a password reset. If this was you, \
         please follow the link below to update your password:\n\n{reset_url}\n\n\
         If you are asked for a token, please use the following value:\n\n{token}\n\n\
         If you didn't request a password reset you can safely ignore this email \
         and your account will not be changed.\n\nBest, LensLockedBR Support\n"
    );
    let html = format!(
        "Hi there!<br/><br/>\
         It appears that you have requested a password reset. If this was you, \
         please follow the link below to update your password:<br/><br/>\
         <a href=\"{reset_url}\">{reset_url}</a><br/><br/>\
         If you are asked for a token, please use the following value:<br/><br/>{token}<br/><br/>\
         If you didn't request a password reset you can safely ignore this email \
         and your account will not be changed.<br/><br/>Best,<br/>LensLockedBR Support<br/>"
    );
    Message {
        to: email.to_string(),
        subject: RESET_SUBJECT.into(),
        text,
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_url_encodes_token() {
        let url = reset_url("http://localhost:3000", "ab+c/=").unwrap();
        assert_eq!(url, "http://localhost:3000/reset?token=ab%2Bc%2F%3D");
    }

    #[test]
    fn reset_message_carries_link_and_token() {
        let msg = reset_message("jon@example.com", "http://x/reset?token=t0k", "t0k");
        assert_eq!(msg.to, "jon@example.com");
        assert_eq!(msg.subject, RESET_SUBJECT);
        assert!(msg.text.contains("http://x/reset?token=t0k"));
        assert!(msg.html.contains("<a href=\"http://x/reset?token=t0k\">"));
    }

    #[test]
    fn welcome_addresses_by_name() {
        assert_eq!(welcome_message("Jon", "jon@example.com").to, "Jon <jon@example.com>");
        assert_eq!(welcome_message("", "jon@example.com").to, "jon@example.com");
    }
}
