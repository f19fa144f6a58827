use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::ReportSender;
use crate::config::SmtpConfig;
use crate::{Error, Result};

/// Sender and recipient of the report email
#[derive(Debug, Clone)]
pub struct MailEnvelope {
    from: Mailbox,
    to: Mailbox,
}

impl MailEnvelope {
    pub fn new(from: &str, to: &str) -> Result<Self> {
        Ok(Self {
            from: from.trim().parse()?,
            to: to.trim().parse()?,
        })
    }

    /// Build a multipart message with a single HTML part
    pub fn build_message(&self, subject: &str, html: &str) -> Result<Message> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .multipart(MultiPart::mixed().singlepart(SinglePart::html(html.to_string())))?;
        Ok(message)
    }
}

/// SMTP delivery with STARTTLS before authentication
pub struct SmtpMailer {
    envelope: MailEnvelope,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let port = config
            .port
            .ok_or_else(|| Error::Config("SMTP port not configured".to_string()))?;
        let envelope = MailEnvelope::new(config.sender(), &config.recipient)?;

        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(port)
            .credentials(credentials)
            .build();

        Ok(Self { envelope, transport })
    }
}

#[async_trait::async_trait]
impl ReportSender for SmtpMailer {
    async fn send(&self, subject: &str, html: &str) -> Result<()> {
        let message = self.envelope.build_message(subject, html)?;

        let response = self.transport.send(message).await?;
        if !response.is_positive() {
            return Err(Error::Mail(format!(
                "SMTP server answered {}",
                response.code()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_headers() {
        let envelope = MailEnvelope::new("bot@example.com", " soc@example.com ").unwrap();
        let message = envelope
            .build_message("INTEL REPORT: 19/10/2026", "<div>OK</div>")
            .unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("bot@example.com"));
        assert!(raw.contains("soc@example.com"));
        assert!(raw.contains("Subject: INTEL REPORT: 19/10/2026"));
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn test_invalid_address_rejected() {
        let err = MailEnvelope::new("not an address", "soc@example.com").unwrap_err();
        assert!(matches!(err, Error::Address(_)));
    }
}
