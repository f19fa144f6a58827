mod mailer;
mod template;

pub use mailer::{MailEnvelope, SmtpMailer};
pub use template::{render_report, subject_for};

use chrono::{DateTime, Local};

use crate::Result;

/// Outbound delivery of a finished report
#[async_trait::async_trait]
pub trait ReportSender: Send + Sync {
    async fn send(&self, subject: &str, html: &str) -> Result<()>;
}

/// Wrap the report body in the email template and deliver it
pub async fn dispatch(
    sender: &dyn ReportSender,
    body: &str,
    item_count: usize,
    generated_at: DateTime<Local>,
) -> Result<()> {
    let subject = subject_for(generated_at.date_naive());
    let html = render_report(body, item_count, generated_at);

    match sender.send(&subject, &html).await {
        Ok(()) => {
            tracing::info!("Report '{}' sent ({} items)", subject, item_count);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to send report '{}': {}", subject, e);
            Err(e)
        }
    }
}
