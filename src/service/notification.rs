//! Lead notification emails: an acknowledgment to the submitter and an
//! alert to the operator for every persisted lead.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use html_escape::encode_text;
use tracing::{error, info, instrument};

use crate::model::contact::Contact;
use crate::model::enquiry::{Budget, Enquiry};
use crate::util::email::{EmailError, EmailMessage, SmtpEmailService};

const COMPANY: &str = "BCM Group";

/// Transport seam for outgoing mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

#[async_trait]
impl Mailer for SmtpEmailService {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        self.send_email(message).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Failed,
}

/// Outcome of the two sends for one lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationReport {
    pub acknowledgment: Delivery,
    pub alert: Delivery,
}

/// Never fails: delivery problems are logged and reported, not raised.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_enquiry(&self, enquiry: &Enquiry) -> NotificationReport;
    async fn notify_contact(&self, contact: &Contact) -> NotificationReport;
}

pub struct EmailNotifier {
    mailer: Arc<dyn Mailer>,
    operator_email: String,
}

impl EmailNotifier {
    pub fn new(mailer: Arc<dyn Mailer>, operator_email: impl Into<String>) -> Self {
        EmailNotifier { mailer, operator_email: operator_email.into() }
    }

    async fn deliver(&self, message: EmailMessage) -> Delivery {
        let to = message.to.clone();
        match self.mailer.send(message).await {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                error!(to = %to, error = %e, "Notification email failed");
                Delivery::Failed
            }
        }
    }

    async fn dispatch(&self, acknowledgment: EmailMessage, alert: EmailMessage) -> NotificationReport {
        let report = NotificationReport {
            acknowledgment: self.deliver(acknowledgment).await,
            alert: self.deliver(alert).await,
        };
        info!(?report, "Notifications dispatched");
        report
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    #[instrument(skip(self, enquiry), fields(email = %enquiry.email))]
    async fn notify_enquiry(&self, enquiry: &Enquiry) -> NotificationReport {
        let received = received_at_ist(Utc::now());
        self.dispatch(
            enquiry_acknowledgment(enquiry),
            enquiry_alert(enquiry, &self.operator_email, &received),
        )
        .await
    }

    #[instrument(skip(self, contact), fields(email = %contact.email))]
    async fn notify_contact(&self, contact: &Contact) -> NotificationReport {
        let received = received_at_ist(Utc::now());
        self.dispatch(
            contact_acknowledgment(contact),
            contact_alert(contact, &self.operator_email, &received),
        )
        .await
    }
}

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;
const RECEIVED_FORMAT: &str = "%d %B %Y, %I:%M %p";

/// e.g. "18 October 2026, 02:30 PM IST"
pub fn received_at_ist(at: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(ist) => format!("{} IST", at.with_timezone(&ist).format(RECEIVED_FORMAT)),
        None => format!("{} UTC", at.format(RECEIVED_FORMAT)),
    }
}

/// Labelled rows for the optional and required fields of an enquiry.
fn enquiry_rows(enquiry: &Enquiry) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Name", enquiry.full_name.clone()),
        ("Email", enquiry.email.clone()),
        ("Phone", enquiry.phone.clone()),
    ];
    let optional = [
        ("Location", enquiry.location.clone()),
        ("Interested In", enquiry.interested_in.clone()),
        ("Budget Range", enquiry.budget.as_deref().map(Budget::display_for)),
        ("Project", enquiry.project_name.clone()),
        ("Message", enquiry.message.clone()),
    ];
    rows.extend(optional.into_iter().filter_map(|(label, value)| value.map(|v| (label, v))));
    rows
}

fn contact_rows(contact: &Contact) -> Vec<(&'static str, String)> {
    let mut rows = vec![("Name", contact.name.clone()), ("Email", contact.email.clone())];
    if let Some(phone) = &contact.phone {
        rows.push(("Phone", phone.clone()));
    }
    rows.push(("Service", contact.service.clone()));
    rows.push(("Message", contact.message.clone()));
    rows
}

fn text_rows(rows: &[(&str, String)]) -> String {
    rows.iter().map(|(label, value)| format!("{}: {}\n", label, value)).collect()
}

fn html_rows(rows: &[(&str, String)]) -> String {
    rows.iter()
        .map(|(label, value)| {
            format!(
                "<tr><td style=\"padding:6px 12px 6px 0;\"><strong>{}:</strong></td><td style=\"padding:6px 0;\">{}</td></tr>",
                label,
                encode_text(value)
            )
        })
        .collect()
}

fn html_page(heading: &str, intro_html: &str, rows: &[(&str, String)], footer_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>{heading}</title></head>
<body style="font-family: Arial, sans-serif; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h2>{heading}</h2>
  {intro_html}
  <table style="width: 100%; border-collapse: collapse; background-color: #f8f9fa; padding: 12px;">{rows}</table>
  {footer_html}
</body>
</html>"#,
        heading = heading,
        intro_html = intro_html,
        rows = html_rows(rows),
        footer_html = footer_html,
    )
}

fn signature_text() -> String {
    format!("Best regards,\n{} Team\n", COMPANY)
}

fn signature_html() -> String {
    format!("<p>Best regards,<br><strong>{} Team</strong></p>", COMPANY)
}

pub fn enquiry_acknowledgment(enquiry: &Enquiry) -> EmailMessage {
    let rows = enquiry_rows(enquiry);
    let intro = "We have received your project enquiry and our team will review it shortly. \
                 We'll contact you within 24-48 hours to discuss your requirements in detail.";
    EmailMessage {
        to: enquiry.email.clone(),
        subject: "Project Enquiry Received - Thank You".to_string(),
        text_body: format!(
            "Dear {},\n\n{}\n\nYour enquiry details:\n{}\n{}",
            enquiry.full_name,
            intro,
            text_rows(&rows),
            signature_text()
        ),
        html_body: html_page(
            "Thank you for your project enquiry!",
            &format!("<p>Dear {},</p><p>{}</p>", encode_text(&enquiry.full_name), intro),
            &rows,
            &signature_html(),
        ),
    }
}

pub fn enquiry_alert(enquiry: &Enquiry, operator_email: &str, received_at: &str) -> EmailMessage {
    let rows = enquiry_rows(enquiry);
    EmailMessage {
        to: operator_email.to_string(),
        subject: "New Project Enquiry Received".to_string(),
        text_body: format!("New project enquiry\n\n{}\nReceived at: {}\n", text_rows(&rows), received_at),
        html_body: html_page(
            "New Project Enquiry",
            "",
            &rows,
            &format!("<p><strong>Received at:</strong> {}</p>", encode_text(received_at)),
        ),
    }
}

pub fn contact_acknowledgment(contact: &Contact) -> EmailMessage {
    let rows = contact_rows(contact);
    let intro = "We have received your message and will get back to you within 24 hours.";
    EmailMessage {
        to: contact.email.clone(),
        subject: "Message Received - Thank You for Contacting Us".to_string(),
        text_body: format!(
            "Dear {},\n\n{}\n\nYour message:\n{}\n{}",
            contact.name,
            intro,
            text_rows(&rows),
            signature_text()
        ),
        html_body: html_page(
            "Thank you for contacting us!",
            &format!("<p>Dear {},</p><p>{}</p>", encode_text(&contact.name), intro),
            &rows,
            &signature_html(),
        ),
    }
}

pub fn contact_alert(contact: &Contact, operator_email: &str, received_at: &str) -> EmailMessage {
    let rows = contact_rows(contact);
    EmailMessage {
        to: operator_email.to_string(),
        subject: "New Contact Form Message".to_string(),
        text_body: format!("New contact form message\n\n{}\nReceived at: {}\n", text_rows(&rows), received_at),
        html_body: html_page(
            "New Contact Form Message",
            "",
            &rows,
            &format!("<p><strong>Received at:</strong> {}</p>", encode_text(received_at)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lead::LeadStatus;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<EmailMessage>>,
        fail_to: Option<String>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
            let fail = self.fail_to.as_deref() == Some(message.to.as_str());
            self.sent.lock().push(message);
            if fail {
                Err(EmailError::SmtpError("mailbox unavailable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn enquiry() -> Enquiry {
        Enquiry {
            id: None,
            full_name: "Asha <Rao>".to_string(),
            email: "asha@example.com".to_string(),
            phone: "+91 98765 43210".to_string(),
            location: None,
            interested_in: Some("Skyline Towers".to_string()),
            budget: Some("2cr-5cr".to_string()),
            message: None,
            project_name: None,
            status: LeadStatus::Pending,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_enquiry_templates() {
        let ack = enquiry_acknowledgment(&enquiry());
        assert_eq!(ack.to, "asha@example.com");
        assert!(ack.text_body.contains("Budget Range: ₹2 - ₹5 Crores"));
        assert!(!ack.text_body.contains("Location"));
        assert!(ack.html_body.contains("Asha &lt;Rao&gt;"));
        assert!(!ack.html_body.contains("<Rao>"));

        let alert = enquiry_alert(&enquiry(), "ops@bcm.test", "18 October 2026, 02:30 PM IST");
        assert_eq!(alert.to, "ops@bcm.test");
        assert!(alert.text_body.contains("Received at: 18 October 2026"));
    }

    #[test]
    fn test_ist_time() {
        let at = DateTime::parse_from_rfc3339("2026-10-18T09:00:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(received_at_ist(at), "18 October 2026, 02:30 PM IST");
    }

    #[tokio::test]
    async fn test_both_emails_attempted_when_one_fails() {
        let mailer = Arc::new(RecordingMailer { fail_to: Some("asha@example.com".to_string()), ..Default::default() });
        let notifier = EmailNotifier::new(mailer.clone(), "ops@bcm.test");
        let report = notifier.notify_enquiry(&enquiry()).await;
        assert_eq!(report, NotificationReport { acknowledgment: Delivery::Failed, alert: Delivery::Sent });
        assert_eq!(mailer.sent.lock().len(), 2);
    }
}
