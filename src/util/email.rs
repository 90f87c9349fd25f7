use crate::config::email_conf::SmtpSecurity;
use crate::config::{ConfigError, EmailConfig};
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info, instrument};

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("SMTP error: {0}")]
    SmtpError(String),
    #[error("Message building error: {0}")]
    MessageError(String),
    #[error("Address error: {0}")]
    AddressError(String),
}

impl From<ConfigError> for EmailError {
    fn from(err: ConfigError) -> Self {
        EmailError::ConfigError(err.to_string())
    }
}

/// Outgoing message with plain text and HTML alternatives.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

pub struct SmtpEmailService {
    pub config: EmailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailService {
    #[instrument(skip(config), fields(host = %config.host, port = config.port))]
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        config.validate()?;

        let tls = match config.security {
            SmtpSecurity::Plain => Tls::None,
            SmtpSecurity::StartTls | SmtpSecurity::Tls => {
                let parameters = TlsParameters::new(config.host.clone())
                    .map_err(|e| EmailError::ConfigError(format!("TLS configuration error: {}", e)))?;
                if config.security == SmtpSecurity::Tls {
                    Tls::Wrapper(parameters)
                } else {
                    Tls::Required(parameters)
                }
            }
        };

        let mut transport_builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .timeout(Some(std::time::Duration::from_secs(config.timeout_secs)))
            .tls(tls);
        if config.has_credentials() {
            transport_builder = transport_builder
                .credentials(Credentials::new(config.username.clone(), config.password.clone()));
        }

        info!("SMTP email service initialized");
        Ok(Self { transport: transport_builder.build(), config })
    }

    #[instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    pub async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError> {
        let email_message = self.build_message(message)?;
        self.transport.send(email_message).await.map_err(|e| {
            error!("Failed to send email: {}", e);
            EmailError::SmtpError(format!("Failed to send email: {}", e))
        })?;
        info!("Email sent");
        Ok(())
    }

    fn build_message(&self, email_message: EmailMessage) -> Result<Message, EmailError> {
        let from_mailbox: Mailbox = format!("{} <{}>", self.config.sender_name, self.config.sender_address)
            .parse()
            .map_err(|e| EmailError::AddressError(format!("Invalid from address: {}", e)))?;
        let to_mailbox: Mailbox = email_message
            .to
            .parse()
            .map_err(|e| EmailError::AddressError(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(email_message.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email_message.text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email_message.html_body),
                    ),
            )
            .map_err(|e| EmailError::MessageError(format!("Failed to build multipart message: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_message_carries_sender_and_both_bodies() {
        let service = SmtpEmailService::new(EmailConfig::from_test_env()).unwrap();
        let message = service
            .build_message(EmailMessage {
                to: "jane@x.com".to_string(),
                subject: "Thanks for contacting BCM Group".to_string(),
                text_body: "plain body".to_string(),
                html_body: "<p>html body</p>".to_string(),
            })
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("noreply@bcm.test"));
        assert!(raw.contains("jane@x.com"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
    }

    #[tokio::test]
    async fn test_bad_recipient_is_rejected() {
        let service = SmtpEmailService::new(EmailConfig::from_test_env()).unwrap();
        let result = service.build_message(EmailMessage {
            to: "not an address".to_string(),
            subject: String::new(),
            text_body: String::new(),
            html_body: String::new(),
        });
        assert!(matches!(result, Err(EmailError::AddressError(_))));
    }
}
