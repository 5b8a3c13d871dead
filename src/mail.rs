//! Outbound account mails.
//!
//! Handlers talk to a `Notifier`; production uses `SmtpNotifier`, deployments without an
//! SMTP relay fall back to `LogNotifier`, and tests inject their own implementation.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use url::Url;

use crate::config::SmtpConfig;
use crate::error::AppError;
use crate::models::User;

/// A rendered plaintext mail.
#[derive(Debug, Clone, PartialEq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends the link that confirms `user.email` with `user.verify_token`.
    async fn send_confirmation(&self, user: &User) -> Result<(), AppError>;

    /// Sends the link that lets the user pick a new password.
    async fn send_password_recovery(&self, user: &User) -> Result<(), AppError>;
}

/// Builds the mail bodies and links from the public base URL.
#[derive(Debug, Clone)]
pub struct MailTemplates {
    public_url: Url,
}

impl MailTemplates {
    pub fn new(public_url: &str) -> Result<Self, AppError> {
        let public_url = Url::parse(public_url)
            .map_err(|e| AppError::InternalServerError(format!("Invalid public URL: {}", e)))?;
        Ok(Self { public_url })
    }

    fn link(&self, path: &str, user: &User) -> Result<Url, AppError> {
        let mut link = self
            .public_url
            .join(path)
            .map_err(|e| AppError::InternalServerError(format!("Invalid link: {}", e)))?;
        link.query_pairs_mut()
            .append_pair("email", &user.email)
            .append_pair("token", &user.verify_token);
        Ok(link)
    }

    pub fn confirmation(&self, user: &User) -> Result<Mail, AppError> {
        let link = self.link("v1/confirm", user)?;
        Ok(Mail {
            to: user.email.clone(),
            subject: "Confirm your Todo App account".to_string(),
            body: format!(
                "Hello {},\r\n\r\nplease confirm your email address by opening this link:\r\n{}\r\n",
                user.firstname, link
            ),
        })
    }

    pub fn password_recovery(&self, user: &User) -> Result<Mail, AppError> {
        let link = self.link("password-recovery", user)?;
        Ok(Mail {
            to: user.email.clone(),
            subject: "Todo App password recovery".to_string(),
            body: format!(
                "Hello {},\r\n\r\nsomeone asked to reset your password. \
                 If it was you, open this link to choose a new one:\r\n{}\r\n\r\n\
                 Your recovery code is: {}\r\n",
                user.firstname, link, user.verify_token
            ),
        })
    }
}

/// Delivers mails through an SMTP relay with PLAIN/LOGIN credentials.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    templates: MailTemplates,
}

impl SmtpNotifier {
    /// Port 465 uses implicit TLS, any other port STARTTLS.
    pub fn new(config: &SmtpConfig, templates: MailTemplates) -> Result<Self, AppError> {
        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
        }
        .map_err(|e| AppError::MailError(e.to_string()))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| AppError::MailError(format!("Invalid sender address: {}", e)))?;

        Ok(Self {
            transport,
            from,
            templates,
        })
    }

    async fn deliver(&self, mail: Mail) -> Result<(), AppError> {
        let to = mail
            .to
            .parse::<Mailbox>()
            .map_err(|e| AppError::MailError(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| AppError::MailError(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::MailError(e.to_string()))?;

        log::info!("mail sent to {}", mail.to);
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_confirmation(&self, user: &User) -> Result<(), AppError> {
        let mail = self.templates.confirmation(user)?;
        self.deliver(mail).await
    }

    async fn send_password_recovery(&self, user: &User) -> Result<(), AppError> {
        let mail = self.templates.password_recovery(user)?;
        self.deliver(mail).await
    }
}

/// Writes mails to the log instead of sending them.
pub struct LogNotifier {
    templates: MailTemplates,
}

impl LogNotifier {
    pub fn new(templates: MailTemplates) -> Self {
        Self { templates }
    }

    /// The body carries live verify tokens and only goes to the `debug` level.
    fn log(mail: &Mail) {
        log::warn!("{}", Self::summary(mail));
        log::debug!("unsent mail body for {}:\n{}", mail.to, mail.body);
    }

    fn summary(mail: &Mail) -> String {
        format!(
            "SMTP is not configured, mail to {} not sent. Subject: {}",
            mail.to, mail.subject
        )
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_confirmation(&self, user: &User) -> Result<(), AppError> {
        Self::log(&self.templates.confirmation(user)?);
        Ok(())
    }

    async fn send_password_recovery(&self, user: &User) -> Result<(), AppError> {
        Self::log(&self.templates.password_recovery(user)?);
        Ok(())
    }
}
