//! Notification service: validates, composes and sends one build notification

use std::{path::PathBuf, sync::Arc};

use tracing::{debug, info, warn};

use crate::domain::notifications::{
    assembler::validate,
    delivery::{select_auth, SendType, SmtpEndpoint, TransportConfig},
    environment::EnvironmentTable,
    errors::NotificationError,
    mailer::{Mailer, OutgoingEmail},
    message::EmailMessage,
    template::{render, Escape},
};

/// A notification request built from parameters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Notification {
    /// The message built from parameters
    pub message: EmailMessage,

    /// A file to attach, if any
    pub attachment: Option<PathBuf>,

    /// A pre-formatted message that replaces `message`, if any
    pub source_file: Option<PathBuf>,
}

/// Notification service
pub trait NotificationService {
    /// Validates, composes and sends a notification.
    ///
    /// # Arguments
    /// * `notification` - The [`Notification`] to send.
    ///
    /// # Returns
    /// A [`Result`] which is [`Ok`] once the message has been handed to the SMTP server,
    /// or an [`Err`] containing the first [`NotificationError`] encountered. Nothing is
    /// sent unless composition fully succeeds.
    fn notify(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Notification service implementation
#[derive(Debug, Clone)]
pub struct NotificationServiceImpl<M>
where
    M: Mailer,
{
    mailer: Arc<M>,
    environment: EnvironmentTable,
    endpoint: SmtpEndpoint,
    transport: TransportConfig,
}

impl<M> NotificationServiceImpl<M>
where
    M: Mailer,
{
    /// Creates a new notification service.
    pub fn new(
        mailer: Arc<M>,
        environment: EnvironmentTable,
        endpoint: SmtpEndpoint,
        transport: TransportConfig,
    ) -> Self {
        Self {
            mailer,
            environment,
            endpoint,
            transport,
        }
    }

    /// Renders the subject and the active body. HTML bodies are CSS-inlined.
    pub fn compose(&self, mut message: EmailMessage) -> Result<EmailMessage, NotificationError> {
        debug!("Parsing Subject...");

        message.subject = render(&message.subject, &self.environment, Escape::None)
            .map_err(|err| NotificationError::template("subject", err))?
            .trim()
            .to_string();

        if !message.html.is_empty() {
            debug!("Parsing HTML...");

            let html = render(&message.html, &self.environment, Escape::Html)
                .map_err(|err| NotificationError::template("html", err))?;

            debug!("Parsing CSS...");

            message.html = css_inline::inline(&html)?;
        } else {
            debug!("Parsing Text...");

            message.text = render(&message.text, &self.environment, Escape::None)
                .map_err(|err| NotificationError::template("text", err))?;
        }

        Ok(message)
    }
}

impl<M> NotificationService for NotificationServiceImpl<M>
where
    M: Mailer,
{
    fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        let message = validate(
            notification.message,
            notification.attachment.as_deref(),
            notification.source_file.as_deref(),
            &self.endpoint,
        )?;

        let message = self.compose(message)?;

        let auth = select_auth(self.transport.auth_type, &self.endpoint);

        match &auth {
            Some(auth) => info!("Using {:?} authentication...", auth.mechanism()),
            None => info!("Using no login authentication..."),
        }

        if let SendType::Unrecognized(raw) = &self.transport.send_type {
            warn!("unrecognized send type {raw:?}, sending without transport encryption");
        }

        info!("Sending email with {}...", self.transport.send_type.mode());

        let email = OutgoingEmail {
            message,
            attachment: notification.attachment,
            auth,
        };

        self.mailer.send(&email, &self.endpoint, &self.transport)?;

        Ok(())
    }
}
