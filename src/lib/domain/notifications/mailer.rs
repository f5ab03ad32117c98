//! Mailer port

use std::{io, path::PathBuf};

#[cfg(test)]
use mockall::mock;
use thiserror::Error;

use crate::domain::notifications::{
    delivery::{Authenticator, SmtpEndpoint, TransportConfig, TransportMode},
    message::EmailMessage,
};

/// Mailer errors
#[derive(Debug, Error)]
pub enum MailerError {
    /// Delivery over a plaintext connection failed
    #[error("error sending with Plain: {0}")]
    Plain(anyhow::Error),

    /// Delivery over a STARTTLS connection failed
    #[error("error sending with StartTLS: {0}")]
    StartTls(anyhow::Error),

    /// Delivery over an implicit TLS connection failed
    #[error("error sending with TLS: {0}")]
    Tls(anyhow::Error),

    /// An address could not be parsed
    #[error("invalid email address {0:?}")]
    InvalidAddress(String),

    /// The attachment could not be read
    #[error("could not read attachment {path:?}: {source}")]
    Attachment {
        /// The attachment
        path: PathBuf,

        /// The underlying error
        source: io::Error,
    },

    /// The message could not be built
    #[error("could not build message: {0}")]
    Build(anyhow::Error),
}

impl MailerError {
    /// Wraps a delivery failure with the transport mode it happened on
    pub fn transport(mode: TransportMode, err: impl Into<anyhow::Error>) -> Self {
        match mode {
            TransportMode::Plain => MailerError::Plain(err.into()),
            TransportMode::StartTls => MailerError::StartTls(err.into()),
            TransportMode::Tls => MailerError::Tls(err.into()),
        }
    }
}

/// A composed message ready for delivery
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// The composed message; its active body is sent
    pub message: EmailMessage,

    /// A file to attach, if any
    pub attachment: Option<PathBuf>,

    /// The authenticator for the session, or [`None`] for an anonymous one
    pub auth: Option<Authenticator>,
}

/// Delivers composed messages
pub trait Mailer: Send + Sync + 'static {
    /// Send an email
    ///
    /// # Arguments
    /// * `email` - The [`OutgoingEmail`] to deliver.
    /// * `endpoint` - The SMTP server to deliver to.
    /// * `transport` - How to connect to it.
    ///
    /// # Returns
    /// A [`Result`] indicating success or failure.
    fn send(
        &self,
        email: &OutgoingEmail,
        endpoint: &SmtpEndpoint,
        transport: &TransportConfig,
    ) -> Result<(), MailerError>;
}

#[cfg(test)]
mock! {
    pub Mailer {}

    impl Mailer for Mailer {
        fn send(
            &self,
            email: &OutgoingEmail,
            endpoint: &SmtpEndpoint,
            transport: &TransportConfig,
        ) -> Result<(), MailerError>;
    }
}
