//! Build notifications: everything needed to turn build metadata into one sent email.

mod assembler;
mod defaults;
mod delivery;
mod environment;
mod mailer;
mod message;
mod service;
mod source_file;

pub mod errors;
pub mod template;

pub use assembler::validate;
pub use defaults::{DEFAULT_HTML_BODY, DEFAULT_SUBJECT};
pub use delivery::{
    select_auth, AuthError, AuthType, Authenticator, LoginAuth, Mechanism, PlainAuth,
    SendType, ServerInfo, SmtpEndpoint, TransportConfig, TransportMode,
};
pub use environment::{
    BuildEnv, BuildTimestamps, Environ, EnvironmentSource, EnvironmentTable, ProcessEnvironment,
    ENVIRONMENT_PREFIX,
};
pub use mailer::{Mailer, MailerError, OutgoingEmail};
pub use message::{split_addresses, Body, EmailMessage, ADDRESS_SEPARATOR};
pub use service::{Notification, NotificationService, NotificationServiceImpl};
pub use source_file::{parse_message, parse_source_file, SourceFileError};

#[cfg(test)]
pub mod tests {
    pub use super::mailer::MockMailer;
}
