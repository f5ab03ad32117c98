//! Email and build parameters passed to the plugin

use std::path::PathBuf;

use clap::Parser;

use crate::domain::notifications::{split_addresses, BuildTimestamps, EmailMessage, Notification};

/// Email parameters
#[derive(Clone, Debug, Default, Parser)]
pub struct EmailParameters {
    /// From address
    #[clap(long, env = "PARAMETER_FROM")]
    pub from: Option<String>,

    /// Sender address (overrides from for transmission)
    #[clap(long, env = "PARAMETER_SENDER")]
    pub sender: Option<String>,

    /// Addresses to reply to
    #[clap(long = "replyto", env = "PARAMETER_REPLYTO", value_delimiter = ',')]
    pub reply_to: Vec<String>,

    /// Recipient addresses
    #[clap(long, env = "PARAMETER_TO", value_delimiter = ',')]
    pub to: Vec<String>,

    /// Carbon copy addresses
    #[clap(long, env = "PARAMETER_CC", value_delimiter = ',')]
    pub cc: Vec<String>,

    /// Blind carbon copy addresses
    #[clap(long, env = "PARAMETER_BCC", value_delimiter = ',')]
    pub bcc: Vec<String>,

    /// Subject template
    #[clap(long, env = "PARAMETER_SUBJECT")]
    pub subject: Option<String>,

    /// Plain text body template
    #[clap(long, env = "PARAMETER_TEXT")]
    pub text: Option<String>,

    /// HTML body template
    #[clap(long, env = "PARAMETER_HTML")]
    pub html: Option<String>,

    /// Addresses asking for delivery and read notifications
    #[clap(long = "readreceipt", env = "PARAMETER_READRECEIPT", value_delimiter = ',')]
    pub read_receipt: Vec<String>,

    /// File to attach to the email
    #[clap(long, env = "PARAMETER_ATTACHMENT")]
    pub attachment: Option<PathBuf>,

    /// File holding a pre-formatted message (To, From, Subject, body...)
    #[clap(long, env = "PARAMETER_FILENAME")]
    pub filename: Option<PathBuf>,
}

impl EmailParameters {
    /// Builds the notification request
    pub fn notification(self) -> Notification {
        Notification {
            message: EmailMessage {
                to: split_addresses(self.to),
                cc: split_addresses(self.cc),
                bcc: split_addresses(self.bcc),
                reply_to: split_addresses(self.reply_to),
                from: self.from.unwrap_or_default(),
                sender: self.sender.filter(|sender| !sender.is_empty()),
                subject: self.subject.unwrap_or_default(),
                text: self.text.unwrap_or_default(),
                html: self.html.unwrap_or_default(),
                read_receipt: split_addresses(self.read_receipt),
            },
            attachment: non_empty(self.attachment),
            source_file: non_empty(self.filename),
        }
    }
}

fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|path| !path.as_os_str().is_empty())
}

/// Build timestamps, in Unix epoch seconds
#[derive(Clone, Debug, Default, Parser)]
pub struct BuildConfig {
    /// When the build was created
    #[clap(long = "build-created", env = "VELA_BUILD_CREATED", default_value_t = 0)]
    pub created: i64,

    /// When the build was enqueued
    #[clap(long = "build-enqueued", env = "VELA_BUILD_ENQUEUED", default_value_t = 0)]
    pub enqueued: i64,

    /// When the build finished
    #[clap(long = "build-finished", env = "VELA_BUILD_FINISHED", default_value_t = 0)]
    pub finished: i64,

    /// When the build started
    #[clap(long = "build-started", env = "VELA_BUILD_STARTED", default_value_t = 0)]
    pub started: i64,
}

impl From<&BuildConfig> for BuildTimestamps {
    fn from(config: &BuildConfig) -> Self {
        Self {
            created: config.created,
            enqueued: config.enqueued,
            finished: config.finished,
            started: config.started,
        }
    }
}
