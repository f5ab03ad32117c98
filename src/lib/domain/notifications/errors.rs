//! Error types for the notification pipeline

use std::{io, path::PathBuf};

use css_inline::InlineError;
use thiserror::Error;
use tracing::debug;

use crate::domain::notifications::{
    mailer::MailerError,
    source_file::SourceFileError,
    template::{ParseError, RenderError, TemplateError},
};

/// Errors that stop a notification from being sent
#[derive(Debug, Error)]
pub enum NotificationError {
    /// No `To` address
    #[error("missing email parameter: To")]
    MissingRecipient,

    /// No `From` address
    #[error("missing email parameter: From")]
    MissingSender,

    /// No SMTP host or port
    #[error("missing smtp parameter (host/port)")]
    MissingSmtpEndpoint,

    /// A referenced file does not exist
    #[error("file {0:?} does not exist")]
    FileNotFound(PathBuf),

    /// A referenced file is empty
    #[error("file {0:?} is empty")]
    EmptyFile(PathBuf),

    /// A referenced file could not be inspected
    #[error("could not read {path:?}: {source}")]
    Io {
        /// The file
        path: PathBuf,

        /// The underlying error
        source: io::Error,
    },

    /// The source file could not be parsed
    #[error(transparent)]
    SourceFile(#[from] SourceFileError),

    /// A template could not be parsed
    #[error("could not parse {field}: {source}")]
    TemplateParse {
        /// Which template failed
        field: &'static str,

        /// The underlying error
        source: ParseError,
    },

    /// A template could not be rendered
    #[error("could not render {field}: {source}")]
    TemplateRender {
        /// Which template failed
        field: &'static str,

        /// The underlying error
        source: RenderError,
    },

    /// CSS could not be inlined into the HTML body
    #[error("could not inline CSS: {0}")]
    CssInline(#[from] InlineError),

    /// The message could not be delivered
    #[error(transparent)]
    Mailer(#[from] MailerError),
}

impl NotificationError {
    /// Attaches the name of the failing template to a [`TemplateError`]
    pub fn template(field: &'static str, err: TemplateError) -> Self {
        debug!("TemplateError -> NotificationError ({field})");

        match err {
            TemplateError::Parse(source) => NotificationError::TemplateParse { field, source },
            TemplateError::Render(source) => NotificationError::TemplateRender { field, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_error_keeps_kind() {
        let parse = NotificationError::template(
            "subject",
            TemplateError::Parse(ParseError::EmptyAction { line: 1 }),
        );
        let render = NotificationError::template(
            "html",
            TemplateError::Render(RenderError::NoSuchField {
                line: 3,
                field: "Name".to_string(),
            }),
        );

        assert!(matches!(
            parse,
            NotificationError::TemplateParse {
                field: "subject",
                ..
            }
        ));
        assert!(matches!(
            render,
            NotificationError::TemplateRender { field: "html", .. }
        ));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            NotificationError::MissingRecipient.to_string(),
            "missing email parameter: To"
        );
        assert_eq!(
            NotificationError::MissingSmtpEndpoint.to_string(),
            "missing smtp parameter (host/port)"
        );
        assert_eq!(
            NotificationError::template(
                "subject",
                TemplateError::Parse(ParseError::UnclosedAction { line: 2 })
            )
            .to_string(),
            "could not parse subject: template: 2: unclosed action"
        );
    }
}
