//! Message assembly and validation

use std::{fs, io, path::Path};

use tracing::{debug, info};

use crate::domain::notifications::{
    defaults::{DEFAULT_HTML_BODY, DEFAULT_SUBJECT},
    delivery::SmtpEndpoint,
    errors::NotificationError,
    message::{split_addresses, EmailMessage},
    source_file::parse_source_file,
};

/// Assembles the message to send and validates it.
///
/// When `source_file` is set, the message parsed from it replaces `message` entirely.
/// Checks run in a fixed order and stop at the first failure: source file, attachment,
/// recipient, sender, SMTP endpoint. Address lists are normalised first, so blank entries
/// never count as recipients. A valid message then gets the default subject and HTML body
/// templates where those are empty, and keeps only one body: HTML wins over text.
///
/// # Arguments
/// * `message` - The message built from parameters.
/// * `attachment` - A file to attach, if any.
/// * `source_file` - A pre-formatted message file, if any.
/// * `endpoint` - The SMTP server the message will be sent to.
///
/// # Returns
/// The assembled [`EmailMessage`], or the first [`NotificationError`] found.
pub fn validate(
    message: EmailMessage,
    attachment: Option<&Path>,
    source_file: Option<&Path>,
    endpoint: &SmtpEndpoint,
) -> Result<EmailMessage, NotificationError> {
    info!("Validating Parameters...");

    let mut message = match source_file {
        Some(path) => {
            check_file(path)?;
            debug!("loading message from {path:?}");
            parse_source_file(path)?
        }
        None => message,
    };

    if let Some(path) = attachment {
        check_file(path)?;
    }

    message.to = split_addresses(&message.to);
    message.cc = split_addresses(&message.cc);
    message.bcc = split_addresses(&message.bcc);
    message.reply_to = split_addresses(&message.reply_to);
    message.read_receipt = split_addresses(&message.read_receipt);

    if !message.has_recipient() {
        return Err(NotificationError::MissingRecipient);
    }

    if message.from.trim().is_empty() {
        return Err(NotificationError::MissingSender);
    }

    if !endpoint.is_complete() {
        return Err(NotificationError::MissingSmtpEndpoint);
    }

    if message.subject.is_empty() {
        message.subject = DEFAULT_SUBJECT.to_string();
    }

    if message.html.is_empty() && message.text.is_empty() {
        message.html = DEFAULT_HTML_BODY.to_string();
    }

    if !message.html.is_empty() {
        message.text.clear();
    }

    Ok(message)
}

fn check_file(path: &Path) -> Result<(), NotificationError> {
    let metadata = fs::metadata(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => NotificationError::FileNotFound(path.to_path_buf()),
        _ => NotificationError::Io {
            path: path.to_path_buf(),
            source: err,
        },
    })?;

    if metadata.len() == 0 {
        return Err(NotificationError::EmptyFile(path.to_path_buf()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;
    use testresult::TestResult;

    use super::*;
    use crate::domain::notifications::source_file::SourceFileError;

    fn message() -> EmailMessage {
        EmailMessage {
            to: vec!["one@mail.com".to_string()],
            from: "two@mail.com".to_string(),
            ..Default::default()
        }
    }

    fn endpoint() -> SmtpEndpoint {
        SmtpEndpoint {
            host: "smtphost.com".to_string(),
            port: "587".to_string(),
            username: Some("username".to_string()),
            password: Some("password".to_string()),
        }
    }

    fn file_with(contents: &str) -> TestResult<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;

        Ok(file)
    }

    #[test]
    fn test_validate_fills_defaults() -> TestResult {
        let message = validate(message(), None, None, &endpoint())?;

        assert_eq!(message.subject, DEFAULT_SUBJECT);
        assert_eq!(message.html, DEFAULT_HTML_BODY);
        assert!(message.text.is_empty());

        Ok(())
    }

    #[test]
    fn test_validate_keeps_given_fields() -> TestResult {
        let given = EmailMessage {
            to: vec!["one@gmail.com".to_string(), "two@comcast.net".to_string()],
            from: "three@email.com".to_string(),
            reply_to: vec!["first.last@email.com".to_string()],
            cc: vec!["first.last@email.com".to_string()],
            bcc: vec!["first.last@email.com".to_string()],
            subject: "subject".to_string(),
            text: "text".to_string(),
            sender: Some("sender@email.com".to_string()),
            read_receipt: vec!["three@email.com".to_string()],
            ..Default::default()
        };

        let message = validate(given.clone(), None, None, &endpoint())?;

        assert_eq!(message, given);

        Ok(())
    }

    #[test]
    fn test_validate_without_credentials() -> TestResult {
        let endpoint = SmtpEndpoint {
            username: None,
            password: None,
            ..endpoint()
        };

        validate(message(), None, None, &endpoint)?;

        Ok(())
    }

    #[test]
    fn test_missing_recipient() {
        let message = EmailMessage {
            to: vec![],
            ..message()
        };

        let result = validate(message, None, None, &endpoint());

        assert!(matches!(result, Err(NotificationError::MissingRecipient)));
    }

    #[test]
    fn test_blank_addresses_are_dropped() -> TestResult {
        let given = EmailMessage {
            to: vec!["".to_string(), "one@mail.com".to_string()],
            cc: vec![" ".to_string()],
            bcc: vec!["x@mail.com, y@mail.com".to_string()],
            ..message()
        };

        let message = validate(given, None, None, &endpoint())?;

        assert_eq!(message.to, vec!["one@mail.com"]);
        assert!(message.cc.is_empty());
        assert_eq!(message.bcc, vec!["x@mail.com", "y@mail.com"]);

        Ok(())
    }

    #[test]
    fn test_blank_recipients_are_missing_recipient() {
        let message = EmailMessage {
            to: vec!["".to_string(), "  ".to_string()],
            ..message()
        };

        let result = validate(message, None, None, &endpoint());

        assert!(matches!(result, Err(NotificationError::MissingRecipient)));
    }

    #[test]
    fn test_html_body_wins_over_text() -> TestResult {
        let given = EmailMessage {
            html: "<p>html</p>".to_string(),
            text: "text".to_string(),
            ..message()
        };

        let message = validate(given, None, None, &endpoint())?;

        assert_eq!(message.html, "<p>html</p>");
        assert!(message.text.is_empty());

        Ok(())
    }

    #[test]
    fn test_missing_recipient_wins_over_missing_endpoint() {
        let message = EmailMessage {
            to: vec!["".to_string()],
            from: String::new(),
            ..Default::default()
        };

        let result = validate(message, None, None, &SmtpEndpoint::default());

        assert!(matches!(result, Err(NotificationError::MissingRecipient)));
    }

    #[test]
    fn test_missing_sender() {
        let message = EmailMessage {
            from: String::new(),
            ..message()
        };

        let result = validate(message, None, None, &endpoint());

        assert!(matches!(result, Err(NotificationError::MissingSender)));
    }

    #[test]
    fn test_missing_host() {
        let endpoint = SmtpEndpoint {
            host: String::new(),
            ..endpoint()
        };

        let result = validate(message(), None, None, &endpoint);

        assert!(matches!(result, Err(NotificationError::MissingSmtpEndpoint)));
    }

    #[test]
    fn test_missing_port() {
        let endpoint = SmtpEndpoint {
            port: String::new(),
            ..endpoint()
        };

        let result = validate(message(), None, None, &endpoint);

        assert!(matches!(result, Err(NotificationError::MissingSmtpEndpoint)));
    }

    #[test]
    fn test_source_file_replaces_message() -> TestResult {
        let file = file_with(
            "To: file@mail.com, other@mail.com\n\
             From: sender@mail.com\n\
             Subject: From a file\n\
             \n\
             Body from a file\n",
        )?;

        let message = validate(message(), None, Some(file.path()), &endpoint())?;

        assert_eq!(message.to, vec!["file@mail.com", "other@mail.com"]);
        assert_eq!(message.from, "sender@mail.com");
        assert_eq!(message.subject, "From a file");
        assert!(message.text.starts_with("Body from a file"));
        assert!(message.html.is_empty());

        Ok(())
    }

    #[test]
    fn test_source_file_without_recipients_is_missing_recipient() -> TestResult {
        let file = file_with("From: sender@mail.com\n\nbody\n")?;

        let result = validate(message(), None, Some(file.path()), &endpoint());

        assert!(matches!(result, Err(NotificationError::MissingRecipient)));

        Ok(())
    }

    #[test]
    fn test_missing_source_file() {
        let result = validate(
            message(),
            None,
            Some(Path::new("testdata/doesnotexist.txt")),
            &endpoint(),
        );

        assert!(matches!(result, Err(NotificationError::FileNotFound(_))));
    }

    #[test]
    fn test_empty_source_file() -> TestResult {
        let file = NamedTempFile::new()?;

        let result = validate(message(), None, Some(file.path()), &endpoint());

        assert!(matches!(result, Err(NotificationError::EmptyFile(_))));

        Ok(())
    }

    #[test]
    fn test_malformed_source_file() -> TestResult {
        let file = file_with("To: one@mail.com\nFrom: two@mail.com")?;

        let result = validate(message(), None, Some(file.path()), &endpoint());

        assert!(matches!(
            result,
            Err(NotificationError::SourceFile(SourceFileError::UnexpectedEof))
        ));

        Ok(())
    }

    #[test]
    fn test_source_file_checked_before_recipient() {
        let result = validate(
            EmailMessage::default(),
            None,
            Some(Path::new("testdata/doesnotexist.txt")),
            &SmtpEndpoint::default(),
        );

        assert!(matches!(result, Err(NotificationError::FileNotFound(_))));
    }

    #[test]
    fn test_attachment_is_checked() -> TestResult {
        let attachment = file_with("build log")?;

        validate(message(), Some(attachment.path()), None, &endpoint())?;

        Ok(())
    }

    #[test]
    fn test_missing_attachment() {
        let result = validate(
            message(),
            Some(Path::new("testdata/doesnotexist.txt")),
            None,
            &endpoint(),
        );

        assert!(matches!(result, Err(NotificationError::FileNotFound(_))));
    }

    #[test]
    fn test_empty_attachment() -> TestResult {
        let attachment = NamedTempFile::new()?;

        let result = validate(message(), Some(attachment.path()), None, &endpoint());

        assert!(matches!(result, Err(NotificationError::EmptyFile(_))));

        Ok(())
    }

    #[test]
    fn test_attachment_alongside_source_file() -> TestResult {
        let source = file_with("To: file@mail.com\nFrom: sender@mail.com\n\nbody\n")?;
        let attachment = file_with("build log")?;

        let message = validate(
            EmailMessage::default(),
            Some(attachment.path()),
            Some(source.path()),
            &endpoint(),
        )?;

        assert_eq!(message.to, vec!["file@mail.com"]);

        Ok(())
    }
}
