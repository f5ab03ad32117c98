//! Pre-formatted message files

use std::{fs, io, path::Path};

use mailparse::{DispositionType, MailHeaderMap, MailParseError, ParsedMail};
use thiserror::Error;

use crate::domain::notifications::message::{split_addresses, EmailMessage};

/// Errors that can occur while loading a source file
#[derive(Debug, Error)]
pub enum SourceFileError {
    /// The file could not be read
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The header block was never terminated by a blank line
    #[error("unexpected EOF")]
    UnexpectedEof,

    /// A header line that is neither `Name: value` nor a continuation
    #[error("malformed MIME header line: {0}")]
    MalformedHeader(String),

    /// The document is not a valid internet message
    #[error(transparent)]
    Parse(#[from] MailParseError),
}

/// Reads and parses the message stored at `path`
pub fn parse_source_file(path: &Path) -> Result<EmailMessage, SourceFileError> {
    parse_message(&fs::read(path)?)
}

/// Parses a raw internet message into a new [`EmailMessage`].
///
/// Address headers may hold several addresses joined by `", "`; they are split into
/// one entry per address.
pub fn parse_message(raw: &[u8]) -> Result<EmailMessage, SourceFileError> {
    if !has_header_terminator(raw) {
        return Err(SourceFileError::UnexpectedEof);
    }

    check_header_lines(raw)?;

    let parsed = mailparse::parse_mail(raw)?;
    let headers = &parsed.headers;

    let mut message = EmailMessage {
        to: split_addresses(headers.get_all_values("To")),
        cc: split_addresses(headers.get_all_values("Cc")),
        bcc: split_addresses(headers.get_all_values("Bcc")),
        reply_to: split_addresses(headers.get_all_values("Reply-To")),
        from: headers.get_first_value("From").unwrap_or_default(),
        sender: headers.get_first_value("Sender"),
        subject: headers.get_first_value("Subject").unwrap_or_default(),
        read_receipt: split_addresses(headers.get_all_values("Disposition-Notification-To")),
        ..Default::default()
    };

    collect_bodies(&parsed, false, &mut message)?;

    Ok(message)
}

fn check_header_lines(raw: &[u8]) -> Result<(), SourceFileError> {
    let raw = String::from_utf8_lossy(raw);

    for (index, line) in raw
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .take_while(|line| !line.is_empty())
        .enumerate()
    {
        let continuation = index > 0 && line.starts_with(|c: char| c == ' ' || c == '\t');

        let valid = continuation
            || line.split_once(':').is_some_and(|(name, _)| {
                !name.is_empty() && !name.contains(|c: char| c.is_whitespace())
            });

        if !valid {
            return Err(SourceFileError::MalformedHeader(line.to_string()));
        }
    }

    Ok(())
}

fn has_header_terminator(raw: &[u8]) -> bool {
    raw.starts_with(b"\n")
        || raw.starts_with(b"\r\n")
        || raw.windows(2).any(|window| window == b"\n\n")
        || raw.windows(3).any(|window| window == b"\n\r\n")
}

/// Depth-first: the first html part fills `html`. Inside a multipart only `text/plain`
/// fills `text`; a single-part document fills it whatever its type.
fn collect_bodies(
    part: &ParsedMail<'_>,
    nested: bool,
    message: &mut EmailMessage,
) -> Result<(), MailParseError> {
    let mimetype = part.ctype.mimetype.to_ascii_lowercase();

    if mimetype.starts_with("multipart/") {
        for subpart in &part.subparts {
            collect_bodies(subpart, true, message)?;
        }

        return Ok(());
    }

    if part.get_content_disposition().disposition == DispositionType::Attachment {
        return Ok(());
    }

    if mimetype == "text/html" {
        if message.html.is_empty() {
            message.html = part.get_body()?;
        }
    } else if (!nested || mimetype == "text/plain") && message.text.is_empty() {
        message.text = part.get_body()?;
    }

    Ok(())
}
