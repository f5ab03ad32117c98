//! Email message

/// Separator used when several addresses share one header value
pub const ADDRESS_SEPARATOR: &str = ", ";

/// Email message
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmailMessage {
    /// The recipients of the email
    pub to: Vec<String>,

    /// Carbon copy recipients
    pub cc: Vec<String>,

    /// Blind carbon copy recipients
    pub bcc: Vec<String>,

    /// Addresses replies should go to
    pub reply_to: Vec<String>,

    /// The author of the email
    pub from: String,

    /// Overrides the transmitting mailbox when set
    pub sender: Option<String>,

    /// The subject of the email
    pub subject: String,

    /// The plain text body of the email
    pub text: String,

    /// The HTML body of the email
    pub html: String,

    /// Addresses asking for delivery and read notifications
    pub read_receipt: Vec<String>,
}

/// The body that is actually sent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Body<'a> {
    /// An HTML body
    Html(&'a str),

    /// A plain text body
    Text(&'a str),
}

impl EmailMessage {
    /// Returns the body to send. HTML wins when both are set.
    pub fn body(&self) -> Body<'_> {
        if self.html.is_empty() {
            Body::Text(&self.text)
        } else {
            Body::Html(&self.html)
        }
    }

    /// Whether the message has at least one non-blank recipient
    pub fn has_recipient(&self) -> bool {
        self.to.iter().any(|address| !address.trim().is_empty())
    }
}

/// Splits every value on [`ADDRESS_SEPARATOR`], dropping empty entries.
pub fn split_addresses<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .flat_map(|value| {
            value
                .as_ref()
                .split(ADDRESS_SEPARATOR)
                .map(str::trim)
                .filter(|address| !address.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}
