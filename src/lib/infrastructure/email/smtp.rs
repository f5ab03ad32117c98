//! SMTP email service implementation

use std::{error::Error as StdError, fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{builder::BoolishValueParser, ArgAction, Parser};
use lettre::{
    message::{
        header::{ContentType, Header, HeaderName, HeaderValue},
        Attachment, Mailbox, MultiPart, SinglePart,
    },
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        client::{SmtpConnection, Tls, TlsParameters},
        extension::ClientId,
        response::Response,
    },
    Message, SmtpTransport, Transport,
};
use tracing::debug;

use crate::{
    domain::notifications::{
        self, AuthType, Authenticator, Body, EmailMessage, LoginAuth, Mailer, MailerError,
        OutgoingEmail, SendType, ServerInfo, SmtpEndpoint, TransportConfig, TransportMode,
        ADDRESS_SEPARATOR,
    },
    infrastructure::secrets,
};

const SMTP_TIMEOUT: Duration = Duration::from_secs(60);

const MAX_LOGIN_CHALLENGES: usize = 10;

/// SMTP configuration
#[derive(Clone, Debug, Default, Parser)]
pub struct SMTPConfig {
    /// The SMTP host
    #[clap(long, env = "PARAMETER_HOST")]
    pub host: Option<String>,

    /// The SMTP port
    #[clap(long, env = "PARAMETER_PORT")]
    pub port: Option<String>,

    /// The SMTP username
    #[clap(long, env = "PARAMETER_USERNAME")]
    pub username: Option<String>,

    /// The SMTP password
    #[clap(long, env = "PARAMETER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Skip verification of the server certificate
    #[clap(
        long = "skipverify",
        env = "PARAMETER_SKIPVERIFY",
        action = ArgAction::Set,
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    pub skip_verify: bool,

    /// How to connect: Plain, StartTLS or TLS
    #[clap(long = "sendtype", env = "PARAMETER_SENDTYPE", default_value = "StartTLS")]
    pub send_type: SendType,

    /// How to authenticate: PlainAuth or LoginAuth. Anything else authenticates nothing.
    #[clap(long = "auth", env = "PARAMETER_AUTH")]
    pub auth_type: Option<AuthType>,
}

impl SMTPConfig {
    /// The SMTP server, with credentials falling back to the plugin's secret files
    pub fn endpoint(&self) -> SmtpEndpoint {
        SmtpEndpoint {
            host: self.host.clone().unwrap_or_default(),
            port: self.port.clone().unwrap_or_default(),
            username: self
                .username
                .clone()
                .or_else(|| secrets::read_fallback("username")),
            password: self
                .password
                .clone()
                .or_else(|| secrets::read_fallback("password")),
        }
    }

    /// The transport settings
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            server_name: self.host.clone().unwrap_or_default(),
            skip_verify: self.skip_verify,
            send_type: self.send_type.clone(),
            auth_type: self.auth_type.unwrap_or_default(),
        }
    }
}

/// `Disposition-Notification-To` header, used to request read receipts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispositionNotificationTo(String);

impl Header for DispositionNotificationTo {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Disposition-Notification-To")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

/// SMTP mailer
#[derive(Debug, Default, Clone)]
pub struct SMTPMailer;

impl SMTPMailer {
    /// Create a new SMTP mailer
    pub fn new() -> Self {
        Self
    }

    /// Builds the lettre message for `email`
    pub fn message(&self, email: &OutgoingEmail) -> Result<Message, MailerError> {
        let message = &email.message;
        let mut builder = Message::builder().from(mailbox(&message.from)?);

        if let Some(sender) = message.sender.as_deref().filter(|s| !s.is_empty()) {
            builder = builder.sender(mailbox(sender)?);
        }

        for to in &message.to {
            builder = builder.to(mailbox(to)?);
        }

        for cc in &message.cc {
            builder = builder.cc(mailbox(cc)?);
        }

        for bcc in &message.bcc {
            builder = builder.bcc(mailbox(bcc)?);
        }

        for reply_to in &message.reply_to {
            builder = builder.reply_to(mailbox(reply_to)?);
        }

        if !message.read_receipt.is_empty() {
            builder = builder.header(DispositionNotificationTo(
                message.read_receipt.join(ADDRESS_SEPARATOR),
            ));
        }

        builder = builder.subject(message.subject.clone());

        let body = body_part(message);

        let built = match &email.attachment {
            Some(path) => builder.multipart(
                MultiPart::mixed()
                    .singlepart(body)
                    .singlepart(attachment_part(path)?),
            ),
            None => builder.singlepart(body),
        };

        built.map_err(|err| MailerError::Build(err.into()))
    }

    /// Builds the transport for the configured send type
    pub fn transport(
        &self,
        auth: Option<&Authenticator>,
        endpoint: &SmtpEndpoint,
        transport: &TransportConfig,
    ) -> Result<SmtpTransport> {
        let mode = transport.send_type.mode();
        let port = port(endpoint)?;

        let mut builder = SmtpTransport::builder_dangerous(&endpoint.host).port(port);

        builder = match mode {
            TransportMode::Plain => builder.tls(Tls::None),
            TransportMode::StartTls => builder.tls(Tls::Required(tls_parameters(transport)?)),
            TransportMode::Tls => builder.tls(Tls::Wrapper(tls_parameters(transport)?)),
        };

        if let Some(auth) = auth {
            auth.authorize(&ServerInfo {
                name: endpoint.host.clone(),
                tls: mode.is_encrypted(),
            })?;

            builder = builder
                .credentials(Credentials::new(
                    auth.username().to_string(),
                    auth.password().to_string(),
                ))
                .authentication(vec![mechanism(auth)]);
        }

        Ok(builder.build())
    }

    /// Delivers `message` over a session authenticated with LOGIN, answering the server's
    /// prompts with `login`
    pub fn send_with_login(
        &self,
        message: &Message,
        login: &LoginAuth,
        endpoint: &SmtpEndpoint,
        transport: &TransportConfig,
    ) -> Result<()> {
        let mode = transport.send_type.mode();
        let port = port(endpoint)?;
        let tls = match mode {
            TransportMode::Plain => None,
            TransportMode::StartTls | TransportMode::Tls => Some(tls_parameters(transport)?),
        };
        let hello = ClientId::default();

        let mut connection = SmtpConnection::connect(
            (endpoint.host.as_str(), port),
            Some(SMTP_TIMEOUT),
            &hello,
            tls.as_ref().filter(|_| mode == TransportMode::Tls),
            None,
        )?;

        if let (TransportMode::StartTls, Some(tls)) = (mode, &tls) {
            connection.starttls(tls, &hello)?;
        }

        authenticate_login(&mut connection, login)?;

        connection.send(message.envelope(), &message.formatted())?;
        connection.quit()?;

        Ok(())
    }
}

/// One command and its reply
pub trait SmtpDialogue {
    /// Writes `line`, CRLF included, and reads the reply. Negative replies are errors.
    fn exchange(&mut self, line: &str) -> Result<Response>;
}

impl SmtpDialogue for SmtpConnection {
    fn exchange(&mut self, line: &str) -> Result<Response> {
        Ok(self.command(line)?)
    }
}

/// Runs `AUTH LOGIN`, answering every 334 challenge with `login`.
///
/// A challenge `login` does not recognise cancels the exchange with `*`.
pub fn authenticate_login<D: SmtpDialogue>(dialogue: &mut D, login: &LoginAuth) -> Result<()> {
    let mut response = dialogue.exchange("AUTH LOGIN\r\n")?;
    let mut challenges = 0;

    while response.has_code(334) {
        if challenges == MAX_LOGIN_CHALLENGES {
            bail!("unexpected number of LOGIN challenges");
        }
        challenges += 1;

        let challenge = decode_challenge(&response)?;

        let answer = match login.respond(&challenge) {
            Ok(answer) => answer,
            Err(err) => {
                let _ = dialogue.exchange("*\r\n");

                return Err(err.into());
            }
        };

        response = dialogue.exchange(&format!("{}\r\n", STANDARD.encode(answer)))?;
    }

    Ok(())
}

fn decode_challenge(response: &Response) -> Result<String> {
    let encoded = response.first_word().unwrap_or_default();
    let decoded = STANDARD
        .decode(encoded)
        .with_context(|| format!("invalid LOGIN challenge {encoded:?}"))?;

    Ok(String::from_utf8_lossy(&decoded).into_owned())
}

impl Mailer for SMTPMailer {
    fn send(
        &self,
        email: &OutgoingEmail,
        endpoint: &SmtpEndpoint,
        transport: &TransportConfig,
    ) -> Result<(), MailerError> {
        let message = self.message(email)?;
        let mode = transport.send_type.mode();

        debug!(
            "connecting to {}:{} ({mode})",
            endpoint.host, endpoint.port
        );

        let result = match &email.auth {
            Some(Authenticator::Login(login)) => {
                self.send_with_login(&message, login, endpoint, transport)
            }
            auth => self
                .transport(auth.as_ref(), endpoint, transport)
                .and_then(|mailer| Ok(mailer.send(&message).map(|_| ())?)),
        };

        result.map_err(|err| MailerError::transport(mode, err))
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailerError> {
    address
        .trim()
        .parse()
        .map_err(|_| MailerError::InvalidAddress(address.to_string()))
}

fn body_part(message: &EmailMessage) -> SinglePart {
    match message.body() {
        Body::Html(html) => SinglePart::html(html.to_string()),
        Body::Text(text) => SinglePart::plain(text.to_string()),
    }
}

fn attachment_part(path: &Path) -> Result<SinglePart, MailerError> {
    let content = fs::read(path).map_err(|source| MailerError::Attachment {
        path: path.to_path_buf(),
        source,
    })?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());

    let content_type = ContentType::parse(
        mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str(),
    )
    .map_err(|err| MailerError::Build(err.into()))?;

    Ok(Attachment::new(filename).body(content, content_type))
}

fn port(endpoint: &SmtpEndpoint) -> Result<u16> {
    endpoint
        .port
        .parse()
        .with_context(|| format!("invalid smtp port {:?}", endpoint.port))
}

fn tls_parameters(transport: &TransportConfig) -> Result<TlsParameters> {
    Ok(TlsParameters::builder(transport.server_name.clone())
        .dangerous_accept_invalid_certs(transport.skip_verify)
        .build()?)
}

fn mechanism(auth: &Authenticator) -> Mechanism {
    match auth.mechanism() {
        notifications::Mechanism::Plain => Mechanism::Plain,
        notifications::Mechanism::Login => Mechanism::Login,
    }
}
