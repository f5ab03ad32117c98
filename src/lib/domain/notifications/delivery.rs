//! Delivery selection: how to reach the SMTP server and how to authenticate

use std::{convert::Infallible, fmt, str::FromStr};

use thiserror::Error;

/// SMTP server address and credentials
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SmtpEndpoint {
    /// The SMTP host
    pub host: String,

    /// The SMTP port
    pub port: String,

    /// The SMTP username
    pub username: Option<String>,

    /// The SMTP password
    pub password: Option<String>,
}

impl SmtpEndpoint {
    /// Whether both host and port are set
    pub fn is_complete(&self) -> bool {
        !self.host.is_empty() && !self.port.is_empty()
    }
}

/// The configured send type
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SendType {
    /// No transport encryption
    Plain,

    /// Plaintext connection upgraded with STARTTLS
    #[default]
    StartTls,

    /// TLS from the first byte
    Tls,

    /// Any other value. Delivered as [`SendType::Plain`].
    Unrecognized(String),
}

impl SendType {
    /// The transport strategy this send type resolves to
    pub fn mode(&self) -> TransportMode {
        match self {
            SendType::StartTls => TransportMode::StartTls,
            SendType::Tls => TransportMode::Tls,
            SendType::Plain | SendType::Unrecognized(_) => TransportMode::Plain,
        }
    }
}

impl FromStr for SendType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "plain" => SendType::Plain,
            "starttls" => SendType::StartTls,
            "tls" => SendType::Tls,
            _ => SendType::Unrecognized(s.to_string()),
        })
    }
}

impl fmt::Display for SendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendType::Unrecognized(raw) => write!(f, "{raw}"),
            other => write!(f, "{}", other.mode()),
        }
    }
}

/// The three ways of talking to the SMTP server
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportMode {
    /// No transport encryption
    Plain,

    /// STARTTLS upgrade
    StartTls,

    /// Implicit TLS
    Tls,
}

impl TransportMode {
    /// Whether the session is encrypted before authentication
    pub fn is_encrypted(&self) -> bool {
        !matches!(self, TransportMode::Plain)
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Plain => write!(f, "Plain"),
            TransportMode::StartTls => write!(f, "StartTLS"),
            TransportMode::Tls => write!(f, "TLS"),
        }
    }
}

/// The configured authentication type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthType {
    /// Anonymous session. Also used for empty and unknown values.
    #[default]
    None,

    /// The PLAIN mechanism
    PlainAuth,

    /// The LOGIN mechanism
    LoginAuth,
}

impl FromStr for AuthType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "plainauth" => AuthType::PlainAuth,
            "loginauth" => AuthType::LoginAuth,
            _ => AuthType::None,
        })
    }
}

/// Transport settings
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportConfig {
    /// Name checked against the server certificate
    pub server_name: String,

    /// Accept invalid certificates
    pub skip_verify: bool,

    /// How to connect
    pub send_type: SendType,

    /// How to authenticate
    pub auth_type: AuthType,
}

/// Errors raised by an authenticator
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// PLAIN over a plaintext connection to a remote host
    #[error("unencrypted connection")]
    UnencryptedConnection,

    /// The server is not the host the credentials are bound to
    #[error("wrong host name")]
    WrongHostName,

    /// The server sent a challenge the mechanism does not understand
    #[error("unexpected server challenge {0:?}")]
    UnexpectedChallenge(String),
}

/// What the authenticator knows about the server it is talking to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerInfo {
    /// The server name
    pub name: String,

    /// Whether the session is encrypted
    pub tls: bool,
}

/// The SASL mechanism an authenticator speaks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mechanism {
    /// PLAIN
    Plain,

    /// LOGIN
    Login,
}

/// PLAIN credentials bound to a host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlainAuth {
    identity: String,
    username: String,
    password: String,
    host: String,
}

impl PlainAuth {
    /// Creates a PLAIN authenticator that only talks to `host`
    pub fn new(identity: &str, username: &str, password: &str, host: &str) -> Self {
        Self {
            identity: identity.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            host: host.to_string(),
        }
    }

    /// Returns the initial response, or refuses to send credentials to `server`.
    pub fn start(&self, server: &ServerInfo) -> Result<String, AuthError> {
        if !server.tls && !is_localhost(&server.name) {
            return Err(AuthError::UnencryptedConnection);
        }

        if server.name != self.host {
            return Err(AuthError::WrongHostName);
        }

        Ok(format!(
            "{}\0{}\0{}",
            self.identity, self.username, self.password
        ))
    }
}

fn is_localhost(name: &str) -> bool {
    matches!(name, "localhost" | "127.0.0.1" | "::1")
}

/// LOGIN credentials, answered one prompt at a time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginAuth {
    username: String,
    password: String,
}

impl LoginAuth {
    /// Creates a LOGIN authenticator
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Answers one server challenge: the username prompt (or an empty challenge) gets the
    /// username, the password prompt gets the password.
    pub fn respond(&self, challenge: &str) -> Result<&str, AuthError> {
        match challenge.trim().to_lowercase().as_str() {
            "" | "username:" | "username" | "user name" => Ok(&self.username),
            "password:" | "password" => Ok(&self.password),
            _ => Err(AuthError::UnexpectedChallenge(challenge.to_string())),
        }
    }
}

/// An authenticator for the SMTP session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Authenticator {
    /// PLAIN
    Plain(PlainAuth),

    /// LOGIN
    Login(LoginAuth),
}

impl Authenticator {
    /// The mechanism to negotiate
    pub fn mechanism(&self) -> Mechanism {
        match self {
            Authenticator::Plain(_) => Mechanism::Plain,
            Authenticator::Login(_) => Mechanism::Login,
        }
    }

    /// The username to authenticate as
    pub fn username(&self) -> &str {
        match self {
            Authenticator::Plain(auth) => &auth.username,
            Authenticator::Login(auth) => &auth.username,
        }
    }

    /// The password to authenticate with
    pub fn password(&self) -> &str {
        match self {
            Authenticator::Plain(auth) => &auth.password,
            Authenticator::Login(auth) => &auth.password,
        }
    }

    /// Checks the authenticator is willing to run against `server`
    pub fn authorize(&self, server: &ServerInfo) -> Result<(), AuthError> {
        match self {
            Authenticator::Plain(auth) => auth.start(server).map(|_| ()),
            Authenticator::Login(_) => Ok(()),
        }
    }
}

/// Picks the authenticator for `auth_type`. [`AuthType::None`] yields an anonymous session.
pub fn select_auth(auth_type: AuthType, endpoint: &SmtpEndpoint) -> Option<Authenticator> {
    let username = endpoint.username.as_deref().unwrap_or_default();
    let password = endpoint.password.as_deref().unwrap_or_default();

    match auth_type {
        AuthType::PlainAuth => Some(Authenticator::Plain(PlainAuth::new(
            "",
            username,
            password,
            &endpoint.host,
        ))),
        AuthType::LoginAuth => Some(Authenticator::Login(LoginAuth::new(username, password))),
        AuthType::None => None,
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn endpoint() -> SmtpEndpoint {
        SmtpEndpoint {
            host: "smtphost.com".to_string(),
            port: "587".to_string(),
            username: Some("u".to_string()),
            password: Some("p".to_string()),
        }
    }

    #[test]
    fn test_send_type_dispatch() -> TestResult {
        assert_eq!("StartTLS".parse::<SendType>()?.mode(), TransportMode::StartTls);
        assert_eq!("starttls".parse::<SendType>()?.mode(), TransportMode::StartTls);
        assert_eq!("TLS".parse::<SendType>()?.mode(), TransportMode::Tls);
        assert_eq!("Plain".parse::<SendType>()?.mode(), TransportMode::Plain);
        assert_eq!("smoke-signal".parse::<SendType>()?.mode(), TransportMode::Plain);
        assert_eq!("".parse::<SendType>()?.mode(), TransportMode::Plain);

        Ok(())
    }

    #[test]
    fn test_unrecognized_send_type_keeps_raw_value() -> TestResult {
        let send_type = "SSL".parse::<SendType>()?;

        assert_eq!(send_type, SendType::Unrecognized("SSL".to_string()));
        assert_eq!(send_type.to_string(), "SSL");

        Ok(())
    }

    #[test]
    fn test_default_send_type_is_starttls() {
        assert_eq!(SendType::default().mode(), TransportMode::StartTls);
    }

    #[test]
    fn test_auth_type_parsing() -> TestResult {
        assert_eq!("PlainAuth".parse::<AuthType>()?, AuthType::PlainAuth);
        assert_eq!("LOGINAUTH".parse::<AuthType>()?, AuthType::LoginAuth);
        assert_eq!("".parse::<AuthType>()?, AuthType::None);
        assert_eq!("cram-md5".parse::<AuthType>()?, AuthType::None);

        Ok(())
    }

    #[test]
    fn test_select_no_auth() {
        assert_eq!(select_auth(AuthType::None, &endpoint()), None);
    }

    #[test]
    fn test_select_plain_auth() {
        let auth = select_auth(AuthType::PlainAuth, &endpoint());

        assert_eq!(
            auth,
            Some(Authenticator::Plain(PlainAuth::new("", "u", "p", "smtphost.com")))
        );
    }

    #[test]
    fn test_login_auth_challenge_sequence() -> TestResult {
        let login = match select_auth("LoginAuth".parse()?, &endpoint()) {
            Some(Authenticator::Login(login)) => login,
            other => panic!("expected a LOGIN authenticator, got {other:?}"),
        };

        assert_eq!(login.respond("Username:")?, "u");
        assert_eq!(login.respond("Password:")?, "p");
        assert_eq!(login.respond("")?, "u");
        assert_eq!(
            login.respond("Account:"),
            Err(AuthError::UnexpectedChallenge("Account:".to_string()))
        );

        Ok(())
    }

    #[test]
    fn test_missing_credentials_are_empty() {
        let endpoint = SmtpEndpoint {
            username: None,
            password: None,
            ..endpoint()
        };

        let auth = select_auth(AuthType::LoginAuth, &endpoint);

        assert_eq!(auth.as_ref().map(Authenticator::username), Some(""));
        assert_eq!(auth.as_ref().map(Authenticator::password), Some(""));
    }

    #[test]
    fn test_plain_auth_initial_response() -> TestResult {
        let auth = PlainAuth::new("", "u", "p", "smtphost.com");
        let server = ServerInfo {
            name: "smtphost.com".to_string(),
            tls: true,
        };

        assert_eq!(auth.start(&server)?, "\0u\0p");

        Ok(())
    }

    #[test]
    fn test_plain_auth_refuses_unencrypted_remote() {
        let auth = PlainAuth::new("", "u", "p", "smtphost.com");
        let server = ServerInfo {
            name: "smtphost.com".to_string(),
            tls: false,
        };

        assert_eq!(auth.start(&server), Err(AuthError::UnencryptedConnection));
    }

    #[test]
    fn test_plain_auth_allows_unencrypted_localhost() {
        let auth = PlainAuth::new("", "u", "p", "localhost");
        let server = ServerInfo {
            name: "localhost".to_string(),
            tls: false,
        };

        assert!(auth.start(&server).is_ok());
    }

    #[test]
    fn test_plain_auth_refuses_other_host() {
        let auth = PlainAuth::new("", "u", "p", "smtphost.com");
        let server = ServerInfo {
            name: "evil.com".to_string(),
            tls: true,
        };

        assert_eq!(auth.start(&server), Err(AuthError::WrongHostName));
    }

    #[test]
    fn test_login_auth_authorizes_any_server() -> TestResult {
        let auth = Authenticator::Login(LoginAuth::new("u", "p"));
        let server = ServerInfo {
            name: "smtphost.com".to_string(),
            tls: false,
        };

        auth.authorize(&server)?;
        assert_eq!(auth.mechanism(), Mechanism::Login);

        Ok(())
    }
}
