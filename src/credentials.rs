//! Test identity resolution
//!
//! A [`Credentials`] value is resolved once at startup by [`CredentialLoader`]
//! from, in order:
//!
//! 1. a plaintext file of three lines: homeserver, username, password
//! 2. `MATRIX_HOMESERVER`, `MATRIX_USER_ID`, `MATRIX_ACCESS_TOKEN`,
//!    `MATRIX_DEVICE_ID`
//!
//! Loading never fails. Unreadable or short files fall through to the
//! environment, and an empty environment yields a value with only the
//! default homeserver set.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Environment variable holding the homeserver URL
pub const ENV_HOMESERVER: &str = "MATRIX_HOMESERVER";
/// Environment variable holding the full user id
pub const ENV_USER_ID: &str = "MATRIX_USER_ID";
/// Environment variable holding an existing access token
pub const ENV_ACCESS_TOKEN: &str = "MATRIX_ACCESS_TOKEN";
/// Environment variable holding the device id of that token
pub const ENV_DEVICE_ID: &str = "MATRIX_DEVICE_ID";

/// Where a credentials value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    File,
    Environment,
    /// Issued by the proxy during the run
    Session,
}

/// How the authentication scenario can proceed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPath {
    /// `POST /login` with username and password
    Login,
    /// `POST /restore_session` with user id and access token
    Restore,
}

/// Session values returned by a successful login
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub device_id: Option<String>,
    pub user_id: Option<String>,
}

/// One test identity
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub homeserver: String,
    pub username: Option<String>,
    #[serde(skip)]
    pub password: Option<String>,
    pub user_id: Option<String>,
    #[serde(skip)]
    pub access_token: Option<String>,
    pub device_id: Option<String>,
    pub source: CredentialSource,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("homeserver", &self.homeserver)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("user_id", &self.user_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("device_id", &self.device_id)
            .field("source", &self.source)
            .finish()
    }
}

impl Credentials {
    /// Credentials with only a homeserver, nothing to authenticate with
    pub fn anonymous(homeserver: impl Into<String>) -> Self {
        Self {
            homeserver: homeserver.into(),
            username: None,
            password: None,
            user_id: None,
            access_token: None,
            device_id: None,
            source: CredentialSource::Environment,
        }
    }

    /// Build credentials from a homeserver, username and password,
    /// deriving the user id.
    pub fn from_login(homeserver: &str, username: &str, password: &str) -> Self {
        Self {
            homeserver: homeserver.to_string(),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            user_id: Some(derive_user_id(username, homeserver)),
            access_token: None,
            device_id: None,
            source: CredentialSource::File,
        }
    }

    /// Which authentication path these credentials support
    ///
    /// An existing token is preferred over a password login.
    pub fn auth_path(&self) -> Option<AuthPath> {
        if has_value(&self.user_id) && has_value(&self.access_token) {
            Some(AuthPath::Restore)
        } else if has_value(&self.username) && has_value(&self.password) {
            Some(AuthPath::Login)
        } else {
            None
        }
    }

    /// New credentials carrying a freshly issued session
    ///
    /// Fields the session leaves unset keep their previous value.
    pub fn with_session(&self, session: Session) -> Self {
        Self {
            homeserver: self.homeserver.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            user_id: session.user_id.or_else(|| self.user_id.clone()),
            access_token: session.access_token.or_else(|| self.access_token.clone()),
            device_id: session.device_id.or_else(|| self.device_id.clone()),
            source: CredentialSource::Session,
        }
    }

    pub fn has_access_token(&self) -> bool {
        has_value(&self.access_token)
    }
}

fn has_value(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.is_empty())
}

/// Strip an `http://` or `https://` scheme (and trailing slashes) from a
/// homeserver URL to get the server name.
pub fn homeserver_domain(homeserver: &str) -> &str {
    let rest = homeserver
        .strip_prefix("https://")
        .or_else(|| homeserver.strip_prefix("http://"))
        .unwrap_or(homeserver);
    rest.trim_end_matches('/')
}

/// `@username:domain` unless the username is already a full user id
pub fn derive_user_id(username: &str, homeserver: &str) -> String {
    if username.starts_with('@') {
        username.to_string()
    } else {
        format!("@{}:{}", username, homeserver_domain(homeserver))
    }
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves [`Credentials`] from the file and environment sources
pub struct CredentialLoader {
    file: Option<PathBuf>,
    env: EnvLookup,
    default_homeserver: String,
}

impl CredentialLoader {
    /// Loader reading `file` and the process environment
    pub fn new(file: Option<PathBuf>, default_homeserver: impl Into<String>) -> Self {
        Self {
            file,
            env: Box::new(|key| std::env::var(key).ok()),
            default_homeserver: default_homeserver.into(),
        }
    }

    /// Replace the environment lookup
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Resolve credentials; never fails
    pub fn load(&self) -> Credentials {
        if let Some(path) = &self.file {
            match read_credential_file(path) {
                Ok(Some(creds)) => {
                    tracing::debug!("Loaded credentials from {}", path.display());
                    return creds;
                }
                Ok(None) => {
                    tracing::debug!(
                        "Credential file {} absent or incomplete, using environment",
                        path.display()
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Could not load credentials from {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }
        self.load_env()
    }

    fn load_env(&self) -> Credentials {
        let var = |key: &str| (self.env)(key).filter(|v| !v.trim().is_empty());
        Credentials {
            homeserver: var(ENV_HOMESERVER).unwrap_or_else(|| self.default_homeserver.clone()),
            username: None,
            password: None,
            user_id: var(ENV_USER_ID),
            access_token: var(ENV_ACCESS_TOKEN),
            device_id: var(ENV_DEVICE_ID),
            source: CredentialSource::Environment,
        }
    }
}

/// Read a three-line credential file
///
/// Returns `Ok(None)` when the file does not exist or has fewer than three
/// non-blank lines.
fn read_credential_file(path: &Path) -> std::io::Result<Option<Credentials>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(parse_credential_lines(&content))
}

fn parse_credential_lines(content: &str) -> Option<Credentials> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    match lines.as_slice() {
        [homeserver, username, password, ..] => {
            Some(Credentials::from_login(homeserver, username, password))
        }
        _ => None,
    }
}
