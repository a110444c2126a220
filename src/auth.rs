//! Session setup: cached token, validation, and credential fallback.
//!
//! A run starts with whatever token the [`TokenStore`] holds. If the sync
//! API rejects it (or there is none), the user is asked for their Paprika
//! email and password, a fresh token is obtained, and it is saved back for
//! next time. Failing to read or save the cached token is never fatal; a
//! failed login is.

use crate::api::{ApiError, PaprikaClient};
use crate::config::{APP_DIR, ApiConfig, CredentialsConfig};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Paprika rejected the login (HTTP {status})")]
    Rejected { status: u16 },
    #[error("Could not reach Paprika API: {0}")]
    Api(#[from] ApiError),
    #[error("Could not read credentials: {0}")]
    Prompt(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum TokenStoreError {
    #[error("No platform config directory to keep the token in")]
    NoConfigDir,
    #[error("No token stored")]
    Empty,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Persistence for the single bearer token under a (service, account) pair.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<String, TokenStoreError>;
    fn save(&self, token: &str) -> Result<(), TokenStoreError>;
}

/// Token kept in a user-only file under the platform config directory.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/paprika-export/<service>-<account>.token`
    pub fn for_credentials(credentials: &CredentialsConfig) -> Result<Self, TokenStoreError> {
        let dir = dirs::config_dir().ok_or(TokenStoreError::NoConfigDir)?;
        let filename = format!(
            "{}-{}.token",
            file_safe(&credentials.service),
            file_safe(&credentials.account)
        );
        Ok(Self::new(dir.join(APP_DIR).join(filename)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<String, TokenStoreError> {
        Ok(fs::read_to_string(&self.path)?.trim().to_string())
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        file.write_all(token.as_bytes())?;
        Ok(())
    }
}

/// Token held only for the lifetime of the process.
///
/// Used when there is nowhere to persist a token; every run then logs in.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<String, TokenStoreError> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(TokenStoreError::Empty)
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }
}

fn file_safe(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Paprika account login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Source of account credentials when no valid token is cached.
pub trait CredentialPrompt: Send + Sync {
    fn credentials(&self) -> io::Result<Credentials>;
}

/// Reads `PAPRIKA_EMAIL` / `PAPRIKA_PASSWORD`, falling back to asking on the
/// terminal for whichever is missing. The password is read without echo.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl StdinPrompt {
    fn ask(label: &str) -> io::Result<String> {
        let mut stderr = io::stderr();
        write!(stderr, "{label}: ")?;
        stderr.flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stdin closed while reading {label}"),
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl CredentialPrompt for StdinPrompt {
    fn credentials(&self) -> io::Result<Credentials> {
        gather_credentials(
            std::env::var("PAPRIKA_EMAIL").ok(),
            std::env::var("PAPRIKA_PASSWORD").ok(),
            Self::ask,
            |label| rpassword::prompt_password(format!("{label}: ")),
        )
    }
}

/// Fill in whichever credential is missing. The password only ever goes
/// through `ask_hidden`, which must not echo.
fn gather_credentials(
    email: Option<String>,
    password: Option<String>,
    ask: impl Fn(&str) -> io::Result<String>,
    ask_hidden: impl Fn(&str) -> io::Result<String>,
) -> io::Result<Credentials> {
    let email = match email {
        Some(email) => email,
        None => ask("Paprika sync email")?,
    };
    let password = match password {
        Some(password) => password,
        None => ask_hidden("Paprika sync password")?,
    };
    Ok(Credentials { email, password })
}

/// Produce a client holding a token the API accepts.
///
/// Tries the cached token first; on rejection logs in with prompted
/// credentials. The working token is written back to the store either way.
pub async fn authenticate(
    config: &ApiConfig,
    store: &dyn TokenStore,
    prompt: &dyn CredentialPrompt,
) -> Result<PaprikaClient, AuthError> {
    let cached = match store.load() {
        Ok(token) => token,
        Err(e) => {
            warn!("No cached Paprika token: {e}");
            String::new()
        }
    };

    let client = PaprikaClient::new(config, cached.as_str())?;
    let client = if client.token_is_valid().await? {
        debug!("Cached token accepted");
        client
    } else {
        if !cached.trim().is_empty() {
            warn!("Cached token no longer valid, getting new token via credentials");
        }
        let credentials = prompt.credentials()?;
        let token = client
            .login(&credentials.email, &credentials.password)
            .await
            .map_err(|e| match e {
                ApiError::Status { status, .. } => AuthError::Rejected { status },
                other => AuthError::Api(other),
            })?;
        info!("Logged in to Paprika as {}", credentials.email);
        client.with_token(token)
    };

    if let Err(e) = store.save(client.token()) {
        warn!("Could not save Paprika token: {e}");
    }
    Ok(client)
}
