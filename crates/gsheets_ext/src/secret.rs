//! Sources of bearer tokens.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::path::{Path, PathBuf};

use gsheets_error::{Result, SheetsError};
use gsheets_http::client::HttpClient;
use gsheets_http::credentials::ServiceAccount;
use tracing::debug;

/// Supplies a bearer token for a named profile.
pub trait CredentialProvider: Sync + Send + Debug {
    /// Get a token for the profile.
    ///
    /// Errors with a credentials error if the profile isn't configured.
    fn get_token(&self, profile: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Tokens provided up front, keyed by profile.
#[derive(Clone, Default)]
pub struct StaticTokenProvider {
    tokens: HashMap<String, String>,
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("profiles", &self.tokens.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StaticTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, profile: impl Into<String>, token: impl Into<String>) -> Self {
        self.tokens.insert(profile.into(), token.into());
        self
    }
}

impl CredentialProvider for StaticTokenProvider {
    async fn get_token(&self, profile: &str) -> Result<String> {
        self.tokens.get(profile).cloned().ok_or_else(|| {
            SheetsError::credentials("No token configured for profile")
                .with_field("profile", profile)
        })
    }
}

/// Reads the token from the first line of a file on every request.
///
/// Serves every profile.
#[derive(Debug, Clone)]
pub struct TokenFileProvider {
    path: PathBuf,
}

impl TokenFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenFileProvider { path: path.into() }
    }
}

/// Read a token from the first line of a file.
pub fn read_token_file(path: &Path) -> Result<String> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        SheetsError::credentials("Unable to open token file")
            .with_field("path", path.display())
            .with_field("reason", e)
    })?;

    let token = contents.lines().next().unwrap_or_default().trim();
    if token.is_empty() {
        return Err(
            SheetsError::credentials("Token file is empty").with_field("path", path.display())
        );
    }

    Ok(token.to_string())
}

impl CredentialProvider for TokenFileProvider {
    async fn get_token(&self, profile: &str) -> Result<String> {
        debug!(%profile, path = %self.path.display(), "reading token file");
        read_token_file(&self.path)
    }
}

/// Mints a fresh access token from a service account key on every request.
///
/// Serves every profile.
#[derive(Debug, Clone)]
pub struct ServiceAccountProvider<C: HttpClient> {
    account: ServiceAccount,
    client: C,
}

impl<C> ServiceAccountProvider<C>
where
    C: HttpClient,
{
    pub fn new(account: ServiceAccount, client: C) -> Self {
        ServiceAccountProvider { account, client }
    }

    /// Load the service account key from a json file.
    pub fn try_from_key_file(path: &Path, client: C) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SheetsError::credentials("Unable to open service account key file")
                .with_field("path", path.display())
                .with_field("reason", e)
        })?;
        let account = ServiceAccount::try_from_str(&contents)?;
        Ok(Self::new(account, client))
    }
}

impl<C> CredentialProvider for ServiceAccountProvider<C>
where
    C: HttpClient,
{
    async fn get_token(&self, profile: &str) -> Result<String> {
        debug!(%profile, client_email = %self.account.client_email, "minting service account token");
        let token = self.account.fetch_access_token(&self.client).await?;
        Ok(token.access_token)
    }
}
