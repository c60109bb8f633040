use std::path::PathBuf;

use gsheets_error::{Result, SheetsError};
use gsheets_ext::secret::{
    CredentialProvider,
    ServiceAccountProvider,
    StaticTokenProvider,
    TokenFileProvider,
};
use gsheets_http::native::TokioWrappedHttpClient;

/// Credentials picked from the command line.
///
/// An explicit token wins over a token file, which wins over a service
/// account key.
#[derive(Debug)]
pub enum CliCredentials {
    Static(StaticTokenProvider),
    TokenFile(TokenFileProvider),
    ServiceAccount(ServiceAccountProvider<TokioWrappedHttpClient>),
    Missing,
}

impl CliCredentials {
    pub fn try_new(
        profile: &str,
        token: Option<String>,
        token_file: Option<PathBuf>,
        service_account: Option<PathBuf>,
        client: TokioWrappedHttpClient,
    ) -> Result<Self> {
        if let Some(token) = token {
            return Ok(CliCredentials::Static(
                StaticTokenProvider::new().with_token(profile, token),
            ));
        }
        if let Some(path) = token_file {
            return Ok(CliCredentials::TokenFile(TokenFileProvider::new(path)));
        }
        if let Some(path) = service_account {
            return Ok(CliCredentials::ServiceAccount(
                ServiceAccountProvider::try_from_key_file(&path, client)?,
            ));
        }
        Ok(CliCredentials::Missing)
    }
}

impl CredentialProvider for CliCredentials {
    async fn get_token(&self, profile: &str) -> Result<String> {
        match self {
            CliCredentials::Static(p) => p.get_token(profile).await,
            CliCredentials::TokenFile(p) => p.get_token(profile).await,
            CliCredentials::ServiceAccount(p) => p.get_token(profile).await,
            CliCredentials::Missing => Err(SheetsError::credentials(
                "Missing credentials, set --token, --token-file or --service-account",
            )),
        }
    }
}
