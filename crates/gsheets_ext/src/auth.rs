//! Interactive authorization.
//!
//! The user is sent to a consent page, and pastes the resulting access token
//! back in.

use std::fmt::Debug;
use std::io::{BufRead, Write};

use gsheets_error::{Result, ResultExt, SheetsError};
use gsheets_http::credentials::SPREADSHEETS_SCOPE;
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::debug;
use url::Url;

pub const CONSENT_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080";

/// Length of the anti-forgery state parameter.
const STATE_LEN: usize = 10;

/// Produces a token through some out-of-band mechanism.
pub trait Authorizer: Debug {
    fn authorize(&mut self) -> Result<String>;
}

/// Prompts for a token after printing a consent url.
#[derive(Debug)]
pub struct InteractiveAuthorizer<R, I, O> {
    client_id: String,
    redirect_uri: String,
    rng: R,
    input: I,
    output: O,
}

impl<R, I, O> InteractiveAuthorizer<R, I, O>
where
    R: Rng + Debug,
    I: BufRead + Debug,
    O: Write + Debug,
{
    pub fn new(client_id: impl Into<String>, rng: R, input: I, output: O) -> Self {
        InteractiveAuthorizer {
            client_id: client_id.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            rng,
            input,
            output,
        }
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    /// Generate a random state string.
    pub fn generate_state(&mut self) -> String {
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(STATE_LEN)
            .map(char::from)
            .collect()
    }

    /// Build the consent url for the implicit grant flow.
    pub fn consent_url(&self, state: &str) -> Result<Url> {
        Url::parse_with_params(
            CONSENT_ENDPOINT,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "token"),
                ("scope", SPREADSHEETS_SCOPE),
                ("state", state),
            ],
        )
        .context("Failed to build consent url")
    }
}

impl<R, I, O> Authorizer for InteractiveAuthorizer<R, I, O>
where
    R: Rng + Debug,
    I: BufRead + Debug,
    O: Write + Debug,
{
    fn authorize(&mut self) -> Result<String> {
        let state = self.generate_state();
        let url = self.consent_url(&state)?;
        debug!(%state, "starting interactive authorization");

        writeln!(
            self.output,
            "Visit the following url to authorize access to your spreadsheets:\n\n{url}\n"
        )?;
        write!(self.output, "After granting access, paste the access token here: ")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;

        let token = line.trim();
        if token.is_empty() {
            return Err(SheetsError::credentials("No access token provided"));
        }

        Ok(token.to_string())
    }
}
