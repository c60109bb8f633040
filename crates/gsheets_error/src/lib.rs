use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

pub type Result<T, E = SheetsError> = std::result::Result<T, E>;

/// Classification of an error.
///
/// Every kind is fatal to the statement that produced it. Nothing in the
/// workspace retries on any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Spreadsheet ID or URL could not be parsed.
    InvalidReference,
    /// Sheet lookup by gid or title missed.
    SheetNotFound,
    /// Connection, TLS, or IO failure while talking to the remote.
    Transport,
    /// Response body could not be decoded into any expected shape.
    MalformedResponse,
    /// The remote reported an error.
    Api { code: i64, message: String },
    /// A value could not be converted to or from a cell.
    TypeCast,
    /// Missing or unusable credentials.
    Credentials,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidReference => write!(f, "Invalid reference"),
            Self::SheetNotFound => write!(f, "Sheet not found"),
            Self::Transport => write!(f, "Transport error"),
            Self::MalformedResponse => write!(f, "Malformed response"),
            Self::Api { code, .. } => write!(f, "API error {code}"),
            Self::TypeCast => write!(f, "Type cast error"),
            Self::Credentials => write!(f, "Credentials error"),
            Self::Other => write!(f, "Error"),
        }
    }
}

#[derive(Debug)]
pub struct SheetsError {
    inner: Box<SheetsErrorInner>,
}

#[derive(Debug)]
struct SheetsErrorInner {
    kind: ErrorKind,
    msg: String,
    source: Option<Box<dyn Error + Send + Sync>>,
    fields: Vec<(Cow<'static, str>, String)>,
    backtrace: Backtrace,
}

impl SheetsError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Other, msg)
    }

    pub fn with_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        SheetsError {
            inner: Box::new(SheetsErrorInner {
                kind,
                msg: msg.into(),
                source: None,
                fields: Vec::new(),
                backtrace: Backtrace::capture(),
            }),
        }
    }

    pub fn with_source(msg: impl Into<String>, source: Box<dyn Error + Send + Sync>) -> Self {
        let mut err = Self::new(msg);
        err.inner.source = Some(source);
        err
    }

    pub fn invalid_reference(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::InvalidReference, msg)
    }

    pub fn sheet_not_found(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::SheetNotFound, msg)
    }

    pub fn transport(msg: impl Into<String>, source: Box<dyn Error + Send + Sync>) -> Self {
        Self::with_source(msg, source).set_kind(ErrorKind::Transport)
    }

    pub fn malformed_response(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::MalformedResponse, msg)
    }

    /// Error reported by the remote API.
    pub fn api(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        let msg = format!("Spreadsheet API error: {code} - {message}");
        Self::with_kind(ErrorKind::Api { code, message }, msg)
    }

    pub fn type_cast(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::TypeCast, msg)
    }

    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Credentials, msg)
    }

    /// Override the kind of this error.
    pub fn set_kind(mut self, kind: ErrorKind) -> Self {
        self.inner.kind = kind;
        self
    }

    /// Attach a key/value pair that's printed alongside the message.
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<Cow<'static, str>>,
        V: fmt::Display,
    {
        self.inner.fields.push((key.into(), value.to_string()));
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.inner.kind
    }

    pub fn message(&self) -> &str {
        &self.inner.msg
    }

    pub fn get_field(&self, key: &str) -> Option<&str> {
        self.inner
            .fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.inner.backtrace
    }
}

impl fmt::Display for SheetsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.msg)?;

        for (key, value) in &self.inner.fields {
            write!(f, "\n  {key}: {value}")?;
        }

        if let Some(source) = &self.inner.source {
            write!(f, "\nError source: {source}")?;
        }

        if self.inner.backtrace.status() == BacktraceStatus::Captured {
            write!(f, "\nBacktrace: {}", self.inner.backtrace)?;
        }

        Ok(())
    }
}

impl Error for SheetsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl From<fmt::Error> for SheetsError {
    fn from(value: fmt::Error) -> Self {
        SheetsError::with_source("Format error", Box::new(value))
    }
}

impl From<std::io::Error> for SheetsError {
    fn from(value: std::io::Error) -> Self {
        SheetsError::with_source("IO error", Box::new(value))
    }
}

/// An extension trait for adding context to the Error variant of a result.
pub trait ResultExt<T, E> {
    /// Wrap an error with a static context string.
    fn context(self, msg: &'static str) -> Result<T>;

    /// Wrap an error with a context string generated from a function.
    fn context_fn<F: Fn() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Error + Send + Sync + 'static> ResultExt<T, E> for std::result::Result<T, E> {
    fn context(self, msg: &'static str) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(SheetsError::with_source(msg, Box::new(e))),
        }
    }

    fn context_fn<F: Fn() -> String>(self, f: F) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(SheetsError::with_source(f(), Box::new(e))),
        }
    }
}

pub trait OptionExt<T> {
    /// Return an error if the option is None.
    fn required(self, msg: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, msg: &'static str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(SheetsError::new(format!("Missing required value: {msg}"))),
        }
    }
}
