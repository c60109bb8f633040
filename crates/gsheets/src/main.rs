mod commands;
mod credentials;
mod input;
mod output;

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use gsheets_error::{Result, ResultExt};
use gsheets_ext::auth::DEFAULT_REDIRECT_URI;
use gsheets_ext::config::DEFAULT_BATCH_SIZE;
use gsheets_http::transport::DEFAULT_API_HOST;

use crate::output::OutputFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LoggingFormat {
    Human,
    Json,
}

impl From<LoggingFormat> for logutil::LogFormat {
    fn from(value: LoggingFormat) -> Self {
        match value {
            LoggingFormat::Human => logutil::LogFormat::HumanReadable,
            LoggingFormat::Json => logutil::LogFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[clap(name = "gsheets", version, about = "Read and write spreadsheets")]
struct Arguments {
    /// Log verbosity. Repeat for more output.
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Format of log lines written to stderr.
    #[clap(long, value_enum, default_value_t = LoggingFormat::Human, global = true)]
    log_format: LoggingFormat,
    /// Access token to use for requests.
    #[clap(long, env = "GSHEETS_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,
    /// File containing an access token on its first line.
    #[clap(long, env = "GSHEETS_TOKEN_FILE", global = true)]
    token_file: Option<PathBuf>,
    /// Service account key used to mint access tokens.
    #[clap(long, env = "GSHEETS_SERVICE_ACCOUNT", global = true)]
    service_account: Option<PathBuf>,
    /// Host serving the spreadsheet API.
    #[clap(long, env = "GSHEETS_API_HOST", default_value = DEFAULT_API_HOST, global = true)]
    api_host: String,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the rows of a sheet.
    Read(ReadArgs),
    /// Replace the contents of a sheet with csv input.
    Write(WriteArgs),
    /// Mint an access token from a service account key.
    Token,
    /// Authorize interactively and print the pasted access token.
    Auth(AuthArgs),
}

#[derive(clap::Args, Debug)]
struct ReadArgs {
    /// Spreadsheet url or id.
    reference: String,
    /// Sheet name, overrides a gid in the url.
    #[clap(long)]
    sheet: Option<String>,
    /// A1 range within the sheet, e.g. `A1:C10`.
    #[clap(long)]
    range: Option<String>,
    /// Don't treat the first row as column names.
    #[clap(long)]
    no_header: bool,
    /// Max rows per batch.
    #[clap(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
    #[clap(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
}

#[derive(clap::Args, Debug)]
struct WriteArgs {
    /// Spreadsheet url or id.
    reference: String,
    /// Sheet name, overrides a gid in the url.
    #[clap(long)]
    sheet: Option<String>,
    /// Csv file to read. Reads stdin if omitted.
    #[clap(long)]
    input: Option<PathBuf>,
    /// Input has no header row, and no header row is written.
    #[clap(long)]
    no_header: bool,
    /// Max rows per append request.
    #[clap(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[derive(clap::Args, Debug)]
struct AuthArgs {
    /// OAuth client id.
    #[clap(long)]
    client_id: String,
    #[clap(long, default_value = DEFAULT_REDIRECT_URI)]
    redirect_uri: String,
}

fn log_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

fn main() {
    let args = Arguments::parse();
    logutil::configure_global_logger(log_level(args.verbose), args.log_format.into(), io::stderr);

    if let Err(err) = run(args) {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("gsheets_tokio")
        .build()
        .context("Failed to build tokio runtime")
}

fn run(args: Arguments) -> Result<()> {
    let runtime = build_runtime()?;
    let handle = runtime.handle().clone();

    runtime.block_on(commands::execute(args, handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_read() {
        let args = Arguments::try_parse_from([
            "gsheets",
            "read",
            "abc",
            "--sheet",
            "Data",
            "--no-header",
            "--format",
            "ndjson",
            "-vv",
        ])
        .unwrap();

        assert_eq!(2, args.verbose);
        match args.command {
            Command::Read(read) => {
                assert_eq!("abc", read.reference);
                assert_eq!(Some("Data".to_string()), read.sheet);
                assert!(read.no_header);
                assert_eq!(DEFAULT_BATCH_SIZE, read.batch_size);
                assert_eq!(OutputFormat::Ndjson, read.format);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_token_with_service_account() {
        let args =
            Arguments::try_parse_from(["gsheets", "token", "--service-account", "key.json"])
                .unwrap();
        assert!(matches!(args.command, Command::Token));
        assert_eq!(Some(PathBuf::from("key.json")), args.service_account);
    }

    #[test]
    fn runtime_builds() {
        let runtime = build_runtime().unwrap();
        assert_eq!(4, runtime.block_on(async { 2 + 2 }));
    }

    #[test]
    fn levels() {
        assert_eq!(tracing::Level::WARN, log_level(0));
        assert_eq!(tracing::Level::TRACE, log_level(5));
    }
}
