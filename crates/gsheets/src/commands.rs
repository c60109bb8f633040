use std::fs::File;
use std::io::{self, BufWriter};

use gsheets_core::scan::GridScanner;
use gsheets_error::{OptionExt, Result, ResultExt};
use gsheets_ext::GsheetsExtension;
use gsheets_ext::auth::{Authorizer, InteractiveAuthorizer};
use gsheets_ext::config::{DEFAULT_PROFILE, GsheetsConfig};
use gsheets_ext::copy_to::WriteOptions;
use gsheets_ext::read_gsheet::ScanOptions;
use gsheets_ext::secret::{CredentialProvider, ServiceAccountProvider};
use gsheets_http::client::HttpClient;
use gsheets_http::native::TokioWrappedHttpClient;
use tokio::runtime::Handle;
use tracing::info;

use crate::credentials::CliCredentials;
use crate::input::read_csv_grid;
use crate::output::RowWriter;
use crate::{Arguments, AuthArgs, Command, ReadArgs, WriteArgs};

type CliExtension = GsheetsExtension<TokioWrappedHttpClient, CliCredentials>;

pub async fn execute(args: Arguments, handle: Handle) -> Result<()> {
    let client = TokioWrappedHttpClient::try_new_unpooled(handle)?;

    match args.command {
        Command::Read(read_args) => {
            let ext = extension(
                client,
                args.token,
                args.token_file,
                args.service_account,
                args.api_host,
                read_args.batch_size,
            )?;
            read(&ext, read_args).await
        }
        Command::Write(write_args) => {
            let ext = extension(
                client,
                args.token,
                args.token_file,
                args.service_account,
                args.api_host,
                write_args.batch_size,
            )?;
            write(&ext, write_args).await
        }
        Command::Token => {
            let path = args
                .service_account
                .required("--service-account key file")?;
            let provider = ServiceAccountProvider::try_from_key_file(&path, client)?;
            let token = provider.get_token(DEFAULT_PROFILE).await?;
            println!("{token}");
            Ok(())
        }
        Command::Auth(auth_args) => auth(auth_args),
    }
}

fn extension(
    client: TokioWrappedHttpClient,
    token: Option<String>,
    token_file: Option<std::path::PathBuf>,
    service_account: Option<std::path::PathBuf>,
    api_host: String,
    batch_size: usize,
) -> Result<CliExtension> {
    let config = GsheetsConfig {
        api_host,
        batch_size: batch_size.max(1),
        ..Default::default()
    };
    let credentials = CliCredentials::try_new(
        &config.profile,
        token,
        token_file,
        service_account,
        client.clone(),
    )?;
    Ok(GsheetsExtension::new(client, credentials, config))
}

async fn read(ext: &CliExtension, args: ReadArgs) -> Result<()> {
    let options = ScanOptions {
        header: !args.no_header,
        sheet: args.sheet,
        range: args.range,
    };
    let mut scan = ext.open_scan(&args.reference, &options).await?;

    let stdout = BufWriter::new(io::stdout().lock());
    let mut writer = RowWriter::try_new(args.format, stdout, scan.schema())?;

    let mut rows = 0;
    while !scan.is_exhausted() {
        let batch = scan.scan_next(ext.config().batch_size)?;
        rows += batch.num_rows();
        writer.write_batch(&batch)?;
    }
    writer.finish()?;

    info!(%rows, sheet = %scan.sheet_title(), "read rows");

    Ok(())
}

async fn write<C, P>(ext: &GsheetsExtension<C, P>, args: WriteArgs) -> Result<()>
where
    C: HttpClient,
    P: CredentialProvider,
{
    let grid = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .context_fn(|| format!("Failed to open input file '{}'", path.display()))?;
            read_csv_grid(file)?
        }
        None => read_csv_grid(io::stdin().lock())?,
    };

    // Cells are written as the csv text, not reformatted through an inferred
    // type.
    let header = !args.no_header;
    let mut scanner = GridScanner::try_new_as_text(grid, header)?;
    let columns: Vec<String> = scanner.schema().names().map(str::to_string).collect();

    let options = WriteOptions {
        sheet: args.sheet,
        header,
    };
    let mut handle = ext.open_write(&args.reference, columns, &options).await?;
    if handle.columns().is_empty() {
        info!(sheet = %handle.session().sheet_name(), "input is empty, sheet cleared");
        return Ok(());
    }

    // Always write at least one batch so a header-only input still writes
    // its header row.
    let mut is_first = true;
    let mut rows = 0;
    loop {
        let batch = scanner.scan_next(ext.config().batch_size)?;
        rows += batch.num_rows();
        handle.write_batch(&batch, is_first).await?;
        is_first = false;

        if scanner.is_exhausted() {
            break;
        }
    }

    info!(%rows, sheet = %handle.session().sheet_name(), "wrote rows");

    Ok(())
}

fn auth(args: AuthArgs) -> Result<()> {
    let mut authorizer = InteractiveAuthorizer::new(
        args.client_id,
        rand::rng(),
        io::stdin().lock(),
        io::stderr(),
    )
    .with_redirect_uri(args.redirect_uri);

    let token = authorizer.authorize()?;
    println!("{token}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;

    use futures::executor::block_on;
    use gsheets_error::ErrorKind;
    use gsheets_ext::secret::StaticTokenProvider;
    use gsheets_http::testutil::{FakeSheetsApi, MockHttpClient};

    use super::*;

    fn setup() -> (FakeSheetsApi, GsheetsExtension<MockHttpClient, StaticTokenProvider>) {
        let api = FakeSheetsApi::new("abc", "tok");
        api.add_sheet(0, "Out", vec![vec!["stale".to_string()]]);
        let ext = GsheetsExtension::new(
            api.client(),
            StaticTokenProvider::new().with_token(DEFAULT_PROFILE, "tok"),
            GsheetsConfig {
                batch_size: 2,
                ..Default::default()
            },
        );
        (api, ext)
    }

    fn write_args(input: &Path, sheet: &str) -> WriteArgs {
        WriteArgs {
            reference: "abc".to_string(),
            sheet: Some(sheet.to_string()),
            input: Some(input.to_path_buf()),
            no_header: false,
            batch_size: 2,
        }
    }

    #[test]
    fn write_keeps_csv_text() {
        let (api, ext) = setup();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "zip,amount\n02134,1e3\n,TRUE\nn/a,7\n").unwrap();

        block_on(write(&ext, write_args(file.path(), "Out"))).unwrap();

        let expected: Vec<Vec<String>> = [
            ["zip", "amount"],
            ["02134", "1e3"],
            ["", "TRUE"],
            ["n/a", "7"],
        ]
        .iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect();
        assert_eq!(Some(expected), api.values("Out"));
    }

    #[test]
    fn write_unknown_sheet_leaves_sheets_untouched() {
        let (api, ext) = setup();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "a\n1\n").unwrap();

        let err = block_on(write(&ext, write_args(file.path(), "Missing"))).unwrap_err();
        assert_eq!(&ErrorKind::SheetNotFound, err.kind());
        assert_eq!(Some(vec![vec!["stale".to_string()]]), api.values("Out"));
    }
}
