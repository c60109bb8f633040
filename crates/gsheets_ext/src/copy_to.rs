use gsheets_core::arrays::batch::Batch;
use gsheets_core::grid::{MajorDimension, decode_response};
use gsheets_core::values::{ValueRange, batch_to_values};
use gsheets_error::{Result, SheetsError};
use gsheets_http::client::HttpClient;
use gsheets_http::transport::SheetsTransport;
use serde::Deserialize;
use tracing::debug;

use crate::resolve::{a1_range, resolve_reference, resolve_sheet_title};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Explicit sheet name. Overrides a gid in the reference.
    pub sheet: Option<String>,
    /// Write column names as the first row.
    pub header: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            sheet: None,
            header: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearResponse {
    #[serde(default)]
    cleared_range: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    #[serde(default)]
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_rows: Option<u64>,
}

/// Clear-then-append writes to a single sheet.
///
/// The sheet is cleared when the session is opened. Appends happen in call
/// order, earlier appends are never rolled back.
#[derive(Debug)]
pub struct WriteSession<C: HttpClient> {
    transport: SheetsTransport<C>,
    spreadsheet_id: String,
    sheet_name: String,
    /// Quoted A1 range covering the whole sheet.
    range: String,
    token: String,
    cleared: bool,
}

impl<C> WriteSession<C>
where
    C: HttpClient,
{
    /// Open a session, clearing all existing values in the sheet.
    pub async fn open(
        transport: SheetsTransport<C>,
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let sheet_name = sheet_name.into();
        let mut session = WriteSession {
            transport,
            spreadsheet_id: spreadsheet_id.into(),
            range: a1_range(&sheet_name, None),
            sheet_name,
            token: token.into(),
            cleared: false,
        };
        session.clear().await?;
        Ok(session)
    }

    async fn clear(&mut self) -> Result<()> {
        let raw = self
            .transport
            .clear_values(&self.spreadsheet_id, &self.range, &self.token)
            .await?;
        let resp: ClearResponse = decode_response(&raw)?
            .into_result()
            .map_err(|e| e.with_field("sheet", &self.sheet_name))?;

        debug!(
            spreadsheet_id = %self.spreadsheet_id,
            sheet = %self.sheet_name,
            cleared_range = ?resp.cleared_range,
            "cleared sheet"
        );
        self.cleared = true;

        Ok(())
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Append a batch to the sheet.
    ///
    /// `column_headers` is written as the first row when this is the first
    /// batch. Nothing is sent when there are no rows to write.
    pub async fn write_batch(
        &mut self,
        batch: &Batch,
        column_headers: Option<&[String]>,
        is_first_batch: bool,
    ) -> Result<()> {
        if !self.cleared {
            return Err(SheetsError::new("Cannot append to a sheet that was not cleared")
                .with_field("sheet", &self.sheet_name));
        }

        let header = if is_first_batch { column_headers } else { None };
        let values = batch_to_values(batch, header)?;
        if values.is_empty() {
            debug!(sheet = %self.sheet_name, "skipping append of empty batch");
            return Ok(());
        }

        let body = ValueRange {
            range: self.range.clone(),
            major_dimension: MajorDimension::Rows,
            values,
        };

        let raw = self
            .transport
            .append_values(&self.spreadsheet_id, &self.range, &self.token, &body)
            .await?;
        let resp: AppendResponse = decode_response(&raw)?
            .into_result()
            .map_err(|e| e.with_field("sheet", &self.sheet_name))?;

        debug!(
            sheet = %self.sheet_name,
            rows = body.values.len(),
            updated_rows = ?resp.updates.and_then(|u| u.updated_rows),
            "appended rows"
        );

        Ok(())
    }
}

/// An open write with known column names.
#[derive(Debug)]
pub struct WriteHandle<C: HttpClient> {
    session: WriteSession<C>,
    columns: Vec<String>,
    header: bool,
}

impl<C> WriteHandle<C>
where
    C: HttpClient,
{
    pub fn session(&self) -> &WriteSession<C> {
        &self.session
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Append a batch. The header row is written with the first batch.
    pub async fn write_batch(&mut self, batch: &Batch, is_first_batch: bool) -> Result<()> {
        if batch.num_columns() != self.columns.len() {
            return Err(SheetsError::new("Batch column count does not match the write")
                .with_field("expected", self.columns.len())
                .with_field("got", batch.num_columns()));
        }

        let headers = self.header.then_some(self.columns.as_slice());
        self.session
            .write_batch(batch, headers, is_first_batch)
            .await
    }
}

/// Open a write, resolving the target sheet and clearing it.
pub async fn open_write<C>(
    transport: &SheetsTransport<C>,
    reference: &str,
    token: &str,
    columns: Vec<String>,
    options: &WriteOptions,
) -> Result<WriteHandle<C>>
where
    C: HttpClient,
{
    let reference = resolve_reference(reference, options.sheet.as_deref())?;
    let sheet_name = resolve_sheet_title(transport, &reference, token).await?;

    let session = WriteSession::open(
        transport.clone(),
        reference.spreadsheet_id,
        sheet_name,
        token,
    )
    .await?;

    Ok(WriteHandle {
        session,
        columns,
        header: options.header,
    })
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use gsheets_core::arrays::array::Array;
    use gsheets_error::ErrorKind;
    use gsheets_http::Method;
    use gsheets_http::testutil::{MockHttpClient, MockReply, RecordedRequest};

    use super::*;

    fn batch() -> Batch {
        Batch::try_from_arrays([
            Array::from(vec![Some("a"), Some("b")]),
            Array::from(vec![Some(1.5_f64), None]),
        ])
        .unwrap()
    }

    fn columns() -> Vec<String> {
        vec!["name".to_string(), "value".to_string()]
    }

    /// Client listing the sheets `Out` and `Q1`, with values requests answered
    /// by `handler`.
    fn client<F>(handler: F) -> MockHttpClient
    where
        F: Fn(&RecordedRequest) -> MockReply + Sync + Send + 'static,
    {
        MockHttpClient::new(move |req| {
            if req.is_metadata() {
                MockReply::metadata(&[(0, "Out"), (7, "Q1")])
            } else {
                handler(req)
            }
        })
    }

    fn values_requests(client: &MockHttpClient) -> Vec<RecordedRequest> {
        client
            .requests()
            .into_iter()
            .filter(|req| !req.is_metadata())
            .collect()
    }

    fn open(client: &MockHttpClient, options: &WriteOptions) -> Result<WriteHandle<MockHttpClient>> {
        let transport = SheetsTransport::new(client.clone(), "sheets.test");
        block_on(open_write(&transport, "abc", "tok", columns(), options))
    }

    fn named(sheet: &str) -> WriteOptions {
        WriteOptions {
            sheet: Some(sheet.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn clear_then_append_with_header_once() {
        let client = client(|_| MockReply::ok("{}"));
        let mut handle = open(&client, &named("Out")).unwrap();
        assert!(handle.session().is_cleared());

        block_on(handle.write_batch(&batch(), true)).unwrap();
        block_on(handle.write_batch(&batch(), false)).unwrap();

        let requests = values_requests(&client);
        assert_eq!(3, requests.len());
        assert_eq!(Method::POST, requests[0].method);
        assert_eq!("/v4/spreadsheets/abc/values/%27Out%27:clear", requests[0].path);
        assert_eq!(Some("{}"), requests[0].body.as_deref());

        assert_eq!(
            "/v4/spreadsheets/abc/values/%27Out%27:append?valueInputOption=RAW",
            requests[1].path
        );
        assert_eq!(
            Some(
                r#"{"range":"'Out'","majorDimension":"ROWS","values":[["name","value"],["a","1.5"],["b",""]]}"#
            ),
            requests[1].body.as_deref()
        );
        assert_eq!(
            Some(r#"{"range":"'Out'","majorDimension":"ROWS","values":[["a","1.5"],["b",""]]}"#),
            requests[2].body.as_deref()
        );
    }

    #[test]
    fn cell_like_title_is_quoted() {
        let client = client(|_| MockReply::ok("{}"));
        let mut handle = open(&client, &named("Q1")).unwrap();
        block_on(handle.write_batch(&batch(), true)).unwrap();

        let requests = values_requests(&client);
        assert_eq!("/v4/spreadsheets/abc/values/%27Q1%27:clear", requests[0].path);
        assert_eq!(
            "/v4/spreadsheets/abc/values/%27Q1%27:append?valueInputOption=RAW",
            requests[1].path
        );
        assert_eq!("Q1", handle.session().sheet_name());
    }

    #[test]
    fn no_header_row() {
        let client = client(|_| MockReply::ok("{}"));
        let options = WriteOptions {
            sheet: Some("Out".to_string()),
            header: false,
        };
        let mut handle = open(&client, &options).unwrap();
        block_on(handle.write_batch(&batch(), true)).unwrap();

        let requests = values_requests(&client);
        assert_eq!(
            Some(r#"{"range":"'Out'","majorDimension":"ROWS","values":[["a","1.5"],["b",""]]}"#),
            requests[1].body.as_deref()
        );
    }

    #[test]
    fn unknown_sheet_is_never_cleared() {
        let client = client(|_| MockReply::ok("{}"));
        let err = open(&client, &named("Missing")).unwrap_err();
        assert_eq!(&ErrorKind::SheetNotFound, err.kind());
        assert!(values_requests(&client).is_empty());
    }

    #[test]
    fn clear_failure_prevents_append() {
        let client = client(|_| MockReply::api_error(403, "The caller does not have permission"));
        let err = open(&client, &named("Out")).unwrap_err();

        assert_eq!(
            &ErrorKind::Api {
                code: 403,
                message: "The caller does not have permission".to_string()
            },
            err.kind()
        );
        let requests = values_requests(&client);
        assert_eq!(1, requests.len());
        assert!(requests[0].path.ends_with(":clear"));
    }

    #[test]
    fn clear_transport_failure() {
        let client = client(|_| MockReply::ConnectionFailed);
        let err = open(&client, &named("Out")).unwrap_err();
        assert_eq!(&ErrorKind::Transport, err.kind());
    }

    #[test]
    fn append_api_error() {
        let client = client(|req| {
            if req.path.ends_with(":clear") {
                MockReply::ok(r#"{"spreadsheetId":"abc","clearedRange":"Out!A1:Z1000"}"#)
            } else {
                MockReply::api_error(400, "Invalid values")
            }
        });
        let mut handle = open(&client, &named("Out")).unwrap();
        let err = block_on(handle.write_batch(&batch(), true)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Api { code: 400, .. }));
        assert_eq!(Some("Out"), err.get_field("sheet"));
    }

    #[test]
    fn empty_non_first_batch_sends_nothing() {
        let client = client(|_| MockReply::ok("{}"));
        let mut handle = open(&client, &named("Out")).unwrap();

        let empty = Batch::empty_with_types(batch().datatypes().collect::<Vec<_>>());
        block_on(handle.write_batch(&empty, false)).unwrap();
        assert_eq!(1, values_requests(&client).len());

        // First batch still writes the header.
        block_on(handle.write_batch(&empty, true)).unwrap();
        let requests = values_requests(&client);
        assert_eq!(2, requests.len());
        assert_eq!(
            Some(r#"{"range":"'Out'","majorDimension":"ROWS","values":[["name","value"]]}"#),
            requests[1].body.as_deref()
        );
    }

    #[test]
    fn column_count_mismatch() {
        let client = client(|_| MockReply::ok("{}"));
        let mut handle = open(&client, &named("Out")).unwrap();
        let narrow = Batch::try_from_arrays([Array::from(vec![Some("x")])]).unwrap();
        let err = block_on(handle.write_batch(&narrow, true)).unwrap_err();
        assert_eq!(Some("2"), err.get_field("expected"));
        assert_eq!(1, values_requests(&client).len());
    }

    #[test]
    fn binary_must_be_utf8() {
        let client = client(|_| MockReply::ok("{}"));
        let transport = SheetsTransport::new(client.clone(), "sheets.test");
        let mut handle = block_on(open_write(
            &transport,
            "abc",
            "tok",
            vec!["blob".to_string()],
            &named("Out"),
        ))
        .unwrap();

        let batch = Batch::try_from_arrays([Array::from(vec![Some(vec![0xc3_u8, 0x28])])]).unwrap();
        let err = block_on(handle.write_batch(&batch, true)).unwrap_err();
        assert_eq!(&ErrorKind::TypeCast, err.kind());
        assert_eq!(1, values_requests(&client).len());
    }
}
