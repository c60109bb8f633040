//! Test doubles for the http client.
//!
//! `MockHttpClient` records every request and answers with a scripted reply.
//! `FakeSheetsApi` builds on it to serve an in-memory spreadsheet that
//! understands the values, clear, append, and metadata endpoints.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::{Ready, ready};
use gsheets_error::{Result, SheetsError};
use parking_lot::Mutex;
use percent_encoding::percent_decode_str;
use reqwest::header::HeaderMap;
use reqwest::{Method, Request, StatusCode};
use serde_json::json;

use crate::client::HttpClient;
use crate::native::BufferedHttpResponse;

#[derive(Debug, Clone)]
pub enum MockReply {
    Response { status: StatusCode, body: String },
    /// Fail as if the connection could not be established.
    ConnectionFailed,
}

impl MockReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, body)
    }

    pub fn with_status(status: StatusCode, body: impl Into<String>) -> Self {
        MockReply::Response {
            status,
            body: body.into(),
        }
    }

    /// Reply with an API error envelope.
    pub fn api_error(code: u16, message: &str) -> Self {
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
        Self::with_status(
            status,
            json!({"error": {"code": code, "message": message}}).to_string(),
        )
    }

    /// Reply with a sheet listing of `(sheet_id, title)` pairs.
    pub fn metadata(sheets: &[(i64, &str)]) -> Self {
        let sheets: Vec<_> = sheets
            .iter()
            .enumerate()
            .map(|(idx, (sheet_id, title))| {
                json!({"properties": {"sheetId": sheet_id, "title": title, "index": idx}})
            })
            .collect();
        Self::ok(json!({ "sheets": sheets }).to_string())
    }
}

/// A request as seen by the mock client.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path including the query string, if any.
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// If this is a sheet metadata lookup.
    pub fn is_metadata(&self) -> bool {
        self.method == Method::GET && self.path.ends_with("?fields=sheets.properties")
    }
}

type Handler = dyn Fn(&RecordedRequest) -> MockReply + Sync + Send;

#[derive(Clone)]
pub struct MockHttpClient {
    handler: Arc<Handler>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> MockReply + Sync + Send + 'static,
    {
        MockHttpClient {
            handler: Arc::new(handler),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// All requests made so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

impl fmt::Debug for MockHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockHttpClient")
            .field("requests", &self.requests.lock().len())
            .finish_non_exhaustive()
    }
}

impl HttpClient for MockHttpClient {
    type Response = BufferedHttpResponse;
    type RequestFuture = Ready<Result<BufferedHttpResponse>>;

    fn do_request(&self, request: Request) -> Self::RequestFuture {
        let url = request.url();
        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        let recorded = RecordedRequest {
            method: request.method().clone(),
            path,
            headers: request.headers().clone(),
            body: request
                .body()
                .and_then(|b| b.as_bytes())
                .map(|b| String::from_utf8_lossy(b).into_owned()),
        };

        let reply = (self.handler)(&recorded);
        self.requests.lock().push(recorded);

        match reply {
            MockReply::Response { status, body } => ready(Ok(BufferedHttpResponse {
                status,
                headers: HeaderMap::new(),
                body: Bytes::from(body),
            })),
            MockReply::ConnectionFailed => ready(Err(SheetsError::transport(
                "Failed to connect",
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )),
            ))),
        }
    }
}

#[derive(Debug, Clone)]
struct FakeSheet {
    sheet_id: i64,
    title: String,
    values: Vec<Vec<String>>,
}

#[derive(Debug)]
struct FakeState {
    spreadsheet_id: String,
    token: String,
    sheets: Vec<FakeSheet>,
}

/// An in-memory spreadsheet served over the mock client.
///
/// Sub-ranges are not interpreted, every values call operates on the whole
/// sheet named by the range.
#[derive(Debug, Clone)]
pub struct FakeSheetsApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSheetsApi {
    /// Create an empty spreadsheet accepting only `token`.
    pub fn new(spreadsheet_id: impl Into<String>, token: impl Into<String>) -> Self {
        FakeSheetsApi {
            state: Arc::new(Mutex::new(FakeState {
                spreadsheet_id: spreadsheet_id.into(),
                token: token.into(),
                sheets: Vec::new(),
            })),
        }
    }

    pub fn add_sheet(&self, sheet_id: i64, title: &str, values: Vec<Vec<String>>) {
        self.state.lock().sheets.push(FakeSheet {
            sheet_id,
            title: title.to_string(),
            values,
        });
    }

    /// Current values of a sheet.
    pub fn values(&self, title: &str) -> Option<Vec<Vec<String>>> {
        self.state
            .lock()
            .sheets
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.values.clone())
    }

    /// A mock client routing every request to this spreadsheet.
    pub fn client(&self) -> MockHttpClient {
        let api = self.clone();
        MockHttpClient::new(move |req| api.handle(req))
    }

    fn handle(&self, req: &RecordedRequest) -> MockReply {
        let mut state = self.state.lock();

        let expected = format!("Bearer {}", state.token);
        if req.header("authorization") != Some(expected.as_str()) {
            return MockReply::api_error(401, "Request had invalid authentication credentials.");
        }

        let (path, query) = match req.path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (req.path.as_str(), None),
        };

        let rest = match path.strip_prefix("/v4/spreadsheets/") {
            Some(rest) => rest,
            None => return MockReply::api_error(404, "Not found"),
        };
        let (id, rest) = match rest.split_once('/') {
            Some((id, rest)) => (id, Some(rest)),
            None => (rest, None),
        };
        if id != state.spreadsheet_id {
            return MockReply::api_error(404, "Requested entity was not found.");
        }

        let rest = match rest {
            Some(rest) => rest,
            None => {
                // Metadata.
                if req.method != Method::GET || query != Some("fields=sheets.properties") {
                    return MockReply::api_error(400, "Unsupported metadata request");
                }
                let sheets: Vec<_> = state
                    .sheets
                    .iter()
                    .enumerate()
                    .map(|(idx, s)| {
                        json!({"properties": {"sheetId": s.sheet_id, "title": s.title, "index": idx}})
                    })
                    .collect();
                return MockReply::ok(json!({ "sheets": sheets }).to_string());
            }
        };

        let range = match rest.strip_prefix("values/") {
            Some(range) => range,
            None => return MockReply::api_error(404, "Not found"),
        };
        let (range, action) = match range.rsplit_once(':') {
            Some((range, action)) if action == "clear" || action == "append" => {
                (range, Some(action))
            }
            _ => (range, None),
        };
        let range = percent_decode_str(range).decode_utf8_lossy().into_owned();
        let title = range.split('!').next().unwrap_or_default();
        let title = match title.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
            Some(quoted) => quoted.replace("''", "'"),
            None => title.to_string(),
        };

        let spreadsheet_id = state.spreadsheet_id.clone();
        let sheet = match state.sheets.iter_mut().find(|s| s.title == title) {
            Some(sheet) => sheet,
            None => {
                return MockReply::api_error(400, &format!("Unable to parse range: {range}"));
            }
        };

        match (&req.method, action) {
            (&Method::GET, None) => {
                let mut resp = json!({"range": range, "majorDimension": "ROWS"});
                if !sheet.values.is_empty() {
                    resp["values"] = json!(sheet.values);
                }
                MockReply::ok(resp.to_string())
            }
            (&Method::POST, Some("clear")) => {
                sheet.values.clear();
                MockReply::ok(
                    json!({"spreadsheetId": spreadsheet_id, "clearedRange": range}).to_string(),
                )
            }
            (&Method::POST, Some("append")) => {
                if query != Some("valueInputOption=RAW") {
                    return MockReply::api_error(400, "Missing valueInputOption");
                }
                let body: serde_json::Value = match req
                    .body
                    .as_deref()
                    .and_then(|b| serde_json::from_str(b).ok())
                {
                    Some(body) => body,
                    None => return MockReply::api_error(400, "Invalid JSON payload"),
                };
                let rows: Vec<Vec<String>> = match serde_json::from_value(body["values"].clone())
                {
                    Ok(rows) => rows,
                    Err(_) => return MockReply::api_error(400, "Invalid values"),
                };
                let updated_rows = rows.len();
                sheet.values.extend(rows);
                MockReply::ok(
                    json!({
                        "spreadsheetId": spreadsheet_id,
                        "tableRange": range,
                        "updates": {"updatedRange": range, "updatedRows": updated_rows}
                    })
                    .to_string(),
                )
            }
            _ => MockReply::api_error(400, "Unsupported request"),
        }
    }
}
