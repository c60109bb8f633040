use gsheets_core::values::ValueRange;
use gsheets_error::{Result, ResultExt, SheetsError};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, Request};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::client::{HttpClient, HttpResponse, read_body, set_json_body};

pub const DEFAULT_API_HOST: &str = "sheets.googleapis.com";

/// Characters left as is when encoding a range into a path segment.
const RANGE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Sends authenticated requests to the spreadsheet API.
///
/// Every call is a single request. Nothing is retried.
#[derive(Debug, Clone)]
pub struct SheetsTransport<C: HttpClient> {
    client: C,
    host: String,
}

impl<C> SheetsTransport<C>
where
    C: HttpClient,
{
    pub fn new(client: C, host: impl Into<String>) -> Self {
        SheetsTransport {
            client,
            host: host.into(),
        }
    }

    pub fn with_default_host(client: C) -> Self {
        Self::new(client, DEFAULT_API_HOST)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Read the values in a range.
    pub async fn get_values(&self, spreadsheet_id: &str, range: &str, token: &str) -> Result<String> {
        let path = values_path(spreadsheet_id, range, "");
        self.send(Method::GET, &path, token).await
    }

    /// Clear all values in a range.
    pub async fn clear_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        token: &str,
    ) -> Result<String> {
        let path = values_path(spreadsheet_id, range, ":clear");
        self.send_json(Method::POST, &path, token, &serde_json::json!({}))
            .await
    }

    /// Append rows after the last row with data in a range.
    pub async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        token: &str,
        body: &ValueRange,
    ) -> Result<String> {
        let path = values_path(spreadsheet_id, range, ":append?valueInputOption=RAW");
        self.send_json(Method::POST, &path, token, body).await
    }

    /// Get the properties of every sheet in a spreadsheet.
    pub async fn get_metadata(&self, spreadsheet_id: &str, token: &str) -> Result<String> {
        let path = format!("/v4/spreadsheets/{spreadsheet_id}?fields=sheets.properties");
        self.send(Method::GET, &path, token).await
    }

    /// Send a request without a body, returning the response body.
    pub async fn send(&self, method: Method, path: &str, token: &str) -> Result<String> {
        let request = self.new_request(method, path, token)?;
        self.do_send(request).await
    }

    /// Send a request with a json body, returning the response body.
    pub async fn send_json<T>(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<String>
    where
        T: Serialize + ?Sized,
    {
        let mut request = self.new_request(method, path, token)?;
        set_json_body(&mut request, body)?;
        self.do_send(request).await
    }

    fn new_request(&self, method: Method, path: &str, token: &str) -> Result<Request> {
        let url = Url::parse(&format!("https://{}{}", self.host, path))
            .context_fn(|| format!("Failed to parse request url for path '{path}'"))?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| SheetsError::credentials("Token contains invalid header characters"))?;
        auth.set_sensitive(true);

        let mut request = Request::new(method, url);
        request.headers_mut().insert(AUTHORIZATION, auth);

        Ok(request)
    }

    async fn do_send(&self, request: Request) -> Result<String> {
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let resp = self.client.do_request(request).await?;
        let status = resp.status();
        let body = read_body(resp.into_bytes_stream()).await?;

        debug!(%method, %path, %status, bytes = body.len(), "spreadsheet api response");

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Build the path for a values endpoint.
///
/// `suffix` is appended after the encoded range, e.g. `:clear`.
pub fn values_path(spreadsheet_id: &str, range: &str, suffix: &str) -> String {
    format!(
        "/v4/spreadsheets/{spreadsheet_id}/values/{}{suffix}",
        encode_range(range)
    )
}

pub fn encode_range(range: &str) -> String {
    utf8_percent_encode(range, RANGE_ENCODE_SET).to_string()
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use gsheets_core::grid::MajorDimension;
    use gsheets_error::ErrorKind;

    use super::*;
    use crate::testutil::{MockHttpClient, MockReply};

    #[test]
    fn encode_ranges() {
        assert_eq!("Sheet1", encode_range("Sheet1"));
        assert_eq!("My%20Sheet%21A1%3AB2", encode_range("My Sheet!A1:B2"));
        assert_eq!(
            "/v4/spreadsheets/abc/values/Sheet1:clear",
            values_path("abc", "Sheet1", ":clear")
        );
    }

    #[test]
    fn get_attaches_bearer_token() {
        let client = MockHttpClient::new(|_| MockReply::ok("{}"));
        let transport = SheetsTransport::new(client.clone(), "sheets.test");

        let body = block_on(transport.get_values("abc", "Sheet1", "tok123")).unwrap();
        assert_eq!("{}", body);

        let requests = client.requests();
        assert_eq!(1, requests.len());
        assert_eq!(Method::GET, requests[0].method);
        assert_eq!("/v4/spreadsheets/abc/values/Sheet1", requests[0].path);
        assert_eq!(Some("Bearer tok123"), requests[0].header("authorization"));
        assert_eq!(None, requests[0].body);
    }

    #[test]
    fn clear_sends_empty_object() {
        let client = MockHttpClient::new(|_| MockReply::ok("{}"));
        let transport = SheetsTransport::new(client.clone(), "sheets.test");

        block_on(transport.clear_values("abc", "Sheet1", "tok")).unwrap();

        let requests = client.requests();
        assert_eq!(Method::POST, requests[0].method);
        assert_eq!("/v4/spreadsheets/abc/values/Sheet1:clear", requests[0].path);
        assert_eq!(Some("{}"), requests[0].body.as_deref());
        assert_eq!(Some("application/json"), requests[0].header("content-type"));
    }

    #[test]
    fn append_uses_raw_input() {
        let client = MockHttpClient::new(|_| MockReply::ok("{}"));
        let transport = SheetsTransport::new(client.clone(), "sheets.test");

        let body = ValueRange {
            range: "Sheet1".to_string(),
            major_dimension: MajorDimension::Rows,
            values: vec![vec!["a".to_string()]],
        };
        block_on(transport.append_values("abc", "Sheet1", "tok", &body)).unwrap();

        let requests = client.requests();
        assert_eq!(
            "/v4/spreadsheets/abc/values/Sheet1:append?valueInputOption=RAW",
            requests[0].path
        );
        assert_eq!(
            Some(r#"{"range":"Sheet1","majorDimension":"ROWS","values":[["a"]]}"#),
            requests[0].body.as_deref()
        );
    }

    #[test]
    fn error_status_body_is_returned() {
        let client = MockHttpClient::new(|_| {
            MockReply::with_status(
                reqwest::StatusCode::FORBIDDEN,
                r#"{"error":{"code":403,"message":"denied"}}"#,
            )
        });
        let transport = SheetsTransport::new(client, "sheets.test");
        let body = block_on(transport.get_metadata("abc", "tok")).unwrap();
        assert!(body.contains("denied"));
    }

    #[test]
    fn transport_failure() {
        let client = MockHttpClient::new(|_| MockReply::ConnectionFailed);
        let transport = SheetsTransport::new(client, "sheets.test");
        let err = block_on(transport.get_values("abc", "Sheet1", "tok")).unwrap_err();
        assert_eq!(&ErrorKind::Transport, err.kind());
    }

    #[test]
    fn invalid_token_characters() {
        let client = MockHttpClient::new(|_| MockReply::ok("{}"));
        let transport = SheetsTransport::new(client.clone(), "sheets.test");
        let err = block_on(transport.get_values("abc", "Sheet1", "bad\ntoken")).unwrap_err();
        assert_eq!(&ErrorKind::Credentials, err.kind());
        assert!(client.requests().is_empty());
    }
}
