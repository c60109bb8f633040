use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures::FutureExt;
use futures::future::{Ready, ready};
use futures::stream::{Once, once};
use gsheets_error::{Result, ResultExt, SheetsError};
use reqwest::header::HeaderMap;
use reqwest::{Request, StatusCode};
use tracing::debug;

use crate::client::{HttpClient, HttpResponse};

/// Http client that drives requests on a tokio runtime.
///
/// Requests are spawned onto the provided handle so the returned futures can
/// be polled from any executor. The full body is read before the response is
/// returned.
#[derive(Debug, Clone)]
pub struct TokioWrappedHttpClient {
    client: reqwest::Client,
    handle: tokio::runtime::Handle,
}

impl TokioWrappedHttpClient {
    pub fn new(client: reqwest::Client, handle: tokio::runtime::Handle) -> Self {
        TokioWrappedHttpClient { client, handle }
    }

    /// Create a client that opens a fresh connection for every request.
    pub fn try_new_unpooled(handle: tokio::runtime::Handle) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .context("Failed to build http client")?;
        Ok(Self::new(client, handle))
    }
}

impl HttpClient for TokioWrappedHttpClient {
    type Response = BufferedHttpResponse;
    type RequestFuture = Pin<Box<dyn Future<Output = Result<Self::Response>> + Sync + Send>>;

    fn do_request(&self, request: Request) -> Self::RequestFuture {
        let client = self.client.clone();
        debug!(method = %request.method(), url = %request.url(), "http request");

        let join = self.handle.spawn(async move {
            let resp = client
                .execute(request)
                .await
                .map_err(|e| SheetsError::transport("Failed to send request", Box::new(e)))?;

            let status = resp.status();
            let headers = resp.headers().clone();
            let body = resp
                .bytes()
                .await
                .map_err(|e| SheetsError::transport("Failed to read response body", Box::new(e)))?;

            Ok(BufferedHttpResponse {
                status,
                headers,
                body,
            })
        });

        Box::pin(join.map(|result| match result {
            Ok(result) => result,
            Err(e) => Err(SheetsError::transport(
                "Failed to join request task",
                Box::new(e),
            )),
        }))
    }
}

/// A response with its entire body already in memory.
#[derive(Debug, Clone)]
pub struct BufferedHttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse for BufferedHttpResponse {
    type BytesStream = Once<Ready<Result<Bytes>>>;

    fn status(&self) -> StatusCode {
        self.status
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn into_bytes_stream(self) -> Self::BytesStream {
        once(ready(Ok(self.body)))
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::client::read_body;

    #[test]
    fn buffered_response_stream() {
        let resp = BufferedHttpResponse {
            status: StatusCode::NOT_FOUND,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"missing"),
        };
        assert_eq!(StatusCode::NOT_FOUND, resp.status());

        let body = block_on(read_body(resp.into_bytes_stream())).unwrap();
        assert_eq!(b"missing".to_vec(), body);
    }

    #[test]
    fn build_unpooled_client() {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        TokioWrappedHttpClient::try_new_unpooled(rt.handle().clone()).unwrap();
    }
}
