pub mod client;
pub mod credentials;
pub mod metadata;
pub mod native;
pub mod testutil;
pub mod transport;

// Re-export some types to use with the http client.
pub use reqwest::header::HeaderMap;
pub use reqwest::{Method, Request, StatusCode};
