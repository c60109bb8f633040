pub mod auth;
pub mod config;
pub mod copy_to;
pub mod extension;
pub mod read_gsheet;
pub mod secret;

mod resolve;

pub use extension::GsheetsExtension;
