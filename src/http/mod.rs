pub mod client;
pub mod error;
#[cfg(test)]
pub mod fake;
pub mod method;
pub mod request;
pub mod response;

pub use client::{ApiClient, ClientConfig};
pub use error::ApiError;
pub use request::{JSON_CONTENT_TYPE, XML_CONTENT_TYPE};
pub use response::ApiResponse;
