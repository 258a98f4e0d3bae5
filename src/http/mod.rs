//! HTTP request builder with retry, exponential backoff and response parsing.

mod body;
mod client;
mod data;
mod error;
mod response;
mod retry;

pub use body::{
    Body, ContentType, FORM_URLENCODED, MULTIPART_FORM_DATA, Payload, SerializedBody,
};
pub use client::Client;
pub use data::Data;
pub use error::HttpError;
pub use response::Response;
pub use retry::{
    BACKOFF_BASE_MS, DEFAULT_RETRIES, DEFAULT_TIMEOUT, ReCheck, backoff_delay, default_recheck,
    with_retry,
};
