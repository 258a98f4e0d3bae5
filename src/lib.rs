pub mod http;

pub use http::{Body, Client, ContentType, Data, HttpError, ReCheck, Response};
