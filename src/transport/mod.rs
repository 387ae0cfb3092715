//! Transport layer: one JSON request per call against the configured base path.
//!
//! Every request carries `Content-Type: application/json` merged with caller
//! headers. Non-2xx responses become [`RequestError::Http`] with the server's
//! `error` message, `HTTP <status>`, or a generic message when the body is
//! unreadable.

mod client;
mod error;

pub use client::{ApiClient, RequestOptions};
pub use error::{GENERIC_NETWORK_ERROR, RequestError, from_error_body};
