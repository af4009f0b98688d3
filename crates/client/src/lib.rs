//! Authenticated HTTP caller for the Shelf open API.
//!
//! Every API call is a JSON POST carrying the fixed `Platform` header
//! and a lazily fetched bearer token; responses are unwrapped from the
//! standard `{code, message, data, x-traceID}` envelope. Slice bodies
//! go out as raw PUTs against presigned URLs.

mod api;
mod token;

pub use api::{ApiClient, ClientError};
pub use token::{Credentials, TokenProvider};
