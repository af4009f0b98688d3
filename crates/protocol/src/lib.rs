//! Wire types for the Shelf open API.
//!
//! Covers the slice-upload protocol (init, per-slice URL, complete,
//! async-result polling) plus the `{code, message, data, x-traceID}`
//! envelope every endpoint wraps its payload in.

pub mod endpoints;
pub mod envelope;
pub mod upload;

pub use envelope::{ApiEnvelope, EnvelopeError};
pub use upload::{
    AsyncResultResponse, CompleteRequest, CompleteResponse, DuplicatePolicy, InitUploadRequest,
    InitUploadResponse, SliceUrlRequest, SliceUrlResponse, TokenRequest, TokenResponse,
};
