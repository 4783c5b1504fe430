//! HTTP transport to the inference endpoint.

mod http;

pub use http::{HttpTransport, InferenceRequest, TransportError};
