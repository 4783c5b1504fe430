//! Integration tests against a mock inference endpoint.

mod generation;
mod mock_server;
mod redis_backend;
mod streaming;
