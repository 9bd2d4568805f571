//! Adapters to the outside world: the blog API client, the HTTP server and telemetry.

pub mod api;
pub mod assets;
pub mod error;
pub mod http;
pub mod telemetry;
