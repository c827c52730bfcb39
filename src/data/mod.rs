//! Upstream data access: the EIA v2 client and its supporting pieces.

pub mod config;
pub mod eia;
pub mod normalize;
pub mod registry;
pub mod retry;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ClientConfig;
pub use eia::{SeriesClient, SeriesRequest};
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};
pub use transport::{HttpReply, HttpTransport, Transport};
