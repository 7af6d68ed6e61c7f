//! Transport layer: one logical "fetch a results page" operation.
//!
//! - [`DirectFetcher`] - GET with browser headers and retry-with-backoff
//! - [`HttpProxyClient`] - the proxy collaborator over HTTP
//! - [`LayeredFetcher`] - direct first, proxy fallback second

pub mod direct;
pub mod layered;
pub mod proxy;
pub mod retry;

pub use direct::{DirectFetcher, DIRECT};
pub use layered::LayeredFetcher;
pub use proxy::{HttpProxyClient, PROXY};
pub use retry::jittered_backoff;
