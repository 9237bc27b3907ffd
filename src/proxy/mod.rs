//! Egress proxy pool with pluggable rotation policies.
//!
//! Remote catalogs throttle and sometimes block clients, so API calls can be
//! routed through a pool of egress proxies. The pool is loaded from a
//! newline-delimited proxy list and/or a single ad-hoc proxy string,
//! validated lazily on first use (every candidate is probed concurrently;
//! a configured source with zero working proxies is a fatal configuration
//! error), and then handed out one entry at a time according to the
//! configured [`RotationPolicy`].
//!
//! With no proxy source configured the pool is a no-op: [`ProxyPool::next_proxy`]
//! returns `Ok(None)` forever and callers go out directly.

pub mod entry;
pub mod error;
pub mod pool;

pub use entry::ProxyEntry;
pub use error::ProxyError;
pub use pool::{ProxyPool, ProxySource, RotationPolicy};
