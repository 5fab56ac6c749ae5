//! Model client boundary for Concierge agents.
//!
//! The crate defines the provider-neutral request/response types, the
//! [`ProviderAdapter`] contract a backend implements, and a [`Client`] that
//! routes requests to a named adapter through a middleware chain. No network
//! backend lives here.

pub mod client;
pub mod errors;
pub mod middleware;
pub mod provider;
pub mod testing;
pub mod types;

pub use client::{Client, CompleteHandler, Middleware};
pub use errors::{ConfigurationError, ProviderError, SDKError};
pub use middleware::TracingMiddleware;
pub use provider::ProviderAdapter;
pub use types::*;
