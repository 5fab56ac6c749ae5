//! Provider adapter contract.

use async_trait::async_trait;

use crate::errors::SDKError;
use crate::types::{Request, Response};

/// A model backend. Adapters translate a [`Request`] into whatever the
/// backend speaks and normalize the answer into a [`Response`].
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: Request) -> Result<Response, SDKError>;
}
