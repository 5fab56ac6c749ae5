//! Model client and middleware chain.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::errors::{ConfigurationError, SDKError};
use crate::provider::ProviderAdapter;
use crate::types::{Request, Response};

pub type CompleteHandler =
    Arc<dyn Fn(Request) -> BoxFuture<'static, Result<Response, SDKError>> + Send + Sync>;

/// Middleware wrapping `complete()` calls. The first middleware added is the
/// outermost layer.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle_complete(
        &self,
        request: Request,
        next: CompleteHandler,
    ) -> Result<Response, SDKError>;
}

#[derive(Clone, Default)]
pub struct Client {
    providers: HashMap<String, Arc<dyn ProviderAdapter>>,
    default_provider: Option<String>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Client {
    pub fn new(
        providers: HashMap<String, Arc<dyn ProviderAdapter>>,
        default_provider: Option<String>,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Self {
        Self {
            providers,
            default_provider,
            middleware,
        }
    }

    /// Register an adapter under its own name. The first registered adapter
    /// becomes the default provider.
    pub fn register_provider(&mut self, provider: Arc<dyn ProviderAdapter>) -> Result<(), SDKError> {
        let name = provider.name().trim().to_string();
        if name.is_empty() {
            return Err(ConfigurationError::new("provider name must not be empty").into());
        }
        if self.providers.contains_key(&name) {
            return Err(ConfigurationError::new(format!(
                "provider '{}' is already registered",
                name
            ))
            .into());
        }
        if self.default_provider.is_none() {
            self.default_provider = Some(name.clone());
        }
        self.providers.insert(name, provider);
        Ok(())
    }

    pub fn set_default_provider(&mut self, provider: impl Into<String>) {
        self.default_provider = Some(provider.into());
    }

    pub fn default_provider(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middleware.push(middleware);
    }

    pub async fn complete(&self, mut request: Request) -> Result<Response, SDKError> {
        let provider_name = self.resolve_provider(&request)?;
        request.provider = Some(provider_name.clone());
        let adapter = self
            .providers
            .get(&provider_name)
            .ok_or_else(|| {
                SDKError::Configuration(ConfigurationError::new(format!(
                    "provider '{}' not registered",
                    provider_name
                )))
            })?
            .clone();

        let base: CompleteHandler = Arc::new(move |req| {
            let adapter = adapter.clone();
            Box::pin(async move { adapter.complete(req).await })
        });

        let handler = self
            .middleware
            .iter()
            .rev()
            .fold(base, |next, middleware| {
                let middleware = middleware.clone();
                Arc::new(move |req| {
                    let middleware = middleware.clone();
                    let next = next.clone();
                    Box::pin(async move { middleware.handle_complete(req, next).await })
                })
            });

        handler(request).await
    }

    fn resolve_provider(&self, request: &Request) -> Result<String, SDKError> {
        if let Some(provider) = &request.provider {
            return Ok(provider.clone());
        }
        if let Some(provider) = &self.default_provider {
            return Ok(provider.clone());
        }
        Err(SDKError::Configuration(ConfigurationError::new(
            "no provider configured",
        )))
    }
}
