//! Deterministic adapters and response builders for tests and offline demos.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::client::Client;
use crate::errors::{ConfigurationError, SDKError};
use crate::provider::ProviderAdapter;
use crate::types::{
    ContentPart, FinishReason, Message, Request, Response, Role, ToolCallData, Usage,
};

/// Replays queued responses in order and records every request it sees.
#[derive(Clone)]
pub struct SequenceAdapter {
    pub name: String,
    pub responses: Arc<Mutex<VecDeque<Response>>>,
    pub requests: Arc<Mutex<Vec<Request>>>,
}

impl SequenceAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn enqueue(&self, response: Response) {
        self.responses
            .lock()
            .expect("responses mutex")
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().expect("requests mutex").clone()
    }
}

#[async_trait]
impl ProviderAdapter for SequenceAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: Request) -> Result<Response, SDKError> {
        self.requests.lock().expect("requests mutex").push(request);
        self.responses
            .lock()
            .expect("responses mutex")
            .pop_front()
            .ok_or_else(|| SDKError::Configuration(ConfigurationError::new("no response queued")))
    }
}

type ResponseFn = dyn Fn(&Request) -> Result<Response, SDKError> + Send + Sync;

/// Computes each response from the incoming request.
#[derive(Clone)]
pub struct FnAdapter {
    name: String,
    respond: Arc<ResponseFn>,
}

impl FnAdapter {
    pub fn new(
        name: impl Into<String>,
        respond: impl Fn(&Request) -> Result<Response, SDKError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            respond: Arc::new(respond),
        }
    }
}

#[async_trait]
impl ProviderAdapter for FnAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: Request) -> Result<Response, SDKError> {
        (self.respond)(&request)
    }
}

pub fn usage() -> Usage {
    Usage {
        input_tokens: 1,
        output_tokens: 1,
        total_tokens: 2,
    }
}

pub fn text_response(provider: &str, id: &str, text: &str) -> Response {
    Response {
        id: id.to_string(),
        model: "scripted".to_string(),
        provider: provider.to_string(),
        message: Message::assistant(text),
        finish_reason: FinishReason::stop(),
        usage: usage(),
    }
}

pub fn tool_call_response(provider: &str, id: &str, calls: Vec<(&str, &str, Value)>) -> Response {
    let parts = calls
        .into_iter()
        .map(|(call_id, name, arguments)| {
            ContentPart::tool_call(ToolCallData {
                id: call_id.to_string(),
                name: name.to_string(),
                arguments,
                r#type: "function".to_string(),
            })
        })
        .collect();

    Response {
        id: id.to_string(),
        model: "scripted".to_string(),
        provider: provider.to_string(),
        message: Message {
            role: Role::Assistant,
            content: parts,
            name: None,
            tool_call_id: None,
        },
        finish_reason: FinishReason::tool_calls(),
        usage: usage(),
    }
}

/// A client whose only provider is a fresh [`SequenceAdapter`].
pub fn client_with_sequence(provider_name: &str) -> (Arc<Client>, SequenceAdapter) {
    let adapter = SequenceAdapter::new(provider_name);
    let mut client = Client::default();
    client
        .register_provider(Arc::new(adapter.clone()))
        .expect("provider should register");
    (Arc::new(client), adapter)
}
