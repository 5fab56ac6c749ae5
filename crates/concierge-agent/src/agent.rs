use crate::cancel::RunCancellation;
use crate::config::RunConfig;
use crate::decision::{AgentState, Decision};
use crate::events::{RunEvent, RunEventStream, ToolInvocation, ToolOutcome};
use crate::prompt::{system_prompt, turns_to_messages};
use crate::tools::{
    RegisteredTool, TRANSFER_TOOL, ToolContext, ToolRegistry, parse_tool_arguments,
    transfer_tool_definition,
};
use crate::{AgentError, ToolError};
use concierge_llm::{Client, Message, Request, ToolCall, ToolChoice};
use concierge_sessions::{SessionKey, Turn};
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Request metadata key carrying the name of the agent that issued it.
pub const AGENT_METADATA_KEY: &str = "agent";

/// Everything an agent needs from the surrounding run.
#[derive(Clone, Debug)]
pub struct RunContext {
    pub session: SessionKey,
    pub config: RunConfig,
    pub cancellation: RunCancellation,
}

/// A named unit pairing a model with an instruction, a tool set, and
/// optional child agents it may hand the conversation to.
pub struct Agent {
    name: String,
    description: String,
    instruction: Option<String>,
    client: Arc<Client>,
    model: String,
    tools: ToolRegistry,
    sub_agents: Vec<Arc<Agent>>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("tools", &self.tools.names())
            .field("sub_agents", &self.sub_agent_names())
            .finish()
    }
}

impl Agent {
    pub fn builder(name: impl Into<String>) -> AgentBuilder {
        AgentBuilder::new(name)
    }

    /// A tool-less agent that only routes to `sub_agents`.
    pub fn coordinator(
        name: impl Into<String>,
        description: impl Into<String>,
        instruction: impl Into<String>,
        client: Arc<Client>,
        model: impl Into<String>,
        sub_agents: Vec<Arc<Agent>>,
    ) -> Result<Arc<Agent>, AgentError> {
        AgentBuilder::new(name)
            .description(description)
            .instruction(instruction)
            .model(client, model)
            .sub_agents(sub_agents)
            .build_coordinator()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instruction(&self) -> Option<&str> {
        self.instruction.as_deref()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn sub_agents(&self) -> &[Arc<Agent>] {
        &self.sub_agents
    }

    pub fn sub_agent(&self, name: &str) -> Option<&Arc<Agent>> {
        self.sub_agents.iter().find(|agent| agent.name == name)
    }

    pub fn sub_agent_names(&self) -> Vec<String> {
        self.sub_agents
            .iter()
            .map(|agent| agent.name.clone())
            .collect()
    }

    /// This agent's name followed by every descendant's, depth first.
    pub fn subtree_names(&self) -> Vec<String> {
        let mut names = vec![self.name.clone()];
        for child in &self.sub_agents {
            names.extend(child.subtree_names());
        }
        names
    }

    /// Answers `new_turn` given the prior `history`. The stream is lazy: no
    /// model call happens until it is polled.
    pub fn respond(
        self: &Arc<Self>,
        history: Vec<Turn>,
        new_turn: Turn,
        context: RunContext,
    ) -> RunEventStream {
        Box::pin(respond_loop(Arc::clone(self), history, new_turn, context))
    }

    pub(crate) fn build_request(&self, turns: &[Turn]) -> Request {
        let mut messages = vec![Message::system(system_prompt(self))];
        messages.extend(turns_to_messages(turns));

        let mut request = Request::new(self.model.clone(), messages);
        let mut tools = self.tools.definitions();
        if !self.sub_agents.is_empty() {
            tools.push(transfer_tool_definition(&self.sub_agent_names()));
        }
        if !tools.is_empty() {
            request.tools = Some(tools);
            request.tool_choice = Some(ToolChoice::auto());
        }
        request.metadata = Some(HashMap::from([(
            AGENT_METADATA_KEY.to_string(),
            self.name.clone(),
        )]));
        request
    }

    async fn invoke_tool(
        &self,
        call: &ToolCall,
        context: &RunContext,
    ) -> Result<ToolInvocation, AgentError> {
        let arguments = recorded_arguments(call);
        let tool_context = ToolContext {
            session: context.session.clone(),
            agent: self.name.clone(),
            call_id: call.id.clone(),
        };

        let outcome = match self.tools.invoke(call, tool_context).await {
            Ok(value) => ToolOutcome::Success { value },
            Err(ToolError::SchemaValidation { message, .. }) => {
                tracing::warn!(agent = %self.name, tool = %call.name, %message, "tool arguments rejected");
                ToolOutcome::InvalidArguments { message }
            }
            Err(ToolError::Handler { message, .. }) => {
                tracing::warn!(agent = %self.name, tool = %call.name, %message, "tool handler failed");
                ToolOutcome::HandlerFailed { message }
            }
            Err(other) => return Err(other.into()),
        };
        tracing::debug!(agent = %self.name, tool = %call.name, error = outcome.is_error(), "tool call finished");

        Ok(ToolInvocation {
            author: self.name.clone(),
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            arguments,
            outcome,
        })
    }
}

/// Arguments as recorded in events; unparseable raw text is kept verbatim.
fn recorded_arguments(call: &ToolCall) -> Value {
    parse_tool_arguments(call).unwrap_or_else(|_| {
        call.raw_arguments
            .clone()
            .map(Value::String)
            .unwrap_or_else(|| call.arguments.clone())
    })
}

fn respond_loop(
    agent: Arc<Agent>,
    history: Vec<Turn>,
    new_turn: Turn,
    context: RunContext,
) -> impl Stream<Item = Result<RunEvent, AgentError>> + Send {
    async_stream::try_stream! {
        let limit = context.config.max_steps;
        let mut working = history.clone();
        working.push(new_turn.clone());
        let mut steps = 0usize;
        let mut state = AgentState::AwaitingModelDecision;

        loop {
            context.cancellation.check()?;
            if steps >= limit {
                tracing::warn!(agent = %agent.name, limit, "step limit reached");
                Err::<(), _>(AgentError::StepLimitExceeded {
                    agent: agent.name.clone(),
                    limit,
                })?;
            }
            steps += 1;
            tracing::debug!(agent = %agent.name, step = steps, ?state, "querying model");

            let request = agent.build_request(&working);
            let response = context.cancellation.race(agent.client.complete(request)).await??;
            let decision = Decision::from_response(&response, !agent.sub_agents.is_empty());
            state = decision.next_state();
            tracing::debug!(agent = %agent.name, step = steps, ?state, "model decided");

            match decision {
                Decision::Respond(text) => {
                    yield RunEvent::Text {
                        author: agent.name.clone(),
                        text,
                    };
                    break;
                }
                Decision::CallTools { text, calls } => {
                    if !text.is_empty() {
                        let event = RunEvent::Text {
                            author: agent.name.clone(),
                            text,
                        };
                        working.push(event.to_turn());
                        yield event;
                    }
                    for call in &calls {
                        context.cancellation.check()?;
                        let event = RunEvent::ToolCall(agent.invoke_tool(call, &context).await?);
                        working.push(event.to_turn());
                        yield event;
                    }
                    state = AgentState::AwaitingModelDecision;
                }
                Decision::RejectedTransfers { text, rejected } => {
                    if !text.is_empty() {
                        let event = RunEvent::Text {
                            author: agent.name.clone(),
                            text,
                        };
                        working.push(event.to_turn());
                        yield event;
                    }
                    for (call, message) in rejected {
                        tracing::warn!(agent = %agent.name, %message, "transfer arguments rejected");
                        let event = RunEvent::ToolCall(ToolInvocation {
                            author: agent.name.clone(),
                            call_id: call.id.clone(),
                            tool_name: call.name.clone(),
                            arguments: recorded_arguments(&call),
                            outcome: ToolOutcome::InvalidArguments { message },
                        });
                        working.push(event.to_turn());
                        yield event;
                    }
                    state = AgentState::AwaitingModelDecision;
                }
                Decision::Delegate { text, agent: target } => {
                    let child = agent.sub_agent(&target).cloned().ok_or_else(|| {
                        AgentError::UnknownSubAgent {
                            agent: agent.name.clone(),
                            requested: target.clone(),
                        }
                    })?;
                    if !text.is_empty() {
                        yield RunEvent::Text {
                            author: agent.name.clone(),
                            text,
                        };
                    }
                    tracing::info!(from = %agent.name, to = %child.name, "delegating");
                    yield RunEvent::Delegation {
                        from: agent.name.clone(),
                        to: child.name.clone(),
                    };

                    let mut relayed = child.respond(history.clone(), new_turn.clone(), context.clone());
                    while let Some(event) = relayed.next().await {
                        yield event?;
                    }
                    break;
                }
                Decision::Ambiguous { text, candidates } => {
                    let text = if text.trim().is_empty() {
                        format!(
                            "I can hand this to {}. Which one should take it?",
                            candidates.join(" or ")
                        )
                    } else {
                        text
                    };
                    tracing::info!(agent = %agent.name, ?candidates, "ambiguous transfer, asking the user");
                    yield RunEvent::Clarification {
                        author: agent.name.clone(),
                        text,
                        candidates,
                    };
                    break;
                }
            }
        }
    }
}

/// Assembles an [`Agent`] and checks the tree it roots.
pub struct AgentBuilder {
    name: String,
    description: String,
    instruction: Option<String>,
    model: Option<(Arc<Client>, String)>,
    tools: Vec<RegisteredTool>,
    sub_agents: Vec<Arc<Agent>>,
}

impl AgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: None,
            model: None,
            tools: Vec::new(),
            sub_agents: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn model(mut self, client: Arc<Client>, model: impl Into<String>) -> Self {
        self.model = Some((client, model.into()));
        self
    }

    pub fn tool(mut self, tool: RegisteredTool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = RegisteredTool>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn sub_agent(mut self, agent: Arc<Agent>) -> Self {
        self.sub_agents.push(agent);
        self
    }

    pub fn sub_agents(mut self, agents: impl IntoIterator<Item = Arc<Agent>>) -> Self {
        self.sub_agents.extend(agents);
        self
    }

    pub fn build(self) -> Result<Arc<Agent>, AgentError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AgentError::InvalidConfiguration(
                "agent name must not be empty".to_string(),
            ));
        }
        let Some((client, model)) = self.model else {
            return Err(AgentError::InvalidConfiguration(format!(
                "agent '{name}' has no model client"
            )));
        };

        let mut registry = ToolRegistry::new();
        for tool in self.tools {
            registry.register(tool)?;
        }
        if !self.sub_agents.is_empty() && registry.contains(TRANSFER_TOOL) {
            return Err(AgentError::InvalidConfiguration(format!(
                "agent '{name}' registers a tool named '{TRANSFER_TOOL}', which is reserved for delegation"
            )));
        }
        validate_tree(&name, &self.sub_agents)?;

        Ok(Arc::new(Agent {
            name,
            description: self.description,
            instruction: self.instruction,
            client,
            model,
            tools: registry,
            sub_agents: self.sub_agents,
        }))
    }

    /// Like [`build`](Self::build), additionally requiring at least one
    /// child and no tools of its own.
    pub fn build_coordinator(self) -> Result<Arc<Agent>, AgentError> {
        if self.sub_agents.is_empty() {
            return Err(AgentError::InvalidConfiguration(format!(
                "coordinator '{}' needs at least one sub-agent",
                self.name
            )));
        }
        if !self.tools.is_empty() {
            return Err(AgentError::InvalidConfiguration(format!(
                "coordinator '{}' must not carry tools",
                self.name
            )));
        }
        self.build()
    }
}

fn validate_tree(name: &str, sub_agents: &[Arc<Agent>]) -> Result<(), AgentError> {
    let mut seen = HashSet::new();
    for child in sub_agents {
        for descendant in child.subtree_names() {
            if descendant == name {
                return Err(AgentError::AgentCycle(descendant));
            }
            if !seen.insert(descendant.clone()) {
                return Err(AgentError::DuplicateSubAgent(descendant));
            }
        }
    }
    Ok(())
}
