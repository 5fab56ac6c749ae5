#![allow(dead_code)]

use async_trait::async_trait;
use concierge_agent::{
    AGENT_METADATA_KEY, Agent, RegisteredTool, RunConfig, Runner, TRANSFER_TOOL, ToolContext,
    function_tool,
};
use concierge_llm::testing::{FnAdapter, text_response, tool_call_response};
use concierge_llm::{
    Client, ContentPart, ProviderAdapter, Request, Response, Role, SDKError,
};
use concierge_sessions::{MemorySessionStore, SessionStore};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const APP: &str = "booking_planner";
pub const USER: &str = "user1234";

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct HotelArgs {
    /// City to book the hotel in.
    pub location: String,
    /// Check-in date.
    pub date: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FlightArgs {
    pub origin: String,
    pub destination: String,
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct BookingResult {
    pub status: String,
    pub report: String,
}

pub fn hotel_tool(calls: Arc<AtomicUsize>) -> RegisteredTool {
    function_tool(
        "bookHotel",
        "Use this function to book a hotel. Requires location and date.",
        move |args: HotelArgs, _context: ToolContext| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if args.location == "Atlantis" {
                    return Err(format!("no hotels available in {}", args.location));
                }
                Ok(BookingResult {
                    status: "success".to_string(),
                    report: format!(
                        "Hotel booked in {} on {}. Confirmation: CONF_HOTEL_98765",
                        args.location, args.date
                    ),
                })
            }
        },
    )
    .expect("hotel tool")
}

pub fn flight_tool() -> RegisteredTool {
    function_tool(
        "bookFlight",
        "Use this function to book a flight. Requires origin, destination, and date.",
        |args: FlightArgs, _context: ToolContext| async move {
            Ok::<_, String>(BookingResult {
                status: "success".to_string(),
                report: format!(
                    "Flight booked from {} to {} on {}. Confirmation: CONF_FLIGHT_12345",
                    args.origin, args.destination, args.date
                ),
            })
        },
    )
    .expect("flight tool")
}

pub struct BookingTree {
    pub runner: Runner,
    pub hotel_calls: Arc<AtomicUsize>,
}

/// Coordinator { Booker (bookHotel, bookFlight), Info } over `client`.
/// The hotel tool refuses bookings in Atlantis.
pub fn booking_tree(client: Arc<Client>, config: RunConfig) -> BookingTree {
    let hotel_calls = Arc::new(AtomicUsize::new(0));
    let booker = Agent::builder("Booker")
        .description("Handles flight and hotel bookings. Use your tools for any booking request.")
        .model(client.clone(), "scripted")
        .tool(hotel_tool(hotel_calls.clone()))
        .tool(flight_tool())
        .build()
        .expect("booker");
    let info = Agent::builder("Info")
        .description("Provides general information and answers questions.")
        .model(client.clone(), "scripted")
        .build()
        .expect("info");
    let coordinator = Agent::coordinator(
        "Coordinator",
        "Main coordinator.",
        "You are an assistant. Delegate booking tasks to Booker and info requests to Info.",
        client,
        "scripted",
        vec![booker, info],
    )
    .expect("coordinator");

    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    BookingTree {
        runner: Runner::new(APP, coordinator, store).with_config(config),
        hotel_calls,
    }
}

pub fn client_with(adapter: impl ProviderAdapter + 'static) -> Arc<Client> {
    let mut client = Client::default();
    client
        .register_provider(Arc::new(adapter))
        .expect("provider should register");
    Arc::new(client)
}

pub fn agent_of(request: &Request) -> &str {
    request
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.get(AGENT_METADATA_KEY))
        .map(String::as_str)
        .unwrap_or_default()
}

/// Content of the trailing tool result, if the request ends with one.
pub fn trailing_tool_result(request: &Request) -> Option<(Value, bool)> {
    let last = request.messages.last()?;
    if last.role != Role::Tool {
        return None;
    }
    last.content.iter().find_map(|part| match part {
        ContentPart::ToolResult(result) => Some((result.content.clone(), result.is_error)),
        _ => None,
    })
}

/// Routes bookings to Booker, which books a London hotel and then reports
/// the tool's confirmation back.
pub fn hotel_booking_model() -> FnAdapter {
    FnAdapter::new("scripted", |request: &Request| {
        Ok(match agent_of(request) {
            "Coordinator" => tool_call_response(
                "scripted",
                "route",
                vec![("t1", TRANSFER_TOOL, json!({"agent_name": "Booker"}))],
            ),
            "Booker" => match trailing_tool_result(request) {
                Some((content, _)) => text_response(
                    "scripted",
                    "report",
                    content["report"].as_str().unwrap_or("no report"),
                ),
                None => tool_call_response(
                    "scripted",
                    "book",
                    vec![(
                        "h1",
                        "bookHotel",
                        json!({"location": "London", "date": "2025-11-14"}),
                    )],
                ),
            },
            _ => text_response("scripted", "info", "Happy to help."),
        })
    })
}

/// Never completes; used to observe cancellation of an in-flight call.
pub struct PendingAdapter {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ProviderAdapter for PendingAdapter {
    fn name(&self) -> &str {
        "pending"
    }

    async fn complete(&self, _request: Request) -> Result<Response, SDKError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        futures::future::pending::<()>().await;
        unreachable!("pending future never resolves")
    }
}

/// Answers after a short delay with the number of user messages it saw.
pub struct SlowCountingAdapter;

#[async_trait]
impl ProviderAdapter for SlowCountingAdapter {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(&self, request: Request) -> Result<Response, SDKError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let seen = request
            .messages
            .iter()
            .filter(|message| message.role == Role::User)
            .count();
        Ok(text_response("slow", "count", &format!("seen {seen}")))
    }
}
