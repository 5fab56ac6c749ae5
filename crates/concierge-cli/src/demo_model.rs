//! Offline stand-in for a hosted model.
//!
//! Routes by keyword, pulls locations and dates out of the user's messages,
//! and reports tool results back verbatim. Enough to drive the booking demo
//! end to end without network access.

use async_trait::async_trait;
use concierge_agent::{AGENT_METADATA_KEY, TRANSFER_TOOL};
use concierge_llm::{
    ConfigurationError, ContentPart, FinishReason, Message, ProviderAdapter, Request, Response,
    Role, SDKError, ToolCallData, Usage,
};
use regex::Regex;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};

pub const PROVIDER_NAME: &str = "offline";

const BOOKING_WORDS: &[&str] = &[
    "book", "booking", "hotel", "flight", "fly", "visit", "trip", "travel", "reserve", "stay",
];
const INFO_WORDS: &[&str] = &[
    "what", "who", "why", "how", "tell", "weather", "info", "about", "explain",
];
const NOT_PLACES: &[&str] = &[
    "a", "an", "the", "me", "my", "visit", "book", "go", "travel", "stay", "see", "fly", "be",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Intent {
    Booking,
    Info,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Service {
    Hotel,
    Flight,
}

pub struct OfflineRouter {
    date: Regex,
    place: Regex,
    route: Regex,
    next_call: AtomicU64,
}

impl OfflineRouter {
    pub fn new() -> Result<Self, SDKError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|error| {
                SDKError::Configuration(ConfigurationError::new(format!(
                    "invalid pattern '{pattern}': {error}"
                )))
            })
        };
        Ok(Self {
            date: compile(r"\b(\d{4}-\d{2}-\d{2})\b")?,
            place: compile(r"(?i)\b(?:in|to|at)\s+([a-z][a-z\-]+)")?,
            route: compile(r"(?i)\bfrom\s+([a-z][a-z\-]+)\s+to\s+([a-z][a-z\-]+)")?,
            next_call: AtomicU64::new(1),
        })
    }

    fn coordinate(&self, request: &Request, candidates: &[String]) -> Response {
        let target = user_texts(request).into_iter().find_map(|text| {
            let preferred = match classify(&text)? {
                Intent::Booking => "Booker",
                Intent::Info => "Info",
            };
            candidates.iter().find(|name| name.as_str() == preferred)
        });

        match target {
            Some(name) => self.tool_call(request, TRANSFER_TOOL, json!({ "agent_name": name })),
            None => text(
                request,
                "Would you like me to book something for you, or are you looking for information?",
            ),
        }
    }

    fn book(&self, request: &Request) -> Response {
        if let Some((content, is_error)) = trailing_tool_result(request) {
            let reply = if is_error {
                format!(
                    "I couldn't complete that booking: {}",
                    content["error"].as_str().unwrap_or("unknown error")
                )
            } else {
                format!(
                    "All set! {}",
                    content["report"].as_str().unwrap_or("Your booking is confirmed.")
                )
            };
            return text(request, &reply);
        }

        let texts = user_texts(request);
        let date = self.find_date(&texts);
        let place = self.find_place(&texts);
        let service = find_service(&texts);

        match service {
            Some(Service::Hotel) => match (place, date) {
                (Some(location), Some(date)) => self.tool_call(
                    request,
                    "bookHotel",
                    json!({ "location": location, "date": date }),
                ),
                (Some(location), None) => text(
                    request,
                    &format!("Which date should I book your hotel in {location} for?"),
                ),
                (None, _) => text(request, "Where would you like to stay?"),
            },
            Some(Service::Flight) => {
                let (origin, destination) = match self.find_route(&texts) {
                    Some((origin, destination)) => (Some(origin), Some(destination)),
                    None => (None, place),
                };
                match (origin, destination, date) {
                    (Some(origin), Some(destination), Some(date)) => self.tool_call(
                        request,
                        "bookFlight",
                        json!({ "origin": origin, "destination": destination, "date": date }),
                    ),
                    _ => text(
                        request,
                        "To book a flight I need the origin, the destination, and the date.",
                    ),
                }
            }
            None => match (place, date) {
                (Some(location), Some(date)) => text(
                    request,
                    &format!(
                        "Noted: {location} on {date}. Should I book a hotel or a flight for you?"
                    ),
                ),
                (Some(location), None) => text(
                    request,
                    &format!(
                        "When would you like to visit {location}? I can book a hotel or a flight for you."
                    ),
                ),
                _ => text(request, "Where and when would you like to travel?"),
            },
        }
    }

    fn inform(&self, request: &Request) -> Response {
        let texts = user_texts(request);
        match self.find_place(&texts) {
            Some(place) => text(
                request,
                &format!(
                    "{place} is a wonderful place to visit. Ask me to book a hotel or a flight whenever you are ready."
                ),
            ),
            None => text(request, "Happy to help. What would you like to know?"),
        }
    }

    fn find_date(&self, texts: &[String]) -> Option<String> {
        texts
            .iter()
            .find_map(|text| self.date.captures(text).map(|caps| caps[1].to_string()))
    }

    fn find_place(&self, texts: &[String]) -> Option<String> {
        texts.iter().find_map(|text| {
            self.place
                .captures_iter(text)
                .map(|caps| caps[1].to_lowercase())
                .find(|word| !NOT_PLACES.contains(&word.as_str()))
                .map(|word| capitalize(&word))
        })
    }

    fn find_route(&self, texts: &[String]) -> Option<(String, String)> {
        texts.iter().find_map(|text| {
            self.route
                .captures(text)
                .map(|caps| (capitalize(&caps[1]), capitalize(&caps[2])))
        })
    }

    fn tool_call(&self, request: &Request, name: &str, arguments: Value) -> Response {
        let id = format!("call_{}", self.next_call.fetch_add(1, Ordering::Relaxed));
        response(
            request,
            vec![ContentPart::tool_call(ToolCallData {
                id,
                name: name.to_string(),
                arguments,
                r#type: "function".to_string(),
            })],
            FinishReason::tool_calls(),
        )
    }
}

#[async_trait]
impl ProviderAdapter for OfflineRouter {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(&self, request: Request) -> Result<Response, SDKError> {
        if let Some(candidates) = transfer_candidates(&request) {
            return Ok(self.coordinate(&request, &candidates));
        }
        if request.tool_names().contains(&"bookHotel") {
            return Ok(self.book(&request));
        }
        tracing::trace!(
            agent = request
                .metadata
                .as_ref()
                .and_then(|metadata| metadata.get(AGENT_METADATA_KEY))
                .map(String::as_str)
                .unwrap_or_default(),
            "answering without tools"
        );
        Ok(self.inform(&request))
    }
}

fn classify(text: &str) -> Option<Intent> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();
    if words.iter().any(|word| BOOKING_WORDS.contains(word)) {
        return Some(Intent::Booking);
    }
    if words.iter().any(|word| INFO_WORDS.contains(word)) {
        return Some(Intent::Info);
    }
    None
}

fn find_service(texts: &[String]) -> Option<Service> {
    texts.iter().find_map(|text| {
        let lowered = text.to_lowercase();
        let hotel = lowered.rfind("hotel");
        let flight = lowered.rfind("flight").or_else(|| lowered.rfind("fly"));
        match (hotel, flight) {
            (Some(h), Some(f)) if f > h => Some(Service::Flight),
            (Some(_), _) => Some(Service::Hotel),
            (None, Some(_)) => Some(Service::Flight),
            (None, None) => None,
        }
    })
}

/// User messages, newest first.
fn user_texts(request: &Request) -> Vec<String> {
    request
        .messages
        .iter()
        .rev()
        .filter(|message| message.role == Role::User)
        .map(Message::text)
        .collect()
}

fn transfer_candidates(request: &Request) -> Option<Vec<String>> {
    let tool = request
        .tools
        .as_ref()?
        .iter()
        .find(|tool| tool.name == TRANSFER_TOOL)?;
    let names = tool.parameters["properties"]["agent_name"]["enum"]
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    Some(names)
}

fn trailing_tool_result(request: &Request) -> Option<(Value, bool)> {
    let last = request.messages.last()?;
    if last.role != Role::Tool {
        return None;
    }
    last.content.iter().find_map(|part| match part {
        ContentPart::ToolResult(result) => Some((result.content.clone(), result.is_error)),
        _ => None,
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn text(request: &Request, text: &str) -> Response {
    response(request, vec![ContentPart::text(text)], FinishReason::stop())
}

fn response(request: &Request, content: Vec<ContentPart>, finish_reason: FinishReason) -> Response {
    Response {
        id: format!("offline-{}", request.messages.len()),
        model: request.model.clone(),
        provider: PROVIDER_NAME.to_string(),
        message: Message {
            role: Role::Assistant,
            content,
            name: None,
            tool_call_id: None,
        },
        finish_reason,
        usage: Usage::default(),
    }
}
