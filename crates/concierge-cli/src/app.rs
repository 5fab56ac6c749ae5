use crate::booking::booking_tools;
use crate::config::{APP_NAME, DemoConfig};
use crate::demo_model::OfflineRouter;
use concierge_agent::{Agent, AgentError, RunConfig, Runner};
use concierge_llm::{Client, TracingMiddleware};
use concierge_sessions::SessionStore;
use std::sync::Arc;

pub const DEFAULT_PROMPTS: [&str; 3] = [
    "i want to visit in london?",
    "on 2025-11-14",
    "also book a hotel for me ",
];

pub fn offline_client() -> Result<Arc<Client>, AgentError> {
    let mut client = Client::default();
    client.register_provider(Arc::new(OfflineRouter::new()?))?;
    client.add_middleware(Arc::new(TracingMiddleware));
    Ok(Arc::new(client))
}

/// Coordinator delegating to Booker (hotel and flight tools) and Info.
pub fn build_runner(
    config: &DemoConfig,
    client: Arc<Client>,
    store: Arc<dyn SessionStore>,
) -> Result<Runner, AgentError> {
    let booker = Agent::builder("Booker")
        .description("Handles flight and hotel bookings. Use your tools for any booking request.")
        .model(client.clone(), config.model.clone())
        .tools(booking_tools()?)
        .build()?;
    let info = Agent::builder("Info")
        .description("Provides general information and answers questions.")
        .model(client.clone(), config.model.clone())
        .build()?;
    let coordinator = Agent::coordinator(
        "Coordinator",
        "Main coordinator.",
        "You are an assistant. Delegate booking tasks to Booker and info requests to Info.",
        client,
        config.model.clone(),
        vec![booker, info],
    )?;

    Ok(Runner::new(APP_NAME, coordinator, store)
        .with_config(RunConfig::with_max_steps(config.max_steps)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_MAX_STEPS, DEFAULT_MODEL, USER_ID};
    use concierge_agent::RunEvent;
    use concierge_sessions::MemorySessionStore;

    fn runner() -> Runner {
        let config = DemoConfig {
            model: DEFAULT_MODEL.to_string(),
            max_steps: DEFAULT_MAX_STEPS,
        };
        build_runner(
            &config,
            offline_client().expect("client"),
            Arc::new(MemorySessionStore::new()),
        )
        .expect("runner")
    }

    #[tokio::test(flavor = "current_thread")]
    async fn default_conversation_books_the_london_hotel() {
        let runner = runner();
        let session = runner.create_session(USER_ID).await.expect("session");

        let mut transcripts = Vec::new();
        for prompt in DEFAULT_PROMPTS {
            let events = runner
                .run_to_completion(USER_ID, &session.session_id, prompt)
                .await
                .expect("run");
            transcripts.push(events);
        }

        assert!(matches!(
            transcripts[0][0],
            RunEvent::Delegation { ref to, .. } if to == "Booker"
        ));
        assert!(
            transcripts[1]
                .iter()
                .filter_map(RunEvent::user_text)
                .any(|text| text.contains("London") && text.contains("2025-11-14"))
        );

        let booking = transcripts[2]
            .iter()
            .find_map(|event| match event {
                RunEvent::ToolCall(invocation) => Some(invocation),
                _ => None,
            })
            .expect("hotel booked");
        assert_eq!(booking.tool_name, "bookHotel");
        assert_eq!(
            booking.arguments,
            serde_json::json!({"location": "London", "date": "2025-11-14"})
        );
        assert!(
            transcripts[2]
                .iter()
                .filter_map(RunEvent::user_text)
                .any(|text| text.contains("CONF_HOTEL_98765"))
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn questions_go_to_info() {
        let runner = runner();
        let session = runner.create_session(USER_ID).await.expect("session");
        let events = runner
            .run_to_completion(USER_ID, &session.session_id, "tell me about Paris")
            .await
            .expect("run");
        assert!(matches!(
            events[0],
            RunEvent::Delegation { ref to, .. } if to == "Info"
        ));
        assert_eq!(events[1].author(), "Info");
    }
}
