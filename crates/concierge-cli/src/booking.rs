//! Stub booking tools. They always succeed with a fixed confirmation code.

use concierge_agent::{RegisteredTool, ToolContext, ToolError, function_tool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

pub const HOTEL_CONFIRMATION: &str = "CONF_HOTEL_98765";
pub const FLIGHT_CONFIRMATION: &str = "CONF_FLIGHT_12345";

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BookHotelArgs {
    /// the location of the hotel
    pub location: String,
    /// the date of the booking
    pub date: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BookFlightArgs {
    /// the origin of the flight
    pub origin: String,
    /// the destination of the flight
    pub destination: String,
    /// the date of the booking
    pub date: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct BookingResult {
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub report: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl BookingResult {
    fn success(report: String) -> Self {
        Self {
            status: "success".to_string(),
            report,
            error_message: None,
        }
    }
}

pub fn book_hotel(args: &BookHotelArgs) -> BookingResult {
    BookingResult::success(format!(
        "Hotel booked in {} on {}. Confirmation: {HOTEL_CONFIRMATION}",
        args.location, args.date
    ))
}

pub fn book_flight(args: &BookFlightArgs) -> BookingResult {
    BookingResult::success(format!(
        "Flight booked from {} to {} on {}. Confirmation: {FLIGHT_CONFIRMATION}",
        args.origin, args.destination, args.date
    ))
}

pub fn booking_tools() -> Result<Vec<RegisteredTool>, ToolError> {
    let hotel = function_tool(
        "bookHotel",
        "Use this function to book a hotel. Requires location and date.",
        |args: BookHotelArgs, context: ToolContext| async move {
            tracing::debug!(session = %context.session.session_id, ?args, "bookHotel");
            Ok::<_, Infallible>(book_hotel(&args))
        },
    )?;
    let flight = function_tool(
        "bookFlight",
        "Use this function to book a flight. Requires origin, destination, and date.",
        |args: BookFlightArgs, context: ToolContext| async move {
            tracing::debug!(session = %context.session.session_id, ?args, "bookFlight");
            Ok::<_, Infallible>(book_flight(&args))
        },
    )?;
    Ok(vec![hotel, flight])
}
