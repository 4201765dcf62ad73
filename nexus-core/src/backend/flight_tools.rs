//! Flight backend operations exposed as agent tools
//!
//! Every tool answers with a JSON object carrying `success`. Business
//! failures such as an unknown booking come back as `{success: false, error}`
//! so the model can explain them instead of the agent loop aborting.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::flight::{BackendError, FlightBackend, NewBooking, SearchCriteria};
use crate::tool::{parse_arguments, Tool, ToolDefinition, ToolSet};

/// Render a backend result in the `{success, ...}` wire shape
fn reply<T: Serialize>(result: Result<T, BackendError>, key: Option<&str>) -> anyhow::Result<String> {
    let value = match result {
        Ok(payload) => {
            let payload = serde_json::to_value(payload)?;
            match (key, payload) {
                (Some(key), payload) => json!({ "success": true, key: payload }),
                (None, Value::Object(mut fields)) => {
                    fields.insert("success".to_string(), Value::Bool(true));
                    Value::Object(fields)
                }
                (None, other) => json!({ "success": true, "result": other }),
            }
        }
        Err(e) => json!({ "success": false, "error": e.to_string() }),
    };
    Ok(value.to_string())
}

#[derive(Debug, Deserialize, JsonSchema)]
struct FlightNumberArgs {
    /// Flight number (e.g., 'AN101')
    flight_number: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct BookingReferenceArgs {
    /// Booking reference code
    booking_reference: String,
}

/// `search_flights`
pub struct SearchFlightsTool {
    backend: Arc<dyn FlightBackend>,
}

#[async_trait]
impl Tool for SearchFlightsTool {
    fn name(&self) -> String {
        "search_flights".to_string()
    }

    async fn definition(&self) -> ToolDefinition {
        ToolDefinition::for_args::<SearchCriteria>(
            self.name(),
            "Search for available flights based on criteria",
        )
    }

    async fn call(&self, arguments: &str) -> anyhow::Result<String> {
        let criteria: SearchCriteria = parse_arguments(&self.name(), arguments)?;
        reply(self.backend.search_flights(criteria).await, None)
    }
}

/// `get_flight_details`
pub struct FlightDetailsTool {
    backend: Arc<dyn FlightBackend>,
}

#[async_trait]
impl Tool for FlightDetailsTool {
    fn name(&self) -> String {
        "get_flight_details".to_string()
    }

    async fn definition(&self) -> ToolDefinition {
        ToolDefinition::for_args::<FlightNumberArgs>(
            self.name(),
            "Get detailed information about a specific flight",
        )
    }

    async fn call(&self, arguments: &str) -> anyhow::Result<String> {
        let args: FlightNumberArgs = parse_arguments(&self.name(), arguments)?;
        reply(
            self.backend.get_flight_details(&args.flight_number).await,
            Some("flight"),
        )
    }
}

/// `create_booking`
pub struct CreateBookingTool {
    backend: Arc<dyn FlightBackend>,
}

#[async_trait]
impl Tool for CreateBookingTool {
    fn name(&self) -> String {
        "create_booking".to_string()
    }

    async fn definition(&self) -> ToolDefinition {
        ToolDefinition::for_args::<NewBooking>(self.name(), "Create a flight booking")
    }

    async fn call(&self, arguments: &str) -> anyhow::Result<String> {
        let request: NewBooking = parse_arguments(&self.name(), arguments)?;
        reply(self.backend.create_booking(request).await, None)
    }
}

/// `get_booking_status`
pub struct BookingStatusTool {
    backend: Arc<dyn FlightBackend>,
}

#[async_trait]
impl Tool for BookingStatusTool {
    fn name(&self) -> String {
        "get_booking_status".to_string()
    }

    async fn definition(&self) -> ToolDefinition {
        ToolDefinition::for_args::<BookingReferenceArgs>(
            self.name(),
            "Get booking status and details",
        )
    }

    async fn call(&self, arguments: &str) -> anyhow::Result<String> {
        let args: BookingReferenceArgs = parse_arguments(&self.name(), arguments)?;
        reply(
            self.backend.get_booking_status(&args.booking_reference).await,
            Some("booking"),
        )
    }
}

/// `cancel_booking`
pub struct CancelBookingTool {
    backend: Arc<dyn FlightBackend>,
}

#[async_trait]
impl Tool for CancelBookingTool {
    fn name(&self) -> String {
        "cancel_booking".to_string()
    }

    async fn definition(&self) -> ToolDefinition {
        ToolDefinition::for_args::<BookingReferenceArgs>(self.name(), "Cancel a booking")
    }

    async fn call(&self, arguments: &str) -> anyhow::Result<String> {
        let args: BookingReferenceArgs = parse_arguments(&self.name(), arguments)?;
        reply(
            self.backend.cancel_booking(&args.booking_reference).await,
            None,
        )
    }
}

/// All five flight tools over one backend
pub fn flight_toolset(backend: Arc<dyn FlightBackend>) -> ToolSet {
    let mut tools = ToolSet::new();
    tools
        .add(SearchFlightsTool {
            backend: Arc::clone(&backend),
        })
        .add(FlightDetailsTool {
            backend: Arc::clone(&backend),
        })
        .add(CreateBookingTool {
            backend: Arc::clone(&backend),
        })
        .add(BookingStatusTool {
            backend: Arc::clone(&backend),
        })
        .add(CancelBookingTool { backend });
    tools
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::clock::{FixedClock, SequenceIds};
    use crate::backend::flight::MockFlightBackend;
    use chrono::NaiveDate;

    fn toolset() -> ToolSet {
        let now = NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("valid date");
        flight_toolset(Arc::new(MockFlightBackend::with_sources(
            Arc::new(FixedClock(now)),
            Arc::new(SequenceIds::default()),
        )))
    }

    async fn call(tools: &ToolSet, name: &str, args: Value) -> Value {
        let raw = tools
            .call(name, &args.to_string())
            .await
            .expect("tool call succeeds");
        serde_json::from_str(&raw).expect("tool output is JSON")
    }

    #[tokio::test]
    async fn test_all_five_tools_registered() {
        let tools = toolset();
        let names: Vec<_> = tools.definitions().await.into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "cancel_booking",
                "create_booking",
                "get_booking_status",
                "get_flight_details",
                "search_flights"
            ]
        );
    }

    #[tokio::test]
    async fn test_search_payload_shape() {
        let out = call(&toolset(), "search_flights", json!({"class_preference": "first"})).await;
        assert_eq!(out["success"], true);
        assert_eq!(out["total_results"], 2);
        assert_eq!(out["flights"][0]["price"], 1400);
        assert_eq!(out["flights"][0]["class"], "first");
        assert_eq!(out["search_criteria"]["passengers"], 1);
        assert_eq!(out["search_criteria"]["departure_airport"], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_class_is_priced_as_economy() {
        let out = call(&toolset(), "search_flights", json!({"class_preference": "premium"})).await;
        assert_eq!(out["success"], true);
        assert_eq!(out["flights"][0]["price"], 350);
        assert_eq!(out["flights"][0]["class"], "economy");
    }

    #[tokio::test]
    async fn test_unknown_booking_is_structured() {
        let out = call(&toolset(), "get_booking_status", json!({"booking_reference": "QQQ999"})).await;
        assert_eq!(out, json!({"success": false, "error": "Booking QQQ999 not found"}));
    }

    #[tokio::test]
    async fn test_flight_details_wrapped_under_flight() {
        let out = call(&toolset(), "get_flight_details", json!({"flight_number": "AN101"})).await;
        assert_eq!(out["success"], true);
        assert_eq!(out["flight"]["gate_departure"], "A12");
        assert_eq!(out["flight"]["departure_time"], "2025-01-02T17:00:00");
    }

    #[tokio::test]
    async fn test_cancel_demo_booking() {
        let out = call(&toolset(), "cancel_booking", json!({"booking_reference": "ABC123"})).await;
        assert_eq!(out["success"], true);
        assert_eq!(out["booking"]["status"], "cancelled");
        assert_eq!(out["message"], "Booking ABC123 has been cancelled");
    }

    #[tokio::test]
    async fn test_bad_arguments_fail_the_call() {
        let err = toolset()
            .call("create_booking", r#"{"flight_number": "AN101"}"#)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid tool arguments for create_booking"));
    }
}
