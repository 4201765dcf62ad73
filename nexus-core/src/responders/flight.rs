use std::sync::Arc;

use async_trait::async_trait;

use super::ResponderModel;
use crate::agent::coordinator::{Responder, ResponderKind};
use crate::backend::{flight_toolset, FlightBackend};
use crate::error::Result;
use crate::prompts::{flight_query, FLIGHT_APOLOGY, FLIGHT_SYSTEM_PROMPT};
use crate::tool::ToolSet;

/// Flight search, booking and status through the five flight tools
pub struct FlightResponder {
    model: ResponderModel,
    tools: ToolSet,
}

impl FlightResponder {
    pub fn new(model: ResponderModel, backend: Arc<dyn FlightBackend>) -> Self {
        Self {
            model,
            tools: flight_toolset(backend),
        }
    }
}

#[async_trait]
impl Responder for FlightResponder {
    fn kind(&self) -> ResponderKind {
        ResponderKind::Flight
    }

    async fn respond(&self, query: &str) -> Result<String> {
        let agent = self
            .model
            .agent("flight_agent", FLIGHT_SYSTEM_PROMPT, Some(&self.tools))?;
        let text = agent.prompt(flight_query(query)).await?;

        if text.is_empty() {
            return Ok(FLIGHT_APOLOGY.to_string());
        }
        Ok(text)
    }
}
