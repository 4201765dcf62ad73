//! The four specialized responders
//!
//! Each responder formats its prompt, optionally gathers context (policies,
//! flight tools, ticket tools) and runs one nested agent session.

mod flight;
mod general;
mod policy;
mod support;

pub use flight::FlightResponder;
pub use general::GeneralResponder;
pub use policy::PolicyResponder;
pub use support::{assess_support_need, SupportAssessment, SupportResponder, SUPPORT_KEYWORDS};

use std::sync::Arc;

use crate::agent::coordinator::Coordinator;
use crate::agent::core::{Agent, AgentConfig};
use crate::agent::provider::SharedProvider;
use crate::backend::{FlightBackend, TicketDesk};
use crate::error::Result;
use crate::rag::PolicyLookup;
use crate::tool::ToolSet;

/// Provider plus model settings used to spin up nested agents
#[derive(Clone)]
pub struct ResponderModel {
    provider: SharedProvider,
    config: AgentConfig,
}

impl ResponderModel {
    /// Nested agents inherit `config`, except name and preamble
    pub fn new(provider: SharedProvider, config: AgentConfig) -> Self {
        Self { provider, config }
    }

    pub(crate) fn agent(
        &self,
        name: &str,
        system_prompt: &str,
        tools: Option<&ToolSet>,
    ) -> Result<Agent<SharedProvider>> {
        let mut builder = Agent::builder(Arc::clone(&self.provider))
            .config(self.config.clone())
            .name(name)
            .system_prompt(system_prompt);
        if let Some(tools) = tools {
            builder = builder.tools(tools);
        }
        builder.build()
    }

    /// Coordinator with all four responders registered on this model
    pub fn coordinator(
        &self,
        policies: Arc<dyn PolicyLookup>,
        flights: Arc<dyn FlightBackend>,
        desk: Arc<TicketDesk>,
    ) -> Result<Coordinator> {
        Coordinator::builder(Arc::clone(&self.provider))
            .config(AgentConfig {
                name: "coordinator".to_string(),
                ..self.config.clone()
            })
            .responder(Arc::new(FlightResponder::new(self.clone(), flights)))
            .responder(Arc::new(PolicyResponder::new(self.clone(), policies)))
            .responder(Arc::new(SupportResponder::new(self.clone(), desk)))
            .responder(Arc::new(GeneralResponder::new(self.clone())))
            .build()
    }
}
