//! # Nexus Core - airline assistant agents
//!
//! Core types, traits, and responders for the AirlineNexus assistant.
//!
//! This crate provides:
//! - Agent system (`agent`) - tool-calling agent loop and the coordinator
//! - Tool definitions (`tool`) - callable tools with derived JSON schemas
//! - Retrieval (`rag`) - embedding and vector store seams, policy retrieval
//! - Backends (`backend`) - mock flights, bookings and support tickets
//! - Responders (`responders`) - flight, policy, support and general handlers
//! - Configuration (`config`) and logging (`logging`)

pub mod agent;
pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod prompts;
pub mod rag;
pub mod responders;
pub mod tool;

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::agent::core::{Agent, AgentBuilder, AgentConfig, AgentEvent};
    pub use crate::agent::coordinator::{Coordinator, Responder, ResponderKind};
    pub use crate::agent::message::{Content, Message, Role, ToolCall};
    pub use crate::agent::mock::{MockProvider, MockTurn};
    pub use crate::agent::provider::{ChatRequest, Provider, SharedProvider};
    pub use crate::agent::streaming::{MockStreamBuilder, StreamingChoice, StreamingResponse};
    pub use crate::backend::{FlightBackend, MockFlightBackend, TicketDesk};
    pub use crate::config::NexusConfig;
    pub use crate::error::{Error, Result};
    pub use crate::rag::{
        Embeddings, PolicyDocument, PolicyLookup, PolicyRetriever, PolicySearchResult, QueryHit,
        VectorStore,
    };
    pub use crate::responders::ResponderModel;
    pub use crate::tool::{Tool, ToolDefinition, ToolSet};
}
