pub mod coordinator;
pub mod core;
pub mod message;
pub mod mock;
pub mod provider;
pub mod streaming;

pub use self::core::{Agent, AgentBuilder, AgentConfig, AgentEvent};
pub use coordinator::{Coordinator, CoordinatorBuilder, Responder, ResponderKind, ResponderTool};
