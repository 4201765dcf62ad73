use async_trait::async_trait;

use super::ResponderModel;
use crate::agent::coordinator::{Responder, ResponderKind};
use crate::error::Result;
use crate::prompts::{general_query, GENERAL_SYSTEM_PROMPT};

/// Plain model call with no tools
pub struct GeneralResponder {
    model: ResponderModel,
}

impl GeneralResponder {
    pub fn new(model: ResponderModel) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Responder for GeneralResponder {
    fn kind(&self) -> ResponderKind {
        ResponderKind::General
    }

    async fn respond(&self, query: &str) -> Result<String> {
        let agent = self
            .model
            .agent("general_agent", GENERAL_SYSTEM_PROMPT, None)?;
        agent.prompt(general_query(query)).await
    }
}
