use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::ResponderModel;
use crate::agent::coordinator::{Responder, ResponderKind};
use crate::error::Result;
use crate::prompts::{policy_query, NO_POLICY_FOUND, POLICY_SYSTEM_PROMPT};
use crate::rag::{PolicyLookup, PolicySearchResult};

/// Answers from retrieved policy documents, or says nothing matched
pub struct PolicyResponder {
    model: ResponderModel,
    policies: Arc<dyn PolicyLookup>,
}

impl PolicyResponder {
    pub fn new(model: ResponderModel, policies: Arc<dyn PolicyLookup>) -> Self {
        Self { model, policies }
    }

    /// Retrieval failures count as "no match"
    async fn relevant_policies(&self, query: &str) -> Vec<PolicySearchResult> {
        match self.policies.lookup(query).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Vector search error: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl Responder for PolicyResponder {
    fn kind(&self) -> ResponderKind {
        ResponderKind::Policy
    }

    async fn respond(&self, query: &str) -> Result<String> {
        let policies = self.relevant_policies(query).await;
        if policies.is_empty() {
            return Ok(NO_POLICY_FOUND.to_string());
        }

        let agent = self
            .model
            .agent("policy_agent", POLICY_SYSTEM_PROMPT, None)?;
        let text = agent.prompt(policy_query(query, &policies)).await?;

        if text.is_empty() {
            return Ok(NO_POLICY_FOUND.to_string());
        }
        Ok(text)
    }
}
