#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use nexus_core::agent::mock::{MockProvider, MockTurn};
use nexus_core::agent::provider::SharedProvider;
use nexus_core::agent::AgentConfig;
use nexus_core::error::{Error, Result};
use nexus_core::rag::{PolicyLookup, PolicySearchResult};
use nexus_core::responders::ResponderModel;
use serde_json::Value;

pub fn text(s: &str) -> MockTurn {
    MockTurn::Text(s.to_string())
}

pub fn call(id: &str, name: &str, args: Value) -> MockTurn {
    MockTurn::ToolCalls(vec![(id.to_string(), name.to_string(), args)])
}

/// Replays turns in order across every agent that shares it
pub fn scripted(turns: Vec<MockTurn>) -> Arc<MockProvider> {
    Arc::new(MockProvider::scripted(turns))
}

pub fn model(provider: &Arc<MockProvider>) -> ResponderModel {
    let shared: SharedProvider = provider.clone();
    ResponderModel::new(shared, AgentConfig::default())
}

/// Fixed policy lookup results
pub struct CannedPolicies(pub Result<Vec<PolicySearchResult>>);

impl CannedPolicies {
    pub fn none() -> Arc<Self> {
        Arc::new(Self(Ok(Vec::new())))
    }

    pub fn baggage() -> Arc<Self> {
        Arc::new(Self(Ok(vec![PolicySearchResult {
            title: "Baggage Allowance".into(),
            content: "Economy passengers may check one bag up to 23kg.".into(),
            category: "baggage".into(),
            distance: 0.3,
        }])))
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self(Err(Error::VectorStore("index unavailable".into()))))
    }
}

#[async_trait]
impl PolicyLookup for CannedPolicies {
    async fn lookup(&self, _query: &str) -> Result<Vec<PolicySearchResult>> {
        match &self.0 {
            Ok(found) => Ok(found.clone()),
            Err(e) => Err(Error::VectorStore(e.to_string())),
        }
    }
}
