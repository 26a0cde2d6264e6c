//! Agent id to handler lookup

use crate::agent::pipeline::{AgentHandler, AgentPipeline, SdrAgent};
use crate::agents::{
    analysis, email, raw, summary_email, template, AnalysisEmailAgent, FitAnalysisAgent,
    RawTemplateAgent, SummaryEmailAgent, TemplateEmailAgent,
};
use crate::config::AppConfig;
use crate::llm::registry::ProviderRegistry;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Summary of one agent for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentInfo {
    pub id: &'static str,
    pub description: &'static str,
}

/// The set of agents a process serves
#[derive(Clone, Default)]
pub struct AgentCatalog {
    agents: BTreeMap<&'static str, Arc<dyn AgentHandler>>,
}

impl AgentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every enabled agent with its configured models
    pub fn from_config(config: &AppConfig, registry: Arc<ProviderRegistry>) -> Self {
        let mut catalog = Self::new();

        let overrides = config.agent(analysis::AGENT_ID);
        if overrides.enabled {
            catalog.add(FitAnalysisAgent::from_override(&overrides), &registry);
        }
        let overrides = config.agent(email::AGENT_ID);
        if overrides.enabled {
            catalog.add(AnalysisEmailAgent::from_override(&overrides), &registry);
        }
        let overrides = config.agent(summary_email::AGENT_ID);
        if overrides.enabled {
            catalog.add(SummaryEmailAgent::from_override(&overrides), &registry);
        }
        let overrides = config.agent(template::AGENT_ID);
        if overrides.enabled {
            catalog.add(TemplateEmailAgent::from_override(&overrides), &registry);
        }
        let overrides = config.agent(raw::AGENT_ID);
        if overrides.enabled {
            catalog.add(RawTemplateAgent::from_override(&overrides), &registry);
        }

        info!("Agent catalog ready: {}", catalog.ids().join(", "));
        catalog
    }

    /// Every agent with default models
    pub fn with_registry(registry: Arc<ProviderRegistry>) -> Self {
        Self::from_config(&AppConfig::default(), registry)
    }

    /// Wrap `agent` in a pipeline and register it under its id
    pub fn add<A: SdrAgent>(&mut self, agent: A, registry: &Arc<ProviderRegistry>) {
        let id = agent.id();
        debug!("Registering agent {id}");
        self.insert(Arc::new(AgentPipeline::new(agent, Arc::clone(registry))));
    }

    pub fn insert(&mut self, handler: Arc<dyn AgentHandler>) {
        self.agents.insert(handler.id(), handler);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn AgentHandler>> {
        self.agents.get(id).cloned()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.agents.keys().copied().collect()
    }

    pub fn list(&self) -> Vec<AgentInfo> {
        self.agents
            .values()
            .map(|handler| AgentInfo {
                id: handler.id(),
                description: handler.description(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl std::fmt::Debug for AgentCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCatalog")
            .field("agents", &self.ids())
            .finish()
    }
}
