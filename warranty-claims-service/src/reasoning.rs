//! The external reasoning step: a text-generation call that turns a prompt
//! into free text. Stages only see the [`ReasoningClient`] trait; the
//! production implementation is a rig agent behind OpenRouter or Groq.

use async_trait::async_trait;
use rig::{
    agent::Agent,
    completion::Prompt,
    prelude::*,
    providers::{groq, openrouter},
};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::{LlmConfig, LlmProvider};

/// Raw reply of a reasoning call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningResponse {
    pub content: String,
}

impl ReasoningResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReasoningError {
    #[error("Reasoning call failed: {0}")]
    Call(String),

    #[error("Reasoning call timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<ReasoningResponse, ReasoningError>;
}

enum LlmAgent {
    OpenRouter(Agent<openrouter::CompletionModel>),
    Groq(Agent<groq::CompletionModel>),
}

/// [`ReasoningClient`] backed by a rig completion agent
pub struct RigReasoningClient {
    agent: LlmAgent,
    model: String,
    timeout: Option<Duration>,
}

impl RigReasoningClient {
    pub fn from_config(config: &LlmConfig) -> Self {
        let agent = match config.provider {
            LlmProvider::OpenRouter => {
                let client = openrouter::Client::new(&config.api_key);
                LlmAgent::OpenRouter(client.agent(&config.model).temperature(0.0).build())
            }
            LlmProvider::Groq => {
                let client = groq::Client::new(&config.api_key);
                LlmAgent::Groq(client.agent(&config.model).temperature(0.0).build())
            }
        };

        Self {
            agent,
            model: config.model.clone(),
            timeout: config.timeout,
        }
    }

    async fn prompt(&self, prompt: &str) -> Result<String, ReasoningError> {
        let result = match &self.agent {
            LlmAgent::OpenRouter(agent) => agent.prompt(prompt.to_owned()).await,
            LlmAgent::Groq(agent) => agent.prompt(prompt.to_owned()).await,
        };
        result.map_err(|e| ReasoningError::Call(e.to_string()))
    }
}

#[async_trait]
impl ReasoningClient for RigReasoningClient {
    async fn invoke(&self, prompt: &str) -> Result<ReasoningResponse, ReasoningError> {
        debug!(model = %self.model, prompt_length = prompt.len(), "Invoking reasoning step");

        let content = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.prompt(prompt))
                .await
                .map_err(|_| ReasoningError::Timeout(limit))??,
            None => self.prompt(prompt).await?,
        };

        debug!(model = %self.model, response_length = content.len(), "Reasoning step replied");
        Ok(ReasoningResponse::new(content))
    }
}
