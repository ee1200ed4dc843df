//! Service configuration, read from environment variables.
//!
//! | variable            | meaning                                        |
//! |---------------------|------------------------------------------------|
//! | `LLM_PROVIDER`      | `openrouter` or `groq`; see below              |
//! | `OPENROUTER_API_KEY`| key for the OpenRouter provider                |
//! | `GROQ_API_KEY`      | key for the Groq provider                      |
//! | `LLM_MODEL`         | model name (`GROQ_MODEL` is honoured for groq) |
//! | `LLM_TIMEOUT_SECS`  | optional per-call timeout                      |
//! | `POLICY_PDF_PATH`   | policy manual PDF                              |
//! | `POLICY_TEXT`       | policy text used when the PDF is unavailable   |
//! | `FAILURE_POLICY`    | `abort` (default) or `isolate`                 |
//!
//! Without `LLM_PROVIDER`, Groq is picked when only `GROQ_API_KEY` is set and
//! OpenRouter otherwise.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::workflow::FailurePolicy;

pub const DEFAULT_POLICY_PDF_PATH: &str = "data/AutoDrive_Warranty_Policy_2025.pdf";
pub const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not set")]
    MissingVar(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenRouter,
    Groq,
}

impl LlmProvider {
    fn api_key_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenRouter => "OPENROUTER_API_KEY",
            LlmProvider::Groq => "GROQ_API_KEY",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenRouter => DEFAULT_OPENROUTER_MODEL,
            LlmProvider::Groq => DEFAULT_GROQ_MODEL,
        }
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openrouter" => Ok(LlmProvider::OpenRouter),
            "groq" => Ok(LlmProvider::Groq),
            _ => Err(ConfigError::InvalidValue {
                name: "LLM_PROVIDER",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: String,
    pub model: String,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub llm: LlmConfig,
    pub policy_pdf_path: PathBuf,
    pub policy_text: Option<String>,
    pub failure_policy: FailurePolicy,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let provider = match get("LLM_PROVIDER") {
            Some(value) => value.parse()?,
            None if get("OPENROUTER_API_KEY").is_none() && get("GROQ_API_KEY").is_some() => {
                LlmProvider::Groq
            }
            None => LlmProvider::OpenRouter,
        };

        let api_key_var = provider.api_key_var();
        let api_key = get(api_key_var).ok_or(ConfigError::MissingVar(api_key_var))?;

        let model = get("LLM_MODEL")
            .or_else(|| match provider {
                LlmProvider::Groq => get("GROQ_MODEL"),
                LlmProvider::OpenRouter => None,
            })
            .unwrap_or_else(|| provider.default_model().to_string());

        let timeout = get("LLM_TIMEOUT_SECS")
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| ConfigError::InvalidValue {
                        name: "LLM_TIMEOUT_SECS",
                        value,
                    })
            })
            .transpose()?;

        let failure_policy = match get("FAILURE_POLICY") {
            Some(value) => value.parse()?,
            None => FailurePolicy::default(),
        };

        Ok(Self {
            llm: LlmConfig {
                provider,
                api_key,
                model,
                timeout,
            },
            policy_pdf_path: get("POLICY_PDF_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_POLICY_PDF_PATH)),
            policy_text: get("POLICY_TEXT"),
            failure_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_to_openrouter() {
        let config = ServiceConfig::from_lookup(lookup(&[("OPENROUTER_API_KEY", "sk-test")])).unwrap();

        assert_eq!(config.llm.provider, LlmProvider::OpenRouter);
        assert_eq!(config.llm.model, DEFAULT_OPENROUTER_MODEL);
        assert_eq!(config.llm.timeout, None);
        assert_eq!(config.policy_pdf_path, PathBuf::from(DEFAULT_POLICY_PDF_PATH));
        assert_eq!(config.policy_text, None);
        assert_eq!(config.failure_policy, FailurePolicy::AbortBatch);
    }

    #[test]
    fn test_groq_uses_groq_model() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("LLM_PROVIDER", "Groq"),
            ("GROQ_API_KEY", "gsk-test"),
            ("GROQ_MODEL", "mixtral-8x7b"),
            ("LLM_TIMEOUT_SECS", "30"),
            ("FAILURE_POLICY", "isolate"),
        ]))
        .unwrap();

        assert_eq!(config.llm.provider, LlmProvider::Groq);
        assert_eq!(config.llm.model, "mixtral-8x7b");
        assert_eq!(config.llm.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.failure_policy, FailurePolicy::IsolateClaim);
    }

    #[test]
    fn test_missing_key_is_reported() {
        let err = ServiceConfig::from_lookup(lookup(&[("LLM_PROVIDER", "groq")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("GROQ_API_KEY"));
    }

    #[test]
    fn test_blank_policy_text_counts_as_unset() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("POLICY_TEXT", "   "),
        ]))
        .unwrap();
        assert_eq!(config.policy_text, None);
    }

    #[test]
    fn test_groq_key_alone_selects_groq() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("GROQ_MODEL", "llama-3.1-8b-instant"),
        ]))
        .unwrap();

        assert_eq!(config.llm.provider, LlmProvider::Groq);
        assert_eq!(config.llm.api_key, "gsk-test");
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
    }

    #[test]
    fn test_both_keys_keep_openrouter_default() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("GROQ_API_KEY", "gsk-test"),
        ]))
        .unwrap();
        assert_eq!(config.llm.provider, LlmProvider::OpenRouter);
    }

    #[test]
    fn test_invalid_timeout() {
        let err = ServiceConfig::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("LLM_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "LLM_TIMEOUT_SECS", .. }));
    }
}
