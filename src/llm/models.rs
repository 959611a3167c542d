//! Model discovery through each provider's REST listing endpoint.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LlmError, Result};
use crate::llm::Provider;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One selectable model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

fn list_url(provider: Provider) -> &'static str {
    match provider {
        Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta/models",
        Provider::Groq => "https://api.groq.com/openai/v1/models",
        Provider::OpenRouter => "https://openrouter.ai/api/v1/models",
        Provider::OpenAi => "https://api.openai.com/v1/models",
        Provider::Anthropic => "https://api.anthropic.com/v1/models",
    }
}

/// List the models a provider offers, sorted by display name.
///
/// Every provider except OpenRouter needs a key to answer.
pub async fn fetch_available_models(
    provider: Provider,
    api_key: Option<&SecretString>,
) -> Result<Vec<ModelInfo>> {
    let key = api_key
        .map(|k| k.expose_secret().trim())
        .filter(|k| !k.is_empty());

    if key.is_none() && provider != Provider::OpenRouter {
        return Err(ConfigError::MissingRequired {
            key: "api_key".to_string(),
            hint: "API Key is required to fetch models.".to_string(),
        }
        .into());
    }

    let client = reqwest::Client::new();
    let mut request = client.get(list_url(provider));
    request = match (provider, key) {
        (Provider::Gemini, Some(k)) => request.query(&[("key", k)]),
        (Provider::Anthropic, Some(k)) => request
            .header("x-api-key", k)
            .header("anthropic-version", ANTHROPIC_VERSION),
        (_, Some(k)) => request.bearer_auth(k),
        (_, None) => request,
    };

    let response = request.send().await.map_err(|e| transport_error(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(provider = %provider, status = %status, "Model listing failed");
        return Err(status_error(provider, status.as_u16(), &body).into());
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| LlmError::InvalidResponse {
            provider: provider.to_string(),
            reason: e.to_string(),
        })?;

    let models = parse_models(provider, &body)?;
    tracing::debug!(provider = %provider, count = models.len(), "Fetched models");
    Ok(models)
}

fn transport_error(provider: Provider, e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout {
            provider: provider.to_string(),
            reason: e.to_string(),
        }
    } else {
        LlmError::Network {
            provider: provider.to_string(),
            reason: e.to_string(),
        }
    }
}

fn status_error(provider: Provider, status: u16, body: &str) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthFailed {
            provider: provider.to_string(),
        },
        429 => LlmError::RateLimited {
            provider: provider.to_string(),
            retry_after: None,
        },
        _ => LlmError::RequestFailed {
            provider: provider.to_string(),
            reason: format!(
                "{} API Error: HTTP {} {}",
                provider.as_str().to_uppercase(),
                status,
                body
            ),
        },
    }
}

/// Turn a listing response body into sorted `ModelInfo`s.
pub fn parse_models(
    provider: Provider,
    body: &serde_json::Value,
) -> std::result::Result<Vec<ModelInfo>, LlmError> {
    let invalid = |reason: &str| LlmError::InvalidResponse {
        provider: provider.to_string(),
        reason: reason.to_string(),
    };

    let mut models: Vec<ModelInfo> = match provider {
        Provider::Gemini => body
            .get("models")
            .and_then(|v| v.as_array())
            .ok_or_else(|| invalid("missing 'models' array"))?
            .iter()
            .filter(|m| {
                m.get("supportedGenerationMethods")
                    .and_then(|v| v.as_array())
                    .is_some_and(|methods| methods.iter().any(|x| x == "generateContent"))
            })
            .filter_map(|m| {
                let full = m.get("name")?.as_str()?;
                let id = full.strip_prefix("models/").unwrap_or(full).to_string();
                let name = m
                    .get("displayName")
                    .and_then(|v| v.as_str())
                    .unwrap_or(&id)
                    .to_string();
                Some(ModelInfo { id, name })
            })
            .collect(),
        _ => body
            .get("data")
            .and_then(|v| v.as_array())
            .ok_or_else(|| invalid("missing 'data' array"))?
            .iter()
            .filter_map(|m| {
                let id = m.get("id")?.as_str()?.to_string();
                let name = match provider {
                    Provider::Anthropic => m.get("display_name").and_then(|v| v.as_str()),
                    _ => None,
                }
                .unwrap_or(&id)
                .to_string();
                Some(ModelInfo { id, name })
            })
            .collect(),
    };

    models.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(models)
}
