//! Real responder — a tool-calling loop over an `LlmProvider`.
//!
//! Each turn runs on a spawned task and feeds events through a channel. Tool
//! results are handed back to the model and also translated into UI
//! components, so the user sees the cards the model is reading from.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::context::ToolContext;
use crate::deck::SpreadKind;
use crate::error::{ComponentError, ConfigError, ErrorCode, LlmError, ResponderError};
use crate::llm::{
    ChatMessage, LlmConfig, LlmProvider, Provider, ToolCompletionRequest, create_provider,
};
use crate::locale::Locale;
use crate::responder::event::{Component, DEFAULT_REVEAL_DELAY_MS, ResponseEvent};
use crate::responder::{EventStream, Responder};
use crate::tools::{DECK_COMPONENT_TYPE, ToolRegistry};

/// Default cap on model round trips per turn.
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 5;

const EVENT_BUFFER: usize = 32;

/// Provider settings for the real responder.
#[derive(Debug, Clone)]
pub struct LlmResponderConfig {
    pub provider: Provider,
    pub api_key: Option<SecretString>,
    /// Empty means the provider's default model.
    pub model: String,
    pub locale: Locale,
    pub max_tool_iterations: usize,
}

impl Default for LlmResponderConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_key: None,
            model: String::new(),
            locale: Locale::default(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }
}

/// Partial settings merged by [`LlmResponder::update_config`].
#[derive(Debug, Clone, Default)]
pub struct LlmConfigUpdate {
    pub provider: Option<Provider>,
    pub api_key: Option<SecretString>,
    pub model: Option<String>,
    pub locale: Option<Locale>,
}

/// A failed turn, reported to whoever shows error notices.
#[derive(Debug)]
pub struct FailureNotice {
    pub provider: Provider,
    pub error: ResponderError,
}

/// Streams answers from a real model with tarot tools attached.
pub struct LlmResponder {
    config: LlmResponderConfig,
    tools: Arc<ToolRegistry>,
    history: Arc<Mutex<Vec<ChatMessage>>>,
    failures: Option<mpsc::UnboundedSender<FailureNotice>>,
    /// Fixed provider used instead of building one from `config`.
    provider: Option<Arc<dyn LlmProvider>>,
}

impl LlmResponder {
    pub fn new(config: LlmResponderConfig) -> Self {
        Self {
            config,
            tools: Arc::new(ToolRegistry::with_tarot_tools()),
            history: Arc::new(Mutex::new(Vec::new())),
            failures: None,
            provider: None,
        }
    }

    /// Use an already-built provider; the API key check is skipped.
    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replace the tarot tools, e.g. with a narrower set.
    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    /// Send a [`FailureNotice`] here whenever a turn fails.
    pub fn with_failure_channel(mut self, tx: mpsc::UnboundedSender<FailureNotice>) -> Self {
        self.failures = Some(tx);
        self
    }

    pub fn config(&self) -> &LlmResponderConfig {
        &self.config
    }

    /// Merge new settings. Only present fields change.
    pub fn update_config(&mut self, update: LlmConfigUpdate) {
        if let Some(provider) = update.provider {
            self.config.provider = provider;
        }
        if let Some(key) = update.api_key {
            self.config.api_key = Some(key);
        }
        if let Some(model) = update.model {
            self.config.model = model;
        }
        if let Some(locale) = update.locale {
            self.config.locale = locale;
        }
        info!(
            provider = %self.config.provider,
            model = %self.config.model,
            "LLM responder reconfigured"
        );
    }

    /// Snapshot of the conversation kept between turns.
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().await.clone()
    }

    fn resolve_provider(&self) -> Result<Arc<dyn LlmProvider>, ResponderError> {
        if let Some(provider) = &self.provider {
            return Ok(Arc::clone(provider));
        }

        let api_key = self
            .config
            .api_key
            .as_ref()
            .filter(|k| !k.expose_secret().trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "api_key".to_string(),
                hint: "API Key is missing. Please configure it in settings.".to_string(),
            })?;

        let provider = create_provider(&LlmConfig {
            provider: self.config.provider,
            api_key: api_key.clone(),
            model: self.config.model.clone(),
        })?;
        Ok(provider)
    }
}

#[async_trait]
impl Responder for LlmResponder {
    fn name(&self) -> &str {
        "llm"
    }

    fn stream_response(&self, user_message: &str) -> EventStream {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let turn = Turn {
            user_message: user_message.to_string(),
            locale: self.config.locale,
            max_iterations: self.config.max_tool_iterations.max(1),
            tools: Arc::clone(&self.tools),
            history: Arc::clone(&self.history),
            events: tx,
        };
        let provider_name = self.config.provider;
        let failures = self.failures.clone();
        let llm = self.resolve_provider();

        tokio::spawn(async move {
            let events = turn.events.clone();
            let result = match llm {
                Ok(llm) => turn.run(llm).await,
                Err(e) => Err(e),
            };

            let final_event = match result {
                Ok(full_text) => ResponseEvent::done(full_text),
                Err(error) => {
                    warn!(provider = %provider_name, error = %error, "LLM turn failed");
                    let event = ResponseEvent::error(error.to_string(), error.code());
                    if let Some(tx) = failures {
                        let _ = tx.send(FailureNotice {
                            provider: provider_name,
                            error,
                        });
                    }
                    event
                }
            };
            let _ = events.send(Ok(final_event)).await;
        });

        Box::pin(ReceiverStream::new(rx))
    }

    async fn clear_history(&self) {
        self.history.lock().await.clear();
        debug!("LLM history cleared");
    }
}

/// Everything one spawned turn needs.
struct Turn {
    user_message: String,
    locale: Locale,
    max_iterations: usize,
    tools: Arc<ToolRegistry>,
    history: Arc<Mutex<Vec<ChatMessage>>>,
    events: mpsc::Sender<Result<ResponseEvent, ResponderError>>,
}

impl Turn {
    async fn emit(&self, event: ResponseEvent) {
        // A dropped receiver means nobody is listening; the turn still completes.
        let _ = self.events.send(Ok(event)).await;
    }

    async fn run(&self, llm: Arc<dyn LlmProvider>) -> Result<String, ResponderError> {
        let tool_ctx = ToolContext::new(self.locale);
        let tools = self.tools.tool_definitions().await;

        let mut messages = vec![ChatMessage::system(self.locale.strings().system_prompt)];
        messages.extend(self.history.lock().await.iter().cloned());
        messages.push(ChatMessage::user(&self.user_message));

        let mut full_text = String::new();
        let (mut input_tokens, mut output_tokens) = (0u32, 0u32);
        let mut finished = false;

        for iteration in 0..self.max_iterations {
            let mut request = ToolCompletionRequest::new(messages.clone(), tools.clone());
            request
                .metadata
                .insert("turn_id".to_string(), tool_ctx.turn_id.to_string());

            let response = llm.complete_with_tools(request).await?;
            input_tokens += response.input_tokens;
            output_tokens += response.output_tokens;

            let content = response.content.filter(|t| !t.is_empty());
            if let Some(text) = content.as_deref() {
                full_text.push_str(text);
                self.emit(ResponseEvent::text(text, full_text.clone())).await;
            }

            if response.tool_calls.is_empty() {
                finished = true;
                break;
            }

            debug!(
                iteration,
                count = response.tool_calls.len(),
                "Model requested tool calls"
            );
            messages.push(ChatMessage::assistant_with_tool_calls(
                content,
                response.tool_calls.clone(),
            ));

            for call in response.tool_calls {
                let output = self
                    .tools
                    .execute(&call.name, call.arguments.clone(), &tool_ctx)
                    .await?;

                match component_for_tool_output(&output.result)? {
                    Some(component) => self.emit(ResponseEvent::component(component)).await,
                    None => warn!(tool = %call.name, "Tool output has no component shape, skipped"),
                }

                messages.push(ChatMessage::tool_result(
                    &call.id,
                    &call.name,
                    output.to_content(),
                ));
            }
        }

        if !finished {
            return Err(LlmError::IterationLimit {
                max: self.max_iterations,
            }
            .into());
        }

        let mut history = self.history.lock().await;
        history.push(ChatMessage::user(&self.user_message));
        if !full_text.is_empty() {
            history.push(ChatMessage::assistant(&full_text));
        }

        info!(
            model = %llm.model_name(),
            input_tokens,
            output_tokens,
            "LLM turn complete"
        );
        Ok(full_text)
    }
}

/// Translate a tool result into the component the UI shows for it.
///
/// Card arrays become a single card or a spread (three cards are a
/// three-card spread, any other count a Celtic Cross); a deck object becomes
/// an interactive deck. Both go through [`Component::from_parts`], so a
/// malformed payload is an error. Output of any other shape yields `None`.
pub fn component_for_tool_output(
    result: &serde_json::Value,
) -> Result<Option<Component>, ComponentError> {
    if let Some(obj) = result.as_object()
        && obj.get("componentType").and_then(|v| v.as_str()) == Some(DECK_COMPONENT_TYPE)
    {
        return Component::from_parts(DECK_COMPONENT_TYPE, result).map(Some);
    }

    let Some(cards) = result.as_array() else {
        return Ok(None);
    };
    let component = match cards.as_slice() {
        [] => return Ok(None),
        [card] => {
            let mut data = card.clone();
            if let Some(obj) = data.as_object_mut() {
                obj.entry("isRevealed").or_insert(serde_json::Value::Bool(true));
            }
            Component::from_parts("TarotCard", &data)?
        }
        _ => {
            let kind = if cards.len() == 3 {
                SpreadKind::ThreeCard
            } else {
                SpreadKind::CelticCross
            };
            let data = serde_json::json!({
                "spreadType": kind.as_str(),
                "cards": cards,
                "autoReveal": true,
                "revealDelay": DEFAULT_REVEAL_DELAY_MS,
            });
            Component::from_parts("TarotSpread", &data)?
        }
    };
    Ok(Some(component))
}

impl FailureNotice {
    pub fn code(&self) -> Option<ErrorCode> {
        self.error.code()
    }
}
