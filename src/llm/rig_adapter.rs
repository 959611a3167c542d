//! Bridges rig-core's `CompletionModel` to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::OneOrMany;
use rig::completion::{CompletionError, CompletionModel};
use rig::message::{AssistantContent, Message, ToolResultContent, UserContent};

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role, ToolCall,
    ToolCompletionRequest, ToolCompletionResponse, ToolDefinition,
};

/// Wraps any rig completion model.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
    provider: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            provider: "llm".to_string(),
        }
    }

    /// Name used in error messages and logs.
    pub fn with_provider(mut self, provider: &str) -> Self {
        self.provider = provider.to_string();
        self
    }

    async fn send(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDefinition>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<Parsed, LlmError> {
        let (preamble, mut history) = to_rig_messages(messages, &self.provider)?;
        let prompt = history.pop().ok_or_else(|| LlmError::InvalidResponse {
            provider: self.provider.clone(),
            reason: "request has no user or tool message".to_string(),
        })?;

        let mut builder = self.model.completion_request(prompt).messages(history);
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        if !tools.is_empty() {
            builder = builder.tools(
                tools
                    .into_iter()
                    .map(|t| rig::completion::ToolDefinition {
                        name: t.name,
                        description: t.description,
                        parameters: t.parameters,
                    })
                    .collect(),
            );
        }
        if let Some(max) = max_tokens {
            builder = builder.max_tokens(max as u64);
        }
        if let Some(temp) = temperature {
            builder = builder.temperature(temp as f64);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_completion_error(&self.provider, e))?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for content in response.choice.iter() {
            match content {
                AssistantContent::Text(t) => text.push_str(&t.text),
                AssistantContent::ToolCall(tc) => tool_calls.push(ToolCall {
                    id: tc.id.clone(),
                    name: tc.function.name.clone(),
                    arguments: tc.function.arguments.clone(),
                }),
                _ => {}
            }
        }

        Ok(Parsed {
            text,
            tool_calls,
            input_tokens: response.usage.input_tokens as u32,
            output_tokens: response.usage.output_tokens as u32,
        })
    }
}

struct Parsed {
    text: String,
    tool_calls: Vec<ToolCall>,
    input_tokens: u32,
    output_tokens: u32,
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let parsed = self
            .send(
                request.messages,
                Vec::new(),
                request.max_tokens,
                request.temperature,
            )
            .await?;

        Ok(CompletionResponse {
            content: parsed.text,
            input_tokens: parsed.input_tokens,
            output_tokens: parsed.output_tokens,
            finish_reason: FinishReason::Stop,
            response_id: None,
        })
    }

    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse, LlmError> {
        let parsed = self
            .send(
                request.messages,
                request.tools,
                request.max_tokens,
                request.temperature,
            )
            .await?;

        let finish_reason = if parsed.tool_calls.is_empty() {
            FinishReason::Stop
        } else {
            FinishReason::ToolUse
        };

        Ok(ToolCompletionResponse {
            content: (!parsed.text.is_empty()).then_some(parsed.text),
            tool_calls: parsed.tool_calls,
            input_tokens: parsed.input_tokens,
            output_tokens: parsed.output_tokens,
            finish_reason,
            response_id: None,
        })
    }
}

/// Split out system text as the preamble and convert the rest.
///
/// Consecutive tool results are merged into one user message so every result
/// follows the assistant turn that requested it.
fn to_rig_messages(
    messages: Vec<ChatMessage>,
    provider: &str,
) -> Result<(Option<String>, Vec<Message>), LlmError> {
    let mut system = Vec::new();
    let mut out: Vec<Message> = Vec::new();
    let mut pending_results: Vec<UserContent> = Vec::new();

    let empty = |what: &str| LlmError::InvalidResponse {
        provider: provider.to_string(),
        reason: format!("empty {} message", what),
    };

    for msg in messages {
        if msg.role != Role::Tool && !pending_results.is_empty() {
            let content = OneOrMany::many(std::mem::take(&mut pending_results))
                .map_err(|_| empty("tool result"))?;
            out.push(Message::User { content });
        }

        match msg.role {
            Role::System => system.push(msg.content),
            Role::User => out.push(Message::user(msg.content)),
            Role::Assistant if msg.tool_calls.is_empty() => {
                out.push(Message::assistant(msg.content));
            }
            Role::Assistant => {
                let mut parts = Vec::with_capacity(msg.tool_calls.len() + 1);
                if !msg.content.is_empty() {
                    parts.push(AssistantContent::text(msg.content));
                }
                for call in msg.tool_calls {
                    parts.push(AssistantContent::tool_call(call.id, call.name, call.arguments));
                }
                let content = OneOrMany::many(parts).map_err(|_| empty("assistant"))?;
                out.push(Message::Assistant { id: None, content });
            }
            Role::Tool => {
                let id = msg.tool_call_id.unwrap_or_default();
                pending_results.push(UserContent::tool_result(
                    id,
                    OneOrMany::one(ToolResultContent::text(msg.content)),
                ));
            }
        }
    }

    if !pending_results.is_empty() {
        let content = OneOrMany::many(pending_results).map_err(|_| empty("tool result"))?;
        out.push(Message::User { content });
    }

    let preamble = (!system.is_empty()).then(|| system.join("\n\n"));
    Ok((preamble, out))
}

fn map_completion_error(provider: &str, err: CompletionError) -> LlmError {
    let reason = err.to_string();
    let lower = reason.to_lowercase();
    let provider = provider.to_string();

    if lower.contains("401") || lower.contains("unauthorized") || lower.contains("api key") {
        LlmError::AuthFailed { provider }
    } else if lower.contains("429") || lower.contains("rate limit") || lower.contains("quota") {
        LlmError::RateLimited {
            provider,
            retry_after: None,
        }
    } else if lower.contains("timed out") || lower.contains("timeout") {
        LlmError::Timeout { provider, reason }
    } else if lower.contains("connect") || lower.contains("dns") || lower.contains("network") {
        LlmError::Network { provider, reason }
    } else {
        LlmError::RequestFailed { provider, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_messages_become_preamble() {
        let (preamble, messages) = to_rig_messages(
            vec![ChatMessage::system("be wise"), ChatMessage::user("hi")],
            "test",
        )
        .unwrap();
        assert_eq!(preamble.as_deref(), Some("be wise"));
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn consecutive_tool_results_merge() {
        let calls = vec![
            ToolCall {
                id: "a".into(),
                name: "draw_single_card".into(),
                arguments: serde_json::json!({}),
            },
            ToolCall {
                id: "b".into(),
                name: "show_interactive_deck".into(),
                arguments: serde_json::json!({"mode": "single"}),
            },
        ];
        let (_, messages) = to_rig_messages(
            vec![
                ChatMessage::user("read for me"),
                ChatMessage::assistant_with_tool_calls(None, calls),
                ChatMessage::tool_result("a", "draw_single_card", "[]"),
                ChatMessage::tool_result("b", "show_interactive_deck", "{}"),
            ],
            "test",
        )
        .unwrap();
        assert_eq!(messages.len(), 3);
        match &messages[2] {
            Message::User { content } => assert_eq!(content.len(), 2),
            other => panic!("expected user message, got {:?}", other),
        }
    }
}
