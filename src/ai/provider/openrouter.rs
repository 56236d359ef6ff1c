//! OpenRouter API Provider
//!
//! Chat-completions wire format (`POST {api_base}/chat/completions`) with a
//! strict `json_schema` response format. The structured output is the text of
//! `choices[0].message.content`.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{
    CredentialResolver, LlmProvider, extract_output_schema, normalize_base,
    parse_structured_output, resolve_api_key,
};
use crate::constants::provider::{OPENROUTER, OPENROUTER_API_BASE, STRUCTURED_OUTPUT_NAME};
use crate::types::{AgentRunRequest, ChatMessage, ClarionError, Result, StructuredOutput};

pub struct OpenRouterProvider {
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenRouterProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterProvider")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Default for OpenRouterProvider {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), OPENROUTER_API_BASE)
    }
}

impl OpenRouterProvider {
    pub fn new(client: reqwest::Client, api_base: &str) -> Self {
        Self {
            api_base: normalize_base(api_base),
            client,
        }
    }

    fn build_request(
        &self,
        messages: &[ChatMessage],
        request: &AgentRunRequest,
    ) -> Result<ChatCompletionRequest> {
        let response_format =
            extract_output_schema(&request.output_schema)?.map(|schema| ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaSpec {
                    name: STRUCTURED_OUTPUT_NAME.to_string(),
                    strict: true,
                    schema,
                },
            });

        let config = &request.llm_config;
        Ok(ChatCompletionRequest {
            model: config.model.clone(),
            messages: messages.to_vec(),
            response_format,
            temperature: config.param_f64("temperature"),
            top_p: config.param_f64("top_p"),
            max_tokens: config.param_u64("max_tokens"),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        OPENROUTER
    }

    fn build_payload(&self, messages: &[ChatMessage], request: &AgentRunRequest) -> Result<Value> {
        Ok(serde_json::to_value(self.build_request(messages, request)?)?)
    }

    #[instrument(skip_all, fields(model = %request.llm_config.model))]
    async fn generate(
        &self,
        messages: &[ChatMessage],
        request: &AgentRunRequest,
        credentials: &dyn CredentialResolver,
    ) -> Result<StructuredOutput> {
        let api_key = resolve_api_key(credentials, &request.llm_config).await?;
        let body = self.build_request(messages, request)?;
        let url = format!("{}/chat/completions", self.api_base);

        info!("Generating with OpenRouter");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ClarionError::http(OPENROUTER, e))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| ClarionError::http(OPENROUTER, e))?;

        if !status.is_success() {
            // Prefer the structured error message when the body carries one
            let body = serde_json::from_str::<ErrorEnvelope>(&raw)
                .ok()
                .map(|env| env.error.message)
                .filter(|m| !m.is_empty())
                .unwrap_or(raw);
            return Err(ClarionError::ProviderApi {
                provider: OPENROUTER.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        debug!(bytes = raw.len(), "Received OpenRouter response");

        let parsed: ChatCompletionResponse = serde_json::from_str(&raw).map_err(|e| {
            ClarionError::response_shape(
                OPENROUTER,
                format!("failed to decode response: {}. Body: {}", e, raw),
            )
        })?;

        if let Some(error) = parsed.error {
            return Err(ClarionError::response_shape(
                OPENROUTER,
                format!("API returned an error: {}", error.message),
            ));
        }

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ClarionError::response_shape(OPENROUTER, "choices array is empty"))?;

        parse_structured_output(content)
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchemaSpec,
}

#[derive(Debug, Serialize)]
struct JsonSchemaSpec {
    name: String,
    strict: bool,
    schema: Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::InMemoryCredentialStore;
    use crate::types::{LlmConfig, LlmProviderConfig};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn run_request(params: Value, schema: Value) -> AgentRunRequest {
        AgentRunRequest {
            system_instruction: String::new(),
            prompt: "task".into(),
            output_schema: schema.as_object().cloned().unwrap_or_default(),
            llm_config: LlmConfig {
                provider: OPENROUTER.into(),
                model: "anthropic/claude-sonnet-4".into(),
                parameters: params.as_object().cloned().unwrap_or_default(),
                config_id: "router".into(),
            },
        }
    }

    fn store() -> InMemoryCredentialStore {
        InMemoryCredentialStore::new()
            .with(LlmProviderConfig::new("router", "Router", OPENROUTER, "or-key"))
    }

    fn messages() -> Vec<ChatMessage> {
        vec![ChatMessage::user("## User's Task\ntask")]
    }

    #[test]
    fn test_payload_shape() {
        let provider = OpenRouterProvider::default();
        let request = run_request(
            json!({"temperature": 0.0, "max_tokens": 1000, "reasoning_effort": "low"}),
            json!({"schema": {"type": "object", "properties": {"summary": {"type": "string"}}}}),
        );
        let payload = provider.build_payload(&messages(), &request).unwrap();

        assert_eq!(payload["model"], "anthropic/claude-sonnet-4");
        assert_eq!(
            payload["messages"],
            json!([{"role": "user", "content": "## User's Task\ntask"}])
        );
        assert_eq!(payload["temperature"], json!(0.0));
        assert_eq!(payload["max_tokens"], json!(1000));
        assert!(payload.get("reasoning").is_none());
        assert!(payload.get("top_p").is_none());

        let format = &payload["response_format"];
        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["name"], "structured_output");
        assert_eq!(format["json_schema"]["strict"], json!(true));
        assert_eq!(format["json_schema"]["schema"]["required"], json!(["summary"]));
    }

    #[test]
    fn test_payload_rejects_malformed_schema() {
        let provider = OpenRouterProvider::default();
        let request = run_request(json!({}), json!({"properties": {}}));
        assert!(matches!(
            provider.build_payload(&messages(), &request),
            Err(ClarionError::InvalidSchema(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_parses_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer or-key"))
            .and(body_partial_json(json!({"model": "anthropic/claude-sonnet-4"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "{\"summary\": \"hi\"}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenRouterProvider::new(reqwest::Client::new(), &server.uri());
        let out = provider
            .generate(&messages(), &run_request(json!({}), json!({})), &store())
            .await
            .unwrap();
        assert_eq!(out["summary"], "hi");
    }

    #[tokio::test]
    async fn test_generate_prefers_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(402)
                    .set_body_json(json!({"error": {"message": "Insufficient credits"}})),
            )
            .mount(&server)
            .await;

        let provider = OpenRouterProvider::new(reqwest::Client::new(), &server.uri());
        let err = provider
            .generate(&messages(), &run_request(json!({}), json!({})), &store())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "OpenRouter API error (402): Insufficient credits"
        );
    }

    #[tokio::test]
    async fn test_generate_falls_back_to_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let provider = OpenRouterProvider::new(reqwest::Client::new(), &server.uri());
        let err = provider
            .generate(&messages(), &run_request(json!({}), json!({})), &store())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "OpenRouter API error (500): upstream down");
    }

    #[tokio::test]
    async fn test_generate_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let provider = OpenRouterProvider::new(reqwest::Client::new(), &server.uri());
        let err = provider
            .generate(&messages(), &run_request(json!({}), json!({})), &store())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("choices array is empty"));
    }
}
