use anyhow::{Context, Result};
use async_trait::async_trait;
use gemini_client::GeminiClient;
use gemini_client::types::{Content, GenerateContentRequest};
use interview_core::model::{FALLBACK_REPLY, ModelClient};
use interview_core::transcript::{Speaker, Turn};

/// An adapter that implements the core `ModelClient` trait on top of `gemini_client::GeminiClient`.
pub struct GeminiAdapter {
    client: GeminiClient,
    system_instruction: String,
}

impl GeminiAdapter {
    pub fn new(client: GeminiClient, system_instruction: String) -> Self {
        Self {
            client,
            system_instruction,
        }
    }

    /// System instruction first, then every turn oldest first.
    pub fn build_request(system_instruction: &str, transcript: &[Turn]) -> GenerateContentRequest {
        let mut contents = Vec::with_capacity(transcript.len() + 1);
        contents.push(Content::text("user", system_instruction));
        contents.extend(transcript.iter().map(|turn| {
            let role = match turn.speaker {
                Speaker::Candidate => "user",
                Speaker::Interviewer => "model",
            };
            Content::text(role, turn.text.clone())
        }));
        GenerateContentRequest { contents }
    }

    async fn try_ask(&self, transcript: &[Turn]) -> Result<String> {
        let request = Self::build_request(&self.system_instruction, transcript);
        let response = self
            .client
            .generate_content(&request)
            .await
            .context("Gemini request failed")?;

        let text = response
            .first_text()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .context("Gemini response contained no reply text")?;
        Ok(text.to_string())
    }
}

#[async_trait]
impl ModelClient for GeminiAdapter {
    async fn ask(&self, transcript: &[Turn]) -> String {
        match self.try_ask(transcript).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    "Failed to get next question from {}: {:?}",
                    self.client.model(),
                    e
                );
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::model::SYSTEM_INSTRUCTION;
    use interview_core::session_state::OPENING_QUESTION;
    use secrecy::SecretString;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> GeminiAdapter {
        let client = GeminiClient::new(SecretString::from("test-key".to_string()), "gemini-test")
            .with_base_url(&server.uri());
        GeminiAdapter::new(client, SYSTEM_INSTRUCTION.to_string())
    }

    fn transcript() -> Vec<Turn> {
        vec![
            Turn::interviewer(OPENING_QUESTION),
            Turn::candidate("I maintain a database driver."),
        ]
    }

    #[test]
    fn test_build_request_puts_instruction_first_and_maps_roles() {
        let request = GeminiAdapter::build_request("be brief", &transcript());

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "be brief"}]},
                    {"role": "model", "parts": [{"text": OPENING_QUESTION}]},
                    {"role": "user", "parts": [{"text": "I maintain a database driver."}]}
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_reply_text_is_taken_from_first_candidate() {
        let server = MockServer::start().await;
        let expected_body =
            serde_json::to_value(GeminiAdapter::build_request(SYSTEM_INSTRUCTION, &transcript()))
                .unwrap();
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(body_json(expected_body))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "Next question?"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = adapter(&server).ask(&transcript()).await;

        assert_eq!(reply, "Next question?");
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": []}}]
            })))
            .mount(&server)
            .await;

        let reply = adapter(&server).ask(&transcript()).await;

        assert_eq!(reply, "Sorry, I couldn't understand.");
    }

    #[tokio::test]
    async fn test_server_error_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let reply = adapter(&server).ask(&transcript()).await;

        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        let client = GeminiClient::new(SecretString::from("test-key".to_string()), "gemini-test")
            .with_base_url("http://127.0.0.1:9");
        let adapter = GeminiAdapter::new(client, SYSTEM_INSTRUCTION.to_string());

        let reply = adapter.ask(&transcript()).await;

        assert_eq!(reply, FALLBACK_REPLY);
    }
}
