// src/services/whatsapp.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("WhatsApp não configurado (WHATSAPP_PHONE_NUMBER_ID / WHATSAPP_TOKEN)")]
    NotConfigured,

    #[error("falha de rede: {0}")]
    Network(String),

    #[error("API do WhatsApp respondeu {status}: {message}")]
    Api { status: u16, message: String },
}

/// Quem efetivamente entrega a mensagem. O cron só conhece este trait.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// `to` já vem normalizado (só dígitos, com código do país).
    async fn send_text(&self, to: &str, body: &str) -> Result<(), SendError>;
}

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub api_url: String,
    pub phone_number_id: Option<String>,
    pub access_token: Option<String>,
}

// Payload da Cloud API: POST /{phone-number-id}/messages
#[derive(Debug, Serialize)]
struct TextMessageRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

/// Cliente da API do WhatsApp (Meta Graph).
#[derive(Clone)]
pub struct WhatsAppClient {
    http: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppClient {
    pub fn new(config: WhatsAppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { http, config })
    }

    fn messages_url(&self, phone_number_id: &str) -> String {
        format!("{}/{}/messages", self.config.api_url.trim_end_matches('/'), phone_number_id)
    }
}

#[async_trait]
impl MessageSender for WhatsAppClient {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), SendError> {
        let (Some(phone_number_id), Some(token)) =
            (&self.config.phone_number_id, &self.config.access_token)
        else {
            return Err(SendError::NotConfigured);
        };

        let payload = TextMessageRequest {
            messaging_product: "whatsapp",
            to,
            kind: "text",
            text: TextBody { body },
        };

        let response = self
            .http
            .post(self.messages_url(phone_number_id))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SendError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(to, "📨 Mensagem de WhatsApp aceita");
            return Ok(());
        }

        // A Graph API devolve { "error": { "message": ... } }; se não vier nesse formato, usa o texto cru
        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GraphErrorEnvelope>(&raw)
            .map(|env| env.error.message)
            .unwrap_or(raw);

        Err(SendError::Api { status: status.as_u16(), message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(api_url: String) -> WhatsAppClient {
        WhatsAppClient::new(WhatsAppConfig {
            api_url,
            phone_number_id: Some("12345".into()),
            access_token: Some("test-token".into()),
        })
        .expect("http client")
    }

    #[tokio::test]
    async fn sends_text_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v19.0/12345/messages"))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_json(json!({
                "messaging_product": "whatsapp",
                "to": "919876543210",
                "type": "text",
                "text": { "body": "Happy birthday!" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [{ "id": "wamid.1" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(format!("{}/v19.0/", server.uri()))
            .send_text("919876543210", "Happy birthday!")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn surfaces_graph_error_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Recipient phone number not in allowed list", "code": 131030 }
            })))
            .mount(&server)
            .await;

        let result = client(server.uri()).send_text("919876543210", "hi").await;

        match result {
            Err(SendError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Recipient phone number not in allowed list");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_credentials_fail_without_calling_out() {
        let client = WhatsAppClient::new(WhatsAppConfig {
            api_url: "http://127.0.0.1:9".into(),
            phone_number_id: None,
            access_token: Some("t".into()),
        })
        .expect("http client");

        let result = client.send_text("919876543210", "hi").await;

        assert!(matches!(result, Err(SendError::NotConfigured)));
    }
}
