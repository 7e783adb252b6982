//! Direct flow endpoint client
//!
//! POSTs `{"photoDataUri": "..."}` and expects the `IdentificationResult`
//! JSON back.

use std::fmt;

use super::check_status;
use crate::error::IdentifyError;
use crate::state::data::{IdentificationRequest, IdentificationResult};

#[derive(Clone)]
pub struct FlowClient {
    http_client: reqwest::Client,
    endpoint: String,
    /// Sent as a bearer token when present
    token: Option<String>,
}

impl FlowClient {
    pub fn new(http_client: reqwest::Client, endpoint: String, token: Option<String>) -> Self {
        Self {
            http_client,
            endpoint,
            token,
        }
    }

    pub async fn identify(
        &self,
        request: &IdentificationRequest,
    ) -> Result<IdentificationResult, IdentifyError> {
        let mut builder = self.http_client.post(&self.endpoint).json(&request.input());
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| IdentifyError::Network(e.to_string()))?;

        let body = check_status(response)
            .await?
            .text()
            .await
            .map_err(|e| IdentifyError::Network(e.to_string()))?;

        IdentificationResult::from_json(&body)
    }
}

impl fmt::Debug for FlowClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowClient")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identify::test_server::serve_once;
    use crate::state::data::{EncodedImage, ImageMime};

    const OWL: &str = r#"{
        "speciesName": "Barn Owl",
        "scientificName": "Tyto alba",
        "speciesClassification": "Aves > Strigiformes > Tytonidae",
        "habitat": "Open country, farmland",
        "diet": "Small mammals",
        "conservationStatus": "Least Concern",
        "interestingFacts": "Hears prey under snow.",
        "confidence": 97.4,
        "venomous": false
    }"#;

    fn request() -> IdentificationRequest {
        IdentificationRequest {
            ticket: 7,
            image: EncodedImage::from_bytes(ImageMime::Png, b"\x89PNG"),
        }
    }

    #[tokio::test]
    async fn test_success_returns_body_unchanged() {
        let (url, server) = serve_once(200, OWL).await;
        let client = FlowClient::new(reqwest::Client::new(), format!("{url}/identify"), Some("s3cret".to_string()));

        let result = client.identify(&request()).await.unwrap();
        assert_eq!(result, serde_json::from_str::<IdentificationResult>(OWL).unwrap());

        let captured = server.await.unwrap();
        assert!(captured.head.starts_with("POST /identify "));
        assert!(captured.head.to_lowercase().contains("authorization: bearer s3cret"));
        let sent: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
        assert_eq!(sent["photoDataUri"], "data:image/png;base64,iVBORw==");
    }

    #[tokio::test]
    async fn test_server_error() {
        let (url, _server) = serve_once(500, r#"{"error":"boom"}"#).await;
        let client = FlowClient::new(reqwest::Client::new(), url, None);

        let err = client.identify(&request()).await.unwrap_err();
        assert_eq!(err, IdentifyError::Api(500, r#"{"error":"boom"}"#.to_string()));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (url, _server) = serve_once(200, r#"{"speciesName": "Half a fox"}"#).await;
        let client = FlowClient::new(reqwest::Client::new(), url, None);

        assert!(matches!(
            client.identify(&request()).await,
            Err(IdentifyError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let client = FlowClient::new(reqwest::Client::new(), "http://127.0.0.1:1".to_string(), None);
        assert!(matches!(
            client.identify(&request()).await,
            Err(IdentifyError::Network(_))
        ));
    }
}
