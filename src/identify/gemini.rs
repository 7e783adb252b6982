//! Gemini (Google Generative Language API) client
//!
//! Sends the photo as inline data with an instruction prompt and asks for a
//! JSON response constrained to the identification schema.

use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;

use super::check_status;
use crate::error::IdentifyError;
use crate::state::data::{IdentificationRequest, IdentificationResult};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const PROMPT: &str = "You are an expert naturalist and field biologist. \
Identify the species in the photo as precisely as you can, whether it is an animal, plant, fungus or other organism. \
Return its common name, scientific (binomial) name, taxonomic classification, typical habitat, diet (or nutrition for non-animals), \
IUCN conservation status and a few interesting facts. \
Set confidence to how sure you are of the identification, from 0 to 100. \
Include `venomous` only for animals, and only when venom is a meaningful trait for the species group.";

#[derive(Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

/// `generateContent` response, reduced to what we read
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(
        http_client: reqwest::Client,
        base_url: Option<String>,
        model: String,
        api_key: Option<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            model,
            api_key,
        }
    }

    pub async fn identify(
        &self,
        request: &IdentificationRequest,
    ) -> Result<IdentificationResult, IdentifyError> {
        let api_key = self.api_key.as_deref().ok_or(IdentifyError::MissingApiKey)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request_body(request))
            .send()
            .await
            .map_err(|e| IdentifyError::Network(e.to_string()))?;

        let response: GenerateContentResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| IdentifyError::Parse(e.to_string()))?;

        let text = first_text(&response)?;
        log::debug!("Gemini returned {} bytes of JSON", text.len());
        IdentificationResult::from_json(text)
    }
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Build the `generateContent` request body
fn request_body(request: &IdentificationRequest) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "text": PROMPT },
                {
                    "inlineData": {
                        "mimeType": request.image.mime().as_str(),
                        "data": request.image.payload()
                    }
                }
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema()
        }
    })
}

/// OpenAPI-subset schema for `IdentificationResult`
fn response_schema() -> Value {
    let text = |description: &str| json!({ "type": "STRING", "description": description });

    json!({
        "type": "OBJECT",
        "properties": {
            "speciesName": text("Common name of the species"),
            "scientificName": text("Scientific (binomial) name"),
            "speciesClassification": text("Taxonomic classification, kingdom to family"),
            "habitat": text("Where the species typically lives"),
            "diet": text("What the species eats or how it obtains nutrients"),
            "conservationStatus": text("IUCN conservation status"),
            "interestingFacts": text("A few interesting facts"),
            "confidence": { "type": "NUMBER", "description": "Confidence from 0 to 100" },
            "venomous": { "type": "BOOLEAN", "description": "Whether the animal is venomous" }
        },
        "required": [
            "speciesName",
            "scientificName",
            "speciesClassification",
            "habitat",
            "diet",
            "conservationStatus",
            "interestingFacts",
            "confidence"
        ]
    })
}

/// Text of the first candidate's first text part
fn first_text(response: &GenerateContentResponse) -> Result<&str, IdentifyError> {
    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| IdentifyError::Malformed("no candidates".to_string()))?;

    candidate
        .content
        .as_ref()
        .and_then(|content| content.parts.iter().find_map(|part| part.text.as_deref()))
        .ok_or_else(|| {
            IdentifyError::Malformed(format!(
                "candidate has no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identify::test_server::serve_once;
    use crate::state::data::{EncodedImage, ImageMime};

    fn request() -> IdentificationRequest {
        IdentificationRequest {
            ticket: 1,
            image: EncodedImage::from_bytes(ImageMime::Webp, b"RIFF"),
        }
    }

    #[test]
    fn test_request_body_carries_image_and_schema() {
        let body = request_body(&request());
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/webp");
        assert_eq!(parts[1]["inlineData"]["data"], "UklGRg==");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");

        let required = body["generationConfig"]["responseSchema"]["required"]
            .as_array()
            .unwrap();
        assert!(required.iter().any(|r| r == "confidence"));
        assert!(!required.iter().any(|r| r == "venomous"));
    }

    #[test]
    fn test_blocked_candidate_is_malformed() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        let err = first_text(&response).unwrap_err();
        assert_eq!(
            err,
            IdentifyError::Malformed("candidate has no text (finish reason: SAFETY)".to_string())
        );

        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(first_text(&empty).is_err());
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let client = GeminiClient::new(reqwest::Client::new(), None, "gemini-2.0-flash".to_string(), None);
        assert_eq!(
            client.identify(&request()).await.unwrap_err(),
            IdentifyError::MissingApiKey
        );
    }

    #[tokio::test]
    async fn test_parses_structured_output() {
        let inner = r#"{"speciesName":"Inland Taipan","scientificName":"Oxyuranus microlepidotus","speciesClassification":"Reptilia > Squamata > Elapidae","habitat":"Arid central Australia","diet":"Rodents","conservationStatus":"Least Concern","interestingFacts":"Most toxic venom of any land snake.","confidence":64.0,"venomous":true}"#;
        let body = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": inner }] },
                "finishReason": "STOP"
            }]
        })
        .to_string();

        let (url, server) = serve_once(200, &body).await;
        let client = GeminiClient::new(
            reqwest::Client::new(),
            Some(format!("{url}/")),
            "gemini-test".to_string(),
            Some("k3y".to_string()),
        );

        let result = client.identify(&request()).await.unwrap();
        assert_eq!(result.species_name, "Inland Taipan");
        assert_eq!(result.venomous, Some(true));
        assert_eq!(result.confidence, 64.0);

        let captured = server.await.unwrap();
        assert!(captured
            .head
            .starts_with("POST /v1beta/models/gemini-test:generateContent "));
        assert!(captured.head.to_lowercase().contains("x-goog-api-key: k3y"));
    }
}
