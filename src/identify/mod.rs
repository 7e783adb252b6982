//! Remote species identification
//!
//! The identification call is an opaque remote service with a typed contract:
//! an image data URI in, an `IdentificationResult` out. Two backends:
//! - `gemini`: Google Generative Language API, structured JSON output
//! - `flow`: any endpoint speaking the `{"photoDataUri"}` contract directly

pub mod flow;
pub mod gemini;

use std::time::Duration;

use crate::config::{Backend, IdentifierConfig};
use crate::error::IdentifyError;
use crate::state::data::{IdentificationRequest, IdentificationResult};

const USER_AGENT: &str = concat!("nature-id/", env!("CARGO_PKG_VERSION"));

/// The configured identification backend
#[derive(Debug, Clone)]
pub enum Identifier {
    Gemini(gemini::GeminiClient),
    Flow(flow::FlowClient),
}

impl Identifier {
    pub fn from_config(config: &IdentifierConfig) -> Result<Self, IdentifyError> {
        let http = http_client(Duration::from_secs(config.timeout_secs))?;

        match config.backend {
            Backend::Gemini => Ok(Identifier::Gemini(gemini::GeminiClient::new(
                http,
                config.endpoint.clone(),
                config.model.clone(),
                config.api_key.clone(),
            ))),
            Backend::Flow => {
                let endpoint = config.endpoint.clone().ok_or_else(|| {
                    IdentifyError::NotConfigured("flow backend needs an endpoint".to_string())
                })?;
                Ok(Identifier::Flow(flow::FlowClient::new(
                    http,
                    endpoint,
                    config.api_key.clone(),
                )))
            }
        }
    }

    /// Run one identification call
    pub async fn identify(
        self,
        request: IdentificationRequest,
    ) -> Result<IdentificationResult, IdentifyError> {
        log::info!(
            "🔍 Identifying image (ticket {}, {})",
            request.ticket,
            request.image.mime()
        );

        let result = match self {
            Identifier::Gemini(client) => client.identify(&request).await,
            Identifier::Flow(client) => client.identify(&request).await,
        }?;

        result.validate()?;
        Ok(result)
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, IdentifyError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| IdentifyError::Network(e.to_string()))
}

/// Turn a non-2xx response into an error, keeping the body for the log
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, IdentifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response.text().await.unwrap_or_default();
    Err(IdentifyError::Api(status.as_u16(), error_text))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_needs_endpoint() {
        let config = IdentifierConfig {
            backend: Backend::Flow,
            ..IdentifierConfig::default()
        };
        assert!(matches!(
            Identifier::from_config(&config),
            Err(IdentifyError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_gemini_without_key_still_builds() {
        let identifier = Identifier::from_config(&IdentifierConfig::default()).unwrap();
        assert!(matches!(identifier, Identifier::Gemini(_)));
    }
}
