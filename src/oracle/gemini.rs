//! Gemini `generateContent` client.

use super::{OracleError, PlaceOracle};
use crate::config::{AppConfig, ConfigError};
use crate::location::GeoCoordinate;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const ERROR_BODY_LIMIT: usize = 300;

/// Blocking client for the Gemini REST API.
///
/// Built once from [`AppConfig`] and shared; holds the key, so nothing global
/// is consulted per call.
pub struct GeminiOracle {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
    max_results: usize,
}

impl GeminiOracle {
    pub fn new(
        api_base: &str,
        model: &str,
        api_key: impl Into<String>,
        timeout: Duration,
        max_results: usize,
    ) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("Wayfarer/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            endpoint: format!("{}/v1beta/models/{}:generateContent", api_base.trim_end_matches('/'), model),
            api_key: api_key.into(),
            max_results,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let key = config.require_api_key()?;
        Ok(Self::new(
            &config.api_base,
            &config.model,
            key,
            config.request_timeout(),
            config.max_results,
        ))
    }
}

/// The single request template sent to the model.
pub fn build_prompt(query: &str, at: GeoCoordinate, max_results: usize) -> String {
    format!(
        "Find up to {max} real places matching \"{query}\" near latitude {lat:.6}, longitude {lng:.6}. \
         Respond with only a JSON array. Each element must be an object with the fields \
         \"placeId\" (string), \"name\" (string), \"rating\" (number 0-5), \"reviewCount\" (integer), \
         \"vicinity\" (short address, comma separated), \"location\" (object with \"lat\" and \"lng\" numbers) \
         and \"types\" (array of strings). Use an empty array if nothing matches.",
        max = max_results,
        query = query.replace('"', "'"),
        lat = at.lat,
        lng = at.lng,
    )
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(default, rename = "blockReason")]
    block_reason: Option<String>,
}

impl PlaceOracle for GeminiOracle {
    fn find_places(&self, query: &str, at: GeoCoordinate) -> Result<String, OracleError> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_prompt(query, at, self.max_results) }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "temperature": 0.2
            }
        });

        let response = match self
            .agent
            .post(&self.endpoint)
            .set("x-goog-api-key", &self.api_key)
            .send_json(body)
        {
            Ok(r) => r,
            Err(ureq::Error::Status(status, r)) => {
                let raw = r.into_string().unwrap_or_default();
                return Err(OracleError::Status {
                    status,
                    message: error_message(&raw),
                });
            }
            Err(e) => return Err(OracleError::Network(e.to_string())),
        };

        let parsed: GenerateResponse = response
            .into_json()
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(OracleError::Blocked(reason));
        }

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(OracleError::EmptyResponse);
        }

        tracing::debug!(query, bytes = text.len(), "oracle responded");
        Ok(text)
    }
}

/// Prefer the API's `error.message`; otherwise a truncated raw body.
fn error_message(raw: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(String::from));
    match from_json {
        Some(msg) => msg,
        None => raw.chars().take(ERROR_BODY_LIMIT).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_query_and_position() {
        let p = build_prompt("coffee \"shops\"", GeoCoordinate { lat: 1.0, lng: -2.5 }, 7);
        assert!(p.contains("up to 7"));
        assert!(p.contains("\"coffee 'shops'\""));
        assert!(p.contains("latitude 1.000000"));
        assert!(p.contains("longitude -2.500000"));
        assert!(p.contains("\"placeId\""));
    }

    #[test]
    fn test_endpoint_shape() {
        let o = GeminiOracle::new("http://localhost:1/", "m1", "k", Duration::from_secs(1), 5);
        assert_eq!(o.endpoint, "http://localhost:1/v1beta/models/m1:generateContent");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"error":{"code":400,"message":"API key not valid"}}"#), "API key not valid");
        assert_eq!(error_message("plain failure"), "plain failure");
        assert_eq!(error_message(&"x".repeat(1000)).len(), ERROR_BODY_LIMIT);
    }
}
