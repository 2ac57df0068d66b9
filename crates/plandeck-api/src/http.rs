//! Reqwest-backed implementation of [`PlanningBackend`].
//!
//! Non-2xx responses are turned into [`ApiError::Status`] with the body
//! kept as truncated diagnostic text. The `/bundles` endpoint is handled
//! defensively: a success body that is not a JSON array yields an empty
//! list, and malformed entries are skipped rather than failing the fetch.

use async_trait::async_trait;
use serde::Deserialize;

use plandeck_core::config::BackendConfig;
use plandeck_core::{AudioClip, Bundle, ChatAnswer, Commit, Overview};

use crate::{ApiError, BundleQuery, PlanningBackend};

/// Maximum length of a diagnostic body kept for display.
const DIAGNOSTIC_BODY_CAP: usize = 200;

/// HTTP client for the planning backend.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a client from the backend section of the configuration.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Reject non-2xx responses, capturing the body as diagnostic text.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body: truncate_diagnostic(&body),
        })
    }
}

/// Truncate a diagnostic body to a displayable length on a char boundary.
pub(crate) fn truncate_diagnostic(body: &str) -> String {
    if body.chars().count() <= DIAGNOSTIC_BODY_CAP {
        return body.to_string();
    }
    let truncated: String = body.chars().take(DIAGNOSTIC_BODY_CAP).collect();
    format!("{}…", truncated)
}

/// Parse a `/bundles` success body.
///
/// A non-array body is treated as an empty list; entries that do not parse
/// are skipped with a debug log.
pub(crate) fn parse_bundle_payload(value: serde_json::Value) -> Vec<Bundle> {
    let serde_json::Value::Array(items) = value else {
        tracing::debug!("Bundle list body was not an array; treating as empty");
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Bundle>(item) {
            Ok(bundle) => Some(bundle),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed bundle entry");
                None
            }
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HistoryResponse {
    commits: Vec<Commit>,
}

#[async_trait]
impl PlanningBackend for HttpBackend {
    async fn list_bundles(&self, query: &BundleQuery) -> Result<Vec<Bundle>, ApiError> {
        let response = self
            .client
            .get(self.endpoint("/bundles"))
            .query(&query.to_pairs())
            .send()
            .await?;
        let response = Self::check(response).await?;
        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(parse_bundle_payload(value))
    }

    async fn bundle_history(&self, bundle_id: &str) -> Result<Vec<Commit>, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&format!("/repo/{}", bundle_id)))
            .send()
            .await?;
        let response = Self::check(response).await?;
        let body: HistoryResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(body.commits)
    }

    async fn bundle_overview(&self, bundle_id: &str) -> Result<Overview, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&format!("/repo/{}/overview", bundle_id)))
            .send()
            .await?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn ask_assistant(
        &self,
        bundle_id: &str,
        question: &str,
    ) -> Result<ChatAnswer, ApiError> {
        let response = self
            .client
            .post(self.endpoint("/chat"))
            .json(&serde_json::json!({
                "bundle_id": bundle_id,
                "question": question,
            }))
            .send()
            .await?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn synthesize_speech(&self, text: &str) -> Result<AudioClip, ApiError> {
        let response = self
            .client
            .post(self.endpoint("/tts"))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        Ok(AudioClip::mpeg(bytes.to_vec()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use plandeck_core::config::BackendConfig;

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = BackendConfig {
            base_url: "http://backend.local:8000/".to_string(),
            timeout_secs: 5,
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(backend.endpoint("/bundles"), "http://backend.local:8000/bundles");
    }

    #[test]
    fn test_truncate_diagnostic_short_body_unchanged() {
        assert_eq!(truncate_diagnostic("bad gateway"), "bad gateway");
    }

    #[test]
    fn test_truncate_diagnostic_long_body() {
        let body = "x".repeat(500);
        let truncated = truncate_diagnostic(&body);
        assert_eq!(truncated.chars().count(), DIAGNOSTIC_BODY_CAP + 1);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_truncate_diagnostic_multibyte_boundary() {
        let body = "é".repeat(300);
        let truncated = truncate_diagnostic(&body);
        assert!(truncated.starts_with('é'));
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_parse_bundle_payload_array() {
        let value = serde_json::json!([
            {"site_bundle_id": "b1", "council_name": "Camden", "n_apps": 7},
            {"site_bundle_id": "b2", "council_name": "Islington", "n_apps": 9}
        ]);
        let bundles = parse_bundle_payload(value);
        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[0].id, "b1");
        assert_eq!(bundles[1].activity_count, 9);
    }

    #[test]
    fn test_parse_bundle_payload_non_array_is_empty() {
        assert!(parse_bundle_payload(serde_json::json!({"detail": "oops"})).is_empty());
        assert!(parse_bundle_payload(serde_json::json!("nope")).is_empty());
        assert!(parse_bundle_payload(serde_json::Value::Null).is_empty());
    }

    #[test]
    fn test_parse_bundle_payload_skips_malformed_entries() {
        let value = serde_json::json!([
            {"site_bundle_id": "good"},
            "not an object",
            {"site_bundle_id": "also-good"}
        ]);
        let bundles = parse_bundle_payload(value);
        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[0].id, "good");
        assert_eq!(bundles[1].id, "also-good");
    }
}
