//! HTTP session store.
//!
//! Client for the REST persistence service. Each operation is a single
//! request; no retries live here — the experiment core treats appends as
//! best-effort and fetches as degradable.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use perceptlab_core::model::{ExperimentConfig, ParticipantRecord};
use perceptlab_core::traits::{PhaseResults, SessionHandle, SessionStore};

use crate::error::StoreError;
use crate::wire::{
    assemble_records, AllSessionsPayload, ConfigPayload, CreateSessionPayload, Phase1Row,
    Phase2Row,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `SessionStore` backed by the REST persistence service.
pub struct HttpSessionStore {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpSessionStore {
    /// Build a store for the service at `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout(self.timeout.as_secs())
        } else {
            StoreError::Network(e.to_string())
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    async fn create_session(&self, config: &ExperimentConfig) -> anyhow::Result<SessionHandle> {
        let body = json!({ "testConfig": ConfigPayload::from(config) });
        let response = self
            .client
            .post(self.url("/api/sessions"))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let response = Self::check(response).await?;

        let payload: CreateSessionPayload = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        tracing::debug!(session_id = %payload.session_id, "session registered");
        Ok(payload.into())
    }

    async fn append_phase_results(
        &self,
        session_id: &str,
        results: PhaseResults,
    ) -> anyhow::Result<()> {
        let (path, body) = match &results {
            PhaseResults::One(responses) => {
                let rows: Vec<Phase1Row> = responses.iter().map(Phase1Row::from).collect();
                (
                    format!("/api/sessions/{session_id}/phase1"),
                    json!({ "results": rows }),
                )
            }
            PhaseResults::Two(responses) => {
                let rows: Vec<Phase2Row> = responses.iter().map(Phase2Row::from).collect();
                (
                    format!("/api/sessions/{session_id}/phase2"),
                    json!({ "results": rows }),
                )
            }
        };

        let response = self
            .client
            .post(self.url(&path))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if response.status().as_u16() == 404 {
            return Err(StoreError::SessionNotFound(session_id.to_string()).into());
        }
        Self::check(response).await?;
        Ok(())
    }

    async fn fetch_all_records(&self) -> anyhow::Result<Vec<ParticipantRecord>> {
        let response = self
            .client
            .get(self.url("/api/sessions"))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let response = Self::check(response).await?;

        let payload: AllSessionsPayload = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(assemble_records(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perceptlab_core::model::{Group, Phase1Response, Phase2Response};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_phase1() -> Vec<Phase1Response> {
        vec![Phase1Response {
            asset_id: "a1".into(),
            group: Group::A,
            keyword: "Modern".into(),
            is_match: true,
            reaction_time_ms: 512.25,
            timestamp_ms: 1_700_000_000_000,
        }]
    }

    #[tokio::test]
    async fn create_session_posts_config_and_parses_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .and(body_partial_json(json!({
                "testConfig": { "title": "Demo Project: Corporate vs Playful" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sessionId": "sess-9",
                "participantId": "part-9",
                "message": "Session created successfully"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpSessionStore::new(server.uri());
        let handle = store
            .create_session(&ExperimentConfig::demo())
            .await
            .unwrap();
        assert_eq!(handle.session_id, "sess-9");
        assert_eq!(handle.participant_id, "part-9");
    }

    #[tokio::test]
    async fn create_session_surfaces_service_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("database locked"))
            .mount(&server)
            .await;

        let store = HttpSessionStore::new(server.uri());
        let err = store
            .create_session(&ExperimentConfig::demo())
            .await
            .unwrap_err();
        let store_err = err.downcast::<StoreError>().unwrap();
        assert!(matches!(store_err, StoreError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn append_phase1_writes_bools_as_ints() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions/sess-1/phase1"))
            .and(body_partial_json(json!({
                "results": [{
                    "assetId": "a1",
                    "group": "A",
                    "keyword": "Modern",
                    "isMatch": 1,
                    "reactionTimeMs": 512.25
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Phase1 results saved successfully",
                "count": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpSessionStore::new(server.uri());
        store
            .append_phase_results("sess-1", PhaseResults::One(sample_phase1()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn append_phase2_preserves_keyword_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions/sess-1/phase2"))
            .and(body_partial_json(json!({
                "results": [{ "group": "B", "selectedKeywords": ["Bold", "Modern"] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Phase2 results saved successfully",
                "count": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpSessionStore::new(server.uri());
        store
            .append_phase_results(
                "sess-1",
                PhaseResults::Two(vec![Phase2Response {
                    group: Group::B,
                    selected_keywords: vec!["Bold".into(), "Modern".into()],
                }]),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn append_to_missing_session_is_typed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions/ghost/phase1"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "error": "Session not found" })),
            )
            .mount(&server)
            .await;

        let store = HttpSessionStore::new(server.uri());
        let err = store
            .append_phase_results("ghost", PhaseResults::One(sample_phase1()))
            .await
            .unwrap_err();
        let store_err = err.downcast::<StoreError>().unwrap();
        assert!(store_err.is_session_missing());
    }

    #[tokio::test]
    async fn fetch_assembles_records_across_sessions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sessions": [
                    { "id": "s1", "participant_id": "p1", "created_at": 10 },
                    { "id": "s2", "participant_id": "p2", "created_at": 20 }
                ],
                "phase1Results": [
                    // Formatted read: the service emits real booleans here.
                    { "session_id": "s1", "assetId": "a1", "group": "A", "keyword": "Modern",
                      "isMatch": true, "reactionTimeMs": 100.5, "timestamp": 1 },
                    // Raw row shape with 0/1 must parse too.
                    { "session_id": "s2", "assetId": "b1", "group": "B", "keyword": "Modern",
                      "isMatch": 0, "reactionTimeMs": 200.0, "timestamp": 2 }
                ],
                "phase2Results": [
                    { "session_id": "s1", "group": "A", "selectedKeywords": ["Modern"] }
                ],
                "totalParticipants": 2
            })))
            .mount(&server)
            .await;

        let store = HttpSessionStore::new(server.uri());
        let records = store.fetch_all_records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].participant_id, "p1");
        assert!(records[0].phase1[0].is_match);
        assert_eq!(records[0].phase1[0].reaction_time_ms, 100.5);
        assert!(!records[1].phase1[0].is_match);
        assert!(records[1].phase2.is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_is_an_error_not_a_panic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let store = HttpSessionStore::new(server.uri());
        assert!(store.fetch_all_records().await.is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store = HttpSessionStore::new("http://localhost:3001/");
        assert_eq!(store.url("/api/sessions"), "http://localhost:3001/api/sessions");
    }
}
