//! Wire shapes for the REST persistence service.
//!
//! The service stores booleans as 0/1 integers and keyword selections as
//! ordered lists; these types round-trip that representation losslessly.
//! Conversions to and from the core model live here so neither side leaks
//! the other's field naming.

use serde::{Deserialize, Serialize};

use perceptlab_core::model::{
    ExperimentConfig, Group, ParticipantRecord, Phase1Response, Phase2Response, StimulusAsset,
};
use perceptlab_core::traits::SessionHandle;

/// Bools persisted as 0/1. Deserialization also accepts plain JSON
/// booleans, which the service emits on formatted reads.
pub(crate) mod bool_as_int {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        struct BoolOrInt;

        impl Visitor<'_> for BoolOrInt {
            type Value = bool;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("0, 1, or a boolean")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
                Ok(v)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
                match v {
                    0 => Ok(false),
                    1 => Ok(true),
                    other => Err(E::custom(format!("expected 0 or 1, got {other}"))),
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
                match v {
                    0 => Ok(false),
                    1 => Ok(true),
                    other => Err(E::custom(format!("expected 0 or 1, got {other}"))),
                }
            }
        }

        deserializer.deserialize_any(BoolOrInt)
    }
}

/// One persisted Phase-1 row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase1Row {
    pub asset_id: String,
    pub group: Group,
    pub keyword: String,
    #[serde(with = "bool_as_int")]
    pub is_match: bool,
    pub reaction_time_ms: f64,
    pub timestamp: i64,
}

impl From<&Phase1Response> for Phase1Row {
    fn from(r: &Phase1Response) -> Self {
        Self {
            asset_id: r.asset_id.clone(),
            group: r.group,
            keyword: r.keyword.clone(),
            is_match: r.is_match,
            reaction_time_ms: r.reaction_time_ms,
            timestamp: r.timestamp_ms,
        }
    }
}

impl From<Phase1Row> for Phase1Response {
    fn from(row: Phase1Row) -> Self {
        Self {
            asset_id: row.asset_id,
            group: row.group,
            keyword: row.keyword,
            is_match: row.is_match,
            reaction_time_ms: row.reaction_time_ms,
            timestamp_ms: row.timestamp,
        }
    }
}

/// One persisted Phase-2 row. Keyword order is preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase2Row {
    pub group: Group,
    pub selected_keywords: Vec<String>,
}

impl From<&Phase2Response> for Phase2Row {
    fn from(r: &Phase2Response) -> Self {
        Self {
            group: r.group,
            selected_keywords: r.selected_keywords.clone(),
        }
    }
}

impl From<Phase2Row> for Phase2Response {
    fn from(row: Phase2Row) -> Self {
        Self {
            group: row.group,
            selected_keywords: row.selected_keywords,
        }
    }
}

/// The configuration shape embedded in a persisted session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPayload {
    pub title: String,
    pub keywords: Vec<String>,
    pub images_a: Vec<AssetPayload>,
    pub images_b: Vec<AssetPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetPayload {
    pub id: String,
    pub url: String,
    pub group: Group,
}

impl From<&ExperimentConfig> for ConfigPayload {
    fn from(config: &ExperimentConfig) -> Self {
        let assets = |list: &[StimulusAsset]| {
            list.iter()
                .map(|a| AssetPayload {
                    id: a.id.clone(),
                    url: a.source.clone(),
                    group: a.group,
                })
                .collect()
        };
        Self {
            title: config.title.clone(),
            keywords: config.keywords.clone(),
            images_a: assets(&config.assets_a),
            images_b: assets(&config.assets_b),
        }
    }
}

impl From<ConfigPayload> for ExperimentConfig {
    fn from(payload: ConfigPayload) -> Self {
        let assets = |list: Vec<AssetPayload>| {
            list.into_iter()
                .map(|a| StimulusAsset {
                    id: a.id,
                    source: a.url,
                    group: a.group,
                })
                .collect()
        };
        Self {
            title: payload.title,
            keywords: payload.keywords,
            assets_a: assets(payload.images_a),
            assets_b: assets(payload.images_b),
        }
    }
}

/// Response body from session creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionPayload {
    pub session_id: String,
    pub participant_id: String,
    #[serde(default)]
    pub message: String,
}

impl From<CreateSessionPayload> for SessionHandle {
    fn from(p: CreateSessionPayload) -> Self {
        Self {
            session_id: p.session_id,
            participant_id: p.participant_id,
        }
    }
}

/// The bulk-read payload: every session with its rows, keyed by session id.
#[derive(Debug, Clone, Deserialize)]
pub struct AllSessionsPayload {
    #[serde(default)]
    pub sessions: Vec<SessionRow>,
    #[serde(rename = "phase1Results", default)]
    pub phase1_results: Vec<SessionPhase1Row>,
    #[serde(rename = "phase2Results", default)]
    pub phase2_results: Vec<SessionPhase2Row>,
    #[serde(rename = "totalParticipants", default)]
    pub total_participants: usize,
}

/// A persisted session header. The service uses snake_case column names
/// here, unlike the row payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRow {
    pub id: String,
    pub participant_id: String,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionPhase1Row {
    pub session_id: String,
    #[serde(flatten)]
    pub row: Phase1Row,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionPhase2Row {
    pub session_id: String,
    #[serde(flatten)]
    pub row: Phase2Row,
}

/// Regroup the flat bulk payload into one record per session, in the
/// service's session order. Rows referencing unknown sessions are dropped.
pub fn assemble_records(payload: AllSessionsPayload) -> Vec<ParticipantRecord> {
    let mut records: Vec<ParticipantRecord> = Vec::with_capacity(payload.sessions.len());
    let mut index = std::collections::HashMap::new();

    for session in payload.sessions {
        index.insert(session.id, records.len());
        records.push(ParticipantRecord::new(session.participant_id));
    }

    for tagged in payload.phase1_results {
        if let Some(&i) = index.get(&tagged.session_id) {
            records[i].phase1.push(tagged.row.into());
        }
    }
    for tagged in payload.phase2_results {
        if let Some(&i) = index.get(&tagged.session_id) {
            records[i].phase2.push(tagged.row.into());
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn phase1_row_serializes_bool_as_int() {
        let row = Phase1Row {
            asset_id: "a1".into(),
            group: Group::A,
            keyword: "Modern".into(),
            is_match: true,
            reaction_time_ms: 321.5,
            timestamp: 1_700_000_000_000,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(
            value,
            json!({
                "assetId": "a1",
                "group": "A",
                "keyword": "Modern",
                "isMatch": 1,
                "reactionTimeMs": 321.5,
                "timestamp": 1_700_000_000_000i64,
            })
        );
    }

    #[test]
    fn phase1_row_accepts_int_and_bool_matches() {
        let from_int: Phase1Row = serde_json::from_value(json!({
            "assetId": "a1", "group": "B", "keyword": "Bold",
            "isMatch": 0, "reactionTimeMs": 100.0, "timestamp": 5
        }))
        .unwrap();
        assert!(!from_int.is_match);

        let from_bool: Phase1Row = serde_json::from_value(json!({
            "assetId": "a1", "group": "B", "keyword": "Bold",
            "isMatch": true, "reactionTimeMs": 100.0, "timestamp": 5
        }))
        .unwrap();
        assert!(from_bool.is_match);
    }

    #[test]
    fn phase1_row_rejects_other_ints() {
        let result = serde_json::from_value::<Phase1Row>(json!({
            "assetId": "a1", "group": "B", "keyword": "Bold",
            "isMatch": 2, "reactionTimeMs": 100.0, "timestamp": 5
        }));
        assert!(result.is_err());
    }

    #[test]
    fn phase2_row_preserves_keyword_order() {
        let row = Phase2Row {
            group: Group::B,
            selected_keywords: vec!["Bold".into(), "Modern".into()],
        };
        let json = serde_json::to_string(&row).unwrap();
        let back: Phase2Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back.selected_keywords, vec!["Bold", "Modern"]);
        assert!(json.contains("selectedKeywords"));
    }

    #[test]
    fn config_payload_roundtrip() {
        let config = ExperimentConfig::demo();
        let payload = ConfigPayload::from(&config);
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("imagesA").is_some());

        let back: ConfigPayload = serde_json::from_value(json).unwrap();
        let restored = ExperimentConfig::from(back);
        assert_eq!(restored, config);
    }

    #[test]
    fn assemble_groups_rows_by_session() {
        let payload: AllSessionsPayload = serde_json::from_value(json!({
            "sessions": [
                { "id": "s1", "participant_id": "p1", "created_at": 10 },
                { "id": "s2", "participant_id": "p2", "created_at": 20 }
            ],
            "phase1Results": [
                { "session_id": "s1", "assetId": "a1", "group": "A", "keyword": "Modern",
                  "isMatch": 1, "reactionTimeMs": 100.0, "timestamp": 1 },
                { "session_id": "s2", "assetId": "a1", "group": "A", "keyword": "Modern",
                  "isMatch": 0, "reactionTimeMs": 200.0, "timestamp": 2 },
                { "session_id": "ghost", "assetId": "a1", "group": "A", "keyword": "Modern",
                  "isMatch": 1, "reactionTimeMs": 300.0, "timestamp": 3 }
            ],
            "phase2Results": [
                { "session_id": "s1", "group": "A", "selectedKeywords": ["Modern"] }
            ],
            "totalParticipants": 2
        }))
        .unwrap();

        let records = assemble_records(payload);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].participant_id, "p1");
        assert_eq!(records[0].phase1.len(), 1);
        assert!(records[0].phase1[0].is_match);
        assert_eq!(records[0].phase2.len(), 1);
        assert_eq!(records[1].phase1.len(), 1);
        assert!(records[1].phase2.is_empty());
    }
}
