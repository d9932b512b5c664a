use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::domain::{HistoryId, HistoryItem};

/// Body of a successful `POST /generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub he_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bf_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WireId>,
}

/// Record identifiers arrive as integers from the database-backed service but
/// are treated as opaque strings by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Int(i64),
    Text(String),
}

impl From<WireId> for HistoryId {
    fn from(value: WireId) -> Self {
        match value {
            WireId::Int(id) => HistoryId(id.to_string()),
            WireId::Text(id) => HistoryId(id),
        }
    }
}

/// One element of the `GET /history` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: WireId,
    pub bf_path: String,
    pub he_path: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_info: Option<serde_json::Value>,
}

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("unparseable timestamp '{0}'")]
    Timestamp(String),
    #[error("cannot resolve '{path}' against the service address: {source}")]
    Path {
        path: String,
        source: url::ParseError,
    },
}

impl HistoryRecord {
    pub fn into_item(self, base: &str) -> Result<HistoryItem, RecordError> {
        let timestamp = parse_timestamp(&self.timestamp)
            .ok_or_else(|| RecordError::Timestamp(self.timestamp.clone()))?;
        let bf_url = resolve_path(base, &self.bf_path).map_err(|source| RecordError::Path {
            path: self.bf_path.clone(),
            source,
        })?;
        let he_url = resolve_path(base, &self.he_path).map_err(|source| RecordError::Path {
            path: self.he_path.clone(),
            source,
        })?;
        Ok(HistoryItem {
            id: self.id.into(),
            bf_url,
            he_url,
            timestamp,
        })
    }
}

/// Resolves a service-relative path into an absolute URL.
///
/// Paths are appended to the base address verbatim (so a base with a path
/// prefix keeps it), with exactly one `/` at the seam.
pub fn resolve_path(base: &str, path: &str) -> Result<Url, url::ParseError> {
    if let Ok(url) = Url::parse(path) {
        if matches!(url.scheme(), "http" | "https") {
            return Ok(url);
        }
    }

    let base = base.trim().trim_end_matches('/');
    let path = path.trim().trim_start_matches('/');
    Url::parse(&format!("{base}/{path}"))
}

/// Accepts RFC 3339 as well as offset-less ISO timestamps, which are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_record_accepts_integer_and_string_ids() {
        let records: Vec<HistoryRecord> = serde_json::from_str(
            r#"[
                {"id": 7, "bf_path": "/data/images/bf_7.png", "he_path": "/data/images/he_7.png", "timestamp": "2026-01-02T03:04:05.123456"},
                {"id": "abc", "bf_path": "/data/images/bf.png", "he_path": "/data/images/he.png", "timestamp": "2026-01-02T03:04:05Z", "metadata_info": {"direction": "AtoB"}}
            ]"#,
        )
        .expect("decode");

        let first = records[0].clone().into_item("http://localhost:8000").expect("item");
        assert_eq!(first.id, HistoryId::from("7"));
        assert_eq!(
            first.he_url.as_str(),
            "http://localhost:8000/data/images/he_7.png"
        );
        assert_eq!(first.timestamp.to_rfc3339(), "2026-01-02T03:04:05.123456+00:00");

        let second = records[1].clone().into_item("http://localhost:8000/").expect("item");
        assert_eq!(second.id, HistoryId::from("abc"));
        assert_eq!(second.bf_url.as_str(), "http://localhost:8000/data/images/bf.png");
    }

    #[test]
    fn resolve_path_keeps_base_prefix_and_absolute_urls() {
        assert_eq!(
            resolve_path("https://lab.example/api/", "/data/x.png")
                .expect("url")
                .as_str(),
            "https://lab.example/api/data/x.png"
        );
        assert_eq!(
            resolve_path("http://localhost:8000", "https://cdn.example/x.png")
                .expect("url")
                .as_str(),
            "https://cdn.example/x.png"
        );
    }

    #[test]
    fn timestamps_with_offsets_are_normalized_to_utc() {
        let parsed = parse_timestamp("2026-01-02T05:00:00+02:00").expect("parse");
        assert_eq!(parsed.to_rfc3339(), "2026-01-02T03:00:00+00:00");
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn bad_timestamp_is_reported_per_record() {
        let record = HistoryRecord {
            id: WireId::Int(1),
            bf_path: "/a.png".into(),
            he_path: "/b.png".into(),
            timestamp: "not-a-time".into(),
            metadata_info: None,
        };
        assert_eq!(
            record.into_item("http://localhost:8000"),
            Err(RecordError::Timestamp("not-a-time".into()))
        );
    }

    #[test]
    fn generate_response_only_requires_result_path() {
        let body: GenerateResponse =
            serde_json::from_str(r#"{"he_path": "/data/images/he_1.png"}"#).expect("decode");
        assert_eq!(body.he_path, "/data/images/he_1.png");
        assert!(body.bf_path.is_none());
        assert!(body.id.is_none());
    }
}
