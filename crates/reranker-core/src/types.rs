use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Option<HashMap<String, Value>>,
    /// Upstream retrieval score. Carried but never read by the reranker.
    #[serde(default)]
    pub score: Option<f64>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: None,
            score: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankRequest {
    pub query: String,
    pub documents: Vec<Document>,
}

impl RerankRequest {
    pub fn new(query: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            query: query.into(),
            documents,
        }
    }

    /// First document id that occurs more than once, if any.
    pub fn duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.documents.len());
        self.documents
            .iter()
            .map(|doc| doc.id.as_str())
            .find(|id| !seen.insert(*id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankResult {
    pub id: String,
    pub score: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RerankResponse {
    pub results: Vec<RerankResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default_to_none() {
        let raw = r#"{"query":"q","documents":[{"id":"a","text":"alpha"}]}"#;
        let req: RerankRequest = serde_json::from_str(raw).expect("parse request");
        assert_eq!(req.documents, vec![Document::new("a", "alpha")]);
    }

    #[test]
    fn metadata_and_upstream_score_are_accepted() {
        let raw = r#"{"query":"q","documents":[
            {"id":"a","text":"alpha","metadata":{"speaker":"dana","start":12.5},"score":0.42},
            {"id":"b","text":"beta","metadata":null,"score":null}
        ]}"#;
        let req: RerankRequest = serde_json::from_str(raw).expect("parse request");
        let first = &req.documents[0];
        assert_eq!(first.score, Some(0.42));
        let meta = first.metadata.as_ref().expect("metadata");
        assert_eq!(meta.get("speaker"), Some(&Value::from("dana")));
        assert!(req.documents[1].metadata.is_none());
    }

    #[test]
    fn missing_text_is_rejected() {
        let raw = r#"{"query":"q","documents":[{"id":"a"}]}"#;
        assert!(serde_json::from_str::<RerankRequest>(raw).is_err());
    }

    #[test]
    fn finds_first_duplicate_id() {
        let req = RerankRequest::new(
            "q",
            vec![
                Document::new("a", "1"),
                Document::new("b", "2"),
                Document::new("a", "3"),
                Document::new("b", "4"),
            ],
        );
        assert_eq!(req.duplicate_id(), Some("a"));
        assert_eq!(RerankRequest::new("q", vec![]).duplicate_id(), None);
    }

    #[test]
    fn response_serializes_to_wire_shape() {
        let resp = RerankResponse {
            results: vec![RerankResult {
                id: "b".to_string(),
                score: 0.5,
            }],
        };
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json, serde_json::json!({"results":[{"id":"b","score":0.5}]}));
    }
}
