//! Request-side types for the Troia API.
//!
//! # Design
//! Parameters are untyped string pairs: the service validates them, so the
//! client only needs to get them onto the wire in order. `Assignment` and
//! `LabelChoosing` are the two shapes the client does know about.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Ordered request parameters, sent as form fields or query pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one pair. Repeated keys are kept and sent repeatedly.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Encode `assignments` as the `assigns` field the service expects: a JSON
    /// array of `{"worker", "object", "label"}` objects.
    pub fn from_assignments(assignments: &[Assignment]) -> Result<Self, ApiError> {
        let encoded = serde_json::to_string(assignments).map_err(ApiError::Serialization)?;
        Ok(Self::new().with("assigns", encoded))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.0
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A single labeling observation: `worker` gave `object` the label `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub worker: String,
    pub object: String,
    pub label: String,
}

impl Assignment {
    pub fn new(worker: impl Into<String>, object: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            worker: worker.into(),
            object: object.into(),
            label: label.into(),
        }
    }
}

/// Strategy the service uses to pick a final label for each object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelChoosing {
    #[default]
    MaxLikelihood,
    MinCost,
}

impl LabelChoosing {
    /// Map a numeric method code: absent or `1` is `MaxLikelihood`, anything
    /// else is `MinCost`.
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            None | Some(1) => LabelChoosing::MaxLikelihood,
            Some(_) => LabelChoosing::MinCost,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LabelChoosing::MaxLikelihood => "MaxLikelihood",
            LabelChoosing::MinCost => "MinCost",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_choosing_default_code_is_max_likelihood() {
        assert_eq!(LabelChoosing::from_code(None), LabelChoosing::MaxLikelihood);
        assert_eq!(LabelChoosing::from_code(Some(1)), LabelChoosing::MaxLikelihood);
    }

    #[test]
    fn label_choosing_other_codes_are_min_cost() {
        for code in [0, 2, -1, 99] {
            assert_eq!(LabelChoosing::from_code(Some(code)), LabelChoosing::MinCost, "code {code}");
        }
    }

    #[test]
    fn label_choosing_wire_names() {
        assert_eq!(LabelChoosing::MaxLikelihood.as_str(), "MaxLikelihood");
        assert_eq!(LabelChoosing::MinCost.as_str(), "MinCost");
        assert_eq!(serde_json::to_value(LabelChoosing::MinCost).unwrap(), "MinCost");
    }

    #[test]
    fn params_keep_insertion_order_and_duplicates() {
        let params = Params::new().with("b", "2").with("a", "1").with("b", "3");
        assert_eq!(
            params.into_pairs(),
            vec![
                ("b".to_string(), "2".to_string()),
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn params_start_empty() {
        let mut params = Params::new();
        assert!(params.is_empty());
        params.push("id", "job-1");
        assert!(!params.is_empty());
    }

    #[test]
    fn params_collect_from_pairs() {
        let params: Params = [("id", "job-1"), ("algorithm", "BDS")].into_iter().collect();
        assert_eq!(params.get("algorithm"), Some("BDS"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn assignments_encode_into_single_field() {
        let params = Params::from_assignments(&[
            Assignment::new("w1", "url1", "porn"),
            Assignment::new("w2", "url1", "notporn"),
        ])
        .unwrap();
        let encoded: serde_json::Value = serde_json::from_str(params.get("assigns").unwrap()).unwrap();
        assert_eq!(
            encoded,
            serde_json::json!([
                {"worker": "w1", "object": "url1", "label": "porn"},
                {"worker": "w2", "object": "url1", "label": "notporn"},
            ])
        );
    }
}
