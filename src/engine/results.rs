//! Wire result format shared with the backend and with predictions.
//!
//! A serialized annotation is an ordered array of entries. Region-bearing
//! entries carry a `from_name`/`to_name` node address, a type tag and a
//! type-specific `value` payload; relation entries instead reference two
//! persisted region ids. The `value` payload is kept as raw JSON here and
//! parsed into the typed structs below at the point of use, so unknown
//! fields survive a round trip untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::LabelstateError;

/// One element of a serialized result array.
///
/// The two wire shapes are disambiguated structurally: relation entries
/// have `from_id`/`to_id`, region entries have `from_name`/`to_name`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireEntry {
    Relation(RelationEntry),
    Result(ResultEntry),
}

impl WireEntry {
    /// Returns the inner result entry, if this is one.
    pub fn as_result(&self) -> Option<&ResultEntry> {
        match self {
            WireEntry::Result(entry) => Some(entry),
            WireEntry::Relation(_) => None,
        }
    }

    /// Returns the inner relation entry, if this is one.
    pub fn as_relation(&self) -> Option<&RelationEntry> {
        match self {
            WireEntry::Relation(entry) => Some(entry),
            WireEntry::Result(_) => None,
        }
    }
}

/// A region- or value-bearing result entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Persisted region id, stable across round trips. Absent for
    /// annotation-level entries such as choices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Name of the control node producing this value.
    pub from_name: String,

    /// Comma-joinable list of target node names.
    pub to_name: String,

    /// Value-kind tag, e.g. "rectanglelabels", "choices", "textarea".
    #[serde(rename = "type")]
    pub result_type: String,

    /// Type-specific payload; parsed lazily into one of the value structs.
    pub value: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Persisted id of the parent region for nested/grouped regions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// A serialized relation link between two regions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationEntry {
    pub from_id: String,
    pub to_id: String,
    #[serde(rename = "type")]
    pub result_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl RelationEntry {
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>, kind: Option<String>) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            result_type: "relation".to_string(),
            kind,
        }
    }

    /// A link entry carrying equivalence rather than direction semantics.
    pub fn normalization(
        from_id: impl Into<String>,
        to_id: impl Into<String>,
        kind: Option<String>,
    ) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            result_type: "normalization".to_string(),
            kind,
        }
    }

    /// True when this link models equivalence.
    pub fn is_normalization(&self) -> bool {
        self.result_type == "normalization"
    }
}

/// Provenance of a result entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    #[serde(rename = "manual")]
    Manual,
    #[serde(rename = "prediction")]
    Prediction,
    #[serde(rename = "prediction-changed")]
    PredictionChanged,
}

impl Default for Origin {
    fn default() -> Self {
        Origin::Manual
    }
}

// ============================================================================
// Typed value payloads
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectangleValue {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolygonValue {
    pub points: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyPointValue {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Character span over plain text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextSpanValue {
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Span over rendered HTML, addressed by xpath plus character offsets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HyperTextSpanValue {
    pub start: String,
    pub end: String,
    #[serde(rename = "startOffset")]
    pub start_offset: usize,
    #[serde(rename = "endOffset")]
    pub end_offset: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Time span over an audio track, in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioSpanValue {
    pub start: f64,
    pub end: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoicesValue {
    pub choices: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextAreaValue {
    pub text: Vec<String>,
}

/// What a backend stores for one annotation: submission metadata plus the
/// serialized result array. On load, `result` is exactly the input to the
/// deserialize protocol.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,

    /// Seconds the annotator spent, as reported by the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time: Option<f64>,

    #[serde(default)]
    pub ground_truth: bool,

    #[serde(default)]
    pub result: Vec<WireEntry>,
}

// ============================================================================
// Parsing and rendering
// ============================================================================

/// Parse a wire-encoded result array.
pub fn parse_results(payload: &str) -> Result<Vec<WireEntry>, LabelstateError> {
    serde_json::from_str(payload).map_err(|source| LabelstateError::ResultsParse {
        path: Path::new("<string>").to_path_buf(),
        source,
    })
}

/// Read a wire result array from a file.
pub fn read_results(path: &Path) -> Result<Vec<WireEntry>, LabelstateError> {
    let file = std::fs::File::open(path).map_err(LabelstateError::Io)?;
    let reader = std::io::BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| LabelstateError::ResultsParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Render a result array as pretty-printed JSON.
pub fn results_to_string(entries: &[WireEntry]) -> Result<String, LabelstateError> {
    serde_json::to_string_pretty(entries).map_err(LabelstateError::ResultsWrite)
}

/// Parse a typed value payload out of an entry, reporting the entry's type
/// tag on failure.
pub fn parse_value<T: serde::de::DeserializeOwned>(
    entry: &ResultEntry,
) -> Result<T, LabelstateError> {
    serde_json::from_value(entry.value.clone()).map_err(|source| LabelstateError::MalformedValue {
        result_type: entry.result_type.clone(),
        source,
    })
}
