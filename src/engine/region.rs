//! Labeled region model.
//!
//! A region is one labeled span/shape inside an annotation: a rectangle on
//! an image, a character span over text, a time span over audio. Regions
//! are produced by rendering components (out of scope here) or
//! reconstructed from wire results, and are owned by exactly one
//! annotation's region store at a time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::RegionId;
use super::results::{
    parse_value, AudioSpanValue, HyperTextSpanValue, KeyPointValue, Origin, PolygonValue,
    RectangleValue, ResultEntry, TextSpanValue,
};
use crate::error::LabelstateError;

/// Geometry of a region, switched on by the wire type tag.
///
/// Image-space coordinates are percentages of the source dimensions, so a
/// region survives serialization independent of the rendered size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RegionShape {
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rotation: Option<f64>,
    },
    Polygon {
        points: Vec<[f64; 2]>,
    },
    KeyPoint {
        x: f64,
        y: f64,
        width: Option<f64>,
    },
    TextSpan {
        start: usize,
        end: usize,
        text: Option<String>,
    },
    HyperTextSpan {
        start: String,
        end: String,
        start_offset: usize,
        end_offset: usize,
    },
    AudioSpan {
        start: f64,
        end: f64,
    },
}

impl RegionShape {
    /// The wire type tag this shape serializes under.
    pub fn result_type(&self) -> &'static str {
        match self {
            RegionShape::Rectangle { .. } => "rectanglelabels",
            RegionShape::Polygon { .. } => "polygonlabels",
            RegionShape::KeyPoint { .. } => "keypointlabels",
            RegionShape::TextSpan { .. } => "labels",
            RegionShape::HyperTextSpan { .. } => "hypertextlabels",
            RegionShape::AudioSpan { .. } => "audiolabels",
        }
    }

    /// True if `tag` names a region-bearing result type.
    pub fn is_region_type(tag: &str) -> bool {
        matches!(
            tag,
            "rectanglelabels"
                | "polygonlabels"
                | "keypointlabels"
                | "labels"
                | "hypertextlabels"
                | "audiolabels"
        )
    }
}

/// One labeled span/shape instance within an annotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// In-memory identity; may be regenerated across loads.
    pub id: RegionId,

    /// Persisted id, stable across serialize/deserialize round trips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<String>,

    /// Parent region for nested/grouped regions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<RegionId>,

    /// Name of the control node that produced this region.
    pub from_name: String,

    /// Name of the object node this region annotates.
    pub to_name: String,

    pub shape: RegionShape,

    /// Labels attached by the producing control node.
    #[serde(default)]
    pub labels: Vec<String>,

    /// Per-region free-text rows (textarea attached to the region).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meta_text: Vec<String>,

    /// Name of the textarea control the per-region rows belong to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_from: Option<String>,

    #[serde(default)]
    pub origin: Origin,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    // Edit/visibility state. Ephemeral relative to the wire format but
    // part of snapshots, so undo restores it.
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub highlighted: bool,
}

impl Region {
    /// Creates a fresh region with a generated id.
    pub fn new(
        from_name: impl Into<String>,
        to_name: impl Into<String>,
        shape: RegionShape,
        labels: Vec<String>,
    ) -> Self {
        Self {
            id: RegionId::generate(),
            pid: None,
            parent_id: None,
            from_name: from_name.into(),
            to_name: to_name.into(),
            shape,
            labels,
            meta_text: Vec::new(),
            meta_from: None,
            origin: Origin::Manual,
            score: None,
            hidden: false,
            locked: false,
            selected: false,
            highlighted: false,
        }
    }

    /// Sets the origin (builder style).
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Sets the prediction score (builder style).
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// The identifier written to the wire: the persisted id when one is
    /// known, the live id otherwise.
    pub fn persisted_id(&self) -> &str {
        self.pid.as_deref().unwrap_or_else(|| self.id.as_str())
    }

    /// Reconstructs a region from a wire entry addressed to `to_name`.
    ///
    /// The entry's `id` becomes the persisted id; a fresh live id is
    /// generated, matching the contract that live identity does not
    /// survive a load.
    pub fn from_entry(entry: &ResultEntry, to_name: &str) -> Result<Self, LabelstateError> {
        let (shape, labels) = match entry.result_type.as_str() {
            "rectanglelabels" => {
                let v: RectangleValue = parse_value(entry)?;
                (
                    RegionShape::Rectangle {
                        x: v.x,
                        y: v.y,
                        width: v.width,
                        height: v.height,
                        rotation: v.rotation,
                    },
                    v.labels,
                )
            }
            "polygonlabels" => {
                let v: PolygonValue = parse_value(entry)?;
                (RegionShape::Polygon { points: v.points }, v.labels)
            }
            "keypointlabels" => {
                let v: KeyPointValue = parse_value(entry)?;
                (
                    RegionShape::KeyPoint {
                        x: v.x,
                        y: v.y,
                        width: v.width,
                    },
                    v.labels,
                )
            }
            "labels" => {
                let v: TextSpanValue = parse_value(entry)?;
                (
                    RegionShape::TextSpan {
                        start: v.start,
                        end: v.end,
                        text: v.text,
                    },
                    v.labels,
                )
            }
            "hypertextlabels" => {
                let v: HyperTextSpanValue = parse_value(entry)?;
                (
                    RegionShape::HyperTextSpan {
                        start: v.start,
                        end: v.end,
                        start_offset: v.start_offset,
                        end_offset: v.end_offset,
                    },
                    v.labels,
                )
            }
            "audiolabels" => {
                let v: AudioSpanValue = parse_value(entry)?;
                (
                    RegionShape::AudioSpan {
                        start: v.start,
                        end: v.end,
                    },
                    v.labels,
                )
            }
            other => {
                return Err(LabelstateError::UnsupportedResultType(other.to_string()));
            }
        };

        Ok(Self {
            id: RegionId::generate(),
            pid: entry.id.clone(),
            parent_id: entry.parent_id.as_deref().map(RegionId::from),
            from_name: entry.from_name.clone(),
            to_name: to_name.to_string(),
            shape,
            labels,
            meta_text: Vec::new(),
            meta_from: None,
            origin: entry.origin.unwrap_or_default(),
            score: entry.score,
            hidden: false,
            locked: false,
            selected: false,
            highlighted: false,
        })
    }

    /// Builds the wire entry for this region.
    pub fn to_entry(&self) -> ResultEntry {
        let value = self.value_payload();
        ResultEntry {
            id: Some(self.persisted_id().to_string()),
            from_name: self.from_name.clone(),
            to_name: self.to_name.clone(),
            result_type: self.shape.result_type().to_string(),
            value,
            origin: Some(self.origin),
            score: self.score,
            parent_id: self.parent_id.as_ref().map(|p| p.0.clone()),
        }
    }

    fn value_payload(&self) -> Value {
        // to_value on these payload structs cannot fail: no non-string
        // keys, no non-finite floats introduced by the engine.
        match &self.shape {
            RegionShape::Rectangle {
                x,
                y,
                width,
                height,
                rotation,
            } => serde_json::to_value(RectangleValue {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
                rotation: *rotation,
                labels: self.labels.clone(),
            }),
            RegionShape::Polygon { points } => serde_json::to_value(PolygonValue {
                points: points.clone(),
                labels: self.labels.clone(),
            }),
            RegionShape::KeyPoint { x, y, width } => serde_json::to_value(KeyPointValue {
                x: *x,
                y: *y,
                width: *width,
                labels: self.labels.clone(),
            }),
            RegionShape::TextSpan { start, end, text } => serde_json::to_value(TextSpanValue {
                start: *start,
                end: *end,
                text: text.clone(),
                labels: self.labels.clone(),
            }),
            RegionShape::HyperTextSpan {
                start,
                end,
                start_offset,
                end_offset,
            } => serde_json::to_value(HyperTextSpanValue {
                start: start.clone(),
                end: end.clone(),
                start_offset: *start_offset,
                end_offset: *end_offset,
                labels: self.labels.clone(),
            }),
            RegionShape::AudioSpan { start, end } => serde_json::to_value(AudioSpanValue {
                start: *start,
                end: *end,
                labels: self.labels.clone(),
            }),
        }
        .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rect_entry() -> ResultEntry {
        ResultEntry {
            id: Some("abc123".into()),
            from_name: "labels".into(),
            to_name: "rect".into(),
            result_type: "rectanglelabels".into(),
            value: json!({"x": 10.0, "y": 10.0, "width": 20.0, "height": 20.0, "labels": ["Cat"]}),
            origin: Some(Origin::Prediction),
            score: Some(0.9),
            parent_id: None,
        }
    }

    #[test]
    fn test_from_entry_keeps_persisted_id_and_regenerates_live_id() {
        let region = Region::from_entry(&rect_entry(), "rect").expect("reconstruct");
        assert_eq!(region.pid.as_deref(), Some("abc123"));
        assert_ne!(region.id.as_str(), "abc123");
        assert_eq!(region.persisted_id(), "abc123");
        assert_eq!(region.labels, vec!["Cat"]);
        assert_eq!(region.origin, Origin::Prediction);
    }

    #[test]
    fn test_entry_roundtrip_preserves_geometry() {
        let region = Region::from_entry(&rect_entry(), "rect").expect("reconstruct");
        let entry = region.to_entry();
        assert_eq!(entry.result_type, "rectanglelabels");
        assert_eq!(entry.id.as_deref(), Some("abc123"));
        assert_eq!(entry.value["width"], json!(20.0));
        assert_eq!(entry.value["labels"], json!(["Cat"]));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut entry = rect_entry();
        entry.result_type = "brushlabels".into();
        let err = Region::from_entry(&entry, "rect").unwrap_err();
        assert!(matches!(err, LabelstateError::UnsupportedResultType(_)));
    }

    #[test]
    fn test_fresh_region_has_no_pid() {
        let region = Region::new(
            "labels",
            "rect",
            RegionShape::KeyPoint {
                x: 5.0,
                y: 5.0,
                width: None,
            },
            vec!["Nose".into()],
        );
        assert!(region.pid.is_none());
        assert_eq!(region.persisted_id(), region.id.as_str());
    }
}
