//! Wire result validation for labelstate.
//!
//! This module provides comprehensive validation of serialized result
//! arrays, checking for:
//! - Structural integrity (unique persisted ids, resolvable references)
//! - Addressing quality (non-empty node names, known type tags)
//! - Geometric validity (finite values, percent ranges, ordered spans)
//!
//! Validation needs no tag tree: it checks everything that can be checked
//! about a payload before an annotation attempts to load it.

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::{HashMap, HashSet};

use crate::engine::results::{
    parse_value, AudioSpanValue, ChoicesValue, KeyPointValue, PolygonValue, RectangleValue,
    ResultEntry, TextAreaValue, TextSpanValue, WireEntry,
};
use crate::engine::RegionShape;

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

/// Validates a wire result array and returns a report of all issues found.
pub fn validate_results(entries: &[WireEntry], _opts: &ValidateOptions) -> ValidationReport {
    let mut report = ValidationReport::new();

    // Persisted ids of region-bearing entries, for reference validation.
    let region_ids: HashSet<&str> = entries
        .iter()
        .filter_map(|entry| entry.as_result())
        .filter(|entry| RegionShape::is_region_type(&entry.result_type))
        .filter_map(|entry| entry.id.as_deref())
        .collect();

    validate_result_entries(entries, &region_ids, &mut report);
    validate_relation_entries(entries, &region_ids, &mut report);

    report
}

fn validate_result_entries(
    entries: &[WireEntry],
    region_ids: &HashSet<&str>,
    report: &mut ValidationReport,
) {
    let mut seen_ids: HashMap<&str, usize> = HashMap::new();

    for (index, entry) in entries.iter().enumerate() {
        let Some(result) = entry.as_result() else {
            continue;
        };

        if result.from_name.is_empty() {
            report.add(ValidationIssue::error(
                IssueCode::EmptyFromName,
                "Empty from_name",
                IssueContext::Entry { index },
            ));
        }
        if result
            .to_name
            .split(',')
            .any(|segment| segment.trim().is_empty())
        {
            report.add(ValidationIssue::error(
                IssueCode::EmptyToName,
                format!("Empty to_name segment in '{}'", result.to_name),
                IssueContext::Entry { index },
            ));
        }

        // Duplicate persisted ids among region-bearing entries.
        if RegionShape::is_region_type(&result.result_type) {
            if let Some(id) = result.id.as_deref() {
                if let Some(first_index) = seen_ids.get(id) {
                    report.add(ValidationIssue::error(
                        IssueCode::DuplicateRegionId,
                        format!("Duplicate region id '{}' (first seen at entry {})", id, first_index),
                        IssueContext::Region { id: id.to_string() },
                    ));
                } else {
                    seen_ids.insert(id, index);
                }
            }
        }

        validate_value(index, result, region_ids, report);
    }
}

fn validate_value(
    index: usize,
    entry: &ResultEntry,
    region_ids: &HashSet<&str>,
    report: &mut ValidationReport,
) {
    let context = || match entry.id.as_deref() {
        Some(id) => IssueContext::Region { id: id.to_string() },
        None => IssueContext::Entry { index },
    };

    macro_rules! parsed {
        ($ty:ty) => {
            match parse_value::<$ty>(entry) {
                Ok(value) => value,
                Err(err) => {
                    report.add(ValidationIssue::error(
                        IssueCode::MalformedValue,
                        err.to_string(),
                        context(),
                    ));
                    return;
                }
            }
        };
    }

    match entry.result_type.as_str() {
        "rectanglelabels" => {
            let value = parsed!(RectangleValue);
            check_finite(&[value.x, value.y, value.width, value.height], &context, report);
            check_percent_range(
                &[value.x, value.y, value.width, value.height],
                &context,
                report,
            );
            check_labels(&value.labels, &context, report);
        }
        "polygonlabels" => {
            let value = parsed!(PolygonValue);
            if value.points.len() < 3 {
                report.add(ValidationIssue::error(
                    IssueCode::DegeneratePolygon,
                    format!("Polygon with {} point(s) (minimum 3)", value.points.len()),
                    context(),
                ));
            }
            let coords: Vec<f64> = value.points.iter().flatten().copied().collect();
            check_finite(&coords, &context, report);
            check_percent_range(&coords, &context, report);
            check_labels(&value.labels, &context, report);
        }
        "keypointlabels" => {
            let value = parsed!(KeyPointValue);
            check_finite(&[value.x, value.y], &context, report);
            check_percent_range(&[value.x, value.y], &context, report);
            check_labels(&value.labels, &context, report);
        }
        "labels" => {
            let value = parsed!(TextSpanValue);
            if value.end < value.start {
                report.add(ValidationIssue::error(
                    IssueCode::InvertedSpan,
                    format!("Span ends ({}) before it starts ({})", value.end, value.start),
                    context(),
                ));
            }
            check_labels(&value.labels, &context, report);
        }
        "hypertextlabels" => {
            // Offsets live in different xpath nodes, so ordering across
            // them is not checkable here.
            let value = parsed!(crate::engine::results::HyperTextSpanValue);
            check_labels(&value.labels, &context, report);
        }
        "audiolabels" => {
            let value = parsed!(AudioSpanValue);
            check_finite(&[value.start, value.end], &context, report);
            if value.end < value.start {
                report.add(ValidationIssue::error(
                    IssueCode::InvertedSpan,
                    format!(
                        "Span ends ({:.3}) before it starts ({:.3})",
                        value.end, value.start
                    ),
                    context(),
                ));
            }
            check_labels(&value.labels, &context, report);
        }
        "choices" => {
            let _ = parsed!(ChoicesValue);
        }
        "textarea" => {
            let _ = parsed!(TextAreaValue);
            // Per-region rows must reference a region entry.
            if let Some(id) = entry.id.as_deref() {
                if !region_ids.contains(id) {
                    report.add(ValidationIssue::error(
                        IssueCode::DanglingRegionRef,
                        format!("References non-existent region '{}'", id),
                        IssueContext::Entry { index },
                    ));
                }
            }
        }
        other => {
            report.add(ValidationIssue::warning(
                IssueCode::UnknownResultType,
                format!("Unknown result type '{}'", other),
                context(),
            ));
        }
    }
}

fn validate_relation_entries(
    entries: &[WireEntry],
    region_ids: &HashSet<&str>,
    report: &mut ValidationReport,
) {
    for entry in entries {
        let Some(relation) = entry.as_relation() else {
            continue;
        };
        for endpoint in [&relation.from_id, &relation.to_id] {
            if !region_ids.contains(endpoint.as_str()) {
                report.add(ValidationIssue::error(
                    IssueCode::DanglingRelationEndpoint,
                    format!("References non-existent region '{}'", endpoint),
                    IssueContext::Relation {
                        from_id: relation.from_id.clone(),
                        to_id: relation.to_id.clone(),
                    },
                ));
            }
        }
    }
}

fn check_finite(values: &[f64], context: &impl Fn() -> IssueContext, report: &mut ValidationReport) {
    if values.iter().any(|v| !v.is_finite()) {
        report.add(ValidationIssue::error(
            IssueCode::GeometryNotFinite,
            "Non-finite coordinate",
            context(),
        ));
    }
}

fn check_percent_range(
    values: &[f64],
    context: &impl Fn() -> IssueContext,
    report: &mut ValidationReport,
) {
    // Allow small tolerance for floating point
    let tolerance = 0.5;
    if values
        .iter()
        .filter(|v| v.is_finite())
        .any(|&v| v < -tolerance || v > 100.0 + tolerance)
    {
        report.add(ValidationIssue::warning(
            IssueCode::GeometryOutOfRange,
            "Percent coordinate outside 0..100",
            context(),
        ));
    }
}

fn check_labels(
    labels: &[String],
    context: &impl Fn() -> IssueContext,
    report: &mut ValidationReport,
) {
    if labels.is_empty() {
        report.add(ValidationIssue::warning(
            IssueCode::EmptyLabels,
            "Entry carries no labels",
            context(),
        ));
    }
}
