//! Validation report types for structured error reporting.
//!
//! This module provides rich, structured validation results that can be
//! displayed to users, written to files, or processed programmatically.

use std::fmt;

/// The result of validating a wire result array.
///
/// Contains all issues found during validation, categorized by severity.
#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    /// All issues found during validation.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Returns the number of errors in the report.
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Returns the number of warnings in the report.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single validation issue (error or warning).
#[derive(Clone, Debug)]
pub struct ValidationIssue {
    /// The severity of the issue.
    pub severity: Severity,

    /// A stable code for the issue type.
    pub code: IssueCode,

    /// A human-readable description of the issue.
    pub message: String,

    /// Context about where the issue occurred.
    pub context: IssueContext,
}

impl ValidationIssue {
    /// Creates a new validation issue.
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    /// Creates a new error.
    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    /// Creates a new warning.
    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

/// The severity of a validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// A warning that doesn't prevent loading but may indicate problems.
    Warning,
    /// An error that indicates invalid or corrupt data.
    Error,
}

/// A stable code identifying the type of validation issue.
///
/// These codes can be used for filtering, ignoring specific issues,
/// or programmatic handling of validation results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueCode {
    // ID issues
    /// Multiple region entries carry the same persisted id.
    DuplicateRegionId,

    // Reference issues
    /// A relation endpoint references no region entry in the array.
    DanglingRelationEndpoint,
    /// A per-region value references no region entry in the array.
    DanglingRegionRef,

    // Addressing issues
    /// An entry has an empty from_name.
    EmptyFromName,
    /// An entry has an empty to_name (or an empty segment in a list).
    EmptyToName,

    // Type issues
    /// An entry carries a type tag the engine does not know.
    UnknownResultType,

    // Geometry issues
    /// A geometry field is NaN or infinite.
    GeometryNotFinite,
    /// A percent coordinate lies outside the 0..100 range.
    GeometryOutOfRange,
    /// A polygon has fewer than 3 points.
    DegeneratePolygon,
    /// A span ends before it starts.
    InvertedSpan,
    /// A value payload does not parse as its declared type.
    MalformedValue,

    // Label issues
    /// A labels-flavor entry carries no labels.
    EmptyLabels,
}

/// Context about where a validation issue occurred.
#[derive(Clone, Debug)]
pub enum IssueContext {
    /// Issue with the result array as a whole.
    Results,
    /// Issue with the entry at a given array index.
    Entry { index: usize },
    /// Issue with a specific region entry.
    Region { id: String },
    /// Issue with a relation link.
    Relation { from_id: String, to_id: String },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Results => write!(f, "results"),
            IssueContext::Entry { index } => write!(f, "entry {}", index),
            IssueContext::Region { id } => write!(f, "region {}", id),
            IssueContext::Relation { from_id, to_id } => {
                write!(f, "relation {} -> {}", from_id, to_id)
            }
        }
    }
}
