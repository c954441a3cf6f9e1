//! Diagnostics returned to the caller.
//!
//! Errors and warnings are attached to an [`AttributePath`] when they concern a
//! specific configuration attribute, so the framework driving the provider can
//! annotate the right line of the user's configuration.
//!
//! [`Outcome`] pairs the primary result of an operation with the secondary,
//! non-fatal diagnostics collected on the way (failed cleanup, unlock or
//! close). Secondary diagnostics never replace the primary error.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

/// One step of an attribute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathStep {
    /// Named attribute
    Attribute(String),
    /// Position in a list of blocks
    Index(usize),
}

/// Path to a configuration attribute (e.g. `address_book[1].network`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributePath(Vec<PathStep>);

impl AttributePath {
    /// Path pointing at the resource itself.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Path starting at a top-level attribute.
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![PathStep::Attribute(name.into())])
    }

    /// Extend the path with a nested attribute.
    pub fn attr(&self, name: impl Into<String>) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Attribute(name.into()));
        Self(steps)
    }

    /// Extend the path with a list index.
    pub fn index(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Index(index));
        Self(steps)
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Attribute(name) if i == 0 => write!(f, "{}", name)?,
                PathStep::Attribute(name) => write!(f, ".{}", name)?,
                PathStep::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single error or warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: None,
            path: None,
        }
    }

    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: None,
            path: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_path(mut self, path: AttributePath) -> Self {
        self.path = Some(path);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.severity)?;
        if let Some(path) = self.path.as_ref().filter(|p| !p.is_empty()) {
            write!(f, "{}: ", path)?;
        }
        write!(f, "{}", self.summary)?;
        if let Some(ref detail) = self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        match err {
            Error::Validation { path, message } => {
                Diagnostic::error(message.clone()).with_path(path.clone())
            }
            other => Diagnostic::error(other.to_string()),
        }
    }
}

/// Ordered collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Record an error attached to an attribute path.
    pub fn error_at(&mut self, path: AttributePath, summary: impl Into<String>) {
        self.0.push(Diagnostic::error(summary).with_path(path));
    }

    pub fn warning(&mut self, summary: impl Into<String>) {
        self.0.push(Diagnostic::warning(summary));
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Convert the first error into an [`Error`], keeping its path.
    pub fn into_result(self) -> Result<(), Error> {
        match self.0.into_iter().find(|d| d.severity == Severity::Error) {
            None => Ok(()),
            Some(Diagnostic {
                summary,
                path: Some(path),
                ..
            }) => Err(Error::Validation {
                path,
                message: summary,
            }),
            Some(Diagnostic { summary, .. }) => Err(Error::Validation {
                path: AttributePath::empty(),
                message: summary,
            }),
        }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Primary result of an operation plus the non-fatal warnings gathered on the way.
#[derive(Debug)]
pub struct Outcome<T> {
    pub result: Result<T, Error>,
    pub warnings: Vec<Diagnostic>,
}

impl<T> Outcome<T> {
    pub fn ok(value: T) -> Self {
        Self {
            result: Ok(value),
            warnings: Vec::new(),
        }
    }

    pub fn err(error: Error) -> Self {
        Self {
            result: Err(error),
            warnings: Vec::new(),
        }
    }

    pub fn from_result(result: Result<T, Error>) -> Self {
        Self {
            result,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: impl IntoIterator<Item = Diagnostic>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            result: self.result.map(f),
            warnings: self.warnings,
        }
    }

    /// Drop the warnings and keep the primary result.
    pub fn into_result(self) -> Result<T, Error> {
        self.result
    }

    /// All diagnostics: the primary error (if any) first, then the warnings.
    pub fn diagnostics(&self) -> Diagnostics {
        let mut diags = Diagnostics::new();
        if let Err(ref err) = self.result {
            diags.push(Diagnostic::from(err));
        }
        for warning in &self.warnings {
            diags.push(warning.clone());
        }
        diags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_path_display() {
        assert_eq!(AttributePath::empty().to_string(), "");
        assert_eq!(AttributePath::root("router_id").to_string(), "router_id");
        let path = AttributePath::root("address_book").index(1).attr("network");
        assert_eq!(path.to_string(), "address_book[1].network");
        assert_eq!(path.steps().len(), 3);
    }

    #[test]
    fn test_diagnostics_into_result_keeps_path() {
        let mut diags = Diagnostics::new();
        diags.warning("just a warning");
        assert!(diags.clone().into_result().is_ok());

        diags.error_at(AttributePath::root("graceful_restart"), "bad");
        assert!(diags.has_errors());
        assert_eq!(diags.errors().count(), 1);
        assert_eq!(diags.warnings().count(), 1);

        let err = diags.into_result().unwrap_err();
        assert_eq!(err.path().unwrap().to_string(), "graceful_restart");
    }

    #[test]
    fn test_outcome_error_comes_before_warnings() {
        let outcome: Outcome<()> = Outcome::err(Error::device("commit", "boom"))
            .with_warnings(vec![Diagnostic::warning("failed to clear")]);
        assert!(!outcome.is_ok());

        let diags = outcome.diagnostics();
        let all: Vec<_> = diags.iter().collect();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].severity, Severity::Error);
        assert!(all[0].summary.contains("boom"));
        assert_eq!(all[1].severity, Severity::Warning);
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error("must not be empty")
            .with_path(AttributePath::root("forwarding_table"))
            .with_detail("block has no attributes set");
        assert_eq!(
            diag.to_string(),
            "error: forwarding_table: must not be empty (block has no attributes set)"
        );
    }
}
