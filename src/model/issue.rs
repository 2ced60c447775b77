use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    UnknownTag,
    TypeMismatch,
    OutOfDomain,
    ConflictingSpecification,
    Typo { suggestion: String },
    /// A tag that needs at least one of `required` to be present.
    MissingCompanion { required: Vec<String> },
    MissingRequiredData,
    RangeOutOfBounds,
}

impl IssueKind {
    pub fn name(&self) -> &'static str {
        match self {
            IssueKind::UnknownTag => "UnknownTag",
            IssueKind::TypeMismatch => "TypeMismatch",
            IssueKind::OutOfDomain => "OutOfDomain",
            IssueKind::ConflictingSpecification => "ConflictingSpecification",
            IssueKind::Typo { .. } => "Typo",
            IssueKind::MissingCompanion { .. } => "MissingCompanion",
            IssueKind::MissingRequiredData => "MissingRequiredData",
            IssueKind::RangeOutOfBounds => "RangeOutOfBounds",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::Typo { suggestion } => write!(f, "Typo({suggestion})"),
            IssueKind::MissingCompanion { required } => {
                write!(f, "MissingCompanion({})", required.join("|"))
            }
            other => f.write_str(other.name()),
        }
    }
}

/// A single finding produced while normalizing, resolving or validating a
/// document.
///
/// `fixed` is set when the correction engine applied an automatic remedy;
/// fixed issues stay in the report so callers can show what was changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub tag: String,
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    pub fixed: bool,
}

impl ValidationIssue {
    pub fn new(
        tag: impl Into<String>,
        kind: IssueKind,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            kind,
            severity,
            message: message.into(),
            fixed: false,
        }
    }

    pub fn warning(tag: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self::new(tag, kind, Severity::Warning, message)
    }

    pub fn error(tag: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self::new(tag, kind, Severity::Error, message)
    }

    pub fn mark_fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// An error-severity issue that was not remedied.
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error && !self.fixed
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.severity, self.kind, self.tag, self.message
        )?;
        if self.fixed {
            write!(f, " (fixed)")?;
        }
        Ok(())
    }
}
