use std::fmt;

/// Errors that can occur in the binding and validation engine.
///
/// The two variants are disjoint: an [`EngineError`] is a
/// programming or schema mistake, a [`Report`] enumerates end-user data
/// problems.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The engine refused to run (bad input type, bad rule, too deep).
    Engine(EngineError),
    /// The record was processed but one or more rules were violated.
    Invalid(Report),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Engine(e) => write!(f, "engine error: {}", e),
            Error::Invalid(r) => write!(f, "validation failed: {}", r),
        }
    }
}

impl std::error::Error for Error {}

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Self {
        Error::Engine(e)
    }
}

impl From<Report> for Error {
    fn from(r: Report) -> Self {
        Error::Invalid(r)
    }
}

/// An engine-level failure that aborts the whole call.
///
/// Engine errors never occur for a correctly tagged record. They are built
/// through the dedicated constructors so the error class is always explicit
/// at the call site.
///
/// # Examples
///
/// ```
/// use bind_core::{EngineError, EngineErrorKind};
///
/// let err = EngineError::config("Age", "unknown rule operator `frobnicate`");
/// assert_eq!(err.kind(), EngineErrorKind::Config);
/// assert!(err.to_string().contains("frobnicate"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    kind: EngineErrorKind,
    subject: String,
    message: String,
}

impl EngineError {
    /// Input was not a (non-nil) record the engine knows how to walk.
    pub fn type_error(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Type, subject, message)
    }

    /// A tag on `field` is malformed (unknown operator, bad operand, bad default).
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Config, field, message)
    }

    /// Nested records went deeper than the configured limit.
    pub fn depth_exceeded(path: impl Into<String>, max_depth: usize) -> Self {
        Self::new(
            EngineErrorKind::DepthExceeded,
            path,
            format!("nesting exceeds maximum depth of {}", max_depth),
        )
    }

    fn new(kind: EngineErrorKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> EngineErrorKind {
        self.kind
    }

    /// Returns the type or field the error refers to.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Prefixes the subject with the path of the enclosing record field.
    pub(crate) fn nested_under(mut self, parent: &str) -> Self {
        if !parent.is_empty() {
            self.subject = format!("{}.{}", parent, self.subject);
        }
        self
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.subject, self.message)
    }
}

impl std::error::Error for EngineError {}

/// Kind of engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// Input is not a pointer to a registered record.
    Type,
    /// A field's tags are malformed.
    Config,
    /// Nested record traversal exceeded `EngineConfig::max_depth`.
    DepthExceeded,
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type => write!(f, "type error"),
            Self::Config => write!(f, "config error"),
            Self::DepthExceeded => write!(f, "depth exceeded"),
        }
    }
}

/// One rule failure tied to a specific field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted declared-name path of the field (`Address.City`)
    pub field: String,
    /// Human-readable message, phrased to follow the field name
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

impl std::error::Error for Violation {}

/// Ordered list of violations collected during one call.
///
/// An empty report means the record is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    violations: Vec<Violation>,
}

impl Report {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a violation.
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Appends every violation of `other`, keeping order.
    pub fn extend(&mut self, other: Report) {
        self.violations.extend(other.violations);
    }

    /// Returns `true` when no rule was violated.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Same as [`Report::is_valid`].
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Iterates violations in the order they were found.
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Returns the violations as a slice.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Violations reported for one field path.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations.iter().filter(move |v| v.field == field)
    }

    /// `Ok(())` when valid, otherwise the report as an error.
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::Invalid(self))
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

impl IntoIterator for Report {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl FromIterator<Violation> for Report {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        Self {
            violations: iter.into_iter().collect(),
        }
    }
}

/// Literal text could not be converted into a field's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
    expected: &'static str,
    input: String,
}

impl CoercionError {
    /// Creates a coercion error for `input` that should have been an `expected`.
    pub fn new(expected: &'static str, input: impl Into<String>) -> Self {
        Self {
            expected,
            input: input.into(),
        }
    }

    /// Name of the kind the text was parsed as.
    pub fn expected(&self) -> &'static str {
        self.expected
    }

    /// The text that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse {:?} as {}", self.input, self.expected)
    }
}

impl std::error::Error for CoercionError {}

/// A [`CoercionError`] scoped to the field it happened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Declared name of the field
    pub field: String,
    /// Underlying conversion failure
    pub source: CoercionError,
}

impl FieldError {
    /// Wraps a coercion error with the field name.
    pub fn new(field: impl Into<String>, source: CoercionError) -> Self {
        Self {
            field: field.into(),
            source,
        }
    }

    /// Converts into the violation reported to end users.
    pub fn into_violation(self) -> Violation {
        Violation::new(self.field, format!("is invalid: {}", self.source))
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.source)
    }
}

impl std::error::Error for FieldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
