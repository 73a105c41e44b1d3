//! Extraction boundary trait for web integration.
//!
//! This module defines the one abstraction the binder needs from a
//! framework-specific request type: raw values looked up by source
//! category and external name.

use crate::tags::Source;

/// A raw value found in a request, before coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceValue<'a> {
    /// A single text value (path segment, single header).
    Text(&'a str),
    /// Every value supplied under one name (repeated query or form keys).
    Texts(Vec<&'a str>),
    /// Uploaded file contents.
    Bytes(&'a [u8]),
}

/// Supplies raw request values to the [`Binder`](super::Binder).
///
/// Framework integrations implement this for their request type, or copy
/// the request into a [`RequestAdapter`](super::RequestAdapter).
///
/// # Design Notes
///
/// This trait intentionally does NOT:
/// - Decode request bodies (JSON and other body formats are bound by the
///   caller before or after [`Binder::bind`](super::Binder::bind))
/// - Coerce values (that is the field's job)
/// - Report missing values (absent required fields fail validation)
///
/// # Examples
///
/// ```
/// use bind_core::web::{BindSource, SourceValue};
/// use bind_core::Source;
///
/// struct PathOnly {
///     id: String,
/// }
///
/// impl BindSource for PathOnly {
///     fn lookup(&self, source: Source, name: &str) -> Option<SourceValue<'_>> {
///         match (source, name) {
///             (Source::Path, "id") => Some(SourceValue::Text(&self.id)),
///             _ => None,
///         }
///     }
/// }
///
/// let req = PathOnly { id: "42".to_string() };
/// assert_eq!(req.lookup(Source::Path, "id"), Some(SourceValue::Text("42")));
/// assert_eq!(req.lookup(Source::Query, "id"), None);
/// assert_eq!(req.request_id(), None);
/// ```
pub trait BindSource {
    /// Identifier attached to binding logs, if the request has one.
    fn request_id(&self) -> Option<&str> {
        None
    }

    /// Finds the value named `name` in the `source` part of the request.
    ///
    /// Returns `None` when the request carries no such value.
    fn lookup(&self, source: Source, name: &str) -> Option<SourceValue<'_>>;
}

impl<S: BindSource + ?Sized> BindSource for &S {
    fn request_id(&self) -> Option<&str> {
        (**self).request_id()
    }

    fn lookup(&self, source: Source, name: &str) -> Option<SourceValue<'_>> {
        (**self).lookup(source, name)
    }
}
