//! Owned, framework-neutral request parts.

use std::collections::HashMap;

use crate::tags::Source;

use super::{BindSource, SourceValue};

/// Adapter for copying framework-specific HTTP requests into plain parts.
///
/// `RequestAdapter` is the primary integration point between web frameworks
/// and the binder. It holds:
/// - the request id used in binding logs
/// - path parameters from routing
/// - query parameters and url-encoded form fields, each possibly repeated
/// - headers, looked up case-insensitively
/// - uploaded files as raw bytes
///
/// # Design Notes
///
/// This type intentionally contains simple, owned data to avoid coupling
/// to any specific framework's request types. Framework-specific code
/// should implement `From<FrameworkRequest>` for `RequestAdapter`.
///
/// # Examples
///
/// ```
/// use bind_core::web::{BindSource, RequestAdapter, SourceValue};
/// use bind_core::Source;
///
/// let mut adapter = RequestAdapter::new("req-12345".to_string());
/// adapter.add_path_param("id".to_string(), "7".to_string());
/// adapter.add_query_param("tag".to_string(), "a".to_string());
/// adapter.add_query_param("tag".to_string(), "b".to_string());
/// adapter.add_header("X-Token".to_string(), "t0k".to_string());
///
/// assert_eq!(adapter.lookup(Source::Path, "id"), Some(SourceValue::Text("7")));
/// assert_eq!(
///     adapter.lookup(Source::Query, "tag"),
///     Some(SourceValue::Texts(vec!["a", "b"]))
/// );
/// assert_eq!(adapter.lookup(Source::Header, "x-token"), Some(SourceValue::Text("t0k")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestAdapter {
    /// Unique request identifier
    request_id: String,
    /// Path parameters from routing
    path_params: HashMap<String, String>,
    /// Query parameters from URL, in arrival order per key
    query_params: HashMap<String, Vec<String>>,
    /// Request headers, keyed by lowercase name
    headers: HashMap<String, Vec<String>>,
    /// Url-encoded or multipart text fields
    form_fields: HashMap<String, Vec<String>>,
    /// Multipart file parts
    files: HashMap<String, Vec<u8>>,
}

impl RequestAdapter {
    /// Creates a new request adapter with the given request ID.
    ///
    /// All other fields are initialized as empty. Use the `add_*` methods
    /// to populate them.
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            ..Self::default()
        }
    }

    /// Adds a path parameter, replacing any previous value.
    pub fn add_path_param(&mut self, key: String, value: String) {
        self.path_params.insert(key, value);
    }

    /// Adds a query parameter. Repeated keys keep every value.
    pub fn add_query_param(&mut self, key: String, value: String) {
        self.query_params.entry(key).or_default().push(value);
    }

    /// Adds a header. Names are case-insensitive.
    pub fn add_header(&mut self, key: String, value: String) {
        self.headers
            .entry(key.to_ascii_lowercase())
            .or_default()
            .push(value);
    }

    /// Adds a form field. Repeated keys keep every value.
    pub fn add_form_field(&mut self, key: String, value: String) {
        self.form_fields.entry(key).or_default().push(value);
    }

    /// Adds an uploaded file, replacing any previous file under `key`.
    pub fn add_file(&mut self, key: String, contents: Vec<u8>) {
        self.files.insert(key, contents);
    }

    /// Returns a reference to the request ID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Query parameters by key.
    pub fn query_params(&self) -> &HashMap<String, Vec<String>> {
        &self.query_params
    }

    /// Form fields by key.
    pub fn form_fields(&self) -> &HashMap<String, Vec<String>> {
        &self.form_fields
    }
}

fn texts(values: &[String]) -> Option<SourceValue<'_>> {
    match values {
        [] => None,
        [one] => Some(SourceValue::Text(one)),
        many => Some(SourceValue::Texts(many.iter().map(String::as_str).collect())),
    }
}

impl BindSource for RequestAdapter {
    fn request_id(&self) -> Option<&str> {
        Some(&self.request_id)
    }

    fn lookup(&self, source: Source, name: &str) -> Option<SourceValue<'_>> {
        match source {
            Source::Path => self.path_params.get(name).map(|v| SourceValue::Text(v)),
            Source::Query => self.query_params.get(name).and_then(|v| texts(v)),
            Source::Header => self
                .headers
                .get(&name.to_ascii_lowercase())
                .and_then(|v| texts(v)),
            Source::Form => self.form_fields.get(name).and_then(|v| texts(v)),
            Source::File => self.files.get(name).map(|b| SourceValue::Bytes(b)),
            Source::Body => None,
        }
    }
}
