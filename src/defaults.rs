//! Literal `default` tag injection.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::schema::{AnyRecord, Record, Schema, Walk};
use crate::value::Kind;

/// Seeds a record with its tag-declared default values.
///
/// Defaults are a baseline for later extraction steps, not a fallback:
/// every field carrying a `default` tag is overwritten, whatever value it
/// held. Missing nested records are allocated and visited depth-first.
/// Kinds the engine does not understand are skipped. Rules are never
/// parsed or checked here.
///
/// # Examples
///
/// ```
/// use bind_core::{DefaultInjector, Record, SchemaBuilder};
///
/// #[derive(Default)]
/// struct Page {
///     size: u32,
///     sort: Option<String>,
/// }
///
/// impl Record for Page {
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema
///             .field("Size", r#"default:"20""#, |p| &p.size, |p| &mut p.size)
///             .field("Sort", r#"default:"name""#, |p| &p.sort, |p| &mut p.sort);
///     }
/// }
///
/// let mut page = Page { size: 99, sort: None };
/// DefaultInjector::default().apply(&mut page).unwrap();
/// assert_eq!(page.size, 20);
/// assert_eq!(page.sort.as_deref(), Some("name"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInjector {
    config: EngineConfig,
}

impl DefaultInjector {
    /// Creates an injector with the given limits.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Applies every `default` tag reachable from `record`.
    ///
    /// # Errors
    ///
    /// A config [`EngineError`] if a default literal does not parse as its
    /// field's kind, or a depth error if nesting exceeds
    /// [`EngineConfig::max_depth`].
    pub fn apply<R: Record>(&self, record: &mut R) -> Result<(), EngineError> {
        let mut walk = Walk::new(self.config);
        tracing::debug!(record = record.type_name(), "injecting defaults");
        record.inject_defaults(&mut walk)
    }
}

pub(crate) fn inject<R: Record>(record: &mut R, walk: &mut Walk) -> Result<(), EngineError> {
    let schema = Schema::<R>::build();

    for entry in schema.entries() {
        if entry.kind() == Kind::Record {
            walk.descend(entry.name(), |w| match entry.nested_or_insert(record) {
                Some(nested) => nested.inject_defaults(w),
                None => Ok(()),
            })?;
            continue;
        }

        let Some(literal) = entry.default_literal() else {
            continue;
        };

        if entry.kind() == Kind::Opaque {
            tracing::trace!(field = %walk.path_of(entry.name()), "skipping default for opaque kind");
            continue;
        }

        if let Some(field) = entry.value_mut(record) {
            field.set_from_text(literal).map_err(|e| {
                EngineError::config(walk.path_of(entry.name()), format!("invalid default: {}", e))
            })?;
            tracing::trace!(field = %walk.path_of(entry.name()), default = literal, "default applied");
        }
    }

    Ok(())
}
