//! Dynamically typed entry points.
//!
//! [`DefaultInjector`](crate::DefaultInjector) and
//! [`RuleEngine`](crate::RuleEngine) are generic over the record type and
//! cannot be handed the wrong kind of value. Callers that only hold a
//! `&mut dyn Any` (plugin hosts, framework glue keyed by type id) go
//! through a [`Registry`] instead, which reports a type error for anything
//! that is not a registered record.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::error::{EngineError, Report};
use crate::schema::{AnyRecord, Record, Walk};

struct Entry {
    type_name: &'static str,
    view: fn(&dyn Any) -> Option<&dyn AnyRecord>,
    view_mut: fn(&mut dyn Any) -> Option<&mut dyn AnyRecord>,
}

/// Table of record types reachable through `dyn Any`.
///
/// Registering `R` also registers `Box<R>`, `Option<R>` and
/// `Option<Box<R>>`. An empty option at the root is a type error; it is
/// never allocated.
///
/// # Examples
///
/// ```
/// use std::any::Any;
///
/// use bind_core::{EngineErrorKind, Record, Registry, SchemaBuilder};
///
/// #[derive(Default)]
/// struct Query {
///     limit: u32,
/// }
///
/// impl Record for Query {
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema.field("Limit", r#"default:"50" validate:"lte=100""#, |q| &q.limit, |q| &mut q.limit);
///     }
/// }
///
/// let mut registry = Registry::new();
/// registry.register::<Query>();
///
/// let mut query = Query::default();
/// registry.apply_defaults(&mut query).unwrap();
/// assert_eq!(query.limit, 50);
/// assert!(registry.validate(&query).unwrap().is_valid());
///
/// let mut number = 7_i32;
/// let err = registry.apply_defaults(&mut number as &mut dyn Any).unwrap_err();
/// assert_eq!(err.kind(), EngineErrorKind::Type);
/// ```
pub struct Registry {
    config: EngineConfig,
    types: HashMap<TypeId, Entry>,
}

impl Registry {
    /// Creates an empty registry with default limits.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an empty registry with the given limits.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            types: HashMap::new(),
        }
    }

    /// Registers `R` and its boxed and optional forms.
    pub fn register<R: Record>(&mut self) -> &mut Self {
        let type_name = std::any::type_name::<R>();

        self.insert::<R>(
            type_name,
            |any| any.downcast_ref::<R>().map(|r| r as &dyn AnyRecord),
            |any| any.downcast_mut::<R>().map(|r| r as &mut dyn AnyRecord),
        );
        self.insert::<Box<R>>(
            type_name,
            |any| any.downcast_ref::<Box<R>>().map(|r| &**r as &dyn AnyRecord),
            |any| any.downcast_mut::<Box<R>>().map(|r| &mut **r as &mut dyn AnyRecord),
        );
        self.insert::<Option<R>>(
            type_name,
            |any| {
                any.downcast_ref::<Option<R>>()
                    .and_then(Option::as_ref)
                    .map(|r| r as &dyn AnyRecord)
            },
            |any| {
                any.downcast_mut::<Option<R>>()
                    .and_then(Option::as_mut)
                    .map(|r| r as &mut dyn AnyRecord)
            },
        );
        self.insert::<Option<Box<R>>>(
            type_name,
            |any| {
                any.downcast_ref::<Option<Box<R>>>()
                    .and_then(Option::as_deref)
                    .map(|r| r as &dyn AnyRecord)
            },
            |any| {
                any.downcast_mut::<Option<Box<R>>>()
                    .and_then(Option::as_deref_mut)
                    .map(|r| r as &mut dyn AnyRecord)
            },
        );

        tracing::debug!(record = type_name, "record type registered");
        self
    }

    fn insert<T: Any>(
        &mut self,
        type_name: &'static str,
        view: fn(&dyn Any) -> Option<&dyn AnyRecord>,
        view_mut: fn(&mut dyn Any) -> Option<&mut dyn AnyRecord>,
    ) {
        self.types.insert(
            TypeId::of::<T>(),
            Entry {
                type_name,
                view,
                view_mut,
            },
        );
    }

    /// Returns `true` if values of type `T` are accepted.
    pub fn is_registered<T: Any>(&self) -> bool {
        self.types.contains_key(&TypeId::of::<T>())
    }

    /// Number of accepted types; four per registered record.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Applies `default` tags to a registered record.
    ///
    /// # Errors
    ///
    /// A type [`EngineError`] if `target` is not a registered record or is
    /// an empty option, plus everything
    /// [`DefaultInjector::apply`](crate::DefaultInjector::apply) reports.
    pub fn apply_defaults(&self, target: &mut dyn Any) -> Result<(), EngineError> {
        let entry = self.lookup((*target).type_id())?;
        let record = (entry.view_mut)(target).ok_or_else(|| absent(entry))?;
        let mut walk = Walk::new(self.config);
        record.inject_defaults(&mut walk)
    }

    /// Validates a registered record.
    ///
    /// # Errors
    ///
    /// A type [`EngineError`] if `target` is not a registered record or is
    /// an empty option, plus everything
    /// [`RuleEngine::validate_record`](crate::RuleEngine::validate_record)
    /// reports.
    pub fn validate(&self, target: &dyn Any) -> Result<Report, EngineError> {
        let entry = self.lookup((*target).type_id())?;
        let record = (entry.view)(target).ok_or_else(|| absent(entry))?;
        let mut walk = Walk::new(self.config);
        let mut report = Report::new();
        record.collect_violations(&mut walk, &mut report)?;
        tracing::debug!(
            record = entry.type_name,
            violations = report.len(),
            "record validated"
        );
        Ok(report)
    }

    fn lookup(&self, id: TypeId) -> Result<&Entry, EngineError> {
        self.types.get(&id).ok_or_else(|| {
            EngineError::type_error(
                "dyn Any",
                format!("value is not a registered record type ({:?})", id),
            )
        })
    }
}

fn absent(entry: &Entry) -> EngineError {
    EngineError::type_error(entry.type_name, "expected a record, found an empty option")
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.types.values().map(|e| e.type_name).collect();
        names.sort_unstable();
        names.dedup();
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("records", &names)
            .finish()
    }
}
