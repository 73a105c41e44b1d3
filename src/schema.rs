//! Per-type field tables.
//!
//! There is no runtime reflection: a record type lists its fields once in
//! [`Record::describe`], handing the engine a getter/setter pair per field.
//! [`Schema::build`] turns that list into classified entries with parsed
//! rule sets.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::config::EngineConfig;
use crate::error::{CoercionError, EngineError, FieldError, Report};
use crate::field::{FieldKind, Lens, ValueSlot};
use crate::rules::RuleSet;
use crate::tags::{Annotation, Source, TagClassifier, TagSet};
use crate::value::{Kind, Value};

/// A composite type whose fields the engine can walk.
///
/// # Examples
///
/// ```
/// use bind_core::{Record, SchemaBuilder};
///
/// #[derive(Default)]
/// struct Address {
///     city: String,
/// }
///
/// impl Record for Address {
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema.field("City", r#"json:"city" validate:"required""#, |a| &a.city, |a| &mut a.city);
///     }
/// }
///
/// #[derive(Default)]
/// struct User {
///     age: i32,
///     address: Option<Box<Address>>,
/// }
///
/// impl Record for User {
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema
///             .field("Age", r#"default:"18" validate:"gte=0,lte=130""#, |u| &u.age, |u| &mut u.age)
///             .nested_boxed("Address", "", |u| &u.address, |u| &mut u.address);
///     }
/// }
/// ```
pub trait Record: Sized + 'static {
    /// Registers every field of the record, in declaration order.
    fn describe(schema: &mut SchemaBuilder<Self>);
}

/// Collects field registrations for one record type.
pub struct SchemaBuilder<R> {
    fields: Vec<RawField<R>>,
}

struct RawField<R> {
    name: &'static str,
    tags: TagSet,
    access: Access<R>,
}

enum Access<R> {
    Value(Box<dyn ValueSlot<R>>),
    Nested(Box<dyn NestedSlot<R>>),
}

impl<R: Record> SchemaBuilder<R> {
    fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Registers a value field with its tag literal.
    pub fn field<T: FieldKind>(
        &mut self,
        name: &'static str,
        tags: &str,
        get: fn(&R) -> &T,
        get_mut: fn(&mut R) -> &mut T,
    ) -> &mut Self {
        self.push(name, tags, Access::Value(Box::new(Lens::new(get, get_mut))))
    }

    /// Registers an optional nested record, `Option<N>`.
    ///
    /// Default injection allocates a missing record before descending
    /// into it; validation only descends into records that are present.
    pub fn nested<N: Record + Default>(
        &mut self,
        name: &'static str,
        tags: &str,
        get: fn(&R) -> &Option<N>,
        get_mut: fn(&mut R) -> &mut Option<N>,
    ) -> &mut Self {
        self.push(name, tags, Access::Nested(Box::new(OptSlot(Lens::new(get, get_mut)))))
    }

    /// Registers an optional boxed nested record, `Option<Box<N>>`.
    ///
    /// Self-referential record types use this shape.
    pub fn nested_boxed<N: Record + Default>(
        &mut self,
        name: &'static str,
        tags: &str,
        get: fn(&R) -> &Option<Box<N>>,
        get_mut: fn(&mut R) -> &mut Option<Box<N>>,
    ) -> &mut Self {
        self.push(name, tags, Access::Nested(Box::new(OptBoxSlot(Lens::new(get, get_mut)))))
    }

    /// Registers a nested record stored inline.
    pub fn embed<N: Record>(
        &mut self,
        name: &'static str,
        tags: &str,
        get: fn(&R) -> &N,
        get_mut: fn(&mut R) -> &mut N,
    ) -> &mut Self {
        self.push(name, tags, Access::Nested(Box::new(Inline(Lens::new(get, get_mut)))))
    }

    fn push(&mut self, name: &'static str, tags: &str, access: Access<R>) -> &mut Self {
        self.fields.push(RawField {
            name,
            tags: TagSet::parse(tags),
            access,
        });
        self
    }
}

/// Object-safe view of any [`Record`], used to descend into nested records.
///
/// Implemented for every `Record`; there is no need to implement it by hand.
pub trait AnyRecord {
    /// Name of the concrete record type.
    fn type_name(&self) -> &'static str;

    /// Applies `default` tags to this record and everything nested in it.
    fn inject_defaults(&mut self, walk: &mut Walk) -> Result<(), EngineError>;

    /// Evaluates `validate` tags, appending violations to `report`.
    fn collect_violations(&self, walk: &mut Walk, report: &mut Report) -> Result<(), EngineError>;
}

impl<R: Record> AnyRecord for R {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    fn inject_defaults(&mut self, walk: &mut Walk) -> Result<(), EngineError> {
        crate::defaults::inject(self, walk)
    }

    fn collect_violations(&self, walk: &mut Walk, report: &mut Report) -> Result<(), EngineError> {
        crate::engine::collect(self, walk, report)
    }
}

trait NestedSlot<R> {
    fn get<'a>(&self, record: &'a R) -> Option<&'a dyn AnyRecord>;

    fn get_or_insert<'a>(&self, record: &'a mut R) -> &'a mut dyn AnyRecord;
}

struct OptSlot<R, N>(Lens<R, Option<N>>);

impl<R, N: Record + Default> NestedSlot<R> for OptSlot<R, N> {
    fn get<'a>(&self, record: &'a R) -> Option<&'a dyn AnyRecord> {
        self.0.get(record).as_ref().map(|n| n as &dyn AnyRecord)
    }

    fn get_or_insert<'a>(&self, record: &'a mut R) -> &'a mut dyn AnyRecord {
        self.0.get_mut(record).get_or_insert_with(N::default)
    }
}

struct OptBoxSlot<R, N>(Lens<R, Option<Box<N>>>);

impl<R, N: Record + Default> NestedSlot<R> for OptBoxSlot<R, N> {
    fn get<'a>(&self, record: &'a R) -> Option<&'a dyn AnyRecord> {
        self.0.get(record).as_deref().map(|n| n as &dyn AnyRecord)
    }

    fn get_or_insert<'a>(&self, record: &'a mut R) -> &'a mut dyn AnyRecord {
        &mut **self.0.get_mut(record).get_or_insert_with(Box::default)
    }
}

struct Inline<R, N>(Lens<R, N>);

impl<R, N: Record> NestedSlot<R> for Inline<R, N> {
    fn get<'a>(&self, record: &'a R) -> Option<&'a dyn AnyRecord> {
        Some(self.0.get(record) as &dyn AnyRecord)
    }

    fn get_or_insert<'a>(&self, record: &'a mut R) -> &'a mut dyn AnyRecord {
        self.0.get_mut(record)
    }
}

/// Traversal state threaded through nested records: the configured limits,
/// the current depth and the dotted path of the record being visited.
#[derive(Debug)]
pub struct Walk {
    config: EngineConfig,
    depth: usize,
    path: String,
}

impl Walk {
    pub(crate) fn new(config: EngineConfig) -> Self {
        Self {
            config,
            depth: 0,
            path: String::new(),
        }
    }

    /// Dotted path of the record currently visited; empty at the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Nesting depth of the record currently visited; 0 at the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Dotted path of `field` within the current record.
    pub fn path_of(&self, field: &str) -> String {
        if self.path.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.path, field)
        }
    }

    /// Runs `visit` one level deeper, under `field`.
    pub(crate) fn descend<T>(
        &mut self,
        field: &str,
        visit: impl FnOnce(&mut Walk) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let max = self.config.max_depth();
        if self.depth >= max {
            return Err(EngineError::depth_exceeded(self.path_of(field), max));
        }

        let parent = std::mem::take(&mut self.path);
        self.path = if parent.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", parent, field)
        };
        self.depth += 1;

        let out = visit(self);

        self.depth -= 1;
        self.path = parent;
        out
    }
}

pub(crate) struct FieldEntry<R> {
    name: &'static str,
    tags: TagSet,
    annotations: BTreeSet<Annotation>,
    external: String,
    source: Source,
    required: bool,
    kind: Kind,
    access: Access<R>,
    rules: Result<RuleSet, EngineError>,
}

impl<R> FieldEntry<R> {
    fn new(raw: RawField<R>) -> Self {
        let kind = match &raw.access {
            Access::Value(slot) => slot.kind(),
            Access::Nested(_) => Kind::Record,
        };
        let (external, source) = TagClassifier::resolve_external_name(raw.name, &raw.tags);
        let annotations = TagClassifier::classify(&raw.tags);

        let tag_required = raw
            .tags
            .get(Annotation::Required.key())
            .map_or(false, |v| v.trim() != "false");

        let rules = match raw.tags.get(Annotation::Validate.key()) {
            Some(tag) => RuleSet::parse(raw.name, tag, kind),
            None => Ok(RuleSet::default()),
        }
        .map(|mut set| {
            if tag_required {
                set.require();
            }
            set
        });

        let required = tag_required || rules.as_ref().map_or(false, RuleSet::is_required);

        Self {
            name: raw.name,
            tags: raw.tags,
            annotations,
            external,
            source,
            required,
            kind,
            access: raw.access,
            rules,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn default_literal(&self) -> Option<&str> {
        self.tags.get(Annotation::Default.key())
    }

    pub(crate) fn kind(&self) -> Kind {
        self.kind
    }

    pub(crate) fn rules(&self) -> Result<&RuleSet, &EngineError> {
        self.rules.as_ref()
    }

    pub(crate) fn value<'a>(&self, record: &'a R) -> Value<'a> {
        match &self.access {
            Access::Value(slot) => slot.get(record).value(),
            Access::Nested(slot) => match slot.get(record) {
                Some(_) => Value::Opaque,
                None => Value::Null,
            },
        }
    }

    pub(crate) fn value_mut<'a>(&self, record: &'a mut R) -> Option<&'a mut dyn FieldKind> {
        match &self.access {
            Access::Value(slot) => Some(slot.get_mut(record)),
            Access::Nested(_) => None,
        }
    }

    pub(crate) fn nested<'a>(&self, record: &'a R) -> Option<&'a dyn AnyRecord> {
        match &self.access {
            Access::Nested(slot) => slot.get(record),
            Access::Value(_) => None,
        }
    }

    pub(crate) fn nested_or_insert<'a>(&self, record: &'a mut R) -> Option<&'a mut dyn AnyRecord> {
        match &self.access {
            Access::Nested(slot) => Some(slot.get_or_insert(record)),
            Access::Value(_) => None,
        }
    }
}

/// The classified field table of one record type.
///
/// Schemas are cheap to build and are built fresh by each engine call.
/// Callers that bind many records of one type may build one and reuse it.
pub struct Schema<R> {
    type_name: &'static str,
    fields: Vec<FieldEntry<R>>,
}

impl<R: Record> Schema<R> {
    /// Builds the table from [`Record::describe`].
    pub fn build() -> Self {
        let mut builder = SchemaBuilder::new();
        R::describe(&mut builder);
        Self {
            type_name: std::any::type_name::<R>(),
            fields: builder.fields.into_iter().map(FieldEntry::new).collect(),
        }
    }

    /// Name of the record type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Number of registered fields, nested records included.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record registered no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Descriptors of every value field, in declaration order.
    ///
    /// Nested records are not bindable from text and are not listed.
    pub fn descriptors(&self) -> impl Iterator<Item = FieldDescriptor<'_, R>> + '_ {
        self.fields.iter().filter_map(FieldDescriptor::new)
    }

    /// Descriptor of the value field with this declared name.
    pub fn field(&self, declared: &str) -> Option<FieldDescriptor<'_, R>> {
        self.descriptors().find(|d| d.declared_name() == declared)
    }

    /// Value fields keyed by external name. When two fields resolve to the
    /// same external name the later declaration wins.
    pub fn by_external_name(&self) -> HashMap<&str, FieldDescriptor<'_, R>> {
        self.descriptors().map(|d| (d.external_name(), d)).collect()
    }

    pub(crate) fn entries(&self) -> &[FieldEntry<R>] {
        &self.fields
    }

    pub(crate) fn entry(&self, declared: &str) -> Option<&FieldEntry<R>> {
        self.fields.iter().find(|e| e.name == declared)
    }
}

impl<R> fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields.iter().map(|e| e.name).collect::<Vec<_>>())
            .finish()
    }
}

/// Classification and access handle for one value field.
pub struct FieldDescriptor<'s, R> {
    entry: &'s FieldEntry<R>,
}

impl<'s, R> FieldDescriptor<'s, R> {
    fn new(entry: &'s FieldEntry<R>) -> Option<Self> {
        match entry.access {
            Access::Value(_) => Some(Self { entry }),
            Access::Nested(_) => None,
        }
    }

    /// Name the field was registered under.
    pub fn declared_name(&self) -> &'static str {
        self.entry.name
    }

    /// Name used to look the field up in request sources.
    pub fn external_name(&self) -> &'s str {
        &self.entry.external
    }

    /// Where the value comes from.
    pub fn source(&self) -> Source {
        self.entry.source
    }

    /// `true` if tagged `required` or carrying a `required` rule.
    pub fn is_required(&self) -> bool {
        self.entry.required
    }

    /// Annotations present on the field, sorted by key.
    pub fn annotations(&self) -> &'s BTreeSet<Annotation> {
        &self.entry.annotations
    }

    /// Parsed tags.
    pub fn tags(&self) -> &'s TagSet {
        &self.entry.tags
    }

    /// Static kind of the field.
    pub fn kind(&self) -> Kind {
        self.entry.kind
    }

    /// Current value of the field in `record`.
    pub fn value<'a>(&self, record: &'a R) -> Value<'a> {
        self.entry.value(record)
    }

    /// Parses `text` into the field.
    pub fn set_from_text(&self, record: &mut R, text: &str) -> Result<(), FieldError> {
        self.write(record, |f| f.set_from_text(text))
    }

    /// Parses several values into the field.
    pub fn set_from_texts(&self, record: &mut R, texts: &[&str]) -> Result<(), FieldError> {
        self.write(record, |f| f.set_from_texts(texts))
    }

    /// Stores raw bytes into the field.
    pub fn set_from_bytes(&self, record: &mut R, bytes: &[u8]) -> Result<(), FieldError> {
        self.write(record, |f| f.set_from_bytes(bytes))
    }

    fn write(
        &self,
        record: &mut R,
        op: impl FnOnce(&mut dyn FieldKind) -> Result<(), CoercionError>,
    ) -> Result<(), FieldError> {
        match self.entry.value_mut(record) {
            Some(field) => op(field).map_err(|e| FieldError::new(self.entry.name, e)),
            None => Ok(()),
        }
    }
}

impl<R> Clone for FieldDescriptor<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for FieldDescriptor<'_, R> {}

impl<R> fmt::Debug for FieldDescriptor<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("declared_name", &self.entry.name)
            .field("external_name", &self.entry.external)
            .field("source", &self.entry.source)
            .field("required", &self.entry.required)
            .finish()
    }
}
