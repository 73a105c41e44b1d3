//! Tag-driven binding and validation for plain Rust records.
//!
//! This crate fills a destination record from request values and checks it
//! against declarative rules, driven by Go-style tag literals attached to
//! each field:
//! - **Classification**: each field's source (path, query, header, form,
//!   file, body) and external name come from its `bind`, `json` and
//!   `protobuf` tags
//! - **Defaults**: `default` tags seed the record before extraction and
//!   always overwrite
//! - **Validation**: `validate` tags are parsed once into a rule AST and
//!   every violation is reported, not just the first
//!
//! There is no reflection. A record lists its fields once in
//! [`Record::describe`], handing the engine typed accessors.
//!
//! # Core Types
//!
//! - [`Record`] / [`SchemaBuilder`]: field registration
//! - [`Schema`] / [`FieldDescriptor`]: classified fields with typed setters
//! - [`DefaultInjector`]: applies `default` tags
//! - [`RuleEngine`]: evaluates `validate` tags into a [`Report`]
//! - [`Registry`]: the same operations over `dyn Any`
//! - [`web::Binder`]: defaults, extraction and validation in one call
//!
//! # Errors
//!
//! Two error classes are kept apart. An [`EngineError`] is a programming or
//! schema mistake (unknown rule operator, non-record input, runaway
//! nesting) and aborts the call. A [`Violation`] is a data problem; all of
//! them are collected into a [`Report`].
//!
//! # Examples
//!
//! ```
//! use bind_core::{DefaultInjector, Record, RuleEngine, SchemaBuilder};
//!
//! #[derive(Default)]
//! struct User {
//!     name: String,
//!     age: i32,
//!     codes: Vec<i32>,
//! }
//!
//! impl Record for User {
//!     fn describe(schema: &mut SchemaBuilder<Self>) {
//!         schema
//!             .field("Name", r#"json:"name" validate:"required""#, |u| &u.name, |u| &mut u.name)
//!             .field("Age", r#"default:"18" validate:"gte=0,lte=130""#, |u| &u.age, |u| &mut u.age)
//!             .field("Codes", r#"validate:"gt=0""#, |u| &u.codes, |u| &mut u.codes);
//!     }
//! }
//!
//! let mut user = User { codes: vec![1, 2, -3], ..User::default() };
//! DefaultInjector::default().apply(&mut user).expect("defaults are well formed");
//! assert_eq!(user.age, 18);
//!
//! let report = RuleEngine::default().validate_record(&user).expect("rules are well formed");
//! assert_eq!(report.to_string(), "Name is required; Codes must be greater than 0");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod defaults;
mod engine;
mod error;
mod field;
mod logging;
mod patterns;
mod registry;
mod rules;
mod schema;
mod tags;
mod value;

pub mod web;

#[cfg(test)]
mod test_utils;

pub use config::EngineConfig;
pub use defaults::DefaultInjector;
pub use engine::RuleEngine;
pub use error::{CoercionError, EngineError, EngineErrorKind, Error, FieldError, Report, Violation};
pub use field::{FieldAccessor, FieldKind, Lens};
pub use logging::BindLog;
pub use patterns::{NamedPattern, PatternLibrary};
pub use registry::Registry;
pub use rules::{CmpOp, LenOp, Operand, PatternRule, Rule, RuleSet};
pub use schema::{AnyRecord, FieldDescriptor, Record, Schema, SchemaBuilder, Walk};
pub use tags::{Annotation, Source, TagClassifier, TagSet};
pub use value::{Elem, Kind, Value};
