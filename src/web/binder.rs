//! In-process request binding.

use crate::config::EngineConfig;
use crate::defaults::DefaultInjector;
use crate::engine::RuleEngine;
use crate::error::{EngineError, Report};
use crate::logging::BindLog;
use crate::schema::{Record, Schema};
use crate::tags::Source;

use super::{BindSource, SourceValue};

/// Populates a record from a request and validates the result.
///
/// Binding runs three steps:
/// 1. every `default` tag is applied;
/// 2. for each source in [`Source::BIND_ORDER`], fields classified to that
///    source are set from the request when it has a value for them;
/// 3. every `validate` tag is evaluated.
///
/// Coercion failures in step 2 are reported as violations ("is invalid")
/// ahead of the rule violations of step 3. A field the request does not
/// mention keeps its default, and a missing required field is reported
/// by validation. Body-classified fields are never read from the source.
///
/// # Examples
///
/// ```
/// use bind_core::web::{Binder, RequestAdapter};
/// use bind_core::{Record, SchemaBuilder};
///
/// #[derive(Default)]
/// struct Search {
///     term: String,
///     page: u32,
/// }
///
/// impl Record for Search {
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema
///             .field("Term", r#"bind:"query,name=q" validate:"required""#, |s| &s.term, |s| &mut s.term)
///             .field("Page", r#"bind:"query,name=page" default:"1" validate:"gte=1""#, |s| &s.page, |s| &mut s.page);
///     }
/// }
///
/// let mut req = RequestAdapter::new("req-1".to_string());
/// req.add_query_param("q".to_string(), "rust".to_string());
///
/// let mut search = Search::default();
/// let report = Binder::default().bind(&req, &mut search).unwrap();
///
/// assert!(report.is_valid());
/// assert_eq!(search.term, "rust");
/// assert_eq!(search.page, 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Binder {
    config: EngineConfig,
}

impl Binder {
    /// Creates a binder with the given limits.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Binds `source` into `dest` and returns every violation found.
    ///
    /// `dest` is modified in place even when the report is not valid.
    ///
    /// # Errors
    ///
    /// Engine errors from default injection or validation abort binding.
    pub fn bind<S, R>(&self, source: &S, dest: &mut R) -> Result<Report, EngineError>
    where
        S: BindSource + ?Sized,
        R: Record,
    {
        let log = BindLog::new(source.request_id());

        DefaultInjector::new(self.config).apply(dest)?;

        let schema = Schema::<R>::build();
        let mut report = Report::new();
        let mut bound = 0_usize;

        for category in Source::BIND_ORDER {
            for field in schema.descriptors().filter(|d| d.source() == category) {
                let Some(value) = source.lookup(category, field.external_name()) else {
                    continue;
                };

                let outcome = match value {
                    SourceValue::Text(text) => field.set_from_text(dest, text),
                    SourceValue::Texts(texts) => field.set_from_texts(dest, &texts),
                    SourceValue::Bytes(bytes) => field.set_from_bytes(dest, bytes),
                };

                match outcome {
                    Ok(()) => {
                        bound += 1;
                        log.trace(format_args!(
                            "bound {} from {} `{}`",
                            field.declared_name(),
                            category,
                            field.external_name()
                        ));
                    }
                    Err(err) => {
                        log.debug(format_args!(
                            "{} from {} rejected: expected {}",
                            field.declared_name(),
                            category,
                            err.source.expected()
                        ));
                        report.push(err.into_violation());
                    }
                }
            }
        }

        let coercion_failures = report.len();
        report.extend(RuleEngine::new(self.config).validate_record(dest)?);

        if report.is_valid() {
            log.debug(format_args!("bound {} fields into {}", bound, schema.type_name()));
        } else {
            log.warn(format_args!(
                "bound {} fields into {}: {} coercion failures, {} violations",
                bound,
                schema.type_name(),
                coercion_failures,
                report.len() - coercion_failures
            ));
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineErrorKind;
    use crate::schema::SchemaBuilder;
    use crate::test_utils::Signup;
    use crate::web::RequestAdapter;

    fn request() -> RequestAdapter {
        let mut req = RequestAdapter::new("req-42".to_string());
        req.add_form_field("email".to_string(), "ada@example.com".to_string());
        req
    }

    #[test]
    fn binds_every_source_category() {
        let mut req = request();
        req.add_query_param("age".to_string(), "36".to_string());
        req.add_query_param("tags".to_string(), "a".to_string());
        req.add_query_param("tags".to_string(), "b".to_string());
        req.add_header("X-Token".to_string(), "secret".to_string());
        req.add_file("avatar".to_string(), vec![1, 2, 3]);
        req.add_path_param("name".to_string(), "Ada".to_string());

        let mut signup = Signup::default();
        let report = Binder::default().bind(&req, &mut signup).unwrap();

        assert!(report.is_valid(), "{}", report);
        assert_eq!(signup.name, "Ada");
        assert_eq!(signup.email, "ada@example.com");
        assert_eq!(signup.age, 36);
        assert_eq!(signup.tags, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(signup.token, "secret");
        assert_eq!(signup.avatar, vec![1, 2, 3]);
    }

    #[test]
    fn absent_values_keep_defaults() {
        let mut req = request();
        req.add_path_param("name".to_string(), "Ada".to_string());

        let mut signup = Signup::default();
        let report = Binder::default().bind(&req, &mut signup).unwrap();

        assert!(report.is_valid(), "{}", report);
        assert_eq!(signup.age, 18);
        assert_eq!(signup.nickname.as_deref(), Some("anon"));
    }

    #[test]
    fn missing_required_field_fails_validation() {
        let mut signup = Signup::default();
        let report = Binder::default().bind(&request(), &mut signup).unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report.violations()[0].field, "Name");
        assert_eq!(report.violations()[0].message, "is required");
    }

    #[test]
    fn coercion_failures_come_first() {
        let mut req = RequestAdapter::new("req-9".to_string());
        req.add_query_param("age".to_string(), "old".to_string());

        let mut signup = Signup::default();
        let report = Binder::default().bind(&req, &mut signup).unwrap();

        let fields: Vec<_> = report.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, ["Age", "Name", "Email", "Email"]);
        assert!(report.violations()[0].message.starts_with("is invalid"));
        assert_eq!(signup.age, 18);
    }

    #[test]
    fn body_fields_are_not_read_from_the_source() {
        struct Everything;

        impl BindSource for Everything {
            fn lookup(&self, _: Source, _: &str) -> Option<SourceValue<'_>> {
                Some(SourceValue::Text("from-source"))
            }
        }

        let mut signup = Signup::default();
        Binder::default().bind(&Everything, &mut signup).unwrap();
        assert_eq!(signup.nickname.as_deref(), Some("anon"));
        assert_eq!(signup.name, "from-source");
    }

    #[test]
    fn engine_errors_abort_binding() {
        #[derive(Default)]
        struct Broken {
            n: i32,
        }

        impl Record for Broken {
            fn describe(schema: &mut SchemaBuilder<Self>) {
                schema.field("N", r#"bind:"query,name=n" validate:"frobnicate""#, |b| &b.n, |b| &mut b.n);
            }
        }

        let mut req = RequestAdapter::new("req-0".to_string());
        req.add_query_param("n".to_string(), "3".to_string());

        let mut broken = Broken::default();
        let err = Binder::default().bind(&req, &mut broken).unwrap_err();
        assert_eq!(err.kind(), EngineErrorKind::Config);
        assert_eq!(broken.n, 3);
    }
}
