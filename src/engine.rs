//! Evaluation of `validate` tags.

use crate::config::EngineConfig;
use crate::error::{EngineError, Error, Report, Violation};
use crate::rules::RuleSet;
use crate::schema::{AnyRecord, Record, Schema, Walk};
use crate::value::Value;

/// Evaluates the rule grammar against a record and everything nested in it.
///
/// Every rule on every field is checked and every failure is reported.
/// Nested records that are present are validated before the fields of the
/// record holding them. Engine errors (a bad rule, excessive nesting) abort
/// the call and no partial report is returned.
///
/// # Examples
///
/// ```
/// use bind_core::{Record, RuleEngine, SchemaBuilder};
///
/// struct Order {
///     quantity: i64,
///     codes: Vec<i64>,
/// }
///
/// impl Record for Order {
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema
///             .field("Quantity", r#"validate:"required,gt=0""#, |o| &o.quantity, |o| &mut o.quantity)
///             .field("Codes", r#"validate:"gt=0""#, |o| &o.codes, |o| &mut o.codes);
///     }
/// }
///
/// let order = Order { quantity: 0, codes: vec![1, 2, -3] };
/// let report = RuleEngine::default().validate_record(&order).unwrap();
///
/// let fields: Vec<_> = report.iter().map(|v| v.field.as_str()).collect();
/// assert_eq!(fields, ["Quantity", "Codes"]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine {
    config: EngineConfig,
}

impl RuleEngine {
    /// Creates an engine with the given limits.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Validates `record` and all present nested records.
    ///
    /// # Errors
    ///
    /// A config [`EngineError`] for a malformed `validate` tag anywhere in
    /// the record graph, or a depth error if nesting exceeds
    /// [`EngineConfig::max_depth`].
    pub fn validate_record<R: Record>(&self, record: &R) -> Result<Report, EngineError> {
        let mut walk = Walk::new(self.config);
        let mut report = Report::new();
        record.collect_violations(&mut walk, &mut report)?;
        tracing::debug!(
            record = record.type_name(),
            violations = report.len(),
            "record validated"
        );
        Ok(report)
    }

    /// Validates one field's own rules, without descending into it.
    ///
    /// # Errors
    ///
    /// A type [`EngineError`] if `R` has no field named `declared`, or a
    /// config error if its `validate` tag is malformed.
    pub fn validate_field<R: Record>(&self, record: &R, declared: &str) -> Result<Report, EngineError> {
        let schema = Schema::<R>::build();
        let entry = schema.entry(declared).ok_or_else(|| {
            EngineError::type_error(
                schema.type_name(),
                format!("no field named `{}`", declared),
            )
        })?;

        let walk = Walk::new(self.config);
        let mut report = Report::new();
        check_field(&walk, entry.name(), entry.rules(), entry.value(record), &mut report)?;
        Ok(report)
    }

    /// Validates `record`, folding violations into [`Error::Invalid`].
    ///
    /// # Errors
    ///
    /// [`Error::Engine`] for engine errors, [`Error::Invalid`] if any rule
    /// was violated.
    pub fn validate<R: Record>(&self, record: &R) -> Result<(), Error> {
        self.validate_record(record)?.into_result()
    }
}

pub(crate) fn collect<R: Record>(record: &R, walk: &mut Walk, report: &mut Report) -> Result<(), EngineError> {
    let schema = Schema::<R>::build();

    for entry in schema.entries() {
        if let Some(nested) = entry.nested(record) {
            walk.descend(entry.name(), |w| nested.collect_violations(w, report))?;
        }
    }

    for entry in schema.entries() {
        check_field(walk, entry.name(), entry.rules(), entry.value(record), report)?;
    }

    Ok(())
}

fn check_field(
    walk: &Walk,
    name: &str,
    rules: Result<&RuleSet, &EngineError>,
    value: Value<'_>,
    report: &mut Report,
) -> Result<(), EngineError> {
    let rules = rules.map_err(|e| e.clone().nested_under(walk.path()))?;

    for rule in rules.iter() {
        if !rule.check(&value) {
            let field = walk.path_of(name);
            tracing::trace!(field = %field, rule = rule.operator(), "rule violated");
            report.push(Violation::new(field, rule.message()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::DefaultInjector;
    use crate::error::EngineErrorKind;
    use crate::schema::SchemaBuilder;
    use crate::test_utils::{Address, Node, Profile, Signup};

    struct Counter {
        count: i32,
    }

    impl Record for Counter {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema.field("Count", r#"validate:"required,gt=0""#, |c| &c.count, |c| &mut c.count);
        }
    }

    struct Codes {
        codes: Vec<i32>,
    }

    impl Record for Codes {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema.field("Codes", r#"validate:"gt=0""#, |c| &c.codes, |c| &mut c.codes);
        }
    }

    struct Broken {
        name: String,
        n: i32,
    }

    impl Record for Broken {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .field("Name", r#"validate:"required""#, |b| &b.name, |b| &mut b.name)
                .field("N", r#"validate:"frobnicate""#, |b| &b.n, |b| &mut b.n);
        }
    }

    fn valid_signup() -> Signup {
        Signup {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            age: 36,
            ..Signup::default()
        }
    }

    #[test]
    fn zero_is_present_for_required() {
        let report = RuleEngine::default()
            .validate_record(&Counter { count: 0 })
            .unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.violations()[0].message, "must be greater than 0");
    }

    #[test]
    fn empty_string_fails_required_once() {
        let mut signup = valid_signup();
        signup.name.clear();
        let report = RuleEngine::default().validate_record(&signup).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.violations()[0].field, "Name");
        assert_eq!(report.violations()[0].message, "is required");
    }

    #[test]
    fn broadcast_failure_reported_once() {
        let report = RuleEngine::default()
            .validate_record(&Codes { codes: vec![1, 2, -3] })
            .unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.violations()[0].field, "Codes");
    }

    #[test]
    fn every_violation_is_reported() {
        let signup = Signup {
            age: 200,
            email: "nope".to_string(),
            ..Signup::default()
        };
        let report = RuleEngine::default().validate_record(&signup).unwrap();
        let fields: Vec<_> = report.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, ["Name", "Email", "Age"]);
    }

    #[test]
    fn validation_is_idempotent() {
        let signup = Signup {
            age: -1,
            ..Signup::default()
        };
        let engine = RuleEngine::default();
        let first = engine.validate_record(&signup).unwrap();
        let second = engine.validate_record(&signup).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn default_age_passes_range() {
        let mut signup = valid_signup();
        signup.age = 0;
        DefaultInjector::default().apply(&mut signup).unwrap();
        assert_eq!(signup.age, 18);
        assert!(RuleEngine::default().validate_record(&signup).unwrap().is_valid());
    }

    #[test]
    fn unknown_operator_aborts_without_report() {
        let broken = Broken {
            name: String::new(),
            n: 1,
        };
        let err = RuleEngine::default().validate_record(&broken).unwrap_err();
        assert_eq!(err.kind(), EngineErrorKind::Config);
        assert_eq!(err.subject(), "N");
    }

    #[test]
    fn nested_records_are_validated_first() {
        let profile = Profile {
            handle: String::new(),
            work: Some(Box::new(Address::default())),
            ..Profile::default()
        };
        let report = RuleEngine::default().validate_record(&profile).unwrap();
        let fields: Vec<_> = report.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, ["Home.City", "Work.City", "Handle"]);
    }

    #[test]
    fn absent_nested_records_are_skipped() {
        let profile = Profile {
            handle: "ada".to_string(),
            home: Address {
                city: "Paris".to_string(),
                zip: String::new(),
            },
            ..Profile::default()
        };
        assert!(RuleEngine::default().validate_record(&profile).unwrap().is_valid());
    }

    #[test]
    fn nested_config_error_carries_path() {
        struct Outer {
            inner: Option<Box<Inner>>,
        }

        #[derive(Default)]
        struct Inner {
            n: i32,
        }

        impl Record for Outer {
            fn describe(schema: &mut SchemaBuilder<Self>) {
                schema.nested_boxed("Inner", "", |o| &o.inner, |o| &mut o.inner);
            }
        }

        impl Record for Inner {
            fn describe(schema: &mut SchemaBuilder<Self>) {
                schema.field("N", r#"validate:"gt=abc""#, |i| &i.n, |i| &mut i.n);
            }
        }

        let outer = Outer {
            inner: Some(Box::new(Inner::default())),
        };
        let err = RuleEngine::default().validate_record(&outer).unwrap_err();
        assert_eq!(err.kind(), EngineErrorKind::Config);
        assert_eq!(err.subject(), "Inner.N");
    }

    #[test]
    fn validate_field_checks_own_rules_only() {
        let signup = Signup::default();
        let engine = RuleEngine::default();

        let report = engine.validate_field(&signup, "Email").unwrap();
        let messages: Vec<_> = report.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(messages, ["is required", "must match pattern #email"]);

        assert!(engine.validate_field(&signup, "Tags").unwrap().is_valid());
    }

    #[test]
    fn validate_field_unknown_name_is_type_error() {
        let err = RuleEngine::default()
            .validate_field(&Signup::default(), "Missing")
            .unwrap_err();
        assert_eq!(err.kind(), EngineErrorKind::Type);
    }

    #[test]
    fn validate_folds_into_crate_error() {
        let engine = RuleEngine::default();
        assert!(engine.validate(&valid_signup()).is_ok());
        match engine.validate(&Signup::default()) {
            Err(Error::Invalid(report)) => assert!(!report.is_empty()),
            other => panic!("expected invalid, got {:?}", other),
        }
    }

    #[test]
    fn deep_chains_hit_depth_limit() {
        let mut node = Node::default();
        let mut cursor = &mut node;
        for _ in 0..4 {
            cursor = &mut **cursor.next.insert(Box::default());
        }
        let err = RuleEngine::new(EngineConfig::new(2))
            .validate_record(&node)
            .unwrap_err();
        assert_eq!(err.kind(), EngineErrorKind::DepthExceeded);
        assert_eq!(err.subject(), "Next.Next.Next");
    }

    mod proptests {
        use super::*;
        use crate::test_utils::arb_valid_signup;
        use proptest::prelude::*;

        proptest! {
            /// Property: a signup satisfying every rule yields an empty report
            #[test]
            fn proptest_valid_signup_has_no_violations(signup in arb_valid_signup()) {
                let report = RuleEngine::default().validate_record(&signup).unwrap();
                prop_assert!(report.is_valid(), "{}", report);
            }

            /// Property: one out-of-range field yields exactly one violation
            #[test]
            fn proptest_out_of_range_age_is_one_violation(
                signup in arb_valid_signup(),
                age in 131..i32::MAX
            ) {
                let signup = Signup { age, ..signup };
                let report = RuleEngine::default().validate_record(&signup).unwrap();
                prop_assert_eq!(report.len(), 1);
                prop_assert_eq!(report.violations()[0].field.as_str(), "Age");
                prop_assert_eq!(report.violations()[0].message.as_str(), "must be less than or equal to 130");
            }
        }
    }
}
