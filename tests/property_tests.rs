//! Integration property tests for bind-core.
//!
//! These tests validate cross-module invariants using property-based
//! testing.

use bind_core::{
    DefaultInjector, PatternLibrary, Record, RuleEngine, RuleSet, SchemaBuilder, Source,
    TagClassifier, TagSet,
};
use proptest::prelude::*;

#[derive(Debug, Default, Clone)]
struct Order {
    quantity: i64,
    codes: Vec<i64>,
    note: String,
}

impl Record for Order {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field(
                "Quantity",
                r#"default:"1" validate:"required,gte=1,lte=100""#,
                |o| &o.quantity,
                |o| &mut o.quantity,
            )
            .field("Codes", r#"validate:"gt=0""#, |o| &o.codes, |o| &mut o.codes)
            .field("Note", r#"validate:"max_len=20""#, |o| &o.note, |o| &mut o.note);
    }
}

// Strategy: Generate arbitrary source tokens for bind tags
fn arb_bind_source() -> impl Strategy<Value = (&'static str, Source)> {
    prop_oneof![
        Just(("path", Source::Path)),
        Just(("uri", Source::Path)),
        Just(("query", Source::Query)),
        Just(("header", Source::Header)),
        Just(("form", Source::Form)),
        Just(("file", Source::File)),
    ]
}

// Strategy: Generate identifiers usable as tag values
fn arb_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,12}").unwrap()
}

proptest! {
    /// Property: a bind tag always wins over json and protobuf names
    #[test]
    fn proptest_bind_always_wins(
        (token, source) in arb_bind_source(),
        bind_name in arb_name(),
        json_name in arb_name(),
        proto_name in arb_name()
    ) {
        let literal = format!(
            r#"json:"{}" protobuf:"bytes,1,opt,name={}" bind:"{},name={}""#,
            json_name, proto_name, token, bind_name
        );
        let tags = TagSet::parse(&literal);
        let (name, resolved) = TagClassifier::resolve_external_name("Field", &tags);
        prop_assert_eq!(name, bind_name);
        prop_assert_eq!(resolved, source);
    }

    /// Property: without a bind tag the source is always Body
    #[test]
    fn proptest_fallback_names_are_body(json_name in arb_name(), proto_name in arb_name()) {
        let literal = format!(r#"json:"{},omitempty" protobuf:"varint,2,name={}""#, json_name, proto_name);
        let tags = TagSet::parse(&literal);
        let (name, source) = TagClassifier::resolve_external_name("Field", &tags);
        prop_assert_eq!(name, json_name);
        prop_assert_eq!(source, Source::Body);
    }

    /// Property: collections fail a rule once, however many elements fail
    #[test]
    fn proptest_broadcast_reports_once(
        good in prop::collection::vec(1..1000_i64, 0..10),
        bad in prop::collection::vec(-1000..=0_i64, 1..10)
    ) {
        let mut codes = good;
        codes.extend(bad);
        let order = Order { quantity: 5, codes, note: String::new() };

        let report = RuleEngine::default().validate_record(&order).unwrap();
        prop_assert_eq!(report.len(), 1);
        prop_assert_eq!(report.violations()[0].field.as_str(), "Codes");
    }

    /// Property: validating never changes the outcome of a second call
    #[test]
    fn proptest_validation_is_idempotent(
        quantity in any::<i64>(),
        codes in prop::collection::vec(any::<i64>(), 0..8),
        note in ".{0,40}"
    ) {
        let order = Order { quantity, codes, note };
        let engine = RuleEngine::default();
        let first = engine.validate_record(&order).unwrap();
        let second = engine.validate_record(&order).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: defaults overwrite whatever the field held
    #[test]
    fn proptest_defaults_overwrite(quantity in any::<i64>()) {
        let mut order = Order { quantity, ..Order::default() };
        DefaultInjector::default().apply(&mut order).unwrap();
        prop_assert_eq!(order.quantity, 1);
        prop_assert!(RuleEngine::default().validate_record(&order).unwrap().is_valid());
    }

    /// Property: #digits accepts exactly the non-empty ASCII digit strings
    #[test]
    fn proptest_digits_pattern(text in "[0-9a-z]{0,12}") {
        let digits = PatternLibrary::lookup("#digits").unwrap();
        let expected = !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit());
        prop_assert_eq!(digits.is_match(&text), expected);
    }

    /// Property: rule splitting never panics on arbitrary input
    #[test]
    fn proptest_rule_parsing_never_panics(rules in ".{0,60}") {
        let _ = RuleSet::parse("Field", &rules, bind_core::Kind::Text);
    }
}
