//! Request binding demonstration.
//!
//! This example shows the full binding flow for a signup form:
//! 1. Describe the destination record and its tags
//! 2. Copy request parts into a `RequestAdapter`
//! 3. Bind: defaults, extraction, validation
//! 4. Report every violation at once
//!
//! Run with: `cargo run --example bind_request`

use bind_core::web::{Binder, RequestAdapter};
use bind_core::{Record, Schema, SchemaBuilder};

#[derive(Debug, Default)]
struct Address {
    city: String,
    zip: String,
}

impl Record for Address {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("City", r#"json:"city" validate:"max_len=40""#, |a| &a.city, |a| &mut a.city)
            .field(
                "Zip",
                r#"json:"zip" default:"00000" validate:"pattern=#digits,len=5""#,
                |a| &a.zip,
                |a| &mut a.zip,
            );
    }
}

#[derive(Debug, Default)]
struct SignupForm {
    team: String,
    email: String,
    age: u8,
    interests: Vec<String>,
    newsletter: bool,
    locale: Option<String>,
    address: Option<Box<Address>>,
}

impl Record for SignupForm {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("Team", r#"bind:"path,name=team" validate:"pattern=#alphanumeric""#, |s| &s.team, |s| &mut s.team)
            .field(
                "Email",
                r#"bind:"form,name=email" required:"true" validate:"pattern=#email""#,
                |s| &s.email,
                |s| &mut s.email,
            )
            .field(
                "Age",
                r#"bind:"form,name=age" default:"18" validate:"gte=13,lte=120""#,
                |s| &s.age,
                |s| &mut s.age,
            )
            .field(
                "Interests",
                r#"bind:"query,name=interest" validate:"max_len=3,non_blank""#,
                |s| &s.interests,
                |s| &mut s.interests,
            )
            .field(
                "Newsletter",
                r#"bind:"form,name=newsletter" default:"false""#,
                |s| &s.newsletter,
                |s| &mut s.newsletter,
            )
            .field(
                "Locale",
                r#"bind:"header,name=Accept-Language" validate:"in=en|de|fr""#,
                |s| &s.locale,
                |s| &mut s.locale,
            )
            .nested_boxed("Address", r#"json:"address""#, |s| &s.address, |s| &mut s.address);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== bind-core: Request Binding Demo ===\n");

    println!("Field table:");
    for field in Schema::<SignupForm>::build().descriptors() {
        println!(
            "  {:<11} {:<7} {:<16} required={}",
            field.declared_name(),
            field.source().to_string(),
            field.external_name(),
            field.is_required()
        );
    }
    println!();

    println!("Scenario 1: well-formed request");
    let mut req = RequestAdapter::new("req-demo-001".to_string());
    req.add_path_param("team".to_string(), "rustaceans".to_string());
    req.add_form_field("email".to_string(), "ada@example.com".to_string());
    req.add_form_field("newsletter".to_string(), "true".to_string());
    req.add_query_param("interest".to_string(), "parsers".to_string());
    req.add_query_param("interest".to_string(), "compilers".to_string());
    req.add_header("Accept-Language".to_string(), "en".to_string());
    run(&req);

    println!("Scenario 2: every kind of problem at once");
    let mut req = RequestAdapter::new("req-demo-002".to_string());
    req.add_path_param("team".to_string(), "rust aceans".to_string());
    req.add_form_field("age".to_string(), "twelve".to_string());
    req.add_query_param("interest".to_string(), " ".to_string());
    req.add_header("Accept-Language".to_string(), "es".to_string());
    run(&req);

    println!("=== Demo Complete ===");
}

fn run(req: &RequestAdapter) {
    let mut form = SignupForm::default();
    match Binder::default().bind(req, &mut form) {
        Ok(report) if report.is_valid() => {
            println!("  ✓ bound: {:?}\n", form);
        }
        Ok(report) => {
            println!("  ✗ {} violation(s):", report.len());
            for violation in &report {
                println!("    - {}", violation);
            }
            println!();
        }
        Err(err) => println!("  ✗ engine error: {}\n", err),
    }
}
