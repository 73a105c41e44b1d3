//! Fixture records and proptest strategies shared by unit tests.

use proptest::prelude::*;

use crate::schema::{Record, SchemaBuilder};

/// A flat record touching every source category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub age: i32,
    pub tags: Vec<String>,
    pub token: String,
    pub avatar: Vec<u8>,
    pub nickname: Option<String>,
}

impl Record for Signup {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("Name", r#"bind:"path,name=name" required:"true""#, |s| &s.name, |s| &mut s.name)
            .field(
                "Email",
                r#"bind:"form,name=email" validate:"required,pattern=#email""#,
                |s| &s.email,
                |s| &mut s.email,
            )
            .field(
                "Age",
                r#"bind:"query,name=age" default:"18" validate:"gte=0,lte=130""#,
                |s| &s.age,
                |s| &mut s.age,
            )
            .field(
                "Tags",
                r#"bind:"query,name=tags" validate:"max_len=5""#,
                |s| &s.tags,
                |s| &mut s.tags,
            )
            .field(
                "Token",
                r#"bind:"header,name=x-token" validate:"max_len=64""#,
                |s| &s.token,
                |s| &mut s.token,
            )
            .field(
                "Avatar",
                r#"bind:"file,name=avatar" validate:"max_len=1024""#,
                |s| &s.avatar,
                |s| &mut s.avatar,
            )
            .field("Nickname", r#"json:"nick" default:"anon""#, |s| &s.nickname, |s| &mut s.nickname);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub city: String,
    pub zip: String,
}

impl Record for Address {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("City", r#"validate:"required""#, |a| &a.city, |a| &mut a.city)
            .field("Zip", r#"default:"00000""#, |a| &a.zip, |a| &mut a.zip);
    }
}

/// A record nesting [`Address`] inline, boxed and optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub handle: String,
    pub home: Address,
    pub work: Option<Box<Address>>,
    pub billing: Option<Address>,
}

impl Record for Profile {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("Handle", r#"validate:"required""#, |p| &p.handle, |p| &mut p.handle)
            .embed("Home", "", |p| &p.home, |p| &mut p.home)
            .nested_boxed("Work", r#"json:"work""#, |p| &p.work, |p| &mut p.work)
            .nested("Billing", "", |p| &p.billing, |p| &mut p.billing);
    }
}

/// A self-referential record.
#[derive(Debug, Default)]
pub struct Node {
    pub value: i32,
    pub next: Option<Box<Node>>,
}

impl Record for Node {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("Value", r#"default:"1""#, |n| &n.value, |n| &mut n.value)
            .nested_boxed("Next", "", |n| &n.next, |n| &mut n.next);
    }
}

/// Printable ASCII without quotes or backslashes, up to `max_len` chars.
pub fn arb_plain_text(max_len: usize) -> impl Strategy<Value = String> {
    prop::string::string_regex(&format!("[a-zA-Z0-9 _.-]{{0,{}}}", max_len)).unwrap()
}

/// Text that is a valid `#email` address.
pub fn arb_email() -> impl Strategy<Value = String> {
    (
        prop::string::string_regex("[a-z0-9]{1,10}").unwrap(),
        prop::string::string_regex("[a-z]{1,10}").unwrap(),
        prop_oneof![Just("com"), Just("org"), Just("io")],
    )
        .prop_map(|(user, host, tld)| format!("{}@{}.{}", user, host, tld))
}

/// A [`Signup`] that passes every rule.
pub fn arb_valid_signup() -> impl Strategy<Value = Signup> {
    (
        prop::string::string_regex("[A-Za-z]{1,20}").unwrap(),
        arb_email(),
        0..=130_i32,
        prop::collection::vec(arb_plain_text(8), 0..=5),
        arb_plain_text(64),
        prop::collection::vec(any::<u8>(), 0..64),
    )
        .prop_map(|(name, email, age, tags, token, avatar)| Signup {
            name,
            email,
            age,
            tags,
            token,
            avatar,
            nickname: None,
        })
}
