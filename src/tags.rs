//! Tag annotations and field classification.
//!
//! Fields are annotated with a struct-tag literal in the familiar
//! `key:"value" key2:"value2"` form. [`TagSet`] holds the parsed pairs,
//! [`TagClassifier`] answers which annotations are present and where the
//! field's value comes from.

use std::collections::BTreeSet;
use std::fmt;

/// The fixed tag vocabulary understood by the engine.
///
/// Variants are declared in lexicographic order of their tag keys so the
/// derived `Ord` sorts annotations the same way their keys sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Annotation {
    /// `bind:"<source>[,name=<ext>]"`
    Bind,
    /// `default:"<literal>"`
    Default,
    /// `file:"..."`
    File,
    /// `form:"..."`
    Form,
    /// `header:"..."`
    Header,
    /// `json:"<name>[,opts]"`
    Json,
    /// `path:"..."`
    Path,
    /// `protobuf:"...,name=<name>,..."`
    Protobuf,
    /// `query:"..."`
    Query,
    /// `required:"..."`
    Required,
    /// `validate:"<rule>[,<rule>...]"`
    Validate,
}

impl Annotation {
    /// Every annotation, in lexicographic key order.
    pub const ALL: [Annotation; 11] = [
        Annotation::Bind,
        Annotation::Default,
        Annotation::File,
        Annotation::Form,
        Annotation::Header,
        Annotation::Json,
        Annotation::Path,
        Annotation::Protobuf,
        Annotation::Query,
        Annotation::Required,
        Annotation::Validate,
    ];

    /// The tag key for this annotation.
    pub fn key(self) -> &'static str {
        match self {
            Annotation::Bind => "bind",
            Annotation::Default => "default",
            Annotation::File => "file",
            Annotation::Form => "form",
            Annotation::Header => "header",
            Annotation::Json => "json",
            Annotation::Path => "path",
            Annotation::Protobuf => "protobuf",
            Annotation::Query => "query",
            Annotation::Required => "required",
            Annotation::Validate => "validate",
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Where a field's value originates during request binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    /// Router path segment
    Path,
    /// URL query parameter
    Query,
    /// Request header
    Header,
    /// Form field (multipart or url-encoded)
    Form,
    /// Uploaded file
    File,
    /// Request body, or no explicit source
    Body,
}

impl Source {
    /// Explicit sources in the order the binder visits them.
    pub const BIND_ORDER: [Source; 5] = [
        Source::Path,
        Source::Query,
        Source::Header,
        Source::File,
        Source::Form,
    ];

    /// Parses the source token of a `bind` tag. `uri` is accepted for `path`.
    pub fn from_bind_token(token: &str) -> Option<Source> {
        match token {
            "path" | "uri" => Some(Source::Path),
            "query" => Some(Source::Query),
            "header" => Some(Source::Header),
            "form" => Some(Source::Form),
            "file" => Some(Source::File),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Source::Path => "path",
            Source::Query => "query",
            Source::Header => "header",
            Source::Form => "form",
            Source::File => "file",
            Source::Body => "body",
        };
        f.write_str(s)
    }
}

/// Parsed `key:"value"` pairs of one field, in declaration order.
///
/// Parsing is lenient: it stops at the first malformed pair and keeps what
/// it has read so far.
///
/// # Examples
///
/// ```
/// use bind_core::TagSet;
///
/// let tags = TagSet::parse(r#"bind:"query,name=q" json:"j" validate:"required""#);
/// assert_eq!(tags.get("bind"), Some("query,name=q"));
/// assert_eq!(tags.get("json"), Some("j"));
/// assert_eq!(tags.get("default"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    pairs: Vec<(String, String)>,
}

impl TagSet {
    /// Parses a struct-tag literal.
    pub fn parse(literal: &str) -> Self {
        let mut pairs = Vec::new();
        let mut rest = literal;

        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }

            let Some(colon) = rest.find(':') else { break };
            let key = &rest[..colon];
            if key.is_empty() || key.contains(|c: char| c.is_whitespace() || c == '"') {
                break;
            }

            let after = &rest[colon + 1..];
            let Some(body) = after.strip_prefix('"') else { break };
            let Some((value, consumed)) = read_quoted(body) else { break };

            pairs.push((key.to_string(), value));
            rest = &body[consumed..];
        }

        Self { pairs }
    }

    /// Value of the first pair with `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if `key` is present (even with an empty value).
    pub fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Iterates all pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Reads a quoted value up to the closing quote. Returns the unescaped value
/// and the number of bytes consumed including the closing quote.
fn read_quoted(body: &str) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((value, i + 1)),
            '\\' => {
                let (_, escaped) = chars.next()?;
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    '"' => value.push('"'),
                    '\\' => value.push('\\'),
                    other => {
                        // Unknown escapes are kept verbatim so regex escapes survive.
                        value.push('\\');
                        value.push(other);
                    }
                }
            }
            _ => value.push(c),
        }
    }

    None
}

/// Resolves annotations, external names and source categories.
pub struct TagClassifier;

impl TagClassifier {
    /// Annotations present on the field, sorted lexicographically by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bind_core::{Annotation, TagClassifier, TagSet};
    ///
    /// let tags = TagSet::parse(r#"validate:"gt=0" json:"age" default:"18" x-custom:"1""#);
    /// let found: Vec<_> = TagClassifier::classify(&tags).into_iter().collect();
    /// assert_eq!(found, vec![Annotation::Default, Annotation::Json, Annotation::Validate]);
    /// ```
    pub fn classify(tags: &TagSet) -> BTreeSet<Annotation> {
        Annotation::ALL
            .iter()
            .copied()
            .filter(|a| tags.has(a.key()))
            .collect()
    }

    /// Resolves the external name and source category of a field.
    ///
    /// Precedence: a `bind` tag, then the first segment of `json`, then the
    /// `name=` component of `protobuf`, then the declared name. Only `bind`
    /// yields a source other than [`Source::Body`]. A `bind` tag without
    /// `name=` keeps its source and takes the name from the fallback chain.
    pub fn resolve_external_name(declared: &str, tags: &TagSet) -> (String, Source) {
        let bound = tags.get(Annotation::Bind.key()).and_then(parse_bind);

        if let Some((source, Some(name))) = bound {
            return (name.to_string(), source);
        }

        let name = json_name(tags)
            .or_else(|| protobuf_name(tags))
            .unwrap_or(declared)
            .to_string();

        match bound {
            Some((source, _)) => (name, source),
            None => (name, Source::Body),
        }
    }
}

fn parse_bind(value: &str) -> Option<(Source, Option<&str>)> {
    let mut parts = value.split(',').map(str::trim);
    let source = Source::from_bind_token(parts.next()?)?;
    let name = parts
        .find_map(|p| p.strip_prefix("name="))
        .filter(|n| !n.is_empty());
    Some((source, name))
}

fn json_name(tags: &TagSet) -> Option<&str> {
    let first = tags.get(Annotation::Json.key())?.split(',').next()?.trim();
    if first.is_empty() || first == "-" {
        None
    } else {
        Some(first)
    }
}

fn protobuf_name(tags: &TagSet) -> Option<&str> {
    tags.get(Annotation::Protobuf.key())?
        .split(',')
        .find_map(|p| p.trim().strip_prefix("name="))
        .filter(|n| !n.is_empty())
}
