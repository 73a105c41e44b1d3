//! The `validate` tag grammar.
//!
//! A `validate` tag is a comma-separated list of rules, each either a bare
//! operator (`required`, `non_blank`) or `operator=operand` (`gt=0`,
//! `pattern=#email`, `in=red|green`). Commas inside `()`, `[]` or `{}` and
//! escaped commas do not split, so regex quantifiers survive.
//!
//! Rules are parsed once into a [`RuleSet`] when a schema is built. Operands
//! are checked against the field's static kind at that point, so a typo
//! like `gt=ten` on a number surfaces as a config error.

use std::fmt;

use regex::Regex;

use crate::error::EngineError;
use crate::field::parse_bool;
use crate::patterns::{NamedPattern, PatternLibrary};
use crate::value::{Kind, Value};

/// Numeric comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `lt`
    Lt,
    /// `lte`
    Lte,
    /// `gt`
    Gt,
    /// `gte`
    Gte,
}

impl CmpOp {
    fn holds(self, value: f64, bound: f64) -> bool {
        match self {
            CmpOp::Lt => value < bound,
            CmpOp::Lte => value <= bound,
            CmpOp::Gt => value > bound,
            CmpOp::Gte => value >= bound,
        }
    }

    fn phrase(self) -> &'static str {
        match self {
            CmpOp::Lt => "less than",
            CmpOp::Lte => "less than or equal to",
            CmpOp::Gt => "greater than",
            CmpOp::Gte => "greater than or equal to",
        }
    }
}

/// Length constraint operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LenOp {
    /// `len`
    Exact,
    /// `min_len`
    Min,
    /// `max_len`
    Max,
}

impl LenOp {
    fn holds(self, len: usize, bound: usize) -> bool {
        match self {
            LenOp::Exact => len == bound,
            LenOp::Min => len >= bound,
            LenOp::Max => len <= bound,
        }
    }
}

/// A literal operand of `eq`, `ne`, `in` and `not_in`.
///
/// Integer operands stay integers so comparisons are exact across the
/// whole `i64`/`u64` range.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Compared against signed integers
    Int(i64),
    /// Compared against unsigned integers
    Uint(u64),
    /// Compared against floats
    Float(f64),
    /// Compared against booleans
    Bool(bool),
    /// Compared against text (and byte sequences)
    Text(String),
}

impl Operand {
    fn parse(field: &str, raw: &str, kind: Kind) -> Result<Self, EngineError> {
        let not_a = |what: &str| EngineError::config(field, format!("operand `{}` is not {}", raw, what));
        let trimmed = raw.trim();
        match kind.scalar() {
            Kind::Int => trimmed.parse::<i64>().map(Operand::Int).map_err(|_| not_a("an integer")),
            Kind::Uint => trimmed
                .parse::<u64>()
                .map(Operand::Uint)
                .map_err(|_| not_a("an unsigned integer")),
            Kind::Float => trimmed.parse::<f64>().map(Operand::Float).map_err(|_| not_a("a number")),
            Kind::Bool => parse_bool(trimmed).map(Operand::Bool).ok_or_else(|| not_a("a bool")),
            _ => Ok(Operand::Text(raw.to_string())),
        }
    }

    /// `None` when the value cannot be compared with this operand.
    fn equals(&self, value: &Value<'_>) -> Option<bool> {
        match (self, value) {
            (Operand::Int(n), Value::Int(x)) => Some(x == n),
            (Operand::Int(n), Value::Uint(x)) => Some(i128::from(*x) == i128::from(*n)),
            (Operand::Uint(n), Value::Uint(x)) => Some(x == n),
            (Operand::Uint(n), Value::Int(x)) => Some(i128::from(*x) == i128::from(*n)),
            (Operand::Float(n), v) => v.as_f64().map(|x| x == *n),
            (Operand::Bool(b), Value::Bool(x)) => Some(b == x),
            (Operand::Text(t), Value::Text(s)) => Some(t == s),
            (Operand::Text(t), Value::Bytes(b)) => Some(t.as_bytes() == *b),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int(n) => write!(f, "{}", n),
            Operand::Uint(n) => write!(f, "{}", n),
            Operand::Float(n) => write!(f, "{}", n),
            Operand::Bool(b) => write!(f, "{}", b),
            Operand::Text(t) => f.write_str(t),
        }
    }
}

/// Target of a `pattern=` rule.
#[derive(Debug, Clone)]
pub enum PatternRule {
    /// `pattern=#name`, resolved against [`PatternLibrary`]
    Named(&'static NamedPattern),
    /// `pattern=^...$`. `regex` is `None` when the expression is not
    /// anchored at both ends; such a rule never matches.
    Custom {
        /// Expression as written in the tag
        source: String,
        /// Compiled expression, present only when anchored
        regex: Option<Regex>,
    },
}

impl PatternRule {
    fn parse(field: &str, expr: &str) -> Result<Self, EngineError> {
        if expr.starts_with('#') {
            return PatternLibrary::lookup(expr)
                .map(PatternRule::Named)
                .ok_or_else(|| EngineError::config(field, format!("unknown pattern `{}`", expr)));
        }

        let anchored = expr.len() >= 2 && expr.starts_with('^') && expr.ends_with('$');
        let regex = if anchored {
            let compiled = Regex::new(expr).map_err(|e| {
                EngineError::config(field, format!("invalid pattern `{}`: {}", expr, e))
            })?;
            Some(compiled)
        } else {
            tracing::debug!(field, pattern = expr, "pattern is not anchored and will never match");
            None
        };

        Ok(PatternRule::Custom {
            source: expr.to_string(),
            regex,
        })
    }

    /// Returns `true` if the whole of `text` matches.
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            PatternRule::Named(p) => p.is_match(text),
            PatternRule::Custom { regex, .. } => regex.as_ref().map_or(false, |r| r.is_match(text)),
        }
    }
}

impl fmt::Display for PatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternRule::Named(p) => f.write_str(p.name()),
            PatternRule::Custom { source, .. } => f.write_str(source),
        }
    }
}

/// One parsed validation rule.
#[derive(Debug, Clone)]
pub enum Rule {
    /// `required`
    Required,
    /// `lt`, `lte`, `gt`, `gte`
    Compare {
        /// Operator
        op: CmpOp,
        /// Parsed bound
        bound: f64,
    },
    /// `len`, `min_len`, `max_len`
    Length {
        /// Operator
        op: LenOp,
        /// Length bound
        len: usize,
    },
    /// `non_blank`
    NonBlank,
    /// `pattern`
    Pattern(PatternRule),
    /// `eq` (`negate == false`) and `ne` (`negate == true`)
    Equal {
        /// `true` for `ne`
        negate: bool,
        /// Operand
        operand: Operand,
    },
    /// `in` (`negate == false`) and `not_in` (`negate == true`)
    OneOf {
        /// `true` for `not_in`
        negate: bool,
        /// Allowed (or forbidden) operands
        operands: Vec<Operand>,
    },
}

impl Rule {
    /// Parses one `operator[=operand]` token.
    pub fn parse(field: &str, token: &str, kind: Kind) -> Result<Self, EngineError> {
        let (op, arg) = match token.split_once('=') {
            Some((op, arg)) => (op.trim(), Some(arg)),
            None => (token.trim(), None),
        };

        let compare = |cmp: CmpOp| -> Result<Rule, EngineError> {
            let raw = operand(field, op, arg)?;
            let bound = raw.parse::<f64>().map_err(|_| {
                EngineError::config(field, format!("rule `{}` operand `{}` is not a number", op, raw))
            })?;
            Ok(Rule::Compare { op: cmp, bound })
        };

        let length = |len_op: LenOp| -> Result<Rule, EngineError> {
            let raw = operand(field, op, arg)?;
            let len = raw.parse::<usize>().map_err(|_| {
                EngineError::config(field, format!("rule `{}` operand `{}` is not a length", op, raw))
            })?;
            Ok(Rule::Length { op: len_op, len })
        };

        let one_of = |negate: bool| -> Result<Rule, EngineError> {
            let operands = operand(field, op, arg)?
                .split('|')
                .map(|raw| Operand::parse(field, raw.trim(), kind))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Rule::OneOf { negate, operands })
        };

        match op {
            "required" => Ok(Rule::Required),
            "lt" => compare(CmpOp::Lt),
            "lte" => compare(CmpOp::Lte),
            "gt" => compare(CmpOp::Gt),
            "gte" => compare(CmpOp::Gte),
            "len" => length(LenOp::Exact),
            "min_len" => length(LenOp::Min),
            "max_len" => length(LenOp::Max),
            "non_blank" => Ok(Rule::NonBlank),
            // Pattern operands are not trimmed: whitespace may be significant.
            "pattern" => match arg {
                Some(expr) if !expr.is_empty() => Ok(Rule::Pattern(PatternRule::parse(field, expr)?)),
                _ => Err(EngineError::config(field, "rule `pattern` requires an operand")),
            },
            "eq" => Ok(Rule::Equal {
                negate: false,
                operand: Operand::parse(field, operand(field, op, arg)?, kind)?,
            }),
            "ne" => Ok(Rule::Equal {
                negate: true,
                operand: Operand::parse(field, operand(field, op, arg)?, kind)?,
            }),
            "in" => one_of(false),
            "not_in" => one_of(true),
            other => Err(EngineError::config(
                field,
                format!("unknown rule operator `{}`", other),
            )),
        }
    }

    /// The operator name as written in tags.
    pub fn operator(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Compare { op, .. } => match op {
                CmpOp::Lt => "lt",
                CmpOp::Lte => "lte",
                CmpOp::Gt => "gt",
                CmpOp::Gte => "gte",
            },
            Rule::Length { op, .. } => match op {
                LenOp::Exact => "len",
                LenOp::Min => "min_len",
                LenOp::Max => "max_len",
            },
            Rule::NonBlank => "non_blank",
            Rule::Pattern(_) => "pattern",
            Rule::Equal { negate: false, .. } => "eq",
            Rule::Equal { negate: true, .. } => "ne",
            Rule::OneOf { negate: false, .. } => "in",
            Rule::OneOf { negate: true, .. } => "not_in",
        }
    }

    /// Returns `true` when `value` satisfies the rule.
    ///
    /// A null value is only checked by `required`. Collections are checked
    /// element by element (except by `required` and the length rules) and
    /// fail if any element fails.
    pub fn check(&self, value: &Value<'_>) -> bool {
        match self {
            Rule::Required => !value.is_empty(),
            _ if value.is_null() => true,
            Rule::Compare { op, bound } => {
                broadcast(value, |v| v.as_f64().map_or(false, |x| op.holds(x, *bound)))
            }
            Rule::Length { op, len } => match value {
                Value::Text(s) => op.holds(s.chars().count(), *len),
                Value::Bytes(b) => op.holds(b.len(), *len),
                Value::List(items) => op.holds(items.len(), *len),
                _ => false,
            },
            Rule::NonBlank => {
                broadcast(value, |v| v.as_text().map_or(false, |s| !s.trim().is_empty()))
            }
            Rule::Pattern(p) => broadcast(value, |v| v.as_text().map_or(false, |s| p.is_match(s))),
            Rule::Equal { negate, operand } => {
                broadcast(value, |v| operand.equals(v).map_or(false, |eq| eq != *negate))
            }
            Rule::OneOf { negate, operands } => broadcast(value, |v| {
                let outcomes: Vec<Option<bool>> = operands.iter().map(|o| o.equals(v)).collect();
                if outcomes.iter().all(Option::is_none) {
                    return false;
                }
                let found = outcomes.contains(&Some(true));
                found != *negate
            }),
        }
    }

    /// Message reported when the rule is violated.
    pub fn message(&self) -> String {
        match self {
            Rule::Required => "is required".to_string(),
            Rule::Compare { op, bound } => format!("must be {} {}", op.phrase(), bound),
            Rule::Length { op, len } => match op {
                LenOp::Exact => format!("must have length {}", len),
                LenOp::Min => format!("must have length at least {}", len),
                LenOp::Max => format!("must have length at most {}", len),
            },
            Rule::NonBlank => "must not be blank".to_string(),
            Rule::Pattern(p) => format!("must match pattern {}", p),
            Rule::Equal { negate, operand } => {
                if *negate {
                    format!("must not equal {}", operand)
                } else {
                    format!("must equal {}", operand)
                }
            }
            Rule::OneOf { negate, operands } => {
                let list = operands
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                if *negate {
                    format!("must not be one of [{}]", list)
                } else {
                    format!("must be one of [{}]", list)
                }
            }
        }
    }
}

fn broadcast(value: &Value<'_>, check: impl Fn(&Value<'_>) -> bool) -> bool {
    match value {
        Value::List(items) => items.iter().all(check),
        single => check(single),
    }
}

/// The parsed rules of one field, in tag order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Parses a whole `validate` tag value.
    ///
    /// # Errors
    ///
    /// Returns a config [`EngineError`] for an unknown operator or a bad
    /// operand. The first bad token aborts parsing.
    ///
    /// # Examples
    ///
    /// ```
    /// use bind_core::{Kind, RuleSet};
    ///
    /// let rules = RuleSet::parse("Code", "required,pattern=^[A-Z]{2,3}$", Kind::Text).unwrap();
    /// assert_eq!(rules.len(), 2);
    ///
    /// assert!(RuleSet::parse("Code", "frobnicate", Kind::Text).is_err());
    /// ```
    pub fn parse(field: &str, tag: &str, kind: Kind) -> Result<Self, EngineError> {
        let rules = split_rules(tag)
            .into_iter()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Rule::parse(field, token, kind))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Puts `required` first unless a `required` rule is already present.
    pub fn require(&mut self) {
        if !self.is_required() {
            self.rules.insert(0, Rule::Required);
        }
    }

    /// Returns `true` if the set contains `required`.
    pub fn is_required(&self) -> bool {
        self.rules.iter().any(|r| matches!(r, Rule::Required))
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates rules in tag order.
    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }
}

fn operand<'t>(field: &str, op: &str, arg: Option<&'t str>) -> Result<&'t str, EngineError> {
    match arg.map(str::trim) {
        Some(a) if !a.is_empty() => Ok(a),
        _ => Err(EngineError::config(
            field,
            format!("rule `{}` requires an operand", op),
        )),
    }
}

/// Splits on commas that are not nested in brackets or escaped.
fn split_rules(tag: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in tag.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&tag[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tag[start..]);
    parts
}
