//! Uniform get/set access over heterogeneous field kinds.
//!
//! [`FieldKind`] is implemented for the kinds the engine understands:
//! signed and unsigned integers, floats, `bool`, `String`, `Vec<u8>` (a raw
//! byte sequence), `Option<T>` (an optional value that is allocated on first
//! write) and collections (`Vec<T>`, `[T; N]`) of scalars. Any other type can
//! opt in with an empty `impl FieldKind for MyType {}`; the engine then
//! treats it as opaque and skips it when writing.

use crate::error::CoercionError;
use crate::value::{Elem, Kind, Value};

/// Read/write access to one field value.
///
/// Every method has a default that treats the implementing type as opaque:
/// it is never empty, never written and never inspected by value rules.
pub trait FieldKind: 'static {
    /// The kind of this type, used when rules are parsed.
    fn static_kind() -> Kind
    where
        Self: Sized,
    {
        Kind::Opaque
    }

    /// Borrowed view of the current value.
    fn value(&self) -> Value<'_> {
        Value::Opaque
    }

    /// Replaces the value with one parsed from `text`.
    ///
    /// Byte sequences receive the raw text bytes. On failure the field is
    /// left unchanged.
    fn set_from_text(&mut self, _text: &str) -> Result<(), CoercionError> {
        Ok(())
    }

    /// Replaces the value from a multi-valued source.
    ///
    /// Collections parse every entry; scalars use the first one.
    fn set_from_texts(&mut self, texts: &[&str]) -> Result<(), CoercionError> {
        match texts.first() {
            Some(text) => self.set_from_text(text),
            None => Ok(()),
        }
    }

    /// Replaces the value from raw bytes (uploaded files).
    ///
    /// Byte sequences copy the bytes; everything else requires UTF-8 text.
    fn set_from_bytes(&mut self, bytes: &[u8]) -> Result<(), CoercionError> {
        match std::str::from_utf8(bytes) {
            Ok(text) => self.set_from_text(text),
            Err(_) => Err(CoercionError::new(
                "utf-8 text",
                String::from_utf8_lossy(bytes).into_owned(),
            )),
        }
    }
}

/// Scalars that can appear on their own or as collection elements.
trait Scalar: Sized {
    const ELEM: Elem;

    fn parse_text(text: &str) -> Result<Self, CoercionError>;

    fn view(&self) -> Value<'_>;
}

macro_rules! int_scalar {
    ($elem:ident, $name:literal, $variant:ident as $wide:ty: $($t:ty),*) => {
        $(
            impl Scalar for $t {
                const ELEM: Elem = Elem::$elem;

                fn parse_text(text: &str) -> Result<Self, CoercionError> {
                    text.parse::<$t>().map_err(|_| CoercionError::new($name, text))
                }

                fn view(&self) -> Value<'_> {
                    Value::$variant(*self as $wide)
                }
            }
        )*
    };
}

int_scalar!(Int, "integer", Int as i64: i8, i16, i32, i64, isize);
int_scalar!(Uint, "unsigned integer", Uint as u64: u8, u16, u32, u64, usize);
int_scalar!(Float, "float", Float as f64: f32, f64);

impl Scalar for bool {
    const ELEM: Elem = Elem::Bool;

    fn parse_text(text: &str) -> Result<Self, CoercionError> {
        parse_bool(text).ok_or_else(|| CoercionError::new("bool", text))
    }

    fn view(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

impl Scalar for String {
    const ELEM: Elem = Elem::Text;

    fn parse_text(text: &str) -> Result<Self, CoercionError> {
        Ok(text.to_string())
    }

    fn view(&self) -> Value<'_> {
        Value::Text(self.as_str())
    }
}

/// Accepts the usual spellings: `1 t T TRUE true True` and their negatives.
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

macro_rules! scalar_field {
    ($($t:ty),*) => {
        $(
            impl FieldKind for $t {
                fn static_kind() -> Kind {
                    <$t as Scalar>::ELEM.kind()
                }

                fn value(&self) -> Value<'_> {
                    <$t as Scalar>::view(self)
                }

                fn set_from_text(&mut self, text: &str) -> Result<(), CoercionError> {
                    *self = <$t as Scalar>::parse_text(text)?;
                    Ok(())
                }
            }
        )*
    };
}

macro_rules! list_field {
    ($($t:ty),*) => {
        $(
            impl FieldKind for Vec<$t> {
                fn static_kind() -> Kind {
                    Kind::List(<$t as Scalar>::ELEM)
                }

                fn value(&self) -> Value<'_> {
                    Value::List(self.iter().map(<$t as Scalar>::view).collect())
                }

                fn set_from_text(&mut self, text: &str) -> Result<(), CoercionError> {
                    *self = vec![<$t as Scalar>::parse_text(text)?];
                    Ok(())
                }

                fn set_from_texts(&mut self, texts: &[&str]) -> Result<(), CoercionError> {
                    *self = texts
                        .iter()
                        .map(|t| <$t as Scalar>::parse_text(t))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(())
                }
            }
        )*
    };
}

macro_rules! array_field {
    ($($t:ty),*) => {
        $(
            impl<const N: usize> FieldKind for [$t; N] {
                fn static_kind() -> Kind {
                    Kind::List(<$t as Scalar>::ELEM)
                }

                fn value(&self) -> Value<'_> {
                    Value::List(self.iter().map(<$t as Scalar>::view).collect())
                }
            }
        )*
    };
}

scalar_field!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, String);
// Vec<u8> is a byte sequence, not a list of numbers.
list_field!(i8, i16, i32, i64, isize, u16, u32, u64, usize, f32, f64, bool, String);
array_field!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, String);

impl FieldKind for Vec<u8> {
    fn static_kind() -> Kind {
        Kind::Bytes
    }

    fn value(&self) -> Value<'_> {
        Value::Bytes(self.as_slice())
    }

    fn set_from_text(&mut self, text: &str) -> Result<(), CoercionError> {
        *self = text.as_bytes().to_vec();
        Ok(())
    }

    fn set_from_bytes(&mut self, bytes: &[u8]) -> Result<(), CoercionError> {
        *self = bytes.to_vec();
        Ok(())
    }
}

impl<T: FieldKind + Default> FieldKind for Option<T> {
    fn static_kind() -> Kind {
        T::static_kind()
    }

    fn value(&self) -> Value<'_> {
        match self {
            Some(inner) => inner.value(),
            None => Value::Null,
        }
    }

    fn set_from_text(&mut self, text: &str) -> Result<(), CoercionError> {
        fill_option(self, |v| v.set_from_text(text))
    }

    fn set_from_texts(&mut self, texts: &[&str]) -> Result<(), CoercionError> {
        fill_option(self, |v| v.set_from_texts(texts))
    }

    fn set_from_bytes(&mut self, bytes: &[u8]) -> Result<(), CoercionError> {
        fill_option(self, |v| v.set_from_bytes(bytes))
    }
}

/// Allocates the target, writes it, and stores it only on success.
/// Opaque targets are never allocated.
fn fill_option<T: FieldKind + Default>(
    slot: &mut Option<T>,
    write: impl FnOnce(&mut T) -> Result<(), CoercionError>,
) -> Result<(), CoercionError> {
    if T::static_kind() == Kind::Opaque {
        return Ok(());
    }
    let mut target = T::default();
    write(&mut target)?;
    *slot = Some(target);
    Ok(())
}

/// Typed accessor pair for one field of a record.
///
/// Lenses are built from plain functions, usually non-capturing closures:
///
/// ```
/// use bind_core::Lens;
///
/// struct User { age: Option<u32> }
///
/// let age = Lens::new(|u: &User| &u.age, |u: &mut User| &mut u.age);
/// let mut user = User { age: None };
///
/// // Both `T` and `Option<T>` are accepted for an `Option<T>` field.
/// age.set(&mut user, 30_u32);
/// assert_eq!(user.age, Some(30));
/// age.set(&mut user, None::<u32>);
/// assert_eq!(user.age, None);
/// ```
pub struct Lens<R, T> {
    get: fn(&R) -> &T,
    get_mut: fn(&mut R) -> &mut T,
}

impl<R, T> Lens<R, T> {
    /// Creates a lens from a getter and a mutable getter.
    pub fn new(get: fn(&R) -> &T, get_mut: fn(&mut R) -> &mut T) -> Self {
        Self { get, get_mut }
    }

    /// Borrows the field.
    pub fn get<'a>(&self, record: &'a R) -> &'a T {
        (self.get)(record)
    }

    /// Mutably borrows the field.
    pub fn get_mut<'a>(&self, record: &'a mut R) -> &'a mut T {
        (self.get_mut)(record)
    }

    /// Stores `value`, converting it into the field's type first.
    pub fn set<V: Into<T>>(&self, record: &mut R, value: V) {
        FieldAccessor::set(self.get_mut(record), value);
    }
}

impl<R, T> Clone for Lens<R, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, T> Copy for Lens<R, T> {}

/// Type-erased lens used by schemas.
pub(crate) trait ValueSlot<R> {
    fn kind(&self) -> Kind;

    fn get<'a>(&self, record: &'a R) -> &'a dyn FieldKind;

    fn get_mut<'a>(&self, record: &'a mut R) -> &'a mut dyn FieldKind;
}

impl<R, T: FieldKind> ValueSlot<R> for Lens<R, T> {
    fn kind(&self) -> Kind {
        T::static_kind()
    }

    fn get<'a>(&self, record: &'a R) -> &'a dyn FieldKind {
        (self.get)(record)
    }

    fn get_mut<'a>(&self, record: &'a mut R) -> &'a mut dyn FieldKind {
        (self.get_mut)(record)
    }
}

/// Free-standing setters over individual fields.
pub struct FieldAccessor;

impl FieldAccessor {
    /// Parses `text` into the field's kind and stores it.
    ///
    /// Optional fields are allocated, byte sequences receive the raw text
    /// bytes, opaque kinds are left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use bind_core::FieldAccessor;
    ///
    /// let mut port: Option<u16> = None;
    /// FieldAccessor::set_from_text(&mut port, "8080").unwrap();
    /// assert_eq!(port, Some(8080));
    ///
    /// let mut retries = 0_i32;
    /// assert!(FieldAccessor::set_from_text(&mut retries, "many").is_err());
    /// assert_eq!(retries, 0);
    /// ```
    pub fn set_from_text(field: &mut dyn FieldKind, text: &str) -> Result<(), CoercionError> {
        field.set_from_text(text)
    }

    /// Stores a typed value. For `Option<T>` fields both `T` and
    /// `Option<T>` are accepted.
    pub fn set<T, V: Into<T>>(field: &mut T, value: V) {
        *field = value.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_parse_and_report_kind() {
        let mut v = 0_i32;
        v.set_from_text("-42").unwrap();
        assert_eq!(v, -42);
        assert_eq!(v.value(), Value::Int(-42));
        assert_eq!(i32::static_kind(), Kind::Int);

        let mut u = 0_u8;
        u.set_from_text("255").unwrap();
        assert_eq!(u.value(), Value::Uint(255));
        assert_eq!(u8::static_kind(), Kind::Uint);
    }

    #[test]
    fn integer_overflow_is_an_error() {
        let mut u = 7_u8;
        let err = u.set_from_text("256").unwrap_err();
        assert_eq!(err.expected(), "unsigned integer");
        assert_eq!(err.input(), "256");
        assert_eq!(u, 7);
    }

    #[test]
    fn floats_parse() {
        let mut f = 0.0_f64;
        f.set_from_text("2.5").unwrap();
        assert_eq!(f.value(), Value::Float(2.5));
        assert!(f.set_from_text("two").is_err());
    }

    #[test]
    fn bools_accept_common_spellings() {
        let mut b = false;
        for text in ["1", "t", "T", "TRUE", "true", "True"] {
            b.set_from_text(text).unwrap();
            assert!(b, "{}", text);
        }
        for text in ["0", "f", "F", "FALSE", "false", "False"] {
            b.set_from_text(text).unwrap();
            assert!(!b, "{}", text);
        }
        assert!(b.set_from_text("yes").is_err());
    }

    #[test]
    fn strings_take_text_verbatim() {
        let mut s = String::from("old");
        s.set_from_text("  new  ").unwrap();
        assert_eq!(s, "  new  ");
    }

    #[test]
    fn bytes_receive_raw_text() {
        let mut b: Vec<u8> = Vec::new();
        b.set_from_text("aGk=").unwrap();
        assert_eq!(b, b"aGk=".to_vec());
        assert_eq!(Vec::<u8>::static_kind(), Kind::Bytes);

        b.set_from_bytes(&[0xff, 0x00]).unwrap();
        assert_eq!(b, vec![0xff, 0x00]);
    }

    #[test]
    fn option_allocates_on_write() {
        let mut v: Option<i64> = None;
        assert_eq!(v.value(), Value::Null);
        v.set_from_text("9").unwrap();
        assert_eq!(v, Some(9));
        assert_eq!(Option::<i64>::static_kind(), Kind::Int);
    }

    #[test]
    fn option_stays_none_on_parse_failure() {
        let mut v: Option<i64> = None;
        assert!(v.set_from_text("nine").is_err());
        assert_eq!(v, None);
    }

    #[test]
    fn lists_parse_every_value() {
        let mut v: Vec<i32> = vec![1];
        v.set_from_texts(&["3", "4"]).unwrap();
        assert_eq!(v, vec![3, 4]);

        v.set_from_text("5").unwrap();
        assert_eq!(v, vec![5]);

        assert!(v.set_from_texts(&["6", "x"]).is_err());
        assert_eq!(v, vec![5]);
        assert_eq!(Vec::<i32>::static_kind(), Kind::List(Elem::Int));
    }

    #[test]
    fn scalars_use_first_of_many() {
        let mut v = 0_u32;
        v.set_from_texts(&["1", "2"]).unwrap();
        assert_eq!(v, 1);
        v.set_from_texts(&[]).unwrap();
        assert_eq!(v, 1);
    }

    #[test]
    fn arrays_are_read_only_lists() {
        let mut a = [1_u8, 2, 3];
        assert_eq!(
            a.value(),
            Value::List(vec![Value::Uint(1), Value::Uint(2), Value::Uint(3)])
        );
        a.set_from_text("9").unwrap();
        assert_eq!(a, [1, 2, 3]);
    }

    #[test]
    fn non_utf8_bytes_fail_for_text_fields() {
        let mut s = String::new();
        assert!(s.set_from_bytes(&[0xff]).is_err());
        s.set_from_bytes(b"ok").unwrap();
        assert_eq!(s, "ok");
    }

    #[derive(Debug, Default, PartialEq)]
    struct Money(i64);

    impl FieldKind for Money {}

    #[test]
    fn opaque_kinds_are_skipped() {
        let mut m = Money(5);
        m.set_from_text("100").unwrap();
        assert_eq!(m, Money(5));
        assert_eq!(m.value(), Value::Opaque);
        assert_eq!(Money::static_kind(), Kind::Opaque);

        let mut opt: Option<Money> = None;
        opt.set_from_text("100").unwrap();
        assert_eq!(opt, None);
    }

    #[test]
    fn lens_set_accepts_value_or_option() {
        struct Rec {
            n: Option<u8>,
            s: String,
        }

        let n = Lens::new(|r: &Rec| &r.n, |r: &mut Rec| &mut r.n);
        let s = Lens::new(|r: &Rec| &r.s, |r: &mut Rec| &mut r.s);
        let mut rec = Rec {
            n: None,
            s: String::new(),
        };

        n.set(&mut rec, 3_u8);
        assert_eq!(rec.n, Some(3));
        n.set(&mut rec, Some(4_u8));
        assert_eq!(*n.get(&rec), Some(4));

        s.set(&mut rec, "hello");
        assert_eq!(rec.s, "hello");
    }

    #[test]
    fn field_accessor_set_from_text_through_dyn() {
        let mut name = String::new();
        FieldAccessor::set_from_text(&mut name, "alice").unwrap();
        assert_eq!(name, "alice");
    }
}
