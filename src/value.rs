use async_graphql_value::ConstValue;
use chrono::{DateTime, Utc};

use crate::reflect::Shape;

/// Conversion into the dynamic value currency resolvers trade in.
pub trait ToConstValue {
    fn to_const_value(&self) -> ConstValue;
}

/// Conversion out of the dynamic value currency. Decodes are total over the
/// values the matching `ToConstValue` produces; anything else yields a
/// descriptive message.
pub trait FromConstValue: Sized {
    fn from_const_value(value: &ConstValue) -> Result<Self, String>;
}

/// Build-time shape description for a field type: what kind of graph type it
/// maps to, resolved against the registry at schema construction.
pub trait GraphValue {
    fn shape() -> Shape;
}

/// Opaque identifier scalar. Serializes as a string regardless of how the
/// identifier was produced, and decodes from either strings or numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Id(pub String);

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id(value)
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id(value.to_string())
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Id(value.to_string())
    }
}

impl ToConstValue for Id {
    fn to_const_value(&self) -> ConstValue {
        ConstValue::String(self.0.clone())
    }
}

impl FromConstValue for Id {
    fn from_const_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::String(s) => Ok(Id(s.clone())),
            ConstValue::Number(n) => Ok(Id(n.to_string())),
            _ => Err("expected string or number for Id".to_string()),
        }
    }
}

macro_rules! int_conversions {
    ($($ty:ty),*) => {
        $(
            impl ToConstValue for $ty {
                fn to_const_value(&self) -> ConstValue {
                    ConstValue::Number((*self as i64).into())
                }
            }

            impl FromConstValue for $ty {
                fn from_const_value(value: &ConstValue) -> Result<Self, String> {
                    match value {
                        ConstValue::Number(n) => n
                            .as_i64()
                            .and_then(|n| <$ty>::try_from(n).ok())
                            .ok_or_else(|| {
                                format!("number out of range for {}", stringify!($ty))
                            }),
                        _ => Err("expected number".to_string()),
                    }
                }
            }

            impl GraphValue for $ty {
                fn shape() -> Shape {
                    Shape::Atom {
                        name: stringify!($ty),
                    }
                }
            }
        )*
    };
}

int_conversions!(i8, i16, i32, i64, isize, u16, u32, usize);

impl ToConstValue for u64 {
    fn to_const_value(&self) -> ConstValue {
        ConstValue::Number((*self).into())
    }
}

impl FromConstValue for u64 {
    fn from_const_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::Number(n) => n.as_u64().ok_or_else(|| "number out of range for u64".to_string()),
            _ => Err("expected number".to_string()),
        }
    }
}

impl GraphValue for u64 {
    fn shape() -> Shape {
        Shape::Atom { name: "u64" }
    }
}

// Bytes carry a custom scalar that renders as a one-character string.
impl ToConstValue for u8 {
    fn to_const_value(&self) -> ConstValue {
        ConstValue::String((*self as char).to_string())
    }
}

impl FromConstValue for u8 {
    fn from_const_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if (c as u32) < 256 => Ok(c as u8),
                    _ => Err("expected a single-character string".to_string()),
                }
            }
            ConstValue::Number(n) => n
                .as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| "number out of range for u8".to_string()),
            _ => Err("expected string or number".to_string()),
        }
    }
}

impl GraphValue for u8 {
    fn shape() -> Shape {
        Shape::Atom { name: "u8" }
    }
}

impl ToConstValue for f64 {
    fn to_const_value(&self) -> ConstValue {
        ConstValue::Number(serde_json::Number::from_f64(*self).unwrap_or_else(|| 0.into()))
    }
}

impl FromConstValue for f64 {
    fn from_const_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::Number(n) => n.as_f64().ok_or_else(|| "expected f64".to_string()),
            _ => Err("expected number".to_string()),
        }
    }
}

impl GraphValue for f64 {
    fn shape() -> Shape {
        Shape::Atom { name: "f64" }
    }
}

impl ToConstValue for f32 {
    fn to_const_value(&self) -> ConstValue {
        (*self as f64).to_const_value()
    }
}

impl FromConstValue for f32 {
    fn from_const_value(value: &ConstValue) -> Result<Self, String> {
        f64::from_const_value(value).map(|f| f as f32)
    }
}

impl GraphValue for f32 {
    fn shape() -> Shape {
        Shape::Atom { name: "f32" }
    }
}

impl ToConstValue for bool {
    fn to_const_value(&self) -> ConstValue {
        ConstValue::Boolean(*self)
    }
}

impl FromConstValue for bool {
    fn from_const_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::Boolean(b) => Ok(*b),
            _ => Err("expected boolean".to_string()),
        }
    }
}

impl GraphValue for bool {
    fn shape() -> Shape {
        Shape::Atom { name: "bool" }
    }
}

impl ToConstValue for String {
    fn to_const_value(&self) -> ConstValue {
        ConstValue::String(self.clone())
    }
}

impl FromConstValue for String {
    fn from_const_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::String(s) => Ok(s.clone()),
            _ => Err("expected string".to_string()),
        }
    }
}

impl GraphValue for String {
    fn shape() -> Shape {
        Shape::Atom { name: "String" }
    }
}

impl GraphValue for Id {
    fn shape() -> Shape {
        Shape::Atom { name: "Id" }
    }
}

impl ToConstValue for DateTime<Utc> {
    fn to_const_value(&self) -> ConstValue {
        ConstValue::String(self.to_rfc3339())
    }
}

impl FromConstValue for DateTime<Utc> {
    fn from_const_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| format!("invalid RFC 3339 datetime: {e}")),
            _ => Err("expected RFC 3339 string".to_string()),
        }
    }
}

impl GraphValue for DateTime<Utc> {
    fn shape() -> Shape {
        Shape::Atom { name: "DateTime" }
    }
}

impl<T: ToConstValue> ToConstValue for Option<T> {
    fn to_const_value(&self) -> ConstValue {
        match self {
            Some(v) => v.to_const_value(),
            None => ConstValue::Null,
        }
    }
}

impl<T: FromConstValue> FromConstValue for Option<T> {
    fn from_const_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::Null => Ok(None),
            v => T::from_const_value(v).map(Some),
        }
    }
}

impl<T: GraphValue> GraphValue for Option<T> {
    fn shape() -> Shape {
        Shape::Optional { inner: T::shape }
    }
}

impl<T: ToConstValue> ToConstValue for Vec<T> {
    fn to_const_value(&self) -> ConstValue {
        ConstValue::List(self.iter().map(|v| v.to_const_value()).collect())
    }
}

impl<T: FromConstValue> FromConstValue for Vec<T> {
    fn from_const_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::List(items) => items.iter().map(T::from_const_value).collect(),
            _ => Err("expected list".to_string()),
        }
    }
}

impl<T: GraphValue> GraphValue for Vec<T> {
    fn shape() -> Shape {
        Shape::List { element: T::shape }
    }
}

impl<T: ToConstValue + ?Sized> ToConstValue for &T {
    fn to_const_value(&self) -> ConstValue {
        (**self).to_const_value()
    }
}

impl ToConstValue for str {
    fn to_const_value(&self) -> ConstValue {
        ConstValue::String(self.to_string())
    }
}
