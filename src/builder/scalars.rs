use async_graphql::dynamic;
use async_graphql_value::ConstValue;

use super::registry::{CursorCodec, ScalarEntry};

/// Immutable default scalar table a fresh registry is seeded from. Keys are
/// runtime type names; values carry the graph-side name plus a definition
/// when the scalar is not one of the executor's built-ins.
pub(crate) fn defaults() -> Vec<(&'static str, ScalarEntry)> {
    let mut table = Vec::new();
    table.push(("bool", ScalarEntry::builtin("Boolean")));
    for name in [
        "i8", "i16", "i32", "i64", "isize", "u16", "u32", "u64", "usize",
    ] {
        table.push((name, ScalarEntry::builtin("Int")));
    }
    table.push(("f32", ScalarEntry::builtin("Float")));
    table.push(("f64", ScalarEntry::builtin("Float")));
    table.push(("String", ScalarEntry::builtin("String")));
    table.push(("Id", ScalarEntry::builtin("ID")));
    table.push((
        "u8",
        ScalarEntry::custom(
            "Byte",
            dynamic::Scalar::new("Byte").description("A byte, rendered as a one-character string"),
        ),
    ));
    table.push((
        "DateTime",
        ScalarEntry::custom(
            "DateTime",
            dynamic::Scalar::new("DateTime").description("An RFC 3339 datetime string"),
        ),
    ));
    table
}

/// The built-in `String` cursor codec: generic stringification of whatever
/// leaf value backs the cursor field. Non-leaf values yield no cursor.
pub(crate) fn stringify(value: &ConstValue) -> Option<String> {
    match value {
        ConstValue::String(s) => Some(s.clone()),
        ConstValue::Number(n) => Some(n.to_string()),
        ConstValue::Boolean(b) => Some(b.to_string()),
        ConstValue::Enum(e) => Some(e.to_string()),
        _ => None,
    }
}

pub(crate) const DEFAULT_CODEC: (&str, CursorCodec) = ("String", stringify);
