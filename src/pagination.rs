use async_graphql::Name;
use async_graphql_value::ConstValue;
use indexmap::IndexMap;

use crate::reflect::{FieldSpec, Reflect, TypeSpec};
use crate::resolver::ResolverTable;
use crate::value::GraphValue;

/// Caller-visible pagination arguments for any paginated field. `limit` is
/// the builder-wide default page size; it never appears as a graph argument
/// and is never written back after construction. The effective page size is
/// always recomputed from the request's own `first`/`last`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageArguments {
    pub first: Option<i64>,
    pub last: Option<i64>,
    pub before: Option<String>,
    pub after: Option<String>,
    pub limit: usize,
}

impl PageArguments {
    /// Effective page size: the configured default, narrowed by `first` and
    /// `last` when present. Pure; repeated calls with the same arguments
    /// always agree.
    pub fn effective_limit(&self) -> usize {
        let mut limit = self.limit;
        if let Some(first) = self.first {
            if first >= 0 {
                limit = limit.min(first as usize);
            }
        }
        if let Some(last) = self.last {
            if last >= 0 {
                limit = limit.min(last as usize);
            }
        }
        limit
    }

    /// The window `[start, start + limit)` over a result set of `len`
    /// elements. `last` counts from the end of the set.
    pub fn window(&self, len: usize) -> (usize, usize) {
        let limit = self.effective_limit();
        let start = if self.last.is_some() && len > limit {
            len - limit
        } else {
            0
        };
        (start, limit)
    }

    /// Decodes the executor's argument map, seeding the default limit.
    pub(crate) fn from_args(
        args: &IndexMap<Name, ConstValue>,
        default_limit: usize,
    ) -> Result<Self, String> {
        let mut page = PageArguments {
            limit: default_limit,
            ..Default::default()
        };
        for (key, value) in args {
            if value == &ConstValue::Null {
                continue;
            }
            match key.as_str() {
                "first" => match value {
                    ConstValue::Number(n) => page.first = n.as_i64(),
                    _ => return Err("`first` must be an integer".to_string()),
                },
                "last" => match value {
                    ConstValue::Number(n) => page.last = n.as_i64(),
                    _ => return Err("`last` must be an integer".to_string()),
                },
                "before" => match value {
                    ConstValue::String(s) => page.before = Some(s.clone()),
                    _ => return Err("`before` must be a string".to_string()),
                },
                "after" => match value {
                    ConstValue::String(s) => page.after = Some(s.clone()),
                    _ => return Err("`after` must be a string".to_string()),
                },
                _ => {}
            }
        }
        Ok(page)
    }
}

impl Reflect for PageArguments {
    fn describe() -> TypeSpec {
        TypeSpec {
            name: "PageArguments",
            fields: vec![
                FieldSpec {
                    name: "first",
                    public: true,
                    tag: "",
                    relay: None,
                    shape: <Option<i64> as GraphValue>::shape,
                },
                FieldSpec {
                    name: "last",
                    public: true,
                    tag: "",
                    relay: None,
                    shape: <Option<i64> as GraphValue>::shape,
                },
                FieldSpec {
                    name: "before",
                    public: true,
                    tag: "",
                    relay: None,
                    shape: <Option<String> as GraphValue>::shape,
                },
                FieldSpec {
                    name: "after",
                    public: true,
                    tag: "",
                    relay: None,
                    shape: <Option<String> as GraphValue>::shape,
                },
                FieldSpec {
                    name: "limit",
                    public: true,
                    tag: "-",
                    relay: None,
                    shape: <usize as GraphValue>::shape,
                },
            ],
            resolvers: ResolverTable::new(),
        }
    }
}
