use async_graphql::dynamic::{Field, Object, TypeRef};
use async_graphql::Name;
use async_graphql_value::ConstValue;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use indexmap::indexmap;
use tracing::debug;

use crate::error::{ResolveError, SchemaError};
use crate::pagination::PageArguments;
use crate::reflect::Shape;

use super::registry::CursorCodec;
use super::{access, Builder, RelayConfig};

impl Builder {
    /// Synthesizes the `<Element>Node` / `<Element>Edge` / `<Element>Connection`
    /// trio (plus the shared `PageInfo`) for a paginated field and returns
    /// the non-null connection reference. Types memoize by element name, so
    /// two fields paginating the same element share one family.
    pub(crate) fn build_connection(
        &mut self,
        field: &str,
        shape: Shape,
    ) -> Result<TypeRef, SchemaError> {
        let (element, describe) = connection_element(field, shape)?;
        debug!(field, element, "building connection types");
        self.build_interfaces();

        let node_name = format!("{element}Node");
        self.object_type(describe(), &["INode"], Some(node_name.clone()))?;

        if !self.registry.has_object("PageInfo") {
            let page_info = Object::new("PageInfo")
                .field(Field::new(
                    "startCursor",
                    TypeRef::named_nn(TypeRef::STRING),
                    access("startCursor"),
                ))
                .field(Field::new(
                    "endCursor",
                    TypeRef::named_nn(TypeRef::STRING),
                    access("endCursor"),
                ))
                .field(Field::new(
                    "hasMore",
                    TypeRef::named_nn(TypeRef::BOOLEAN),
                    access("hasMore"),
                ))
                .implement("IPageInfo");
            self.registry.register_object("PageInfo", page_info);
        }

        let edge_name = format!("{element}Edge");
        if !self.registry.has_object(&edge_name) {
            let edge = Object::new(&edge_name)
                .field(Field::new(
                    "cursor",
                    TypeRef::named_nn(TypeRef::STRING),
                    access("cursor"),
                ))
                .field(Field::new(
                    "node",
                    TypeRef::named_nn(node_name),
                    access("node"),
                ))
                .implement("IEdge");
            self.registry.register_object(&edge_name, edge);
        }

        let connection_name = format!("{element}Connection");
        if !self.registry.has_object(&connection_name) {
            let connection = Object::new(&connection_name)
                .field(Field::new(
                    "pageInfo",
                    TypeRef::named_nn("PageInfo"),
                    access("pageInfo"),
                ))
                .field(Field::new(
                    "edges",
                    TypeRef::NonNull(Box::new(TypeRef::List(Box::new(TypeRef::named(
                        edge_name,
                    ))))),
                    access("edges"),
                ))
                .implement("IConnection");
            self.registry.register_object(&connection_name, connection);
        }

        Ok(TypeRef::NonNull(Box::new(TypeRef::named(connection_name))))
    }
}

/// Unwraps optionals and lists down to the structural element a connection
/// paginates over.
fn connection_element(
    field: &str,
    mut shape: Shape,
) -> Result<(&'static str, fn() -> crate::reflect::TypeSpec), SchemaError> {
    loop {
        match shape {
            Shape::Optional { inner } => shape = inner(),
            Shape::List { element } => shape = element(),
            Shape::Aggregate { name, describe } => return Ok((name, describe)),
            Shape::Atom { .. } => {
                return Err(SchemaError::InvalidConnectionElement {
                    field: field.to_string(),
                })
            }
        }
    }
}

/// Opaque cursor encoding over the raw cursor string.
pub(crate) fn to_global_id(raw: &str) -> String {
    BASE64.encode(raw)
}

/// Assembles the runtime connection value from the resolver's full node
/// list: windows it by the page arguments, derives one cursor per retained
/// edge, and reports whether candidates remain past the window. A node
/// without a usable cursor source is skipped rather than failing the whole
/// page. A resolver error fails the field before this runs; a field result
/// is either a page or an error, never both.
pub(crate) fn resolve_connection(
    field: &str,
    nodes: ConstValue,
    relay: &RelayConfig,
    page: &PageArguments,
    codec: CursorCodec,
) -> Result<ConstValue, ResolveError> {
    let items = match nodes {
        ConstValue::List(items) => items,
        _ => {
            return Err(ResolveError::ConnectionSource {
                field: field.to_string(),
            })
        }
    };

    let (start, limit) = page.window(items.len());
    let has_more = items.len() > limit;

    let mut edges = Vec::new();
    let mut start_cursor = String::new();
    let mut end_cursor = String::new();
    for item in items.into_iter().skip(start) {
        if edges.len() == limit {
            break;
        }
        let Some(source) = cursor_source(&item, &relay.key) else {
            continue;
        };
        let Some(raw) = codec(source) else {
            continue;
        };
        let cursor = to_global_id(&raw);
        if edges.is_empty() {
            start_cursor = cursor.clone();
        }
        end_cursor = cursor.clone();
        edges.push(ConstValue::Object(indexmap! {
            Name::new("node") => item,
            Name::new("cursor") => ConstValue::String(cursor),
        }));
    }

    let page_info = ConstValue::Object(indexmap! {
        Name::new("startCursor") => ConstValue::String(start_cursor),
        Name::new("endCursor") => ConstValue::String(end_cursor),
        Name::new("hasMore") => ConstValue::Boolean(has_more),
    });
    Ok(ConstValue::Object(indexmap! {
        Name::new("pageInfo") => page_info,
        Name::new("edges") => ConstValue::List(edges),
    }))
}

fn cursor_source<'a>(item: &'a ConstValue, key: &str) -> Option<&'a ConstValue> {
    match item {
        ConstValue::Object(fields) => match fields.get(key) {
            None | Some(ConstValue::Null) => None,
            Some(value) => Some(value),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::scalars::stringify;

    fn node(id: i64) -> ConstValue {
        ConstValue::Object(indexmap! {
            Name::new("id") => ConstValue::String(id.to_string()),
        })
    }

    fn relay() -> RelayConfig {
        RelayConfig::default()
    }

    fn field(conn: &ConstValue, path: &[&str]) -> ConstValue {
        let mut current = conn.clone();
        for key in path {
            let ConstValue::Object(obj) = current else {
                panic!("expected object at {key}");
            };
            current = obj.get(*key).cloned().unwrap();
        }
        current
    }

    #[test]
    fn window_full_fit_reports_no_more() {
        let nodes = ConstValue::List((1..=5).map(node).collect());
        let page = PageArguments {
            limit: 10,
            ..Default::default()
        };
        let conn = resolve_connection("items", nodes, &relay(), &page, stringify).unwrap();

        let ConstValue::List(edges) = field(&conn, &["edges"]) else {
            panic!("expected edge list");
        };
        assert_eq!(edges.len(), 5);
        assert_eq!(
            field(&conn, &["pageInfo", "hasMore"]),
            ConstValue::Boolean(false)
        );
        // Cursor is the base64 rendering of the key field.
        assert_eq!(
            field(&edges[0], &["cursor"]),
            ConstValue::String(to_global_id("1"))
        );
        assert_eq!(
            field(&conn, &["pageInfo", "startCursor"]),
            ConstValue::String(to_global_id("1"))
        );
        assert_eq!(
            field(&conn, &["pageInfo", "endCursor"]),
            ConstValue::String(to_global_id("5"))
        );
    }

    #[test]
    fn truncated_window_reports_more() {
        let nodes = ConstValue::List((1..=5).map(node).collect());
        let page = PageArguments {
            first: Some(2),
            limit: 10,
            ..Default::default()
        };
        let conn = resolve_connection("items", nodes, &relay(), &page, stringify).unwrap();
        let ConstValue::List(edges) = field(&conn, &["edges"]) else {
            panic!("expected edge list");
        };
        assert_eq!(edges.len(), 2);
        assert_eq!(
            field(&conn, &["pageInfo", "hasMore"]),
            ConstValue::Boolean(true)
        );
        assert_eq!(
            field(&conn, &["pageInfo", "endCursor"]),
            ConstValue::String(to_global_id("2"))
        );
    }

    #[test]
    fn last_takes_the_tail_window() {
        let nodes = ConstValue::List((1..=5).map(node).collect());
        let page = PageArguments {
            last: Some(2),
            limit: 10,
            ..Default::default()
        };
        let conn = resolve_connection("items", nodes, &relay(), &page, stringify).unwrap();
        let ConstValue::List(edges) = field(&conn, &["edges"]) else {
            panic!("expected edge list");
        };
        assert_eq!(edges.len(), 2);
        assert_eq!(
            field(&edges[0], &["cursor"]),
            ConstValue::String(to_global_id("4"))
        );
    }

    #[test]
    fn nodes_without_a_cursor_source_are_skipped() {
        let nodes = ConstValue::List(vec![
            node(1),
            ConstValue::Object(indexmap! {
                Name::new("name") => ConstValue::String("keyless".into()),
            }),
            node(3),
        ]);
        let page = PageArguments {
            limit: 10,
            ..Default::default()
        };
        let conn = resolve_connection("items", nodes, &relay(), &page, stringify).unwrap();
        let ConstValue::List(edges) = field(&conn, &["edges"]) else {
            panic!("expected edge list");
        };
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn non_list_source_is_an_error() {
        let page = PageArguments::default();
        let err = resolve_connection(
            "items",
            ConstValue::String("oops".into()),
            &relay(),
            &page,
            stringify,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::ConnectionSource { field } if field == "items"
        ));
    }

    #[test]
    fn connection_family_memoizes_by_element() {
        let mut builder = Builder::new();
        let shape = Shape::List {
            element: leaf_shape,
        };
        let ty = builder.build_connection("items", shape).unwrap();
        assert_eq!(ty.to_string(), "LeafConnection!");
        for name in ["LeafNode", "LeafEdge", "LeafConnection", "PageInfo"] {
            assert!(builder.registry.has_object(name), "missing {name}");
        }
        let count = builder.registry.object_count();
        builder.build_connection("others", shape).unwrap();
        assert_eq!(builder.registry.object_count(), count);
    }

    #[test]
    fn atomic_element_is_rejected() {
        let mut builder = Builder::new();
        let err = builder
            .build_connection(
                "items",
                Shape::List {
                    element: || Shape::Atom { name: "i64" },
                },
            )
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidConnectionElement { .. }));
    }

    fn leaf_shape() -> Shape {
        Shape::Aggregate {
            name: "Leaf",
            describe: || crate::reflect::TypeSpec {
                name: "Leaf",
                fields: vec![crate::reflect::FieldSpec {
                    name: "id",
                    public: true,
                    tag: "",
                    relay: None,
                    shape: <crate::value::Id as crate::value::GraphValue>::shape,
                }],
                resolvers: crate::resolver::ResolverTable::new(),
            },
        }
    }
}
