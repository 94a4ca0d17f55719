use async_graphql::dynamic::{InputObject, TypeRef};
use tracing::trace;

use crate::error::SchemaError;
use crate::reflect::Shape;

use super::Builder;

impl Builder {
    /// Maps a field shape to its output type reference. Scalar and enum
    /// names take precedence over structural interpretation, so a caller
    /// override can turn any runtime type into a leaf. `None` means the
    /// shape has no graph rendering and the field is silently skipped.
    pub(crate) fn map_output(&mut self, shape: Shape) -> Result<Option<TypeRef>, SchemaError> {
        if let Some(leaf) = self.leaf_type(&shape) {
            return Ok(Some(leaf));
        }
        match shape {
            Shape::List { element } => Ok(self
                .map_output(element())?
                .map(|inner| TypeRef::List(Box::new(inner)))),
            Shape::Optional { inner } => self.map_output(inner()),
            Shape::Aggregate { describe, .. } => {
                let name = self.object_type(describe(), &[], None)?;
                Ok(Some(TypeRef::named(name)))
            }
            Shape::Atom { name } => {
                trace!(name, "no scalar mapping; skipping field");
                Ok(None)
            }
        }
    }

    /// Maps a field shape to its input type reference. Aggregates memoize as
    /// `<Name>Input`; an unmappable leaf is an error here because silently
    /// dropping an argument would change the field's meaning.
    pub(crate) fn map_input(&mut self, shape: Shape) -> Result<TypeRef, SchemaError> {
        if let Some(leaf) = self.leaf_type(&shape) {
            return Ok(leaf);
        }
        match shape {
            Shape::List { element } => Ok(TypeRef::List(Box::new(self.map_input(element())?))),
            Shape::Optional { inner } => self.map_input(inner()),
            Shape::Aggregate { name, describe } => {
                let input_name = format!("{name}Input");
                if self.registry.has_input(&input_name) || self.pending_inputs.contains(&input_name)
                {
                    return Ok(TypeRef::named(input_name));
                }
                self.pending_inputs.insert(input_name.clone());
                let fields = self.input_fields(&describe())?;
                let mut object = InputObject::new(&input_name);
                for field in fields {
                    object = object.field(field);
                }
                self.registry.register_input(&input_name, object);
                self.pending_inputs.remove(&input_name);
                Ok(TypeRef::named(input_name))
            }
            Shape::Atom { name } => Err(SchemaError::UnknownInputType {
                name: name.to_string(),
            }),
        }
    }

    fn leaf_type(&mut self, shape: &Shape) -> Option<TypeRef> {
        let name = match shape {
            Shape::Atom { name } | Shape::Aggregate { name, .. } => *name,
            _ => return None,
        };
        if let Some(graph_name) = self.registry.use_scalar(name) {
            return Some(TypeRef::named(graph_name));
        }
        if self.registry.has_enum(name) {
            return Some(TypeRef::named(name));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{FieldSpec, TypeSpec};
    use crate::resolver::ResolverTable;
    use crate::value::GraphValue;

    fn leaf_spec() -> TypeSpec {
        TypeSpec {
            name: "Leaf",
            fields: vec![FieldSpec {
                name: "value",
                public: true,
                tag: "",
                relay: None,
                shape: <i64 as GraphValue>::shape,
            }],
            resolvers: ResolverTable::new(),
        }
    }

    fn leaf_shape() -> Shape {
        Shape::Aggregate {
            name: "Leaf",
            describe: leaf_spec,
        }
    }

    #[test]
    fn scalars_map_before_structure() {
        let mut builder = Builder::new();
        let ty = builder.map_output(Shape::Atom { name: "i32" }).unwrap();
        assert_eq!(ty.unwrap().to_string(), "Int");
    }

    #[test]
    fn unmapped_atom_is_skipped_on_output() {
        let mut builder = Builder::new();
        assert!(builder
            .map_output(Shape::Atom { name: "Mystery" })
            .unwrap()
            .is_none());
    }

    #[test]
    fn unmapped_atom_is_an_error_on_input() {
        let mut builder = Builder::new();
        let err = builder.map_input(Shape::Atom { name: "Mystery" }).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownInputType { name } if name == "Mystery"));
    }

    #[test]
    fn optional_unwraps_and_list_nests() {
        let mut builder = Builder::new();
        let ty = builder
            .map_output(Shape::Optional {
                inner: <i64 as GraphValue>::shape,
            })
            .unwrap();
        assert_eq!(ty.unwrap().to_string(), "Int");

        let ty = builder
            .map_output(Shape::List {
                element: <Vec<bool> as GraphValue>::shape,
            })
            .unwrap();
        assert_eq!(ty.unwrap().to_string(), "[[Boolean]]");
    }

    #[test]
    fn aggregates_memoize_as_objects() {
        let mut builder = Builder::new();
        let ty = builder.map_output(leaf_shape()).unwrap().unwrap();
        assert_eq!(ty.to_string(), "Leaf");
        assert!(builder.registry.has_object("Leaf"));
        let count = builder.registry.object_count();
        builder.map_output(leaf_shape()).unwrap();
        assert_eq!(builder.registry.object_count(), count);
    }

    #[test]
    fn input_aggregates_get_the_input_suffix() {
        let mut builder = Builder::new();
        let ty = builder.map_input(leaf_shape()).unwrap();
        assert_eq!(ty.to_string(), "LeafInput");
        assert!(builder.registry.has_input("LeafInput"));
    }
}
