use std::collections::HashSet;

use async_graphql::dynamic;
use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use tracing::debug;

use super::scalars;

/// Renders a runtime value into the raw cursor string for one edge. Codecs
/// are looked up by name from the `method` token of a relay tag.
pub type CursorCodec = fn(&ConstValue) -> Option<String>;

pub(crate) struct ScalarEntry {
    pub(crate) graph_name: String,
    pub(crate) definition: Option<dynamic::Scalar>,
    pub(crate) used: bool,
}

impl ScalarEntry {
    pub(crate) fn builtin(graph_name: &str) -> Self {
        ScalarEntry {
            graph_name: graph_name.to_string(),
            definition: None,
            used: false,
        }
    }

    pub(crate) fn custom(graph_name: &str, definition: dynamic::Scalar) -> Self {
        ScalarEntry {
            graph_name: graph_name.to_string(),
            definition: Some(definition),
            used: false,
        }
    }
}

/// Memoized store of every graph type produced (or overridden) during one
/// schema build. Registration is keyed by name and a later registration
/// replaces an earlier one; derivation checks `has_*` before building, so
/// caller overrides registered up front still pre-empt it. Draining into
/// the executor's schema builder happens exactly once, in [`install`].
///
/// [`install`]: TypeRegistry::install
pub(crate) struct TypeRegistry {
    scalars: IndexMap<String, ScalarEntry>,
    enums: IndexMap<String, dynamic::Enum>,
    interfaces: IndexMap<String, dynamic::Interface>,
    objects: IndexMap<String, dynamic::Object>,
    inputs: IndexMap<String, dynamic::InputObject>,
    cursor_codecs: IndexMap<String, CursorCodec>,
    pub(crate) pagination_limit: usize,
}

pub(crate) const DEFAULT_PAGINATION_LIMIT: usize = 100;

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut cursor_codecs = IndexMap::new();
        let (name, codec) = scalars::DEFAULT_CODEC;
        cursor_codecs.insert(name.to_string(), codec);
        TypeRegistry {
            scalars: scalars::defaults()
                .into_iter()
                .map(|(name, entry)| (name.to_string(), entry))
                .collect(),
            enums: IndexMap::new(),
            interfaces: IndexMap::new(),
            objects: IndexMap::new(),
            inputs: IndexMap::new(),
            cursor_codecs,
            pagination_limit: DEFAULT_PAGINATION_LIMIT,
        }
    }
}

impl TypeRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Maps a runtime type name onto a graph scalar name, overriding any
    /// default entry for that type.
    pub(crate) fn register_scalar(
        &mut self,
        name: &str,
        graph_name: &str,
        definition: Option<dynamic::Scalar>,
    ) {
        debug!(name, graph_name, "registering scalar");
        self.scalars.insert(
            name.to_string(),
            ScalarEntry {
                graph_name: graph_name.to_string(),
                definition,
                used: false,
            },
        );
    }

    /// Resolves a runtime type name to its scalar's graph name, marking the
    /// entry used so its definition is installed into the schema.
    pub(crate) fn use_scalar(&mut self, name: &str) -> Option<String> {
        let entry = self.scalars.get_mut(name)?;
        entry.used = true;
        Some(entry.graph_name.clone())
    }

    pub(crate) fn register_enum(&mut self, name: &str, definition: dynamic::Enum) {
        debug!(name, "registering enum");
        self.enums.insert(name.to_string(), definition);
    }

    pub(crate) fn has_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    pub(crate) fn register_interface(&mut self, name: &str, definition: dynamic::Interface) {
        debug!(name, "registering interface");
        self.interfaces.insert(name.to_string(), definition);
    }

    pub(crate) fn has_interface(&self, name: &str) -> bool {
        self.interfaces.contains_key(name)
    }

    pub(crate) fn register_object(&mut self, name: &str, definition: dynamic::Object) {
        debug!(name, "registering object");
        self.objects.insert(name.to_string(), definition);
    }

    pub(crate) fn has_object(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    #[cfg(test)]
    pub(crate) fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub(crate) fn register_input(&mut self, name: &str, definition: dynamic::InputObject) {
        debug!(name, "registering input");
        self.inputs.insert(name.to_string(), definition);
    }

    pub(crate) fn has_input(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    pub(crate) fn register_cursor_codec(&mut self, name: &str, codec: CursorCodec) {
        self.cursor_codecs.insert(name.to_string(), codec);
    }

    pub(crate) fn cursor_codec(&self, name: &str) -> Option<CursorCodec> {
        self.cursor_codecs.get(name).copied()
    }

    /// Drains every accumulated type into the executor's schema builder.
    /// Scalar definitions install only when some field referenced them, and
    /// at most once per graph name even if several runtime types share it.
    pub(crate) fn install(self, mut schema: dynamic::SchemaBuilder) -> dynamic::SchemaBuilder {
        let mut installed = HashSet::new();
        for (_, entry) in self.scalars {
            if !entry.used {
                continue;
            }
            if let Some(definition) = entry.definition {
                if installed.insert(entry.graph_name.clone()) {
                    schema = schema.register(definition);
                }
            }
        }
        for (_, definition) in self.enums {
            schema = schema.register(definition);
        }
        for (_, definition) in self.interfaces {
            schema = schema.register(definition);
        }
        for (_, definition) in self.objects {
            schema = schema.register(definition);
        }
        for (_, definition) in self.inputs {
            schema = schema.register(definition);
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_registration_replaces_by_name() {
        let mut registry = TypeRegistry::new();
        registry.register_object("User", dynamic::Object::new("User"));
        registry.register_object(
            "User",
            dynamic::Object::new("User").description("last wins"),
        );
        assert_eq!(registry.object_count(), 1);
    }

    #[test]
    fn scalar_override_replaces_default() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.use_scalar("i64").as_deref(), Some("Int"));
        registry.register_scalar("i64", "BigInt", Some(dynamic::Scalar::new("BigInt")));
        assert_eq!(registry.use_scalar("i64").as_deref(), Some("BigInt"));
    }

    #[test]
    fn unknown_scalar_is_none() {
        let mut registry = TypeRegistry::new();
        assert!(registry.use_scalar("User").is_none());
    }

    #[test]
    fn default_cursor_codec_is_registered() {
        let registry = TypeRegistry::new();
        let codec = registry.cursor_codec("String").unwrap();
        assert_eq!(
            codec(&ConstValue::String("abc".into())),
            Some("abc".to_string())
        );
        assert!(registry.cursor_codec("Time").is_none());
    }
}
