use async_graphql::dynamic;
use async_graphql::{Request, Response, Variables};
use futures::Stream;
use tracing::debug;

use crate::builder::registry::CursorCodec;
use crate::builder::Builder;
use crate::context::RequestMetadata;
use crate::error::SchemaError;
use crate::reflect::{Reflect, ReflectEnum, TypeSpec};

/// Assembles a schema from reflected root types plus caller overrides.
/// Overrides registered here always win over derivation: a name already in
/// the registry is never rebuilt.
pub struct SchemaBuilder {
    builder: Builder,
    query: Option<fn() -> TypeSpec>,
    mutation: Option<fn() -> TypeSpec>,
    subscription: Option<fn() -> TypeSpec>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        SchemaBuilder {
            builder: Builder::new(),
            query: None,
            mutation: None,
            subscription: None,
        }
    }

    /// Default page size for paginated fields that receive neither `first`
    /// nor `last`.
    pub fn pagination_limit(mut self, limit: usize) -> Self {
        self.builder.registry.pagination_limit = limit;
        self
    }

    /// Maps a runtime type name onto an existing graph scalar.
    pub fn scalar(mut self, name: &str, graph_name: &str) -> Self {
        self.builder.registry.register_scalar(name, graph_name, None);
        self
    }

    /// Maps a runtime type name onto a caller-defined scalar. The definition
    /// installs into the schema the first time a field references it.
    pub fn scalar_type(
        mut self,
        name: &str,
        graph_name: &str,
        definition: dynamic::Scalar,
    ) -> Self {
        self.builder
            .registry
            .register_scalar(name, graph_name, Some(definition));
        self
    }

    /// Registers a reflected enum type.
    pub fn enum_type<E: ReflectEnum>(mut self) -> Self {
        let mut definition = dynamic::Enum::new(E::NAME);
        for variant in E::variants() {
            definition = definition.item(dynamic::EnumItem::new(*variant));
        }
        self.builder.registry.register_enum(E::NAME, definition);
        self
    }

    /// Registers an enum from a bare value list, for types outside the
    /// reflection system.
    pub fn enum_values(mut self, name: &str, values: &[&str]) -> Self {
        let mut definition = dynamic::Enum::new(name);
        for value in values {
            definition = definition.item(dynamic::EnumItem::new(*value));
        }
        self.builder.registry.register_enum(name, definition);
        self
    }

    /// Pre-registers an object definition under its name, pre-empting
    /// derivation for that name.
    pub fn object(mut self, name: &str, definition: dynamic::Object) -> Self {
        self.builder.registry.register_object(name, definition);
        self
    }

    /// Pre-registers an input object definition under its name.
    pub fn input(mut self, name: &str, definition: dynamic::InputObject) -> Self {
        self.builder.registry.register_input(name, definition);
        self
    }

    /// Pre-registers an interface definition under its name.
    pub fn interface(mut self, name: &str, definition: dynamic::Interface) -> Self {
        self.builder.registry.register_interface(name, definition);
        self
    }

    /// Registers a named cursor codec, selectable from a relay tag's
    /// `method` token.
    pub fn cursor_codec(mut self, name: &str, codec: CursorCodec) -> Self {
        self.builder.registry.register_cursor_codec(name, codec);
        self
    }

    pub fn query<Q: Reflect>(mut self) -> Self {
        self.query = Some(Q::describe);
        self
    }

    pub fn mutation<M: Reflect>(mut self) -> Self {
        self.mutation = Some(M::describe);
        self
    }

    pub fn subscription<S: Reflect>(mut self) -> Self {
        self.subscription = Some(S::describe);
        self
    }

    /// Derives every reachable type and hands the result to the executor.
    pub fn finish(mut self) -> Result<BuiltSchema, SchemaError> {
        let Some(query) = self.query else {
            return Err(SchemaError::MissingQueryRoot);
        };

        debug!("assembling schema");
        let fields = self.builder.query_fields(query())?;
        let mut root = dynamic::Object::new("Query");
        for field in fields {
            root = root.field(field);
        }
        self.builder.registry.register_object("Query", root);

        if let Some(mutation) = self.mutation {
            let fields = self.builder.query_fields(mutation())?;
            let mut root = dynamic::Object::new("Mutation");
            for field in fields {
                root = root.field(field);
            }
            self.builder.registry.register_object("Mutation", root);
        }

        let subscription_root = match self.subscription {
            Some(subscription) => {
                let fields = self.builder.subscription_fields(subscription())?;
                let mut root = dynamic::Subscription::new("Subscription");
                for field in fields {
                    root = root.field(field);
                }
                Some(root)
            }
            None => None,
        };

        let mut schema = dynamic::Schema::build(
            "Query",
            self.mutation.map(|_| "Mutation"),
            subscription_root.as_ref().map(|_| "Subscription"),
        );
        schema = self.builder.registry.install(schema);
        if let Some(root) = subscription_root {
            schema = schema.register(root);
        }
        let schema = schema.finish().map_err(|e| SchemaError::Build {
            message: e.to_string(),
        })?;
        Ok(BuiltSchema { schema })
    }
}

/// A finished executable schema.
#[derive(Clone)]
pub struct BuiltSchema {
    schema: dynamic::Schema,
}

impl std::fmt::Debug for BuiltSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltSchema").finish_non_exhaustive()
    }
}

impl BuiltSchema {
    pub fn inner(&self) -> &dynamic::Schema {
        &self.schema
    }

    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        self.schema.execute(request).await
    }

    pub async fn execute_query(&self, query: &str) -> Response {
        self.execute(Request::new(query)).await
    }

    pub async fn execute_with_variables(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Response {
        let mut request = Request::new(query);
        if let Ok(vars) = serde_json::from_value::<Variables>(variables) {
            request = request.variables(vars);
        }
        self.execute(request).await
    }

    /// Executes with per-request metadata resolvers can read through their
    /// context.
    pub async fn execute_with_metadata(&self, query: &str, metadata: RequestMetadata) -> Response {
        self.execute(Request::new(query).data(metadata)).await
    }

    /// Executes a subscription, yielding one response per event.
    pub fn execute_stream(&self, request: impl Into<Request>) -> impl Stream<Item = Response> {
        self.schema.execute_stream(request)
    }

    /// The derived schema rendered as SDL.
    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }
}
