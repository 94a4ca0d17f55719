//! Schema derivation: walks `TypeSpec` descriptions, maps field shapes onto
//! graph types, binds resolvers, and accumulates everything in a
//! [`registry::TypeRegistry`] until the final schema is assembled.

use std::collections::HashSet;

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputValue, ResolverContext, SubscriptionField,
    SubscriptionFieldFuture, TypeRef,
};
use async_graphql::Name;
use async_graphql_value::ConstValue;
use futures_util::StreamExt;
use indexmap::IndexMap;
use tracing::debug;

use crate::context::{Ctx, RequestMetadata};
use crate::error::SchemaError;
use crate::pagination::PageArguments;
use crate::reflect::{Reflect, Shape, TypeSpec};
use crate::resolver::{ArgStyle, Invoke, PageInvoke, PlainInvoke, ResolverSpec, StreamInvoke};

mod connection;
mod interfaces;
mod mapper;
pub(crate) mod registry;
pub(crate) mod scalars;

use connection::resolve_connection;
use registry::CursorCodec;

/// Relay configuration parsed from a field's `relay` tag.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RelayConfig {
    /// Field of the element each cursor derives from.
    pub(crate) key: String,
    /// Named cursor codec applied to that field's value.
    pub(crate) method: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            key: "id".to_string(),
            method: "String".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct TagFlags {
    input_only: bool,
    read_only: bool,
    no_null: bool,
    required: bool,
    skip: bool,
    alias: Option<String>,
    description: Option<String>,
}

/// Parses the comma-separated token list of a `graphql` tag. Unknown tokens
/// are ignored for forward compatibility.
fn parse_tag(tag: &str) -> TagFlags {
    let mut flags = TagFlags::default();
    if tag.is_empty() {
        return flags;
    }
    for token in tag.split(',') {
        let token = token.trim();
        match token {
            "inputonly" => flags.input_only = true,
            "readonly" => flags.read_only = true,
            "nonull" => flags.no_null = true,
            "required" => flags.required = true,
            "-" => flags.skip = true,
            _ => {
                if let Some(alias) = token.strip_prefix("alias=") {
                    flags.alias = Some(alias.to_string());
                } else if let Some(text) = token.strip_prefix("description=") {
                    flags.description = Some(text.trim_matches('"').to_string());
                }
            }
        }
    }
    flags
}

fn parse_relay(tag: &str) -> RelayConfig {
    let mut relay = RelayConfig::default();
    for token in tag.split(',') {
        let Some((key, value)) = token.trim().split_once('=') else {
            continue;
        };
        match key {
            "key" => relay.key = value.to_string(),
            "method" => relay.method = value.to_string(),
            _ => {}
        }
    }
    relay
}

/// snake_case (or SCREAMING) to lowerCamel for graph-facing names.
pub(crate) fn to_lower_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, segment) in name.split('_').filter(|s| !s.is_empty()).enumerate() {
        if i == 0 {
            if segment.chars().all(|c| c.is_uppercase() || c.is_numeric()) {
                out.extend(segment.chars().flat_map(char::to_lowercase));
            } else {
                let mut chars = segment.chars();
                if let Some(first) = chars.next() {
                    out.extend(first.to_lowercase());
                    out.push_str(chars.as_str());
                }
            }
        } else {
            let mut chars = segment.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.extend(chars.flat_map(char::to_lowercase));
            }
        }
    }
    out
}

/// One extracted field with its tags parsed and its resolver (if any)
/// attached, ready for phase filtering.
struct FieldNode {
    name: &'static str,
    public: bool,
    shape: fn() -> Shape,
    input_only: bool,
    no_null: bool,
    skip: bool,
    alias: Option<String>,
    description: Option<String>,
    relay: Option<RelayConfig>,
    resolver: Option<ResolverSpec>,
}

/// Graph-name to declared-name pairs used to re-key the executor's argument
/// map back into the declaration's field names before typed decoding.
#[derive(Clone)]
struct ArgsDecode {
    fields: Vec<(String, &'static str)>,
}

/// A field's bound execution strategy.
#[derive(Clone)]
enum BoundExec {
    /// No resolver: read the field straight off the parent value.
    Access { name: &'static str },
    Plain {
        invoke: PlainInvoke,
        decode: Option<ArgsDecode>,
    },
    Paginated {
        invoke: PageInvoke,
        decode: Option<ArgsDecode>,
        relay: RelayConfig,
        limit: usize,
        codec: CursorCodec,
        field: String,
    },
}

/// The derivation worker for one schema build. Owns the registry plus the
/// in-progress sets that break cycles through self-referential types.
pub(crate) struct Builder {
    pub(crate) registry: registry::TypeRegistry,
    pending: HashSet<String>,
    pending_inputs: HashSet<String>,
}

impl Builder {
    pub(crate) fn new() -> Self {
        Builder {
            registry: registry::TypeRegistry::new(),
            pending: HashSet::new(),
            pending_inputs: HashSet::new(),
        }
    }

    fn build_nodes(&self, spec: TypeSpec) -> Vec<FieldNode> {
        let resolvers = spec.resolvers;
        spec.fields
            .into_iter()
            .map(|field| {
                let tag = parse_tag(field.tag);
                FieldNode {
                    name: field.name,
                    public: field.public,
                    shape: field.shape,
                    input_only: tag.input_only,
                    no_null: tag.no_null,
                    skip: tag.skip,
                    alias: tag.alias,
                    description: tag.description,
                    relay: field.relay.map(parse_relay),
                    resolver: resolvers.get(field.name).cloned(),
                }
            })
            .collect()
    }

    /// Derives the object type for a description, memoized by name. Returns
    /// the registered name; a name already built (or currently building, for
    /// self-referential types) short-circuits.
    pub(crate) fn object_type(
        &mut self,
        spec: TypeSpec,
        interfaces: &[&str],
        alias: Option<String>,
    ) -> Result<String, SchemaError> {
        let name = alias.unwrap_or_else(|| spec.name.to_string());
        if self.registry.has_object(&name) || self.pending.contains(&name) {
            return Ok(name);
        }
        debug!(name = %name, "deriving object type");
        self.pending.insert(name.clone());
        let fields = self.query_fields(spec)?;
        self.pending.remove(&name);

        let mut object = async_graphql::dynamic::Object::new(&name);
        for field in fields {
            object = object.field(field);
        }
        for interface in interfaces {
            object = object.implement(*interface);
        }
        self.registry.register_object(&name, object);
        Ok(name)
    }

    /// Query-phase extraction: every public field that is not skipped or
    /// input-only becomes an output field with its bound executor.
    pub(crate) fn query_fields(&mut self, spec: TypeSpec) -> Result<Vec<Field>, SchemaError> {
        let mut fields = Vec::new();
        for node in self.build_nodes(spec) {
            if !node.public || node.skip || node.input_only {
                continue;
            }
            let graph_name = node
                .alias
                .clone()
                .unwrap_or_else(|| to_lower_camel(node.name));

            let (type_ref, bound, args) = if node.relay.is_some() {
                let (bound, args) = self.bind(&node, &graph_name)?;
                let type_ref = self.build_connection(&graph_name, (node.shape)())?;
                (type_ref, bound, args)
            } else {
                let Some(type_ref) = self.map_output((node.shape)())? else {
                    continue;
                };
                let (bound, args) = self.bind(&node, &graph_name)?;
                (type_ref, bound, args)
            };
            let type_ref = if node.no_null && !matches!(type_ref, TypeRef::NonNull(_)) {
                TypeRef::NonNull(Box::new(type_ref))
            } else {
                type_ref
            };

            let exec = bound;
            let mut field = Field::new(graph_name, type_ref, move |ctx| {
                let exec = exec.clone();
                FieldFuture::new(async move { execute_bound(&exec, ctx).await })
            });
            if let Some(description) = node.description {
                field = field.description(description);
            }
            for arg in args {
                field = field.argument(arg);
            }
            fields.push(field);
        }
        Ok(fields)
    }

    /// Input-phase extraction: every public field that is not skipped or
    /// read-only becomes an input field.
    pub(crate) fn input_fields(&mut self, spec: &TypeSpec) -> Result<Vec<InputValue>, SchemaError> {
        let mut fields = Vec::new();
        for field in &spec.fields {
            if !field.public {
                continue;
            }
            let tag = parse_tag(field.tag);
            if tag.skip || tag.read_only {
                continue;
            }
            let type_ref = self.map_input((field.shape)())?;
            let name = tag.alias.unwrap_or_else(|| to_lower_camel(field.name));
            let mut input = InputValue::new(name, type_ref);
            if let Some(description) = tag.description {
                input = input.description(description);
            }
            fields.push(input);
        }
        Ok(fields)
    }

    /// Subscription-phase extraction: every exposed field must carry a
    /// streaming resolver.
    pub(crate) fn subscription_fields(
        &mut self,
        spec: TypeSpec,
    ) -> Result<Vec<SubscriptionField>, SchemaError> {
        let mut fields = Vec::new();
        for node in self.build_nodes(spec) {
            if !node.public || node.skip || node.input_only {
                continue;
            }
            let graph_name = node
                .alias
                .clone()
                .unwrap_or_else(|| to_lower_camel(node.name));

            let Some(resolver) = node.resolver else {
                return Err(SchemaError::MissingStreamResolver {
                    field: graph_name.clone(),
                });
            };
            let Invoke::Stream(invoke) = resolver.invoke else {
                return Err(SchemaError::MissingStreamResolver {
                    field: graph_name.clone(),
                });
            };
            let (args, decode) = match resolver.args {
                ArgStyle::None => (Vec::new(), None),
                ArgStyle::Structured(describe) => {
                    let (args, decode) = self.arguments(&describe(), &graph_name)?;
                    (args, Some(decode))
                }
                ArgStyle::Page | ArgStyle::PageWith(_) => panic!(
                    "stream resolver for `{graph_name}` cannot take page arguments"
                ),
            };

            let Some(type_ref) = self.map_output((node.shape)())? else {
                continue;
            };
            let type_ref = if node.no_null && !matches!(type_ref, TypeRef::NonNull(_)) {
                TypeRef::NonNull(Box::new(type_ref))
            } else {
                type_ref
            };

            let mut field =
                SubscriptionField::new(graph_name, type_ref, move |ctx| {
                    let invoke = invoke.clone();
                    let decode = decode.clone();
                    SubscriptionFieldFuture::new(async move {
                        execute_stream_bound(&invoke, decode.as_ref(), ctx).await
                    })
                });
            if let Some(description) = node.description {
                field = field.description(description);
            }
            for arg in args {
                field = field.argument(arg);
            }
            fields.push(field);
        }
        Ok(fields)
    }

    /// Validates a field's resolver against its declaration and produces the
    /// bound executor plus the field's graph arguments. Contract mismatches
    /// between a declaration and its registered resolver are defects in the
    /// declaring code and panic at build time; a paginated field simply
    /// lacking its resolver is a recoverable build error.
    fn bind(
        &mut self,
        node: &FieldNode,
        graph_name: &str,
    ) -> Result<(BoundExec, Vec<InputValue>), SchemaError> {
        match (&node.relay, &node.resolver) {
            (Some(relay), Some(resolver)) => {
                let (extra, decode) = match resolver.args {
                    ArgStyle::Page => (Vec::new(), None),
                    ArgStyle::PageWith(describe) => {
                        let (args, decode) = self.arguments(&describe(), graph_name)?;
                        (args, Some(decode))
                    }
                    ArgStyle::None | ArgStyle::Structured(_) => panic!(
                        "resolver for paginated field `{graph_name}` must accept page arguments"
                    ),
                };
                let Invoke::Paginated(invoke) = &resolver.invoke else {
                    panic!("resolver for paginated field `{graph_name}` must be paginated");
                };
                let codec = self.registry.cursor_codec(&relay.method).ok_or_else(|| {
                    SchemaError::Build {
                        message: format!(
                            "unknown cursor codec `{}` on field `{graph_name}`",
                            relay.method
                        ),
                    }
                })?;
                let (mut args, _) = self.arguments(&PageArguments::describe(), graph_name)?;
                args.extend(extra);
                Ok((
                    BoundExec::Paginated {
                        invoke: invoke.clone(),
                        decode,
                        relay: relay.clone(),
                        limit: self.registry.pagination_limit,
                        codec,
                        field: graph_name.to_string(),
                    },
                    args,
                ))
            }
            (Some(_), None) => Err(SchemaError::MissingConnectionResolver {
                field: graph_name.to_string(),
            }),
            (None, Some(resolver)) => match (&resolver.invoke, resolver.args) {
                (Invoke::Plain(invoke), ArgStyle::None) => Ok((
                    BoundExec::Plain {
                        invoke: invoke.clone(),
                        decode: None,
                    },
                    Vec::new(),
                )),
                (Invoke::Plain(invoke), ArgStyle::Structured(describe)) => {
                    let (args, decode) = self.arguments(&describe(), graph_name)?;
                    Ok((
                        BoundExec::Plain {
                            invoke: invoke.clone(),
                            decode: Some(decode),
                        },
                        args,
                    ))
                }
                (Invoke::Stream(_), _) => Err(SchemaError::StreamOutsideSubscription {
                    field: graph_name.to_string(),
                }),
                _ => panic!(
                    "resolver for `{graph_name}` takes page arguments but the field is not paginated"
                ),
            },
            (None, None) => Ok((BoundExec::Access { name: node.name }, Vec::new())),
        }
    }

    /// Expands an argument struct's fields into graph arguments, recording
    /// the graph-to-declared name mapping for decode time. A struct that
    /// expands to nothing is a defect in the declaring code.
    fn arguments(
        &mut self,
        spec: &TypeSpec,
        owner: &str,
    ) -> Result<(Vec<InputValue>, ArgsDecode), SchemaError> {
        let mut args = Vec::new();
        let mut decode = ArgsDecode { fields: Vec::new() };
        for field in &spec.fields {
            if !field.public {
                continue;
            }
            let tag = parse_tag(field.tag);
            if tag.skip || tag.read_only {
                continue;
            }
            let mut type_ref = self.map_input((field.shape)())?;
            if tag.required && !matches!(type_ref, TypeRef::NonNull(_)) {
                type_ref = TypeRef::NonNull(Box::new(type_ref));
            }
            let name = tag.alias.unwrap_or_else(|| to_lower_camel(field.name));
            let mut arg = InputValue::new(name.clone(), type_ref);
            if let Some(description) = tag.description {
                arg = arg.description(description);
            }
            args.push(arg);
            decode.fields.push((name, field.name));
        }
        if args.is_empty() {
            panic!(
                "argument struct `{}` for `{owner}` exposes no usable fields",
                spec.name
            );
        }
        Ok((args, decode))
    }
}

/// Re-keys the executor's argument map into the declared field names, so
/// the typed decode sees the struct it was written against.
fn realign_args(args: &IndexMap<Name, ConstValue>, decode: Option<&ArgsDecode>) -> ConstValue {
    match decode {
        None => ConstValue::Null,
        Some(decode) => {
            let mut object = IndexMap::new();
            for (graph_name, declared) in &decode.fields {
                let value = args
                    .get(graph_name.as_str())
                    .cloned()
                    .unwrap_or(ConstValue::Null);
                object.insert(Name::new(declared), value);
            }
            ConstValue::Object(object)
        }
    }
}

async fn execute_bound<'a>(
    exec: &BoundExec,
    ctx: ResolverContext<'a>,
) -> async_graphql::Result<Option<FieldValue<'a>>> {
    let fallback = RequestMetadata::default();
    let metadata = ctx
        .ctx
        .data_opt::<RequestMetadata>()
        .unwrap_or(&fallback);
    let args = ctx.args.as_index_map();
    let parent = ctx.parent_value.downcast_ref::<ConstValue>();
    let cx = Ctx::new(parent, Some(&args), metadata);

    let value = match exec {
        BoundExec::Access { name } => cx
            .parent_field(name)
            .cloned()
            .unwrap_or(ConstValue::Null),
        BoundExec::Plain { invoke, decode } => {
            let decoded_args = realign_args(&args, decode.as_ref());
            invoke(&cx, &decoded_args).map_err(|e| async_graphql::Error::new(e.to_string()))?
        }
        BoundExec::Paginated {
            invoke,
            decode,
            relay,
            limit,
            codec,
            field,
        } => {
            let page = PageArguments::from_args(&args, *limit).map_err(|message| {
                async_graphql::Error::new(
                    crate::error::ResolveError::ArgumentDecode {
                        field: field.clone(),
                        message,
                    }
                    .to_string(),
                )
            })?;
            let decoded_args = realign_args(&args, decode.as_ref());
            let nodes = invoke(&cx, &page, &decoded_args)
                .map_err(|e| async_graphql::Error::new(e.to_string()))?;
            resolve_connection(field, nodes, relay, &page, *codec)
                .map_err(|e| async_graphql::Error::new(e.to_string()))?
        }
    };

    if value == ConstValue::Null {
        Ok(None)
    } else {
        Ok(Some(const_value_to_field_value(value)))
    }
}

async fn execute_stream_bound<'a>(
    invoke: &StreamInvoke,
    decode: Option<&ArgsDecode>,
    ctx: ResolverContext<'a>,
) -> async_graphql::Result<
    impl futures::Stream<Item = async_graphql::Result<FieldValue<'a>>> + Send + 'a,
> {
    let fallback = RequestMetadata::default();
    let metadata = ctx
        .ctx
        .data_opt::<RequestMetadata>()
        .unwrap_or(&fallback);
    let args = ctx.args.as_index_map();
    let parent = ctx.parent_value.downcast_ref::<ConstValue>();
    let cx = Ctx::new(parent, Some(&args), metadata);

    let decoded_args = realign_args(&args, decode);
    let stream = invoke(&cx, &decoded_args)
        .map_err(|e| async_graphql::Error::new(e.to_string()))?;
    Ok(stream.map(|item| -> async_graphql::Result<FieldValue<'a>> {
        match item {
            Ok(value) => Ok(const_value_to_field_value(value)),
            Err(e) => Err(async_graphql::Error::new(e.to_string())),
        }
    }))
}

/// Lists stay lists of field values; objects ride as owned values the child
/// resolver downcasts; everything else converts directly.
pub(crate) fn const_value_to_field_value(value: ConstValue) -> FieldValue<'static> {
    match value {
        ConstValue::List(items) => {
            let values: Vec<FieldValue<'static>> =
                items.into_iter().map(const_value_to_field_value).collect();
            FieldValue::list(values)
        }
        ConstValue::Object(_) => FieldValue::owned_any(value),
        other => FieldValue::from(other),
    }
}

/// Resolver for synthesized connection machinery: reads one named field off
/// the parent object value.
pub(crate) fn access(
    name: &'static str,
) -> impl for<'b> Fn(ResolverContext<'b>) -> FieldFuture<'b> + Send + Sync + 'static {
    move |ctx| {
        FieldFuture::new(async move {
            let value = match ctx.parent_value.downcast_ref::<ConstValue>() {
                Some(ConstValue::Object(fields)) => {
                    fields.get(name).cloned().unwrap_or(ConstValue::Null)
                }
                _ => ConstValue::Null,
            };
            if value == ConstValue::Null {
                Ok(None)
            } else {
                Ok(Some(const_value_to_field_value(value)))
            }
        })
    }
}
