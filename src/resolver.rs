use std::marker::PhantomData;
use std::sync::Arc;

use async_graphql_value::ConstValue;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use indexmap::IndexMap;

use crate::context::Ctx;
use crate::error::ResolveError;
use crate::pagination::PageArguments;
use crate::reflect::{Reflect, TypeSpec};
use crate::value::{FromConstValue, ToConstValue};

pub(crate) type PlainInvoke =
    Arc<dyn Fn(&Ctx<'_>, &ConstValue) -> Result<ConstValue, ResolveError> + Send + Sync>;

pub(crate) type PageInvoke = Arc<
    dyn Fn(&Ctx<'_>, &PageArguments, &ConstValue) -> Result<ConstValue, ResolveError>
        + Send
        + Sync,
>;

pub(crate) type EventStream = BoxStream<'static, Result<ConstValue, ResolveError>>;

pub(crate) type StreamInvoke =
    Arc<dyn Fn(&Ctx<'_>, &ConstValue) -> Result<EventStream, ResolveError> + Send + Sync>;

/// The argument contract a resolver declared at registration time. The
/// binder validates this against the field it is attached to.
#[derive(Clone, Copy)]
pub(crate) enum ArgStyle {
    /// Context only.
    None,
    /// Context plus one argument struct; its fields become the field's
    /// graph arguments.
    Structured(fn() -> TypeSpec),
    /// Context plus pagination arguments. Only legal on paginated fields.
    Page,
    /// Pagination arguments plus free-form extras. Only legal on paginated
    /// fields.
    PageWith(fn() -> TypeSpec),
}

#[derive(Clone)]
pub(crate) enum Invoke {
    Plain(PlainInvoke),
    Paginated(PageInvoke),
    Stream(StreamInvoke),
}

/// A registered resolver: its argument contract and the type-erased
/// callable. Safe to invoke repeatedly and concurrently; invocation reads
/// builder-owned state but never writes it.
#[derive(Clone)]
pub struct ResolverSpec {
    pub(crate) args: ArgStyle,
    pub(crate) invoke: Invoke,
}

/// Field-name-keyed resolver storage carried inside a `TypeSpec`.
#[derive(Default)]
pub struct ResolverTable {
    entries: IndexMap<&'static str, ResolverSpec>,
}

impl ResolverTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, field: &str) -> Option<&ResolverSpec> {
        self.entries.get(field)
    }

    pub(crate) fn insert(&mut self, field: &'static str, spec: ResolverSpec) {
        self.entries.insert(field, spec);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Typed registration surface for the resolvers of one parent type `P`.
///
/// Each registration method encodes one legal resolver signature; the
/// parent is re-decoded from the runtime source value on every invocation,
/// so per-instance state is respected. Results use `Result<T, E>`: the value
/// becomes the field value, the error propagates unchanged as a domain
/// error.
pub struct ResolverMap<P> {
    table: ResolverTable,
    _parent: PhantomData<fn() -> P>,
}

impl<P> Default for ResolverMap<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Parent values decode from whatever runtime value the executor hands us;
/// an absent or non-matching parent falls back to the zero value, mirroring
/// the zero-instance allocation used during build-time discovery.
fn decode_parent<P: FromConstValue + Default>(ctx: &Ctx<'_>) -> P {
    ctx.parent()
        .and_then(|v| P::from_const_value(v).ok())
        .unwrap_or_default()
}

impl<P> ResolverMap<P> {
    pub fn new() -> Self {
        Self {
            table: ResolverTable::new(),
            _parent: PhantomData,
        }
    }

    pub fn into_table(self) -> ResolverTable {
        self.table
    }

    /// Resolver taking only the resolution context.
    pub fn field<F, T, E>(&mut self, name: &'static str, f: F)
    where
        P: FromConstValue + Default,
        F: Fn(&P, &Ctx<'_>) -> Result<T, E> + Send + Sync + 'static,
        T: ToConstValue,
        E: Into<anyhow::Error>,
    {
        let invoke: PlainInvoke = Arc::new(move |ctx, _args| {
            let parent = decode_parent::<P>(ctx);
            f(&parent, ctx)
                .map(|v| v.to_const_value())
                .map_err(|e| ResolveError::Domain(e.into()))
        });
        self.table.insert(
            name,
            ResolverSpec {
                args: ArgStyle::None,
                invoke: Invoke::Plain(invoke),
            },
        );
    }

    /// Resolver taking a typed argument struct. The struct's fields become
    /// the field's graph arguments.
    pub fn field_with<A, F, T, E>(&mut self, name: &'static str, f: F)
    where
        P: FromConstValue + Default,
        A: Reflect + FromConstValue,
        F: Fn(&P, &Ctx<'_>, A) -> Result<T, E> + Send + Sync + 'static,
        T: ToConstValue,
        E: Into<anyhow::Error>,
    {
        let invoke: PlainInvoke = Arc::new(move |ctx, args| {
            let parent = decode_parent::<P>(ctx);
            let decoded = A::from_const_value(args).map_err(|message| {
                ResolveError::ArgumentDecode {
                    field: name.to_string(),
                    message,
                }
            })?;
            f(&parent, ctx, decoded)
                .map(|v| v.to_const_value())
                .map_err(|e| ResolveError::Domain(e.into()))
        });
        self.table.insert(
            name,
            ResolverSpec {
                args: ArgStyle::Structured(A::describe),
                invoke: Invoke::Plain(invoke),
            },
        );
    }

    /// Resolver for a paginated field. Returns the full candidate node list;
    /// slicing and cursor assembly happen in connection resolution.
    pub fn paginated<F, T, E>(&mut self, name: &'static str, f: F)
    where
        P: FromConstValue + Default,
        F: Fn(&P, &Ctx<'_>, &PageArguments) -> Result<Vec<T>, E> + Send + Sync + 'static,
        T: ToConstValue,
        E: Into<anyhow::Error>,
    {
        let invoke: PageInvoke = Arc::new(move |ctx, page, _args| {
            let parent = decode_parent::<P>(ctx);
            f(&parent, ctx, page)
                .map(|v| v.to_const_value())
                .map_err(|e| ResolveError::Domain(e.into()))
        });
        self.table.insert(
            name,
            ResolverSpec {
                args: ArgStyle::Page,
                invoke: Invoke::Paginated(invoke),
            },
        );
    }

    /// Paginated resolver with free-form extra arguments alongside the
    /// pagination set.
    pub fn paginated_with<A, F, T, E>(&mut self, name: &'static str, f: F)
    where
        P: FromConstValue + Default,
        A: Reflect + FromConstValue,
        F: Fn(&P, &Ctx<'_>, &PageArguments, A) -> Result<Vec<T>, E> + Send + Sync + 'static,
        T: ToConstValue,
        E: Into<anyhow::Error>,
    {
        let invoke: PageInvoke = Arc::new(move |ctx, page, args| {
            let parent = decode_parent::<P>(ctx);
            let decoded = A::from_const_value(args).map_err(|message| {
                ResolveError::ArgumentDecode {
                    field: name.to_string(),
                    message,
                }
            })?;
            f(&parent, ctx, page, decoded)
                .map(|v| v.to_const_value())
                .map_err(|e| ResolveError::Domain(e.into()))
        });
        self.table.insert(
            name,
            ResolverSpec {
                args: ArgStyle::PageWith(A::describe),
                invoke: Invoke::Paginated(invoke),
            },
        );
    }

    /// Streaming resolver for a subscription-root field.
    pub fn stream<F, S, T, E>(&mut self, name: &'static str, f: F)
    where
        P: FromConstValue + Default,
        F: Fn(&P, &Ctx<'_>) -> S + Send + Sync + 'static,
        S: Stream<Item = Result<T, E>> + Send + 'static,
        T: ToConstValue,
        E: Into<anyhow::Error>,
    {
        let invoke: StreamInvoke = Arc::new(move |ctx, _args| {
            let parent = decode_parent::<P>(ctx);
            let stream = f(&parent, ctx);
            Ok(stream
                .map(|item| {
                    item.map(|v| v.to_const_value())
                        .map_err(|e| ResolveError::Domain(e.into()))
                })
                .boxed())
        });
        self.table.insert(
            name,
            ResolverSpec {
                args: ArgStyle::None,
                invoke: Invoke::Stream(invoke),
            },
        );
    }

    /// Streaming resolver with a typed argument struct.
    pub fn stream_with<A, F, S, T, E>(&mut self, name: &'static str, f: F)
    where
        P: FromConstValue + Default,
        A: Reflect + FromConstValue,
        F: Fn(&P, &Ctx<'_>, A) -> S + Send + Sync + 'static,
        S: Stream<Item = Result<T, E>> + Send + 'static,
        T: ToConstValue,
        E: Into<anyhow::Error>,
    {
        let invoke: StreamInvoke = Arc::new(move |ctx, args| {
            let parent = decode_parent::<P>(ctx);
            let decoded = A::from_const_value(args).map_err(|message| {
                ResolveError::ArgumentDecode {
                    field: name.to_string(),
                    message,
                }
            })?;
            let stream = f(&parent, ctx, decoded);
            Ok(stream
                .map(|item| {
                    item.map(|v| v.to_const_value())
                        .map_err(|e| ResolveError::Domain(e.into()))
                })
                .boxed())
        });
        self.table.insert(
            name,
            ResolverSpec {
                args: ArgStyle::Structured(A::describe),
                invoke: Invoke::Stream(invoke),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestMetadata;
    use async_graphql::Name;
    use indexmap::indexmap;
    use std::convert::Infallible;

    #[derive(Default)]
    struct Widget {
        count: i64,
    }

    impl FromConstValue for Widget {
        fn from_const_value(value: &ConstValue) -> Result<Self, String> {
            match value {
                ConstValue::Object(obj) => Ok(Widget {
                    count: obj
                        .get("count")
                        .and_then(|v| i64::from_const_value(v).ok())
                        .unwrap_or_default(),
                }),
                _ => Err("expected object".to_string()),
            }
        }
    }

    #[test]
    fn plain_resolver_sees_runtime_parent() {
        let mut map = ResolverMap::<Widget>::new();
        map.field("count", |w: &Widget, _ctx| {
            Ok::<_, Infallible>(w.count * 2)
        });
        let table = map.into_table();

        let metadata = RequestMetadata::default();
        let parent = ConstValue::Object(indexmap! {
            Name::new("count") => ConstValue::Number(21.into()),
        });
        let ctx = Ctx::new(Some(&parent), None, &metadata);

        let spec = table.get("count").unwrap();
        let Invoke::Plain(invoke) = &spec.invoke else {
            panic!("expected plain invoke");
        };
        let out = invoke(&ctx, &ConstValue::Null).unwrap();
        assert_eq!(out, ConstValue::Number(42.into()));
    }

    #[test]
    fn missing_parent_decodes_to_zero_value() {
        let mut map = ResolverMap::<Widget>::new();
        map.field("count", |w: &Widget, _ctx| Ok::<_, Infallible>(w.count));
        let table = map.into_table();

        let metadata = RequestMetadata::default();
        let ctx = Ctx::new(None, None, &metadata);

        let spec = table.get("count").unwrap();
        let Invoke::Plain(invoke) = &spec.invoke else {
            panic!("expected plain invoke");
        };
        assert_eq!(
            invoke(&ctx, &ConstValue::Null).unwrap(),
            ConstValue::Number(0.into())
        );
    }

    #[test]
    fn domain_errors_propagate_unchanged() {
        let mut map = ResolverMap::<Widget>::new();
        map.field("count", |_w: &Widget, _ctx| -> Result<i64, anyhow::Error> {
            Err(anyhow::anyhow!("backend unavailable"))
        });
        let table = map.into_table();

        let metadata = RequestMetadata::default();
        let ctx = Ctx::new(None, None, &metadata);

        let spec = table.get("count").unwrap();
        let Invoke::Plain(invoke) = &spec.invoke else {
            panic!("expected plain invoke");
        };
        let err = invoke(&ctx, &ConstValue::Null).unwrap_err();
        assert!(matches!(err, ResolveError::Domain(_)));
        assert!(err.to_string().contains("backend unavailable"));
    }
}
