use crate::resolver::{ResolverMap, ResolverTable};

/// Build-time description of one structural type: its name, ordered fields,
/// and the resolver table bound to it. Produced fresh per call (usually by
/// `#[derive(Reflect)]`) and consumed during a single schema build.
pub struct TypeSpec {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
    pub resolvers: ResolverTable,
}

/// One declared field. `tag` and `relay` carry the raw comma-separated token
/// strings from the field attributes; parsing happens during extraction so
/// unknown tokens stay forward compatible.
pub struct FieldSpec {
    pub name: &'static str,
    pub public: bool,
    pub tag: &'static str,
    pub relay: Option<&'static str>,
    pub shape: fn() -> Shape,
}

/// The shape of a value as the mapper sees it. Function-pointer thunks keep
/// element and aggregate descriptions lazy so mutually-recursive and
/// self-referential types terminate.
#[derive(Clone, Copy)]
pub enum Shape {
    /// A leaf candidate, resolved against the scalar and enum registries by
    /// its runtime type name.
    Atom { name: &'static str },
    /// An optional wrapper around an inner shape.
    Optional { inner: fn() -> Shape },
    /// A sequence of elements.
    List { element: fn() -> Shape },
    /// A structural aggregate with its own description.
    Aggregate {
        name: &'static str,
        describe: fn() -> TypeSpec,
    },
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Atom { name } => write!(f, "Atom({name})"),
            Shape::Optional { inner } => write!(f, "Optional({:?})", inner()),
            Shape::List { element } => write!(f, "List({:?})", element()),
            Shape::Aggregate { name, .. } => write!(f, "Aggregate({name})"),
        }
    }
}

/// A type that can describe itself to the schema builder. Usually derived.
pub trait Reflect: Sized {
    fn describe() -> TypeSpec;
}

/// Resolver registration for a reflected type, keyed by field name. The
/// derive generates an empty impl unless the struct opts out with
/// `#[graphql(resolvers)]`, in which case the impl is written by hand.
pub trait Resolvers: Sized {
    fn resolvers(map: &mut ResolverMap<Self>) {
        let _ = map;
    }
}

/// A closed value set exposed as a GraphQL enum. Usually derived for unit
/// enums; values are conventionally SCREAMING_SNAKE.
pub trait ReflectEnum: Sized {
    const NAME: &'static str;

    fn variants() -> &'static [&'static str];
}
