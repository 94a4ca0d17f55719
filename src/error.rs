use thiserror::Error;

/// Recoverable schema construction failures. Fixing the input type or
/// resolver declarations is the only recovery; a failed build leaves no
/// reusable state behind.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to build GraphQL schema: {message}")]
    Build { message: String },

    #[error("a query root is required")]
    MissingQueryRoot,

    #[error("no input type mapping for `{name}`")]
    UnknownInputType { name: String },

    #[error("paginated field `{field}` must resolve to a list of objects")]
    InvalidConnectionElement { field: String },

    #[error("paginated field `{field}` requires a registered resolver")]
    MissingConnectionResolver { field: String },

    #[error("field `{field}` on subscription root requires a stream resolver")]
    MissingStreamResolver { field: String },

    #[error("stream resolver registered for `{field}`, which is not on the subscription root")]
    StreamOutsideSubscription { field: String },
}

/// Invocation-time failures, kept distinct from domain errors a resolver
/// legitimately returns.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to decode arguments for `{field}`: {message}")]
    ArgumentDecode { field: String, message: String },

    #[error("connection resolver for `{field}` returned a non-list value")]
    ConnectionSource { field: String },

    #[error(transparent)]
    Domain(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

pub type Result<T> = std::result::Result<T, Error>;
