mod reflect;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the reflection machinery for a struct: `Reflect`, `GraphValue`,
/// `ToConstValue` and `FromConstValue`, plus an empty `Resolvers` impl
/// unless the struct opts out with `#[graphql(resolvers)]`.
///
/// Field attributes:
/// - `#[graphql("nonull,alias=name,description=\"...\"")]` carries the
///   extraction tokens for the field.
/// - `#[relay]` or `#[relay("key=id,method=String")]` marks the field
///   paginated.
#[proc_macro_derive(Reflect, attributes(graphql, relay))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match reflect::expand_struct(input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

/// Derives `ReflectEnum` (plus value conversions) for a unit enum. Variant
/// values render as SCREAMING_SNAKE.
#[proc_macro_derive(ReflectEnum, attributes(graphql))]
pub fn derive_reflect_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match reflect::expand_enum(input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}
