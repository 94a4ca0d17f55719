mod codegen;
mod parse;

use proc_macro2::TokenStream;
use syn::DeriveInput;

pub fn expand_struct(input: DeriveInput) -> syn::Result<TokenStream> {
    let parsed = parse::parse_struct(&input)?;
    Ok(codegen::generate_struct(&parsed))
}

pub fn expand_enum(input: DeriveInput) -> syn::Result<TokenStream> {
    let parsed = parse::parse_enum(&input)?;
    Ok(codegen::generate_enum(&parsed))
}
