use proc_macro2::TokenStream;
use quote::quote;

use super::parse::{ParsedEnum, ParsedStruct};

pub fn generate_struct(parsed: &ParsedStruct) -> TokenStream {
    let ident = &parsed.ident;
    let name = ident.to_string();

    let field_specs: Vec<TokenStream> = parsed
        .fields
        .iter()
        .map(|field| {
            let field_name = field.ident.to_string();
            let public = field.public;
            let tag = &field.tag;
            let relay = match &field.relay {
                Some(relay) => quote! { ::core::option::Option::Some(#relay) },
                None => quote! { ::core::option::Option::None },
            };
            let ty = &field.ty;
            quote! {
                ::structql::FieldSpec {
                    name: #field_name,
                    public: #public,
                    tag: #tag,
                    relay: #relay,
                    shape: <#ty as ::structql::GraphValue>::shape,
                }
            }
        })
        .collect();

    let field_idents: Vec<&syn::Ident> = parsed.fields.iter().map(|f| &f.ident).collect();
    let field_names: Vec<String> = field_idents.iter().map(|i| i.to_string()).collect();

    let resolvers_impl = if parsed.hand_written_resolvers {
        quote! {}
    } else {
        quote! {
            impl ::structql::Resolvers for #ident {}
        }
    };

    quote! {
        impl ::structql::Reflect for #ident {
            fn describe() -> ::structql::TypeSpec {
                let mut map = ::structql::ResolverMap::<#ident>::new();
                <#ident as ::structql::Resolvers>::resolvers(&mut map);
                ::structql::TypeSpec {
                    name: #name,
                    fields: ::std::vec![#(#field_specs),*],
                    resolvers: map.into_table(),
                }
            }
        }

        #resolvers_impl

        impl ::structql::GraphValue for #ident {
            fn shape() -> ::structql::Shape {
                ::structql::Shape::Aggregate {
                    name: #name,
                    describe: <#ident as ::structql::Reflect>::describe,
                }
            }
        }

        impl ::structql::ToConstValue for #ident {
            fn to_const_value(&self) -> ::structql::ConstValue {
                let mut object = ::structql::__private::IndexMap::new();
                #(
                    object.insert(
                        ::structql::__private::Name::new(#field_names),
                        ::structql::ToConstValue::to_const_value(&self.#field_idents),
                    );
                )*
                ::structql::ConstValue::Object(object)
            }
        }

        impl ::structql::FromConstValue for #ident {
            fn from_const_value(
                value: &::structql::ConstValue,
            ) -> ::core::result::Result<Self, ::std::string::String> {
                let object = match value {
                    ::structql::ConstValue::Object(object) => {
                        ::core::option::Option::Some(object)
                    }
                    // Absent parents and sparse argument maps decode through
                    // each field's own null handling.
                    ::structql::ConstValue::Null => ::core::option::Option::None,
                    _ => {
                        return ::core::result::Result::Err(::std::format!(
                            "expected object for `{}`",
                            #name
                        ))
                    }
                };
                let null = ::structql::ConstValue::Null;
                ::core::result::Result::Ok(Self {
                    #(
                        #field_idents: ::structql::FromConstValue::from_const_value(
                            object
                                .and_then(|o| o.get(#field_names))
                                .unwrap_or(&null),
                        )
                        .map_err(|e| {
                            ::std::format!("field `{}`: {}", #field_names, e)
                        })?,
                    )*
                })
            }
        }
    }
}

pub fn generate_enum(parsed: &ParsedEnum) -> TokenStream {
    let ident = &parsed.ident;
    let name = ident.to_string();
    let variant_idents: Vec<&syn::Ident> = parsed.variants.iter().map(|v| &v.ident).collect();
    let values: Vec<&String> = parsed.variants.iter().map(|v| &v.value).collect();

    quote! {
        impl ::structql::ReflectEnum for #ident {
            const NAME: &'static str = #name;

            fn variants() -> &'static [&'static str] {
                &[#(#values),*]
            }
        }

        impl ::structql::GraphValue for #ident {
            fn shape() -> ::structql::Shape {
                ::structql::Shape::Atom { name: #name }
            }
        }

        impl ::structql::ToConstValue for #ident {
            fn to_const_value(&self) -> ::structql::ConstValue {
                let value = match self {
                    #(Self::#variant_idents => #values,)*
                };
                ::structql::ConstValue::Enum(::structql::__private::Name::new(value))
            }
        }

        impl ::structql::FromConstValue for #ident {
            fn from_const_value(
                value: &::structql::ConstValue,
            ) -> ::core::result::Result<Self, ::std::string::String> {
                let text = match value {
                    ::structql::ConstValue::Enum(name) => name.as_str(),
                    ::structql::ConstValue::String(s) => s.as_str(),
                    _ => {
                        return ::core::result::Result::Err(::std::format!(
                            "expected enum value for `{}`",
                            #name
                        ))
                    }
                };
                match text {
                    #(#values => ::core::result::Result::Ok(Self::#variant_idents),)*
                    other => ::core::result::Result::Err(::std::format!(
                        "unknown value `{}` for `{}`",
                        other,
                        #name
                    )),
                }
            }
        }
    }
}
