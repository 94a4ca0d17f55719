use syn::{Data, DeriveInput, Fields, LitStr, Meta, Visibility};

pub struct ParsedStruct {
    pub ident: syn::Ident,
    /// `true` when the struct carries `#[graphql(resolvers)]`, meaning the
    /// `Resolvers` impl is written by hand instead of generated empty.
    pub hand_written_resolvers: bool,
    pub fields: Vec<ParsedField>,
}

pub struct ParsedField {
    pub ident: syn::Ident,
    pub ty: syn::Type,
    pub public: bool,
    pub tag: String,
    pub relay: Option<String>,
}

pub struct ParsedEnum {
    pub ident: syn::Ident,
    pub variants: Vec<ParsedVariant>,
}

pub struct ParsedVariant {
    pub ident: syn::Ident,
    pub value: String,
}

pub fn parse_struct(input: &DeriveInput) -> syn::Result<ParsedStruct> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Reflect can only be derived for structs",
        ));
    };

    let mut hand_written_resolvers = false;
    for attr in &input.attrs {
        if !attr.path().is_ident("graphql") {
            continue;
        }
        let flag: syn::Ident = attr.parse_args()?;
        if flag == "resolvers" {
            hand_written_resolvers = true;
        } else {
            return Err(syn::Error::new_spanned(
                attr,
                "unsupported struct-level graphql attribute; expected `resolvers`",
            ));
        }
    }

    let fields = match &data.fields {
        Fields::Named(named) => named
            .named
            .iter()
            .map(parse_field)
            .collect::<syn::Result<Vec<_>>>()?,
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Reflect requires named fields",
            ));
        }
    };

    Ok(ParsedStruct {
        ident: input.ident.clone(),
        hand_written_resolvers,
        fields,
    })
}

fn parse_field(field: &syn::Field) -> syn::Result<ParsedField> {
    let ident = field
        .ident
        .clone()
        .expect("named fields always carry an ident");

    let mut tag = String::new();
    let mut relay = None;
    for attr in &field.attrs {
        if attr.path().is_ident("graphql") {
            tag = attr.parse_args::<LitStr>()?.value();
        } else if attr.path().is_ident("relay") {
            relay = Some(match &attr.meta {
                Meta::Path(_) => String::new(),
                _ => attr.parse_args::<LitStr>()?.value(),
            });
        }
    }

    Ok(ParsedField {
        ident,
        ty: field.ty.clone(),
        public: matches!(field.vis, Visibility::Public(_)),
        tag,
        relay,
    })
}

pub fn parse_enum(input: &DeriveInput) -> syn::Result<ParsedEnum> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "ReflectEnum can only be derived for enums",
        ));
    };

    let mut variants = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "ReflectEnum requires unit variants",
            ));
        }
        variants.push(ParsedVariant {
            ident: variant.ident.clone(),
            value: to_screaming_snake(&variant.ident.to_string()),
        });
    }

    Ok(ParsedEnum {
        ident: input.ident.clone(),
        variants,
    })
}

fn to_screaming_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = c.is_lowercase();
        out.extend(c.to_uppercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screaming_snake_values() {
        assert_eq!(to_screaming_snake("Active"), "ACTIVE");
        assert_eq!(to_screaming_snake("InProgress"), "IN_PROGRESS");
        assert_eq!(to_screaming_snake("HTTPError"), "HTTPERROR");
    }

    #[test]
    fn parses_field_attributes() {
        let input: DeriveInput = syn::parse_quote! {
            struct User {
                pub id: Id,
                #[graphql("nonull,alias=emailAddress")]
                pub email: String,
                #[relay("key=id")]
                pub friends: Vec<User>,
                secret: String,
            }
        };
        let parsed = parse_struct(&input).unwrap();
        assert_eq!(parsed.fields.len(), 4);
        assert_eq!(parsed.fields[1].tag, "nonull,alias=emailAddress");
        assert_eq!(parsed.fields[2].relay.as_deref(), Some("key=id"));
        assert!(parsed.fields[2].public);
        assert!(!parsed.fields[3].public);
    }

    #[test]
    fn bare_relay_attribute_is_empty_config() {
        let input: DeriveInput = syn::parse_quote! {
            struct Query {
                #[relay]
                pub items: Vec<Item>,
            }
        };
        let parsed = parse_struct(&input).unwrap();
        assert_eq!(parsed.fields[0].relay.as_deref(), Some(""));
    }

    #[test]
    fn struct_level_resolvers_flag() {
        let input: DeriveInput = syn::parse_quote! {
            #[graphql(resolvers)]
            struct Query {
                pub hello: String,
            }
        };
        assert!(parse_struct(&input).unwrap().hand_written_resolvers);
    }

    #[test]
    fn tuple_structs_are_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            struct Wrapper(String);
        };
        assert!(parse_struct(&input).is_err());
    }

    #[test]
    fn enum_with_payload_is_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            enum Status { Ok, Failed(String) }
        };
        assert!(parse_enum(&input).is_err());
    }
}
