extern crate proc_macro;

use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, Fields, GenericArgument, Ident, LitStr, PathArguments,
    Type,
};

/// Scalar types with a storage mapping. Everything else is recorded as
/// unmapped and never persisted.
const STORABLE: &[&str] = &[
    "String", "char", "i8", "i16", "i32", "i64", "f32", "f64", "bool",
];

/// Implements `tagged_orm::Mapped` for a struct.
///
/// ```ignore
/// #[tagged(table_name = "Cities")]
/// #[derive(Debug, Default)]
/// pub struct City {
///     #[tagged(base)]
///     pub locality: Locality,
///     pub is_megapolis: bool,
/// }
/// ```
///
/// `#[tagged(key)]` marks a key field. `#[tagged(base)]` marks one embedded
/// struct, itself `#[tagged]`, whose fields are inherited after this type's
/// own. Without `table_name` the type has no table tag.
#[proc_macro_attribute]
pub fn tagged(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut table_name: Option<LitStr> = None;
    let table_parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("table_name") {
            table_name = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("expected `table_name = \"...\"`"))
        }
    });
    parse_macro_input!(attr with table_parser);

    let mut input = parse_macro_input!(item as DeriveInput);
    match expand(&mut input, table_name) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct FieldSpec {
    ident: Ident,
    ty: Type,
    key: bool,
    base: bool,
}

fn expand(input: &mut DeriveInput, table_name: Option<LitStr>) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[tagged] does not support generic structs",
        ));
    }
    let struct_name = input.ident.clone();

    let named = match &mut input.data {
        Data::Struct(s) => match &mut s.fields {
            Fields::Named(named) => named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &struct_name,
                    "#[tagged] needs a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &struct_name,
                "#[tagged] can only be used on structs",
            ));
        }
    };

    let mut specs = Vec::new();
    for field in named.named.iter_mut() {
        let mut key = false;
        let mut base = false;
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("tagged")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("key") {
                    key = true;
                    Ok(())
                } else if meta.path.is_ident("base") {
                    base = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `key` or `base`"))
                }
            })?;
        }
        field.attrs.retain(|a| !a.path().is_ident("tagged"));

        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new_spanned(&*field, "field must be named"))?;
        if key && base {
            return Err(syn::Error::new_spanned(
                &ident,
                "a field cannot be both `key` and `base`",
            ));
        }
        specs.push(FieldSpec {
            ident,
            ty: field.ty.clone(),
            key,
            base,
        });
    }

    let mut bases = specs.iter().filter(|s| s.base);
    let base = bases.next();
    if let Some(extra) = bases.next() {
        return Err(syn::Error::new_spanned(
            &extra.ident,
            "only one `base` field is allowed",
        ));
    }

    let fields = specs
        .iter()
        .filter(|s| !s.base)
        .map(|spec| field_tokens(&struct_name, spec));

    let extends = base.map(|spec| {
        let ident = &spec.ident;
        let ty = &spec.ty;
        quote! {
            .extends(
                <#ty as ::tagged_orm::Mapped>::descriptor()
                    .lift(|o: &#struct_name| &o.#ident, |o: &mut #struct_name| &mut o.#ident)
            )
        }
    });

    let table = table_name.map(|name| quote! { .table(#name) });
    let type_name = struct_name.to_string();

    Ok(quote! {
        #input

        impl ::tagged_orm::Mapped for #struct_name {
            fn descriptor() -> ::tagged_orm::TypeDescriptor<Self> {
                ::tagged_orm::TypeDescriptor::new(#type_name)
                    #table
                    #(#fields)*
                    #extends
            }
        }
    })
}

fn field_tokens(struct_name: &Ident, spec: &FieldSpec) -> TokenStream2 {
    let ident = &spec.ident;
    let ty = &spec.ty;
    let member = member_name(ident);

    if !is_storable(ty) {
        return quote! { .unmapped(#member, stringify!(#ty)) };
    }
    let method = if spec.key {
        quote! { key }
    } else {
        quote! { field }
    };
    quote! {
        .#method(#member, |o: &#struct_name| &o.#ident, |o: &mut #struct_name| &mut o.#ident)
    }
}

/// `is_megapolis` -> `isMegapolis`.
fn member_name(ident: &Ident) -> String {
    let raw = ident.to_string();
    raw.strip_prefix("r#").unwrap_or(&raw).to_case(Case::Camel)
}

fn is_storable(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    if path.qself.is_some() {
        return false;
    }
    let Some(segment) = path.path.segments.last() else {
        return false;
    };
    let name = segment.ident.to_string();
    match &segment.arguments {
        PathArguments::None => STORABLE.contains(&name.as_str()),
        PathArguments::AngleBracketed(args) if name == "Option" && args.args.len() == 1 => {
            matches!(args.args.first(), Some(GenericArgument::Type(inner)) if is_storable(inner))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(src: &str) -> Type {
        syn::parse_str(src).unwrap()
    }

    #[test]
    fn scalars_and_their_options_are_storable() {
        assert!(is_storable(&ty("String")));
        assert!(is_storable(&ty("std::string::String")));
        assert!(is_storable(&ty("Option<bool>")));
        assert!(is_storable(&ty("i16")));
    }

    #[test]
    fn containers_and_unknown_types_are_not() {
        assert!(!is_storable(&ty("Vec<String>")));
        assert!(!is_storable(&ty("u64")));
        assert!(!is_storable(&ty("Option<Vec<i32>>")));
        assert!(!is_storable(&ty("&'static str")));
    }

    #[test]
    fn member_names_are_camel_case() {
        let ident: Ident = syn::parse_str("is_megapolis").unwrap();
        assert_eq!(member_name(&ident), "isMegapolis");
        let ident: Ident = syn::parse_str("country").unwrap();
        assert_eq!(member_name(&ident), "country");
    }
}
