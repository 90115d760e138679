//! Entity derive macro implementation

mod attrs;

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

/// Storage family of a field type, mirrored by `myorm::FieldKind`.
#[derive(Clone, Copy)]
enum Kind {
    Text,
    Bool,
    Int,
    UInt,
    Float,
    Other,
}

impl Kind {
    fn of(ty: &syn::Type) -> Self {
        let syn::Type::Path(type_path) = ty else {
            return Kind::Other;
        };
        if type_path.qself.is_some() {
            return Kind::Other;
        }
        let Some(seg) = type_path.path.segments.last() else {
            return Kind::Other;
        };
        if !seg.arguments.is_empty() {
            return Kind::Other;
        }
        match seg.ident.to_string().as_str() {
            "String" => Kind::Text,
            "bool" => Kind::Bool,
            "i8" | "i16" | "i32" | "i64" | "isize" => Kind::Int,
            "u8" | "u16" | "u32" | "u64" | "usize" => Kind::UInt,
            "f32" | "f64" => Kind::Float,
            _ => Kind::Other,
        }
    }

    fn tokens(self) -> TokenStream {
        match self {
            Kind::Text => quote!(::myorm::FieldKind::Text),
            Kind::Bool => quote!(::myorm::FieldKind::Bool),
            Kind::Int => quote!(::myorm::FieldKind::Int),
            Kind::UInt => quote!(::myorm::FieldKind::UInt),
            Kind::Float => quote!(::myorm::FieldKind::Float),
            Kind::Other => quote!(::myorm::FieldKind::Other),
        }
    }
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity can only be derived for structs",
            ));
        }
    };

    let attrs = attrs::parse_entity_attrs(&input, name.to_string().to_snake_case())?;

    let mut defs = Vec::new();
    let mut value_arms = Vec::new();
    let mut set_arms = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ident_str = ident.to_string();
        let ident_str = ident_str.strip_prefix("r#").unwrap_or(&ident_str).to_string();
        let kind = Kind::of(&field.ty);
        let tags = attrs::parse_field_tags(field)?;

        let tag_pairs = tags.iter().map(|(k, v)| quote!((#k, #v)));
        let kind_tokens = kind.tokens();
        defs.push(quote! {
            ::myorm::FieldDef {
                ident: #ident_str,
                kind: #kind_tokens,
                tags: &[#(#tag_pairs),*],
            }
        });

        // Only fields persisted under the entity tag are read and written.
        let persisted = tags
            .iter()
            .any(|(k, v)| *k == attrs.tag && !v.is_empty());
        if !persisted {
            continue;
        }

        value_arms.push(quote! {
            #ident_str => ::core::option::Option::Some(
                ::myorm::Value::from(::core::clone::Clone::clone(&self.#ident)),
            ),
        });
        if !matches!(kind, Kind::Other) {
            set_arms.push(quote! {
                #ident_str => self.#ident = ::myorm::FromValue::from_value(value),
            });
        }
    }

    let table = &attrs.table;
    let database = &attrs.database;
    let auto_increment = &attrs.auto_increment;
    let tag = &attrs.tag;

    Ok(quote! {
        impl #impl_generics ::myorm::Entity for #name #ty_generics #where_clause {
            fn table_name(&self) -> &str {
                #table
            }

            fn database(&self) -> &str {
                #database
            }

            fn auto_increment_field(&self) -> &str {
                #auto_increment
            }

            fn field_tag(&self) -> &str {
                #tag
            }

            fn fields() -> &'static [::myorm::FieldDef] {
                const FIELDS: &[::myorm::FieldDef] = &[#(#defs),*];
                FIELDS
            }

            fn field_value(&self, ident: &str) -> ::core::option::Option<::myorm::Value> {
                match ident {
                    #(#value_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn set_field(&mut self, ident: &str, value: &::myorm::Value) {
                match ident {
                    #(#set_arms)*
                    _ => {}
                }
            }
        }
    })
}
