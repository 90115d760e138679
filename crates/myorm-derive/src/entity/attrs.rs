//! Attribute parsing for the Entity derive macro.
//!
//! Both struct-level and field-level `#[orm(...)]` attributes are comma-separated
//! `key = "value"` lists. Field keys are free-form tag names; struct keys are fixed.

use syn::ext::IdentExt;
use syn::{DeriveInput, Error, LitStr, Result};

/// One `key = "value"` pair.
pub(super) struct TagPair {
    pub key: syn::Ident,
    pub value: LitStr,
}

/// A parsed `#[orm(...)]` list.
pub(super) struct TagList(pub Vec<TagPair>);

impl syn::parse::Parse for TagList {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut pairs = Vec::new();
        while !input.is_empty() {
            // Accept keywords such as `type` as tag keys.
            let key = input.call(syn::Ident::parse_any)?;
            let _: syn::Token![=] = input.parse()?;
            let value: LitStr = input.parse()?;
            pairs.push(TagPair { key, value });

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }
        Ok(TagList(pairs))
    }
}

/// Struct-level settings.
pub(super) struct EntityAttrs {
    pub table: String,
    pub database: String,
    pub auto_increment: String,
    pub tag: String,
}

fn orm_lists(attrs: &[syn::Attribute]) -> Result<Vec<TagPair>> {
    let mut out = Vec::new();
    for attr in attrs {
        if attr.path().is_ident("orm") {
            let TagList(pairs) = attr.parse_args::<TagList>()?;
            out.extend(pairs);
        }
    }
    Ok(out)
}

/// Parse `#[orm(table = "..", database = "..", auto_increment = "..", tag = "..")]`.
pub(super) fn parse_entity_attrs(input: &DeriveInput, default_table: String) -> Result<EntityAttrs> {
    let mut attrs = EntityAttrs {
        table: default_table,
        database: String::new(),
        auto_increment: String::new(),
        tag: "db".to_string(),
    };

    for pair in orm_lists(&input.attrs)? {
        let value = pair.value.value();
        let key = pair.key.unraw().to_string();
        match key.as_str() {
            "table" => attrs.table = non_empty(&pair.value, value, "table")?,
            "database" => attrs.database = value,
            "auto_increment" => attrs.auto_increment = value,
            "tag" => attrs.tag = non_empty(&pair.value, value, "tag")?,
            other => {
                return Err(Error::new(
                    pair.key.span(),
                    format!(
                        "unknown entity attribute `{other}` (expected table, database, auto_increment or tag)"
                    ),
                ));
            }
        }
    }

    Ok(attrs)
}

/// Parse every `#[orm(key = "..")]` pair on a field.
pub(super) fn parse_field_tags(field: &syn::Field) -> Result<Vec<(String, String)>> {
    let mut tags: Vec<(String, String)> = Vec::new();
    for pair in orm_lists(&field.attrs)? {
        let key = pair.key.unraw().to_string();
        if tags.iter().any(|(k, _)| *k == key) {
            return Err(Error::new(
                pair.key.span(),
                format!("duplicate tag `{key}` on field"),
            ));
        }
        tags.push((key, pair.value.value().trim().to_string()));
    }
    Ok(tags)
}

fn non_empty(lit: &LitStr, value: String, what: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(Error::new(lit.span(), format!("{what} must not be empty")));
    }
    Ok(value.trim().to_string())
}
