use std::collections::BTreeSet;

use inflector::Inflector;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ext::IdentExt, parse::Parse};

const COLLECTION_USAGE: &str = "Invalid #[collection(...)] key: expected one of \
    name, ttl_days, history_days, no_history, data, permissions, extends, rename_all";

const INDEX_USAGE: &str = "Invalid #[index(...)] key: expected one of \
    name, terms, values, unique, serialized, data, permissions";

const FIELD_USAGE: &str = "Invalid #[field(...)] key: expected #[field(name = \"...\")] or #[field(skip)]";

#[derive(Clone, Copy)]
enum RenameRule {
    Pascal,
    Camel,
    Snake,
    Kebab,
    ScreamingSnake,
}

impl RenameRule {
    fn from_lit(lit: &syn::LitStr) -> syn::Result<Self> {
        match lit.value().as_str() {
            "PascalCase" => Ok(Self::Pascal),
            "camelCase" => Ok(Self::Camel),
            "snake_case" => Ok(Self::Snake),
            "kebab-case" => Ok(Self::Kebab),
            "SCREAMING_SNAKE_CASE" => Ok(Self::ScreamingSnake),
            other => Err(syn::Error::new(
                lit.span(),
                format!("Unknown rename rule '{other}'"),
            )),
        }
    }

    fn apply(self, name: &str) -> String {
        match self {
            Self::Pascal => name.to_pascal_case(),
            Self::Camel => name.to_camel_case(),
            Self::Snake => name.to_snake_case(),
            Self::Kebab => name.to_kebab_case(),
            Self::ScreamingSnake => name.to_screaming_snake_case(),
        }
    }
}

#[derive(Default)]
struct CollectionAttrs {
    /// Whether the attribute declares collection metadata.
    declared: bool,
    name: Option<syn::LitStr>,
    ttl_days: Option<u32>,
    history_days: Option<u32>,
    no_history: bool,
    data: Option<syn::LitStr>,
    permissions: Option<syn::LitStr>,
    extends: Option<syn::Path>,
    rename_all: Option<RenameRule>,
}

impl Parse for CollectionAttrs {
    fn parse(outer: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut attrs = CollectionAttrs::default();

        // Bare `#[collection]`.
        if outer.is_empty() {
            attrs.declared = true;
            return Ok(attrs);
        }

        let input;
        syn::parenthesized!(input in outer);
        if input.is_empty() {
            attrs.declared = true;
        }

        while !input.is_empty() {
            let key: syn::Ident = input.parse()?;

            match key.to_string().as_str() {
                "name" => {
                    input.parse::<syn::token::Eq>()?;
                    attrs.name = Some(input.parse()?);
                    attrs.declared = true;
                }
                "ttl_days" => {
                    input.parse::<syn::token::Eq>()?;
                    attrs.ttl_days = Some(input.parse::<syn::LitInt>()?.base10_parse()?);
                    attrs.declared = true;
                }
                "history_days" => {
                    input.parse::<syn::token::Eq>()?;
                    attrs.history_days = Some(input.parse::<syn::LitInt>()?.base10_parse()?);
                    attrs.declared = true;
                }
                "no_history" => {
                    attrs.no_history = true;
                    attrs.declared = true;
                }
                "data" => {
                    input.parse::<syn::token::Eq>()?;
                    attrs.data = Some(parse_json_object(&input)?);
                    attrs.declared = true;
                }
                "permissions" => {
                    input.parse::<syn::token::Eq>()?;
                    attrs.permissions = Some(parse_json_object(&input)?);
                    attrs.declared = true;
                }
                "extends" => {
                    input.parse::<syn::token::Eq>()?;
                    attrs.extends = Some(input.parse()?);
                }
                "rename_all" => {
                    input.parse::<syn::token::Eq>()?;
                    attrs.rename_all = Some(RenameRule::from_lit(&input.parse()?)?);
                }
                _other => return Err(syn::Error::new(key.span(), COLLECTION_USAGE)),
            }

            if !input.is_empty() {
                input.parse::<syn::token::Comma>()?;
            }
        }

        if attrs.no_history && attrs.history_days.is_some() {
            return Err(input.error("history_days and no_history are mutually exclusive"));
        }

        Ok(attrs)
    }
}

struct IndexAttrs {
    name: Option<syn::LitStr>,
    terms: Vec<syn::Ident>,
    values: Vec<syn::Ident>,
    unique: bool,
    serialized: Option<bool>,
    data: Option<syn::LitStr>,
    permissions: Option<syn::LitStr>,
}

impl Parse for IndexAttrs {
    fn parse(outer: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut attrs = IndexAttrs {
            name: None,
            terms: Vec::new(),
            values: Vec::new(),
            unique: false,
            serialized: None,
            data: None,
            permissions: None,
        };
        if outer.is_empty() {
            return Ok(attrs);
        }

        let input;
        syn::parenthesized!(input in outer);

        while !input.is_empty() {
            let key: syn::Ident = input.parse()?;

            match key.to_string().as_str() {
                "name" => {
                    input.parse::<syn::token::Eq>()?;
                    attrs.name = Some(input.parse()?);
                }
                "terms" => {
                    input.parse::<syn::token::Eq>()?;
                    attrs.terms = parse_element_list(&input)?;
                }
                "values" => {
                    input.parse::<syn::token::Eq>()?;
                    attrs.values = parse_element_list(&input)?;
                }
                "unique" => {
                    attrs.unique = parse_flag(&input)?;
                }
                "serialized" => {
                    attrs.serialized = Some(parse_flag(&input)?);
                }
                "data" => {
                    input.parse::<syn::token::Eq>()?;
                    attrs.data = Some(parse_json_object(&input)?);
                }
                "permissions" => {
                    input.parse::<syn::token::Eq>()?;
                    attrs.permissions = Some(parse_json_object(&input)?);
                }
                _other => return Err(syn::Error::new(key.span(), INDEX_USAGE)),
            }

            if !input.is_empty() {
                input.parse::<syn::token::Comma>()?;
            }
        }

        Ok(attrs)
    }
}

#[derive(Default)]
struct FieldAttrs {
    alias: Option<syn::LitStr>,
    skip: bool,
}

impl Parse for FieldAttrs {
    fn parse(outer: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut attrs = FieldAttrs::default();

        let input;
        syn::parenthesized!(input in outer);

        while !input.is_empty() {
            let key: syn::Ident = input.parse()?;

            match key.to_string().as_str() {
                "name" => {
                    input.parse::<syn::token::Eq>()?;
                    attrs.alias = Some(input.parse()?);
                }
                "skip" => {
                    attrs.skip = true;
                }
                _other => return Err(syn::Error::new(key.span(), FIELD_USAGE)),
            }

            if !input.is_empty() {
                input.parse::<syn::token::Comma>()?;
            }
        }

        Ok(attrs)
    }
}

/// A bare flag, or `flag = true|false`.
fn parse_flag(input: syn::parse::ParseStream) -> syn::Result<bool> {
    if input.peek(syn::token::Eq) {
        input.parse::<syn::token::Eq>()?;
        Ok(input.parse::<syn::LitBool>()?.value)
    } else {
        Ok(true)
    }
}

fn parse_element_list(input: syn::parse::ParseStream) -> syn::Result<Vec<syn::Ident>> {
    let content;
    syn::bracketed!(content in input);
    let items = content.parse_terminated::<syn::Ident, syn::token::Comma>(syn::Ident::parse)?;
    Ok(items.into_iter().collect())
}

/// Parse a string literal and make sure it holds a JSON object.
fn parse_json_object(input: syn::parse::ParseStream) -> syn::Result<syn::LitStr> {
    let lit: syn::LitStr = input.parse()?;
    match serde_json::from_str::<serde_json::Value>(&lit.value()) {
        Ok(serde_json::Value::Object(_)) => Ok(lit),
        Ok(other) => Err(syn::Error::new(
            lit.span(),
            format!("Expected a JSON object, got {other}"),
        )),
        Err(err) => Err(syn::Error::new(lit.span(), format!("Invalid JSON: {err}"))),
    }
}

enum Element {
    Term(proc_macro2::TokenStream),
    Ordering { reverse: bool },
}

const MARKERS: &[&str] = &["Ref", "Ts", "Reverse", "Default"];

fn resolve_element(ident: &syn::Ident, members: &BTreeSet<String>) -> syn::Result<Element> {
    let name = ident.to_string();
    if MARKERS.contains(&name.as_str()) && members.contains(&name) {
        return Err(syn::Error::new(
            ident.span(),
            format!("Ambiguous index element '{name}': a field has the same name as the marker"),
        ));
    }

    let element = match name.as_str() {
        "Ref" => Element::Term(quote!(docschema::schema::TermElement::SelfRef)),
        "Ts" => Element::Term(quote!(docschema::schema::TermElement::Timestamp)),
        "Reverse" => Element::Ordering { reverse: true },
        "Default" => Element::Ordering { reverse: false },
        _ => {
            let member = ident.unraw().to_string();
            if !members.contains(&member) {
                return Err(syn::Error::new(
                    ident.span(),
                    format!("Unknown field '{member}': not a declared field of this type"),
                ));
            }
            Element::Term(quote!(docschema::schema::TermElement::field(#member)))
        }
    };
    Ok(element)
}

fn index_tokens(
    attrs: IndexAttrs,
    members: &BTreeSet<String>,
) -> syn::Result<proc_macro2::TokenStream> {
    let mut index = quote!(docschema::schema::IndexDescriptor::new());

    if let Some(name) = &attrs.name {
        index = quote!(#index.with_name(#name));
    }

    for ident in &attrs.terms {
        match resolve_element(ident, members)? {
            Element::Term(term) => index = quote!(#index.with_term(#term)),
            Element::Ordering { .. } => {
                return Err(syn::Error::new(
                    ident.span(),
                    "Ordering modifiers are only allowed in values",
                ));
            }
        }
    }

    let mut values: Vec<(proc_macro2::TokenStream, bool)> = Vec::new();
    let mut modified = true;
    for ident in &attrs.values {
        match resolve_element(ident, members)? {
            Element::Term(term) => {
                values.push((term, false));
                modified = false;
            }
            Element::Ordering { reverse } => match values.last_mut() {
                Some(last) if !modified => {
                    last.1 = reverse;
                    modified = true;
                }
                _ => {
                    return Err(syn::Error::new(
                        ident.span(),
                        "Ordering modifier does not follow a value",
                    ));
                }
            },
        }
    }
    for (term, reverse) in values {
        let value = if reverse {
            quote!(docschema::schema::ValueElement::new(#term).reversed())
        } else {
            quote!(docschema::schema::ValueElement::new(#term))
        };
        index = quote!(#index.with_value(#value));
    }

    if attrs.unique {
        index = quote!(#index.with_unique(true));
    }
    if let Some(serialized) = attrs.serialized {
        index = quote!(#index.with_serialized(#serialized));
    }
    if let Some(data) = &attrs.data {
        index = quote!(#index.with_data_json(#data)?);
    }
    if let Some(permissions) = &attrs.permissions {
        index = quote!(#index.with_permissions_json(#permissions)?);
    }

    Ok(index)
}

fn collection_tokens(attrs: &CollectionAttrs) -> proc_macro2::TokenStream {
    let mut collection = match &attrs.name {
        Some(name) => quote!(docschema::schema::CollectionDescriptor::new(#name)),
        None => quote!(docschema::schema::CollectionDescriptor::new(Self::TYPE_NAME)),
    };

    if let Some(days) = attrs.ttl_days {
        collection = quote!(#collection.with_ttl_days(#days));
    }
    if let Some(days) = attrs.history_days {
        collection = quote!(#collection.with_history_days(Some(#days)));
    }
    if attrs.no_history {
        collection = quote!(#collection.with_history_days(None));
    }
    if let Some(data) = &attrs.data {
        collection = quote!(#collection.with_data_json(#data)?);
    }
    if let Some(permissions) = &attrs.permissions {
        collection = quote!(#collection.with_permissions_json(#permissions)?);
    }

    collection
}

pub fn derive_collection(tokens: TokenStream) -> TokenStream {
    let input: syn::DeriveInput = match syn::parse(tokens) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error().into(),
    };

    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &syn::DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_body = match &input.data {
        syn::Data::Struct(s) => s,
        _other => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "#[derive(Collection)] can only be used on structs",
            ));
        }
    };

    let mut collection_attrs = super::find_attrs(&input.attrs, "collection");
    let struct_attrs: CollectionAttrs = match collection_attrs.next() {
        Some(attr) => syn::parse2(attr.tokens.clone())?,
        None => CollectionAttrs::default(),
    };
    if let Some(extra) = collection_attrs.next() {
        return Err(syn::Error::new_spanned(
            extra,
            "Only one #[collection(...)] attribute is allowed",
        ));
    }

    // Stored fields: (member, alias).
    let mut fields = Vec::new();
    match &struct_body.fields {
        syn::Fields::Named(named) => {
            for field in &named.named {
                let mut field_attrs = FieldAttrs::default();
                for attr in super::find_attrs(&field.attrs, "field") {
                    let parsed: FieldAttrs = syn::parse2(attr.tokens.clone())?;
                    field_attrs.skip |= parsed.skip;
                    if parsed.alias.is_some() {
                        field_attrs.alias = parsed.alias;
                    }
                }
                if field_attrs.skip {
                    continue;
                }

                let member = match &field.ident {
                    Some(ident) => ident.unraw().to_string(),
                    None => continue,
                };
                let alias = match (field_attrs.alias, struct_attrs.rename_all) {
                    (Some(alias), _) => Some(alias.value()),
                    (None, Some(rule)) => Some(rule.apply(&member)).filter(|a| *a != member),
                    (None, None) => None,
                };
                fields.push((member, alias));
            }
        }
        syn::Fields::Unit => {}
        syn::Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "#[derive(Collection)] can only be used on structs with named fields",
            ));
        }
    }

    let members = fields
        .iter()
        .map(|(member, _)| member.clone())
        .collect::<BTreeSet<_>>();

    let field_decls = fields.iter().map(|(member, alias)| match alias {
        Some(alias) => quote! {
            docschema::schema::FieldDecl::new(#member).with_alias(#alias)
        },
        None => quote! {
            docschema::schema::FieldDecl::new(#member)
        },
    });

    let indexes = super::find_attrs(&input.attrs, "index")
        .map(|attr| {
            let attrs: IndexAttrs = syn::parse2(attr.tokens.clone())?;
            index_tokens(attrs, &members)
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let base = struct_attrs.extends.as_ref().map(|path| {
        quote! {
            .with_base(<#path as docschema::schema::Declared>::TYPE_NAME)
        }
    });
    let collection = if struct_attrs.declared {
        let collection = collection_tokens(&struct_attrs);
        Some(quote!(.with_collection(#collection)))
    } else {
        None
    };

    let struct_ident = &input.ident;
    let type_name = struct_ident.unraw().to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics docschema::schema::Declared for #struct_ident #ty_generics #where_clause {
            const TYPE_NAME: &'static str = #type_name;

            fn declare() -> ::std::result::Result<docschema::schema::TypeDecl, docschema::AnyError> {
                let decl = docschema::schema::TypeDecl::new(Self::TYPE_NAME)
                    #base
                    #( .with_field(#field_decls)? )*
                    #collection
                    #( .with_index(#indexes) )*;
                decl.validate()?;
                Ok(decl)
            }
        }
    })
}
