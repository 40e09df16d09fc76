extern crate proc_macro;

use proc_macro::TokenStream;

mod collection;

/// Find all attributes with the format `#[<name>(...)]`.
fn find_attrs<'a>(
    attrs: &'a [syn::Attribute],
    name: &'a str,
) -> impl Iterator<Item = &'a syn::Attribute> {
    attrs.iter().filter(move |attr| attr.path.is_ident(name))
}

/// Derive `docschema::schema::Declared`.
///
/// ```ignore
/// #[derive(Collection)]
/// #[collection(name = "people", ttl_days = 30, rename_all = "PascalCase")]
/// #[index(terms = [last_name], values = [first_name, age, Reverse])]
/// #[index(name = "people_by_ref", terms = [Ref], unique)]
/// struct Person {
///     first_name: String,
///     last_name: String,
///     #[field(name = "Years")]
///     age: u32,
///     #[field(skip)]
///     cached: bool,
/// }
/// ```
///
/// Without a `#[collection]` attribute, or with one that only holds
/// `extends` and `rename_all`, the type has no collection metadata.
#[proc_macro_derive(Collection, attributes(collection, index, field))]
pub fn derive_collection(tokens: TokenStream) -> TokenStream {
    collection::derive_collection(tokens)
}
