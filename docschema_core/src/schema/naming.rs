//! Index name derivation.
//!
//! Indexes declared without a name get one built from their values and
//! terms: `<values>_by_<terms>`, eg. `FirstName_by_LastName`.
//!
//! * field elements contribute their external (aliased) name
//! * the own reference contributes the collection name
//! * the timestamp contributes `ts`
//! * a reversed value is followed by a `reverse` token
//!
//! Without values the collection name is used for the value part.
//! Without terms the name ends in a bare `_by`.

use super::{CollectionDescriptor, FieldMap, IndexDescriptor, TermElement};

const BY: &str = "_by";
const SEPARATOR: &str = "_";
const TIMESTAMP_TOKEN: &str = "ts";
const REVERSE_TOKEN: &str = "reverse";

/// Derive the name of an index that was declared without one.
///
/// Deterministic: the same inputs always produce the same name.
pub fn derive_index_name(
    collection: &CollectionDescriptor,
    index: &IndexDescriptor,
    fields: &FieldMap,
) -> String {
    let mut name = value_segment(collection, index, fields);

    name.push_str(BY);
    for term in &index.terms {
        name.push_str(SEPARATOR);
        name.push_str(element_token(collection, term, fields));
    }

    name
}

fn value_segment(
    collection: &CollectionDescriptor,
    index: &IndexDescriptor,
    fields: &FieldMap,
) -> String {
    if index.values.is_empty() {
        return collection.name.clone();
    }

    let mut tokens = Vec::with_capacity(index.values.len());
    for value in &index.values {
        tokens.push(element_token(collection, &value.term, fields));
        if value.ordering.is_reverse() {
            tokens.push(REVERSE_TOKEN);
        }
    }
    tokens.join(SEPARATOR)
}

fn element_token<'a>(
    collection: &'a CollectionDescriptor,
    element: &'a TermElement,
    fields: &'a FieldMap,
) -> &'a str {
    match element {
        TermElement::Field(member) => fields.resolve(member),
        TermElement::SelfRef => &collection.name,
        TermElement::Timestamp => TIMESTAMP_TOKEN,
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{FieldDecl, ValueElement};

    use super::*;

    fn person() -> CollectionDescriptor {
        CollectionDescriptor::new("Person")
    }

    fn plain_fields() -> FieldMap {
        FieldMap::from_fields([
            FieldDecl::new("FirstName"),
            FieldDecl::new("LastName"),
            FieldDecl::new("Age"),
        ])
        .unwrap()
    }

    #[test]
    fn test_no_values_uses_collection_name() {
        let index = IndexDescriptor::new().with_term(TermElement::SelfRef);
        assert_eq!(
            derive_index_name(&person(), &index, &plain_fields()),
            "Person_by_Person"
        );
    }

    #[test]
    fn test_only_self_ref_value_uses_collection_name() {
        let index = IndexDescriptor::new()
            .with_value(TermElement::SelfRef)
            .with_term(TermElement::field("LastName"));
        assert_eq!(
            derive_index_name(&person(), &index, &plain_fields()),
            "Person_by_LastName"
        );
    }

    #[test]
    fn test_fields_values_and_terms() {
        let index = IndexDescriptor::new()
            .with_value(ValueElement::field("FirstName"))
            .with_term(TermElement::field("LastName"));
        assert_eq!(
            derive_index_name(&person(), &index, &plain_fields()),
            "FirstName_by_LastName"
        );
    }

    #[test]
    fn test_reverse_follows_its_value_and_empty_terms_end_in_by() {
        let index = IndexDescriptor::new().with_value(ValueElement::field("Age").reversed());
        assert_eq!(
            derive_index_name(&person(), &index, &plain_fields()),
            "Age_reverse_by"
        );
    }

    #[test]
    fn test_markers_and_multiple_elements() {
        let index = IndexDescriptor::new()
            .with_value(TermElement::Timestamp)
            .with_value(ValueElement::new(TermElement::SelfRef).reversed())
            .with_value(ValueElement::field("Age"))
            .with_term(TermElement::field("LastName"))
            .with_term(TermElement::Timestamp);
        assert_eq!(
            derive_index_name(&person(), &index, &plain_fields()),
            "ts_Person_reverse_Age_by_LastName_ts"
        );
    }

    #[test]
    fn test_aliases_are_used_for_fields() {
        let fields = FieldMap::from_fields([
            FieldDecl::new("first_name").with_alias("FirstName"),
            FieldDecl::new("last_name").with_alias("LastName"),
        ])
        .unwrap();
        let index = IndexDescriptor::new()
            .with_value(ValueElement::field("first_name"))
            .with_term(TermElement::field("last_name"));

        assert_eq!(
            derive_index_name(&person(), &index, &fields),
            "FirstName_by_LastName"
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let index = IndexDescriptor::new()
            .with_value(ValueElement::field("Age").reversed())
            .with_term(TermElement::field("FirstName"));
        let fields = plain_fields();

        let first = derive_index_name(&person(), &index, &fields);
        let second = derive_index_name(&person(), &index.clone(), &fields.clone());
        assert_eq!(first, second);
    }
}
