use docschema::{
    schema::{
        CollectionDescriptor, Declared, FieldDecl, IndexDescriptor, TermElement, TypeDecl,
        ValueElement,
    },
    Collection,
};
use serde_json::json;

#[derive(Collection)]
struct Entity;

#[derive(Collection)]
#[collection(name = "people", ttl_days = 7, extends = Entity, rename_all = "PascalCase")]
#[index(terms = [last_name], values = [first_name, age, Reverse])]
#[index(name = "people_by_ref", terms = [Ref], values = [Ts, Default], unique, serialized = false)]
#[allow(dead_code)]
struct Person {
    first_name: String,
    last_name: String,
    #[field(name = "Years")]
    age: u32,
    #[field(skip)]
    cached: bool,
}

#[derive(Collection)]
#[collection(
    no_history,
    data = r#"{"label": "Companies"}"#,
    permissions = r#"{"read": true}"#
)]
#[index(values = [r#type], data = r#"{"kind": "lookup"}"#)]
#[allow(dead_code)]
struct Company {
    r#type: String,
}

#[derive(Collection)]
#[collection(extends = Person)]
#[allow(dead_code)]
struct Employee {
    badge: u32,
}

#[test]
fn test_derive_without_collection_attribute() {
    let decl = TypeDecl::of::<Entity>().unwrap();
    assert_eq!(Entity::TYPE_NAME, "Entity");
    assert_eq!(decl, TypeDecl::new("Entity"));
}

#[test]
fn test_derive_collection() {
    let expected = TypeDecl::new("Person")
        .with_base("Entity")
        .with_fields([
            FieldDecl::new("first_name").with_alias("FirstName"),
            FieldDecl::new("last_name").with_alias("LastName"),
            FieldDecl::new("age").with_alias("Years"),
        ])
        .unwrap()
        .with_collection(CollectionDescriptor::new("people").with_ttl_days(7))
        .with_index(
            IndexDescriptor::new()
                .with_term(TermElement::field("last_name"))
                .with_value(ValueElement::field("first_name"))
                .with_value(ValueElement::field("age").reversed()),
        )
        .with_index(
            IndexDescriptor::new()
                .with_name("people_by_ref")
                .with_term(TermElement::SelfRef)
                .with_value(TermElement::Timestamp)
                .with_unique(true)
                .with_serialized(false),
        );

    assert_eq!(Person::declare().unwrap(), expected);
}

#[test]
fn test_derive_json_literals_and_raw_identifiers() {
    let decl = TypeDecl::of::<Company>().unwrap();

    let collection = decl.collection_metadata().unwrap();
    assert_eq!(collection.name, "Company");
    assert_eq!(collection.history_days, None);
    assert_eq!(collection.data.as_ref().unwrap()["label"], json!("Companies"));
    assert_eq!(collection.permissions.as_ref().unwrap()["read"], json!(true));

    let index = &decl.index_metadata()[0];
    assert_eq!(index.values, vec![ValueElement::field("type")]);
    assert_eq!(index.data.as_ref().unwrap()["kind"], json!("lookup"));
}

#[test]
fn test_derive_extends_without_collection_metadata() {
    let decl = TypeDecl::of::<Employee>().unwrap();
    assert_eq!(decl.base.as_deref(), Some("Person"));
    assert!(decl.collection_metadata().is_none());
    assert_eq!(decl.effective_collection().name, "Employee");
}
