//! Driver conformance tests.
//!
//! Every driver should pass [`test_driver`]. Each test gets a fresh driver
//! from the provided factory.

use futures::{future::BoxFuture, FutureExt};

use crate::{
    compile::CompileOptions,
    db::Driver,
    error::DriverError,
    query::action::{OperationTarget, SchemaAction},
    schema::{
        CollectionDescriptor, FieldDecl, IndexDescriptor, TermElement, TypeDecl, TypeScope,
        ValueElement,
    },
    Db,
};

pub fn test_driver<D, F, S>(make_driver: F, spawner: S)
where
    D: Driver + Send + Sync + 'static,
    F: Fn() -> D + Send + 'static,
    S: Fn(BoxFuture<()>),
{
    spawner(test_all(make_driver).boxed());
}

macro_rules! run_tests {
    ( $make:expr, [ $( $name:ident , )* ] ) => {
        {
        $(
        eprintln!("Running test '{}' ...", stringify!($name));
        $name(Db::new(($make)())).await;
        )*
        }
    };
}

async fn test_all<D, F>(make_driver: F)
where
    D: Driver + Send + Sync + 'static,
    F: Fn() -> D + Send + 'static,
{
    run_tests!(
        make_driver,
        [
            test_creates_collection_before_its_indexes,
            test_rerun_fails_on_existing_collection,
            test_failure_aborts_remaining_operations,
            test_base_type_compiles_direct_subtypes,
            test_undeclared_type_gets_default_collection,
            test_unknown_base_compiles_nothing,
        ]
    );

    test_include_base(Db::new(make_driver()).with_options(CompileOptions {
        include_base: true,
        ..Default::default()
    }))
    .await;

    test_skip_undeclared(Db::new(make_driver()).with_options(CompileOptions {
        include_base: true,
        skip_undeclared: true,
    }))
    .await;
}

pub(crate) fn entity() -> TypeDecl {
    TypeDecl::new("Entity")
}

pub(crate) fn person() -> TypeDecl {
    TypeDecl::new("Person")
        .with_base("Entity")
        .with_fields([
            FieldDecl::new("first_name").with_alias("FirstName"),
            FieldDecl::new("last_name").with_alias("LastName"),
            FieldDecl::new("age"),
        ])
        .unwrap()
        .with_collection(CollectionDescriptor::new("people").with_ttl_days(7))
        .with_index(
            IndexDescriptor::new()
                .with_term(TermElement::field("last_name"))
                .with_value(ValueElement::field("first_name")),
        )
        .with_index(
            IndexDescriptor::new()
                .with_name("people_by_age")
                .with_value(ValueElement::field("age").reversed())
                .with_unique(true),
        )
}

pub(crate) fn company() -> TypeDecl {
    TypeDecl::new("Company")
        .with_base("Entity")
        .with_collection(CollectionDescriptor::new("companies").with_history_days(None))
        .with_index(IndexDescriptor::new().with_term(TermElement::SelfRef))
}

/// Derives from `Entity` only through `Person`.
pub(crate) fn employee() -> TypeDecl {
    TypeDecl::new("Employee").with_base("Person")
}

pub(crate) fn scope() -> TypeScope {
    let mut scope = TypeScope::new();
    for decl in [entity(), person(), company(), employee()] {
        scope.insert(decl).unwrap();
    }
    scope
}

fn collections(report: &crate::compile::SchemaReport) -> Vec<&str> {
    report.collection_names().collect()
}

fn indexes(report: &crate::compile::SchemaReport) -> Vec<&str> {
    report.index_names().collect()
}

async fn test_creates_collection_before_its_indexes(db: Db) {
    let types = [person(), company()];
    let report = db.create_schema(&types).await.unwrap();

    let targets = report
        .actions
        .iter()
        .map(|a| (a.type_name.as_str(), a.action.target()))
        .collect::<Vec<_>>();
    assert_eq!(
        targets,
        vec![
            ("Person", OperationTarget::Collection("people".into())),
            ("Person", OperationTarget::Index("FirstName_by_LastName".into())),
            ("Person", OperationTarget::Index("people_by_age".into())),
            ("Company", OperationTarget::Collection("companies".into())),
            ("Company", OperationTarget::Index("companies_by_companies".into())),
        ]
    );

    match &report.actions[0].action {
        SchemaAction::CollectionCreate(c) => {
            assert_eq!(c.ttl_days, Some(7));
            assert_eq!(c.history_days, Some(30));
        }
        other => panic!("expected a collection, got {other:?}"),
    }
    match &report.actions[2].action {
        SchemaAction::IndexCreate(i) => {
            assert_eq!(i.source, "people");
            assert!(i.unique);
            assert!(i.serialized);
            assert!(i.terms.is_empty());
            assert!(i.values[0].reverse);
        }
        other => panic!("expected an index, got {other:?}"),
    }
}

async fn test_rerun_fails_on_existing_collection(db: Db) {
    let types = [company()];
    db.create_schema(&types).await.unwrap();

    let err = db.create_schema(&types).await.unwrap_err();
    let err = err.downcast_ref::<DriverError>().unwrap();
    assert_eq!(err.type_name, "Company");
    assert_eq!(err.target, OperationTarget::Collection("companies".into()));
}

async fn test_failure_aborts_remaining_operations(db: Db) {
    // Clashes with the collection of `Company`.
    let clash = TypeDecl::new("Clash")
        .with_collection(CollectionDescriptor::new("companies"))
        .with_index(IndexDescriptor::new().with_name("clash_index"));

    let types = [company(), clash.clone()];
    let err = db.create_schema(&types).await.unwrap_err();
    let err = err.downcast_ref::<DriverError>().unwrap();
    assert_eq!(err.type_name, "Clash");
    assert_eq!(err.target, OperationTarget::Collection("companies".into()));

    // The index of the failed type was never attempted.
    let collection = clash.effective_collection();
    let index = crate::compile::compile_index(&clash, &collection, &clash.indexes[0]).unwrap();
    db.execute(index.to_expr()).await.unwrap();
}

async fn test_base_type_compiles_direct_subtypes(db: Db) {
    let scope = scope();
    let report = db.create_schema_for_base(&scope, "Entity").await.unwrap();

    assert_eq!(collections(&report), vec!["people", "companies"]);
    assert_eq!(
        indexes(&report),
        vec!["FirstName_by_LastName", "people_by_age", "companies_by_companies"]
    );
}

async fn test_undeclared_type_gets_default_collection(db: Db) {
    let scope = scope();
    let report = db.create_schema_for_base(&scope, "Person").await.unwrap();

    assert_eq!(collections(&report), vec!["Employee"]);
    match &report.actions[0].action {
        SchemaAction::CollectionCreate(c) => {
            assert_eq!(c.history_days, Some(30));
            assert_eq!(c.ttl_days, None);
        }
        other => panic!("expected a collection, got {other:?}"),
    }
}

async fn test_unknown_base_compiles_nothing(db: Db) {
    let report = db.create_schema_for_base(&scope(), "Missing").await.unwrap();
    assert!(report.is_empty());
}

async fn test_include_base(db: Db) {
    let scope = scope();
    let report = db.create_schema_for_base(&scope, "Entity").await.unwrap();
    assert_eq!(collections(&report), vec!["people", "companies", "Entity"]);

    let err = db.create_schema_for_base(&scope, "Missing").await.unwrap_err();
    assert!(err.to_string().contains("Type not found"));
}

async fn test_skip_undeclared(db: Db) {
    let scope = scope();
    let report = db.create_schema_for_base(&scope, "Entity").await.unwrap();
    // `Entity` itself has no collection metadata.
    assert_eq!(collections(&report), vec!["people", "companies"]);
}
