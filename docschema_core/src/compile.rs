//! Compilation of type declarations into schema operations.

use crate::{
    error::DriverError,
    query::{
        action::{CollectionCreate, IndexCreate, IndexField, IndexValue, SchemaAction},
        expr::Expr,
    },
    schema::{
        derive_index_name, validate_collection, validate_index_name, CollectionDescriptor,
        IndexDescriptor, TermElement, TypeDecl, TypeScope,
    },
    db::Driver,
    AnyError,
};

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct CompileOptions {
    /// Also create the base type's own collection when compiling by base type.
    /// The base type goes last.
    pub include_base: bool,
    /// Skip types without collection metadata instead of creating a default
    /// collection named after the type.
    pub skip_undeclared: bool,
}

/// Compile the collection of a type into a `create_collection` operation.
pub fn compile_collection(decl: &TypeDecl) -> Result<CollectionCreate, AnyError> {
    let collection = decl.effective_collection();
    validate_collection(&collection)?;

    Ok(CollectionCreate {
        name: collection.name.clone(),
        history_days: collection.history_days,
        ttl_days: collection.ttl_days,
        data: collection.data.clone(),
        permissions: collection.permissions.clone(),
    })
}

/// Compile an index of a type into a `create_index` operation.
pub fn compile_index(
    decl: &TypeDecl,
    collection: &CollectionDescriptor,
    index: &IndexDescriptor,
) -> Result<IndexCreate, AnyError> {
    let name = match &index.name {
        Some(name) if !name.is_empty() => {
            validate_index_name(name)?;
            name.clone()
        }
        _ => derive_index_name(collection, index, &decl.fields),
    };

    let terms = index
        .terms
        .iter()
        .map(|term| compile_field(decl, term))
        .collect::<Result<_, _>>()?;
    let values = index
        .values
        .iter()
        .map(|value| -> Result<_, AnyError> {
            Ok(IndexValue {
                field: compile_field(decl, &value.term)?,
                reverse: value.ordering.is_reverse(),
            })
        })
        .collect::<Result<_, _>>()?;

    Ok(IndexCreate {
        name,
        source: collection.name.clone(),
        terms,
        values,
        unique: index.unique,
        serialized: index.serialized,
        data: index.data.clone(),
        permissions: index.permissions.clone(),
    })
}

fn compile_field(decl: &TypeDecl, element: &TermElement) -> Result<IndexField, AnyError> {
    match element {
        TermElement::Field(member) => {
            decl.require_field(member)?;
            Ok(IndexField::Data(decl.resolve_field_alias(member).to_string()))
        }
        TermElement::SelfRef => Ok(IndexField::Ref),
        TermElement::Timestamp => Ok(IndexField::Ts),
    }
}

/// Compile all operations of a single type: its collection, then its indexes.
pub fn compile_type(decl: &TypeDecl) -> Result<Vec<SchemaAction>, AnyError> {
    let mut actions = vec![SchemaAction::CollectionCreate(compile_collection(decl)?)];
    let collection = decl.effective_collection();
    for index in decl.index_metadata() {
        actions.push(compile_index(decl, &collection, index)?.into());
    }
    Ok(actions)
}

/// An operation that was executed by the driver.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutedAction {
    pub type_name: String,
    pub action: SchemaAction,
    pub response: Expr,
}

/// The operations of a compilation pass, in execution order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchemaReport {
    pub actions: Vec<ExecutedAction>,
}

impl SchemaReport {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().filter_map(|a| match &a.action {
            SchemaAction::CollectionCreate(c) => Some(c.name.as_str()),
            SchemaAction::IndexCreate(_) => None,
        })
    }

    pub fn index_names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().filter_map(|a| match &a.action {
            SchemaAction::IndexCreate(i) => Some(i.name.as_str()),
            SchemaAction::CollectionCreate(_) => None,
        })
    }
}

/// Compiles type declarations and submits them to a [`Driver`].
///
/// Operations are executed strictly one after another: each collection,
/// followed by its indexes, type by type. The first failure aborts the
/// whole pass. Nothing is retried or skipped, so running against an
/// existing schema fails with the driver's error.
#[derive(Clone, Debug, Default)]
pub struct SchemaCompiler {
    options: CompileOptions,
}

impl SchemaCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self { options }
    }

    fn skips(&self, decl: &TypeDecl) -> bool {
        self.options.skip_undeclared && decl.collection.is_none()
    }

    /// Compile without executing anything.
    pub fn plan<'a, I>(&self, types: I) -> Result<Vec<SchemaAction>, AnyError>
    where
        I: IntoIterator<Item = &'a TypeDecl>,
    {
        let mut actions = Vec::new();
        for decl in types {
            if self.skips(decl) {
                continue;
            }
            actions.extend(compile_type(decl)?);
        }
        Ok(actions)
    }

    pub async fn compile_schema<'a, D, I>(
        &self,
        driver: &D,
        types: I,
    ) -> Result<SchemaReport, AnyError>
    where
        D: Driver + ?Sized,
        I: IntoIterator<Item = &'a TypeDecl>,
    {
        let mut report = SchemaReport::default();

        for decl in types {
            if self.skips(decl) {
                tracing::debug!(
                    type_name = %decl.type_name,
                    "skipping type without collection metadata"
                );
                continue;
            }

            let create = compile_collection(decl)?;
            let executed = submit(driver, decl, create.into()).await?;
            report.actions.push(executed);

            let collection = decl.effective_collection();
            for index in decl.index_metadata() {
                let create = compile_index(decl, &collection, index)?;
                let executed = submit(driver, decl, create.into()).await?;
                report.actions.push(executed);
            }
        }

        Ok(report)
    }

    /// The types compiled for a base type: its direct subtypes in scope
    /// order, followed by the base itself if [`CompileOptions::include_base`]
    /// is set.
    pub fn resolve_base<'a>(
        &self,
        scope: &'a TypeScope,
        base: &str,
    ) -> Result<Vec<&'a TypeDecl>, AnyError> {
        let mut types = scope.direct_subtypes(base);
        if self.options.include_base {
            types.push(scope.require(base)?);
        }
        Ok(types)
    }

    pub async fn compile_schema_for_base<D>(
        &self,
        driver: &D,
        scope: &TypeScope,
        base: &str,
    ) -> Result<SchemaReport, AnyError>
    where
        D: Driver + ?Sized,
    {
        let types = self.resolve_base(scope, base)?;
        tracing::debug!(base, count = types.len(), "compiling schema for base type");
        self.compile_schema(driver, types).await
    }
}

async fn submit<D>(
    driver: &D,
    decl: &TypeDecl,
    action: SchemaAction,
) -> Result<ExecutedAction, AnyError>
where
    D: Driver + ?Sized,
{
    let expr = action.to_expr();
    let target = action.target();

    tracing::debug!(
        type_name = %decl.type_name,
        operation = %target,
        "executing schema operation"
    );
    tracing::trace!(%expr, "schema operation");

    let response = driver
        .execute(expr)
        .await
        .map_err(|source| DriverError::new(decl.type_name.as_str(), target, source))?;

    Ok(ExecutedAction {
        type_name: decl.type_name.clone(),
        action,
        response,
    })
}
