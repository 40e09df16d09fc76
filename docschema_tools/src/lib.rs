pub mod manifest;

pub use self::manifest::SchemaManifest;

use docschema_core::{
    compile::{SchemaCompiler, SchemaReport},
    query::action::SchemaAction,
    schema::TypeScope,
    AnyError,
};

/// Render operations in their JSON wire form, as a JSON array.
pub fn render_operations<'a, I>(actions: I) -> serde_json::Value
where
    I: IntoIterator<Item = &'a SchemaAction>,
{
    serde_json::Value::Array(
        actions
            .into_iter()
            .map(|action| action.to_expr().to_wire())
            .collect(),
    )
}

pub fn render_report(report: &SchemaReport) -> serde_json::Value {
    render_operations(report.actions.iter().map(|executed| &executed.action))
}

/// The effective name of every index in scope, as `(type name, index name)`.
pub fn index_names(
    scope: &TypeScope,
    compiler: &SchemaCompiler,
) -> Result<Vec<(String, String)>, AnyError> {
    let mut names = Vec::new();
    for decl in scope {
        let actions = compiler.plan(std::iter::once(decl))?;
        names.extend(actions.iter().filter_map(|action| match action {
            SchemaAction::IndexCreate(index) => Some((decl.type_name.clone(), index.name.clone())),
            SchemaAction::CollectionCreate(_) => None,
        }));
    }
    Ok(names)
}
