//! Schema manifests: type declarations written in YAML or JSON.
//!
//! ```yaml
//! options:
//!   include_base: false
//! types:
//!   - name: Person
//!     base: Entity
//!     fields:
//!       - last_name
//!       - { member: first_name, alias: FirstName }
//!     collection:
//!       name: people
//!       ttl_days: 30
//!       permissions: '{"read": true}'
//!     indexes:
//!       - terms: [last_name]
//!         values: [first_name, "@reverse", "@ts"]
//! ```
//!
//! Index elements are member names or one of the markers `@ref` and `@ts`.
//! In values, `@reverse` and `@default` set the ordering of the element
//! right before them.

use std::path::Path;

use anyhow::Context;
use docschema_core::{
    compile::CompileOptions,
    schema::{
        parse_json_object, CollectionDescriptor, FieldDecl, IndexDescriptor, JsonObject, Ordering,
        SequenceItem, TermElement, TypeDecl, TypeScope, ValueElement,
    },
    AnyError,
};

const MARKER_REF: &str = "@ref";
const MARKER_TS: &str = "@ts";
const MARKER_REVERSE: &str = "@reverse";
const MARKER_DEFAULT: &str = "@default";

#[derive(serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SchemaManifest {
    #[serde(default)]
    pub options: CompileOptions,
    pub types: Vec<TypeManifest>,
}

#[derive(serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TypeManifest {
    pub name: String,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldManifest>,
    /// Absent for types without collection metadata.
    #[serde(default)]
    pub collection: Option<CollectionManifest>,
    #[serde(default)]
    pub indexes: Vec<IndexManifest>,
}

#[derive(serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum FieldManifest {
    Plain(String),
    Aliased { member: String, alias: String },
}

/// A JSON object given inline or as JSON text.
#[derive(serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum JsonManifest {
    Object(JsonObject),
    Text(String),
}

impl JsonManifest {
    fn to_object(&self, property: &str) -> Result<JsonObject, AnyError> {
        match self {
            Self::Object(map) => Ok(map.clone()),
            Self::Text(text) => parse_json_object(property, text),
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CollectionManifest {
    /// Defaults to the type name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ttl_days: Option<u32>,
    #[serde(default)]
    pub history_days: Option<u32>,
    /// Leave history retention to the database.
    #[serde(default)]
    pub no_history: bool,
    #[serde(default)]
    pub data: Option<JsonManifest>,
    #[serde(default)]
    pub permissions: Option<JsonManifest>,
}

fn default_serialized() -> bool {
    true
}

#[derive(serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IndexManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub terms: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default = "default_serialized")]
    pub serialized: bool,
    #[serde(default)]
    pub data: Option<JsonManifest>,
    #[serde(default)]
    pub permissions: Option<JsonManifest>,
}

impl SchemaManifest {
    pub fn from_yaml(contents: &str) -> Result<Self, AnyError> {
        let de = serde_yaml::Deserializer::from_str(contents);
        let manifest = serde_path_to_error::deserialize(de)?;
        Ok(manifest)
    }

    pub fn from_json(contents: &str) -> Result<Self, AnyError> {
        let de = &mut serde_json::Deserializer::from_str(contents);
        let manifest = serde_path_to_error::deserialize(de)?;
        Ok(manifest)
    }

    /// Load a manifest file. `.json` files are read as JSON, everything
    /// else as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnyError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read file '{}'", path.display()))?;

        let is_json = path.extension().map(|ext| ext == "json").unwrap_or(false);
        let manifest = if is_json {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        };
        manifest.with_context(|| format!("Invalid manifest '{}'", path.display()))
    }

    /// Build the declared types, in manifest order.
    pub fn to_scope(&self) -> Result<TypeScope, AnyError> {
        let mut scope = TypeScope::new();
        for ty in &self.types {
            let decl = ty
                .to_decl()
                .with_context(|| format!("Invalid declaration of type '{}'", ty.name))?;
            scope.insert(decl)?;
        }
        tracing::debug!(types = scope.types().len(), "loaded schema manifest");
        Ok(scope)
    }
}

impl TypeManifest {
    pub fn to_decl(&self) -> Result<TypeDecl, AnyError> {
        let mut decl = TypeDecl::new(self.name.as_str());
        if let Some(base) = &self.base {
            decl = decl.with_base(base.as_str());
        }

        for field in &self.fields {
            let field = match field {
                FieldManifest::Plain(member) => FieldDecl::new(member.as_str()),
                FieldManifest::Aliased { member, alias } => {
                    FieldDecl::new(member.as_str()).with_alias(alias.as_str())
                }
            };
            decl = decl.with_field(field)?;
        }

        if let Some(collection) = &self.collection {
            decl = decl.with_collection(collection.to_descriptor(&self.name)?);
        }

        for (position, index) in self.indexes.iter().enumerate() {
            let index = index
                .to_descriptor()
                .with_context(|| format!("Invalid index at position {position}"))?;
            decl = decl.with_index(index);
        }

        Ok(decl)
    }
}

impl CollectionManifest {
    fn to_descriptor(&self, type_name: &str) -> Result<CollectionDescriptor, AnyError> {
        if self.no_history && self.history_days.is_some() {
            anyhow::bail!("history_days and no_history are mutually exclusive");
        }

        let name = self.name.as_deref().unwrap_or(type_name);
        let mut collection = CollectionDescriptor::new(name);
        if let Some(days) = self.ttl_days {
            collection = collection.with_ttl_days(days);
        }
        if let Some(days) = self.history_days {
            collection = collection.with_history_days(Some(days));
        }
        if self.no_history {
            collection = collection.with_history_days(None);
        }
        if let Some(data) = &self.data {
            collection = collection.with_data(data.to_object("data")?);
        }
        if let Some(permissions) = &self.permissions {
            collection = collection.with_permissions(permissions.to_object("permissions")?);
        }
        Ok(collection)
    }
}

impl IndexManifest {
    fn to_descriptor(&self) -> Result<IndexDescriptor, AnyError> {
        let terms = self
            .terms
            .iter()
            .map(|term| match parse_item(term)? {
                SequenceItem::Element(element) => Ok(element),
                SequenceItem::Ordering(_) => Err(anyhow::anyhow!(
                    "Ordering marker '{term}' is only allowed in values"
                )),
            })
            .collect::<Result<Vec<_>, AnyError>>()?;
        let values = ValueElement::from_sequence(
            self.values
                .iter()
                .map(|v| parse_item(v))
                .collect::<Result<Vec<_>, _>>()?,
        )?;

        let mut index = IndexDescriptor::new()
            .with_terms(terms)
            .with_values(values)
            .with_unique(self.unique)
            .with_serialized(self.serialized);
        if let Some(name) = &self.name {
            index = index.with_name(name.as_str());
        }
        if let Some(data) = &self.data {
            index = index.with_data(data.to_object("data")?);
        }
        if let Some(permissions) = &self.permissions {
            index = index.with_permissions(permissions.to_object("permissions")?);
        }
        Ok(index)
    }
}

fn parse_item(item: &str) -> Result<SequenceItem, AnyError> {
    let parsed = match item {
        MARKER_REF => SequenceItem::Element(TermElement::SelfRef),
        MARKER_TS => SequenceItem::Element(TermElement::Timestamp),
        MARKER_REVERSE => SequenceItem::Ordering(Ordering::Reverse),
        MARKER_DEFAULT => SequenceItem::Ordering(Ordering::Default),
        other if other.starts_with('@') => anyhow::bail!("Unknown marker '{other}'"),
        member => SequenceItem::Element(TermElement::field(member)),
    };
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use docschema_core::error::{DanglingOrderingError, UnresolvableFieldError};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const PEOPLE: &str = r#"
options:
  include_base: true
types:
  - name: Entity
  - name: Person
    base: Entity
    fields:
      - age
      - { member: first_name, alias: FirstName }
      - { member: last_name, alias: LastName }
    collection:
      name: people
      ttl_days: 30
      permissions: '{"read": true}'
    indexes:
      - terms: [last_name]
        values: [first_name, age, "@reverse", "@ts"]
      - name: people_by_ref
        terms: ["@ref"]
        unique: true
        serialized: false
        data:
          purpose: lookup
  - name: Company
    base: Entity
    collection:
      no_history: true
"#;

    #[test]
    fn test_load_yaml_manifest() {
        let manifest = SchemaManifest::from_yaml(PEOPLE).unwrap();
        assert!(manifest.options.include_base);
        assert!(!manifest.options.skip_undeclared);

        let scope = manifest.to_scope().unwrap();
        let person = scope.require("Person").unwrap();

        let expected = TypeDecl::new("Person")
            .with_base("Entity")
            .with_fields([
                FieldDecl::new("age"),
                FieldDecl::new("first_name").with_alias("FirstName"),
                FieldDecl::new("last_name").with_alias("LastName"),
            ])
            .unwrap()
            .with_collection(
                CollectionDescriptor::new("people")
                    .with_ttl_days(30)
                    .with_permissions_json(r#"{"read": true}"#)
                    .unwrap(),
            )
            .with_index(
                IndexDescriptor::new()
                    .with_term(TermElement::field("last_name"))
                    .with_value(ValueElement::field("first_name"))
                    .with_value(ValueElement::field("age").reversed())
                    .with_value(TermElement::Timestamp),
            )
            .with_index(
                IndexDescriptor::new()
                    .with_name("people_by_ref")
                    .with_term(TermElement::SelfRef)
                    .with_unique(true)
                    .with_serialized(false)
                    .with_data_json(r#"{"purpose": "lookup"}"#)
                    .unwrap(),
            );
        assert_eq!(person, &expected);

        let company = scope.require("Company").unwrap();
        let collection = company.collection_metadata().unwrap();
        assert_eq!(collection.name, "Company");
        assert_eq!(collection.history_days, None);

        assert!(scope.require("Entity").unwrap().collection_metadata().is_none());
    }

    #[test]
    fn test_load_json_manifest() {
        let contents = json!({
            "types": [{
                "name": "Tag",
                "fields": ["label"],
                "collection": {"data": {"kind": "tags"}},
                "indexes": [{"terms": ["label"]}]
            }]
        })
        .to_string();

        let manifest = SchemaManifest::from_json(&contents).unwrap();
        assert_eq!(manifest.options, CompileOptions::default());

        let scope = manifest.to_scope().unwrap();
        let tag = scope.require("Tag").unwrap();
        assert_eq!(
            tag.collection_metadata().unwrap().data.as_ref().unwrap()["kind"],
            json!("tags")
        );
        assert!(tag.index_metadata()[0].serialized);
    }

    #[test]
    fn test_errors_carry_the_path() {
        let err = SchemaManifest::from_yaml("types:\n  - name: A\n    colection: {}\n").unwrap_err();
        assert!(err.to_string().starts_with("types[0]"), "{err}");
    }

    #[test]
    fn test_invalid_index_elements() {
        let manifest = SchemaManifest::from_yaml(
            "types:\n  - name: A\n    fields: [x]\n    indexes:\n      - values: [\"@reverse\", x]\n",
        )
        .unwrap();
        let err = manifest.to_scope().unwrap_err();
        assert!(err.root_cause().is::<DanglingOrderingError>(), "{err:?}");

        let manifest = SchemaManifest::from_yaml(
            "types:\n  - name: A\n    indexes:\n      - terms: [missing]\n",
        )
        .unwrap();
        let err = manifest.to_scope().unwrap_err();
        assert!(err.root_cause().is::<UnresolvableFieldError>(), "{err:?}");

        let manifest = SchemaManifest::from_yaml(
            "types:\n  - name: A\n    indexes:\n      - terms: [\"@reverse\"]\n",
        )
        .unwrap();
        assert!(manifest.to_scope().is_err());
    }
}
