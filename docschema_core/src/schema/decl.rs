use std::borrow::Cow;

use anyhow::Context;

use crate::{error::UnresolvableFieldError, AnyError};

use super::{
    validate_collection, validate_index_name, CollectionDescriptor, FieldDecl, FieldMap,
    IndexDescriptor,
};

/// Static schema metadata of a Rust type.
///
/// This trait should generally not be implemented manually.
/// A custom derive is available: `#[derive(Collection)]`.
pub trait Declared {
    /// The name of the declaring type.
    const TYPE_NAME: &'static str;

    /// Build and validate the declaration.
    fn declare() -> Result<TypeDecl, AnyError>;
}

/// A declared type: its fields, collection and indexes.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct TypeDecl {
    pub type_name: String,
    /// The type this one directly derives from.
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub fields: FieldMap,
    /// Collection metadata. Absent when the type was not annotated.
    #[serde(default)]
    pub collection: Option<CollectionDescriptor>,
    #[serde(default)]
    pub indexes: Vec<IndexDescriptor>,
}

impl TypeDecl {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            base: None,
            fields: FieldMap::new(),
            collection: None,
            indexes: Vec::new(),
        }
    }

    /// The declaration of a statically declared type.
    pub fn of<T: Declared>() -> Result<Self, AnyError> {
        T::declare().with_context(|| format!("Invalid declaration of type '{}'", T::TYPE_NAME))
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_field(mut self, field: FieldDecl) -> Result<Self, AnyError> {
        self.fields.insert(field)?;
        Ok(self)
    }

    pub fn with_fields<I>(mut self, fields: I) -> Result<Self, AnyError>
    where
        I: IntoIterator<Item = FieldDecl>,
    {
        for field in fields {
            self.fields.insert(field)?;
        }
        Ok(self)
    }

    pub fn with_collection(mut self, collection: CollectionDescriptor) -> Self {
        self.collection = Some(collection);
        self
    }

    pub fn with_index(mut self, index: IndexDescriptor) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn collection_metadata(&self) -> Option<&CollectionDescriptor> {
        self.collection.as_ref()
    }

    /// The collection metadata, or defaults named after the type.
    pub fn effective_collection(&self) -> Cow<'_, CollectionDescriptor> {
        match &self.collection {
            Some(collection) => Cow::Borrowed(collection),
            None => Cow::Owned(CollectionDescriptor::new(self.type_name.as_str())),
        }
    }

    /// Indexes in declaration order.
    pub fn index_metadata(&self) -> &[IndexDescriptor] {
        &self.indexes
    }

    pub fn field_alias(&self, member: &str) -> Option<&str> {
        self.fields.alias(member)
    }

    /// The stored name of a member.
    pub fn resolve_field_alias<'a>(&'a self, member: &'a str) -> &'a str {
        self.fields.resolve(member)
    }

    /// Ensure a member is declared on this type.
    pub fn require_field(&self, member: &str) -> Result<&FieldDecl, AnyError> {
        self.fields
            .get(member)
            .ok_or_else(|| UnresolvableFieldError::new(&self.type_name, member).into())
    }

    pub fn validate(&self) -> Result<(), AnyError> {
        if self.type_name.is_empty() {
            anyhow::bail!("Invalid type declaration: type name is empty");
        }
        validate_collection(&self.effective_collection())?;

        for index in &self.indexes {
            // An empty name is treated like a missing one.
            if let Some(name) = index.name.as_deref().filter(|n| !n.is_empty()) {
                validate_index_name(name)?;
            }
            for member in index.field_members() {
                self.require_field(member)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{TermElement, ValueElement};

    use super::*;

    fn person() -> TypeDecl {
        TypeDecl::new("Person")
            .with_fields([
                FieldDecl::new("first_name").with_alias("FirstName"),
                FieldDecl::new("age"),
            ])
            .unwrap()
    }

    #[test]
    fn test_resolve_field_alias() {
        let decl = person();
        assert_eq!(decl.resolve_field_alias("first_name"), "FirstName");
        assert_eq!(decl.field_alias("first_name"), Some("FirstName"));

        // Members without an alias, and unknown members, resolve verbatim.
        assert_eq!(decl.resolve_field_alias("age"), "age");
        assert_eq!(decl.field_alias("age"), None);
        assert_eq!(decl.resolve_field_alias("unknown"), "unknown");
    }

    #[test]
    fn test_validate_rejects_undeclared_index_members() {
        let decl = person().with_index(
            IndexDescriptor::new()
                .with_term(TermElement::field("first_name"))
                .with_value(ValueElement::field("height")),
        );
        let err = decl.validate().unwrap_err();
        assert_eq!(err.downcast_ref::<UnresolvableFieldError>().unwrap().member, "height");
    }

    #[test]
    fn test_validate_treats_empty_index_name_as_absent() {
        let decl = person().with_index(IndexDescriptor::new().with_name(""));
        decl.validate().unwrap();

        let decl = person().with_index(IndexDescriptor::new().with_name("sets"));
        assert!(decl.validate().is_err());
    }
}
