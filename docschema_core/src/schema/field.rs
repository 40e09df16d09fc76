use anyhow::bail;

use crate::AnyError;

/// A member of a declared type that can be used in indexes.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FieldDecl {
    /// The member identifier in code.
    pub member: String,
    /// The name the field is stored under, if it differs from the member.
    #[serde(default)]
    pub alias: Option<String>,
}

impl FieldDecl {
    pub fn new(member: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The externally visible field name.
    pub fn external_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.member)
    }
}

/// Mapping from member identifiers to stored field names.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(try_from = "Vec<FieldDecl>", into = "Vec<FieldDecl>")]
pub struct FieldMap {
    fields: Vec<FieldDecl>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields<I>(fields: I) -> Result<Self, AnyError>
    where
        I: IntoIterator<Item = FieldDecl>,
    {
        let mut map = Self::new();
        for field in fields {
            map.insert(field)?;
        }
        Ok(map)
    }

    /// Add a field.
    ///
    /// Fails if the member is already declared, the alias is empty, or the
    /// external name clashes with another field.
    pub fn insert(&mut self, field: FieldDecl) -> Result<(), AnyError> {
        if field.member.is_empty() {
            bail!("Invalid field: member name is empty");
        }
        if field.alias.as_deref() == Some("") {
            bail!("Invalid field '{}': alias is empty", field.member);
        }
        if self.get(&field.member).is_some() {
            bail!("Field '{}' is declared more than once", field.member);
        }
        let external = field.external_name();
        if let Some(other) = self.fields.iter().find(|f| f.external_name() == external) {
            bail!(
                "Fields '{}' and '{}' are both stored as '{}'",
                other.member,
                field.member,
                external
            );
        }

        self.fields.push(field);
        Ok(())
    }

    pub fn get(&self, member: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.member == member)
    }

    /// The declared alias of a member, if any.
    pub fn alias(&self, member: &str) -> Option<&str> {
        self.get(member).and_then(|f| f.alias.as_deref())
    }

    /// The external name of a member: its alias, or the member name itself.
    pub fn resolve<'a>(&'a self, member: &'a str) -> &'a str {
        self.alias(member).unwrap_or(member)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDecl> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl TryFrom<Vec<FieldDecl>> for FieldMap {
    type Error = AnyError;

    fn try_from(fields: Vec<FieldDecl>) -> Result<Self, Self::Error> {
        Self::from_fields(fields)
    }
}

impl From<FieldMap> for Vec<FieldDecl> {
    fn from(map: FieldMap) -> Self {
        map.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_alias() {
        let fields = FieldMap::from_fields([
            FieldDecl::new("first_name").with_alias("FirstName"),
            FieldDecl::new("age"),
        ])
        .unwrap();

        assert_eq!(fields.resolve("first_name"), "FirstName");
        assert_eq!(fields.resolve("age"), "age");
        assert_eq!(fields.resolve("unknown"), "unknown");
        assert_eq!(fields.alias("age"), None);
    }

    #[test]
    fn test_rejects_clashing_external_names() {
        let err = FieldMap::from_fields([
            FieldDecl::new("name"),
            FieldDecl::new("title").with_alias("name"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("both stored as 'name'"));

        assert!(FieldMap::from_fields([FieldDecl::new("a"), FieldDecl::new("a")]).is_err());
        assert!(FieldMap::from_fields([FieldDecl::new("a").with_alias("")]).is_err());
    }
}
