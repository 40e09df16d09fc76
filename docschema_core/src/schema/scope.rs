use anyhow::{anyhow, bail};

use crate::AnyError;

use super::{Declared, TypeDecl};

/// An ordered set of declared types.
///
/// Types are kept in registration order, which is the order they are
/// compiled in.
#[derive(Clone, Debug, Default)]
pub struct TypeScope {
    types: Vec<TypeDecl>,
}

impl TypeScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Declared>(&mut self) -> Result<(), AnyError> {
        self.insert(TypeDecl::of::<T>()?)
    }

    pub fn with_type<T: Declared>(mut self) -> Result<Self, AnyError> {
        self.register::<T>()?;
        Ok(self)
    }

    pub fn insert(&mut self, decl: TypeDecl) -> Result<(), AnyError> {
        if self.get(&decl.type_name).is_some() {
            bail!("Type already registered: '{}'", decl.type_name);
        }
        decl.validate()?;
        self.types.push(decl);
        Ok(())
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|t| t.type_name == type_name)
    }

    pub fn require(&self, type_name: &str) -> Result<&TypeDecl, AnyError> {
        self.get(type_name)
            .ok_or_else(|| anyhow!("Type not found: '{}'", type_name))
    }

    pub fn types(&self) -> &[TypeDecl] {
        &self.types
    }

    /// Types whose base is exactly `base`.
    ///
    /// Types deriving from `base` through another type are not included.
    pub fn direct_subtypes(&self, base: &str) -> Vec<&TypeDecl> {
        self.types
            .iter()
            .filter(|t| t.base.as_deref() == Some(base))
            .collect()
    }
}

impl IntoIterator for TypeScope {
    type Item = TypeDecl;
    type IntoIter = std::vec::IntoIter<TypeDecl>;

    fn into_iter(self) -> Self::IntoIter {
        self.types.into_iter()
    }
}

impl<'a> IntoIterator for &'a TypeScope {
    type Item = &'a TypeDecl;
    type IntoIter = std::slice::Iter<'a, TypeDecl>;

    fn into_iter(self) -> Self::IntoIter {
        self.types.iter()
    }
}
