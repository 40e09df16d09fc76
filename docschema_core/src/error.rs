use crate::query::action::OperationTarget;

// InvalidNameError

#[derive(Debug)]
pub struct InvalidNameError {
    /// What was named, eg. "collection" or "index".
    pub kind: &'static str,
    pub name: String,
    pub reason: &'static str,
}

impl InvalidNameError {
    pub fn new(kind: &'static str, name: impl Into<String>, reason: &'static str) -> Self {
        Self {
            kind,
            name: name.into(),
            reason,
        }
    }
}

impl std::fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid {} name '{}': {}",
            self.kind, self.name, self.reason
        )
    }
}

impl std::error::Error for InvalidNameError {}

// UnresolvableFieldError

#[derive(Debug)]
pub struct UnresolvableFieldError {
    pub type_name: String,
    pub member: String,
}

impl UnresolvableFieldError {
    pub fn new(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            member: member.into(),
        }
    }
}

impl std::fmt::Display for UnresolvableFieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Field '{}' is not declared on type '{}'",
            self.member, self.type_name
        )
    }
}

impl std::error::Error for UnresolvableFieldError {}

// DanglingOrderingError

#[derive(Debug)]
pub struct DanglingOrderingError {
    /// Position of the ordering modifier in the value sequence.
    pub position: usize,
}

impl std::fmt::Display for DanglingOrderingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Ordering modifier at position {} does not follow a value",
            self.position
        )
    }
}

impl std::error::Error for DanglingOrderingError {}

// InvalidJsonObjectError

#[derive(Debug)]
pub struct InvalidJsonObjectError {
    /// The declaration property, eg. "data" or "permissions".
    pub property: String,
    pub reason: String,
}

impl std::fmt::Display for InvalidJsonObjectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid '{}': expected a JSON object ({})",
            self.property, self.reason
        )
    }
}

impl std::error::Error for InvalidJsonObjectError {}

// InvalidExprError

#[derive(Debug)]
pub struct InvalidExprError {
    pub expected: String,
    pub found: String,
}

impl InvalidExprError {
    pub fn new(expected: impl Into<String>, found: impl std::fmt::Display) -> Self {
        Self {
            expected: expected.into(),
            found: found.to_string(),
        }
    }
}

impl std::fmt::Display for InvalidExprError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid expression: expected {}, got {}",
            self.expected, self.found
        )
    }
}

impl std::error::Error for InvalidExprError {}

// DriverError

/// A schema operation was rejected by the database driver.
///
/// Always fatal to the running compilation pass.
#[derive(Debug)]
pub struct DriverError {
    pub type_name: String,
    pub target: OperationTarget,
    source: anyhow::Error,
}

impl DriverError {
    pub fn new(type_name: impl Into<String>, target: OperationTarget, source: anyhow::Error) -> Self {
        Self {
            type_name: type_name.into(),
            target,
            source,
        }
    }

    /// The error reported by the driver.
    pub fn driver_error(&self) -> &anyhow::Error {
        &self.source
    }
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Could not create {} for type '{}': {}",
            self.target, self.type_name, self.source
        )
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

// InstanceAlreadyExists

#[derive(Debug)]
pub struct InstanceAlreadyExists {
    pub target: OperationTarget,
}

impl std::fmt::Display for InstanceAlreadyExists {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Instance already exists: {}", self.target)
    }
}

impl std::error::Error for InstanceAlreadyExists {}

// InstanceNotFound

#[derive(Debug)]
pub struct InstanceNotFound {
    pub target: OperationTarget,
}

impl std::fmt::Display for InstanceNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Instance not found: {}", self.target)
    }
}

impl std::error::Error for InstanceNotFound {}
