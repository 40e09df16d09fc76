use crate::{
    error::{InvalidJsonObjectError, InvalidNameError},
    AnyError,
};

pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Names reserved by the database. Collections can not use them.
pub const RESERVED_NAMES: &[&str] = &["events", "sets", "self", "documents", "_"];

/// History retention used when a declaration does not specify one.
pub const DEFAULT_HISTORY_DAYS: u32 = 30;

fn default_history_days() -> Option<u32> {
    Some(DEFAULT_HISTORY_DAYS)
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct CollectionDescriptor {
    pub name: String,
    /// Documents are deleted this many days after their last write.
    #[serde(default)]
    pub ttl_days: Option<u32>,
    /// Document history is retained for at least this many days.
    #[serde(default = "default_history_days")]
    pub history_days: Option<u32>,
    #[serde(default)]
    pub data: Option<JsonObject>,
    #[serde(default)]
    pub permissions: Option<JsonObject>,
}

impl CollectionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ttl_days: None,
            history_days: default_history_days(),
            data: None,
            permissions: None,
        }
    }

    pub fn with_ttl_days(mut self, days: u32) -> Self {
        self.ttl_days = Some(days);
        self
    }

    /// Set the history retention.
    /// `None` leaves the retention to the database.
    pub fn with_history_days(mut self, days: Option<u32>) -> Self {
        self.history_days = days;
        self
    }

    pub fn with_data(mut self, data: JsonObject) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the data from JSON object text.
    pub fn with_data_json(self, text: &str) -> Result<Self, AnyError> {
        let data = parse_json_object("data", text)?;
        Ok(self.with_data(data))
    }

    pub fn with_permissions(mut self, permissions: JsonObject) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Set the permissions from JSON object text.
    pub fn with_permissions_json(self, text: &str) -> Result<Self, AnyError> {
        let permissions = parse_json_object("permissions", text)?;
        Ok(self.with_permissions(permissions))
    }
}

pub fn validate_collection(collection: &CollectionDescriptor) -> Result<(), AnyError> {
    validate_name("collection", &collection.name)
}

/// Validate an explicitly given index name.
pub fn validate_index_name(name: &str) -> Result<(), AnyError> {
    validate_name("index", name)
}

fn validate_name(kind: &'static str, name: &str) -> Result<(), AnyError> {
    if name.is_empty() {
        return Err(InvalidNameError::new(kind, name, "name is empty").into());
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(InvalidNameError::new(kind, name, "name is reserved").into());
    }
    Ok(())
}

/// Parse JSON text that must contain an object.
pub fn parse_json_object(property: &str, text: &str) -> Result<JsonObject, AnyError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|err| InvalidJsonObjectError {
            property: property.to_string(),
            reason: err.to_string(),
        })?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(InvalidJsonObjectError {
            property: property.to_string(),
            reason: format!("got {other}"),
        }
        .into()),
    }
}
