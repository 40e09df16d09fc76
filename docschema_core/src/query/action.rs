use crate::{
    error::InvalidExprError,
    query::expr::{Expr, ExprMap},
    schema::JsonObject,
    AnyError,
};

pub const FN_CREATE_COLLECTION: &str = "create_collection";
pub const FN_CREATE_INDEX: &str = "create_index";
pub const FN_COLLECTION: &str = "collection";

/// The schema object an operation creates.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum OperationTarget {
    Collection(String),
    Index(String),
}

impl OperationTarget {
    pub fn name(&self) -> &str {
        match self {
            Self::Collection(name) | Self::Index(name) => name,
        }
    }
}

impl std::fmt::Display for OperationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collection(name) => write!(f, "collection '{name}'"),
            Self::Index(name) => write!(f, "index '{name}'"),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct CollectionCreate {
    pub name: String,
    pub history_days: Option<u32>,
    pub ttl_days: Option<u32>,
    pub data: Option<JsonObject>,
    pub permissions: Option<JsonObject>,
}

impl CollectionCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            history_days: None,
            ttl_days: None,
            data: None,
            permissions: None,
        }
    }

    /// Build the `create_collection` expression.
    ///
    /// Optional properties are only included when set.
    pub fn to_expr(&self) -> Expr {
        let mut params = ExprMap::new();
        params.insert("name".into(), self.name.as_str().into());
        if let Some(data) = &self.data {
            params.insert("data".into(), Expr::from_json_object(data));
        }
        if let Some(days) = self.history_days {
            params.insert("history_days".into(), days.into());
        }
        if let Some(days) = self.ttl_days {
            params.insert("ttl_days".into(), days.into());
        }
        if let Some(permissions) = &self.permissions {
            params.insert("permissions".into(), Expr::from_json_object(permissions));
        }
        Expr::call(FN_CREATE_COLLECTION, params)
    }

    pub fn from_expr(expr: &Expr) -> Result<Self, AnyError> {
        let params = call_params(expr, FN_CREATE_COLLECTION)?;
        Ok(Self {
            name: require_str(params, "name")?.to_string(),
            history_days: optional_days(params, "history_days")?,
            ttl_days: optional_days(params, "ttl_days")?,
            data: optional_object(params, "data")?,
            permissions: optional_object(params, "permissions")?,
        })
    }
}

/// A field an index term or value points at.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum IndexField {
    /// A document data field, by its external (aliased) name.
    Data(String),
    /// The document's own reference.
    Ref,
    /// The document's last write timestamp.
    Ts,
}

impl IndexField {
    fn to_expr(&self) -> Expr {
        match self {
            Self::Data(name) => Expr::arr(["data".into(), name.as_str().into()]),
            Self::Ref => "ref".into(),
            Self::Ts => "ts".into(),
        }
    }

    fn from_expr(expr: &Expr) -> Result<Self, AnyError> {
        match expr {
            Expr::String(s) if s == "ref" => Ok(Self::Ref),
            Expr::String(s) if s == "ts" => Ok(Self::Ts),
            Expr::Array(path) => match path.as_slice() {
                [Expr::String(data), Expr::String(name)] if data == "data" => {
                    Ok(Self::Data(name.clone()))
                }
                _ => Err(InvalidExprError::new("a [\"data\", <name>] field path", expr).into()),
            },
            other => Err(InvalidExprError::new("an index field", other).into()),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct IndexValue {
    pub field: IndexField,
    pub reverse: bool,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct IndexCreate {
    pub name: String,
    /// Name of the source collection.
    pub source: String,
    pub terms: Vec<IndexField>,
    pub values: Vec<IndexValue>,
    pub unique: bool,
    pub serialized: bool,
    pub data: Option<JsonObject>,
    pub permissions: Option<JsonObject>,
}

impl IndexCreate {
    /// Build the `create_index` expression.
    ///
    /// `terms` and `values` are left out entirely when empty.
    pub fn to_expr(&self) -> Expr {
        let mut params = ExprMap::new();
        params.insert("name".into(), self.name.as_str().into());
        params.insert("source".into(), Expr::collection(self.source.as_str()));

        if !self.terms.is_empty() {
            let terms = self
                .terms
                .iter()
                .map(|field| Expr::obj([("field", field.to_expr())]));
            params.insert("terms".into(), Expr::arr(terms));
        }
        if !self.values.is_empty() {
            let values = self.values.iter().map(|value| {
                let mut entry = ExprMap::new();
                entry.insert("field".into(), value.field.to_expr());
                if value.reverse {
                    entry.insert("reverse".into(), true.into());
                }
                Expr::Object(entry)
            });
            params.insert("values".into(), Expr::arr(values));
        }

        if let Some(data) = &self.data {
            params.insert("data".into(), Expr::from_json_object(data));
        }
        if let Some(permissions) = &self.permissions {
            params.insert("permissions".into(), Expr::from_json_object(permissions));
        }
        params.insert("unique".into(), self.unique.into());
        params.insert("serialized".into(), self.serialized.into());

        Expr::call(FN_CREATE_INDEX, params)
    }

    pub fn from_expr(expr: &Expr) -> Result<Self, AnyError> {
        let params = call_params(expr, FN_CREATE_INDEX)?;

        let source = params
            .get("source")
            .and_then(|s| s.as_call(FN_COLLECTION))
            .and_then(|name| name.as_str())
            .ok_or_else(|| InvalidExprError::new("a collection reference in 'source'", expr))?;

        let terms = match params.get("terms") {
            Some(terms) => entries(terms, "terms")?
                .iter()
                .map(|entry| IndexField::from_expr(require(entry_object(entry)?, "field")?))
                .collect::<Result<_, _>>()?,
            None => Vec::new(),
        };
        let values = match params.get("values") {
            Some(values) => entries(values, "values")?
                .iter()
                .map(|entry| -> Result<_, AnyError> {
                    let entry = entry_object(entry)?;
                    Ok(IndexValue {
                        field: IndexField::from_expr(require(entry, "field")?)?,
                        reverse: optional_bool(entry, "reverse")?.unwrap_or(false),
                    })
                })
                .collect::<Result<_, _>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            name: require_str(params, "name")?.to_string(),
            source: source.to_string(),
            terms,
            values,
            unique: optional_bool(params, "unique")?.unwrap_or(false),
            serialized: optional_bool(params, "serialized")?.unwrap_or(true),
            data: optional_object(params, "data")?,
            permissions: optional_object(params, "permissions")?,
        })
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub enum SchemaAction {
    CollectionCreate(CollectionCreate),
    IndexCreate(IndexCreate),
}

impl SchemaAction {
    pub fn target(&self) -> OperationTarget {
        match self {
            Self::CollectionCreate(c) => OperationTarget::Collection(c.name.clone()),
            Self::IndexCreate(i) => OperationTarget::Index(i.name.clone()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::CollectionCreate(c) => &c.name,
            Self::IndexCreate(i) => &i.name,
        }
    }

    pub fn to_expr(&self) -> Expr {
        match self {
            Self::CollectionCreate(c) => c.to_expr(),
            Self::IndexCreate(i) => i.to_expr(),
        }
    }

    /// Decompile an expression built by [`Self::to_expr`].
    pub fn from_expr(expr: &Expr) -> Result<Self, AnyError> {
        match expr {
            Expr::Call { function, .. } if function == FN_CREATE_COLLECTION => {
                CollectionCreate::from_expr(expr).map(Self::CollectionCreate)
            }
            Expr::Call { function, .. } if function == FN_CREATE_INDEX => {
                IndexCreate::from_expr(expr).map(Self::IndexCreate)
            }
            other => Err(InvalidExprError::new("a schema operation", other).into()),
        }
    }
}

impl From<CollectionCreate> for SchemaAction {
    fn from(v: CollectionCreate) -> Self {
        Self::CollectionCreate(v)
    }
}

impl From<IndexCreate> for SchemaAction {
    fn from(v: IndexCreate) -> Self {
        Self::IndexCreate(v)
    }
}

// Decoding helpers.

fn call_params<'a>(expr: &'a Expr, function: &str) -> Result<&'a ExprMap, AnyError> {
    expr.as_call(function)
        .and_then(Expr::as_object)
        .ok_or_else(|| InvalidExprError::new(format!("a '{function}' call with an object"), expr).into())
}

fn entry_object(expr: &Expr) -> Result<&ExprMap, AnyError> {
    expr.as_object()
        .ok_or_else(|| InvalidExprError::new("an index field object", expr).into())
}

fn require<'a>(params: &'a ExprMap, key: &str) -> Result<&'a Expr, AnyError> {
    params
        .get(key)
        .ok_or_else(|| InvalidExprError::new(format!("a '{key}' property"), "nothing").into())
}

fn require_str<'a>(params: &'a ExprMap, key: &str) -> Result<&'a str, AnyError> {
    match params.get(key) {
        Some(Expr::String(s)) => Ok(s),
        Some(other) => Err(InvalidExprError::new(format!("a string in '{key}'"), other.kind_name()).into()),
        None => Err(InvalidExprError::new(format!("a '{key}' property"), "nothing").into()),
    }
}

fn entries<'a>(expr: &'a Expr, key: &str) -> Result<&'a [Expr], AnyError> {
    expr.as_array()
        .ok_or_else(|| InvalidExprError::new(format!("an array in '{key}'"), expr.kind_name()).into())
}

fn optional_days(params: &ExprMap, key: &str) -> Result<Option<u32>, AnyError> {
    params
        .get(key)
        .map(|v| {
            v.as_int()
                .and_then(|days| u32::try_from(days).ok())
                .ok_or_else(|| InvalidExprError::new(format!("a day count in '{key}'"), v).into())
        })
        .transpose()
}

fn optional_bool(params: &ExprMap, key: &str) -> Result<Option<bool>, AnyError> {
    params
        .get(key)
        .map(|v| {
            v.as_bool()
                .ok_or_else(|| InvalidExprError::new(format!("a bool in '{key}'"), v).into())
        })
        .transpose()
}

fn optional_object(params: &ExprMap, key: &str) -> Result<Option<JsonObject>, AnyError> {
    params.get(key).map(Expr::to_json_object).transpose()
}
