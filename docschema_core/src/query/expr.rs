use std::collections::BTreeMap;

use crate::{error::InvalidExprError, schema::JsonObject, AnyError};

pub type ExprMap = BTreeMap<String, Expr>;

/// Wire key that marks an object literal.
const OBJECT_KEY: &str = "object";

/// An expression of the database query language.
///
/// Schema operations are built as expressions and handed to a
/// [`crate::db::Driver`] for execution.
///
/// The JSON wire form wraps object literals as `{"object": {...}}` and
/// renders function calls as `{"<function>": <argument>}`.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    String(String),
    Array(Vec<Self>),
    Object(ExprMap),
    Call { function: String, arg: Box<Self> },
}

impl Expr {
    pub fn call<S, I>(function: S, arg: I) -> Self
    where
        S: Into<String>,
        I: Into<Self>,
    {
        Self::Call {
            function: function.into(),
            arg: Box::new(arg.into()),
        }
    }

    pub fn obj<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Self)>,
    {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn arr<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        Self::Array(items.into_iter().collect())
    }

    /// A reference to the collection with the given name.
    pub fn collection(name: impl Into<String>) -> Self {
        Self::call("collection", Self::String(name.into()))
    }

    /// A reference to the index with the given name.
    pub fn index(name: impl Into<String>) -> Self {
        Self::call("index", Self::String(name.into()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ExprMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// The argument of a call to `function`, if this is such a call.
    pub fn as_call(&self, function: &str) -> Option<&Self> {
        match self {
            Self::Call { function: f, arg } if f == function => Some(arg),
            _ => None,
        }
    }

    /// Short description of the expression kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::UInt(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Call { .. } => "call",
        }
    }

    /// Convert plain JSON data into a literal expression.
    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(v) => Self::Bool(v),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_u64().map(Self::UInt))
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from_json(v))).collect())
            }
        }
    }

    pub fn from_json_object(map: &JsonObject) -> Self {
        Self::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), Self::from_json(v.clone())))
                .collect(),
        )
    }

    /// Convert a literal expression back into plain JSON data.
    ///
    /// Fails for function calls, which have no data representation.
    pub fn to_json(&self) -> Result<serde_json::Value, AnyError> {
        use serde_json::Value;
        let value = match self {
            Self::Null => Value::Null,
            Self::Bool(v) => Value::Bool(*v),
            Self::Int(v) => Value::from(*v),
            Self::UInt(v) => Value::from(*v),
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(
                items
                    .iter()
                    .map(Self::to_json)
                    .collect::<Result<_, _>>()?,
            ),
            Self::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
                    .collect::<Result<_, AnyError>>()?,
            ),
            Self::Call { function, .. } => {
                return Err(InvalidExprError::new("a literal", format!("call to '{function}'")).into());
            }
        };
        Ok(value)
    }

    pub fn to_json_object(&self) -> Result<JsonObject, AnyError> {
        match self.to_json()? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(InvalidExprError::new("an object", other).into()),
        }
    }

    /// Render the JSON wire form.
    pub fn to_wire(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::Null => Value::Null,
            Self::Bool(v) => Value::Bool(*v),
            Self::Int(v) => Value::from(*v),
            Self::UInt(v) => Value::from(*v),
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_wire).collect()),
            Self::Object(map) => {
                let inner = map
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_wire()))
                    .collect::<serde_json::Map<_, _>>();
                let mut outer = serde_json::Map::new();
                outer.insert(OBJECT_KEY.to_string(), Value::Object(inner));
                Value::Object(outer)
            }
            Self::Call { function, arg } => {
                let mut outer = serde_json::Map::new();
                outer.insert(function.clone(), arg.to_wire());
                Value::Object(outer)
            }
        }
    }

    /// Parse the JSON wire form.
    pub fn from_wire(value: serde_json::Value) -> Result<Self, AnyError> {
        use serde_json::Value;
        let expr = match value {
            Value::Array(items) => Self::Array(
                items
                    .into_iter()
                    .map(Self::from_wire)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => {
                let len = map.len();
                let mut entries = map.into_iter();
                let (key, inner) = match (entries.next(), entries.next()) {
                    (Some(entry), None) => entry,
                    _ => {
                        return Err(InvalidExprError::new(
                            "an object literal or a function call",
                            format!("object with {len} keys"),
                        )
                        .into());
                    }
                };
                if key == OBJECT_KEY {
                    match inner {
                        Value::Object(fields) => Self::Object(
                            fields
                                .into_iter()
                                .map(|(k, v)| Ok((k, Self::from_wire(v)?)))
                                .collect::<Result<_, AnyError>>()?,
                        ),
                        other => {
                            return Err(InvalidExprError::new("an object literal", other).into())
                        }
                    }
                } else {
                    Self::Call {
                        function: key,
                        arg: Box::new(Self::from_wire(inner)?),
                    }
                }
            }
            scalar => Self::from_json(scalar),
        };
        Ok(expr)
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}

impl From<bool> for Expr {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Expr {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Expr {
    fn from(v: u32) -> Self {
        Self::Int(v.into())
    }
}

impl From<String> for Expr {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl<'a> From<&'a str> for Expr {
    fn from(v: &'a str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<Expr>> for Expr {
    fn from(v: Vec<Expr>) -> Self {
        Self::Array(v)
    }
}

impl From<ExprMap> for Expr {
    fn from(v: ExprMap) -> Self {
        Self::Object(v)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_wire_form_wraps_objects_and_calls() {
        let expr = Expr::call(
            "create_collection",
            Expr::obj([("name", Expr::from("Person")), ("ttl_days", Expr::from(3u32))]),
        );

        assert_eq!(
            expr.to_wire(),
            json!({"create_collection": {"object": {"name": "Person", "ttl_days": 3}}})
        );
        assert_eq!(Expr::from_wire(expr.to_wire()).unwrap(), expr);
    }

    #[test]
    fn test_from_wire_rejects_multi_key_objects() {
        let err = Expr::from_wire(json!({"a": 1, "b": 2})).unwrap_err();
        assert!(err.is::<InvalidExprError>());
    }

    #[test]
    fn test_json_data_conversion() {
        let data = json!({"label": "people", "tags": ["a", 1, 2.5, null, true]});
        let expr = Expr::from_json(data.clone());
        assert_eq!(expr.to_json().unwrap(), data);

        let err = Expr::collection("Person").to_json().unwrap_err();
        assert!(err.is::<InvalidExprError>());
    }

    #[test]
    fn test_integers_above_i64_are_kept_exact() {
        let data = json!({"big": u64::MAX, "small": -3});
        let expr = Expr::from_json(data.clone());
        assert_eq!(
            expr.as_object().unwrap().get("big"),
            Some(&Expr::UInt(u64::MAX))
        );
        assert_eq!(expr.to_json().unwrap(), data);

        let wire = expr.to_wire();
        assert_eq!(wire, json!({"object": {"big": 18446744073709551615u64, "small": -3}}));
        assert_eq!(Expr::from_wire(wire).unwrap(), expr);
    }
}
