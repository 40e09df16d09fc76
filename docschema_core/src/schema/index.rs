use crate::{error::DanglingOrderingError, AnyError};

use super::{collection::parse_json_object, JsonObject};

/// An element of an index's terms or values.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TermElement {
    /// A field of the declaring type, by member identifier.
    Field(String),
    /// The document's own reference.
    SelfRef,
    /// The document's last write timestamp.
    Timestamp,
}

impl TermElement {
    pub fn field(member: impl Into<String>) -> Self {
        Self::Field(member.into())
    }

    pub fn as_field(&self) -> Option<&str> {
        match self {
            Self::Field(member) => Some(member),
            _ => None,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Ordering {
    #[default]
    Default,
    Reverse,
}

impl Ordering {
    #[inline]
    pub fn is_reverse(&self) -> bool {
        matches!(self, Self::Reverse)
    }
}

/// An index value: a term element with the order it is sorted in.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueElement {
    pub term: TermElement,
    #[serde(default)]
    pub ordering: Ordering,
}

impl ValueElement {
    pub fn new(term: TermElement) -> Self {
        Self {
            term,
            ordering: Ordering::Default,
        }
    }

    pub fn field(member: impl Into<String>) -> Self {
        Self::new(TermElement::field(member))
    }

    pub fn with_ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn reversed(self) -> Self {
        self.with_ordering(Ordering::Reverse)
    }

    /// Build values from the flat sequence form, where an ordering modifier
    /// applies to the element right before it.
    ///
    /// `[age, Reverse, Ts]` yields `age` reversed followed by `Ts`.
    pub fn from_sequence<I>(items: I) -> Result<Vec<Self>, AnyError>
    where
        I: IntoIterator<Item = SequenceItem>,
    {
        let mut values: Vec<Self> = Vec::new();
        // Whether the last value already received a modifier.
        let mut modified = true;

        for (position, item) in items.into_iter().enumerate() {
            match item {
                SequenceItem::Element(term) => {
                    values.push(Self::new(term));
                    modified = false;
                }
                SequenceItem::Ordering(ordering) => match values.last_mut() {
                    Some(last) if !modified => {
                        last.ordering = ordering;
                        modified = true;
                    }
                    _ => return Err(DanglingOrderingError { position }.into()),
                },
            }
        }

        Ok(values)
    }
}

impl From<TermElement> for ValueElement {
    fn from(term: TermElement) -> Self {
        Self::new(term)
    }
}

/// An item of the flat value sequence form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequenceItem {
    Element(TermElement),
    Ordering(Ordering),
}

fn default_serialized() -> bool {
    true
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct IndexDescriptor {
    /// Explicit name. Derived from terms and values when absent.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub terms: Vec<TermElement>,
    #[serde(default)]
    pub values: Vec<ValueElement>,
    /// Maintain a unique constraint on combined terms and values.
    #[serde(default)]
    pub unique: bool,
    /// Serialize writes to this index with concurrent reads and writes.
    #[serde(default = "default_serialized")]
    pub serialized: bool,
    #[serde(default)]
    pub data: Option<JsonObject>,
    #[serde(default)]
    pub permissions: Option<JsonObject>,
}

impl Default for IndexDescriptor {
    fn default() -> Self {
        Self {
            name: None,
            terms: Vec::new(),
            values: Vec::new(),
            unique: false,
            serialized: default_serialized(),
            data: None,
            permissions: None,
        }
    }
}

impl IndexDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_term(mut self, term: TermElement) -> Self {
        self.terms.push(term);
        self
    }

    pub fn with_terms(mut self, terms: Vec<TermElement>) -> Self {
        self.terms.extend(terms);
        self
    }

    pub fn with_value(mut self, value: impl Into<ValueElement>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn with_values(mut self, values: Vec<ValueElement>) -> Self {
        self.values.extend(values);
        self
    }

    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn with_serialized(mut self, serialized: bool) -> Self {
        self.serialized = serialized;
        self
    }

    pub fn with_data(mut self, data: JsonObject) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_data_json(self, text: &str) -> Result<Self, AnyError> {
        let data = parse_json_object("data", text)?;
        Ok(self.with_data(data))
    }

    pub fn with_permissions(mut self, permissions: JsonObject) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn with_permissions_json(self, text: &str) -> Result<Self, AnyError> {
        let permissions = parse_json_object("permissions", text)?;
        Ok(self.with_permissions(permissions))
    }

    /// All member identifiers referenced by terms and values.
    pub fn field_members(&self) -> impl Iterator<Item = &str> {
        self.terms
            .iter()
            .chain(self.values.iter().map(|v| &v.term))
            .filter_map(TermElement::as_field)
    }
}
