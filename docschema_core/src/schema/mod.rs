mod collection;
pub use self::collection::{
    parse_json_object, validate_collection, validate_index_name, CollectionDescriptor, JsonObject,
    DEFAULT_HISTORY_DAYS, RESERVED_NAMES,
};

mod field;
pub use self::field::{FieldDecl, FieldMap};

mod index;
pub use self::index::{IndexDescriptor, Ordering, SequenceItem, TermElement, ValueElement};

mod decl;
pub use self::decl::{Declared, TypeDecl};

mod scope;
pub use self::scope::TypeScope;

pub mod naming;
pub use self::naming::derive_index_name;
