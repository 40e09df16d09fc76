pub use crate::{
    compile::{CompileOptions, SchemaCompiler, SchemaReport},
    db::{Db, Driver, DriverFuture},
    query::{
        action::{CollectionCreate, IndexCreate, IndexField, OperationTarget, SchemaAction},
        expr::Expr,
    },
    schema::{
        CollectionDescriptor, Declared, FieldDecl, IndexDescriptor, Ordering as IndexOrdering,
        TermElement, TypeDecl, TypeScope, ValueElement,
    },
    AnyError,
};

#[cfg(feature = "memory")]
pub use crate::backend::memory::MemoryDriver;
