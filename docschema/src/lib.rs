//! Declare document collections and indexes on Rust types and create them
//! in the database.
//!
//! ```ignore
//! use docschema::prelude::*;
//!
//! #[derive(Collection)]
//! #[collection(name = "people")]
//! #[index(terms = [last_name], values = [first_name])]
//! struct Person {
//!     first_name: String,
//!     last_name: String,
//! }
//!
//! let db = Db::new(MemoryDriver::new());
//! db.create_schema(&[TypeDecl::of::<Person>()?]).await?;
//! ```

pub use docschema_core::{backend, compile, db, error, query, schema, AnyError, Db};

pub use docschema_macros::Collection;

pub mod prelude {
    pub use docschema_core::prelude::*;
    pub use docschema_macros::Collection;
}
