pub type AnyError = anyhow::Error;

pub mod error;
pub mod query;
pub mod schema;

pub mod backend;
pub mod compile;
pub mod db;

pub mod prelude;

pub use self::db::Db;

#[cfg_attr(not(feature = "tests"), cfg(test))]
pub mod tests;
