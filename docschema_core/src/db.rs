use std::sync::Arc;

use crate::{
    compile::{CompileOptions, SchemaCompiler, SchemaReport},
    query::expr::Expr,
    schema::{TypeDecl, TypeScope},
    AnyError,
};

pub type DriverFuture<'a, T> = futures::future::BoxFuture<'a, Result<T, AnyError>>;

/// A database connection that executes schema operations.
///
/// Connection handling, authentication and retries are the driver's
/// business. Each call is one request/response round trip.
pub trait Driver {
    /// Execute a single operation and return the database's response.
    fn execute(&self, op: Expr) -> DriverFuture<'_, Expr>;
}

impl<D: Driver + ?Sized> Driver for &D {
    fn execute(&self, op: Expr) -> DriverFuture<'_, Expr> {
        (**self).execute(op)
    }
}

impl<D: Driver + ?Sized> Driver for Arc<D> {
    fn execute(&self, op: Expr) -> DriverFuture<'_, Expr> {
        (**self).execute(op)
    }
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn execute(&self, op: Expr) -> DriverFuture<'_, Expr> {
        (**self).execute(op)
    }
}

/// A driver together with the options used to build schemas with it.
#[derive(Clone)]
pub struct Db {
    driver: Arc<dyn Driver + Send + Sync + 'static>,
    compiler: SchemaCompiler,
}

impl Db {
    pub fn new(driver: impl Driver + Send + Sync + 'static) -> Self {
        Self {
            driver: Arc::new(driver),
            compiler: SchemaCompiler::new(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.compiler = SchemaCompiler::with_options(options);
        self
    }

    pub async fn execute(&self, op: Expr) -> Result<Expr, AnyError> {
        self.driver.execute(op).await
    }

    /// Create collections and indexes for the given types, in order.
    pub async fn create_schema<'a, I>(&self, types: I) -> Result<SchemaReport, AnyError>
    where
        I: IntoIterator<Item = &'a TypeDecl>,
    {
        self.compiler.compile_schema(&*self.driver, types).await
    }

    /// Create collections and indexes for the direct subtypes of `base`.
    pub async fn create_schema_for_base(
        &self,
        scope: &TypeScope,
        base: &str,
    ) -> Result<SchemaReport, AnyError> {
        self.compiler
            .compile_schema_for_base(&*self.driver, scope, base)
            .await
    }
}
