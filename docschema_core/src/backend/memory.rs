use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use futures::{future::ready, FutureExt};

use crate::{
    db::{Driver, DriverFuture},
    error::{InstanceAlreadyExists, InstanceNotFound},
    query::{
        action::{CollectionCreate, IndexCreate, OperationTarget, SchemaAction},
        expr::Expr,
    },
    AnyError,
};

/// Driver that keeps the schema in memory.
///
/// Behaves like a fresh database: creating a collection or index that
/// already exists fails, as does an index on a missing collection.
/// Every submitted operation is recorded, including rejected ones.
///
/// Mainly useful for tests and dry runs.
#[derive(Clone, Default)]
pub struct MemoryDriver {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Default, Debug)]
struct MemoryState {
    collections: BTreeMap<String, CollectionCreate>,
    indexes: BTreeMap<String, IndexCreate>,
    submitted: Vec<Expr>,
    /// Logical clock, advanced by every successful write.
    ts: i64,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryState) -> T) -> Result<T, AnyError> {
        let state = self
            .state
            .read()
            .map_err(|_| AnyError::msg("Could not retrieve memory state"))?;
        Ok(f(&state))
    }

    pub fn collection(&self, name: &str) -> Result<Option<CollectionCreate>, AnyError> {
        self.read(|s| s.collections.get(name).cloned())
    }

    pub fn index(&self, name: &str) -> Result<Option<IndexCreate>, AnyError> {
        self.read(|s| s.indexes.get(name).cloned())
    }

    pub fn collection_names(&self) -> Result<Vec<String>, AnyError> {
        self.read(|s| s.collections.keys().cloned().collect())
    }

    pub fn index_names(&self) -> Result<Vec<String>, AnyError> {
        self.read(|s| s.indexes.keys().cloned().collect())
    }

    /// All operations submitted so far, in order.
    pub fn submitted(&self) -> Result<Vec<Expr>, AnyError> {
        self.read(|s| s.submitted.clone())
    }

    /// Delete all collections and indexes and forget submitted operations.
    pub fn purge_all_data(&self) -> Result<(), AnyError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| AnyError::msg("Could not retrieve memory state"))?;
        *state = MemoryState::default();
        Ok(())
    }

    fn apply(&self, op: Expr) -> Result<Expr, AnyError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| AnyError::msg("Could not retrieve memory state"))?;
        state.submitted.push(op.clone());

        let action = SchemaAction::from_expr(&op)?;
        let target = action.target();
        tracing::trace!(operation = %target, "applying schema operation");

        let instance_ref = match action {
            SchemaAction::CollectionCreate(create) => {
                if state.collections.contains_key(&create.name) {
                    return Err(InstanceAlreadyExists { target }.into());
                }
                let instance_ref = Expr::collection(create.name.as_str());
                state.collections.insert(create.name.clone(), create);
                instance_ref
            }
            SchemaAction::IndexCreate(create) => {
                if state.indexes.contains_key(&create.name) {
                    return Err(InstanceAlreadyExists { target }.into());
                }
                if !state.collections.contains_key(&create.source) {
                    return Err(InstanceNotFound {
                        target: OperationTarget::Collection(create.source),
                    }
                    .into());
                }
                let instance_ref = Expr::index(create.name.as_str());
                state.indexes.insert(create.name.clone(), create);
                instance_ref
            }
        };

        state.ts += 1;
        Ok(Expr::obj([
            ("ref", instance_ref),
            ("name", target.name().into()),
            ("ts", state.ts.into()),
        ]))
    }
}

impl Driver for MemoryDriver {
    fn execute(&self, op: Expr) -> DriverFuture<'_, Expr> {
        ready(self.apply(op)).boxed()
    }
}
