//! Lifecycle hooks around repository operations.
//!
//! Hooks are registered against a typed `(phase, operation)` key, either for
//! every content type (system hooks) or for one uid. The registry is built
//! before [`Database::connect`](crate::db::Database::connect) and read-only
//! afterwards.
//!
//! Failure semantics: an error from a `Before` hook aborts the operation
//! before any SQL runs. An error from an `After` hook surfaces to the caller,
//! but the write it follows has already happened and stays.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use cormql::Query;

use crate::entity::{Entity, EntityData};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HookPhase {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HookOperation {
    Create,
    Update,
    Delete,
    FindOne,
    FindMany,
}

/// What one hook invocation gets to see. `data` is the write payload and is
/// mutable only in the `Before` phase; whatever the hook leaves there is what
/// reaches the engine. Everything else is read-only context.
#[derive(Debug)]
pub struct HookEvent<'a> {
    pub uid: &'a str,
    pub phase: HookPhase,
    pub operation: HookOperation,
    pub data: Option<&'a mut EntityData>,
    pub query: Option<&'a Query>,
    pub entities: Option<&'a [Entity]>,
    pub affected: Option<u64>,
}

#[async_trait]
pub trait Hook: Send + Sync {
    /// Shown in logs and in [`Error::Hook`] raised by the hook itself.
    fn name(&self) -> &str {
        "hook"
    }

    async fn run(&self, event: HookEvent<'_>) -> Result<(), Error>;
}

type HookKey = (HookPhase, HookOperation);

/// Hooks in invocation order: system hooks first, then the content type's
/// own, each group in registration order.
#[derive(Default)]
pub struct HookRegistry {
    system: BTreeMap<HookKey, Vec<Arc<dyn Hook>>>,
    scoped: BTreeMap<String, BTreeMap<HookKey, Vec<Arc<dyn Hook>>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook that runs for every content type.
    pub fn register_system(
        &mut self,
        phase: HookPhase,
        operation: HookOperation,
        hook: Arc<dyn Hook>,
    ) {
        self.system.entry((phase, operation)).or_default().push(hook);
    }

    /// Registers a hook for one content type.
    pub fn register(
        &mut self,
        uid: impl Into<String>,
        phase: HookPhase,
        operation: HookOperation,
        hook: Arc<dyn Hook>,
    ) {
        self.scoped
            .entry(uid.into())
            .or_default()
            .entry((phase, operation))
            .or_default()
            .push(hook);
    }

    pub fn hooks_for(
        &self,
        uid: &str,
        phase: HookPhase,
        operation: HookOperation,
    ) -> Vec<Arc<dyn Hook>> {
        let key = (phase, operation);
        let mut hooks = Vec::new();
        if let Some(system) = self.system.get(&key) {
            hooks.extend(system.iter().cloned());
        }
        if let Some(scoped) = self.scoped.get(uid).and_then(|by_key| by_key.get(&key)) {
            hooks.extend(scoped.iter().cloned());
        }
        hooks
    }

    pub fn is_empty(&self) -> bool {
        self.system.is_empty() && self.scoped.is_empty()
    }
}
