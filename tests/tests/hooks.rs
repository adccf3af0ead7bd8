
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use common::*;
use corm::{
    DatabaseOptions, Error, Hook, HookEvent, HookOperation, HookPhase, HookRegistry,
};
use cormql::{Filter, Query, Value};

struct Recorder {
    label: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Hook for Recorder {
    fn name(&self) -> &str {
        self.label
    }

    async fn run(&self, _event: HookEvent<'_>) -> Result<(), Error> {
        self.log.lock().unwrap().push(self.label);
        Ok(())
    }
}

struct Slugger;

#[async_trait]
impl Hook for Slugger {
    fn name(&self) -> &str {
        "slugger"
    }

    async fn run(&self, event: HookEvent<'_>) -> Result<(), Error> {
        if let Some(data) = event.data {
            if let Some(Value::Text(name)) = data.get("name").cloned() {
                data.insert(
                    "slug".to_string(),
                    Value::Text(name.to_lowercase().replace(' ', "-")),
                );
            }
        }
        Ok(())
    }
}

struct Refusing;

#[async_trait]
impl Hook for Refusing {
    fn name(&self) -> &str {
        "refusing"
    }

    async fn run(&self, _event: HookEvent<'_>) -> Result<(), Error> {
        Err(Error::hook("refusing", "not today"))
    }
}

struct CountWatcher {
    seen: Arc<Mutex<Vec<Option<u64>>>>,
}

#[async_trait]
impl Hook for CountWatcher {
    fn name(&self) -> &str {
        "count-watcher"
    }

    async fn run(&self, event: HookEvent<'_>) -> Result<(), Error> {
        self.seen.lock().unwrap().push(event.affected);
        Ok(())
    }
}

#[tokio::test]
async fn system_hooks_run_before_scoped_ones() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut hooks = HookRegistry::new();
    hooks.register(
        RESTAURANT,
        HookPhase::Before,
        HookOperation::Create,
        Arc::new(Recorder { label: "scoped-a", log: log.clone() }),
    );
    hooks.register(
        RESTAURANT,
        HookPhase::Before,
        HookOperation::Create,
        Arc::new(Recorder { label: "scoped-b", log: log.clone() }),
    );
    hooks.register_system(
        HookPhase::Before,
        HookOperation::Create,
        Arc::new(Recorder { label: "system", log: log.clone() }),
    );

    let (_dialect, db) =
        connect_with(&restaurant_schemas(), DatabaseOptions::new(), hooks).await?;
    db.query(RESTAURANT)?
        .create(data(&[("name", Value::Text("Biscotte".to_string()))]))
        .await?;

    assert_eq!(*log.lock().unwrap(), vec!["system", "scoped-a", "scoped-b"]);
    Ok(())
}

#[tokio::test]
async fn a_before_hook_shapes_what_the_engine_stores() -> Result<()> {
    let mut hooks = HookRegistry::new();
    hooks.register(RESTAURANT, HookPhase::Before, HookOperation::Create, Arc::new(Slugger));
    let (_dialect, db) =
        connect_with(&restaurant_schemas(), DatabaseOptions::new(), hooks).await?;
    let repo = db.query(RESTAURANT)?;

    let entity =
        repo.create(data(&[("name", Value::Text("Chez Biscotte".to_string()))])).await?;
    assert_eq!(entity.field("slug"), Some(&Value::Text("chez-biscotte".to_string())));

    // The slug is physically stored, not just echoed back.
    let found = repo.find_one(&Query::new().filter(Filter::eq("slug", "chez-biscotte"))).await?;
    assert_eq!(found.map(|entity| entity.id), Some(entity.id));
    Ok(())
}

#[tokio::test]
async fn a_failing_before_hook_leaves_no_row_behind() -> Result<()> {
    let mut hooks = HookRegistry::new();
    hooks.register_system(HookPhase::Before, HookOperation::Create, Arc::new(Refusing));
    let (_dialect, db) =
        connect_with(&restaurant_schemas(), DatabaseOptions::new(), hooks).await?;
    let repo = db.query(RESTAURANT)?;

    let err = repo
        .create(data(&[("name", Value::Text("Biscotte".to_string()))]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Hook { .. }));
    assert_eq!(repo.count(&Query::new()).await?, 0);
    Ok(())
}

#[tokio::test]
async fn a_failing_after_hook_does_not_undo_the_write() -> Result<()> {
    let mut hooks = HookRegistry::new();
    hooks.register_system(HookPhase::After, HookOperation::Create, Arc::new(Refusing));
    let (_dialect, db) =
        connect_with(&restaurant_schemas(), DatabaseOptions::new(), hooks).await?;
    let repo = db.query(RESTAURANT)?;

    let err = repo
        .create(data(&[("name", Value::Text("Biscotte".to_string()))]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Hook { .. }));
    assert_eq!(repo.count(&Query::new()).await?, 1);
    Ok(())
}

#[tokio::test]
async fn after_delete_hooks_see_the_affected_count() -> Result<()> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut hooks = HookRegistry::new();
    hooks.register(
        RESTAURANT,
        HookPhase::After,
        HookOperation::Delete,
        Arc::new(CountWatcher { seen: seen.clone() }),
    );
    let (_dialect, db) =
        connect_with(&restaurant_schemas(), DatabaseOptions::new(), hooks).await?;
    let repo = db.query(RESTAURANT)?;

    let entity = repo.create(data(&[("name", Value::Text("Biscotte".to_string()))])).await?;
    repo.delete(entity.id).await?;
    repo.delete(entity.id).await?;

    assert_eq!(*seen.lock().unwrap(), vec![Some(1), Some(0)]);
    Ok(())
}
