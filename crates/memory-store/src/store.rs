//! The in-memory `DocumentStore` implementation.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use store_core::{
    CollectionRef, Direction, Document, DocumentStore, Filter, Query, Snapshot, StoreError,
    Unsubscribe, Watch, WriteFields, WriteValue,
};

type FieldMap = Map<String, Value>;

struct Listener {
    query: Query,
    tx: mpsc::UnboundedSender<Snapshot>,
}

struct Inner {
    /// Collection path → document id → fields.
    collections: HashMap<String, BTreeMap<String, FieldMap>>,
    listeners: HashMap<u64, Listener>,
    next_listener_id: u64,
    last_commit: DateTime<Utc>,
    fail_writes: bool,
    fail_subscribes: bool,
}

impl Inner {
    /// Server clock: strictly increasing across commits even when the
    /// wall clock does not advance between them.
    fn next_commit_time(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let commit = if now > self.last_commit {
            now
        } else {
            self.last_commit + Duration::microseconds(1)
        };
        self.last_commit = commit;
        commit
    }
}

/// A working in-process document store with live standing queries.
///
/// Clones share the same underlying state, like clones of a remote store
/// handle would.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                collections: HashMap::new(),
                listeners: HashMap::new(),
                next_listener_id: 0,
                last_commit: DateTime::<Utc>::MIN_UTC,
                fail_writes: false,
                fail_subscribes: false,
            })),
        }
    }

    /// Test hook: make every subsequent write fail with
    /// [`StoreError::Write`].
    pub fn fail_writes(&self, fail: bool) {
        lock(&self.inner).fail_writes = fail;
    }

    /// Test hook: make every subsequent subscription attempt fail with
    /// [`StoreError::Subscribe`].
    pub fn fail_subscribes(&self, fail: bool) {
        lock(&self.inner).fail_subscribes = fail;
    }

    /// Test hook: drop every active subscription, as a lost backend
    /// connection would. Watches observe end-of-stream; documents are
    /// kept and new subscriptions can be established afterwards.
    pub fn disconnect(&self) {
        let mut inner = lock(&self.inner);
        let dropped = inner.listeners.len();
        inner.listeners.clear();
        info!(subscriptions = dropped, "store disconnected");
    }

    /// Number of active subscriptions, after pruning closed ones.
    pub fn subscription_count(&self) -> usize {
        let mut inner = lock(&self.inner);
        inner.listeners.retain(|_, l| !l.tx.is_closed());
        inner.listeners.len()
    }
}

fn lock(inner: &Arc<Mutex<Inner>>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn resolve(fields: WriteFields, commit: DateTime<Utc>) -> FieldMap {
    let commit = Value::String(commit.to_rfc3339_opts(SecondsFormat::Micros, true));
    fields
        .into_iter()
        .map(|(name, value)| match value {
            WriteValue::Json(v) => (name, v),
            WriteValue::ServerTime => (name, commit.clone()),
        })
        .collect()
}

fn matches(fields: &FieldMap, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| match filter {
        Filter::Eq { field, value } => fields.get(field) == Some(value),
    })
}

/// Total order over JSON values for `orderBy`: missing < null < bool <
/// number < string < everything else (by serialization, best effort).
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }

    match (a, b) {
        (None, None) => CmpOrdering::Equal,
        (None, Some(_)) => CmpOrdering::Less,
        (Some(_), None) => CmpOrdering::Greater,
        (Some(a), Some(b)) => rank(a).cmp(&rank(b)).then_with(|| match (a, b) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(CmpOrdering::Equal),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            _ => a.to_string().cmp(&b.to_string()),
        }),
    }
}

fn evaluate(inner: &Inner, query: &Query) -> Vec<Document> {
    let mut docs: Vec<Document> = inner
        .collections
        .get(query.collection.as_str())
        .map(|coll| {
            coll.iter()
                .filter(|(_, fields)| matches(fields, &query.filters))
                .map(|(id, fields)| Document {
                    id: id.clone(),
                    fields: fields.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    if let Some(order) = &query.order_by {
        docs.sort_by(|a, b| {
            let ordering = compare_values(a.fields.get(&order.field), b.fields.get(&order.field));
            match order.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });
    }
    docs
}

/// Push a fresh full snapshot to every listener watching `path`. Runs
/// under the store lock so deliveries observe commits in order.
fn notify(inner: &mut Inner, path: &str) {
    let mut closed = Vec::new();
    for (id, listener) in &inner.listeners {
        if listener.query.collection.as_str() != path {
            continue;
        }
        let snapshot = Snapshot {
            docs: evaluate(inner, &listener.query),
        };
        if listener.tx.send(snapshot).is_err() {
            closed.push(*id);
        }
    }
    for id in closed {
        debug!(listener = id, "pruning closed subscription");
        inner.listeners.remove(&id);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(
        &self,
        collection: &CollectionRef,
        fields: WriteFields,
    ) -> Result<String, StoreError> {
        let mut inner = lock(&self.inner);
        if inner.fail_writes {
            return Err(StoreError::write("injected write failure"));
        }

        let commit = inner.next_commit_time();
        let id = Uuid::new_v4().to_string();
        let resolved = resolve(fields, commit);
        inner
            .collections
            .entry(collection.as_str().to_string())
            .or_default()
            .insert(id.clone(), resolved);

        debug!(collection = %collection, doc = %id, "created document");
        notify(&mut inner, collection.as_str());
        Ok(id)
    }

    async fn get(
        &self,
        collection: &CollectionRef,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let inner = lock(&self.inner);
        Ok(inner
            .collections
            .get(collection.as_str())
            .and_then(|coll| coll.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    async fn set(
        &self,
        collection: &CollectionRef,
        id: &str,
        fields: WriteFields,
        merge: bool,
    ) -> Result<(), StoreError> {
        let mut inner = lock(&self.inner);
        if inner.fail_writes {
            return Err(StoreError::write("injected write failure"));
        }

        let commit = inner.next_commit_time();
        let resolved = resolve(fields, commit);
        let coll = inner
            .collections
            .entry(collection.as_str().to_string())
            .or_default();

        if merge {
            let existing = coll.get_mut(id).ok_or_else(|| StoreError::NotFound {
                collection: collection.as_str().to_string(),
                id: id.to_string(),
            })?;
            existing.extend(resolved);
        } else {
            coll.insert(id.to_string(), resolved);
        }

        debug!(collection = %collection, doc = %id, merge, "set document");
        notify(&mut inner, collection.as_str());
        Ok(())
    }

    async fn delete(&self, collection: &CollectionRef, id: &str) -> Result<(), StoreError> {
        let mut inner = lock(&self.inner);
        if inner.fail_writes {
            return Err(StoreError::write("injected write failure"));
        }

        let removed = inner
            .collections
            .get_mut(collection.as_str())
            .and_then(|coll| coll.remove(id))
            .is_some();

        if removed {
            debug!(collection = %collection, doc = %id, "deleted document");
            notify(&mut inner, collection.as_str());
        }
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let inner = lock(&self.inner);
        Ok(evaluate(&inner, query))
    }

    async fn subscribe(&self, query: Query) -> Result<Watch, StoreError> {
        let mut inner = lock(&self.inner);
        if inner.fail_subscribes {
            return Err(StoreError::subscribe("injected subscribe failure"));
        }

        let id = inner.next_listener_id;
        inner.next_listener_id += 1;

        let (tx, rx) = mpsc::unbounded_channel();
        let initial = Snapshot {
            docs: evaluate(&inner, &query),
        };
        // Delivery of the initial state cannot fail: we still hold the
        // only receiver.
        let _ = tx.send(initial);
        inner.listeners.insert(id, Listener { query, tx });
        debug!(listener = id, "subscription established");

        let detach_inner = Arc::clone(&self.inner);
        let guard = Unsubscribe::new(move || {
            lock(&detach_inner).listeners.remove(&id);
        });
        Ok(Watch::new(rx, guard))
    }
}
