//! Document store seam
//!
//! The scene subsystem treats the store as an opaque asynchronous record
//! store with live queries. [`MemoryStore`] is an in-process implementation
//! used by tests and the CLI.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use thiserror::Error;

/// Store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("Documents must be JSON objects")]
    NotAnObject,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A document as delivered to subscribers
#[derive(Clone, Debug, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Value,
}

/// Live query: one collection, optionally narrowed by a top-level field
#[derive(Clone, Debug, PartialEq)]
pub struct QueryFilter {
    pub collection: String,
    pub field_equals: Option<(String, Value)>,
}

impl QueryFilter {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            field_equals: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field_equals = Some((field.into(), value.into()));
        self
    }

    pub fn matches(&self, collection: &str, data: &Value) -> bool {
        if self.collection != collection {
            return false;
        }
        match &self.field_equals {
            Some((field, value)) => data.get(field) == Some(value),
            None => true,
        }
    }
}

/// Receives the full matching document list on every change, or an error
pub type SubscriptionCallback = Arc<dyn Fn(StoreResult<Vec<StoredDocument>>) + Send + Sync>;

/// Live query handle; dropping it unsubscribes
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Asynchronous document store.
///
/// No consistency or ordering model is assumed for concurrent writers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document, returning its new id
    async fn create(&self, collection: &str, doc: Value) -> StoreResult<String>;

    /// Shallow-merge `patch` into an existing document
    async fn update(&self, collection: &str, id: &str, patch: Value) -> StoreResult<()>;

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Deliver the current matching list now and again after every change
    fn subscribe(&self, filter: QueryFilter, callback: SubscriptionCallback) -> Subscription;
}

struct Subscriber {
    id: u64,
    filter: QueryFilter,
    callback: SubscriptionCallback,
}

#[derive(Default)]
struct StoreInner {
    collections: Vec<(String, Vec<(String, Value)>)>,
    subscribers: Vec<Subscriber>,
    next_subscriber: u64,
    failure: Option<String>,
}

impl StoreInner {
    fn collection_mut(&mut self, name: &str) -> &mut Vec<(String, Value)> {
        let idx = match self.collections.iter().position(|(n, _)| n == name) {
            Some(idx) => idx,
            None => {
                self.collections.push((name.to_string(), Vec::new()));
                self.collections.len() - 1
            }
        };
        &mut self.collections[idx].1
    }

    fn existing_mut(&mut self, name: &str) -> Option<&mut Vec<(String, Value)>> {
        self.collections
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, docs)| docs)
    }

    fn query(&self, filter: &QueryFilter) -> Vec<StoredDocument> {
        self.collections
            .iter()
            .filter(|(name, _)| *name == filter.collection)
            .flat_map(|(name, docs)| {
                docs.iter()
                    .filter(move |(_, data)| filter.matches(name, data))
                    .map(|(id, data)| StoredDocument {
                        id: id.clone(),
                        data: data.clone(),
                    })
            })
            .collect()
    }

    fn pending_notifications(&self, collection: &str) -> Vec<(SubscriptionCallback, Vec<StoredDocument>)> {
        self.subscribers
            .iter()
            .filter(|s| s.filter.collection == collection)
            .map(|s| (s.callback.clone(), self.query(&s.filter)))
            .collect()
    }
}

/// In-process document store.
///
/// Documents keep insertion order. Subscribers are called outside the lock,
/// so a callback may safely use the store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail with [`StoreError::Unavailable`],
    /// or clear the failure with `None`
    pub fn set_failure(&self, message: Option<&str>) {
        self.inner.lock().failure = message.map(str::to_string);
    }

    /// Push an error through the error channel of a collection's subscribers
    pub fn fail_subscribers(&self, collection: &str, message: &str) {
        let callbacks: Vec<SubscriptionCallback> = self
            .inner
            .lock()
            .subscribers
            .iter()
            .filter(|s| s.filter.collection == collection)
            .map(|s| s.callback.clone())
            .collect();
        for callback in callbacks {
            callback(Err(StoreError::Unavailable(message.to_string())));
        }
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Value> {
        let inner = self.inner.lock();
        inner
            .collections
            .iter()
            .find(|(name, _)| name == collection)
            .and_then(|(_, docs)| docs.iter().find(|(doc_id, _)| doc_id == id))
            .map(|(_, data)| data.clone())
    }

    pub fn len(&self, collection: &str) -> usize {
        let inner = self.inner.lock();
        inner
            .collections
            .iter()
            .find(|(name, _)| name == collection)
            .map_or(0, |(_, docs)| docs.len())
    }

    /// Names of the collections holding or having held documents
    pub fn collections(&self) -> Vec<String> {
        self.inner.lock().collections.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// Run a write under the lock, then notify subscribers after releasing it
    fn write<T>(&self, collection: &str, f: impl FnOnce(&mut StoreInner) -> StoreResult<T>) -> StoreResult<T> {
        let (result, notifications) = {
            let mut inner = self.inner.lock();
            if let Some(message) = &inner.failure {
                return Err(StoreError::Unavailable(message.clone()));
            }
            let result = f(&mut inner)?;
            (result, inner.pending_notifications(collection))
        };
        for (callback, docs) in notifications {
            callback(Ok(docs));
        }
        Ok(result)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, doc: Value) -> StoreResult<String> {
        if !doc.is_object() {
            return Err(StoreError::NotAnObject);
        }
        self.write(collection, |inner| {
            let id = uuid::Uuid::new_v4().to_string();
            inner.collection_mut(collection).push((id.clone(), doc));
            Ok(id)
        })
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> StoreResult<()> {
        let patch: Map<String, Value> = match patch {
            Value::Object(map) => map,
            _ => return Err(StoreError::NotAnObject),
        };
        self.write(collection, |inner| {
            let doc = inner
                .existing_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|(doc_id, _)| doc_id == id))
                .map(|(_, data)| data)
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            if let Value::Object(fields) = doc {
                fields.extend(patch);
            }
            Ok(())
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.write(collection, |inner| {
            let removed = match inner.existing_mut(collection) {
                Some(docs) => {
                    let before = docs.len();
                    docs.retain(|(doc_id, _)| doc_id != id);
                    docs.len() != before
                }
                None => false,
            };
            if !removed {
                return Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
            Ok(())
        })
    }

    fn subscribe(&self, filter: QueryFilter, callback: SubscriptionCallback) -> Subscription {
        let (id, initial) = {
            let mut inner = self.inner.lock();
            let id = inner.next_subscriber;
            inner.next_subscriber += 1;
            let initial = inner.query(&filter);
            inner.subscribers.push(Subscriber {
                id,
                filter,
                callback: callback.clone(),
            });
            (id, initial)
        };
        callback(Ok(initial));

        let weak: Weak<Mutex<StoreInner>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().subscribers.retain(|s| s.id != id);
            }
        })
    }
}
