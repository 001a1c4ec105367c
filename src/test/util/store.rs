use std::{collections::HashMap, sync::Mutex, time::Duration};

use futures_util::{future::BoxFuture, FutureExt};
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};

use crate::{
    error::{Error, Result},
    results::{DeleteResult, InsertOneResult, UpdateResult},
    store::DocumentStore,
};

/// The store operations a fail point can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Operation {
    Insert,
    Find,
    Update,
    Delete,
    Count,
    Clear,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum FailPointMode {
    AlwaysOn,
    Times(usize),
}

#[derive(Clone, Debug)]
enum FailAction {
    Error(Error),
    Block(Duration),
}

#[derive(Clone, Debug)]
struct FailPoint {
    mode: FailPointMode,
    action: FailAction,
}

impl FailPoint {
    /// Consumes one activation, returning the action if the fail point is still active.
    fn activate(&mut self) -> Option<FailAction> {
        match &mut self.mode {
            FailPointMode::AlwaysOn => Some(self.action.clone()),
            FailPointMode::Times(0) => None,
            FailPointMode::Times(remaining) => {
                *remaining -= 1;
                Some(self.action.clone())
            }
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    documents: Vec<Document>,
    fail_points: HashMap<Operation, FailPoint>,
}

/// An in-process collection with the matching rules the smoke test relies on: filters match on
/// top-level field equality and updates support `$set` only.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let store = Self::new();
        store.inner.lock().unwrap().documents.extend(documents);
        store
    }

    /// A snapshot of the stored documents, in insertion order.
    pub(crate) fn documents(&self) -> Vec<Document> {
        self.inner.lock().unwrap().documents.clone()
    }

    /// Edits the stored documents directly, bypassing fail points.
    pub(crate) fn modify(&self, f: impl FnOnce(&mut Vec<Document>)) {
        f(&mut self.inner.lock().unwrap().documents);
    }

    /// Makes `operation` fail with `error`.
    pub(crate) fn fail(&self, operation: Operation, mode: FailPointMode, error: Error) {
        self.set_fail_point(operation, mode, FailAction::Error(error));
    }

    /// Makes `operation` wait for `delay` before touching the documents.
    pub(crate) fn block(&self, operation: Operation, mode: FailPointMode, delay: Duration) {
        self.set_fail_point(operation, mode, FailAction::Block(delay));
    }

    fn set_fail_point(&self, operation: Operation, mode: FailPointMode, action: FailAction) {
        self.inner
            .lock()
            .unwrap()
            .fail_points
            .insert(operation, FailPoint { mode, action });
    }

    async fn check_fail_point(&self, operation: Operation) -> Result<()> {
        let action = self
            .inner
            .lock()
            .unwrap()
            .fail_points
            .get_mut(&operation)
            .and_then(FailPoint::activate);

        match action {
            Some(FailAction::Error(error)) => Err(error),
            Some(FailAction::Block(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, value)| document.get(key) == Some(value))
}

/// Applies `update` to `document`, returning whether any field changed.
fn apply_update(document: &mut Document, update: &Document) -> Result<bool> {
    let mut modified = false;
    for (operator, fields) in update {
        let fields = match (operator.as_str(), fields) {
            ("$set", Bson::Document(fields)) => fields,
            ("$set", other) => {
                return Err(Error::rejected(format!(
                    "$set requires a document, got {other}"
                )))
            }
            (operator, _) if operator.starts_with('$') => {
                return Err(Error::rejected(format!(
                    "unsupported update operator {operator}"
                )))
            }
            _ => {
                return Err(Error::rejected(
                    "update document requires atomic operators",
                ))
            }
        };
        for (key, value) in fields {
            if document.get(key) != Some(value) {
                document.insert(key.clone(), value.clone());
                modified = true;
            }
        }
    }
    Ok(modified)
}

impl DocumentStore for MemoryStore {
    fn insert_one(&self, document: Document) -> BoxFuture<'_, Result<InsertOneResult>> {
        async move {
            self.check_fail_point(Operation::Insert).await?;

            let id = document
                .get("_id")
                .cloned()
                .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));
            let mut stored = doc! { "_id": id.clone() };
            for (key, value) in document {
                if key != "_id" {
                    stored.insert(key, value);
                }
            }

            let mut inner = self.inner.lock().unwrap();
            if inner
                .documents
                .iter()
                .any(|existing| existing.get("_id") == Some(&id))
            {
                return Err(Error::rejected(format!("duplicate key: _id {id}")));
            }
            inner.documents.push(stored);
            Ok(InsertOneResult { inserted_id: id })
        }
        .boxed()
    }

    fn find_one(&self, filter: Document) -> BoxFuture<'_, Result<Option<Document>>> {
        async move {
            self.check_fail_point(Operation::Find).await?;

            let inner = self.inner.lock().unwrap();
            Ok(inner
                .documents
                .iter()
                .find(|document| matches(document, &filter))
                .cloned())
        }
        .boxed()
    }

    fn update_one(
        &self,
        filter: Document,
        update: Document,
    ) -> BoxFuture<'_, Result<UpdateResult>> {
        async move {
            self.check_fail_point(Operation::Update).await?;

            let mut inner = self.inner.lock().unwrap();
            let Some(document) = inner
                .documents
                .iter_mut()
                .find(|document| matches(document, &filter))
            else {
                return Ok(UpdateResult {
                    matched_count: 0,
                    modified_count: 0,
                    upserted_id: None,
                });
            };
            let modified = apply_update(document, &update)?;
            Ok(UpdateResult {
                matched_count: 1,
                modified_count: u64::from(modified),
                upserted_id: None,
            })
        }
        .boxed()
    }

    fn delete_one(&self, filter: Document) -> BoxFuture<'_, Result<DeleteResult>> {
        async move {
            self.check_fail_point(Operation::Delete).await?;

            let mut inner = self.inner.lock().unwrap();
            let position = inner
                .documents
                .iter()
                .position(|document| matches(document, &filter));
            let deleted_count = match position {
                Some(index) => {
                    inner.documents.remove(index);
                    1
                }
                None => 0,
            };
            Ok(DeleteResult { deleted_count })
        }
        .boxed()
    }

    fn count_documents(&self, filter: Document) -> BoxFuture<'_, Result<u64>> {
        async move {
            self.check_fail_point(Operation::Count).await?;

            let inner = self.inner.lock().unwrap();
            let count = inner
                .documents
                .iter()
                .filter(|document| matches(document, &filter))
                .count();
            Ok(count as u64)
        }
        .boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<()>> {
        async move {
            self.check_fail_point(Operation::Clear).await?;
            self.inner.lock().unwrap().documents.clear();
            Ok(())
        }
        .boxed()
    }
}
