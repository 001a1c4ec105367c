//! The seam between the smoke test and the document store it exercises.

use futures_util::{future::BoxFuture, FutureExt};
use mongodb::{bson::Document, Collection};

use crate::{
    error::Result,
    results::{DeleteResult, InsertOneResult, UpdateResult},
};

/// The CRUD capabilities the smoke test needs from a collection.
///
/// Every method is a passthrough to the store; none of them retry.
pub trait DocumentStore: Send + Sync {
    /// Inserts `document`. The result carries the `_id` the store assigned.
    fn insert_one(&self, document: Document) -> BoxFuture<'_, Result<InsertOneResult>>;

    /// Returns the first document matching `filter`, or `None`. An empty filter matches an
    /// arbitrary document.
    fn find_one(&self, filter: Document) -> BoxFuture<'_, Result<Option<Document>>>;

    /// Applies `update` (an operator document such as `{$set: {...}}`) to the first document
    /// matching `filter`.
    fn update_one(
        &self,
        filter: Document,
        update: Document,
    ) -> BoxFuture<'_, Result<UpdateResult>>;

    /// Removes the first document matching `filter`.
    fn delete_one(&self, filter: Document) -> BoxFuture<'_, Result<DeleteResult>>;

    /// Counts the documents matching `filter`.
    fn count_documents(&self, filter: Document) -> BoxFuture<'_, Result<u64>>;

    /// Removes every document.
    fn clear(&self) -> BoxFuture<'_, Result<()>>;
}

impl DocumentStore for Collection<Document> {
    fn insert_one(&self, document: Document) -> BoxFuture<'_, Result<InsertOneResult>> {
        async move { Ok(Collection::insert_one(self, document).await?.into()) }.boxed()
    }

    fn find_one(&self, filter: Document) -> BoxFuture<'_, Result<Option<Document>>> {
        async move { Ok(Collection::find_one(self, filter).await?) }.boxed()
    }

    fn update_one(
        &self,
        filter: Document,
        update: Document,
    ) -> BoxFuture<'_, Result<UpdateResult>> {
        async move { Ok(Collection::update_one(self, filter, update).await?.into()) }.boxed()
    }

    fn delete_one(&self, filter: Document) -> BoxFuture<'_, Result<DeleteResult>> {
        async move { Ok(Collection::delete_one(self, filter).await?.into()) }.boxed()
    }

    fn count_documents(&self, filter: Document) -> BoxFuture<'_, Result<u64>> {
        async move { Ok(Collection::count_documents(self, filter).await?) }.boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<()>> {
        async move { Ok(Collection::drop(self).await?) }.boxed()
    }
}
