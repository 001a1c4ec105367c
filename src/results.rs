//! Contains the types of results returned by the CRUD steps.
//!
//! The driver's own result types cannot be constructed outside of it, so every store reports
//! through these instead.

use mongodb::{bson::Bson, results as driver};

/// The result of a [`DocumentStore::insert_one`](crate::DocumentStore::insert_one) operation.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertOneResult {
    /// The `_id` field of the document inserted.
    pub inserted_id: Bson,
}

impl From<driver::InsertOneResult> for InsertOneResult {
    fn from(result: driver::InsertOneResult) -> Self {
        Self {
            inserted_id: result.inserted_id,
        }
    }
}

/// The result of a [`DocumentStore::update_one`](crate::DocumentStore::update_one) operation.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateResult {
    /// The number of documents that matched the filter.
    pub matched_count: u64,
    /// The number of documents that were modified by the operation.
    pub modified_count: u64,
    /// The `_id` field of the upserted document.
    pub upserted_id: Option<Bson>,
}

impl From<driver::UpdateResult> for UpdateResult {
    fn from(result: driver::UpdateResult) -> Self {
        Self {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        }
    }
}

/// The result of a [`DocumentStore::delete_one`](crate::DocumentStore::delete_one) operation.
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteResult {
    /// The number of documents deleted by the operation.
    pub deleted_count: u64,
}

impl From<driver::DeleteResult> for DeleteResult {
    fn from(result: driver::DeleteResult) -> Self {
        Self {
            deleted_count: result.deleted_count,
        }
    }
}
