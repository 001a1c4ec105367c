use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use serde::Deserialize;

/// The name the smoke test inserts.
pub const ORIGINAL_NAME: &str = "Honda";

/// The name the update step sets.
pub const UPDATED_NAME: &str = "Toyota";

/// A document in the `car` collection.
///
/// The collection is schema-less; `name` is the only field the smoke test writes or reads.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Car {
    /// Assigned by the store on insert.
    #[serde(rename = "_id", default)]
    pub id: Option<ObjectId>,

    /// The car's name.
    pub name: String,
}

impl Car {
    /// Decodes a document read back from the collection.
    pub fn from_document(document: Document) -> crate::error::Result<Self> {
        Ok(mongodb::bson::from_document(document)?)
    }
}

/// `{name: <name>}`, used both as the inserted document and as a content filter.
pub(crate) fn by_name(name: &str) -> Document {
    doc! { "name": name }
}

/// `{_id: <id>}`.
pub(crate) fn by_id(id: &Bson) -> Document {
    doc! { "_id": id.clone() }
}

/// `{$set: {name: <name>}}`.
pub(crate) fn rename(name: &str) -> Document {
    doc! { "$set": { "name": name } }
}
