use mongodb::bson::{doc, Document};
use mongodb_smoke::{connect, options::SmokeOptions, DocumentStore};

/// Writes to stderr even when the test harness is capturing output.
pub fn log_uncaptured<S: AsRef<str>>(text: S) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    stderr.write_all(text.as_ref().as_bytes()).unwrap();
    stderr.write_all(b"\n").unwrap();
}

/// Options targeting a per-test collection on the deployment in `MONGODB_URI`, or `None` when
/// no deployment is configured.
pub fn deployment_options(test_name: &str) -> Option<SmokeOptions> {
    let Ok(uri) = std::env::var("MONGODB_URI") else {
        log_uncaptured(format!("skipping {test_name}: MONGODB_URI is not set"));
        return None;
    };
    Some(
        SmokeOptions::builder()
            .uri(uri)
            .database("mongodb_smoke_test")
            .collection(test_name)
            .build(),
    )
}

/// Drops the collection `options` target and returns a handle to it.
pub async fn init_collection(options: &SmokeOptions) -> mongodb::Collection<Document> {
    let coll = connect(options).await.unwrap();
    coll.clear().await.unwrap();
    coll
}

pub async fn count_named(coll: &mongodb::Collection<Document>, name: &str) -> u64 {
    DocumentStore::count_documents(coll, doc! { "name": name })
        .await
        .unwrap()
}
