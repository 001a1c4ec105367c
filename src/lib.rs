//! A smoke test for MongoDB deployments.
//!
//! The test connects, then inserts `{name: "Honda"}` into `carDB.car`, reads a document back,
//! renames the car to `"Toyota"` with `$set`, optionally reads it again, and deletes it. Every
//! step's result is reported as soon as the step finishes, and the run ends with a
//! [`SmokeReport`] whose [`exit_code`](SmokeReport::exit_code) is the number of steps that did
//! not succeed.
//!
//! # Example Usage
//!
//! ```no_run
//! # async fn foo() {
//! use mongodb_smoke::{options::SmokeOptions, smoke};
//!
//! let options = SmokeOptions::builder()
//!     .uri("mongodb://localhost:27017/?timeoutMS=2000")
//!     .verify_update(true)
//!     .build();
//!
//! let report = smoke::run(&options, |step| println!("{step}")).await;
//! assert!(report.is_success());
//! # }
//! ```
//!
//! # Connection string
//!
//! Any option the driver accepts may appear in the URI. In addition, `timeoutMS` is recognized
//! here: it bounds server selection, connection establishment, and each step. The driver itself
//! would reject it, so it is removed before the URI is parsed. See
//! [`ParsedUri`](options::ParsedUri).
//!
//! # Matching
//!
//! By default the update and delete steps find the car by its name, the way a quick script
//! would. If the collection already holds another `"Honda"`, that document may be updated
//! instead. [`MatchBy::Id`](options::MatchBy::Id) matches on the `_id` returned by the insert.

pub mod car;
pub mod error;
pub mod options;
pub mod report;
pub mod results;
pub mod smoke;
pub mod store;
mod trace;

pub use crate::{
    error::{Error, ErrorKind, Result},
    report::{Outcome, SmokeReport, Step, StepOutput, StepReport},
    smoke::{connect, run, Sequence, SmokeTest},
    store::DocumentStore,
    trace::init_logging,
};
