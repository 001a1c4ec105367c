//! The insert / find / update / delete sequence.

use std::{fmt, future::Future, time::Duration};

use mongodb::{
    bson::{doc, Bson, Document},
    Client,
    Collection,
};
use typed_builder::TypedBuilder;

use crate::{
    car::{self, Car, ORIGINAL_NAME, UPDATED_NAME},
    error::{Error, Result},
    options::{MatchBy, SmokeOptions},
    report::{Outcome, SmokeReport, Step, StepOutput, StepReport},
    store::DocumentStore,
    trace::{
        TracingRepresentation,
        CONNECTION_TRACING_EVENT_TARGET,
        STEP_TRACING_EVENT_TARGET,
    },
};

/// Which steps run and how they locate the inserted car.
#[derive(Clone, Debug, Default, PartialEq, Eq, TypedBuilder)]
#[builder(field_defaults(default))]
#[non_exhaustive]
pub struct Sequence {
    pub match_by: MatchBy,

    /// Re-read after the update.
    pub verify_update: bool,

    /// The ceiling for each step.
    pub timeout: Option<Duration>,
}

impl Sequence {
    /// The store steps, in execution order.
    pub fn steps(&self) -> Vec<Step> {
        let mut steps = vec![Step::Insert, Step::Find, Step::Update];
        if self.verify_update {
            steps.push(Step::Verify);
        }
        steps.push(Step::Delete);
        steps
    }
}

/// Runs a [`Sequence`] against a [`DocumentStore`].
#[derive(Debug)]
pub struct SmokeTest<S> {
    store: S,
    sequence: Sequence,
}

impl<S: DocumentStore> SmokeTest<S> {
    pub fn new(store: S, sequence: Sequence) -> Self {
        Self { store, sequence }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Runs every step and returns their outcomes.
    pub async fn run(&self) -> SmokeReport {
        self.run_with(|_| {}).await
    }

    /// Runs every step, handing each outcome to `on_step` as soon as the step finishes. A failed
    /// step does not stop later ones, though with [`MatchBy::Id`] a failed insert leaves them
    /// nothing to match and they are skipped.
    pub async fn run_with(&self, mut on_step: impl FnMut(&StepReport)) -> SmokeReport {
        let mut report = SmokeReport::default();
        let mut inserted_id = None;

        for step in self.sequence.steps() {
            let outcome = match self.execute(step, &mut inserted_id).await {
                Ok(output) => Outcome::Succeeded(output),
                Err(outcome) => outcome,
            };
            log_outcome(step, &outcome);
            on_step(report.push(step, outcome));
        }

        report
    }

    async fn execute(
        &self,
        step: Step,
        inserted_id: &mut Option<Bson>,
    ) -> std::result::Result<StepOutput, Outcome> {
        let timeout = self.sequence.timeout;

        let output = match step {
            Step::Insert => {
                let document = car::by_name(ORIGINAL_NAME);
                let result = within(timeout, step, self.store.insert_one(document))
                    .await
                    .map_err(Outcome::Failed)?;
                *inserted_id = Some(result.inserted_id.clone());
                StepOutput::Inserted(result)
            }
            Step::Find | Step::Verify => {
                let target = self.target(inserted_id.as_ref())?;
                let expected = if step == Step::Find {
                    ORIGINAL_NAME
                } else {
                    UPDATED_NAME
                };
                let filter = target.clone().unwrap_or_default();
                let found = within(timeout, step, self.store.find_one(filter))
                    .await
                    .map_err(Outcome::Failed)?;
                if target.is_some() {
                    check_name(expected, found.as_ref()).map_err(Outcome::Failed)?;
                }
                StepOutput::Found(found)
            }
            Step::Update => {
                let filter = self
                    .target(inserted_id.as_ref())?
                    .unwrap_or_else(|| car::by_name(ORIGINAL_NAME));
                let update = car::rename(UPDATED_NAME);
                let result = within(timeout, step, self.store.update_one(filter, update))
                    .await
                    .map_err(Outcome::Failed)?;
                StepOutput::Updated(result)
            }
            Step::Delete => {
                let filter = self
                    .target(inserted_id.as_ref())?
                    .unwrap_or_else(|| car::by_name(UPDATED_NAME));
                let result = within(timeout, step, self.store.delete_one(filter))
                    .await
                    .map_err(Outcome::Failed)?;
                StepOutput::Deleted(result)
            }
            Step::Connect => unreachable!("connect is not part of a store sequence"),
        };
        Ok(output)
    }

    /// The `_id` filter for [`MatchBy::Id`]; `None` when matching by content.
    fn target(
        &self,
        inserted_id: Option<&Bson>,
    ) -> std::result::Result<Option<Document>, Outcome> {
        match (self.sequence.match_by, inserted_id) {
            (MatchBy::Content, _) => Ok(None),
            (MatchBy::Id, Some(id)) => Ok(Some(car::by_id(id))),
            (MatchBy::Id, None) => Err(Outcome::Skipped {
                reason: "there is no inserted _id to match",
            }),
        }
    }
}

fn check_name(expected: &str, found: Option<&Document>) -> Result<()> {
    let found = found
        .cloned()
        .map(Car::from_document)
        .transpose()?
        .map(|car| car.name);
    if found.as_deref() == Some(expected) {
        Ok(())
    } else {
        Err(Error::verification(expected, found))
    }
}

fn log_outcome(step: Step, outcome: &Outcome) {
    match outcome {
        Outcome::Succeeded(output) => tracing::info!(
            target: STEP_TRACING_EVENT_TARGET,
            %step,
            output = %output.tracing_representation(),
            "step succeeded"
        ),
        Outcome::Failed(error) => tracing::warn!(
            target: STEP_TRACING_EVENT_TARGET,
            %step,
            %error,
            "step failed"
        ),
        Outcome::Skipped { reason } => tracing::warn!(
            target: STEP_TRACING_EVENT_TARGET,
            %step,
            %reason,
            "step skipped"
        ),
    }
}

/// Bounds `future` by `timeout`, if one is set.
pub(crate) async fn within<T>(
    timeout: Option<Duration>,
    operation: impl fmt::Display,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, future)
            .await
            .map_err(|_| Error::timeout(operation.to_string(), timeout))?,
        None => future.await,
    }
}

/// Connects to the deployment described by `options` and returns the target collection.
///
/// The client connects lazily, so this pings the `admin` database to surface an unreachable
/// deployment here rather than at the first insert. When `timeoutMS` is set it bounds the whole
/// call, including the SRV and TXT lookups a `mongodb+srv://` URI needs.
#[tracing::instrument(
    skip(options),
    fields(database = %options.database, collection = %options.collection)
)]
pub async fn connect(options: &SmokeOptions) -> Result<Collection<Document>> {
    let timeout = options.operation_timeout()?;
    within(timeout, Step::Connect, async {
        let client_options = options.client_options().await?;
        tracing::debug!(
            target: CONNECTION_TRACING_EVENT_TARGET,
            hosts = ?client_options.hosts,
            server_selection_timeout = ?client_options.server_selection_timeout,
            "connecting"
        );

        let client = Client::with_options(client_options)?;
        client.database("admin").run_command(doc! { "ping": 1 }).await?;

        Ok::<_, Error>(
            client
                .database(&options.database)
                .collection(&options.collection),
        )
    })
    .await
}

/// Connects, optionally drops the collection, and runs the sequence `options` describe.
///
/// A failed connection is reported as a failed [`Step::Connect`] followed by every store step
/// marked skipped, so the report always lists the full sequence.
pub async fn run(options: &SmokeOptions, mut on_step: impl FnMut(&StepReport)) -> SmokeReport {
    let mut report = SmokeReport::default();

    let connected = async {
        let sequence = options.sequence()?;
        let collection = connect(options).await?;
        Ok::<_, Error>((sequence, collection))
    }
    .await;

    let (sequence, collection) = match connected {
        Ok(connected) => {
            let outcome = Outcome::Succeeded(StepOutput::Connected);
            log_outcome(Step::Connect, &outcome);
            on_step(report.push(Step::Connect, outcome));
            connected
        }
        Err(err) => {
            let outcome = Outcome::Failed(err);
            log_outcome(Step::Connect, &outcome);
            on_step(report.push(Step::Connect, outcome));

            let planned = Sequence::builder()
                .verify_update(options.verify_update)
                .build();
            for step in planned.steps() {
                let outcome = Outcome::Skipped {
                    reason: "could not connect",
                };
                log_outcome(step, &outcome);
                on_step(report.push(step, outcome));
            }
            return report;
        }
    };

    if options.drop_first {
        if let Err(error) = within(sequence.timeout, "drop", collection.clear()).await {
            tracing::warn!(
                target: CONNECTION_TRACING_EVENT_TARGET,
                %error,
                "could not drop the collection before running"
            );
        }
    }

    let test = SmokeTest::new(collection, sequence);
    report.extend(test.run_with(&mut on_step).await);
    report
}
