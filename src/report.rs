//! Per-step outcomes of a smoke test run.

use std::fmt;

use derive_more::Display;
use mongodb::bson::Document;

use crate::{
    error::Error,
    results::{DeleteResult, InsertOneResult, UpdateResult},
};

/// One step of the smoke test, in execution order.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Step {
    #[display("connect")]
    Connect,
    #[display("insert")]
    Insert,
    #[display("find")]
    Find,
    #[display("update")]
    Update,
    #[display("verify")]
    Verify,
    #[display("delete")]
    Delete,
}

/// What a successful step returned.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutput {
    Connected,
    Inserted(InsertOneResult),
    Found(Option<Document>),
    Updated(UpdateResult),
    Deleted(DeleteResult),
}

impl fmt::Display for StepOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "ok"),
            Self::Inserted(result) => write!(f, "{result:?}"),
            Self::Found(Some(document)) => write!(f, "{document}"),
            Self::Found(None) => write!(f, "None"),
            Self::Updated(result) => write!(f, "{result:?}"),
            Self::Deleted(result) => write!(f, "{result:?}"),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Outcome {
    Succeeded(StepOutput),
    Failed(Error),
    /// The step could not run because an earlier one failed.
    Skipped { reason: &'static str },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn output(&self) -> Option<&StepOutput> {
        match self {
            Self::Succeeded(output) => Some(output),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StepReport {
    pub step: Step,
    pub outcome: Outcome,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Succeeded(output) => write!(f, "{}: {}", self.step, output),
            Outcome::Failed(err) => write!(f, "{}: FAILED: {}", self.step, err),
            Outcome::Skipped { reason } => write!(f, "{}: SKIPPED: {}", self.step, reason),
        }
    }
}

/// The outcome of every step that was attempted or skipped, in order.
#[derive(Clone, Debug, Default)]
pub struct SmokeReport {
    pub steps: Vec<StepReport>,
}

impl SmokeReport {
    pub(crate) fn push(&mut self, step: Step, outcome: Outcome) -> &StepReport {
        self.steps.push(StepReport { step, outcome });
        &self.steps[self.steps.len() - 1]
    }

    pub(crate) fn extend(&mut self, other: SmokeReport) {
        self.steps.extend(other.steps);
    }

    /// The report for `step`, if it was part of the run.
    pub fn get(&self, step: Step) -> Option<&StepReport> {
        self.steps.iter().find(|report| report.step == step)
    }

    /// The number of steps that failed or were skipped.
    pub fn failures(&self) -> usize {
        self.steps
            .iter()
            .filter(|report| !report.outcome.is_success())
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }

    /// The process exit status: the number of steps that did not succeed.
    pub fn exit_code(&self) -> u8 {
        u8::try_from(self.failures()).unwrap_or(u8::MAX)
    }
}

impl fmt::Display for SmokeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} steps succeeded",
            self.steps.len() - self.failures(),
            self.steps.len()
        )
    }
}
