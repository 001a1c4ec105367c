use mongodb::bson::{Bson, Document};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::report::StepOutput;

pub(crate) const STEP_TRACING_EVENT_TARGET: &str = "mongodb_smoke::step";
pub(crate) const CONNECTION_TRACING_EVENT_TARGET: &str = "mongodb_smoke::connection";

/// Installs a stderr subscriber. `RUST_LOG` takes precedence over `level`, which applies to
/// this crate only; the driver's own events stay at `warn` unless `RUST_LOG` asks otherwise.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mongodb_smoke={level},mongodb=warn")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

pub(crate) trait TracingRepresentation {
    type Representation;

    fn tracing_representation(&self) -> Self::Representation;
}

impl TracingRepresentation for Document {
    type Representation = String;

    fn tracing_representation(&self) -> String {
        Bson::Document(self.clone())
            .into_relaxed_extjson()
            .to_string()
    }
}

impl TracingRepresentation for StepOutput {
    type Representation = String;

    fn tracing_representation(&self) -> String {
        match self {
            StepOutput::Found(Some(document)) => document.tracing_representation(),
            other => other.to_string(),
        }
    }
}
